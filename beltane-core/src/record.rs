//! Recording engine: captures button gestures into new step tables.
//!
//! Gestures accumulate in recorder-local buffers and are committed to the
//! step store only on finish, inside one critical section. A cancelled
//! session (nothing captured, or a zero-length cycle) therefore leaves the
//! previous table untouched.

use beltane_types::quantize::{equal_durations, normalize};
use beltane_types::{RuntimeMode, SequencerState, StepRecord, TrackId, GATE_MAX, GATE_MIN};

/// What a finished session did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// New step table committed.
    Committed,
    /// Nothing captured, or the observed cycle had zero length; previous
    /// table kept.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Sequence,
    Rhythm,
    Both,
}

impl Kind {
    fn captures_order(self) -> bool {
        matches!(self, Kind::Sequence | Kind::Both)
    }

    fn captures_timing(self) -> bool {
        matches!(self, Kind::Rhythm | Kind::Both)
    }

    fn mode(self) -> RuntimeMode {
        match self {
            Kind::Sequence => RuntimeMode::RecordingSequence,
            Kind::Rhythm => RuntimeMode::RecordingRhythm,
            Kind::Both => RuntimeMode::RecordingBoth,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    button: u8,
    order: u8,
    at: u64,
    released: Option<u64>,
}

/// One in-progress recording session. Owned by the polling loop; nothing
/// here is visible to the tick.
#[derive(Debug)]
pub struct Recorder {
    kind: Option<Kind>,
    track: TrackId,
    capacity: usize,
    order_count: u8,
    presses: Vec<Press>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            kind: None,
            track: TrackId::A,
            capacity: 0,
            order_count: 0,
            presses: Vec::new(),
        }
    }

    pub fn active(&self) -> bool {
        self.kind.is_some()
    }

    /// Steps captured so far, for the display snapshot.
    pub fn steps_captured(&self) -> usize {
        self.presses.len()
    }

    /// Begin a session for the selected track. Only legal from `Idle`;
    /// sets the runtime mode.
    pub fn start(&mut self, mode: RuntimeMode, state: &mut SequencerState) -> bool {
        if state.mode != RuntimeMode::Idle {
            return false;
        }
        let kind = match mode {
            RuntimeMode::RecordingSequence => Kind::Sequence,
            RuntimeMode::RecordingRhythm => Kind::Rhythm,
            RuntimeMode::RecordingBoth => Kind::Both,
            _ => return false,
        };
        self.kind = Some(kind);
        self.track = state.selected;
        self.capacity = state.layout.capacity();
        self.order_count = state.layout.order_count();
        self.presses.clear();
        state.mode = kind.mode();
        log::info!(target: "record", "recording {:?} on track {}", kind, self.track);
        true
    }

    /// A debounced step-button press. Returns true when the session has
    /// filled the track's capacity and must be finished now.
    pub fn press(&mut self, button: u8, now: u64) -> bool {
        let kind = match self.kind {
            Some(k) => k,
            None => return false,
        };
        if button >= self.order_count {
            return false;
        }
        if self.presses.len() >= self.capacity {
            // Timing capture needs one more edge to close the last step;
            // the press that overflows a full table is that edge. Its
            // timestamp reaches `finish` as `now` via the dispatched
            // finish action.
            return kind.captures_timing();
        }
        self.presses.push(Press {
            button,
            order: if kind.captures_order() { button } else { 0 },
            at: now,
            released: None,
        });
        // An order-only session has nothing left to capture at capacity.
        kind == Kind::Sequence && self.presses.len() == self.capacity
    }

    /// A debounced step-button release; closes the gate window of that
    /// button's still-open press. Holds may overlap across steps, so the
    /// release must match its own button, not the most recent press.
    pub fn release(&mut self, button: u8, now: u64) {
        if self.kind.is_none() {
            return;
        }
        if let Some(press) = self
            .presses
            .iter_mut()
            .rev()
            .find(|p| p.button == button && p.released.is_none())
        {
            press.released = Some(now);
        }
    }

    /// End the session and commit the captured table, re-establishing the
    /// quantization sum invariant. `now` closes the final step in timing
    /// modes.
    pub fn finish(&mut self, state: &mut SequencerState, now: u64) -> RecordOutcome {
        let kind = match self.kind.take() {
            Some(k) => k,
            None => return RecordOutcome::Cancelled,
        };
        state.mode = RuntimeMode::Idle;
        let presses = std::mem::take(&mut self.presses);
        if presses.is_empty() {
            log::info!(target: "record", "recording cancelled: nothing captured");
            return RecordOutcome::Cancelled;
        }

        let total = presses.len();
        let (durations, gates) = if kind.captures_timing() {
            let raw: Vec<u32> = presses
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let end = presses.get(i + 1).map(|n| n.at).unwrap_or(now);
                    end.saturating_sub(p.at) as u32
                })
                .collect();
            let durations = match normalize(&raw) {
                Some(d) => d,
                None => {
                    // Zero-length cycle: treat as cancelled rather than
                    // divide by zero (open question resolved in DESIGN.md).
                    log::warn!(target: "record", "recording cancelled: zero-length cycle");
                    return RecordOutcome::Cancelled;
                }
            };
            let gates = presses
                .iter()
                .zip(raw.iter())
                .map(|(p, &dur)| captured_gate(p, dur))
                .collect();
            (durations, gates)
        } else {
            let gate = (GATE_MAX / 2 - 1) as u16;
            (equal_durations(total), vec![gate; total])
        };

        let (layout, id) = (state.layout, self.track);
        let slice = state.store.track_mut(layout, id);
        for (i, rec) in slice.iter_mut().enumerate() {
            if i < total {
                if kind.captures_order() {
                    rec.order = presses[i].order;
                }
                rec.duration = durations[i];
                rec.gate = gates[i];
            } else {
                *rec = StepRecord {
                    order: 0,
                    duration: 0,
                    gate: 0,
                };
            }
        }

        let track = state.track_mut(id);
        track.total = total;
        if track.current >= total as i16 {
            track.current = total as i16 - 1;
        }
        if kind.captures_order() {
            track.custom_seq = true;
        }
        if kind.captures_timing() {
            track.custom_rhythm = true;
        }
        log::info!(target: "record", "committed {} steps to track {}", total, id);
        RecordOutcome::Committed
    }

    /// Drop an in-flight session without committing (layout switch).
    pub fn abort(&mut self, state: &mut SequencerState) {
        if self.kind.take().is_some() {
            self.presses.clear();
            if state.mode.is_recording() {
                state.mode = RuntimeMode::Idle;
            }
        }
    }
}

/// Gate value from a press/release pair over a raw step duration. Clamped
/// to [`GATE_MIN`] so every recorded step pulses; a release at or past the
/// next note-start saturates.
fn captured_gate(press: &Press, raw_duration: u32) -> u16 {
    let held = match press.released {
        Some(r) => r.saturating_sub(press.at) as u32,
        None => return (GATE_MAX - 1) as u16,
    };
    if raw_duration == 0 || held >= raw_duration {
        return (GATE_MAX - 1) as u16;
    }
    let scaled = (held as u64 * GATE_MAX as u64 / raw_duration as u64) as u32;
    scaled.saturating_sub(1).clamp(GATE_MIN as u32, GATE_MAX - 1) as u16
}
