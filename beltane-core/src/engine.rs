//! The per-track scheduler: timing math, the interrupt tick, transport
//! operations and two-track phase sync.
//!
//! The tick runs from the periodic timer context and is the only writer of
//! `current` while a track is playing. Transport operations run from the
//! loop context inside the critical section. Scheduled times are absolute
//! milliseconds; `next_gate_off_time == 0` is the "already fired" sentinel.

use beltane_types::{Layout, SequencerState, Track, TrackId, GATE_MAX, LEN_MAX};

/// Window within which a starting track aligns its phase to the other
/// track's clock.
pub const SYNC_PERIOD_MS: u64 = 500;
/// Gate hold after a manual-override button release.
pub const OVERRIDE_GRACE_MS: u64 = 15;

/// Millisecond length of one step: `(60000 / tempo) * (d+1)/LEN_MAX * beats`,
/// truncated.
pub fn note_length_ms(tempo: u16, beats: u16, duration: u16) -> u64 {
    let beat_ms = 60_000.0 / tempo.max(1) as f64;
    (beat_ms * (duration as f64 + 1.0) / LEN_MAX as f64 * beats as f64) as u64
}

fn track_ids(layout: Layout) -> &'static [TrackId] {
    match layout {
        Layout::Single => &[TrackId::A],
        Layout::Dual => &[TrackId::A, TrackId::B],
    }
}

/// Recompute both scheduled timestamps for the track's current step,
/// anchored at `note_start`.
fn schedule_step(state: &mut SequencerState, id: TrackId, note_start: u64) {
    let (layout, current) = (state.layout, state.track(id).current);
    let step = match state.store.step(layout, id, current.max(0) as usize) {
        Some(s) => *s,
        None => return,
    };
    let track = state.track_mut(id);
    let length = note_length_ms(track.tempo, track.beats, step.duration);
    let gate_len = (length as f64 * (step.gate as f64 + 1.0) / GATE_MAX as f64) as u64;
    track.next_note_time = (note_start + length).saturating_sub(1);
    // Keep clear of the fired sentinel even at degenerate lengths.
    track.next_gate_off_time = (note_start + gate_len).saturating_sub(1).max(1);
}

/// One pass of the periodic scheduler. `clock_edge` is true when the
/// external clock collaborator saw a rising edge since the last tick.
/// Returns true if any output-visible state changed.
pub fn tick(state: &mut SequencerState, now: u64, clock_edge: bool) -> bool {
    let mut changed = false;
    for &id in track_ids(state.layout) {
        // Gate open and close run independently of advance and fire at
        // most once each. Open first, so a single late pass over a whole
        // gate window nets to closed.
        {
            let track = state.track_mut(id);
            if track.next_gate_on_time != 0 && now >= track.next_gate_on_time {
                track.gate_high = true;
                track.next_gate_on_time = 0;
                changed = true;
            }
            if track.next_gate_off_time != 0 && now >= track.next_gate_off_time {
                track.gate_high = false;
                track.next_gate_off_time = 0;
                changed = true;
            }
        }

        let track = state.track(id);
        if !track.is_playing() {
            continue;
        }
        if track.clock_in {
            if clock_edge {
                advance(state, id, now);
                changed = true;
            }
        } else if now >= track.next_note_time {
            // Anchor at the scheduled boundary, not the tick-observed
            // time: a late scheduler pass must not stretch the cycle.
            let anchor = state.track(id).next_note_time + 1;
            advance(state, id, anchor);
            changed = true;
        }
    }
    changed
}

fn advance(state: &mut SequencerState, id: TrackId, note_start: u64) {
    {
        let track = state.track_mut(id);
        track.current = (track.current + 1) % track.total as i16;
        track.gate_high = true;
        track.next_gate_on_time = 0;
    }
    schedule_step(state, id, note_start);
}

/// Start or resume a track. Starting from position 0 makes a best-effort
/// phase alignment with the other running track (see [`sync_start`]).
pub fn play(state: &mut SequencerState, id: TrackId, now: u64) -> bool {
    if state.track(id).is_playing() {
        return false;
    }
    let starting_cycle = state.track(id).current <= 0;
    let note_start = if starting_cycle && state.layout == Layout::Dual {
        sync_start(state, id, now)
    } else {
        now
    };
    {
        let track = state.track_mut(id);
        if track.current < 0 {
            track.current = 0;
        }
        track.active = true;
        if note_start > now {
            // Phase-aligned start adopted a future anchor; the gate opens
            // when the aligned step actually begins.
            track.next_gate_on_time = note_start;
        } else {
            track.gate_high = true;
        }
    }
    schedule_step(state, id, note_start);
    true
}

/// Phase-alignment start time for a track beginning its cycle at `now`.
///
/// If the other track is running its last step and will wrap within
/// [`SYNC_PERIOD_MS`], adopt its wrap time so both cycles start together.
/// If the other track is on step 0 and started within the window, back-date
/// the start to its step 0 anchor. Otherwise start at `now`. Best effort,
/// never a guarantee.
fn sync_start(state: &SequencerState, id: TrackId, now: u64) -> u64 {
    let other_id = id.other();
    let other = state.track(other_id);
    if !other.is_playing() {
        return now;
    }

    if other.current == other.total as i16 - 1
        && other.next_note_time > now
        && other.next_note_time - now <= SYNC_PERIOD_MS
    {
        return other.next_note_time;
    }

    if other.current == 0 {
        if let Some(step) = state.store.step(state.layout, other_id, 0) {
            let period = note_length_ms(other.tempo, other.beats, step.duration);
            let other_start = (other.next_note_time + 1).saturating_sub(period);
            if now >= other_start && now - other_start <= SYNC_PERIOD_MS {
                return other_start;
            }
        }
    }

    now
}

/// Freeze in place; `current` keeps its position and a pending gate-off
/// still fires.
pub fn pause(state: &mut SequencerState, id: TrackId) -> bool {
    let track = state.track_mut(id);
    if !track.active {
        return false;
    }
    track.active = false;
    true
}

pub fn stop(state: &mut SequencerState, id: TrackId) -> bool {
    let track = state.track_mut(id);
    if track.current < 0 && !track.gate_high {
        return false;
    }
    track.current = -1;
    track.active = false;
    track.gate_high = false;
    track.override_step = None;
    track.next_note_time = 0;
    track.next_gate_off_time = 0;
    track.next_gate_on_time = 0;
    true
}

/// Manual advance, legal only while not actively playing. Wraps modulo the
/// active step count.
pub fn step_forward(state: &mut SequencerState, id: TrackId) -> bool {
    let track = state.track_mut(id);
    if track.is_playing() {
        return false;
    }
    track.current = (track.current + 1).rem_euclid(track.total as i16);
    true
}

pub fn step_backward(state: &mut SequencerState, id: TrackId) -> bool {
    let track = state.track_mut(id);
    if track.is_playing() {
        return false;
    }
    track.current = (track.current - 1).rem_euclid(track.total as i16);
    true
}

/// Force a step from a held button. Suppresses scheduled advance until
/// released.
pub fn override_on(state: &mut SequencerState, id: TrackId, step: u8) -> bool {
    let track = state.track_mut(id);
    track.override_step = Some(step);
    track.gate_high = true;
    track.next_gate_off_time = 0;
    track.next_gate_on_time = 0;
    true
}

/// Release a manual override: hold the gate for a short grace, then re-arm
/// scheduled advance from here if the track was running.
pub fn override_off(state: &mut SequencerState, id: TrackId, now: u64) -> bool {
    if state.track_mut(id).override_step.take().is_none() {
        return false;
    }
    let rearm = {
        let track = state.track(id);
        track.active && track.current >= 0
    };
    if rearm {
        schedule_step(state, id, now);
    }
    let track = state.track_mut(id);
    track.next_gate_off_time = (now + OVERRIDE_GRACE_MS).max(1);
    true
}

/// Detects rising edges on the external clock level.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    last: bool,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rising(&mut self, level: bool) -> bool {
        let edge = level && !self.last;
        self.last = level;
        edge
    }
}

/// Current physical outputs: per track, the 1-based logical step output
/// (0 = none) and the gate level.
pub fn projection(state: &SequencerState) -> crate::hal::Projection {
    let step_of = |id: TrackId| -> u8 {
        let track: &Track = state.track(id);
        if let Some(step) = track.override_step {
            return step + 1;
        }
        if track.current < 0 {
            return 0;
        }
        match state.store.step(state.layout, id, track.current as usize) {
            Some(record) => record.order + 1,
            None => 0,
        }
    };
    let (step_b, gate_b) = match state.layout {
        Layout::Dual => (step_of(TrackId::B), state.track(TrackId::B).gate_high),
        Layout::Single => (0, false),
    };
    crate::hal::Projection {
        step_a: step_of(TrackId::A),
        step_b,
        gate_a: state.track(TrackId::A).gate_high,
        gate_b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltane_types::Layout;

    fn dual_state() -> SequencerState {
        SequencerState::new(Layout::Dual)
    }

    #[test]
    fn note_length_matches_tempo_formula() {
        // 120 BPM, 4 beats, quarter-cycle step: 500 * 0.25 * 4 = 500 ms.
        assert_eq!(note_length_ms(120, 4, 2047), 500);
        // 120 BPM, 1 beat, quarter-cycle step: 125 ms.
        assert_eq!(note_length_ms(120, 1, 2047), 125);
    }

    #[test]
    fn play_schedules_advance_and_gate_off() {
        let mut state = dual_state();
        {
            let track = state.track_mut(TrackId::A);
            track.tempo = 120;
            track.beats = 4;
        }
        assert!(play(&mut state, TrackId::A, 1000));

        let track = state.track(TrackId::A);
        assert_eq!(track.current, 0);
        assert!(track.gate_high);
        assert_eq!(track.next_note_time, 1499);
        // Default gate 127 -> half the 500 ms step.
        assert_eq!(track.next_gate_off_time, 1249);
    }

    #[test]
    fn tick_closes_gate_exactly_once() {
        let mut state = dual_state();
        state.track_mut(TrackId::A).beats = 4;
        play(&mut state, TrackId::A, 1000);

        assert!(!tick(&mut state, 1248, false));
        assert!(tick(&mut state, 1249, false));
        let track = state.track(TrackId::A);
        assert!(!track.gate_high);
        assert_eq!(track.next_gate_off_time, 0);

        // Sentinel cleared: a later pass does not fire again.
        assert!(!tick(&mut state, 1300, false));
    }

    #[test]
    fn tick_advances_and_wraps() {
        let mut state = dual_state();
        state.track_mut(TrackId::A).beats = 4;
        play(&mut state, TrackId::A, 1000);

        for expected in [1, 2, 3, 0, 1] {
            let due = state.track(TrackId::A).next_note_time;
            tick(&mut state, due - 1, false);
            assert_ne!(state.track(TrackId::A).current, expected);
            tick(&mut state, due, false);
            assert_eq!(state.track(TrackId::A).current, expected);
            assert!(state.track(TrackId::A).gate_high);
        }
    }

    #[test]
    fn paused_track_keeps_position_and_gate_off_still_fires() {
        let mut state = dual_state();
        state.track_mut(TrackId::A).beats = 4;
        play(&mut state, TrackId::A, 1000);
        assert!(pause(&mut state, TrackId::A));

        // Way past the due time: no advance, but the pending gate-off fires.
        tick(&mut state, 2000, false);
        assert_eq!(state.track(TrackId::A).current, 0);
        assert!(!state.track(TrackId::A).gate_high);
    }

    #[test]
    fn step_forward_and_backward_wrap() {
        let mut state = dual_state();
        let track = state.track_mut(TrackId::A);
        track.current = 3;

        step_forward(&mut state, TrackId::A);
        assert_eq!(state.track(TrackId::A).current, 0);

        step_backward(&mut state, TrackId::A);
        assert_eq!(state.track(TrackId::A).current, 3);
    }

    #[test]
    fn manual_step_illegal_while_playing() {
        let mut state = dual_state();
        play(&mut state, TrackId::A, 0);
        assert!(!step_forward(&mut state, TrackId::A));
        assert!(!step_backward(&mut state, TrackId::A));
    }

    #[test]
    fn stop_clears_position_and_gate() {
        let mut state = dual_state();
        play(&mut state, TrackId::A, 0);
        assert!(stop(&mut state, TrackId::A));
        let track = state.track(TrackId::A);
        assert_eq!(track.current, -1);
        assert!(!track.active);
        assert!(!track.gate_high);
        assert_eq!(track.next_gate_off_time, 0);
    }

    #[test]
    fn external_clock_advances_only_on_edge() {
        let mut state = dual_state();
        state.track_mut(TrackId::A).clock_in = true;
        play(&mut state, TrackId::A, 0);

        // Way past the internal due time, but no edge: no advance.
        tick(&mut state, 10_000, false);
        assert_eq!(state.track(TrackId::A).current, 0);

        tick(&mut state, 10_001, true);
        assert_eq!(state.track(TrackId::A).current, 1);
    }

    #[test]
    fn edge_detector_fires_on_rising_only() {
        let mut edge = EdgeDetector::new();
        assert!(!edge.rising(false));
        assert!(edge.rising(true));
        assert!(!edge.rising(true));
        assert!(!edge.rising(false));
        assert!(edge.rising(true));
    }

    #[test]
    fn starting_track_aligns_phase_to_running_track() {
        // Track B running at step 0 with a 480 ms period, started at 1000.
        let mut state = dual_state();
        {
            let track = state.track_mut(TrackId::B);
            track.tempo = 125; // 480 ms beat
            track.beats = 4;   // 480 ms per quarter-cycle step
        }
        play(&mut state, TrackId::B, 1000);
        assert_eq!(state.track(TrackId::B).next_note_time, 1479);

        // Track A starts 30 ms later; its clock back-dates to 1000.
        state.track_mut(TrackId::A).tempo = 125;
        state.track_mut(TrackId::A).beats = 4;
        play(&mut state, TrackId::A, 1030);
        assert_eq!(state.track(TrackId::A).next_note_time, 1479);
    }

    #[test]
    fn starting_track_adopts_other_tracks_wrap_time() {
        let mut state = dual_state();
        state.track_mut(TrackId::B).beats = 4;
        play(&mut state, TrackId::B, 0);
        // Walk B to its last step.
        for _ in 0..3 {
            let due = state.track(TrackId::B).next_note_time;
            tick(&mut state, due, false);
        }
        assert_eq!(state.track(TrackId::B).current, 3);
        let wrap_at = state.track(TrackId::B).next_note_time;

        state.track_mut(TrackId::A).beats = 4;
        play(&mut state, TrackId::A, wrap_at - 100);
        assert_eq!(state.track(TrackId::A).next_note_time, wrap_at + 499);

        // The adopted anchor is in the future: the gate stays closed
        // until the aligned step begins.
        assert!(!state.track(TrackId::A).gate_high);
        tick(&mut state, wrap_at - 1, false);
        assert!(!state.track(TrackId::A).gate_high);
        assert!(tick(&mut state, wrap_at, false));
        assert!(state.track(TrackId::A).gate_high);
        assert_eq!(state.track(TrackId::A).next_gate_on_time, 0);
    }

    #[test]
    fn late_tick_anchors_at_the_scheduled_boundary() {
        let mut state = dual_state();
        state.track_mut(TrackId::A).beats = 4;
        play(&mut state, TrackId::A, 1000);
        assert_eq!(state.track(TrackId::A).next_note_time, 1499);

        // The scheduler pass arrives 7 ms late; the next step still
        // starts at 1500, so the cycle does not drift.
        tick(&mut state, 1506, false);
        let track = state.track(TrackId::A);
        assert_eq!(track.current, 1);
        assert_eq!(track.next_note_time, 1999);
        assert_eq!(track.next_gate_off_time, 1749);
    }

    #[test]
    fn override_suppresses_advance_until_released() {
        let mut state = dual_state();
        state.track_mut(TrackId::A).beats = 4;
        play(&mut state, TrackId::A, 1000);
        override_on(&mut state, TrackId::A, 2);

        tick(&mut state, 5000, false);
        assert_eq!(state.track(TrackId::A).current, 0);
        assert!(state.track(TrackId::A).gate_high);

        override_off(&mut state, TrackId::A, 5000);
        let track = state.track(TrackId::A);
        assert_eq!(track.next_gate_off_time, 5000 + OVERRIDE_GRACE_MS);
        // Advance re-armed from the release time.
        assert!(track.next_note_time > 5000);
    }

    #[test]
    fn projection_reports_one_based_orders() {
        let mut state = dual_state();
        assert_eq!(projection(&state).step_a, 0);

        play(&mut state, TrackId::A, 0);
        let p = projection(&state);
        assert_eq!(p.step_a, 1);
        assert!(p.gate_a);
        assert_eq!(p.step_b, 0);

        override_on(&mut state, TrackId::A, 3);
        assert_eq!(projection(&state).step_a, 4);
    }
}
