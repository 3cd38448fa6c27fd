//! Per-track playback state.

use serde::{Deserialize, Serialize};

use crate::step::Layout;

pub const TEMPO_MIN: u16 = 10;
pub const TEMPO_MAX: u16 = 600;
pub const BEATS_MIN: u16 = 1;
pub const BEATS_MAX: u16 = 16;

/// Observable playback state of a track, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Stopped,
    Paused,
    Playing,
    ManualOverride,
}

/// One sequencer lane.
///
/// `current`, `next_note_time` and `next_gate_off_time` are owned by the
/// scheduler tick and the engine's transport operations; nothing else may
/// write them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Playback position: -1 = stopped, else index into the active steps.
    pub current: i16,
    /// Active step count (1..=layout capacity).
    pub total: usize,
    /// Beats per minute (TEMPO_MIN..=TEMPO_MAX).
    pub tempo: u16,
    /// Cycle length multiplier (BEATS_MIN..=BEATS_MAX).
    pub beats: u16,
    /// False while paused; `current` keeps its position.
    pub active: bool,
    /// Advance on external clock edges instead of the internal tempo.
    pub clock_in: bool,
    /// Manually forced step; suppresses scheduled advance while set.
    pub override_step: Option<u8>,
    /// A hand-recorded step order is loaded.
    pub custom_seq: bool,
    /// A hand-recorded rhythm table is loaded.
    pub custom_rhythm: bool,
    /// Current gate output level.
    pub gate_high: bool,
    /// Absolute ms timestamp of the next scheduled advance.
    pub next_note_time: u64,
    /// Absolute ms timestamp for closing the gate; 0 = already fired.
    pub next_gate_off_time: u64,
    /// Deferred gate-open for a phase-aligned start whose note start is
    /// still in the future; 0 = none pending.
    pub next_gate_on_time: u64,
}

impl Track {
    pub fn new(layout: Layout) -> Self {
        Self {
            current: -1,
            total: layout.default_total(),
            tempo: 120,
            beats: 1,
            active: false,
            clock_in: false,
            override_step: None,
            custom_seq: false,
            custom_rhythm: false,
            gate_high: false,
            next_note_time: 0,
            next_gate_off_time: 0,
            next_gate_on_time: 0,
        }
    }

    pub fn state(&self) -> TrackState {
        if self.override_step.is_some() {
            TrackState::ManualOverride
        } else if self.current < 0 {
            TrackState::Stopped
        } else if self.active {
            TrackState::Playing
        } else {
            TrackState::Paused
        }
    }

    /// True while scheduled advance is running (not stopped, paused or
    /// manually overridden).
    pub fn is_playing(&self) -> bool {
        self.state() == TrackState::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_derivation() {
        let mut track = Track::new(Layout::Dual);
        assert_eq!(track.state(), TrackState::Stopped);

        track.current = 0;
        track.active = true;
        assert_eq!(track.state(), TrackState::Playing);

        track.active = false;
        assert_eq!(track.state(), TrackState::Paused);

        track.override_step = Some(2);
        assert_eq!(track.state(), TrackState::ManualOverride);
    }
}
