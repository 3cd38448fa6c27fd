//! # beltane-types
//!
//! Shared type definitions for the beltane sequencer firmware core: the
//! step data model, track state, typed actions, the menu table, and the
//! pure quantization/reduction algorithms. No I/O, no clocks — everything
//! here is deterministic and unit-testable.

pub mod action;
pub mod menu;
pub mod quantize;
pub mod reduce;
pub mod state;
pub mod step;
pub mod track;

pub use action::*;
pub use state::{RuntimeMode, SequencerState};
pub use step::{Layout, StepRecord, StepStore, GATE_MAX, GATE_MIN, LEN_MAX, STORE_CAPACITY};
pub use track::{Track, TrackState, BEATS_MAX, BEATS_MIN, TEMPO_MAX, TEMPO_MIN};

/// Identifier for one of the two sequencer lanes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum TrackId {
    A,
    B,
}

impl TrackId {
    pub fn index(self) -> usize {
        match self {
            TrackId::A => 0,
            TrackId::B => 1,
        }
    }

    pub fn other(self) -> TrackId {
        match self {
            TrackId::A => TrackId::B,
            TrackId::B => TrackId::A,
        }
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackId::A => write!(f, "A"),
            TrackId::B => write!(f, "B"),
        }
    }
}
