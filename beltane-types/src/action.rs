//! Typed actions for the dispatch system.
//!
//! Every user intent is an enum variant with a typed payload; there are no
//! stringly-coded action characters anywhere. Dispatch is a single match in
//! the core crate.

use serde::{Deserialize, Serialize};

use crate::step::Layout;
use crate::TrackId;

/// Value-edit direction supplied by the menu while an item is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn delta(self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

/// Playback transport for the selected track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportAction {
    Play,
    Pause,
    /// Play when stopped or paused, pause when playing.
    TogglePlay,
    Stop,
    StepForward,
    StepBackward,
}

/// Parameter edits for the selected track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditAction {
    AdjustTempo(Direction),
    AdjustBeats(Direction),
    AdjustStepCount(Direction),
    AdjustGate(Direction),
    ToggleClockIn,
    SelectTrack(TrackId),
    /// Discard the recorded step order, back to ascending defaults.
    ResetSequence,
    /// Discard the recorded rhythm, back to equal durations.
    ResetRhythm,
}

/// Recording session control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordAction {
    StartSequence,
    StartRhythm,
    StartBoth,
    Finish,
}

/// Umbrella action type dispatched through the single core match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Transport(TransportAction),
    Edit(EditAction),
    Record(RecordAction),
    EnterManualPlay,
    LeaveManualPlay,
    SetLayout(Layout),
}

/// Parameter kinds bound to selectable menu items. The navigator supplies
/// the direction when the item is selected and UP/DOWN arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustKind {
    Tempo,
    Beats,
    StepCount,
    Gate,
}

impl AdjustKind {
    pub fn action(self, direction: Direction) -> Action {
        Action::Edit(match self {
            AdjustKind::Tempo => EditAction::AdjustTempo(direction),
            AdjustKind::Beats => EditAction::AdjustBeats(direction),
            AdjustKind::StepCount => EditAction::AdjustStepCount(direction),
            AdjustKind::Gate => EditAction::AdjustGate(direction),
        })
    }
}

/// Result of dispatching an action — side effects for the runtime loop.
/// Output projection is not signalled here: the tick context re-projects
/// whenever the committed state differs from what it last drove out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchResult {
    /// The display snapshot must be regenerated.
    pub display_dirty: bool,
}

impl DispatchResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn dirty() -> Self {
        Self {
            display_dirty: true,
        }
    }

    pub fn changed(changed: bool) -> Self {
        Self {
            display_dirty: changed,
        }
    }

    pub fn merge(&mut self, other: DispatchResult) {
        self.display_dirty |= other.display_dirty;
    }
}
