//! The engine-owned state context shared between the tick and the loop.

use serde::{Deserialize, Serialize};

use crate::step::{Layout, StepStore};
use crate::track::Track;
use crate::TrackId;

/// Process-wide runtime mode; exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RuntimeMode {
    #[default]
    Idle,
    /// Step buttons force manual steps instead of editing.
    ManualPlay,
    /// Button presses append step orders.
    RecordingSequence,
    /// Button timing becomes the rhythm table.
    RecordingRhythm,
    /// Orders and timing captured together.
    RecordingBoth,
}

impl RuntimeMode {
    pub fn is_recording(self) -> bool {
        matches!(
            self,
            RuntimeMode::RecordingSequence | RuntimeMode::RecordingRhythm | RuntimeMode::RecordingBoth
        )
    }
}

/// All sequencer state: both tracks, the shared step store, and the runtime
/// mode. There is exactly one instance, owned by the engine and handed to
/// every operation; mutations visible to the tick go through the critical
/// section wrapper in the core crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerState {
    pub layout: Layout,
    pub mode: RuntimeMode,
    /// Track targeted by menu edits and recording.
    pub selected: TrackId,
    pub store: StepStore,
    pub tracks: [Track; 2],
}

impl SequencerState {
    pub fn new(layout: Layout) -> Self {
        let mut store = StepStore::new();
        store.reset(layout);
        Self {
            layout,
            mode: RuntimeMode::Idle,
            selected: TrackId::A,
            store,
            tracks: [Track::new(layout), Track::new(layout)],
        }
    }

    pub fn track(&self, id: TrackId) -> &Track {
        &self.tracks[id.index()]
    }

    pub fn track_mut(&mut self, id: TrackId) -> &mut Track {
        &mut self.tracks[id.index()]
    }

    pub fn selected_track(&self) -> &Track {
        self.track(self.selected)
    }

    pub fn selected_track_mut(&mut self) -> &mut Track {
        let id = self.selected;
        self.track_mut(id)
    }

    /// Reinitialize for a physical layout switch: both tracks stop and the
    /// step store returns to the layout's default patterns.
    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
        self.store.reset(layout);
        self.tracks = [Track::new(layout), Track::new(layout)];
        self.selected = TrackId::A;
        self.mode = RuntimeMode::Idle;
    }
}
