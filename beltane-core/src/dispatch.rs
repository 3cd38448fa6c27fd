//! The single action → state-mutation entry point.
//!
//! Every handler runs inside the caller's critical section, enforces its
//! own bounds, and regenerates the display label strings from the new
//! numeric state. Transport goes through the engine; parameter edits go
//! through the pure reducers.

use beltane_types::reduce::reduce_edit;
use beltane_types::{
    Action, DispatchResult, RecordAction, RuntimeMode, SequencerState, TransportAction, GATE_MAX,
};

use crate::engine;
use crate::record::Recorder;

/// Human-readable strings derived from numeric state, regenerated by
/// dispatch after every mutation.
#[derive(Debug, Clone, Default)]
pub struct Labels {
    pub tempo: String,
    pub beats: String,
    pub steps: String,
    pub gate: String,
}

impl Labels {
    pub fn regenerate(state: &SequencerState) -> Self {
        let track = state.selected_track();
        let gate = state
            .store
            .step(state.layout, state.selected, track.current.max(0) as usize)
            .map(|s| s.gate)
            .unwrap_or(0);
        Self {
            tempo: format!("{} bpm", track.tempo),
            beats: format!("{} beats", track.beats),
            steps: format!("{}/{} steps", track.total, state.layout.capacity()),
            gate: format!("{}%", (gate as u32 + 1) * 100 / GATE_MAX),
        }
    }
}

/// Dispatch one action. The caller holds the critical section; the
/// recorder and labels are loop-context state and never seen by the tick.
pub fn dispatch_action(
    action: &Action,
    state: &mut SequencerState,
    recorder: &mut Recorder,
    labels: &mut Labels,
    now: u64,
) -> DispatchResult {
    let result = match action {
        Action::Transport(t) => dispatch_transport(t, state, now),
        Action::Edit(e) => DispatchResult::changed(reduce_edit(e, state)),
        Action::Record(r) => dispatch_record(r, state, recorder, now),
        Action::EnterManualPlay => {
            if state.mode != RuntimeMode::Idle {
                DispatchResult::none()
            } else {
                state.mode = RuntimeMode::ManualPlay;
                DispatchResult::dirty()
            }
        }
        Action::LeaveManualPlay => {
            if state.mode != RuntimeMode::ManualPlay {
                DispatchResult::none()
            } else {
                for id in [beltane_types::TrackId::A, beltane_types::TrackId::B] {
                    engine::override_off(state, id, now);
                }
                state.mode = RuntimeMode::Idle;
                DispatchResult::dirty()
            }
        }
        Action::SetLayout(layout) => {
            // A live recording cannot survive the store reinit.
            recorder.abort(state);
            state.set_layout(*layout);
            log::info!(target: "dispatch", "layout switched to {:?}", layout);
            DispatchResult::dirty()
        }
    };

    if result.display_dirty {
        *labels = Labels::regenerate(state);
    }
    result
}

fn dispatch_transport(
    action: &TransportAction,
    state: &mut SequencerState,
    now: u64,
) -> DispatchResult {
    let id = state.selected;
    let changed = match action {
        TransportAction::Play => engine::play(state, id, now),
        TransportAction::Pause => engine::pause(state, id),
        TransportAction::TogglePlay => {
            if state.track(id).is_playing() {
                engine::pause(state, id)
            } else {
                engine::play(state, id, now)
            }
        }
        TransportAction::Stop => engine::stop(state, id),
        TransportAction::StepForward => engine::step_forward(state, id),
        TransportAction::StepBackward => engine::step_backward(state, id),
    };
    DispatchResult::changed(changed)
}

fn dispatch_record(
    action: &RecordAction,
    state: &mut SequencerState,
    recorder: &mut Recorder,
    now: u64,
) -> DispatchResult {
    let changed = match action {
        RecordAction::StartSequence => recorder.start(RuntimeMode::RecordingSequence, state),
        RecordAction::StartRhythm => recorder.start(RuntimeMode::RecordingRhythm, state),
        RecordAction::StartBoth => recorder.start(RuntimeMode::RecordingBoth, state),
        RecordAction::Finish => {
            // Either outcome leaves recording mode, so the display changes.
            recorder.finish(state, now);
            true
        }
    };
    DispatchResult::changed(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltane_types::{Direction, EditAction, Layout, TrackId, TEMPO_MAX};

    struct Harness {
        state: SequencerState,
        recorder: Recorder,
        labels: Labels,
    }

    impl Harness {
        fn new() -> Self {
            let state = SequencerState::new(Layout::Dual);
            let labels = Labels::regenerate(&state);
            Self {
                state,
                recorder: Recorder::new(),
                labels,
            }
        }

        fn dispatch(&mut self, action: Action, now: u64) -> DispatchResult {
            dispatch_action(
                &action,
                &mut self.state,
                &mut self.recorder,
                &mut self.labels,
                now,
            )
        }
    }

    #[test]
    fn tempo_edit_updates_labels() {
        let mut h = Harness::new();
        assert_eq!(h.labels.tempo, "120 bpm");
        h.dispatch(Action::Edit(EditAction::AdjustTempo(Direction::Up)), 0);
        assert_eq!(h.labels.tempo, "121 bpm");
    }

    #[test]
    fn tempo_clamps_through_dispatch() {
        let mut h = Harness::new();
        h.state.selected_track_mut().tempo = TEMPO_MAX;
        let result = h.dispatch(Action::Edit(EditAction::AdjustTempo(Direction::Up)), 0);
        assert!(!result.display_dirty);
        assert_eq!(h.state.selected_track().tempo, TEMPO_MAX);
    }

    #[test]
    fn toggle_play_round_trips() {
        let mut h = Harness::new();
        h.dispatch(Action::Transport(TransportAction::TogglePlay), 100);
        assert!(h.state.track(TrackId::A).is_playing());
        h.dispatch(Action::Transport(TransportAction::TogglePlay), 200);
        assert!(!h.state.track(TrackId::A).is_playing());
        assert_eq!(h.state.track(TrackId::A).current, 0);
    }

    #[test]
    fn manual_play_requires_idle() {
        let mut h = Harness::new();
        h.dispatch(Action::Record(RecordAction::StartRhythm), 0);
        let result = h.dispatch(Action::EnterManualPlay, 1);
        assert!(!result.display_dirty);
        assert_eq!(h.state.mode, RuntimeMode::RecordingRhythm);
    }

    #[test]
    fn layout_switch_aborts_recording_and_resets() {
        let mut h = Harness::new();
        h.dispatch(Action::Record(RecordAction::StartRhythm), 0);
        h.recorder.press(0, 0);

        h.dispatch(Action::SetLayout(Layout::Single), 50);
        assert_eq!(h.state.mode, RuntimeMode::Idle);
        assert_eq!(h.state.layout, Layout::Single);
        assert_eq!(h.state.track(TrackId::A).total, 8);
        assert!(!h.recorder.active());
    }

    #[test]
    fn gate_label_reads_current_step() {
        let h = Harness::new();
        // Default gate 127 -> 50%.
        assert_eq!(h.labels.gate, "50%");
    }
}
