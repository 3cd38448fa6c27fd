//! Pure state-mutation reducers.
//!
//! These functions are the single source of truth for parameter edits and
//! the only legitimate writers of the `custom_seq` / `custom_rhythm` /
//! `clock_in` flags. All numeric inputs are clamped at the point of
//! mutation; nothing is validated-and-rejected. Reducers never touch
//! `current` or the scheduled timestamps — those belong to the engine.

use crate::action::EditAction;
use crate::quantize::equal_durations;
use crate::state::SequencerState;
use crate::step::{Layout, GATE_MAX};
use crate::track::{BEATS_MAX, BEATS_MIN, TEMPO_MAX, TEMPO_MIN};

/// Gate units moved per menu click (~3% of a step).
const GATE_STEP: i32 = 8;

/// Apply a parameter edit. Returns true if any state changed.
pub fn reduce_edit(action: &EditAction, state: &mut SequencerState) -> bool {
    match action {
        EditAction::AdjustTempo(dir) => {
            let track = state.selected_track_mut();
            let tempo = (track.tempo as i32 + dir.delta()).clamp(TEMPO_MIN as i32, TEMPO_MAX as i32);
            let changed = tempo != track.tempo as i32;
            track.tempo = tempo as u16;
            changed
        }
        EditAction::AdjustBeats(dir) => {
            let track = state.selected_track_mut();
            let beats = (track.beats as i32 + dir.delta()).clamp(BEATS_MIN as i32, BEATS_MAX as i32);
            let changed = beats != track.beats as i32;
            track.beats = beats as u16;
            changed
        }
        EditAction::AdjustStepCount(dir) => {
            let capacity = state.layout.capacity();
            let track = state.selected_track_mut();
            let total = (track.total as i32 + dir.delta()).clamp(1, capacity as i32) as usize;
            if total == track.total {
                return false;
            }
            set_step_count(state, total);
            true
        }
        EditAction::AdjustGate(dir) => {
            let (layout, id, total) = {
                let track = state.selected_track();
                (state.layout, state.selected, track.total)
            };
            let mut changed = false;
            for step in state.store.track_mut(layout, id).iter_mut().take(total) {
                let gate =
                    (step.gate as i32 + dir.delta() * GATE_STEP).clamp(0, GATE_MAX as i32 - 1);
                changed |= gate != step.gate as i32;
                step.gate = gate as u16;
            }
            changed
        }
        EditAction::ToggleClockIn => {
            let track = state.selected_track_mut();
            track.clock_in = !track.clock_in;
            true
        }
        EditAction::SelectTrack(id) => {
            if state.layout == Layout::Single && *id != crate::TrackId::A {
                return false;
            }
            let changed = state.selected != *id;
            state.selected = *id;
            changed
        }
        EditAction::ResetSequence => {
            let (layout, id, total) = (state.layout, state.selected, state.selected_track().total);
            let orders = layout.order_count();
            for (i, step) in state
                .store
                .track_mut(layout, id)
                .iter_mut()
                .take(total)
                .enumerate()
            {
                step.order = (i as u8) % orders;
            }
            state.selected_track_mut().custom_seq = false;
            true
        }
        EditAction::ResetRhythm => {
            let total = state.selected_track().total;
            apply_equal_rhythm(state, total);
            state.selected_track_mut().custom_rhythm = false;
            true
        }
    }
}

/// Change the selected track's active step count, re-quantizing durations
/// to the equal split so the sum invariant holds at the new count. Recorded
/// orders on surviving steps are kept; a recorded rhythm cannot survive a
/// count change and is dropped.
fn set_step_count(state: &mut SequencerState, total: usize) {
    let old_total = state.selected_track().total;
    let (layout, id) = (state.layout, state.selected);
    let orders = layout.order_count();

    apply_equal_rhythm(state, total);
    let slice = state.store.track_mut(layout, id);
    for (i, step) in slice.iter_mut().enumerate().take(total).skip(old_total) {
        step.order = (i as u8) % orders;
        step.gate = (GATE_MAX / 2 - 1) as u16;
    }
    for step in slice.iter_mut().skip(total) {
        step.duration = 0;
        step.gate = 0;
    }

    let track = state.selected_track_mut();
    track.total = total;
    track.custom_rhythm = false;
    if track.current >= total as i16 {
        track.current = total as i16 - 1;
    }
}

fn apply_equal_rhythm(state: &mut SequencerState, total: usize) {
    let (layout, id) = (state.layout, state.selected);
    let durations = equal_durations(total);
    for (step, d) in state
        .store
        .track_mut(layout, id)
        .iter_mut()
        .zip(durations.iter())
    {
        step.duration = *d;
    }
}
