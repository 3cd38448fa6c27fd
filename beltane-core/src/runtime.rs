//! The polling loop and the scheduler thread, wired together.
//!
//! [`Runtime::poll`] is one main-loop pass: sample the panel, debounce,
//! route the stable edges by mode (menu, recording, manual play, idle),
//! dispatch the resulting actions inside the critical section, and render
//! when anything display-visible changed. [`spawn_ticker`] runs the
//! periodic scheduler on its own thread; it owns the output port and
//! projects exactly once per committed output change.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use beltane_types::{Action, Layout, RecordAction, RuntimeMode, Track, TrackId};

use crate::dispatch::{dispatch_action, Labels};
use crate::engine::{self, EdgeDetector};
use crate::hal::{DisplayPort, InputPort, OutputPort, Projection, Snapshot, TrackView};
use crate::input::{Debouncer, Edge, InputEvent, MENU_BUTTON};
use crate::menu::{MenuInput, MenuNavigator};
use crate::record::Recorder;
use crate::shared::{Clock, StateCell};

/// Which step button drives which track order in manual play. In single
/// layout all eight buttons address track A; in dual the left half is A
/// and the right half is B.
fn button_target(layout: Layout, button: u8) -> Option<(TrackId, u8)> {
    if button >= 8 {
        return None;
    }
    match layout {
        Layout::Single => Some((TrackId::A, button)),
        Layout::Dual => {
            if button < 4 {
                Some((TrackId::A, button))
            } else {
                Some((TrackId::B, button - 4))
            }
        }
    }
}

pub struct Runtime<I: InputPort, D: DisplayPort> {
    cell: StateCell,
    clock: Arc<dyn Clock>,
    input: I,
    display: D,
    debouncer: Debouncer,
    nav: MenuNavigator,
    recorder: Recorder,
    labels: Labels,
    /// Loop-side mirror of the external clock level, read by the ticker.
    clock_level: Arc<AtomicBool>,
    /// Display-dirty notifications from the ticker.
    dirty_rx: Receiver<()>,
    analog: [u16; 2],
}

impl<I: InputPort, D: DisplayPort> Runtime<I, D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cell: StateCell,
        clock: Arc<dyn Clock>,
        input: I,
        display: D,
        clock_level: Arc<AtomicBool>,
        dirty_rx: Receiver<()>,
        menu_timeout_ms: u64,
        debounce_samples: u8,
    ) -> Self {
        let labels = cell.read(Labels::regenerate);
        Self {
            cell,
            clock,
            input,
            display,
            debouncer: Debouncer::new(debounce_samples),
            nav: MenuNavigator::new(menu_timeout_ms),
            recorder: Recorder::new(),
            labels,
            clock_level,
            dirty_rx,
            analog: [0; 2],
        }
    }

    /// Run until `stop` is raised, one [`poll`](Self::poll) per period.
    pub fn run(&mut self, stop: &AtomicBool, period_ms: u64) {
        while !stop.load(Ordering::Relaxed) {
            self.poll();
            thread::sleep(Duration::from_millis(period_ms));
        }
    }

    /// One main-loop pass.
    pub fn poll(&mut self) {
        let now = self.clock.now_ms();
        let raw = self.input.sample();
        self.clock_level.store(raw.clock_level, Ordering::Relaxed);
        self.analog = raw.analog;

        let (events, layout_change) = self.debouncer.sample(&raw, now);
        let mut dirty = false;

        if let Some(layout) = layout_change {
            if self.cell.read(|state| state.layout) != layout {
                dirty |= self.dispatch(Action::SetLayout(layout), now);
            }
        }

        for event in events {
            dirty |= self.handle_event(event, now);
        }

        if self.nav.poll_timeout(now) {
            dirty = true;
        }

        while self.dirty_rx.try_recv().is_ok() {
            dirty = true;
        }

        if dirty {
            let snapshot = self.snapshot();
            self.display.render(&snapshot);
        }
    }

    fn handle_event(&mut self, event: InputEvent, now: u64) -> bool {
        if self.nav.is_open() {
            return self.handle_menu(event, now);
        }
        match self.cell.read(|state| state.mode) {
            RuntimeMode::RecordingSequence
            | RuntimeMode::RecordingRhythm
            | RuntimeMode::RecordingBoth => self.handle_recording(event, now),
            RuntimeMode::ManualPlay => self.handle_manual(event, now),
            RuntimeMode::Idle => {
                if event.edge == Edge::Press && event.button == MENU_BUTTON {
                    self.nav.open(now);
                    return true;
                }
                false
            }
        }
    }

    /// While the menu is open the first four step buttons double as
    /// navigation keys and the menu button closes it outright.
    fn handle_menu(&mut self, event: InputEvent, now: u64) -> bool {
        if event.edge != Edge::Press {
            return false;
        }
        if event.button == MENU_BUTTON {
            self.nav.close();
            return true;
        }
        let input = match event.button {
            0 => MenuInput::Up,
            1 => MenuInput::Down,
            2 => MenuInput::Enter,
            3 => MenuInput::Back,
            _ => return false,
        };
        let nav = &mut self.nav;
        let action = self.cell.read(|state| nav.handle(input, state, now));
        if let Some(action) = action {
            self.dispatch(action, now);
            // Session starts take over the step buttons; the menu yields.
            if self.cell.read(|state| state.mode) != RuntimeMode::Idle {
                self.nav.close();
            }
        }
        true
    }

    fn handle_recording(&mut self, event: InputEvent, now: u64) -> bool {
        if event.button == MENU_BUTTON {
            if event.edge == Edge::Press {
                return self.dispatch(Action::Record(RecordAction::Finish), now);
            }
            return false;
        }
        match event.edge {
            Edge::Press => {
                let before = self.recorder.steps_captured();
                if self.recorder.press(event.button, now) {
                    return self.dispatch(Action::Record(RecordAction::Finish), now);
                }
                self.recorder.steps_captured() != before
            }
            Edge::Release => {
                self.recorder.release(event.button, now);
                false
            }
        }
    }

    fn handle_manual(&mut self, event: InputEvent, now: u64) -> bool {
        if event.button == MENU_BUTTON {
            if event.edge == Edge::Press {
                return self.dispatch(Action::LeaveManualPlay, now);
            }
            return false;
        }
        let layout = self.cell.read(|state| state.layout);
        let (id, order) = match button_target(layout, event.button) {
            Some(target) => target,
            None => return false,
        };
        match event.edge {
            Edge::Press => self.cell.with(|state| engine::override_on(state, id, order)),
            Edge::Release => self.cell.with(|state| engine::override_off(state, id, now)),
        }
    }

    fn dispatch(&mut self, action: Action, now: u64) -> bool {
        let cell = &self.cell;
        let recorder = &mut self.recorder;
        let labels = &mut self.labels;
        let result =
            cell.with(|state| dispatch_action(&action, state, recorder, labels, now));
        if result.display_dirty {
            let nav = &mut self.nav;
            cell.read(|state| nav.clamp_highlight(state));
        }
        result.display_dirty
    }

    fn snapshot(&self) -> Snapshot {
        let nav = &self.nav;
        let recorded_steps = self.recorder.active().then(|| self.recorder.steps_captured());
        let labels = self.labels.clone();
        let analog = self.analog;
        self.cell.read(|state| Snapshot {
            mode: state.mode,
            layout: state.layout,
            selected: state.selected,
            tracks: [
                track_view(state.track(TrackId::A)),
                track_view(state.track(TrackId::B)),
            ],
            menu: nav.view(state),
            recorded_steps,
            analog,
            labels,
        })
    }

    #[cfg(test)]
    pub(crate) fn cell(&self) -> &StateCell {
        &self.cell
    }
}

fn track_view(track: &Track) -> TrackView {
    TrackView {
        state: track.state(),
        current: track.current,
        total: track.total,
        tempo: track.tempo,
        beats: track.beats,
        clock_in: track.clock_in,
        custom_seq: track.custom_seq,
        custom_rhythm: track.custom_rhythm,
    }
}

/// Start the periodic scheduler thread. It ticks the engine, diffs the
/// physical projection and pushes it to the output port on change, and
/// nudges the loop when the display needs redrawing.
pub fn spawn_ticker(
    cell: StateCell,
    clock: Arc<dyn Clock>,
    mut output: Box<dyn OutputPort>,
    clock_level: Arc<AtomicBool>,
    dirty_tx: Sender<()>,
    stop: Arc<AtomicBool>,
    period_ms: u64,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut edges = EdgeDetector::new();
        let mut last: Option<Projection> = None;
        log::info!(target: "ticker", "scheduler running at {} ms period", period_ms);
        while !stop.load(Ordering::Relaxed) {
            let now = clock.now_ms();
            let edge = edges.rising(clock_level.load(Ordering::Relaxed));
            let (changed, projection) = cell.with(|state| {
                let changed = engine::tick(state, now, edge);
                (changed, engine::projection(state))
            });
            if last != Some(projection) {
                output.project(projection);
                last = Some(projection);
            }
            if changed {
                let _ = dirty_tx.send(());
            }
            thread::sleep(Duration::from_millis(period_ms));
        }
    })
}
