//! Hardware collaborator boundaries.
//!
//! The core computes state; these traits are where it meets the physical
//! module. Pin access, shift-register bit packing and pixel rendering all
//! live behind them, out of scope here. The binary provides console/log
//! adapters; firmware targets provide the real ones.

use beltane_types::{Layout, RuntimeMode, TrackId, TrackState};

/// One raw sample of every input the panel exposes. Buttons are active-low
/// at the pin; the debouncer normalizes polarity.
#[derive(Debug, Clone, Copy)]
pub struct RawInput {
    /// 8 step buttons plus the menu button, active-low.
    pub buttons: [bool; 9],
    /// Physical single/dual mode switch (true = dual).
    pub mode_switch: bool,
    /// External clock level.
    pub clock_level: bool,
    /// Display-only voltage readback (0..1023), never stored.
    pub analog: [u16; 2],
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            // Active-low: released buttons read high.
            buttons: [true; 9],
            mode_switch: true,
            clock_level: false,
            analog: [0; 2],
        }
    }
}

/// Input collaborator: sampled once per main-loop pass.
pub trait InputPort {
    fn sample(&mut self) -> RawInput;
}

/// What the module drives: one step index and one gate per track.
/// `step_*` is 0 for none, else the 1-based logical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Projection {
    pub step_a: u8,
    pub step_b: u8,
    pub gate_a: bool,
    pub gate_b: bool,
}

/// Output collaborator: invoked once per committed state change, from the
/// tick context.
pub trait OutputPort: Send {
    fn project(&mut self, projection: Projection);
}

/// Read-only view of one track for the display.
#[derive(Debug, Clone, Copy)]
pub struct TrackView {
    pub state: TrackState,
    pub current: i16,
    pub total: usize,
    pub tempo: u16,
    pub beats: u16,
    pub clock_in: bool,
    pub custom_seq: bool,
    pub custom_rhythm: bool,
}

/// Visible slice of the menu, already filtered to the enabled subset.
#[derive(Debug, Clone)]
pub struct MenuView {
    pub labels: Vec<&'static str>,
    pub highlight: usize,
    pub selected: bool,
}

/// Everything the display renders. Handed over on the dirty edge; the
/// display has no write path back.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub mode: RuntimeMode,
    pub layout: Layout,
    pub selected: TrackId,
    pub tracks: [TrackView; 2],
    pub menu: Option<MenuView>,
    /// Steps captured so far in an active recording session.
    pub recorded_steps: Option<usize>,
    pub analog: [u16; 2],
    pub labels: crate::dispatch::Labels,
}

/// Display collaborator.
pub trait DisplayPort {
    fn render(&mut self, snapshot: &Snapshot);
}
