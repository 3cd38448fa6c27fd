//! Step records and the shared step store.
//!
//! Durations and gates are fixed-point fractions: a step occupies
//! `(duration + 1) / LEN_MAX` of its track's cycle, and its gate stays high
//! for `(gate + 1) / GATE_MAX` of the step. Storing "value minus one" keeps
//! the full-cycle sum representable: a track's active steps always satisfy
//! `Σ (duration + 1) == LEN_MAX`.

use serde::{Deserialize, Serialize};

use crate::quantize::equal_durations;
use crate::TrackId;

/// Fixed-point denominator for step durations.
pub const LEN_MAX: u32 = 8192;
/// Fixed-point denominator for gate lengths.
pub const GATE_MAX: u32 = 256;
/// Floor for recorded gate values (~20% of a step) so every recorded step
/// produces an audible pulse.
pub const GATE_MIN: u16 = 50;
/// Total step records shared by both tracks.
pub const STORE_CAPACITY: usize = 32;

/// Physical track layout, selected by the hardware mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    /// One 8-step sequencer on track A; track B is inert.
    Single,
    /// Two independent 4-step sequencers.
    #[default]
    Dual,
}

impl Layout {
    /// Maximum recordable steps per track in this layout.
    pub fn capacity(self) -> usize {
        match self {
            Layout::Single => STORE_CAPACITY,
            Layout::Dual => STORE_CAPACITY / 2,
        }
    }

    /// Active step count a track starts with after a layout reset.
    pub fn default_total(self) -> usize {
        match self {
            Layout::Single => 8,
            Layout::Dual => 4,
        }
    }

    /// Step buttons available per track (logical `order` range).
    pub fn order_count(self) -> u8 {
        match self {
            Layout::Single => 8,
            Layout::Dual => 4,
        }
    }
}

/// One scheduled event within a track's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Which logical output this step fires (track-relative, 0..7).
    pub order: u8,
    /// Cycle share minus one (0..LEN_MAX-1).
    pub duration: u16,
    /// Gate-high share of the step minus one (0..GATE_MAX-1).
    pub gate: u16,
}

impl Default for StepRecord {
    fn default() -> Self {
        Self {
            order: 0,
            duration: 0,
            gate: (GATE_MAX / 2 - 1) as u16,
        }
    }
}

/// The single packed buffer of step records for both tracks.
///
/// In dual layout track A owns records `0..16` and track B `16..32`; in
/// single layout track A owns the whole buffer. Offsets are always resolved
/// through [`StepStore::range`], never computed ad hoc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStore {
    records: Vec<StepRecord>,
}

impl Default for StepStore {
    fn default() -> Self {
        Self {
            records: vec![StepRecord::default(); STORE_CAPACITY],
        }
    }
}

impl StepStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record-index range owned by a track under the given layout.
    pub fn range(layout: Layout, track: TrackId) -> std::ops::Range<usize> {
        match (layout, track) {
            (Layout::Single, _) => 0..STORE_CAPACITY,
            (Layout::Dual, TrackId::A) => 0..STORE_CAPACITY / 2,
            (Layout::Dual, TrackId::B) => STORE_CAPACITY / 2..STORE_CAPACITY,
        }
    }

    pub fn track(&self, layout: Layout, track: TrackId) -> &[StepRecord] {
        &self.records[Self::range(layout, track)]
    }

    pub fn track_mut(&mut self, layout: Layout, track: TrackId) -> &mut [StepRecord] {
        &mut self.records[Self::range(layout, track)]
    }

    /// Step record at `index` within a track's slice, bounds-checked.
    pub fn step(&self, layout: Layout, track: TrackId, index: usize) -> Option<&StepRecord> {
        self.track(layout, track).get(index)
    }

    /// Reinitialize a single track's slice: ascending orders over `total`
    /// equal-duration steps, half-open gates, zeroed tail.
    pub fn reset_track(&mut self, layout: Layout, track: TrackId, total: usize) {
        let orders = layout.order_count();
        let durations = equal_durations(total);
        let slice = self.track_mut(layout, track);
        for (i, rec) in slice.iter_mut().enumerate() {
            if i < total {
                *rec = StepRecord {
                    order: (i as u8) % orders,
                    duration: durations[i],
                    ..StepRecord::default()
                };
            } else {
                *rec = StepRecord {
                    order: 0,
                    duration: 0,
                    gate: 0,
                };
            }
        }
    }

    /// Wholesale reset for a layout switch. Both tracks return to their
    /// compiled-in default patterns.
    pub fn reset(&mut self, layout: Layout) {
        self.reset_track(layout, TrackId::A, layout.default_total());
        match layout {
            Layout::Dual => self.reset_track(layout, TrackId::B, layout.default_total()),
            Layout::Single => {
                // Track B owns no records in single layout; nothing to clear
                // beyond what track A's reset already covered.
            }
        }
    }

    /// Sum of `(duration + 1)` over the first `total` steps of a track.
    /// Equals [`LEN_MAX`] whenever the quantization invariant holds.
    pub fn duration_sum(&self, layout: Layout, track: TrackId, total: usize) -> u32 {
        self.track(layout, track)
            .iter()
            .take(total)
            .map(|s| s.duration as u32 + 1)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_layout_splits_store_in_half() {
        assert_eq!(StepStore::range(Layout::Dual, TrackId::A), 0..16);
        assert_eq!(StepStore::range(Layout::Dual, TrackId::B), 16..32);
        assert_eq!(StepStore::range(Layout::Single, TrackId::A), 0..32);
    }

    #[test]
    fn reset_satisfies_sum_invariant() {
        let mut store = StepStore::new();
        store.reset(Layout::Dual);
        assert_eq!(store.duration_sum(Layout::Dual, TrackId::A, 4), LEN_MAX);
        assert_eq!(store.duration_sum(Layout::Dual, TrackId::B, 4), LEN_MAX);

        store.reset(Layout::Single);
        assert_eq!(store.duration_sum(Layout::Single, TrackId::A, 8), LEN_MAX);
    }

    #[test]
    fn reset_track_zeroes_inactive_tail() {
        let mut store = StepStore::new();
        store.reset_track(Layout::Dual, TrackId::A, 3);
        let slice = store.track(Layout::Dual, TrackId::A);
        assert!(slice[3..].iter().all(|s| s.duration == 0 && s.gate == 0));
        assert_eq!(slice[0].order, 0);
        assert_eq!(slice[2].order, 2);
    }

    #[test]
    fn default_dual_steps_are_quarter_cycle() {
        let mut store = StepStore::new();
        store.reset(Layout::Dual);
        for step in store.track(Layout::Dual, TrackId::A).iter().take(4) {
            assert_eq!(step.duration, 2047);
        }
    }
}
