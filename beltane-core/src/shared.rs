//! Shared-state critical section and the monotonic clock.
//!
//! The scheduler tick and the polling loop both mutate [`SequencerState`].
//! On the target every cross-field update masks the timer interrupt for its
//! duration; on a host with real threads the same contract is a mutex held
//! for one scoped closure. Either way the tick never observes a torn
//! intermediate state, and a section once entered always completes — there
//! is no early-exit path that skips release.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use beltane_types::SequencerState;

/// Monotonic millisecond source. The binary uses [`WallClock`]; tests drive
/// a [`TestClock`] by hand.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since process start.
pub struct WallClock {
    epoch: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Manually stepped clock for tests.
pub struct TestClock {
    now: Mutex<u64>,
}

impl TestClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, ms: u64) {
        *self.now.lock().unwrap() += ms;
    }

    pub fn set(&self, ms: u64) {
        *self.now.lock().unwrap() = ms;
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> u64 {
        *self.now.lock().unwrap()
    }
}

/// The one owned state context, shared between the tick context and the
/// polling loop. All access goes through [`StateCell::with`].
#[derive(Clone)]
pub struct StateCell {
    inner: Arc<Mutex<SequencerState>>,
}

impl StateCell {
    pub fn new(state: SequencerState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Run `f` inside the critical section. Multi-field updates visible to
    /// the tick must happen inside a single call.
    pub fn with<R>(&self, f: impl FnOnce(&mut SequencerState) -> R) -> R {
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            // A panicked holder cannot leave a torn commit worse than the
            // poisoned flag itself; the state stays usable.
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// Read-only snapshot access.
    pub fn read<R>(&self, f: impl FnOnce(&SequencerState) -> R) -> R {
        self.with(|state| f(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltane_types::Layout;

    #[test]
    fn with_commits_multi_field_updates_atomically() {
        let cell = StateCell::new(SequencerState::new(Layout::Dual));
        cell.with(|state| {
            let track = state.selected_track_mut();
            track.current = 2;
            track.next_note_time = 500;
            track.next_gate_off_time = 250;
        });
        cell.read(|state| {
            let track = state.selected_track();
            assert_eq!(
                (track.current, track.next_note_time, track.next_gate_off_time),
                (2, 500, 250)
            );
        });
    }

    #[test]
    fn test_clock_steps() {
        let clock = TestClock::new(100);
        assert_eq!(clock.now_ms(), 100);
        clock.advance(20);
        assert_eq!(clock.now_ms(), 120);
    }
}
