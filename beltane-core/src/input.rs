//! Button debouncing: raw active-low pin samples in, stable press/release
//! edges out.

use crate::hal::RawInput;
use beltane_types::Layout;

/// Logical index of the menu toggle button; 0..7 are step buttons.
pub const MENU_BUTTON: u8 = 8;

pub const BUTTON_COUNT: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Press,
    Release,
}

/// One debounced button transition with its sample timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub button: u8,
    pub edge: Edge,
    pub at: u64,
}

/// Stable-for-N-samples debouncer over all nine buttons plus the mode
/// switch. One instance, fed once per loop pass.
#[derive(Debug)]
pub struct Debouncer {
    threshold: u8,
    pressed: [bool; BUTTON_COUNT],
    counters: [u8; BUTTON_COUNT],
    /// None until the first stable reading; avoids a phantom layout event
    /// at power-up.
    switch_stable: Option<bool>,
    switch_counter: u8,
}

impl Debouncer {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.max(1),
            pressed: [false; BUTTON_COUNT],
            counters: [0; BUTTON_COUNT],
            switch_stable: None,
            switch_counter: 0,
        }
    }

    /// Debounced pressed state of a button.
    pub fn is_pressed(&self, button: u8) -> bool {
        self.pressed
            .get(button as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Feed one raw sample. Returns the stable edges produced, plus a
    /// layout change if the mode switch settled on a new position.
    pub fn sample(&mut self, raw: &RawInput, now: u64) -> (Vec<InputEvent>, Option<Layout>) {
        let mut events = Vec::new();
        for i in 0..BUTTON_COUNT {
            // Active-low pins: a low level is a press.
            let level = !raw.buttons[i];
            if level == self.pressed[i] {
                self.counters[i] = 0;
                continue;
            }
            self.counters[i] += 1;
            if self.counters[i] >= self.threshold {
                self.pressed[i] = level;
                self.counters[i] = 0;
                events.push(InputEvent {
                    button: i as u8,
                    edge: if level { Edge::Press } else { Edge::Release },
                    at: now,
                });
            }
        }

        let layout_change = self.sample_switch(raw.mode_switch);
        (events, layout_change)
    }

    fn sample_switch(&mut self, dual: bool) -> Option<Layout> {
        let stable = match self.switch_stable {
            Some(s) => s,
            None => {
                self.switch_stable = Some(dual);
                return None;
            }
        };
        if dual == stable {
            self.switch_counter = 0;
            return None;
        }
        self.switch_counter += 1;
        if self.switch_counter < self.threshold {
            return None;
        }
        self.switch_stable = Some(dual);
        self.switch_counter = 0;
        Some(if dual { Layout::Dual } else { Layout::Single })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with(pressed: &[u8]) -> RawInput {
        let mut raw = RawInput::default();
        for &b in pressed {
            raw.buttons[b as usize] = false; // active-low
        }
        raw
    }

    #[test]
    fn press_needs_stable_samples() {
        let mut deb = Debouncer::new(3);
        let down = raw_with(&[2]);

        assert!(deb.sample(&down, 0).0.is_empty());
        assert!(deb.sample(&down, 1).0.is_empty());
        let (events, _) = deb.sample(&down, 2);
        assert_eq!(
            events,
            vec![InputEvent {
                button: 2,
                edge: Edge::Press,
                at: 2
            }]
        );
        assert!(deb.is_pressed(2));

        // Held: no further events.
        assert!(deb.sample(&down, 3).0.is_empty());
    }

    #[test]
    fn bounce_resets_the_counter() {
        let mut deb = Debouncer::new(3);
        let down = raw_with(&[0]);
        let up = raw_with(&[]);

        deb.sample(&down, 0);
        deb.sample(&down, 1);
        deb.sample(&up, 2); // bounce back before threshold
        deb.sample(&down, 3);
        deb.sample(&down, 4);
        assert!(deb.sample(&down, 5).0.iter().any(|e| e.edge == Edge::Press));
    }

    #[test]
    fn release_edge_follows_press() {
        let mut deb = Debouncer::new(1);
        deb.sample(&raw_with(&[7]), 0);
        let (events, _) = deb.sample(&raw_with(&[]), 10);
        assert_eq!(
            events,
            vec![InputEvent {
                button: 7,
                edge: Edge::Release,
                at: 10
            }]
        );
    }

    #[test]
    fn first_switch_reading_is_silent() {
        let mut deb = Debouncer::new(1);
        let mut raw = RawInput::default();
        raw.mode_switch = false;
        assert_eq!(deb.sample(&raw, 0).1, None);

        raw.mode_switch = true;
        assert_eq!(deb.sample(&raw, 1).1, Some(Layout::Dual));
        assert_eq!(deb.sample(&raw, 2).1, None);

        raw.mode_switch = false;
        assert_eq!(deb.sample(&raw, 3).1, Some(Layout::Single));
    }
}
