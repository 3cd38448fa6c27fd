//! Host adapters for the core's hardware ports.
//!
//! On a desktop there is no panel, no shift register and no OLED, so the
//! binary substitutes a line-based console: stdin commands become button
//! holds, the projection prints as it changes, and the display renders as
//! a status block. The core cannot tell the difference.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use beltane_core::hal::{DisplayPort, InputPort, OutputPort, Projection, RawInput, Snapshot};
use beltane_types::{Layout, RuntimeMode, TrackId};

/// How long a stdin tap holds its button, when no hold time is given.
const DEFAULT_HOLD_MS: u64 = 100;
/// How long a simulated external clock pulse stays high.
const CLOCK_PULSE_MS: u64 = 40;

#[derive(Debug, Clone, Copy)]
pub enum Command {
    /// Hold a button down for the given time.
    Tap { button: u8, hold_ms: u64 },
    ClockPulse,
    ToggleSwitch,
}

/// Parse one stdin line. Buttons are `1`..`8` for the step buttons and
/// `m` for the menu button; an optional second token is the hold time in
/// milliseconds (`3 600` holds step button 3 for 600 ms). `c` pulses the
/// external clock, `s` flips the mode switch, `q` quits.
fn parse_line(line: &str) -> Option<Command> {
    let mut tokens = line.split_whitespace();
    let head = tokens.next()?;
    let hold_ms = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .unwrap_or(DEFAULT_HOLD_MS);
    match head {
        "m" => Some(Command::Tap {
            button: beltane_core::input::MENU_BUTTON,
            hold_ms,
        }),
        "c" => Some(Command::ClockPulse),
        "s" => Some(Command::ToggleSwitch),
        _ => {
            let n: u8 = head.parse().ok()?;
            if (1..=8).contains(&n) {
                Some(Command::Tap {
                    button: n - 1,
                    hold_ms,
                })
            } else {
                None
            }
        }
    }
}

/// Read stdin lines into commands until EOF or `q`, then raise `stop`.
pub fn spawn_stdin_reader(tx: Sender<Command>, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };
            let trimmed = line.trim();
            if trimmed == "q" {
                break;
            }
            match parse_line(trimmed) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None if trimmed.is_empty() => {}
                None => eprintln!("? unrecognized: {trimmed}"),
            }
        }
        stop.store(true, Ordering::Relaxed);
    })
}

/// Input port fed by the stdin reader. Holds are counted down in samples
/// so a tap survives debouncing.
pub struct ConsoleInput {
    rx: Receiver<Command>,
    period_ms: u64,
    held: [u32; 9],
    clock_samples: u32,
    switch_dual: bool,
}

impl ConsoleInput {
    pub fn new(rx: Receiver<Command>, period_ms: u64, initial_layout: Layout) -> Self {
        Self {
            rx,
            period_ms: period_ms.max(1),
            held: [0; 9],
            clock_samples: 0,
            switch_dual: initial_layout == Layout::Dual,
        }
    }

    fn samples_for(&self, ms: u64) -> u32 {
        (ms / self.period_ms).max(1) as u32
    }
}

impl InputPort for ConsoleInput {
    fn sample(&mut self) -> RawInput {
        while let Ok(command) = self.rx.try_recv() {
            match command {
                Command::Tap { button, hold_ms } => {
                    // Long enough for the debouncer plus the hold.
                    let samples = self.samples_for(hold_ms) + 3;
                    if let Some(slot) = self.held.get_mut(button as usize) {
                        *slot = samples;
                    }
                }
                Command::ClockPulse => self.clock_samples = self.samples_for(CLOCK_PULSE_MS) + 3,
                Command::ToggleSwitch => self.switch_dual = !self.switch_dual,
            }
        }

        let mut raw = RawInput::default();
        for (i, remaining) in self.held.iter_mut().enumerate() {
            if *remaining > 0 {
                *remaining -= 1;
                // Active-low: held reads low.
                raw.buttons[i] = false;
            }
        }
        if self.clock_samples > 0 {
            self.clock_samples -= 1;
            raw.clock_level = true;
        }
        raw.mode_switch = self.switch_dual;
        raw
    }
}

/// Output port that prints the projection as it changes, standing in for
/// the step and gate lines.
#[derive(Default)]
pub struct ConsoleOutput;

impl OutputPort for ConsoleOutput {
    fn project(&mut self, projection: Projection) {
        let step = |s: u8| -> String {
            if s == 0 {
                "-".into()
            } else {
                s.to_string()
            }
        };
        let gate = |g: bool| if g { "on " } else { "off" };
        println!(
            "out | A step {} gate {} | B step {} gate {}",
            step(projection.step_a),
            gate(projection.gate_a),
            step(projection.step_b),
            gate(projection.gate_b),
        );
    }
}

/// Display port that renders the snapshot as a status block.
#[derive(Default)]
pub struct ConsoleDisplay;

impl DisplayPort for ConsoleDisplay {
    fn render(&mut self, snapshot: &Snapshot) {
        if let Some(menu) = &snapshot.menu {
            println!("menu:");
            for (i, label) in menu.labels.iter().enumerate() {
                let marker = if i == menu.highlight {
                    if menu.selected {
                        "*"
                    } else {
                        ">"
                    }
                } else {
                    " "
                };
                println!("  {marker} {label}");
            }
            return;
        }

        let mode = match snapshot.mode {
            RuntimeMode::Idle => "idle",
            RuntimeMode::ManualPlay => "manual",
            RuntimeMode::RecordingSequence => "rec seq",
            RuntimeMode::RecordingRhythm => "rec rhythm",
            RuntimeMode::RecordingBoth => "rec both",
        };
        let layout = match snapshot.layout {
            Layout::Single => "single",
            Layout::Dual => "dual",
        };
        print!("{mode} [{layout}]");
        for (id, view) in [TrackId::A, TrackId::B].into_iter().zip(snapshot.tracks) {
            if snapshot.layout == Layout::Single && id == TrackId::B {
                continue;
            }
            let mark = if id == snapshot.selected { "*" } else { " " };
            print!(
                " |{mark}{id} {:?} step {}/{}",
                view.state,
                view.current + 1,
                view.total
            );
        }
        print!(
            " | {} {} {} gate {}",
            snapshot.labels.tempo, snapshot.labels.beats, snapshot.labels.steps, snapshot.labels.gate
        );
        if let Some(captured) = snapshot.recorded_steps {
            print!(" | captured {captured}");
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_step_and_menu_taps() {
        match parse_line("3 600") {
            Some(Command::Tap { button, hold_ms }) => {
                assert_eq!(button, 2);
                assert_eq!(hold_ms, 600);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_line("m"),
            Some(Command::Tap { button: 8, .. })
        ));
        assert!(matches!(parse_line("c"), Some(Command::ClockPulse)));
        assert!(parse_line("9").is_none());
        assert!(parse_line("hello").is_none());
    }

    #[test]
    fn tap_holds_for_enough_samples() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut input = ConsoleInput::new(rx, 20, Layout::Dual);
        tx.send(Command::Tap {
            button: 0,
            hold_ms: 100,
        })
        .unwrap();

        // 100 ms / 20 ms + 3 = 8 pressed samples.
        for _ in 0..8 {
            assert!(!input.sample().buttons[0]);
        }
        assert!(input.sample().buttons[0]);
    }
}
