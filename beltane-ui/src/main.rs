// Re-export core crate modules so crate::config, crate::hal, etc. resolve throughout the binary
pub use beltane_core::config;
pub use beltane_core::hal;
pub use beltane_core::runtime;
pub use beltane_core::shared;

mod sim;

use std::fs::File;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use runtime::{spawn_ticker, Runtime};
use shared::{StateCell, WallClock};
use sim::{ConsoleDisplay, ConsoleInput, ConsoleOutput};

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("beltane")
        .join("beltane.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path).unwrap_or_else(|_| {
        File::create("/tmp/beltane.log").expect("Cannot create log file")
    });

    WriteLogger::init(log_level, Config::default(), log_file)
        .expect("Failed to initialize logger");

    log::info!("beltane starting (log level: {:?})", log_level);
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let config = config::Config::load();
    let cell = StateCell::new(config.initial_state());
    let clock: Arc<dyn shared::Clock> = Arc::new(WallClock::new());
    let period_ms = config.tick_period_ms();

    let stop = Arc::new(AtomicBool::new(false));
    let clock_level = Arc::new(AtomicBool::new(false));
    let (dirty_tx, dirty_rx) = crossbeam_channel::unbounded();
    let (command_tx, command_rx) = crossbeam_channel::unbounded();

    let reader = sim::spawn_stdin_reader(command_tx, stop.clone());
    let ticker = spawn_ticker(
        cell.clone(),
        clock.clone(),
        Box::new(ConsoleOutput),
        clock_level.clone(),
        dirty_tx,
        stop.clone(),
        period_ms,
    );

    println!("beltane — 1..8 step buttons, m menu, c clock pulse, s mode switch, q quit");
    let layout = cell.read(|state| state.layout);
    let input = ConsoleInput::new(command_rx, period_ms, layout);
    let mut runtime = Runtime::new(
        cell,
        clock,
        input,
        ConsoleDisplay,
        clock_level,
        dirty_rx,
        config.menu_timeout_ms(),
        config.debounce_samples(),
    );
    runtime.run(&stop, period_ms);

    let _ = ticker.join();
    let _ = reader.join();
    log::info!("beltane exiting");
}
