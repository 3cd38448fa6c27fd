//! # beltane-core
//!
//! Firmware core for the Beltane CV step sequencer: scheduling, recording,
//! menu navigation and action dispatch, independent of any hardware target.
//! The hardware meets the core only through the port traits in [`hal`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::atomic::AtomicBool;
//! use std::sync::Arc;
//!
//! use beltane_core::config::Config;
//! use beltane_core::runtime::{spawn_ticker, Runtime};
//! use beltane_core::shared::{StateCell, WallClock};
//!
//! // 1. Build the shared state from config defaults
//! let config = Config::load();
//! let cell = StateCell::new(config.initial_state());
//! let clock = Arc::new(WallClock::new());
//!
//! // 2. Start the scheduler thread; it owns the output port
//! let clock_level = Arc::new(AtomicBool::new(false));
//! let stop = Arc::new(AtomicBool::new(false));
//! let (dirty_tx, dirty_rx) = crossbeam_channel::unbounded();
//! let ticker = spawn_ticker(
//!     cell.clone(), clock.clone(), output, clock_level.clone(),
//!     dirty_tx, stop.clone(), config.tick_period_ms(),
//! );
//!
//! // 3. Run the polling loop with the input and display ports
//! let mut runtime = Runtime::new(
//!     cell, clock, input, display, clock_level, dirty_rx,
//!     config.menu_timeout_ms(), config.debounce_samples(),
//! );
//! runtime.run(&stop, config.tick_period_ms());
//! ```
//!
//! ## Module Overview
//!
//! - [`engine`] — per-track scheduler: timing math, the periodic tick,
//!   transport operations, phase sync, manual overrides
//! - [`record`] — live capture sessions and exact-sum quantized commit
//! - [`menu`] — navigation over the flat menu table
//! - [`dispatch`] — the single action → state-mutation entry point
//! - [`input`] — debouncing of raw panel samples into stable edges
//! - [`runtime`] — the polling loop and the scheduler thread
//! - [`hal`] — port traits the hardware (or a host adapter) implements
//! - [`shared`] — the critical-section state cell and the clock
//! - [`config`] — embedded TOML defaults plus user override

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod hal;
pub mod input;
pub mod menu;
pub mod record;
pub mod runtime;
pub mod shared;
