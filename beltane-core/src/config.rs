//! TOML configuration: embedded defaults merged with an optional user
//! override file. A malformed override is logged and ignored, never fatal.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use beltane_types::{Layout, SequencerState, BEATS_MAX, BEATS_MIN, TEMPO_MAX, TEMPO_MIN, TrackId};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    tempo: Option<u16>,
    beats: Option<u16>,
    layout: Option<String>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    tick_period_ms: Option<u64>,
    menu_timeout_ms: Option<u64>,
    debounce_samples: Option<u8>,
}

pub struct Config {
    defaults: DefaultsConfig,
    runtime: RuntimeConfig,
}

impl Config {
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            apply_override(&mut base, &path);
        }

        Config {
            defaults: base.defaults,
            runtime: base.runtime,
        }
    }

    pub fn layout(&self) -> Layout {
        match self.defaults.layout.as_deref() {
            Some("single") => Layout::Single,
            Some("dual") | None => Layout::Dual,
            Some(other) => {
                log::warn!(target: "config", "unknown layout {:?}, using dual", other);
                Layout::Dual
            }
        }
    }

    /// Fresh state with the configured layout, tempo and beats applied to
    /// both tracks, clamped to the domain bounds.
    pub fn initial_state(&self) -> SequencerState {
        let mut state = SequencerState::new(self.layout());
        let tempo = self
            .defaults
            .tempo
            .unwrap_or(120)
            .clamp(TEMPO_MIN, TEMPO_MAX);
        let beats = self
            .defaults
            .beats
            .unwrap_or(1)
            .clamp(BEATS_MIN, BEATS_MAX);
        for id in [TrackId::A, TrackId::B] {
            let track = state.track_mut(id);
            track.tempo = tempo;
            track.beats = beats;
        }
        state
    }

    /// Scheduler period (~50 Hz by default).
    pub fn tick_period_ms(&self) -> u64 {
        self.runtime.tick_period_ms.unwrap_or(20).max(1)
    }

    pub fn menu_timeout_ms(&self) -> u64 {
        self.runtime.menu_timeout_ms.unwrap_or(10_000).max(1000)
    }

    pub fn debounce_samples(&self) -> u8 {
        self.runtime.debounce_samples.unwrap_or(3).max(1)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("beltane").join("config.toml"))
}

/// Merge the override file at `path` into `base`, field-wise. Missing
/// files are silent; unreadable or malformed ones warn and are ignored.
fn apply_override(base: &mut ConfigFile, path: &Path) {
    if !path.exists() {
        return;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!(target: "config", "could not read config {}: {}", path.display(), e);
            return;
        }
    };
    match toml::from_str::<ConfigFile>(&contents) {
        Ok(user) => {
            merge_defaults(&mut base.defaults, user.defaults);
            merge_runtime(&mut base.runtime, user.runtime);
        }
        Err(e) => {
            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
        }
    }
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.tempo.is_some() {
        base.tempo = user.tempo;
    }
    if user.beats.is_some() {
        base.beats = user.beats;
    }
    if user.layout.is_some() {
        base.layout = user.layout;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.tick_period_ms.is_some() {
        base.tick_period_ms = user.tick_period_ms;
    }
    if user.menu_timeout_ms.is_some() {
        base.menu_timeout_ms = user.menu_timeout_ms;
    }
    if user.debounce_samples.is_some() {
        base.debounce_samples = user.debounce_samples;
    }
}
