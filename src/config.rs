use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::clock::TICK_MS;
use crate::error::{RoundError, RoundResult};

/// Side length of the coordinate space annotation files are written in
pub const DEFAULT_SCALE: f64 = 512.0;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameMode {
    Casual,
    Competitive,
    Adventure,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Per-mode timing and scoring constants. All durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub round_duration_ms: u32,
    /// Remaining round time at which the hint is revealed
    pub hint_time_ms: u32,
    /// Remaining round time at which the timer turns urgent
    pub red_time_ms: u32,
    pub predicted_reveal_ms: u32,
    pub truth_reveal_ms: u32,
    pub evaluation_ms: u32,
    pub animation_duration_ms: u32,
    /// Search cells per side of the animation grid
    pub animation_cells: u32,
    pub ai_score_multiplier: f64,
    /// Maximum hint offset from the truth centre, per axis, in canvas pixels
    pub hint_range: i64,
    pub hint_radius: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            round_duration_ms: 10_000,
            hint_time_ms: 5_000,
            red_time_ms: 2_000,
            predicted_reveal_ms: 500,
            truth_reveal_ms: 1_000,
            evaluation_ms: 1_500,
            animation_duration_ms: 2_000,
            animation_cells: 10,
            ai_score_multiplier: 100.0,
            hint_range: 20,
            hint_radius: 30.0,
        }
    }
}

impl Timings {
    /// Checkpoints are compared for equality against tick-aligned timers, so
    /// anything off the 100ms grid would silently never fire.
    pub fn validate(&self) -> RoundResult<()> {
        let aligned = [
            ("round_duration_ms", self.round_duration_ms),
            ("hint_time_ms", self.hint_time_ms),
            ("red_time_ms", self.red_time_ms),
            ("predicted_reveal_ms", self.predicted_reveal_ms),
            ("truth_reveal_ms", self.truth_reveal_ms),
            ("evaluation_ms", self.evaluation_ms),
        ];
        for (name, value) in aligned {
            if value % TICK_MS != 0 {
                return Err(RoundError::InvalidConfig(format!(
                    "{name} ({value}) is not a multiple of {TICK_MS}ms"
                )));
            }
        }

        if !(self.red_time_ms < self.hint_time_ms && self.hint_time_ms < self.round_duration_ms) {
            return Err(RoundError::InvalidConfig(format!(
                "expected red_time ({}) < hint_time ({}) < round_duration ({})",
                self.red_time_ms, self.hint_time_ms, self.round_duration_ms
            )));
        }

        if !(0 < self.predicted_reveal_ms
            && self.predicted_reveal_ms < self.truth_reveal_ms
            && self.truth_reveal_ms < self.evaluation_ms)
        {
            return Err(RoundError::InvalidConfig(format!(
                "expected 0 < predicted_reveal ({}) < truth_reveal ({}) < evaluation ({})",
                self.predicted_reveal_ms, self.truth_reveal_ms, self.evaluation_ms
            )));
        }

        if self.animation_cells == 0 {
            return Err(RoundError::InvalidConfig(
                "animation_cells must be positive".to_string(),
            ));
        }

        if self.hint_range < 0 {
            return Err(RoundError::InvalidConfig(format!(
                "hint_range ({}) must not be negative",
                self.hint_range
            )));
        }

        Ok(())
    }

    /// Interval between animation ticks, `animation_duration / N²`, at least 1ms
    pub fn animation_interval_ms(&self) -> u64 {
        let cells = u64::from(self.animation_cells.max(1));
        let interval = (f64::from(self.animation_duration_ms) / (cells * cells) as f64).round();
        (interval as u64).max(1)
    }
}

/// Everything a single round needs to know; read-only while the round runs
#[derive(Debug, Clone, PartialEq)]
pub struct RoundConfig {
    pub game_mode: GameMode,
    pub difficulty: Difficulty,
    pub timings: Timings,
    /// Whether the predictor takes part visibly (search animation and predicted box)
    pub show_ai: bool,
    /// Side length of the square canvas in canvas-scale pixels
    pub canvas_size: f64,
}

impl RoundConfig {
    pub fn new(game_mode: GameMode, difficulty: Difficulty) -> Self {
        Self {
            game_mode,
            difficulty,
            timings: Timings::default(),
            show_ai: true,
            canvas_size: DEFAULT_SCALE,
        }
    }

    pub fn round_duration_ms(&self) -> u32 {
        self.timings.round_duration_ms
    }

    pub fn hint_time_ms(&self) -> u32 {
        self.timings.hint_time_ms
    }

    pub fn red_time_ms(&self) -> u32 {
        self.timings.red_time_ms
    }

    /// Factor mapping annotation coordinates onto the canvas
    pub fn canvas_scale(&self) -> f64 {
        self.canvas_size / DEFAULT_SCALE
    }
}

/// User preferences persisted between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub game_mode: GameMode,
    pub difficulty: Difficulty,
    pub competitive_rounds: u32,
    pub canvas_size: f64,
    /// Adventure theme, used as the prefix of level keys
    pub theme: String,
    pub annotations_dir: Option<PathBuf>,
    /// Number of image ids available per difficulty
    pub files_per_difficulty: u32,
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_mode: GameMode::Casual,
            difficulty: Difficulty::Easy,
            competitive_rounds: 10,
            canvas_size: DEFAULT_SCALE,
            theme: "lesion".to_string(),
            annotations_dir: None,
            files_per_difficulty: 100,
            timings: Timings::default(),
        }
    }
}

impl Config {
    pub fn round_config(&self) -> RoundConfig {
        RoundConfig {
            game_mode: self.game_mode,
            difficulty: self.difficulty,
            timings: self.timings.clone(),
            show_ai: true,
            canvas_size: self.canvas_size,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("spotter_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!(
                    "ignoring unreadable config at {}: {}",
                    self.path.display(),
                    e
                ),
            },
            Err(_) => log::debug!("no config at {}, using defaults", self.path.display()),
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
