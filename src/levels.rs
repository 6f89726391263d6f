//! Adventure levels: what each level asks of the player and how its stars are earned.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::{Config, Difficulty, GameMode, RoundConfig};
use crate::error::{RoundError, RoundResult};

/// How a level ranks a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LevelType {
    /// Fewer rounds to reach the requirement is better
    Fastest,
    /// Higher total score is better
    Set,
    /// Higher player-to-predictor score ratio is better
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameModeLevel {
    pub type_level: LevelType,
    /// Thresholds for one, two and three stars
    pub star_thresholds: [f64; 3],
    /// Player total that completes the level
    pub level_requirement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdventureLevel {
    pub index: u32,
    pub difficulty: Difficulty,
    /// Rounds available before the level ends regardless of score
    pub rounds: u32,
    pub game_mode: GameModeLevel,
}

impl AdventureLevel {
    /// Storage key of this level's star rank, e.g. `lesion2`
    pub fn key(&self, theme: &str) -> String {
        level_key(theme, self.index)
    }

    /// The predictor only plays visibly on levels ranked against it
    pub fn show_ai(&self) -> bool {
        self.game_mode.type_level == LevelType::Ai
    }

    pub fn round_config(&self, base: &Config) -> RoundConfig {
        RoundConfig {
            game_mode: GameMode::Adventure,
            difficulty: self.difficulty,
            timings: base.timings.clone(),
            show_ai: self.show_ai(),
            canvas_size: base.canvas_size,
        }
    }
}

pub fn level_key(theme: &str, index: u32) -> String {
    format!("{theme}{index}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelCatalog {
    pub theme: String,
    pub levels: Vec<AdventureLevel>,
}

impl LevelCatalog {
    /// Built-in three level story
    pub fn lesion() -> Self {
        Self {
            theme: "lesion".to_string(),
            levels: vec![
                AdventureLevel {
                    index: 0,
                    difficulty: Difficulty::Easy,
                    rounds: 5,
                    game_mode: GameModeLevel {
                        type_level: LevelType::Fastest,
                        star_thresholds: [5.0, 3.0, 1.0],
                        level_requirement: 1.0,
                    },
                },
                AdventureLevel {
                    index: 1,
                    difficulty: Difficulty::Easy,
                    rounds: 5,
                    game_mode: GameModeLevel {
                        type_level: LevelType::Set,
                        star_thresholds: [1.0, 2.0, 3.0],
                        level_requirement: 3.0,
                    },
                },
                AdventureLevel {
                    index: 2,
                    difficulty: Difficulty::Medium,
                    rounds: 5,
                    game_mode: GameModeLevel {
                        type_level: LevelType::Ai,
                        star_thresholds: [0.5, 1.0, 1.5],
                        level_requirement: 3.0,
                    },
                },
            ],
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> RoundResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .map_err(|e| RoundError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| RoundError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    pub fn get(&self, index: u32) -> Option<&AdventureLevel> {
        self.levels.iter().find(|l| l.index == index)
    }

    pub fn next_after(&self, index: u32) -> Option<&AdventureLevel> {
        self.levels
            .iter()
            .filter(|l| l.index > index)
            .min_by_key(|l| l.index)
    }
}

impl Default for LevelCatalog {
    fn default() -> Self {
        Self::lesion()
    }
}
