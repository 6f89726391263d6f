use serde::Serialize;

use crate::config::{Difficulty, GameMode};
use crate::scoring::RoundOutcome;
use crate::util::mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Winner {
    Player,
    Ai,
    Draw,
}

/// Running totals for one game. Only the orchestrator mutates it, and only
/// through [`GameSession::record`].
#[derive(Debug, Clone)]
pub struct GameSession {
    mode: GameMode,
    difficulty: Difficulty,
    round_duration_ms: u32,
    player_total: f64,
    ai_total: f64,
    round_index: u32,
    planned_rounds: Option<u32>,
    correct_answer_count: u32,
    ai_correct_count: u32,
    used_hint_ever: bool,
    history: Vec<RoundOutcome>,
}

impl GameSession {
    pub fn new(mode: GameMode, difficulty: Difficulty, round_duration_ms: u32) -> Self {
        Self {
            mode,
            difficulty,
            round_duration_ms,
            player_total: 0.0,
            ai_total: 0.0,
            round_index: 0,
            planned_rounds: None,
            correct_answer_count: 0,
            ai_correct_count: 0,
            used_hint_ever: false,
            history: Vec::new(),
        }
    }

    /// Fix the number of rounds the game is meant to last
    pub fn with_planned_rounds(mut self, rounds: u32) -> Self {
        self.planned_rounds = Some(rounds);
        self
    }

    /// Fold a finished round into the totals. Outcomes are append-only.
    pub fn record(&mut self, outcome: RoundOutcome) -> &RoundOutcome {
        self.round_index += 1;
        self.player_total += outcome.player_round_score;
        self.ai_total += outcome.ai_round_score;
        if outcome.player_correct {
            self.correct_answer_count += 1;
        }
        if outcome.ai_correct {
            self.ai_correct_count += 1;
        }
        self.used_hint_ever |= outcome.hinted;
        self.history.push(outcome);
        &self.history[self.history.len() - 1]
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn round_duration_ms(&self) -> u32 {
        self.round_duration_ms
    }

    pub fn player_total(&self) -> f64 {
        self.player_total
    }

    pub fn ai_total(&self) -> f64 {
        self.ai_total
    }

    /// Rounds played so far
    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn planned_rounds(&self) -> Option<u32> {
        self.planned_rounds
    }

    pub fn correct_answer_count(&self) -> u32 {
        self.correct_answer_count
    }

    pub fn ai_correct_count(&self) -> u32 {
        self.ai_correct_count
    }

    pub fn used_hint_ever(&self) -> bool {
        self.used_hint_ever
    }

    pub fn history(&self) -> &[RoundOutcome] {
        &self.history
    }

    pub fn last_outcome(&self) -> Option<&RoundOutcome> {
        self.history.last()
    }

    /// Every planned round was played and answered correctly. Open-ended
    /// sessions are never perfect.
    pub fn is_perfect(&self) -> bool {
        match self.planned_rounds {
            Some(planned) => {
                planned > 0 && self.round_index >= planned && self.correct_answer_count >= planned
            }
            None => false,
        }
    }

    pub fn winner(&self) -> Winner {
        if self.player_total > self.ai_total {
            Winner::Player
        } else if self.ai_total > self.player_total {
            Winner::Ai
        } else {
            Winner::Draw
        }
    }

    /// Mean time from round start to click, over rounds with a click
    pub fn mean_answer_ms(&self) -> Option<f64> {
        let times: Vec<f64> = self
            .history
            .iter()
            .filter(|o| o.click.is_some())
            .map(|o| f64::from(self.round_duration_ms.saturating_sub(o.round_time_remaining_ms)))
            .collect();
        mean(&times)
    }

    pub fn summary(&self) -> GameSessionSummary {
        GameSessionSummary {
            mode: self.mode,
            difficulty: self.difficulty,
            player_score: self.player_total,
            ai_score: self.ai_total,
            rounds: self.round_index,
            player_correct: self.correct_answer_count,
            ai_correct: self.ai_correct_count,
            used_hints: self.used_hint_ever,
            winner: self.winner(),
            mean_answer_ms: self.mean_answer_ms(),
        }
    }
}

/// Snapshot of a game handed to UI and persistence collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSessionSummary {
    pub mode: GameMode,
    pub difficulty: Difficulty,
    pub player_score: f64,
    pub ai_score: f64,
    pub rounds: u32,
    pub player_correct: u32,
    pub ai_correct: u32,
    pub used_hints: bool,
    pub winner: Winner,
    pub mean_answer_ms: Option<f64>,
}
