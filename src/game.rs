//! One game: a run of rounds in a single mode, folded into a [`GameSession`]
//! and fed to the progression evaluator as each round settles.

use crate::config::{Config, GameMode, RoundConfig};
use crate::error::{RoundError, RoundResult};
use crate::levels::{level_key, AdventureLevel, LevelCatalog};
use crate::progression::{AchievementStore, ProgressionEvaluator, ProgressionEvent, ProgressionStore};
use crate::scoring::RoundOutcome;
use crate::session::{GameSession, GameSessionSummary};

#[derive(Debug, Clone)]
struct LevelRun {
    key: String,
    level: AdventureLevel,
    /// Unlocked when this run finishes
    next_key: Option<String>,
}

#[derive(Debug)]
pub struct Game<S> {
    session: GameSession,
    evaluator: ProgressionEvaluator<S>,
    round_config: RoundConfig,
    competitive_rounds: u32,
    level: Option<LevelRun>,
    over: bool,
}

impl<S: AchievementStore + ProgressionStore> Game<S> {
    /// Casual or competitive game with the stored preferences
    pub fn new(config: &Config, store: S) -> RoundResult<Self> {
        if config.game_mode == GameMode::Adventure {
            return Err(RoundError::InvalidConfig(
                "adventure games are started from a level".to_string(),
            ));
        }
        let round_config = config.round_config();
        round_config.timings.validate()?;
        let session = GameSession::new(
            config.game_mode,
            config.difficulty,
            round_config.round_duration_ms(),
        );

        Ok(Self {
            session: match config.game_mode {
                GameMode::Competitive => session.with_planned_rounds(config.competitive_rounds),
                _ => session,
            },
            evaluator: ProgressionEvaluator::new(store),
            round_config,
            competitive_rounds: config.competitive_rounds,
            level: None,
            over: false,
        })
    }

    /// Adventure game on `index`. Every level but the first has to be unlocked
    /// by finishing the one before it.
    pub fn adventure(
        config: &Config,
        catalog: &LevelCatalog,
        index: u32,
        store: S,
    ) -> RoundResult<Self> {
        let level = catalog
            .get(index)
            .ok_or_else(|| RoundError::InvalidConfig(format!("no adventure level {index}")))?
            .clone();
        let key = level.key(&catalog.theme);

        let first = catalog.levels.iter().map(|l| l.index).min() == Some(index);
        if !first {
            match store.stars(&key) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    return Err(RoundError::InvalidConfig(format!("level {key} is locked")))
                }
                Err(e) => log::warn!("could not check whether {} is unlocked: {}", key, e),
            }
        }

        let round_config = level.round_config(config);
        round_config.timings.validate()?;

        Ok(Self {
            session: GameSession::new(
                GameMode::Adventure,
                level.difficulty,
                round_config.round_duration_ms(),
            )
            .with_planned_rounds(level.rounds),
            evaluator: ProgressionEvaluator::new(store),
            round_config,
            competitive_rounds: config.competitive_rounds,
            level: Some(LevelRun {
                key,
                next_key: catalog
                    .next_after(index)
                    .map(|next| level_key(&catalog.theme, next.index)),
                level,
            }),
            over: false,
        })
    }

    pub fn round_config(&self) -> &RoundConfig {
        &self.round_config
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn summary(&self) -> GameSessionSummary {
        self.session.summary()
    }

    pub fn level(&self) -> Option<&AdventureLevel> {
        self.level.as_ref().map(|run| &run.level)
    }

    pub fn store(&self) -> &S {
        self.evaluator.store()
    }

    pub fn into_store(self) -> S {
        self.evaluator.into_store()
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Record a finished round. Ends the game when the mode's end condition
    /// is met, in which case game-end progression follows the round's.
    pub fn settle_round(&mut self, outcome: RoundOutcome) -> Vec<ProgressionEvent> {
        if self.over {
            log::warn!("ignoring round settled after the game ended");
            return Vec::new();
        }

        self.session.record(outcome);
        let mut events = match self.session.last_outcome() {
            Some(recorded) => self.evaluator.on_round_end(recorded, &self.session),
            None => Vec::new(),
        };
        log::info!(
            "round {} settled: player {} / predictor {}",
            self.session.round_index(),
            self.session.player_total(),
            self.session.ai_total()
        );

        if self.reached_end() {
            events.extend(self.finish());
        }
        events
    }

    /// Player left the game. Casual games only end this way and are scored
    /// as usual. Competitive and adventure games quit before their end
    /// condition are abandoned without any game-end progression.
    pub fn end(&mut self) -> Vec<ProgressionEvent> {
        if self.over {
            return Vec::new();
        }
        if self.session.mode() == GameMode::Casual || self.reached_end() {
            return self.finish();
        }

        self.over = true;
        log::info!(
            "{} game abandoned after {} round(s)",
            self.session.mode(),
            self.session.round_index()
        );
        Vec::new()
    }

    fn reached_end(&self) -> bool {
        match self.session.mode() {
            GameMode::Casual => false,
            GameMode::Competitive => self.session.round_index() >= self.competitive_rounds,
            GameMode::Adventure => match &self.level {
                Some(run) => {
                    self.session.player_total() >= run.level.game_mode.level_requirement
                        || self.session.round_index() >= run.level.rounds
                }
                None => false,
            },
        }
    }

    fn finish(&mut self) -> Vec<ProgressionEvent> {
        self.over = true;
        let mut events = self.evaluator.on_game_end(&self.session);

        if let Some(run) = &self.level {
            events.extend(
                self.evaluator
                    .award_stars(&run.key, &run.level.game_mode, &self.session),
            );
            if let Some(next) = &run.next_key {
                events.extend(self.evaluator.unlock_level(next));
            }
        }

        log::info!(
            "{} game over after {} round(s), winner: {}",
            self.session.mode(),
            self.session.round_index(),
            self.session.winner()
        );
        events
    }
}
