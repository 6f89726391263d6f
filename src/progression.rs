//! Achievement and star-rank progression.
//!
//! The evaluator runs once per finished round and once per finished game. It
//! never reads persistent state directly: everything goes through the
//! injected [`AchievementStore`] / [`ProgressionStore`]. What it computes is
//! authoritative; a failing store is reported, not rolled back.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::config::GameMode;
use crate::error::StoreResult;
use crate::levels::{GameModeLevel, LevelType};
use crate::scoring::RoundOutcome;
use crate::session::GameSession;
use crate::util::guarded_division;

pub const COMPETITIVE_POINTS_THRESHOLD: f64 = 1000.0;
/// Fraction of the round still on the clock for a fast answer
pub const FAST_ANSWER_FRACTION: f64 = 0.8;
pub const SLOW_ANSWER_MS: u32 = 500;
pub const MAX_STARS: u8 = 3;

pub trait AchievementStore {
    fn has(&self, key: &str) -> StoreResult<bool>;
    /// Idempotent
    fn unlock(&mut self, key: &str) -> StoreResult<()>;
}

pub trait ProgressionStore {
    /// Stored rank of a level, `None` while the level is still locked
    fn stars(&self, level_key: &str) -> StoreResult<Option<u8>>;

    /// Unconditional write
    fn write_stars(&mut self, level_key: &str, stars: u8) -> StoreResult<()>;

    /// Store `stars` only when it beats what is already there. Returns whether
    /// anything was written.
    fn set_stars(&mut self, level_key: &str, stars: u8) -> StoreResult<bool> {
        match self.stars(level_key)? {
            Some(current) if current >= stars => Ok(false),
            _ => {
                self.write_stars(level_key, stars)?;
                Ok(true)
            }
        }
    }
}

/// In-process store for tests and `--no-persist` games
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    achievements: HashSet<String>,
    stars: HashMap<String, u8>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AchievementStore for MemoryStore {
    fn has(&self, key: &str) -> StoreResult<bool> {
        Ok(self.achievements.contains(key))
    }

    fn unlock(&mut self, key: &str) -> StoreResult<()> {
        self.achievements.insert(key.to_string());
        Ok(())
    }
}

impl ProgressionStore for MemoryStore {
    fn stars(&self, level_key: &str) -> StoreResult<Option<u8>> {
        Ok(self.stars.get(level_key).copied())
    }

    fn write_stars(&mut self, level_key: &str, stars: u8) -> StoreResult<()> {
        self.stars.insert(level_key.to_string(), stars);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Achievement {
    FirstCorrect,
    FirstCorrectWithoutHint,
    FirstCasualWin,
    FirstCompetitiveWin,
    FiveCorrectSameRunCasual,
    TwentyCorrectSameRunCasual,
    FiftyCorrectSameRunCasual,
    FiveCorrectSameRunCompetitive,
    CompetitivePoints,
    AllCorrectCompetitive,
    FastAnswer,
    SlowAnswer,
}

impl Achievement {
    pub const ALL: [Achievement; 12] = [
        Achievement::FirstCorrect,
        Achievement::FirstCorrectWithoutHint,
        Achievement::FirstCasualWin,
        Achievement::FirstCompetitiveWin,
        Achievement::FiveCorrectSameRunCasual,
        Achievement::TwentyCorrectSameRunCasual,
        Achievement::FiftyCorrectSameRunCasual,
        Achievement::FiveCorrectSameRunCompetitive,
        Achievement::CompetitivePoints,
        Achievement::AllCorrectCompetitive,
        Achievement::FastAnswer,
        Achievement::SlowAnswer,
    ];

    /// Persistent storage key
    pub fn key(&self) -> &'static str {
        match self {
            Achievement::FirstCorrect => "firstCorrect",
            Achievement::FirstCorrectWithoutHint => "firstCorrectWithoutHint",
            Achievement::FirstCasualWin => "firstCasualWin",
            Achievement::FirstCompetitiveWin => "firstCompetitiveWin",
            Achievement::FiveCorrectSameRunCasual => "fiveCorrectSameRunCasual",
            Achievement::TwentyCorrectSameRunCasual => "twentyCorrectSameRunCasual",
            Achievement::FiftyCorrectSameRunCasual => "fiftyCorrectSameRunCasual",
            Achievement::FiveCorrectSameRunCompetitive => "fiveCorrectSameRunCompetitive",
            Achievement::CompetitivePoints => "competitivePoints",
            Achievement::AllCorrectCompetitive => "allCorrectCompetitive",
            Achievement::FastAnswer => "fastAnswer",
            Achievement::SlowAnswer => "slowAnswer",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Achievement::FirstCorrect => "First Step!",
            Achievement::FirstCorrectWithoutHint => "Independent Spotter!",
            Achievement::FirstCasualWin => "Casually Winning!",
            Achievement::FirstCompetitiveWin => "Competitive Winner!",
            Achievement::FiveCorrectSameRunCasual => "Practice makes perfect!",
            Achievement::TwentyCorrectSameRunCasual => "Going the distance!",
            Achievement::FiftyCorrectSameRunCasual => "Still going?!",
            Achievement::FiveCorrectSameRunCompetitive => "Master Spotter!",
            Achievement::CompetitivePoints => "IT'S OVER 1000!!!",
            Achievement::AllCorrectCompetitive => "Perfectionist!",
            Achievement::FastAnswer => "The flash!",
            Achievement::SlowAnswer => "Nerves of steel!",
        }
    }

    pub fn from_key(key: &str) -> Option<Achievement> {
        Achievement::ALL.into_iter().find(|a| a.key() == key)
    }
}

/// Checked after each round, with the session already holding that round
#[derive(Debug, Clone, Copy)]
pub struct RoundRule {
    pub achievement: Achievement,
    pub applies: fn(&RoundOutcome, &GameSession) -> bool,
}

/// Checked once when the game is over
#[derive(Debug, Clone, Copy)]
pub struct GameRule {
    pub achievement: Achievement,
    pub applies: fn(&GameSession) -> bool,
}

fn competitive(s: &GameSession) -> bool {
    s.mode() == GameMode::Competitive
}

fn casual(s: &GameSession) -> bool {
    s.mode() == GameMode::Casual
}

fn fast_answer(o: &RoundOutcome, s: &GameSession) -> bool {
    competitive(s)
        && o.player_correct
        && f64::from(o.round_time_remaining_ms)
            >= FAST_ANSWER_FRACTION * f64::from(s.round_duration_ms())
}

pub fn default_round_rules() -> Vec<RoundRule> {
    vec![
        RoundRule {
            achievement: Achievement::FirstCorrect,
            applies: |o, _| o.player_correct,
        },
        RoundRule {
            achievement: Achievement::FirstCorrectWithoutHint,
            applies: |o, _| o.player_correct && !o.hinted,
        },
        RoundRule {
            achievement: Achievement::FiveCorrectSameRunCasual,
            applies: |_, s| casual(s) && s.correct_answer_count() >= 5,
        },
        RoundRule {
            achievement: Achievement::TwentyCorrectSameRunCasual,
            applies: |_, s| casual(s) && s.correct_answer_count() >= 20,
        },
        RoundRule {
            achievement: Achievement::FiftyCorrectSameRunCasual,
            applies: |_, s| casual(s) && s.correct_answer_count() >= 50,
        },
        RoundRule {
            achievement: Achievement::FiveCorrectSameRunCompetitive,
            applies: |_, s| competitive(s) && s.correct_answer_count() >= 5,
        },
        RoundRule {
            achievement: Achievement::FastAnswer,
            applies: fast_answer,
        },
        RoundRule {
            achievement: Achievement::SlowAnswer,
            applies: |o, s| {
                competitive(s) && o.player_correct && o.round_time_remaining_ms < SLOW_ANSWER_MS
            },
        },
        RoundRule {
            achievement: Achievement::CompetitivePoints,
            applies: |_, s| competitive(s) && s.player_total() >= COMPETITIVE_POINTS_THRESHOLD,
        },
    ]
}

pub fn default_game_rules() -> Vec<GameRule> {
    vec![
        GameRule {
            achievement: Achievement::AllCorrectCompetitive,
            applies: |s| competitive(s) && s.is_perfect(),
        },
        GameRule {
            achievement: Achievement::FirstCompetitiveWin,
            applies: |s| competitive(s) && s.player_total() > s.ai_total(),
        },
        GameRule {
            achievement: Achievement::FirstCasualWin,
            applies: |s| casual(s) && s.player_total() > s.ai_total(),
        },
    ]
}

/// Highest star tier met by a finished run, 0 when none is
pub fn compute_stars(level: &GameModeLevel, rounds: u32, player_total: f64, ai_total: f64) -> u8 {
    let meets = |threshold: f64| match level.type_level {
        LevelType::Fastest => f64::from(rounds) <= threshold,
        LevelType::Set => player_total >= threshold,
        LevelType::Ai => guarded_division(player_total, ai_total) >= threshold,
    };

    level
        .star_thresholds
        .iter()
        .rposition(|t| meets(*t))
        .map_or(0, |tier| tier as u8 + 1)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProgressionEvent {
    AchievementUnlocked(Achievement),
    StarsAwarded {
        level: String,
        stars: u8,
        /// The stored rank went up
        improved: bool,
    },
    LevelUnlocked(String),
    /// Player finished the game ahead of the predictor
    Win { player: f64, ai: f64 },
    /// Persistence failed; in-memory progression stands
    StoreFailure { key: String, message: String },
}

#[derive(Debug)]
pub struct ProgressionEvaluator<S> {
    store: S,
    round_rules: Vec<RoundRule>,
    game_rules: Vec<GameRule>,
    unlocked: HashSet<Achievement>,
}

impl<S: AchievementStore + ProgressionStore> ProgressionEvaluator<S> {
    pub fn new(store: S) -> Self {
        Self::with_rules(store, default_round_rules(), default_game_rules())
    }

    pub fn with_rules(store: S, round_rules: Vec<RoundRule>, game_rules: Vec<GameRule>) -> Self {
        Self {
            store,
            round_rules,
            game_rules,
            unlocked: HashSet::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Achievements already settled in this session, whether new or held before
    pub fn is_settled(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    /// `session` must already contain `outcome`
    pub fn on_round_end(
        &mut self,
        outcome: &RoundOutcome,
        session: &GameSession,
    ) -> Vec<ProgressionEvent> {
        let due: Vec<Achievement> = self
            .round_rules
            .iter()
            .filter(|rule| (rule.applies)(outcome, session))
            .map(|rule| rule.achievement)
            .collect();

        let mut events = Vec::new();
        for achievement in due {
            self.try_unlock(achievement, &mut events);
        }
        events
    }

    pub fn on_game_end(&mut self, session: &GameSession) -> Vec<ProgressionEvent> {
        let due: Vec<Achievement> = self
            .game_rules
            .iter()
            .filter(|rule| (rule.applies)(session))
            .map(|rule| rule.achievement)
            .collect();

        let mut events = Vec::new();
        for achievement in due {
            self.try_unlock(achievement, &mut events);
        }

        if session.player_total() > session.ai_total() {
            log::info!(
                "game won {} to {}",
                session.player_total(),
                session.ai_total()
            );
            events.push(ProgressionEvent::Win {
                player: session.player_total(),
                ai: session.ai_total(),
            });
        }
        events
    }

    /// Rank a finished adventure run and keep the best rank for the level
    pub fn award_stars(
        &mut self,
        level_key: &str,
        level: &GameModeLevel,
        session: &GameSession,
    ) -> Vec<ProgressionEvent> {
        let stars = compute_stars(
            level,
            session.round_index(),
            session.player_total(),
            session.ai_total(),
        );

        let mut events = Vec::new();
        let improved = match self.store.set_stars(level_key, stars) {
            Ok(improved) => improved,
            Err(e) => {
                self.report_failure(level_key, &e, &mut events);
                false
            }
        };
        log::info!("{} ranked {} star(s)", level_key, stars);
        events.push(ProgressionEvent::StarsAwarded {
            level: level_key.to_string(),
            stars,
            improved,
        });
        events
    }

    /// Make a level playable. Existing ranks are left alone.
    pub fn unlock_level(&mut self, level_key: &str) -> Vec<ProgressionEvent> {
        let mut events = Vec::new();
        match self.store.stars(level_key) {
            Ok(Some(_)) => {}
            Ok(None) => match self.store.write_stars(level_key, 0) {
                Ok(()) => {
                    log::info!("level {} unlocked", level_key);
                    events.push(ProgressionEvent::LevelUnlocked(level_key.to_string()));
                }
                Err(e) => self.report_failure(level_key, &e, &mut events),
            },
            Err(e) => self.report_failure(level_key, &e, &mut events),
        }
        events
    }

    fn try_unlock(&mut self, achievement: Achievement, events: &mut Vec<ProgressionEvent>) {
        if self.unlocked.contains(&achievement) {
            return;
        }

        match self.store.has(achievement.key()) {
            Ok(true) => {
                self.unlocked.insert(achievement);
                return;
            }
            Ok(false) => {}
            Err(e) => self.report_failure(achievement.key(), &e, events),
        }

        self.unlocked.insert(achievement);
        log::info!("achievement unlocked: {}", achievement.key());
        events.push(ProgressionEvent::AchievementUnlocked(achievement));

        if let Err(e) = self.store.unlock(achievement.key()) {
            self.report_failure(achievement.key(), &e, events);
        }
    }

    fn report_failure(
        &self,
        key: &str,
        error: &crate::error::StoreError,
        events: &mut Vec<ProgressionEvent>,
    ) {
        log::warn!("progress store failed for {}: {}", key, error);
        events.push(ProgressionEvent::StoreFailure {
            key: key.to_string(),
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::error::StoreError;
    use crate::session::tests::outcome;
    use assert_matches::assert_matches;
    use std::io;

    /// Reads succeed and report nothing stored; every write fails
    #[derive(Default)]
    struct ReadOnlyStore;

    fn denied() -> StoreError {
        StoreError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }

    impl AchievementStore for ReadOnlyStore {
        fn has(&self, _key: &str) -> StoreResult<bool> {
            Ok(false)
        }

        fn unlock(&mut self, _key: &str) -> StoreResult<()> {
            Err(denied())
        }
    }

    impl ProgressionStore for ReadOnlyStore {
        fn stars(&self, _level_key: &str) -> StoreResult<Option<u8>> {
            Ok(None)
        }

        fn write_stars(&mut self, _level_key: &str, _stars: u8) -> StoreResult<()> {
            Err(denied())
        }
    }

    fn unlocked(events: &[ProgressionEvent]) -> Vec<Achievement> {
        events
            .iter()
            .filter_map(|e| match e {
                ProgressionEvent::AchievementUnlocked(a) => Some(*a),
                _ => None,
            })
            .collect()
    }

    fn play(
        evaluator: &mut ProgressionEvaluator<MemoryStore>,
        session: &mut GameSession,
        o: RoundOutcome,
    ) -> Vec<Achievement> {
        let recorded = session.record(o).clone();
        unlocked(&evaluator.on_round_end(&recorded, session))
    }

    #[test]
    fn keys_roundtrip() {
        for a in Achievement::ALL {
            assert_eq!(Achievement::from_key(a.key()), Some(a));
        }
        assert_eq!(Achievement::from_key("nope"), None);
    }

    #[test]
    fn first_correct_fires_once_per_session() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session = GameSession::new(GameMode::Casual, Difficulty::Easy, 10_000);

        let first = play(&mut evaluator, &mut session, outcome(true, false, 0.5, 0.0, true, 3_000));
        assert_eq!(first, vec![Achievement::FirstCorrect]);

        let second = play(&mut evaluator, &mut session, outcome(true, false, 1.0, 0.0, false, 3_000));
        assert_eq!(second, vec![Achievement::FirstCorrectWithoutHint]);

        let third = play(&mut evaluator, &mut session, outcome(true, false, 1.0, 0.0, false, 3_000));
        assert!(third.is_empty());
        assert!(evaluator.store().has("firstCorrect").unwrap());
    }

    #[test]
    fn keys_already_in_store_do_not_refire() {
        let mut store = MemoryStore::new();
        store.unlock("firstCorrect").unwrap();
        let mut evaluator = ProgressionEvaluator::new(store);
        let mut session = GameSession::new(GameMode::Casual, Difficulty::Easy, 10_000);

        let got = play(&mut evaluator, &mut session, outcome(true, false, 0.5, 0.0, true, 3_000));
        assert!(got.is_empty());
        assert!(evaluator.is_settled(Achievement::FirstCorrect));
    }

    #[test]
    fn casual_streak_thresholds() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session = GameSession::new(GameMode::Casual, Difficulty::Easy, 10_000);

        let mut fired = Vec::new();
        for _ in 0..50 {
            fired.extend(play(
                &mut evaluator,
                &mut session,
                outcome(true, false, 1.0, 0.0, false, 5_000),
            ));
        }
        assert!(fired.contains(&Achievement::FiveCorrectSameRunCasual));
        assert!(fired.contains(&Achievement::TwentyCorrectSameRunCasual));
        assert!(fired.contains(&Achievement::FiftyCorrectSameRunCasual));
        assert!(!fired.contains(&Achievement::FiveCorrectSameRunCompetitive));
        assert!(!fired.contains(&Achievement::FastAnswer));
    }

    #[test]
    fn competitive_timing_achievements() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session = GameSession::new(GameMode::Competitive, Difficulty::Easy, 10_000);

        let fast = play(&mut evaluator, &mut session, outcome(true, false, 160.0, 0.0, false, 8_000));
        assert!(fast.contains(&Achievement::FastAnswer));

        let just_slow = play(&mut evaluator, &mut session, outcome(true, false, 10.0, 0.0, false, 500));
        assert!(!just_slow.contains(&Achievement::SlowAnswer));

        let slow = play(&mut evaluator, &mut session, outcome(true, false, 8.0, 0.0, false, 400));
        assert_eq!(slow, vec![Achievement::SlowAnswer]);
    }

    #[test]
    fn incorrect_fast_click_earns_nothing() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session = GameSession::new(GameMode::Competitive, Difficulty::Easy, 10_000);
        let got = play(&mut evaluator, &mut session, outcome(false, true, 0.0, 90.0, false, 9_900));
        assert!(got.is_empty());
    }

    #[test]
    fn competitive_points_cross_threshold() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session = GameSession::new(GameMode::Competitive, Difficulty::Easy, 10_000);
        for _ in 0..5 {
            let got = play(&mut evaluator, &mut session, outcome(true, false, 190.0, 0.0, true, 1_900));
            assert!(!got.contains(&Achievement::CompetitivePoints));
        }
        let got = play(&mut evaluator, &mut session, outcome(true, false, 50.0, 0.0, true, 500));
        assert!(got.contains(&Achievement::CompetitivePoints));
    }

    #[test]
    fn competitive_game_end() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session =
            GameSession::new(GameMode::Competitive, Difficulty::Easy, 10_000).with_planned_rounds(3);
        for _ in 0..3 {
            session.record(outcome(true, false, 100.0, 0.0, false, 5_000));
        }

        let events = evaluator.on_game_end(&session);
        assert_eq!(
            unlocked(&events),
            vec![
                Achievement::AllCorrectCompetitive,
                Achievement::FirstCompetitiveWin
            ]
        );
        assert_matches!(
            events.last(),
            Some(ProgressionEvent::Win { player, ai }) if *player == 300.0 && *ai == 0.0
        );
    }

    #[test]
    fn short_perfect_run_is_not_all_correct() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session =
            GameSession::new(GameMode::Competitive, Difficulty::Easy, 10_000).with_planned_rounds(10);
        session.record(outcome(true, false, 160.0, 0.0, false, 8_000));

        let events = evaluator.on_game_end(&session);
        assert!(!unlocked(&events).contains(&Achievement::AllCorrectCompetitive));
    }

    #[test]
    fn lost_game_has_no_win_event() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session = GameSession::new(GameMode::Casual, Difficulty::Easy, 10_000);
        session.record(outcome(false, true, 0.0, 1.0, false, 0));

        let events = evaluator.on_game_end(&session);
        assert!(events.is_empty());
    }

    #[test]
    fn store_failure_keeps_unlock() {
        let mut evaluator = ProgressionEvaluator::new(ReadOnlyStore);
        let mut session = GameSession::new(GameMode::Casual, Difficulty::Easy, 10_000);
        let recorded = session.record(outcome(true, false, 0.5, 0.0, true, 3_000)).clone();

        let events = evaluator.on_round_end(&recorded, &session);
        assert_eq!(
            events[0],
            ProgressionEvent::AchievementUnlocked(Achievement::FirstCorrect)
        );
        assert_matches!(&events[1], ProgressionEvent::StoreFailure { key, .. } if key == "firstCorrect");
        assert!(evaluator.is_settled(Achievement::FirstCorrect));

        // still once per session even though nothing was persisted
        let recorded = session.record(outcome(true, false, 0.5, 0.0, true, 3_000)).clone();
        assert!(evaluator.on_round_end(&recorded, &session).is_empty());
    }

    fn level(type_level: LevelType, star_thresholds: [f64; 3]) -> GameModeLevel {
        GameModeLevel {
            type_level,
            star_thresholds,
            level_requirement: 1.0,
        }
    }

    #[test]
    fn fastest_stars_prefer_fewer_rounds() {
        let l = level(LevelType::Fastest, [5.0, 3.0, 1.0]);
        assert_eq!(compute_stars(&l, 1, 1.0, 0.0), 3);
        assert_eq!(compute_stars(&l, 2, 1.0, 0.0), 2);
        assert_eq!(compute_stars(&l, 5, 1.0, 0.0), 1);
        assert_eq!(compute_stars(&l, 6, 1.0, 0.0), 0);
    }

    #[test]
    fn set_stars_prefer_higher_score() {
        let l = level(LevelType::Set, [1.0, 2.0, 3.0]);
        assert_eq!(compute_stars(&l, 5, 0.5, 0.0), 0);
        assert_eq!(compute_stars(&l, 5, 2.0, 0.0), 2);
        assert_eq!(compute_stars(&l, 5, 3.5, 0.0), 3);
    }

    #[test]
    fn ai_stars_use_guarded_ratio() {
        let l = level(LevelType::Ai, [0.5, 1.0, 1.5]);
        assert_eq!(compute_stars(&l, 5, 2.0, 4.0), 1);
        assert_eq!(compute_stars(&l, 5, 4.0, 4.0), 2);
        // predictor scored nothing: ratio is the player's own total
        assert_eq!(compute_stars(&l, 5, 2.0, 0.0), 3);
        assert_eq!(compute_stars(&l, 5, 0.0, 0.0), 0);
    }

    #[test]
    fn stars_never_downgrade() {
        let mut store = MemoryStore::new();
        assert!(store.set_stars("lesion0", 2).unwrap());
        assert!(!store.set_stars("lesion0", 1).unwrap());
        assert!(!store.set_stars("lesion0", 2).unwrap());
        assert_eq!(store.stars("lesion0").unwrap(), Some(2));
        assert!(store.set_stars("lesion0", 3).unwrap());
        assert_eq!(store.stars("lesion0").unwrap(), Some(3));
    }

    #[test]
    fn award_and_unlock_levels() {
        let mut evaluator = ProgressionEvaluator::new(MemoryStore::new());
        let mut session = GameSession::new(GameMode::Adventure, Difficulty::Easy, 10_000);
        session.record(outcome(true, false, 1.0, 0.0, false, 5_000));

        let events = evaluator.award_stars(
            "lesion0",
            &level(LevelType::Fastest, [5.0, 3.0, 1.0]),
            &session,
        );
        assert_eq!(
            events,
            vec![ProgressionEvent::StarsAwarded {
                level: "lesion0".into(),
                stars: 3,
                improved: true
            }]
        );

        assert_eq!(
            evaluator.unlock_level("lesion1"),
            vec![ProgressionEvent::LevelUnlocked("lesion1".into())]
        );
        assert!(evaluator.unlock_level("lesion1").is_empty());
        assert!(evaluator.unlock_level("lesion0").is_empty());
        assert_eq!(evaluator.store().stars("lesion1").unwrap(), Some(0));
        assert_eq!(evaluator.store().stars("lesion0").unwrap(), Some(3));
    }

    #[test]
    fn star_store_failure_is_reported() {
        let mut evaluator = ProgressionEvaluator::new(ReadOnlyStore);
        let mut session = GameSession::new(GameMode::Adventure, Difficulty::Easy, 10_000);
        session.record(outcome(true, false, 1.0, 0.0, false, 5_000));

        let events = evaluator.award_stars(
            "lesion0",
            &level(LevelType::Set, [1.0, 2.0, 3.0]),
            &session,
        );
        assert_matches!(&events[0], ProgressionEvent::StoreFailure { .. });
        assert_matches!(
            &events[1],
            ProgressionEvent::StarsAwarded {
                stars: 1,
                improved: false,
                ..
            }
        );
    }
}
