use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::config::GameMode;
use crate::error::{StoreError, StoreResult};
use crate::progression::{AchievementStore, ProgressionStore};
use crate::session::GameSessionSummary;

/// Achievements, level ranks and finished games in one SQLite file
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database under $HOME/.local/state/spotter
    pub fn new() -> StoreResult<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("spotter_progress.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        log::debug!("opening progress store at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS achievements (
                key TEXT PRIMARY KEY,
                unlocked_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS level_stars (
                level TEXT PRIMARY KEY,
                stars INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS game_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                mode TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                player_score REAL NOT NULL,
                ai_score REAL NOT NULL,
                rounds INTEGER NOT NULL,
                player_correct INTEGER NOT NULL,
                ai_correct INTEGER NOT NULL,
                used_hints BOOLEAN NOT NULL,
                winner TEXT NOT NULL,
                mean_answer_ms REAL,
                played_at TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_game_sessions_mode ON game_sessions(mode)",
            [],
        )?;

        Ok(SqliteStore { conn })
    }

    pub fn record_session(&self, summary: &GameSessionSummary) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO game_sessions
            (mode, difficulty, player_score, ai_score, rounds, player_correct,
             ai_correct, used_hints, winner, mean_answer_ms, played_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                summary.mode.to_string(),
                summary.difficulty.to_string(),
                summary.player_score,
                summary.ai_score,
                summary.rounds,
                summary.player_correct,
                summary.ai_correct,
                summary.used_hints,
                summary.winner.to_string(),
                summary.mean_answer_ms,
                Local::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Best player score over all finished games of a mode
    pub fn best_score(&self, mode: GameMode) -> StoreResult<Option<f64>> {
        let best: Option<f64> = self.conn.query_row(
            "SELECT MAX(player_score) FROM game_sessions WHERE mode = ?1",
            [mode.to_string()],
            |row| row.get(0),
        )?;
        Ok(best)
    }

    pub fn games_played(&self) -> StoreResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM game_sessions", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Unlocked achievement keys with their unlock time, oldest first
    pub fn unlocked_achievements(&self) -> StoreResult<Vec<(String, DateTime<Local>)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, unlocked_at FROM achievements ORDER BY unlocked_at, key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut unlocked = Vec::new();
        for row in rows {
            let (key, at) = row?;
            let at = DateTime::parse_from_rfc3339(&at)
                .map_err(|_| StoreError::Corrupt {
                    key: key.clone(),
                    value: at.clone(),
                })?
                .with_timezone(&Local);
            unlocked.push((key, at));
        }
        Ok(unlocked)
    }

    /// Every unlocked level and its rank, in key order
    pub fn all_stars(&self) -> StoreResult<Vec<(String, u8)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT level, stars FROM level_stars ORDER BY level")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut stars = Vec::new();
        for row in rows {
            let (level, n) = row?;
            stars.push((level.clone(), to_stars(&level, n)?));
        }
        Ok(stars)
    }
}

fn to_stars(level: &str, n: i64) -> StoreResult<u8> {
    u8::try_from(n).map_err(|_| StoreError::Corrupt {
        key: level.to_string(),
        value: n.to_string(),
    })
}

impl AchievementStore for SqliteStore {
    fn has(&self, key: &str) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM achievements WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn unlock(&mut self, key: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO achievements (key, unlocked_at) VALUES (?1, ?2)",
            params![key, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl ProgressionStore for SqliteStore {
    fn stars(&self, level_key: &str) -> StoreResult<Option<u8>> {
        let stars: Option<i64> = self
            .conn
            .query_row(
                "SELECT stars FROM level_stars WHERE level = ?1",
                [level_key],
                |row| row.get(0),
            )
            .optional()?;
        stars.map(|n| to_stars(level_key, n)).transpose()
    }

    fn write_stars(&mut self, level_key: &str, stars: u8) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO level_stars (level, stars, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(level) DO UPDATE SET stars = excluded.stars, updated_at = excluded.updated_at
            "#,
            params![level_key, stars, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
