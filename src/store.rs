use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::app_dirs::AppDirs;
use crate::error::{GameError, Result};
use crate::usage::{GameKind, UsageStore};

/// One finished game as kept in the history table
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub kind: GameKind,
    pub summary: String,
    pub timestamp: DateTime<Local>,
}

impl GameRecord {
    /// A result that just happened
    pub fn new(kind: GameKind, summary: impl Into<String>) -> Self {
        Self {
            kind,
            summary: summary.into(),
            timestamp: Local::now(),
        }
    }
}

/// Play counts and result history in SQLite
#[derive(Debug)]
pub struct GameDb {
    conn: Connection,
}

impl GameDb {
    /// Open the database at the default state location
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("randofun.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "opening game database");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS usage (
                game TEXT PRIMARY KEY,
                count INTEGER NOT NULL DEFAULT 0
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                game TEXT NOT NULL,
                summary TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_game ON results(game, id)",
            [],
        )?;

        Ok(GameDb { conn })
    }

    pub fn record_result(&self, record: &GameRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO results (game, summary, timestamp) VALUES (?1, ?2, ?3)",
            params![
                record.kind.to_string(),
                record.summary,
                record.timestamp.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Most recent results first
    pub fn recent_results(&self, kind: GameKind, limit: usize) -> Result<Vec<GameRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT summary, timestamp
            FROM results
            WHERE game = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![kind.to_string(), limit as i64], |row| {
            let timestamp: String = row.get(1)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Local);
            Ok(GameRecord {
                kind,
                summary: row.get(0)?,
                timestamp,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(GameError::from)
    }

    /// Forget the history of one game; play counts are kept
    pub fn clear_results(&self, kind: GameKind) -> Result<()> {
        self.conn
            .execute("DELETE FROM results WHERE game = ?1", [kind.to_string()])?;
        Ok(())
    }
}

impl UsageStore for GameDb {
    fn usage_count(&self, kind: GameKind) -> Result<u32> {
        let count: Option<u32> = self
            .conn
            .query_row(
                "SELECT count FROM usage WHERE game = ?1",
                [kind.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0))
    }

    fn increment_usage(&mut self, kind: GameKind) -> Result<u32> {
        self.conn.execute(
            r#"
            INSERT INTO usage (game, count) VALUES (?1, 1)
            ON CONFLICT(game) DO UPDATE SET count = count + 1
            "#,
            [kind.to_string()],
        )?;
        self.usage_count(kind)
    }

    fn reset_usage(&mut self, kind: GameKind) -> Result<()> {
        self.conn
            .execute("DELETE FROM usage WHERE game = ?1", [kind.to_string()])?;
        Ok(())
    }
}
