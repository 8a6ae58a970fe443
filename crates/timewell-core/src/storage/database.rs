//! SQLite-based session and daily-log storage.
//!
//! Provides persistent storage for:
//! - Committed time sessions, keyed by day and subject
//! - Daily logs consumed by the streak engine
//! - A key-value store for engine state (running timers, pomodoro state)
//!   so a restart rehydrates instead of resetting
//!
//! `insert_session` is the commit closure handed to the ledger's
//! `stop_with`: if the insert fails the timer stays in the ledger.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::daykey::DayKey;
use crate::error::DatabaseError;
use crate::streak::{DailyLog, LogOutcome};
use crate::timer::{SessionId, SubjectId, TimeSession};

use super::data_dir;

/// Per-day session aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayStats {
    pub date_key: DayKey,
    pub session_count: u64,
    pub total_secs: i64,
}

/// All-time session aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TotalStats {
    pub session_count: u64,
    pub total_secs: i64,
    pub days_tracked: u64,
}

/// SQLite database for sessions, daily logs, and engine state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/timewell/timewell.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::OpenFailed {
                path: "~/.config/timewell".into(),
                source: rusqlite::Error::InvalidPath(e.to_string().into()),
            })?
            .join("timewell.db");
        Self::open_at(path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: impl Into<std::path::PathBuf>) -> Result<Self, DatabaseError> {
        let path = path.into();
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id            TEXT PRIMARY KEY,
                    subject_id    TEXT NOT NULL,
                    start_at_ms   INTEGER NOT NULL,
                    end_at_ms     INTEGER NOT NULL,
                    duration_secs INTEGER NOT NULL,
                    date_key      TEXT NOT NULL,
                    note          TEXT,
                    created_at    TEXT NOT NULL,
                    updated_at    TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS daily_logs (
                    subject_id TEXT NOT NULL,
                    date_key   TEXT NOT NULL,
                    done       INTEGER,
                    value      REAL,
                    target     REAL,
                    PRIMARY KEY (subject_id, date_key)
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                -- Day keys sort lexicographically, so range scans work.
                CREATE INDEX IF NOT EXISTS idx_sessions_date_key ON sessions(date_key);
                CREATE INDEX IF NOT EXISTS idx_sessions_subject ON sessions(subject_id);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Persist a committed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails; the caller (the ledger's
    /// `stop_with`) then keeps the timer alive.
    pub fn insert_session(&self, session: &TimeSession) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (id, subject_id, start_at_ms, end_at_ms, duration_secs,
                                   date_key, note, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                session.id.to_string(),
                session.subject_id.as_str(),
                session.start_at_ms,
                session.end_at_ms,
                session.duration_secs,
                session.date_key.to_string(),
                session.note,
                session.created_at.to_rfc3339(),
                session.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Sessions filed under one day key, oldest first.
    pub fn sessions_for_day(&self, day: DayKey) -> Result<Vec<TimeSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subject_id, start_at_ms, end_at_ms, duration_secs,
                    date_key, note, created_at, updated_at
             FROM sessions WHERE date_key = ?1 ORDER BY start_at_ms",
        )?;
        let rows = stmt.query_map(params![day.to_string()], row_to_session)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All sessions of one subject, oldest first.
    pub fn sessions_for_subject(
        &self,
        subject_id: &SubjectId,
    ) -> Result<Vec<TimeSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, subject_id, start_at_ms, end_at_ms, duration_secs,
                    date_key, note, created_at, updated_at
             FROM sessions WHERE subject_id = ?1 ORDER BY start_at_ms",
        )?;
        let rows = stmt.query_map(params![subject_id.as_str()], row_to_session)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Replace the free-text note of a session. The only mutation sessions
    /// support; bumps `updated_at`.
    pub fn update_session_note(
        &self,
        id: SessionId,
        note: Option<&str>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE sessions SET note = ?1, updated_at = ?2 WHERE id = ?3",
            params![note, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        Ok(())
    }

    /// Delete a session. Only ever driven by explicit user action.
    pub fn delete_session(&self, id: SessionId) -> Result<bool, DatabaseError> {
        let n = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])?;
        Ok(n > 0)
    }

    /// Aggregate for one day.
    pub fn day_stats(&self, day: DayKey) -> Result<DayStats, DatabaseError> {
        let (session_count, total_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM sessions WHERE date_key = ?1",
            params![day.to_string()],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        Ok(DayStats {
            date_key: day,
            session_count,
            total_secs,
        })
    }

    /// All-time aggregate.
    pub fn total_stats(&self) -> Result<TotalStats, DatabaseError> {
        self.conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0), COUNT(DISTINCT date_key)
                 FROM sessions",
                [],
                |row| {
                    Ok(TotalStats {
                        session_count: row.get(0)?,
                        total_secs: row.get(1)?,
                        days_tracked: row.get(2)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    // ── Daily logs ───────────────────────────────────────────────────

    /// Insert or replace the log for a (subject, day) pair.
    pub fn upsert_daily_log(
        &self,
        subject_id: &SubjectId,
        log: &DailyLog,
    ) -> Result<(), DatabaseError> {
        let (done, value, target) = match log.outcome {
            LogOutcome::Done { done } => (Some(done as i64), None, None),
            LogOutcome::Measured { value, target } => (None, Some(value), Some(target)),
        };
        self.conn.execute(
            "INSERT INTO daily_logs (subject_id, date_key, done, value, target)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (subject_id, date_key)
             DO UPDATE SET done = excluded.done, value = excluded.value, target = excluded.target",
            params![
                subject_id.as_str(),
                log.date_key.to_string(),
                done,
                value,
                target
            ],
        )?;
        Ok(())
    }

    /// Logs of one subject within `[from, to]`, ready for the streak
    /// engine. Day keys sort lexicographically, so BETWEEN is a date range.
    pub fn daily_logs(
        &self,
        subject_id: &SubjectId,
        from: DayKey,
        to: DayKey,
    ) -> Result<Vec<DailyLog>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT date_key, done, value, target FROM daily_logs
             WHERE subject_id = ?1 AND date_key BETWEEN ?2 AND ?3
             ORDER BY date_key",
        )?;
        let rows = stmt.query_map(
            params![subject_id.as_str(), from.to_string(), to.to_string()],
            |row| {
                let date_key = parse_col::<DayKey>(row, 0)?;
                let done: Option<i64> = row.get(1)?;
                let value: Option<f64> = row.get(2)?;
                let target: Option<f64> = row.get(3)?;
                let outcome = match (done, value, target) {
                    (Some(d), _, _) => LogOutcome::Done { done: d != 0 },
                    (None, Some(value), Some(target)) => LogOutcome::Measured { value, target },
                    _ => LogOutcome::Done { done: false },
                };
                Ok(DailyLog { date_key, outcome })
            },
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Parse a text column through `FromStr`, mapping failures onto rusqlite's
/// conversion error so `query_map` closures stay fallible-in-kind.
fn parse_col<T>(row: &rusqlite::Row<'_>, idx: usize) -> Result<T, rusqlite::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_rfc3339(row: &rusqlite::Row<'_>, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<TimeSession, rusqlite::Error> {
    Ok(TimeSession {
        id: parse_col(row, 0)?,
        subject_id: SubjectId::new(row.get::<_, String>(1)?),
        start_at_ms: row.get(2)?,
        end_at_ms: row.get(3)?,
        duration_secs: row.get(4)?,
        date_key: parse_col(row, 5)?,
        note: row.get(6)?,
        created_at: parse_rfc3339(row, 7)?,
        updated_at: parse_rfc3339(row, 8)?,
    })
}
