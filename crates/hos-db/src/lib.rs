//! Storage layer for hours-of-service logs.
//!
//! Provides persistence for the active day session, finalized daily logs and
//! trip details using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2025-01-15T10:30:00.000Z`), so lexicographic order matches
//! chronological order. Log dates are stored as ISO dates (`2025-01-15`).
//!
//! ## Daily Log Storage
//!
//! `daily_logs.payload` holds the full record as JSON, in the same shape used
//! for download and print. The summary columns duplicate it for querying.
//! A record is written once: a second insert for the same date is rejected.
//!
//! ## Session Storage
//!
//! At most one session is active. Its events are stored in append order and
//! the timeline is recompiled from them on load.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use hos_core::{
    ChangeKind, DailyLogRecord, DaySession, DutyCategory, InvalidEventLog, LogDay, LogStore,
    PersistenceFailure, StatusEvent, TripMetadata,
};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored JSON payload could not be read or written.
    #[error("invalid stored payload: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to parse a stored timestamp or date.
    #[error("invalid stored {field}: {value}")]
    TimestampParse {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored session row or event cannot be interpreted.
    #[error("corrupt session data: {0}")]
    CorruptSession(String),
    /// Stored session events do not form a valid log.
    #[error("corrupt session events: {0}")]
    InvalidEventLog(#[from] InvalidEventLog),
    /// A finalized log already exists for the date.
    #[error("a daily log for {0} already exists")]
    DuplicateLog(NaiveDate),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// A stored daily log and its sync state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLog {
    pub record: DailyLogRecord,
    pub synced_at: Option<DateTime<Utc>>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- The single active day session
            CREATE TABLE IF NOT EXISTS current_session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                date TEXT NOT NULL,
                day_start TEXT NOT NULL,
                finalized_at TEXT
            );

            -- Duty changes of the active session, in append order
            -- status: duty category index (0 off, 1 sleeper, 2 driving, 3 on duty)
            CREATE TABLE IF NOT EXISTS session_events (
                id TEXT PRIMARY KEY,
                seq INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                status INTEGER NOT NULL,
                location TEXT NOT NULL DEFAULT '',
                change_kind TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_session_events_seq ON session_events(seq);

            CREATE TABLE IF NOT EXISTS daily_logs (
                date TEXT PRIMARY KEY,
                finalized_at TEXT NOT NULL,
                total_miles REAL NOT NULL,
                off_duty REAL NOT NULL,
                sleeper REAL NOT NULL,
                driving REAL NOT NULL,
                on_duty REAL NOT NULL,
                payload TEXT NOT NULL,
                synced_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_daily_logs_synced ON daily_logs(synced_at);

            CREATE TABLE IF NOT EXISTS trip (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                payload TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Loads the active session, if one has been stored.
    pub fn load_session(&self) -> Result<Option<DaySession>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT date, day_start, finalized_at FROM current_session WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((date, day_start, finalized_at)) = row else {
            return Ok(None);
        };

        let day = LogDay::new(parse_date(&date)?, parse_timestamp("day_start", &day_start)?);
        let finalized_at = finalized_at
            .map(|value| parse_timestamp("finalized_at", &value))
            .transpose()?;
        let events = self.session_events()?;
        let session = DaySession::restore(day, events, finalized_at)?;
        Ok(Some(session))
    }

    fn session_events(&self) -> Result<Vec<StatusEvent>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT timestamp, status, location, change_kind
            FROM session_events
            ORDER BY seq ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u8>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut events = Vec::new();
        for row in rows {
            let (timestamp, status, location, kind) = row?;
            let category = DutyCategory::from_index(status)
                .ok_or_else(|| DbError::CorruptSession(format!("unknown status index {status}")))?;
            let kind: ChangeKind = kind.parse().map_err(DbError::CorruptSession)?;
            events.push(StatusEvent::new(
                parse_timestamp("event timestamp", &timestamp)?,
                category,
                location,
                kind,
            ));
        }
        Ok(events)
    }

    /// Replaces the stored session with `session`.
    pub fn save_session(&mut self, session: &DaySession) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        write_session(&tx, session)?;
        tx.commit()?;
        tracing::debug!(
            date = %session.date(),
            events = session.events().len(),
            state = session.state().as_str(),
            "saved session"
        );
        Ok(())
    }

    /// Stores a finalized log. Fails if one already exists for its date.
    pub fn insert_log(&mut self, record: &DailyLogRecord) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        write_log(&tx, record)?;
        tx.commit()?;
        Ok(())
    }

    /// Stores the logs of closed days and replaces the session with `next`,
    /// all in one transaction.
    ///
    /// If any log is rejected nothing is written and the stored session is
    /// left as it was.
    pub fn commit_closed_days(
        &mut self,
        records: &[DailyLogRecord],
        next: &DaySession,
    ) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        for record in records {
            write_log(&tx, record)?;
        }
        write_session(&tx, next)?;
        tx.commit()?;
        tracing::debug!(
            logs = records.len(),
            date = %next.date(),
            "committed closed days"
        );
        Ok(())
    }

    /// Lists all finalized logs ordered by date.
    pub fn list_logs(&self) -> Result<Vec<StoredLog>, DbError> {
        self.query_logs("SELECT payload, synced_at FROM daily_logs ORDER BY date ASC")
    }

    /// Lists logs not yet pushed to the remote log service, ordered by date.
    pub fn list_unsynced(&self) -> Result<Vec<StoredLog>, DbError> {
        self.query_logs(
            "SELECT payload, synced_at FROM daily_logs WHERE synced_at IS NULL ORDER BY date ASC",
        )
    }

    fn query_logs(&self, sql: &str) -> Result<Vec<StoredLog>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut logs = Vec::new();
        for row in rows {
            let (payload, synced_at) = row?;
            logs.push(stored_log(&payload, synced_at.as_deref())?);
        }
        Ok(logs)
    }

    /// Fetches the log for one date.
    pub fn get_log(&self, date: NaiveDate) -> Result<Option<StoredLog>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT payload, synced_at FROM daily_logs WHERE date = ?",
                [date.to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;
        row.map(|(payload, synced_at)| stored_log(&payload, synced_at.as_deref()))
            .transpose()
    }

    /// Records that the log for `date` was accepted by the remote service.
    pub fn mark_synced(&mut self, date: NaiveDate, at: DateTime<Utc>) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "UPDATE daily_logs SET synced_at = ? WHERE date = ?",
            params![format_timestamp(at), date.to_string()],
        )?;
        Ok(updated > 0)
    }

    /// Loads the stored trip details, or defaults if none were saved.
    pub fn load_trip(&self) -> Result<TripMetadata, DbError> {
        let payload: Option<String> = self
            .conn
            .query_row("SELECT payload FROM trip WHERE id = 1", [], |row| row.get(0))
            .optional()?;
        match payload {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(TripMetadata::default()),
        }
    }

    /// Replaces the stored trip details.
    pub fn save_trip(&mut self, trip: &TripMetadata, now: DateTime<Utc>) -> Result<(), DbError> {
        let payload = serde_json::to_string(trip)?;
        self.conn.execute(
            "
            INSERT INTO trip (id, payload, updated_at)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            ",
            params![payload, format_timestamp(now)],
        )?;
        Ok(())
    }
}

impl LogStore for Database {
    fn save_log(&mut self, record: &DailyLogRecord) -> Result<DailyLogRecord, PersistenceFailure> {
        self.insert_log(record)
            .map_err(|e| PersistenceFailure::new(e.to_string()))?;
        match self.get_log(record.date()) {
            Ok(Some(stored)) => Ok(stored.record),
            Ok(None) => Err(PersistenceFailure::new(format!(
                "log for {} missing after insert",
                record.date()
            ))),
            Err(e) => Err(PersistenceFailure::new(e.to_string())),
        }
    }

    fn list_logs(&self) -> Result<Vec<DailyLogRecord>, PersistenceFailure> {
        Self::list_logs(self)
            .map(|logs| logs.into_iter().map(|log| log.record).collect())
            .map_err(|e| PersistenceFailure::new(e.to_string()))
    }
}

fn write_session(conn: &Connection, session: &DaySession) -> Result<(), DbError> {
    conn.execute(
        "
        INSERT INTO current_session (id, date, day_start, finalized_at)
        VALUES (1, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            date = excluded.date,
            day_start = excluded.day_start,
            finalized_at = excluded.finalized_at
        ",
        params![
            session.date().to_string(),
            format_timestamp(session.day().start),
            session.finalized_at().map(format_timestamp),
        ],
    )?;
    conn.execute("DELETE FROM session_events", [])?;
    let mut stmt = conn.prepare(
        "
        INSERT INTO session_events (id, seq, timestamp, status, location, change_kind)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
    )?;
    for (seq, event) in session.events().iter().enumerate() {
        stmt.execute(params![
            Uuid::new_v4().to_string(),
            i64::try_from(seq).unwrap_or(i64::MAX),
            format_timestamp(event.timestamp),
            event.category.index(),
            event.location,
            event.change_kind.as_str(),
        ])?;
    }
    Ok(())
}

fn write_log(conn: &Connection, record: &DailyLogRecord) -> Result<(), DbError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM daily_logs WHERE date = ?)",
        [record.date().to_string()],
        |row| row.get(0),
    )?;
    if exists {
        return Err(DbError::DuplicateLog(record.date()));
    }
    let payload = serde_json::to_string(record)?;
    let summary = record.summary();
    conn.execute(
        "
        INSERT INTO daily_logs
        (date, finalized_at, total_miles, off_duty, sleeper, driving, on_duty, payload)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ",
        params![
            record.date().to_string(),
            format_timestamp(record.finalized_at()),
            record.total_miles(),
            summary.off_duty,
            summary.sleeper,
            summary.driving,
            summary.on_duty,
            payload,
        ],
    )?;
    Ok(())
}

fn stored_log(payload: &str, synced_at: Option<&str>) -> Result<StoredLog, DbError> {
    Ok(StoredLog {
        record: serde_json::from_str(payload)?,
        synced_at: synced_at
            .map(|value| parse_timestamp("synced_at", value))
            .transpose()?,
    })
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            field,
            value: value.to_string(),
            source,
        })
}

fn parse_date(value: &str) -> Result<NaiveDate, DbError> {
    value.parse().map_err(|source| DbError::TimestampParse {
        field: "date",
        value: value.to_string(),
        source,
    })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
