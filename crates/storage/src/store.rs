// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store handle and connection management.

use crate::schema;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use swarm_core::{ErrorCode, SwarmError};
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("illegal status transition for session {id}: {from} -> {to}")]
    IllegalTransition {
        id: String,
        from: String,
        to: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<StoreError> for SwarmError {
    fn from(err: StoreError) -> Self {
        let code = match &err {
            StoreError::Io(_) => ErrorCode::FilesystemError,
            StoreError::IllegalTransition { .. } => ErrorCode::InvalidArgs,
            _ => ErrorCode::DatabaseError,
        };
        SwarmError::new(code, "store", err.to_string())
    }
}

/// Handle to the session database.
///
/// The connection is shared behind a mutex; statements are short-lived and
/// the engine keeps writes on a single logical task, so contention is
/// negligible. Clone freely.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (and migrate) the on-disk database.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        // WAL with a bounded auto-checkpoint keeps readers concurrent and
        // the log finite.
        conn.pragma_update(None, "journal_mode", "wal")?;
        conn.pragma_update(None, "wal_autocheckpoint", 512)?;
        conn.pragma_update(None, "synchronous", "normal")?;
        Self::init(conn)
    }

    /// Open an in-memory database, mainly for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "on")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with the locked connection.
    pub(crate) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> StoreResult<T>) -> StoreResult<T> {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Generate a fresh row id.
    pub(crate) fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Serialize a timestamp the way every table stores it.
pub(crate) fn ts_to_sql(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to the epoch on corruption.
pub(crate) fn ts_from_sql(raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(err) => {
            tracing::warn!(raw, %err, "unparseable timestamp in database, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        }
    }
}

/// Parse a JSON column defensively: a parse failure yields the default and
/// logs a warning, never an error or partial data.
pub(crate) fn json_or_default<T>(raw: Option<String>, column: &str) -> T
where
    T: Default + serde::de::DeserializeOwned,
{
    match raw {
        None => T::default(),
        Some(text) if text.is_empty() => T::default(),
        Some(text) => match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(column, %err, "malformed JSON column, using default");
                T::default()
            }
        },
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
