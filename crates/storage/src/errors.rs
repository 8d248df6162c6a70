// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-session error log.
//!
//! Each occurrence gets a stable id; recovery flips the `recovered` flag.
//! `session_id` is nullable so pre-session failures still land in the log.

use crate::store::{json_or_default, ts_from_sql, ts_to_sql, Store, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use std::collections::BTreeMap;
use swarm_core::{ErrorCode, SessionId, SwarmError};

/// A logged error occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub id: String,
    pub error: SwarmError,
    pub recovered: bool,
    pub created_at: DateTime<Utc>,
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<(ErrorRecord, String)> {
    let code_raw: String = row.get("code")?;
    let session_id: Option<String> = row.get("session_id")?;
    let context: Option<String> = row.get("context")?;
    let created_at: String = row.get("created_at")?;
    let record = ErrorRecord {
        id: row.get("id")?,
        error: SwarmError {
            // Fixed up by the caller once out of the row closure.
            code: ErrorCode::SystemError,
            message: row.get("message")?,
            component: row.get("component")?,
            context: json_or_default::<BTreeMap<String, String>>(context, "error_log.context"),
            session_id: session_id.map(SessionId::new),
        },
        recovered: row.get::<_, i64>("recovered")? != 0,
        created_at: ts_from_sql(&created_at),
    };
    Ok((record, code_raw))
}

fn finish_record((mut record, code_raw): (ErrorRecord, String)) -> ErrorRecord {
    record.error.code = ErrorCode::parse(&code_raw).unwrap_or_else(|| {
        tracing::warn!(id = %record.id, code = %code_raw, "unknown error code in log");
        ErrorCode::SystemError
    });
    record
}

impl Store {
    /// Append an error occurrence. Returns the stable log id.
    pub fn log_error(&self, error: &SwarmError, now: DateTime<Utc>) -> StoreResult<String> {
        let id = Self::new_id();
        let context = if error.context.is_empty() {
            None
        } else {
            serde_json::to_string(&error.context).ok()
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO error_log
                   (id, session_id, code, category, severity, recoverable, retryable,
                    component, message, context, recovered, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11)",
                params![
                    id,
                    error.session_id.as_ref().map(|s| s.as_str()),
                    error.code.as_str(),
                    error.category().as_str(),
                    error.severity().as_str(),
                    error.recoverable() as i64,
                    error.retryable() as i64,
                    error.component,
                    error.message,
                    context,
                    ts_to_sql(now),
                ],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    pub fn mark_error_recovered(&self, id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE error_log SET recovered = 1 WHERE id = ?1",
                params![id],
            )?;
            if affected == 0 {
                return Err(StoreError::not_found("error", id));
            }
            Ok(())
        })
    }

    /// Errors for a session, oldest first.
    pub fn session_errors(&self, session_id: &SessionId) -> StoreResult<Vec<ErrorRecord>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM error_log WHERE session_id = ?1 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![session_id.as_str()], row_to_record)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(finish_record(row?));
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
