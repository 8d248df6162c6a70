// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session rows.

use crate::store::{json_or_default, ts_from_sql, ts_to_sql, Store, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use swarm_core::{Session, SessionId, SessionStatus};

/// Input for creating a session row.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: SessionId,
    pub workflow_type: String,
    pub goal: String,
    pub config: serde_json::Value,
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<(Session, String)> {
    let id: String = row.get("id")?;
    let status_raw: String = row.get("status")?;
    let config_raw: Option<String> = row.get("config")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let session = Session {
        id: SessionId::new(id),
        workflow_type: row.get("workflow_type")?,
        goal: row.get("goal")?,
        // Fixed up by the caller, which can log outside the row closure.
        status: SessionStatus::Failed,
        config: json_or_default(config_raw, "sessions.config"),
        created_at: ts_from_sql(&created_at),
        updated_at: ts_from_sql(&updated_at),
    };
    Ok((session, status_raw))
}

fn finish_session((mut session, status_raw): (Session, String)) -> Session {
    session.status = SessionStatus::parse(&status_raw).unwrap_or_else(|| {
        tracing::warn!(
            session_id = %session.id,
            status = %status_raw,
            "unknown session status in database, treating as failed"
        );
        SessionStatus::Failed
    });
    session
}

impl Store {
    /// Insert a new session with status `initializing`.
    pub fn create_session(&self, new: NewSession, now: DateTime<Utc>) -> StoreResult<Session> {
        let session = Session {
            id: new.id,
            workflow_type: new.workflow_type,
            goal: new.goal,
            status: SessionStatus::Initializing,
            config: new.config,
            created_at: now,
            updated_at: now,
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, workflow_type, goal, status, config, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session.id.as_str(),
                    session.workflow_type,
                    session.goal,
                    session.status.as_str(),
                    session.config.to_string(),
                    ts_to_sql(session.created_at),
                    ts_to_sql(session.updated_at),
                ],
            )?;
            Ok(())
        })?;
        Ok(session)
    }

    pub fn get_session(&self, id: &SessionId) -> StoreResult<Session> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM sessions WHERE id = ?1")?;
            let mut rows = stmt.query_map(params![id.as_str()], row_to_session)?;
            match rows.next() {
                Some(row) => Ok(finish_session(row?)),
                None => Err(StoreError::not_found("session", id.as_str())),
            }
        })
    }

    /// Update a session's status.
    ///
    /// Transitions out of a terminal state are refused; updating to the
    /// current status is a no-op.
    pub fn update_session_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let current = self.get_session(id)?.status;
        if current == status {
            return Ok(());
        }
        if current.is_terminal() {
            return Err(StoreError::IllegalTransition {
                id: id.to_string(),
                from: current.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE sessions SET status = ?2, updated_at = ?3 WHERE id = ?1",
                params![id.as_str(), status.as_str(), ts_to_sql(now)],
            )?;
            if affected == 0 {
                return Err(StoreError::not_found("session", id.as_str()));
            }
            Ok(())
        })
    }

    /// List sessions, optionally filtered by status, newest first.
    pub fn list_sessions(&self, status: Option<SessionStatus>) -> StoreResult<Vec<Session>> {
        self.with_conn(|conn| {
            let mut out = Vec::new();
            match status {
                Some(status) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM sessions WHERE status = ?1 ORDER BY created_at DESC",
                    )?;
                    let rows = stmt.query_map(params![status.as_str()], row_to_session)?;
                    for row in rows {
                        out.push(finish_session(row?));
                    }
                }
                None => {
                    let mut stmt =
                        conn.prepare("SELECT * FROM sessions ORDER BY created_at DESC")?;
                    let rows = stmt.query_map([], row_to_session)?;
                    for row in rows {
                        out.push(finish_session(row?));
                    }
                }
            }
            Ok(out)
        })
    }

    /// Delete a session and, via foreign keys, everything it owns.
    pub fn delete_session(&self, id: &SessionId) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected =
                conn.execute("DELETE FROM sessions WHERE id = ?1", params![id.as_str()])?;
            if affected == 0 {
                return Err(StoreError::not_found("session", id.as_str()));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
