// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recoverable checkpoints.
//!
//! A checkpoint captures the observable subset of orchestrator state at a
//! stage boundary. Maps are serialized as JSON objects keyed by role name;
//! on load each key is validated against the closed role set and invalid
//! entries are dropped with a warning.

use crate::store::{ts_from_sql, ts_to_sql, Store, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use swarm_core::{AgentStatus, ErrorCode, Role, SessionId, SwarmError, WorkflowStatus};

/// Workflow-state subset carried by a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowView {
    pub current_step: String,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub completed_steps: Vec<String>,
    #[serde(default)]
    pub pending_steps: Vec<String>,
}

/// Per-agent state carried by a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub status: AgentStatus,
    pub messages_processed: u64,
    pub last_activity_at: DateTime<Utc>,
}

/// Queue depths per agent at checkpoint time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QueueDepth {
    pub inbox: usize,
    pub outbox: usize,
}

/// One recovery attempt, as recorded in the session's recovery log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAttempt {
    pub error_code: ErrorCode,
    pub strategy: String,
    pub at: DateTime<Utc>,
    pub succeeded: bool,
}

/// Serializable checkpoint payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub workflow: WorkflowView,
    /// Role name → agent state.
    #[serde(default)]
    pub agents: BTreeMap<String, AgentView>,
    /// Role name → queue depths.
    #[serde(default)]
    pub queues: BTreeMap<String, QueueDepth>,
    #[serde(default)]
    pub errors: Vec<SwarmError>,
    #[serde(default)]
    pub recovery_attempts: Vec<RecoveryAttempt>,
}

impl CheckpointState {
    /// Drop map entries whose keys are not registered roles.
    fn validate_domains(&mut self, checkpoint_id: &str) {
        self.agents.retain(|key, _| {
            let ok = Role::parse(key).is_ok();
            if !ok {
                tracing::warn!(checkpoint_id, key, "dropping agent entry with unknown role");
            }
            ok
        });
        self.queues.retain(|key, _| {
            let ok = Role::parse(key).is_ok();
            if !ok {
                tracing::warn!(checkpoint_id, key, "dropping queue entry with unknown role");
            }
            ok
        });
    }
}

/// A stored checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub session_id: SessionId,
    pub stage: String,
    pub state: CheckpointState,
    pub created_at: DateTime<Utc>,
}

fn row_to_checkpoint(row: &Row<'_>) -> rusqlite::Result<(Checkpoint, Option<String>)> {
    let id: String = row.get("id")?;
    let state_raw: String = row.get("state")?;
    let created_at: String = row.get("created_at")?;
    let (state, parse_err) = match serde_json::from_str::<CheckpointState>(&state_raw) {
        Ok(state) => (state, None),
        Err(err) => (
            CheckpointState {
                workflow: WorkflowView {
                    current_step: String::new(),
                    status: WorkflowStatus::Failed,
                    completed_steps: Vec::new(),
                    pending_steps: Vec::new(),
                },
                agents: BTreeMap::new(),
                queues: BTreeMap::new(),
                errors: Vec::new(),
                recovery_attempts: Vec::new(),
            },
            Some(err.to_string()),
        ),
    };
    Ok((
        Checkpoint {
            id,
            session_id: SessionId::new(row.get::<_, String>("session_id")?),
            stage: row.get("stage")?,
            state,
            created_at: ts_from_sql(&created_at),
        },
        parse_err,
    ))
}

fn finish_checkpoint((mut checkpoint, parse_err): (Checkpoint, Option<String>)) -> Checkpoint {
    if let Some(err) = parse_err {
        tracing::warn!(
            checkpoint_id = %checkpoint.id,
            %err,
            "malformed checkpoint state, loading empty"
        );
    }
    checkpoint.state.validate_domains(&checkpoint.id);
    checkpoint
}

impl Store {
    pub fn create_checkpoint(&self, checkpoint: &Checkpoint) -> StoreResult<()> {
        let state = serde_json::to_string(&checkpoint.state)
            .map_err(|err| StoreError::Io(std::io::Error::other(err)))?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO checkpoints (id, session_id, stage, state, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    checkpoint.id,
                    checkpoint.session_id.as_str(),
                    checkpoint.stage,
                    state,
                    ts_to_sql(checkpoint.created_at),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_checkpoint(&self, id: &str) -> StoreResult<Checkpoint> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM checkpoints WHERE id = ?1",
                params![id],
                row_to_checkpoint,
            )
            .map(finish_checkpoint)
            .map_err(|err| match err {
                rusqlite::Error::QueryReturnedNoRows => StoreError::not_found("checkpoint", id),
                other => StoreError::Sqlite(other),
            })
        })
    }

    /// Most recent checkpoint for a session, if any.
    pub fn latest_checkpoint(&self, session_id: &SessionId) -> StoreResult<Option<Checkpoint>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM checkpoints WHERE session_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT 1",
            )?;
            let mut rows = stmt.query_map(params![session_id.as_str()], row_to_checkpoint)?;
            match rows.next() {
                Some(row) => Ok(Some(finish_checkpoint(row?))),
                None => Ok(None),
            }
        })
    }

    /// All checkpoints for a session, newest first.
    pub fn list_checkpoints(&self, session_id: &SessionId) -> StoreResult<Vec<Checkpoint>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM checkpoints WHERE session_id = ?1
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![session_id.as_str()], row_to_checkpoint)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(finish_checkpoint(row?));
            }
            Ok(out)
        })
    }

    /// Delete all but the newest `keep` checkpoints. Returns how many rows
    /// were removed.
    pub fn prune_checkpoints(&self, session_id: &SessionId, keep: usize) -> StoreResult<usize> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "DELETE FROM checkpoints WHERE session_id = ?1 AND id NOT IN (
                     SELECT id FROM checkpoints WHERE session_id = ?1
                     ORDER BY created_at DESC, id DESC LIMIT ?2
                 )",
                params![session_id.as_str(), keep as i64],
            )?;
            Ok(affected)
        })
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
