// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint lifecycle: create on stage boundaries, restore the latest,
//! prune the rest.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use swarm_core::{ManagedAgent, SessionId, SwarmError, WorkflowInstance};
use swarm_storage::{
    AgentView, Checkpoint, CheckpointState, QueueDepth, RecoveryAttempt, Store, StoreResult,
    WorkflowView,
};

/// Creates and restores checkpoints through the store.
#[derive(Clone)]
pub struct CheckpointManager {
    store: Store,
    keep: usize,
}

impl CheckpointManager {
    pub fn new(store: Store, keep: usize) -> Self {
        Self { store, keep }
    }

    /// Snapshot the observable session state at a stage boundary.
    ///
    /// Pruning to the retention limit happens in the same call so the
    /// table never grows past `keep` per session.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        id: String,
        session_id: &SessionId,
        stage: &str,
        instance: &WorkflowInstance,
        pending_steps: Vec<String>,
        agents: &[ManagedAgent],
        queues: BTreeMap<String, QueueDepth>,
        errors: Vec<SwarmError>,
        recovery_attempts: Vec<RecoveryAttempt>,
        now: DateTime<Utc>,
    ) -> StoreResult<Checkpoint> {
        let agent_views: BTreeMap<String, AgentView> = agents
            .iter()
            .map(|agent| {
                (
                    agent.role.as_str().to_string(),
                    AgentView {
                        status: agent.status,
                        messages_processed: agent.messages_processed,
                        last_activity_at: agent.last_activity_at,
                    },
                )
            })
            .collect();

        let checkpoint = Checkpoint {
            id,
            session_id: session_id.clone(),
            stage: stage.to_string(),
            state: CheckpointState {
                workflow: WorkflowView {
                    current_step: instance.current_step.clone(),
                    status: instance.status,
                    completed_steps: instance.completed_step_ids(),
                    pending_steps,
                },
                agents: agent_views,
                queues,
                errors,
                recovery_attempts,
            },
            created_at: now,
        };

        self.store.create_checkpoint(&checkpoint)?;
        let pruned = self.store.prune_checkpoints(session_id, self.keep)?;
        if pruned > 0 {
            tracing::debug!(session_id = %session_id, pruned, "pruned old checkpoints");
        }
        Ok(checkpoint)
    }

    /// Latest checkpoint for a session, if any.
    pub fn restore_latest(&self, session_id: &SessionId) -> StoreResult<Option<Checkpoint>> {
        self.store.latest_checkpoint(session_id)
    }

    /// A specific checkpoint by id.
    pub fn restore(&self, id: &str) -> StoreResult<Checkpoint> {
        self.store.get_checkpoint(id)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
