// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory orchestrator state.
//!
//! Wrapped in a mutex for cross-task visibility, but mutated only by the
//! startup path and then the monitor task.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use swarm_core::{ManagedAgent, Role, Session, WorkflowInstance};
use swarm_storage::RecoveryAttempt;
use swarm_workflow::WorkflowTemplate;

/// Everything the monitor supervises for the active session.
#[derive(Default)]
pub struct OrchestratorState {
    pub session: Option<Session>,
    pub instance: Option<WorkflowInstance>,
    pub template: Option<Arc<WorkflowTemplate>>,
    /// Fixed-iteration-order agent table.
    pub agents: IndexMap<Role, ManagedAgent>,
    /// Session recovery log, included in checkpoints.
    pub recovery_log: Vec<RecoveryAttempt>,
    /// Recovery attempts per agent, for loop protection.
    pub recovery_counts: HashMap<Role, u32>,
}

impl OrchestratorState {
    /// Whether a session is active (present and not terminal).
    pub fn has_active_session(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.status.is_terminal())
    }

    /// Forget the per-session state. The session row itself stays in the
    /// store.
    pub fn reset(&mut self) {
        self.instance = None;
        self.template = None;
        self.agents.clear();
        self.recovery_log.clear();
        self.recovery_counts.clear();
    }
}
