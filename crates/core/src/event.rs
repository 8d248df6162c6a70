// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator lifecycle events delivered to subscribers.

use crate::agent::AgentStatus;
use crate::error::ErrorCode;
use crate::role::Role;
use crate::session::{SessionId, SessionStatus};
use serde::{Deserialize, Serialize};

/// Events emitted by the orchestrator.
///
/// Handlers run synchronously on the monitor task and must not block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    SessionStarted {
        session_id: SessionId,
        workflow_type: String,
    },
    SessionEnded {
        session_id: SessionId,
        status: SessionStatus,
    },
    AgentSpawned {
        session_id: SessionId,
        role: Role,
        pane_id: String,
    },
    AgentStatusChanged {
        session_id: SessionId,
        role: Role,
        status: AgentStatus,
    },
    MessageRouted {
        session_id: SessionId,
        message_id: String,
        from: Role,
        to: Role,
        step: String,
    },
    StageTransition {
        session_id: SessionId,
        from_step: String,
        to_step: String,
    },
    CheckpointCreated {
        session_id: SessionId,
        checkpoint_id: String,
        stage: String,
    },
    ErrorOccurred {
        session_id: Option<SessionId>,
        code: ErrorCode,
        component: String,
    },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
