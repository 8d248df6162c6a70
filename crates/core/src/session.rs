// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier and status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Unique identifier for an orchestration session.
    pub struct SessionId;
}

/// Lifecycle status of a session.
///
/// The forward path is initializing → running → synthesizing → complete,
/// with running ↔ paused excursions. Cancelled and failed are reachable
/// from any non-terminal state. Terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Initializing,
    Running,
    Paused,
    Synthesizing,
    Complete,
    Cancelled,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "initializing",
            SessionStatus::Running => "running",
            SessionStatus::Paused => "paused",
            SessionStatus::Synthesizing => "synthesizing",
            SessionStatus::Complete => "complete",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<SessionStatus> {
        match s {
            "initializing" => Some(SessionStatus::Initializing),
            "running" => Some(SessionStatus::Running),
            "paused" => Some(SessionStatus::Paused),
            "synthesizing" => Some(SessionStatus::Synthesizing),
            "complete" => Some(SessionStatus::Complete),
            "cancelled" => Some(SessionStatus::Cancelled),
            "failed" => Some(SessionStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Complete | SessionStatus::Cancelled | SessionStatus::Failed
        )
    }

    /// Whether a transition to `next` is legal.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        // Terminal jumps are allowed from any non-terminal state.
        if matches!(next, SessionStatus::Cancelled | SessionStatus::Failed) {
            return true;
        }
        matches!(
            (self, next),
            (SessionStatus::Initializing, SessionStatus::Running)
                | (SessionStatus::Running, SessionStatus::Paused)
                | (SessionStatus::Running, SessionStatus::Synthesizing)
                | (SessionStatus::Paused, SessionStatus::Running)
                | (SessionStatus::Synthesizing, SessionStatus::Complete)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub workflow_type: String,
    pub goal: String,
    pub status: SessionStatus,
    /// Configuration snapshot taken at creation.
    pub config: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
