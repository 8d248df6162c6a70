// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Managed-agent state as tracked by the orchestrator.
//!
//! A ManagedAgent ties a role to its pane, worktree, and outbox watermark.
//! The watermark is the timestamp of the newest outbox message that was
//! successfully routed; it only ever moves forward.

use crate::role::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// State of an agent as driven by the spawn and monitor loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Pane and worktree are being provisioned
    Spawning,
    /// Worker process launched, waiting for readiness
    Starting,
    /// Idle, waiting for a task
    Ready,
    /// Processing a task
    Working,
    /// Finished its part of the workflow
    Complete,
    /// Waiting on something that will not resolve on its own
    Blocked,
    /// Failed and not recovered
    Error,
    /// Torn down
    Terminated,
}

impl AgentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentStatus::Blocked | AgentStatus::Error | AgentStatus::Terminated
        )
    }

    /// Whether the agent is expected to be producing output.
    pub fn is_active(&self) -> bool {
        matches!(self, AgentStatus::Ready | AgentStatus::Working)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Spawning => "spawning",
            AgentStatus::Starting => "starting",
            AgentStatus::Ready => "ready",
            AgentStatus::Working => "working",
            AgentStatus::Complete => "complete",
            AgentStatus::Blocked => "blocked",
            AgentStatus::Error => "error",
            AgentStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the orchestrator's agent table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagedAgent {
    pub role: Role,
    pub pane_id: String,
    pub worktree: PathBuf,
    pub status: AgentStatus,
    pub last_activity_at: DateTime<Utc>,
    pub messages_processed: u64,
    /// Timestamp of the newest outbox message already routed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<DateTime<Utc>>,
}

impl ManagedAgent {
    pub fn new(role: Role, pane_id: String, worktree: PathBuf, now: DateTime<Utc>) -> Self {
        Self {
            role,
            pane_id,
            worktree,
            status: AgentStatus::Spawning,
            last_activity_at: now,
            messages_processed: 0,
            watermark: None,
        }
    }

    /// Record activity observed at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Advance the watermark, never backwards.
    pub fn advance_watermark(&mut self, ts: DateTime<Utc>) {
        match self.watermark {
            Some(current) if current >= ts => {}
            _ => self.watermark = Some(ts),
        }
    }

    pub fn record_message(&mut self, ts: DateTime<Utc>) {
        self.messages_processed += 1;
        self.touch(ts);
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
