// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow instance value type and step execution records.
//!
//! The instance is pure data. All mutation goes through the engine
//! functions in the workflow crate, which keeps the state machine
//! testable without an orchestrator.

use crate::message::{MessageType, Verdict};
use crate::session::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Status of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Running,
    Complete,
    Failed,
    Timeout,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowStatus::Running => "running",
            WorkflowStatus::Complete => "complete",
            WorkflowStatus::Failed => "failed",
            WorkflowStatus::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

/// Status of one step attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepRecordStatus {
    Running,
    Complete,
    Skipped,
    Failed,
}

/// Output attached to a completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    /// Derived from the message type that completed the step.
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// One attempt at executing a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepExecutionRecord {
    pub step_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: StepRecordStatus,
    /// 1-based attempt number for this step.
    pub iteration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<StepOutput>,
}

/// Runtime state of the workflow state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub template: String,
    pub session_id: SessionId,
    pub goal: String,
    pub current_step: String,
    /// Ordered, append-only execution history.
    pub history: Vec<StepExecutionRecord>,
    /// Step id → number of attempts started.
    pub iterations: HashMap<String, u32>,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
}

impl WorkflowInstance {
    pub fn new(
        template: impl Into<String>,
        session_id: SessionId,
        goal: impl Into<String>,
        entry_step: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            template: template.into(),
            session_id,
            goal: goal.into(),
            current_step: entry_step.into(),
            history: Vec::new(),
            iterations: HashMap::new(),
            status: WorkflowStatus::Running,
            created_at,
        }
    }

    /// Number of attempts started for a step.
    pub fn iteration_count(&self, step_id: &str) -> u32 {
        self.iterations.get(step_id).copied().unwrap_or(0)
    }

    /// The single running record for a step, if one exists.
    pub fn running_record_mut(&mut self, step_id: &str) -> Option<&mut StepExecutionRecord> {
        self.history
            .iter_mut()
            .rev()
            .find(|r| r.step_id == step_id && r.status == StepRecordStatus::Running)
    }

    pub fn has_running_record(&self, step_id: &str) -> bool {
        self.history
            .iter()
            .any(|r| r.step_id == step_id && r.status == StepRecordStatus::Running)
    }

    /// Distinct step ids with at least one complete record.
    pub fn completed_step_ids(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for record in &self.history {
            if record.status == StepRecordStatus::Complete
                && !seen.iter().any(|s| s == &record.step_id)
            {
                seen.push(record.step_id.clone());
            }
        }
        seen
    }

}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
