// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed error taxonomy.
//!
//! Every failure that crosses a module boundary is expressed as a
//! [`SwarmError`] carrying a code from the closed set. Category, severity,
//! recoverability and retryability are derived from the code, so the
//! classification table lives in exactly one place.

use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Closed set of error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AgentSpawnFailed,
    AgentTimeout,
    AgentCrashed,
    AgentBlocked,
    WorkflowNotFound,
    StepNotFound,
    InvalidTransition,
    MaxIterationsExceeded,
    WorkflowTimeout,
    StageFailed,
    RoutingFailed,
    RateLimited,
    CircuitOpen,
    DatabaseError,
    FilesystemError,
    PermissionDenied,
    InvalidArgs,
    SessionExists,
    SystemError,
}

/// Coarse origin of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Agent,
    Workflow,
    System,
    External,
    User,
}

/// How bad it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Info,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Agent => "agent",
            ErrorCategory::Workflow => "workflow",
            ErrorCategory::System => "system",
            ErrorCategory::External => "external",
            ErrorCategory::User => "user",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AgentSpawnFailed => "AGENT_SPAWN_FAILED",
            ErrorCode::AgentTimeout => "AGENT_TIMEOUT",
            ErrorCode::AgentCrashed => "AGENT_CRASHED",
            ErrorCode::AgentBlocked => "AGENT_BLOCKED",
            ErrorCode::WorkflowNotFound => "WORKFLOW_NOT_FOUND",
            ErrorCode::StepNotFound => "STEP_NOT_FOUND",
            ErrorCode::InvalidTransition => "INVALID_TRANSITION",
            ErrorCode::MaxIterationsExceeded => "MAX_ITERATIONS_EXCEEDED",
            ErrorCode::WorkflowTimeout => "WORKFLOW_TIMEOUT",
            ErrorCode::StageFailed => "STAGE_FAILED",
            ErrorCode::RoutingFailed => "ROUTING_FAILED",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::CircuitOpen => "CIRCUIT_OPEN",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::FilesystemError => "FILESYSTEM_ERROR",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::InvalidArgs => "INVALID_ARGS",
            ErrorCode::SessionExists => "SESSION_EXISTS",
            ErrorCode::SystemError => "SYSTEM_ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<ErrorCode> {
        match s {
            "AGENT_SPAWN_FAILED" => Some(ErrorCode::AgentSpawnFailed),
            "AGENT_TIMEOUT" => Some(ErrorCode::AgentTimeout),
            "AGENT_CRASHED" => Some(ErrorCode::AgentCrashed),
            "AGENT_BLOCKED" => Some(ErrorCode::AgentBlocked),
            "WORKFLOW_NOT_FOUND" => Some(ErrorCode::WorkflowNotFound),
            "STEP_NOT_FOUND" => Some(ErrorCode::StepNotFound),
            "INVALID_TRANSITION" => Some(ErrorCode::InvalidTransition),
            "MAX_ITERATIONS_EXCEEDED" => Some(ErrorCode::MaxIterationsExceeded),
            "WORKFLOW_TIMEOUT" => Some(ErrorCode::WorkflowTimeout),
            "STAGE_FAILED" => Some(ErrorCode::StageFailed),
            "ROUTING_FAILED" => Some(ErrorCode::RoutingFailed),
            "RATE_LIMITED" => Some(ErrorCode::RateLimited),
            "CIRCUIT_OPEN" => Some(ErrorCode::CircuitOpen),
            "DATABASE_ERROR" => Some(ErrorCode::DatabaseError),
            "FILESYSTEM_ERROR" => Some(ErrorCode::FilesystemError),
            "PERMISSION_DENIED" => Some(ErrorCode::PermissionDenied),
            "INVALID_ARGS" => Some(ErrorCode::InvalidArgs),
            "SESSION_EXISTS" => Some(ErrorCode::SessionExists),
            "SYSTEM_ERROR" => Some(ErrorCode::SystemError),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::AgentSpawnFailed
            | ErrorCode::AgentTimeout
            | ErrorCode::AgentCrashed
            | ErrorCode::AgentBlocked => ErrorCategory::Agent,
            ErrorCode::StepNotFound
            | ErrorCode::InvalidTransition
            | ErrorCode::MaxIterationsExceeded
            | ErrorCode::WorkflowTimeout
            | ErrorCode::StageFailed
            | ErrorCode::RoutingFailed => ErrorCategory::Workflow,
            ErrorCode::RateLimited | ErrorCode::CircuitOpen => ErrorCategory::External,
            ErrorCode::DatabaseError
            | ErrorCode::FilesystemError
            | ErrorCode::PermissionDenied
            | ErrorCode::SystemError => ErrorCategory::System,
            ErrorCode::WorkflowNotFound | ErrorCode::InvalidArgs | ErrorCode::SessionExists => {
                ErrorCategory::User
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::PermissionDenied => Severity::Fatal,
            ErrorCode::AgentBlocked
            | ErrorCode::MaxIterationsExceeded
            | ErrorCode::RateLimited
            | ErrorCode::CircuitOpen => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn recoverable(&self) -> bool {
        !matches!(
            self,
            ErrorCode::WorkflowNotFound
                | ErrorCode::StepNotFound
                | ErrorCode::InvalidTransition
                | ErrorCode::WorkflowTimeout
                | ErrorCode::PermissionDenied
                | ErrorCode::InvalidArgs
                | ErrorCode::SessionExists
                | ErrorCode::SystemError
        )
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::AgentSpawnFailed
                | ErrorCode::AgentTimeout
                | ErrorCode::RoutingFailed
                | ErrorCode::RateLimited
                | ErrorCode::DatabaseError
                | ErrorCode::FilesystemError
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed error with code, component, and context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmError {
    pub code: ErrorCode,
    pub message: String,
    /// Module or subsystem that raised the error.
    pub component: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl SwarmError {
    pub fn new(code: ErrorCode, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            component: component.into(),
            context: BTreeMap::new(),
            session_id: None,
        }
    }

    /// Wrap a lower-level error into a higher-level code without losing
    /// the original message.
    pub fn wrap(
        code: ErrorCode,
        component: impl Into<String>,
        source: &dyn std::error::Error,
    ) -> Self {
        Self::new(code, component, source.to_string())
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn recoverable(&self) -> bool {
        self.code.recoverable()
    }

    pub fn retryable(&self) -> bool {
        self.code.retryable()
    }
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.component, self.message)
    }
}

impl std::error::Error for SwarmError {}

pub type SwarmResult<T> = Result<T, SwarmError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
