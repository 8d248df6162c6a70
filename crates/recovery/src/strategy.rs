// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery strategy selection.

use swarm_core::{ErrorCode, Severity, SwarmError};

/// What to do about a recoverable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Re-run the failed operation with its retry config; escalate when
    /// the budget is exhausted.
    Retry,
    /// Respawn the agent in its pane, preserving the worktree.
    Restart,
    /// Route the workflow forward past the blocked step.
    SkipForward,
    /// Wait for the circuit breaker to half-open, then retry once.
    WaitForBreaker,
    /// Surface to the session level; no automatic fix.
    Escalate,
    /// Clean up and fail the session.
    Abort,
}

/// Strategy for an error code, per the recovery table.
pub fn select_strategy(code: ErrorCode) -> RecoveryStrategy {
    match code {
        ErrorCode::AgentTimeout
        | ErrorCode::RoutingFailed
        | ErrorCode::RateLimited
        | ErrorCode::DatabaseError
        | ErrorCode::FilesystemError
        | ErrorCode::AgentSpawnFailed => RecoveryStrategy::Retry,
        ErrorCode::AgentCrashed => RecoveryStrategy::Restart,
        ErrorCode::MaxIterationsExceeded => RecoveryStrategy::SkipForward,
        ErrorCode::CircuitOpen => RecoveryStrategy::WaitForBreaker,
        ErrorCode::WorkflowTimeout | ErrorCode::PermissionDenied => RecoveryStrategy::Abort,
        ErrorCode::AgentBlocked
        | ErrorCode::WorkflowNotFound
        | ErrorCode::StepNotFound
        | ErrorCode::InvalidTransition
        | ErrorCode::StageFailed
        | ErrorCode::InvalidArgs
        | ErrorCode::SessionExists
        | ErrorCode::SystemError => RecoveryStrategy::Escalate,
    }
}

/// Loop protection: stop recovering once the attempt budget is spent, the
/// error is fatal, or it is marked non-recoverable.
pub fn should_continue_recovery(error: &SwarmError, attempts_so_far: u32, max_attempts: u32) -> bool {
    if attempts_so_far >= max_attempts {
        return false;
    }
    if error.severity() == Severity::Fatal {
        return false;
    }
    error.recoverable()
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
