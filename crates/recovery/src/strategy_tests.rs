// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    agent_timeout = { ErrorCode::AgentTimeout, RecoveryStrategy::Retry },
    routing_failed = { ErrorCode::RoutingFailed, RecoveryStrategy::Retry },
    rate_limited = { ErrorCode::RateLimited, RecoveryStrategy::Retry },
    database = { ErrorCode::DatabaseError, RecoveryStrategy::Retry },
    filesystem = { ErrorCode::FilesystemError, RecoveryStrategy::Retry },
    crashed = { ErrorCode::AgentCrashed, RecoveryStrategy::Restart },
    max_iterations = { ErrorCode::MaxIterationsExceeded, RecoveryStrategy::SkipForward },
    circuit_open = { ErrorCode::CircuitOpen, RecoveryStrategy::WaitForBreaker },
    workflow_timeout = { ErrorCode::WorkflowTimeout, RecoveryStrategy::Abort },
    permission = { ErrorCode::PermissionDenied, RecoveryStrategy::Abort },
    blocked = { ErrorCode::AgentBlocked, RecoveryStrategy::Escalate },
    invalid_args = { ErrorCode::InvalidArgs, RecoveryStrategy::Escalate },
)]
fn strategy_table(code: ErrorCode, expected: RecoveryStrategy) {
    assert_eq!(select_strategy(code), expected);
}

#[test]
fn recovery_stops_at_the_attempt_budget() {
    let err = SwarmError::new(ErrorCode::AgentTimeout, "monitor", "quiet");
    assert!(should_continue_recovery(&err, 0, 3));
    assert!(should_continue_recovery(&err, 2, 3));
    assert!(!should_continue_recovery(&err, 3, 3));
    assert!(!should_continue_recovery(&err, 4, 3));
}

#[test]
fn fatal_errors_are_never_recovered() {
    let err = SwarmError::new(ErrorCode::PermissionDenied, "store", "readonly");
    assert!(!should_continue_recovery(&err, 0, 3));
}

#[test]
fn non_recoverable_errors_are_never_recovered() {
    let err = SwarmError::new(ErrorCode::InvalidTransition, "workflow", "dead end");
    assert!(!should_continue_recovery(&err, 0, 3));
}
