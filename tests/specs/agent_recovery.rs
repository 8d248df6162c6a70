// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: agent timeout with successful restart.

use crate::prelude::*;
use swarm_adapters::PaneCall;
use swarm_core::{AgentStatus, ErrorCode, MessageType, Role, SessionStatus};

#[tokio::test]
async fn silent_reviewer_is_restarted_and_the_session_completes() {
    let swarm = swarm_with(|config| {
        config.agent_timeout_ms = 5_000;
    });
    let session = swarm
        .orchestrator
        .start_workflow("review", "audit the mailbox bus")
        .await
        .unwrap();

    // The reviewer produces nothing for longer than the agent timeout
    swarm.clock.advance_ms(6_000);

    assert!(
        swarm
            .eventually(|| {
                swarm
                    .store
                    .session_errors(&session.id)
                    .map(|errors| errors
                        .iter()
                        .any(|e| e.error.code == ErrorCode::AgentTimeout && e.recovered))
                    .unwrap_or(false)
            })
            .await,
        "no recovered AGENT_TIMEOUT in the error log"
    );

    // Recovery restarted the worker in its existing pane
    let starts = swarm
        .panes
        .calls()
        .iter()
        .filter(|c| matches!(c, PaneCall::StartWorker { .. }))
        .count();
    assert!(starts >= 2, "worker was not restarted (saw {starts} starts)");

    // The reviewer is back to ready
    assert!(
        swarm
            .eventually(|| {
                swarm
                    .orchestrator
                    .agents()
                    .iter()
                    .any(|a| a.role == Role::Reviewer && a.status == AgentStatus::Ready)
            })
            .await
    );

    // The revived reviewer finishes the workflow normally
    swarm.worker_sends(Role::Reviewer, MessageType::Review, None);
    assert!(swarm.reaches_step("summary").await);
    swarm.worker_sends(Role::Reviewer, MessageType::Result, None);
    assert!(
        swarm
            .eventually(|| {
                swarm
                    .store
                    .get_session(&session.id)
                    .map(|s| s.status == SessionStatus::Complete)
                    .unwrap_or(false)
            })
            .await,
        "session did not complete after recovery"
    );
}
