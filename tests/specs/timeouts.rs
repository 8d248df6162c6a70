// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: workflow timeout fails the session, persists a partial
//! result, and removes every provisioned resource.

use crate::prelude::*;
use swarm_core::{ErrorCode, SessionStatus};
use swarm_workflow::WorkflowResult;

#[tokio::test]
async fn workflow_timeout_fails_and_cleans_up() {
    let swarm = swarm_with(|config| {
        config.workflow_timeout_ms = 100;
    });
    let session = swarm
        .orchestrator
        .start_workflow("research", "a goal nobody works on")
        .await
        .unwrap();

    // The researcher never responds; the deadline passes
    swarm.clock.advance_ms(150);

    assert!(
        swarm
            .eventually(|| {
                swarm
                    .store
                    .get_session(&session.id)
                    .map(|s| s.status == SessionStatus::Failed)
                    .unwrap_or(false)
            })
            .await,
        "session did not fail within a monitor tick of the deadline"
    );

    // The error log carries the timeout
    let errors = swarm.store.session_errors(&session.id).unwrap();
    assert!(errors.iter().any(|e| e.error.code == ErrorCode::WorkflowTimeout));

    // A synthesized partial result was persisted
    let artifacts = swarm.store.session_artifacts(&session.id).unwrap();
    assert_eq!(artifacts.len(), 1);
    let result: WorkflowResult =
        serde_json::from_str(&std::fs::read_to_string(&artifacts[0].path).unwrap()).unwrap();
    assert_eq!(result.status, swarm_core::WorkflowStatus::Timeout);

    // Cleanup removes the multiplexer session and all worktrees (it
    // runs on the monitor task after the status flips)
    assert!(swarm.eventually(|| swarm.panes.sessions().is_empty()).await);
    assert!(swarm.eventually(|| swarm.worktrees.live_roles().is_empty()).await);
}

#[tokio::test]
async fn terminal_sessions_never_leave_their_state() {
    let swarm = swarm_with(|config| {
        config.workflow_timeout_ms = 100;
    });
    let session = swarm
        .orchestrator
        .start_workflow("research", "goal")
        .await
        .unwrap();
    swarm.clock.advance_ms(150);
    assert!(
        swarm
            .eventually(|| {
                swarm
                    .store
                    .get_session(&session.id)
                    .map(|s| s.status.is_terminal())
                    .unwrap_or(false)
            })
            .await
    );

    // A later stop() cannot move the session out of failed
    swarm.orchestrator.stop().await.unwrap();
    let row = swarm.store.get_session(&session.id).unwrap();
    assert_eq!(row.status, SessionStatus::Failed);
}
