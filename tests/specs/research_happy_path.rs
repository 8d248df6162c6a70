// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: research happy path. Finding → APPROVED review → result,
//! session completes with three steps executed and a clean error log.

use crate::prelude::*;
use swarm_core::{MessageType, Role, SessionStatus, Verdict};
use swarm_workflow::WorkflowResult;

#[tokio::test]
async fn research_happy_path_completes_cleanly() {
    let swarm = swarm();
    let session = swarm
        .orchestrator
        .start_workflow("research", "document the atomic-rename pattern")
        .await
        .unwrap();

    // The researcher receives the initial task
    let inbox = swarm.bus.read_inbox(Role::Researcher).unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(inbox[0].content.body.contains("atomic-rename"));

    // Researcher reports a finding, no verdict yet
    swarm.worker_sends(Role::Researcher, MessageType::Finding, None);
    assert!(swarm.reaches_step("verification").await, "no verification step");

    // The reviewer got the routed finding
    assert!(
        swarm
            .eventually(|| {
                swarm
                    .bus
                    .read_inbox(Role::Reviewer)
                    .map(|msgs| msgs.iter().any(|m| m.kind == MessageType::Finding))
                    .unwrap_or(false)
            })
            .await
    );

    // Reviewer approves
    swarm.worker_sends(Role::Reviewer, MessageType::Review, Some(Verdict::Approved));
    assert!(swarm.reaches_step("synthesis").await, "no synthesis step");

    // Researcher delivers the result
    swarm.worker_sends(Role::Researcher, MessageType::Result, None);
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
        "session did not complete"
    );

    // Exactly three steps executed, zero revisions, empty error log
    let artifacts = swarm.store.session_artifacts(&session.id).unwrap();
    assert_eq!(artifacts.len(), 1);
    let result: WorkflowResult =
        serde_json::from_str(&std::fs::read_to_string(&artifacts[0].path).unwrap()).unwrap();
    assert_eq!(result.steps_executed, 3);
    assert_eq!(result.revision_count, 0);
    assert!(swarm.store.session_errors(&session.id).unwrap().is_empty());

    // Auto-cleanup tears down the multiplexer session and worktrees
    // (it runs on the monitor task after the status flips)
    assert!(swarm.eventually(|| swarm.panes.sessions().is_empty()).await);
    assert!(swarm.eventually(|| swarm.worktrees.live_roles().is_empty()).await);
}
