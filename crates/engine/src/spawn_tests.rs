// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_helpers::harness;
use swarm_adapters::{PaneCall, PaneGateway};
use swarm_core::{ErrorCode, Role, SessionStatus};

#[tokio::test]
async fn spawn_retries_transient_pane_failures() {
    let h = harness();
    // First pane creation fails, the retry succeeds
    h.panes.fail_next_create_pane(1);

    let session = h.orchestrator.start_workflow("review", "audit").await.unwrap();
    assert_eq!(session.status, SessionStatus::Running);

    let creates = h
        .panes
        .calls()
        .iter()
        .filter(|c| matches!(c, PaneCall::CreatePane { .. }))
        .count();
    assert_eq!(creates, 2);

    h.orchestrator.kill().await.unwrap();
}

#[tokio::test]
async fn spawn_gives_up_after_the_retry_budget() {
    let h = harness();
    // agent_spawn allows 2 retries = 3 attempts; fail them all
    h.panes.fail_next_create_pane(3);

    let err = h.orchestrator.start_workflow("review", "audit").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AgentSpawnFailed);
    assert_eq!(err.context.get("role").map(String::as_str), Some("reviewer"));

    // Everything was rolled back
    assert!(h.panes.sessions().is_empty());
    assert!(h.worktrees.live_roles().is_empty());
    let failed = h.store.list_sessions(Some(SessionStatus::Failed)).unwrap();
    assert_eq!(failed.len(), 1);
}

#[tokio::test]
async fn workers_start_in_their_worktrees() {
    let h = harness();
    h.orchestrator.start_workflow("research", "goal").await.unwrap();

    let agents = h.orchestrator.agents();
    for role in [Role::Researcher, Role::Reviewer] {
        let agent = agents.iter().find(|a| a.role == role).unwrap();
        assert!(agent.worktree.ends_with(role.as_str()));
        assert!(h.panes.is_worker_active(&agent.pane_id, "claude").await.unwrap());
    }

    h.orchestrator.kill().await.unwrap();
}
