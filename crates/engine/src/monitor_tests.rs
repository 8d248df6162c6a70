// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_helpers::{harness_with, wait_until, Harness};
use swarm_core::{
    AgentStatus, ErrorCode, MessageDraft, MessageType, Role, SessionStatus, Verdict,
};
use swarm_mailbox::SendOptions;

fn fast() -> Harness {
    harness_with(|config| {
        config.monitor_interval_ms = 20;
    })
}

/// Simulate a worker dropping a message into its outbox.
fn worker_send(h: &Harness, from: Role, kind: MessageType, verdict: Option<Verdict>) {
    h.clock.advance_ms(1_000);
    let mut draft = MessageDraft::new(from, Role::Orchestrator, kind).subject("work product");
    if let Some(verdict) = verdict {
        draft = draft.verdict(verdict);
    }
    h.bus.send(draft, SendOptions::default()).unwrap();
}

#[tokio::test]
async fn monitor_routes_outbox_messages_through_to_completion() {
    let h = fast();
    let session = h.orchestrator.start_workflow("research", "atomic rename").await.unwrap();

    worker_send(&h, Role::Researcher, MessageType::Finding, None);
    assert!(
        wait_until(|| {
            h.orchestrator
                .instance()
                .is_some_and(|i| i.current_step == "verification")
        })
        .await,
        "finding was not routed"
    );

    worker_send(&h, Role::Reviewer, MessageType::Review, Some(Verdict::Approved));
    assert!(
        wait_until(|| {
            h.orchestrator
                .instance()
                .is_some_and(|i| i.current_step == "synthesis")
        })
        .await,
        "approval was not routed"
    );

    worker_send(&h, Role::Researcher, MessageType::Result, None);
    assert!(
        wait_until(|| {
            h.store
                .get_session(&session.id)
                .map(|s| s.status == SessionStatus::Complete)
                .unwrap_or(false)
        })
        .await,
        "session did not complete"
    );

    assert!(h.store.session_errors(&session.id).unwrap().is_empty());
}

#[tokio::test]
async fn watermarks_only_move_forward() {
    let h = fast();
    h.orchestrator.start_workflow("research", "goal").await.unwrap();

    worker_send(&h, Role::Researcher, MessageType::Finding, None);
    assert!(
        wait_until(|| {
            h.orchestrator
                .agents()
                .iter()
                .find(|a| a.role == Role::Researcher)
                .is_some_and(|a| a.watermark.is_some())
        })
        .await
    );

    let first = h
        .orchestrator
        .agents()
        .into_iter()
        .find(|a| a.role == Role::Researcher)
        .unwrap()
        .watermark;

    // Another message advances it, never regresses
    worker_send(&h, Role::Researcher, MessageType::Status, None);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let second = h
        .orchestrator
        .agents()
        .into_iter()
        .find(|a| a.role == Role::Researcher)
        .unwrap()
        .watermark;
    assert!(second >= first);

    h.orchestrator.kill().await.unwrap();
}

#[tokio::test]
async fn silent_agent_is_restarted_and_recovered() {
    let h = harness_with(|config| {
        config.monitor_interval_ms = 20;
        config.agent_timeout_ms = 5_000;
    });
    let session = h.orchestrator.start_workflow("review", "audit the module").await.unwrap();

    // The reviewer goes quiet past the agent timeout
    h.clock.advance_ms(6_000);

    assert!(
        wait_until(|| {
            h.store
                .session_errors(&session.id)
                .map(|errors| {
                    errors
                        .iter()
                        .any(|e| e.error.code == ErrorCode::AgentTimeout && e.recovered)
                })
                .unwrap_or(false)
        })
        .await,
        "timeout was not recorded as recovered"
    );

    // The reviewer is back to ready after the restart
    let agents = h.orchestrator.agents();
    let reviewer = agents.iter().find(|a| a.role == Role::Reviewer).unwrap();
    assert_eq!(reviewer.status, AgentStatus::Ready);

    // The worker was restarted in the same pane
    let restarts = h
        .panes
        .calls()
        .iter()
        .filter(|c| matches!(c, swarm_adapters::PaneCall::StartWorker { .. }))
        .count();
    assert!(restarts >= 2, "expected a restart, saw {restarts} starts");

    h.orchestrator.kill().await.unwrap();
}

#[tokio::test]
async fn workflow_timeout_fails_the_session_with_partial_result() {
    let h = harness_with(|config| {
        config.monitor_interval_ms = 20;
        config.workflow_timeout_ms = 100;
    });
    let session = h.orchestrator.start_workflow("research", "slow goal").await.unwrap();

    // Let the deadline pass on the fake clock
    h.clock.advance_ms(200);

    assert!(
        wait_until(|| {
            h.store
                .get_session(&session.id)
                .map(|s| s.status == SessionStatus::Failed)
                .unwrap_or(false)
        })
        .await,
        "session did not fail on timeout"
    );

    let errors = h.store.session_errors(&session.id).unwrap();
    assert!(errors.iter().any(|e| e.error.code == ErrorCode::WorkflowTimeout));

    // A partial result exists and resources are gone once the monitor
    // finishes its cleanup pass
    let artifacts = h.store.session_artifacts(&session.id).unwrap();
    assert_eq!(artifacts.len(), 1);
    assert!(wait_until(|| h.panes.sessions().is_empty()).await);
    assert!(wait_until(|| h.worktrees.live_roles().is_empty()).await);
}
