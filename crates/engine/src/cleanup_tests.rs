// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_helpers::harness;
use swarm_adapters::{PaneCall, PaneGateway, WorktreeCall};
use swarm_core::{MessageDraft, MessageType, Role};
use swarm_mailbox::SendOptions;

#[tokio::test]
async fn cleanup_interrupts_kills_and_clears() {
    let h = harness();
    let session = h.orchestrator.start_workflow("research", "goal").await.unwrap();

    // Queue some traffic so clearing is observable
    h.bus
        .send(
            MessageDraft::new(Role::Researcher, Role::Orchestrator, MessageType::Status)
                .subject("hello"),
            SendOptions::default(),
        )
        .unwrap();

    h.orchestrator.kill().await.unwrap();

    let calls = h.panes.calls();
    // Each worker got an interrupt before its pane was killed
    let interrupts = calls
        .iter()
        .filter(|c| matches!(c, PaneCall::SendInterrupt { .. }))
        .count();
    assert!(interrupts >= 2);
    let pane_kills = calls
        .iter()
        .filter(|c| matches!(c, PaneCall::KillPane { .. }))
        .count();
    assert_eq!(pane_kills, 2);
    assert!(calls
        .iter()
        .any(|c| matches!(c, PaneCall::KillSession { name } if *name == session.id.to_string())));

    // Worktrees were force-removed with branch deletion
    assert!(h.worktrees.calls().iter().any(|c| matches!(
        c,
        WorktreeCall::RemoveAll { force: true, delete_branches: true }
    )));

    // Queues were cleared
    for role in Role::ALL {
        assert_eq!(h.bus.queue_depths(role).unwrap(), (0, 0));
    }

    // The in-memory agent table was reset
    assert!(h.orchestrator.agents().is_empty());
}

#[tokio::test]
async fn cleanup_survives_individual_pane_failures() {
    let h = harness();
    let session = h.orchestrator.start_workflow("research", "goal").await.unwrap();

    // Kill one pane out from under the orchestrator
    let agents = h.orchestrator.agents();
    h.panes.kill_pane(&agents[0].pane_id).await.unwrap();

    // Cleanup still completes and removes everything else
    h.orchestrator.kill().await.unwrap();
    assert!(h.panes.sessions().is_empty());
    assert!(h.worktrees.live_roles().is_empty());

    let row = h.store.get_session(&session.id).unwrap();
    assert_eq!(row.status, swarm_core::SessionStatus::Failed);
}
