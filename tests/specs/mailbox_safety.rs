// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: path-traversal rejection, plus the send/remove round trip
//! and priority ordering at the integration level.

use crate::prelude::*;
use swarm_core::{MessageDraft, MessageType, Priority, Role};
use swarm_mailbox::{MailboxError, SendOptions};

#[tokio::test]
async fn traversal_recipient_is_rejected_before_any_write() {
    let swarm = swarm();
    swarm.bus.initialize().unwrap();

    let err = swarm
        .bus
        .send_from_strings(
            "orchestrator",
            "../../../etc/passwd",
            MessageType::Task,
            "exfiltrate",
            "",
        )
        .unwrap_err();
    assert!(matches!(err, MailboxError::InvalidAgent(_)));

    // No outbox record of the attempt, and nothing outside the inbox dir
    assert!(swarm.bus.read_outbox(Role::Orchestrator).unwrap().is_empty());
    let inbox_dir = swarm.bus.paths().inbox_dir();
    let entries: Vec<_> = std::fs::read_dir(&inbox_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries.len(), Role::ALL.len());
    assert!(entries.iter().all(|name| name.ends_with(".json")));
}

#[tokio::test]
async fn send_then_remove_restores_the_inbox() {
    let swarm = swarm();
    swarm.bus.initialize().unwrap();

    let before = swarm.bus.read_inbox(Role::Developer).unwrap();
    let sent = swarm
        .bus
        .send(
            MessageDraft::new(Role::Orchestrator, Role::Developer, MessageType::Task)
                .subject("temp"),
            SendOptions::default(),
        )
        .unwrap();

    assert!(swarm.bus.remove_from_inbox(Role::Developer, &sent.id).unwrap());
    assert_eq!(swarm.bus.read_inbox(Role::Developer).unwrap(), before);
}

#[tokio::test]
async fn critical_messages_jump_the_queue() {
    let swarm = swarm();
    swarm.bus.initialize().unwrap();

    // An earlier normal message...
    swarm
        .bus
        .send(
            MessageDraft::new(Role::Orchestrator, Role::Developer, MessageType::Task)
                .subject("routine")
                .priority(Priority::Normal),
            SendOptions::default(),
        )
        .unwrap();
    swarm.clock.advance_ms(1_000);
    // ...followed by a later critical one
    swarm
        .bus
        .send(
            MessageDraft::new(Role::Orchestrator, Role::Developer, MessageType::Task)
                .subject("drop everything")
                .priority(Priority::Critical),
            SendOptions::default(),
        )
        .unwrap();

    let inbox = swarm.bus.read_inbox(Role::Developer).unwrap();
    assert_eq!(inbox[0].content.subject, "drop everything");
    assert_eq!(inbox[1].content.subject, "routine");
}
