// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sessions::NewSession;
use crate::Store;
use chrono::{TimeZone, Utc};
use swarm_core::{
    Artifact, ErrorCode, Finding, MessageDraft, MessageType, ReviewStatus, Role, SwarmError,
    TaskItem, TaskStatus,
};

fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single().unwrap()
}

#[test]
fn stats_aggregate_across_tables() {
    let store = Store::open_in_memory().unwrap();
    let session_id = SessionId::new("swarm-1");
    store
        .create_session(
            NewSession {
                id: session_id.clone(),
                workflow_type: "research".into(),
                goal: "goal".into(),
                config: serde_json::json!({}),
            },
            ts(),
        )
        .unwrap();

    for (i, verified) in [(1, true), (2, false), (3, true)] {
        store
            .create_finding(&Finding {
                id: format!("f-{i}"),
                session_id: session_id.clone(),
                agent: Role::Researcher,
                claim: "c".into(),
                confidence: 0.5,
                sources: vec![],
                verified,
                created_at: ts(),
            })
            .unwrap();
    }

    store
        .create_artifact(&Artifact {
            id: "a-1".into(),
            session_id: session_id.clone(),
            agent: Role::Developer,
            path: "out.md".into(),
            kind: "doc".into(),
            description: None,
            review_status: ReviewStatus::Approved,
            created_at: ts(),
        })
        .unwrap();

    store
        .create_task(&TaskItem {
            id: "t-1".into(),
            session_id: session_id.clone(),
            assigned_to: None,
            title: "t".into(),
            description: String::new(),
            status: TaskStatus::Pending,
            created_at: ts(),
            updated_at: ts(),
        })
        .unwrap();

    for (i, kind) in [(1, MessageType::Task), (2, MessageType::Finding), (3, MessageType::Finding)]
    {
        let msg = MessageDraft::new(Role::Orchestrator, Role::Researcher, kind)
            .subject("s")
            .into_message(format!("m-{i}"), ts());
        store.create_message(&session_id, &msg, false).unwrap();
    }

    store
        .log_error(
            &SwarmError::new(ErrorCode::RateLimited, "panes", "slow down")
                .with_session(session_id.clone()),
            ts(),
        )
        .unwrap();

    let stats = store.session_stats(&session_id).unwrap();
    assert_eq!(stats.findings, CountBucket { total: 3, matching: 2 });
    assert_eq!(stats.artifacts, CountBucket { total: 1, matching: 1 });
    assert_eq!(stats.tasks, CountBucket { total: 1, matching: 0 });
    assert_eq!(stats.messages_total, 3);
    assert_eq!(stats.messages_by_type.get("finding"), Some(&2));
    assert_eq!(stats.messages_by_type.get("task"), Some(&1));
    assert_eq!(stats.errors_total, 1);
    assert_eq!(stats.errors_by_severity.get("warning"), Some(&1));
}

#[test]
fn empty_session_has_zero_stats() {
    let store = Store::open_in_memory().unwrap();
    let session_id = SessionId::new("swarm-1");
    store
        .create_session(
            NewSession {
                id: session_id.clone(),
                workflow_type: "review".into(),
                goal: "goal".into(),
                config: serde_json::json!({}),
            },
            ts(),
        )
        .unwrap();

    let stats = store.session_stats(&session_id).unwrap();
    assert_eq!(stats, SessionStats::default());
}
