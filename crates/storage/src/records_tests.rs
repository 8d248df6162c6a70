// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sessions::NewSession;
use crate::{Store, StoreError};
use chrono::TimeZone;

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single().unwrap()
}

fn store_with_session(id: &str) -> (Store, SessionId) {
    let store = Store::open_in_memory().unwrap();
    let session_id = SessionId::new(id);
    store
        .create_session(
            NewSession {
                id: session_id.clone(),
                workflow_type: "implement".into(),
                goal: "goal".into(),
                config: serde_json::json!({}),
            },
            ts(),
        )
        .unwrap();
    (store, session_id)
}

#[test]
fn finding_round_trip() {
    let (store, session_id) = store_with_session("swarm-1");
    let finding = Finding {
        id: "f-1".into(),
        session_id: session_id.clone(),
        agent: Role::Researcher,
        claim: "rename is atomic".into(),
        confidence: 0.85,
        sources: vec!["man 2 rename".into()],
        verified: true,
        created_at: ts(),
    };
    store.create_finding(&finding).unwrap();

    assert_eq!(store.get_finding("f-1").unwrap(), finding);
    assert_eq!(store.session_findings(&session_id).unwrap(), vec![finding]);
}

#[test]
fn artifact_review_status_update() {
    let (store, session_id) = store_with_session("swarm-1");
    let artifact = Artifact {
        id: "a-1".into(),
        session_id: session_id.clone(),
        agent: Role::Developer,
        path: "src/cache.rs".into(),
        kind: "source".into(),
        description: Some("bounded LRU".into()),
        review_status: ReviewStatus::Pending,
        created_at: ts(),
    };
    store.create_artifact(&artifact).unwrap();
    store
        .update_artifact_review_status("a-1", ReviewStatus::Approved)
        .unwrap();

    assert_eq!(
        store.get_artifact("a-1").unwrap().review_status,
        ReviewStatus::Approved
    );
    assert!(matches!(
        store.update_artifact_review_status("a-404", ReviewStatus::Rejected),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn decision_round_trip_with_alternatives() {
    let (store, session_id) = store_with_session("swarm-1");
    let decision = DecisionRecord {
        id: "d-1".into(),
        session_id: session_id.clone(),
        agent: Role::Architect,
        title: "use a ring buffer".into(),
        description: "bounded memory".into(),
        rationale: "predictable eviction".into(),
        alternatives: vec!["linked list".into(), "btree".into()],
        created_at: ts(),
    };
    store.create_decision(&decision).unwrap();
    assert_eq!(store.get_decision("d-1").unwrap(), decision);
    assert_eq!(store.session_decisions(&session_id).unwrap().len(), 1);
}

#[test]
fn task_status_update() {
    let (store, session_id) = store_with_session("swarm-1");
    let task = TaskItem {
        id: "t-1".into(),
        session_id: session_id.clone(),
        assigned_to: Some(Role::Developer),
        title: "implement eviction".into(),
        description: String::new(),
        status: TaskStatus::Pending,
        created_at: ts(),
        updated_at: ts(),
    };
    store.create_task(&task).unwrap();

    let later = ts() + chrono::Duration::minutes(5);
    store.update_task_status("t-1", TaskStatus::Complete, later).unwrap();

    let loaded = store.get_task("t-1").unwrap();
    assert_eq!(loaded.status, TaskStatus::Complete);
    assert_eq!(loaded.updated_at, later);
}

#[test]
fn corrupt_sources_column_reads_as_empty() {
    let (store, session_id) = store_with_session("swarm-1");
    let finding = Finding {
        id: "f-1".into(),
        session_id: session_id.clone(),
        agent: Role::Researcher,
        claim: "x".into(),
        confidence: 0.1,
        sources: vec!["a".into()],
        verified: false,
        created_at: ts(),
    };
    store.create_finding(&finding).unwrap();
    store
        .with_conn(|conn| {
            conn.execute("UPDATE findings SET sources = '[broken' WHERE id = 'f-1'", [])?;
            Ok(())
        })
        .unwrap();

    let loaded = store.get_finding("f-1").unwrap();
    assert!(loaded.sources.is_empty());
}
