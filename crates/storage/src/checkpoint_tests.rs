// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sessions::NewSession;
use crate::Store;
use chrono::{Duration, TimeZone};

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
                workflow_type: "full".into(),
                goal: "goal".into(),
                config: serde_json::json!({}),
            },
            ts(),
        )
        .unwrap();
    (store, session_id)
}

fn checkpoint(id: &str, session_id: &SessionId, at: DateTime<Utc>) -> Checkpoint {
    let mut agents = BTreeMap::new();
    agents.insert(
        "researcher".to_string(),
        AgentView {
            status: AgentStatus::Working,
            messages_processed: 3,
            last_activity_at: at,
        },
    );
    let mut queues = BTreeMap::new();
    queues.insert("researcher".to_string(), QueueDepth { inbox: 1, outbox: 0 });
    Checkpoint {
        id: id.to_string(),
        session_id: session_id.clone(),
        stage: "architecture".to_string(),
        state: CheckpointState {
            workflow: WorkflowView {
                current_step: "architecture".into(),
                status: WorkflowStatus::Running,
                completed_steps: vec!["research".into()],
                pending_steps: vec!["design_review".into()],
            },
            agents,
            queues,
            errors: vec![],
            recovery_attempts: vec![RecoveryAttempt {
                error_code: ErrorCode::AgentTimeout,
                strategy: "restart".into(),
                at,
                succeeded: true,
            }],
        },
        created_at: at,
    }
}

#[test]
fn serialize_deserialize_is_identity() {
    let (store, session_id) = store_with_session("swarm-1");
    let original = checkpoint("cp-1", &session_id, ts());
    store.create_checkpoint(&original).unwrap();

    let loaded = store.get_checkpoint("cp-1").unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn latest_picks_the_newest() {
    let (store, session_id) = store_with_session("swarm-1");
    store.create_checkpoint(&checkpoint("cp-1", &session_id, ts())).unwrap();
    store
        .create_checkpoint(&checkpoint("cp-2", &session_id, ts() + Duration::seconds(30)))
        .unwrap();

    let latest = store.latest_checkpoint(&session_id).unwrap().unwrap();
    assert_eq!(latest.id, "cp-2");

    let other = SessionId::new("swarm-other");
    assert!(store.latest_checkpoint(&other).unwrap().is_none());
}

#[test]
fn prune_keeps_the_newest_n() {
    let (store, session_id) = store_with_session("swarm-1");
    for i in 0..5 {
        store
            .create_checkpoint(&checkpoint(
                &format!("cp-{i}"),
                &session_id,
                ts() + Duration::seconds(i),
            ))
            .unwrap();
    }

    let deleted = store.prune_checkpoints(&session_id, 2).unwrap();
    assert_eq!(deleted, 3);

    let remaining = store.list_checkpoints(&session_id).unwrap();
    let ids: Vec<_> = remaining.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["cp-4", "cp-3"]);
}

#[test]
fn unknown_role_keys_are_dropped_on_load() {
    let (store, session_id) = store_with_session("swarm-1");
    let mut cp = checkpoint("cp-1", &session_id, ts());
    cp.state.agents.insert(
        "impostor".to_string(),
        AgentView {
            status: AgentStatus::Ready,
            messages_processed: 0,
            last_activity_at: ts(),
        },
    );
    store.create_checkpoint(&cp).unwrap();

    let loaded = store.get_checkpoint("cp-1").unwrap();
    assert!(loaded.state.agents.contains_key("researcher"));
    assert!(!loaded.state.agents.contains_key("impostor"));
}

#[test]
fn malformed_state_loads_as_empty_with_failed_status() {
    let (store, session_id) = store_with_session("swarm-1");
    store.create_checkpoint(&checkpoint("cp-1", &session_id, ts())).unwrap();
    store
        .with_conn(|conn| {
            conn.execute("UPDATE checkpoints SET state = '{nope' WHERE id = 'cp-1'", [])?;
            Ok(())
        })
        .unwrap();

    let loaded = store.get_checkpoint("cp-1").unwrap();
    assert_eq!(loaded.state.workflow.status, WorkflowStatus::Failed);
    assert!(loaded.state.agents.is_empty());
}
