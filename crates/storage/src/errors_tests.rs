// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sessions::NewSession;
use crate::{Store, StoreError};
use chrono::TimeZone;
use swarm_core::ErrorCode;

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
                workflow_type: "review".into(),
                goal: "goal".into(),
                config: serde_json::json!({}),
            },
            ts(),
        )
        .unwrap();
    (store, session_id)
}

#[test]
fn log_and_read_back() {
    let (store, session_id) = store_with_session("swarm-1");
    let error = SwarmError::new(ErrorCode::AgentTimeout, "monitor", "silent for 130s")
        .with_context("role", "reviewer")
        .with_session(session_id.clone());

    let log_id = store.log_error(&error, ts()).unwrap();

    let errors = store.session_errors(&session_id).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id, log_id);
    assert_eq!(errors[0].error.code, ErrorCode::AgentTimeout);
    assert_eq!(errors[0].error.context.get("role").map(String::as_str), Some("reviewer"));
    assert!(!errors[0].recovered);
}

#[test]
fn recovery_flag_updates() {
    let (store, session_id) = store_with_session("swarm-1");
    let error = SwarmError::new(ErrorCode::RoutingFailed, "monitor", "missing agent")
        .with_session(session_id.clone());
    let log_id = store.log_error(&error, ts()).unwrap();

    store.mark_error_recovered(&log_id).unwrap();
    let errors = store.session_errors(&session_id).unwrap();
    assert!(errors[0].recovered);

    assert!(matches!(
        store.mark_error_recovered("e-404"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn sessionless_errors_are_allowed() {
    let store = Store::open_in_memory().unwrap();
    let error = SwarmError::new(ErrorCode::DatabaseError, "store", "disk full");
    store.log_error(&error, ts()).unwrap();
    // Nothing to assert per-session; the insert succeeding with a NULL
    // session_id is the point.
}
