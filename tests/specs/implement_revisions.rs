// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenarios: implement with one design revision, and code-revision
//! exhaustion routing forward to documentation.

use crate::prelude::*;
use swarm_core::{ErrorCode, MessageType, Role, SessionStatus, Verdict};
use swarm_workflow::WorkflowResult;

#[tokio::test]
async fn implement_with_one_design_revision() {
    let swarm = swarm();
    let session = swarm
        .orchestrator
        .start_workflow("implement", "add a bounded LRU")
        .await
        .unwrap();

    swarm.worker_sends(Role::Architect, MessageType::Design, None);
    assert!(swarm.reaches_step("design_review").await);

    swarm.worker_sends(Role::Reviewer, MessageType::Review, Some(Verdict::NeedsRevision));
    assert!(swarm.reaches_step("design_revision").await);

    swarm.worker_sends(Role::Architect, MessageType::Design, None);
    assert!(swarm.reaches_step("design_review").await);

    swarm.worker_sends(Role::Reviewer, MessageType::Review, Some(Verdict::Approved));
    assert!(swarm.reaches_step("implementation").await);

    swarm.worker_sends(Role::Developer, MessageType::Artifact, None);
    assert!(swarm.reaches_step("code_review").await);

    swarm.worker_sends(Role::Reviewer, MessageType::Review, Some(Verdict::Approved));
    assert!(swarm.reaches_step("documentation").await);

    swarm.worker_sends(Role::Developer, MessageType::Artifact, None);
    assert!(
        swarm
            .eventually(|| {
                swarm
                    .store
                    .get_session(&session.id)
                    .map(|s| s.status == SessionStatus::Complete)
                    .unwrap_or(false)
            })
            .await
    );

    let instance_iterations = {
        // iterationCounts[design_review] == 2, exactly one revision
        let artifacts = swarm.store.session_artifacts(&session.id).unwrap();
        let result: WorkflowResult =
            serde_json::from_str(&std::fs::read_to_string(&artifacts[0].path).unwrap()).unwrap();
        result
    };
    assert_eq!(instance_iterations.revision_count, 1);

    // No iteration-cap warnings on this path
    let errors = swarm.store.session_errors(&session.id).unwrap();
    assert!(!errors
        .iter()
        .any(|e| e.error.code == ErrorCode::MaxIterationsExceeded));
}

#[tokio::test]
async fn code_revision_exhaustion_falls_forward_to_documentation() {
    let swarm = swarm();
    let session = swarm
        .orchestrator
        .start_workflow("implement", "harden the parser")
        .await
        .unwrap();

    // Reach code_review
    swarm.worker_sends(Role::Architect, MessageType::Design, None);
    assert!(swarm.reaches_step("design_review").await);
    swarm.worker_sends(Role::Reviewer, MessageType::Review, Some(Verdict::Approved));
    assert!(swarm.reaches_step("implementation").await);
    swarm.worker_sends(Role::Developer, MessageType::Artifact, None);
    assert!(swarm.reaches_step("code_review").await);

    // Three NEEDS_REVISION loops
    for _ in 0..3 {
        swarm.worker_sends(Role::Reviewer, MessageType::Review, Some(Verdict::NeedsRevision));
        assert!(swarm.reaches_step("code_revision").await);
        swarm.worker_sends(Role::Developer, MessageType::Artifact, None);
        assert!(swarm.reaches_step("code_review").await);
    }

    // The fourth NEEDS_REVISION routes to documentation instead
    swarm.worker_sends(Role::Reviewer, MessageType::Review, Some(Verdict::NeedsRevision));
    assert!(swarm.reaches_step("documentation").await);

    swarm.worker_sends(Role::Developer, MessageType::Artifact, None);
    assert!(
        swarm
            .eventually(|| {
                swarm
                    .store
                    .get_session(&session.id)
                    .map(|s| s.status == SessionStatus::Complete)
                    .unwrap_or(false)
            })
            .await
    );

    // One recovered MAX_ITERATIONS_EXCEEDED warning; revision count 3
    let errors = swarm.store.session_errors(&session.id).unwrap();
    let warnings: Vec<_> = errors
        .iter()
        .filter(|e| e.error.code == ErrorCode::MaxIterationsExceeded)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].recovered);

    let artifacts = swarm.store.session_artifacts(&session.id).unwrap();
    let result: WorkflowResult =
        serde_json::from_str(&std::fs::read_to_string(&artifacts[0].path).unwrap()).unwrap();
    assert_eq!(result.revision_count, 3);
}
