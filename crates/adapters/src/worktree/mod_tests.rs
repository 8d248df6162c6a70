// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn branch_names_embed_role_and_session() {
    let session = SessionId::new("swarm-1700-1");
    assert_eq!(
        branch_name("swarm", Role::Reviewer, &session),
        "swarm/reviewer-swarm-1700-1"
    );
    // Different sessions produce different branches for the same role
    let other = SessionId::new("swarm-1700-2");
    assert_ne!(
        branch_name("swarm", Role::Reviewer, &session),
        branch_name("swarm", Role::Reviewer, &other)
    );
}

#[test]
fn worktree_errors_map_to_taxonomy_codes() {
    let err: SwarmError = WorktreeError::OutsideRoot("/etc".into()).into();
    assert_eq!(err.code, ErrorCode::InvalidArgs);

    let err: SwarmError = WorktreeError::ConfigCopy {
        role: Role::Developer,
        message: "denied".into(),
    }
    .into();
    assert_eq!(err.code, ErrorCode::FilesystemError);

    let err: SwarmError = WorktreeError::CommandFailed("git".into()).into();
    assert_eq!(err.code, ErrorCode::SystemError);
}
