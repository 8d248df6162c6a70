// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn role_paths_live_under_the_worktrees_root() {
    let gateway = GitWorktrees::new("/repo", "swarm");
    for role in Role::ALL {
        let path = gateway.role_path(role).unwrap();
        assert!(path.starts_with("/repo/.worktrees"));
        assert!(path.ends_with(role.as_str()));
    }
}

#[tokio::test]
async fn cleanup_orphans_with_no_root_is_zero() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = GitWorktrees::new(dir.path().join("repo"), "swarm");
    let removed = gateway.cleanup_orphans(Duration::from_secs(3600)).await.unwrap();
    assert_eq!(removed, 0);
}
