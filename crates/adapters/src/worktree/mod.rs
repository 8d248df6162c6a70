// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worktree gateway over the version-control workspace provisioner.
//!
//! Each role gets one checkout under `<repo>/.worktrees/<role>/` on branch
//! `<prefix>/<role>-<session>`. Multi-role creation is atomic: any failure
//! rolls back every worktree created by that call.

mod git;

pub use git::GitWorktrees;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWorktrees, WorktreeCall};

use async_trait::async_trait;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::time::Duration;
use swarm_core::{ErrorCode, Role, SessionId, SwarmError};
use thiserror::Error;

/// Errors from worktree operations.
#[derive(Debug, Error)]
pub enum WorktreeError {
    #[error("worktree path escapes the worktrees root: {0}")]
    OutsideRoot(PathBuf),
    #[error("worktree not found for role: {0}")]
    NotFound(Role),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("config copy failed for role {role}: {message}")]
    ConfigCopy { role: Role, message: String },
}

impl From<WorktreeError> for SwarmError {
    fn from(err: WorktreeError) -> Self {
        let code = match &err {
            WorktreeError::OutsideRoot(_) => ErrorCode::InvalidArgs,
            WorktreeError::ConfigCopy { .. } => ErrorCode::FilesystemError,
            _ => ErrorCode::SystemError,
        };
        SwarmError::new(code, "worktrees", err.to_string())
    }
}

/// Options for worktree creation.
#[derive(Debug, Clone, Default)]
pub struct WorktreeOptions {
    /// Ref the new branch starts from; defaults to HEAD.
    pub base_ref: Option<String>,
}

/// Options for worktree removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    pub force: bool,
    pub delete_branches: bool,
}

/// One provisioned worktree as reported by `list`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub locked: bool,
}

/// Branch name for a role's worktree: `<prefix>/<role>-<session>`.
///
/// Session ids are unique per run, so branches never collide across
/// concurrent sessions.
pub fn branch_name(prefix: &str, role: Role, session_id: &SessionId) -> String {
    format!("{}/{}-{}", prefix, role.as_str(), session_id.as_str())
}

/// Adapter for isolated per-role checkouts.
#[async_trait]
pub trait WorktreeGateway: Clone + Send + Sync + 'static {
    /// Create one worktree and copy the role's config file into it.
    async fn create(
        &self,
        role: Role,
        session_id: &SessionId,
        opts: &WorktreeOptions,
    ) -> Result<PathBuf, WorktreeError>;

    /// Create worktrees for all `roles`, in order. On any failure every
    /// worktree created by this call is force-removed before the error is
    /// returned.
    async fn create_all(
        &self,
        roles: &[Role],
        session_id: &SessionId,
        opts: &WorktreeOptions,
    ) -> Result<IndexMap<Role, PathBuf>, WorktreeError>;

    /// Remove a role's worktree (and optionally its branch).
    async fn remove(
        &self,
        role: Role,
        session_id: &SessionId,
        opts: &RemoveOptions,
    ) -> Result<(), WorktreeError>;

    /// Remove every worktree under the worktrees root, prune stale
    /// references, and optionally delete all prefixed branches.
    async fn remove_all(&self, opts: &RemoveOptions) -> Result<(), WorktreeError>;

    /// Copy `roles/<role>/CLAUDE.md` to the worktree root.
    async fn copy_role_config(&self, role: Role) -> Result<(), WorktreeError>;

    /// List known worktrees under the worktrees root.
    async fn list(&self) -> Result<Vec<WorktreeInfo>, WorktreeError>;

    /// Lock a worktree against pruning.
    async fn lock_worktree(&self, role: Role, reason: &str) -> Result<(), WorktreeError>;

    async fn unlock_worktree(&self, role: Role) -> Result<(), WorktreeError>;

    /// Remove worktrees older than `older_than`; returns how many.
    async fn cleanup_orphans(&self, older_than: Duration) -> Result<u32, WorktreeError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
