// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake worktree gateway for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{
    branch_name, RemoveOptions, WorktreeError, WorktreeGateway, WorktreeInfo, WorktreeOptions,
};
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use swarm_core::{Role, SessionId};

/// Recorded worktree call
#[derive(Debug, Clone, PartialEq)]
pub enum WorktreeCall {
    Create { role: Role, session_id: String },
    Remove { role: Role, force: bool },
    RemoveAll { force: bool, delete_branches: bool },
    CopyRoleConfig { role: Role },
    Lock { role: Role, reason: String },
    Unlock { role: Role },
}

#[derive(Debug, Clone)]
struct FakeWorktree {
    path: PathBuf,
    branch: String,
    locked: bool,
}

#[derive(Default)]
struct FakeWorktreesState {
    worktrees: HashMap<Role, FakeWorktree>,
    calls: Vec<WorktreeCall>,
    /// Roles whose creation should fail (for rollback tests)
    fail_create_for: Vec<Role>,
}

/// Fake worktree gateway with injectable creation failures.
#[derive(Clone, Default)]
pub struct FakeWorktrees {
    inner: Arc<Mutex<FakeWorktreesState>>,
    root: PathBuf,
}

impl FakeWorktrees {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::default(),
            root: root.into(),
        }
    }

    pub fn calls(&self) -> Vec<WorktreeCall> {
        self.inner.lock().calls.clone()
    }

    /// Roles with a live worktree.
    pub fn live_roles(&self) -> Vec<Role> {
        let state = self.inner.lock();
        let mut roles: Vec<Role> = state.worktrees.keys().copied().collect();
        roles.sort();
        roles
    }

    /// Make creation fail for a specific role.
    pub fn fail_create_for(&self, role: Role) {
        self.inner.lock().fail_create_for.push(role);
    }
}

#[async_trait]
impl WorktreeGateway for FakeWorktrees {
    async fn create(
        &self,
        role: Role,
        session_id: &SessionId,
        _opts: &WorktreeOptions,
    ) -> Result<PathBuf, WorktreeError> {
        let mut state = self.inner.lock();
        state.calls.push(WorktreeCall::Create {
            role,
            session_id: session_id.to_string(),
        });
        if state.fail_create_for.contains(&role) {
            return Err(WorktreeError::CommandFailed(format!(
                "injected create failure for {role}"
            )));
        }
        let path = self.root.join(role.as_str());
        state.worktrees.insert(
            role,
            FakeWorktree {
                path: path.clone(),
                branch: branch_name("swarm", role, session_id),
                locked: false,
            },
        );
        Ok(path)
    }

    async fn create_all(
        &self,
        roles: &[Role],
        session_id: &SessionId,
        opts: &WorktreeOptions,
    ) -> Result<IndexMap<Role, PathBuf>, WorktreeError> {
        let mut created = IndexMap::new();
        for role in roles {
            match self.create(*role, session_id, opts).await {
                Ok(path) => {
                    created.insert(*role, path);
                }
                Err(err) => {
                    let mut state = self.inner.lock();
                    for role in created.keys() {
                        state.worktrees.remove(role);
                    }
                    return Err(err);
                }
            }
        }
        Ok(created)
    }

    async fn remove(
        &self,
        role: Role,
        _session_id: &SessionId,
        opts: &RemoveOptions,
    ) -> Result<(), WorktreeError> {
        let mut state = self.inner.lock();
        state.calls.push(WorktreeCall::Remove { role, force: opts.force });
        if state.worktrees.remove(&role).is_none() {
            return Err(WorktreeError::NotFound(role));
        }
        Ok(())
    }

    async fn remove_all(&self, opts: &RemoveOptions) -> Result<(), WorktreeError> {
        let mut state = self.inner.lock();
        state.calls.push(WorktreeCall::RemoveAll {
            force: opts.force,
            delete_branches: opts.delete_branches,
        });
        state.worktrees.clear();
        Ok(())
    }

    async fn copy_role_config(&self, role: Role) -> Result<(), WorktreeError> {
        let mut state = self.inner.lock();
        state.calls.push(WorktreeCall::CopyRoleConfig { role });
        if !state.worktrees.contains_key(&role) {
            return Err(WorktreeError::NotFound(role));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorktreeInfo>, WorktreeError> {
        let state = self.inner.lock();
        let mut out: Vec<WorktreeInfo> = state
            .worktrees
            .values()
            .map(|wt| WorktreeInfo {
                path: wt.path.clone(),
                branch: Some(wt.branch.clone()),
                locked: wt.locked,
            })
            .collect();
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }

    async fn lock_worktree(&self, role: Role, reason: &str) -> Result<(), WorktreeError> {
        let mut state = self.inner.lock();
        state.calls.push(WorktreeCall::Lock {
            role,
            reason: reason.to_string(),
        });
        match state.worktrees.get_mut(&role) {
            Some(wt) => {
                wt.locked = true;
                Ok(())
            }
            None => Err(WorktreeError::NotFound(role)),
        }
    }

    async fn unlock_worktree(&self, role: Role) -> Result<(), WorktreeError> {
        let mut state = self.inner.lock();
        state.calls.push(WorktreeCall::Unlock { role });
        match state.worktrees.get_mut(&role) {
            Some(wt) => {
                wt.locked = false;
                Ok(())
            }
            None => Err(WorktreeError::NotFound(role)),
        }
    }

    async fn cleanup_orphans(&self, _older_than: Duration) -> Result<u32, WorktreeError> {
        Ok(0)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
