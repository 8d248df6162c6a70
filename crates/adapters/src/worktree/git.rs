// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git worktree gateway

use super::{
    branch_name, RemoveOptions, WorktreeError, WorktreeGateway, WorktreeInfo, WorktreeOptions,
};
use crate::subprocess::{run_with_timeout, GIT_WORKTREE_TIMEOUT};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use swarm_core::{Role, SessionId};
use tokio::process::Command;

/// Name of the per-role persona file copied into each worktree.
const ROLE_CONFIG_FILE: &str = "CLAUDE.md";

/// Git-based worktree gateway.
#[derive(Clone)]
pub struct GitWorktrees {
    repo_root: PathBuf,
    /// Always `<repo_root>/.worktrees`.
    worktrees_dir: PathBuf,
    /// Directory holding `roles/<role>/CLAUDE.md`.
    roles_dir: PathBuf,
    branch_prefix: String,
}

impl GitWorktrees {
    pub fn new(repo_root: impl Into<PathBuf>, branch_prefix: impl Into<String>) -> Self {
        let repo_root = repo_root.into();
        Self {
            worktrees_dir: repo_root.join(".worktrees"),
            roles_dir: repo_root.join("roles"),
            repo_root,
            branch_prefix: branch_prefix.into(),
        }
    }

    pub fn with_roles_dir(mut self, roles_dir: impl Into<PathBuf>) -> Self {
        self.roles_dir = roles_dir.into();
        self
    }

    /// Target path for a role, validated to stay under the worktrees root.
    fn role_path(&self, role: Role) -> Result<PathBuf, WorktreeError> {
        let path = self.worktrees_dir.join(role.as_str());
        match path.strip_prefix(&self.worktrees_dir) {
            Ok(suffix)
                if suffix
                    .components()
                    .all(|c| matches!(c, Component::Normal(_))) =>
            {
                Ok(path)
            }
            _ => Err(WorktreeError::OutsideRoot(path)),
        }
    }

    async fn git(&self, args: &[&str], description: &str) -> Result<std::process::Output, WorktreeError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_root).args(args);
        run_with_timeout(cmd, GIT_WORKTREE_TIMEOUT, description)
            .await
            .map_err(WorktreeError::Timeout)
    }

    async fn git_ok(&self, args: &[&str], description: &str) -> Result<String, WorktreeError> {
        let output = self.git(args, description).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WorktreeError::CommandFailed(format!(
                "{description}: {}",
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn force_remove(&self, role: Role, session_id: &SessionId, delete_branch: bool) {
        let Ok(path) = self.role_path(role) else {
            return;
        };
        let path_str = path.to_string_lossy().into_owned();
        if let Err(err) = self
            .git(&["worktree", "remove", "--force", &path_str], "git worktree remove")
            .await
        {
            tracing::warn!(role = %role, %err, "rollback removal failed");
        }
        if delete_branch {
            let branch = branch_name(&self.branch_prefix, role, session_id);
            let _ = self.git(&["branch", "-D", &branch], "git branch -D").await;
        }
    }
}

#[async_trait]
impl WorktreeGateway for GitWorktrees {
    async fn create(
        &self,
        role: Role,
        session_id: &SessionId,
        opts: &WorktreeOptions,
    ) -> Result<PathBuf, WorktreeError> {
        let path = self.role_path(role)?;
        let path_str = path.to_string_lossy().into_owned();
        let branch = branch_name(&self.branch_prefix, role, session_id);
        let base = opts.base_ref.as_deref().unwrap_or("HEAD");

        self.git_ok(
            &["worktree", "add", "-b", &branch, &path_str, base],
            "git worktree add",
        )
        .await?;

        // A failed config copy invalidates the worktree we just made.
        if let Err(err) = self.copy_role_config(role).await {
            self.force_remove(role, session_id, true).await;
            return Err(err);
        }
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
                    // All-or-nothing: undo everything this call created
                    for role in created.keys() {
                        self.force_remove(*role, session_id, true).await;
                    }
                    let _ = self.git(&["worktree", "prune"], "git worktree prune").await;
                    return Err(err);
                }
            }
        }
        Ok(created)
    }

    async fn remove(
        &self,
        role: Role,
        session_id: &SessionId,
        opts: &RemoveOptions,
    ) -> Result<(), WorktreeError> {
        let path = self.role_path(role)?;
        if !path.exists() {
            return Err(WorktreeError::NotFound(role));
        }
        let path_str = path.to_string_lossy().into_owned();
        let mut args = vec!["worktree", "remove"];
        if opts.force {
            args.push("--force");
        }
        args.push(&path_str);
        self.git_ok(&args, "git worktree remove").await?;

        if opts.delete_branches {
            let branch = branch_name(&self.branch_prefix, role, session_id);
            let _ = self.git(&["branch", "-D", &branch], "git branch -D").await;
        }
        Ok(())
    }

    async fn remove_all(&self, opts: &RemoveOptions) -> Result<(), WorktreeError> {
        for role in Role::ALL {
            let path = self.role_path(role)?;
            if !path.exists() {
                continue;
            }
            let path_str = path.to_string_lossy().into_owned();
            let mut args = vec!["worktree", "remove"];
            if opts.force {
                args.push("--force");
            }
            args.push(&path_str);
            if let Err(err) = self.git_ok(&args, "git worktree remove").await {
                tracing::warn!(role = %role, %err, "worktree removal failed, continuing");
            }
        }
        self.git_ok(&["worktree", "prune"], "git worktree prune").await?;

        if opts.delete_branches {
            let pattern = format!("{}/*", self.branch_prefix);
            let listed = self
                .git_ok(
                    &["branch", "--list", &pattern, "--format", "%(refname:short)"],
                    "git branch --list",
                )
                .await?;
            for branch in listed.lines().map(str::trim).filter(|b| !b.is_empty()) {
                let _ = self.git(&["branch", "-D", branch], "git branch -D").await;
            }
        }
        Ok(())
    }

    async fn copy_role_config(&self, role: Role) -> Result<(), WorktreeError> {
        let source = self.roles_dir.join(role.as_str()).join(ROLE_CONFIG_FILE);
        if !source.exists() {
            // Roles without a persona file are legal; the worker runs bare
            tracing::debug!(role = %role, "no role config to copy");
            return Ok(());
        }
        let target = self.role_path(role)?.join(ROLE_CONFIG_FILE);
        std::fs::copy(&source, &target).map_err(|err| WorktreeError::ConfigCopy {
            role,
            message: err.to_string(),
        })?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorktreeInfo>, WorktreeError> {
        let listed = self
            .git_ok(&["worktree", "list", "--porcelain"], "git worktree list")
            .await?;

        let mut out = Vec::new();
        let mut current: Option<WorktreeInfo> = None;
        for line in listed.lines() {
            if let Some(path) = line.strip_prefix("worktree ") {
                if let Some(info) = current.take() {
                    out.push(info);
                }
                current = Some(WorktreeInfo {
                    path: PathBuf::from(path),
                    branch: None,
                    locked: false,
                });
            } else if let Some(branch) = line.strip_prefix("branch ") {
                if let Some(info) = current.as_mut() {
                    info.branch = Some(
                        branch
                            .strip_prefix("refs/heads/")
                            .unwrap_or(branch)
                            .to_string(),
                    );
                }
            } else if line.starts_with("locked") {
                if let Some(info) = current.as_mut() {
                    info.locked = true;
                }
            }
        }
        if let Some(info) = current {
            out.push(info);
        }

        // Only report checkouts under our root, not the main worktree
        out.retain(|info| info.path.starts_with(&self.worktrees_dir));
        Ok(out)
    }

    async fn lock_worktree(&self, role: Role, reason: &str) -> Result<(), WorktreeError> {
        let path = self.role_path(role)?;
        let path_str = path.to_string_lossy().into_owned();
        self.git_ok(
            &["worktree", "lock", "--reason", reason, &path_str],
            "git worktree lock",
        )
        .await?;
        Ok(())
    }

    async fn unlock_worktree(&self, role: Role) -> Result<(), WorktreeError> {
        let path = self.role_path(role)?;
        let path_str = path.to_string_lossy().into_owned();
        self.git_ok(&["worktree", "unlock", &path_str], "git worktree unlock")
            .await?;
        Ok(())
    }

    async fn cleanup_orphans(&self, older_than: Duration) -> Result<u32, WorktreeError> {
        let mut removed = 0;
        let entries = match std::fs::read_dir(&self.worktrees_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(WorktreeError::CommandFailed(err.to_string())),
        };
        let now = std::time::SystemTime::now();
        for entry in entries.flatten() {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age <= older_than {
                continue;
            }
            let path_str = entry.path().to_string_lossy().into_owned();
            tracing::info!(path = %path_str, "removing orphaned worktree");
            if self
                .git(&["worktree", "remove", "--force", &path_str], "git worktree remove")
                .await
                .is_ok()
            {
                removed += 1;
            }
        }
        let _ = self.git(&["worktree", "prune"], "git worktree prune").await;
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
