// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox path layout and agent validation.
//!
//! Agent names are validated against the closed role set *before* any path
//! is constructed, and the resulting path is checked to stay under the
//! messages root. Both checks have to pass; neither alone is trusted.

use crate::MailboxError;
use std::path::{Component, Path, PathBuf};
use swarm_core::Role;

/// Resolved layout of the messages root.
#[derive(Debug, Clone)]
pub struct MailboxPaths {
    root: PathBuf,
}

impl MailboxPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join("inbox")
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.root.join("outbox")
    }

    /// Validate an agent name against the closed set.
    pub fn validate_agent(&self, agent: &str) -> Result<Role, MailboxError> {
        Role::parse(agent).map_err(|_| MailboxError::InvalidAgent(agent.to_string()))
    }

    /// Inbox file for a role.
    pub fn inbox(&self, role: Role) -> Result<PathBuf, MailboxError> {
        self.contained(self.inbox_dir().join(format!("{}.json", role.as_str())))
    }

    /// Outbox file for a role.
    pub fn outbox(&self, role: Role) -> Result<PathBuf, MailboxError> {
        self.contained(self.outbox_dir().join(format!("{}.json", role.as_str())))
    }

    /// Reject any path that would resolve outside the messages root.
    ///
    /// Roles cannot contain separators, so this is a belt on top of
    /// `validate_agent`'s suspenders; it also guards future callers that
    /// build paths from other inputs.
    fn contained(&self, path: PathBuf) -> Result<PathBuf, MailboxError> {
        let suffix = match path.strip_prefix(&self.root) {
            Ok(suffix) => suffix,
            Err(_) => return Err(MailboxError::OutsideRoot(path)),
        };
        if suffix
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(MailboxError::OutsideRoot(path));
        }
        Ok(path)
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
