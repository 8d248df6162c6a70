// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent roles and message recipients.
//!
//! The role set is closed: every mailbox path, worktree branch, and routing
//! decision is keyed by one of these five roles. Anything outside the set is
//! rejected before it can reach the filesystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A participant in a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Orchestrator,
    Researcher,
    Developer,
    Reviewer,
    Architect,
}

/// Error returned when a string is not a registered role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown agent role: {0:?}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Every registered role, in fixed iteration order.
    pub const ALL: [Role; 5] = [
        Role::Orchestrator,
        Role::Researcher,
        Role::Developer,
        Role::Reviewer,
        Role::Architect,
    ];

    /// Roles that run as workers in panes (everything but the orchestrator).
    pub const WORKERS: [Role; 4] = [
        Role::Researcher,
        Role::Developer,
        Role::Reviewer,
        Role::Architect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Orchestrator => "orchestrator",
            Role::Researcher => "researcher",
            Role::Developer => "developer",
            Role::Reviewer => "reviewer",
            Role::Architect => "architect",
        }
    }

    /// Parse a role name. Only exact lowercase names in the closed set parse.
    pub fn parse(s: &str) -> Result<Role, UnknownRole> {
        match s {
            "orchestrator" => Ok(Role::Orchestrator),
            "researcher" => Ok(Role::Researcher),
            "developer" => Ok(Role::Developer),
            "reviewer" => Ok(Role::Reviewer),
            "architect" => Ok(Role::Architect),
            other => Err(UnknownRole(other.to_string())),
        }
    }

    pub fn is_worker(&self) -> bool {
        *self != Role::Orchestrator
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s)
    }
}

/// Destination of a message: a single role or every other agent.
///
/// Serializes as the role name, or `"*"` for broadcast, matching the
/// mailbox JSON schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Recipient {
    Role(Role),
    Broadcast,
}

impl Recipient {
    pub const BROADCAST_MARKER: &'static str = "*";

    pub fn parse(s: &str) -> Result<Recipient, UnknownRole> {
        if s == Self::BROADCAST_MARKER {
            Ok(Recipient::Broadcast)
        } else {
            Role::parse(s).map(Recipient::Role)
        }
    }

    pub fn as_role(&self) -> Option<Role> {
        match self {
            Recipient::Role(role) => Some(*role),
            Recipient::Broadcast => None,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, Recipient::Broadcast)
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Role(role) => f.write_str(role.as_str()),
            Recipient::Broadcast => f.write_str(Self::BROADCAST_MARKER),
        }
    }
}

impl From<Role> for Recipient {
    fn from(role: Role) -> Self {
        Recipient::Role(role)
    }
}

impl From<Recipient> for String {
    fn from(r: Recipient) -> String {
        r.to_string()
    }
}

impl TryFrom<String> for Recipient {
    type Error = UnknownRole;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Recipient::parse(&s)
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
