// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Per-agent mailbox files under `./.swarm/messages/`.
//!
//! Each agent owns an inbox and an outbox, both JSON arrays of messages.
//! Writes are atomic (temp sibling + rename), reads are tolerant (bad
//! entries skipped with a warning, the file is never truncated), and the
//! orchestrator is the sole inbox writer.

mod bus;
mod file;
mod lock;
mod paths;

pub use bus::{MailboxBus, PollOptions, SendOptions};
pub use file::{read_messages, write_messages};
pub use paths::MailboxPaths;

use swarm_core::{ErrorCode, SwarmError};
use thiserror::Error;

/// Errors from mailbox operations.
#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("invalid agent: {0:?}")]
    InvalidAgent(String),
    #[error("mailbox path escapes the messages root: {0}")]
    OutsideRoot(std::path::PathBuf),
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] swarm_core::message::InvalidMessage),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<MailboxError> for SwarmError {
    fn from(err: MailboxError) -> Self {
        let code = match &err {
            MailboxError::InvalidAgent(_)
            | MailboxError::OutsideRoot(_)
            | MailboxError::InvalidMessage(_) => ErrorCode::InvalidArgs,
            MailboxError::Io { .. } => ErrorCode::FilesystemError,
            MailboxError::Serialize(_) => ErrorCode::SystemError,
        };
        SwarmError::new(code, "mailbox", err.to_string())
    }
}
