// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The mailbox bus: send, read, poll.

use crate::file::{ensure_exists, read_messages, write_messages};
use crate::lock::PathLocks;
use crate::paths::MailboxPaths;
use crate::MailboxError;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use swarm_core::{
    AgentMessage, Clock, IdGen, MessageDraft, MessageType, Recipient, Role, UuidIdGen,
};

/// Options for [`MailboxBus::send`].
#[derive(Clone, Copy)]
pub struct SendOptions {
    /// Also record the message in the sender's outbox.
    pub outbox_copy: bool,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self { outbox_copy: true }
    }
}

/// Options for [`MailboxBus::poll`].
pub struct PollOptions {
    pub timeout: Duration,
    pub interval: Duration,
    pub predicate: Option<Box<dyn Fn(&AgentMessage) -> bool + Send + Sync>>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(200),
            predicate: None,
        }
    }
}

impl PollOptions {
    pub fn matching(mut self, predicate: impl Fn(&AgentMessage) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

/// Coordinator for all mailbox files.
///
/// The bus is the single inbox writer in the process; workers append only
/// to their own outboxes using the same temp+rename convention.
#[derive(Clone)]
pub struct MailboxBus {
    paths: MailboxPaths,
    locks: PathLocks,
    ids: Arc<dyn IdGen>,
    clock: Arc<dyn Clock>,
}

impl MailboxBus {
    pub fn new(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            paths: MailboxPaths::new(root),
            locks: PathLocks::new(),
            ids: Arc::new(UuidIdGen),
            clock,
        }
    }

    /// Replace the id source (tests use a sequential generator).
    pub fn with_id_gen(mut self, ids: Arc<dyn IdGen>) -> Self {
        self.ids = ids;
        self
    }

    pub fn paths(&self) -> &MailboxPaths {
        &self.paths
    }

    /// Create the messages root and an empty inbox/outbox pair for every
    /// registered role.
    pub fn initialize(&self) -> Result<(), MailboxError> {
        for role in Role::ALL {
            ensure_exists(&self.paths.inbox(role)?)?;
            ensure_exists(&self.paths.outbox(role)?)?;
        }
        Ok(())
    }

    /// Create and deliver a message.
    ///
    /// The message is appended to each recipient's inbox (every other
    /// agent's for a broadcast) and, unless disabled, to the sender's
    /// outbox. The assigned id and timestamp are returned with the message.
    pub fn send(
        &self,
        draft: MessageDraft,
        options: SendOptions,
    ) -> Result<AgentMessage, MailboxError> {
        let message = draft.into_message(self.ids.next(), self.clock.now());
        self.deliver(&message, options)?;
        Ok(message)
    }

    /// Deliver a message that already carries its id and timestamp (the
    /// router builds these itself).
    pub fn deliver(
        &self,
        message: &AgentMessage,
        options: SendOptions,
    ) -> Result<(), MailboxError> {
        message.validate()?;

        let recipients: Vec<Role> = match message.to {
            Recipient::Role(role) => vec![role],
            Recipient::Broadcast => Role::ALL
                .into_iter()
                .filter(|role| *role != message.from)
                .collect(),
        };

        // Resolve every path up front so a bad agent fails before any write.
        let inboxes = recipients
            .iter()
            .map(|role| self.paths.inbox(*role))
            .collect::<Result<Vec<_>, _>>()?;
        let outbox = self.paths.outbox(message.from)?;

        if options.outbox_copy {
            self.append(&outbox, message)?;
        }
        for inbox in &inboxes {
            self.append(inbox, message)?;
        }
        Ok(())
    }

    /// String-addressed send, for callers that take agent names from the
    /// outside world. Fails with an invalid-agent error before touching the
    /// filesystem when either side is not a registered role.
    pub fn send_from_strings(
        &self,
        from: &str,
        to: &str,
        kind: MessageType,
        subject: &str,
        body: &str,
    ) -> Result<AgentMessage, MailboxError> {
        let from = self.paths.validate_agent(from)?;
        let to =
            Recipient::parse(to).map_err(|_| MailboxError::InvalidAgent(to.to_string()))?;
        self.send(
            MessageDraft::new(from, to, kind).subject(subject).body(body),
            SendOptions::default(),
        )
    }

    /// Inbox contents ordered by priority descending, then timestamp
    /// ascending within a priority.
    pub fn read_inbox(&self, agent: Role) -> Result<Vec<AgentMessage>, MailboxError> {
        let path = self.paths.inbox(agent)?;
        let mut messages = read_messages(&path)?;
        messages.sort_by_key(|m| (Reverse(m.priority), m.timestamp));
        Ok(messages)
    }

    /// Outbox contents in timestamp order.
    pub fn read_outbox(&self, agent: Role) -> Result<Vec<AgentMessage>, MailboxError> {
        let path = self.paths.outbox(agent)?;
        let mut messages = read_messages(&path)?;
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    /// Outbox messages strictly newer than the watermark, oldest first.
    pub fn new_outbox_messages(
        &self,
        agent: Role,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<AgentMessage>, MailboxError> {
        let mut messages = self.read_outbox(agent)?;
        if let Some(since) = since {
            messages.retain(|m| m.timestamp > since);
        }
        Ok(messages)
    }

    /// Remove one message from an inbox. Returns whether it was present.
    pub fn remove_from_inbox(&self, agent: Role, message_id: &str) -> Result<bool, MailboxError> {
        let path = self.paths.inbox(agent)?;
        let lock = self.locks.for_path(&path);
        let _guard = lock.lock();

        let mut messages = read_messages(&path)?;
        let before = messages.len();
        messages.retain(|m| m.id != message_id);
        if messages.len() == before {
            return Ok(false);
        }
        write_messages(&path, &messages)?;
        Ok(true)
    }

    pub fn clear_inbox(&self, agent: Role) -> Result<(), MailboxError> {
        let path = self.paths.inbox(agent)?;
        let lock = self.locks.for_path(&path);
        let _guard = lock.lock();
        write_messages(&path, &[])
    }

    pub fn clear_outbox(&self, agent: Role) -> Result<(), MailboxError> {
        let path = self.paths.outbox(agent)?;
        let lock = self.locks.for_path(&path);
        let _guard = lock.lock();
        write_messages(&path, &[])
    }

    /// Empty every mailbox without deleting the files.
    pub fn clear_all(&self) -> Result<(), MailboxError> {
        for role in Role::ALL {
            self.clear_inbox(role)?;
            self.clear_outbox(role)?;
        }
        Ok(())
    }

    /// Inbox and outbox depths for one agent.
    pub fn queue_depths(&self, agent: Role) -> Result<(usize, usize), MailboxError> {
        let inbox = read_messages(&self.paths.inbox(agent)?)?.len();
        let outbox = read_messages(&self.paths.outbox(agent)?)?.len();
        Ok((inbox, outbox))
    }

    /// Wait for an inbox message, optionally matching a predicate.
    ///
    /// Returns `None` on timeout. The matched message is *not* removed;
    /// consumption is the caller's call.
    pub async fn poll(
        &self,
        agent: Role,
        options: PollOptions,
    ) -> Result<Option<AgentMessage>, MailboxError> {
        let deadline = tokio::time::Instant::now() + options.timeout;
        loop {
            let messages = self.read_inbox(agent)?;
            let found = match &options.predicate {
                Some(predicate) => messages.into_iter().find(|m| predicate(m)),
                None => messages.into_iter().next(),
            };
            if found.is_some() {
                return Ok(found);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(options.interval).await;
        }
    }

    /// Append a message to one mailbox file under its lock.
    fn append(&self, path: &std::path::Path, message: &AgentMessage) -> Result<(), MailboxError> {
        let lock = self.locks.for_path(path);
        let _guard = lock.lock();

        let mut messages = read_messages(path)?;
        messages.push(message.clone());
        write_messages(path, &messages)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
