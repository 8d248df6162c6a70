// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inter-agent messages.
//!
//! The wire form is a JSON document in a mailbox file (see the mailbox
//! crate). Field names follow that schema exactly: `type`, `threadId`,
//! `requiresResponse` and `deadline` are spelled as the workers expect.

use crate::role::{Recipient, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Kind of message an agent can produce or consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Task,
    Finding,
    Design,
    Artifact,
    Review,
    Result,
    Status,
    Question,
    Answer,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Task => "task",
            MessageType::Finding => "finding",
            MessageType::Design => "design",
            MessageType::Artifact => "artifact",
            MessageType::Review => "review",
            MessageType::Result => "result",
            MessageType::Status => "status",
            MessageType::Question => "question",
            MessageType::Answer => "answer",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message priority. Variant order defines ordering: `Critical` sorts last
/// via `Ord`, so inbox reads sort descending.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    /// Numeric rank, higher is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Critical => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Outcome of a review step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "NEEDS_REVISION")]
    NeedsRevision,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Approved => "APPROVED",
            Verdict::NeedsRevision => "NEEDS_REVISION",
            Verdict::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Verdict> {
        match s {
            "APPROVED" => Some(Verdict::Approved),
            "NEEDS_REVISION" => Some(Verdict::NeedsRevision),
            "REJECTED" => Some(Verdict::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message body: subject line, free text, optional artifact references and
/// a free-form metadata map (which may carry a `verdict`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl MessageContent {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            artifacts: Vec::new(),
            metadata: None,
        }
    }

    /// Read a metadata key, if the map and key exist.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }

    /// Insert a metadata key, creating the map if needed.
    pub fn set_meta(&mut self, key: impl Into<String>, value: Value) {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
    }
}

/// Typed payload of a `review` message, carried inside `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub verdict: Verdict,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Typed payload of a `finding` message, carried inside `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingPayload {
    pub claim: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

/// A message as stored in mailbox files and the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub from: Role,
    pub to: Recipient,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub priority: Priority,
    pub content: MessageContent,
    #[serde(rename = "threadId", default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(rename = "requiresResponse", default)]
    pub requires_response: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Why a message failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMessage {
    #[error("message id is empty")]
    EmptyId,
    #[error("message subject is empty")]
    EmptySubject,
    #[error("sender and recipient are both {0}")]
    SelfAddressed(Role),
}

impl AgentMessage {
    /// The verdict carried in `content.metadata.verdict`, if any.
    pub fn verdict(&self) -> Option<Verdict> {
        self.content
            .meta("verdict")
            .and_then(Value::as_str)
            .and_then(Verdict::parse)
    }

    /// Structural validation: non-empty id and subject, no self-addressed
    /// unicast. Enum-typed fields are validated by construction.
    pub fn validate(&self) -> Result<(), InvalidMessage> {
        if self.id.trim().is_empty() {
            return Err(InvalidMessage::EmptyId);
        }
        if self.content.subject.trim().is_empty() {
            return Err(InvalidMessage::EmptySubject);
        }
        if let Recipient::Role(to) = self.to {
            if to == self.from {
                return Err(InvalidMessage::SelfAddressed(to));
            }
        }
        Ok(())
    }
}

/// Input for creating a message. Id and timestamp are assigned by the bus
/// at send time.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub from: Role,
    pub to: Recipient,
    pub kind: MessageType,
    pub priority: Priority,
    pub content: MessageContent,
    pub thread_id: Option<String>,
    pub requires_response: bool,
    pub deadline: Option<DateTime<Utc>>,
}

impl MessageDraft {
    pub fn new(from: Role, to: impl Into<Recipient>, kind: MessageType) -> Self {
        Self {
            from,
            to: to.into(),
            kind,
            priority: Priority::Normal,
            content: MessageContent::new("", ""),
            thread_id: None,
            requires_response: false,
            deadline: None,
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.content.subject = subject.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.content.body = body.into();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn artifacts(mut self, artifacts: Vec<String>) -> Self {
        self.content.artifacts = artifacts;
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.content.set_meta(key, value);
        self
    }

    pub fn verdict(self, verdict: Verdict) -> Self {
        self.meta("verdict", Value::String(verdict.as_str().to_string()))
    }

    pub fn thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn requires_response(mut self, yes: bool) -> Self {
        self.requires_response = yes;
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Materialize the draft with an assigned id and timestamp.
    pub fn into_message(self, id: String, timestamp: DateTime<Utc>) -> AgentMessage {
        AgentMessage {
            id,
            timestamp,
            from: self.from,
            to: self.to,
            kind: self.kind,
            priority: self.priority,
            content: self.content,
            thread_id: self.thread_id,
            requires_response: self.requires_response,
            deadline: self.deadline,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
