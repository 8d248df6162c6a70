// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message audit rows.
//!
//! The store is authoritative for history; the mailbox file is
//! authoritative for "has the recipient seen it". `requires_response` and
//! `deadline` are first-class columns so deadline sweeps stay in SQL.

use crate::store::{json_or_default, ts_from_sql, ts_to_sql, Store, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use swarm_core::{
    AgentMessage, MessageContent, MessageType, Priority, Recipient, Role, SessionId,
};

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<RawMessage> {
    Ok(RawMessage {
        id: row.get("id")?,
        sender: row.get("sender")?,
        recipient: row.get("recipient")?,
        kind: row.get("kind")?,
        priority: row.get("priority")?,
        subject: row.get("subject")?,
        body: row.get("body")?,
        artifacts: row.get("artifacts")?,
        metadata: row.get("metadata")?,
        thread_id: row.get("thread_id")?,
        requires_response: row.get::<_, i64>("requires_response")? != 0,
        deadline: row.get("deadline")?,
        created_at: row.get("created_at")?,
    })
}

struct RawMessage {
    id: String,
    sender: String,
    recipient: String,
    kind: String,
    priority: String,
    subject: String,
    body: String,
    artifacts: Option<String>,
    metadata: Option<String>,
    thread_id: Option<String>,
    requires_response: bool,
    deadline: Option<String>,
    created_at: String,
}

impl RawMessage {
    /// Rebuild the typed message. Rows with enum values outside their
    /// domains are dropped with a warning rather than surfacing garbage.
    fn into_message(self) -> Option<AgentMessage> {
        let from = match Role::parse(&self.sender) {
            Ok(role) => role,
            Err(_) => {
                tracing::warn!(id = %self.id, sender = %self.sender, "bad sender in message row");
                return None;
            }
        };
        let to = match Recipient::parse(&self.recipient) {
            Ok(to) => to,
            Err(_) => {
                tracing::warn!(id = %self.id, recipient = %self.recipient, "bad recipient in message row");
                return None;
            }
        };
        let kind: MessageType =
            match serde_json::from_value(serde_json::Value::String(self.kind.clone())) {
                Ok(kind) => kind,
                Err(_) => {
                    tracing::warn!(id = %self.id, kind = %self.kind, "bad type in message row");
                    return None;
                }
            };
        let priority: Priority =
            match serde_json::from_value(serde_json::Value::String(self.priority.clone())) {
                Ok(priority) => priority,
                Err(_) => {
                    tracing::warn!(id = %self.id, priority = %self.priority, "bad priority in message row");
                    return None;
                }
            };
        Some(AgentMessage {
            id: self.id,
            timestamp: ts_from_sql(&self.created_at),
            from,
            to,
            kind,
            priority,
            content: MessageContent {
                subject: self.subject,
                body: self.body,
                artifacts: json_or_default(self.artifacts, "messages.artifacts"),
                metadata: json_or_default::<Option<_>>(self.metadata, "messages.metadata"),
            },
            thread_id: self.thread_id,
            requires_response: self.requires_response,
            deadline: self
                .deadline
                .as_deref()
                .map(ts_from_sql),
        })
    }
}

impl Store {
    /// Persist a message for audit. `routed` starts false and is flipped
    /// once delivery to the recipient's inbox succeeds.
    pub fn create_message(
        &self,
        session_id: &SessionId,
        message: &AgentMessage,
        routed: bool,
    ) -> StoreResult<()> {
        let artifacts = if message.content.artifacts.is_empty() {
            None
        } else {
            serde_json::to_string(&message.content.artifacts).ok()
        };
        let metadata = message
            .content
            .metadata
            .as_ref()
            .and_then(|m| serde_json::to_string(m).ok());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages
                   (id, session_id, sender, recipient, kind, priority, subject, body,
                    artifacts, metadata, thread_id, requires_response, deadline, routed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    message.id,
                    session_id.as_str(),
                    message.from.as_str(),
                    message.to.to_string(),
                    message.kind.as_str(),
                    message.priority.to_string(),
                    message.content.subject,
                    message.content.body,
                    artifacts,
                    metadata,
                    message.thread_id,
                    message.requires_response as i64,
                    message.deadline.map(ts_to_sql),
                    routed as i64,
                    ts_to_sql(message.timestamp),
                ],
            )?;
            Ok(())
        })
    }

    /// Mark a persisted message as routed.
    pub fn mark_message_routed(&self, message_id: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE messages SET routed = 1 WHERE id = ?1",
                params![message_id],
            )?;
            if affected == 0 {
                return Err(StoreError::not_found("message", message_id));
            }
            Ok(())
        })
    }

    /// Messages for a session ordered by creation time ascending,
    /// optionally only those strictly newer than `since`.
    pub fn get_session_messages(
        &self,
        session_id: &SessionId,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<AgentMessage>> {
        self.with_conn(|conn| {
            let mut out = Vec::new();
            match since {
                Some(since) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM messages
                         WHERE session_id = ?1 AND created_at > ?2
                         ORDER BY created_at ASC",
                    )?;
                    let rows =
                        stmt.query_map(params![session_id.as_str(), ts_to_sql(since)], row_to_message)?;
                    for row in rows {
                        if let Some(msg) = row?.into_message() {
                            out.push(msg);
                        }
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM messages WHERE session_id = ?1 ORDER BY created_at ASC",
                    )?;
                    let rows = stmt.query_map(params![session_id.as_str()], row_to_message)?;
                    for row in rows {
                        if let Some(msg) = row?.into_message() {
                            out.push(msg);
                        }
                    }
                }
            }
            Ok(out)
        })
    }

    /// Messages in one conversation thread, oldest first.
    pub fn get_thread_messages(
        &self,
        session_id: &SessionId,
        thread_id: &str,
    ) -> StoreResult<Vec<AgentMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM messages
                 WHERE session_id = ?1 AND thread_id = ?2
                 ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map(params![session_id.as_str(), thread_id], row_to_message)?;
            let mut out = Vec::new();
            for row in rows {
                if let Some(msg) = row?.into_message() {
                    out.push(msg);
                }
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
