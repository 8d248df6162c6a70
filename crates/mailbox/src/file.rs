// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic mailbox file I/O.
//!
//! Writes serialize the full message list to a sibling temp file, fsync it,
//! then rename over the target: a crashed or racing writer leaves either
//! the old file or the new one, never a truncation. Reads are tolerant:
//! entries that fail to parse or validate are skipped with a warning, and
//! the file itself is left untouched.

use crate::MailboxError;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use swarm_core::AgentMessage;

fn io_err(path: &Path, source: std::io::Error) -> MailboxError {
    MailboxError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read every valid message from a mailbox file.
///
/// A missing file reads as empty. A file whose outer structure is not a
/// JSON array also reads as empty (with a warning) so one corrupt write by
/// an external worker cannot wedge the monitor.
pub fn read_messages(path: &Path) -> Result<Vec<AgentMessage>, MailboxError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(path, err)),
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "mailbox file is not a JSON array, reading as empty");
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<AgentMessage>(entry) {
            Ok(message) => match message.validate() {
                Ok(()) => out.push(message),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping invalid mailbox entry");
                }
            },
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping malformed mailbox entry");
            }
        }
    }
    Ok(out)
}

/// Atomically replace a mailbox file's contents.
pub fn write_messages(path: &Path, messages: &[AgentMessage]) -> Result<(), MailboxError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let tmp = path.with_extension("json.tmp");
    let body = serde_json::to_vec_pretty(messages)?;

    let result = (|| {
        let mut file = File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
        file.write_all(&body).map_err(|e| io_err(&tmp, e))?;
        file.sync_all().map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| io_err(path, e))
    })();

    if result.is_err() {
        // Leftover temp file; the target is untouched.
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Create the file as an empty array if it does not exist yet.
pub fn ensure_exists(path: &Path) -> Result<(), MailboxError> {
    if path.exists() {
        return Ok(());
    }
    write_messages(path, &[])
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
