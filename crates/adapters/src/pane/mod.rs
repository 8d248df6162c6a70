// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane gateway over the terminal multiplexer.

mod tmux;

pub use tmux::TmuxPanes;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePanes, PaneCall};

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use swarm_core::{ErrorCode, SwarmError};
use thiserror::Error;

/// Default pattern treated as a worker readiness indicator: a shell-style
/// prompt at the end of a captured line.
pub const READY_PATTERN: &str = r"(?m)[$%>#] ?$";

/// Errors from pane operations.
#[derive(Debug, Error)]
pub enum PaneError {
    #[error("invalid session name: {0:?}")]
    InvalidName(String),
    #[error("invalid working directory: {0:?}")]
    InvalidPath(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("timed out: {0}")]
    Timeout(String),
}

impl From<PaneError> for SwarmError {
    fn from(err: PaneError) -> Self {
        let code = match &err {
            PaneError::InvalidName(_) | PaneError::InvalidPath(_) => ErrorCode::InvalidArgs,
            _ => ErrorCode::SystemError,
        };
        SwarmError::new(code, "panes", err.to_string())
    }
}

/// Options for creating a pane.
#[derive(Debug, Clone, Default)]
pub struct PaneOptions {
    /// Window title (shown in the multiplexer status line).
    pub title: Option<String>,
    /// Working directory for the pane's shell.
    pub cwd: Option<PathBuf>,
}

/// Validate a multiplexer session name: `^[A-Za-z0-9_-]+$`.
pub fn validate_session_name(name: &str) -> Result<(), PaneError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(PaneError::InvalidName(name.to_string()))
    }
}

/// Reject working directories containing shell metacharacters.
///
/// Arguments are passed as lists so this is defense in depth, not the
/// primary injection barrier.
pub fn validate_cwd(path: &Path) -> Result<(), PaneError> {
    let raw = path.to_string_lossy();
    const FORBIDDEN: &[char] = &[';', '|', '&', '$', '`', '\n', '\r', '<', '>', '"', '\''];
    if raw.contains(FORBIDDEN) {
        return Err(PaneError::InvalidPath(raw.into_owned()));
    }
    Ok(())
}

/// Adapter for multiplexer sessions and panes.
#[async_trait]
pub trait PaneGateway: Clone + Send + Sync + 'static {
    /// Create a detached session. An existing session with the same name
    /// is replaced.
    async fn create_session(&self, name: &str) -> Result<(), PaneError>;

    /// Kill a session. Killing a non-existent session succeeds.
    async fn kill_session(&self, name: &str) -> Result<(), PaneError>;

    /// Names of all live sessions.
    async fn list_sessions(&self) -> Result<Vec<String>, PaneError>;

    /// Create a pane in a session; returns the pane id.
    async fn create_pane(&self, session: &str, opts: &PaneOptions) -> Result<String, PaneError>;

    /// Kill a pane. Killing a dead pane succeeds.
    async fn kill_pane(&self, pane_id: &str) -> Result<(), PaneError>;

    /// Send literal text to a pane, optionally followed by Enter.
    async fn send_keys(&self, pane_id: &str, text: &str, press_enter: bool)
        -> Result<(), PaneError>;

    /// Send an interrupt (Ctrl-C) to a pane.
    async fn send_interrupt(&self, pane_id: &str) -> Result<(), PaneError>;

    /// Capture the last `lines` lines of a pane's output.
    async fn capture_pane(&self, pane_id: &str, lines: u32) -> Result<String, PaneError>;

    /// Poll the pane's output until `pattern` matches or `timeout`
    /// elapses. Returns whether a match was seen.
    async fn wait_for_pattern(
        &self,
        pane_id: &str,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<bool, PaneError>;

    /// Launch the worker process in a pane.
    async fn start_worker(
        &self,
        pane_id: &str,
        command: &str,
        prompt: Option<&str>,
    ) -> Result<(), PaneError>;

    /// Whether a process matching `pattern` is running in the pane.
    async fn is_worker_active(&self, pane_id: &str, pattern: &str) -> Result<bool, PaneError>;

    /// Kill every session whose name starts with `prefix`; returns how
    /// many were killed.
    async fn kill_sessions_with_prefix(&self, prefix: &str) -> Result<u32, PaneError>;

    /// Kill sessions with this gateway's prefix older than `older_than`.
    async fn cleanup_orphans(&self, older_than: Duration) -> Result<u32, PaneError>;

    /// Wait for a shell prompt using [`READY_PATTERN`].
    async fn wait_for_prompt(&self, pane_id: &str, timeout: Duration) -> Result<bool, PaneError> {
        let pattern = Regex::new(READY_PATTERN)
            .map_err(|e| PaneError::CommandFailed(format!("bad ready pattern: {e}")))?;
        self.wait_for_pattern(pane_id, &pattern, timeout).await
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
