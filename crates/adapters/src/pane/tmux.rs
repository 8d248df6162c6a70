// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux pane gateway

use super::{validate_cwd, validate_session_name, PaneError, PaneGateway, PaneOptions};
use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use async_trait::async_trait;
use regex::Regex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::process::Command;

/// How often `wait_for_pattern` re-captures the pane.
const CAPTURE_INTERVAL: Duration = Duration::from_millis(250);

/// Tmux-based pane gateway.
#[derive(Clone)]
pub struct TmuxPanes {
    /// Session-name prefix used by orphan cleanup.
    prefix: String,
}

impl TmuxPanes {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    async fn tmux(&self, args: &[&str], description: &str) -> Result<std::process::Output, PaneError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        run_with_timeout(cmd, TMUX_TIMEOUT, description)
            .await
            .map_err(PaneError::Timeout)
    }

    /// Run tmux and require a zero exit status.
    async fn tmux_ok(&self, args: &[&str], description: &str) -> Result<String, PaneError> {
        let output = self.tmux(args, description).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PaneError::CommandFailed(format!(
                "{description}: {}",
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TmuxPanes {
    fn default() -> Self {
        Self::new("swarm")
    }
}

#[async_trait]
impl PaneGateway for TmuxPanes {
    async fn create_session(&self, name: &str) -> Result<(), PaneError> {
        validate_session_name(name)?;

        // Replace a stale session with the same name
        let existing = self.tmux(&["has-session", "-t", name], "tmux has-session").await?;
        if existing.status.success() {
            tracing::warn!(session = name, "session already exists, killing first");
            let _ = self.tmux(&["kill-session", "-t", name], "tmux kill-session").await;
        }

        self.tmux_ok(&["new-session", "-d", "-s", name], "tmux new-session")
            .await?;
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), PaneError> {
        validate_session_name(name)?;
        // The session may already be gone, which is fine
        let _ = self.tmux(&["kill-session", "-t", name], "tmux kill-session").await?;
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, PaneError> {
        let output = self
            .tmux(&["list-sessions", "-F", "#{session_name}"], "tmux list-sessions")
            .await?;
        if !output.status.success() {
            // No server running means no sessions
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::to_string)
            .collect())
    }

    async fn create_pane(&self, session: &str, opts: &PaneOptions) -> Result<String, PaneError> {
        validate_session_name(session)?;
        let mut args: Vec<String> = vec![
            "new-window".into(),
            "-t".into(),
            session.into(),
            "-P".into(),
            "-F".into(),
            "#{pane_id}".into(),
        ];
        if let Some(title) = &opts.title {
            args.push("-n".into());
            args.push(title.clone());
        }
        if let Some(cwd) = &opts.cwd {
            validate_cwd(cwd)?;
            args.push("-c".into());
            args.push(cwd.to_string_lossy().into_owned());
        }
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.tmux_ok(&arg_refs, "tmux new-window").await?;
        let pane_id = stdout.trim().to_string();
        if pane_id.is_empty() {
            return Err(PaneError::CommandFailed(
                "tmux new-window returned no pane id".into(),
            ));
        }
        Ok(pane_id)
    }

    async fn kill_pane(&self, pane_id: &str) -> Result<(), PaneError> {
        // The pane may already be dead, which is fine
        let _ = self.tmux(&["kill-pane", "-t", pane_id], "tmux kill-pane").await?;
        Ok(())
    }

    async fn send_keys(
        &self,
        pane_id: &str,
        text: &str,
        press_enter: bool,
    ) -> Result<(), PaneError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        self.tmux_ok(&["send-keys", "-t", pane_id, "-l", "--", text], "tmux send-keys")
            .await?;
        if press_enter {
            self.tmux_ok(&["send-keys", "-t", pane_id, "Enter"], "tmux send-keys Enter")
                .await?;
        }
        Ok(())
    }

    async fn send_interrupt(&self, pane_id: &str) -> Result<(), PaneError> {
        self.tmux_ok(&["send-keys", "-t", pane_id, "C-c"], "tmux send-keys C-c")
            .await?;
        Ok(())
    }

    async fn capture_pane(&self, pane_id: &str, lines: u32) -> Result<String, PaneError> {
        let start = format!("-{}", lines);
        let output = self
            .tmux(
                &["capture-pane", "-t", pane_id, "-p", "-S", &start],
                "tmux capture-pane",
            )
            .await?;
        if !output.status.success() {
            return Err(PaneError::NotFound(pane_id.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn wait_for_pattern(
        &self,
        pane_id: &str,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<bool, PaneError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let captured = self.capture_pane(pane_id, 50).await?;
            if pattern.is_match(&captured) {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(CAPTURE_INTERVAL).await;
        }
    }

    async fn start_worker(
        &self,
        pane_id: &str,
        command: &str,
        prompt: Option<&str>,
    ) -> Result<(), PaneError> {
        self.send_keys(pane_id, command, true).await?;
        if let Some(prompt) = prompt {
            // Give the worker a moment to come up before pasting the prompt
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.send_keys(pane_id, prompt, true).await?;
        }
        Ok(())
    }

    async fn is_worker_active(&self, pane_id: &str, pattern: &str) -> Result<bool, PaneError> {
        let output = self
            .tmux(
                &["display-message", "-p", "-t", pane_id, "#{pane_pid}"],
                "tmux display-message",
            )
            .await?;
        if !output.status.success() {
            return Err(PaneError::NotFound(pane_id.to_string()));
        }
        let pane_pid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if pane_pid.is_empty() {
            return Ok(false);
        }

        // Check the pane process itself and its children: tmux may exec the
        // command directly or run it under a shell.
        let ps = {
            let mut cmd = Command::new("ps");
            cmd.args(["-p", &pane_pid, "-o", "command="]);
            run_with_timeout(cmd, TMUX_TIMEOUT, "ps")
                .await
                .map_err(PaneError::Timeout)?
        };
        if ps.status.success()
            && String::from_utf8_lossy(&ps.stdout).contains(pattern)
        {
            return Ok(true);
        }

        let pgrep = {
            let mut cmd = Command::new("pgrep");
            cmd.args(["-P", &pane_pid, "-f", pattern]);
            run_with_timeout(cmd, TMUX_TIMEOUT, "pgrep")
                .await
                .map_err(PaneError::Timeout)?
        };
        Ok(pgrep.status.success())
    }

    async fn kill_sessions_with_prefix(&self, prefix: &str) -> Result<u32, PaneError> {
        let sessions = self.list_sessions().await?;
        let mut killed = 0;
        for session in sessions.iter().filter(|s| s.starts_with(prefix)) {
            self.kill_session(session).await?;
            killed += 1;
        }
        Ok(killed)
    }

    async fn cleanup_orphans(&self, older_than: Duration) -> Result<u32, PaneError> {
        let output = self
            .tmux(
                &["list-sessions", "-F", "#{session_name} #{session_created}"],
                "tmux list-sessions",
            )
            .await?;
        if !output.status.success() {
            return Ok(0);
        }
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut killed = 0;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            let mut parts = line.split_whitespace();
            let (Some(name), Some(created)) = (parts.next(), parts.next()) else {
                continue;
            };
            if !name.starts_with(&self.prefix) {
                continue;
            }
            let Ok(created) = created.parse::<u64>() else {
                continue;
            };
            if now.saturating_sub(created) > older_than.as_secs() {
                tracing::info!(session = name, "killing orphaned session");
                self.kill_session(name).await?;
                killed += 1;
            }
        }
        Ok(killed)
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
