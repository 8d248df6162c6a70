// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake pane gateway for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{validate_cwd, validate_session_name, PaneError, PaneGateway, PaneOptions};
use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Recorded pane call
#[derive(Debug, Clone, PartialEq)]
pub enum PaneCall {
    CreateSession { name: String },
    KillSession { name: String },
    CreatePane { session: String, title: Option<String> },
    KillPane { pane_id: String },
    SendKeys { pane_id: String, text: String, press_enter: bool },
    SendInterrupt { pane_id: String },
    StartWorker { pane_id: String, command: String },
}

#[derive(Debug, Clone, Default)]
struct FakePane {
    session: String,
    /// Pre-set captured output, consulted by wait_for_pattern
    output: String,
    worker_active: bool,
}

#[derive(Default)]
struct FakePanesState {
    sessions: Vec<String>,
    panes: HashMap<String, FakePane>,
    calls: Vec<PaneCall>,
    next_pane: u64,
    /// Force create_pane failures (for spawn-retry tests)
    fail_create_pane: u32,
}

/// Fake pane gateway: validates like the real one, records every call,
/// and resolves `wait_for_pattern` immediately against pre-set output.
#[derive(Clone, Default)]
pub struct FakePanes {
    inner: Arc<Mutex<FakePanesState>>,
}

impl FakePanes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PaneCall> {
        self.inner.lock().calls.clone()
    }

    pub fn sessions(&self) -> Vec<String> {
        self.inner.lock().sessions.clone()
    }

    pub fn pane_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.lock().panes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Pre-set the output `wait_for_pattern` and `capture_pane` see.
    pub fn set_output(&self, pane_id: &str, output: impl Into<String>) {
        if let Some(pane) = self.inner.lock().panes.get_mut(pane_id) {
            pane.output = output.into();
        }
    }

    /// Override a pane's worker-liveness flag.
    pub fn set_worker_active(&self, pane_id: &str, active: bool) {
        if let Some(pane) = self.inner.lock().panes.get_mut(pane_id) {
            pane.worker_active = active;
        }
    }

    /// Make the next `n` create_pane calls fail.
    pub fn fail_next_create_pane(&self, n: u32) {
        self.inner.lock().fail_create_pane = n;
    }

    /// Text sent to a pane so far.
    pub fn sent_text(&self, pane_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                PaneCall::SendKeys { pane_id: id, text, .. } if id == pane_id => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PaneGateway for FakePanes {
    async fn create_session(&self, name: &str) -> Result<(), PaneError> {
        validate_session_name(name)?;
        let mut state = self.inner.lock();
        state.calls.push(PaneCall::CreateSession { name: name.to_string() });
        if !state.sessions.iter().any(|s| s == name) {
            state.sessions.push(name.to_string());
        }
        Ok(())
    }

    async fn kill_session(&self, name: &str) -> Result<(), PaneError> {
        validate_session_name(name)?;
        let mut state = self.inner.lock();
        state.calls.push(PaneCall::KillSession { name: name.to_string() });
        state.sessions.retain(|s| s != name);
        state.panes.retain(|_, pane| pane.session != name);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, PaneError> {
        Ok(self.inner.lock().sessions.clone())
    }

    async fn create_pane(&self, session: &str, opts: &PaneOptions) -> Result<String, PaneError> {
        validate_session_name(session)?;
        if let Some(cwd) = &opts.cwd {
            validate_cwd(cwd)?;
        }
        let mut state = self.inner.lock();
        state.calls.push(PaneCall::CreatePane {
            session: session.to_string(),
            title: opts.title.clone(),
        });
        if state.fail_create_pane > 0 {
            state.fail_create_pane -= 1;
            return Err(PaneError::CommandFailed("injected create_pane failure".into()));
        }
        if !state.sessions.iter().any(|s| s == session) {
            return Err(PaneError::NotFound(session.to_string()));
        }
        state.next_pane += 1;
        let pane_id = format!("%{}", state.next_pane);
        state.panes.insert(
            pane_id.clone(),
            FakePane {
                session: session.to_string(),
                output: String::new(),
                worker_active: false,
            },
        );
        Ok(pane_id)
    }

    async fn kill_pane(&self, pane_id: &str) -> Result<(), PaneError> {
        let mut state = self.inner.lock();
        state.calls.push(PaneCall::KillPane { pane_id: pane_id.to_string() });
        state.panes.remove(pane_id);
        Ok(())
    }

    async fn send_keys(
        &self,
        pane_id: &str,
        text: &str,
        press_enter: bool,
    ) -> Result<(), PaneError> {
        let mut state = self.inner.lock();
        if !state.panes.contains_key(pane_id) {
            return Err(PaneError::NotFound(pane_id.to_string()));
        }
        state.calls.push(PaneCall::SendKeys {
            pane_id: pane_id.to_string(),
            text: text.to_string(),
            press_enter,
        });
        Ok(())
    }

    async fn send_interrupt(&self, pane_id: &str) -> Result<(), PaneError> {
        let mut state = self.inner.lock();
        if !state.panes.contains_key(pane_id) {
            return Err(PaneError::NotFound(pane_id.to_string()));
        }
        state.calls.push(PaneCall::SendInterrupt { pane_id: pane_id.to_string() });
        Ok(())
    }

    async fn capture_pane(&self, pane_id: &str, _lines: u32) -> Result<String, PaneError> {
        let state = self.inner.lock();
        state
            .panes
            .get(pane_id)
            .map(|pane| pane.output.clone())
            .ok_or_else(|| PaneError::NotFound(pane_id.to_string()))
    }

    async fn wait_for_pattern(
        &self,
        pane_id: &str,
        pattern: &Regex,
        _timeout: Duration,
    ) -> Result<bool, PaneError> {
        // Resolves immediately so tests never sleep
        let output = self.capture_pane(pane_id, 50).await?;
        Ok(pattern.is_match(&output))
    }

    async fn start_worker(
        &self,
        pane_id: &str,
        command: &str,
        prompt: Option<&str>,
    ) -> Result<(), PaneError> {
        {
            let mut state = self.inner.lock();
            if !state.panes.contains_key(pane_id) {
                return Err(PaneError::NotFound(pane_id.to_string()));
            }
            state.calls.push(PaneCall::StartWorker {
                pane_id: pane_id.to_string(),
                command: command.to_string(),
            });
            if let Some(pane) = state.panes.get_mut(pane_id) {
                pane.worker_active = true;
            }
        }
        if let Some(prompt) = prompt {
            self.send_keys(pane_id, prompt, true).await?;
        }
        Ok(())
    }

    async fn is_worker_active(&self, pane_id: &str, _pattern: &str) -> Result<bool, PaneError> {
        let state = self.inner.lock();
        state
            .panes
            .get(pane_id)
            .map(|pane| pane.worker_active)
            .ok_or_else(|| PaneError::NotFound(pane_id.to_string()))
    }

    async fn kill_sessions_with_prefix(&self, prefix: &str) -> Result<u32, PaneError> {
        let names: Vec<String> = self
            .inner
            .lock()
            .sessions
            .iter()
            .filter(|s| s.starts_with(prefix))
            .cloned()
            .collect();
        let count = names.len() as u32;
        for name in names {
            self.kill_session(&name).await?;
        }
        Ok(count)
    }

    async fn cleanup_orphans(&self, _older_than: Duration) -> Result<u32, PaneError> {
        Ok(0)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
