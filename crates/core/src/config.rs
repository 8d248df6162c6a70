// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator configuration.
//!
//! Defaults are compiled in; `./.swarm/config.toml` overrides them when
//! present. Every duration is stored in milliseconds so config files and
//! checkpoints round-trip without unit ambiguity.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parameters for one retry wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first. 0 means execute exactly once.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Exponential base applied per attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Symmetric jitter fraction; delay stays non-negative.
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.1
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

/// Per-operation retry configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryTable {
    pub agent_spawn: RetryConfig,
    pub database: RetryConfig,
    pub filesystem: RetryConfig,
    pub routing: RetryConfig,
}

impl Default for RetryTable {
    fn default() -> Self {
        Self {
            agent_spawn: RetryConfig {
                max_retries: 2,
                initial_delay_ms: 1_000,
                max_delay_ms: 10_000,
                multiplier: 2.0,
                jitter: 0.2,
            },
            database: RetryConfig {
                max_retries: 3,
                initial_delay_ms: 100,
                max_delay_ms: 2_000,
                multiplier: 2.0,
                jitter: 0.1,
            },
            filesystem: RetryConfig {
                max_retries: 3,
                initial_delay_ms: 50,
                max_delay_ms: 1_000,
                multiplier: 2.0,
                jitter: 0.1,
            },
            routing: RetryConfig {
                max_retries: 2,
                initial_delay_ms: 200,
                max_delay_ms: 5_000,
                multiplier: 2.0,
                jitter: 0.1,
            },
        }
    }
}

/// Circuit-breaker thresholds shared by all external integrations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before opening.
    pub failure_threshold: u32,
    /// Consecutive half-open successes before closing.
    pub success_threshold: u32,
    /// How long to stay open before probing.
    pub open_timeout_ms: u64,
}

impl BreakerConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            open_timeout_ms: 30_000,
        }
    }
}

/// Top-level configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Root for durable state: database, mailboxes, results.
    pub state_dir: PathBuf,
    /// Root for per-role git worktrees.
    pub worktrees_dir: PathBuf,
    /// Directory holding `roles/<role>/CLAUDE.md` persona files.
    pub roles_dir: PathBuf,
    /// Branch prefix for worktree branches.
    pub branch_prefix: String,
    /// Command line used to start a worker inside a pane.
    pub worker_command: String,
    pub monitor_interval_ms: u64,
    /// No output from an agent for this long marks it timed out.
    pub agent_timeout_ms: u64,
    /// How long to wait for a worker readiness indicator after spawn.
    pub agent_ready_timeout_ms: u64,
    pub workflow_timeout_ms: u64,
    /// Checkpoints retained per session.
    pub checkpoint_keep: usize,
    /// Tear down panes, worktrees, and queues when a session ends.
    pub auto_cleanup: bool,
    pub retry: RetryTable,
    pub breaker: BreakerConfig,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("./.swarm"),
            worktrees_dir: PathBuf::from("./.worktrees"),
            roles_dir: PathBuf::from("./roles"),
            branch_prefix: "swarm".to_string(),
            worker_command: "claude".to_string(),
            monitor_interval_ms: 1_000,
            agent_timeout_ms: 120_000,
            agent_ready_timeout_ms: 60_000,
            workflow_timeout_ms: 30 * 60 * 1_000,
            checkpoint_keep: 10,
            auto_cleanup: true,
            retry: RetryTable::default(),
            breaker: BreakerConfig::default(),
        }
    }
}

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl SwarmConfig {
    /// Load from a TOML file, falling back to defaults when absent.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Standard config file location under the state root.
    pub fn default_path() -> PathBuf {
        PathBuf::from("./.swarm/config.toml")
    }

    pub fn messages_dir(&self) -> PathBuf {
        self.state_dir.join("messages")
    }

    pub fn database_path(&self) -> PathBuf {
        self.state_dir.join("memory.db")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.state_dir.join("results")
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_timeout_ms)
    }

    pub fn agent_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.agent_ready_timeout_ms)
    }

    pub fn workflow_timeout(&self) -> Duration {
        Duration::from_millis(self.workflow_timeout_ms)
    }

    /// Snapshot for persisting alongside a session row.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
