// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for the behavioral specs.

use std::sync::Arc;
use std::time::Duration;
use swarm_adapters::{FakePanes, FakeWorktrees};
use swarm_core::{
    FakeClock, MessageDraft, MessageType, Role, SequentialIdGen, SwarmConfig, Verdict,
};
use swarm_engine::Orchestrator;
use swarm_mailbox::{MailboxBus, SendOptions};
use swarm_storage::Store;
use tempfile::TempDir;

pub struct Swarm {
    pub orchestrator: Orchestrator<FakePanes, FakeWorktrees>,
    pub panes: FakePanes,
    pub worktrees: FakeWorktrees,
    pub bus: MailboxBus,
    pub store: Store,
    pub clock: Arc<FakeClock>,
    #[allow(dead_code)]
    dir: TempDir,
}

/// A swarm over fakes with a fast monitor (20 ms ticks).
pub fn swarm() -> Swarm {
    swarm_with(|_| {})
}

pub fn swarm_with(mutate: impl FnOnce(&mut SwarmConfig)) -> Swarm {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = SwarmConfig {
        state_dir: dir.path().join(".swarm"),
        worktrees_dir: dir.path().join(".worktrees"),
        roles_dir: dir.path().join("roles"),
        monitor_interval_ms: 20,
        ..SwarmConfig::default()
    };
    config.retry.agent_spawn.initial_delay_ms = 1;
    config.retry.agent_spawn.max_delay_ms = 2;
    mutate(&mut config);

    let clock = Arc::new(FakeClock::fixed());
    let store = Store::open_in_memory().expect("store");
    let bus = MailboxBus::new(config.messages_dir(), clock.clone())
        .with_id_gen(Arc::new(SequentialIdGen::new("m")));
    let panes = FakePanes::new();
    let worktrees = FakeWorktrees::new(config.worktrees_dir.clone());

    let orchestrator = Orchestrator::new(
        config,
        store.clone(),
        bus.clone(),
        panes.clone(),
        worktrees.clone(),
        clock.clone(),
    );

    Swarm {
        orchestrator,
        panes,
        worktrees,
        bus,
        store,
        clock,
        dir,
    }
}

impl Swarm {
    /// Simulate a worker producing an output message.
    ///
    /// Advances the fake clock first so each message is strictly newer
    /// than the previous watermark.
    pub fn worker_sends(&self, from: Role, kind: MessageType, verdict: Option<Verdict>) {
        self.clock.advance_ms(1_000);
        let mut draft = MessageDraft::new(from, Role::Orchestrator, kind)
            .subject(format!("{kind} from {from}"))
            .body("simulated worker output");
        if let Some(verdict) = verdict {
            draft = draft.verdict(verdict);
        }
        self.bus
            .send(draft, SendOptions::default())
            .expect("worker send");
    }

    /// Poll until `predicate` holds or ~5 s of real time pass.
    pub async fn eventually(&self, mut predicate: impl FnMut() -> bool) -> bool {
        for _ in 0..500 {
            if predicate() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        predicate()
    }

    /// Wait until the workflow sits at `step`.
    pub async fn reaches_step(&self, step: &str) -> bool {
        self.eventually(|| {
            self.orchestrator
                .instance()
                .is_some_and(|i| i.current_step == step)
        })
        .await
    }
}
