// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::orchestrator::Orchestrator;
use std::sync::Arc;
use swarm_adapters::{FakePanes, FakeWorktrees};
use swarm_core::{FakeClock, SequentialIdGen, SwarmConfig};
use swarm_mailbox::MailboxBus;
use swarm_storage::Store;
use tempfile::TempDir;

pub(crate) struct Harness {
    pub orchestrator: Orchestrator<FakePanes, FakeWorktrees>,
    pub panes: FakePanes,
    pub worktrees: FakeWorktrees,
    pub bus: MailboxBus,
    pub store: Store,
    pub clock: Arc<FakeClock>,
    #[allow(dead_code)]
    pub dir: TempDir,
}

/// Build an orchestrator over fakes, an in-memory store, and a temp
/// mailbox root. The monitor interval is long by default so tests can
/// drive routing deterministically; override it for monitor tests.
pub(crate) fn harness_with(mutate: impl FnOnce(&mut SwarmConfig)) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = SwarmConfig {
        state_dir: dir.path().join(".swarm"),
        worktrees_dir: dir.path().join(".worktrees"),
        roles_dir: dir.path().join("roles"),
        monitor_interval_ms: 60_000,
        ..SwarmConfig::default()
    };
    // Fast retries in every test
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
    )
    .with_id_gen(Arc::new(SequentialIdGen::new("route")));

    Harness {
        orchestrator,
        panes,
        worktrees,
        bus,
        store,
        clock,
        dir,
    }
}

pub(crate) fn harness() -> Harness {
    harness_with(|_| {})
}

/// Poll until `predicate` holds or ~4 s of real time pass.
pub(crate) async fn wait_until(mut predicate: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    predicate()
}
