// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous event subscriber dispatch.
//!
//! Handlers run on the monitor task and must not block; a panicking
//! handler is isolated and logged so it cannot take the monitor down.

use parking_lot::Mutex;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use swarm_core::OrchestratorEvent;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Handler = Box<dyn Fn(&OrchestratorEvent) + Send + Sync>;

/// Bounded set of synchronous event subscribers.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    handlers: Arc<Mutex<Vec<(SubscriberId, Handler)>>>,
    next_id: Arc<AtomicU64>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        handler: impl Fn(&OrchestratorEvent) + Send + Sync + 'static,
    ) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.handlers.lock().push((id, Box::new(handler)));
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut handlers = self.handlers.lock();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub fn emit(&self, event: &OrchestratorEvent) {
        let handlers = self.handlers.lock();
        for (id, handler) in handlers.iter() {
            let result = std::panic::catch_unwind(AssertUnwindSafe(|| handler(event)));
            if result.is_err() {
                tracing::error!(subscriber = id.0, ?event, "event handler panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
