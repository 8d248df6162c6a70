// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator construction and the session lifecycle entry points.

use crate::events::{EventDispatcher, SubscriberId};
use crate::state::OrchestratorState;
use crate::{cleanup, monitor, spawn};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use swarm_adapters::{PaneGateway, WorktreeGateway, WorktreeOptions};
use swarm_core::{
    Clock, ErrorCode, IdGen, ManagedAgent, OrchestratorEvent, Session, SessionId, SessionIdGen,
    SessionStatus, SwarmConfig, SwarmError, SwarmResult, UuidIdGen, WorkflowInstance,
};
use swarm_mailbox::{MailboxBus, SendOptions};
use swarm_recovery::{Breakers, CheckpointManager};
use swarm_storage::{NewSession, Store};
use swarm_workflow::{self as workflow, TemplateRegistry, WorkflowResult};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Top-level coordinator for one session at a time.
#[derive(Clone)]
pub struct Orchestrator<P: PaneGateway, W: WorktreeGateway> {
    pub(crate) config: SwarmConfig,
    pub(crate) store: Store,
    pub(crate) bus: MailboxBus,
    pub(crate) panes: P,
    pub(crate) worktrees: W,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdGen>,
    session_ids: SessionIdGen,
    pub(crate) registry: Arc<TemplateRegistry>,
    pub(crate) breakers: Breakers,
    pub(crate) checkpoints: CheckpointManager,
    pub(crate) state: Arc<Mutex<OrchestratorState>>,
    pub(crate) events: EventDispatcher,
    cancel: Arc<Mutex<CancellationToken>>,
    monitor: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<P: PaneGateway, W: WorktreeGateway> Orchestrator<P, W> {
    pub fn new(
        config: SwarmConfig,
        store: Store,
        bus: MailboxBus,
        panes: P,
        worktrees: W,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let breakers = Breakers::new(config.breaker, clock.clone());
        let checkpoints = CheckpointManager::new(store.clone(), config.checkpoint_keep);
        Self {
            config,
            store,
            bus,
            panes,
            worktrees,
            clock,
            ids: Arc::new(UuidIdGen),
            session_ids: SessionIdGen::new(),
            registry: Arc::new(TemplateRegistry::builtin()),
            breakers,
            checkpoints,
            state: Arc::new(Mutex::new(OrchestratorState::default())),
            events: EventDispatcher::new(),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            monitor: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the message id source (tests use a sequential generator).
    pub fn with_id_gen(mut self, ids: Arc<dyn IdGen>) -> Self {
        self.ids = ids;
        self
    }

    pub fn subscribe(
        &self,
        handler: impl Fn(&OrchestratorEvent) + Send + Sync + 'static,
    ) -> SubscriberId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<Session> {
        self.state.lock().session.clone()
    }

    /// Snapshot of the agent table.
    pub fn agents(&self) -> Vec<ManagedAgent> {
        self.state.lock().agents.values().cloned().collect()
    }

    /// Snapshot of the workflow instance.
    pub fn instance(&self) -> Option<WorkflowInstance> {
        self.state.lock().instance.clone()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run a store operation behind the database circuit breaker.
    pub(crate) fn store_guarded<T>(
        &self,
        op: impl FnOnce(&Store) -> Result<T, swarm_storage::StoreError>,
    ) -> SwarmResult<T> {
        self.breakers.database.check()?;
        match op(&self.store) {
            Ok(value) => {
                self.breakers.database.record_success();
                Ok(value)
            }
            Err(err) => {
                self.breakers.database.record_failure();
                Err(err.into())
            }
        }
    }

    /// Start a workflow session.
    ///
    /// Preconditions: no active session, a known template, a non-empty
    /// goal. Any provisioning failure after the session row exists tears
    /// down every resource created so far and marks the session failed.
    pub async fn start_workflow(&self, workflow_type: &str, goal: &str) -> SwarmResult<Session> {
        if self.state.lock().has_active_session() {
            return Err(SwarmError::new(
                ErrorCode::SessionExists,
                "orchestrator",
                "a session is already active in this process",
            ));
        }
        let template = self.registry.get(workflow_type).map_err(SwarmError::from)?;
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(SwarmError::new(
                ErrorCode::InvalidArgs,
                "orchestrator",
                "goal must not be empty",
            ));
        }

        let now = self.now();
        let session_id = SessionId::new(self.session_ids.next_for_epoch_ms(self.clock.epoch_ms()));
        let mut instance = workflow::instantiate(&template, session_id.clone(), goal, now);

        // Resource roots and mailboxes exist before anything references them
        self.initialize_resources()?;

        let session = self
            .store
            .create_session(
                NewSession {
                    id: session_id.clone(),
                    workflow_type: template.name.clone(),
                    goal: goal.to_string(),
                    config: self.config.snapshot(),
                },
                now,
            )
            .map_err(SwarmError::from)?;

        // Seed the in-memory state so spawn can attribute agents and
        // events to the session while provisioning runs.
        {
            let mut st = self.state.lock();
            st.reset();
            st.session = Some(session.clone());
            st.template = Some(template.clone());
        }

        if let Err(err) = self.provision(&template, &session_id).await {
            let err = err.with_session(session_id.clone());
            if let Err(log_err) = self.store.log_error(&err, self.now()) {
                tracing::warn!(%log_err, "failed to log provisioning error");
            }
            cleanup::cleanup_resources(self, &session_id, true).await;
            self.finalize_session_row(&session_id, SessionStatus::Failed);
            return Err(err);
        }

        // Kick off the entry step and hand its task to the entry agent
        workflow::start_step(&mut instance, &template, &template.entry_step, self.now())
            .map_err(SwarmError::from)?;
        let draft = workflow::initial_task_message(&template, &instance).map_err(SwarmError::from)?;
        let initial = self
            .bus
            .send(draft, SendOptions::default())
            .map_err(SwarmError::from)?;
        self.store
            .create_message(&session_id, &initial, true)
            .map_err(SwarmError::from)?;

        self.store
            .update_session_status(&session_id, SessionStatus::Running, self.now())
            .map_err(SwarmError::from)?;

        let running = Session {
            status: SessionStatus::Running,
            updated_at: self.now(),
            ..session
        };
        {
            let mut st = self.state.lock();
            st.session = Some(running.clone());
            st.instance = Some(instance);
            st.template = Some(template.clone());
        }

        self.start_monitor();
        self.events.emit(&OrchestratorEvent::SessionStarted {
            session_id: session_id.clone(),
            workflow_type: template.name.clone(),
        });
        tracing::info!(session_id = %session_id, template = %template.name, "session started");
        Ok(running)
    }

    /// Graceful shutdown: synthesize a partial result, mark cancelled,
    /// clean up when auto-cleanup is enabled.
    pub async fn stop(&self) -> SwarmResult<()> {
        self.shutdown(SessionStatus::Cancelled, true, self.config.auto_cleanup)
            .await
    }

    /// Forceful shutdown: mark failed and clean up unconditionally.
    pub async fn kill(&self) -> SwarmResult<()> {
        self.shutdown(SessionStatus::Failed, false, true).await
    }

    fn initialize_resources(&self) -> SwarmResult<()> {
        for dir in [self.config.state_dir.clone(), self.config.results_dir()] {
            std::fs::create_dir_all(&dir).map_err(|err| {
                SwarmError::new(
                    ErrorCode::FilesystemError,
                    "orchestrator",
                    format!("creating {}: {err}", dir.display()),
                )
            })?;
        }
        self.bus.initialize().map_err(SwarmError::from)
    }

    /// Create the multiplexer session, the per-role worktrees, and the
    /// worker agents.
    async fn provision(
        &self,
        template: &workflow::WorkflowTemplate,
        session_id: &SessionId,
    ) -> SwarmResult<()> {
        let tmux_session = session_id.as_str().to_string();
        self.breakers
            .panes
            .call(self.panes.create_session(&tmux_session))
            .await?
            .map_err(SwarmError::from)?;

        let worktrees = self
            .breakers
            .worktrees
            .call(self.worktrees.create_all(
                &template.roles,
                session_id,
                &WorktreeOptions::default(),
            ))
            .await?
            .map_err(SwarmError::from)?;

        for (role, worktree) in worktrees {
            spawn::spawn_agent(self, &tmux_session, role, worktree).await?;
        }
        Ok(())
    }

    fn start_monitor(&self) {
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        let this = self.clone();
        let handle = tokio::spawn(async move { monitor::run(this, token).await });
        *self.monitor.lock() = Some(handle);
    }

    /// Cancel the monitor without waiting for it.
    pub(crate) fn cancel_monitor(&self) {
        self.cancel.lock().cancel();
    }

    /// Cancel the monitor and wait for it to exit.
    pub(crate) async fn stop_monitor(&self) {
        self.cancel.lock().cancel();
        let handle = self.monitor.lock().take();
        if let Some(handle) = handle {
            if tokio::time::timeout(Duration::from_secs(5), handle).await.is_err() {
                tracing::warn!("monitor did not exit within 5s of cancellation");
            }
        }
    }

    /// Write the final status to the store and the in-memory session.
    /// Idempotent against already-terminal rows.
    pub(crate) fn finalize_session_row(&self, session_id: &SessionId, status: SessionStatus) {
        if let Err(err) = self
            .store
            .update_session_status(session_id, status, self.now())
        {
            tracing::warn!(session_id = %session_id, %err, "failed to persist final session status");
        }
        let mut st = self.state.lock();
        if let Some(session) = st.session.as_mut() {
            if !session.status.is_terminal() {
                session.status = status;
                session.updated_at = self.now();
            }
        }
    }

    /// Persist a synthesized result: a JSON document under the results
    /// directory plus an artifact row pointing at it.
    pub(crate) fn persist_result(&self, session_id: &SessionId, result: &WorkflowResult) {
        let path = self
            .config
            .results_dir()
            .join(format!("{}.json", session_id.as_str()));
        match serde_json::to_vec_pretty(result) {
            Ok(body) => {
                if let Err(err) = std::fs::write(&path, body) {
                    tracing::warn!(%err, path = %path.display(), "failed to write result file");
                    return;
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to serialize workflow result");
                return;
            }
        }
        let artifact = swarm_core::Artifact {
            id: self.ids.next(),
            session_id: session_id.clone(),
            agent: swarm_core::Role::Orchestrator,
            path: path.to_string_lossy().into_owned(),
            kind: "result".to_string(),
            description: Some(format!(
                "{} result: {} steps, {} revisions",
                result.template, result.steps_executed, result.revision_count
            )),
            review_status: swarm_core::ReviewStatus::Pending,
            created_at: self.now(),
        };
        if let Err(err) = self.store.create_artifact(&artifact) {
            tracing::warn!(%err, "failed to persist result artifact");
        }
    }

    async fn shutdown(
        &self,
        status: SessionStatus,
        synthesize: bool,
        run_cleanup: bool,
    ) -> SwarmResult<()> {
        self.stop_monitor().await;

        let (session_id, active) = {
            let st = self.state.lock();
            (
                st.session.as_ref().map(|s| s.id.clone()),
                st.has_active_session(),
            )
        };
        let Some(session_id) = session_id else {
            return Ok(());
        };
        if !active {
            return Ok(());
        }

        if synthesize {
            let partial = {
                let st = self.state.lock();
                match (st.instance.as_ref(), st.template.as_ref()) {
                    (Some(instance), Some(template)) => {
                        Some(workflow::synthesize_partial(instance, template, self.now()))
                    }
                    _ => None,
                }
            };
            if let Some(result) = partial {
                self.persist_result(&session_id, &result);
            }
        }

        self.finalize_session_row(&session_id, status);
        if run_cleanup {
            cleanup::cleanup_resources(self, &session_id, true).await;
        }
        self.events.emit(&OrchestratorEvent::SessionEnded {
            session_id: session_id.clone(),
            status,
        });
        tracing::info!(session_id = %session_id, %status, "session ended");
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
