// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervision loop: outbox scan, health check, workflow timeout,
//! completion check.

use crate::orchestrator::Orchestrator;
use crate::{cleanup, routing, spawn};
use swarm_adapters::{PaneGateway, WorktreeGateway};
use swarm_core::{
    AgentStatus, ErrorCode, OrchestratorEvent, Role, SessionId, SessionStatus, SwarmError,
};
use swarm_recovery::{select_strategy, should_continue_recovery, RecoveryStrategy};
use swarm_storage::{AgentActivity, RecoveryAttempt};
use swarm_workflow as workflow;
use tokio_util::sync::CancellationToken;

/// Maximum automatic recovery attempts per agent.
const MAX_RECOVERY_ATTEMPTS: u32 = 3;

/// Run the monitor until cancellation or session end.
pub(crate) async fn run<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: Orchestrator<P, W>,
    cancel: CancellationToken,
) {
    let period = orchestrator.config.monitor_interval();
    // First pass happens one full interval after startup
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if tick(&orchestrator, &cancel).await {
                    break;
                }
            }
        }
    }
    tracing::debug!("monitor exited");
}

/// One supervision pass. Returns true when the session ended.
async fn tick<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    cancel: &CancellationToken,
) -> bool {
    let Some(session_id) = ({
        let st = orchestrator.state.lock();
        st.session
            .as_ref()
            .filter(|s| !s.status.is_terminal())
            .map(|s| s.id.clone())
    }) else {
        return true;
    };

    if scan_outboxes(orchestrator, &session_id, cancel).await {
        return true;
    }
    if cancel.is_cancelled() {
        return true;
    }
    health_check(orchestrator, &session_id).await;
    if check_workflow_timeout(orchestrator, &session_id).await {
        return true;
    }
    completion_check(orchestrator, &session_id).await
}

/// Scan every agent's outbox for messages past its watermark and route
/// them in timestamp order. A routing failure leaves the watermark at
/// the failed message so it is retried on the next tick.
async fn scan_outboxes<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
    cancel: &CancellationToken,
) -> bool {
    let scan_list: Vec<(Role, Option<chrono::DateTime<chrono::Utc>>)> = {
        let st = orchestrator.state.lock();
        st.agents
            .iter()
            .map(|(role, agent)| (*role, agent.watermark))
            .collect()
    };

    for (role, watermark) in scan_list {
        if cancel.is_cancelled() {
            return false;
        }
        let messages = match orchestrator.bus.new_outbox_messages(role, watermark) {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(role = %role, %err, "outbox read failed");
                continue;
            }
        };
        for message in messages {
            match routing::route_message(orchestrator, role, &message).await {
                Ok(ended) => {
                    {
                        let mut st = orchestrator.state.lock();
                        if let Some(agent) = st.agents.get_mut(&role) {
                            agent.record_message(message.timestamp);
                            agent.advance_watermark(message.timestamp);
                            agent.status = AgentStatus::Working;
                        }
                    }
                    record_activity(orchestrator, session_id, role);
                    if ended {
                        return true;
                    }
                }
                Err(err) => {
                    // Watermark stays put; this message retries next tick
                    let err = err.with_session(session_id.clone());
                    tracing::warn!(role = %role, message_id = %message.id, %err, "routing failed");
                    if let Err(log_err) = orchestrator.store.log_error(&err, orchestrator.now()) {
                        tracing::warn!(%log_err, "failed to log routing failure");
                    }
                    break;
                }
            }
        }
    }
    false
}

/// Mark agents silent for longer than the agent timeout and attempt
/// recovery by restarting their workers.
async fn health_check<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
) {
    let now = orchestrator.now();
    let timeout = chrono::Duration::milliseconds(orchestrator.config.agent_timeout_ms as i64);
    let stale: Vec<(Role, String)> = {
        let st = orchestrator.state.lock();
        st.agents
            .iter()
            .filter(|(_, agent)| agent.status.is_active())
            .filter(|(_, agent)| now.signed_duration_since(agent.last_activity_at) > timeout)
            .map(|(role, agent)| (*role, agent.pane_id.clone()))
            .collect()
    };

    for (role, pane_id) in stale {
        let error = SwarmError::new(
            ErrorCode::AgentTimeout,
            "monitor",
            format!("{role} produced no output within the agent timeout"),
        )
        .with_context("role", role.as_str())
        .with_session(session_id.clone());

        let log_id = match orchestrator.store.log_error(&error, now) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(%err, "failed to log agent timeout");
                None
            }
        };
        orchestrator.events.emit(&OrchestratorEvent::ErrorOccurred {
            session_id: Some(session_id.clone()),
            code: ErrorCode::AgentTimeout,
            component: "monitor".into(),
        });

        let attempts = {
            let st = orchestrator.state.lock();
            st.recovery_counts.get(&role).copied().unwrap_or(0)
        };
        let strategy = select_strategy(error.code);
        if !should_continue_recovery(&error, attempts, MAX_RECOVERY_ATTEMPTS)
            || !matches!(strategy, RecoveryStrategy::Retry | RecoveryStrategy::Restart)
        {
            set_agent_status(orchestrator, session_id, role, AgentStatus::Error);
            tracing::error!(role = %role, attempts, "agent timeout, recovery exhausted");
            continue;
        }

        tracing::warn!(role = %role, attempt = attempts + 1, "agent timed out, restarting worker");
        let restarted = spawn::restart_worker(orchestrator, role, &pane_id).await;
        let succeeded = restarted.is_ok();
        {
            let mut st = orchestrator.state.lock();
            *st.recovery_counts.entry(role).or_insert(0) += 1;
            st.recovery_log.push(RecoveryAttempt {
                error_code: ErrorCode::AgentTimeout,
                strategy: "restart".into(),
                at: now,
                succeeded,
            });
            if let Some(agent) = st.agents.get_mut(&role) {
                if succeeded {
                    agent.status = AgentStatus::Ready;
                    agent.touch(orchestrator.clock.now());
                } else {
                    agent.status = AgentStatus::Error;
                }
            }
        }
        record_activity(orchestrator, session_id, role);
        match restarted {
            Ok(()) => {
                if let Some(log_id) = log_id {
                    if let Err(err) = orchestrator.store.mark_error_recovered(&log_id) {
                        tracing::warn!(%err, "failed to mark timeout recovered");
                    }
                }
                orchestrator.events.emit(&OrchestratorEvent::AgentStatusChanged {
                    session_id: session_id.clone(),
                    role,
                    status: AgentStatus::Ready,
                });
            }
            Err(err) => {
                tracing::error!(role = %role, %err, "worker restart failed");
            }
        }
    }
}

/// Enforce the session-level deadline. Returns true when it fired.
async fn check_workflow_timeout<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
) -> bool {
    let now = orchestrator.now();
    let timed_out = {
        let st = orchestrator.state.lock();
        st.instance.as_ref().is_some_and(|instance| {
            workflow::check_timeout(instance, orchestrator.config.workflow_timeout(), now)
        })
    };
    if !timed_out {
        return false;
    }

    let error = SwarmError::new(
        ErrorCode::WorkflowTimeout,
        "monitor",
        "workflow exceeded its deadline",
    )
    .with_session(session_id.clone());
    if let Err(err) = orchestrator.store.log_error(&error, now) {
        tracing::warn!(%err, "failed to log workflow timeout");
    }
    orchestrator.events.emit(&OrchestratorEvent::ErrorOccurred {
        session_id: Some(session_id.clone()),
        code: ErrorCode::WorkflowTimeout,
        component: "monitor".into(),
    });

    // Synthesize whatever partial progress exists before tearing down
    let partial = {
        let mut st = orchestrator.state.lock();
        if let Some(instance) = st.instance.as_mut() {
            instance.status = swarm_core::WorkflowStatus::Timeout;
        }
        match (st.instance.as_ref(), st.template.as_ref()) {
            (Some(instance), Some(template)) => {
                Some(workflow::synthesize_partial(instance, template, now))
            }
            _ => None,
        }
    };
    if let Some(result) = partial {
        orchestrator.persist_result(session_id, &result);
    }

    orchestrator.finalize_session_row(session_id, SessionStatus::Failed);
    cleanup::cleanup_resources(orchestrator, session_id, true).await;
    orchestrator.events.emit(&OrchestratorEvent::SessionEnded {
        session_id: session_id.clone(),
        status: SessionStatus::Failed,
    });
    tracing::error!(session_id = %session_id, "workflow timed out");
    true
}

/// Finalize the session when the workflow instance reports complete.
async fn completion_check<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
) -> bool {
    let complete = {
        let st = orchestrator.state.lock();
        st.instance
            .as_ref()
            .is_some_and(|i| i.status == swarm_core::WorkflowStatus::Complete)
            && st
                .session
                .as_ref()
                .is_some_and(|s| !s.status.is_terminal())
    };
    if !complete {
        return false;
    }
    if let Err(err) = routing::finalize_complete(orchestrator, session_id).await {
        tracing::error!(%err, "completion finalization failed");
    }
    true
}

fn set_agent_status<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
    role: Role,
    status: AgentStatus,
) {
    {
        let mut st = orchestrator.state.lock();
        if let Some(agent) = st.agents.get_mut(&role) {
            agent.status = status;
        }
    }
    record_activity(orchestrator, session_id, role);
    orchestrator.events.emit(&OrchestratorEvent::AgentStatusChanged {
        session_id: session_id.clone(),
        role,
        status,
    });
}

fn record_activity<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
    role: Role,
) {
    let snapshot = {
        let st = orchestrator.state.lock();
        st.agents.get(&role).map(|agent| AgentActivity {
            session_id: session_id.clone(),
            role,
            status: agent.status,
            messages_processed: agent.messages_processed,
            last_activity_at: agent.last_activity_at,
        })
    };
    if let Some(activity) = snapshot {
        if let Err(err) = orchestrator.store.upsert_agent_activity(&activity) {
            tracing::warn!(role = %role, %err, "failed to record agent activity");
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
