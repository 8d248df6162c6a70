// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message routing: persist, complete the step, deliver, transition.
//!
//! The engine sees complete-step → route → transition as one atomic
//! triple under the state lock; only delivery and checkpointing touch
//! the outside world.

use crate::cleanup;
use crate::orchestrator::Orchestrator;
use std::collections::BTreeMap;
use swarm_adapters::{PaneGateway, WorktreeGateway};
use swarm_core::{
    AgentMessage, ErrorCode, OrchestratorEvent, Role, SessionId, SessionStatus, StepOutput,
    SwarmError, SwarmResult,
};
use swarm_mailbox::SendOptions;
use swarm_storage::QueueDepth;
use swarm_workflow::{self as workflow, RoutingDecision};

/// Route one worker message. Returns true when the workflow reached its
/// terminal state and the session was finalized.
pub(crate) async fn route_message<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    from: Role,
    message: &AgentMessage,
) -> SwarmResult<bool> {
    let now = orchestrator.now();
    let session_id = {
        let st = orchestrator.state.lock();
        st.session
            .as_ref()
            .map(|s| s.id.clone())
            .ok_or_else(|| SwarmError::new(ErrorCode::SystemError, "routing", "no active session"))?
    };

    // 1. Audit row for the incoming message, not yet routed
    orchestrator.store_guarded(|store| store.create_message(&session_id, message, false))?;

    // 2-3. Complete the current step and compute routing decisions
    let verdict = message.verdict();
    let routed_id = orchestrator.ids.next();
    let (decisions, previous_step) = {
        let mut st = orchestrator.state.lock();
        let template = st
            .template
            .clone()
            .ok_or_else(|| SwarmError::new(ErrorCode::SystemError, "routing", "no template"))?;
        let instance = st
            .instance
            .as_mut()
            .ok_or_else(|| SwarmError::new(ErrorCode::SystemError, "routing", "no instance"))?;

        let current = instance.current_step.clone();
        let output = StepOutput {
            kind: message.kind,
            verdict,
            summary: Some(message.content.subject.clone()),
        };
        workflow::complete_step(instance, &current, Some(output), now).map_err(SwarmError::from)?;
        let decisions = workflow::route_message(instance, &template, message, routed_id, now)
            .map_err(SwarmError::from)?;
        (decisions, current)
    };

    // 4. Deliver each decision; a missing target is recorded, not fatal
    let mut any_failed = false;
    for decision in &decisions {
        if let Err(err) = deliver(orchestrator, &session_id, from, message, decision) {
            any_failed = true;
            let err = err.with_session(session_id.clone());
            if let Err(log_err) = orchestrator.store.log_error(&err, now) {
                tracing::warn!(%log_err, "failed to log routing error");
            }
            orchestrator.events.emit(&OrchestratorEvent::ErrorOccurred {
                session_id: Some(session_id.clone()),
                code: err.code,
                component: err.component.clone(),
            });
        }
    }
    if !any_failed {
        orchestrator.store_guarded(|store| store.mark_message_routed(&message.id))?;
    }

    // 5. Transition on the verdict
    let (outcome, stage_changed) = {
        let mut st = orchestrator.state.lock();
        let template = st
            .template
            .clone()
            .ok_or_else(|| SwarmError::new(ErrorCode::SystemError, "routing", "no template"))?;
        let instance = st
            .instance
            .as_mut()
            .ok_or_else(|| SwarmError::new(ErrorCode::SystemError, "routing", "no instance"))?;
        let outcome =
            workflow::transition(instance, &template, verdict, now).map_err(SwarmError::from)?;
        let changed = outcome
            .entered
            .as_ref()
            .is_some_and(|entered| *entered != previous_step);
        (outcome, changed)
    };

    // An exhausted revision loop is recovered by routing forward; record
    // the warning and its recovery in one breath.
    if let Some(exhausted) = &outcome.exhausted {
        let warn = SwarmError::new(
            ErrorCode::MaxIterationsExceeded,
            "workflow",
            format!("step {exhausted} exhausted its iterations, routing forward"),
        )
        .with_session(session_id.clone());
        match orchestrator.store.log_error(&warn, now) {
            Ok(log_id) => {
                if let Err(err) = orchestrator.store.mark_error_recovered(&log_id) {
                    tracing::warn!(%err, "failed to mark iteration warning recovered");
                }
            }
            Err(err) => tracing::warn!(%err, "failed to log iteration warning"),
        }
    }

    if stage_changed {
        if let Some(entered) = outcome.entered.clone() {
            orchestrator.events.emit(&OrchestratorEvent::StageTransition {
                session_id: session_id.clone(),
                from_step: previous_step.clone(),
                to_step: entered,
            });
        }
        create_stage_checkpoint(orchestrator, &session_id);
    }

    // 6. Completion check, inline
    let complete = {
        let st = orchestrator.state.lock();
        st.instance
            .as_ref()
            .is_some_and(|i| i.status == swarm_core::WorkflowStatus::Complete)
    };
    if complete {
        finalize_complete(orchestrator, &session_id).await?;
        return Ok(true);
    }
    Ok(false)
}

/// Deliver one routing decision to its target agent's inbox.
fn deliver<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
    from: Role,
    incoming: &AgentMessage,
    decision: &RoutingDecision,
) -> SwarmResult<()> {
    let target_known = {
        let st = orchestrator.state.lock();
        st.agents.contains_key(&decision.role)
    };
    if !target_known {
        return Err(SwarmError::new(
            ErrorCode::RoutingFailed,
            "routing",
            format!("no agent for role {}", decision.role),
        )
        .with_context("message_id", incoming.id.clone())
        .with_context("target_step", decision.step_id.clone()));
    }

    orchestrator
        .bus
        .deliver(&decision.message, SendOptions::default())
        .map_err(SwarmError::from)?;
    orchestrator.store_guarded(|store| store.create_message(session_id, &decision.message, true))?;
    orchestrator.events.emit(&OrchestratorEvent::MessageRouted {
        session_id: session_id.clone(),
        message_id: decision.message.id.clone(),
        from,
        to: decision.role,
        step: decision.step_id.clone(),
    });
    Ok(())
}

/// Create a checkpoint for the stage boundary on a detached task; a
/// checkpoint failure is logged, never propagated into routing.
pub(crate) fn create_stage_checkpoint<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
) {
    let (instance, agents, recovery_log, stage) = {
        let st = orchestrator.state.lock();
        let Some(instance) = st.instance.clone() else {
            return;
        };
        let agents: Vec<_> = st.agents.values().cloned().collect();
        let stage = instance.current_step.clone();
        (instance, agents, st.recovery_log.clone(), stage)
    };

    let errors: Vec<_> = orchestrator
        .store
        .session_errors(session_id)
        .map(|records| records.into_iter().map(|r| r.error).collect())
        .unwrap_or_default();

    let mut queues = BTreeMap::new();
    for agent in &agents {
        if let Ok((inbox, outbox)) = orchestrator.bus.queue_depths(agent.role) {
            queues.insert(agent.role.as_str().to_string(), QueueDepth { inbox, outbox });
        }
    }

    let checkpoints = orchestrator.checkpoints.clone();
    let events = orchestrator.events.clone();
    let id = orchestrator.ids.next();
    let session_id = session_id.clone();
    let now = orchestrator.now();
    let pending: Vec<String> = Vec::new();

    tokio::spawn(async move {
        match checkpoints.create(
            id,
            &session_id,
            &stage,
            &instance,
            pending,
            &agents,
            queues,
            errors,
            recovery_log,
            now,
        ) {
            Ok(checkpoint) => {
                events.emit(&OrchestratorEvent::CheckpointCreated {
                    session_id,
                    checkpoint_id: checkpoint.id,
                    stage,
                });
            }
            Err(err) => {
                tracing::warn!(session_id = %session_id, %err, "stage checkpoint failed");
            }
        }
    });
}

/// The workflow completed: synthesize, persist, clean up, emit.
pub(crate) async fn finalize_complete<P: PaneGateway, W: WorktreeGateway>(
    orchestrator: &Orchestrator<P, W>,
    session_id: &SessionId,
) -> SwarmResult<()> {
    let now = orchestrator.now();
    if let Err(err) = orchestrator
        .store
        .update_session_status(session_id, SessionStatus::Synthesizing, now)
    {
        tracing::warn!(%err, "failed to mark session synthesizing");
    }
    {
        let mut st = orchestrator.state.lock();
        if let Some(session) = st.session.as_mut() {
            session.status = SessionStatus::Synthesizing;
        }
    }

    let result = {
        let st = orchestrator.state.lock();
        match (st.instance.as_ref(), st.template.as_ref()) {
            (Some(instance), Some(template)) => {
                workflow::synthesize_result(instance, template, now).map_err(SwarmError::from)?
            }
            _ => {
                return Err(SwarmError::new(
                    ErrorCode::SystemError,
                    "routing",
                    "completion without instance",
                ))
            }
        }
    };
    orchestrator.persist_result(session_id, &result);

    orchestrator.finalize_session_row(session_id, SessionStatus::Complete);
    if orchestrator.config.auto_cleanup {
        cleanup::cleanup_resources(orchestrator, session_id, true).await;
    }
    orchestrator.events.emit(&OrchestratorEvent::SessionEnded {
        session_id: session_id.clone(),
        status: SessionStatus::Complete,
    });
    tracing::info!(session_id = %session_id, "workflow complete");
    Ok(())
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
