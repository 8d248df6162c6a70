// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure state-machine operations over a workflow instance.
//!
//! Transition selection precedence: a matching verdict edge wins, unless
//! its target step has exhausted its iterations, in which case a complete
//! or REJECTED edge is preferred; then the complete edge; then the default
//! edge; then the first defined edge. At the completion step, transition
//! yields `complete` unconditionally.

use crate::template::{StepType, TransitionCondition, TransitionDef, WorkflowTemplate};
use crate::WorkflowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swarm_core::{
    AgentMessage, Recipient, Role, SessionId, StepExecutionRecord, StepOutput, StepRecordStatus,
    Verdict, WorkflowInstance, WorkflowStatus,
};

/// Begin a new attempt at a step.
///
/// Refuses once the step's iteration budget is spent; otherwise appends a
/// running record, bumps the counter, and moves `current_step`.
pub fn start_step(
    instance: &mut WorkflowInstance,
    template: &WorkflowTemplate,
    step_id: &str,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let step = template
        .step(step_id)
        .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
    let count = instance.iteration_count(step_id);
    if count >= step.max_iterations {
        return Err(WorkflowError::MaxIterationsExceeded {
            step: step_id.to_string(),
            max: step.max_iterations,
        });
    }
    instance.history.push(StepExecutionRecord {
        step_id: step_id.to_string(),
        started_at: now,
        completed_at: None,
        status: StepRecordStatus::Running,
        iteration: count + 1,
        output: None,
    });
    instance.iterations.insert(step_id.to_string(), count + 1);
    instance.current_step = step_id.to_string();
    Ok(())
}

/// Complete the single running record for a step.
pub fn complete_step(
    instance: &mut WorkflowInstance,
    step_id: &str,
    output: Option<StepOutput>,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let record = instance
        .running_record_mut(step_id)
        .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
    record.status = StepRecordStatus::Complete;
    record.completed_at = Some(now);
    record.output = output;
    Ok(())
}

/// Fail the running record for a step, or append a synthetic failed
/// record when none is running.
pub fn fail_step(
    instance: &mut WorkflowInstance,
    step_id: &str,
    reason: &str,
    now: DateTime<Utc>,
) {
    let output = StepOutput {
        kind: swarm_core::MessageType::Status,
        verdict: None,
        summary: Some(reason.to_string()),
    };
    match instance.running_record_mut(step_id) {
        Some(record) => {
            record.status = StepRecordStatus::Failed;
            record.completed_at = Some(now);
            record.output = Some(output);
        }
        None => {
            instance.history.push(StepExecutionRecord {
                step_id: step_id.to_string(),
                started_at: now,
                completed_at: Some(now),
                status: StepRecordStatus::Failed,
                iteration: instance.iteration_count(step_id).max(1),
                output: Some(output),
            });
        }
    }
}

/// Skip a step; only optional steps may be skipped.
pub fn skip_step(
    instance: &mut WorkflowInstance,
    template: &WorkflowTemplate,
    step_id: &str,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    let step = template
        .step(step_id)
        .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
    if !step.optional {
        return Err(WorkflowError::NotOptional(step_id.to_string()));
    }
    instance.history.push(StepExecutionRecord {
        step_id: step_id.to_string(),
        started_at: now,
        completed_at: Some(now),
        status: StepRecordStatus::Skipped,
        iteration: instance.iteration_count(step_id),
        output: None,
    });
    Ok(())
}

/// The edge chosen by [`select_transition`], plus the step whose
/// exhausted iteration budget forced a fallback, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedTransition<'t> {
    pub edge: &'t TransitionDef,
    /// Step id that was at max iterations when a verdict pointed at it.
    pub exhausted: Option<String>,
}

/// Choose the outgoing edge for the current step.
pub fn select_transition<'t>(
    instance: &WorkflowInstance,
    template: &'t WorkflowTemplate,
    verdict: Option<Verdict>,
) -> Result<SelectedTransition<'t>, WorkflowError> {
    let edges = template.transitions_from(&instance.current_step);
    if edges.is_empty() {
        return Err(WorkflowError::InvalidTransition(
            instance.current_step.clone(),
        ));
    }

    let find = |cond: TransitionCondition| edges.iter().find(|t| t.condition == cond).copied();
    let fallback = |exhausted: Option<String>| {
        let edge = find(TransitionCondition::Complete)
            .or_else(|| find(TransitionCondition::OnVerdict(Verdict::Rejected)))
            .or_else(|| find(TransitionCondition::Default))
            .unwrap_or(edges[0]);
        SelectedTransition { edge, exhausted }
    };

    if let Some(verdict) = verdict {
        if let Some(edge) = find(TransitionCondition::OnVerdict(verdict)) {
            let target_exhausted = template
                .step(&edge.to)
                .is_some_and(|step| instance.iteration_count(&edge.to) >= step.max_iterations);
            if target_exhausted {
                // Route forward instead of blocking on the spent loop
                return Ok(fallback(Some(edge.to.clone())));
            }
            return Ok(SelectedTransition { edge, exhausted: None });
        }
    }

    Ok(fallback(None))
}

/// Result of applying a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    /// Step entered, or `None` when the workflow completed.
    pub entered: Option<String>,
    pub completed: bool,
    /// Step whose exhausted iterations forced a fallback route.
    pub exhausted: Option<String>,
}

/// Advance the state machine from the current step.
///
/// At the completion step this marks the workflow complete; anywhere else
/// it selects an edge and starts the target step.
pub fn transition(
    instance: &mut WorkflowInstance,
    template: &WorkflowTemplate,
    verdict: Option<Verdict>,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, WorkflowError> {
    if instance.current_step == template.completion_step {
        instance.status = WorkflowStatus::Complete;
        return Ok(TransitionOutcome {
            entered: None,
            completed: true,
            exhausted: None,
        });
    }

    let selected = select_transition(instance, template, verdict)?;
    let from = instance.current_step.clone();
    let to = selected.edge.to.clone();
    start_step(instance, template, &to, now)?;
    tracing::debug!(%from, %to, ?verdict, "workflow transition");
    Ok(TransitionOutcome {
        entered: Some(to),
        completed: false,
        exhausted: selected.exhausted,
    })
}

/// One routed delivery produced by [`route_message`].
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    pub step_id: String,
    pub role: Role,
    pub message: AgentMessage,
}

/// Compute where an incoming worker message goes next.
///
/// The routed message is a fresh message from the orchestrator carrying
/// the same content, with `routedFrom`/`routedTo` stamped into metadata,
/// the thread id preserved, and a response required.
pub fn route_message(
    instance: &WorkflowInstance,
    template: &WorkflowTemplate,
    incoming: &AgentMessage,
    new_id: String,
    now: DateTime<Utc>,
) -> Result<Vec<RoutingDecision>, WorkflowError> {
    if instance.current_step == template.completion_step {
        // The terminal step's output ends the run; nothing to deliver
        return Ok(Vec::new());
    }

    let verdict = incoming.verdict();
    let selected = select_transition(instance, template, verdict)?;
    let next_step = template
        .step(&selected.edge.to)
        .ok_or_else(|| WorkflowError::StepNotFound(selected.edge.to.clone()))?;

    let mut content = incoming.content.clone();
    content.set_meta("routedFrom", incoming.from.as_str().into());
    content.set_meta("routedTo", next_step.role.as_str().into());

    let message = AgentMessage {
        id: new_id,
        timestamp: now,
        from: Role::Orchestrator,
        to: Recipient::Role(next_step.role),
        kind: incoming.kind,
        priority: incoming.priority,
        content,
        thread_id: incoming.thread_id.clone(),
        requires_response: true,
        deadline: None,
    };

    Ok(vec![RoutingDecision {
        step_id: selected.edge.to.clone(),
        role: next_step.role,
        message,
    }])
}

/// Synthesized outcome of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub session_id: SessionId,
    pub template: String,
    pub goal: String,
    pub status: WorkflowStatus,
    pub steps_executed: u32,
    /// Extra entries into review steps beyond their first.
    pub revision_count: u32,
    /// Outputs of completed steps, in execution order.
    pub outputs: Vec<StepOutput>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

fn build_result(
    instance: &WorkflowInstance,
    template: &WorkflowTemplate,
    now: DateTime<Utc>,
) -> WorkflowResult {
    let steps_executed = instance
        .history
        .iter()
        .filter(|r| r.status == StepRecordStatus::Complete)
        .count() as u32;
    let revision_count = template
        .steps
        .iter()
        .filter(|s| s.step_type == StepType::Review)
        .map(|s| instance.iteration_count(&s.id).saturating_sub(1))
        .sum();
    let outputs = instance
        .history
        .iter()
        .filter(|r| r.status == StepRecordStatus::Complete)
        .filter_map(|r| r.output.clone())
        .filter(|o| {
            matches!(
                o.kind,
                swarm_core::MessageType::Finding
                    | swarm_core::MessageType::Review
                    | swarm_core::MessageType::Artifact
                    | swarm_core::MessageType::Result
            )
        })
        .collect();
    WorkflowResult {
        session_id: instance.session_id.clone(),
        template: instance.template.clone(),
        goal: instance.goal.clone(),
        status: instance.status,
        steps_executed,
        revision_count,
        outputs,
        started_at: instance.created_at,
        finished_at: now,
    }
}

/// Synthesize the result of a complete workflow; refuses otherwise.
pub fn synthesize_result(
    instance: &WorkflowInstance,
    template: &WorkflowTemplate,
    now: DateTime<Utc>,
) -> Result<WorkflowResult, WorkflowError> {
    if instance.status != WorkflowStatus::Complete {
        return Err(WorkflowError::Incomplete);
    }
    Ok(build_result(instance, template, now))
}

/// Synthesize whatever exists so far, regardless of status. Used for
/// graceful stops and workflow timeouts.
pub fn synthesize_partial(
    instance: &WorkflowInstance,
    template: &WorkflowTemplate,
    now: DateTime<Utc>,
) -> WorkflowResult {
    build_result(instance, template, now)
}

/// Whether the instance has run past `max_duration`. The exact boundary
/// counts as timed out.
pub fn check_timeout(
    instance: &WorkflowInstance,
    max_duration: Duration,
    now: DateTime<Utc>,
) -> bool {
    let elapsed = now.signed_duration_since(instance.created_at);
    let limit = chrono::Duration::from_std(max_duration).unwrap_or(chrono::Duration::MAX);
    elapsed >= limit
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
