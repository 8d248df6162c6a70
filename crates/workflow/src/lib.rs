// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Workflow templates and the state-machine engine.
//!
//! Templates are declarative data registered in code; the engine is a set
//! of pure functions over a [`swarm_core::WorkflowInstance`]. Nothing in
//! this crate performs I/O, which is what keeps verdict-driven routing
//! testable without an orchestrator.

mod builtins;
mod engine;
mod template;

pub use builtins::{full, implement, research, review};
pub use engine::{
    check_timeout, complete_step, fail_step, route_message, select_transition, skip_step,
    start_step, synthesize_partial, synthesize_result, transition, RoutingDecision,
    SelectedTransition, TransitionOutcome, WorkflowResult,
};
pub use template::{
    initial_task_message, instantiate, StepDef, StepType, TemplateRegistry, TransitionCondition,
    TransitionDef, WorkflowTemplate,
};

use swarm_core::{ErrorCode, SwarmError};
use thiserror::Error;

/// Errors from template lookup and engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("workflow template not found: {0}")]
    TemplateNotFound(String),
    #[error("step not found: {0}")]
    StepNotFound(String),
    #[error("no transition from step: {0}")]
    InvalidTransition(String),
    #[error("step {step} already at max iterations ({max})")]
    MaxIterationsExceeded { step: String, max: u32 },
    #[error("step is not optional: {0}")]
    NotOptional(String),
    #[error("workflow is not complete")]
    Incomplete,
}

impl From<WorkflowError> for SwarmError {
    fn from(err: WorkflowError) -> Self {
        let code = match &err {
            WorkflowError::TemplateNotFound(_) => ErrorCode::WorkflowNotFound,
            WorkflowError::StepNotFound(_) => ErrorCode::StepNotFound,
            WorkflowError::InvalidTransition(_) => ErrorCode::InvalidTransition,
            WorkflowError::MaxIterationsExceeded { .. } => ErrorCode::MaxIterationsExceeded,
            WorkflowError::NotOptional(_) | WorkflowError::Incomplete => ErrorCode::InvalidArgs,
        };
        SwarmError::new(code, "workflow", err.to_string())
    }
}
