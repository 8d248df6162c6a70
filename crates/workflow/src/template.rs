// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative workflow templates.

use crate::WorkflowError;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use swarm_core::{
    MessageDraft, MessageType, Priority, Role, SessionId, Verdict, WorkflowInstance,
};

/// What kind of work a step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    Task,
    Work,
    Review,
    Synthesis,
    Decision,
}

/// One step of a template.
#[derive(Debug, Clone)]
pub struct StepDef {
    pub id: String,
    pub description: String,
    pub role: Role,
    pub step_type: StepType,
    pub input_types: Vec<MessageType>,
    pub output_type: MessageType,
    /// Attempts allowed before the engine routes around this step.
    pub max_iterations: u32,
    pub timeout: Duration,
    pub optional: bool,
}

/// When a transition fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCondition {
    /// The step finished without a verdict (or no verdict edge matched).
    Complete,
    /// The step's output carried this verdict.
    OnVerdict(Verdict),
    /// Unconditional fallback.
    Default,
}

/// One edge of the step graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDef {
    pub from: String,
    pub to: String,
    pub condition: TransitionCondition,
}

impl TransitionDef {
    pub fn on_complete(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            condition: TransitionCondition::Complete,
        }
    }

    pub fn on_verdict(from: &str, to: &str, verdict: Verdict) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            condition: TransitionCondition::OnVerdict(verdict),
        }
    }
}

/// A registered workflow shape.
#[derive(Debug, Clone)]
pub struct WorkflowTemplate {
    pub name: String,
    pub description: String,
    pub roles: Vec<Role>,
    pub steps: Vec<StepDef>,
    pub transitions: Vec<TransitionDef>,
    pub entry_step: String,
    pub completion_step: String,
    pub max_duration: Duration,
    pub max_revisions: u32,
}

impl WorkflowTemplate {
    pub fn step(&self, id: &str) -> Option<&StepDef> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn transitions_from(&self, id: &str) -> Vec<&TransitionDef> {
        self.transitions.iter().filter(|t| t.from == id).collect()
    }

    /// Structural checks: entry and completion steps exist, every edge
    /// references known steps, and the completion step loops to itself.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        for id in [&self.entry_step, &self.completion_step] {
            if self.step(id).is_none() {
                return Err(WorkflowError::StepNotFound(id.clone()));
            }
        }
        for transition in &self.transitions {
            if self.step(&transition.from).is_none() {
                return Err(WorkflowError::StepNotFound(transition.from.clone()));
            }
            if self.step(&transition.to).is_none() {
                return Err(WorkflowError::StepNotFound(transition.to.clone()));
            }
        }
        let terminal_loop = self
            .transitions_from(&self.completion_step)
            .iter()
            .any(|t| t.to == self.completion_step);
        if !terminal_loop {
            return Err(WorkflowError::InvalidTransition(self.completion_step.clone()));
        }
        Ok(())
    }
}

/// Registry of templates, including aliases.
pub struct TemplateRegistry {
    templates: IndexMap<String, Arc<WorkflowTemplate>>,
    aliases: HashMap<String, String>,
}

impl TemplateRegistry {
    /// Registry preloaded with the built-in templates and their aliases
    /// (`development` → `implement`, `architecture` → `full`).
    pub fn builtin() -> Self {
        let mut registry = Self {
            templates: IndexMap::new(),
            aliases: HashMap::new(),
        };
        registry.register(crate::builtins::research());
        registry.register(crate::builtins::implement());
        registry.register(crate::builtins::review());
        registry.register(crate::builtins::full());
        registry.alias("development", "implement");
        registry.alias("architecture", "full");
        registry
    }

    pub fn register(&mut self, template: WorkflowTemplate) {
        self.templates
            .insert(template.name.clone(), Arc::new(template));
    }

    pub fn alias(&mut self, alias: &str, target: &str) {
        self.aliases.insert(alias.to_string(), target.to_string());
    }

    /// Resolve a name or alias.
    pub fn get(&self, name: &str) -> Result<Arc<WorkflowTemplate>, WorkflowError> {
        let resolved = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.templates
            .get(resolved)
            .cloned()
            .ok_or_else(|| WorkflowError::TemplateNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Build a fresh instance positioned at the entry step.
pub fn instantiate(
    template: &WorkflowTemplate,
    session_id: SessionId,
    goal: impl Into<String>,
    now: DateTime<Utc>,
) -> WorkflowInstance {
    WorkflowInstance::new(&template.name, session_id, goal, &template.entry_step, now)
}

/// The task message that kicks off a workflow, addressed to the entry
/// step's role. The thread id ties the whole run together.
pub fn initial_task_message(
    template: &WorkflowTemplate,
    instance: &WorkflowInstance,
) -> Result<MessageDraft, WorkflowError> {
    let entry = template
        .step(&template.entry_step)
        .ok_or_else(|| WorkflowError::StepNotFound(template.entry_step.clone()))?;
    Ok(
        MessageDraft::new(Role::Orchestrator, entry.role, MessageType::Task)
            .subject(format!("{}: {}", template.name, instance.goal))
            .body(instance.goal.clone())
            .priority(Priority::High)
            .thread(format!("wf-{}", instance.session_id))
            .requires_response(true),
    )
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
