// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in workflow templates.
//!
//! Review steps allow one more entry than their paired revision step so
//! the verdict that exhausts the revision budget is still processed; the
//! engine then routes forward on the review step's complete edge.

use crate::template::{StepDef, StepType, TransitionCondition, TransitionDef, WorkflowTemplate};
use std::time::Duration;
use swarm_core::{MessageType, Role, Verdict};

fn step(id: &str, description: &str, role: Role, step_type: StepType) -> StepDefBuilder {
    StepDefBuilder(StepDef {
        id: id.to_string(),
        description: description.to_string(),
        role,
        step_type,
        input_types: Vec::new(),
        output_type: MessageType::Status,
        max_iterations: 3,
        timeout: Duration::from_secs(300),
        optional: false,
    })
}

struct StepDefBuilder(StepDef);

impl StepDefBuilder {
    fn inputs(mut self, types: &[MessageType]) -> Self {
        self.0.input_types = types.to_vec();
        self
    }

    fn output(mut self, kind: MessageType) -> Self {
        self.0.output_type = kind;
        self
    }

    fn iterations(mut self, max: u32) -> Self {
        self.0.max_iterations = max;
        self
    }

    fn build(self) -> StepDef {
        self.0
    }
}

/// `research`: investigate, verify, synthesize.
pub fn research() -> WorkflowTemplate {
    WorkflowTemplate {
        name: "research".into(),
        description: "Research a topic and synthesize verified findings".into(),
        roles: vec![Role::Researcher, Role::Reviewer],
        steps: vec![
            step("initial_research", "Investigate the goal", Role::Researcher, StepType::Work)
                .inputs(&[MessageType::Task])
                .output(MessageType::Finding)
                .iterations(2)
                .build(),
            step("verification", "Verify the findings", Role::Reviewer, StepType::Review)
                .inputs(&[MessageType::Finding])
                .output(MessageType::Review)
                .iterations(3)
                .build(),
            step("deep_dive", "Follow up on gaps", Role::Researcher, StepType::Work)
                .inputs(&[MessageType::Review])
                .output(MessageType::Finding)
                .iterations(2)
                .build(),
            step("synthesis", "Synthesize the result", Role::Researcher, StepType::Synthesis)
                .inputs(&[MessageType::Review, MessageType::Finding])
                .output(MessageType::Result)
                .iterations(1)
                .build(),
        ],
        transitions: vec![
            TransitionDef::on_complete("initial_research", "verification"),
            TransitionDef::on_verdict("verification", "synthesis", Verdict::Approved),
            TransitionDef::on_verdict("verification", "deep_dive", Verdict::NeedsRevision),
            TransitionDef::on_verdict("verification", "synthesis", Verdict::Rejected),
            TransitionDef::on_complete("verification", "synthesis"),
            TransitionDef::on_complete("deep_dive", "verification"),
            TransitionDef::on_complete("synthesis", "synthesis"),
        ],
        entry_step: "initial_research".into(),
        completion_step: "synthesis".into(),
        max_duration: Duration::from_secs(30 * 60),
        max_revisions: 3,
    }
}

/// `implement` (alias `development`): design, review, build, review, document.
pub fn implement() -> WorkflowTemplate {
    WorkflowTemplate {
        name: "implement".into(),
        description: "Design, implement, and document a change".into(),
        roles: vec![Role::Architect, Role::Developer, Role::Reviewer],
        steps: vec![
            step("architecture", "Design the approach", Role::Architect, StepType::Work)
                .inputs(&[MessageType::Task])
                .output(MessageType::Design)
                .iterations(2)
                .build(),
            step("design_review", "Review the design", Role::Reviewer, StepType::Review)
                .inputs(&[MessageType::Design])
                .output(MessageType::Review)
                .iterations(4)
                .build(),
            step("design_revision", "Revise the design", Role::Architect, StepType::Work)
                .inputs(&[MessageType::Review])
                .output(MessageType::Design)
                .iterations(3)
                .build(),
            step("implementation", "Implement the design", Role::Developer, StepType::Work)
                .inputs(&[MessageType::Design])
                .output(MessageType::Artifact)
                .iterations(2)
                .build(),
            step("code_review", "Review the implementation", Role::Reviewer, StepType::Review)
                .inputs(&[MessageType::Artifact])
                .output(MessageType::Review)
                .iterations(4)
                .build(),
            step("code_revision", "Address review feedback", Role::Developer, StepType::Work)
                .inputs(&[MessageType::Review])
                .output(MessageType::Artifact)
                .iterations(3)
                .build(),
            step("documentation", "Document the change", Role::Developer, StepType::Work)
                .inputs(&[MessageType::Review, MessageType::Artifact])
                .output(MessageType::Artifact)
                .iterations(1)
                .build(),
        ],
        transitions: vec![
            TransitionDef::on_complete("architecture", "design_review"),
            TransitionDef::on_verdict("design_review", "implementation", Verdict::Approved),
            TransitionDef::on_verdict("design_review", "design_revision", Verdict::NeedsRevision),
            TransitionDef::on_complete("design_review", "implementation"),
            TransitionDef::on_complete("design_revision", "design_review"),
            TransitionDef::on_complete("implementation", "code_review"),
            TransitionDef::on_verdict("code_review", "documentation", Verdict::Approved),
            TransitionDef::on_verdict("code_review", "code_revision", Verdict::NeedsRevision),
            TransitionDef::on_complete("code_review", "documentation"),
            TransitionDef::on_complete("code_revision", "code_review"),
            TransitionDef::on_complete("documentation", "documentation"),
        ],
        entry_step: "architecture".into(),
        completion_step: "documentation".into(),
        max_duration: Duration::from_secs(60 * 60),
        max_revisions: 3,
    }
}

/// `review`: analyze and summarize, single role.
pub fn review() -> WorkflowTemplate {
    WorkflowTemplate {
        name: "review".into(),
        description: "Analyze code and summarize the findings".into(),
        roles: vec![Role::Reviewer],
        steps: vec![
            step("code_analysis", "Analyze the code", Role::Reviewer, StepType::Work)
                .inputs(&[MessageType::Task])
                .output(MessageType::Review)
                .iterations(2)
                .build(),
            step("summary", "Summarize the analysis", Role::Reviewer, StepType::Synthesis)
                .inputs(&[MessageType::Review])
                .output(MessageType::Result)
                .iterations(1)
                .build(),
        ],
        transitions: vec![
            TransitionDef::on_complete("code_analysis", "summary"),
            TransitionDef::on_complete("summary", "summary"),
        ],
        entry_step: "code_analysis".into(),
        completion_step: "summary".into(),
        max_duration: Duration::from_secs(20 * 60),
        max_revisions: 2,
    }
}

/// `full` (alias `architecture`): research through final synthesis.
pub fn full() -> WorkflowTemplate {
    WorkflowTemplate {
        name: "full".into(),
        description: "Research, design, implement, document, synthesize".into(),
        roles: vec![Role::Researcher, Role::Architect, Role::Developer, Role::Reviewer],
        steps: vec![
            step("research", "Research the problem space", Role::Researcher, StepType::Work)
                .inputs(&[MessageType::Task])
                .output(MessageType::Finding)
                .iterations(2)
                .build(),
            step("architecture", "Design the approach", Role::Architect, StepType::Work)
                .inputs(&[MessageType::Finding])
                .output(MessageType::Design)
                .iterations(2)
                .build(),
            step("design_review", "Review the design", Role::Reviewer, StepType::Review)
                .inputs(&[MessageType::Design])
                .output(MessageType::Review)
                .iterations(4)
                .build(),
            step("design_revision", "Revise the design", Role::Architect, StepType::Work)
                .inputs(&[MessageType::Review])
                .output(MessageType::Design)
                .iterations(3)
                .build(),
            step("implementation", "Implement the design", Role::Developer, StepType::Work)
                .inputs(&[MessageType::Design])
                .output(MessageType::Artifact)
                .iterations(2)
                .build(),
            step("code_review", "Review the implementation", Role::Reviewer, StepType::Review)
                .inputs(&[MessageType::Artifact])
                .output(MessageType::Review)
                .iterations(4)
                .build(),
            step("code_revision", "Address review feedback", Role::Developer, StepType::Work)
                .inputs(&[MessageType::Review])
                .output(MessageType::Artifact)
                .iterations(3)
                .build(),
            step("documentation", "Document the change", Role::Developer, StepType::Work)
                .inputs(&[MessageType::Artifact])
                .output(MessageType::Artifact)
                .iterations(1)
                .build(),
            step("final_synthesis", "Synthesize the session result", Role::Researcher, StepType::Synthesis)
                .inputs(&[MessageType::Artifact, MessageType::Finding, MessageType::Review])
                .output(MessageType::Result)
                .iterations(1)
                .build(),
        ],
        transitions: vec![
            TransitionDef::on_complete("research", "architecture"),
            TransitionDef::on_complete("architecture", "design_review"),
            TransitionDef::on_verdict("design_review", "implementation", Verdict::Approved),
            TransitionDef::on_verdict("design_review", "design_revision", Verdict::NeedsRevision),
            TransitionDef::on_complete("design_review", "implementation"),
            TransitionDef::on_complete("design_revision", "design_review"),
            TransitionDef::on_complete("implementation", "code_review"),
            TransitionDef::on_verdict("code_review", "documentation", Verdict::Approved),
            TransitionDef::on_verdict("code_review", "code_revision", Verdict::NeedsRevision),
            TransitionDef::on_complete("code_review", "documentation"),
            TransitionDef::on_complete("code_revision", "code_review"),
            TransitionDef::on_complete("documentation", "final_synthesis"),
            TransitionDef::on_complete("final_synthesis", "final_synthesis"),
        ],
        entry_step: "research".into(),
        completion_step: "final_synthesis".into(),
        max_duration: Duration::from_secs(2 * 60 * 60),
        max_revisions: 3,
    }
}

#[cfg(test)]
#[path = "builtins_tests.rs"]
mod tests;
