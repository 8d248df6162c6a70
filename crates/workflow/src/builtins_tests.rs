// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    research_case = { research() },
    implement_case = { implement() },
    review_case = { review() },
    full_case = { full() },
)]
fn builtins_validate(template: WorkflowTemplate) {
    template.validate().unwrap();
}

#[parameterized(
    research_case = { research(), &[Role::Researcher, Role::Reviewer] },
    implement_case = { implement(), &[Role::Architect, Role::Developer, Role::Reviewer] },
    review_case = { review(), &[Role::Reviewer] },
    full_case = { full(), &[Role::Researcher, Role::Architect, Role::Developer, Role::Reviewer] },
)]
fn role_sets(template: WorkflowTemplate, roles: &[Role]) {
    assert_eq!(template.roles, roles);
    // Every step's role is in the template's role set
    for step in &template.steps {
        assert!(template.roles.contains(&step.role), "step {} role", step.id);
    }
}

#[test]
fn research_branches_on_verification_verdict() {
    let template = research();
    let edges = template.transitions_from("verification");

    let target_for = |v: Verdict| {
        edges
            .iter()
            .find(|t| t.condition == TransitionCondition::OnVerdict(v))
            .map(|t| t.to.as_str())
    };
    assert_eq!(target_for(Verdict::Approved), Some("synthesis"));
    assert_eq!(target_for(Verdict::NeedsRevision), Some("deep_dive"));
    assert_eq!(target_for(Verdict::Rejected), Some("synthesis"));
}

#[test]
fn implement_loops_pair_review_with_revision() {
    let template = implement();

    // Each review step's revision loop re-enters the review
    let design_loop = template
        .transitions_from("design_revision")
        .iter()
        .any(|t| t.to == "design_review");
    let code_loop = template
        .transitions_from("code_revision")
        .iter()
        .any(|t| t.to == "code_review");
    assert!(design_loop);
    assert!(code_loop);

    // Review steps allow one more entry than their revision step, so the
    // verdict that exhausts the loop still gets processed
    let review = template.step("code_review").unwrap();
    let revision = template.step("code_revision").unwrap();
    assert_eq!(review.max_iterations, revision.max_iterations + 1);
}

#[test]
fn completion_steps_are_terminal_synthesis_or_docs() {
    assert_eq!(research().completion_step, "synthesis");
    assert_eq!(implement().completion_step, "documentation");
    assert_eq!(review().completion_step, "summary");
    assert_eq!(full().completion_step, "final_synthesis");
}
