// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single().unwrap()
}

#[test]
fn registry_resolves_names_and_aliases() {
    let registry = TemplateRegistry::builtin();
    assert_eq!(registry.get("research").unwrap().name, "research");
    assert_eq!(registry.get("implement").unwrap().name, "implement");
    assert_eq!(registry.get("development").unwrap().name, "implement");
    assert_eq!(registry.get("full").unwrap().name, "full");
    assert_eq!(registry.get("architecture").unwrap().name, "full");
    assert_eq!(registry.get("review").unwrap().name, "review");
}

#[test]
fn unknown_template_is_an_error() {
    let registry = TemplateRegistry::builtin();
    assert!(matches!(
        registry.get("ship-it"),
        Err(crate::WorkflowError::TemplateNotFound(name)) if name == "ship-it"
    ));
}

#[test]
fn registry_lists_names_in_registration_order() {
    let registry = TemplateRegistry::builtin();
    assert_eq!(registry.names(), vec!["research", "implement", "review", "full"]);
}

#[test]
fn instantiate_positions_at_the_entry_step() {
    let registry = TemplateRegistry::builtin();
    let template = registry.get("implement").unwrap();
    let instance = instantiate(&template, SessionId::new("swarm-1"), "add an LRU", ts());

    assert_eq!(instance.current_step, "architecture");
    assert_eq!(instance.template, "implement");
    assert_eq!(instance.goal, "add an LRU");
}

#[test]
fn initial_task_targets_the_entry_role() {
    let registry = TemplateRegistry::builtin();
    let template = registry.get("research").unwrap();
    let instance = instantiate(&template, SessionId::new("swarm-1"), "learn things", ts());

    let draft = initial_task_message(&template, &instance).unwrap();
    assert_eq!(draft.from, Role::Orchestrator);
    assert_eq!(draft.to.as_role(), Some(Role::Researcher));
    assert_eq!(draft.kind, MessageType::Task);
    assert_eq!(draft.priority, Priority::High);
    assert!(draft.requires_response);
    assert_eq!(draft.thread_id.as_deref(), Some("wf-swarm-1"));
    assert!(draft.content.body.contains("learn things"));
}

#[test]
fn transitions_from_filters_by_source() {
    let registry = TemplateRegistry::builtin();
    let template = registry.get("research").unwrap();
    let from_verification = template.transitions_from("verification");
    assert_eq!(from_verification.len(), 4);
    assert!(from_verification.iter().all(|t| t.from == "verification"));
}

#[test]
fn validate_flags_edges_to_unknown_steps() {
    let mut template = crate::builtins::review();
    template.transitions.push(TransitionDef::on_complete("summary", "ghost"));
    assert_eq!(
        template.validate(),
        Err(crate::WorkflowError::StepNotFound("ghost".into()))
    );
}

#[test]
fn validate_requires_a_terminal_self_loop() {
    let mut template = crate::builtins::review();
    template.transitions.retain(|t| t.to != "summary" || t.from != "summary");
    assert_eq!(
        template.validate(),
        Err(crate::WorkflowError::InvalidTransition("summary".into()))
    );
}
