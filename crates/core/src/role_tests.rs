// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    orchestrator = { "orchestrator", Role::Orchestrator },
    researcher = { "researcher", Role::Researcher },
    developer = { "developer", Role::Developer },
    reviewer = { "reviewer", Role::Reviewer },
    architect = { "architect", Role::Architect },
)]
fn parse_known_roles(input: &str, expected: Role) {
    assert_eq!(Role::parse(input).unwrap(), expected);
    assert_eq!(expected.as_str(), input);
}

#[parameterized(
    traversal = { "../../../etc/passwd" },
    uppercase = { "Researcher" },
    empty = { "" },
    padded = { " reviewer" },
    unknown = { "designer" },
)]
fn parse_rejects_strings_outside_the_set(input: &str) {
    assert!(Role::parse(input).is_err());
}

#[test]
fn broadcast_marker_parses() {
    assert_eq!(Recipient::parse("*").unwrap(), Recipient::Broadcast);
    assert_eq!(
        Recipient::parse("developer").unwrap(),
        Recipient::Role(Role::Developer)
    );
    assert!(Recipient::parse("everyone").is_err());
}

#[test]
fn recipient_serde_round_trip() {
    let broadcast = serde_json::to_string(&Recipient::Broadcast).unwrap();
    assert_eq!(broadcast, "\"*\"");

    let role: Recipient = serde_json::from_str("\"reviewer\"").unwrap();
    assert_eq!(role, Recipient::Role(Role::Reviewer));

    assert!(serde_json::from_str::<Recipient>("\"nobody\"").is_err());
}

#[test]
fn workers_excludes_the_orchestrator() {
    assert!(!Role::WORKERS.contains(&Role::Orchestrator));
    assert!(!Role::Orchestrator.is_worker());
    assert!(Role::Reviewer.is_worker());
}
