// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single().unwrap()
}

fn draft() -> MessageDraft {
    MessageDraft::new(Role::Researcher, Role::Orchestrator, MessageType::Finding)
        .subject("atomic rename")
        .body("findings attached")
}

#[test]
fn wire_field_names_match_the_mailbox_schema() {
    let msg = draft()
        .thread("thread-1")
        .requires_response(true)
        .into_message("m-1".into(), ts());

    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "finding");
    assert_eq!(json["threadId"], "thread-1");
    assert_eq!(json["requiresResponse"], true);
    assert_eq!(json["from"], "researcher");
    assert_eq!(json["to"], "orchestrator");
    // Optional fields are omitted entirely
    assert!(json.get("deadline").is_none());
}

#[test]
fn round_trip_preserves_content() {
    let msg = draft()
        .artifacts(vec!["src/lib.rs".into()])
        .meta("verdict", serde_json::json!("APPROVED"))
        .into_message("m-2".into(), ts());

    let json = serde_json::to_string(&msg).unwrap();
    let back: AgentMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(back, msg);
    assert_eq!(back.verdict(), Some(Verdict::Approved));
}

#[parameterized(
    approved = { "APPROVED", Some(Verdict::Approved) },
    needs_revision = { "NEEDS_REVISION", Some(Verdict::NeedsRevision) },
    rejected = { "REJECTED", Some(Verdict::Rejected) },
    lowercase = { "approved", None },
    other = { "MAYBE", None },
)]
fn verdict_parsing(input: &str, expected: Option<Verdict>) {
    assert_eq!(Verdict::parse(input), expected);
}

#[test]
fn verdict_absent_when_metadata_missing() {
    let msg = draft().into_message("m-3".into(), ts());
    assert_eq!(msg.verdict(), None);
}

#[test]
fn priority_orders_low_to_critical() {
    assert!(Priority::Low < Priority::Normal);
    assert!(Priority::Normal < Priority::High);
    assert!(Priority::High < Priority::Critical);
    assert_eq!(Priority::Critical.rank(), 3);
}

proptest::proptest! {
    // rank() and the derived ordering always agree, so sorting by either
    // puts critical messages ahead of earlier normal ones.
    #[test]
    fn priority_rank_agrees_with_ord(a in 0u8..4, b in 0u8..4) {
        let priorities = [Priority::Low, Priority::Normal, Priority::High, Priority::Critical];
        let (a, b) = (priorities[a as usize], priorities[b as usize]);
        proptest::prop_assert_eq!(a.cmp(&b), a.rank().cmp(&b.rank()));
    }
}

#[test]
fn validation_catches_empty_subject() {
    let msg = MessageDraft::new(Role::Reviewer, Role::Developer, MessageType::Review)
        .into_message("m-4".into(), ts());
    assert_eq!(msg.validate(), Err(InvalidMessage::EmptySubject));
}

#[test]
fn validation_rejects_self_addressed_unicast() {
    let msg = MessageDraft::new(Role::Reviewer, Role::Reviewer, MessageType::Status)
        .subject("hello me")
        .into_message("m-5".into(), ts());
    assert_eq!(
        msg.validate(),
        Err(InvalidMessage::SelfAddressed(Role::Reviewer))
    );

    // Broadcast from any role is fine
    let msg = MessageDraft::new(Role::Reviewer, Recipient::Broadcast, MessageType::Status)
        .subject("hello all")
        .into_message("m-6".into(), ts());
    assert!(msg.validate().is_ok());
}

#[test]
fn review_payload_round_trips_through_metadata() {
    let payload = ReviewPayload {
        verdict: Verdict::NeedsRevision,
        issues: vec!["missing tests".into()],
    };
    let value = serde_json::to_value(&payload).unwrap();
    let back: ReviewPayload = serde_json::from_value(value).unwrap();
    assert_eq!(back, payload);
}
