//! Tests for handoff validation.

use super::payload::{HandoffPayload, IssueSeverity, KnownIssue};
use super::validator::{validate, SectionIssueKind, ACCEPTANCE_THRESHOLD};
use crate::work::Phase;

fn complete_payload() -> HandoffPayload {
    HandoffPayload {
        executive_summary: "Implemented the retry queue and backfilled history.".to_string(),
        completeness_report: "All planned scope delivered; checklist 12/12.".to_string(),
        deliverables_manifest: vec![
            "src/queue/retry.rs".to_string(),
            "migration 0042_retry_queue.sql".to_string(),
        ],
        key_decisions: "Chose at-least-once delivery over exactly-once.".to_string(),
        known_issues: vec![],
        resource_utilization: "Two engineer-days, no external spend.".to_string(),
        action_items: vec!["Verify retry behavior under load".to_string()],
    }
}

// =============================================================================
// Acceptance path
// =============================================================================

#[test]
fn complete_payload_is_accepted_at_full_score() {
    let result = validate(&complete_payload(), Phase::Exec);
    assert!(result.accepted);
    assert!((result.score - 100.0).abs() < 1e-9);
    assert!(result.issues.is_empty());
}

#[test]
fn validation_is_idempotent() {
    let payload = complete_payload();
    let first = validate(&payload, Phase::Exec);
    let second = validate(&payload, Phase::Exec);
    assert_eq!(first.score.to_bits(), second.score.to_bits());
    assert_eq!(first.accepted, second.accepted);
    assert_eq!(first.issues, second.issues);
}

#[test]
fn resolved_critical_issue_does_not_block() {
    let mut payload = complete_payload();
    payload.known_issues = vec![KnownIssue {
        severity: IssueSeverity::Critical,
        description: "flaky integration test".to_string(),
        resolved: true,
    }];
    let result = validate(&payload, Phase::Exec);
    assert!(result.accepted);
}

#[test]
fn empty_action_items_allowed_into_terminal_phase() {
    let mut payload = complete_payload();
    payload.action_items.clear();
    let result = validate(&payload, Phase::Completed);
    assert!(result.accepted, "issues: {:?}", result.issues);
}

// =============================================================================
// Rejection paths
// =============================================================================

#[test]
fn empty_section_rejects_with_missing_issue() {
    let mut payload = complete_payload();
    payload.executive_summary.clear();
    let result = validate(&payload, Phase::Exec);
    assert!(!result.accepted);
    assert!(result
        .issues
        .iter()
        .any(|i| i.section == "executive_summary" && i.kind == SectionIssueKind::Missing));
    // Six of seven sections earn credit.
    assert!(result.score < 90.0);
}

#[test]
fn empty_action_items_reject_for_non_terminal_target() {
    let mut payload = complete_payload();
    payload.action_items.clear();
    let result = validate(&payload, Phase::PlanVerification);
    assert!(!result.accepted);
    assert!(result.issues.iter().any(|i| i.section == "action_items"));
}

#[test]
fn unresolved_critical_issue_blocks_despite_full_score() {
    let mut payload = complete_payload();
    payload.known_issues = vec![KnownIssue::open(
        IssueSeverity::Critical,
        "data loss on replay",
    )];
    let result = validate(&payload, Phase::PlanVerification);
    assert!(!result.accepted);
    assert!(result
        .issues
        .iter()
        .any(|i| i.kind == SectionIssueKind::Blocking));
    // Score alone would have passed; the blocking issue vetoes it.
    assert!(result.score >= ACCEPTANCE_THRESHOLD);
}

#[test]
fn unresolved_high_issue_does_not_block() {
    let mut payload = complete_payload();
    payload.known_issues = vec![KnownIssue::open(IssueSeverity::High, "slow cold start")];
    let result = validate(&payload, Phase::PlanVerification);
    assert!(result.accepted);
}

#[test]
fn thin_sections_degrade_score_below_threshold() {
    let mut payload = complete_payload();
    payload.executive_summary = "done".to_string();
    payload.key_decisions = "none".to_string();
    payload.resource_utilization = "n/a".to_string();
    let result = validate(&payload, Phase::Exec);
    // Three half-credit sections: (4 + 1.5) / 7 ~= 78.6.
    assert!(!result.accepted);
    assert!(result.score < ACCEPTANCE_THRESHOLD);
    assert_eq!(
        result
            .issues
            .iter()
            .filter(|i| i.kind == SectionIssueKind::Weak)
            .count(),
        3
    );
}

#[test]
fn whitespace_only_section_counts_as_missing() {
    let mut payload = complete_payload();
    payload.completeness_report = "   \n\t ".to_string();
    let result = validate(&payload, Phase::Exec);
    assert!(!result.accepted);
    assert!(result
        .issues
        .iter()
        .any(|i| i.section == "completeness_report" && i.kind == SectionIssueKind::Missing));
}

#[test]
fn payload_rejects_unknown_fields_at_the_serde_boundary() {
    let raw = r#"{
        "executive_summary": "s",
        "completeness_report": "c",
        "key_decisions": "k",
        "resource_utilization": "r",
        "surprise_field": true
    }"#;
    let parsed: Result<HandoffPayload, _> = serde_json::from_str(raw);
    assert!(parsed.is_err());
}
