//! Tests for the pre-action advisor.

use super::advisor::PolicyAdvisor;
use super::schema::{ActionCategory, RoutingRule, ToolPolicyProfile};

fn advisor() -> PolicyAdvisor {
    PolicyAdvisor::new(
        vec![
            ToolPolicyProfile {
                role: "EXEC".to_string(),
                allowed: Some(vec![
                    ActionCategory::FileWrite,
                    ActionCategory::ShellCommand,
                ]),
            },
            ToolPolicyProfile {
                role: "LEAD".to_string(),
                allowed: None,
            },
        ],
        vec![
            RoutingRule {
                keywords: vec!["schema migration".to_string(), "database".to_string()],
                specialist: "DBA".to_string(),
            },
            RoutingRule {
                keywords: vec!["accessibility".to_string(), "contrast".to_string()],
                specialist: "DESIGN".to_string(),
            },
        ],
    )
}

// =============================================================================
// Hard deny
// =============================================================================

#[test]
fn detached_execution_is_always_denied() {
    let decision = advisor().check_action("LEAD", ActionCategory::DetachedExecution, "run it");
    assert!(!decision.allowed);
    assert!(decision.deny_reason.is_some());
}

#[test]
fn hard_deny_takes_precedence_over_profile_and_routing() {
    // EXEC's profile does not allow detached execution either, and the
    // intent mentions a routed keyword; the deny reason must be the
    // hard-deny one, with no warnings and no hint.
    let decision = advisor().check_action(
        "EXEC",
        ActionCategory::DetachedExecution,
        "run the database migration in the background",
    );
    assert!(!decision.allowed);
    assert!(decision
        .deny_reason
        .as_deref()
        .unwrap()
        .contains("never permitted"));
    assert!(decision.warnings.is_empty());
    assert!(decision.routing_hint.is_none());
}

// =============================================================================
// Policy-profile check (advisory only)
// =============================================================================

#[test]
fn out_of_profile_action_warns_but_is_not_blocked() {
    let decision = advisor().check_action("EXEC", ActionCategory::NetworkAccess, "curl the docs");
    assert!(decision.allowed);
    assert_eq!(decision.warnings.len(), 1);
    assert!(decision.warnings[0].contains("network_access"));
}

#[test]
fn in_profile_action_produces_no_warning() {
    let decision = advisor().check_action("EXEC", ActionCategory::FileWrite, "edit src/lib.rs");
    assert!(decision.allowed);
    assert!(decision.warnings.is_empty());
}

#[test]
fn unrestricted_profile_permits_everything() {
    let decision = advisor().check_action("LEAD", ActionCategory::NetworkAccess, "fetch report");
    assert!(decision.allowed);
    assert!(decision.warnings.is_empty());
}

#[test]
fn unknown_role_is_unrestricted() {
    let decision = advisor().check_action("GHOST", ActionCategory::StoreMutation, "tweak a row");
    assert!(decision.allowed);
    assert!(decision.warnings.is_empty());
}

// =============================================================================
// Routing advisory
// =============================================================================

#[test]
fn keyword_match_emits_one_hint() {
    let decision = advisor().check_action(
        "EXEC",
        ActionCategory::ShellCommand,
        "Apply the schema migration, then verify accessibility.",
    );
    assert!(decision.allowed);
    let hint = decision.routing_hint.unwrap();
    // First matching rule wins, even though a later rule also matches.
    assert_eq!(hint.specialist, "DBA");
    assert_eq!(hint.matched_keyword, "schema migration");
}

#[test]
fn no_hint_when_the_actor_is_the_specialist() {
    let decision = advisor().check_action(
        "DBA",
        ActionCategory::ShellCommand,
        "apply the schema migration",
    );
    assert!(decision.routing_hint.is_none());
}

#[test]
fn later_rule_matches_when_earlier_rule_names_the_actor() {
    let decision = advisor().check_action(
        "DBA",
        ActionCategory::ShellCommand,
        "database change needs a contrast audit",
    );
    let hint = decision.routing_hint.unwrap();
    assert_eq!(hint.specialist, "DESIGN");
}

#[test]
fn matching_is_whole_word_and_case_insensitive() {
    // "databases" must not match the keyword "database".
    let decision = advisor().check_action(
        "EXEC",
        ActionCategory::ShellCommand,
        "update all the databases",
    );
    assert!(decision.routing_hint.is_none());

    let decision = advisor().check_action(
        "EXEC",
        ActionCategory::ShellCommand,
        "tune the DATABASE indexes",
    );
    assert!(decision.routing_hint.is_some());
}

#[test]
fn punctuation_does_not_defeat_matching() {
    let decision = advisor().check_action(
        "EXEC",
        ActionCategory::ShellCommand,
        "Investigate the database.",
    );
    assert!(decision.routing_hint.is_some());
}

#[test]
fn no_match_yields_no_hint() {
    let decision = advisor().check_action(
        "EXEC",
        ActionCategory::ShellCommand,
        "refactor the parser for clarity",
    );
    assert!(decision.routing_hint.is_none());
}
