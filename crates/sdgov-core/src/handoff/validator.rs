//! Pure handoff validation and completeness scoring.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::payload::HandoffPayload;
use crate::work::Phase;

/// Number of mandatory sections in a handoff document.
pub const SECTION_COUNT: usize = 7;

/// Minimum trimmed length for a text section to earn full credit.
pub const MIN_SECTION_LEN: usize = 16;

/// Completeness score at or above which a handoff is accepted,
/// provided no section is missing and no blocking issue exists.
pub const ACCEPTANCE_THRESHOLD: f64 = 80.0;

/// How a section failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionIssueKind {
    /// Section is absent or empty.
    Missing,
    /// Section is present but too thin to be useful.
    Weak,
    /// Section content forbids the transition outright
    /// (unresolved critical known issue).
    Blocking,
}

/// One structured validation finding, returned to the caller for
/// remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionIssue {
    /// The offending section name.
    pub section: String,

    /// Failure classification.
    pub kind: SectionIssueKind,

    /// Human-readable detail.
    pub detail: String,
}

impl SectionIssue {
    fn missing(section: &str, detail: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            kind: SectionIssueKind::Missing,
            detail: detail.into(),
        }
    }

    fn weak(section: &str, detail: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            kind: SectionIssueKind::Weak,
            detail: detail.into(),
        }
    }
}

/// Outcome of validating one handoff payload.
#[derive(Debug, Clone, PartialEq)]
pub struct HandoffValidation {
    /// Completeness score, 0-100.
    pub score: f64,

    /// Whether the handoff is accepted.
    pub accepted: bool,

    /// Findings for the caller; empty when accepted cleanly.
    pub issues: Vec<SectionIssue>,
}

/// Credit earned by one text section: full, half for thin content,
/// nothing for empty.
fn text_section_credit(name: &str, value: &str, issues: &mut Vec<SectionIssue>) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        issues.push(SectionIssue::missing(name, "section is empty"));
        0.0
    } else if trimmed.len() < MIN_SECTION_LEN {
        issues.push(SectionIssue::weak(
            name,
            format!("only {} characters, expected at least {MIN_SECTION_LEN}", trimmed.len()),
        ));
        0.5
    } else {
        1.0
    }
}

/// Validates a handoff payload for a transition into `to_phase`.
///
/// Pure function of its inputs: calling it twice on the same payload
/// yields the same score and status. The seven sections are weighted
/// equally; a missing section or an unresolved critical known issue
/// rejects the handoff regardless of the aggregate score.
#[must_use]
pub fn validate(payload: &HandoffPayload, to_phase: Phase) -> HandoffValidation {
    let mut issues = Vec::new();
    let mut earned = 0.0f64;

    earned += text_section_credit("executive_summary", &payload.executive_summary, &mut issues);
    earned += text_section_credit(
        "completeness_report",
        &payload.completeness_report,
        &mut issues,
    );

    if payload.deliverables_manifest.is_empty() {
        issues.push(SectionIssue::missing(
            "deliverables_manifest",
            "no deliverables listed",
        ));
    } else {
        earned += 1.0;
    }

    earned += text_section_credit("key_decisions", &payload.key_decisions, &mut issues);

    // An empty known-issues list is a complete section: it asserts there
    // is nothing to hand over. An unresolved critical entry blocks the
    // transition outright.
    earned += 1.0;
    if let Some(blocking) = payload.blocking_issue() {
        issues.push(SectionIssue {
            section: "known_issues".to_string(),
            kind: SectionIssueKind::Blocking,
            detail: format!("unresolved critical issue: {}", blocking.description),
        });
    }

    earned += text_section_credit(
        "resource_utilization",
        &payload.resource_utilization,
        &mut issues,
    );

    if payload.action_items.is_empty() {
        if to_phase.is_terminal() {
            // Nothing left to do after the final boundary.
            earned += 1.0;
        } else {
            issues.push(SectionIssue::missing(
                "action_items",
                "action items are required when the target phase is non-terminal",
            ));
        }
    } else {
        earned += 1.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let score = earned / SECTION_COUNT as f64 * 100.0;

    let missing_or_blocking = issues
        .iter()
        .any(|i| matches!(i.kind, SectionIssueKind::Missing | SectionIssueKind::Blocking));
    let accepted = !missing_or_blocking && score >= ACCEPTANCE_THRESHOLD;

    debug!(
        score,
        accepted,
        issue_count = issues.len(),
        to_phase = %to_phase,
        "handoff validated"
    );

    HandoffValidation {
        score,
        accepted,
        issues,
    }
}
