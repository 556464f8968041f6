//! The seven-section handoff document.

use serde::{Deserialize, Serialize};

/// Severity of a known issue carried across a phase boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Cosmetic or informational.
    Low,
    /// Worth tracking, not blocking.
    Medium,
    /// Needs attention soon.
    High,
    /// Must be resolved before the transition may proceed.
    Critical,
}

/// An issue the outgoing role is aware of at handoff time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownIssue {
    /// Severity classification.
    pub severity: IssueSeverity,

    /// What is wrong.
    pub description: String,

    /// Whether the issue has already been resolved.
    #[serde(default)]
    pub resolved: bool,
}

impl KnownIssue {
    /// An unresolved issue at the given severity.
    #[must_use]
    pub fn open(severity: IssueSeverity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            resolved: false,
        }
    }
}

/// The mandatory seven-section handoff document.
///
/// Every phase-to-phase transition carries one of these. The schema is
/// fixed; loosely-shaped payloads are rejected at the serde boundary
/// rather than trusted implicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandoffPayload {
    /// What was done and why, in a paragraph.
    pub executive_summary: String,

    /// How complete the outgoing phase's obligations are.
    pub completeness_report: String,

    /// Artifacts produced during the outgoing phase.
    #[serde(default)]
    pub deliverables_manifest: Vec<String>,

    /// Decisions made that the receiving role must know about.
    pub key_decisions: String,

    /// Issues the outgoing role is handing over.
    #[serde(default)]
    pub known_issues: Vec<KnownIssue>,

    /// Time, budget, and tooling consumed.
    pub resource_utilization: String,

    /// Concrete next steps for the receiving role.
    #[serde(default)]
    pub action_items: Vec<String>,
}

impl HandoffPayload {
    /// The first unresolved critical issue, if any.
    #[must_use]
    pub fn blocking_issue(&self) -> Option<&KnownIssue> {
        self.known_issues
            .iter()
            .find(|issue| issue.severity == IssueSeverity::Critical && !issue.resolved)
    }
}
