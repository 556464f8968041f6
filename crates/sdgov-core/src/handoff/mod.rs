//! Handoff governance: the transfer-of-responsibility protocol between
//! phases.
//!
//! A handoff is a structured document the outgoing role must produce
//! before the phase pointer may cross a boundary. Validation is pure and
//! synchronous: a submission is scored, accepted or rejected on the spot,
//! and stored append-only. Acceptance is a side effect of passing
//! validation; there is no manual flag to flip, which removes the
//! "accepted-but-invalid" class of defects.
//!
//! The state machine only ever consults the most recent handoff for a
//! given `(work item, from, to)` tuple; earlier rows are history.

mod payload;
mod validator;

#[cfg(test)]
mod tests;

pub use payload::{HandoffPayload, IssueSeverity, KnownIssue};
pub use validator::{
    validate, HandoffValidation, SectionIssue, SectionIssueKind, ACCEPTANCE_THRESHOLD,
    MIN_SECTION_LEN, SECTION_COUNT,
};

use serde::{Deserialize, Serialize};

use crate::work::Phase;

/// Status of one handoff submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffStatus {
    /// Created but not yet decided. Only ever observed if a writer
    /// crashed between insert and validation finalization.
    Pending,
    /// Passed validation; the transition it documents may proceed.
    Accepted,
    /// Failed validation; a fresh submission is required.
    Rejected,
}

impl HandoffStatus {
    /// Canonical string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for HandoffStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("invalid handoff status: {other}")),
        }
    }
}

/// One stored handoff submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffRecord {
    /// Row identifier.
    pub id: String,

    /// Owning work item.
    pub work_item_id: String,

    /// Phase the outgoing role is leaving.
    pub from_phase: Phase,

    /// Phase the receiving role will own.
    pub to_phase: Phase,

    /// Validation outcome.
    pub status: HandoffStatus,

    /// The submitted document.
    pub payload: HandoffPayload,

    /// Completeness score, 0-100.
    pub score: f64,

    /// Structured issue list from validation (empty when accepted).
    pub issues: Vec<SectionIssue>,

    /// Creation timestamp, nanoseconds since the Unix epoch.
    pub created_at_ns: u64,

    /// Acceptance timestamp, set only for accepted handoffs.
    pub accepted_at_ns: Option<u64>,
}
