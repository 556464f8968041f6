//! Weighted quality-gate scoring.
//!
//! A gate is a named checkpoint bound to a delivery phase: an ordered set
//! of weighted rules, each backed by a check function that inspects live
//! repository or execution state. A gate run executes every check,
//! aggregates a 0-100 score, and persists an append-only result row.
//!
//! # Containment
//!
//! One broken check must never abort a gate run. Checks execute under a
//! hard timeout; a check that errors is recorded as `fail` with the error
//! message as evidence, and a check that times out is recorded as `fail`
//! with evidence `"timed out"`. Only configuration defects (unknown gate,
//! rule with no registered check, zero total weight) abort the run: they
//! indicate a broken deployment, not a transient condition.
//!
//! # Verdict
//!
//! `score = sum(weight_i * passed_i) / sum(weight_i) * 100`, evaluated in
//! rule definition order (aggregation is commutative; order affects only
//! the evidence log). The verdict is `Pass` iff the score reaches the 85%
//! threshold and no `required` rule failed; a failing required rule
//! forces `Fail` regardless of the aggregate.

mod error;
mod registry;
mod runner;


pub use error::{CheckError, GateError};
pub use registry::{GateDefinition, GateRegistry, Rule};
pub use runner::{
    CheckContext, CheckFuture, CheckOutcome, FnCheck, GateRunOutcome, GateRunner, RuleCheck,
    DEFAULT_CHECK_TIMEOUT, PASS_THRESHOLD,
};

use serde::{Deserialize, Serialize};

/// Verdict of a gate run against the pass threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Score reached the threshold and every required rule passed.
    Pass,
    /// Score fell short, or a required rule failed.
    Fail,
}

impl Verdict {
    /// Canonical string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            other => Err(format!("invalid verdict: {other}")),
        }
    }
}

/// One rule's outcome within a gate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Rule name.
    pub rule: String,

    /// Rule weight at evaluation time.
    pub weight: f64,

    /// Whether the rule was marked required.
    pub required: bool,

    /// Whether the check passed.
    pub passed: bool,

    /// Short evidence string captured from the check.
    pub evidence: String,
}

/// One persisted gate scoring run.
///
/// Rows are append-only; the latest per `(gate, work item)` is
/// authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResultRecord {
    /// Row identifier.
    pub id: String,

    /// The gate that was run.
    pub gate_id: String,

    /// The work item the run certified.
    pub work_item_id: String,

    /// Aggregate score, 0-100.
    pub score: f64,

    /// Verdict against the pass threshold.
    pub verdict: Verdict,

    /// Per-rule outcomes in evaluation order.
    pub rule_outcomes: Vec<RuleOutcome>,

    /// Run timestamp, nanoseconds since the Unix epoch.
    pub created_at_ns: u64,
}
