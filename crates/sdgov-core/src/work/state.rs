//! Work item state types: phases, statuses, and dependency references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::WorkError;

/// The ordered, non-terminal delivery phases.
///
/// Used to iterate the ladder in definition order; terminal phases
/// (`Completed`, `Cancelled`) are not part of the weighted ladder.
pub const PHASE_LADDER: [Phase; 5] = [
    Phase::Lead,
    Phase::Plan,
    Phase::Exec,
    Phase::PlanVerification,
    Phase::LeadFinalApproval,
];

/// A delivery phase in the governance lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Strategic framing and priority justification.
    Lead,
    /// Technical planning and requirement definition.
    Plan,
    /// Implementation.
    Exec,
    /// Supervisor verification of the implementation.
    PlanVerification,
    /// Final human approval.
    LeadFinalApproval,
    /// All phases complete. Terminal.
    Completed,
    /// Abandoned. Terminal.
    Cancelled,
}

impl Phase {
    /// Progress weight this phase contributes when complete.
    ///
    /// The five ladder weights sum to exactly 100; terminal phases carry
    /// no weight of their own.
    #[must_use]
    pub const fn weight(self) -> f64 {
        match self {
            Self::Lead | Self::Plan => 20.0,
            Self::Exec => 30.0,
            Self::PlanVerification | Self::LeadFinalApproval => 15.0,
            Self::Completed | Self::Cancelled => 0.0,
        }
    }

    /// Position on the ladder, with terminal phases ordered last.
    ///
    /// `Completed` ranks above every ladder phase so that "phase >= EXEC"
    /// style minimums are satisfied by finished work. `Cancelled` has no
    /// rank and never satisfies a minimum; see [`Phase::meets_minimum`].
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Lead => 0,
            Self::Plan => 1,
            Self::Exec => 2,
            Self::PlanVerification => 3,
            Self::LeadFinalApproval => 4,
            Self::Completed => 5,
            Self::Cancelled => u8::MAX,
        }
    }

    /// The phase that follows this one on the ladder, if any.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Lead => Some(Self::Plan),
            Self::Plan => Some(Self::Exec),
            Self::Exec => Some(Self::PlanVerification),
            Self::PlanVerification => Some(Self::LeadFinalApproval),
            Self::LeadFinalApproval => Some(Self::Completed),
            Self::Completed | Self::Cancelled => None,
        }
    }

    /// Whether this phase is terminal (no further transitions).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether this phase satisfies a `min` phase requirement.
    ///
    /// Cancelled work never satisfies a minimum: a dependency on a
    /// cancelled item is permanently unmet.
    #[must_use]
    pub fn meets_minimum(self, min: Self) -> bool {
        self != Self::Cancelled && self.ordinal() >= min.ordinal()
    }

    /// Canonical string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "LEAD",
            Self::Plan => "PLAN",
            Self::Exec => "EXEC",
            Self::PlanVerification => "PLAN_VERIFICATION",
            Self::LeadFinalApproval => "LEAD_FINAL_APPROVAL",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = WorkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEAD" => Ok(Self::Lead),
            "PLAN" => Ok(Self::Plan),
            "EXEC" => Ok(Self::Exec),
            "PLAN_VERIFICATION" => Ok(Self::PlanVerification),
            "LEAD_FINAL_APPROVAL" => Ok(Self::LeadFinalApproval),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(WorkError::InvalidPhase {
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Created by an authoring collaborator, not yet governed.
    Draft,
    /// Moving through the phase ladder.
    Active,
    /// Advancement currently refused by the dependency resolver.
    Blocked,
    /// Reached `COMPLETED`.
    Completed,
    /// Cancelled by a terminal operator.
    Cancelled,
}

impl WorkStatus {
    /// Canonical string form, matching the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkStatus {
    type Err = WorkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "blocked" => Ok(Self::Blocked),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(WorkError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// A prerequisite on another work item.
///
/// All bounds that are present must hold for the dependency to be
/// satisfied. A reference with neither bound is satisfied by the mere
/// existence of a non-cancelled referent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRef {
    /// Identifier of the prerequisite work item.
    pub work_item_id: String,

    /// Minimum phase the referent must have reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_phase: Option<Phase>,

    /// Minimum overall progress (0-100) the referent must have reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_progress: Option<f64>,
}

impl DependencyRef {
    /// Dependency requiring the referent to have reached `min_phase`.
    #[must_use]
    pub fn on_phase(work_item_id: impl Into<String>, min_phase: Phase) -> Self {
        Self {
            work_item_id: work_item_id.into(),
            min_phase: Some(min_phase),
            min_progress: None,
        }
    }

    /// Dependency requiring the referent to have reached `min_progress`.
    #[must_use]
    pub fn on_progress(work_item_id: impl Into<String>, min_progress: f64) -> Self {
        Self {
            work_item_id: work_item_id.into(),
            min_phase: None,
            min_progress: Some(min_progress),
        }
    }
}

/// A governed unit of work.
///
/// The phase pointer and `progress` are mutated only by the engine's
/// advance/progress routines; every other field is owned by the authoring
/// collaborator that created the item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Stable identifier.
    pub id: String,

    /// Human title.
    pub title: String,

    /// Current phase pointer.
    pub phase: Phase,

    /// Lifecycle status.
    pub status: WorkStatus,

    /// Derived overall progress (0-100). Never hand-set.
    pub progress: f64,

    /// Completed checklist items for the current phase.
    pub checklist_done: u32,

    /// Total checklist items for the current phase (0 = no checklist).
    pub checklist_total: u32,

    /// Free-form classification tag, used only for routing advisories.
    pub routing_tag: Option<String>,

    /// Prerequisites that must be satisfied before advancement.
    pub dependencies: Vec<DependencyRef>,

    /// Creation timestamp, nanoseconds since the Unix epoch.
    pub created_at_ns: u64,

    /// Last-update timestamp, nanoseconds since the Unix epoch.
    pub updated_at_ns: u64,

    /// Soft-delete marker. Archived items are invisible to governance.
    pub archived: bool,
}

impl WorkItem {
    /// Creates a draft work item at the start of the ladder.
    #[must_use]
    pub fn draft(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            phase: Phase::Lead,
            status: WorkStatus::Draft,
            progress: 0.0,
            checklist_done: 0,
            checklist_total: 0,
            routing_tag: None,
            dependencies: Vec::new(),
            created_at_ns: 0,
            updated_at_ns: 0,
            archived: false,
        }
    }

    /// Whether the item is still subject to governance.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.archived
            && !matches!(self.status, WorkStatus::Cancelled)
            && !matches!(self.phase, Phase::Cancelled)
    }
}
