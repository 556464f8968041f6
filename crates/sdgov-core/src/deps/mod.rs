//! Cross-item dependency chain resolution.
//!
//! A work item may declare prerequisites on other work items: a minimum
//! phase, a minimum progress, or both. Resolution is read-only with
//! respect to the referenced items and produces a transient evaluation,
//! never persisted and never cached beyond the call.
//!
//! A missing, cancelled, or archived referent is a *permanently*
//! blocking dependency: no amount of waiting can satisfy it, and it is
//! never silently ignored.

mod wait;

pub use wait::{wait_for_dependency, WaitOutcome};

use serde::Serialize;
use tracing::debug;

use crate::store::{SqliteStore, StoreError};
use crate::work::{DependencyRef, Phase, WorkItem};

/// Why a dependency is unmet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum UnmetReason {
    /// The referenced work item does not exist.
    Missing,
    /// The referenced work item was cancelled.
    Cancelled,
    /// The referenced work item was archived.
    Archived,
    /// The referent has not reached the required phase.
    PhaseBelow {
        /// Phase the dependency requires.
        required: Phase,
        /// Phase the referent is actually in.
        actual: Phase,
    },
    /// The referent has not reached the required progress.
    ProgressBelow {
        /// Progress the dependency requires.
        required: f64,
        /// Progress the referent has actually reached.
        actual: f64,
    },
}

impl UnmetReason {
    /// Whether waiting can never satisfy this reason.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Missing | Self::Cancelled | Self::Archived)
    }
}

impl std::fmt::Display for UnmetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("referenced work item does not exist"),
            Self::Cancelled => f.write_str("referenced work item was cancelled"),
            Self::Archived => f.write_str("referenced work item was archived"),
            Self::PhaseBelow { required, actual } => {
                write!(f, "phase {actual} has not reached {required}")
            }
            Self::ProgressBelow { required, actual } => {
                write!(f, "progress {actual:.1} has not reached {required:.1}")
            }
        }
    }
}

/// One unmet prerequisite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmetDependency {
    /// The referenced work item.
    pub work_item_id: String,

    /// Why it is unmet.
    pub reason: UnmetReason,
}

/// Transient output of one chain evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainEvaluation {
    /// Whether advancement may proceed now.
    pub can_proceed: bool,

    /// Every unmet prerequisite, in declaration order.
    pub blocked_by: Vec<UnmetDependency>,

    /// Human-readable summary.
    pub reason: String,
}

/// Checks one dependency reference against the store.
///
/// Returns `None` when the dependency is satisfied.
///
/// # Errors
///
/// Returns an error only on store failure; an absent referent is an
/// unmet dependency, not an error.
pub fn check_ref(
    store: &SqliteStore,
    dep: &DependencyRef,
) -> Result<Option<UnmetDependency>, StoreError> {
    let unmet = |reason| {
        Some(UnmetDependency {
            work_item_id: dep.work_item_id.clone(),
            reason,
        })
    };

    let Some(referent) = store.try_fetch_work_item(&dep.work_item_id)? else {
        return Ok(unmet(UnmetReason::Missing));
    };
    if referent.archived {
        return Ok(unmet(UnmetReason::Archived));
    }
    if referent.phase == Phase::Cancelled {
        return Ok(unmet(UnmetReason::Cancelled));
    }
    if let Some(required) = dep.min_phase {
        if !referent.phase.meets_minimum(required) {
            return Ok(unmet(UnmetReason::PhaseBelow {
                required,
                actual: referent.phase,
            }));
        }
    }
    if let Some(required) = dep.min_progress {
        if referent.progress < required {
            return Ok(unmet(UnmetReason::ProgressBelow {
                required,
                actual: referent.progress,
            }));
        }
    }
    Ok(None)
}

/// Evaluates the full dependency chain of `item`.
///
/// An empty chain proceeds immediately. Otherwise each reference is
/// checked against the referent's current phase and progress; any unmet
/// entry blocks.
///
/// # Errors
///
/// Returns an error only on store failure.
pub fn evaluate(store: &SqliteStore, item: &WorkItem) -> Result<ChainEvaluation, StoreError> {
    if item.dependencies.is_empty() {
        return Ok(ChainEvaluation {
            can_proceed: true,
            blocked_by: Vec::new(),
            reason: "no dependencies declared".to_string(),
        });
    }

    let mut blocked_by = Vec::new();
    for dep in &item.dependencies {
        if let Some(unmet) = check_ref(store, dep)? {
            blocked_by.push(unmet);
        }
    }

    let can_proceed = blocked_by.is_empty();
    let reason = if can_proceed {
        format!("all {} dependencies satisfied", item.dependencies.len())
    } else {
        let summary: Vec<String> = blocked_by
            .iter()
            .map(|u| format!("{} ({})", u.work_item_id, u.reason))
            .collect();
        format!("blocked by {}", summary.join(", "))
    };

    debug!(
        work_item = %item.id,
        can_proceed,
        blocked = blocked_by.len(),
        "dependency chain evaluated"
    );

    Ok(ChainEvaluation {
        can_proceed,
        blocked_by,
        reason,
    })
}
