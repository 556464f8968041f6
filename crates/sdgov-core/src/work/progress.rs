//! Derived progress computation.
//!
//! Progress is always the weighted sum of completed-phase contributions
//! plus fractional credit for the in-progress phase's checklist. The
//! computation is pure: same stored state, same result. A work item whose
//! phase pointer is `COMPLETED` reports exactly 100, and nothing else
//! does.

use super::state::{Phase, WorkItem, PHASE_LADDER};

/// Largest share of a phase's weight the checklist alone may earn.
///
/// The final slice of every phase is granted only by the phase advance
/// itself, so an in-progress phase with a fully checked list still
/// reports strictly below its full weight and overall progress reaches
/// 100 only through the `COMPLETED` pointer.
pub const MAX_CHECKLIST_CREDIT: f64 = 0.95;

/// One phase's contribution to overall progress.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PhaseProgress {
    /// The ladder phase.
    pub phase: Phase,
    /// The phase's fixed weight.
    pub weight: f64,
    /// Whether the phase is strictly complete.
    pub complete: bool,
    /// Contributed points (weight when complete, fractional when
    /// in progress, zero otherwise).
    pub contribution: f64,
}

/// Derived progress for a work item.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ProgressReport {
    /// Overall progress, 0-100.
    pub percent: f64,
    /// Per-phase breakdown in ladder order.
    pub by_phase: Vec<PhaseProgress>,
}

/// Computes the derived progress of `item`.
///
/// A phase contributes its full weight when the pointer has moved past
/// it, fractional checklist credit (capped at [`MAX_CHECKLIST_CREDIT`]
/// of the weight) when it is the current phase, and nothing otherwise.
/// `COMPLETED` yields exactly 100; `CANCELLED` yields zero (a cancelled
/// directive delivers nothing).
#[must_use]
pub fn compute(item: &WorkItem) -> ProgressReport {
    if item.phase == Phase::Completed {
        let by_phase = PHASE_LADDER
            .iter()
            .map(|&phase| PhaseProgress {
                phase,
                weight: phase.weight(),
                complete: true,
                contribution: phase.weight(),
            })
            .collect();
        // The ladder weights sum to 100 by construction; report the
        // constant rather than re-summing floats.
        return ProgressReport {
            percent: 100.0,
            by_phase,
        };
    }

    if item.phase == Phase::Cancelled {
        let by_phase = PHASE_LADDER
            .iter()
            .map(|&phase| PhaseProgress {
                phase,
                weight: phase.weight(),
                complete: false,
                contribution: 0.0,
            })
            .collect();
        return ProgressReport {
            percent: 0.0,
            by_phase,
        };
    }

    let current = item.phase.ordinal();
    let mut percent = 0.0;
    let by_phase: Vec<PhaseProgress> = PHASE_LADDER
        .iter()
        .map(|&phase| {
            let weight = phase.weight();
            let (complete, contribution) = if phase.ordinal() < current {
                (true, weight)
            } else if phase.ordinal() == current && item.checklist_total > 0 {
                let fraction =
                    f64::from(item.checklist_done.min(item.checklist_total))
                        / f64::from(item.checklist_total);
                (false, weight * fraction.min(MAX_CHECKLIST_CREDIT))
            } else {
                (false, 0.0)
            };
            percent += contribution;
            PhaseProgress {
                phase,
                weight,
                complete,
                contribution,
            }
        })
        .collect();

    ProgressReport { percent, by_phase }
}
