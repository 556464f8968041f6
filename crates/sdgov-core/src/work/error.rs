//! Work module error types.

use thiserror::Error;

use super::state::Phase;

/// Errors that can occur during work lifecycle operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WorkError {
    /// Work item already exists.
    #[error("work item already exists: {work_item_id}")]
    AlreadyExists {
        /// The work item ID that already exists.
        work_item_id: String,
    },

    /// Work item not found.
    #[error("work item not found: {work_item_id}")]
    NotFound {
        /// The work item ID that was not found.
        work_item_id: String,
    },

    /// The item's stored phase no longer matches the caller's expectation.
    ///
    /// Surfaced for caller retry; the engine never retries on its own.
    #[error("stale state for {work_item_id}: expected phase {expected}, found {actual}")]
    StaleState {
        /// The work item ID.
        work_item_id: String,
        /// The phase the caller expected.
        expected: Phase,
        /// The phase actually stored.
        actual: Phase,
    },

    /// The requested transition is not an allowed ladder step.
    #[error("transition from {from} to {to} is not allowed")]
    TransitionNotAllowed {
        /// The current phase.
        from: Phase,
        /// The attempted target phase.
        to: Phase,
    },

    /// Operation attempted on a terminal (completed/cancelled) item.
    #[error("work item {work_item_id} is terminal in phase {phase}")]
    Terminal {
        /// The work item ID.
        work_item_id: String,
        /// The terminal phase.
        phase: Phase,
    },

    /// Operation attempted on an archived item.
    #[error("work item {work_item_id} is archived")]
    Archived {
        /// The work item ID.
        work_item_id: String,
    },

    /// Invalid phase string.
    #[error("invalid phase: {value}")]
    InvalidPhase {
        /// The invalid phase string.
        value: String,
    },

    /// Invalid status string.
    #[error("invalid work status: {value}")]
    InvalidStatus {
        /// The invalid status string.
        value: String,
    },

    /// Checklist counters out of range.
    #[error("checklist done {done} exceeds total {total}")]
    ChecklistOutOfRange {
        /// Completed item count.
        done: u32,
        /// Total item count.
        total: u32,
    },
}
