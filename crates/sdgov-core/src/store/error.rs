//! Store error types.

use thiserror::Error;

use crate::work::Phase;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Database error from `SQLite`.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON (de)serialization failure for a stored column.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Work item already exists.
    #[error("work item already exists: {work_item_id}")]
    WorkItemExists {
        /// The work item ID that already exists.
        work_item_id: String,
    },

    /// Work item not found.
    #[error("work item not found: {work_item_id}")]
    WorkItemNotFound {
        /// The work item ID that was not found.
        work_item_id: String,
    },

    /// Compare-and-swap phase write found a different stored phase.
    ///
    /// Surfaced to the caller for retry; the store never retries on its
    /// own.
    #[error("phase conflict for {work_item_id}: expected {expected}, found {actual}")]
    PhaseConflict {
        /// The work item ID.
        work_item_id: String,
        /// The phase the writer expected to replace.
        expected: Phase,
        /// The phase actually stored.
        actual: Phase,
    },

    /// A stored column holds a value the engine cannot interpret.
    #[error("corrupt stored value in {column}: {value}")]
    Corrupt {
        /// The offending column.
        column: String,
        /// The uninterpretable value.
        value: String,
    },
}
