//! `SQLite`-backed data access layer.
//!
//! The engine consumes an external relational store through this module:
//! four logical tables (work items, handoffs, gate results, and the
//! append-only audit log), each keyed by a stable identifier, supporting
//! filtered reads and single-row inserts/updates. No schema-altering
//! operation is issued at runtime beyond the deployment schema bootstrap.
//!
//! # Latest-wins tie-break
//!
//! Everywhere a "latest" row is read (handoffs, gate results), the rule
//! is: highest `created_at_ns`, ties broken by insertion order
//! (`rowid`). The rule lives here, in one place, rather than ad hoc at
//! call sites.
//!
//! # Encapsulation
//!
//! The phase pointer and derived progress of a work item are written
//! only through `pub(crate)` methods, so every mutation path runs
//! through the engine's advance/progress routines. Handoffs and gate
//! results are insert-only: concurrent writers append, they never
//! overwrite each other's audit history.

mod error;
mod sqlite;


pub use error::StoreError;
pub use sqlite::{AuditEntry, SqliteStore};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in nanoseconds since the Unix epoch.
///
/// Clamped to zero if the clock reads before the epoch.
#[must_use]
pub(crate) fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
