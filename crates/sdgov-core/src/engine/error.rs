//! Engine error type.

use thiserror::Error;

use crate::gate::GateError;
use crate::store::StoreError;
use crate::work::WorkError;

/// Errors surfaced by the engine's command surface.
///
/// Validation failures and dependency blocks are *not* errors: they
/// come back as structured outcomes so the caller can remediate without
/// re-deriving the cause. Errors here mean the request itself cannot be
/// served: unknown or stale state, a broken deployment configuration,
/// or a store failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Work item lifecycle error (missing, stale, terminal, archived).
    #[error(transparent)]
    Work(#[from] WorkError),

    /// Configuration defect (unknown gate, unbound rule, bad
    /// definition). Fatal: indicates a broken deployment rather than a
    /// transient condition.
    #[error(transparent)]
    Gate(#[from] GateError),
}
