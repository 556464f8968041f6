//! Gate module error types.

use thiserror::Error;

/// Errors that abort a gate run.
///
/// These are configuration defects surfaced immediately; transient check
/// failures never produce a `GateError`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GateError {
    /// No gate with this identifier is configured.
    #[error("unknown gate: {gate_id}")]
    UnknownGate {
        /// The unknown gate identifier.
        gate_id: String,
    },

    /// A configured rule has no registered check function.
    #[error("gate {gate_id}: no check registered for rule '{rule}'")]
    UnknownRule {
        /// The gate being run.
        gate_id: String,
        /// The rule with no check binding.
        rule: String,
    },

    /// The gate definition cannot be scored.
    #[error("gate {gate_id}: {reason}")]
    InvalidDefinition {
        /// The offending gate identifier.
        gate_id: String,
        /// Why the definition is unusable.
        reason: String,
    },
}

/// Error returned by a check function.
///
/// Contained per rule by the runner: converted to a `fail` outcome with
/// the message as evidence, never propagated out of a gate run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CheckError {
    /// I/O failure while inspecting external state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other check failure.
    #[error("{0}")]
    Other(String),
}

impl CheckError {
    /// A check failure with a free-form message.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
