//! Tool-policy enforcement and routing advisories.
//!
//! A synchronous pre-action check, independent of and prior to the phase
//! state machine. Three checks run with distinct severities, modeled as
//! separately testable units rather than one monolithic pass:
//!
//! 1. **Hard deny**: a closed set of action categories is
//!    unconditionally rejected. The only check that can veto an action.
//! 2. **Policy-profile check**: a restricted role acting outside its
//!    allow-list is logged as a warning, never blocked. The allow-list
//!    is enforced structurally elsewhere (the role is never offered the
//!    disallowed action); this check detects configuration drift.
//! 3. **Routing advisory**: the action's intent text is matched against
//!    routing rules; at most one non-blocking delegation hint is
//!    emitted, first match wins.
//!
//! A hard-denied action short-circuits: no profile warning, no routing
//! hint.

mod advisor;
mod schema;

#[cfg(test)]
mod tests;

pub use advisor::{ActionDecision, PolicyAdvisor, RoutingHint, HARD_DENIED};
pub use schema::{ActionCategory, RoutingRule, ToolPolicyProfile};
