//! Phase governance engine for staged software delivery.
//!
//! Work items move through an ordered set of delivery phases
//! (`LEAD -> PLAN -> EXEC -> PLAN_VERIFICATION -> LEAD_FINAL_APPROVAL ->
//! COMPLETED`), each executed by a distinct role. Advancement between
//! phases is gated by signed-off handoff documents, scored quality
//! gates, and cross-item dependency resolution.
//!
//! # Components
//!
//! - [`store`]: data access layer over an external `SQLite` store, with
//!   the latest-wins tie-break and append-only audit trail
//! - [`work`]: the work item model: phases, statuses, derived progress
//! - [`handoff`]: seven-section handoff validation and scoring
//! - [`gate`]: weighted quality-gate scoring with per-check timeout
//!   containment
//! - [`deps`]: cross-item dependency chain resolution and cancellable
//!   polling waits
//! - [`policy`]: hard-deny / advisory-warn / routing-hint pre-action
//!   checks
//! - [`config`]: TOML configuration for gates, routing, and profiles
//! - [`engine`]: the facade external collaborators call
//!
//! # Example
//!
//! ```rust
//! use sdgov_core::config::GovernanceConfig;
//! use sdgov_core::engine::{GovernanceEngine, NewWorkItem};
//! use sdgov_core::gate::GateRunner;
//! use sdgov_core::store::SqliteStore;
//!
//! let store = SqliteStore::in_memory().unwrap();
//! let engine = GovernanceEngine::new(
//!     store,
//!     GovernanceConfig::default(),
//!     GateRunner::new(),
//! )
//! .unwrap();
//!
//! let item = engine
//!     .create_work_item(NewWorkItem::new("SD-001", "Ship the retry queue"))
//!     .unwrap();
//! assert_eq!(item.progress, 0.0);
//! ```

pub mod config;
pub mod deps;
pub mod engine;
pub mod gate;
pub mod handoff;
pub mod policy;
pub mod store;
pub mod work;

pub use engine::{AdvanceOutcome, EngineError, GovernanceEngine, NewWorkItem};
