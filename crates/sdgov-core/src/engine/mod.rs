//! The governance engine facade.
//!
//! Exposes the command surface external collaborators call: handoff
//! submission, phase advancement, gate runs, dependency checks, progress
//! computation, and pre-action policy checks. All mutation of the phase
//! pointer and derived progress flows through here; no other code path
//! can write those fields.
//!
//! # Concurrency
//!
//! The engine has no internal scheduler; it is invoked synchronously,
//! once per external request. Concurrent actors are handled with
//! optimistic, idempotent operations rather than locks: `advance_phase`
//! re-reads the stored phase inside the write transaction and aborts
//! with a stale-state error if it moved, and handoffs and gate results
//! are append-only so concurrent writers never overwrite each other's
//! audit history. Every step of `advance_phase` before the final write
//! is side-effect-free, so a caller can retry safely.

mod error;


pub use error::EngineError;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::GovernanceConfig;
use crate::deps::{self, ChainEvaluation};
use crate::gate::{
    GateError, GateRegistry, GateResultRecord, GateRunner, RuleOutcome, Verdict,
};
use crate::handoff::{
    validate, HandoffPayload, HandoffRecord, HandoffStatus, SectionIssue,
};
use crate::policy::{ActionCategory, ActionDecision, PolicyAdvisor};
use crate::store::{now_ns, SqliteStore, StoreError};
use crate::work::{
    progress, DependencyRef, Phase, ProgressReport, WorkError, WorkItem, WorkStatus,
};

/// Parameters for creating a work item.
#[derive(Debug, Clone)]
pub struct NewWorkItem {
    /// Stable identifier.
    pub id: String,

    /// Human title.
    pub title: String,

    /// Optional classification tag for routing advisories.
    pub routing_tag: Option<String>,

    /// Prerequisites on other work items.
    pub dependencies: Vec<DependencyRef>,
}

impl NewWorkItem {
    /// A work item with no tag and no dependencies.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            routing_tag: None,
            dependencies: Vec::new(),
        }
    }
}

/// Receipt returned from a handoff submission.
#[derive(Debug, Clone, Serialize)]
pub struct HandoffReceipt {
    /// The appended handoff row.
    pub handoff_id: String,

    /// Validation outcome.
    pub status: HandoffStatus,

    /// Completeness score, 0-100.
    pub score: f64,

    /// Structured findings for remediation; empty when accepted cleanly.
    pub issues: Vec<SectionIssue>,
}

/// Why an advancement was refused.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RejectionDetail {
    /// No handoff has been submitted for this transition.
    MissingHandoff {
        /// Source phase.
        from: Phase,
        /// Target phase.
        to: Phase,
    },

    /// The most recent handoff for this transition was not accepted.
    HandoffNotAccepted {
        /// The latest handoff row.
        handoff_id: String,
        /// Its status.
        status: HandoffStatus,
        /// Its completeness score.
        score: f64,
        /// Its validation findings.
        issues: Vec<SectionIssue>,
    },

    /// The gate guarding the source phase has no passing latest result.
    GateNotPassed {
        /// The guarding gate.
        gate_id: String,
        /// Latest score, if the gate has been run at all.
        latest_score: Option<f64>,
        /// Latest verdict, if the gate has been run at all.
        latest_verdict: Option<Verdict>,
    },
}

/// Outcome of an advancement attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AdvanceOutcome {
    /// The phase pointer moved; progress was recomputed.
    Advanced {
        /// The new derived progress.
        progress: f64,
    },

    /// Unmet dependencies refuse advancement. Nothing was mutated.
    Blocked {
        /// The chain evaluation that refused.
        evaluation: ChainEvaluation,
    },

    /// Governance refuses advancement. Nothing was mutated.
    Rejected {
        /// Structured reason for remediation.
        detail: RejectionDetail,
    },
}

/// Report returned from a gate run.
#[derive(Debug, Clone, Serialize)]
pub struct GateRunReport {
    /// The gate that was run.
    pub gate_id: String,

    /// Aggregate score, 0-100.
    pub score: f64,

    /// Verdict against the pass threshold.
    pub verdict: Verdict,

    /// Per-rule outcomes in evaluation order.
    pub per_rule: Vec<RuleOutcome>,
}

/// The phase governance engine.
///
/// Owns the store handle, the configured gate registry, the check
/// runner, and the policy advisor. One instance serves any number of
/// work items.
pub struct GovernanceEngine {
    store: SqliteStore,
    gates: GateRegistry,
    runner: GateRunner,
    advisor: PolicyAdvisor,
}

impl GovernanceEngine {
    /// Builds an engine from a store, static configuration, and a check
    /// runner with the deployment's checks registered.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidDefinition`] if the configured gate
    /// definitions are structurally invalid. This is a deployment
    /// defect, surfaced before the engine serves any request.
    pub fn new(
        store: SqliteStore,
        config: GovernanceConfig,
        runner: GateRunner,
    ) -> Result<Self, GateError> {
        let gates = GateRegistry::new(config.gates)?;
        let advisor = PolicyAdvisor::new(config.profiles, config.routing);
        Ok(Self {
            store,
            gates,
            runner,
            advisor,
        })
    }

    /// Read access to the underlying store.
    #[must_use]
    pub const fn store(&self) -> &SqliteStore {
        &self.store
    }

    // -------------------------------------------------------------------
    // Authoring and terminal operators
    // -------------------------------------------------------------------

    /// Creates a work item in `draft` at the start of the ladder.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is already taken.
    pub fn create_work_item(&self, new: NewWorkItem) -> Result<WorkItem, EngineError> {
        let now = now_ns();
        let item = WorkItem {
            id: new.id,
            title: new.title,
            phase: Phase::Lead,
            status: WorkStatus::Draft,
            progress: 0.0,
            checklist_done: 0,
            checklist_total: 0,
            routing_tag: new.routing_tag,
            dependencies: new.dependencies,
            created_at_ns: now,
            updated_at_ns: now,
            archived: false,
        };
        self.store.insert_work_item(&item).map_err(map_item_err)?;
        self.store.append_audit(
            "work_item",
            &item.id,
            "created",
            &serde_json::json!({ "title": item.title }),
        )?;
        info!(work_item = %item.id, "work item created");
        Ok(item)
    }

    /// Updates the current phase's checklist counters and recomputes
    /// progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing, archived, terminal, or
    /// `done > total`.
    pub fn set_checklist(&self, item_id: &str, done: u32, total: u32) -> Result<ProgressReport, EngineError> {
        if done > total {
            return Err(EngineError::Work(WorkError::ChecklistOutOfRange {
                done,
                total,
            }));
        }
        let item = self.fetch_governed(item_id)?;
        if item.phase.is_terminal() {
            return Err(EngineError::Work(WorkError::Terminal {
                work_item_id: item.id,
                phase: item.phase,
            }));
        }
        self.store
            .update_checklist(item_id, done, total)
            .map_err(map_item_err)?;

        let mut updated = item;
        updated.checklist_done = done;
        updated.checklist_total = total;
        let report = progress::compute(&updated);
        self.store
            .write_progress(item_id, report.percent)
            .map_err(map_item_err)?;
        Ok(report)
    }

    /// Cancels a work item. Terminal: the item leaves the ladder and can
    /// never advance again.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing, archived, or already
    /// terminal.
    pub fn cancel(&self, item_id: &str) -> Result<(), EngineError> {
        let item = self.fetch_governed(item_id)?;
        if item.phase.is_terminal() {
            return Err(EngineError::Work(WorkError::Terminal {
                work_item_id: item.id,
                phase: item.phase,
            }));
        }
        self.store
            .advance_phase_cas(item_id, item.phase, Phase::Cancelled, WorkStatus::Cancelled, 0.0)
            .map_err(map_item_err)?;
        self.store.append_audit(
            "work_item",
            item_id,
            "cancelled",
            &serde_json::json!({ "from": item.phase.as_str() }),
        )?;
        info!(work_item = %item_id, from = %item.phase, "work item cancelled");
        Ok(())
    }

    /// Archives (soft-deletes) a work item. The row is retained for the
    /// audit trail but becomes invisible to governance.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing.
    pub fn archive(&self, item_id: &str) -> Result<(), EngineError> {
        self.store.archive_work_item(item_id).map_err(map_item_err)?;
        self.store.append_audit(
            "work_item",
            item_id,
            "archived",
            &serde_json::json!({}),
        )?;
        info!(work_item = %item_id, "work item archived");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Command surface
    // -------------------------------------------------------------------

    /// Submits a handoff for the `from -> to` transition of a work item.
    ///
    /// The submission is validated synchronously: the row is appended as
    /// `pending`, scored, and finalized to `accepted` or `rejected` in
    /// the same call. Acceptance is a side effect of passing validation.
    /// Re-submission after rejection appends a fresh row; earlier rows
    /// are history.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing, archived, or terminal,
    /// or if the transition is not a ladder step. Validation failures
    /// are not errors: they come back as a `rejected` receipt with the
    /// issue list.
    pub fn submit_handoff(
        &self,
        item_id: &str,
        from: Phase,
        to: Phase,
        payload: HandoffPayload,
    ) -> Result<HandoffReceipt, EngineError> {
        let item = self.fetch_governed(item_id)?;
        if item.phase.is_terminal() {
            return Err(EngineError::Work(WorkError::Terminal {
                work_item_id: item.id,
                phase: item.phase,
            }));
        }
        if from.successor() != Some(to) {
            return Err(EngineError::Work(WorkError::TransitionNotAllowed { from, to }));
        }

        if self.store.pending_handoff_exists(item_id, from, to)? {
            // A pending row can only be left behind by a writer that
            // crashed between insert and finalization; the new
            // submission supersedes it on the latest-wins read path.
            warn!(
                work_item = %item_id,
                from = %from,
                to = %to,
                "orphaned pending handoff found for this transition"
            );
        }

        let record = HandoffRecord {
            id: Uuid::new_v4().to_string(),
            work_item_id: item_id.to_string(),
            from_phase: from,
            to_phase: to,
            status: HandoffStatus::Pending,
            payload,
            score: 0.0,
            issues: Vec::new(),
            created_at_ns: now_ns(),
            accepted_at_ns: None,
        };
        self.store.insert_handoff(&record)?;

        let validation = validate(&record.payload, to);
        let status = if validation.accepted {
            HandoffStatus::Accepted
        } else {
            HandoffStatus::Rejected
        };
        let accepted_at_ns = validation.accepted.then(now_ns);
        self.store.finalize_handoff(
            &record.id,
            status,
            validation.score,
            &validation.issues,
            accepted_at_ns,
        )?;

        self.store.append_audit(
            "handoff",
            &record.id,
            "handoff_submitted",
            &serde_json::json!({
                "work_item": item_id,
                "from": from.as_str(),
                "to": to.as_str(),
                "status": status.as_str(),
                "score": validation.score,
            }),
        )?;
        info!(
            work_item = %item_id,
            handoff = %record.id,
            from = %from,
            to = %to,
            score = validation.score,
            status = status.as_str(),
            "handoff submitted"
        );

        Ok(HandoffReceipt {
            handoff_id: record.id,
            status,
            score: validation.score,
            issues: validation.issues,
        })
    }

    /// Attempts to advance a work item's phase pointer.
    ///
    /// Order of checks: current-phase match, dependency chain, handoff
    /// acceptance, guarding gate, then the compare-and-swap write.
    /// Everything before the write is side-effect-free.
    ///
    /// # Errors
    ///
    /// Returns a stale-state error if the stored phase does not match
    /// `from` (at entry or at write time), a transition error if
    /// `from -> to` is not a ladder step, and store errors verbatim.
    /// Blocked dependencies and governance refusals are outcomes, not
    /// errors.
    pub fn advance_phase(
        &self,
        item_id: &str,
        from: Phase,
        to: Phase,
    ) -> Result<AdvanceOutcome, EngineError> {
        let item = self.fetch_governed(item_id)?;
        if item.phase != from {
            return Err(EngineError::Work(WorkError::StaleState {
                work_item_id: item.id,
                expected: from,
                actual: item.phase,
            }));
        }
        if from.successor() != Some(to) {
            return Err(EngineError::Work(WorkError::TransitionNotAllowed { from, to }));
        }

        let evaluation = deps::evaluate(&self.store, &item)?;
        if !evaluation.can_proceed {
            info!(
                work_item = %item_id,
                reason = %evaluation.reason,
                "advance blocked by dependencies"
            );
            return Ok(AdvanceOutcome::Blocked { evaluation });
        }

        let Some(handoff) = self.store.latest_handoff(item_id, from, to)? else {
            return Ok(AdvanceOutcome::Rejected {
                detail: RejectionDetail::MissingHandoff { from, to },
            });
        };
        if handoff.status != HandoffStatus::Accepted {
            return Ok(AdvanceOutcome::Rejected {
                detail: RejectionDetail::HandoffNotAccepted {
                    handoff_id: handoff.id,
                    status: handoff.status,
                    score: handoff.score,
                    issues: handoff.issues,
                },
            });
        }

        for gate in self.gates.bound_to(from) {
            let latest = self.store.latest_gate_result(&gate.id, item_id)?;
            let passed = latest
                .as_ref()
                .is_some_and(|result| result.verdict == Verdict::Pass);
            if !passed {
                return Ok(AdvanceOutcome::Rejected {
                    detail: RejectionDetail::GateNotPassed {
                        gate_id: gate.id.clone(),
                        latest_score: latest.as_ref().map(|r| r.score),
                        latest_verdict: latest.map(|r| r.verdict),
                    },
                });
            }
        }

        let mut advanced = item;
        advanced.phase = to;
        advanced.checklist_done = 0;
        advanced.checklist_total = 0;
        let report = progress::compute(&advanced);
        let status = if to == Phase::Completed {
            WorkStatus::Completed
        } else {
            WorkStatus::Active
        };
        self.store
            .advance_phase_cas(item_id, from, to, status, report.percent)
            .map_err(map_item_err)?;

        self.store.append_audit(
            "work_item",
            item_id,
            "phase_advanced",
            &serde_json::json!({
                "from": from.as_str(),
                "to": to.as_str(),
                "progress": report.percent,
            }),
        )?;
        info!(
            work_item = %item_id,
            from = %from,
            to = %to,
            progress = report.percent,
            "phase advanced"
        );

        Ok(AdvanceOutcome::Advanced {
            progress: report.percent,
        })
    }

    /// Runs a configured gate against a work item and persists the
    /// result.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown gate id or an
    /// unbound rule; individual check failures are contained per rule
    /// and never abort the run.
    pub async fn run_gate(&self, gate_id: &str, item_id: &str) -> Result<GateRunReport, EngineError> {
        let def = self.gates.get(gate_id)?;
        let item = self.fetch_governed(item_id)?;

        let outcome = self.runner.run(def, &item).await?;
        let record = GateResultRecord {
            id: Uuid::new_v4().to_string(),
            gate_id: gate_id.to_string(),
            work_item_id: item_id.to_string(),
            score: outcome.score,
            verdict: outcome.verdict,
            rule_outcomes: outcome.rule_outcomes.clone(),
            created_at_ns: now_ns(),
        };
        self.store.insert_gate_result(&record)?;
        self.store.append_audit(
            "gate",
            &record.id,
            "gate_run",
            &serde_json::json!({
                "gate": gate_id,
                "work_item": item_id,
                "score": outcome.score,
                "verdict": outcome.verdict.as_str(),
            }),
        )?;

        Ok(GateRunReport {
            gate_id: gate_id.to_string(),
            score: outcome.score,
            verdict: outcome.verdict,
            per_rule: outcome.rule_outcomes,
        })
    }

    /// Evaluates a work item's dependency chain. Read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing or archived.
    pub fn check_dependencies(&self, item_id: &str) -> Result<ChainEvaluation, EngineError> {
        let item = self.fetch_governed(item_id)?;
        Ok(deps::evaluate(&self.store, &item)?)
    }

    /// Computes (and persists) a work item's derived progress.
    ///
    /// Idempotent: the persisted value is the derived value, every time.
    ///
    /// # Errors
    ///
    /// Returns an error if the item is missing or archived.
    pub fn compute_progress(&self, item_id: &str) -> Result<ProgressReport, EngineError> {
        let item = self.fetch_governed(item_id)?;
        let report = progress::compute(&item);
        self.store
            .write_progress(item_id, report.percent)
            .map_err(map_item_err)?;
        Ok(report)
    }

    /// Pre-action tool-policy and routing check. Never touches the
    /// store.
    #[must_use]
    pub fn check_action(
        &self,
        actor_role: &str,
        category: ActionCategory,
        intent: &str,
    ) -> ActionDecision {
        self.advisor.check_action(actor_role, category, intent)
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    /// Fetches a work item, refusing archived rows.
    fn fetch_governed(&self, item_id: &str) -> Result<WorkItem, EngineError> {
        let item = self.store.fetch_work_item(item_id).map_err(map_item_err)?;
        if item.archived {
            return Err(EngineError::Work(WorkError::Archived {
                work_item_id: item.id,
            }));
        }
        Ok(item)
    }
}

/// Maps store-level item errors onto the work error taxonomy.
fn map_item_err(err: StoreError) -> EngineError {
    match err {
        StoreError::WorkItemNotFound { work_item_id } => {
            EngineError::Work(WorkError::NotFound { work_item_id })
        }
        StoreError::WorkItemExists { work_item_id } => {
            EngineError::Work(WorkError::AlreadyExists { work_item_id })
        }
        StoreError::PhaseConflict {
            work_item_id,
            expected,
            actual,
        } => EngineError::Work(WorkError::StaleState {
            work_item_id,
            expected,
            actual,
        }),
        other => EngineError::Store(other),
    }
}
