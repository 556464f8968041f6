//! Gate execution: check dispatch, timeout containment, and scoring.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::error::{CheckError, GateError};
use super::registry::GateDefinition;
use super::{RuleOutcome, Verdict};
use crate::work::WorkItem;

/// Hard timeout applied to each check invocation.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum aggregate score for a `Pass` verdict.
pub const PASS_THRESHOLD: f64 = 85.0;

/// State a check may inspect. A snapshot, never shared mutably across
/// concurrent gate runs.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// The gate being run.
    pub gate_id: String,

    /// Snapshot of the work item under certification.
    pub work_item: WorkItem,
}

/// What a check observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Whether the condition holds.
    pub passed: bool,

    /// Short evidence string for the audit trail.
    pub evidence: String,
}

impl CheckOutcome {
    /// A passing outcome with evidence.
    #[must_use]
    pub fn pass(evidence: impl Into<String>) -> Self {
        Self {
            passed: true,
            evidence: evidence.into(),
        }
    }

    /// A failing outcome with evidence.
    #[must_use]
    pub fn fail(evidence: impl Into<String>) -> Self {
        Self {
            passed: false,
            evidence: evidence.into(),
        }
    }
}

/// Boxed future returned by a check.
pub type CheckFuture<'a> = Pin<Box<dyn Future<Output = Result<CheckOutcome, CheckError>> + Send + 'a>>;

/// A named condition evaluated against live state.
///
/// Implementations that shell out to external tooling should rely on the
/// runner's timeout rather than blocking indefinitely.
pub trait RuleCheck: Send + Sync {
    /// Evaluates the condition for the given context.
    fn run<'a>(&'a self, ctx: &'a CheckContext) -> CheckFuture<'a>;
}

/// Adapter turning a plain function into a [`RuleCheck`].
pub struct FnCheck<F>(pub F);

impl<F> RuleCheck for FnCheck<F>
where
    F: Fn(&CheckContext) -> Result<CheckOutcome, CheckError> + Send + Sync,
{
    fn run<'a>(&'a self, ctx: &'a CheckContext) -> CheckFuture<'a> {
        let result = (self.0)(ctx);
        Box::pin(async move { result })
    }
}

/// Outcome of one gate run, before persistence.
#[derive(Debug, Clone)]
pub struct GateRunOutcome {
    /// Aggregate score, 0-100.
    pub score: f64,

    /// Verdict against [`PASS_THRESHOLD`].
    pub verdict: Verdict,

    /// Per-rule outcomes in evaluation order.
    pub rule_outcomes: Vec<RuleOutcome>,
}

/// Executes gate rule sets against registered checks.
pub struct GateRunner {
    checks: HashMap<String, Arc<dyn RuleCheck>>,
    check_timeout: Duration,
}

impl Default for GateRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl GateRunner {
    /// A runner with the default per-check timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_CHECK_TIMEOUT)
    }

    /// A runner with a custom per-check timeout.
    #[must_use]
    pub fn with_timeout(check_timeout: Duration) -> Self {
        Self {
            checks: HashMap::new(),
            check_timeout,
        }
    }

    /// Registers a check under a rule name. Later registrations replace
    /// earlier ones.
    pub fn register(&mut self, rule_name: impl Into<String>, check: Arc<dyn RuleCheck>) {
        self.checks.insert(rule_name.into(), check);
    }

    /// Registers a plain function as a check.
    pub fn register_fn<F>(&mut self, rule_name: impl Into<String>, check: F)
    where
        F: Fn(&CheckContext) -> Result<CheckOutcome, CheckError> + Send + Sync + 'static,
    {
        self.register(rule_name, Arc::new(FnCheck(check)));
    }

    /// Whether every rule of `def` has a registered check.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnknownRule`] naming the first unbound rule.
    pub fn verify_bindings(&self, def: &GateDefinition) -> Result<(), GateError> {
        for rule in &def.rules {
            if !self.checks.contains_key(&rule.name) {
                return Err(GateError::UnknownRule {
                    gate_id: def.id.clone(),
                    rule: rule.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Runs every rule of `def` against `item` and aggregates the score.
    ///
    /// Rules are evaluated in definition order. A check that returns an
    /// error is recorded as `fail` with the error text as evidence; a
    /// check that exceeds the timeout is recorded as `fail` with evidence
    /// `"timed out"`. Neither aborts the run.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnknownRule`] if a rule has no registered
    /// check, or [`GateError::InvalidDefinition`] if the total weight is
    /// not positive. Both indicate deployment defects.
    pub async fn run(
        &self,
        def: &GateDefinition,
        item: &WorkItem,
    ) -> Result<GateRunOutcome, GateError> {
        self.verify_bindings(def)?;

        let total_weight = def.total_weight();
        if !(total_weight > 0.0 && total_weight.is_finite()) {
            return Err(GateError::InvalidDefinition {
                gate_id: def.id.clone(),
                reason: "total rule weight is not positive".to_string(),
            });
        }

        let ctx = CheckContext {
            gate_id: def.id.clone(),
            work_item: item.clone(),
        };

        let mut rule_outcomes = Vec::with_capacity(def.rules.len());
        let mut passed_weight = 0.0f64;
        let mut required_failed = false;

        for rule in &def.rules {
            // verify_bindings ran above; the map cannot miss here.
            let check = &self.checks[&rule.name];

            let outcome = match timeout(self.check_timeout, check.run(&ctx)).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => {
                    warn!(gate = %def.id, rule = %rule.name, error = %err, "check errored");
                    CheckOutcome::fail(err.to_string())
                }
                Err(_elapsed) => {
                    warn!(gate = %def.id, rule = %rule.name, "check timed out");
                    CheckOutcome::fail("timed out")
                }
            };

            debug!(
                gate = %def.id,
                rule = %rule.name,
                passed = outcome.passed,
                evidence = %outcome.evidence,
                "rule evaluated"
            );

            if outcome.passed {
                passed_weight += rule.weight;
            } else if rule.required {
                required_failed = true;
            }

            rule_outcomes.push(RuleOutcome {
                rule: rule.name.clone(),
                weight: rule.weight,
                required: rule.required,
                passed: outcome.passed,
                evidence: outcome.evidence,
            });
        }

        let score = passed_weight / total_weight * 100.0;
        let verdict = if required_failed || score < PASS_THRESHOLD {
            Verdict::Fail
        } else {
            Verdict::Pass
        };

        info!(
            gate = %def.id,
            work_item = %item.id,
            score,
            verdict = %verdict.as_str(),
            required_failed,
            "gate run complete"
        );

        Ok(GateRunOutcome {
            score,
            verdict,
            rule_outcomes,
        })
    }
}
