//! End-to-end governance scenarios over an in-memory store.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use sdgov_core::config::GovernanceConfig;
use sdgov_core::deps::{wait_for_dependency, WaitOutcome};
use sdgov_core::engine::{AdvanceOutcome, GovernanceEngine, NewWorkItem};
use sdgov_core::gate::{CheckOutcome, GateRunner, Verdict};
use sdgov_core::handoff::{HandoffPayload, HandoffStatus};
use sdgov_core::store::SqliteStore;
use sdgov_core::work::{DependencyRef, Phase};

fn payload() -> HandoffPayload {
    HandoffPayload {
        executive_summary: "Work for this phase is complete and reviewed.".to_string(),
        completeness_report: "All obligations met; no gaps identified.".to_string(),
        deliverables_manifest: vec!["design note".to_string(), "implementation".to_string()],
        key_decisions: "Stayed on the existing storage layout.".to_string(),
        known_issues: vec![],
        resource_utilization: "One sprint, two engineers.".to_string(),
        action_items: vec!["Proceed to the next phase".to_string()],
    }
}

fn closing_payload() -> HandoffPayload {
    let mut p = payload();
    p.action_items.clear();
    p
}

fn ungated_engine() -> GovernanceEngine {
    GovernanceEngine::new(
        SqliteStore::in_memory().unwrap(),
        GovernanceConfig::default(),
        GateRunner::new(),
    )
    .unwrap()
}

fn advance_step(engine: &GovernanceEngine, id: &str, from: Phase, to: Phase) {
    let receipt = engine.submit_handoff(id, from, to, payload()).unwrap();
    assert_eq!(receipt.status, HandoffStatus::Accepted, "{:?}", receipt.issues);
    let outcome = engine.advance_phase(id, from, to).unwrap();
    assert!(matches!(outcome, AdvanceOutcome::Advanced { .. }));
}

/// Drives an item to a given progress using its own ladder position and
/// checklist, never writing progress directly.
fn drive_to_progress(engine: &GovernanceEngine, id: &str, target: f64) {
    let steps = [
        (Phase::Lead, Phase::Plan),
        (Phase::Plan, Phase::Exec),
        (Phase::Exec, Phase::PlanVerification),
        (Phase::PlanVerification, Phase::LeadFinalApproval),
    ];
    for (from, to) in steps {
        let report = engine.compute_progress(id).unwrap();
        if report.percent >= target {
            return;
        }
        advance_step(engine, id, from, to);
    }
}

// =============================================================================
// Scenario: dependency on a sibling directive's progress
// (W1 requires W2 progress >= 50)
// =============================================================================

#[test]
fn dependency_scenario_blocks_then_releases() {
    let engine = ungated_engine();

    engine
        .create_work_item(NewWorkItem::new("W2", "Upstream platform work"))
        .unwrap();
    let mut w1 = NewWorkItem::new("W1", "Downstream feature work");
    w1.dependencies = vec![DependencyRef::on_progress("W2", 50.0)];
    engine.create_work_item(w1).unwrap();

    // W2 sits at 30% (LEAD complete, one third of PLAN's checklist).
    advance_step(&engine, "W2", Phase::Lead, Phase::Plan);
    engine.set_checklist("W2", 1, 2).unwrap();
    let report = engine.compute_progress("W2").unwrap();
    assert!((report.percent - 30.0).abs() < 1e-9);

    let eval = engine.check_dependencies("W1").unwrap();
    assert!(!eval.can_proceed);
    assert_eq!(eval.blocked_by.len(), 1);
    assert_eq!(eval.blocked_by[0].work_item_id, "W2");

    // W2 reaches 50% through its own phase advance (LEAD + PLAN + a
    // third of EXEC).
    advance_step(&engine, "W2", Phase::Plan, Phase::Exec);
    engine.set_checklist("W2", 1, 3).unwrap();
    let report = engine.compute_progress("W2").unwrap();
    assert!((report.percent - 50.0).abs() < 1e-9);

    let eval = engine.check_dependencies("W1").unwrap();
    assert!(eval.can_proceed);
    assert!(eval.blocked_by.is_empty());

    // Neither item was mutated by the checks themselves.
    assert_eq!(
        engine.store().fetch_work_item("W1").unwrap().phase,
        Phase::Lead
    );
    assert_eq!(
        engine.store().fetch_work_item("W2").unwrap().phase,
        Phase::Exec
    );
}

#[test]
fn drive_helper_reaches_target_without_direct_writes() {
    let engine = ungated_engine();
    engine
        .create_work_item(NewWorkItem::new("W3", "Driven directive"))
        .unwrap();
    drive_to_progress(&engine, "W3", 70.0);
    let report = engine.compute_progress("W3").unwrap();
    assert!(report.percent >= 70.0);
    assert!(report.percent < 100.0);
}

// =============================================================================
// Scenario: full ladder with a gated EXEC exit
// =============================================================================

#[tokio::test]
async fn full_ladder_with_exec_gate() {
    let config = GovernanceConfig::from_toml(
        r#"
        [[gates]]
        id = "exec-gate"
        bound_phases = ["EXEC"]

        [[gates.rules]]
        name = "tests_executed"
        weight = 60.0
        required = true

        [[gates.rules]]
        name = "lint_clean"
        weight = 40.0
        "#,
    )
    .unwrap();

    let mut runner = GateRunner::new();
    runner.register_fn("tests_executed", |_| {
        Ok(CheckOutcome::pass("suite green, 214 tests"))
    });
    runner.register_fn("lint_clean", |_| Ok(CheckOutcome::pass("no warnings")));

    let engine =
        GovernanceEngine::new(SqliteStore::in_memory().unwrap(), config, runner).unwrap();
    engine
        .create_work_item(NewWorkItem::new("SD-100", "Gated delivery"))
        .unwrap();

    advance_step(&engine, "SD-100", Phase::Lead, Phase::Plan);
    advance_step(&engine, "SD-100", Phase::Plan, Phase::Exec);

    // EXEC's exit is gated: handoff alone is not enough.
    let receipt = engine
        .submit_handoff("SD-100", Phase::Exec, Phase::PlanVerification, payload())
        .unwrap();
    assert_eq!(receipt.status, HandoffStatus::Accepted);
    let outcome = engine
        .advance_phase("SD-100", Phase::Exec, Phase::PlanVerification)
        .unwrap();
    assert!(matches!(outcome, AdvanceOutcome::Rejected { .. }));

    let report = engine.run_gate("exec-gate", "SD-100").await.unwrap();
    assert_eq!(report.verdict, Verdict::Pass);
    assert!((report.score - 100.0).abs() < 1e-9);
    assert_eq!(report.per_rule.len(), 2);

    let outcome = engine
        .advance_phase("SD-100", Phase::Exec, Phase::PlanVerification)
        .unwrap();
    assert!(matches!(outcome, AdvanceOutcome::Advanced { .. }));

    advance_step(
        &engine,
        "SD-100",
        Phase::PlanVerification,
        Phase::LeadFinalApproval,
    );
    let receipt = engine
        .submit_handoff(
            "SD-100",
            Phase::LeadFinalApproval,
            Phase::Completed,
            closing_payload(),
        )
        .unwrap();
    assert_eq!(receipt.status, HandoffStatus::Accepted);
    let outcome = engine
        .advance_phase("SD-100", Phase::LeadFinalApproval, Phase::Completed)
        .unwrap();
    let AdvanceOutcome::Advanced { progress } = outcome else {
        panic!("expected advance");
    };
    assert_eq!(progress, 100.0);

    // Gate history is append-only.
    let latest = engine
        .store()
        .latest_gate_result("exec-gate", "SD-100")
        .unwrap()
        .unwrap();
    assert_eq!(latest.verdict, Verdict::Pass);
}

// =============================================================================
// Scenario: automated waiter pauses until the dependency resolves
// =============================================================================

#[tokio::test(start_paused = true)]
async fn waiter_pauses_until_sibling_progresses() {
    let engine = ungated_engine();
    engine
        .create_work_item(NewWorkItem::new("W2", "Upstream"))
        .unwrap();
    let dep = DependencyRef::on_progress("W2", 40.0);
    let cancel = CancellationToken::new();

    let waiter = wait_for_dependency(
        engine.store(),
        &dep,
        Duration::from_millis(200),
        Duration::from_secs(30),
        &cancel,
    );

    let driver = async {
        tokio::time::sleep(Duration::from_millis(700)).await;
        advance_step(&engine, "W2", Phase::Lead, Phase::Plan);
        advance_step(&engine, "W2", Phase::Plan, Phase::Exec);
    };

    let (outcome, ()) = tokio::join!(waiter, driver);
    assert_eq!(outcome.unwrap(), WaitOutcome::Satisfied);
}

#[tokio::test(start_paused = true)]
async fn operator_can_cancel_a_stuck_wait() {
    let engine = ungated_engine();
    engine
        .create_work_item(NewWorkItem::new("W2", "Upstream that never moves"))
        .unwrap();
    let dep = DependencyRef::on_progress("W2", 99.0);
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            cancel.cancel();
        }
    };

    let waiter = wait_for_dependency(
        engine.store(),
        &dep,
        Duration::from_secs(1),
        Duration::from_secs(3600),
        &cancel,
    );

    let (outcome, ()) = tokio::join!(waiter, canceller);
    assert_eq!(outcome.unwrap(), WaitOutcome::Cancelled);
}
