//! Bounded, cancellable polling for a single dependency.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{check_ref, UnmetDependency};
use crate::store::{SqliteStore, StoreError};
use crate::work::DependencyRef;

/// How a dependency wait ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome {
    /// The dependency was satisfied within the bound.
    Satisfied,

    /// The bound elapsed with the dependency still unmet.
    TimedOut {
        /// The unmet state observed on the final check.
        last: UnmetDependency,
    },

    /// The caller cancelled the wait.
    Cancelled,

    /// The dependency can never be satisfied (missing, cancelled, or
    /// archived referent); polling was not attempted.
    PermanentlyBlocked {
        /// The permanently unmet state.
        unmet: UnmetDependency,
    },
}

/// Polls a single dependency until satisfied, timed out, or cancelled.
///
/// Used by fully automated callers to pause and resume instead of
/// failing hard. The loop is cooperative: it re-checks the store on each
/// tick, suspends between ticks, and honors `cancel` promptly so an
/// operator can abort a stuck wait. Neither the waiting item nor the
/// referent is mutated.
///
/// A permanently blocking referent short-circuits before the first
/// sleep: no poll interval can bring a missing or cancelled work item
/// back.
///
/// # Errors
///
/// Returns an error only on store failure.
pub async fn wait_for_dependency(
    store: &SqliteStore,
    dep: &DependencyRef,
    poll_interval: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<WaitOutcome, StoreError> {
    let deadline = Instant::now() + timeout;

    loop {
        let unmet = match check_ref(store, dep)? {
            None => {
                info!(dependency = %dep.work_item_id, "dependency satisfied");
                return Ok(WaitOutcome::Satisfied);
            }
            Some(unmet) => unmet,
        };

        if unmet.reason.is_permanent() {
            info!(
                dependency = %dep.work_item_id,
                reason = %unmet.reason,
                "dependency permanently blocked"
            );
            return Ok(WaitOutcome::PermanentlyBlocked { unmet });
        }

        if Instant::now() >= deadline {
            info!(
                dependency = %dep.work_item_id,
                reason = %unmet.reason,
                "dependency wait timed out"
            );
            return Ok(WaitOutcome::TimedOut { last: unmet });
        }

        debug!(
            dependency = %dep.work_item_id,
            reason = %unmet.reason,
            "dependency unmet, polling again"
        );

        tokio::select! {
            () = cancel.cancelled() => return Ok(WaitOutcome::Cancelled),
            () = sleep(poll_interval) => {}
        }
    }
}
