//! Concrete `SQLite` store.
//!
//! Uses WAL mode to allow concurrent reads while writes are in
//! progress. The schema is embedded at compile time and applied
//! idempotently on open.

// SQLite returns i64 for row IDs, counts, and timestamps; all values
// stored here are non-negative and fit. Mutex poisoning indicates a
// panic in another thread, which is unrecoverable.
#![allow(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::missing_panics_doc
)]

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use super::error::StoreError;
use super::now_ns;
use crate::gate::{GateResultRecord, RuleOutcome, Verdict};
use crate::handoff::{HandoffPayload, HandoffRecord, HandoffStatus, SectionIssue};
use crate::work::{DependencyRef, Phase, WorkItem, WorkStatus};

/// Schema SQL embedded at compile time.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// One appended audit record.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Monotonic sequence number.
    pub seq: u64,

    /// Entity kind ("work_item", "handoff", "gate").
    pub entity_kind: String,

    /// Entity identifier.
    pub entity_id: String,

    /// What happened.
    pub action: String,

    /// Structured detail.
    pub detail: serde_json::Value,

    /// Timestamp, nanoseconds since the Unix epoch.
    pub created_at_ns: u64,
}

/// The governance store backed by `SQLite`.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens or creates a store at the specified path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // -------------------------------------------------------------------
    // Work items
    // -------------------------------------------------------------------

    /// Inserts a new work item.
    pub(crate) fn insert_work_item(&self, item: &WorkItem) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let dependencies = serde_json::to_string(&item.dependencies)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO work_items
             (id, title, phase, status, progress, checklist_done, checklist_total,
              routing_tag, dependencies, created_at_ns, updated_at_ns, archived)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                item.id,
                item.title,
                item.phase.as_str(),
                item.status.as_str(),
                item.progress,
                item.checklist_done,
                item.checklist_total,
                item.routing_tag,
                dependencies,
                item.created_at_ns as i64,
                item.updated_at_ns as i64,
                i64::from(item.archived),
            ],
        )?;
        if inserted == 0 {
            return Err(StoreError::WorkItemExists {
                work_item_id: item.id.clone(),
            });
        }
        Ok(())
    }

    /// Fetches a work item, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error on query failure or a corrupt stored value.
    pub fn try_fetch_work_item(&self, id: &str) -> Result<Option<WorkItem>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, title, phase, status, progress, checklist_done,
                        checklist_total, routing_tag, dependencies,
                        created_at_ns, updated_at_ns, archived
                 FROM work_items WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, f64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, i64>(9)?,
                        row.get::<_, i64>(10)?,
                        row.get::<_, i64>(11)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            id,
            title,
            phase,
            status,
            progress,
            checklist_done,
            checklist_total,
            routing_tag,
            dependencies,
            created_at_ns,
            updated_at_ns,
            archived,
        )) = row
        else {
            return Ok(None);
        };

        let dependencies: Vec<DependencyRef> = serde_json::from_str(&dependencies)?;
        Ok(Some(WorkItem {
            id,
            title,
            phase: parse_column::<Phase>("work_items.phase", &phase)?,
            status: parse_column::<WorkStatus>("work_items.status", &status)?,
            progress,
            checklist_done: checklist_done as u32,
            checklist_total: checklist_total as u32,
            routing_tag,
            dependencies,
            created_at_ns: created_at_ns as u64,
            updated_at_ns: updated_at_ns as u64,
            archived: archived != 0,
        }))
    }

    /// Fetches a work item.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WorkItemNotFound`] if absent.
    pub fn fetch_work_item(&self, id: &str) -> Result<WorkItem, StoreError> {
        self.try_fetch_work_item(id)?
            .ok_or_else(|| StoreError::WorkItemNotFound {
                work_item_id: id.to_string(),
            })
    }

    /// Updates the current phase's checklist counters.
    pub(crate) fn update_checklist(
        &self,
        id: &str,
        done: u32,
        total: u32,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE work_items SET checklist_done = ?2, checklist_total = ?3,
             updated_at_ns = ?4 WHERE id = ?1 AND archived = 0",
            params![id, done, total, now_ns() as i64],
        )?;
        ensure_found(updated, id)
    }

    /// Persists the derived progress value.
    ///
    /// The only write path for `progress`; callers compute the value via
    /// the progress routine.
    pub(crate) fn write_progress(&self, id: &str, progress: f64) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE work_items SET progress = ?2, updated_at_ns = ?3
             WHERE id = ?1 AND archived = 0",
            params![id, progress, now_ns() as i64],
        )?;
        ensure_found(updated, id)
    }

    /// Compare-and-swap phase write.
    ///
    /// Re-reads the stored phase inside the write transaction and aborts
    /// with [`StoreError::PhaseConflict`] if it no longer matches
    /// `expected`. On success, moves the pointer, resets the checklist
    /// counters for the new phase, and persists the supplied status and
    /// progress.
    pub(crate) fn advance_phase_cas(
        &self,
        id: &str,
        expected: Phase,
        to: Phase,
        status: WorkStatus,
        progress: f64,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let stored: Option<String> = tx
            .query_row(
                "SELECT phase FROM work_items WHERE id = ?1 AND archived = 0",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(stored) = stored else {
            return Err(StoreError::WorkItemNotFound {
                work_item_id: id.to_string(),
            });
        };
        let actual = parse_column::<Phase>("work_items.phase", &stored)?;
        if actual != expected {
            return Err(StoreError::PhaseConflict {
                work_item_id: id.to_string(),
                expected,
                actual,
            });
        }

        tx.execute(
            "UPDATE work_items SET phase = ?2, status = ?3, progress = ?4,
             checklist_done = 0, checklist_total = 0, updated_at_ns = ?5
             WHERE id = ?1",
            params![id, to.as_str(), status.as_str(), progress, now_ns() as i64],
        )?;
        tx.commit()?;

        debug!(work_item = %id, from = %expected, to = %to, "phase pointer moved");
        Ok(())
    }

    /// Soft-deletes a work item. Archived items are invisible to
    /// governance; no hard delete exists.
    pub(crate) fn archive_work_item(&self, id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE work_items SET archived = 1, updated_at_ns = ?2 WHERE id = ?1",
            params![id, now_ns() as i64],
        )?;
        ensure_found(updated, id)
    }

    // -------------------------------------------------------------------
    // Handoffs
    // -------------------------------------------------------------------

    /// Appends a handoff submission.
    pub(crate) fn insert_handoff(&self, record: &HandoffRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO handoffs
             (id, work_item_id, from_phase, to_phase, status, payload, score,
              issues, created_at_ns, accepted_at_ns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id,
                record.work_item_id,
                record.from_phase.as_str(),
                record.to_phase.as_str(),
                record.status.as_str(),
                serde_json::to_string(&record.payload)?,
                record.score,
                serde_json::to_string(&record.issues)?,
                record.created_at_ns as i64,
                record.accepted_at_ns.map(|ns| ns as i64),
            ],
        )?;
        Ok(())
    }

    /// Finalizes a pending handoff with the validator's decision.
    ///
    /// The one permitted mutation of a handoff row: status, score, and
    /// issue list move from their pending placeholders to the validation
    /// outcome. Rejected and accepted rows are never touched again;
    /// re-submission appends a fresh row instead.
    pub(crate) fn finalize_handoff(
        &self,
        id: &str,
        status: HandoffStatus,
        score: f64,
        issues: &[SectionIssue],
        accepted_at_ns: Option<u64>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE handoffs SET status = ?2, score = ?3, issues = ?4, accepted_at_ns = ?5
             WHERE id = ?1 AND status = 'pending'",
            params![
                id,
                status.as_str(),
                score,
                serde_json::to_string(issues)?,
                accepted_at_ns.map(|ns| ns as i64),
            ],
        )?;
        Ok(())
    }

    /// The most recent handoff for a `(work item, from, to)` tuple.
    ///
    /// Applies the store-wide latest-wins tie-break.
    ///
    /// # Errors
    ///
    /// Returns an error on query failure or a corrupt stored value.
    pub fn latest_handoff(
        &self,
        work_item_id: &str,
        from: Phase,
        to: Phase,
    ) -> Result<Option<HandoffRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, work_item_id, from_phase, to_phase, status, payload,
                        score, issues, created_at_ns, accepted_at_ns
                 FROM handoffs
                 WHERE work_item_id = ?1 AND from_phase = ?2 AND to_phase = ?3
                 ORDER BY created_at_ns DESC, rowid DESC
                 LIMIT 1",
                params![work_item_id, from.as_str(), to.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, f64>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, i64>(8)?,
                        row.get::<_, Option<i64>>(9)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, work_item_id, from_phase, to_phase, status, payload, score, issues, created_at_ns, accepted_at_ns)) =
            row
        else {
            return Ok(None);
        };

        let payload: HandoffPayload = serde_json::from_str(&payload)?;
        let issues: Vec<SectionIssue> = serde_json::from_str(&issues)?;
        Ok(Some(HandoffRecord {
            id,
            work_item_id,
            from_phase: parse_column::<Phase>("handoffs.from_phase", &from_phase)?,
            to_phase: parse_column::<Phase>("handoffs.to_phase", &to_phase)?,
            status: HandoffStatus::from_str(&status).map_err(|_| StoreError::Corrupt {
                column: "handoffs.status".to_string(),
                value: status,
            })?,
            payload,
            score,
            issues,
            created_at_ns: created_at_ns as u64,
            accepted_at_ns: accepted_at_ns.map(|ns| ns as u64),
        }))
    }

    /// Whether an undecided `pending` handoff exists for the tuple.
    ///
    /// A pending row is only ever observed when a previous writer
    /// crashed between insert and validation finalization.
    pub fn pending_handoff_exists(
        &self,
        work_item_id: &str,
        from: Phase,
        to: Phase,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM handoffs
             WHERE work_item_id = ?1 AND from_phase = ?2 AND to_phase = ?3
               AND status = 'pending'",
            params![work_item_id, from.as_str(), to.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // -------------------------------------------------------------------
    // Gate results
    // -------------------------------------------------------------------

    /// Appends a gate scoring run.
    pub(crate) fn insert_gate_result(&self, record: &GateResultRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO gate_results
             (id, gate_id, work_item_id, score, verdict, rule_outcomes, created_at_ns)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                record.gate_id,
                record.work_item_id,
                record.score,
                record.verdict.as_str(),
                serde_json::to_string(&record.rule_outcomes)?,
                record.created_at_ns as i64,
            ],
        )?;
        Ok(())
    }

    /// The authoritative (latest) result for a `(gate, work item)` pair.
    ///
    /// Applies the store-wide latest-wins tie-break.
    ///
    /// # Errors
    ///
    /// Returns an error on query failure or a corrupt stored value.
    pub fn latest_gate_result(
        &self,
        gate_id: &str,
        work_item_id: &str,
    ) -> Result<Option<GateResultRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT id, gate_id, work_item_id, score, verdict, rule_outcomes,
                        created_at_ns
                 FROM gate_results
                 WHERE gate_id = ?1 AND work_item_id = ?2
                 ORDER BY created_at_ns DESC, rowid DESC
                 LIMIT 1",
                params![gate_id, work_item_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, gate_id, work_item_id, score, verdict, rule_outcomes, created_at_ns)) = row
        else {
            return Ok(None);
        };

        let rule_outcomes: Vec<RuleOutcome> = serde_json::from_str(&rule_outcomes)?;
        Ok(Some(GateResultRecord {
            id,
            gate_id,
            work_item_id,
            score,
            verdict: Verdict::from_str(&verdict).map_err(|_| StoreError::Corrupt {
                column: "gate_results.verdict".to_string(),
                value: verdict,
            })?,
            rule_outcomes,
            created_at_ns: created_at_ns as u64,
        }))
    }

    // -------------------------------------------------------------------
    // Audit log
    // -------------------------------------------------------------------

    /// Appends an audit record.
    pub(crate) fn append_audit(
        &self,
        entity_kind: &str,
        entity_id: &str,
        action: &str,
        detail: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO audit_log (entity_kind, entity_id, action, detail, created_at_ns)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entity_kind,
                entity_id,
                action,
                serde_json::to_string(detail)?,
                now_ns() as i64,
            ],
        )?;
        Ok(())
    }

    /// All audit records for an entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error on query failure or a corrupt stored value.
    pub fn audit_entries(&self, entity_id: &str) -> Result<Vec<AuditEntry>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT seq, entity_kind, entity_id, action, detail, created_at_ns
             FROM audit_log WHERE entity_id = ?1 ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map(params![entity_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (seq, entity_kind, entity_id, action, detail, created_at_ns) = row?;
            entries.push(AuditEntry {
                seq: seq as u64,
                entity_kind,
                entity_id,
                action,
                detail: serde_json::from_str(&detail)?,
                created_at_ns: created_at_ns as u64,
            });
        }
        Ok(entries)
    }
}

/// Counts an UPDATE's affected rows, mapping zero to "not found".
fn ensure_found(updated: usize, id: &str) -> Result<(), StoreError> {
    if updated == 0 {
        return Err(StoreError::WorkItemNotFound {
            work_item_id: id.to_string(),
        });
    }
    Ok(())
}

/// Parses a stored enum column, mapping failure to a corrupt-value error.
fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
    value.parse().map_err(|_| StoreError::Corrupt {
        column: column.to_string(),
        value: value.to_string(),
    })
}
