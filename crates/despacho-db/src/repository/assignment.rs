//! # Assignment Repository
//!
//! Database operations for the per-order assignment and timing record.
//!
//! ## Assignment Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Assignment Lifecycle                                │
//! │                                                                         │
//! │  1. ENSURE                                                             │
//! │     └── ensure_row() → row created lazily, all people/timing NULL      │
//! │                                                                         │
//! │  2. ASSIGN                                                             │
//! │     └── assign() → coalesce-upsert registrant and/or preparer          │
//! │     └── fill_registrant_if_absent() → hint wins only on a blank row    │
//! │                                                                         │
//! │  3. START                                                              │
//! │     └── start() → requires a preparer on record; re-entrant            │
//! │                                                                         │
//! │  4. FINISH                                                             │
//! │     └── finish() → requires a start + zero pending lines               │
//! │     └── (pending count and finalize write share one transaction)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `finish` reads the `picking_detail` table: the pending-line count that
//! gates finalization runs inside the same transaction as the finalize
//! write, so a scan cannot land between the check and the commit.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use despacho_core::{FinishOutcome, OrderKey, PickingAssignment, StartOutcome};

/// Repository for assignment and timing operations.
#[derive(Debug, Clone)]
pub struct AssignmentRepository {
    pool: SqlitePool,
}

impl AssignmentRepository {
    /// Creates a new AssignmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AssignmentRepository { pool }
    }

    /// Creates the assignment row if it does not exist yet.
    ///
    /// Idempotent: the composite primary key plus `INSERT OR IGNORE` makes
    /// concurrent first touches of the same order create exactly one row.
    pub async fn ensure_row(&self, key: &OrderKey, now: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO picking_assignment (
                company, branch, order_no, sub_order_no, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets the assignment row for an order, if present.
    pub async fn get(&self, key: &OrderKey) -> DbResult<Option<PickingAssignment>> {
        let assignment: Option<PickingAssignment> = sqlx::query_as::<_, PickingAssignment>(
            r#"
            SELECT
                company, branch, order_no, sub_order_no,
                registrant_code, registrant_name, preparer_code, preparer_name,
                started_at, finished_at, duration_min,
                created_at, updated_at
            FROM picking_assignment
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assignment)
    }

    /// Returns whether an order is finalized (end timestamp on record).
    ///
    /// ## Usage
    /// The branch every detail read takes: finalized orders are served from
    /// the archive, everything else from the active worklist.
    pub async fn is_finalized(&self, key: &OrderKey) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM picking_assignment
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
              AND finished_at IS NOT NULL
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Upserts the people assigned to an order.
    ///
    /// ## Coalesce Semantics
    /// Each pair is `(code, display_name)`. A `None` argument leaves the
    /// stored value untouched; a `Some` argument overwrites it. Passing
    /// `None` is therefore never "clear this field".
    ///
    /// ## Returns
    /// The assignment row as now on record.
    pub async fn assign(
        &self,
        key: &OrderKey,
        registrant: Option<(&str, &str)>,
        preparer: Option<(&str, &str)>,
        now: DateTime<Utc>,
    ) -> DbResult<PickingAssignment> {
        debug!(
            %key,
            registrant = registrant.map(|(code, _)| code),
            preparer = preparer.map(|(code, _)| code),
            "Assigning users"
        );

        self.ensure_row(key, now).await?;

        sqlx::query(
            r#"
            UPDATE picking_assignment SET
                registrant_code = COALESCE(?5, registrant_code),
                registrant_name = COALESCE(?6, registrant_name),
                preparer_code = COALESCE(?7, preparer_code),
                preparer_name = COALESCE(?8, preparer_name),
                updated_at = ?9
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .bind(registrant.map(|(code, _)| code))
        .bind(registrant.map(|(_, name)| name))
        .bind(preparer.map(|(code, _)| code))
        .bind(preparer.map(|(_, name)| name))
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(key)
            .await?
            .ok_or_else(|| DbError::not_found("Assignment", key.to_string()))
    }

    /// Records a registrant on a row that has none yet.
    ///
    /// The opposite precedence of [`assign`](Self::assign): an existing
    /// registrant always wins over the hint. Used when the detail screen
    /// opens and the viewing user becomes the registrant by default.
    ///
    /// The row must already exist (see [`ensure_row`](Self::ensure_row)).
    ///
    /// ## Returns
    /// `true` if the hint was written, `false` if a registrant was already
    /// on record.
    pub async fn fill_registrant_if_absent(
        &self,
        key: &OrderKey,
        code: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE picking_assignment SET
                registrant_code = ?5,
                registrant_name = ?6,
                updated_at = ?7
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
              AND registrant_code IS NULL
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .bind(code)
        .bind(name)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records the preparation start timestamp.
    ///
    /// ## Rules
    /// - A non-blank preparer must be on record, else `MissingPreparer`
    /// - A finalized order rejects the transition with `AlreadyFinalized`
    /// - Re-entrant: starting an already-started order re-opens the timing
    ///   window (prior end timestamp and duration are cleared)
    pub async fn start(&self, key: &OrderKey, now: DateTime<Utc>) -> DbResult<StartOutcome> {
        debug!(%key, "Marking preparation start");

        self.ensure_row(key, now).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let current: Option<PickingAssignment> = sqlx::query_as::<_, PickingAssignment>(
            r#"
            SELECT
                company, branch, order_no, sub_order_no,
                registrant_code, registrant_name, preparer_code, preparer_name,
                started_at, finished_at, duration_min,
                created_at, updated_at
            FROM picking_assignment
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .fetch_optional(&mut *tx)
        .await?;

        let current = current.ok_or_else(|| DbError::not_found("Assignment", key.to_string()))?;

        if current.is_finalized() {
            return Ok(StartOutcome::AlreadyFinalized);
        }
        if !current.preparer_assigned() {
            return Ok(StartOutcome::MissingPreparer);
        }

        let result = sqlx::query(
            r#"
            UPDATE picking_assignment SET
                started_at = ?5,
                finished_at = NULL,
                duration_min = NULL,
                updated_at = ?5
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            warn!(%key, "Start update touched zero rows");
            return Err(DbError::not_found("Assignment", key.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(%key, "Preparation started");
        Ok(StartOutcome::Started { started_at: now })
    }

    /// Records the preparation end timestamp and the elapsed duration.
    ///
    /// ## Rules
    /// - Every line of the order must be exactly reconciled, else
    ///   `PendingItems` with the offending count
    /// - A start timestamp must be on record, else `NotStarted`
    /// - A finalized order rejects the transition with `AlreadyFinalized`
    /// - `duration_min` = elapsed minutes, rounded to 2 decimals
    ///
    /// The pending-line count runs inside the same transaction as the
    /// finalize write.
    pub async fn finish(&self, key: &OrderKey, now: DateTime<Utc>) -> DbResult<FinishOutcome> {
        debug!(%key, "Marking preparation finish");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let pending: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM picking_detail
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
              AND qty_scanned != qty_supplied
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .fetch_one(&mut *tx)
        .await?;

        if pending > 0 {
            return Ok(FinishOutcome::PendingItems { pending });
        }

        let current: Option<PickingAssignment> = sqlx::query_as::<_, PickingAssignment>(
            r#"
            SELECT
                company, branch, order_no, sub_order_no,
                registrant_code, registrant_name, preparer_code, preparer_name,
                started_at, finished_at, duration_min,
                created_at, updated_at
            FROM picking_assignment
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(FinishOutcome::NotStarted);
        };
        if current.is_finalized() {
            return Ok(FinishOutcome::AlreadyFinalized);
        }
        let Some(started_at) = current.started_at else {
            return Ok(FinishOutcome::NotStarted);
        };

        let duration_min = round_duration_minutes(now - started_at);

        let result = sqlx::query(
            r#"
            UPDATE picking_assignment SET
                finished_at = ?5,
                duration_min = ?6,
                updated_at = ?5
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
              AND started_at IS NOT NULL AND finished_at IS NULL
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .bind(now)
        .bind(duration_min)
        .execute(&mut *tx)
        .await?;

        // The row passed every precondition inside this same transaction, so
        // touching zero rows means it vanished. Not a silent success.
        if result.rows_affected() == 0 {
            warn!(%key, "Finish update touched zero rows");
            return Err(DbError::not_found("Assignment", key.to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(%key, duration_min, "Preparation finished");
        Ok(FinishOutcome::Finished {
            finished_at: now,
            duration_min,
        })
    }
}

/// Elapsed preparation time in minutes, rounded to 2 decimals.
fn round_duration_minutes(elapsed: chrono::Duration) -> f64 {
    let minutes = elapsed.num_milliseconds() as f64 / 1000.0 / 60.0;
    (minutes * 100.0).round() / 100.0
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use despacho_core::ErpDetailLine;

    fn key() -> OrderKey {
        OrderKey::new("01", "01", "0001234", "0000010")
    }

    fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, hour, min, sec).unwrap()
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn erp_line(product: &str, supplied: f64) -> ErpDetailLine {
        ErpDetailLine {
            item_seq: 1,
            description: format!("Product {product}"),
            unit: "UND".to_string(),
            unit_factor: None,
            closure_flag: None,
            product_code: product.to_string(),
            qty_ordered: Some(supplied),
            qty_supplied: Some(supplied),
            cartons: None,
            net_weight: None,
            qty_scanned: None,
            location: Some("A-01".to_string()),
        }
    }

    #[test]
    fn test_duration_rounds_to_two_decimals() {
        assert_eq!(round_duration_minutes(chrono::Duration::seconds(90)), 1.5);
        assert_eq!(round_duration_minutes(chrono::Duration::seconds(100)), 1.67);
        assert_eq!(round_duration_minutes(chrono::Duration::seconds(0)), 0.0);
        assert_eq!(
            round_duration_minutes(chrono::Duration::milliseconds(30_500)),
            0.51
        );
    }

    #[tokio::test]
    async fn test_ensure_row_is_idempotent() {
        let db = test_db().await;
        let repo = db.assignments();

        repo.ensure_row(&key(), at(8, 0, 0)).await.unwrap();
        repo.ensure_row(&key(), at(9, 0, 0)).await.unwrap();

        let row = repo.get(&key()).await.unwrap().unwrap();
        assert_eq!(row.registrant_code, None);
        assert_eq!(row.preparer_code, None);
        assert_eq!(row.started_at, None);
        // First creation wins, the second ensure is a no-op.
        assert_eq!(row.created_at, at(8, 0, 0));
    }

    #[tokio::test]
    async fn test_get_missing_row() {
        let db = test_db().await;
        assert!(db.assignments().get(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_assign_coalesce_semantics() {
        let db = test_db().await;
        let repo = db.assignments();

        let row = repo
            .assign(&key(), Some(("R01", "Rosa Quispe")), None, at(8, 0, 0))
            .await
            .unwrap();
        assert_eq!(row.registrant_code.as_deref(), Some("R01"));
        assert_eq!(row.preparer_code, None);

        // None leaves the registrant untouched.
        let row = repo
            .assign(&key(), None, Some(("P07", "Pedro Mamani")), at(8, 5, 0))
            .await
            .unwrap();
        assert_eq!(row.registrant_code.as_deref(), Some("R01"));
        assert_eq!(row.preparer_code.as_deref(), Some("P07"));
        assert_eq!(row.preparer_name.as_deref(), Some("Pedro Mamani"));

        // Some overwrites.
        let row = repo
            .assign(&key(), Some(("R02", "Rita Flores")), None, at(8, 10, 0))
            .await
            .unwrap();
        assert_eq!(row.registrant_code.as_deref(), Some("R02"));
        assert_eq!(row.registrant_name.as_deref(), Some("Rita Flores"));
        assert_eq!(row.preparer_code.as_deref(), Some("P07"));
    }

    #[tokio::test]
    async fn test_fill_registrant_only_fills_blank() {
        let db = test_db().await;
        let repo = db.assignments();
        repo.ensure_row(&key(), at(8, 0, 0)).await.unwrap();

        let filled = repo
            .fill_registrant_if_absent(&key(), "R01", "Rosa Quispe", at(8, 0, 1))
            .await
            .unwrap();
        assert!(filled);

        let filled = repo
            .fill_registrant_if_absent(&key(), "R99", "Someone Else", at(8, 0, 2))
            .await
            .unwrap();
        assert!(!filled);

        let row = repo.get(&key()).await.unwrap().unwrap();
        assert_eq!(row.registrant_code.as_deref(), Some("R01"));
        assert_eq!(row.registrant_name.as_deref(), Some("Rosa Quispe"));
    }

    #[tokio::test]
    async fn test_start_requires_preparer() {
        let db = test_db().await;
        let repo = db.assignments();

        let outcome = repo.start(&key(), at(9, 0, 0)).await.unwrap();
        assert_eq!(outcome, StartOutcome::MissingPreparer);

        let row = repo.get(&key()).await.unwrap().unwrap();
        assert_eq!(row.started_at, None);
    }

    #[tokio::test]
    async fn test_start_sets_timestamp() {
        let db = test_db().await;
        let repo = db.assignments();

        repo.assign(&key(), None, Some(("P07", "Pedro Mamani")), at(8, 0, 0))
            .await
            .unwrap();

        let outcome = repo.start(&key(), at(9, 0, 0)).await.unwrap();
        assert_eq!(
            outcome,
            StartOutcome::Started {
                started_at: at(9, 0, 0)
            }
        );

        let row = repo.get(&key()).await.unwrap().unwrap();
        assert_eq!(row.started_at, Some(at(9, 0, 0)));
        assert_eq!(row.finished_at, None);
    }

    #[tokio::test]
    async fn test_restart_reopens_window() {
        let db = test_db().await;
        let repo = db.assignments();

        repo.assign(&key(), None, Some(("P07", "Pedro Mamani")), at(8, 0, 0))
            .await
            .unwrap();
        repo.start(&key(), at(9, 0, 0)).await.unwrap();

        let outcome = repo.start(&key(), at(9, 30, 0)).await.unwrap();
        assert_eq!(
            outcome,
            StartOutcome::Started {
                started_at: at(9, 30, 0)
            }
        );

        let row = repo.get(&key()).await.unwrap().unwrap();
        assert_eq!(row.started_at, Some(at(9, 30, 0)));
    }

    #[tokio::test]
    async fn test_finish_blocks_on_pending_lines() {
        let db = test_db().await;
        let repo = db.assignments();

        db.detail()
            .insert_snapshot(&key(), &[erp_line("10500123", 5.0)])
            .await
            .unwrap();
        db.detail().apply_scan(&key(), "10500123", 3.0).await.unwrap();

        repo.assign(&key(), None, Some(("P07", "Pedro Mamani")), at(8, 0, 0))
            .await
            .unwrap();
        repo.start(&key(), at(9, 0, 0)).await.unwrap();

        let outcome = repo.finish(&key(), at(9, 2, 30)).await.unwrap();
        assert_eq!(outcome, FinishOutcome::PendingItems { pending: 1 });

        // Scan the remaining 2, then finishing goes through.
        db.detail().apply_scan(&key(), "10500123", 2.0).await.unwrap();

        let outcome = repo.finish(&key(), at(9, 2, 30)).await.unwrap();
        assert_eq!(
            outcome,
            FinishOutcome::Finished {
                finished_at: at(9, 2, 30),
                duration_min: 2.5
            }
        );

        let row = repo.get(&key()).await.unwrap().unwrap();
        assert_eq!(row.finished_at, Some(at(9, 2, 30)));
        assert_eq!(row.duration_min, Some(2.5));
    }

    #[tokio::test]
    async fn test_finish_requires_start() {
        let db = test_db().await;
        let repo = db.assignments();

        // No assignment row at all.
        let outcome = repo.finish(&key(), at(9, 0, 0)).await.unwrap();
        assert_eq!(outcome, FinishOutcome::NotStarted);

        // Row exists, preparer set, but never started.
        repo.assign(&key(), None, Some(("P07", "Pedro Mamani")), at(8, 0, 0))
            .await
            .unwrap();
        let outcome = repo.finish(&key(), at(9, 0, 0)).await.unwrap();
        assert_eq!(outcome, FinishOutcome::NotStarted);
    }

    #[tokio::test]
    async fn test_finalized_order_rejects_transitions() {
        let db = test_db().await;
        let repo = db.assignments();

        repo.assign(&key(), None, Some(("P07", "Pedro Mamani")), at(8, 0, 0))
            .await
            .unwrap();
        repo.start(&key(), at(9, 0, 0)).await.unwrap();
        repo.finish(&key(), at(9, 45, 0)).await.unwrap();

        assert!(repo.is_finalized(&key()).await.unwrap());

        let outcome = repo.finish(&key(), at(10, 0, 0)).await.unwrap();
        assert_eq!(outcome, FinishOutcome::AlreadyFinalized);

        let outcome = repo.start(&key(), at(10, 0, 0)).await.unwrap();
        assert_eq!(outcome, StartOutcome::AlreadyFinalized);

        let row = repo.get(&key()).await.unwrap().unwrap();
        assert_eq!(row.finished_at, Some(at(9, 45, 0)));
        assert_eq!(row.duration_min, Some(45.0));
    }

    #[tokio::test]
    async fn test_is_finalized_false_cases() {
        let db = test_db().await;
        let repo = db.assignments();

        assert!(!repo.is_finalized(&key()).await.unwrap());

        repo.ensure_row(&key(), at(8, 0, 0)).await.unwrap();
        assert!(!repo.is_finalized(&key()).await.unwrap());
    }
}
