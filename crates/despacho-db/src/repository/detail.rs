//! # Detail Repository
//!
//! Database operations for the active picking worklist.
//!
//! ## Worklist Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Picking Worklist Lifecycle                         │
//! │                                                                         │
//! │  1. MATERIALIZE ONCE                                                    │
//! │     └── insert_snapshot() → copies the ERP detail rows, stamped with    │
//! │         the order key. INSERT OR IGNORE on the composite primary key    │
//! │         makes a concurrent double-materialization insert nothing twice. │
//! │                                                                         │
//! │  2. SCAN                                                                │
//! │     └── apply_scan()  → guarded atomic increment + variance             │
//! │     └── apply_scan()  → ...                                             │
//! │     └── reset_scan()  → zero one line back out                          │
//! │     (every accepted mutation recomputes the order status flag)          │
//! │                                                                         │
//! │  3. COMPLETE                                                            │
//! │     └── clear_for_order() → bulk delete; archived rows take over        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Overpicking Guard
//! `apply_scan` never reads a quantity into Rust and writes it back. The
//! increment, the ceiling check and the variance recomputation are one SQL
//! statement, so two scan guns hitting the same line serialize inside SQLite
//! and the stored `qty_scanned` can never exceed `qty_supplied`.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use despacho_core::{ErpDetailLine, OrderKey, PickingLine, ScanOutcome, FLAG_COMPLETE, FLAG_PENDING};

/// Repository for active picking line operations.
#[derive(Debug, Clone)]
pub struct DetailRepository {
    pool: SqlitePool,
}

impl DetailRepository {
    /// Creates a new DetailRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DetailRepository { pool }
    }

    /// Returns whether any active line exists for the order.
    ///
    /// ## Usage
    /// The materialize-once check: rows present means the snapshot is the
    /// system of record and the ERP must not be consulted again.
    pub async fn exists_for_order(&self, key: &OrderKey) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM picking_detail
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
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

    /// Lists all active lines of an order, in warehouse walking order
    /// (storage location, then item sequence).
    pub async fn list_for_order(&self, key: &OrderKey) -> DbResult<Vec<PickingLine>> {
        let lines: Vec<PickingLine> = sqlx::query_as::<_, PickingLine>(
            r#"
            SELECT
                company, branch, order_no, sub_order_no, product_code,
                item_seq, description, unit, unit_factor, closure_flag,
                qty_ordered, qty_supplied, cartons, net_weight,
                qty_scanned, variance, location, status_flag
            FROM picking_detail
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
            ORDER BY location, item_seq
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Bulk-inserts the ERP detail snapshot for an order.
    ///
    /// ## Snapshot Pattern
    /// The ERP rows are copied once and become the system of record for the
    /// order until completion, even if the ERP detail changes afterwards.
    /// Product code and location are trimmed on the way in: the ERP serves
    /// CHAR-padded columns, and both fields are compared or sorted later.
    ///
    /// ## Returns
    /// The number of rows actually inserted. `INSERT OR IGNORE` against the
    /// composite primary key means a concurrent materialization of the same
    /// order reports 0 here instead of duplicating lines.
    pub async fn insert_snapshot(&self, key: &OrderKey, lines: &[ErpDetailLine]) -> DbResult<u64> {
        debug!(%key, line_count = lines.len(), "Inserting picking snapshot");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut inserted = 0u64;
        for line in lines {
            let qty_supplied = line.qty_supplied.unwrap_or(0.0);
            let qty_scanned = line.qty_scanned.unwrap_or(0.0);

            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO picking_detail (
                    company, branch, order_no, sub_order_no, product_code,
                    item_seq, description, unit, unit_factor, closure_flag,
                    qty_ordered, qty_supplied, cartons, net_weight,
                    qty_scanned, variance, location, status_flag
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5,
                    ?6, ?7, ?8, ?9, ?10,
                    ?11, ?12, ?13, ?14,
                    ?15, ?16, ?17, ?18
                )
                "#,
            )
            .bind(&key.company)
            .bind(&key.branch)
            .bind(&key.order_no)
            .bind(&key.sub_order_no)
            .bind(line.product_code.trim())
            .bind(line.item_seq)
            .bind(&line.description)
            .bind(&line.unit)
            .bind(line.unit_factor)
            .bind(line.closure_flag.as_deref())
            .bind(line.qty_ordered.unwrap_or(0.0))
            .bind(qty_supplied)
            .bind(line.cartons)
            .bind(line.net_weight)
            .bind(qty_scanned)
            .bind(qty_scanned - qty_supplied)
            .bind(line.location.as_deref().unwrap_or("").trim())
            .bind(FLAG_PENDING)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(%key, inserted, "Picking snapshot inserted");
        Ok(inserted)
    }

    /// Applies one scan event to a line.
    ///
    /// ## What This Does
    /// 1. Atomically increments `qty_scanned` by `delta` and recomputes
    ///    `variance`, but only while the new total stays within
    ///    `qty_supplied` (the overpicking guard lives in the WHERE clause)
    /// 2. If the guard filtered the row out, distinguishes "no such line"
    ///    from "would overpick" without mutating anything
    /// 3. On success, recomputes the order-level status flag in the same
    ///    transaction
    ///
    /// ## Arguments
    /// * `key` - Order key
    /// * `product_code` - Product to credit the scan to
    /// * `delta` - Scanned quantity to add. Callers validate it is a
    ///   positive, finite number before it gets here.
    ///
    /// ## Returns
    /// * `Applied { completed }` - line updated; `completed` is true when the
    ///   whole order is now exactly reconciled
    /// * `NotFound` - no line for that product in this order
    /// * `Overpicking` - the delta would push scanned past supplied
    pub async fn apply_scan(
        &self,
        key: &OrderKey,
        product_code: &str,
        delta: f64,
    ) -> DbResult<ScanOutcome> {
        debug!(%key, product_code, delta, "Applying scan");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        // SET expressions read the pre-update row in SQLite, so both the new
        // total and the variance are computed from the same old qty_scanned.
        let result = sqlx::query(
            r#"
            UPDATE picking_detail SET
                qty_scanned = qty_scanned + ?6,
                variance = qty_scanned + ?6 - qty_supplied
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
              AND product_code = ?5
              AND qty_scanned + ?6 <= qty_supplied
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .bind(product_code)
        .bind(delta)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Nothing was written; dropping the transaction rolls back.
            let exists: i64 = sqlx::query_scalar(
                r#"
                SELECT COUNT(*)
                FROM picking_detail
                WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
                  AND product_code = ?5
                "#,
            )
            .bind(&key.company)
            .bind(&key.branch)
            .bind(&key.order_no)
            .bind(&key.sub_order_no)
            .bind(product_code)
            .fetch_one(&mut *tx)
            .await?;

            let outcome = if exists > 0 {
                ScanOutcome::Overpicking
            } else {
                ScanOutcome::NotFound
            };
            debug!(%key, product_code, ?outcome, "Scan rejected");
            return Ok(outcome);
        }

        let completed = Self::recompute_status_flag(&mut tx, key).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(%key, product_code, completed, "Scan applied");
        Ok(ScanOutcome::Applied { completed })
    }

    /// Zeroes the scanned quantity of one line.
    ///
    /// ## When This Occurs
    /// An operator mis-scanned (wrong product, double count) and wants the
    /// line back to a clean slate instead of issuing negative deltas.
    ///
    /// ## Returns
    /// `true` if a line was reset, `false` if no line matched.
    pub async fn reset_scan(&self, key: &OrderKey, product_code: &str) -> DbResult<bool> {
        debug!(%key, product_code, "Resetting scanned quantity");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE picking_detail SET
                qty_scanned = 0,
                variance = 0 - qty_supplied
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
              AND product_code = ?5
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .bind(product_code)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        Self::recompute_status_flag(&mut tx, key).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(true)
    }

    /// Deletes every active line of an order.
    ///
    /// ## When To Call
    /// Only after the assignment record confirms the order is finalized.
    /// This method performs no completion check of its own.
    ///
    /// ## Returns
    /// The number of lines deleted (0 when the order was already cleared).
    pub async fn clear_for_order(&self, key: &OrderKey) -> DbResult<u64> {
        debug!(%key, "Clearing picking worklist");

        let result = sqlx::query(
            r#"
            DELETE FROM picking_detail
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Recomputes and writes the order-level status flag.
    ///
    /// Runs inside the caller's transaction. The flag is `'1'` iff zero
    /// lines remain with `qty_scanned != qty_supplied`, and is written to
    /// every line of the order. Returns whether the order is complete.
    async fn recompute_status_flag(conn: &mut SqliteConnection, key: &OrderKey) -> DbResult<bool> {
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
        .fetch_one(&mut *conn)
        .await?;

        let flag = if pending == 0 { FLAG_COMPLETE } else { FLAG_PENDING };

        sqlx::query(
            r#"
            UPDATE picking_detail SET status_flag = ?5
            WHERE company = ?1 AND branch = ?2 AND order_no = ?3 AND sub_order_no = ?4
            "#,
        )
        .bind(&key.company)
        .bind(&key.branch)
        .bind(&key.order_no)
        .bind(&key.sub_order_no)
        .bind(flag)
        .execute(&mut *conn)
        .await?;

        Ok(pending == 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
