//! # History Repository
//!
//! Read-only access to archived picking worklists.
//!
//! Once an order is finalized, its active lines are cleared and a nightly
//! ERP job lands the completed worklist here. This repository never writes:
//! the archive is append-only from the outside and immutable from within.

use sqlx::SqlitePool;

use crate::error::DbResult;
use despacho_core::{OrderKey, PickingHistoryLine};

/// Repository for archived picking line reads.
#[derive(Debug, Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    /// Creates a new HistoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        HistoryRepository { pool }
    }

    /// Lists the archived lines of an order, in warehouse walking order
    /// (storage location, then item sequence).
    ///
    /// Returns an empty list when the archive job has not landed the order
    /// yet; finalized-but-not-yet-archived orders simply render empty.
    pub async fn list_for_order(&self, key: &OrderKey) -> DbResult<Vec<PickingHistoryLine>> {
        let lines: Vec<PickingHistoryLine> = sqlx::query_as::<_, PickingHistoryLine>(
            r#"
            SELECT
                company, branch, order_no, sub_order_no, product_code,
                item_seq, description, unit, unit_factor, closure_flag,
                qty_ordered, qty_supplied, cartons, net_weight,
                qty_scanned, variance, location, status_flag
            FROM picking_history
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
}

// =============================================================================
// Unit Tests
// =============================================================================
