//! # Domain Types
//!
//! Core domain types used throughout Despacho.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────┐      │
//! │  │    OrderKey     │   │  PickingLine    │   │PickingAssignment │      │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────  │      │
//! │  │  company        │   │  key + product  │   │  key             │      │
//! │  │  branch         │   │  qty_supplied   │   │  preparer        │      │
//! │  │  order_no       │   │  qty_scanned    │   │  registrant      │      │
//! │  │  sub_order_no   │   │  variance       │   │  started_at      │      │
//! │  └─────────────────┘   │  status_flag    │   │  finished_at     │      │
//! │                        └─────────────────┘   │  duration_min    │      │
//! │  ┌─────────────────┐                         └──────────────────┘      │
//! │  │ DispatchHeader  │   ┌─────────────────┐   ┌──────────────────┐      │
//! │  │  ─────────────  │   │  ScanOutcome    │   │  FinishOutcome   │      │
//! │  │  order_no       │   │  ─────────────  │   │  ──────────────  │      │
//! │  │  customer       │   │  Applied        │   │  Finished        │      │
//! │  │  status_text    │   │  NotFound       │   │  PendingItems    │      │
//! │  │  (not persisted)│   │  Overpicking    │   │  NotStarted      │      │
//! │  └─────────────────┘   └─────────────────┘   └──────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Natural-Key Identity
//! Every persisted row is keyed by the ERP's natural composite key
//! (company, branch, order_no, sub_order_no[, product_code]). There are no
//! surrogate ids: the ERP key is the identity everywhere.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Completion Flag
// =============================================================================

/// Order-level status flag value while any line is still pending.
pub const FLAG_PENDING: &str = "0";

/// Order-level status flag value once every line is exactly reconciled.
pub const FLAG_COMPLETE: &str = "1";

/// Textual form used when timestamps leave the engine.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Order Key
// =============================================================================

/// The natural key of one dispatch order (one picking job).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderKey {
    /// Company code.
    pub company: String,

    /// Branch code.
    pub branch: String,

    /// Dispatch-preparation order number.
    pub order_no: String,

    /// Sub-order (delivery order) number.
    pub sub_order_no: String,
}

impl OrderKey {
    /// Builds a key, trimming every part.
    ///
    /// ERP columns are CHAR-padded; trimming on construction means the rest
    /// of the system never compares padded strings.
    pub fn new(company: &str, branch: &str, order_no: &str, sub_order_no: &str) -> Self {
        OrderKey {
            company: company.trim().to_string(),
            branch: branch.trim().to_string(),
            order_no: order_no.trim().to_string(),
            sub_order_no: sub_order_no.trim().to_string(),
        }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}-{}",
            self.company, self.branch, self.order_no, self.sub_order_no
        )
    }
}

// =============================================================================
// Dispatch Header
// =============================================================================

/// A pending dispatch order as listed by the ERP.
///
/// Not persisted: fetched fresh from the listing procedure per query and
/// paginated in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DispatchHeader {
    /// Dispatch-preparation order number.
    pub order_no: String,

    /// Sub-order (delivery order) number.
    pub sub_order_no: String,

    /// Document date as the ERP formats it.
    pub doc_date: String,

    /// Customer display name.
    pub customer: String,

    /// Delivery address.
    pub address: Option<String>,

    /// Free-form order observation.
    pub observation: Option<String>,

    /// Human-readable order situation text.
    pub status_text: Option<String>,

    /// Commercial order reference from the originating sales document.
    pub commercial_ref: Option<String>,
}

impl DispatchHeader {
    /// Trimmed comparison against an order / sub-order pair.
    ///
    /// The listing procedure returns CHAR-padded numbers, so lookups must
    /// never compare raw strings.
    pub fn matches(&self, order_no: &str, sub_order_no: &str) -> bool {
        self.order_no.trim() == order_no.trim() && self.sub_order_no.trim() == sub_order_no.trim()
    }
}

// =============================================================================
// ERP Detail Line
// =============================================================================

/// One detail line as returned by the ERP detail procedure.
///
/// Carries the full line field set minus the four order-key fields, which
/// are stamped on at materialization. Quantity fields are optional because
/// the procedure returns NULL for lines never touched by supply; they
/// default to zero when the snapshot is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErpDetailLine {
    pub item_seq: i64,
    pub description: String,
    pub unit: String,
    pub unit_factor: Option<f64>,
    pub closure_flag: Option<String>,
    pub product_code: String,
    pub qty_ordered: Option<f64>,
    pub qty_supplied: Option<f64>,
    pub cartons: Option<f64>,
    pub net_weight: Option<f64>,
    pub qty_scanned: Option<f64>,
    pub location: Option<String>,
}

// =============================================================================
// Picking Line
// =============================================================================

/// One product line of an active picking worklist.
///
/// Created in bulk when the order's snapshot is first materialized, mutated
/// by scan events, deleted in bulk when the order is completed.
///
/// Invariant: `qty_scanned <= qty_supplied` at all times (overpicking guard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PickingLine {
    pub company: String,
    pub branch: String,
    pub order_no: String,
    pub sub_order_no: String,
    pub product_code: String,

    /// Display sequence from the ERP detail procedure.
    pub item_seq: i64,
    pub description: String,
    /// Unit of measure.
    pub unit: String,
    /// Unit-of-measure factor.
    pub unit_factor: Option<f64>,
    /// ERP closure indicator, carried verbatim.
    pub closure_flag: Option<String>,

    /// Quantity the order asks to dispatch.
    pub qty_ordered: f64,
    /// Quantity actually supplied to the picking area (the scan ceiling).
    pub qty_supplied: f64,
    /// Carton count.
    pub cartons: Option<f64>,
    pub net_weight: Option<f64>,

    /// Accumulated scanned quantity.
    pub qty_scanned: f64,
    /// `qty_scanned - qty_supplied` (non-positive under the invariant).
    pub variance: f64,
    /// Warehouse storage location (read ordering key).
    pub location: String,
    /// Order-level completion flag: [`FLAG_COMPLETE`] or [`FLAG_PENDING`].
    pub status_flag: String,
}

impl PickingLine {
    /// True while this line still needs scans to match its supplied quantity.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.qty_scanned != self.qty_supplied
    }
}

// =============================================================================
// Picking History Line
// =============================================================================

/// An archived picking line, immutable once written.
///
/// Same shape as [`PickingLine`]; rows move here when an order finalizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PickingHistoryLine {
    pub company: String,
    pub branch: String,
    pub order_no: String,
    pub sub_order_no: String,
    pub product_code: String,

    pub item_seq: i64,
    pub description: String,
    pub unit: String,
    pub unit_factor: Option<f64>,
    pub closure_flag: Option<String>,

    pub qty_ordered: f64,
    pub qty_supplied: f64,
    pub cartons: Option<f64>,
    pub net_weight: Option<f64>,

    pub qty_scanned: f64,
    pub variance: f64,
    pub location: String,
    pub status_flag: String,
}

impl From<PickingHistoryLine> for PickingLine {
    /// Archived lines are served through the same worklist shape as active
    /// ones, so finalized orders render identically.
    fn from(line: PickingHistoryLine) -> Self {
        PickingLine {
            company: line.company,
            branch: line.branch,
            order_no: line.order_no,
            sub_order_no: line.sub_order_no,
            product_code: line.product_code,
            item_seq: line.item_seq,
            description: line.description,
            unit: line.unit,
            unit_factor: line.unit_factor,
            closure_flag: line.closure_flag,
            qty_ordered: line.qty_ordered,
            qty_supplied: line.qty_supplied,
            cartons: line.cartons,
            net_weight: line.net_weight,
            qty_scanned: line.qty_scanned,
            variance: line.variance,
            location: line.location,
            status_flag: line.status_flag,
        }
    }
}

// =============================================================================
// Scan Outcome
// =============================================================================

/// Result of applying one scan event at the store level.
///
/// A closed enumeration: callers handle every case, nothing travels as a
/// bare string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The line was updated; `completed` reports whether every line of the
    /// order is now exactly reconciled.
    Applied { completed: bool },
    /// No line exists for that product in this order. No mutation.
    NotFound,
    /// The delta would push scanned past supplied. No mutation.
    Overpicking,
}

// =============================================================================
// Picking Assignment
// =============================================================================

/// The one-row-per-order assignment and timing record.
///
/// Created lazily the first time an order's detail screen touches it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PickingAssignment {
    pub company: String,
    pub branch: String,
    pub order_no: String,
    pub sub_order_no: String,

    /// Who registered the order in the system.
    pub registrant_code: Option<String>,
    pub registrant_name: Option<String>,

    /// Who physically prepares the order. Required before start.
    pub preparer_code: Option<String>,
    pub preparer_name: Option<String>,

    /// When preparation started. Required before any scan.
    #[ts(as = "Option<String>")]
    pub started_at: Option<DateTime<Utc>>,

    /// When preparation finished. Present = the order is finalized.
    #[ts(as = "Option<String>")]
    pub finished_at: Option<DateTime<Utc>>,

    /// `(finished_at - started_at)` in minutes, two decimals, stored.
    pub duration_min: Option<f64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl PickingAssignment {
    /// An order is finalized once its end timestamp is on record.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finished_at.is_some()
    }

    /// True once a start timestamp is on record (scans are accepted).
    #[inline]
    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// True when a non-blank preparer code is assigned (start is allowed).
    pub fn preparer_assigned(&self) -> bool {
        matches!(self.preparer_code.as_deref(), Some(code) if !code.trim().is_empty())
    }

    /// Start timestamp in [`TIMESTAMP_DISPLAY_FORMAT`].
    pub fn started_label(&self) -> Option<String> {
        self.started_at
            .map(|ts| ts.format(TIMESTAMP_DISPLAY_FORMAT).to_string())
    }

    /// End timestamp in [`TIMESTAMP_DISPLAY_FORMAT`].
    pub fn finished_label(&self) -> Option<String> {
        self.finished_at
            .map(|ts| ts.format(TIMESTAMP_DISPLAY_FORMAT).to_string())
    }
}

// =============================================================================
// Start Outcome
// =============================================================================

/// Result of attempting to start an order's preparation timer.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// Start recorded at the carried timestamp. Re-entrant: starting an
    /// already-started order re-opens the timing window.
    Started { started_at: DateTime<Utc> },
    /// No preparer code on record. Nothing written.
    MissingPreparer,
    /// The order already has an end timestamp. Nothing written.
    AlreadyFinalized,
}

// =============================================================================
// Finish Outcome
// =============================================================================

/// Result of attempting to finish an order's preparation.
#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    /// Finish recorded; carries the persisted end timestamp and duration.
    Finished {
        finished_at: DateTime<Utc>,
        duration_min: f64,
    },
    /// Lines with `scanned != supplied` remain; carries the pending count.
    PendingItems { pending: i64 },
    /// No start timestamp on record.
    NotStarted,
    /// The order already has an end timestamp.
    AlreadyFinalized,
}

// =============================================================================
// Detail Source
// =============================================================================

/// Which table a worklist read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DetailSource {
    /// The live picking snapshot.
    Active,
    /// The immutable archive (order is finalized).
    Archive,
}

// =============================================================================
// User Record
// =============================================================================

/// A warehouse user as listed by the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserRecord {
    pub code: String,
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
