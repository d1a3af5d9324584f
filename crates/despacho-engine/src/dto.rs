//! # View-Layer DTOs
//!
//! Response types crossing the engine boundary.
//!
//! ## Why DTOs?
//! - Decouples the domain model from the view contract
//! - Allows selective field exposure (line views drop the order key the
//!   response is already scoped to)
//! - Handles serde rename to camelCase for JS consumption
//! - Timestamps leave as pre-formatted labels, never raw RFC 3339
//!
//! Every expected business condition travels as a typed status enum inside
//! its response; hard errors never reach these types.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use despacho_core::{
    DetailSource, DispatchHeader, FinishOutcome, PickingAssignment, PickingLine, ScanOutcome,
    StartOutcome, TIMESTAMP_DISPLAY_FORMAT,
};

// =============================================================================
// Dispatch Listing
// =============================================================================

/// One dispatch header row of the listing screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DispatchHeaderView {
    pub order_no: String,
    pub sub_order_no: String,
    pub doc_date: String,
    pub customer: String,
    pub address: Option<String>,
    pub observation: Option<String>,
    pub status_text: Option<String>,
    pub commercial_ref: Option<String>,
}

impl From<DispatchHeader> for DispatchHeaderView {
    fn from(h: DispatchHeader) -> Self {
        DispatchHeaderView {
            order_no: h.order_no.trim().to_string(),
            sub_order_no: h.sub_order_no.trim().to_string(),
            doc_date: h.doc_date,
            customer: h.customer,
            address: h.address,
            observation: h.observation,
            status_text: h.status_text,
            commercial_ref: h.commercial_ref,
        }
    }
}

/// One page of the dispatch listing, sliced in memory.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DispatchPage {
    pub items: Vec<DispatchHeaderView>,
    /// Size of the full (unsliced) result set.
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
}

// =============================================================================
// Worklist Detail
// =============================================================================

/// One worklist line as the detail grid renders it.
///
/// The order key is dropped: the response is already scoped to one order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PickingLineView {
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

impl From<PickingLine> for PickingLineView {
    fn from(l: PickingLine) -> Self {
        PickingLineView {
            product_code: l.product_code,
            item_seq: l.item_seq,
            description: l.description,
            unit: l.unit,
            unit_factor: l.unit_factor,
            closure_flag: l.closure_flag,
            qty_ordered: l.qty_ordered,
            qty_supplied: l.qty_supplied,
            cartons: l.cartons,
            net_weight: l.net_weight,
            qty_scanned: l.qty_scanned,
            variance: l.variance,
            location: l.location,
            status_flag: l.status_flag,
        }
    }
}

/// A full worklist read, from either the active table or the archive.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DetailResponse {
    /// Which table served this read.
    pub source: DetailSource,
    /// True when the worklist is non-empty and every line is reconciled.
    pub completed: bool,
    pub lines: Vec<PickingLineView>,
}

impl DetailResponse {
    /// Builds a response from worklist lines, computing completion.
    pub fn from_lines(source: DetailSource, lines: Vec<PickingLine>) -> Self {
        let completed = !lines.is_empty() && lines.iter().all(|l| !l.is_pending());
        DetailResponse {
            source,
            completed,
            lines: lines.into_iter().map(PickingLineView::from).collect(),
        }
    }
}

// =============================================================================
// Order Header
// =============================================================================

/// The detail screen's header block: dispatch header merged with the
/// order's assignment and timing record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderHeaderResponse {
    pub order_no: String,
    pub sub_order_no: String,
    pub doc_date: String,
    pub customer: String,
    pub address: Option<String>,
    pub observation: Option<String>,
    pub status_text: Option<String>,
    pub commercial_ref: Option<String>,

    pub registrant_code: Option<String>,
    pub registrant_name: Option<String>,
    pub preparer_code: Option<String>,
    pub preparer_name: Option<String>,

    /// Start timestamp label, `YYYY-MM-DD HH:MM:SS`.
    pub started_at: Option<String>,
    /// End timestamp label, `YYYY-MM-DD HH:MM:SS`.
    pub finished_at: Option<String>,
    pub duration_min: Option<f64>,
}

impl OrderHeaderResponse {
    /// Merges a dispatch header with the assignment on record.
    pub fn merge(header: DispatchHeader, assignment: PickingAssignment) -> Self {
        let view = DispatchHeaderView::from(header);
        OrderHeaderResponse {
            order_no: view.order_no,
            sub_order_no: view.sub_order_no,
            doc_date: view.doc_date,
            customer: view.customer,
            address: view.address,
            observation: view.observation,
            status_text: view.status_text,
            commercial_ref: view.commercial_ref,
            registrant_code: assignment.registrant_code.clone(),
            registrant_name: assignment.registrant_name.clone(),
            preparer_code: assignment.preparer_code.clone(),
            preparer_name: assignment.preparer_name.clone(),
            started_at: assignment.started_label(),
            finished_at: assignment.finished_label(),
            duration_min: assignment.duration_min,
        }
    }
}

// =============================================================================
// Assignment
// =============================================================================

/// The assignment record as the view renders it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssignmentView {
    pub registrant_code: Option<String>,
    pub registrant_name: Option<String>,
    pub preparer_code: Option<String>,
    pub preparer_name: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub duration_min: Option<f64>,
}

impl From<PickingAssignment> for AssignmentView {
    fn from(a: PickingAssignment) -> Self {
        AssignmentView {
            started_at: a.started_label(),
            finished_at: a.finished_label(),
            registrant_code: a.registrant_code,
            registrant_name: a.registrant_name,
            preparer_code: a.preparer_code,
            preparer_name: a.preparer_name,
            duration_min: a.duration_min,
        }
    }
}

// =============================================================================
// Scan
// =============================================================================

/// Outcome of a scan or reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ScanStatus {
    /// The line was updated.
    Applied,
    /// No line for that product in this order.
    NotFound,
    /// The delta would push scanned past supplied.
    Overpicking,
    /// The order has no start timestamp yet.
    NotStarted,
    /// The order is finalized; its worklist is immutable.
    Finalized,
    /// The label belongs to a different order (payload path only).
    WrongOrder,
}

impl From<ScanOutcome> for ScanStatus {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Applied { .. } => ScanStatus::Applied,
            ScanOutcome::NotFound => ScanStatus::NotFound,
            ScanOutcome::Overpicking => ScanStatus::Overpicking,
        }
    }
}

/// Response to a scan or reset request.
///
/// `lines` carries the refreshed worklist only when the mutation went
/// through; rejections come back with an empty list and the view keeps
/// what it has.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScanResponse {
    pub status: ScanStatus,
    /// True when every line of the order is now exactly reconciled.
    pub completed: bool,
    pub lines: Vec<PickingLineView>,
}

impl ScanResponse {
    /// A rejection: no mutation happened, no lines travel back.
    pub fn rejected(status: ScanStatus) -> Self {
        ScanResponse {
            status,
            completed: false,
            lines: Vec::new(),
        }
    }
}

// =============================================================================
// Assign
// =============================================================================

/// Outcome of a user assignment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AssignStatus {
    /// The supplied codes were resolved and stored.
    Applied,
    /// A supplied code is unknown to the directory. Nothing was stored.
    UnknownUser,
}

/// Response to a user assignment request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssignResponse {
    pub status: AssignStatus,
    /// The code the directory could not resolve, when rejected.
    pub unknown_code: Option<String>,
    /// The assignment now on record, when applied.
    pub assignment: Option<AssignmentView>,
}

impl AssignResponse {
    pub fn applied(assignment: AssignmentView) -> Self {
        AssignResponse {
            status: AssignStatus::Applied,
            unknown_code: None,
            assignment: Some(assignment),
        }
    }

    pub fn unknown_user(code: impl Into<String>) -> Self {
        AssignResponse {
            status: AssignStatus::UnknownUser,
            unknown_code: Some(code.into()),
            assignment: None,
        }
    }
}

// =============================================================================
// Start / Finish
// =============================================================================

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StartStatus {
    Started,
    /// No preparer on record; assign one first.
    MissingPreparer,
    /// The order is finalized; timing transitions are closed.
    AlreadyFinalized,
}

/// Response to a start request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StartResponse {
    pub status: StartStatus,
    /// Start timestamp label when started.
    pub started_at: Option<String>,
}

impl From<StartOutcome> for StartResponse {
    fn from(outcome: StartOutcome) -> Self {
        match outcome {
            StartOutcome::Started { started_at } => StartResponse {
                status: StartStatus::Started,
                started_at: Some(started_at.format(TIMESTAMP_DISPLAY_FORMAT).to_string()),
            },
            StartOutcome::MissingPreparer => StartResponse {
                status: StartStatus::MissingPreparer,
                started_at: None,
            },
            StartOutcome::AlreadyFinalized => StartResponse {
                status: StartStatus::AlreadyFinalized,
                started_at: None,
            },
        }
    }
}

/// Outcome of a finish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FinishStatus {
    Finished,
    /// Lines with `scanned != supplied` remain.
    PendingItems,
    /// No start timestamp on record.
    NotStarted,
    /// The order already has an end timestamp.
    AlreadyFinalized,
}

/// Response to a finish request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FinishResponse {
    pub status: FinishStatus,
    /// End timestamp label when finished.
    pub finished_at: Option<String>,
    /// Elapsed preparation minutes, 2 decimals, when finished.
    pub duration_min: Option<f64>,
    /// How many lines still need scans, when rejected for pending items.
    pub pending: Option<i64>,
}

impl From<FinishOutcome> for FinishResponse {
    fn from(outcome: FinishOutcome) -> Self {
        match outcome {
            FinishOutcome::Finished {
                finished_at,
                duration_min,
            } => FinishResponse {
                status: FinishStatus::Finished,
                finished_at: Some(finished_at.format(TIMESTAMP_DISPLAY_FORMAT).to_string()),
                duration_min: Some(duration_min),
                pending: None,
            },
            FinishOutcome::PendingItems { pending } => FinishResponse {
                status: FinishStatus::PendingItems,
                finished_at: None,
                duration_min: None,
                pending: Some(pending),
            },
            FinishOutcome::NotStarted => FinishResponse {
                status: FinishStatus::NotStarted,
                finished_at: None,
                duration_min: None,
                pending: None,
            },
            FinishOutcome::AlreadyFinalized => FinishResponse {
                status: FinishStatus::AlreadyFinalized,
                finished_at: None,
                duration_min: None,
                pending: None,
            },
        }
    }
}

// =============================================================================
// Complete
// =============================================================================

/// Outcome of a worklist completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CompleteStatus {
    /// Active lines were cleared; the archive takes over.
    Cleared,
    /// The order has no end timestamp; finish it first.
    NotFinalized,
}

/// Response to a worklist completion request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompleteResponse {
    pub status: CompleteStatus,
    /// How many active lines were deleted, when cleared.
    pub lines_cleared: Option<u64>,
}

// =============================================================================
// Unit Tests
// =============================================================================
