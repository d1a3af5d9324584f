//! # despacho-core: Pure Domain Logic for Despacho
//!
//! This crate is the **heart** of Despacho. It contains the domain vocabulary
//! and pure functions of the warehouse picking workflow, with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Despacho Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    View layer (excluded)                        │   │
//! │  │    Order list ──► Detail grid ──► Scan box ──► Finish button   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  despacho-engine (facade)                       │   │
//! │  │    list_dispatches, materialize_detail, apply_scan, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ despacho-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  period   │  │   scan    │  │ validation│  │   │
//! │  │   │ OrderKey  │  │  yyyymm   │  │ QR payload│  │   rules   │  │   │
//! │  │   │PickingLine│  │  windows  │  │  parsing  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  despacho-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, picking repositories       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (OrderKey, PickingLine, PickingAssignment, etc.)
//! - [`period`] - Year-month period encoding used by the ERP listing procedure
//! - [`scan`] - Pipe-delimited QR label payload parsing
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Closed Outcomes**: Business results are enums, never bare strings
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use despacho_core::period::default_window;
//!
//! let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
//! let (from, to) = default_window(today);
//!
//! // February looks back across the year boundary to November.
//! assert_eq!(from.value(), 202511);
//! assert_eq!(to.value(), 202602);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod period;
pub mod scan;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use despacho_core::OrderKey` instead of
// `use despacho_core::types::OrderKey`

pub use error::{CoreError, CoreResult, ValidationError};
pub use period::Period;
pub use scan::ScanPayload;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default company code used when a caller does not specify one.
///
/// The ERP procedures are always invoked per company/branch pair; the
/// deployment this system serves runs a single company.
pub const DEFAULT_COMPANY: &str = "01";

/// Default branch code used when a caller does not specify one.
pub const DEFAULT_BRANCH: &str = "01";

/// Page size used when looking up a single header by order number.
///
/// Header lookup reuses the paged listing with one oversized page and scans
/// it linearly. An order outside this window is reported as not found.
pub const HEADER_LOOKUP_WINDOW: u32 = 5000;
