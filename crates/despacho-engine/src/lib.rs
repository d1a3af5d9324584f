//! # despacho-engine: Dispatch Operations Facade
//!
//! The orchestration layer of Despacho. Every picking workflow a view layer
//! can trigger lives here as one method on [`DispatchService`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Despacho Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    View layer (excluded)                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │  camelCase DTOs                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ despacho-engine (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   DispatchService                                               │   │
//! │  │     ├── list_dispatches / find_header       (listing)          │   │
//! │  │     ├── order_header / assignment           (who + timing)     │   │
//! │  │     ├── materialize_detail / read_detail    (worklist)         │   │
//! │  │     ├── apply_scan / apply_scan_payload     (reconciliation)   │   │
//! │  │     ├── reset_scan                          (corrections)      │   │
//! │  │     ├── assign_users / list_users           (people)           │   │
//! │  │     ├── mark_start / mark_finish            (timing)           │   │
//! │  │     └── complete_order                      (clear worklist)   │   │
//! │  │                                                                 │   │
//! │  │   Collaborator seams:                                           │   │
//! │  │     ErpGateway ──────► header + detail procedures               │   │
//! │  │     UserDirectory ───► code → display-name resolution           │   │
//! │  └───────────┬─────────────────────────────────┬───────────────────┘   │
//! │              │                                 │                        │
//! │  ┌───────────▼───────────┐         ┌───────────▼───────────┐           │
//! │  │    despacho-core      │         │     despacho-db       │           │
//! │  │    (pure domain)      │         │   (SQLite store)      │           │
//! │  └───────────────────────┘         └───────────────────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`service`] - The [`DispatchService`] facade
//! - [`gateway`] - Collaborator traits (ERP procedures, user directory)
//! - [`dto`] - camelCase response types exported to TypeScript
//! - [`error`] - Engine error type
//!
//! ## Outcome Discipline
//!
//! Expected business conditions (overpicking, not started, pending items,
//! missing preparer...) come back as typed statuses inside the DTOs. Only
//! infrastructure faults (store down, gateway unreachable, malformed input)
//! surface as [`EngineError`].

pub mod dto;
pub mod error;
pub mod gateway;
pub mod service;

pub use dto::{
    AssignResponse, AssignStatus, AssignmentView, CompleteResponse, CompleteStatus, DetailResponse,
    DispatchHeaderView, DispatchPage, FinishResponse, FinishStatus, OrderHeaderResponse,
    PickingLineView, ScanResponse, ScanStatus, StartResponse, StartStatus,
};
pub use error::{EngineError, EngineResult};
pub use gateway::{ErpGateway, GatewayError, UserDirectory};
pub use service::DispatchService;
