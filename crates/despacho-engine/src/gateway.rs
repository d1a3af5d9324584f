//! # Collaborator Gateways
//!
//! Async trait seams for the two external systems the engine consumes: the
//! ERP stored procedures and the user identity directory.
//!
//! ## Why Traits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DispatchService ──► Arc<dyn ErpGateway> ──┬──► production: ODBC/TDS   │
//! │                                            └──► tests: in-memory stub  │
//! │                                                                         │
//! │  DispatchService ──► Arc<dyn UserDirectory> ─┬─► production: ERP users │
//! │                                              └─► tests: fixed list    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The engine never learns how the procedures are reached. Every test in
//! this workspace runs against stubs; the production adapters live with the
//! process bootstrap, outside this workspace.

use async_trait::async_trait;
use thiserror::Error;

use despacho_core::{DispatchHeader, ErpDetailLine, OrderKey, Period, UserRecord};

/// Errors raised by collaborator implementations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote system could not be reached.
    #[error("Collaborator unreachable: {0}")]
    Unreachable(String),

    /// The remote call ran and failed.
    #[error("Collaborator call failed: {0}")]
    Procedure(String),
}

/// The ERP stored procedures the picking workflow reads from.
#[async_trait]
pub trait ErpGateway: Send + Sync {
    /// Fetches candidate dispatch headers for a company/branch and an
    /// optional period range.
    ///
    /// ## Arguments
    /// * `company` / `branch` - Scope of the listing
    /// * `from` / `to` - Period bounds; a `None` side is passed through
    ///   unbounded, mirroring the procedure's NULL parameters
    ///
    /// ## Returns
    /// The full result set. The engine paginates in memory.
    async fn fetch_headers(
        &self,
        company: &str,
        branch: &str,
        from: Option<Period>,
        to: Option<Period>,
    ) -> Result<Vec<DispatchHeader>, GatewayError>;

    /// Fetches the detail lines of one order.
    ///
    /// Called exactly once per order under normal operation: the engine
    /// snapshots the result and never asks again while the order is active.
    async fn fetch_detail(&self, key: &OrderKey) -> Result<Vec<ErpDetailLine>, GatewayError>;
}

/// The identity directory that resolves warehouse user codes.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolves a user code to its display name.
    ///
    /// ## Returns
    /// * `Ok(Some(name))` - Known code
    /// * `Ok(None)` - No such user
    async fn resolve_name(&self, company: &str, code: &str) -> Result<Option<String>, GatewayError>;

    /// Lists the users of a company, for preparer/registrant pickers.
    async fn list_users(&self, company: &str) -> Result<Vec<UserRecord>, GatewayError>;
}
