//! # Engine Error Types
//!
//! The one error type that crosses the engine boundary.
//!
//! ## Outcomes vs Errors
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Business conditions        →  typed statuses in the DTOs              │
//! │  (overpicking, not started,    (ScanStatus, FinishStatus, ...)         │
//! │   pending items, ...)                                                   │
//! │                                                                         │
//! │  Infrastructure faults      →  EngineError                             │
//! │  (store down, gateway                                                   │
//! │   unreachable, malformed                                                │
//! │   input)                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A caller that sees `Err` knows something is broken, not that a rule
//! fired.

use thiserror::Error;

use crate::gateway::GatewayError;
use despacho_core::{CoreError, ValidationError};
use despacho_db::DbError;

/// Errors that can leave the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain-level failure (malformed date, malformed scan payload).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Input failed validation before any work happened.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The picking store failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// An external collaborator (ERP procedure, user directory) failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_converts() {
        let core = CoreError::InvalidDate {
            input: "2026-13-01".to_string(),
        };
        let engine: EngineError = core.into();
        assert!(matches!(engine, EngineError::Core(_)));
        assert!(engine.to_string().contains("2026-13-01"));
    }

    #[test]
    fn test_validation_error_converts() {
        let validation = ValidationError::Required {
            field: "product_code".to_string(),
        };
        let engine: EngineError = validation.into();
        assert!(matches!(engine, EngineError::Validation(_)));
    }

    #[test]
    fn test_gateway_error_converts() {
        let gateway = GatewayError::Unreachable("erp offline".to_string());
        let engine: EngineError = gateway.into();
        assert!(engine.to_string().contains("erp offline"));
    }
}
