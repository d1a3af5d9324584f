//! # Error Types
//!
//! Domain-specific error types for despacho-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  despacho-core errors (this file)                                      │
//! │  ├── CoreError        - Domain input errors (dates, scan payloads)     │
//! │  └── ValidationError  - Field-level validation failures                │
//! │                                                                         │
//! │  despacho-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  despacho-engine errors (separate crate)                               │
//! │  └── EngineError      - What the view layer sees                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rejections (overpicking, not-started, pending items) are NOT
//! errors: they travel as outcome values. Only malformed input and
//! infrastructure faults use these types.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain input errors.
///
/// These represent input that cannot be interpreted at all, as opposed to
/// business conditions (which are reported as typed outcomes).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A date string that should name a calendar day could not be parsed.
    ///
    /// ## When This Occurs
    /// - A non-empty date filter that is not `YYYY-MM-DD`
    /// - Day/month values outside the calendar (e.g. `2026-13-01`)
    #[error("invalid date '{input}': expected YYYY-MM-DD")]
    InvalidDate { input: String },

    /// A scanned QR payload did not match any known label layout.
    ///
    /// ## When This Occurs
    /// - Wrong number of pipe-delimited fields
    /// - Empty product code or label field
    /// - Quantity field that is not a number
    #[error("malformed scan payload: {reason}")]
    MalformedScanPayload { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any storage work runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-finite quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
