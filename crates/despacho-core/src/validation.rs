//! # Validation Module
//!
//! Input validation for caller-supplied identifiers and quantities. These
//! checks run before any storage or ERP work; the database's NOT NULL and
//! CHECK constraints back them up as a second layer.
//!
//! ## Usage
//! ```rust
//! use despacho_core::validation::{validate_product_code, validate_scan_quantity};
//!
//! let code = validate_product_code(" 105.00123 ").unwrap();
//! assert_eq!(code, "105.00123");
//!
//! validate_scan_quantity(2.5).unwrap();
//! assert!(validate_scan_quantity(0.0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::OrderKey;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Key Validators
// =============================================================================

/// Validates that every part of an order key is present.
///
/// ## Rules
/// - All four parts must be non-empty after trimming
///
/// [`OrderKey::new`] already trims, so emptiness is the only failure mode.
pub fn validate_order_key(key: &OrderKey) -> ValidationResult<()> {
    let parts = [
        ("company", &key.company),
        ("branch", &key.branch),
        ("order_no", &key.order_no),
        ("sub_order_no", &key.sub_order_no),
    ];

    for (field, value) in parts {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
///
/// ## Returns
/// The trimmed code.
pub fn validate_product_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "product_code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "product_code".to_string(),
            max: 50,
        });
    }

    Ok(code.to_string())
}

/// Validates a user (registrant/preparer) code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 20 characters
///
/// ## Returns
/// The trimmed code.
pub fn validate_user_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "user_code".to_string(),
        });
    }

    if code.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "user_code".to_string(),
            max: 20,
        });
    }

    Ok(code.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a scan quantity delta.
///
/// ## Rules
/// - Must be strictly positive (corrections go through reset, not negatives)
/// - Must be finite (NaN and infinities parse as f64 but are not quantities)
pub fn validate_scan_quantity(qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates listing pagination parameters.
///
/// ## Rules
/// - `page` and `page_size` must both be >= 1
/// - No upper bound: header lookup deliberately requests one oversized page
pub fn validate_paging(page: u32, page_size: u32) -> ValidationResult<()> {
    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        });
    }

    if page_size == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page_size".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_order_key() {
        let key = OrderKey::new("01", "01", "0001234", "0000010");
        assert!(validate_order_key(&key).is_ok());

        let missing_order = OrderKey::new("01", "01", "  ", "0000010");
        assert!(validate_order_key(&missing_order).is_err());

        let missing_company = OrderKey::new("", "01", "0001234", "0000010");
        assert!(validate_order_key(&missing_company).is_err());
    }

    #[test]
    fn test_validate_product_code() {
        assert_eq!(validate_product_code(" 10500123 ").unwrap(), "10500123");
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("   ").is_err());
        assert!(validate_product_code(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_user_code() {
        assert_eq!(validate_user_code("P01").unwrap(), "P01");
        assert!(validate_user_code("").is_err());
        assert!(validate_user_code(&"U".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_scan_quantity() {
        assert!(validate_scan_quantity(1.0).is_ok());
        assert!(validate_scan_quantity(0.5).is_ok());

        assert!(validate_scan_quantity(0.0).is_err());
        assert!(validate_scan_quantity(-2.0).is_err());
        assert!(validate_scan_quantity(f64::NAN).is_err());
        assert!(validate_scan_quantity(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_paging() {
        assert!(validate_paging(1, 20).is_ok());
        assert!(validate_paging(3, 5000).is_ok());

        assert!(validate_paging(0, 20).is_err());
        assert!(validate_paging(1, 0).is_err());
    }
}
