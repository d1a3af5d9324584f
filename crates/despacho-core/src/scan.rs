//! # Scan Payload Parsing
//!
//! Supplied cartons carry QR labels with a pipe-delimited payload. Two label
//! layouts circulate in the warehouse, distinguished by field count after
//! empty fields are dropped:
//!
//! ```text
//! 9 fields:   [0]    [1]      [2]   [3]       [4]   [5]  [6]  [7]     [8]
//!             type │ order  │ ...│ product │ qty │ ... │ ...│ label │ ...
//!
//! 8 fields:   [0]    [1]       [2]   [3]   [4]     [5]  [6]  [7]
//!             type │ product │ qty │ ... │ label │ ...│ ... │ ...
//! ```
//!
//! Product codes are printed with dot separators (`105.00.123`) that the ERP
//! does not store; quantities may use a comma decimal mark. Both are
//! normalized here. The label field is the carton's unique tag, kept so
//! callers can de-duplicate repeated reads of the same physical label.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Scan Payload
// =============================================================================

/// A parsed QR label payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ScanPayload {
    /// Product code with dot separators stripped.
    pub product_code: String,

    /// Scanned quantity (decimal; comma marks normalized to dots).
    pub quantity: f64,

    /// Unique carton label, for caller-side de-duplication.
    pub label: String,

    /// Order number printed on 9-field labels; absent on 8-field labels.
    pub order_hint: Option<String>,
}

impl ScanPayload {
    /// Checks the label's printed order number against an expected one.
    ///
    /// Labels without an order hint match any order.
    pub fn matches_order(&self, order_no: &str) -> bool {
        match &self.order_hint {
            Some(hint) => hint.trim() == order_no.trim(),
            None => true,
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a raw QR label payload into a [`ScanPayload`].
///
/// ## Example
/// ```rust
/// use despacho_core::scan::parse_scan_payload;
///
/// let payload = parse_scan_payload("PPC|0001234|20260810|105.00.123|25,5|PE|L01|ET00871|F")
///     .unwrap();
/// assert_eq!(payload.product_code, "10500123");
/// assert_eq!(payload.quantity, 25.5);
/// assert_eq!(payload.label, "ET00871");
/// assert_eq!(payload.order_hint.as_deref(), Some("0001234"));
/// ```
pub fn parse_scan_payload(raw: &str) -> CoreResult<ScanPayload> {
    let fields: Vec<&str> = raw
        .trim()
        .split('|')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .collect();

    match fields.len() {
        9 => assemble(Some(fields[1]), fields[3], fields[4], fields[7]),
        8 => assemble(None, fields[1], fields[2], fields[4]),
        count => Err(CoreError::MalformedScanPayload {
            reason: format!("expected 8 or 9 fields, got {count}"),
        }),
    }
}

fn assemble(
    order_hint: Option<&str>,
    product_raw: &str,
    quantity_raw: &str,
    label: &str,
) -> CoreResult<ScanPayload> {
    let product_code = product_raw.replace('.', "");
    if product_code.is_empty() {
        return Err(CoreError::MalformedScanPayload {
            reason: "empty product code".to_string(),
        });
    }

    let quantity: f64 = quantity_raw.replace(',', ".").parse().map_err(|_| {
        CoreError::MalformedScanPayload {
            reason: format!("quantity '{quantity_raw}' is not a number"),
        }
    })?;

    // "NaN" and "inf" parse successfully as f64 but are not quantities.
    if !quantity.is_finite() {
        return Err(CoreError::MalformedScanPayload {
            reason: format!("quantity '{quantity_raw}' is not finite"),
        });
    }

    Ok(ScanPayload {
        product_code,
        quantity,
        label: label.to_string(),
        order_hint: order_hint.map(|hint| hint.to_string()),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const NINE_FIELD: &str = "PPC|0001234|20260810|105.00.123|25,5|PE|L01|ET00871|F";
    const EIGHT_FIELD: &str = "PRD|105.00.123|12|PE|ET00872|L01|X|F";

    #[test]
    fn test_parse_nine_field_layout() {
        let payload = parse_scan_payload(NINE_FIELD).unwrap();
        assert_eq!(payload.product_code, "10500123");
        assert_eq!(payload.quantity, 25.5);
        assert_eq!(payload.label, "ET00871");
        assert_eq!(payload.order_hint.as_deref(), Some("0001234"));
    }

    #[test]
    fn test_parse_eight_field_layout() {
        let payload = parse_scan_payload(EIGHT_FIELD).unwrap();
        assert_eq!(payload.product_code, "10500123");
        assert_eq!(payload.quantity, 12.0);
        assert_eq!(payload.label, "ET00872");
        assert_eq!(payload.order_hint, None);
    }

    #[test]
    fn test_dot_separators_stripped() {
        let payload = parse_scan_payload("PRD|1.0.5.0.0.1.2.3|1|PE|ET1|L|X|F").unwrap();
        assert_eq!(payload.product_code, "10500123");
    }

    #[test]
    fn test_plain_decimal_quantity() {
        let payload = parse_scan_payload("PRD|10500123|3.75|PE|ET1|L|X|F").unwrap();
        assert_eq!(payload.quantity, 3.75);
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        assert!(parse_scan_payload("").is_err());
        assert!(parse_scan_payload("just-one-field").is_err());
        assert!(parse_scan_payload("a|b|c|d").is_err());
        assert!(parse_scan_payload("a|b|c|d|e|f|g|h|i|j").is_err());
    }

    #[test]
    fn test_empty_fields_collapse_before_counting() {
        // Nine raw fields with one blank collapse to eight, shifting the layout.
        let payload = parse_scan_payload("PRD||105.00.123|12|PE|ET00873|L01|X|F").unwrap();
        assert_eq!(payload.product_code, "10500123");
        assert_eq!(payload.label, "ET00873");
        assert_eq!(payload.order_hint, None);
    }

    #[test]
    fn test_dots_only_product_rejected() {
        assert!(parse_scan_payload("PRD|...|12|PE|ET1|L|X|F").is_err());
    }

    #[test]
    fn test_bad_quantity_rejected() {
        assert!(parse_scan_payload("PRD|10500123|doce|PE|ET1|L|X|F").is_err());
        assert!(parse_scan_payload("PRD|10500123|NaN|PE|ET1|L|X|F").is_err());
        assert!(parse_scan_payload("PRD|10500123|inf|PE|ET1|L|X|F").is_err());
    }

    #[test]
    fn test_matches_order() {
        let with_hint = parse_scan_payload(NINE_FIELD).unwrap();
        assert!(with_hint.matches_order("0001234"));
        assert!(with_hint.matches_order(" 0001234 "));
        assert!(!with_hint.matches_order("0009999"));

        let without_hint = parse_scan_payload(EIGHT_FIELD).unwrap();
        assert!(without_hint.matches_order("anything"));
    }
}
