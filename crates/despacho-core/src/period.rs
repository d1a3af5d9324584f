//! # Period Encoding
//!
//! The ERP listing procedure filters dispatch orders by year-month periods
//! encoded as `yyyymm` integers (e.g. `202608` = August 2026). This module
//! owns that encoding and the default listing window derived from "today".
//!
//! ## Default Window
//! ```text
//! today = 2026-02-10
//!
//!   202511   202512   202601   202602
//!   ┌──────┬────────┬────────┬──────┐
//!   │ Nov  │  Dec   │  Jan   │ Feb  │   four months, year wrap included
//!   └──────┴────────┴────────┴──────┘
//!   ▲ start                    ▲ end
//! ```

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// How many months before the current one the default listing window opens.
///
/// Together with the current month this yields a trailing four-month window.
pub const DEFAULT_WINDOW_MONTHS_BACK: u32 = 3;

// =============================================================================
// Period
// =============================================================================

/// A year-month period in the ERP's `yyyymm` encoding.
///
/// Ordering follows the numeric encoding, which is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Period(u32);

impl Period {
    /// Builds a period from a year and a 1-based month.
    #[inline]
    pub const fn from_parts(year: i32, month: u32) -> Self {
        Period(year as u32 * 100 + month)
    }

    /// Projects a calendar date onto its year-month period.
    #[inline]
    pub fn from_date(date: NaiveDate) -> Self {
        Period::from_parts(date.year(), date.month())
    }

    /// Parses an optional `YYYY-MM-DD` date filter into a period.
    ///
    /// ## Returns
    /// - `Ok(None)` when the input is empty or whitespace (no filter given)
    /// - `Ok(Some(period))` for a valid calendar date
    /// - `Err(CoreError::InvalidDate)` for anything else
    ///
    /// ## Example
    /// ```rust
    /// use despacho_core::period::Period;
    ///
    /// assert_eq!(Period::parse_ymd("").unwrap(), None);
    /// assert_eq!(
    ///     Period::parse_ymd("2026-08-23").unwrap().map(|p| p.value()),
    ///     Some(202608)
    /// );
    /// assert!(Period::parse_ymd("23/08/2026").is_err());
    /// ```
    pub fn parse_ymd(input: &str) -> CoreResult<Option<Self>> {
        let input = input.trim();

        if input.is_empty() {
            return Ok(None);
        }

        let date =
            NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| CoreError::InvalidDate {
                input: input.to_string(),
            })?;

        Ok(Some(Period::from_date(date)))
    }

    /// Returns the raw `yyyymm` encoding.
    #[inline]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Returns the calendar year.
    #[inline]
    pub const fn year(&self) -> i32 {
        (self.0 / 100) as i32
    }

    /// Returns the 1-based month.
    #[inline]
    pub const fn month(&self) -> u32 {
        self.0 % 100
    }

    /// Returns the period `months` calendar months earlier, wrapping years.
    pub fn months_back(&self, months: u32) -> Self {
        let mut year = self.year();
        let mut month = self.month() as i32 - months as i32;

        while month <= 0 {
            month += 12;
            year -= 1;
        }

        Period::from_parts(year, month as u32)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

// =============================================================================
// Default Window
// =============================================================================

/// Derives the default listing window for a given "today".
///
/// ## Returns
/// `(start, end)` where `end` is today's period and `start` is
/// [`DEFAULT_WINDOW_MONTHS_BACK`] months earlier. Pure function of its input.
pub fn default_window(today: NaiveDate) -> (Period, Period) {
    let end = Period::from_date(today);
    let start = end.months_back(DEFAULT_WINDOW_MONTHS_BACK);
    (start, end)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_date() {
        assert_eq!(Period::from_date(date(2026, 8, 23)).value(), 202608);
        assert_eq!(Period::from_date(date(2026, 1, 1)).value(), 202601);
    }

    #[test]
    fn test_parse_ymd_empty_is_none() {
        assert_eq!(Period::parse_ymd("").unwrap(), None);
        assert_eq!(Period::parse_ymd("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_ymd_valid() {
        let period = Period::parse_ymd("2026-08-23").unwrap().unwrap();
        assert_eq!(period.value(), 202608);
        assert_eq!(period.year(), 2026);
        assert_eq!(period.month(), 8);
    }

    #[test]
    fn test_parse_ymd_malformed_is_error() {
        assert!(Period::parse_ymd("23/08/2026").is_err());
        assert!(Period::parse_ymd("2026-8").is_err());
        assert!(Period::parse_ymd("2026-13-01").is_err());
        assert!(Period::parse_ymd("not a date").is_err());
    }

    #[test]
    fn test_months_back_within_year() {
        assert_eq!(Period::from_parts(2026, 8).months_back(3).value(), 202605);
    }

    #[test]
    fn test_months_back_wraps_year() {
        // January minus three months lands in October of the previous year.
        assert_eq!(Period::from_parts(2026, 1).months_back(3).value(), 202510);
        // March minus three months is December of the previous year, not month zero.
        assert_eq!(Period::from_parts(2026, 3).months_back(3).value(), 202512);
    }

    #[test]
    fn test_months_back_more_than_a_year() {
        assert_eq!(Period::from_parts(2026, 2).months_back(14).value(), 202412);
    }

    #[test]
    fn test_default_window_wraps_year() {
        let (start, end) = default_window(date(2026, 2, 10));
        assert_eq!(start.value(), 202511);
        assert_eq!(end.value(), 202602);
    }

    #[test]
    fn test_default_window_mid_year() {
        let (start, end) = default_window(date(2026, 8, 23));
        assert_eq!(start.value(), 202605);
        assert_eq!(end.value(), 202608);
    }

    #[test]
    fn test_display_padding() {
        assert_eq!(Period::from_parts(2026, 8).to_string(), "202608");
    }

    #[test]
    fn test_serializes_as_bare_yyyymm() {
        // Newtype transparency: a period travels as the number, not an object.
        let json = serde_json::to_value(Period::from_parts(2026, 8)).unwrap();
        assert_eq!(json, serde_json::json!(202608));

        let parsed: Period = serde_json::from_value(serde_json::json!(202511)).unwrap();
        assert_eq!(parsed, Period::from_parts(2025, 11));
    }

    #[test]
    fn test_ordering_is_chronological() {
        assert!(Period::from_parts(2025, 12) < Period::from_parts(2026, 1));
    }
}
