//! Per-page record validation
//!
//! Converts the raw text pulled from the dock code and order number regions
//! into a validated [`PageRecord`], or a [`RejectReason`] explaining why the
//! page is excluded from grouping. Rejected pages still pass through to the
//! output document, just without a skid stamp.

use std::sync::LazyLock;

use regex::Regex;

/// Minimum digit count for an order number to be accepted
pub const MIN_ORDER_DIGITS: usize = 5;

/// Leftmost maximal run of decimal digits
static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit run pattern"));

/// One successfully validated manifest page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// The page's 0-based position in the source document
    pub original_index: usize,
    /// Dock / product-family classification code
    pub dock_code: String,
    /// Customer order number (digits only)
    pub order_number: String,
}

/// Why a page failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Dock code region was empty after cleaning
    EmptyDockCode,
    /// Order number region contained no digit run at all
    MissingOrderNumber,
    /// The digit run was too short to be an order number
    ShortOrderNumber { digits: String },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::EmptyDockCode => write!(f, "dock code region is empty"),
            RejectReason::MissingOrderNumber => write!(f, "no digits in order number region"),
            RejectReason::ShortOrderNumber { digits } => write!(
                f,
                "order number '{}' has fewer than {} digits",
                digits, MIN_ORDER_DIGITS
            ),
        }
    }
}

/// Strip embedded newlines and surrounding whitespace from a raw region text
pub fn clean_field(raw: &str) -> String {
    raw.replace(['\r', '\n'], " ").trim().to_string()
}

/// Extract the leftmost maximal digit run from a raw order number text
fn first_digit_run(raw: &str) -> Option<&str> {
    DIGIT_RUN.find(raw.trim()).map(|m| m.as_str())
}

impl PageRecord {
    /// Validate the raw region texts for one page.
    ///
    /// The dock code is accepted verbatim after cleaning; the order number is
    /// the leftmost digit run in its region and must be at least
    /// [`MIN_ORDER_DIGITS`] long.
    pub fn build(
        original_index: usize,
        dock_raw: &str,
        order_raw: &str,
    ) -> Result<PageRecord, RejectReason> {
        let dock_code = clean_field(dock_raw);
        if dock_code.is_empty() {
            return Err(RejectReason::EmptyDockCode);
        }

        let digits = first_digit_run(order_raw).ok_or(RejectReason::MissingOrderNumber)?;
        if digits.len() < MIN_ORDER_DIGITS {
            return Err(RejectReason::ShortOrderNumber {
                digits: digits.to_string(),
            });
        }

        Ok(PageRecord {
            original_index,
            dock_code,
            order_number: digits.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_accepts_clean_fields() {
        let record = PageRecord::build(0, "P1", "2025062601").unwrap();
        assert_eq!(record.dock_code, "P1");
        assert_eq!(record.order_number, "2025062601");
        assert_eq!(record.original_index, 0);
    }

    #[test]
    fn test_dock_code_is_trimmed_and_newline_stripped() {
        let record = PageRecord::build(3, "  T8\n", "2025062601").unwrap();
        assert_eq!(record.dock_code, "T8");
    }

    #[test]
    fn test_empty_dock_code_rejected() {
        let result = PageRecord::build(0, " \n ", "2025062601");
        assert_eq!(result.unwrap_err(), RejectReason::EmptyDockCode);
    }

    #[test]
    fn test_order_number_takes_leftmost_digit_run() {
        // Scenario: "Order: 2025062605 Rev2" -> "2025062605"
        let record = PageRecord::build(0, "P1", "Order: 2025062605 Rev2").unwrap();
        assert_eq!(record.order_number, "2025062605");
    }

    #[test]
    fn test_order_number_without_digits_rejected() {
        let result = PageRecord::build(0, "P1", "PENDING");
        assert_eq!(result.unwrap_err(), RejectReason::MissingOrderNumber);
    }

    #[test]
    fn test_short_order_number_rejected() {
        let result = PageRecord::build(0, "P1", "Rev 1234 draft");
        assert_eq!(
            result.unwrap_err(),
            RejectReason::ShortOrderNumber {
                digits: "1234".to_string()
            }
        );
    }

    #[test]
    fn test_five_digit_order_number_is_enough() {
        let record = PageRecord::build(0, "P1", "12345").unwrap();
        assert_eq!(record.order_number, "12345");
    }
}
