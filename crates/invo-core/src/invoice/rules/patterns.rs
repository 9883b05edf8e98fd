//! Regex patterns for invoice text extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Line marking the start of the line-items table.
pub const TABLE_MARKER: &str = "Product Details:";

/// Prefix of the table header row.
pub const TABLE_HEADER_PREFIX: &str = "Product ID";

/// Substrings marking the end of the line-items table.
pub const TABLE_END_MARKERS: [&str; 2] = ["TotalPrice", "Total Price"];

/// Row pattern: ordinal, product name, quantity, unit price.
///
/// The name group is lazy so trailing numeric tokens are left for the
/// quantity and price groups. A name that itself ends in a number is split
/// at the shortest possible name.
pub const TABLE_ROW_PATTERN: &str = r"^\d+\s+(.+?)\s+(\d+)\s+([\d.]+)";

lazy_static! {
    // Header fields
    pub static ref ORDER_ID: Regex = Regex::new(r"Order ID:\s*(\d+)").unwrap();

    pub static ref ORDER_DATE: Regex = Regex::new(r"Order Date:\s*([\d\-]+)").unwrap();

    pub static ref CUSTOMER_ID: Regex = Regex::new(r"Customer ID:\s*(\w+)").unwrap();

    // Line-items table row
    pub static ref TABLE_ROW: Regex = Regex::new(TABLE_ROW_PATTERN).unwrap();

    // Zero-padded calendar date accepted by the validator
    pub static ref ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_row_name_is_shortest_match() {
        let caps = TABLE_ROW.captures("1 USB Cable 2 3 4.50").unwrap();
        assert_eq!(&caps[1], "USB Cable");
        assert_eq!(&caps[2], "2");
        assert_eq!(&caps[3], "3");
    }

    #[test]
    fn test_row_keeps_multi_word_names() {
        let caps = TABLE_ROW.captures("12 Deluxe Office Chair 1 149.90").unwrap();
        assert_eq!(&caps[1], "Deluxe Office Chair");
        assert_eq!(&caps[2], "1");
        assert_eq!(&caps[3], "149.90");
    }

    #[test]
    fn test_row_is_anchored_at_line_start() {
        assert!(TABLE_ROW.captures("Widget 1 3 9.99").is_none());
        assert!(TABLE_ROW.captures("  1 Widget 3 9.99").is_none());
    }

    #[test]
    fn test_customer_id_is_single_word() {
        let caps = CUSTOMER_ID.captures("Customer ID: ALFKI Alfreds").unwrap();
        assert_eq!(&caps[1], "ALFKI");
    }
}
