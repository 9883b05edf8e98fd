//! Header field extraction (order id, order date, customer id).

use regex::Regex;

use super::patterns::{CUSTOMER_ID, ORDER_DATE, ORDER_ID};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::order::{FIELD_CUSTOMER_ID, FIELD_ORDER_DATE, FIELD_ORDER_ID};

/// Scalar fields found in the invoice header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    OrderId,
    OrderDate,
    CustomerId,
}

impl HeaderField {
    /// All header fields in the order they are reported.
    pub const ALL: [HeaderField; 3] = [
        HeaderField::OrderId,
        HeaderField::OrderDate,
        HeaderField::CustomerId,
    ];

    fn pattern(&self) -> &'static Regex {
        match self {
            HeaderField::OrderId => &*ORDER_ID,
            HeaderField::OrderDate => &*ORDER_DATE,
            HeaderField::CustomerId => &*CUSTOMER_ID,
        }
    }

    /// Persisted name of the field.
    pub fn field_name(&self) -> &'static str {
        match self {
            HeaderField::OrderId => FIELD_ORDER_ID,
            HeaderField::OrderDate => FIELD_ORDER_DATE,
            HeaderField::CustomerId => FIELD_CUSTOMER_ID,
        }
    }
}

/// Extractor for a single labeled header field.
pub struct HeaderExtractor {
    field: HeaderField,
}

impl HeaderExtractor {
    pub fn new(field: HeaderField) -> Self {
        Self { field }
    }
}

impl FieldExtractor for HeaderExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.field
            .pattern()
            .captures_iter(text)
            .filter_map(|caps| {
                let full_match = caps.get(0)?;
                let value = caps.get(1)?;
                Some(
                    ExtractionMatch::new(value.as_str().to_string(), full_match.as_str())
                        .with_position(value.start(), value.end()),
                )
            })
            .collect()
    }
}

/// Header fields extracted from one document; `None` when the label is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub order_id: Option<String>,
    pub order_date: Option<String>,
    pub customer_id: Option<String>,
}

/// Extract all header fields, each from its first labeled occurrence.
pub fn extract_header(text: &str) -> HeaderFields {
    let first = |field| HeaderExtractor::new(field).extract(text).map(|m| m.value);

    HeaderFields {
        order_id: first(HeaderField::OrderId),
        order_date: first(HeaderField::OrderDate),
        customer_id: first(HeaderField::CustomerId),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_all_header_fields() {
        let text = "Order ID: 1001\nOrder Date: 2024-01-05\nCustomer ID: ABC9\n";

        assert_eq!(
            extract_header(text),
            HeaderFields {
                order_id: Some("1001".to_string()),
                order_date: Some("2024-01-05".to_string()),
                customer_id: Some("ABC9".to_string()),
            }
        );
    }

    #[test]
    fn test_missing_labels_are_none() {
        let fields = extract_header("Customer ID: ABC9\nsomething else");

        assert_eq!(fields.order_id, None);
        assert_eq!(fields.order_date, None);
        assert_eq!(fields.customer_id, Some("ABC9".to_string()));
    }

    #[test]
    fn test_first_match_wins() {
        let text = "Order ID: 7\nOrder ID: 8";
        let extractor = HeaderExtractor::new(HeaderField::OrderId);

        assert_eq!(extractor.extract(text).map(|m| m.value), Some("7".to_string()));
        assert_eq!(extractor.extract_all(text).len(), 2);
    }

    #[test]
    fn test_order_id_requires_digits() {
        assert_eq!(extract_header("Order ID: ABC").order_id, None);
    }

    #[test]
    fn test_date_is_captured_verbatim() {
        // Shape is checked later by the validator, not here.
        let fields = extract_header("Order Date: 2024-13-99");
        assert_eq!(fields.order_date, Some("2024-13-99".to_string()));
    }

    #[test]
    fn test_match_position_points_at_value() {
        let text = "Order ID:   55";
        let m = HeaderExtractor::new(HeaderField::OrderId).extract(text).unwrap();

        assert_eq!(m.position, Some((12, 14)));
        assert_eq!(m.source, "Order ID:   55");
    }
}
