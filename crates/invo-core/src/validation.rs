//! Schema validation of raw extractions.
//!
//! Validation runs in two phases. The presence check names every missing
//! required field at once; only when all are present does the schema check
//! convert values, collecting every violation instead of stopping at the
//! first one.

use std::fmt;
use std::num::IntErrorKind;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::invoice::rules::patterns::ISO_DATE;
use crate::models::order::*;

/// Number of fractional digits a unit price may carry.
pub const PRICE_SCALE: u32 = 2;

/// Date format accepted for the order date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a field value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    /// Text field is empty.
    Empty,
    /// Quantity is zero or negative.
    NonPositiveQuantity(String),
    /// Quantity is not an integer.
    InvalidQuantity(String),
    /// Quantity is an integer too large to store.
    QuantityOutOfRange(String),
    /// Unit price is zero or negative.
    NonPositivePrice(String),
    /// Unit price has more than two fractional digits.
    PriceScale(String),
    /// Unit price is not a decimal number.
    InvalidPrice(String),
    /// Order date is not a zero-padded calendar date.
    InvalidDate(String),
    /// A line or order total does not fit in a decimal.
    AmountOutOfRange,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::Empty => write!(f, "must not be empty"),
            ViolationReason::NonPositiveQuantity(v) => {
                write!(f, "must be greater than 0 (got {})", v)
            }
            ViolationReason::InvalidQuantity(v) => write!(f, "not a valid integer: {:?}", v),
            ViolationReason::QuantityOutOfRange(v) => {
                write!(f, "must be at most {} (got {})", u64::MAX, v)
            }
            ViolationReason::NonPositivePrice(v) => {
                write!(f, "must be greater than 0 (got {})", v)
            }
            ViolationReason::PriceScale(v) => write!(
                f,
                "must have no more than {} decimal places (got {})",
                PRICE_SCALE, v
            ),
            ViolationReason::InvalidPrice(v) => write!(f, "not a valid decimal: {:?}", v),
            ViolationReason::InvalidDate(v) => {
                write!(f, "not a valid date, expected YYYY-MM-DD: {:?}", v)
            }
            ViolationReason::AmountOutOfRange => write!(f, "total value is too large"),
        }
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Field path, e.g. `Tabela_Itens -> 0 -> Quantidade`.
    pub path: String,
    pub reason: ViolationReason,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, reason: ViolationReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }

    fn item(index: usize, field: &str, reason: ViolationReason) -> Self {
        Self::new(format!("{} -> {} -> {}", FIELD_ITEMS, index, field), reason)
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.path, self.reason)
    }
}

/// Errors returned for a document whose extraction is not a valid order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields were not extracted.
    #[error("{document}: missing required fields: {}", .fields.join(", "))]
    MissingFields {
        document: String,
        fields: Vec<String>,
    },

    /// Fields were present but failed type or range checks.
    #[error("{document}: validation failed: {}", join_violations(.violations))]
    Schema {
        document: String,
        violations: Vec<FieldViolation>,
    },
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Label of the document that failed.
    pub fn document(&self) -> &str {
        match self {
            ValidationError::MissingFields { document, .. }
            | ValidationError::Schema { document, .. } => document,
        }
    }

    /// Paths of every rejected or missing field.
    pub fn field_paths(&self) -> Vec<&str> {
        match self {
            ValidationError::MissingFields { fields, .. } => {
                fields.iter().map(String::as_str).collect()
            }
            ValidationError::Schema { violations, .. } => {
                violations.iter().map(|v| v.path.as_str()).collect()
            }
        }
    }
}

/// Validator turning raw extractions into orders.
#[derive(Debug, Default, Clone, Copy)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a raw extraction taken from `document`.
    pub fn validate(
        &self,
        document: &str,
        raw: &RawExtraction,
    ) -> Result<Order, ValidationError> {
        let missing = missing_fields(raw);
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields {
                document: document.to_string(),
                fields: missing,
            });
        }

        let order = build_order(raw).map_err(|violations| ValidationError::Schema {
            document: document.to_string(),
            violations,
        })?;

        debug!("{}: validated order {}", document, order.order_id);
        Ok(order)
    }
}

fn missing_fields(raw: &RawExtraction) -> Vec<String> {
    let mut missing = Vec::new();
    if raw.order_id.is_none() {
        missing.push(FIELD_ORDER_ID.to_string());
    }
    if raw.order_date.is_none() {
        missing.push(FIELD_ORDER_DATE.to_string());
    }
    if raw.customer_id.is_none() {
        missing.push(FIELD_CUSTOMER_ID.to_string());
    }
    if raw.items.is_empty() {
        missing.push(FIELD_ITEMS.to_string());
    }
    missing
}

fn build_order(raw: &RawExtraction) -> Result<Order, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let order_id = raw.order_id.clone().unwrap_or_default();
    if order_id.is_empty() {
        violations.push(FieldViolation::new(FIELD_ORDER_ID, ViolationReason::Empty));
    }

    let date_text = raw.order_date.as_deref().unwrap_or_default();
    let parsed = ISO_DATE
        .is_match(date_text)
        .then(|| NaiveDate::parse_from_str(date_text, DATE_FORMAT).ok())
        .flatten();
    let order_date = match parsed {
        Some(date) => Some(date),
        None => {
            violations.push(FieldViolation::new(
                FIELD_ORDER_DATE,
                ViolationReason::InvalidDate(date_text.to_string()),
            ));
            None
        }
    };

    let customer_id = raw.customer_id.clone().unwrap_or_default();
    if customer_id.is_empty() {
        violations.push(FieldViolation::new(FIELD_CUSTOMER_ID, ViolationReason::Empty));
    }

    let mut items = Vec::with_capacity(raw.items.len());
    for (index, raw_item) in raw.items.iter().enumerate() {
        if let Some(item) = build_item(index, raw_item, &mut violations) {
            items.push(item);
        }
    }

    if violations.is_empty() {
        let total = items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total()?));
        if total.is_none() {
            violations.push(FieldViolation::new(FIELD_ITEMS, ViolationReason::AmountOutOfRange));
        }
    }

    match order_date {
        Some(order_date) if violations.is_empty() => Ok(Order {
            order_id,
            order_date,
            customer_id,
            items,
        }),
        _ => Err(violations),
    }
}

fn build_item(
    index: usize,
    raw: &RawLineItem,
    violations: &mut Vec<FieldViolation>,
) -> Option<LineItem> {
    let before = violations.len();

    if raw.name.is_empty() {
        violations.push(FieldViolation::item(index, FIELD_ITEM_NAME, ViolationReason::Empty));
    }

    let quantity = match raw.quantity.trim().parse::<i128>() {
        Ok(n) if n <= 0 => Err(ViolationReason::NonPositiveQuantity(raw.quantity.clone())),
        Ok(n) => u64::try_from(n)
            .map_err(|_| ViolationReason::QuantityOutOfRange(raw.quantity.clone())),
        Err(e) => Err(match e.kind() {
            IntErrorKind::PosOverflow => {
                ViolationReason::QuantityOutOfRange(raw.quantity.clone())
            }
            IntErrorKind::NegOverflow => {
                ViolationReason::NonPositiveQuantity(raw.quantity.clone())
            }
            _ => ViolationReason::InvalidQuantity(raw.quantity.clone()),
        }),
    };
    let quantity = match quantity {
        Ok(q) => Some(q),
        Err(reason) => {
            violations.push(FieldViolation::item(index, FIELD_ITEM_QUANTITY, reason));
            None
        }
    };

    let unit_price = match Decimal::from_str(raw.unit_price.trim()) {
        Ok(price) => {
            let mut ok = true;
            if price <= Decimal::ZERO {
                violations.push(FieldViolation::item(
                    index,
                    FIELD_ITEM_UNIT_PRICE,
                    ViolationReason::NonPositivePrice(raw.unit_price.clone()),
                ));
                ok = false;
            }
            if price.normalize().scale() > PRICE_SCALE {
                violations.push(FieldViolation::item(
                    index,
                    FIELD_ITEM_UNIT_PRICE,
                    ViolationReason::PriceScale(raw.unit_price.clone()),
                ));
                ok = false;
            }
            ok.then(|| {
                let mut price = price.normalize();
                price.rescale(PRICE_SCALE);
                price
            })
        }
        Err(_) => {
            violations.push(FieldViolation::item(
                index,
                FIELD_ITEM_UNIT_PRICE,
                ViolationReason::InvalidPrice(raw.unit_price.clone()),
            ));
            None
        }
    };

    match (quantity, unit_price) {
        (Some(quantity), Some(unit_price)) if violations.len() == before => {
            let item = LineItem {
                name: raw.name.clone(),
                quantity,
                unit_price,
            };
            if item.total().is_none() {
                violations.push(FieldViolation::new(
                    format!("{} -> {}", FIELD_ITEMS, index),
                    ViolationReason::AmountOutOfRange,
                ));
                return None;
            }
            Some(item)
        }
        _ => None,
    }
}
