//! Order data models in the persisted store format.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Persisted field name of the order identifier.
pub const FIELD_ORDER_ID: &str = "ID_Pedido";
/// Persisted field name of the order date.
pub const FIELD_ORDER_DATE: &str = "Data";
/// Persisted field name of the customer identifier.
pub const FIELD_CUSTOMER_ID: &str = "ID_Cliente";
/// Persisted field name of the line-items table.
pub const FIELD_ITEMS: &str = "Tabela_Itens";
/// Persisted field name of a product name.
pub const FIELD_ITEM_NAME: &str = "Nome_Produto";
/// Persisted field name of an item quantity.
pub const FIELD_ITEM_QUANTITY: &str = "Quantidade";
/// Persisted field name of an item unit price.
pub const FIELD_ITEM_UNIT_PRICE: &str = "Preco_Unitario";

/// A validated invoice order.
///
/// Instances are only built by the validator, so every stored order has a
/// non-empty id, a non-empty customer id and at least one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier, unique across the store.
    #[serde(rename = "ID_Pedido")]
    pub order_id: String,

    /// Date the order was placed.
    #[serde(rename = "Data")]
    pub order_date: NaiveDate,

    /// Customer identifier.
    #[serde(rename = "ID_Cliente")]
    pub customer_id: String,

    /// Line items, in document order.
    #[serde(rename = "Tabela_Itens")]
    pub items: Vec<LineItem>,
}

/// A single product line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name.
    #[serde(rename = "Nome_Produto")]
    pub name: String,

    /// Quantity ordered (always > 0).
    #[serde(rename = "Quantidade")]
    pub quantity: u64,

    /// Unit price with two fractional digits (always > 0).
    #[serde(rename = "Preco_Unitario")]
    pub unit_price: Decimal,
}

impl LineItem {
    /// Total value of this line (quantity x unit price), or `None` when it
    /// does not fit in a `Decimal`.
    pub fn total(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}

impl Order {
    /// Total value of the order across all line items, or `None` on overflow.
    pub fn total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.total()?))
    }
}

/// Unvalidated extraction output for one document.
///
/// Header fields are `None` when their label was not found. Item values are
/// kept as the text the table parser captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtraction {
    pub order_id: Option<String>,
    pub order_date: Option<String>,
    pub customer_id: Option<String>,
    pub items: Vec<RawLineItem>,
}

/// A decoded table row before type conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLineItem {
    pub name: String,
    pub quantity: String,
    pub unit_price: String,
}

impl RawLineItem {
    pub fn new(
        name: impl Into<String>,
        quantity: impl Into<String>,
        unit_price: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_order() -> Order {
        Order {
            order_id: "1001".to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            customer_id: "ABC9".to_string(),
            items: vec![
                LineItem {
                    name: "Widget".to_string(),
                    quantity: 3,
                    unit_price: Decimal::new(999, 2),
                },
                LineItem {
                    name: "Gadget".to_string(),
                    quantity: 1,
                    unit_price: Decimal::new(1050, 2),
                },
            ],
        }
    }

    #[test]
    fn test_order_total() {
        let order = sample_order();
        assert_eq!(order.items[0].total(), Some(Decimal::new(2997, 2)));
        assert_eq!(order.total(), Some(Decimal::new(4047, 2)));
    }

    #[test]
    fn test_total_overflow_is_none() {
        let mut order = sample_order();
        order.items[0].quantity = u64::from(u32::MAX);
        order.items[0].unit_price =
            Decimal::from_i128_with_scale(79_228_162_514_264_337_593_543_950_335, 2);
        assert_eq!(order.items[0].total(), None);
        assert_eq!(order.total(), None);

        order.items[0].quantity = 1;
        order.items[0].unit_price = Decimal::MAX;
        order.items[1].unit_price = Decimal::MAX;
        assert_eq!(order.items[1].total(), Some(Decimal::MAX));
        assert_eq!(order.total(), None);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(sample_order()).unwrap();

        assert_eq!(value[FIELD_ORDER_ID], "1001");
        assert_eq!(value[FIELD_ORDER_DATE], "2024-01-05");
        assert_eq!(value[FIELD_CUSTOMER_ID], "ABC9");

        let item = &value[FIELD_ITEMS][0];
        assert_eq!(item[FIELD_ITEM_NAME], "Widget");
        assert_eq!(item[FIELD_ITEM_QUANTITY], 3);
        assert_eq!(item[FIELD_ITEM_UNIT_PRICE], "9.99");
    }

    #[test]
    fn test_reads_existing_store_record() {
        let json = r#"{
            "ID_Pedido": "42",
            "Data": "2023-12-31",
            "ID_Cliente": "XYZ",
            "Tabela_Itens": [
                {"Nome_Produto": "Cable", "Quantidade": 2, "Preco_Unitario": "4.50"}
            ]
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_id, "42");
        assert_eq!(order.order_date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(order.items[0].unit_price, Decimal::new(450, 2));
        assert_eq!(order.total(), Some(Decimal::new(900, 2)));
    }
}
