//! Aggregate sales statistics over stored orders.

use std::collections::{BTreeSet, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{InvoError, Result};
use crate::models::order::Order;

/// How often a product appears across all orders (one count per line item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductFrequency {
    pub name: String,
    pub occurrences: usize,
}

/// Total value spent on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductTotal {
    pub name: String,
    pub total: Decimal,
}

/// A distinct product and unit price pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ProductPrice {
    pub name: String,
    pub unit_price: Decimal,
}

/// Full analysis of the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    /// Number of orders analysed.
    pub orders: usize,
    /// Mean order total, rounded to cents.
    pub average_invoice_total: Option<Decimal>,
    /// Product with the most line items.
    pub top_product: Option<ProductFrequency>,
    /// Value per product, highest first.
    pub totals_by_product: Vec<ProductTotal>,
    /// Distinct product prices, by name.
    pub product_prices: Vec<ProductPrice>,
}

impl SalesReport {
    pub fn from_orders(orders: &[Order]) -> Result<Self> {
        Ok(Self {
            orders: orders.len(),
            average_invoice_total: average_invoice_total(orders)?,
            top_product: most_frequent_product(orders),
            totals_by_product: total_by_product(orders)?,
            product_prices: product_prices(orders),
        })
    }
}

fn overflow(what: impl Into<String>) -> InvoError {
    InvoError::Overflow(what.into())
}

/// Mean of the per-order totals, or `None` when there are no orders.
pub fn average_invoice_total(orders: &[Order]) -> Result<Option<Decimal>> {
    if orders.is_empty() {
        return Ok(None);
    }

    let mut sum = Decimal::ZERO;
    for order in orders {
        let total = order
            .total()
            .ok_or_else(|| overflow(format!("total of order {}", order.order_id)))?;
        sum = sum
            .checked_add(total)
            .ok_or_else(|| overflow("sum of order totals"))?;
    }

    let average = sum
        .checked_div(Decimal::from(orders.len()))
        .ok_or_else(|| overflow("average order total"))?;
    Ok(Some(average.round_dp(2)))
}

/// Product appearing on the most line items; ties go to the first seen.
pub fn most_frequent_product(orders: &[Order]) -> Option<ProductFrequency> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in orders.iter().flat_map(|o| &o.items) {
        match index.get(item.name.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(&item.name, counts.len());
                counts.push((&item.name, 1));
            }
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((name, count));
        }
    }

    best.map(|(name, occurrences)| ProductFrequency {
        name: name.to_string(),
        occurrences,
    })
}

/// Value spent per product, sorted by value descending then name.
pub fn total_by_product(orders: &[Order]) -> Result<Vec<ProductTotal>> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();
    for item in orders.iter().flat_map(|o| &o.items) {
        let entry = totals.entry(&item.name).or_default();
        let current = *entry;
        *entry = item
            .total()
            .and_then(|line| current.checked_add(line))
            .ok_or_else(|| overflow(format!("total spent on {}", item.name)))?;
    }

    let mut totals: Vec<ProductTotal> = totals
        .into_iter()
        .map(|(name, total)| ProductTotal {
            name: name.to_string(),
            total,
        })
        .collect();
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    Ok(totals)
}

/// Distinct (name, unit price) pairs sorted by name, then price.
pub fn product_prices(orders: &[Order]) -> Vec<ProductPrice> {
    orders
        .iter()
        .flat_map(|o| &o.items)
        .map(|item| ProductPrice {
            name: item.name.clone(),
            unit_price: item.unit_price,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
