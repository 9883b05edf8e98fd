//! Order parser assembling header fields and table rows into a raw record.

use std::time::Instant;

use tracing::debug;

use super::rules::extract_header;
use super::table::{TableParser, TableState};
use crate::models::order::RawExtraction;

/// Result of parsing one document.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Unvalidated record.
    pub raw: RawExtraction,
    /// State the table parser ended in.
    pub table_state: TableState,
    /// Table lines that did not decode as rows.
    pub dropped_lines: usize,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Trait for invoice parsing.
///
/// Parsing never fails: absent fields are left empty for the validator to
/// report.
pub trait InvoiceParser {
    /// Parse a raw record from the full text of a document.
    fn parse(&self, text: &str) -> ExtractionResult;
}

/// Rule-based parser for order invoices.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrderParser;

impl OrderParser {
    pub fn new() -> Self {
        Self
    }
}

impl InvoiceParser for OrderParser {
    fn parse(&self, text: &str) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        let header = extract_header(text);
        if header.order_id.is_none() {
            warnings.push("Could not extract order id".to_string());
        }
        if header.order_date.is_none() {
            warnings.push("Could not extract order date".to_string());
        }
        if header.customer_id.is_none() {
            warnings.push("Could not extract customer id".to_string());
        }

        let table = TableParser::parse(text);
        match table.final_state {
            TableState::SeekingTable => warnings.push("No line-items table found".to_string()),
            TableState::InTable => warnings.push("Line-items table has no total line".to_string()),
            TableState::Done => {}
        }

        let raw = RawExtraction {
            order_id: header.order_id,
            order_date: header.order_date,
            customer_id: header.customer_id,
            items: table.items,
        };

        debug!(
            "Parsed {} chars: order id {:?}, {} items, {} warnings",
            text.len(),
            raw.order_id,
            raw.items.len(),
            warnings.len()
        );

        ExtractionResult {
            raw,
            table_state: table.final_state,
            dropped_lines: table.dropped_lines,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}
