//! Line-items table parser.
//!
//! The table is located by a marker line and read row by row until a total
//! line. Lines inside the table that do not decode as a row (blank lines,
//! page furniture, wrapped text) are dropped rather than reported: the table
//! region routinely mixes data rows with other text.

use tracing::{debug, trace};

use super::rules::patterns::{TABLE_END_MARKERS, TABLE_HEADER_PREFIX, TABLE_MARKER, TABLE_ROW};
use crate::models::order::RawLineItem;

/// Parser position relative to the line-items table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    /// Looking for the table marker line.
    SeekingTable,
    /// Inside the table, decoding rows.
    InTable,
    /// Total line seen; nothing more is read.
    Done,
}

/// Output of a table parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableParse {
    /// Decoded rows, in document order.
    pub items: Vec<RawLineItem>,
    /// State the parser ended in.
    pub final_state: TableState,
    /// Lines inside the table that did not decode as a row.
    pub dropped_lines: usize,
}

/// Single-pass state machine over document lines.
#[derive(Debug)]
pub struct TableParser {
    state: TableState,
    items: Vec<RawLineItem>,
    dropped_lines: usize,
}

impl TableParser {
    pub fn new() -> Self {
        Self {
            state: TableState::SeekingTable,
            items: Vec::new(),
            dropped_lines: 0,
        }
    }

    /// Parse the table out of a whole document.
    pub fn parse(text: &str) -> TableParse {
        let mut parser = Self::new();
        for line in text.lines() {
            if parser.feed_line(line) == TableState::Done {
                break;
            }
        }
        parser.finish()
    }

    pub fn state(&self) -> TableState {
        self.state
    }

    /// Advance the state machine by one line and return the new state.
    pub fn feed_line(&mut self, line: &str) -> TableState {
        match self.state {
            TableState::SeekingTable => {
                if line.contains(TABLE_MARKER) {
                    trace!("Found table marker");
                    self.state = TableState::InTable;
                }
            }
            TableState::InTable => {
                if line.starts_with(TABLE_HEADER_PREFIX) {
                    // header row
                } else if TABLE_END_MARKERS.iter().any(|m| line.contains(m)) {
                    trace!("Found table end: {}", line);
                    self.state = TableState::Done;
                } else if let Some(item) = decode_row(line) {
                    self.items.push(item);
                } else {
                    self.dropped_lines += 1;
                }
            }
            TableState::Done => {}
        }
        self.state
    }

    pub fn finish(self) -> TableParse {
        debug!(
            "Table parse finished in {:?}: {} rows, {} dropped lines",
            self.state,
            self.items.len(),
            self.dropped_lines
        );

        TableParse {
            items: self.items,
            final_state: self.state,
            dropped_lines: self.dropped_lines,
        }
    }
}

impl Default for TableParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode one table row; the leading ordinal is discarded.
pub fn decode_row(line: &str) -> Option<RawLineItem> {
    let caps = TABLE_ROW.captures(line)?;
    Some(RawLineItem::new(&caps[1], &caps[2], &caps[3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(parts: &[&str]) -> String {
        parts.join("\n")
    }

    #[test]
    fn test_single_row_table() {
        let text = lines(&[
            "Order ID: 1001",
            "Product Details:",
            "Product ID Name Qty Price",
            "1 Widget 3 9.99",
            "Total Price: 29.97",
        ]);

        let parse = TableParser::parse(&text);
        assert_eq!(parse.items, vec![RawLineItem::new("Widget", "3", "9.99")]);
        assert_eq!(parse.final_state, TableState::Done);
        assert_eq!(parse.dropped_lines, 0);
    }

    #[test]
    fn test_row_count_matches_well_formed_rows() {
        let text = lines(&[
            "Product Details:",
            "Product ID Product Name Quantity Unit Price",
            "1 Chai 10 18.00",
            "",
            "2 Chang 5 19.00",
            "continued from previous page",
            "3 Aniseed Syrup 2 10.00",
            "TotalPrice 408.00",
        ]);

        let parse = TableParser::parse(&text);
        let names: Vec<_> = parse.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Chai", "Chang", "Aniseed Syrup"]);
        assert_eq!(parse.dropped_lines, 2);
    }

    #[test]
    fn test_rows_before_marker_are_ignored() {
        let text = lines(&[
            "1 Decoy 1 1.00",
            "Product Details:",
            "1 Real 2 2.00",
            "Total Price: 4.00",
        ]);

        let parse = TableParser::parse(&text);
        assert_eq!(parse.items, vec![RawLineItem::new("Real", "2", "2.00")]);
    }

    #[test]
    fn test_nothing_read_after_total_line() {
        let text = lines(&[
            "Product Details:",
            "1 Widget 1 1.00",
            "Total Price: 1.00",
            "2 Trailer 1 1.00",
        ]);

        let parse = TableParser::parse(&text);
        assert_eq!(parse.items.len(), 1);

        let mut parser = TableParser::new();
        for line in text.lines() {
            parser.feed_line(line);
        }
        assert_eq!(parser.state(), TableState::Done);
        assert_eq!(parser.finish().items.len(), 1);
    }

    #[test]
    fn test_missing_marker_yields_no_items() {
        let text = lines(&["Order ID: 1", "1 Widget 3 9.99", "Total Price: 29.97"]);

        let parse = TableParser::parse(&text);
        assert!(parse.items.is_empty());
        assert_eq!(parse.final_state, TableState::SeekingTable);
    }

    #[test]
    fn test_unterminated_table_reads_to_end() {
        let text = lines(&["Product Details:", "1 Widget 3 9.99", "2 Gizmo 1 5.00"]);

        let parse = TableParser::parse(&text);
        assert_eq!(parse.items.len(), 2);
        assert_eq!(parse.final_state, TableState::InTable);
    }

    #[test]
    fn test_marker_line_is_not_a_row() {
        let parse = TableParser::parse("Product Details: 1 Widget 3 9.99\nTotal Price: 0");
        assert!(parse.items.is_empty());
    }

    #[test]
    fn test_decode_row_keeps_raw_text() {
        // Malformed prices are captured as text and rejected by the validator.
        assert_eq!(
            decode_row("4 Bolt 12 1.2.3"),
            Some(RawLineItem::new("Bolt", "12", "1.2.3"))
        );
        assert_eq!(decode_row("Subtotal 12.00"), None);
    }
}
