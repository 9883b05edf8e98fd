//! Invoice field extraction module.

mod parser;
pub mod rules;
pub mod table;

pub use parser::{ExtractionResult, InvoiceParser, OrderParser};
pub use table::{TableParse, TableParser, TableState};
