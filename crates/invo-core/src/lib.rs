//! Core library for invoice order ingestion.
//!
//! This crate provides:
//! - Document text sources (PDF via lopdf/pdf-extract, plain text)
//! - Header field extraction and the line-items table parser
//! - Schema validation with field-level diagnostics
//! - A deduplicating JSON order store keyed by order id
//! - Chunked batch ingestion and aggregate sales reporting

pub mod error;
pub mod models;
pub mod pdf;
pub mod invoice;
pub mod validation;
pub mod store;
pub mod batch;
pub mod report;

pub use error::{InvoError, Result};
pub use models::order::{LineItem, Order, RawExtraction, RawLineItem};
pub use models::config::InvoConfig;
pub use pdf::{PdfExtractor, PdfProcessor};
pub use invoice::{ExtractionResult, InvoiceParser, OrderParser};
pub use validation::{FieldViolation, ValidationError, Validator, ViolationReason};
pub use store::{MergeOutcome, OrderStore, StoreError};
pub use batch::{BatchCoordinator, BatchObserver, BatchReport, Document, DocumentOutcome, FileDocument, TextDocument};
pub use report::SalesReport;
