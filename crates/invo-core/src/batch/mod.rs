//! Chunked batch ingestion.
//!
//! Documents are processed in consecutive chunks. Valid orders of a chunk are
//! merged into the store together, so an interrupted run keeps every chunk
//! merged before the interruption. Invalid documents are reported and skipped.

mod document;

pub use document::{Document, FileDocument, TextDocument};

use tracing::{debug, info, warn};

use crate::invoice::{InvoiceParser, OrderParser};
use crate::models::config::DEFAULT_CHUNK_SIZE;
use crate::models::order::Order;
use crate::store::{MergeOutcome, OrderStore, StoreError};
use crate::validation::{ValidationError, Validator};

/// Outcome of running one document through extraction and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// The document produced a valid order.
    Valid { document: String, order_id: String },
    /// The document was rejected.
    Skipped(ValidationError),
}

/// Receives progress events from a batch run.
pub trait BatchObserver {
    /// Called after each document is validated.
    fn on_document(&mut self, _outcome: &DocumentOutcome) {}

    /// Called after each chunk is merged into the store.
    fn on_merge(&mut self, _chunk: usize, _outcome: &MergeOutcome) {}
}

impl BatchObserver for () {}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Documents processed.
    pub documents: usize,
    /// Documents that produced a valid order.
    pub validated: usize,
    /// Rejected documents with their diagnostics.
    pub skipped: Vec<ValidationError>,
    /// Orders newly written to the store.
    pub accepted: usize,
    /// Valid orders dropped as duplicates.
    pub duplicates: usize,
    /// Number of store merges performed.
    pub merges: usize,
}

/// Drives extraction, validation and persistence over many documents.
pub struct BatchCoordinator<'a> {
    parser: OrderParser,
    validator: Validator,
    store: &'a OrderStore,
    chunk_size: usize,
}

impl<'a> BatchCoordinator<'a> {
    /// Create a coordinator writing into `store` with the default chunk size.
    pub fn new(store: &'a OrderStore) -> Self {
        Self {
            parser: OrderParser::new(),
            validator: Validator::new(),
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the chunk size; zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Extract and validate a single document without touching the store.
    pub fn process_document<D: Document + ?Sized>(
        &self,
        document: &D,
    ) -> Result<Order, ValidationError> {
        let label = document.label();
        let text = document.text();

        let extraction = self.parser.parse(&text);
        debug!(
            "{}: parsed {} item(s) in {}ms ({} dropped table lines)",
            label,
            extraction.raw.items.len(),
            extraction.processing_time_ms,
            extraction.dropped_lines
        );
        for warning in &extraction.warnings {
            debug!("{}: {}", label, warning);
        }

        self.validator.validate(&label, &extraction.raw)
    }

    /// Process all documents and persist valid orders chunk by chunk.
    pub fn run<D: Document>(&self, documents: &[D]) -> Result<BatchReport, StoreError> {
        self.run_with(documents, &mut ())
    }

    /// Like [`run`](Self::run), reporting progress to `observer`.
    ///
    /// A store write failure stops the run; chunks merged before it stay
    /// persisted.
    pub fn run_with<D: Document, O: BatchObserver + ?Sized>(
        &self,
        documents: &[D],
        observer: &mut O,
    ) -> Result<BatchReport, StoreError> {
        let mut report = BatchReport::default();

        info!(
            "Processing {} document(s) in chunks of {}",
            documents.len(),
            self.chunk_size
        );

        for (chunk_index, chunk) in documents.chunks(self.chunk_size).enumerate() {
            let mut valid = Vec::with_capacity(chunk.len());

            for document in chunk {
                report.documents += 1;

                let outcome = match self.process_document(document) {
                    Ok(order) => {
                        let outcome = DocumentOutcome::Valid {
                            document: document.label(),
                            order_id: order.order_id.clone(),
                        };
                        valid.push(order);
                        outcome
                    }
                    Err(e) => {
                        warn!("Skipping {}", e);
                        DocumentOutcome::Skipped(e)
                    }
                };

                observer.on_document(&outcome);
                match outcome {
                    DocumentOutcome::Valid { .. } => report.validated += 1,
                    DocumentOutcome::Skipped(e) => report.skipped.push(e),
                }
            }

            if valid.is_empty() {
                debug!("Chunk {} produced no valid orders", chunk_index + 1);
                continue;
            }

            let merge = self.store.merge_and_persist(valid)?;
            report.merges += 1;
            report.accepted += merge.accepted();
            report.duplicates += merge.duplicates();
            observer.on_merge(chunk_index, &merge);
        }

        info!(
            "Batch finished: {} documents, {} valid, {} skipped, {} saved, {} duplicates",
            report.documents,
            report.validated,
            report.skipped.len(),
            report.accepted,
            report.duplicates
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn invoice(order_id: Option<&str>, product: &str) -> String {
        let mut text = String::new();
        if let Some(id) = order_id {
            text.push_str(&format!("Order ID: {}\n", id));
        }
        text.push_str("Order Date: 2024-01-05\nCustomer ID: ABC9\n");
        text.push_str("Product Details:\nProduct ID Name Qty Price\n");
        text.push_str(&format!("1 {} 3 9.99\nTotal Price: 29.97\n", product));
        text
    }

    #[derive(Default)]
    struct Recorder {
        documents: Vec<String>,
        merges: Vec<(usize, MergeOutcome)>,
    }

    impl BatchObserver for Recorder {
        fn on_document(&mut self, outcome: &DocumentOutcome) {
            let label = match outcome {
                DocumentOutcome::Valid { document, .. } => document.clone(),
                DocumentOutcome::Skipped(e) => format!("!{}", e.document()),
            };
            self.documents.push(label);
        }

        fn on_merge(&mut self, chunk: usize, outcome: &MergeOutcome) {
            self.merges.push((chunk, *outcome));
        }
    }

    #[test]
    fn test_single_document_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::new(dir.path().join("database.json"));
        let docs = vec![TextDocument::new("a.pdf", invoice(Some("1001"), "Widget"))];

        let report = BatchCoordinator::new(&store).run(&docs).unwrap();

        assert_eq!(report.accepted, 1);
        let stored = store.load_existing().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].order_id, "1001");
        assert_eq!(stored[0].items[0].name, "Widget");
    }

    #[test]
    fn test_missing_order_id_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::new(dir.path().join("database.json"));
        let docs = vec![TextDocument::new("a.pdf", invoice(None, "Widget"))];

        let report = BatchCoordinator::new(&store).run(&docs).unwrap();

        assert_eq!(report.validated, 0);
        assert_eq!(report.skipped[0].field_paths(), vec!["ID_Pedido"]);
        assert_eq!(report.merges, 0);
        assert!(!store.exists());
    }

    #[test]
    fn test_invalid_document_does_not_block_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::new(dir.path().join("database.json"));
        let docs = vec![
            TextDocument::new("1.pdf", invoice(Some("1"), "Widget")),
            TextDocument::new("2.pdf", invoice(None, "Widget")),
            TextDocument::new("3.pdf", invoice(Some("3"), "Gizmo")),
        ];

        let mut recorder = Recorder::default();
        let report = BatchCoordinator::new(&store)
            .with_chunk_size(2)
            .run_with(&docs, &mut recorder)
            .unwrap();

        assert_eq!(recorder.documents, vec!["1.pdf", "!2.pdf", "3.pdf"]);
        assert_eq!(
            recorder.merges,
            vec![
                (0, MergeOutcome::Persisted { accepted: 1, duplicates: 0, total: 1 }),
                (1, MergeOutcome::Persisted { accepted: 1, duplicates: 0, total: 2 }),
            ]
        );
        assert_eq!(report.documents, 3);
        assert_eq!(report.validated, 2);
        assert_eq!(report.skipped.len(), 1);

        let ids: Vec<_> = store.load().into_iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_duplicates_across_chunks_and_runs() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::new(dir.path().join("database.json"));
        let docs = vec![
            TextDocument::new("a.pdf", invoice(Some("1"), "Widget")),
            TextDocument::new("b.pdf", invoice(Some("1"), "Other")),
        ];
        let coordinator = BatchCoordinator::new(&store).with_chunk_size(1);

        let first = coordinator.run(&docs).unwrap();
        assert_eq!((first.accepted, first.duplicates), (1, 1));

        let second = coordinator.run(&docs).unwrap();
        assert_eq!((second.accepted, second.duplicates), (0, 2));

        let stored = store.load();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].items[0].name, "Widget");
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        let store = OrderStore::new("unused.json");
        assert_eq!(BatchCoordinator::new(&store).with_chunk_size(0).chunk_size(), 1);
    }

    #[test]
    fn test_store_write_failure_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::new(dir.path().join("database.json"));
        let docs = vec![
            TextDocument::new("1.pdf", invoice(Some("1"), "Widget")),
            TextDocument::new("2.pdf", invoice(Some("2"), "Widget")),
        ];

        struct BreakStore<'s>(&'s OrderStore);
        impl BatchObserver for BreakStore<'_> {
            fn on_merge(&mut self, _chunk: usize, _outcome: &MergeOutcome) {
                // Replace the store file with a directory so the next write fails.
                std::fs::remove_file(self.0.path()).unwrap();
                std::fs::create_dir(self.0.path()).unwrap();
            }
        }

        let result = BatchCoordinator::new(&store)
            .with_chunk_size(1)
            .run_with(&docs, &mut BreakStore(&store));

        assert!(matches!(result, Err(StoreError::Write { .. })));
    }
}
