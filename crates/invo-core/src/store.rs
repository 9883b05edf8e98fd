//! Deduplicating JSON order store.
//!
//! The whole collection is read before every merge and rewritten after it.
//! `order_id` is the only uniqueness key: an incoming order whose id is
//! already stored, or was accepted earlier in the same merge, is skipped.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::order::Order;

/// Errors related to the order store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store file does not exist yet.
    #[error("store file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The store file exists but is not a list of orders.
    #[error("store file {} is not a valid order list: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The store file could not be read.
    #[error("failed to read store file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The store file could not be written.
    #[error("failed to write store file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    /// Orders could not be serialized.
    #[error("failed to serialize orders: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of merging a batch into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Every incoming order was a duplicate; the file was not touched.
    NothingNew { duplicates: usize },
    /// New orders were appended and the file rewritten.
    Persisted {
        accepted: usize,
        duplicates: usize,
        /// Orders in the store after the write.
        total: usize,
    },
}

impl MergeOutcome {
    pub fn accepted(&self) -> usize {
        match self {
            MergeOutcome::NothingNew { .. } => 0,
            MergeOutcome::Persisted { accepted, .. } => *accepted,
        }
    }

    pub fn duplicates(&self) -> usize {
        match self {
            MergeOutcome::NothingNew { duplicates } => *duplicates,
            MergeOutcome::Persisted { duplicates, .. } => *duplicates,
        }
    }
}

/// Handle to a JSON order store file.
#[derive(Debug, Clone)]
pub struct OrderStore {
    path: PathBuf,
}

impl OrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load all stored orders, treating a missing or unreadable file as empty.
    ///
    /// A corrupt file is logged and then overwritten by the next merge, which
    /// loses whatever it held.
    pub fn load(&self) -> Vec<Order> {
        match self.load_existing() {
            Ok(orders) => orders,
            Err(StoreError::NotFound(_)) => {
                debug!("No store at {}, starting empty", self.path.display());
                Vec::new()
            }
            Err(e) => {
                warn!("{}; treating store as empty", e);
                Vec::new()
            }
        }
    }

    /// Load all stored orders, failing if the file is missing or corrupt.
    pub fn load_existing(&self) -> Result<Vec<Order>, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(self.path.clone()),
            _ => StoreError::Read {
                path: self.path.clone(),
                source: e,
            },
        })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Append orders whose ids are not yet stored and rewrite the file.
    ///
    /// Orders are taken in input order; the first occurrence of an id wins.
    /// Nothing is written when no order is new.
    pub fn merge_and_persist(&self, new_records: Vec<Order>) -> Result<MergeOutcome, StoreError> {
        let mut orders = self.load();
        let mut seen: HashSet<String> = orders.iter().map(|o| o.order_id.clone()).collect();

        let incoming = new_records.len();
        let mut accepted = Vec::with_capacity(incoming);
        for order in new_records {
            if seen.insert(order.order_id.clone()) {
                accepted.push(order);
            } else {
                debug!("Skipping duplicate order {}", order.order_id);
            }
        }
        let duplicates = incoming - accepted.len();

        if duplicates > 0 {
            info!("Skipped {} order(s) already in the store", duplicates);
        }

        if accepted.is_empty() {
            info!("No new orders to save");
            return Ok(MergeOutcome::NothingNew { duplicates });
        }

        let accepted_count = accepted.len();
        orders.extend(accepted);
        self.write_all(&orders)?;

        info!(
            "Saved {} new order(s) to {} ({} total)",
            accepted_count,
            self.path.display(),
            orders.len()
        );

        Ok(MergeOutcome::Persisted {
            accepted: accepted_count,
            duplicates,
            total: orders.len(),
        })
    }

    /// Rewrite the store through a sibling temp file renamed into place.
    fn write_all(&self, orders: &[Order]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(orders)?;
        let write_err = |source: io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        debug!("Wrote {} orders to {}", orders.len(), self.path.display());
        Ok(())
    }
}
