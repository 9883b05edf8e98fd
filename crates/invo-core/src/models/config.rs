//! Configuration structures for the ingestion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::InvoError;

/// Default number of documents persisted together.
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Main configuration for invo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoConfig {
    /// Document ingestion configuration.
    pub ingest: IngestConfig,

    /// Order store configuration.
    pub store: StoreConfig,
}

/// Document ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory scanned for input documents.
    pub input_dir: PathBuf,

    /// Number of documents validated before each store merge.
    pub chunk_size: usize,

    /// File extensions treated as input documents (without the dot).
    pub extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("invoices"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            extensions: vec!["pdf".to_string(), "txt".to_string()],
        }
    }
}

/// Order store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON order store.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database.json"),
        }
    }
}

impl InvoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| InvoError::Config(format!("{}: {}", path.display(), e)))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> crate::Result<()> {
        if self.ingest.extensions.is_empty() {
            return Err(InvoError::Config(
                "ingest.extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
