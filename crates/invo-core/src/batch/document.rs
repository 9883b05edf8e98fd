//! Document handles yielding full text.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::pdf;

/// A source document for ingestion.
pub trait Document {
    /// Label used in diagnostics, usually the file name.
    fn label(&self) -> String;

    /// Full text of the document, pages in order, or an empty string when
    /// the text cannot be extracted.
    fn text(&self) -> String;
}

/// Document held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    label: String,
    text: String,
}

impl TextDocument {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl Document for TextDocument {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn text(&self) -> String {
        self.text.clone()
    }
}

/// Document read from disk when its text is requested.
///
/// `.pdf` files go through the PDF extractor; anything else is read as UTF-8
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document text, reporting why it could not be read.
    pub fn read_text(&self) -> crate::Result<String> {
        if self.is_pdf() {
            let data = fs::read(&self.path)?;
            pdf::extract_text(&data)
        } else {
            Ok(fs::read_to_string(&self.path)?)
        }
    }

    fn is_pdf(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
    }
}

impl Document for FileDocument {
    fn label(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn text(&self) -> String {
        self.read_text().unwrap_or_else(|e| {
            warn!("Failed to read {}: {}", self.path.display(), e);
            String::new()
        })
    }
}
