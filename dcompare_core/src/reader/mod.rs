//! Format handlers turning a document path into comparable content.
//!
//! Each supported [`DocumentFormat`] is served by one [`FormatHandler`]
//! registered in a [`HandlerRegistry`]. A new format plugs in by
//! registering a handler, not by extending a conditional.

mod pdf;
mod spreadsheet;
mod text;
mod word;

pub use pdf::PdfHandler;
pub use spreadsheet::SpreadsheetHandler;
pub use text::PlainTextHandler;
pub use word::{extract_paragraphs, WordHandler};

use crate::hasher::chunk_hash;
use crate::sheet::Grid;
use dcompare_common::{DCompareError, DocumentFormat, Fingerprint};
use std::collections::HashMap;
use std::path::Path;

/// How a document of a given format is fingerprinted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashStrategy {
    /// Hash the normalised text, so container noise does not matter
    Semantic,
    /// Stream the raw bytes of the file
    Bytes,
}

/// Format-independent document content
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedContent {
    Text(String),
    Table(Grid),
}

impl NormalizedContent {
    /// Text form; tables are serialised as comma-separated values.
    pub fn into_text(self) -> Result<String, DCompareError> {
        match self {
            NormalizedContent::Text(text) => Ok(text),
            NormalizedContent::Table(grid) => grid.to_csv(),
        }
    }
}

/// Reads and describes one document format
pub trait FormatHandler: Send + Sync {
    /// The format this handler serves
    fn format(&self) -> DocumentFormat;

    /// Fingerprinting strategy for documents of this format
    fn hash_strategy(&self) -> HashStrategy {
        HashStrategy::Bytes
    }

    /// Fingerprint of the raw file bytes
    fn byte_hash(&self, path: &Path) -> Result<Fingerprint, DCompareError> {
        chunk_hash(path)
    }

    /// Read the whole document into its normalised form
    fn read(&self, path: &Path) -> Result<NormalizedContent, DCompareError>;

    /// Read the document as text
    fn read_text(&self, path: &Path) -> Result<String, DCompareError> {
        self.read(path)?.into_text()
    }
}

/// Handlers keyed by format
pub struct HandlerRegistry {
    handlers: HashMap<DocumentFormat, Box<dyn FormatHandler>>,
}

impl HandlerRegistry {
    /// A registry with no handlers
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Add a handler, replacing any handler for the same format
    pub fn register(&mut self, handler: Box<dyn FormatHandler>) {
        self.handlers.insert(handler.format(), handler);
    }

    pub fn with_handler(mut self, handler: Box<dyn FormatHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, format: DocumentFormat) -> Option<&dyn FormatHandler> {
        self.handlers.get(&format).map(|handler| handler.as_ref())
    }

    /// Resolve the handler for a path from its suffix
    pub fn handler_for(&self, path: &Path) -> Result<&dyn FormatHandler, DCompareError> {
        DocumentFormat::from_path(path)
            .and_then(|format| self.get(format))
            .ok_or_else(|| DCompareError::UnsupportedFormat(path.to_path_buf()))
    }

    /// Read a document as text through its handler
    pub fn read_text(&self, path: &Path) -> Result<String, DCompareError> {
        self.handler_for(path)?.read_text(path)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::empty()
            .with_handler(Box::new(PlainTextHandler))
            .with_handler(Box::new(WordHandler))
            .with_handler(Box::new(PdfHandler))
            .with_handler(Box::new(SpreadsheetHandler))
    }
}
