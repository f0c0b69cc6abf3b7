use super::{FormatHandler, NormalizedContent};
use dcompare_common::{DCompareError, DocumentFormat};
use std::fs;
use std::path::Path;

/// `.txt` documents, read as UTF-8
pub struct PlainTextHandler;

impl FormatHandler for PlainTextHandler {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::PlainText
    }

    fn read(&self, path: &Path) -> Result<NormalizedContent, DCompareError> {
        let label = self.format().label();
        let bytes = fs::read(path).map_err(|e| DCompareError::read(path, label, e))?;
        let text = String::from_utf8(bytes).map_err(|e| DCompareError::read(path, label, e))?;
        Ok(NormalizedContent::Text(text))
    }
}
