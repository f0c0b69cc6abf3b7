use super::{FormatHandler, NormalizedContent};
use dcompare_common::{DCompareError, DocumentFormat};
use lopdf::Document;
use std::path::Path;

/// Separator placed between the text of consecutive pages
pub const PAGE_SEPARATOR: char = '\u{c}';

/// `.pdf` documents: extracted page text, pages separated by form feeds
pub struct PdfHandler;

impl FormatHandler for PdfHandler {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn read(&self, path: &Path) -> Result<NormalizedContent, DCompareError> {
        let label = self.format().label();
        let doc = Document::load(path).map_err(|e| DCompareError::read(path, label, e))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            let text = doc
                .extract_text(&[*page_number])
                .map_err(|e| DCompareError::read(path, label, e))?;
            pages.push(text);
        }

        let separator = PAGE_SEPARATOR.to_string();
        Ok(NormalizedContent::Text(pages.join(separator.as_str())))
    }
}
