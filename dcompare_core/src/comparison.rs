use crate::hasher::{DocumentFingerprint, Fingerprinter};
use crate::reader::HandlerRegistry;
use crate::report::{ComparisonOutcome, ComparisonReport};
use crate::sheet::SheetDiffEngine;
use crate::text_diff::TextDiffEngine;
use dcompare_common::{DCompareError, DocumentFormat};
use std::path::Path;
use tracing::{info, warn};

/// Compares two documents: fingerprints first, a full diff only when the
/// fingerprints differ
pub struct DocumentComparator {
    registry: HandlerRegistry,
    text_engine: TextDiffEngine,
    sheet_engine: SheetDiffEngine,
    hash_fallback: bool,
}

impl DocumentComparator {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::default(),
            text_engine: TextDiffEngine::new(),
            sheet_engine: SheetDiffEngine::new(),
            hash_fallback: true,
        }
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.text_engine = self.text_engine.with_context_lines(lines);
        self
    }

    pub fn with_max_cell_diffs(mut self, max: Option<usize>) -> Self {
        self.sheet_engine = self.sheet_engine.with_max_cell_diffs(max);
        self
    }

    pub fn with_hash_fallback(mut self, enabled: bool) -> Self {
        self.hash_fallback = enabled;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Compare two documents
    pub fn compare(&self, left: &Path, right: &Path) -> Result<ComparisonOutcome, DCompareError> {
        let (left_print, right_print) = Fingerprinter::new(&self.registry)
            .with_hash_fallback(self.hash_fallback)
            .fingerprint_pair(left, right)?;

        if left_print.fingerprint == right_print.fingerprint {
            info!("{} and {} Are Identical.", left.display(), right.display());
            return Ok(ComparisonOutcome::Identical {
                fingerprint: left_print.fingerprint,
            });
        }

        warn!("{} and {} Are Not Identical.", left.display(), right.display());
        info!("Performing Manual Comparison.");

        let report = if is_spreadsheet(left) && is_spreadsheet(right) {
            ComparisonReport::Spreadsheet(self.compare_spreadsheets(left, right)?)
        } else {
            let left_text = self.text_of(left, left_print)?;
            let right_text = self.text_of(right, right_print)?;
            let result = self.text_engine.compare_text(
                &left_text,
                &right_text,
                &left.display().to_string(),
                &right.display().to_string(),
            );
            info!(
                "Line-Level Similarity For {} & {}: {:.2}%",
                left.display(),
                right.display(),
                result.line_similarity
            );
            info!(
                "Word-Level Similarity For {} & {}: {:.2}%",
                left.display(),
                right.display(),
                result.word_similarity
            );
            ComparisonReport::Text(result)
        };

        Ok(ComparisonOutcome::Different(report))
    }

    fn compare_spreadsheets(
        &self,
        left: &Path,
        right: &Path,
    ) -> Result<crate::sheet::SheetComparison, DCompareError> {
        let result = self.sheet_engine.compare_files(left, right)?;
        if result.shape_mismatch {
            warn!(
                "{} and {} have different sizes. Calculating partial comparison...",
                left.display(),
                right.display()
            );
        }
        info!(
            "Excel Comparison Done. Cell-level Similarity: {:.2}%",
            result.cell_similarity
        );
        Ok(result)
    }

    /// Text already extracted while hashing, or a fresh read
    fn text_of(&self, path: &Path, print: DocumentFingerprint) -> Result<String, DCompareError> {
        match print.text {
            Some(text) => Ok(text),
            None => self.registry.read_text(path),
        }
    }
}

impl Default for DocumentComparator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_spreadsheet(path: &Path) -> bool {
    DocumentFormat::from_path(path) == Some(DocumentFormat::Spreadsheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{write_docx, write_docx_body, write_pdf, write_xlsx};
    use crate::reader::{FormatHandler, NormalizedContent, WordHandler};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn text_report(outcome: ComparisonOutcome) -> crate::text_diff::TextComparison {
        match outcome {
            ComparisonOutcome::Different(ComparisonReport::Text(text)) => text,
            other => panic!("expected a text report, got {:?}", other),
        }
    }

    fn sheet_report(outcome: ComparisonOutcome) -> crate::sheet::SheetComparison {
        match outcome {
            ComparisonOutcome::Different(ComparisonReport::Spreadsheet(sheet)) => sheet,
            other => panic!("expected a spreadsheet report, got {:?}", other),
        }
    }

    #[test]
    fn test_identical_text_files() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");
        fs::write(&a, "Test Case.").unwrap();
        fs::write(&b, "Test Case.").unwrap();

        let outcome = DocumentComparator::new().compare(&a, &b).unwrap();
        assert!(outcome.is_identical());
    }

    #[test]
    fn test_different_text_files() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");
        fs::write(&a, "Test Case.").unwrap();
        fs::write(&b, "Hello World.").unwrap();

        let result = text_report(DocumentComparator::new().compare(&a, &b).unwrap());
        assert_eq!(result.line_similarity, 0.0);
        assert_eq!(result.word_similarity, 0.0);
        assert_eq!(result.diff.iter().filter(|l| l.starts_with("-Test")).count(), 1);
        assert_eq!(result.diff.iter().filter(|l| l.starts_with("+Hello")).count(), 1);
    }

    #[test]
    fn test_self_comparison_is_identical() {
        let temp = TempDir::new().unwrap();
        let pdf = temp.path().join("a.pdf");
        write_pdf(&pdf, &["Test Case."]);

        assert!(DocumentComparator::new().compare(&pdf, &pdf).unwrap().is_identical());
    }

    #[test]
    fn test_identical_word_documents() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.docx");
        let b = temp.path().join("b.docx");
        write_docx(&a, &["Test Case."]);
        // Same text, different markup
        write_docx_body(&b, "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Test Case.</w:t></w:r></w:p>");

        assert!(DocumentComparator::new().compare(&a, &b).unwrap().is_identical());
    }

    #[test]
    fn test_identical_spreadsheets() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.xlsx");
        let b = temp.path().join("b.xlsx");
        write_xlsx(&a, &[&["A"], &["Test Case."]]);
        write_xlsx(&b, &[&["A"], &["Test Case."]]);

        assert!(DocumentComparator::new().compare(&a, &b).unwrap().is_identical());
    }

    #[test]
    fn test_spreadsheets_of_different_shapes() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.xlsx");
        let b = temp.path().join("b.xlsx");
        write_xlsx(&a, &[&["A"], &["Test Case."]]);
        write_xlsx(&b, &[&["A"], &["Test Case."], &["Extra"]]);

        let sheet = sheet_report(DocumentComparator::new().compare(&a, &b).unwrap());
        assert!(sheet.shape_mismatch);
        assert_eq!(sheet.left_shape, (1, 1));
        assert_eq!(sheet.right_shape, (2, 1));
        assert_eq!(sheet.total_cells, 1);
        assert_eq!(sheet.matching_cells, 1);
        assert_eq!(sheet.cell_similarity, 100.0);
        assert_eq!(sheet.different_cells, 1);
    }

    #[test]
    fn test_mixed_formats_compare_as_text() {
        let temp = TempDir::new().unwrap();
        let txt = temp.path().join("a.txt");
        let docx = temp.path().join("b.docx");
        fs::write(&txt, "Test Case.\nSecond line").unwrap();
        write_docx(&docx, &["Test Case.", "Other line"]);

        let result = text_report(DocumentComparator::new().compare(&txt, &docx).unwrap());
        assert_eq!(result.line_similarity, 50.0);
        assert_eq!(result.word_similarity, 75.0);
        assert_eq!(result.left_label, txt.display().to_string());
    }

    #[test]
    fn test_context_lines_are_configurable() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.txt");
        let left: String = (1..=10).map(|i| format!("line {}\n", i)).collect();
        fs::write(&a, &left).unwrap();
        fs::write(&b, left.replace("line 5\n", "line five\n")).unwrap();

        let result = text_report(
            DocumentComparator::new()
                .with_context_lines(0)
                .compare(&a, &b)
                .unwrap(),
        );
        assert_eq!(result.diff, vec![
            format!("--- {}", a.display()),
            format!("+++ {}", b.display()),
            "@@ -5 +5 @@".to_string(),
            "-line 5".to_string(),
            "+line five".to_string(),
        ]);
    }

    #[test]
    fn test_unsupported_format() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.txt");
        let b = temp.path().join("b.rtf");
        fs::write(&a, "x").unwrap();
        fs::write(&b, "x").unwrap();

        let err = DocumentComparator::new().compare(&a, &b).unwrap_err();
        assert!(matches!(err, DCompareError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_unreadable_word_document() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.docx");
        let b = temp.path().join("b.docx");
        fs::write(&a, "not a zip").unwrap();
        write_docx(&b, &["Test Case."]);

        let err = DocumentComparator::new().compare(&a, &b).unwrap_err();
        assert!(matches!(err, DCompareError::Read { .. }));
    }

    /// Word handler that counts how often documents are read
    struct CountingWord(Arc<AtomicUsize>);

    impl FormatHandler for CountingWord {
        fn format(&self) -> DocumentFormat {
            DocumentFormat::Word
        }

        fn hash_strategy(&self) -> crate::reader::HashStrategy {
            WordHandler.hash_strategy()
        }

        fn read(&self, path: &Path) -> Result<NormalizedContent, DCompareError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            WordHandler.read(path)
        }
    }

    #[test]
    fn test_word_text_is_read_once() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.docx");
        let b = temp.path().join("b.docx");
        write_docx(&a, &["Test Case."]);
        write_docx(&b, &["Hello World."]);

        let reads = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::default().with_handler(Box::new(CountingWord(reads.clone())));
        let result = text_report(
            DocumentComparator::new()
                .with_registry(registry)
                .compare(&a, &b)
                .unwrap(),
        );

        assert_eq!(result.line_similarity, 0.0);
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }
}
