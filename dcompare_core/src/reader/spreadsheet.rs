use super::{FormatHandler, NormalizedContent};
use crate::sheet::load_grid;
use dcompare_common::{DCompareError, DocumentFormat};
use std::path::Path;

/// Workbooks: the first sheet as a table, or as CSV text
pub struct SpreadsheetHandler;

impl FormatHandler for SpreadsheetHandler {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Spreadsheet
    }

    fn read(&self, path: &Path) -> Result<NormalizedContent, DCompareError> {
        Ok(NormalizedContent::Table(load_grid(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_xlsx;
    use crate::sheet::CellValue;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_reads_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.xlsx");
        write_xlsx(&path, &[&["name", "qty"], &["apple", "3"]]);

        match SpreadsheetHandler.read(&path).unwrap() {
            NormalizedContent::Table(grid) => {
                assert_eq!(grid.headers, vec!["name", "qty"]);
                assert_eq!(grid.get(0, 1), Some(&CellValue::Number(3.0)));
            }
            other => panic!("expected a table, got {:?}", other),
        }
    }

    #[test]
    fn test_text_form_is_csv() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.xlsx");
        write_xlsx(&path, &[&["name", "qty"], &["apple", "3"], &["pear, green", "1.5"]]);

        assert_eq!(
            SpreadsheetHandler.read_text(&path).unwrap(),
            "name,qty\napple,3\n\"pear, green\",1.5\n"
        );
    }

    #[test]
    fn test_corrupt_workbook_is_read_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.xlsx");
        fs::write(&path, "definitely not a workbook").unwrap();

        let err = SpreadsheetHandler.read(&path).unwrap_err();
        assert!(matches!(err, DCompareError::Read { format: ".xlsx", .. }));
    }
}
