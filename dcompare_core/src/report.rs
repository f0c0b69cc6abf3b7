use crate::sheet::{CellValue, SheetComparison};
use crate::text_diff::TextComparison;
use dcompare_common::{Fingerprint, OutputError};
use serde::{Serialize, Serializer};
use std::fs;
use std::path::Path;

/// Result of comparing two documents
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    /// Fingerprints matched; no diff was computed
    Identical {
        #[serde(serialize_with = "serialize_hex")]
        fingerprint: Fingerprint,
    },
    Different(ComparisonReport),
}

impl ComparisonOutcome {
    pub fn is_identical(&self) -> bool {
        matches!(self, ComparisonOutcome::Identical { .. })
    }
}

fn serialize_hex<S: Serializer>(fingerprint: &Fingerprint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&fingerprint.to_hex())
}

/// Findings of a manual comparison
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonReport {
    Text(TextComparison),
    Spreadsheet(SheetComparison),
}

impl ComparisonReport {
    pub fn labels(&self) -> (&str, &str) {
        match self {
            ComparisonReport::Text(text) => (&text.left_label, &text.right_label),
            ComparisonReport::Spreadsheet(sheet) => (&sheet.left_label, &sheet.right_label),
        }
    }

    /// Plain-text report: heading, diff or cell table, similarity scores
    pub fn render(&self) -> String {
        let (left, right) = self.labels();
        let mut lines = vec![format!("Differences Between {} and {}:", left, right), String::new()];

        match self {
            ComparisonReport::Text(text) => {
                lines.extend(text.diff.iter().cloned());
                lines.push(String::new());
                lines.push(format!("Line-level Similarity: {:.2}%", text.line_similarity));
                lines.push(format!("Word-level Similarity: {:.2}%", text.word_similarity));
            }
            ComparisonReport::Spreadsheet(sheet) => {
                lines.extend(render_sheet(sheet));
                lines.push(String::new());
                lines.push(format!("Cell-level Similarity: {:.2}%", sheet.cell_similarity));
            }
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

fn render_sheet(sheet: &SheetComparison) -> Vec<String> {
    let mut lines = Vec::new();

    if sheet.shape_mismatch {
        lines.push(format!(
            "Shapes differ: {} is {} x {}, {} is {} x {}",
            sheet.left_label,
            sheet.left_shape.0,
            sheet.left_shape.1,
            sheet.right_label,
            sheet.right_shape.0,
            sheet.right_shape.1,
        ));
        lines.push(String::new());
    }

    if !sheet.column_mismatches.is_empty() {
        lines.push("Column labels:".to_string());
        let rows = sheet
            .column_mismatches
            .iter()
            .map(|m| {
                vec![
                    m.col.to_string(),
                    m.left.clone().unwrap_or_default(),
                    m.right.clone().unwrap_or_default(),
                ]
            })
            .collect();
        lines.extend(format_table(
            vec![
                "col".to_string(),
                sheet.left_label.clone(),
                sheet.right_label.clone(),
            ],
            rows,
        ));
        lines.push(String::new());
    }

    if sheet.cell_diffs.is_empty() {
        lines.push("No differing cells.".to_string());
        return lines;
    }

    let render_cell = |value: &Option<CellValue>| value.as_ref().map(|v| v.to_string()).unwrap_or_default();
    let rows = sheet
        .cell_diffs
        .iter()
        .map(|diff| {
            vec![
                diff.row.to_string(),
                diff.column.clone(),
                render_cell(&diff.left_value),
                render_cell(&diff.right_value),
            ]
        })
        .collect();
    lines.extend(format_table(
        vec![
            "row".to_string(),
            "column".to_string(),
            sheet.left_label.clone(),
            sheet.right_label.clone(),
        ],
        rows,
    ));

    let hidden = sheet.different_cells - sheet.cell_diffs.len();
    if hidden > 0 {
        lines.push(format!("... {} more differing cells not listed", hidden));
    }
    lines
}

/// Left-aligned columns separated by two spaces
fn format_table(header: Vec<String>, rows: Vec<Vec<String>>) -> Vec<String> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    std::iter::once(header)
        .chain(rows)
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect()
}

/// Write the rendered report to `path`, replacing any existing file
pub fn write_report(path: &Path, report: &ComparisonReport) -> Result<(), OutputError> {
    fs::write(path, report.render()).map_err(|e| OutputError::classify(path, e))
}
