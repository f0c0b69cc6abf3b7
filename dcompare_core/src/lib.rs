pub mod comparison;
pub mod hasher;
pub mod matcher;
pub mod reader;
pub mod report;
pub mod sheet;
pub mod text_diff;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use comparison::DocumentComparator;
pub use hasher::{chunk_hash, semantic_hash, DocumentFingerprint, Fingerprinter};
pub use matcher::{similarity_percent, MatchingBlock, SequenceMatcher};
pub use reader::{FormatHandler, HandlerRegistry, HashStrategy, NormalizedContent};
pub use report::{write_report, ComparisonOutcome, ComparisonReport};
pub use sheet::{CellValue, Grid, SheetComparison, SheetDiffEngine};
pub use text_diff::{TextComparison, TextDiffEngine};
