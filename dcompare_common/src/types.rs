use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Document formats understood by the comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentFormat {
    /// `.txt`
    PlainText,
    /// `.docx`
    Word,
    /// `.pdf`
    Pdf,
    /// `.xlsx`, `.xlsm`, `.xlsb`, `.xls`
    Spreadsheet,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 4] = [
        DocumentFormat::PlainText,
        DocumentFormat::Word,
        DocumentFormat::Pdf,
        DocumentFormat::Spreadsheet,
    ];

    /// Infer the format from the path suffix, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "txt" => Some(DocumentFormat::PlainText),
            "docx" => Some(DocumentFormat::Word),
            "pdf" => Some(DocumentFormat::Pdf),
            "xlsx" | "xlsm" | "xlsb" | "xls" => Some(DocumentFormat::Spreadsheet),
            _ => None,
        }
    }

    /// Suffix used in user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => ".txt",
            DocumentFormat::Word => ".docx",
            DocumentFormat::Pdf => ".pdf",
            DocumentFormat::Spreadsheet => ".xlsx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 256-bit BLAKE3 content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<blake3::Hash> for Fingerprint {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Diagnostic log file, truncated on every run
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Where reports are saved when the documents differ
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Context lines around each unified diff hunk
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    /// Fall back to text hashing when a byte hash cannot be computed
    #[serde(default = "default_hash_fallback")]
    pub hash_fallback: bool,

    /// Cap on listed cell differences (counts are unaffected)
    #[serde(default)]
    pub max_cell_diffs: Option<usize>,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("compare.log")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.txt")
}

fn default_context_lines() -> usize {
    3
}

fn default_hash_fallback() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            output_path: default_output_path(),
            context_lines: default_context_lines(),
            hash_fallback: default_hash_fallback(),
            max_cell_diffs: None,
            portable_mode: false,
        }
    }
}
