use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DCompareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file type: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Error reading {format} file '{}': {reason}", .path.display())]
    Read {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    #[error("Could not hash file {}: {source}", .path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DCompareError {
    pub fn read(path: impl Into<PathBuf>, format: &'static str, reason: impl ToString) -> Self {
        DCompareError::Read {
            path: path.into(),
            format,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DCompareError>;

/// Failures while writing a rendered report to its output file.
///
/// These never abort a comparison; the result is still shown to the user.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Output Filepath: {} Does Not Exist.", .0.display())]
    NotFound(PathBuf),

    #[error("Permission Denied: Can't Write to File: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Can't Write to a Directory! Given Path: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("System-Level Error. Can't Write To: {}: {source}", .path.display())]
    Os {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OutputError {
    /// Classify an I/O error raised while writing `path`.
    pub fn classify(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if path.is_dir() {
            return OutputError::IsADirectory(path);
        }
        match err.kind() {
            std::io::ErrorKind::NotFound => OutputError::NotFound(path),
            std::io::ErrorKind::PermissionDenied => OutputError::PermissionDenied(path),
            _ => OutputError::Os { path, source: err },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};
    use tempfile::TempDir;

    #[test]
    fn test_classify_not_found() {
        let err = OutputError::classify(
            "/definitely/missing/out.txt",
            Error::new(ErrorKind::NotFound, "no such file"),
        );
        assert!(matches!(err, OutputError::NotFound(_)));
    }

    #[test]
    fn test_classify_permission_denied() {
        let err = OutputError::classify(
            "/root/out.txt",
            Error::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, OutputError::PermissionDenied(_)));
    }

    #[test]
    fn test_classify_directory_wins_over_kind() {
        let temp = TempDir::new().unwrap();
        let err = OutputError::classify(temp.path(), Error::new(ErrorKind::Other, "is a directory"));
        assert!(matches!(err, OutputError::IsADirectory(_)));
    }

    #[test]
    fn test_classify_other() {
        let err = OutputError::classify("out.txt", Error::new(ErrorKind::Other, "disk full"));
        assert!(matches!(err, OutputError::Os { .. }));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_read_error_message() {
        let err = DCompareError::read("report.docx", ".docx", "missing word/document.xml");
        assert_eq!(
            err.to_string(),
            "Error reading .docx file 'report.docx': missing word/document.xml"
        );
    }
}
