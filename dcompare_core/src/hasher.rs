//! Document fingerprinting.
//!
//! Formats whose container bytes change without the content changing
//! (Word) are fingerprinted from their extracted text. Everything else is
//! fingerprinted from raw bytes, streamed in fixed-size chunks.

use crate::reader::{FormatHandler, HandlerRegistry, HashStrategy};
use dcompare_common::{DCompareError, Fingerprint};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Block size used when streaming raw bytes
pub const CHUNK_SIZE: usize = 4096;

/// BLAKE3 of the file bytes, read in [`CHUNK_SIZE`] blocks
pub fn chunk_hash(path: &Path) -> Result<Fingerprint, DCompareError> {
    let to_err = |source: std::io::Error| DCompareError::Hash {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(to_err)?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buffer).map_err(to_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize().into())
}

/// BLAKE3 of normalised text
pub fn semantic_hash(text: &str) -> Fingerprint {
    blake3::hash(text.as_bytes()).into()
}

/// A fingerprint, plus the text it was computed from when hashing had to
/// extract it
#[derive(Debug, Clone)]
pub struct DocumentFingerprint {
    pub fingerprint: Fingerprint,
    pub text: Option<String>,
}

/// Computes fingerprints through the format handlers of a registry
pub struct Fingerprinter<'a> {
    registry: &'a HandlerRegistry,
    hash_fallback: bool,
}

impl<'a> Fingerprinter<'a> {
    pub fn new(registry: &'a HandlerRegistry) -> Self {
        Self {
            registry,
            hash_fallback: true,
        }
    }

    /// Re-hash both documents from their text when a byte hash fails
    pub fn with_hash_fallback(mut self, enabled: bool) -> Self {
        self.hash_fallback = enabled;
        self
    }

    /// Fingerprint one document with its format's strategy
    pub fn fingerprint(&self, path: &Path) -> Result<DocumentFingerprint, DCompareError> {
        let handler = self.registry.handler_for(path)?;
        match handler.hash_strategy() {
            HashStrategy::Semantic => semantic_fingerprint(handler, path),
            HashStrategy::Bytes => {
                info!("Chunk Hashing Contents from File {}.", path.display());
                Ok(DocumentFingerprint {
                    fingerprint: handler.byte_hash(path)?,
                    text: None,
                })
            }
        }
    }

    /// Fingerprint both documents of a comparison.
    ///
    /// With fallback enabled a byte-hash failure on either side switches
    /// both documents to text hashing, so the two fingerprints stay
    /// comparable.
    pub fn fingerprint_pair(
        &self,
        left: &Path,
        right: &Path,
    ) -> Result<(DocumentFingerprint, DocumentFingerprint), DCompareError> {
        let attempt = self
            .fingerprint(left)
            .and_then(|first| Ok((first, self.fingerprint(right)?)));

        match attempt {
            Err(DCompareError::Hash { path, source }) if self.hash_fallback => {
                warn!(
                    "Could not hash file {}: {}. Falling back to text hashing.",
                    path.display(),
                    source
                );
                let first = semantic_fingerprint(self.registry.handler_for(left)?, left)?;
                let second = semantic_fingerprint(self.registry.handler_for(right)?, right)?;
                Ok((first, second))
            }
            other => other,
        }
    }
}

fn semantic_fingerprint(
    handler: &dyn FormatHandler,
    path: &Path,
) -> Result<DocumentFingerprint, DCompareError> {
    let text = handler.read_text(path)?;
    info!("Simple Hashing Contents from File {}.", path.display());
    let fingerprint = semantic_hash(&text);
    debug!("{} -> {}", path.display(), fingerprint);
    Ok(DocumentFingerprint {
        fingerprint,
        text: Some(text),
    })
}
