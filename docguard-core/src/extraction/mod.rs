//! Document extraction: turns uploaded bytes into displayable content plus
//! the plain text the detector scans.
//!
//! Supported inputs are `.txt`, `.doc`/`.docx` (WordprocessingML inside a ZIP
//! container) and `.pdf`. Anything else is rejected before parsing.

pub mod docx;
pub mod pdf;
pub mod plaintext;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
pub use plaintext::PlainTextExtractor;

use crate::document::builder::decode_entities;
use crate::error::ExtractionError;
use crate::types::ExtractedDocument;
use regex::Regex;
use std::sync::LazyLock;
use tracing::info;

pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "doc", "docx", "pdf"];

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// One input format
pub trait Extractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError>;

    /// Get the extractor name for logging/debugging
    fn name(&self) -> &'static str;

    /// Lowercase extensions without the dot
    fn supports_extension(&self, extension: &str) -> bool;
}

/// Lowercase an extension and drop any leading dot
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

pub fn is_supported(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&normalize_extension(extension).as_str())
}

/// Plain text of an HTML fragment: tags removed, entities decoded
pub fn strip_tags(html: &str) -> String {
    decode_entities(&TAG_REGEX.replace_all(html, ""))
}

pub struct ExtractionService {
    extractors: Vec<Box<dyn Extractor>>,
}

impl Default for ExtractionService {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionService {
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Box::new(PlainTextExtractor::new()),
                Box::new(DocxExtractor::new()),
                Box::new(PdfExtractor::new()),
            ],
        }
    }

    pub fn extract(&self, bytes: &[u8], extension: &str) -> Result<ExtractedDocument, ExtractionError> {
        let ext = normalize_extension(extension);
        if !is_supported(&ext) {
            return Err(ExtractionError::Unsupported(extension.to_string()));
        }
        let extractor = self
            .extractors
            .iter()
            .find(|e| e.supports_extension(&ext))
            .ok_or_else(|| ExtractionError::Unsupported(extension.to_string()))?;

        if bytes.is_empty() {
            return Err(ExtractionError::malformed(&ext, "file is empty"));
        }

        let document = extractor.extract(bytes)?;
        info!(
            "{} extracted {} chars of text from .{} input",
            extractor.name(),
            document.text_content.chars().count(),
            ext
        );
        Ok(document)
    }

    /// Read a file from disk and extract it by its extension. The raw bytes
    /// are returned alongside for fingerprinting.
    pub fn extract_file(
        &self,
        path: &std::path::Path,
    ) -> Result<(Vec<u8>, ExtractedDocument), ExtractionError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        // Reject before reading the file
        if !is_supported(extension) {
            return Err(ExtractionError::Unsupported(extension.to_string()));
        }
        let bytes = std::fs::read(path)?;
        let document = self.extract(&bytes, extension)?;
        Ok((bytes, document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_normalization() {
        assert!(is_supported(".DOCX"));
        assert!(is_supported("txt"));
        assert!(!is_supported(".rtf"));
        assert!(!is_supported(""));
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>香蕉&amp;橙子</p><br />"), "香蕉&橙子");
    }
}
