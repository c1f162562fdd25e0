use super::Extractor;
use crate::error::ExtractionError;
use crate::types::{ContentFormat, ExtractedDocument};
use tracing::warn;

/// Text layer of a PDF via `pdf-extract`
pub struct PdfExtractor;

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(ExtractionError::malformed("pdf", "missing %PDF header"));
        }

        // pdf-extract panics on some malformed inputs
        let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
        let text = match result {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("PDF extraction failed: {}", e);
                return Err(ExtractionError::malformed("pdf", e.to_string()));
            }
            Err(_) => {
                warn!("PDF extraction panicked");
                return Err(ExtractionError::malformed("pdf", "unreadable PDF structure"));
            }
        };

        Ok(ExtractedDocument {
            content: text.clone(),
            text_content: text,
            format: ContentFormat::PlainText,
        })
    }

    fn name(&self) -> &'static str {
        "PdfExtractor"
    }

    fn supports_extension(&self, extension: &str) -> bool {
        extension == "pdf"
    }
}
