use super::Extractor;
use crate::error::ExtractionError;
use crate::types::{ContentFormat, ExtractedDocument};

const UTF8_BOM: char = '\u{feff}';

pub struct PlainTextExtractor;

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractionError::malformed("txt", format!("not valid UTF-8: {e}")))?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string();

        Ok(ExtractedDocument {
            content: text.clone(),
            text_content: text,
            format: ContentFormat::PlainText,
        })
    }

    fn name(&self) -> &'static str {
        "PlainTextExtractor"
    }

    fn supports_extension(&self, extension: &str) -> bool {
        extension == "txt"
    }
}
