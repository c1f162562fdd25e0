use super::{strip_tags, Extractor};
use crate::document::serialization::escape_html;
use crate::error::ExtractionError;
use crate::types::{ContentFormat, ExtractedDocument};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tracing::debug;

const DOCUMENT_PART: &str = "word/document.xml";

/// Word documents: `word/document.xml` from the ZIP container, rendered as
/// simple HTML (paragraphs, headings, tabs and line breaks).
pub struct DocxExtractor;

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Paragraph {
    html: String,
    heading: Option<u8>,
    has_text: bool,
}

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }

    fn read_document_xml(bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            ExtractionError::malformed("docx", format!("not a ZIP container: {e}"))
        })?;
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| {
            ExtractionError::malformed("docx", format!("cannot find {DOCUMENT_PART}: {e}"))
        })?;

        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| ExtractionError::malformed("docx", e.to_string()))?;
        Ok(xml)
    }

    /// Render WordprocessingML body paragraphs as HTML
    pub fn render_html(xml: &str) -> Result<String, ExtractionError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut blocks: Vec<String> = Vec::new();
        let mut paragraph: Option<Paragraph> = None;
        let mut in_text = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"w:p" => paragraph = Some(Paragraph::default()),
                    b"w:t" => in_text = true,
                    b"w:pStyle" => apply_style(&e, paragraph.as_mut()),
                    _ => {}
                },
                Ok(Event::Empty(e)) => match (e.name().as_ref(), paragraph.as_mut()) {
                    (b"w:pStyle", p) => apply_style(&e, p),
                    (b"w:tab", Some(p)) => p.html.push('\t'),
                    (b"w:br", Some(p)) => p.html.push_str("<br />"),
                    _ => {}
                },
                Ok(Event::Text(t)) if in_text => {
                    if let Some(p) = paragraph.as_mut() {
                        let text = t
                            .unescape()
                            .map_err(|e| ExtractionError::malformed("docx", e.to_string()))?;
                        p.has_text |= !text.is_empty();
                        p.html.push_str(&escape_html(&text));
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"w:t" => in_text = false,
                    b"w:p" => {
                        if let Some(p) = paragraph.take().filter(|p| p.has_text) {
                            let tag = p.heading.map_or("p".to_string(), |n| format!("h{n}"));
                            blocks.push(format!("<{tag}>{}</{tag}>", p.html));
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ExtractionError::malformed(
                        "docx",
                        format!("XML error at position {}: {:?}", reader.buffer_position(), e),
                    ))
                }
                _ => {}
            }
        }

        debug!("Rendered {} paragraphs from WordprocessingML", blocks.len());
        Ok(blocks.join("\n"))
    }
}

/// `w:pStyle w:val="Heading2"` marks the paragraph as an `h2`
fn apply_style(element: &BytesStart, paragraph: Option<&mut Paragraph>) {
    let Some(paragraph) = paragraph else { return };
    for attr in element.attributes().flatten() {
        if attr.key.as_ref() != b"w:val" {
            continue;
        }
        let Ok(value) = attr.unescape_value() else { continue };
        paragraph.heading = value
            .strip_prefix("Heading")
            .and_then(|level| level.trim().parse::<u8>().ok())
            .filter(|level| (1..=6).contains(level));
    }
}

impl Extractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
        let xml = Self::read_document_xml(bytes)?;
        let html = Self::render_html(&xml)?;

        Ok(ExtractedDocument {
            text_content: strip_tags(&html),
            content: html,
            format: ContentFormat::Html,
        })
    }

    fn name(&self) -> &'static str {
        "DocxExtractor"
    }

    fn supports_extension(&self, extension: &str) -> bool {
        matches!(extension, "docx" | "doc")
    }
}
