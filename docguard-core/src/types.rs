use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::EngineError;

pub type NodeId = Uuid;

/// Version of the serialized report and tree formats
pub const SCHEMA_VERSION: &str = "1.0";

// ===== SUGGESTION TYPES =====

/// Stable identifier of a suggestion within the currently loaded catalog.
/// Assigned in insertion order when the catalog is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SuggestionId(pub u32);

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Typo,
    Grammar,
    Style,
}

impl Category {
    /// Display order of the card groups in the results panel
    pub const ALL: [Category; 3] = [Category::Typo, Category::Grammar, Category::Style];

    /// Label used on card group headings and category buttons
    pub fn label(&self) -> &'static str {
        match self {
            Category::Typo => "错别字",
            Category::Grammar => "语法错误",
            Category::Style => "优化建议",
        }
    }
}

/// Target of a category button in the results panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationTarget {
    All,
    Category(Category),
}

/// One flagged issue as reported by an error detector.
/// Ids and adoption state are assigned by the engine, not the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedIssue {
    pub category: Category,
    pub original: String,
    pub corrected: String,
    pub context: String,
    /// Character offset in the extracted text at detection time
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub category: Category,
    pub original_text: String,
    pub corrected_text: String,
    /// Informational excerpt, never used for matching
    pub context: String,
    /// Advisory only: document mutations invalidate it
    pub detected_position: usize,
    // Owned by the adoption tracker
    pub(crate) adopted: bool,
    pub(crate) unresolved: bool,
}

impl Suggestion {
    pub fn from_issue(id: SuggestionId, issue: DetectedIssue) -> Result<Self, EngineError> {
        if issue.original.is_empty() || issue.corrected.is_empty() {
            return Err(EngineError::InvalidSuggestion(format!(
                "{id}: original and corrected text must be non-empty"
            )));
        }
        if issue.original == issue.corrected {
            return Err(EngineError::InvalidSuggestion(format!(
                "{id}: corrected text is identical to original '{}'",
                issue.original
            )));
        }

        Ok(Self {
            id,
            category: issue.category,
            original_text: issue.original,
            corrected_text: issue.corrected,
            context: issue.context,
            detected_position: issue.position,
            adopted: false,
            unresolved: false,
        })
    }

    pub fn adopted(&self) -> bool {
        self.adopted
    }

    /// True when the last toggle fell back to inserting a block instead of replacing in place
    pub fn unresolved(&self) -> bool {
        self.unresolved
    }

    /// Text that should currently be live in the document for this suggestion
    pub fn live_text(&self) -> &str {
        if self.adopted {
            &self.corrected_text
        } else {
            &self.original_text
        }
    }
}

// ===== ADOPTION TYPES =====

/// Maps the text a toggle made live back to the suggestion that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementRecord {
    pub suggestion_id: SuggestionId,
    /// Text currently present for the suggestion
    pub live_text: String,
    /// Text the last toggle removed
    pub displaced_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    Exact,
    Normalized,
    Similarity,
}

/// A substring of one text node. Offsets are byte offsets on char boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
    pub strategy: MatchStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Source text located and substituted in place
    Replaced,
    /// Source text not found; an annotated block was inserted at the top
    Inserted,
    /// A previously inserted block was taken back out
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleResult {
    pub suggestion_id: SuggestionId,
    pub outcome: Outcome,
    pub adopted: bool,
    pub unresolved: bool,
    /// How the source text was found, None when nothing was located
    pub strategy: Option<MatchStrategy>,
}

/// Change notification emitted once per replacer call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChange {
    pub suggestion_id: SuggestionId,
    pub outcome: Outcome,
    pub live_text: String,
}

/// Where the user clicked inside the rendered document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickPoint {
    pub node: NodeId,
}

// ===== EXTRACTION TYPES =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentFormat {
    #[serde(rename = "plaintext")]
    PlainText,
    #[serde(rename = "html")]
    Html,
}

/// Output of the document extraction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Plaintext or HTML, per `format`
    pub content: String,
    /// Plain text used for error detection
    pub text_content: String,
    pub format: ContentFormat,
}
