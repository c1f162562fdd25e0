use crate::types::{NodeId, SuggestionId};

/// Failures surfaced by the adoption engine.
///
/// Locator misses and fallback insertions are outcomes, not errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown suggestion {0}")]
    UnknownSuggestion(SuggestionId),
    #[error("invalid suggestion: {0}")]
    InvalidSuggestion(String),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("node {0} is not part of the document")]
    MissingNode(NodeId),
    #[error("node {0} cannot hold children")]
    NotAnElement(NodeId),
    #[error("the document root cannot be removed or replaced")]
    RootNode,
    #[error("malformed markup at byte {position}: {reason}")]
    Markup { position: usize, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("unsupported file type '{0}' (expected .txt, .doc, .docx or .pdf)")]
    Unsupported(String),
    #[error("malformed {format} file: {reason}")]
    Malformed { format: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    pub fn malformed(format: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            format: format.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),
}
