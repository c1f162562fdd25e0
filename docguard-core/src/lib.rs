// DocGuard Core Library
//
// Suggestion adoption engine for document review: locates flagged text in a
// rendered document, applies and reverts corrections, and keeps the
// suggestion cards and document highlights in sync.

pub mod catalog;
pub mod config;
pub mod detector;
pub mod document;
pub mod engine;
pub mod error;
pub mod events;
pub mod extraction;
pub mod highlight;
pub mod locator;
pub mod navigator;
pub mod replacer;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod tracker;
pub mod types;

// Re-export main types and functions for easy use
pub use types::*;
pub use config::EngineConfig;
pub use detector::{Detector, PatternDetector};
pub use document::{builder::DocumentBuilder, DocumentTree};
pub use engine::AdoptionEngine;
pub use error::{ConfigError, DocumentError, EngineError, ExtractionError};
pub use extraction::ExtractionService;
pub use highlight::HighlightSet;
pub use report::ReviewReport;
pub use scheduler::VisualEffect;
pub use session::{ReviewSession, ReviewStep, StepProfiler, StepTiming};
