use crate::session::StepTiming;
use crate::types::{Category, ContentFormat, Suggestion, SCHEMA_VERSION};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub adopted: usize,
    pub unresolved: usize,
    /// Keyed by category label, e.g. `错别字`
    pub by_category: BTreeMap<String, usize>,
}

impl ReportSummary {
    pub fn from_suggestions(suggestions: &[Suggestion]) -> Self {
        let mut by_category = BTreeMap::new();
        for category in Category::ALL {
            let count = suggestions.iter().filter(|s| s.category == category).count();
            if count > 0 {
                by_category.insert(category.label().to_string(), count);
            }
        }

        Self {
            total: suggestions.len(),
            adopted: suggestions.iter().filter(|s| s.adopted()).count(),
            unresolved: suggestions.iter().filter(|s| s.unresolved()).count(),
            by_category,
        }
    }
}

/// Serializable outcome of a review session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewReport {
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub file_name: String,
    pub source_sha256: String,
    pub format: ContentFormat,
    pub summary: ReportSummary,
    pub suggestions: Vec<Suggestion>,
    /// Rendered document with all adoptions applied
    pub html: String,
    pub text: String,
    /// Present only for profiled runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timings: Vec<StepTiming>,
}

impl ReviewReport {
    pub fn new(
        file_name: &str,
        source_sha256: &str,
        format: ContentFormat,
        suggestions: &[Suggestion],
        html: String,
        text: String,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            file_name: file_name.to_string(),
            source_sha256: source_sha256.to_string(),
            format,
            summary: ReportSummary::from_suggestions(suggestions),
            suggestions: suggestions.to_vec(),
            html,
            text,
            timings: Vec::new(),
        }
    }

    pub fn with_timings(mut self, timings: Vec<StepTiming>) -> Self {
        self.timings = timings;
        self
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Hex SHA-256 of the uploaded bytes
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint(b"docguard"), fingerprint(b"docguard"));
        assert_ne!(fingerprint(b"docguard"), fingerprint(b"docguard!"));
        assert_eq!(fingerprint(b"").len(), 64);
    }
}
