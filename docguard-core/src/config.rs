use crate::detector::{default_rules, DetectionRule};
use crate::document::StyleMap;
use crate::error::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Default value functions for serde
fn default_similarity_threshold() -> f32 {
    0.5
}

fn default_insertion_class() -> String {
    "suggestion-insertion".to_string()
}

fn default_insertion_label() -> String {
    "[已采纳建议] ".to_string()
}

fn default_block_style() -> StyleMap {
    style(&[("background-color", "#fffbeb"), ("outline", "2px solid #f59e0b")])
}

fn default_card_style() -> StyleMap {
    style(&[("background-color", "#fef3c7"), ("border-color", "#f59e0b")])
}

fn default_group_highlight_style() -> StyleMap {
    style(&[("background-color", "#fef3c7")])
}

fn default_reveal_delay_ms() -> u64 {
    100
}

fn default_scroll_margin() -> f32 {
    10.0
}

fn default_scroll_delay_ms() -> u64 {
    100
}

fn default_highlight_duration_ms() -> u64 {
    2000
}

fn default_heading_height() -> f32 {
    40.0
}

fn default_card_height() -> f32 {
    120.0
}

fn default_viewport_height() -> f32 {
    600.0
}

fn style(pairs: &[(&str, &str)]) -> StyleMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Top-level configuration for a review session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub locator: LocatorConfig,
    #[serde(default)]
    pub replacer: ReplacerConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub navigator: NavigatorConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Minimum similarity (exclusive) for the best-effort match, 0.0-1.0
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacerConfig {
    /// Class put on blocks inserted when the source text cannot be found
    #[serde(default = "default_insertion_class")]
    pub insertion_class: String,
    /// Prefix of the inserted block's text
    #[serde(default = "default_insertion_label")]
    pub insertion_label: String,
}

impl Default for ReplacerConfig {
    fn default() -> Self {
        Self {
            insertion_class: default_insertion_class(),
            insertion_label: default_insertion_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Style applied to the clicked document block
    #[serde(default = "default_block_style")]
    pub block_style: StyleMap,
    /// Style applied to matching suggestion cards
    #[serde(default = "default_card_style")]
    pub card_style: StyleMap,
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            block_style: default_block_style(),
            card_style: default_card_style(),
            reveal_delay_ms: default_reveal_delay_ms(),
        }
    }
}

impl HighlightConfig {
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorConfig {
    /// Gap left above a group after scrolling to it, in px
    #[serde(default = "default_scroll_margin")]
    pub scroll_margin: f32,
    #[serde(default = "default_scroll_delay_ms")]
    pub scroll_delay_ms: u64,
    /// How long a group stays highlighted after a jump
    #[serde(default = "default_highlight_duration_ms")]
    pub highlight_duration_ms: u64,
    #[serde(default = "default_group_highlight_style")]
    pub highlight_style: StyleMap,
    // Results panel layout
    #[serde(default = "default_heading_height")]
    pub heading_height: f32,
    #[serde(default = "default_card_height")]
    pub card_height: f32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            scroll_margin: default_scroll_margin(),
            scroll_delay_ms: default_scroll_delay_ms(),
            highlight_duration_ms: default_highlight_duration_ms(),
            highlight_style: default_group_highlight_style(),
            heading_height: default_heading_height(),
            card_height: default_card_height(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl NavigatorConfig {
    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    pub fn highlight_duration(&self) -> Duration {
        Duration::from_millis(self.highlight_duration_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_rules")]
    pub rules: Vec<DetectionRule>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl EngineConfig {
    /// Load config from a YAML file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}, using defaults", p, e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.locator.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "locator.similarity_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.replacer.insertion_class.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "replacer.insertion_class must not be empty".to_string(),
            ));
        }
        let nav = &self.navigator;
        if nav.scroll_margin < 0.0 || nav.heading_height < 0.0 || nav.card_height < 0.0 {
            return Err(ConfigError::Invalid(
                "navigator margins and heights must not be negative".to_string(),
            ));
        }
        if nav.viewport_height <= 0.0 {
            return Err(ConfigError::Invalid(
                "navigator.viewport_height must be positive".to_string(),
            ));
        }
        for rule in &self.detector.rules {
            rule.validate()?;
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "locator:\n  similarity_threshold: 0.7\nnavigator:\n  scroll_margin: 4\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.locator.similarity_threshold, 0.7);
        assert_eq!(config.navigator.scroll_margin, 4.0);
        assert_eq!(config.navigator.highlight_duration_ms, 2000);
        assert_eq!(config.replacer.insertion_label, "[已采纳建议] ");
        assert_eq!(config.detector.rules.len(), 7);
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let mut config = EngineConfig::default();
        config.locator.similarity_threshold = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file_roundtrip() {
        let path = std::env::temp_dir().join("docguard_test_config.yaml");
        let mut config = EngineConfig::default();
        config.detector.rules = vec![DetectionRule {
            original: "的的".to_string(),
            corrected: "的".to_string(),
            category: Category::Typo,
        }];
        std::fs::write(&path, config.to_yaml().unwrap()).unwrap();

        let loaded = EngineConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.detector.rules, config.detector.rules);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_fallback_on_missing_file() {
        let config = EngineConfig::load_with_fallback(Some("/nonexistent/docguard.yaml"));
        assert_eq!(config.locator.similarity_threshold, 0.5);
    }
}
