use crate::error::ConfigError;
use crate::types::{Category, DetectedIssue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Characters of context kept on each side of a hit
const CONTEXT_CHARS: usize = 10;

/// Scans extracted text for issues worth suggesting a correction for.
pub trait Detector {
    fn detect(&self, text: &str) -> Vec<DetectedIssue>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRule {
    pub original: String,
    pub corrected: String,
    pub category: Category,
}

impl DetectionRule {
    fn new(original: &str, corrected: &str, category: Category) -> Self {
        Self {
            original: original.to_string(),
            corrected: corrected.to_string(),
            category,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.original.is_empty() || self.corrected.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "detection rule '{}' -> '{}' has empty text",
                self.original, self.corrected
            )));
        }
        if self.original == self.corrected {
            return Err(ConfigError::Invalid(format!(
                "detection rule '{}' corrects to itself",
                self.original
            )));
        }
        Ok(())
    }
}

/// Built-in dictionary of known mistakes
pub fn default_rules() -> Vec<DetectionRule> {
    vec![
        DetectionRule::new("按装", "安装", Category::Typo),
        DetectionRule::new("既使", "即使", Category::Typo),
        DetectionRule::new("穿流不息", "川流不息", Category::Typo),
        DetectionRule::new("香蕉，和橙子", "香蕉和橙子", Category::Grammar),
        DetectionRule::new("不仅学习好，但是", "不仅学习好，而且", Category::Grammar),
        DetectionRule::new(
            "进行了详细的分析，我们",
            "通过对项目进行详细分析，我们",
            Category::Style,
        ),
        DetectionRule::new("具有一定的竞争力", "具备较强竞争力", Category::Style),
    ]
}

/// Literal dictionary matcher. Reports every occurrence of every rule,
/// overlapping ones included, in rule order and then text order.
#[derive(Debug, Clone)]
pub struct PatternDetector {
    rules: Vec<DetectionRule>,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl PatternDetector {
    pub fn new(rules: Vec<DetectionRule>) -> Result<Self, ConfigError> {
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[DetectionRule] {
        &self.rules
    }
}

impl Detector for PatternDetector {
    fn detect(&self, text: &str) -> Vec<DetectedIssue> {
        let chars: Vec<char> = text.chars().collect();
        let mut issues = Vec::new();

        for rule in &self.rules {
            let needle: Vec<char> = rule.original.chars().collect();
            if needle.len() > chars.len() {
                continue;
            }
            // Resume one char after each hit so overlapping occurrences count
            for position in 0..=chars.len() - needle.len() {
                if chars[position..position + needle.len()] != needle[..] {
                    continue;
                }
                let from = position.saturating_sub(CONTEXT_CHARS);
                let to = (position + needle.len() + CONTEXT_CHARS).min(chars.len());
                issues.push(DetectedIssue {
                    category: rule.category,
                    original: rule.original.clone(),
                    corrected: rule.corrected.clone(),
                    context: chars[from..to].iter().collect(),
                    position,
                });
            }
        }

        debug!("{} found {} issues", self.name(), issues.len());
        issues
    }

    fn name(&self) -> &'static str {
        "PatternDetector"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_default_rules_with_char_positions() {
        let text = "我们将按装新系统。即使下雨，既使刮风。";
        let issues = PatternDetector::default().detect(text);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].original, "按装");
        assert_eq!(issues[0].position, 3);
        assert_eq!(issues[0].category, Category::Typo);
        assert_eq!(issues[1].original, "既使");
        assert_eq!(issues[1].position, 14);
    }

    #[test]
    fn test_context_is_clipped_to_ten_chars() {
        let text = "一二三四五六七八九十甲乙按装子丑寅卯辰巳午未申酉戌亥";
        let issues = PatternDetector::default().detect(text);
        assert_eq!(issues[0].context, "三四五六七八九十甲乙按装子丑寅卯辰巳午未申酉");
    }

    #[test]
    fn test_overlapping_occurrences_are_reported() {
        let detector = PatternDetector::new(vec![DetectionRule::new("啊啊", "啊", Category::Style)]).unwrap();
        let positions: Vec<usize> = detector.detect("啊啊啊").iter().map(|i| i.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn test_rejects_degenerate_rules() {
        assert!(PatternDetector::new(vec![DetectionRule::new("", "x", Category::Typo)]).is_err());
        assert!(PatternDetector::new(vec![DetectionRule::new("同", "同", Category::Typo)]).is_err());
    }

    #[test]
    fn test_output_follows_rule_order() {
        let text = "具有一定的竞争力，香蕉，和橙子，按装";
        let categories: Vec<Category> = PatternDetector::default()
            .detect(text)
            .iter()
            .map(|i| i.category)
            .collect();
        assert_eq!(categories, vec![Category::Typo, Category::Grammar, Category::Style]);
    }
}
