use crate::catalog::SuggestionCatalog;
use crate::config::NavigatorConfig;
use crate::document::StyleMap;
use crate::scheduler::{EffectScheduler, TimerId, VisualEffect};
use crate::types::{Category, NavigationTarget};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

// "错别字（3个）", "错别字 (3)", "错别字"
static HEADING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(.+?)\s*(?:[（(]\s*\d+\s*个?\s*[)）])?\s*$").unwrap()
});

/// True if a group heading names the category label, with or without a count
pub fn heading_matches(heading: &str, label: &str) -> bool {
    let exact = HEADING_REGEX
        .captures(heading)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| m.as_str() == label);
    exact || heading.contains(label)
}

/// Maps category buttons to card groups in the results panel.
#[derive(Debug)]
pub struct CatalogNavigator {
    scroll_margin: f32,
    scroll_delay: Duration,
    highlight_duration: Duration,
    highlight_style: StyleMap,
    scroll_slot: Option<TimerId>,
    clear_slot: Option<TimerId>,
    /// Group currently carrying the transient highlight, with its prior style
    highlighted: Option<(Category, StyleMap)>,
}

impl CatalogNavigator {
    pub fn new(config: &NavigatorConfig) -> Self {
        Self {
            scroll_margin: config.scroll_margin,
            scroll_delay: config.scroll_delay(),
            highlight_duration: config.highlight_duration(),
            highlight_style: config.highlight_style.clone(),
            scroll_slot: None,
            clear_slot: None,
            highlighted: None,
        }
    }

    pub fn scroll_margin(&self) -> f32 {
        self.scroll_margin
    }

    pub fn highlighted(&self) -> Option<Category> {
        self.highlighted.as_ref().map(|(c, _)| *c)
    }

    /// Schedule a scroll to the target group. Returns false when no group
    /// matches, in which case nothing is scrolled or highlighted.
    pub fn jump_to(
        &mut self,
        target: NavigationTarget,
        catalog: &mut SuggestionCatalog,
        scheduler: &mut EffectScheduler,
    ) -> bool {
        let category = match target {
            NavigationTarget::All => {
                scheduler.reschedule(
                    &mut self.scroll_slot,
                    self.scroll_delay,
                    VisualEffect::ScrollPanel { top: 0.0 },
                );
                debug!("Scheduled scroll to top of results panel");
                return true;
            }
            NavigationTarget::Category(category) => category,
        };

        let label = category.label();
        let Some(top) = catalog
            .groups()
            .iter()
            .find(|g| heading_matches(&g.heading, label))
            .map(|g| g.top)
        else {
            warn!("No card group found for category '{}'", label);
            return false;
        };

        // A new jump supersedes the previous group highlight
        self.restore_highlight(catalog);
        if let Some(timer) = self.clear_slot.take() {
            scheduler.cancel(timer);
        }

        if let Some(group) = catalog.group_mut(category) {
            self.highlighted = Some((category, group.style.clone()));
            group.style.extend(self.highlight_style.clone());
        }

        let scroll_top = (top - self.scroll_margin).max(0.0);
        scheduler.reschedule(
            &mut self.scroll_slot,
            self.scroll_delay,
            VisualEffect::ScrollPanel { top: scroll_top },
        );
        scheduler.reschedule(
            &mut self.clear_slot,
            self.highlight_duration,
            VisualEffect::ClearGroupHighlight { category },
        );

        debug!("Scheduled scroll to '{}' at {:.1}", label, scroll_top);
        true
    }

    /// Handle a fired `ClearGroupHighlight` effect
    pub fn clear_highlight(&mut self, category: Category, catalog: &mut SuggestionCatalog) {
        if self.highlighted() == Some(category) {
            self.restore_highlight(catalog);
            self.clear_slot = None;
        }
    }

    /// Handle a fired `ScrollPanel` effect
    pub fn scroll_fired(&mut self) {
        self.scroll_slot = None;
    }

    /// Cancel pending work and forget the highlighted group
    pub fn reset(&mut self, scheduler: &mut EffectScheduler) {
        for slot in [self.scroll_slot.take(), self.clear_slot.take()].into_iter().flatten() {
            scheduler.cancel(slot);
        }
        self.highlighted = None;
    }

    fn restore_highlight(&mut self, catalog: &mut SuggestionCatalog) {
        if let Some((category, style)) = self.highlighted.take() {
            if let Some(group) = catalog.group_mut(category) {
                group.style = style;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_matching_is_tolerant() {
        assert!(heading_matches("错别字（3个）", "错别字"));
        assert!(heading_matches("错别字 (12)", "错别字"));
        assert!(heading_matches("  语法错误  ", "语法错误"));
        assert!(heading_matches("检测到的优化建议", "优化建议"));
        assert!(!heading_matches("错别字（3个）", "语法错误"));
    }
}
