use crate::document::StyleMap;
use crate::types::{Category, Suggestion, SuggestionId};
use serde::{Deserialize, Serialize};

/// Nominal heights of the results panel elements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogLayout {
    pub heading_height: f32,
    pub card_height: f32,
    pub viewport_height: f32,
}

impl Default for CatalogLayout {
    fn default() -> Self {
        Self {
            heading_height: 40.0,
            card_height: 120.0,
            viewport_height: 600.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionCard {
    pub id: SuggestionId,
    pub category: Category,
    pub original_text: String,
    pub corrected_text: String,
    pub context: String,
    pub adopted: bool,
    /// Warning badge: the last adoption was inserted rather than substituted
    pub unresolved: bool,
    pub style: StyleMap,
    pub top: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardGroup {
    pub category: Category,
    /// e.g. `错别字（3个）`
    pub heading: String,
    pub cards: Vec<SuggestionId>,
    pub top: f32,
    pub height: f32,
    pub style: StyleMap,
}

/// The scrollable container holding every card group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResultsPanel {
    pub scroll_top: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl ResultsPanel {
    pub fn max_scroll(&self) -> f32 {
        (self.content_height - self.viewport_height).max(0.0)
    }
}

/// Cards grouped by category, in the order they are displayed.
#[derive(Debug, Clone)]
pub struct SuggestionCatalog {
    groups: Vec<CardGroup>,
    cards: Vec<SuggestionCard>,
    panel: ResultsPanel,
}

impl SuggestionCatalog {
    pub fn empty(layout: CatalogLayout) -> Self {
        Self::build(&[], layout)
    }

    pub fn build(suggestions: &[Suggestion], layout: CatalogLayout) -> Self {
        let mut groups = Vec::new();
        let mut cards = Vec::new();
        let mut offset = 0.0;

        for category in Category::ALL {
            let members: Vec<&Suggestion> =
                suggestions.iter().filter(|s| s.category == category).collect();
            if members.is_empty() {
                continue;
            }

            let top = offset;
            let mut card_top = top + layout.heading_height;
            for suggestion in &members {
                cards.push(SuggestionCard {
                    id: suggestion.id,
                    category,
                    original_text: suggestion.original_text.clone(),
                    corrected_text: suggestion.corrected_text.clone(),
                    context: suggestion.context.clone(),
                    adopted: suggestion.adopted(),
                    unresolved: suggestion.unresolved(),
                    style: StyleMap::new(),
                    top: card_top,
                });
                card_top += layout.card_height;
            }

            let height = card_top - top;
            groups.push(CardGroup {
                category,
                heading: format!("{}（{}个）", category.label(), members.len()),
                cards: members.iter().map(|s| s.id).collect(),
                top,
                height,
                style: StyleMap::new(),
            });
            offset += height;
        }

        Self {
            groups,
            cards,
            panel: ResultsPanel {
                scroll_top: 0.0,
                viewport_height: layout.viewport_height,
                content_height: offset,
            },
        }
    }

    pub fn groups(&self) -> &[CardGroup] {
        &self.groups
    }

    pub fn group_mut(&mut self, category: Category) -> Option<&mut CardGroup> {
        self.groups.iter_mut().find(|g| g.category == category)
    }

    pub fn cards(&self) -> &[SuggestionCard] {
        &self.cards
    }

    pub fn card(&self, id: SuggestionId) -> Option<&SuggestionCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: SuggestionId) -> Option<&mut SuggestionCard> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    /// Mirror adoption badges from the tracker's suggestions
    pub fn sync_badges(&mut self, suggestions: &[Suggestion]) {
        for suggestion in suggestions {
            if let Some(card) = self.card_mut(suggestion.id) {
                card.adopted = suggestion.adopted();
                card.unresolved = suggestion.unresolved();
            }
        }
    }

    pub fn panel(&self) -> &ResultsPanel {
        &self.panel
    }

    /// Scroll the panel, clamped to its scrollable range; returns the new offset
    pub fn scroll_to(&mut self, top: f32) -> f32 {
        self.panel.scroll_top = top.clamp(0.0, self.panel.max_scroll());
        self.panel.scroll_top
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DetectedIssue;

    fn suggestion(id: u32, category: Category) -> Suggestion {
        Suggestion::from_issue(
            SuggestionId(id),
            DetectedIssue {
                category,
                original: format!("原{id}"),
                corrected: format!("改{id}"),
                context: String::new(),
                position: 0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_groups_skip_empty_categories() {
        let suggestions = vec![
            suggestion(0, Category::Style),
            suggestion(1, Category::Typo),
            suggestion(2, Category::Typo),
        ];
        let catalog = SuggestionCatalog::build(&suggestions, CatalogLayout::default());

        let headings: Vec<&str> = catalog.groups().iter().map(|g| g.heading.as_str()).collect();
        assert_eq!(headings, vec!["错别字（2个）", "优化建议（1个）"]);
        assert_eq!(catalog.groups()[1].top, 40.0 + 2.0 * 120.0);
        assert_eq!(catalog.card(SuggestionId(2)).unwrap().top, 40.0 + 120.0);
        assert_eq!(catalog.panel().content_height, 2.0 * 40.0 + 3.0 * 120.0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let suggestions: Vec<Suggestion> = (0..10).map(|i| suggestion(i, Category::Grammar)).collect();
        let mut catalog = SuggestionCatalog::build(&suggestions, CatalogLayout::default());

        assert_eq!(catalog.scroll_to(-25.0), 0.0);
        assert_eq!(catalog.scroll_to(1e6), catalog.panel().max_scroll());
        assert_eq!(catalog.panel().max_scroll(), 40.0 + 1200.0 - 600.0);
    }
}
