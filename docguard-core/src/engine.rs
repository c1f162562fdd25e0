use crate::catalog::{CatalogLayout, SuggestionCatalog};
use crate::config::EngineConfig;
use crate::document::DocumentTree;
use crate::error::EngineError;
use crate::events::{EventRegistry, SubscriptionId};
use crate::highlight::{HighlightCoordinator, HighlightSet};
use crate::locator::TextLocator;
use crate::navigator::CatalogNavigator;
use crate::replacer::SpanReplacer;
use crate::scheduler::{EffectScheduler, VisualEffect};
use crate::tracker::AdoptionTracker;
use crate::types::{
    Category, ClickPoint, DetectedIssue, DocumentChange, NavigationTarget, ReplacementRecord, Suggestion,
    SuggestionId, ToggleResult,
};
use std::time::Duration;
use tracing::{debug, info};

/// Suggestion adoption engine for one loaded document.
///
/// All state that the UI layer mutates (the document, adoption flags,
/// replacement records, highlights, pending visual effects) is owned here and
/// torn down by `load_catalog` / `load_document`.
#[derive(Debug)]
pub struct AdoptionEngine {
    config: EngineConfig,
    document: DocumentTree,
    tracker: AdoptionTracker,
    catalog: SuggestionCatalog,
    locator: TextLocator,
    replacer: SpanReplacer,
    highlighter: HighlightCoordinator,
    navigator: CatalogNavigator,
    scheduler: EffectScheduler,
    changes: EventRegistry<DocumentChange>,
}

impl AdoptionEngine {
    pub fn new(document: DocumentTree, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let layout = Self::layout(&config);

        Ok(Self {
            locator: TextLocator::new(config.locator.similarity_threshold),
            replacer: SpanReplacer::new(
                &config.replacer.insertion_class,
                &config.replacer.insertion_label,
            ),
            highlighter: HighlightCoordinator::new(&config.highlight),
            navigator: CatalogNavigator::new(&config.navigator),
            catalog: SuggestionCatalog::empty(layout),
            tracker: AdoptionTracker::new(),
            scheduler: EffectScheduler::new(),
            changes: EventRegistry::new(),
            document,
            config,
        })
    }

    fn layout(config: &EngineConfig) -> CatalogLayout {
        CatalogLayout {
            heading_height: config.navigator.heading_height,
            card_height: config.navigator.card_height,
            viewport_height: config.navigator.viewport_height,
        }
    }

    /// Replace the whole catalog. Ids are assigned in insertion order and all
    /// adoption, record, highlight and timer state is discarded.
    pub fn load_catalog(&mut self, issues: Vec<DetectedIssue>) -> Result<(), EngineError> {
        let suggestions = issues
            .into_iter()
            .enumerate()
            .map(|(index, issue)| Suggestion::from_issue(SuggestionId(index as u32), issue))
            .collect::<Result<Vec<_>, _>>()?;

        self.reset_presentation();
        info!("Loaded catalog with {} suggestions", suggestions.len());
        self.catalog = SuggestionCatalog::build(&suggestions, Self::layout(&self.config));
        self.tracker.load(suggestions);
        Ok(())
    }

    /// Swap in a new document; the catalog belongs to the old one and is cleared
    pub fn load_document(&mut self, document: DocumentTree) {
        self.reset_presentation();
        self.document = document;
        self.tracker.load(Vec::new());
        self.catalog = SuggestionCatalog::empty(Self::layout(&self.config));
    }

    fn reset_presentation(&mut self) {
        self.highlighter
            .clear(&mut self.document, &mut self.catalog, &mut self.scheduler);
        self.navigator.reset(&mut self.scheduler);
        self.scheduler.clear();
    }

    pub fn toggle(&mut self, id: SuggestionId) -> Result<ToggleResult, EngineError> {
        let result = self.tracker.toggle(
            id,
            &mut self.document,
            &self.locator,
            &self.replacer,
            &mut self.changes,
        )?;

        self.catalog.sync_badges(self.tracker.suggestions());
        self.highlighter.resync(
            self.tracker.records(),
            &mut self.document,
            &mut self.catalog,
            &mut self.scheduler,
        );
        Ok(result)
    }

    pub fn handle_document_click(&mut self, point: ClickPoint) -> HighlightSet {
        self.highlighter.handle_click(
            point,
            self.tracker.records(),
            &mut self.document,
            &mut self.catalog,
            &mut self.scheduler,
        )
    }

    /// Returns whether a matching card group was found
    pub fn jump_to_category(&mut self, target: NavigationTarget) -> bool {
        self.navigator
            .jump_to(target, &mut self.catalog, &mut self.scheduler)
    }

    /// Advance the effect clock and apply every effect that came due
    pub fn advance_time(&mut self, by: Duration) -> Vec<VisualEffect> {
        let fired = self.scheduler.advance(by);
        for effect in &fired {
            match *effect {
                VisualEffect::ScrollPanel { top } => {
                    self.navigator.scroll_fired();
                    self.catalog.scroll_to(top);
                }
                VisualEffect::ClearGroupHighlight { category } => {
                    self.navigator.clear_highlight(category, &mut self.catalog);
                }
                VisualEffect::RevealCard { id } => {
                    if let Some(card_top) = self.catalog.card(id).map(|c| c.top) {
                        self.catalog
                            .scroll_to(card_top - self.navigator.scroll_margin());
                    }
                }
            }
            debug!("Applied {:?}", effect);
        }
        fired
    }

    pub fn subscribe<F>(&mut self, key: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&DocumentChange) + 'static,
    {
        self.changes.attach(key, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.changes.detach(id)
    }

    pub fn document(&self) -> &DocumentTree {
        &self.document
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        self.tracker.suggestions()
    }

    pub fn suggestion(&self, id: SuggestionId) -> Option<&Suggestion> {
        self.tracker.get(id)
    }

    pub fn records(&self) -> Vec<&ReplacementRecord> {
        self.tracker.records().collect()
    }

    pub fn catalog(&self) -> &SuggestionCatalog {
        &self.catalog
    }

    pub fn highlight(&self) -> &HighlightSet {
        self.highlighter.current()
    }

    pub fn highlighted_group(&self) -> Option<Category> {
        self.navigator.highlighted()
    }

    pub fn pending_effects(&self) -> Vec<VisualEffect> {
        self.scheduler.pending()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
