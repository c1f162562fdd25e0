use crate::catalog::SuggestionCatalog;
use crate::config::HighlightConfig;
use crate::document::{DocumentTree, StyleMap};
use crate::scheduler::{EffectScheduler, TimerId, VisualEffect};
use crate::types::{ClickPoint, NodeId, ReplacementRecord, SuggestionId};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Block(NodeId),
    Card(SuggestionId),
}

/// What is currently emphasized after a click
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HighlightSet {
    pub block: Option<NodeId>,
    pub cards: Vec<SuggestionId>,
}

impl HighlightSet {
    pub fn is_empty(&self) -> bool {
        self.block.is_none() && self.cards.is_empty()
    }
}

/// Links a clicked document block to the suggestion cards whose live text
/// it contains. At most one highlight set is active; every element's style
/// is restored to what it was before it was highlighted.
#[derive(Debug)]
pub struct HighlightCoordinator {
    block_style: StyleMap,
    card_style: StyleMap,
    reveal_delay: Duration,
    saved: Vec<(Target, StyleMap)>,
    current: HighlightSet,
    reveal_slot: Option<TimerId>,
}

impl HighlightCoordinator {
    pub fn new(config: &HighlightConfig) -> Self {
        Self {
            block_style: config.block_style.clone(),
            card_style: config.card_style.clone(),
            reveal_delay: config.reveal_delay(),
            saved: Vec::new(),
            current: HighlightSet::default(),
            reveal_slot: None,
        }
    }

    pub fn current(&self) -> &HighlightSet {
        &self.current
    }

    pub fn handle_click<'a>(
        &mut self,
        point: ClickPoint,
        records: impl IntoIterator<Item = &'a ReplacementRecord>,
        tree: &mut DocumentTree,
        catalog: &mut SuggestionCatalog,
        scheduler: &mut EffectScheduler,
    ) -> HighlightSet {
        self.clear(tree, catalog, scheduler);

        if !tree.contains(point.node) {
            debug!("Ignoring click on stale node {}", point.node);
            return HighlightSet::default();
        }
        let Some(block) = tree.enclosing_block(point.node) else {
            return HighlightSet::default();
        };

        self.highlight_block(block, records, tree, catalog, scheduler)
    }

    /// Re-evaluate the active highlight after the document or records changed
    pub fn resync<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a ReplacementRecord>,
        tree: &mut DocumentTree,
        catalog: &mut SuggestionCatalog,
        scheduler: &mut EffectScheduler,
    ) -> HighlightSet {
        let previous = self.current.block;
        self.clear(tree, catalog, scheduler);
        match previous.filter(|b| tree.contains(*b)) {
            Some(block) => self.highlight_block(block, records, tree, catalog, scheduler),
            None => HighlightSet::default(),
        }
    }

    fn highlight_block<'a>(
        &mut self,
        block: NodeId,
        records: impl IntoIterator<Item = &'a ReplacementRecord>,
        tree: &mut DocumentTree,
        catalog: &mut SuggestionCatalog,
        scheduler: &mut EffectScheduler,
    ) -> HighlightSet {
        let text = tree.text_content(block);
        let mut cards: Vec<SuggestionId> = records
            .into_iter()
            .filter(|r| !r.live_text.is_empty() && text.contains(&r.live_text))
            .map(|r| r.suggestion_id)
            .collect();
        cards.sort();
        cards.dedup();

        if cards.is_empty() {
            debug!("No replacement records match block {}", block);
            return HighlightSet::default();
        }

        if let Some(element) = tree.element_mut(block) {
            self.saved.push((Target::Block(block), element.style.clone()));
            element.style.extend(self.block_style.clone());
        }
        for id in &cards {
            if let Some(card) = catalog.card_mut(*id) {
                self.saved.push((Target::Card(*id), card.style.clone()));
                card.style.extend(self.card_style.clone());
            }
        }

        scheduler.reschedule(
            &mut self.reveal_slot,
            self.reveal_delay,
            VisualEffect::RevealCard { id: cards[0] },
        );
        debug!("Highlighted block {} with {} cards", block, cards.len());

        self.current = HighlightSet {
            block: Some(block),
            cards,
        };
        self.current.clone()
    }

    /// Restore every highlighted element and drop any pending reveal
    pub fn clear(
        &mut self,
        tree: &mut DocumentTree,
        catalog: &mut SuggestionCatalog,
        scheduler: &mut EffectScheduler,
    ) {
        // Reverse order so a doubly-saved element ends at its oldest state
        for (target, style) in self.saved.drain(..).rev() {
            match target {
                Target::Block(id) => {
                    if let Some(element) = tree.element_mut(id) {
                        element.style = style;
                    }
                }
                Target::Card(id) => {
                    if let Some(card) = catalog.card_mut(id) {
                        card.style = style;
                    }
                }
            }
        }
        if let Some(timer) = self.reveal_slot.take() {
            scheduler.cancel(timer);
        }
        self.current = HighlightSet::default();
    }
}
