use crate::document::DocumentTree;
use crate::error::EngineError;
use crate::events::EventRegistry;
use crate::locator::TextLocator;
use crate::replacer::SpanReplacer;
use crate::types::{
    DocumentChange, NodeId, Outcome, ReplacementRecord, Span, Suggestion, SuggestionId,
    ToggleResult,
};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Owns the adopted/unresolved state of every suggestion in the catalog and
/// the replacement records used to map document text back to suggestions.
#[derive(Debug, Default)]
pub struct AdoptionTracker {
    suggestions: Vec<Suggestion>,
    records: BTreeMap<SuggestionId, ReplacementRecord>,
    /// Blocks created by fallback insertions, by the suggestion that made them
    inserted_blocks: HashMap<SuggestionId, NodeId>,
    /// Where each in-place replacement landed, so the next toggle edits the
    /// same text instead of the first lookalike in the document
    live_spans: HashMap<SuggestionId, Span>,
}

impl AdoptionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog, discarding all adoption state and records
    pub fn load(&mut self, suggestions: Vec<Suggestion>) {
        self.suggestions = suggestions;
        self.records.clear();
        self.inserted_blocks.clear();
        self.live_spans.clear();
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn get(&self, id: SuggestionId) -> Option<&Suggestion> {
        self.suggestions.iter().find(|s| s.id == id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ReplacementRecord> {
        self.records.values()
    }

    pub fn record(&self, id: SuggestionId) -> Option<&ReplacementRecord> {
        self.records.get(&id)
    }

    /// Flip one suggestion between its original and corrected text.
    ///
    /// Only an unknown id is an error; a locator miss falls back to an
    /// inserted block and is reported through `unresolved`.
    pub fn toggle(
        &mut self,
        id: SuggestionId,
        tree: &mut DocumentTree,
        locator: &TextLocator,
        replacer: &SpanReplacer,
        notifier: &mut EventRegistry<DocumentChange>,
    ) -> Result<ToggleResult, EngineError> {
        let index = self
            .suggestions
            .iter()
            .position(|s| s.id == id)
            .ok_or(EngineError::UnknownSuggestion(id))?;

        let (source, target, hint) = {
            let s = &self.suggestions[index];
            if s.adopted {
                (s.corrected_text.clone(), s.original_text.clone(), s.detected_position)
            } else {
                (s.original_text.clone(), s.corrected_text.clone(), s.detected_position)
            }
        };

        // Reverting a fallback insertion takes the block back out
        let live_block = self
            .inserted_blocks
            .get(&id)
            .copied()
            .filter(|block| replacer.is_inserted_block(tree, *block, id));

        let (outcome, strategy) = match live_block {
            Some(block) => {
                replacer.withdraw(tree, block, id, &target, notifier)?;
                self.inserted_blocks.remove(&id);
                (Outcome::Withdrawn, None)
            }
            None => {
                let span = self
                    .remembered_span(tree, id, &source)
                    .or_else(|| locator.locate_near(tree, &source, hint));
                let applied = replacer.replace(tree, span.as_ref(), &target, id, notifier)?;
                self.live_spans.remove(&id);
                match (applied.outcome, span) {
                    (Outcome::Replaced, Some(span)) => {
                        self.inserted_blocks.remove(&id);
                        self.track_replacement(id, &span, applied.node, target.len());
                        (applied.outcome, Some(span.strategy))
                    }
                    _ => {
                        self.inserted_blocks.insert(id, applied.node);
                        (applied.outcome, None)
                    }
                }
            }
        };

        let suggestion = &mut self.suggestions[index];
        suggestion.adopted = !suggestion.adopted;
        suggestion.unresolved = outcome == Outcome::Inserted;

        self.records.insert(
            id,
            ReplacementRecord {
                suggestion_id: id,
                live_text: target,
                displaced_text: source,
            },
        );

        info!(
            "Suggestion {} toggled: {:?}, adopted={}, unresolved={}",
            id, outcome, suggestion.adopted, suggestion.unresolved
        );

        Ok(ToggleResult {
            suggestion_id: id,
            outcome,
            adopted: suggestion.adopted,
            unresolved: suggestion.unresolved,
            strategy,
        })
    }

    /// The span left by this suggestion's last replacement, if the document
    /// still holds `source` there
    fn remembered_span(&self, tree: &DocumentTree, id: SuggestionId, source: &str) -> Option<Span> {
        let span = self.live_spans.get(&id)?;
        let text = tree.text(span.node)?;
        (text.get(span.start..span.end) == Some(source)).then(|| span.clone())
    }

    /// Record the new span for `id` and move other spans in the rewritten
    /// node onto its replacement. Spans overlapping the edit are dropped.
    fn track_replacement(&mut self, id: SuggestionId, span: &Span, new_node: NodeId, new_len: usize) {
        let old_len = span.end - span.start;
        self.live_spans.retain(|_, other| {
            if other.node != span.node {
                return true;
            }
            if other.end <= span.start {
                other.node = new_node;
                true
            } else if other.start >= span.end {
                other.node = new_node;
                other.start = other.start - old_len + new_len;
                other.end = other.end - old_len + new_len;
                true
            } else {
                false
            }
        });
        self.live_spans.insert(
            id,
            Span {
                node: new_node,
                start: span.start,
                end: span.start + new_len,
                strategy: span.strategy,
            },
        );
    }
}
