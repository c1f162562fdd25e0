use crate::document::{DocumentTree, ElementData, NodeKind};
use crate::error::DocumentError;
use crate::events::EventRegistry;
use crate::types::{DocumentChange, NodeId, Outcome, Span, SuggestionId};
use tracing::{debug, warn};

pub const DEFAULT_INSERTION_CLASS: &str = "suggestion-insertion";
pub const DEFAULT_INSERTION_LABEL: &str = "[已采纳建议] ";

/// Result of one replacer call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub outcome: Outcome,
    /// The new text node for `Replaced`, the inserted block for `Inserted`,
    /// the removed block for `Withdrawn`
    pub node: NodeId,
}

/// Mutates the document for a single suggestion and reports the change.
#[derive(Debug, Clone)]
pub struct SpanReplacer {
    insertion_class: String,
    insertion_label: String,
}

impl Default for SpanReplacer {
    fn default() -> Self {
        Self::new(DEFAULT_INSERTION_CLASS, DEFAULT_INSERTION_LABEL)
    }
}

impl SpanReplacer {
    pub fn new(insertion_class: &str, insertion_label: &str) -> Self {
        Self {
            insertion_class: insertion_class.to_string(),
            insertion_label: insertion_label.to_string(),
        }
    }

    /// Substitute `replacement` for the located span, or insert an annotated
    /// block at the top of the document when there is no usable span.
    pub fn replace(
        &self,
        tree: &mut DocumentTree,
        span: Option<&Span>,
        replacement: &str,
        origin: SuggestionId,
        notifier: &mut EventRegistry<DocumentChange>,
    ) -> Result<Applied, DocumentError> {
        let applied = match span.and_then(|s| Self::split_text(tree, s)) {
            Some((node, before, after)) => {
                let merged = format!("{before}{replacement}{after}");
                let new_node = tree.replace_node(node, NodeKind::text(merged))?;
                debug!("Replaced span in node {} for suggestion {}", node, origin);
                Applied {
                    outcome: Outcome::Replaced,
                    node: new_node,
                }
            }
            None => {
                if span.is_some() {
                    warn!("Span for suggestion {} no longer matches the document", origin);
                }
                let block = self.insert_block(tree, replacement, origin)?;
                warn!(
                    "Source text for suggestion {} not found, inserted annotated block",
                    origin
                );
                Applied {
                    outcome: Outcome::Inserted,
                    node: block,
                }
            }
        };

        notifier.emit(&DocumentChange {
            suggestion_id: origin,
            outcome: applied.outcome,
            live_text: replacement.to_string(),
        });
        Ok(applied)
    }

    /// Remove a block previously created by a fallback insertion
    pub fn withdraw(
        &self,
        tree: &mut DocumentTree,
        block: NodeId,
        origin: SuggestionId,
        restored_text: &str,
        notifier: &mut EventRegistry<DocumentChange>,
    ) -> Result<Applied, DocumentError> {
        tree.remove_subtree(block)?;
        debug!("Withdrew inserted block {} for suggestion {}", block, origin);

        notifier.emit(&DocumentChange {
            suggestion_id: origin,
            outcome: Outcome::Withdrawn,
            live_text: restored_text.to_string(),
        });
        Ok(Applied {
            outcome: Outcome::Withdrawn,
            node: block,
        })
    }

    /// True when `node` is a block this replacer inserted for `origin`
    pub fn is_inserted_block(&self, tree: &DocumentTree, node: NodeId, origin: SuggestionId) -> bool {
        tree.element(node).is_some_and(|e| {
            e.has_class(&self.insertion_class)
                && e.attributes.get("data-suggestion-id") == Some(&origin.0.to_string())
        })
    }

    fn insert_block(
        &self,
        tree: &mut DocumentTree,
        replacement: &str,
        origin: SuggestionId,
    ) -> Result<NodeId, DocumentError> {
        let element = ElementData::new("p")
            .with_class(&self.insertion_class)
            .with_attribute("data-suggestion-id", &origin.0.to_string());
        let block = tree.insert_first_child(tree.root(), NodeKind::Element(element))?;
        tree.append_text(block, &format!("{}{}", self.insertion_label, replacement))?;
        Ok(block)
    }

    /// Text before and after the span, None if the span is stale
    fn split_text(tree: &DocumentTree, span: &Span) -> Option<(NodeId, String, String)> {
        let text = tree.text(span.node)?;
        if span.start > span.end
            || span.end > text.len()
            || !text.is_char_boundary(span.start)
            || !text.is_char_boundary(span.end)
        {
            return None;
        }
        Some((
            span.node,
            text[..span.start].to_string(),
            text[span.end..].to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::builder::DocumentBuilder;
    use crate::locator::TextLocator;
    use crate::types::MatchStrategy;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_replace_preserves_siblings() {
        let mut tree = DocumentBuilder::new()
            .from_html("<p>前言</p><p>我们将<b>按装</b>新系统。</p>")
            .unwrap();
        let span = TextLocator::default().locate(&tree, "按装").unwrap();
        let mut notifier = EventRegistry::new();

        let applied = SpanReplacer::default()
            .replace(&mut tree, Some(&span), "安装", SuggestionId(0), &mut notifier)
            .unwrap();

        assert_eq!(applied.outcome, Outcome::Replaced);
        assert!(!tree.contains(span.node));
        assert_eq!(tree.to_html(), "<p>前言</p><p>我们将<b>安装</b>新系统。</p>");
    }

    #[test]
    fn test_missing_span_inserts_first_child() {
        let mut tree = DocumentBuilder::new().from_plaintext("今天天气很好。").unwrap();
        let mut notifier = EventRegistry::new();
        let replacer = SpanReplacer::default();

        let applied = replacer
            .replace(&mut tree, None, "香蕉和橙子", SuggestionId(4), &mut notifier)
            .unwrap();

        assert_eq!(applied.outcome, Outcome::Inserted);
        assert_eq!(tree.children(tree.root())[0], applied.node);
        assert!(replacer.is_inserted_block(&tree, applied.node, SuggestionId(4)));
        assert_eq!(tree.text_content(applied.node), "[已采纳建议] 香蕉和橙子");
    }

    #[test]
    fn test_stale_span_falls_back_to_insertion() {
        let mut tree = DocumentBuilder::new().from_plaintext("短").unwrap();
        let node = tree.text_nodes()[0];
        let stale = Span {
            node,
            start: 0,
            end: 40,
            strategy: MatchStrategy::Exact,
        };
        let mut notifier = EventRegistry::new();
        let applied = SpanReplacer::default()
            .replace(&mut tree, Some(&stale), "长", SuggestionId(1), &mut notifier)
            .unwrap();
        assert_eq!(applied.outcome, Outcome::Inserted);
        assert_eq!(tree.text(node), Some("短"));
    }

    #[test]
    fn test_each_call_notifies_once() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = EventRegistry::new();
        let sink = changes.clone();
        notifier.attach("preview", move |c: &DocumentChange| sink.borrow_mut().push(c.clone()));

        let mut tree = DocumentBuilder::new().from_plaintext("既使下雨").unwrap();
        let replacer = SpanReplacer::default();
        let span = TextLocator::default().locate(&tree, "既使");
        replacer
            .replace(&mut tree, span.as_ref(), "即使", SuggestionId(2), &mut notifier)
            .unwrap();
        let inserted = replacer
            .replace(&mut tree, None, "川流不息", SuggestionId(3), &mut notifier)
            .unwrap();
        replacer
            .withdraw(&mut tree, inserted.node, SuggestionId(3), "穿流不息", &mut notifier)
            .unwrap();

        let outcomes: Vec<Outcome> = changes.borrow().iter().map(|c| c.outcome).collect();
        assert_eq!(outcomes, vec![Outcome::Replaced, Outcome::Inserted, Outcome::Withdrawn]);
        assert_eq!(changes.borrow()[0].live_text, "即使");
        assert_eq!(tree.full_text(), "即使下雨");
    }
}
