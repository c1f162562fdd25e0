use crate::document::DocumentTree;
use crate::types::{MatchStrategy, NodeId, Span};
use std::collections::HashMap;
use tracing::debug;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Finds the live span of a target string in the document.
///
/// Three passes over the text nodes in document order: a literal substring
/// match, then a whitespace-normalized match, then a best-effort similarity
/// match on whole nodes. A later pass only runs once every node has failed
/// the earlier one, and the first node in document order wins ties.
#[derive(Debug, Clone)]
pub struct TextLocator {
    similarity_threshold: f32,
}

impl Default for TextLocator {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl TextLocator {
    pub fn new(similarity_threshold: f32) -> Self {
        Self {
            similarity_threshold,
        }
    }

    pub fn locate(&self, tree: &DocumentTree, target: &str) -> Option<Span> {
        self.locate_with_hint(tree, target, None)
    }

    /// Like [`locate`](Self::locate), but when the target occurs verbatim
    /// more than once, pick the occurrence whose char offset is nearest
    /// `hint`. Offsets count one separator char between text nodes, matching
    /// the line-joined text the detector scans.
    pub fn locate_near(&self, tree: &DocumentTree, target: &str, hint: usize) -> Option<Span> {
        self.locate_with_hint(tree, target, Some(hint))
    }

    fn locate_with_hint(&self, tree: &DocumentTree, target: &str, hint: Option<usize>) -> Option<Span> {
        if target.trim().is_empty() {
            return None;
        }
        let candidates = tree.text_nodes();

        if let Some(span) = self.find_exact(tree, &candidates, target, hint) {
            debug!("Exact match for '{}' in node {}", target, span.node);
            return Some(span);
        }
        if let Some(span) = self.find_normalized(tree, &candidates, target) {
            debug!("Normalized match for '{}' in node {}", target, span.node);
            return Some(span);
        }
        if let Some(span) = self.find_similar(tree, &candidates, target) {
            debug!("Similarity match for '{}' in node {}", target, span.node);
            return Some(span);
        }

        debug!("No match for '{}' among {} text nodes", target, candidates.len());
        None
    }

    fn find_exact(
        &self,
        tree: &DocumentTree,
        candidates: &[NodeId],
        target: &str,
        hint: Option<usize>,
    ) -> Option<Span> {
        let Some(hint) = hint else {
            return candidates.iter().find_map(|id| {
                let text = tree.text(*id)?;
                let start = text.find(target)?;
                Some(exact_span(*id, start, target))
            });
        };

        let mut best: Option<(usize, Span)> = None;
        let mut offset = 0;
        for id in candidates {
            let Some(text) = tree.text(*id) else { continue };
            for (start, _) in text.match_indices(target) {
                let distance = (offset + text[..start].chars().count()).abs_diff(hint);
                if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                    best = Some((distance, exact_span(*id, start, target)));
                }
            }
            offset += text.chars().count() + 1;
        }
        best.map(|(_, span)| span)
    }

    fn find_normalized(
        &self,
        tree: &DocumentTree,
        candidates: &[NodeId],
        target: &str,
    ) -> Option<Span> {
        let needle = NormalizedText::new(target).text;
        if needle.is_empty() {
            return None;
        }

        candidates.iter().find_map(|id| {
            let haystack = NormalizedText::new(tree.text(*id)?);
            let (start, end) = haystack.find(&needle)?;
            Some(Span {
                node: *id,
                start,
                end,
                strategy: MatchStrategy::Normalized,
            })
        })
    }

    /// The span is the whole trimmed node, so replacing it rewrites the
    /// node's text and a later revert restores the target string rather than
    /// the text that was there before.
    fn find_similar(&self, tree: &DocumentTree, candidates: &[NodeId], target: &str) -> Option<Span> {
        let mut best: Option<(NodeId, f32)> = None;
        for id in candidates {
            let Some(text) = tree.text(*id) else { continue };
            let score = similarity(target, text);
            // Strictly greater keeps the earliest node on ties
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((*id, score));
            }
        }

        let (node, score) = best?;
        debug!(
            "Best similarity for '{}' is {:.3} (threshold {:.3})",
            target, score, self.similarity_threshold
        );
        if score <= self.similarity_threshold {
            return None;
        }

        let text = tree.text(node)?;
        let start = text.len() - text.trim_start().len();
        let end = text.trim_end().len();
        Some(Span {
            node,
            start,
            end,
            strategy: MatchStrategy::Similarity,
        })
    }
}

fn exact_span(node: NodeId, start: usize, target: &str) -> Span {
    Span {
        node,
        start,
        end: start + target.len(),
        strategy: MatchStrategy::Exact,
    }
}

/// Whitespace-collapsed view of a string that remembers, for every
/// normalized char, the byte range it covers in the source.
struct NormalizedText {
    text: String,
    ranges: Vec<(usize, usize)>,
}

impl NormalizedText {
    fn new(source: &str) -> Self {
        let mut text = String::with_capacity(source.len());
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        let mut pending_space: Option<(usize, usize)> = None;

        for (offset, c) in source.char_indices() {
            let end = offset + c.len_utf8();
            if c.is_whitespace() {
                pending_space = Some(match pending_space {
                    Some((start, _)) => (start, end),
                    None => (offset, end),
                });
                continue;
            }
            // Leading whitespace is dropped, interior runs become one space
            if let Some(run) = pending_space.take() {
                if !text.is_empty() {
                    text.push(' ');
                    ranges.push(run);
                }
            }
            text.push(c);
            ranges.push((offset, end));
        }

        Self { text, ranges }
    }

    /// Byte range in the source covered by the first occurrence of `needle`
    fn find(&self, needle: &str) -> Option<(usize, usize)> {
        let byte_pos = self.text.find(needle)?;
        let first = self.text[..byte_pos].chars().count();
        let last = first + needle.chars().count() - 1;
        Some((self.ranges.get(first)?.0, self.ranges.get(last)?.1))
    }
}

/// Symmetric character-overlap score in [0, 1] (Sørensen–Dice over
/// character multisets, whitespace ignored).
pub fn similarity(a: &str, b: &str) -> f32 {
    let counts = |s: &str| {
        let mut map: HashMap<char, usize> = HashMap::new();
        for c in s.chars().filter(|c| !c.is_whitespace()) {
            *map.entry(c).or_insert(0) += 1;
        }
        map
    };
    let left = counts(a);
    let right = counts(b);

    let total: usize = left.values().sum::<usize>() + right.values().sum::<usize>();
    if total == 0 {
        return 0.0;
    }
    let shared: usize = left
        .iter()
        .map(|(c, n)| (*n).min(right.get(c).copied().unwrap_or(0)))
        .sum();

    (2 * shared) as f32 / total as f32
}
