use crate::error::DocumentError;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Inline style properties, e.g. `background-color -> #fffbeb`
pub type StyleMap = BTreeMap<String, String>;

/// Tags treated as containers when resolving a click to its block
const BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "div", "blockquote",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementData {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: StyleMap,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn is_block(&self) -> bool {
        BLOCK_TAGS.contains(&self.tag.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    Element(ElementData),
    Text { text: String },
}

impl NodeKind {
    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl DocumentNode {
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(data) => Some(data),
            NodeKind::Text { .. } => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text } => Some(text),
            NodeKind::Element(_) => None,
        }
    }
}

/// Mutable rendered document: an arena of element and text nodes under a
/// single `div#document-content` root.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: HashMap<NodeId, DocumentNode>,
    root: NodeId,
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentTree {
    pub fn new() -> Self {
        let root = Uuid::new_v4();
        let root_node = DocumentNode {
            id: root,
            kind: NodeKind::Element(
                ElementData::new("div").with_attribute("id", "document-content"),
            ),
            parent: None,
            children: Vec::new(),
        };

        let mut nodes = HashMap::new();
        nodes.insert(root, root_node);
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&DocumentNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DocumentNode> {
        self.nodes.get_mut(&id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(&id).and_then(|n| n.as_element())
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(&id).map(|n| &mut n.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    /// Text of a text node, None for elements and unknown ids
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(|n| n.as_text())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn append_element(
        &mut self,
        parent: NodeId,
        element: ElementData,
    ) -> Result<NodeId, DocumentError> {
        self.insert_child(parent, None, NodeKind::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DocumentError> {
        self.insert_child(parent, None, NodeKind::text(text))
    }

    pub fn insert_first_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
    ) -> Result<NodeId, DocumentError> {
        self.insert_child(parent, Some(0), kind)
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        index: Option<usize>,
        kind: NodeKind,
    ) -> Result<NodeId, DocumentError> {
        let parent_node = self
            .nodes
            .get(&parent)
            .ok_or(DocumentError::MissingNode(parent))?;
        if parent_node.as_element().is_none() {
            return Err(DocumentError::NotAnElement(parent));
        }

        let id = Uuid::new_v4();
        self.nodes.insert(
            id,
            DocumentNode {
                id,
                kind,
                parent: Some(parent),
                children: Vec::new(),
            },
        );

        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            let at = index
                .unwrap_or(parent_node.children.len())
                .min(parent_node.children.len());
            parent_node.children.insert(at, id);
        }
        Ok(id)
    }

    /// Swap a node for a freshly created one in the same position.
    /// The old node and its subtree are dropped.
    pub fn replace_node(&mut self, old: NodeId, kind: NodeKind) -> Result<NodeId, DocumentError> {
        if old == self.root {
            return Err(DocumentError::RootNode);
        }
        let parent = self
            .nodes
            .get(&old)
            .ok_or(DocumentError::MissingNode(old))?
            .parent
            .ok_or(DocumentError::MissingNode(old))?;

        let index = self
            .children(parent)
            .iter()
            .position(|c| *c == old)
            .ok_or(DocumentError::MissingNode(old))?;

        self.remove_subtree(old)?;
        self.insert_child(parent, Some(index), kind)
    }

    pub fn remove_subtree(&mut self, id: NodeId) -> Result<(), DocumentError> {
        if id == self.root {
            return Err(DocumentError::RootNode);
        }
        let node = self.nodes.get(&id).ok_or(DocumentError::MissingNode(id))?;
        if let Some(parent) = node.parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children.retain(|c| *c != id);
            }
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.nodes.remove(&current) {
                stack.extend(removed.children);
            }
        }
        Ok(())
    }

    /// Text nodes in document order, whitespace-only nodes skipped
    pub fn text_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.text(*id).is_some_and(|t| !t.trim().is_empty()))
            .collect()
    }

    /// Pre-order walk of a subtree, including its root
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Concatenated text of every text node under `id`
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Text of the whole document
    pub fn full_text(&self) -> String {
        self.text_content(self.root)
    }

    /// Nearest block container at or above `id`, never the document root
    pub fn enclosing_block(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.root {
                return None;
            }
            let node = self.nodes.get(&node_id)?;
            if node.as_element().is_some_and(|e| e.is_block())
                && !self.text_content(node_id).trim().is_empty()
            {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DocumentNode> {
        self.nodes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DocumentTree, NodeId, NodeId) {
        let mut tree = DocumentTree::new();
        let p = tree.append_element(tree.root(), ElementData::new("p")).unwrap();
        let span = tree.append_element(p, ElementData::new("span")).unwrap();
        let text = tree.append_text(span, "我们将按装新系统。").unwrap();
        (tree, p, text)
    }

    #[test]
    fn test_text_nodes_in_document_order() {
        let mut tree = DocumentTree::new();
        let p1 = tree.append_element(tree.root(), ElementData::new("p")).unwrap();
        let p2 = tree.append_element(tree.root(), ElementData::new("p")).unwrap();
        let b = tree.append_text(p2, "b").unwrap();
        let a = tree.append_text(p1, "a").unwrap();

        assert_eq!(tree.text_nodes(), vec![a, b]);
        assert_eq!(tree.text_content(tree.root()), "ab");
    }

    #[test]
    fn test_whitespace_only_text_is_not_a_text_node() {
        let mut tree = DocumentTree::new();
        let p = tree.append_element(tree.root(), ElementData::new("p")).unwrap();
        tree.append_text(p, "  ").unwrap();
        let real = tree.append_text(p, "正文").unwrap();
        assert_eq!(tree.text_nodes(), vec![real]);
    }

    #[test]
    fn test_enclosing_block_skips_inline_elements() {
        let (tree, p, text) = sample();
        assert_eq!(tree.enclosing_block(text), Some(p));
        assert_eq!(tree.enclosing_block(tree.root()), None);
    }

    #[test]
    fn test_replace_node_keeps_position() {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        tree.append_text(root, "first").unwrap();
        let middle = tree.append_text(root, "middle").unwrap();
        tree.append_text(root, "last").unwrap();

        let replaced = tree.replace_node(middle, NodeKind::text("MIDDLE")).unwrap();
        assert!(!tree.contains(middle));
        assert_eq!(tree.children(root)[1], replaced);
        assert_eq!(tree.text_content(root), "firstMIDDLElast");
    }

    #[test]
    fn test_remove_subtree_drops_descendants() {
        let (mut tree, p, text) = sample();
        tree.remove_subtree(p).unwrap();
        assert!(!tree.contains(p));
        assert!(!tree.contains(text));
        assert_eq!(tree.len(), 1);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_root_is_protected() {
        let mut tree = DocumentTree::new();
        let root = tree.root();
        assert!(matches!(tree.remove_subtree(root), Err(DocumentError::RootNode)));
        assert!(matches!(
            tree.replace_node(root, NodeKind::text("x")),
            Err(DocumentError::RootNode)
        ));
    }

    #[test]
    fn test_text_nodes_cannot_have_children() {
        let (mut tree, _, text) = sample();
        assert!(matches!(
            tree.append_text(text, "child"),
            Err(DocumentError::NotAnElement(_))
        ));
    }
}
