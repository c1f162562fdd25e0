use super::tree::{DocumentTree, ElementData, NodeKind};
use crate::types::{NodeId, SCHEMA_VERSION};
use anyhow::Result;
use serde::Serialize;

/// Node listing used by the `json` output format
#[derive(Debug, Serialize)]
pub struct SerializedNode<'a> {
    pub depth: usize,
    #[serde(flatten)]
    pub kind: &'a NodeKind,
}

#[derive(Debug, Serialize)]
pub struct SerializedDocument<'a> {
    pub schema_version: &'static str,
    pub format: &'static str,
    pub nodes: Vec<SerializedNode<'a>>,
}

impl DocumentTree {
    /// Render the root's children as HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.kind {
            NodeKind::Text { text } => out.push_str(&escape_html(text)),
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.tag);
                write_attributes(element, out);
                if is_void(&element.tag) && node.children.is_empty() {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
        }
    }

    /// Plain text with one line per block element
    pub fn to_plain_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        self.collect_lines(self.root(), &mut current, &mut lines);
        if !current.trim().is_empty() {
            lines.push(current.trim().to_string());
        }
        lines.join("\n")
    }

    fn collect_lines(&self, id: NodeId, current: &mut String, lines: &mut Vec<String>) {
        let Some(node) = self.get(id) else { return };
        match &node.kind {
            NodeKind::Text { text } => current.push_str(text),
            NodeKind::Element(element) => {
                let breaks = element.is_block() || element.tag == "br";
                if breaks && !current.trim().is_empty() {
                    lines.push(current.trim().to_string());
                }
                if breaks {
                    current.clear();
                }
                for child in &node.children {
                    self.collect_lines(*child, current, lines);
                }
                if element.is_block() && !current.trim().is_empty() {
                    lines.push(current.trim().to_string());
                    current.clear();
                }
            }
        }
    }

    pub fn to_serialized(&self) -> SerializedDocument<'_> {
        let mut nodes = Vec::new();
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            nodes.push(SerializedNode {
                depth,
                kind: &node.kind,
            });
            stack.extend(node.children.iter().rev().map(|c| (*c, depth + 1)));
        }

        SerializedDocument {
            schema_version: SCHEMA_VERSION,
            format: "tree",
            nodes,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_serialized())?)
    }

    pub fn save_with_format(&self, path: &str, format: &str) -> Result<()> {
        let output = match format {
            "text" => self.to_plain_text(),
            "json" => self.to_json()?,
            _ => self.to_html(),
        };
        std::fs::write(path, output)?;
        Ok(())
    }
}

fn write_attributes(element: &ElementData, out: &mut String) {
    if !element.classes.is_empty() {
        out.push_str(&format!(" class=\"{}\"", escape_html(&element.classes.join(" "))));
    }
    for (name, value) in &element.attributes {
        out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
    }
    if !element.style.is_empty() {
        let style = element
            .style
            .iter()
            .map(|(property, value)| format!("{property}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        out.push_str(&format!(" style=\"{}\"", escape_html(&style)));
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img" | "input" | "meta" | "link" | "col" | "area" | "base" | "wbr")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
