use super::tree::{DocumentTree, ElementData};
use crate::error::DocumentError;
use crate::types::{ContentFormat, ExtractedDocument, NodeId};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|<!\w[^>]*>|<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:[^>'\x22]|'[^']*'|\x22[^\x22]*\x22)*?)(/?)>")
        .unwrap()
});

static ATTR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .unwrap()
});

static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Elements that never have content or a closing tag
const VOID_TAGS: &[&str] = &[
    "br", "hr", "img", "input", "meta", "link", "col", "area", "base", "wbr",
];

/// Elements whose content is not document text
const SKIPPED_TAGS: &[&str] = &["script", "style", "head", "title"];

/// Builds document trees from extracted content.
pub struct DocumentBuilder;

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, document: &ExtractedDocument) -> Result<DocumentTree, DocumentError> {
        match document.format {
            ContentFormat::PlainText => self.from_plaintext(&document.content),
            ContentFormat::Html => self.from_html(&document.content),
        }
    }

    /// One paragraph per non-blank line
    pub fn from_plaintext(&self, text: &str) -> Result<DocumentTree, DocumentError> {
        let mut tree = DocumentTree::new();
        let root = tree.root();

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let p = tree.append_element(root, ElementData::new("p"))?;
            tree.append_text(p, line)?;
        }

        debug!(
            "Built plaintext document with {} paragraphs",
            tree.children(root).len()
        );
        Ok(tree)
    }

    /// Lenient HTML fragment parser. Unknown end tags are ignored and
    /// unclosed elements are closed at the end of input.
    pub fn from_html(&self, html: &str) -> Result<DocumentTree, DocumentError> {
        let mut tree = DocumentTree::new();
        let mut stack: Vec<NodeId> = vec![tree.root()];
        let mut skip_depth: Option<(String, usize)> = None;
        let mut cursor = 0;

        for caps in TAG_REGEX.captures_iter(html) {
            let Some(whole) = caps.get(0) else { continue };

            if skip_depth.is_none() {
                push_text(&mut tree, &stack, &html[cursor..whole.start()])?;
            }
            cursor = whole.end();

            // Comments and doctypes
            let Some(name) = caps.get(2) else { continue };
            let tag = name.as_str().to_ascii_lowercase();
            let closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let self_closing = caps.get(4).is_some_and(|m| !m.as_str().is_empty());

            if let Some((skipped, depth)) = skip_depth.as_mut() {
                if *skipped == tag {
                    if closing {
                        *depth -= 1;
                    } else if !self_closing {
                        *depth += 1;
                    }
                }
                if *depth == 0 {
                    skip_depth = None;
                }
                continue;
            }

            if closing {
                close_element(&tree, &mut stack, &tag);
                continue;
            }

            if SKIPPED_TAGS.contains(&tag.as_str()) {
                if !self_closing {
                    skip_depth = Some((tag, 1));
                }
                continue;
            }

            // Wrapper tags of a full page contribute no node of their own
            if matches!(tag.as_str(), "html" | "body") {
                continue;
            }

            let element = parse_element(&tag, caps.get(3).map_or("", |m| m.as_str()));
            let parent = *stack.last().unwrap_or(&tree.root());
            let id = tree.append_element(parent, element)?;
            if !self_closing && !VOID_TAGS.contains(&tag.as_str()) {
                stack.push(id);
            }
        }

        if skip_depth.is_none() {
            push_text(&mut tree, &stack, &html[cursor..])?;
        }

        debug!("Built HTML document with {} nodes", tree.len());
        Ok(tree)
    }
}

fn push_text(tree: &mut DocumentTree, stack: &[NodeId], raw: &str) -> Result<(), DocumentError> {
    if raw.is_empty() {
        return Ok(());
    }
    let text = decode_entities(raw);
    // Formatting whitespace between tags
    if text.trim().is_empty() && text.contains('\n') {
        return Ok(());
    }
    let parent = stack.last().copied().unwrap_or(tree.root());
    tree.append_text(parent, &text)?;
    Ok(())
}

fn close_element(tree: &DocumentTree, stack: &mut Vec<NodeId>, tag: &str) {
    // Never pop the root
    let open = stack
        .iter()
        .skip(1)
        .rposition(|id| tree.element(*id).is_some_and(|e| e.tag == tag));
    if let Some(index) = open {
        stack.truncate(index + 1);
    }
}

fn parse_element(tag: &str, raw_attributes: &str) -> ElementData {
    let mut element = ElementData::new(tag);

    for caps in ATTR_REGEX.captures_iter(raw_attributes) {
        let Some(name) = caps.get(1) else { continue };
        let name = name.as_str().to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default();

        match name.as_str() {
            "class" => element
                .classes
                .extend(value.split_whitespace().map(str::to_string)),
            "style" => element.style = parse_style(&value),
            _ => {
                element.attributes.insert(name, value);
            }
        }
    }
    element
}

/// Parse an inline `style` attribute into a property map
pub fn parse_style(raw: &str) -> super::StyleMap {
    raw.split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            (!property.is_empty() && !value.is_empty())
                .then(|| (property, value.to_string()))
        })
        .collect()
}

/// Decode named and numeric character references. Unknown entities are kept verbatim.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    ENTITY_REGEX
        .replace_all(raw, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_skips_blank_lines() {
        let tree = DocumentBuilder::new()
            .from_plaintext("第一段\n\n   \n第二段\r\n")
            .unwrap();
        let paragraphs = tree.children(tree.root());
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(tree.text_content(paragraphs[0]), "第一段");
        assert_eq!(tree.text_content(paragraphs[1]), "第二段");
    }

    #[test]
    fn test_html_nesting_and_attributes() {
        let html = r#"<h1>标题</h1><p class="lead intro" style="color: red; font-weight:bold">我们<b>按装</b>系统&nbsp;了</p>"#;
        let tree = DocumentBuilder::new().from_html(html).unwrap();
        let blocks = tree.children(tree.root());
        assert_eq!(blocks.len(), 2);

        let p = tree.element(blocks[1]).unwrap();
        assert_eq!(p.tag, "p");
        assert!(p.has_class("intro"));
        assert_eq!(p.style.get("color").map(String::as_str), Some("red"));
        assert_eq!(p.style.get("font-weight").map(String::as_str), Some("bold"));
        assert_eq!(tree.text_content(blocks[1]), "我们按装系统\u{a0}了");
    }

    #[test]
    fn test_html_is_lenient() {
        let html = "<p>未闭合<br>换行</span><div>后续";
        let tree = DocumentBuilder::new().from_html(html).unwrap();
        assert_eq!(tree.text_content(tree.root()), "未闭合换行后续");

        let p = tree.children(tree.root())[0];
        // br is void, div nests under the unclosed p
        assert_eq!(tree.children(p).len(), 4);
    }

    #[test]
    fn test_html_skips_scripts_and_comments() {
        let html = "<!DOCTYPE html><html><head><title>t</title></head><body><!-- c --><script>var a = '<p>';</script><p>正文</p></body></html>";
        let tree = DocumentBuilder::new().from_html(html).unwrap();
        assert_eq!(tree.text_content(tree.root()), "正文");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#20320;&#x597D; &bogus;"), "a & b <c> 你好 &bogus;");
    }
}
