//! Tag value extraction
//!
//! For every element named like the requested tag, each direct child that is
//! not text or a comment is rendered into a canonical string:
//!
//! ```text
//! name(attr1=v1;attr2=v2) = text content
//! ```
//!
//! The attribute list is omitted when there are no attributes, and the
//! ` = ...` suffix when the child's text content is empty. Collecting these
//! strings across a corpus shows which shapes of sub-element occur under a
//! tag.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::debug;
use roxmltree::{Document, Node, NodeType, ParsingOptions};

use crate::decode::decode_document;
use crate::error::Result;

/// Values extracted for one tag from one or more documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagValues {
    /// Number of elements whose name matched the tag
    pub matched: usize,
    /// Distinct rendered children of the matched elements
    pub values: HashSet<String>,
}

impl TagValues {
    /// True if no value was rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: Self) {
        self.matched += other.matched;
        self.values.extend(other.values);
    }

    /// Values in lexicographic order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&str> {
        let mut values: Vec<&str> = self.values.iter().map(String::as_str).collect();
        values.sort_unstable();
        values
    }
}

/// Extract the rendered children of every `tag` element in `document`.
///
/// Matching is exact on the qualified name (`prefix:local` for prefixed
/// elements). The root element is a candidate like any other element.
#[must_use]
pub fn extract_values(document: &Document, tag: &str) -> TagValues {
    let mut result = TagValues::default();

    for element in document
        .descendants()
        .filter(|n| n.is_element() && qualified_name(*n) == tag)
    {
        result.matched += 1;

        for child in element.children() {
            if let Some(value) = render_node(child) {
                result.values.insert(value);
            }
        }
    }

    result
}

/// Parse `xml` and extract the values of `tag`.
///
/// # Errors
///
/// Returns [`ExtractError::Parse`](crate::ExtractError::Parse) if `xml` is
/// not well-formed.
pub fn extract_from_str(xml: &str, tag: &str) -> Result<TagValues> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(xml, options)?;
    Ok(extract_values(&document, tag))
}

/// Read, decode and parse the XML file at `path`, then extract `tag`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, decoded, or parsed. No
/// partial result is produced in that case.
pub fn extract_from_file(path: &Path, tag: &str) -> Result<TagValues> {
    let bytes = fs::read(path)?;
    let text = decode_document(&bytes)?;
    let values = extract_from_str(&text, tag)?;
    debug!(
        "{}: {} '{tag}' elements, {} values",
        path.display(),
        values.matched,
        values.values.len()
    );
    Ok(values)
}

/// Render one child node.
///
/// Returns `None` for text (CDATA included) and comment nodes, which never
/// produce a value.
#[must_use]
pub fn render_node(node: Node) -> Option<String> {
    match node.node_type() {
        NodeType::Text | NodeType::Comment | NodeType::Root => None,
        NodeType::PI => {
            let pi = node.pi()?;
            Some(render(pi.target, "", pi.value.unwrap_or_default()))
        }
        NodeType::Element => Some(render(
            qualified_name(node),
            &render_attributes(node),
            &text_content(node),
        )),
    }
}

fn render(name: &str, attributes: &str, text: &str) -> String {
    let mut value = String::from(name);
    if !attributes.is_empty() {
        value.push('(');
        value.push_str(attributes);
        value.push(')');
    }
    if !text.is_empty() {
        value.push_str(" = ");
        value.push_str(text);
    }
    value
}

/// Element name as written in the source, prefix included.
///
/// Read from the start tag rather than rebuilt from the namespace URI, which
/// may be bound to several prefixes at once.
fn qualified_name<'input>(node: Node<'_, 'input>) -> &'input str {
    let text = node.document().input_text();
    let start = node.range().start + 1;
    &text[start..start + name_len(&text[start..])]
}

/// `name=value` pairs in source order, namespace declarations included.
fn render_attributes(node: Node) -> String {
    start_tag_attributes(node.document().input_text(), node.range().start)
        .into_iter()
        .filter_map(|(pos, name)| {
            let value = attribute_value(node, pos, name)?;
            Some(format!("{name}={value}"))
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// URI bound to the `xml` prefix.
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Normalized value of the attribute whose name starts at `pos`.
fn attribute_value<'a>(node: Node<'a, '_>, pos: usize, name: &str) -> Option<&'a str> {
    let declared = if name == "xmlns" {
        Some(None)
    } else {
        name.strip_prefix("xmlns:").map(Some)
    };

    match declared {
        // roxmltree never records the predefined `xml` binding
        Some(Some("xml")) => Some(XML_NAMESPACE),
        Some(prefix) => node
            .namespaces()
            .find(|ns| ns.name() == prefix)
            .map(roxmltree::Namespace::uri),
        None => node
            .attributes()
            .find(|attr| attr.position() == pos)
            .map(|attr| attr.value()),
    }
}

/// Names of the attributes in the start tag at `start`, with their offsets.
///
/// `text` has already been parsed, so the tag is known to be well-formed.
fn start_tag_attributes(text: &str, start: usize) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut pos = start + 1;
    pos += name_len(&text[pos..]);

    let mut names = Vec::new();
    loop {
        while pos < bytes.len() && is_xml_space(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() || matches!(bytes[pos], b'/' | b'>') {
            break;
        }

        let name_start = pos;
        pos += name_len(&text[pos..]);
        if pos == name_start {
            break;
        }
        names.push((name_start, &text[name_start..pos]));

        let Some(open) = text[pos..].find(&['"', '\''][..]) else {
            break;
        };
        pos += open;
        let quote = bytes[pos];
        pos += 1;
        let Some(close) = bytes[pos..].iter().position(|b| *b == quote) else {
            break;
        };
        pos += close + 1;
    }

    names
}

/// Byte length of the XML name at the start of `text`.
fn name_len(text: &str) -> usize {
    text.find(|c: char| c.is_ascii() && (is_xml_space(c as u8) || matches!(c, '/' | '>' | '=')))
        .unwrap_or(text.len())
}

const fn is_xml_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

/// Concatenated text of all descendant text nodes, untrimmed.
fn text_content(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}
