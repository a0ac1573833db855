//! XML element tree and its `TreeNode` adapter.
//!
//! quick-xml is a streaming reader, so this module folds its events into a small
//! owned tree first. The root of every tree is a virtual [`XmlNode::Document`]
//! whose children are the top-level elements; that is the node `/` selects.
//!
//! # Example
//!
//! ```
//! use pathquill::document::node::TreeNode;
//! use pathquill::document::xml::XmlNode;
//!
//! let doc = XmlNode::parse(r#"<root id="7"><item>X</item></root>"#).unwrap();
//! let root = doc.child("root").unwrap();
//! assert_eq!(root.attribute("id"), Some("7"));
//! assert_eq!(root.child("item").and_then(|i| i.text()).as_deref(), Some("X"));
//! ```

use super::node::{Capabilities, ChildRef, DocumentFormat, NodeKind, TreeNode};
use crate::treepath::path::PathToken;
use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

/// A node in a parsed XML document.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Virtual document root
    Document(Vec<XmlNode>),
    Element {
        name: String,
        attributes: IndexMap<String, String>,
        children: Vec<XmlNode>,
    },
    Text(String),
    Comment(String),
}

impl XmlNode {
    /// Creates an element node.
    pub fn element(
        name: impl Into<String>,
        attributes: &[(&str, &str)],
        children: Vec<XmlNode>,
    ) -> Self {
        XmlNode::Element {
            name: name.into(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    pub fn text_node(text: impl Into<String>) -> Self {
        XmlNode::Text(text.into())
    }

    /// Parses XML text into a document tree.
    ///
    /// Whitespace-only text between elements is dropped; CDATA is kept as text.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed markup, mismatched or unclosed tags, and
    /// documents without any element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut top: Vec<XmlNode> = Vec::new();
        let mut open: Vec<(String, IndexMap<String, String>, Vec<XmlNode>)> = Vec::new();

        loop {
            let event = reader.read_event().context("Malformed XML")?;
            let node = match event {
                Event::Start(start) => {
                    let (name, attributes) = read_start(&start)?;
                    open.push((name, attributes, Vec::new()));
                    continue;
                }
                Event::End(_) => {
                    let Some((name, attributes, children)) = open.pop() else {
                        bail!("Unexpected closing tag");
                    };
                    XmlNode::Element {
                        name,
                        attributes,
                        children,
                    }
                }
                Event::Empty(start) => {
                    let (name, attributes) = read_start(&start)?;
                    XmlNode::Element {
                        name,
                        attributes,
                        children: Vec::new(),
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape().context("Invalid XML text")?;
                    if text.trim().is_empty() {
                        continue;
                    }
                    XmlNode::Text(text.into_owned())
                }
                Event::CData(data) => XmlNode::Text(String::from_utf8_lossy(&data).into_owned()),
                Event::Comment(comment) => {
                    XmlNode::Comment(String::from_utf8_lossy(&comment).trim().to_string())
                }
                Event::Eof => break,
                _ => continue,
            };

            match open.last_mut() {
                Some((_, _, children)) => children.push(node),
                None => top.push(node),
            }
        }

        if let Some((name, _, _)) = open.last() {
            bail!("Unclosed element <{}>", name);
        }
        if !top.iter().any(|node| matches!(node, XmlNode::Element { .. })) {
            bail!("XML document has no root element");
        }

        Ok(XmlNode::Document(top))
    }

    fn content(&self) -> &[XmlNode] {
        match self {
            XmlNode::Document(children) | XmlNode::Element { children, .. } => children,
            XmlNode::Text(_) | XmlNode::Comment(_) => &[],
        }
    }

    fn elements(&self) -> impl Iterator<Item = &XmlNode> {
        self.content()
            .iter()
            .filter(|node| matches!(node, XmlNode::Element { .. }))
    }

    /// Serializes the node back to markup.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        write_xml(self, &mut out);
        out
    }
}

fn read_start(start: &BytesStart<'_>) -> Result<(String, IndexMap<String, String>)> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = IndexMap::new();
    for attr in start.attributes() {
        let attr = attr.with_context(|| format!("Invalid attribute on <{}>", name))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .with_context(|| format!("Invalid value for attribute '{}'", key))?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok((name, attributes))
}

fn write_xml(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Document(children) => {
            for child in children {
                write_xml(child, out);
            }
        }
        XmlNode::Element {
            name,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(name);
            for (key, value) in attributes {
                out.push_str(&format!(" {}=\"{}\"", key, quick_xml::escape::escape(value.as_str())));
            }
            if children.is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for child in children {
                write_xml(child, out);
            }
            out.push_str(&format!("</{}>", name));
        }
        XmlNode::Text(text) => out.push_str(&quick_xml::escape::escape(text.as_str())),
        XmlNode::Comment(text) => out.push_str(&format!("<!-- {} -->", text)),
    }
}

impl TreeNode for XmlNode {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Xml
    }

    fn kind(&self) -> NodeKind {
        match self {
            XmlNode::Document(_) | XmlNode::Element { .. } => NodeKind::Object,
            XmlNode::Text(_) => NodeKind::Text,
            XmlNode::Comment(_) => NodeKind::Comment,
        }
    }

    fn name(&self) -> Option<&str> {
        match self {
            XmlNode::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    fn child(&self, key: &str) -> Option<&Self> {
        self.elements().find(|node| node.name() == Some(key))
    }

    fn child_at(&self, index: usize) -> Option<&Self> {
        self.elements().nth(index)
    }

    /// Child elements. Same-named siblings carry their 1-based position.
    fn children(&self) -> Vec<ChildRef<'_, Self>> {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for name in self.elements().filter_map(|node| node.name()) {
            *totals.entry(name).or_insert(0) += 1;
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        self.elements()
            .enumerate()
            .filter_map(|(ordinal, node)| {
                let name = node.name()?;
                let position = seen.entry(name).or_insert(0);
                *position += 1;
                let position = (totals.get(name).copied().unwrap_or(0) > 1).then_some(*position);
                Some(ChildRef::new(
                    ordinal,
                    PathToken::Element {
                        name: name.to_string(),
                        position,
                    },
                    node,
                ))
            })
            .collect()
    }

    fn child_count(&self) -> usize {
        self.elements().count()
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            XmlNode::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    fn attributes(&self) -> Vec<(&str, &str)> {
        match self {
            XmlNode::Element { attributes, .. } => attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Direct text content of an element, concatenated.
    fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            XmlNode::Text(text) | XmlNode::Comment(text) => Some(Cow::Borrowed(text)),
            XmlNode::Document(_) => None,
            XmlNode::Element { children, .. } => {
                let mut texts = children.iter().filter_map(|node| match node {
                    XmlNode::Text(text) => Some(text.as_str()),
                    _ => None,
                });
                let first = texts.next()?;
                match texts.next() {
                    None => Some(Cow::Borrowed(first)),
                    Some(second) => {
                        let mut joined = format!("{}{}", first, second);
                        texts.for_each(|t| joined.push_str(t));
                        Some(Cow::Owned(joined))
                    }
                }
            }
        }
    }

    fn comments(&self) -> Vec<&str> {
        self.content()
            .iter()
            .filter_map(|node| match node {
                XmlNode::Comment(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            attributes: true,
            comments: true,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            XmlNode::Text(text) | XmlNode::Comment(text) => Value::String(text.clone()),
            _ => Value::String(self.to_xml_string()),
        }
    }
}
