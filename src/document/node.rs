//! Read-only node view shared by every document format.
//!
//! The query evaluator never looks at `serde_json::Value`, `yaml_rust2::Yaml` or
//! `XmlNode` directly. Each of them implements [`TreeNode`], which projects the
//! parsed document onto a small closed set of node kinds plus ordered children,
//! so one evaluator core serves JSON-like and XML-like trees alike.
//!
//! # Example
//!
//! ```
//! use pathquill::document::node::{NodeKind, TreeNode};
//! use serde_json::json;
//!
//! let doc = json!({"name": "Alice", "tags": ["a", "b"]});
//! assert_eq!(doc.kind(), NodeKind::Object);
//! assert_eq!(doc.child("tags").map(|t| t.kind()), Some(NodeKind::Array));
//! assert!(doc.child("missing").is_none());
//! ```

use crate::treepath::ast::Dialect;
use crate::treepath::path::PathToken;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// The closed set of node shapes the evaluator distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    /// Keyed children: JSON object, YAML mapping, XML element or document
    Object,
    /// Indexed children: JSON or YAML sequence
    Array,
    /// Leaf value: string, number, boolean or null
    Scalar,
    /// XML attribute value
    Attribute,
    /// Text content
    Text,
    /// XML comment
    Comment,
}

/// Source format of a parsed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Json,
    Yaml,
    Xml,
}

impl DocumentFormat {
    /// The path dialect implied by this format.
    pub fn dialect(self) -> Dialect {
        match self {
            DocumentFormat::Json | DocumentFormat::Yaml => Dialect::Json,
            DocumentFormat::Xml => Dialect::Xml,
        }
    }

    /// Maps a file extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(DocumentFormat::Json),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "xml" => Some(DocumentFormat::Xml),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentFormat::Json => "JSON",
            DocumentFormat::Yaml => "YAML",
            DocumentFormat::Xml => "XML",
        };
        f.write_str(name)
    }
}

impl FromStr for DocumentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentFormat::from_extension(s)
            .ok_or_else(|| format!("unknown document format '{}' (expected json, yaml or xml)", s))
    }
}

/// Optional features an adapter may lack entirely.
///
/// A step that needs a missing capability is a configuration error, unlike an
/// ordinary lookup miss on a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub attributes: bool,
    pub comments: bool,
}

/// One child as seen from its parent.
#[derive(Debug)]
pub struct ChildRef<'a, N: ?Sized> {
    /// Position in the parent's `children()` listing.
    pub ordinal: usize,
    /// Location token that extends the parent's canonical path.
    pub token: PathToken,
    pub node: &'a N,
}

impl<'a, N: ?Sized> ChildRef<'a, N> {
    pub fn new(ordinal: usize, token: PathToken, node: &'a N) -> Self {
        Self {
            ordinal,
            token,
            node,
        }
    }
}

/// Uniform read-only view over a parsed document.
///
/// Lookups on a missing key or index return `None`; nothing here mutates or
/// fails.
pub trait TreeNode {
    /// Format of the document this node belongs to.
    fn format(&self) -> DocumentFormat;

    fn kind(&self) -> NodeKind;

    /// Element name, for formats with named nodes.
    fn name(&self) -> Option<&str> {
        None
    }

    /// First child reachable under `key`.
    fn child(&self, key: &str) -> Option<&Self>;

    /// Child at `index` in source order.
    fn child_at(&self, index: usize) -> Option<&Self>;

    /// All children in source order.
    fn children(&self) -> Vec<ChildRef<'_, Self>>;

    /// Children reachable under `name`. XML may return several.
    fn children_named(&self, name: &str) -> Vec<ChildRef<'_, Self>> {
        self.children()
            .into_iter()
            .filter(|child| child.token.name() == Some(name))
            .collect()
    }

    fn child_count(&self) -> usize {
        self.children().len()
    }

    fn attribute(&self, _name: &str) -> Option<&str> {
        None
    }

    /// Attributes in source order.
    fn attributes(&self) -> Vec<(&str, &str)> {
        Vec::new()
    }

    /// Text content, if the node has any.
    fn text(&self) -> Option<Cow<'_, str>>;

    fn comments(&self) -> Vec<&str> {
        Vec::new()
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Projection of the node used in query results.
    fn to_value(&self) -> serde_json::Value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_extension("YML"), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_extension("xml"), Some(DocumentFormat::Xml));
        assert_eq!(DocumentFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_format_dialect() {
        assert_eq!(DocumentFormat::Yaml.dialect(), Dialect::Json);
        assert_eq!(DocumentFormat::Xml.dialect(), Dialect::Xml);
    }

    #[test]
    fn test_format_from_str_rejects_unknown() {
        assert!("toml".parse::<DocumentFormat>().is_err());
        assert_eq!("json".parse::<DocumentFormat>(), Ok(DocumentFormat::Json));
    }
}
