//! Parsed documents and the node view the query engine reads them through.

pub mod json;
pub mod node;
pub mod parser;
pub mod xml;
pub mod yaml;

use crate::treepath::{QueryEngine, QueryResult};
use node::{DocumentFormat, TreeNode};
use serde_json::Value;
use xml::XmlNode;
use yaml_rust2::Yaml;

/// A loaded document of any supported format.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Json(Value),
    Yaml(Yaml),
    Xml(XmlNode),
}

impl Document {
    pub fn format(&self) -> DocumentFormat {
        match self {
            Document::Json(_) => DocumentFormat::Json,
            Document::Yaml(_) => DocumentFormat::Yaml,
            Document::Xml(_) => DocumentFormat::Xml,
        }
    }

    /// An engine speaking this document's dialect.
    pub fn engine(&self) -> QueryEngine {
        QueryEngine::for_format(self.format())
    }

    /// Runs `expr` with the document's default engine.
    pub fn query(&self, expr: &str) -> QueryResult {
        self.query_with(&self.engine(), expr)
    }

    /// Runs `expr` with a caller-configured engine.
    pub fn query_with(&self, engine: &QueryEngine, expr: &str) -> QueryResult {
        match self {
            Document::Json(value) => engine.query(value, expr),
            Document::Yaml(yaml) => engine.query(yaml, expr),
            Document::Xml(root) => engine.query(root, expr),
        }
    }

    /// Looks up the value at a canonical path.
    pub fn resolve(&self, engine: &QueryEngine, path: &str) -> QueryResult {
        match self {
            Document::Json(value) => engine.resolve(value, path),
            Document::Yaml(yaml) => engine.resolve(yaml, path),
            Document::Xml(root) => engine.resolve(root, path),
        }
    }

    /// The whole document projected to a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Document::Json(value) => value.clone(),
            Document::Yaml(yaml) => yaml.to_value(),
            Document::Xml(root) => root.to_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treepath::Dialect;
    use serde_json::json;

    #[test]
    fn test_engine_follows_format() {
        let doc = Document::Xml(XmlNode::parse("<r/>").unwrap());
        assert_eq!(doc.engine().dialect(), Dialect::Xml);
        let doc = Document::Yaml(Yaml::Null);
        assert_eq!(doc.engine().dialect(), Dialect::Json);
    }

    #[test]
    fn test_query_dispatches() {
        let doc = Document::Json(json!({"a": 1}));
        assert_eq!(doc.query("$.a").matches, vec![json!(1)]);

        let doc = Document::Xml(XmlNode::parse("<r><a>1</a></r>").unwrap());
        assert_eq!(doc.query("/r/a").paths, vec!["/r/a"]);
    }
}
