//! Parsing raw text into a queryable [`Document`].
//!
//! # Example
//!
//! ```
//! use pathquill::document::node::DocumentFormat;
//! use pathquill::document::parser::{detect_format, parse_document};
//!
//! let text = r#"{"name": "Alice", "age": 30}"#;
//! assert_eq!(detect_format(text), DocumentFormat::Json);
//!
//! let doc = parse_document(text, DocumentFormat::Json).unwrap();
//! let result = doc.query("$.name");
//! assert_eq!(result.paths, vec!["$.name"]);
//! ```

use super::node::DocumentFormat;
use super::xml::XmlNode;
use super::Document;
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;
use yaml_rust2::{Yaml, YamlLoader};

/// Parses `text` as the given format.
///
/// # Errors
///
/// Returns an error if the text is not valid in that format.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Document> {
    let document = match format {
        DocumentFormat::Json => {
            let value: Value = serde_json::from_str(text).context("Failed to parse JSON")?;
            Document::Json(value)
        }
        DocumentFormat::Yaml => Document::Yaml(parse_yaml(text)?),
        DocumentFormat::Xml => Document::Xml(XmlNode::parse(text).context("Failed to parse XML")?),
    };
    debug!(%format, "parsed document");
    Ok(document)
}

/// Parses a YAML stream.
///
/// A single document is returned as is; several documents become a sequence
/// of documents and an empty stream is null.
pub fn parse_yaml(text: &str) -> Result<Yaml> {
    let mut docs = YamlLoader::load_from_str(text).context("Failed to parse YAML")?;
    Ok(match docs.len() {
        0 => Yaml::Null,
        1 => docs.remove(0),
        _ => Yaml::Array(docs),
    })
}

/// Parses newline-delimited JSON into an array with one element per line.
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns an error naming the first line that is not valid JSON, or if there
/// are no values at all.
pub fn parse_jsonl(text: &str) -> Result<Document> {
    let mut lines = Vec::new();
    for (line_num, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Invalid JSON on line {}", line_num + 1))?;
        lines.push(value);
    }

    if lines.is_empty() {
        anyhow::bail!("No valid JSON found in JSONL content");
    }
    Ok(Document::Json(Value::Array(lines)))
}

/// Guesses the format of a document from its first non-blank character.
///
/// `<` is XML, `{` or `[` is JSON, anything else is YAML.
pub fn detect_format(text: &str) -> DocumentFormat {
    match text.trim_start().chars().next() {
        Some('<') => DocumentFormat::Xml,
        Some('{') | Some('[') => DocumentFormat::Json,
        _ => DocumentFormat::Yaml,
    }
}
