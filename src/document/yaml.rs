//! `TreeNode` adapter over `yaml_rust2::Yaml`.

use super::node::{ChildRef, DocumentFormat, NodeKind, TreeNode};
use crate::treepath::path::PathToken;
use serde_json::Value;
use std::borrow::Cow;
use yaml_rust2::Yaml;

/// Renders a mapping key as the name a path uses to reach it.
///
/// Complex keys (sequences, mappings) have no name and are skipped.
fn key_name(key: &Yaml) -> Option<Cow<'_, str>> {
    match key {
        Yaml::String(s) | Yaml::Real(s) => Some(Cow::Borrowed(s.as_str())),
        Yaml::Integer(i) => Some(Cow::Owned(i.to_string())),
        Yaml::Boolean(b) => Some(Cow::Owned(b.to_string())),
        Yaml::Null => Some(Cow::Borrowed("null")),
        _ => None,
    }
}

impl TreeNode for Yaml {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Yaml
    }

    fn kind(&self) -> NodeKind {
        match self {
            Yaml::Hash(_) => NodeKind::Object,
            Yaml::Array(_) => NodeKind::Array,
            _ => NodeKind::Scalar,
        }
    }

    fn child(&self, key: &str) -> Option<&Self> {
        let Yaml::Hash(map) = self else {
            return None;
        };
        map.iter()
            .find(|(k, _)| key_name(k).as_deref() == Some(key))
            .map(|(_, v)| v)
    }

    fn child_at(&self, index: usize) -> Option<&Self> {
        match self {
            Yaml::Array(items) => items.get(index),
            _ => None,
        }
    }

    fn children(&self) -> Vec<ChildRef<'_, Self>> {
        match self {
            Yaml::Hash(map) => map
                .iter()
                .enumerate()
                .filter_map(|(ordinal, (key, child))| {
                    let name = key_name(key)?;
                    Some(ChildRef::new(
                        ordinal,
                        PathToken::Key(name.into_owned()),
                        child,
                    ))
                })
                .collect(),
            Yaml::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, child)| ChildRef::new(idx, PathToken::Index(idx), child))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn child_count(&self) -> usize {
        match self {
            Yaml::Hash(map) => map.len(),
            Yaml::Array(items) => items.len(),
            _ => 0,
        }
    }

    fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Yaml::String(s) | Yaml::Real(s) => Some(Cow::Borrowed(s.as_str())),
            Yaml::Integer(i) => Some(Cow::Owned(i.to_string())),
            Yaml::Boolean(b) => Some(Cow::Owned(b.to_string())),
            Yaml::Null => Some(Cow::Borrowed("null")),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        yaml_to_value(self)
    }
}

/// Converts a YAML node into the JSON value model used for reporting.
pub fn yaml_to_value(yaml: &Yaml) -> Value {
    match yaml {
        Yaml::Hash(map) => Value::Object(
            map.iter()
                .filter_map(|(k, v)| Some((key_name(k)?.into_owned(), yaml_to_value(v))))
                .collect(),
        ),
        Yaml::Array(items) => Value::Array(items.iter().map(yaml_to_value).collect()),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Integer(i) => Value::from(*i),
        // `.inf` and `.nan` have no JSON number form
        Yaml::Real(s) => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(s.clone())),
        Yaml::Boolean(b) => Value::Bool(*b),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yaml_rust2::YamlLoader;

    fn load(src: &str) -> Yaml {
        YamlLoader::load_from_str(src).unwrap().remove(0)
    }

    #[test]
    fn test_mapping_children_in_order() {
        let doc = load("b: 1\na: 2\n");
        let names: Vec<_> = doc
            .children()
            .into_iter()
            .map(|c| c.token.name().map(str::to_string))
            .collect();
        assert_eq!(names, vec![Some("b".to_string()), Some("a".to_string())]);
    }

    #[test]
    fn test_integer_keys_are_named() {
        let doc = load("1: one\n2: two\n");
        assert_eq!(doc.child("2").and_then(|c| c.text()).as_deref(), Some("two"));
    }

    #[test]
    fn test_sequence_access() {
        let doc = load("items:\n  - a\n  - b\n");
        let items = doc.child("items").unwrap();
        assert_eq!(items.kind(), NodeKind::Array);
        assert_eq!(items.child_count(), 2);
        assert_eq!(items.child_at(1).and_then(|c| c.text()).as_deref(), Some("b"));
        assert!(items.child_at(2).is_none());
    }

    #[test]
    fn test_to_value() {
        let doc = load("name: app\nport: 8080\nratio: 0.5\nenabled: true\nextra: ~\n");
        assert_eq!(
            doc.to_value(),
            serde_json::json!({
                "name": "app",
                "port": 8080,
                "ratio": 0.5,
                "enabled": true,
                "extra": null
            })
        );
    }
}
