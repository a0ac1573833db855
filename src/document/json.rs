//! `TreeNode` adapter over `serde_json::Value`.
//!
//! Objects keep their source key order because the crate enables serde_json's
//! `preserve_order` feature.

use super::node::{ChildRef, DocumentFormat, NodeKind, TreeNode};
use crate::treepath::path::PathToken;
use serde_json::Value;
use std::borrow::Cow;

impl TreeNode for Value {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Json
    }

    fn kind(&self) -> NodeKind {
        match self {
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
            _ => NodeKind::Scalar,
        }
    }

    fn child(&self, key: &str) -> Option<&Self> {
        self.as_object()?.get(key)
    }

    fn child_at(&self, index: usize) -> Option<&Self> {
        self.as_array()?.get(index)
    }

    fn children(&self) -> Vec<ChildRef<'_, Self>> {
        match self {
            Value::Object(map) => map
                .iter()
                .enumerate()
                .map(|(ordinal, (key, child))| {
                    ChildRef::new(ordinal, PathToken::Key(key.clone()), child)
                })
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(idx, child)| ChildRef::new(idx, PathToken::Index(idx), child))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn children_named(&self, name: &str) -> Vec<ChildRef<'_, Self>> {
        let Value::Object(map) = self else {
            return Vec::new();
        };
        map.iter()
            .enumerate()
            .find(|(_, (key, _))| key.as_str() == name)
            .map(|(ordinal, (key, child))| {
                vec![ChildRef::new(ordinal, PathToken::Key(key.clone()), child)]
            })
            .unwrap_or_default()
    }

    fn child_count(&self) -> usize {
        match self {
            Value::Object(map) => map.len(),
            Value::Array(items) => items.len(),
            _ => 0,
        }
    }

    fn text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            Value::Null => Some(Cow::Borrowed("null")),
            Value::Object(_) | Value::Array(_) => None,
        }
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}
