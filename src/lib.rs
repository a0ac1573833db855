//! pathquill: path queries over JSON, YAML and XML documents.
//!
//! - [`document`] - parsed documents and the `TreeNode` view over them
//! - [`treepath`] - expression parser, evaluator and canonical paths
//! - [`file`] - loading documents from files and stdin
//! - [`config`] - user configuration

pub mod config;
pub mod document;
pub mod file;
pub mod treepath;
