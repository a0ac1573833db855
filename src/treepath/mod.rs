//! Path queries over JSON, YAML and XML trees.
//!
//! One expression language covers both JSONPath-style and XPath-style
//! syntax. The dialect (fixed by the document format) decides how indices are
//! read and how result paths are written.
//!
//! # Supported Syntax
//!
//! - `$` or `/` - Root node
//! - `.name`, `/name`, `['name']` - Named child
//! - `['a','b']` - Several named children
//! - `*`, `.*`, `/*`, `[*]` - All children
//! - `..name`, `//name` - Recursive descent
//! - `[n]` - Array index (JSON, 0-based, negative from the end) or sibling
//!   position (XML, 1-based)
//! - `[start:end]` - Slice
//! - `@name`, `/@name` - Attribute (XML)
//! - `text()`, `comment()` - Text content and comments
//! - `[?(@key > 10)]`, `[@key='v']` - Predicate
//! - `[last()]` - Last element of an array, or last of each sibling group
//!
//! # Result Order
//!
//! Steps keep the order in which they select: `['b','a']` lists `b` before
//! `a`. Recursive descent is the exception; its results are always in
//! document order, so `..['b','a']` lists whichever key comes first in the
//! document.
//!
//! # Examples
//!
//! ```
//! use pathquill::treepath::{Dialect, QueryEngine};
//! use serde_json::json;
//!
//! let doc = json!({"users": [{"name": "Alice"}, {"name": "Bob"}]});
//! let result = QueryEngine::new(Dialect::Json).query(&doc, "$.users[*].name");
//! assert_eq!(result.matches, vec![json!("Alice"), json!("Bob")]);
//! assert_eq!(result.paths, vec!["$.users[0].name", "$.users[1].name"]);
//! ```

pub mod ast;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod parser;
pub mod path;
pub mod report;
pub mod validator;

pub use ast::{Comparator, Dialect, PathStep, Position, Predicate, TreePath};
pub use engine::{QueryEngine, QueryResult};
pub use error::QueryError;
pub use evaluator::{EvalOptions, Evaluator};
pub use parser::Parser;
pub use path::{PathBuilder, PathToken};
pub use report::{OutputFormat, RenderOptions, Report};
pub use validator::{Validation, Validator};
