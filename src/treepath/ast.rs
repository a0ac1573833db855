//! Abstract syntax tree types for tree path expressions.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Indexing and rendering convention, fixed per source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `$` root, `.name` steps, 0-based indices.
    #[default]
    Json,
    /// `/` root, `/name` steps, 1-based positions.
    Xml,
}

impl Dialect {
    /// The first index a user writes in this dialect.
    pub fn index_base(self) -> isize {
        match self {
            Dialect::Json => 0,
            Dialect::Xml => 1,
        }
    }

    /// Canonical rendering of the root location.
    pub fn root(self) -> &'static str {
        match self {
            Dialect::Json => "$",
            Dialect::Xml => "/",
        }
    }
}

/// Comparison operator of a predicate clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    NotEq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::NotEq => "!=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Ge => ">=",
            Comparator::Le => "<=",
        }
    }

    /// True for `>`, `<`, `>=` and `<=`.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Comparator::Gt | Comparator::Lt | Comparator::Ge | Comparator::Le
        )
    }

    /// Applies the operator to the outcome of comparing the value with the literal.
    ///
    /// An unordered outcome (NaN on either side) never holds.
    pub fn holds(self, ordering: Option<Ordering>) -> bool {
        let Some(ordering) = ordering else {
            return false;
        };
        match self {
            Comparator::Eq => ordering == Ordering::Equal,
            Comparator::NotEq => ordering != Ordering::Equal,
            Comparator::Gt => ordering == Ordering::Greater,
            Comparator::Lt => ordering == Ordering::Less,
            Comparator::Ge => ordering != Ordering::Less,
            Comparator::Le => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single `@key cmp literal` clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    /// Attribute or child name looked up on each candidate.
    pub key: String,
    pub comparator: Comparator,
    /// Literal as written, quotes removed.
    pub literal: String,
}

impl Predicate {
    pub fn new(key: impl Into<String>, comparator: Comparator, literal: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            comparator,
            literal: literal.into(),
        }
    }
}

/// Target of a positional filter, already 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    Index(usize),
    Last,
}

/// A step in a tree path expression.
///
/// Steps are purely syntactic and hold no reference into any tree, so a parsed
/// path can be evaluated against any number of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Root node (`$` or `/`)
    Root,
    /// Named child (`.name`, `/name`, `['name']`)
    ChildByName(String),
    /// Several named children (`['a','b']`)
    MultiProperty(Vec<String>),
    /// All direct children (`*`, `.*`, `[*]`)
    ChildWildcard,
    /// Descend everywhere, then continue with the remaining steps (`..`, `//`)
    RecursiveDescent(Vec<PathStep>),
    /// Array element, negative counts from the end
    IndexAccess(isize),
    /// Array elements in `[start, end)`
    SliceAccess(Option<isize>, Option<isize>),
    /// Attribute value (`@name`, `@*`)
    AttributeAccess(String),
    /// Text content (`text()`)
    TextSelector,
    /// Comment children (`comment()`)
    CommentSelector,
    /// Predicate clause (`[?(@k > 1)]`, `[@k='v']`)
    PredicateFilter(Predicate),
    /// Positional filter over a sibling group (`[last()]`, XML `[n]`)
    PositionFilter(Position),
}

impl PathStep {
    /// Short description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            PathStep::Root => "root selector",
            PathStep::ChildByName(_) => "child access",
            PathStep::MultiProperty(_) => "multi-property access",
            PathStep::ChildWildcard => "wildcard",
            PathStep::RecursiveDescent(_) => "recursive descent",
            PathStep::IndexAccess(_) => "index access",
            PathStep::SliceAccess(_, _) => "slice access",
            PathStep::AttributeAccess(_) => "attribute access",
            PathStep::TextSelector => "text()",
            PathStep::CommentSelector => "comment()",
            PathStep::PredicateFilter(_) => "predicate filter",
            PathStep::PositionFilter(_) => "position filter",
        }
    }
}

/// A parsed path expression together with the dialect it was written in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreePath {
    pub dialect: Dialect,
    /// Steps that make up the path.
    pub steps: Vec<PathStep>,
}

impl TreePath {
    /// Creates a new path with the given segments.
    pub fn new(dialect: Dialect, steps: Vec<PathStep>) -> Self {
        Self { dialect, steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparator_holds() {
        assert!(Comparator::Ge.holds(Some(Ordering::Equal)));
        assert!(Comparator::Ge.holds(Some(Ordering::Greater)));
        assert!(!Comparator::Lt.holds(Some(Ordering::Equal)));
        assert!(Comparator::NotEq.holds(Some(Ordering::Less)));
        assert!(!Comparator::Eq.holds(None));
    }

    #[test]
    fn test_dialect_roots() {
        assert_eq!(Dialect::Json.root(), "$");
        assert_eq!(Dialect::Xml.root(), "/");
        assert_eq!(Dialect::Xml.index_base(), 1);
    }
}
