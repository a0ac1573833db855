//! Query entry point: validate, parse, evaluate, build paths.

use super::ast::{Dialect, PathStep, TreePath};
use super::error::QueryError;
use super::evaluator::{EvalOptions, Evaluator};
use super::parser::Parser;
use super::path::PathBuilder;
use super::validator::{Validation, Validator};
use crate::document::node::{DocumentFormat, TreeNode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Outcome of one query.
///
/// Failures are reported in-band: `success` is false, `error` says why and the
/// match lists are empty. No partial results are ever returned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub success: bool,
    /// Matched values, in result order.
    pub matches: Vec<Value>,
    /// Canonical path of each match, index-aligned with `matches`.
    pub paths: Vec<String>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

impl QueryResult {
    pub fn success(matches: Vec<Value>, paths: Vec<String>) -> Self {
        Self {
            success: true,
            count: matches.len(),
            matches,
            paths,
            error: None,
        }
    }

    pub fn failure(error: QueryError) -> Self {
        Self {
            success: false,
            matches: Vec::new(),
            paths: Vec::new(),
            count: 0,
            error: Some(error),
        }
    }
}

/// Evaluates path expressions written in one dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryEngine {
    dialect: Dialect,
    options: EvalOptions,
}

impl QueryEngine {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            options: EvalOptions::default(),
        }
    }

    /// Engine using the dialect native to `format`.
    pub fn for_format(format: DocumentFormat) -> Self {
        Self::new(format.dialect())
    }

    /// Caps how many nodes recursive descent may visit per query.
    pub fn with_node_budget(mut self, budget: Option<usize>) -> Self {
        self.options.node_budget = budget;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Syntax check only; never touches a document.
    pub fn validate(&self, expr: &str) -> Validation {
        Validator::validate(expr)
    }

    /// Validates then parses an expression.
    pub fn parse(&self, expr: &str) -> Result<TreePath, QueryError> {
        Validator::check(expr)?;
        Parser::parse(expr, self.dialect)
    }

    /// Runs `expr` against `root`.
    ///
    /// Paths are rendered in the engine's dialect, values through the node's
    /// own projection.
    pub fn query<N: TreeNode + ?Sized>(&self, root: &N, expr: &str) -> QueryResult {
        match self.try_query(root, expr) {
            Ok(result) => result,
            Err(error) => {
                debug!(%error, expr, "query failed");
                QueryResult::failure(error)
            }
        }
    }

    fn try_query<N: TreeNode + ?Sized>(
        &self,
        root: &N,
        expr: &str,
    ) -> Result<QueryResult, QueryError> {
        let path = self.parse(expr)?;
        self.evaluate(root, &path.steps)
    }

    /// Runs an already parsed path, so one parse can serve many documents.
    pub fn query_steps<N: TreeNode + ?Sized>(&self, root: &N, path: &TreePath) -> QueryResult {
        self.evaluate(root, &path.steps)
            .unwrap_or_else(QueryResult::failure)
    }

    fn evaluate<N: TreeNode + ?Sized>(
        &self,
        root: &N,
        steps: &[PathStep],
    ) -> Result<QueryResult, QueryError> {
        let found = Evaluator::with_options(root, self.options).evaluate(steps)?;
        let builder = PathBuilder::new(self.dialect);
        let (matches, paths): (Vec<Value>, Vec<String>) = found
            .iter()
            .map(|m| (m.hit.to_value(), builder.render(&m.location)))
            .unzip();
        Ok(QueryResult::success(matches, paths))
    }

    /// Canonical paths of every match, without projecting any values.
    pub fn query_paths<N: TreeNode + ?Sized>(
        &self,
        root: &N,
        expr: &str,
    ) -> Result<Vec<String>, QueryError> {
        let path = self.parse(expr)?;
        let found = Evaluator::with_options(root, self.options).evaluate(&path.steps)?;
        let builder = PathBuilder::new(self.dialect);
        Ok(found.iter().map(|m| builder.render(&m.location)).collect())
    }

    /// Resolves a canonical path produced by this engine back to its value.
    ///
    /// Returns a successful result with zero matches when nothing lives at
    /// `path` any more.
    pub fn resolve<N: TreeNode + ?Sized>(&self, root: &N, path: &str) -> QueryResult {
        PathBuilder::new(self.dialect)
            .parse(path)
            .and_then(|tokens| self.evaluate(root, &PathBuilder::to_steps(&tokens)))
            .unwrap_or_else(QueryResult::failure)
    }
}
