//! Path evaluation over any [`TreeNode`].
//!
//! Evaluation folds the steps over a list of frames. A frame is one current
//! selection: the node (or attribute, text or comment value) it points at and
//! the tokens that locate it. Each step maps every frame to zero or more
//! frames; after every step frames with the same location collapse onto the
//! first one.

use super::ast::{PathStep, Position, Predicate};
use super::error::QueryError;
use super::path::PathToken;
use crate::document::node::{NodeKind, TreeNode};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Limits applied while evaluating a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalOptions {
    /// Maximum number of nodes recursive descent may visit; `None` is unbounded.
    pub node_budget: Option<usize>,
}

/// What a frame points at.
#[derive(Debug)]
pub enum Hit<'a, N: ?Sized> {
    Node(&'a N),
    /// Attribute value, text content or comment
    Value { kind: NodeKind, text: Cow<'a, str> },
}

impl<'a, N: TreeNode + ?Sized> Hit<'a, N> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Hit::Node(node) => node.kind(),
            Hit::Value { kind, .. } => *kind,
        }
    }

    pub fn node(&self) -> Option<&'a N> {
        match self {
            Hit::Node(node) => Some(*node),
            Hit::Value { .. } => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Hit::Node(node) => node.to_value(),
            Hit::Value { text, .. } => Value::String(text.to_string()),
        }
    }
}

/// One selected location.
#[derive(Debug)]
pub struct Match<'a, N: ?Sized> {
    pub hit: Hit<'a, N>,
    pub location: Vec<PathToken>,
}

/// Document-order key component: (rank, ordinal).
///
/// Attributes sort before text, text before comments, comments before child
/// nodes. Comparing two keys lexicographically gives document order.
type OrderKey = Vec<(u8, u32)>;

const RANK_ATTRIBUTE: u8 = 0;
const RANK_TEXT: u8 = 1;
const RANK_COMMENT: u8 = 2;
const RANK_CHILD: u8 = 3;

struct Frame<'a, N: ?Sized> {
    hit: Hit<'a, N>,
    location: Vec<PathToken>,
    order: OrderKey,
    /// Index of the frame this one was produced from, used by positional
    /// filters to find sibling groups.
    group: usize,
}

impl<'a, N: TreeNode + ?Sized> Frame<'a, N> {
    fn root(node: &'a N) -> Self {
        Frame {
            hit: Hit::Node(node),
            location: Vec::new(),
            order: Vec::new(),
            group: 0,
        }
    }

    /// Derives a frame one hop below this one.
    fn extend(&self, hit: Hit<'a, N>, token: PathToken, key: (u8, u32), group: usize) -> Self {
        let mut location = self.location.clone();
        location.push(token);
        let mut order = self.order.clone();
        order.push(key);
        Frame {
            hit,
            location,
            order,
            group,
        }
    }
}

/// Evaluates parsed steps against a document root.
pub struct Evaluator<'a, N: ?Sized> {
    root: &'a N,
    options: EvalOptions,
    visited: usize,
}

impl<'a, N: TreeNode + ?Sized> Evaluator<'a, N> {
    pub fn new(root: &'a N) -> Self {
        Self::with_options(root, EvalOptions::default())
    }

    pub fn with_options(root: &'a N, options: EvalOptions) -> Self {
        Self {
            root,
            options,
            visited: 0,
        }
    }

    /// Evaluates steps from the root and returns matches in result order.
    ///
    /// # Errors
    ///
    /// `Unsupported` when a step needs attributes or comments the format lacks,
    /// checked before any node is visited; `BudgetExceeded` when recursive
    /// descent runs past the node budget.
    pub fn evaluate(&mut self, steps: &[PathStep]) -> Result<Vec<Match<'a, N>>, QueryError> {
        self.check_capabilities(steps)?;
        self.visited = 0;

        let frames = self.run(vec![Frame::root(self.root)], steps)?;
        debug!(matches = frames.len(), visited = self.visited, "evaluation complete");
        Ok(frames
            .into_iter()
            .map(|frame| Match {
                hit: frame.hit,
                location: frame.location,
            })
            .collect())
    }

    fn check_capabilities(&self, steps: &[PathStep]) -> Result<(), QueryError> {
        let capabilities = self.root.capabilities();
        for step in steps {
            let supported = match step {
                PathStep::AttributeAccess(_) => capabilities.attributes,
                PathStep::CommentSelector => capabilities.comments,
                PathStep::RecursiveDescent(rest) => {
                    self.check_capabilities(rest)?;
                    true
                }
                _ => true,
            };
            if !supported {
                return Err(QueryError::Unsupported {
                    step: step.describe(),
                    format: self.root.format(),
                });
            }
        }
        Ok(())
    }

    fn run(
        &mut self,
        mut frames: Vec<Frame<'a, N>>,
        steps: &[PathStep],
    ) -> Result<Vec<Frame<'a, N>>, QueryError> {
        for step in steps {
            if frames.is_empty() {
                break;
            }
            frames = match step {
                PathStep::RecursiveDescent(rest) => self.descend(frames, rest)?,
                _ => self.apply(frames, step),
            };
            frames = dedup(frames);
        }
        Ok(frames)
    }

    /// Applies one non-recursive step to every frame.
    fn apply(&self, frames: Vec<Frame<'a, N>>, step: &PathStep) -> Vec<Frame<'a, N>> {
        let mut out = Vec::new();
        match step {
            PathStep::Root => out.push(Frame::root(self.root)),
            PathStep::PositionFilter(position) => {
                return select_positions(broadcast_arrays(frames), *position)
            }
            PathStep::PredicateFilter(predicate) => {
                for (group, frame) in frames.into_iter().enumerate() {
                    let Hit::Node(node) = frame.hit else {
                        continue;
                    };
                    if node.kind() == NodeKind::Array {
                        for child in node.children() {
                            if matches_predicate(child.node, predicate) {
                                out.push(frame.extend(
                                    Hit::Node(child.node),
                                    child.token,
                                    (RANK_CHILD, child.ordinal as u32),
                                    group,
                                ));
                            }
                        }
                    } else if matches_predicate(node, predicate) {
                        out.push(frame);
                    }
                }
            }
            _ => {
                for (group, frame) in frames.iter().enumerate() {
                    if let Hit::Node(node) = frame.hit {
                        self.apply_to_node(frame, node, step, group, &mut out);
                    }
                }
            }
        }
        out
    }

    fn apply_to_node(
        &self,
        frame: &Frame<'a, N>,
        node: &'a N,
        step: &PathStep,
        group: usize,
        out: &mut Vec<Frame<'a, N>>,
    ) {
        match step {
            PathStep::ChildByName(name) => push_named(frame, node, name, group, out),
            PathStep::MultiProperty(names) => {
                for name in names {
                    push_named(frame, node, name, group, out);
                }
            }
            PathStep::ChildWildcard => {
                for child in node.children() {
                    out.push(frame.extend(
                        Hit::Node(child.node),
                        child.token,
                        (RANK_CHILD, child.ordinal as u32),
                        group,
                    ));
                }
            }
            PathStep::IndexAccess(index) => {
                if node.kind() != NodeKind::Array {
                    return;
                }
                let len = node.child_count() as isize;
                let index = if *index < 0 { len + index } else { *index };
                if (0..len).contains(&index) {
                    if let Some(child) = node.children().into_iter().nth(index as usize) {
                        out.push(frame.extend(
                            Hit::Node(child.node),
                            child.token,
                            (RANK_CHILD, child.ordinal as u32),
                            group,
                        ));
                    }
                }
            }
            PathStep::SliceAccess(start, end) => {
                if node.kind() != NodeKind::Array {
                    return;
                }
                let len = node.child_count() as isize;
                let normalize = |i: isize| if i < 0 { (len + i).max(0) } else { i.min(len) };
                let start = start.map(normalize).unwrap_or(0);
                let end = end.map(normalize).unwrap_or(len);
                if start >= end {
                    return;
                }
                let children = node.children();
                for child in children
                    .into_iter()
                    .skip(start as usize)
                    .take((end - start) as usize)
                {
                    out.push(frame.extend(
                        Hit::Node(child.node),
                        child.token,
                        (RANK_CHILD, child.ordinal as u32),
                        group,
                    ));
                }
            }
            PathStep::AttributeAccess(name) => {
                for (idx, (key, value)) in node.attributes().into_iter().enumerate() {
                    if name == "*" || name == key {
                        out.push(frame.extend(
                            Hit::Value {
                                kind: NodeKind::Attribute,
                                text: Cow::Borrowed(value),
                            },
                            PathToken::Attribute(key.to_string()),
                            (RANK_ATTRIBUTE, idx as u32),
                            group,
                        ));
                    }
                }
            }
            PathStep::TextSelector => {
                if let Some(text) = node.text() {
                    out.push(frame.extend(
                        Hit::Value {
                            kind: NodeKind::Text,
                            text,
                        },
                        PathToken::Text,
                        (RANK_TEXT, 0),
                        group,
                    ));
                }
            }
            PathStep::CommentSelector => {
                for (idx, comment) in node.comments().into_iter().enumerate() {
                    out.push(frame.extend(
                        Hit::Value {
                            kind: NodeKind::Comment,
                            text: Cow::Borrowed(comment),
                        },
                        PathToken::Comment(idx + 1),
                        (RANK_COMMENT, idx as u32),
                        group,
                    ));
                }
            }
            PathStep::Root
            | PathStep::RecursiveDescent(_)
            | PathStep::PredicateFilter(_)
            | PathStep::PositionFilter(_) => {}
        }
    }

    /// Walks every node below each frame in pre-order, evaluating `rest` at
    /// each one, the frame's own node included.
    ///
    /// Results are put in document order and deduplicated, so `//x` lists
    /// every `x` once in the order a depth-first walk meets it.
    fn descend(
        &mut self,
        frames: Vec<Frame<'a, N>>,
        rest: &[PathStep],
    ) -> Result<Vec<Frame<'a, N>>, QueryError> {
        let mut results = Vec::new();
        for (group, frame) in frames.into_iter().enumerate() {
            let Hit::Node(start) = frame.hit else {
                continue;
            };
            let mut stack = vec![(start, frame.location, frame.order)];
            while let Some((node, location, order)) = stack.pop() {
                self.visit()?;

                let children = node.children();
                for child in children.into_iter().rev() {
                    let mut child_location = location.clone();
                    child_location.push(child.token);
                    let mut child_order = order.clone();
                    child_order.push((RANK_CHILD, child.ordinal as u32));
                    stack.push((child.node, child_location, child_order));
                }

                let here = Frame {
                    hit: Hit::Node(node),
                    location,
                    order,
                    group,
                };
                let found = self.run(vec![here], rest)?;
                results.extend(found.into_iter().map(|mut f| {
                    f.group = group;
                    f
                }));
            }
        }

        results.sort_by(|a, b| a.order.cmp(&b.order));
        debug!(
            visited = self.visited,
            matches = results.len(),
            "recursive descent complete"
        );
        Ok(results)
    }

    fn visit(&mut self) -> Result<(), QueryError> {
        self.visited += 1;
        match self.options.node_budget {
            Some(budget) if self.visited > budget => {
                warn!(budget, "recursive descent exceeded node budget");
                Err(QueryError::BudgetExceeded { budget })
            }
            _ => Ok(()),
        }
    }
}

/// Children of `node` reachable under `name`. An array frame reaches into its
/// elements, so `$.users.name` lists every user's name.
fn push_named<'a, N: TreeNode + ?Sized>(
    frame: &Frame<'a, N>,
    node: &'a N,
    name: &str,
    group: usize,
    out: &mut Vec<Frame<'a, N>>,
) {
    if node.kind() == NodeKind::Array {
        for element in node.children() {
            let element_frame = frame.extend(
                Hit::Node(element.node),
                element.token,
                (RANK_CHILD, element.ordinal as u32),
                group,
            );
            for child in element.node.children_named(name) {
                out.push(element_frame.extend(
                    Hit::Node(child.node),
                    child.token,
                    (RANK_CHILD, child.ordinal as u32),
                    group,
                ));
            }
        }
        return;
    }
    for child in node.children_named(name) {
        out.push(frame.extend(
            Hit::Node(child.node),
            child.token,
            (RANK_CHILD, child.ordinal as u32),
            group,
        ));
    }
}

/// Replaces every array frame by its elements, each array forming its own
/// sibling group, so `[last()]` on an array picks its last element. Runs of
/// other frames keep their grouping.
fn broadcast_arrays<'a, N: TreeNode + ?Sized>(frames: Vec<Frame<'a, N>>) -> Vec<Frame<'a, N>> {
    let mut out = Vec::with_capacity(frames.len());
    let mut next_group = 0;
    let mut current: Option<usize> = None;
    for mut frame in frames {
        let array = match frame.hit {
            Hit::Node(node) if node.kind() == NodeKind::Array => Some(node),
            _ => None,
        };
        match array {
            Some(node) => {
                for child in node.children() {
                    out.push(frame.extend(
                        Hit::Node(child.node),
                        child.token,
                        (RANK_CHILD, child.ordinal as u32),
                        next_group,
                    ));
                }
                next_group += 1;
                current = None;
            }
            None => {
                if current != Some(frame.group) {
                    current = Some(frame.group);
                    next_group += 1;
                }
                frame.group = next_group - 1;
                out.push(frame);
            }
        }
    }
    out
}

/// Keeps the frame at `position` within each run of frames that share a group.
fn select_positions<'a, N: ?Sized>(
    frames: Vec<Frame<'a, N>>,
    position: Position,
) -> Vec<Frame<'a, N>> {
    let mut out = Vec::new();
    let mut iter = frames.into_iter().peekable();
    while let Some(first) = iter.next() {
        let group = first.group;
        let mut run = vec![first];
        while let Some(next) = iter.next_if(|f| f.group == group) {
            run.push(next);
        }
        let selected = match position {
            Position::Index(n) => run.into_iter().nth(n),
            Position::Last => run.pop(),
        };
        out.extend(selected);
    }
    out
}

fn dedup<'a, N: ?Sized>(frames: Vec<Frame<'a, N>>) -> Vec<Frame<'a, N>> {
    let mut seen = HashSet::new();
    frames
        .into_iter()
        .filter(|frame| seen.insert(frame.location.clone()))
        .collect()
}

/// Looks the predicate key up as an attribute first, then as a child's text.
fn lookup<'a, N: TreeNode + ?Sized>(node: &'a N, key: &str) -> Option<Cow<'a, str>> {
    node.attribute(key)
        .map(Cow::Borrowed)
        .or_else(|| node.child(key).and_then(|child| child.text()))
}

fn matches_predicate<N: TreeNode + ?Sized>(node: &N, predicate: &Predicate) -> bool {
    lookup(node, &predicate.key).is_some_and(|value| compare(&value, predicate))
}

/// Finite numbers only; `inf` and `nan` spellings count as text.
fn as_number(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric when both sides parse as numbers, lexicographic otherwise. An
/// ordering comparison against a numeric literal never matches a non-number.
fn compare(value: &str, predicate: &Predicate) -> bool {
    let literal = predicate.literal.as_str();
    match (as_number(value), as_number(literal)) {
        (Some(v), Some(l)) => predicate.comparator.holds(v.partial_cmp(&l)),
        (None, Some(_)) if predicate.comparator.is_ordering() => false,
        _ => predicate.comparator.holds(Some(value.cmp(literal))),
    }
}
