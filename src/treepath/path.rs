//! Canonical path rendering and parsing.
//!
//! Every match carries the list of [`PathToken`]s that leads to it from the
//! root. [`PathBuilder`] turns that list into the one deterministic string the
//! engine reports, and reads such a string back. Concrete paths round-trip:
//! `render(parse(p)) == p`.

use super::ast::{Dialect, PathStep, Position};
use super::error::QueryError;
use serde::Serialize;

/// One hop of a resolved location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum PathToken {
    /// Object member or mapping key
    Key(String),
    /// Array element, 0-based
    Index(usize),
    /// XML element; `position` is 1-based and only set when the name repeats
    Element {
        name: String,
        position: Option<usize>,
    },
    Attribute(String),
    Text,
    /// Comment child, 1-based
    Comment(usize),
}

impl PathToken {
    /// Name used by child lookups, if this token has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            PathToken::Key(name) | PathToken::Element { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Renders and parses canonical paths for one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathBuilder {
    dialect: Dialect,
}

impl PathBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Renders a token list as a canonical path string.
    pub fn render(&self, tokens: &[PathToken]) -> String {
        match self.dialect {
            Dialect::Json => render_json(tokens),
            Dialect::Xml => render_xml(tokens),
        }
    }

    /// Parses a concrete canonical path back into tokens.
    ///
    /// Only the forms `render` produces are accepted; wildcards and predicates
    /// denote sets, not locations, and are rejected.
    pub fn parse(&self, path: &str) -> Result<Vec<PathToken>, QueryError> {
        let mut cursor = Cursor::new(path);
        match self.dialect {
            Dialect::Json => cursor.json_tokens(),
            Dialect::Xml => cursor.xml_tokens(),
        }
    }

    /// Converts tokens into steps that select exactly that location again.
    pub fn to_steps(tokens: &[PathToken]) -> Vec<PathStep> {
        let mut steps = vec![PathStep::Root];
        for token in tokens {
            match token {
                PathToken::Key(name) => steps.push(PathStep::ChildByName(name.clone())),
                PathToken::Index(idx) => steps.push(PathStep::IndexAccess(*idx as isize)),
                PathToken::Element { name, position } => {
                    steps.push(PathStep::ChildByName(name.clone()));
                    if let Some(position) = position {
                        let index = position.saturating_sub(1);
                        steps.push(PathStep::PositionFilter(Position::Index(index)));
                    }
                }
                PathToken::Attribute(name) => steps.push(PathStep::AttributeAccess(name.clone())),
                PathToken::Text => steps.push(PathStep::TextSelector),
                PathToken::Comment(k) => {
                    steps.push(PathStep::CommentSelector);
                    steps.push(PathStep::PositionFilter(Position::Index(k.saturating_sub(1))));
                }
            }
        }
        steps
    }
}

/// Keys that can be written after a dot without quoting.
fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
        }
        _ => false,
    }
}

fn quote_key(key: &str) -> String {
    let mut quoted = String::with_capacity(key.len() + 4);
    quoted.push_str("['");
    for ch in key.chars() {
        if ch == '\'' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push_str("']");
    quoted
}

fn push_json_key(out: &mut String, key: &str) {
    if is_plain_key(key) {
        out.push('.');
        out.push_str(key);
    } else {
        out.push_str(&quote_key(key));
    }
}

fn render_json(tokens: &[PathToken]) -> String {
    let mut out = String::from("$");
    for token in tokens {
        match token {
            PathToken::Key(key) => push_json_key(&mut out, key),
            PathToken::Index(idx) => out.push_str(&format!("[{}]", idx)),
            PathToken::Element { name, position } => {
                push_json_key(&mut out, name);
                if let Some(position) = position {
                    out.push_str(&format!("[{}]", position.saturating_sub(1)));
                }
            }
            PathToken::Attribute(name) => {
                out.push_str(".@");
                out.push_str(&escape_name(name));
            }
            PathToken::Text => out.push_str(".text()"),
            PathToken::Comment(k) => {
                out.push_str(&format!(".comment()[{}]", k.saturating_sub(1)));
            }
        }
    }
    out
}

/// Characters that end a name in the path grammar.
pub(crate) fn is_name_terminator(ch: char) -> bool {
    ch.is_whitespace()
        || matches!(
            ch,
            '.' | '[' | ']' | '/' | '@' | '(' | ')' | '=' | '!' | '<' | '>' | '\'' | '"' | ','
                | '*' | '$' | '\\' | ':'
        )
}

/// Backslash-escapes characters that would otherwise end a name.
fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        // `:` is legal inside names (XML prefixes), it only matters in brackets
        if ch != ':' && is_name_terminator(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn render_xml(tokens: &[PathToken]) -> String {
    if tokens.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for token in tokens {
        match token {
            PathToken::Key(name)
            | PathToken::Element {
                name,
                position: None,
            } => {
                out.push('/');
                out.push_str(&escape_name(name));
            }
            PathToken::Element {
                name,
                position: Some(position),
            } => out.push_str(&format!("/{}[{}]", escape_name(name), position)),
            PathToken::Index(idx) => out.push_str(&format!("[{}]", idx + 1)),
            PathToken::Attribute(name) => {
                out.push_str("/@");
                out.push_str(&escape_name(name));
            }
            PathToken::Text => out.push_str("/text()"),
            PathToken::Comment(k) => out.push_str(&format!("/comment()[{}]", k)),
        }
    }
    out
}

/// Character cursor over a canonical path.
struct Cursor {
    chars: Vec<char>,
    position: usize,
}

impl Cursor {
    fn new(path: &str) -> Self {
        Self {
            chars: path.chars().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    fn is_eof(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn error(&self, message: impl Into<String>) -> QueryError {
        QueryError::parse(self.position, message)
    }

    fn expect(&mut self, expected: char) -> Result<(), QueryError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.position += 1;
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected '{}' but found '{}'", expected, ch))),
            None => Err(self.error(format!("unexpected end of path, expected '{}'", expected))),
        }
    }

    fn eat(&mut self, literal: &str) -> bool {
        let matches = literal
            .chars()
            .enumerate()
            .all(|(offset, ch)| self.chars.get(self.position + offset) == Some(&ch));
        if matches {
            self.position += literal.chars().count();
        }
        matches
    }

    fn name(&mut self) -> Result<String, QueryError> {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.next();
                match self.next() {
                    Some(escaped) => name.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else if ch == ':' || !is_name_terminator(ch) {
                name.push(ch);
                self.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            Err(self.error("expected a name"))
        } else {
            Ok(name)
        }
    }

    fn number(&mut self) -> Result<usize, QueryError> {
        let start = self.position;
        let mut digits = String::new();
        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            digits.push(ch);
            self.next();
        }
        digits
            .parse::<usize>()
            .map_err(|_| QueryError::parse(start, "expected a number"))
    }

    fn bracketed_number(&mut self) -> Result<usize, QueryError> {
        self.expect('[')?;
        let value = self.number()?;
        self.expect(']')?;
        Ok(value)
    }

    fn one_based(&mut self) -> Result<usize, QueryError> {
        let start = self.position;
        match self.bracketed_number()? {
            0 => Err(QueryError::parse(start, "positions start at 1")),
            n => Ok(n),
        }
    }

    fn quoted(&mut self) -> Result<String, QueryError> {
        self.expect('\'')?;
        let mut value = String::new();
        loop {
            match self.next() {
                Some('\'') => return Ok(value),
                Some('\\') => match self.next() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("dangling escape")),
                },
                Some(ch) => value.push(ch),
                None => return Err(self.error("unterminated quoted key")),
            }
        }
    }

    fn json_tokens(&mut self) -> Result<Vec<PathToken>, QueryError> {
        self.expect('$')?;
        let mut tokens = Vec::new();
        while !self.is_eof() {
            match self.peek() {
                Some('.') => {
                    self.next();
                    if self.eat("@") {
                        tokens.push(PathToken::Attribute(self.name()?));
                    } else if self.eat("text()") {
                        tokens.push(PathToken::Text);
                    } else if self.eat("comment()") {
                        tokens.push(PathToken::Comment(self.bracketed_number()? + 1));
                    } else {
                        tokens.push(PathToken::Key(self.name()?));
                    }
                }
                Some('[') if self.chars.get(self.position + 1) == Some(&'\'') => {
                    self.next();
                    let key = self.quoted()?;
                    self.expect(']')?;
                    tokens.push(PathToken::Key(key));
                }
                Some('[') => tokens.push(PathToken::Index(self.bracketed_number()?)),
                Some(ch) => return Err(self.error(format!("unexpected '{}'", ch))),
                None => break,
            }
        }
        Ok(tokens)
    }

    fn xml_tokens(&mut self) -> Result<Vec<PathToken>, QueryError> {
        if self.chars == ['/'] {
            return Ok(Vec::new());
        }
        let mut tokens = Vec::new();
        while !self.is_eof() {
            self.expect('/')?;
            if self.eat("@") {
                tokens.push(PathToken::Attribute(self.name()?));
            } else if self.eat("text()") {
                tokens.push(PathToken::Text);
            } else if self.eat("comment()") {
                tokens.push(PathToken::Comment(self.one_based()?));
            } else {
                let name = self.name()?;
                let position = match self.peek() {
                    Some('[') => Some(self.one_based()?),
                    _ => None,
                };
                tokens.push(PathToken::Element { name, position });
            }
        }
        Ok(tokens)
    }
}
