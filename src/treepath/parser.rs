//! Path expression parser.
//!
//! A single left-to-right pass with one character of lookahead; every step
//! starts with a distinct prefix (`.`, `/`, `[`, `@`, or a name), so the parser
//! never backtracks. Indices are normalized to 0-based here, so the evaluator
//! never needs to know which dialect a path was written in.

use super::ast::{Comparator, Dialect, PathStep, Position, Predicate, TreePath};
use super::error::QueryError;
use super::path::is_name_terminator;

/// Parser for path expression strings.
pub struct Parser {
    input: Vec<char>,
    position: usize,
    dialect: Dialect,
}

impl Parser {
    /// Creates a new parser for the given query string.
    pub fn new(query: &str, dialect: Dialect) -> Self {
        Self {
            input: query.chars().collect(),
            position: 0,
            dialect,
        }
    }

    /// Parses the query string into a `TreePath`.
    pub fn parse(query: &str, dialect: Dialect) -> Result<TreePath, QueryError> {
        let mut parser = Parser::new(query, dialect);
        parser.parse_path()
    }

    fn parse_path(&mut self) -> Result<TreePath, QueryError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(QueryError::parse(0, "empty path"));
        }

        let mut steps = vec![PathStep::Root];
        match self.peek() {
            Some('$') => {
                self.next();
            }
            // A lone `/` is the root; otherwise the loop reads `/name` or `//name`
            Some('/') if self.input[self.position + 1..].iter().all(|c| c.is_whitespace()) => {
                self.next();
            }
            Some('/') | Some('.') | Some('[') | Some('@') => {}
            // Relative paths start at the root: `store.book`, `root/item`, `*`
            Some(_) => steps.push(self.parse_node_test()?),
            None => {}
        }

        self.parse_steps(&mut steps)?;
        Ok(TreePath::new(self.dialect, steps))
    }

    /// Parses steps until the end of input.
    fn parse_steps(&mut self, steps: &mut Vec<PathStep>) -> Result<(), QueryError> {
        loop {
            self.skip_whitespace();
            let Some(ch) = self.peek() else {
                return Ok(());
            };
            match ch {
                '.' => {
                    self.next();
                    if self.peek() == Some('.') {
                        self.next();
                        steps.push(self.parse_recursive_descent()?);
                        return Ok(());
                    }
                    self.skip_whitespace();
                    steps.push(self.parse_node_test()?);
                }
                '/' => {
                    self.next();
                    if self.peek() == Some('/') {
                        self.next();
                        // `//` always names the node test it searches for
                        let mut rest = vec![self.parse_node_test()?];
                        self.parse_steps(&mut rest)?;
                        steps.push(PathStep::RecursiveDescent(rest));
                        return Ok(());
                    }
                    steps.push(self.parse_node_test()?);
                }
                '@' => steps.push(self.parse_node_test()?),
                '[' => steps.push(self.parse_bracket_expression()?),
                ']' | ')' => {
                    return Err(QueryError::parse(
                        self.position,
                        format!("unmatched '{}'", ch),
                    ))
                }
                _ => {
                    return Err(QueryError::parse(
                        self.position,
                        format!("unexpected '{}'", ch),
                    ))
                }
            }
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    /// Returns the next character and advances position.
    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        Some(ch)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    /// Checks if we've reached the end of input.
    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Expects a specific character and advances, or returns an error.
    fn expect(&mut self, expected: char) -> Result<(), QueryError> {
        self.skip_whitespace();
        let pos = self.position;
        match self.next() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(QueryError::parse(
                pos,
                format!("expected '{}' but found '{}'", expected, ch),
            )),
            None => Err(QueryError::parse(
                pos,
                format!("unexpected end of input, expected '{}'", expected),
            )),
        }
    }

    /// Consumes the `)` matching a `(` opened at `opened_at`.
    fn close_paren(&mut self, opened_at: usize) -> Result<(), QueryError> {
        self.skip_whitespace();
        match self.peek() {
            Some(')') => {
                self.next();
                Ok(())
            }
            None => Err(QueryError::parse(opened_at, "unclosed '('")),
            Some(ch) => Err(QueryError::parse(
                self.position,
                format!("expected ')' but found '{}'", ch),
            )),
        }
    }

    /// Parses an identifier (property or element name).
    ///
    /// The name runs up to the first unescaped separator; `\` escapes the next
    /// character.
    fn parse_identifier(&mut self) -> Result<String, QueryError> {
        let start = self.position;
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\\' {
                self.next();
                match self.next() {
                    Some(escaped) => name.push(escaped),
                    None => return Err(QueryError::parse(self.position, "dangling escape")),
                }
            } else if ch == ':' || !is_name_terminator(ch) {
                name.push(ch);
                self.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            Err(QueryError::parse(start, "expected identifier"))
        } else {
            Ok(name)
        }
    }

    /// Parses what follows a separator: a name, `*`, `@name`, `text()` or
    /// `comment()`.
    fn parse_node_test(&mut self) -> Result<PathStep, QueryError> {
        match self.peek() {
            Some('*') => {
                self.next();
                Ok(PathStep::ChildWildcard)
            }
            Some('@') => {
                self.next();
                if self.peek() == Some('*') {
                    self.next();
                    return Ok(PathStep::AttributeAccess("*".to_string()));
                }
                Ok(PathStep::AttributeAccess(self.parse_identifier()?))
            }
            Some(_) => {
                let start = self.position;
                let name = self.parse_identifier()?;
                self.skip_whitespace();
                if self.peek() != Some('(') {
                    return Ok(PathStep::ChildByName(name));
                }
                let open = self.position;
                self.next();
                self.close_paren(open)?;
                match name.as_str() {
                    "text" => Ok(PathStep::TextSelector),
                    "comment" => Ok(PathStep::CommentSelector),
                    _ => Err(QueryError::parse(
                        start,
                        format!("unknown function '{}()'", name),
                    )),
                }
            }
            None => Err(QueryError::parse(
                self.position,
                "unexpected end of input, expected a name",
            )),
        }
    }

    /// Parses what follows `..`; the rest of the expression becomes the
    /// continuation evaluated at every descendant.
    fn parse_recursive_descent(&mut self) -> Result<PathStep, QueryError> {
        let mut rest = Vec::new();
        if let Some(ch) = self.peek() {
            if !matches!(ch, '.' | '/' | '[') && !ch.is_whitespace() {
                rest.push(self.parse_node_test()?);
            }
        }
        self.parse_steps(&mut rest)?;
        Ok(PathStep::RecursiveDescent(rest))
    }

    /// Parses bracket expression: [index], [start:end], ['key'], [*],
    /// [?(@k cmp v)], [@k cmp v], [last()]
    fn parse_bracket_expression(&mut self) -> Result<PathStep, QueryError> {
        let open = self.position;
        self.expect('[')?;
        self.skip_whitespace();

        let step = match self.peek() {
            Some('*') => {
                self.next();
                PathStep::ChildWildcard
            }
            Some('\'') | Some('"') => {
                let mut properties = self.parse_bracket_strings()?;
                if properties.len() == 1 {
                    PathStep::ChildByName(properties.remove(0))
                } else {
                    PathStep::MultiProperty(properties)
                }
            }
            Some('?') => {
                self.next();
                self.skip_whitespace();
                let paren = self.position;
                self.expect('(')?;
                let predicate = self.parse_predicate()?;
                self.close_paren(paren)?;
                PathStep::PredicateFilter(predicate)
            }
            Some('@') => PathStep::PredicateFilter(self.parse_predicate()?),
            Some('-') | Some('0'..='9') | Some(':') => self.parse_index_or_slice()?,
            Some(ch) if !is_name_terminator(ch) => {
                let start = self.position;
                let name = self.parse_identifier()?;
                self.skip_whitespace();
                if name != "last" || self.peek() != Some('(') {
                    return Err(QueryError::parse(
                        start,
                        format!("unexpected '{}' in brackets", name),
                    ));
                }
                let paren = self.position;
                self.next();
                self.close_paren(paren)?;
                PathStep::PositionFilter(Position::Last)
            }
            Some(ch) => {
                return Err(QueryError::parse(
                    self.position,
                    format!("invalid bracket expression starting with '{}'", ch),
                ))
            }
            None => return Err(QueryError::parse(open, "unclosed '['")),
        };

        self.skip_whitespace();
        match self.peek() {
            Some(']') => {
                self.next();
                Ok(step)
            }
            None => Err(QueryError::parse(open, "unclosed '['")),
            Some(ch) => Err(QueryError::parse(
                self.position,
                format!("expected ']' but found '{}'", ch),
            )),
        }
    }

    /// Parses a quoted string with backslash escapes.
    fn parse_quoted(&mut self) -> Result<String, QueryError> {
        let start = self.position;
        let quote = match self.next() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(QueryError::parse(start, "expected a quoted string")),
        };

        let mut value = String::new();
        loop {
            match self.next() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => match self.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(ch @ ('\\' | '\'' | '"')) => value.push(ch),
                    Some(_) => {
                        return Err(QueryError::parse(
                            self.position - 1,
                            "invalid escape sequence",
                        ))
                    }
                    None => return Err(QueryError::parse(start, "unterminated string")),
                },
                Some(ch) => value.push(ch),
                None => return Err(QueryError::parse(start, "unterminated string")),
            }
        }
    }

    /// Parses string(s) inside brackets: ['key'] or ['key1','key2']
    fn parse_bracket_strings(&mut self) -> Result<Vec<String>, QueryError> {
        let mut properties = vec![self.parse_quoted()?];
        loop {
            self.skip_whitespace();
            if self.peek() != Some(',') {
                return Ok(properties);
            }
            self.next();
            self.skip_whitespace();
            properties.push(self.parse_quoted()?);
        }
    }

    /// Parses a signed integer.
    fn parse_bracket_number(&mut self) -> Result<isize, QueryError> {
        self.skip_whitespace();
        let start = self.position;
        let mut num = String::new();
        if self.peek() == Some('-') {
            num.push('-');
            self.next();
        }
        while let Some(ch) = self.peek().filter(char::is_ascii_digit) {
            num.push(ch);
            self.next();
        }
        if num.is_empty() || num == "-" {
            return Err(QueryError::parse(start, "expected number"));
        }
        num.parse::<isize>()
            .map_err(|_| QueryError::parse(start, format!("invalid number: {}", num)))
    }

    /// Parses `[n]` or a slice `[start:end]`, `[start:]`, `[:end]`, `[:]`.
    fn parse_index_or_slice(&mut self) -> Result<PathStep, QueryError> {
        let start_pos = self.position;
        let start = if self.peek() == Some(':') {
            None
        } else {
            Some(self.parse_bracket_number()?)
        };

        self.skip_whitespace();
        if self.peek() != Some(':') {
            return match start {
                Some(index) => self.index_step(index, start_pos),
                None => Err(QueryError::parse(start_pos, "expected number")),
            };
        }
        self.next();
        self.skip_whitespace();

        let end = match self.peek() {
            Some(']') | None => None,
            Some(_) => Some(self.parse_bracket_number()?),
        };

        if let (Some(s), Some(e)) = (start, end) {
            if s >= 0 && e >= 0 && s > e {
                return Err(QueryError::parse(
                    start_pos,
                    format!("invalid slice: start ({}) > end ({})", s, e),
                ));
            }
        }

        Ok(PathStep::SliceAccess(
            start.map(|s| self.to_zero_based(s)),
            end.map(|e| self.to_zero_based(e)),
        ))
    }

    fn to_zero_based(&self, index: isize) -> isize {
        if index > 0 {
            index - self.dialect.index_base()
        } else {
            index
        }
    }

    /// Builds the step for a single bracketed number.
    ///
    /// JSON indexes into arrays. XML positions select within the sibling group
    /// produced by the previous step, like XPath's `item[2]`.
    fn index_step(&self, index: isize, pos: usize) -> Result<PathStep, QueryError> {
        match self.dialect {
            Dialect::Json => Ok(PathStep::IndexAccess(index)),
            Dialect::Xml if index >= 1 => Ok(PathStep::PositionFilter(Position::Index(
                (index - 1) as usize,
            ))),
            Dialect::Xml => Err(QueryError::parse(pos, "positions start at 1")),
        }
    }

    /// Parses `@key cmp literal`; JSONPath's `@.key` is accepted too.
    fn parse_predicate(&mut self) -> Result<Predicate, QueryError> {
        self.expect('@')?;
        if self.peek() == Some('.') {
            self.next();
        }
        let key = self.parse_identifier()?;
        self.skip_whitespace();
        let comparator = self.parse_comparator()?;
        self.skip_whitespace();
        let literal = self.parse_literal()?;
        Ok(Predicate {
            key,
            comparator,
            literal,
        })
    }

    fn parse_comparator(&mut self) -> Result<Comparator, QueryError> {
        let pos = self.position;
        let (comparator, width) = match (self.peek(), self.peek_at(1)) {
            (Some('='), Some('=')) => (Comparator::Eq, 2),
            (Some('!'), Some('=')) => (Comparator::NotEq, 2),
            (Some('>'), Some('=')) => (Comparator::Ge, 2),
            (Some('<'), Some('=')) => (Comparator::Le, 2),
            (Some('='), _) => (Comparator::Eq, 1),
            (Some('>'), _) => (Comparator::Gt, 1),
            (Some('<'), _) => (Comparator::Lt, 1),
            _ => {
                return Err(QueryError::parse(
                    pos,
                    "expected comparator (=, !=, >, <, >=, <=)",
                ))
            }
        };
        self.position += width;
        Ok(comparator)
    }

    /// Parses a quoted string or a bare token such as `42` or `true`.
    fn parse_literal(&mut self) -> Result<String, QueryError> {
        if matches!(self.peek(), Some('\'') | Some('"')) {
            return self.parse_quoted();
        }
        let start = self.position;
        let mut literal = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == ']' || ch == ')' {
                break;
            }
            literal.push(ch);
            self.next();
        }
        if literal.is_empty() {
            Err(QueryError::parse(start, "expected literal"))
        } else {
            Ok(literal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(query: &str) -> Vec<PathStep> {
        Parser::parse(query, Dialect::Json).unwrap().steps
    }

    fn xml(query: &str) -> Vec<PathStep> {
        Parser::parse(query, Dialect::Xml).unwrap().steps
    }

    fn child(name: &str) -> PathStep {
        PathStep::ChildByName(name.to_string())
    }

    #[test]
    fn test_parse_root() {
        assert_eq!(json("$"), vec![PathStep::Root]);
        assert_eq!(xml("/"), vec![PathStep::Root]);
    }

    #[test]
    fn test_parse_root_with_surrounding_whitespace() {
        for query in ["/ ", " / ", "$ ", " $"] {
            let path = Parser::parse(query, Dialect::Xml).unwrap();
            assert_eq!(path.steps, vec![PathStep::Root], "query {:?}", query);
        }
    }

    #[test]
    fn test_parse_child() {
        assert_eq!(json("$.store"), vec![PathStep::Root, child("store")]);
    }

    #[test]
    fn test_parse_nested_child() {
        assert_eq!(
            json("$.store.book"),
            vec![PathStep::Root, child("store"), child("book")]
        );
    }

    #[test]
    fn test_parse_fused_index() {
        assert_eq!(
            json("$.items[0]"),
            vec![PathStep::Root, child("items"), PathStep::IndexAccess(0)]
        );
    }

    #[test]
    fn test_parse_relative_path() {
        assert_eq!(json("store.book"), json("$.store.book"));
        assert_eq!(xml("root/item"), xml("/root/item"));
    }

    #[test]
    fn test_parse_wildcard() {
        assert_eq!(json("$.items[*]")[2], PathStep::ChildWildcard);
        assert_eq!(json("$.items.*")[2], PathStep::ChildWildcard);
        assert_eq!(xml("/root/*")[2], PathStep::ChildWildcard);
    }

    #[test]
    fn test_parse_recursive_descent_takes_rest() {
        assert_eq!(
            json("$..price"),
            vec![PathStep::Root, PathStep::RecursiveDescent(vec![child("price")])]
        );
        assert_eq!(
            json("$.store..book[0].title"),
            vec![
                PathStep::Root,
                child("store"),
                PathStep::RecursiveDescent(vec![
                    child("book"),
                    PathStep::IndexAccess(0),
                    child("title"),
                ]),
            ]
        );
    }

    #[test]
    fn test_parse_bare_recursive_descent() {
        assert_eq!(
            json("$.."),
            vec![PathStep::Root, PathStep::RecursiveDescent(vec![])]
        );
        assert_eq!(
            json("$..[1]"),
            vec![
                PathStep::Root,
                PathStep::RecursiveDescent(vec![PathStep::IndexAccess(1)]),
            ]
        );
    }

    #[test]
    fn test_parse_double_slash() {
        assert_eq!(
            xml("//item"),
            vec![PathStep::Root, PathStep::RecursiveDescent(vec![child("item")])]
        );
        assert_eq!(
            xml("/root//item/@id"),
            vec![
                PathStep::Root,
                child("root"),
                PathStep::RecursiveDescent(vec![
                    child("item"),
                    PathStep::AttributeAccess("id".to_string()),
                ]),
            ]
        );
    }

    #[test]
    fn test_parse_xml_positions_are_one_based() {
        assert_eq!(
            xml("/root/item[1]"),
            vec![
                PathStep::Root,
                child("root"),
                child("item"),
                PathStep::PositionFilter(Position::Index(0)),
            ]
        );
        assert!(Parser::parse("/root/item[0]", Dialect::Xml).is_err());
    }

    #[test]
    fn test_parse_last() {
        assert_eq!(
            xml("//item[last()]"),
            vec![
                PathStep::Root,
                PathStep::RecursiveDescent(vec![
                    child("item"),
                    PathStep::PositionFilter(Position::Last),
                ]),
            ]
        );
    }

    #[test]
    fn test_parse_attribute_and_text() {
        assert_eq!(
            xml("/root/@id"),
            vec![
                PathStep::Root,
                child("root"),
                PathStep::AttributeAccess("id".to_string()),
            ]
        );
        assert_eq!(
            xml("/root/item/text()"),
            vec![
                PathStep::Root,
                child("root"),
                child("item"),
                PathStep::TextSelector,
            ]
        );
        assert_eq!(
            xml("/root/comment()"),
            vec![PathStep::Root, child("root"), PathStep::CommentSelector]
        );
    }

    #[test]
    fn test_parse_unknown_function_fails() {
        assert!(Parser::parse("/root/node()", Dialect::Xml).is_err());
    }

    #[test]
    fn test_parse_empty_fails() {
        let err = Parser::parse("", Dialect::Json).unwrap_err();
        assert!(err.to_string().contains("empty path"));
        assert!(Parser::parse("   ", Dialect::Xml).is_err());
    }

    #[test]
    fn test_parse_negative_index() {
        assert_eq!(json("$.items[-1]")[2], PathStep::IndexAccess(-1));
    }

    #[test]
    fn test_parse_slices() {
        assert_eq!(json("$.items[1:3]")[2], PathStep::SliceAccess(Some(1), Some(3)));
        assert_eq!(json("$.items[2:]")[2], PathStep::SliceAccess(Some(2), None));
        assert_eq!(json("$.items[:5]")[2], PathStep::SliceAccess(None, Some(5)));
        assert_eq!(xml("/a/b[2:4]")[3], PathStep::SliceAccess(Some(1), Some(3)));
        assert!(Parser::parse("$.items[3:1]", Dialect::Json).is_err());
    }

    #[test]
    fn test_parse_multi_property() {
        assert_eq!(
            json("$.store['book','music']")[2],
            PathStep::MultiProperty(vec!["book".to_string(), "music".to_string()])
        );
    }

    #[test]
    fn test_parse_bracket_notation() {
        assert_eq!(
            json("$['store'][\"book\"]"),
            vec![PathStep::Root, child("store"), child("book")]
        );
        assert_eq!(json(r"$['it\'s']")[1], child("it's"));
    }

    #[test]
    fn test_parse_predicates() {
        assert_eq!(
            json("$.items[?(@price >= 10)]")[2],
            PathStep::PredicateFilter(Predicate::new("price", Comparator::Ge, "10"))
        );
        assert_eq!(
            json("$.items[?(@.name == 'Bob')]")[2],
            PathStep::PredicateFilter(Predicate::new("name", Comparator::Eq, "Bob"))
        );
        assert_eq!(
            xml(r#"//user[@active="true"]"#),
            vec![
                PathStep::Root,
                PathStep::RecursiveDescent(vec![
                    child("user"),
                    PathStep::PredicateFilter(Predicate::new("active", Comparator::Eq, "true")),
                ]),
            ]
        );
        assert_eq!(
            json("$.a[?(@b!=x)]")[2],
            PathStep::PredicateFilter(Predicate::new("b", Comparator::NotEq, "x"))
        );
    }

    #[test]
    fn test_parse_predicate_without_comparator_fails() {
        assert!(Parser::parse("$.a[?(@b)]", Dialect::Json).is_err());
    }

    #[test]
    fn test_parse_escaped_name() {
        assert_eq!(json(r"$.a\.b")[1], child("a.b"));
    }

    #[test]
    fn test_parse_unclosed_reports_open_position() {
        let err = Parser::parse("$.a[0", Dialect::Json).unwrap_err();
        assert_eq!(err.position(), Some(3));
        let err = Parser::parse("$.a[?(@b=1]", Dialect::Json).unwrap_err();
        assert!(matches!(err, QueryError::Parse { .. }));
    }

    #[test]
    fn test_parse_stray_closer_fails() {
        let err = Parser::parse("$.a]", Dialect::Json).unwrap_err();
        assert_eq!(err.position(), Some(3));
    }

    #[test]
    fn test_parse_whitespace_handling() {
        assert_eq!(
            json("$ . store [ 0 ]"),
            vec![PathStep::Root, child("store"), PathStep::IndexAccess(0)]
        );
    }
}
