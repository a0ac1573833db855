//! Pre-flight syntax check for path expressions.
//!
//! The validator runs before the parser and only guarantees that parsing will
//! not trip over unbalanced brackets, a stray closing token or an illegal first
//! character. It does not build steps and says nothing about whether the
//! expression is meaningful for a given document.

use super::error::QueryError;
use serde::Serialize;

/// Outcome of [`Validator::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

pub struct Validator;

impl Validator {
    /// Checks an expression, reporting the first problem found.
    pub fn validate(expr: &str) -> Validation {
        match Self::check(expr) {
            Ok(()) => Validation {
                is_valid: true,
                error: None,
            },
            Err(error) => Validation {
                is_valid: false,
                error: Some(error),
            },
        }
    }

    /// Like [`validate`](Self::validate), as a `Result`.
    pub fn check(expr: &str) -> Result<(), QueryError> {
        let Some((first_pos, first)) = expr.chars().enumerate().find(|(_, ch)| !ch.is_whitespace())
        else {
            return Err(QueryError::validation(0, "empty path"));
        };

        if !is_legal_start(first) {
            return Err(QueryError::validation(
                first_pos,
                format!("path cannot start with '{}'", first),
            ));
        }

        // Open brackets and parens with their positions
        let mut open: Vec<(char, usize)> = Vec::new();
        // Quote character and start position of the literal being scanned
        let mut in_string: Option<(char, usize)> = None;
        let mut escaped = false;

        for (pos, ch) in expr.chars().enumerate() {
            if let Some((quote, _)) = in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    in_string = None;
                }
                continue;
            }

            match ch {
                '\'' | '"' => in_string = Some((ch, pos)),
                '[' | '(' => open.push((ch, pos)),
                ']' | ')' => {
                    let expected = if ch == ']' { '[' } else { '(' };
                    match open.pop() {
                        Some((opener, _)) if opener == expected => {}
                        Some((opener, opened_at)) => {
                            return Err(QueryError::validation(
                                pos,
                                format!(
                                    "'{}' does not close '{}' opened at position {}",
                                    ch, opener, opened_at
                                ),
                            ))
                        }
                        None => {
                            return Err(QueryError::validation(pos, format!("unmatched '{}'", ch)))
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some((quote, start)) = in_string {
            return Err(QueryError::validation(
                start,
                format!("unterminated string starting with {}", quote),
            ));
        }
        if let Some((opener, pos)) = open.pop() {
            return Err(QueryError::validation(pos, format!("unclosed '{}'", opener)));
        }
        Ok(())
    }
}

fn is_legal_start(ch: char) -> bool {
    matches!(ch, '$' | '/' | '@' | '*') || ch.is_alphabetic() || ch == '_'
}
