//! Prerequisite expressions.
//!
//! A prerequisite is a boolean expression tree over course codes:
//! `And` requires every child, `Or` requires at least one, and a `Course`
//! leaf is satisfied when the student has completed that course.
//! Trees are stored by value per course; cross-course chains are resolved
//! through the catalog index, never through pointers.
//!
//! # Compact Syntax
//!
//! `PrereqExpr` parses from a compact text form where `AND` binds tighter
//! than `OR` and parentheses group:
//!
//! ```
//! use u_courseplan::models::PrereqExpr;
//!
//! let expr: PrereqExpr = "CS010 and (MATH009A or MATH09HC)".parse().unwrap();
//! assert_eq!(expr.to_string(), "CS010 AND (MATH009A OR MATH09HC)");
//! assert!(expr.is_satisfied_by(|c| c == "CS010" || c == "MATH09HC"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A boolean prerequisite expression over course codes.
///
/// Empty `And`/`Or` groups impose no requirement, exactly like `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrereqExpr {
    /// No prerequisite.
    #[default]
    None,
    /// Completion of a single course.
    Course(String),
    /// Every child must hold.
    And(Vec<PrereqExpr>),
    /// At least one child must hold.
    Or(Vec<PrereqExpr>),
}

/// Error parsing a compact prerequisite expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrereqParseError {
    #[error("unexpected token '{token}' at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParen { position: usize },
}

impl PrereqExpr {
    /// Single-course leaf. Codes are upper-cased.
    pub fn course(code: impl Into<String>) -> Self {
        PrereqExpr::Course(code.into().trim().to_uppercase())
    }

    /// Conjunction of `children`, flattening nested `And`s and dropping
    /// empty children. Collapses to the lone child when only one remains.
    pub fn all(children: impl IntoIterator<Item = PrereqExpr>) -> Self {
        let mut flat = Vec::new();
        for child in children {
            match child {
                PrereqExpr::And(inner) => flat.extend(inner.into_iter().filter(|c| !c.is_empty())),
                other if other.is_empty() => {}
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => PrereqExpr::None,
            1 => flat.pop().unwrap_or_default(),
            _ => PrereqExpr::And(flat),
        }
    }

    /// Disjunction of `children`, flattening nested `Or`s.
    ///
    /// An empty alternative makes the whole disjunction trivially
    /// satisfiable, so it collapses to `None`.
    pub fn any(children: impl IntoIterator<Item = PrereqExpr>) -> Self {
        let mut flat = Vec::new();
        for child in children {
            match child {
                PrereqExpr::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.is_empty() || flat.iter().any(PrereqExpr::is_empty) {
            return PrereqExpr::None;
        }
        match flat.len() {
            1 => flat.pop().unwrap_or_default(),
            _ => PrereqExpr::Or(flat),
        }
    }

    /// Whether the expression imposes no requirement.
    pub fn is_empty(&self) -> bool {
        match self {
            PrereqExpr::None => true,
            PrereqExpr::Course(_) => false,
            PrereqExpr::And(children) => children.iter().all(PrereqExpr::is_empty),
            PrereqExpr::Or(children) => {
                children.is_empty() || children.iter().any(PrereqExpr::is_empty)
            }
        }
    }

    /// Evaluates the expression; `has` reports whether a course is completed.
    ///
    /// Runs in O(size of expression).
    pub fn is_satisfied_by<F>(&self, has: F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        self.eval(&has)
    }

    fn eval<F>(&self, has: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            PrereqExpr::None => true,
            PrereqExpr::Course(code) => has(code.as_str()),
            PrereqExpr::And(children) => children.iter().all(|c| c.eval(has)),
            PrereqExpr::Or(children) => children.is_empty() || children.iter().any(|c| c.eval(has)),
        }
    }

    /// Leaf course codes blocking satisfaction.
    ///
    /// For `Or` nodes only the alternative with the fewest missing courses
    /// is reported. Returns an empty list when the expression holds.
    pub fn missing<F>(&self, has: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut out = self.collect_missing(&has);
        out.sort();
        out.dedup();
        out
    }

    fn collect_missing<F>(&self, has: &F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        match self {
            PrereqExpr::None => Vec::new(),
            PrereqExpr::Course(code) => {
                if has(code.as_str()) {
                    Vec::new()
                } else {
                    vec![code.clone()]
                }
            }
            PrereqExpr::And(children) => children
                .iter()
                .flat_map(|c| c.collect_missing(has))
                .collect(),
            PrereqExpr::Or(children) => {
                if self.eval(has) {
                    return Vec::new();
                }
                children
                    .iter()
                    .map(|c| c.collect_missing(has))
                    .min_by_key(|m| m.len())
                    .unwrap_or_default()
            }
        }
    }

    /// All course codes referenced by leaves.
    pub fn course_codes(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_codes(&mut out);
        out
    }

    fn collect_codes<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            PrereqExpr::None => {}
            PrereqExpr::Course(code) => {
                out.insert(code.as_str());
            }
            PrereqExpr::And(children) | PrereqExpr::Or(children) => {
                for c in children {
                    c.collect_codes(out);
                }
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            PrereqExpr::None => 0,
            PrereqExpr::Course(_) => 1,
            PrereqExpr::And(children) | PrereqExpr::Or(children) => {
                1 + children.iter().map(PrereqExpr::size).sum::<usize>()
            }
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, parent_is_and: bool) -> fmt::Result {
        match self {
            PrereqExpr::None => write!(f, "none"),
            PrereqExpr::Course(code) => write!(f, "{code}"),
            PrereqExpr::And(children) => write_joined(f, children, " AND ", true),
            PrereqExpr::Or(children) => {
                if parent_is_and {
                    write!(f, "(")?;
                    write_joined(f, children, " OR ", false)?;
                    write!(f, ")")
                } else {
                    write_joined(f, children, " OR ", false)
                }
            }
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    children: &[PrereqExpr],
    sep: &str,
    is_and: bool,
) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        // A nested And inside an And never occurs after flattening, but a
        // hand-built tree may still contain one; parenthesize to be exact.
        if is_and && matches!(child, PrereqExpr::And(_)) {
            write!(f, "(")?;
            child.fmt_nested(f, false)?;
            write!(f, ")")?;
        } else {
            child.fmt_nested(f, is_and)?;
        }
    }
    Ok(())
}

impl fmt::Display for PrereqExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, false)
    }
}

// ======================== Compact syntax parser ========================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Code(String),
    And,
    Or,
    Open,
    Close,
}

fn tokenize(input: &str) -> Vec<(Token, usize)> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some(&(pos, ch)) = chars.peek() {
        if ch.is_whitespace() || ch == ',' {
            chars.next();
        } else if ch == '(' {
            tokens.push((Token::Open, pos));
            chars.next();
        } else if ch == ')' {
            tokens.push((Token::Close, pos));
            chars.next();
        } else if ch == '&' {
            tokens.push((Token::And, pos));
            chars.next();
        } else if ch == '|' {
            tokens.push((Token::Or, pos));
            chars.next();
        } else {
            let mut word = String::new();
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() || matches!(c, '(' | ')' | '&' | '|' | ',') {
                    break;
                }
                word.push(c);
                chars.next();
            }
            let token = match word.to_ascii_uppercase().as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                upper => Token::Code(upper.to_string()),
            };
            tokens.push((token, pos));
        }
    }
    tokens
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, p)| *p).unwrap_or(0)
    }

    fn unexpected(&self) -> PrereqParseError {
        match self.tokens.get(self.pos) {
            Some((token, position)) => PrereqParseError::UnexpectedToken {
                token: format!("{token:?}"),
                position: *position,
            },
            None => PrereqParseError::UnexpectedEnd,
        }
    }

    fn expr(&mut self) -> Result<PrereqExpr, PrereqParseError> {
        let mut alternatives = vec![self.term()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            alternatives.push(self.term()?);
        }
        Ok(PrereqExpr::any(alternatives))
    }

    fn term(&mut self) -> Result<PrereqExpr, PrereqParseError> {
        let mut required = vec![self.factor()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            required.push(self.factor()?);
        }
        Ok(PrereqExpr::all(required))
    }

    fn factor(&mut self) -> Result<PrereqExpr, PrereqParseError> {
        match self.peek().cloned() {
            Some(Token::Code(code)) => {
                self.pos += 1;
                Ok(PrereqExpr::Course(code))
            }
            Some(Token::Open) => {
                let open_at = self.position();
                self.pos += 1;
                let inner = self.expr()?;
                if self.peek() != Some(&Token::Close) {
                    return Err(PrereqParseError::UnbalancedParen { position: open_at });
                }
                self.pos += 1;
                Ok(inner)
            }
            _ => Err(self.unexpected()),
        }
    }
}

impl FromStr for PrereqExpr {
    type Err = PrereqParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(PrereqExpr::None);
        }
        let mut parser = Parser {
            tokens: tokenize(trimmed),
            pos: 0,
        };
        let expr = parser.expr()?;
        if parser.pos < parser.tokens.len() {
            if parser.peek() == Some(&Token::Close) {
                return Err(PrereqParseError::UnbalancedParen {
                    position: parser.position(),
                });
            }
            return Err(parser.unexpected());
        }
        Ok(expr)
    }
}
