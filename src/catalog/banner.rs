//! Helpers for registrar (Banner) section data.
//!
//! Ingest happens outside this crate; these functions convert the few
//! registrar text formats that upstream cleaning leaves untouched into
//! domain values.
//!
//! # Prerequisite Text
//!
//! Registrar prerequisites are a flat sequence of parenthesized groups
//! joined by `and` / `or`:
//!
//! ```text
//! ( Course or Test: Computer Science 010C
//!   Minimum Grade of C-
//!   May not be taken concurrently. )
//! and
//! ( Course or Test: Mathematics 009C ... )
//! or
//! ( Course or Test: Mathematics 09HC ... )
//! ```
//!
//! A group joined by `or` is an alternative of its neighbour, so the
//! example reads `CS010C AND (MATH009C OR MATH09HC)`. Minimum grades and
//! concurrency notes are dropped.

use thiserror::Error;

use crate::models::{Day, MeetingBlock, PrereqExpr, Units, MINUTES_PER_DAY};

/// Error converting registrar meeting fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BannerError {
    #[error("unknown day letter '{0}'")]
    InvalidDay(char),
    #[error("invalid HHMM time '{0}'")]
    InvalidTime(String),
}

const SUBJECT_CODES: &[(&str, &str)] = &[
    ("computer science", "CS"),
    ("mathematics", "MATH"),
    ("physics", "PHYS"),
    ("chemistry", "CHEM"),
    ("biology", "BIOL"),
    ("statistics", "STAT"),
    ("english", "ENGL"),
    ("engineering", "ENGR"),
    ("business", "BUS"),
    ("economics", "ECON"),
];

/// Maps a subject name to its code (`"Computer Science"` → `"CS"`).
///
/// Unknown names are upper-cased with spaces removed.
pub fn subject_code(name: &str) -> String {
    let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
    SUBJECT_CODES
        .iter()
        .find(|(full, _)| full.eq_ignore_ascii_case(&normalized))
        .map(|(_, code)| (*code).to_string())
        .unwrap_or_else(|| normalized.replace(' ', "").to_uppercase())
}

/// Converts registrar prerequisite text into an expression.
///
/// Text before the first group (such as a `Prerequisites:` header) is
/// ignored, as are groups that name no course (placement tests).
///
/// ```
/// use u_courseplan::catalog::banner::parse_prerequisites;
///
/// let text = "( Course or Test: Computer Science 010C Minimum Grade of C- )
///             and ( Course or Test: Mathematics 009C Minimum Grade of D- )
///             or ( Course or Test: Mathematics 09HC Minimum Grade of D- )";
/// assert_eq!(parse_prerequisites(text).to_string(), "CS010C AND (MATH009C OR MATH09HC)");
/// ```
pub fn parse_prerequisites(text: &str) -> PrereqExpr {
    let mut clauses: Vec<Vec<PrereqExpr>> = vec![Vec::new()];
    let mut rest = text;
    let mut first = true;

    while let Some(open) = rest.find('(') {
        let connector = rest[..open].trim().to_ascii_lowercase();
        let Some(len) = rest[open..].find(')') else {
            break;
        };
        let body = &rest[open + 1..open + len];
        rest = &rest[open + len + 1..];

        if !first && connector != "or" {
            clauses.push(Vec::new());
        }
        first = false;

        if let Some(code) = group_course_code(body) {
            if let Some(clause) = clauses.last_mut() {
                clause.push(PrereqExpr::Course(code));
            }
        }
    }

    PrereqExpr::all(
        clauses
            .into_iter()
            .filter(|alternatives| !alternatives.is_empty())
            .map(PrereqExpr::any),
    )
}

/// Course code named by one group, e.g. `"CS010C"`.
fn group_course_code(body: &str) -> Option<String> {
    let lower = body.to_ascii_lowercase();
    let marker = ["course or test:", "course:"]
        .iter()
        .find_map(|m| lower.find(m).map(|at| at + m.len()))?;

    let mut subject = Vec::new();
    for word in body[marker..].split_whitespace() {
        if word.chars().any(|c| c.is_ascii_digit()) {
            if subject.is_empty() {
                return None;
            }
            let number: String = word.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
            return Some(format!("{}{}", subject_code(&subject.join(" ")), number.to_uppercase()));
        }
        subject.push(word);
    }
    None
}

/// Parses a registrar `HHMM` time into minutes after midnight.
pub fn parse_hhmm(time: &str) -> Result<u16, BannerError> {
    let t = time.trim();
    let invalid = || BannerError::InvalidTime(time.to_string());
    if t.len() != 4 || !t.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: u16 = t[..2].parse().map_err(|_| invalid())?;
    let minutes: u16 = t[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 || hours * 60 + minutes > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

/// Builds one block per day letter (`M T W R F S U`) for the given times.
///
/// ```
/// use u_courseplan::catalog::banner::meeting_blocks;
/// use u_courseplan::models::Day;
///
/// let blocks = meeting_blocks("TR", "1000", "1115").unwrap();
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(blocks[1].day, Day::Thu);
/// ```
pub fn meeting_blocks(days: &str, begin: &str, end: &str) -> Result<Vec<MeetingBlock>, BannerError> {
    let start = parse_hhmm(begin)?;
    let finish = parse_hhmm(end)?;
    let mut blocks = days
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            Day::from_letter(c)
                .map(|day| MeetingBlock::new(day, start, finish))
                .ok_or(BannerError::InvalidDay(c))
        })
        .collect::<Result<Vec<_>, _>>()?;
    blocks.sort();
    blocks.dedup();
    Ok(blocks)
}

/// Credit units from registrar low/high credit hours.
///
/// Variable-credit sections report a range; the high value is used. Returns
/// `None` when neither bound is a positive number ("TBD").
pub fn credit_units(low: Option<f64>, high: Option<f64>) -> Option<Units> {
    high.filter(|h| *h > 0.0)
        .or_else(|| low.filter(|l| *l > 0.0))
        .and_then(Units::from_f64)
}
