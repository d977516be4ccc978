//! Date parsing for the front-matter `date` field.
//!
//! A [`DateFormat`] is a `chrono` strftime pattern in which bracketed sections
//! are optional, e.g. `%Y-%m-%d[ %H:%M[:%S]][ %z]` accepts `2024-08-27`,
//! `2024-08-27 10:30` and `2024-08-27 10:30:00 +0200`. Dates without an offset
//! are taken to be in the local time zone; dates without a time are taken to
//! be at midnight.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::collections::HashSet;
use std::fmt;

/// The format of [`iso_local`] output (`2024-08-27T10:30:00`).
const ISO_LOCAL_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A parsed date pattern. See the module docs for the syntax.
#[derive(Clone, Debug)]
pub struct DateFormat {
    pattern: String,

    /// Every expansion of the optional sections, longest first.
    candidates: Vec<String>,
}

impl DateFormat {
    pub fn new(pattern: &str) -> Result<DateFormat> {
        let mut chars = pattern.chars();
        let segments = parse_segments(&mut chars, false)
            .ok_or_else(|| Error::Pattern(pattern.to_owned()))?;
        let mut candidates = expand(&segments);
        candidates.sort_by(|a, b| b.len().cmp(&a.len()));
        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.clone()));
        Ok(DateFormat {
            pattern: pattern.to_owned(),
            candidates,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parses `value` against each expansion in turn. Each expansion is tried
    /// as a date-time with offset, then as a local date-time, then as a bare
    /// date.
    pub fn parse(&self, value: &str) -> Result<DateTime<FixedOffset>> {
        let value = value.trim();
        for candidate in &self.candidates {
            if let Ok(date) = DateTime::parse_from_str(value, candidate) {
                return Ok(date);
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, candidate) {
                return self.localize(value, &naive);
            }
            if let Ok(date) = NaiveDate::parse_from_str(value, candidate) {
                if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                    return self.localize(value, &naive);
                }
            }
        }
        Err(self.mismatch(value))
    }

    fn localize(
        &self,
        value: &str,
        naive: &NaiveDateTime,
    ) -> Result<DateTime<FixedOffset>> {
        match Local.from_local_datetime(naive).earliest() {
            Some(local) => Ok(local.with_timezone(local.offset())),
            None => Err(self.mismatch(value)),
        }
    }

    fn mismatch(&self, value: &str) -> Error {
        Error::Mismatch {
            value: value.to_owned(),
            pattern: self.pattern.clone(),
        }
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        DateFormat::new(DEFAULT_DATE_FORMAT).expect("default date pattern is balanced")
    }
}

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d[ %H:%M[:%S]][ %z]";

/// Formats the wall-clock part of `date` as an ISO-8601 local date-time.
pub fn iso_local(date: &DateTime<FixedOffset>) -> String {
    date.naive_local().format(ISO_LOCAL_DATE_TIME).to_string()
}

/// Reads back a value written by [`iso_local`]. A bare `YYYY-MM-DD` date is
/// accepted as well.
pub fn parse_iso_local(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, ISO_LOCAL_DATE_TIME)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

enum Segment {
    Literal(String),
    Optional(Vec<Segment>),
}

// Returns `None` on unbalanced brackets.
fn parse_segments(
    chars: &mut std::str::Chars<'_>,
    nested: bool,
) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    while let Some(c) = chars.next() {
        match c {
            '[' => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Optional(parse_segments(chars, true)?));
            }
            ']' if nested => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(literal));
                }
                return Some(segments);
            }
            ']' => return None,
            c => literal.push(c),
        }
    }
    if nested {
        return None;
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Some(segments)
}

fn expand(segments: &[Segment]) -> Vec<String> {
    let mut out = vec![String::new()];
    for segment in segments {
        out = match segment {
            Segment::Literal(s) => {
                out.into_iter().map(|prefix| prefix + s).collect()
            }
            Segment::Optional(inner) => {
                let tails = expand(inner);
                let mut next = Vec::with_capacity(out.len() * (tails.len() + 1));
                for prefix in &out {
                    for tail in &tails {
                        next.push(format!("{}{}", prefix, tail));
                    }
                    next.push(prefix.clone());
                }
                next
            }
        };
    }
    out
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem with a date or a date pattern.
#[derive(Debug, PartialEq)]
pub enum Error {
    /// Returned when a date pattern has unbalanced optional-section brackets.
    Pattern(String),

    /// Returned when a date value matches none of the pattern's expansions.
    Mismatch { value: String, pattern: String },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Pattern(pattern) => {
                write!(f, "Invalid date pattern `{}`: unbalanced brackets", pattern)
            }
            Error::Mismatch { value, pattern } => write!(
                f,
                "Date `{}` does not match pattern `{}`",
                value, pattern
            ),
        }
    }
}

impl std::error::Error for Error {}
