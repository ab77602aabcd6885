// appstrap - core/matcher.rs
//
// Field matchers and interval checks for filter rules.
// Core layer: pure logic, no I/O.

use crate::util::error::FilterError;
use regex::Regex;

// =============================================================================
// Matcher
// =============================================================================

/// A single field condition: either an exact literal or a compiled pattern.
///
/// Pattern matches anchor at the start of the field's string form — a match
/// elsewhere in the string does not count. Literals compare for exact
/// equality. Both operate on the string-coerced field value, so numeric
/// fields can be matched with either kind.
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(String),
    Pattern(Regex),
}

impl Matcher {
    /// A literal matcher comparing for exact string equality.
    pub fn literal(value: impl Into<String>) -> Matcher {
        Matcher::Literal(value.into())
    }

    /// A pattern matcher from a regex source string.
    /// Returns an error if the pattern is invalid.
    pub fn pattern(pattern: &str) -> Result<Matcher, FilterError> {
        let regex = Regex::new(pattern).map_err(|e| FilterError::InvalidRegex {
            pattern: pattern.to_string(),
            source: e,
        })?;
        Ok(Matcher::Pattern(regex))
    }

    /// Checks the condition against a field value.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Literal(literal) => literal == value,
            // Leftmost match starting at 0 is exactly anchored-at-start
            // semantics: any later match means no match exists at the start.
            Matcher::Pattern(regex) => regex.find(value).is_some_and(|m| m.start() == 0),
        }
    }
}

// =============================================================================
// Interval
// =============================================================================

/// An inclusive numeric interval used by the time-valued pseudo-fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub low: f64,
    pub high: f64,
}

impl Interval {
    pub fn new(low: f64, high: f64) -> Interval {
        Interval { low, high }
    }

    /// True when `value` lies within `[low, high]`, bounds included.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}
