//! Pattern matching implementation.

use std::fmt;

/// Characters a base58 (bitcoin alphabet) identifier can contain.
pub const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Longest base58 encoding of a 32-byte public key.
const MAX_PATTERN_LEN: usize = 44;

/// Errors raised while building a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("{part} contains '{found}', which is not a base58 character")]
    InvalidCharacter { part: &'static str, found: char },

    #[error("{part} is {len} characters long, the maximum is 44")]
    TooLong { part: &'static str, len: usize },
}

/// The kind of constraint a pattern places on an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternType {
    /// Only a prefix is set
    Prefix,
    /// Only a suffix is set
    Suffix,
    /// Both are set; either end matching is enough
    PrefixOrSuffix,
    /// Nothing is set; nothing ever matches
    Unconstrained,
}

impl fmt::Display for PatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternType::Prefix => write!(f, "prefix"),
            PatternType::Suffix => write!(f, "suffix"),
            PatternType::PrefixOrSuffix => write!(f, "prefix|suffix"),
            PatternType::Unconstrained => write!(f, "unconstrained"),
        }
    }
}

/// Result of a pattern match operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// Full match found
    Match,
    /// No match
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// The prefix/suffix a search is looking for.
///
/// Empty parts are stored as `None` and mean "no constraint on that end".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPattern {
    prefix: Option<String>,
    suffix: Option<String>,
}

impl SearchPattern {
    /// Creates a pattern, validating both parts against the base58 alphabet.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Result<Self, PatternError> {
        Ok(Self {
            prefix: validate_part("prefix", prefix.into())?,
            suffix: validate_part("suffix", suffix.into())?,
        })
    }

    /// Creates a prefix-only pattern.
    pub fn prefix(prefix: impl Into<String>) -> Result<Self, PatternError> {
        Self::new(prefix, "")
    }

    /// Creates a suffix-only pattern.
    pub fn suffix(suffix: impl Into<String>) -> Result<Self, PatternError> {
        Self::new("", suffix)
    }

    /// Returns the prefix, if any.
    pub fn prefix_str(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the suffix, if any.
    pub fn suffix_str(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Returns the pattern type.
    pub fn pattern_type(&self) -> PatternType {
        match (&self.prefix, &self.suffix) {
            (Some(_), Some(_)) => PatternType::PrefixOrSuffix,
            (Some(_), None) => PatternType::Prefix,
            (None, Some(_)) => PatternType::Suffix,
            (None, None) => PatternType::Unconstrained,
        }
    }

    /// Returns true if no candidate can ever match.
    pub fn is_unconstrained(&self) -> bool {
        self.pattern_type() == PatternType::Unconstrained
    }

    /// Matches a public identifier against this pattern.
    ///
    /// With both parts set, a hit on either end is a match. Comparison is
    /// exact and case sensitive.
    #[inline]
    pub fn matches(&self, public_id: &str) -> MatchResult {
        let prefix_hit = self
            .prefix
            .as_deref()
            .is_some_and(|p| public_id.starts_with(p));
        let suffix_hit = self
            .suffix
            .as_deref()
            .is_some_and(|s| public_id.ends_with(s));

        if prefix_hit || suffix_hit {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Returns the expected number of attempts per match, assuming uniformly
    /// distributed base58 digits. Infinite for an unconstrained pattern.
    pub fn estimated_attempts(&self) -> f64 {
        let hit = |part: &Option<String>| {
            part.as_ref()
                .map_or(0.0, |p| 58f64.powi(-(p.chars().count() as i32)))
        };
        let (p, s) = (hit(&self.prefix), hit(&self.suffix));
        let probability = p + s - p * s;

        if probability > 0.0 {
            1.0 / probability
        } else {
            f64::INFINITY
        }
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        let attempts = self.estimated_attempts();
        if attempts.is_infinite() {
            return "Impossible (empty pattern never matches)".into();
        }
        match attempts as u64 {
            0..=100_000 => "Very Easy (< 1 second)".into(),
            100_001..=10_000_000 => "Easy (seconds)".into(),
            10_000_001..=1_000_000_000 => "Medium (minutes)".into(),
            1_000_000_001..=100_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl fmt::Display for SearchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}...{} ({})",
            self.prefix.as_deref().unwrap_or(""),
            self.suffix.as_deref().unwrap_or(""),
            self.pattern_type()
        )
    }
}

fn validate_part(part: &'static str, value: String) -> Result<Option<String>, PatternError> {
    if value.is_empty() {
        return Ok(None);
    }

    if let Some(found) = value.chars().find(|c| !BASE58_ALPHABET.contains(*c)) {
        return Err(PatternError::InvalidCharacter { part, found });
    }

    let len = value.chars().count();
    if len > MAX_PATTERN_LEN {
        return Err(PatternError::TooLong { part, len });
    }

    Ok(Some(value))
}
