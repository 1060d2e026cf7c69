//! Pattern matching for base58 public identifiers.
//!
//! A pattern constrains the start and/or the end of the identifier:
//! - Prefix: Match at the start
//! - Suffix: Match at the end
//! - Both: Match at either end

mod pattern;

pub use pattern::{MatchResult, PatternError, PatternType, SearchPattern, BASE58_ALPHABET};
