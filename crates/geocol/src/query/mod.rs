//! Query validation and normalization.
//!
//! Every search starts here. A raw query is trimmed, checked for emptiness
//! and length, lower-cased and checked against the Spanish letter alphabet.
//! The accent-folded form that matching works on is derived with the same
//! [`fold`] that produced every stored `normalized_name`.

use geocol_data::fold;
use once_cell::sync::Lazy;
use regex::Regex;

pub use error::QueryError;
use error::Result;

/// Longest accepted query, in characters, after trimming.
pub const MAX_QUERY_CHARS: usize = 100;

static ALLOWED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑüÜ\s\-]+$").expect("query charset pattern is valid")
});

/// A validated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    raw: String,
    text: String,
    folded: String,
}

impl NormalizedQuery {
    /// The query exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed and lower-cased.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lower-cased with diacritics removed; what matching and scoring compare.
    pub fn folded(&self) -> &str {
        &self.folded
    }
}

impl std::fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Validate `raw` with the default length limit.
pub fn normalize(raw: &str) -> Result<NormalizedQuery> {
    normalize_with_limit(raw, MAX_QUERY_CHARS)
}

/// Validate `raw`, rejecting queries longer than `max_chars` characters.
///
/// Checks run in a fixed order: empty, too long, invalid characters.
pub fn normalize_with_limit(raw: &str, max_chars: usize) -> Result<NormalizedQuery> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(QueryError::EmptyQuery);
    }

    let length = trimmed.chars().count();
    if length > max_chars {
        return Err(QueryError::QueryTooLong {
            length,
            max: max_chars,
        });
    }

    let text = trimmed.to_lowercase();
    if !ALLOWED.is_match(&text) {
        return Err(QueryError::InvalidCharacters);
    }

    let folded = fold(&text);
    Ok(NormalizedQuery {
        raw: raw.to_string(),
        text,
        folded,
    })
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum QueryError {
        #[error("Query is empty")]
        EmptyQuery,
        #[error("Query is too long: {length} characters, at most {max} allowed")]
        QueryTooLong { length: usize, max: usize },
        #[error("Query may only contain letters, spaces and hyphens")]
        InvalidCharacters,
    }
    pub type Result<T> = std::result::Result<T, QueryError>;
}
