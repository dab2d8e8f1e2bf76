//! Accent folding shared by stored names and incoming queries.
//!
//! Every comparison the search engine makes goes through [`fold`], so a query
//! typed with or without accents lands on the same normalized form as the
//! stored name.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Lower-case `input` and strip its diacritics (`"Popayán"` -> `"popayan"`,
/// `"Ñuñoa"` -> `"nunoa"`, `"Güicán"` -> `"guican"`).
///
/// Deterministic and idempotent: `fold(fold(s)) == fold(s)`.
pub fn fold(input: &str) -> String {
    input
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Returns true when `input` is already in folded form.
pub fn is_folded(input: &str) -> bool {
    fold(input) == input
}
