//! Trigram similarity over folded names.
//!
//! Trigrams follow the usual `pg_trgm` convention: the text is split into
//! alphanumeric words, each word is padded with two blanks in front and one
//! behind, and the similarity of two strings is the size of the intersection
//! of their trigram sets over the size of the union.

use ahash::AHashMap as HashMap;
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Three consecutive characters of a padded word.
pub type Trigram = [char; 3];

/// Sorted, de-duplicated trigram set of `text`.
pub fn trigrams(text: &str) -> Vec<Trigram> {
    let mut out = Vec::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = ['\u{20}', '\u{20}']
            .into_iter()
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once('\u{20}'))
            .collect();
        out.extend(padded.windows(3).map(|w| [w[0], w[1], w[2]]));
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// Number of shared trigrams between two sorted sets.
fn shared_count(a: &[Trigram], b: &[Trigram]) -> usize {
    let (mut i, mut j, mut shared) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared
}

fn ratio(shared: usize, a_len: usize, b_len: usize) -> f64 {
    let union = a_len + b_len - shared;
    if union == 0 {
        0.0
    } else {
        shared as f64 / union as f64
    }
}

/// Similarity of two sorted trigram sets, in `[0, 1]`.
pub fn set_similarity(a: &[Trigram], b: &[Trigram]) -> f64 {
    ratio(shared_count(a, b), a.len(), b.len())
}

/// Trigram similarity of two strings, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    set_similarity(&trigrams(a), &trigrams(b))
}

/// Inverted trigram index over the rows of one table.
///
/// Only rows sharing at least one trigram with the query can have a
/// non-zero similarity, so lookups touch the posting lists of the query's
/// trigrams instead of every row.
#[derive(Debug, Clone, Default)]
pub struct TrigramIndex {
    postings: HashMap<Trigram, Vec<u32>>,
    row_trigrams: Vec<Vec<Trigram>>,
}

impl TrigramIndex {
    #[instrument(
        name = "Build Trigram Index",
        skip_all,
        fields(rows = texts.len()),
        level = "debug"
    )]
    pub fn build<S: AsRef<str> + Sync>(texts: &[S]) -> Self {
        let row_trigrams: Vec<Vec<Trigram>> = texts
            .par_iter()
            .map(|text| trigrams(text.as_ref()))
            .collect();

        let mut postings: HashMap<Trigram, Vec<u32>> = HashMap::new();
        for (row, set) in row_trigrams.iter().enumerate() {
            for trigram in set {
                postings.entry(*trigram).or_default().push(row as u32);
            }
        }
        debug!(distinct_trigrams = postings.len(), "Trigram index built");

        Self {
            postings,
            row_trigrams,
        }
    }

    pub fn len(&self) -> usize {
        self.row_trigrams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_trigrams.is_empty()
    }

    /// Similarity between row `row` and an already computed query set.
    pub fn similarity_to(&self, row: usize, query: &[Trigram]) -> f64 {
        self.row_trigrams
            .get(row)
            .map_or(0.0, |set| set_similarity(set, query))
    }

    /// Rows whose similarity to `query` is strictly greater than `threshold`,
    /// with that similarity, in ascending row order.
    pub fn rows_above(&self, query: &[Trigram], threshold: f64) -> Vec<(usize, f64)> {
        let mut shared: HashMap<u32, usize> = HashMap::new();
        for trigram in query {
            if let Some(rows) = self.postings.get(trigram) {
                for &row in rows {
                    *shared.entry(row).or_default() += 1;
                }
            }
        }

        let mut hits: Vec<(usize, f64)> = shared
            .into_iter()
            .map(|(row, count)| {
                let row = row as usize;
                (row, ratio(count, self.row_trigrams[row].len(), query.len()))
            })
            .filter(|(_, sim)| *sim > threshold)
            .collect();
        hits.sort_unstable_by_key(|(row, _)| *row);
        hits
    }
}
