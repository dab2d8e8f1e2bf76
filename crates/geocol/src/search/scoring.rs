use geocol_data::GeoEntity;
use regex::Regex;
use tracing::{instrument, trace};

use super::matcher::Candidate;
use crate::query::NormalizedQuery;

/// Weights of the composite score.
///
/// `score = positional bonus + similarity_weight * similarity + rank_weight * rank`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreParams {
    /// Bonus when the query appears as a whole word of the name (default: 10000)
    pub whole_word_bonus: f64,
    /// Bonus when the name equals the query (default: 5000)
    pub exact_bonus: f64,
    /// Bonus when the name starts with the query (default: 1000)
    pub prefix_bonus: f64,
    /// Multiplier for trigram similarity (default: 1000)
    pub similarity_weight: f64,
    /// Multiplier for the full-text cover-density rank (default: 100)
    pub rank_weight: f64,
}

impl Default for ScoreParams {
    fn default() -> Self {
        Self {
            whole_word_bonus: 10_000.0,
            exact_bonus: 5_000.0,
            prefix_bonus: 1_000.0,
            similarity_weight: 1_000.0,
            rank_weight: 100.0,
        }
    }
}

/// Where the query sits inside a name. Only the first tier that applies
/// counts, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionalTier {
    /// Query bounded by whitespace or the string edges
    WholeWord,
    /// Name equals the query
    Exact,
    /// Name starts with the query
    Prefix,
    None,
}

impl PositionalTier {
    pub fn bonus(self, params: &ScoreParams) -> f64 {
        match self {
            Self::WholeWord => params.whole_word_bonus,
            Self::Exact => params.exact_bonus,
            Self::Prefix => params.prefix_bonus,
            Self::None => 0.0,
        }
    }
}

/// Classifies folded names against one folded query.
#[derive(Debug, Clone)]
pub struct PositionalMatcher {
    query: String,
    whole_word: Regex,
}

impl PositionalMatcher {
    /// The query is escaped before it goes into the pattern, so any input
    /// matches literally. Only whitespace counts as a word separator.
    pub fn new(folded_query: &str) -> Result<Self, regex::Error> {
        let whole_word = Regex::new(&format!(
            r"(^|\s){}(\s|$)",
            regex::escape(folded_query)
        ))?;
        Ok(Self {
            query: folded_query.to_string(),
            whole_word,
        })
    }

    pub fn tier(&self, folded_name: &str) -> PositionalTier {
        if self.whole_word.is_match(folded_name) {
            PositionalTier::WholeWord
        } else if folded_name == self.query {
            // unreachable for non-empty queries: equality implies a whole word
            PositionalTier::Exact
        } else if folded_name.starts_with(&self.query) {
            PositionalTier::Prefix
        } else {
            PositionalTier::None
        }
    }
}

/// A candidate with its composite score and the signals that produced it.
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub entity: &'a GeoEntity,
    pub score: f64,
    pub tier: PositionalTier,
    pub similarity: f64,
    pub rank: f64,
}

impl ScoredCandidate<'_> {
    pub fn id(&self) -> u32 {
        self.entity.id()
    }

    pub fn name(&self) -> &str {
        self.entity.name()
    }
}

pub fn score_candidate<'a>(
    candidate: &Candidate<'a>,
    matcher: &PositionalMatcher,
    params: &ScoreParams,
) -> ScoredCandidate<'a> {
    let tier = matcher.tier(candidate.entity.normalized_name());
    let rank = if candidate.full_text { candidate.rank } else { 0.0 };
    let score = tier.bonus(params)
        + params.similarity_weight * candidate.similarity
        + params.rank_weight * rank;
    ScoredCandidate {
        entity: candidate.entity,
        score,
        tier,
        similarity: candidate.similarity,
        rank,
    }
}

/// Score every candidate and sort: score descending, then id ascending.
#[instrument(
    name = "Score Candidates",
    level = "trace",
    skip_all,
    fields(query = query.folded(), candidates = candidates.len())
)]
pub fn rank_candidates<'a>(
    candidates: &[Candidate<'a>],
    query: &NormalizedQuery,
    params: &ScoreParams,
) -> Result<Vec<ScoredCandidate<'a>>, regex::Error> {
    let matcher = PositionalMatcher::new(query.folded())?;
    let mut scored: Vec<ScoredCandidate<'a>> = candidates
        .iter()
        .map(|c| score_candidate(c, &matcher, params))
        .collect();
    sort_scored(&mut scored);
    trace!(top = ?scored.first().map(|s| (s.entity.name(), s.score)), "Candidates scored");
    Ok(scored)
}

pub fn sort_scored(scored: &mut [ScoredCandidate<'_>]) {
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.entity.id().cmp(&b.entity.id()))
    });
}
