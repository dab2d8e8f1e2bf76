//! The search pipeline: normalize, match, score, sort, limit.

use std::time::{Duration, Instant};

use geocol_data::EntityKind;
use tracing::{debug, instrument, warn};

use super::{
    Result, SearchError, SourceError,
    matcher::CandidateSource,
    scoring::{ScoreParams, ScoredCandidate, rank_candidates},
};
use crate::SearchConfigBuilder;
use crate::query::{NormalizedQuery, normalize_with_limit};

/// Configuration for hybrid name searches.
///
/// Use [`SearchConfigBuilder`] for presets and validated construction.
///
/// ```rust
/// use geocol::SearchConfig;
///
/// let config = SearchConfig::builder().limit(10).build().unwrap();
/// assert_eq!(config.limit, 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    /// Maximum number of results to return
    pub limit: usize,
    /// Trigram similarity a name must exceed to match on similarity alone
    pub similarity_threshold: f64,
    /// Longest accepted query, in characters
    pub max_query_chars: usize,
    /// Weights of the composite score
    pub score_params: ScoreParams,
    /// Abandon the search when the candidate read takes longer than this
    pub timeout: Option<Duration>,
    /// Lifetime of cached search results, when the searcher has a cache
    pub cache_ttl: Duration,
}

impl SearchConfig {
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }

    /// Compact encoding of every setting that shapes search results. Equal
    /// fingerprints mean equal results for the same query.
    pub fn fingerprint(&self) -> String {
        let p = &self.score_params;
        format!(
            "{}:{}:{:x}:{:x}:{:x}:{:x}:{:x}:{:x}",
            self.limit,
            self.max_query_chars,
            self.similarity_threshold.to_bits(),
            p.whole_word_bonus.to_bits(),
            p.exact_bonus.to_bits(),
            p.prefix_bonus.to_bits(),
            p.similarity_weight.to_bits(),
            p.rank_weight.to_bits(),
        )
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 30,
            similarity_threshold: 0.3,
            max_query_chars: crate::query::MAX_QUERY_CHARS,
            score_params: ScoreParams::default(),
            timeout: None,
            cache_ttl: Duration::from_secs(12 * 60 * 60),
        }
    }
}

/// Keep the first `limit` entries. An empty input stays empty.
pub fn limit_results<T>(mut results: Vec<T>, limit: usize) -> Vec<T> {
    results.truncate(limit);
    results
}

/// Rank the candidates of an already validated query.
///
/// Returns an empty list when nothing matches; callers decide whether that
/// is an error.
#[instrument(
    name = "Rank Query",
    level = "debug",
    skip(source, config),
    fields(query = query.folded())
)]
pub fn rank_query<'a, S>(
    source: &'a S,
    kind: EntityKind,
    query: &NormalizedQuery,
    config: &SearchConfig,
) -> Result<Vec<ScoredCandidate<'a>>>
where
    S: CandidateSource + ?Sized,
{
    let t_search = Instant::now();
    let candidates = source.candidates(kind, query, config.similarity_threshold)?;

    let elapsed = t_search.elapsed();
    if let Some(timeout) = config.timeout
        && elapsed > timeout
    {
        warn!(?elapsed, ?timeout, "Candidate read exceeded the search timeout");
        return Err(SourceError::Timeout(elapsed).into());
    }

    let scored = rank_candidates(&candidates, query, &config.score_params)
        .map_err(|e| SearchError::Other(e.into()))?;
    let results = limit_results(scored, config.limit);
    debug!(
        candidates = candidates.len(),
        returned = results.len(),
        elapsed = ?t_search.elapsed(),
        "Search complete"
    );
    Ok(results)
}

/// Validate `raw` and rank its matches among entities of `kind`.
///
/// Fails with [`SearchError::NotFound`] when the query is valid but nothing
/// matches.
pub fn hybrid_search_inner<'a, S>(
    source: &'a S,
    kind: EntityKind,
    raw: &str,
    config: &SearchConfig,
) -> Result<Vec<ScoredCandidate<'a>>>
where
    S: CandidateSource + ?Sized,
{
    let query = normalize_with_limit(raw, config.max_query_chars)?;
    let results = rank_query(source, kind, &query, config)?;
    if results.is_empty() {
        return Err(SearchError::NotFound {
            kind,
            query: query.text().to_string(),
        });
    }
    Ok(results)
}
