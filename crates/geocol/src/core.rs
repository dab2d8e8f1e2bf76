//! The [`GeoSearcher`] facade.
//!
//! ```rust
//! use geocol::{EntityKind, GeoSearcher, data_processing::TestDataConfig};
//!
//! let searcher = GeoSearcher::from_test_data(&TestDataConfig::minimal())?;
//! let found = searcher.search(EntityKind::Municipality, "cali")?;
//! assert_eq!(found[0].name(), "Cali");
//! # Ok::<(), geocol::error::GeoColError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use geocol_data::{EntityKind, GeoEntity, SubdivisionData, TestDataConfig, create_test_data};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::{
    cache::{CacheOutcome, CachedRead, MokaStore},
    corpus::{LocationCorpus, LookupError},
    error::GeoColError,
    query::{NormalizedQuery, normalize_with_limit},
    search::{ScoredCandidate, SearchConfig, SearchError, hybrid_search_inner, rank_query},
};

/// Search and lookups over Colombia's subdivisions.
///
/// Cheap to clone: the corpus and the cache are shared.
#[derive(Debug, Clone)]
pub struct GeoSearcher {
    corpus: Arc<LocationCorpus>,
    config: SearchConfig,
    cache: Option<CachedRead<Vec<GeoEntity>>>,
}

impl GeoSearcher {
    pub fn new(corpus: LocationCorpus) -> Self {
        Self {
            corpus: Arc::new(corpus),
            config: SearchConfig::default(),
            cache: None,
        }
    }

    /// Index already loaded subdivision data.
    pub fn from_data(data: SubdivisionData) -> Result<Self, GeoColError> {
        Ok(Self::new(LocationCorpus::from_data(data)?))
    }

    /// Load the six tables from `dir` and index them.
    #[instrument(
        name = "Create GeoSearcher",
        level = "info",
        skip_all,
        fields(dir = %dir.as_ref().display())
    )]
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, GeoColError> {
        let t_init = std::time::Instant::now();
        let searcher = Self::from_data(SubdivisionData::from_dir(dir)?)?;
        info!(
            entities = searcher.corpus.len(),
            elapsed_seconds = ?t_init.elapsed(),
            "GeoSearcher ready"
        );
        Ok(searcher)
    }

    /// Load from the configured data directory (`GEOCOL_DATA_DIR`).
    pub fn initialize() -> Result<Self, GeoColError> {
        Self::from_dir(geocol_data::get_data_dir())
    }

    /// Build from generated sample tables. The temporary files are gone once
    /// this returns; the searcher keeps everything in memory.
    pub fn from_test_data(config: &TestDataConfig) -> Result<Self, GeoColError> {
        let test_data = create_test_data(config)?;
        Self::from_dir(test_data.path())
    }

    /// Replace the default search configuration.
    #[must_use]
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Cache search results in `store`, keyed by kind, folded query and
    /// configuration.
    #[must_use]
    pub fn with_cache(mut self, store: MokaStore<Vec<GeoEntity>>) -> Self {
        self.cache = Some(CachedRead::new(store));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn corpus(&self) -> &LocationCorpus {
        &self.corpus
    }

    pub fn info(&self) -> SearcherInfo {
        SearcherInfo {
            counts: EntityKind::ALL
                .into_iter()
                .map(|kind| (kind, self.corpus.list(kind).len()))
                .collect(),
            cached: self.cache.is_some(),
        }
    }

    // === Search ===

    /// Entities of `kind` whose name matches `raw`, best first.
    ///
    /// Fails with [`SearchError::InvalidQuery`] for malformed input,
    /// [`SearchError::NotFound`] when nothing matches and
    /// [`SearchError::TransientFailure`] when the candidate read fails.
    #[instrument(name = "Search", level = "debug", skip(self), fields(kind = %kind))]
    pub fn search(&self, kind: EntityKind, raw: &str) -> Result<Vec<GeoEntity>, SearchError> {
        let query = normalize_with_limit(raw, self.config.max_query_chars)?;
        let results = match &self.cache {
            Some(cache) => {
                let key = search_cache_key(kind, &query, &self.config);
                let cached = cache.get_or_load(&key, self.config.cache_ttl, || {
                    self.load(kind, &query, &self.config)
                })?;
                if let CacheOutcome::Degraded(e) = &cached.outcome {
                    debug!(error = %e, "Search served without cache");
                }
                cached.value
            }
            None => self.load(kind, &query, &self.config)?,
        };
        not_found_if_empty(results, kind, &query)
    }

    /// Like [`search`](Self::search) with a one-off configuration. Never
    /// reads or fills the cache.
    pub fn search_with_config(
        &self,
        kind: EntityKind,
        raw: &str,
        config: &SearchConfig,
    ) -> Result<Vec<GeoEntity>, SearchError> {
        let query = normalize_with_limit(raw, config.max_query_chars)?;
        let results = self.load(kind, &query, config)?;
        not_found_if_empty(results, kind, &query)
    }

    /// Ranked results with their scores and signals. Not cached.
    pub fn search_scored(
        &self,
        kind: EntityKind,
        raw: &str,
    ) -> Result<Vec<ScoredCandidate<'_>>, SearchError> {
        hybrid_search_inner(self.corpus.as_ref(), kind, raw, &self.config)
    }

    /// Run many independent searches in parallel; one result per query.
    #[instrument(
        name = "Bulk Search",
        level = "debug",
        skip_all,
        fields(kind = %kind, queries = queries.len())
    )]
    pub fn search_bulk<Term>(
        &self,
        kind: EntityKind,
        queries: &[Term],
    ) -> Vec<Result<Vec<GeoEntity>, SearchError>>
    where
        Term: AsRef<str> + Sync,
    {
        queries
            .par_iter()
            .map(|raw| self.search(kind, raw.as_ref()))
            .collect()
    }

    fn load(
        &self,
        kind: EntityKind,
        query: &NormalizedQuery,
        config: &SearchConfig,
    ) -> Result<Vec<GeoEntity>, SearchError> {
        let scored = rank_query(self.corpus.as_ref(), kind, query, config)?;
        Ok(scored.into_iter().map(|s| s.entity.clone()).collect())
    }

    // === Lookups ===

    /// All entities of `kind`, ascending id.
    pub fn list(&self, kind: EntityKind) -> &[GeoEntity] {
        self.corpus.list(kind)
    }

    pub fn get(&self, kind: EntityKind, id: u32) -> Option<&GeoEntity> {
        self.corpus.get(kind, id)
    }

    pub fn find_by_name(&self, kind: EntityKind, name: &str) -> Option<&GeoEntity> {
        self.corpus.find_by_name(kind, name)
    }

    pub fn children(
        &self,
        parent_kind: EntityKind,
        parent_id: u32,
        child_kind: EntityKind,
    ) -> Result<Vec<&GeoEntity>, LookupError> {
        self.corpus.children(parent_kind, parent_id, child_kind)
    }

    pub fn children_by_name(
        &self,
        parent_kind: EntityKind,
        parent_name: &str,
        child_kind: EntityKind,
    ) -> Result<(&GeoEntity, Vec<&GeoEntity>), LookupError> {
        self.corpus.children_by_name(parent_kind, parent_name, child_kind)
    }
}

/// Entries are keyed by kind, folded query and every result-shaping
/// setting, so searchers with different configurations can share a store.
fn search_cache_key(kind: EntityKind, query: &NormalizedQuery, config: &SearchConfig) -> String {
    format!("{kind}:search:{}:{}", query.folded(), config.fingerprint())
}

fn not_found_if_empty(
    results: Vec<GeoEntity>,
    kind: EntityKind,
    query: &NormalizedQuery,
) -> Result<Vec<GeoEntity>, SearchError> {
    if results.is_empty() {
        return Err(SearchError::NotFound {
            kind,
            query: query.text().to_string(),
        });
    }
    Ok(results)
}

/// Information about a `GeoSearcher`'s contents.
#[derive(Debug, Clone)]
pub struct SearcherInfo {
    pub counts: Vec<(EntityKind, usize)>,
    pub cached: bool,
}

impl SearcherInfo {
    pub fn total_entities(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    /// Get a human-readable summary of the searcher.
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(kind, n)| format!("{n} {kind}"))
            .collect();
        format!(
            "GeoSearcher with {} ({}cached)",
            parts.join(", "),
            if self.cached { "" } else { "not " }
        )
    }
}

/// Builder for creating a `GeoSearcher` with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct GeoSearcherBuilder {
    data_dir: Option<PathBuf>,
    config: SearchConfig,
    cache_capacity: Option<u64>,
}

impl GeoSearcherBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read tables from `dir` instead of `GEOCOL_DATA_DIR`.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Cache up to `max_entries` search results.
    #[must_use]
    pub fn cache(mut self, max_entries: u64) -> Self {
        self.cache_capacity = Some(max_entries);
        self
    }

    pub fn build(self) -> Result<GeoSearcher, GeoColError> {
        let searcher = match &self.data_dir {
            Some(dir) => GeoSearcher::from_dir(dir)?,
            None => GeoSearcher::initialize()?,
        };
        let searcher = searcher.with_config(self.config);
        Ok(match self.cache_capacity {
            Some(capacity) => searcher.with_cache(MokaStore::new(capacity)),
            None => searcher,
        })
    }
}
