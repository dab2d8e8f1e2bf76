//! Integration tests for geocol name search
//!
//! These run against the public API only, on the generated sample tables.

use std::time::Duration;

use geocol::{
    CacheOutcome, CachedRead, Candidate, CandidateSource, EntityKind, GeoEntity, GeoSearcher,
    LocationCorpus, LookupError, MokaStore, NormalizedQuery, PositionalTier, QueryError,
    SearchConfig, SearchConfigBuilder, SearchError, SourceError, data_processing::TestDataConfig,
    hybrid_search_inner,
};

fn setup_test_env() {
    let _ = geocol::init_logging(tracing::Level::WARN);
}

fn sample_searcher() -> GeoSearcher {
    setup_test_env();
    GeoSearcher::from_test_data(&TestDataConfig::sample()).expect("Should create searcher")
}

fn names(entities: &[GeoEntity]) -> Vec<&str> {
    entities.iter().map(GeoEntity::name).collect()
}

#[test]
fn test_whole_word_outranks_prefix() {
    let searcher = sample_searcher();
    let results = searcher.search(EntityKind::Municipality, "cali").unwrap();
    assert_eq!(names(&results), vec!["Cali", "Calima"]);

    let scored = searcher
        .search_scored(EntityKind::Municipality, "cali")
        .unwrap();
    assert_eq!(scored[0].tier, PositionalTier::WholeWord);
    assert_eq!(scored[1].tier, PositionalTier::Prefix);
    assert!(scored[0].score >= 10_000.0);
    assert!((1_000.0..5_000.0).contains(&scored[1].score));
}

#[test]
fn test_invalid_queries_rejected() {
    let searcher = sample_searcher();

    let err = searcher.search(EntityKind::Municipality, "").unwrap_err();
    assert_eq!(err.to_string(), SearchError::from(QueryError::EmptyQuery).to_string());

    let long = "a".repeat(101);
    let err = searcher.search(EntityKind::Municipality, &long).unwrap_err();
    assert!(
        matches!(
            err,
            SearchError::InvalidQuery(QueryError::QueryTooLong {
                length: 101,
                max: 100
            })
        ),
        "got {err}"
    );

    assert!(matches!(
        searcher.search(EntityKind::Municipality, "bogota123"),
        Err(SearchError::InvalidQuery(QueryError::InvalidCharacters))
    ));
}

#[test]
fn test_hundred_characters_is_accepted() {
    let searcher = sample_searcher();
    let query = "a".repeat(100);
    let result = searcher.search(EntityKind::Municipality, &query);
    assert!(
        !matches!(result, Err(SearchError::InvalidQuery(_))),
        "100 characters is within the limit"
    );
}

#[test]
fn test_results_are_limited_and_sorted() {
    let searcher = sample_searcher();
    let scored = searcher
        .search_scored(EntityKind::Municipality, "a")
        .unwrap();
    assert_eq!(scored.len(), 30, "Broad query is cut at the default limit");
    assert!(
        scored.windows(2).all(|w| w[0].score >= w[1].score),
        "Scores must be non-increasing"
    );
}

#[test]
fn test_equal_scores_break_ties_by_id() {
    let searcher = sample_searcher();
    let results = searcher
        .search(EntityKind::Municipality, "rionegro")
        .unwrap();
    let ids: Vec<u32> = results.iter().take(2).map(GeoEntity::id).collect();
    assert_eq!(ids, vec![5615, 68615]);
}

#[test]
fn test_accent_and_case_insensitive() {
    let searcher = sample_searcher();
    let plain = searcher.search(EntityKind::Municipality, "popayan").unwrap();
    let accented = searcher.search(EntityKind::Municipality, "POPAYÁN").unwrap();
    assert_eq!(plain, accented);
    assert_eq!(plain[0].name(), "Popayán");
}

#[test]
fn test_misspelling_found_by_similarity() {
    let searcher = sample_searcher();
    let results = searcher
        .search(EntityKind::Municipality, "barranquila")
        .unwrap();
    assert_eq!(results[0].name(), "Barranquilla");
}

#[test]
fn test_no_match_is_not_found() {
    let searcher = sample_searcher();
    let err = searcher
        .search(EntityKind::Department, "xyzxyz")
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_transient());
}

#[test]
fn test_hyphen_is_not_a_word_boundary() {
    setup_test_env();
    let corpus = LocationCorpus::from_entities(vec![
        GeoEntity::new(EntityKind::Village, 1, "Cali-Norte"),
        GeoEntity::new(EntityKind::Village, 2, "Cali Norte"),
    ])
    .unwrap();
    let searcher = GeoSearcher::new(corpus);

    let scored = searcher.search_scored(EntityKind::Village, "cali").unwrap();
    assert_eq!(scored[0].name(), "Cali Norte");
    assert_eq!(scored[0].tier, PositionalTier::WholeWord);
    assert_eq!(scored[1].name(), "Cali-Norte");
    assert_eq!(scored[1].tier, PositionalTier::Prefix);
}

#[test]
fn test_strict_config_narrows_results() {
    let searcher = sample_searcher();
    let strict = SearchConfigBuilder::strict().build().unwrap();
    let default = searcher
        .search_with_config(EntityKind::Municipality, "a", &SearchConfig::default())
        .unwrap();
    let narrowed = searcher
        .search_with_config(EntityKind::Municipality, "a", &strict)
        .unwrap();
    assert!(narrowed.len() <= strict.limit);
    assert!(narrowed.len() < default.len());
}

#[test]
fn test_cache_serves_repeated_reads() {
    let searcher = sample_searcher();
    let store = MokaStore::new(100);
    let cached = searcher.clone().with_cache(store.clone());

    let first = cached.search(EntityKind::Municipality, "cali").unwrap();
    let second = cached.search(EntityKind::Municipality, "Cali").unwrap();
    assert_eq!(first, second);
    assert_eq!(store.entry_count(), 1, "Both spellings share one entry");

    let key = format!("municipio:search:cali:{}", cached.config().fingerprint());
    let reader: CachedRead<Vec<GeoEntity>> = CachedRead::new(store);
    let hit = reader
        .get_or_load(&key, Duration::from_secs(60), || {
            Err::<Vec<GeoEntity>, String>("loader must not run".into())
        })
        .unwrap();
    assert_eq!(hit.outcome, CacheOutcome::Hit);
    assert_eq!(names(&hit.value), vec!["Cali", "Calima"]);
}

#[test]
fn test_searchers_sharing_a_store_respect_their_own_limit() {
    let store = MokaStore::new(100);
    let wide = sample_searcher().with_cache(store.clone());
    let narrow_config = SearchConfigBuilder::new().limit(3).build().unwrap();
    let narrow = wide.clone().with_config(narrow_config);

    let wide_results = wide.search(EntityKind::Municipality, "a").unwrap();
    let narrow_results = narrow.search(EntityKind::Municipality, "a").unwrap();
    assert_eq!(wide_results.len(), 30);
    assert_eq!(
        narrow_results.len(),
        3,
        "Cached result ignores searcher limit: got {}",
        narrow_results.len()
    );
    assert_eq!(narrow_results[..], wide_results[..3]);
    assert_eq!(store.entry_count(), 2, "One entry per configuration");
}

#[test]
fn test_lookups() {
    let searcher = sample_searcher();

    let departments = searcher.list(EntityKind::Department);
    assert!(departments.windows(2).all(|w| w[0].id() < w[1].id()));

    let cauca = searcher
        .find_by_name(EntityKind::Department, "CAUCA")
        .expect("Cauca exists");
    assert_eq!(cauca.id(), 19);
    assert_eq!(searcher.get(EntityKind::Department, 19), Some(cauca));

    let municipalities = searcher
        .children(EntityKind::Department, 19, EntityKind::Municipality)
        .unwrap();
    assert_eq!(municipalities.len(), 2);

    let (corregimiento, veredas) = searcher
        .children_by_name(EntityKind::Corregimiento, "santa elena", EntityKind::Village)
        .unwrap();
    assert_eq!(corregimiento.id(), 3);
    assert_eq!(veredas.len(), 3);

    assert!(matches!(
        searcher.children(EntityKind::Neighborhood, 1, EntityKind::Village),
        Err(LookupError::UnsupportedRelation { .. })
    ));
}

/// Source whose reads always take longer than any sane timeout.
struct SlowSource;

impl CandidateSource for SlowSource {
    fn candidates(
        &self,
        _kind: EntityKind,
        _query: &NormalizedQuery,
        _similarity_threshold: f64,
    ) -> Result<Vec<Candidate<'_>>, SourceError> {
        std::thread::sleep(Duration::from_millis(30));
        Ok(Vec::new())
    }
}

/// Source that is always down.
struct DownSource;

impl CandidateSource for DownSource {
    fn candidates(
        &self,
        _kind: EntityKind,
        _query: &NormalizedQuery,
        _similarity_threshold: f64,
    ) -> Result<Vec<Candidate<'_>>, SourceError> {
        Err(SourceError::Unavailable("connection refused".into()))
    }
}

#[test]
fn test_source_failures_are_transient() {
    setup_test_env();
    let config = SearchConfigBuilder::new()
        .with_timeout(Duration::from_millis(1))
        .build()
        .unwrap();

    let err = hybrid_search_inner(&SlowSource, EntityKind::Municipality, "cali", &config)
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::TransientFailure(SourceError::Timeout(_))
    ));

    let err = hybrid_search_inner(
        &DownSource,
        EntityKind::Municipality,
        "cali",
        &SearchConfig::default(),
    )
    .unwrap_err();
    assert!(err.is_transient());
}
