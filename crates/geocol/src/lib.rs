//! geocol - Name Search over Colombia's Administrative Subdivisions
//!
//! geocol resolves free-text, possibly misspelled, possibly accent-less names
//! of departments, municipalities, neighborhoods, corregimientos, veredas and
//! population centers to the records they refer to. Every search combines
//! three signals: Spanish full-text matching, substring containment and
//! trigram similarity.
//!
//! # Quick Start
//!
//! ```rust
//! use geocol::{EntityKind, GeoSearcher, data_processing::TestDataConfig};
//!
//! let searcher = GeoSearcher::from_test_data(&TestDataConfig::sample())?;
//!
//! // Accents and case don't matter
//! let results = searcher.search(EntityKind::Municipality, "popayan")?;
//! assert_eq!(results[0].name(), "Popayán");
//!
//! // Misspellings still find the closest name
//! let results = searcher.search(EntityKind::Municipality, "medelin")?;
//! assert_eq!(results[0].name(), "Medellín");
//!
//! // Reference lookups
//! let cauca = searcher.find_by_name(EntityKind::Department, "cauca").unwrap();
//! let municipalities =
//!     searcher.children(EntityKind::Department, cauca.id(), EntityKind::Municipality)?;
//! assert!(!municipalities.is_empty());
//! # Ok::<(), geocol::error::GeoColError>(())
//! ```
//!
//! # Data
//!
//! Six CSV tables (`departamentos.csv`, `municipios.csv`, `barrios.csv`,
//! `corregimientos.csv`, `veredas.csv`, `centros_poblados.csv`) are read
//! from `$GEOCOL_DATA_DIR` (default `./geocol_data`) and indexed in memory.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod cache;
mod config;
mod core;
mod corpus;
pub mod error;
mod index;
mod query;
mod search;

pub use core::{GeoSearcher, GeoSearcherBuilder, SearcherInfo};

pub use cache::{CacheError, CacheOutcome, CacheStore, Cached, CachedRead, MokaStore};
pub use config::{ScoringBuilder, SearchConfigBuilder};
pub use corpus::{EntityTable, LocationCorpus, LookupError};
pub use geocol_data as data_processing;
pub use geocol_data::{EntityDetails, EntityKind, GeoEntity, Parents, SubdivisionData, fold};
pub use index::{IndexError, NameIndex, TrigramIndex};
pub use query::{MAX_QUERY_CHARS, NormalizedQuery, QueryError, normalize, normalize_with_limit};
pub use search::{
    Candidate, CandidateSource, PositionalTier, ScoreParams, ScoredCandidate, SearchConfig,
    SearchError, SourceError, hybrid_search_inner, limit_results, rank_candidates, rank_query,
};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for geocol.
///
/// Installs a `tracing` fmt subscriber once per process. `RUST_LOG` takes
/// precedence over `level` when set. Later calls are no-ops.
///
/// ```rust
/// use geocol::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), geocol::error::GeoColError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::GeoColError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("tantivy=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    })
}
