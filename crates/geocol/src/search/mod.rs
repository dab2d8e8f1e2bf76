//! Hybrid name search.
//!
//! A query is matched against one subdivision table by three independent
//! conditions (full-text, substring, trigram similarity); every row meeting
//! any of them is scored and the best ones are returned.

pub use error::{SearchError, SourceError};
mod matcher;
mod pipeline;
mod scoring;

use error::Result;
pub use matcher::{Candidate, CandidateSource, match_table};
pub use pipeline::{SearchConfig, hybrid_search_inner, limit_results, rank_query};
pub use scoring::{
    PositionalMatcher, PositionalTier, ScoreParams, ScoredCandidate, rank_candidates,
};

mod error {
    use std::time::Duration;

    use geocol_data::EntityKind;
    use thiserror::Error;

    use crate::query::QueryError;

    /// Failure of the candidate read. Never retried.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum SourceError {
        #[error("Candidate source unavailable: {0}")]
        Unavailable(String),
        #[error("Candidate read timed out after {0:?}")]
        Timeout(Duration),
    }

    impl From<crate::index::IndexError> for SourceError {
        fn from(err: crate::index::IndexError) -> Self {
            Self::Unavailable(err.to_string())
        }
    }

    #[derive(Error, Debug)]
    pub enum SearchError {
        #[error("Invalid query: {0}")]
        InvalidQuery(#[from] QueryError),
        #[error("No {kind} matches '{query}'")]
        NotFound { kind: EntityKind, query: String },
        #[error("Transient failure: {0}")]
        TransientFailure(#[from] SourceError),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }

    impl SearchError {
        pub fn is_not_found(&self) -> bool {
            matches!(self, Self::NotFound { .. })
        }

        pub fn is_transient(&self) -> bool {
            matches!(self, Self::TransientFailure(_))
        }
    }

    pub type Result<T> = std::result::Result<T, SearchError>;
}
