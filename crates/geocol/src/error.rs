use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoColError {
    #[error("Search error: {0}")]
    SearchError(#[from] crate::search::SearchError),
    #[error("Query error: {0}")]
    QueryError(#[from] crate::query::QueryError),
    #[error("Lookup error: {0}")]
    LookupError(#[from] crate::corpus::LookupError),
    #[error("Index error: {0}")]
    IndexError(#[from] crate::index::IndexError),
    #[error("Cache error: {0}")]
    CacheError(#[from] crate::cache::CacheError),
    #[error("Data processing error: {0}")]
    DataProcessing(#[from] geocol_data::DataError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GeoColError>;
