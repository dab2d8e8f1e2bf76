//! Data model and table loading for the `geocol` search library.
//!
//! The reference dataset is six CSV tables, one per subdivision kind. This
//! crate reads them with `polars`, converts every row into a [`GeoEntity`]
//! and owns the accent folding that both stored names and queries go through.

use once_cell::sync::Lazy;
use std::path::PathBuf;

pub mod model;
pub mod processed;
pub mod raw;
pub mod test_data;
pub mod text;

pub const DATA_DIR_DEFAULT: &str = "./geocol_data";
pub const DATA_DIR_ENV: &str = "GEOCOL_DATA_DIR";

/// Data directory: `$GEOCOL_DATA_DIR`, or `./geocol_data` when unset.
pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    let dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DATA_DIR_DEFAULT.to_string());
    PathBuf::from(dir)
});

pub fn get_data_dir() -> &'static std::path::Path {
    DATA_DIR.as_path()
}

mod error {
    use std::path::PathBuf;

    use polars::prelude::PolarsError;
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum DataError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        #[error("Polars error: {0}")]
        Polars(#[from] PolarsError),
        #[error("Required data files not found: {0:?}")]
        RequiredFilesNotFound(Vec<PathBuf>),
    }

    pub type Result<T> = std::result::Result<T, DataError>;
}

pub use error::{DataError, Result};

// Re-export main types
pub use model::{EntityDetails, EntityKind, GeoEntity, Parents, UnknownEntityKind};
pub use processed::SubdivisionData;
pub use test_data::{TestData, TestDataConfig, create_test_data};
pub use text::fold;
