use std::path::{Path, PathBuf};

use polars::prelude::LazyFrame;
use tracing::{info, instrument, warn};

pub(super) mod tables;

pub use super::error::Result;
pub use tables::{get_table_lf, name_column, table_file_name};
use crate::{DataError, EntityKind};

/// Resolved CSV path for every subdivision table.
#[derive(Debug, Clone)]
pub struct TablePaths(pub Vec<(EntityKind, PathBuf)>);

/// Locate the six subdivision tables inside `dir`.
///
/// Every table is required; the error lists all missing files at once so a
/// half-populated data directory is diagnosed in one go.
#[instrument(name = "Locate subdivision tables", skip_all, level = "info")]
pub fn locate_tables(dir: &Path) -> Result<TablePaths> {
    info!("Checking for subdivision tables in: {}", dir.display());

    let mut found = Vec::with_capacity(EntityKind::ALL.len());
    let mut missing = Vec::new();
    for kind in EntityKind::ALL {
        let path = dir.join(table_file_name(kind));
        if path.exists() {
            found.push((kind, path));
        } else {
            missing.push(path);
        }
    }

    if !missing.is_empty() {
        warn!(?missing, "Subdivision tables not found");
        return Err(DataError::RequiredFilesNotFound(missing));
    }
    Ok(TablePaths(found))
}

/// Read every located table as a lazy frame, keyed by kind.
#[instrument(name = "Read subdivision tables", skip_all, level = "info")]
pub fn get_tables_as_lazy_frames(paths: &TablePaths) -> Result<Vec<(EntityKind, LazyFrame)>> {
    paths
        .0
        .iter()
        .map(|(kind, path)| Ok((*kind, get_table_lf(*kind, path)?)))
        .collect()
}
