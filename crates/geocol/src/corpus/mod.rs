//! The in-memory subdivision corpus.
//!
//! [`LocationCorpus`] owns every entity, grouped into one [`EntityTable`]
//! per kind. It is immutable once built, so a single instance can be shared
//! behind an `Arc` by any number of concurrent searches.

use ahash::AHashMap as HashMap;
use geocol_data::{EntityKind, GeoEntity, SubdivisionData};
use itertools::Itertools;
use rayon::prelude::*;
use tracing::{info, instrument};

pub use error::LookupError;
use crate::index::IndexError;
use crate::query::NormalizedQuery;
use crate::search::{Candidate, CandidateSource, SourceError};

mod table;

pub use table::EntityTable;

#[derive(Debug, Clone)]
pub struct LocationCorpus {
    tables: HashMap<EntityKind, EntityTable>,
}

impl LocationCorpus {
    /// Build every table from loaded subdivision data.
    #[instrument(name = "Build Location Corpus", skip_all, fields(entities = data.len()))]
    pub fn from_data(data: SubdivisionData) -> Result<Self, IndexError> {
        Self::from_entities(data.into_entities())
    }

    /// Build from loose entities of any kinds. Kinds with no entities get an
    /// empty table.
    pub fn from_entities(entities: Vec<GeoEntity>) -> Result<Self, IndexError> {
        let t_build = std::time::Instant::now();
        let mut grouped = entities.into_iter().into_group_map_by(GeoEntity::kind);

        let inputs: Vec<(EntityKind, Vec<GeoEntity>)> = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, grouped.remove(&kind).unwrap_or_default()))
            .collect();

        let tables: HashMap<EntityKind, EntityTable> = inputs
            .into_par_iter()
            .map(|(kind, entities)| Ok((kind, EntityTable::build(kind, entities)?)))
            .collect::<Result<Vec<_>, IndexError>>()?
            .into_iter()
            .collect();

        info!(
            tables = tables.len(),
            entities = tables.values().map(EntityTable::len).sum::<usize>(),
            elapsed = ?t_build.elapsed(),
            "Location corpus ready"
        );
        Ok(Self { tables })
    }

    /// Table for `kind`. Every kind has one, possibly empty.
    pub fn table(&self, kind: EntityKind) -> Option<&EntityTable> {
        self.tables.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(EntityTable::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entities of `kind`, ascending id.
    pub fn list(&self, kind: EntityKind) -> &[GeoEntity] {
        self.table(kind).map(EntityTable::entities).unwrap_or_default()
    }

    pub fn get(&self, kind: EntityKind, id: u32) -> Option<&GeoEntity> {
        self.table(kind)?.get(id)
    }

    /// Accent- and case-insensitive exact name match, lowest id first.
    pub fn find_by_name(&self, kind: EntityKind, name: &str) -> Option<&GeoEntity> {
        self.table(kind)?.find_by_name(name)
    }

    /// Entities of `child_kind` directly under the given parent, ascending id.
    ///
    /// Supported relations: department → municipality; municipality →
    /// neighborhood, corregimiento, village, population center;
    /// corregimiento → village.
    pub fn children(
        &self,
        parent_kind: EntityKind,
        parent_id: u32,
        child_kind: EntityKind,
    ) -> Result<Vec<&GeoEntity>, LookupError> {
        let key_of = parent_key(parent_kind, child_kind)?;
        if self.get(parent_kind, parent_id).is_none() {
            return Err(LookupError::NotFound {
                kind: parent_kind,
                key: parent_id.to_string(),
            });
        }
        Ok(self
            .list(child_kind)
            .iter()
            .filter(|child| key_of(child) == Some(parent_id))
            .collect())
    }

    /// Like [`children`](Self::children), resolving the parent by name.
    pub fn children_by_name(
        &self,
        parent_kind: EntityKind,
        parent_name: &str,
        child_kind: EntityKind,
    ) -> Result<(&GeoEntity, Vec<&GeoEntity>), LookupError> {
        parent_key(parent_kind, child_kind)?;
        let parent = self
            .find_by_name(parent_kind, parent_name)
            .ok_or_else(|| LookupError::NotFound {
                kind: parent_kind,
                key: parent_name.trim().to_string(),
            })?;
        let children = self.children(parent_kind, parent.id(), child_kind)?;
        Ok((parent, children))
    }
}

type ParentKey = fn(&GeoEntity) -> Option<u32>;

/// Which foreign key of a `child` points at a parent of `parent` kind.
fn parent_key(parent: EntityKind, child: EntityKind) -> Result<ParentKey, LookupError> {
    use EntityKind::*;
    let key: ParentKey = match (parent, child) {
        (Department, Municipality) => |e| e.parents.department_id,
        (Municipality, Neighborhood | Corregimiento | Village | PopulationCenter) => {
            |e| e.parents.municipality_id
        }
        (Corregimiento, Village) => |e| e.parents.corregimiento_id,
        _ => return Err(LookupError::UnsupportedRelation { parent, child }),
    };
    Ok(key)
}

impl CandidateSource for LocationCorpus {
    fn candidates(
        &self,
        kind: EntityKind,
        query: &NormalizedQuery,
        similarity_threshold: f64,
    ) -> Result<Vec<Candidate<'_>>, SourceError> {
        match self.table(kind) {
            Some(table) => Ok(table.candidates(query, similarity_threshold)?),
            None => Ok(Vec::new()),
        }
    }
}

mod error {
    use geocol_data::EntityKind;
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum LookupError {
        #[error("No {kind} found for '{key}'")]
        NotFound { kind: EntityKind, key: String },
        #[error("A {parent} has no {child} children")]
        UnsupportedRelation {
            parent: EntityKind,
            child: EntityKind,
        },
    }
}
