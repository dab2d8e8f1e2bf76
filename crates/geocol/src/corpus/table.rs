use ahash::AHashMap as HashMap;
use geocol_data::{EntityKind, GeoEntity, fold};
use tracing::{instrument, warn};

use crate::index::{IndexError, NameIndex, TrigramIndex};
use crate::query::NormalizedQuery;
use crate::search::{Candidate, match_table};

/// All entities of one kind, with the indexes search and lookups need.
///
/// Rows are sorted by id; row `i` is document `i` of both indexes.
#[derive(Debug, Clone)]
pub struct EntityTable {
    kind: EntityKind,
    entities: Vec<GeoEntity>,
    by_id: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    names: NameIndex,
    trigrams: TrigramIndex,
}

impl EntityTable {
    /// Build a table from entities of `kind`.
    ///
    /// Entities of other kinds are ignored. When an id repeats, the first
    /// occurrence wins.
    #[instrument(
        name = "Build Entity Table",
        skip(entities),
        fields(rows = entities.len()),
        level = "info"
    )]
    pub fn build(kind: EntityKind, mut entities: Vec<GeoEntity>) -> Result<Self, IndexError> {
        entities.retain(|e| e.kind() == kind);
        entities.sort_by_key(GeoEntity::id);
        let before = entities.len();
        entities.dedup_by_key(|e| e.id());
        if entities.len() != before {
            warn!(
                dropped = before - entities.len(),
                "Duplicate ids found, keeping the first of each"
            );
        }

        let mut by_id = HashMap::with_capacity(entities.len());
        let mut by_name = HashMap::with_capacity(entities.len());
        for (row, entity) in entities.iter().enumerate() {
            by_id.insert(entity.id(), row);
            by_name
                .entry(entity.normalized_name().to_string())
                .or_insert(row);
        }

        let folded: Vec<&str> = entities.iter().map(GeoEntity::normalized_name).collect();
        let names = NameIndex::build(&folded)?;
        let trigrams = TrigramIndex::build(&folded);

        Ok(Self {
            kind,
            entities,
            by_id,
            by_name,
            names,
            trigrams,
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Every entity, ascending id.
    pub fn entities(&self) -> &[GeoEntity] {
        &self.entities
    }

    pub fn get(&self, id: u32) -> Option<&GeoEntity> {
        self.by_id.get(&id).map(|&row| &self.entities[row])
    }

    /// Accent- and case-insensitive exact name lookup; lowest id wins.
    pub fn find_by_name(&self, name: &str) -> Option<&GeoEntity> {
        self.by_name
            .get(fold(name.trim()).as_str())
            .map(|&row| &self.entities[row])
    }

    pub fn candidates(
        &self,
        query: &NormalizedQuery,
        similarity_threshold: f64,
    ) -> Result<Vec<Candidate<'_>>, IndexError> {
        match_table(
            &self.entities,
            &self.names,
            &self.trigrams,
            query,
            similarity_threshold,
        )
    }
}
