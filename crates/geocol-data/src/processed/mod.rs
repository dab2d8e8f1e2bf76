use std::path::Path;

use itertools::izip;
use polars::prelude::*;
use tracing::{debug, info, info_span, instrument};

use super::error::Result;
use super::raw;
use crate::{EntityDetails, EntityKind, GeoEntity, Parents};

/// Every subdivision record, loaded and converted from the raw tables.
///
/// Entities are grouped by kind (in [`EntityKind::ALL`] order) and sorted by
/// id inside each kind.
#[derive(Debug, Clone, Default)]
pub struct SubdivisionData {
    entities: Vec<GeoEntity>,
}

impl SubdivisionData {
    /// Load the six tables from `dir`.
    #[instrument(name = "Load subdivision data", skip_all, fields(dir = %dir.as_ref().display()))]
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let t_load = std::time::Instant::now();
        let paths = raw::locate_tables(dir.as_ref())?;
        let frames = raw::get_tables_as_lazy_frames(&paths)?;

        let mut entities = Vec::new();
        for (kind, lf) in frames {
            let _span = info_span!("Convert table", %kind).entered();
            let df = lf.collect()?;
            let before = entities.len();
            entities.extend(frame_to_entities(kind, &df)?);
            debug!(rows = df.height(), kept = entities.len() - before, "Table converted");
        }

        info!(
            entities = entities.len(),
            elapsed = ?t_load.elapsed(),
            "Subdivision data loaded"
        );
        Ok(Self { entities })
    }

    /// Load from the configured data directory (see [`crate::get_data_dir`]).
    pub fn new() -> Result<Self> {
        Self::from_dir(crate::get_data_dir())
    }

    /// Build directly from already constructed entities.
    pub fn from_entities(mut entities: Vec<GeoEntity>) -> Self {
        entities.sort_by_key(|e| (e.kind(), e.id()));
        Self { entities }
    }

    pub fn entities(&self) -> &[GeoEntity] {
        &self.entities
    }

    pub fn into_entities(self) -> Vec<GeoEntity> {
        self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind() == kind).count()
    }
}

fn u32_values(df: &DataFrame, name: &str) -> Result<Vec<Option<u32>>> {
    match df.column(name) {
        Ok(column) => Ok(column.u32()?.into_iter().collect()),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

fn str_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    match df.column(name) {
        Ok(column) => Ok(column
            .str()?
            .into_iter()
            .map(|v| v.filter(|s| !s.is_empty()).map(str::to_owned))
            .collect()),
        Err(_) => Ok(vec![None; df.height()]),
    }
}

/// Convert one collected table into entities of `kind`.
///
/// Columns that the table does not have come back as nulls, so the same
/// conversion serves every kind.
pub fn frame_to_entities(kind: EntityKind, df: &DataFrame) -> Result<Vec<GeoEntity>> {
    let ids = u32_values(df, "id")?;
    let names = str_values(df, raw::name_column(kind))?;
    let department_ids = u32_values(df, "departamento_id")?;
    let municipality_ids = u32_values(df, "municipio_id")?;
    let corregimiento_ids = u32_values(df, "corregimiento_id")?;

    let details: Vec<EntityDetails> = match kind {
        EntityKind::Municipality => str_values(df, "link_mapa_municipio")?
            .into_iter()
            .map(|map_link| EntityDetails::Municipality { map_link })
            .collect(),
        EntityKind::Neighborhood => u32_values(df, "num_comuna")?
            .into_iter()
            .zip(str_values(df, "nombre_comuna")?)
            .map(|(commune_number, commune_name)| EntityDetails::Neighborhood {
                commune_number,
                commune_name,
            })
            .collect(),
        EntityKind::PopulationCenter => str_values(df, "tipo")?
            .into_iter()
            .map(|center_type| EntityDetails::PopulationCenter { center_type })
            .collect(),
        _ => vec![EntityDetails::None; df.height()],
    };

    let entities = izip!(
        ids,
        names,
        department_ids,
        municipality_ids,
        corregimiento_ids,
        details
    )
    .filter_map(|(id, name, department_id, municipality_id, corregimiento_id, details)| {
        let (id, name) = (id?, name?);
        Some(
            GeoEntity::new(kind, id, name)
                .with_parents(Parents {
                    department_id,
                    municipality_id,
                    corregimiento_id,
                })
                .with_details(details),
        )
    })
    .collect();
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_data::{TestDataConfig, create_test_data};

    #[test]
    fn test_from_dir_loads_every_kind() {
        let test_data = create_test_data(&TestDataConfig::sample()).unwrap();
        let data = SubdivisionData::from_dir(test_data.path()).unwrap();

        for kind in EntityKind::ALL {
            assert!(data.count(kind) > 0, "Expected rows for {kind}");
        }
    }

    #[test]
    fn test_entities_sorted_by_kind_then_id() {
        let test_data = create_test_data(&TestDataConfig::sample()).unwrap();
        let data = SubdivisionData::from_dir(test_data.path()).unwrap();

        let keys: Vec<_> = data.entities().iter().map(|e| (e.kind(), e.id())).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_municipality_rows_carry_parents_and_details() {
        let test_data = create_test_data(&TestDataConfig::minimal()).unwrap();
        let data = SubdivisionData::from_dir(test_data.path()).unwrap();

        let popayan = data
            .entities()
            .iter()
            .find(|e| e.kind() == EntityKind::Municipality && e.id() == 19001)
            .expect("Popayán should be present in minimal data");
        assert_eq!(popayan.name(), "Popayán");
        assert_eq!(popayan.normalized_name(), "popayan");
        assert_eq!(popayan.parents.department_id, Some(19));
        assert!(matches!(
            popayan.details,
            EntityDetails::Municipality { .. }
        ));
    }

    #[test]
    fn test_neighborhood_uses_barrio_name_column() {
        let test_data = create_test_data(&TestDataConfig::sample()).unwrap();
        let data = SubdivisionData::from_dir(test_data.path()).unwrap();

        let granada = data
            .entities()
            .iter()
            .find(|e| e.kind() == EntityKind::Neighborhood && e.name() == "Granada")
            .expect("Granada should be loaded as a neighborhood");
        assert_eq!(granada.parents.municipality_id, Some(76001));
        assert_eq!(
            granada.details,
            EntityDetails::Neighborhood {
                commune_number: Some(2),
                commune_name: None,
            }
        );
    }

    #[test]
    fn test_missing_tables_are_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = SubdivisionData::from_dir(dir.path()).unwrap_err();
        match err {
            crate::DataError::RequiredFilesNotFound(missing) => {
                assert_eq!(missing.len(), EntityKind::ALL.len());
            }
            other => panic!("Unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rows_without_name_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        for kind in EntityKind::ALL {
            let header = match kind {
                EntityKind::Department => "id,nombre\n1,Antioquia\n2,\n",
                EntityKind::Municipality => "id,nombre,departamento_id,link_mapa_municipio\n",
                EntityKind::Neighborhood => {
                    "id,num_comuna,nombre_barrio,municipio_id,departamento_id,nombre_comuna\n"
                }
                EntityKind::Corregimiento => "id,nombre,municipio_id\n",
                EntityKind::Village => "id,nombre,municipio_id,corregimiento_id\n",
                EntityKind::PopulationCenter => "id,nombre,municipio_id,tipo\n",
            };
            std::fs::write(dir.path().join(raw::table_file_name(kind)), header).unwrap();
        }

        let data = SubdivisionData::from_dir(dir.path()).unwrap();
        assert_eq!(data.count(EntityKind::Department), 1);
        assert_eq!(data.entities()[0].name(), "Antioquia");
    }

    #[test]
    fn test_from_entities_sorts_input() {
        let data = SubdivisionData::from_entities(vec![
            GeoEntity::new(EntityKind::Municipality, 2, "B"),
            GeoEntity::new(EntityKind::Department, 9, "A"),
            GeoEntity::new(EntityKind::Municipality, 1, "C"),
        ]);
        let ids: Vec<_> = data.entities().iter().map(GeoEntity::id).collect();
        assert_eq!(ids, vec![9, 1, 2]);
        assert_eq!(data.len(), 3);
    }
}
