use std::path::Path;

use polars::prelude::*;

use super::Result;
use crate::EntityKind;

const DEPARTAMENTOS_SCHEMA: [(PlSmallStr, DataType); 2] = [
    (PlSmallStr::from_static("id"), DataType::UInt32),
    (PlSmallStr::from_static("nombre"), DataType::String),
];

const MUNICIPIOS_SCHEMA: [(PlSmallStr, DataType); 4] = [
    (PlSmallStr::from_static("id"), DataType::UInt32),
    (PlSmallStr::from_static("nombre"), DataType::String),
    (PlSmallStr::from_static("departamento_id"), DataType::UInt32),
    (PlSmallStr::from_static("link_mapa_municipio"), DataType::String),
];

const BARRIOS_SCHEMA: [(PlSmallStr, DataType); 6] = [
    (PlSmallStr::from_static("id"), DataType::UInt32),
    (PlSmallStr::from_static("num_comuna"), DataType::UInt32),
    (PlSmallStr::from_static("nombre_barrio"), DataType::String),
    (PlSmallStr::from_static("municipio_id"), DataType::UInt32),
    (PlSmallStr::from_static("departamento_id"), DataType::UInt32),
    (PlSmallStr::from_static("nombre_comuna"), DataType::String),
];

const CORREGIMIENTOS_SCHEMA: [(PlSmallStr, DataType); 3] = [
    (PlSmallStr::from_static("id"), DataType::UInt32),
    (PlSmallStr::from_static("nombre"), DataType::String),
    (PlSmallStr::from_static("municipio_id"), DataType::UInt32),
];

const VEREDAS_SCHEMA: [(PlSmallStr, DataType); 4] = [
    (PlSmallStr::from_static("id"), DataType::UInt32),
    (PlSmallStr::from_static("nombre"), DataType::String),
    (PlSmallStr::from_static("municipio_id"), DataType::UInt32),
    (PlSmallStr::from_static("corregimiento_id"), DataType::UInt32),
];

const CENTROS_POBLADOS_SCHEMA: [(PlSmallStr, DataType); 4] = [
    (PlSmallStr::from_static("id"), DataType::UInt32),
    (PlSmallStr::from_static("nombre"), DataType::String),
    (PlSmallStr::from_static("municipio_id"), DataType::UInt32),
    (PlSmallStr::from_static("tipo"), DataType::String),
];

/// File name of the CSV table holding `kind`.
pub fn table_file_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Department => "departamentos.csv",
        EntityKind::Municipality => "municipios.csv",
        EntityKind::Neighborhood => "barrios.csv",
        EntityKind::Corregimiento => "corregimientos.csv",
        EntityKind::Village => "veredas.csv",
        EntityKind::PopulationCenter => "centros_poblados.csv",
    }
}

/// Column carrying the display name. Neighborhood rows name the barrio, the
/// commune name lives in its own column.
pub fn name_column(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Neighborhood => "nombre_barrio",
        _ => "nombre",
    }
}

fn table_schema(kind: EntityKind) -> Schema {
    match kind {
        EntityKind::Department => Schema::from_iter(DEPARTAMENTOS_SCHEMA),
        EntityKind::Municipality => Schema::from_iter(MUNICIPIOS_SCHEMA),
        EntityKind::Neighborhood => Schema::from_iter(BARRIOS_SCHEMA),
        EntityKind::Corregimiento => Schema::from_iter(CORREGIMIENTOS_SCHEMA),
        EntityKind::Village => Schema::from_iter(VEREDAS_SCHEMA),
        EntityKind::PopulationCenter => Schema::from_iter(CENTROS_POBLADOS_SCHEMA),
    }
}

/// Lazily read one subdivision table. Rows without an id or a name are
/// dropped and the frame is ordered by id.
pub fn get_table_lf(kind: EntityKind, path: impl AsRef<Path>) -> Result<LazyFrame> {
    let name_col = name_column(kind);
    Ok(LazyCsvReader::new(path)
        .with_separator(b',')
        .with_has_header(true)
        .with_schema(Some(table_schema(kind).into()))
        .finish()?
        .with_column(dtype_col(&DataType::String).str().strip_chars(lit(" ")))
        .filter(col("id").is_not_null().and(col(name_col).is_not_null()))
        .sort(["id"], SortMultipleOptions::default()))
}
