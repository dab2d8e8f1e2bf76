use std::io::Write;
use std::path::Path;

use tempfile::TempDir;
use tracing::info;

use super::error::Result;
use crate::EntityKind;
use crate::raw::table_file_name;

/// Configuration for test data generation
#[derive(Debug, Clone)]
pub struct TestDataConfig {
    /// Maximum number of rows written per table (`None` writes every row)
    pub rows_per_table: Option<usize>,
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self::sample()
    }
}

impl TestDataConfig {
    /// A handful of rows per table for unit tests. Always contains Cali,
    /// Calima and Popayán.
    pub fn minimal() -> Self {
        Self {
            rows_per_table: Some(3),
        }
    }

    /// Every sample row, for integration tests
    pub fn sample() -> Self {
        Self {
            rows_per_table: None,
        }
    }
}

/// Generated tables living in a temporary directory that is removed on drop.
#[derive(Debug)]
pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

const DEPARTAMENTOS: &[&str] = &[
    "76,Valle del Cauca",
    "19,Cauca",
    "5,Antioquia",
    "11,Bogotá D.C.",
    "8,Atlántico",
    "13,Bolívar",
    "17,Caldas",
    "23,Córdoba",
    "25,Cundinamarca",
    "27,Chocó",
    "41,Huila",
    "47,Magdalena",
    "50,Meta",
    "52,Nariño",
    "54,Norte de Santander",
    "63,Quindío",
    "66,Risaralda",
    "68,Santander",
    "73,Tolima",
    "85,Casanare",
];

const MUNICIPIOS: &[&str] = &[
    "76001,Cali,76,https://mapas.example.co/cali",
    "76126,Calima,76,",
    "19001,Popayán,19,",
    "5001,Medellín,5,https://mapas.example.co/medellin",
    "11001,Bogotá D.C.,11,",
    "8001,Barranquilla,8,",
    "13001,Cartagena de Indias,13,",
    "13430,Magangué,13,",
    "17001,Manizales,17,",
    "23001,Montería,23,",
    "25386,La Mesa,25,",
    "25473,Mosquera,25,",
    "25754,Soacha,25,",
    "25899,Zipaquirá,25,",
    "27001,Quibdó,27,",
    "41001,Neiva,41,",
    "47001,Santa Marta,47,",
    "50001,Villavicencio,50,",
    "52001,Pasto,52,",
    "52835,San Andrés de Tumaco,52,",
    "54001,Cúcuta,54,",
    "5088,Bello,5,",
    "5266,Envigado,5,",
    "5360,Itagüí,5,",
    "5380,La Estrella,5,",
    "5615,Rionegro,5,",
    "5837,Turbo,5,",
    "63001,Armenia,63,",
    "66001,Pereira,66,",
    "68001,Bucaramanga,68,",
    "68615,Rionegro,68,",
    "73001,Ibagué,73,",
    "76111,Guadalajara de Buga,76,",
    "76364,Jamundí,76,",
    "76520,Palmira,76,",
    "76834,Tuluá,76,",
    "76892,Yumbo,76,",
    "85440,Villanueva,85,",
    "19573,Puerto Tejada,19,",
];

const BARRIOS: &[&str] = &[
    "1,3,San Antonio,76001,76,",
    "2,2,Granada,76001,76,",
    "3,3,El Peñón,76001,76,",
    "4,2,Santa Mónica Residencial,76001,76,",
    "5,19,San Fernando Viejo,76001,76,",
    "6,22,Ciudad Jardín,76001,76,",
    "7,14,El Poblado,5001,5,El Poblado",
    "8,10,La Candelaria,5001,5,La Candelaria",
    "9,11,Laureles,5001,5,Laureles-Estadio",
    "10,17,La Candelaria,11001,11,La Candelaria",
    "11,2,Chapinero Alto,11001,11,Chapinero",
];

const CORREGIMIENTOS: &[&str] = &[
    "1,Pance,76001",
    "2,La Buitrera,76001",
    "3,Santa Elena,5001",
    "4,San Antonio de Prado,5001",
    "5,Felidia,76001",
    "6,Los Andes,76001",
    "7,San Cristóbal,5001",
    "8,Altavista,5001",
];

const VEREDAS: &[&str] = &[
    "1,El Topacio,76001,1",
    "2,La Vorágine,76001,1",
    "3,Piedra Gorda,5001,3",
    "4,El Plan,5001,3",
    "5,Mazo,5001,3",
    "6,La Castilla,76001,2",
    "7,El Carmen,76001,",
];

const CENTROS_POBLADOS: &[&str] = &[
    "1,Pance,76001,Centro Poblado",
    "2,La Buitrera,76001,Caserío",
    "3,Santa Elena,5001,Corregimiento",
    "4,El Hormiguero,76001,Inspección de Policía",
    "5,Navarro,76001,Caserío",
];

fn table_rows(kind: EntityKind) -> (&'static str, &'static [&'static str]) {
    match kind {
        EntityKind::Department => ("id,nombre", DEPARTAMENTOS),
        EntityKind::Municipality => (
            "id,nombre,departamento_id,link_mapa_municipio",
            MUNICIPIOS,
        ),
        EntityKind::Neighborhood => (
            "id,num_comuna,nombre_barrio,municipio_id,departamento_id,nombre_comuna",
            BARRIOS,
        ),
        EntityKind::Corregimiento => ("id,nombre,municipio_id", CORREGIMIENTOS),
        EntityKind::Village => ("id,nombre,municipio_id,corregimiento_id", VEREDAS),
        EntityKind::PopulationCenter => ("id,nombre,municipio_id,tipo", CENTROS_POBLADOS),
    }
}

/// Write the six subdivision tables into a fresh temporary directory.
pub fn create_test_data(config: &TestDataConfig) -> Result<TestData> {
    info!("Creating test data with config: {:?}", config);

    let dir = TempDir::new()?;
    for kind in EntityKind::ALL {
        let (header, rows) = table_rows(kind);
        let take = config.rows_per_table.unwrap_or(rows.len());

        let mut file = std::fs::File::create(dir.path().join(table_file_name(kind)))?;
        writeln!(file, "{header}")?;
        for row in rows.iter().take(take) {
            writeln!(file, "{row}")?;
        }
        file.flush()?;
    }

    Ok(TestData { dir })
}
