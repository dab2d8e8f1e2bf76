//! Administrative subdivision records.
//!
//! A [`GeoEntity`] is one named row of one of the six subdivision tables. Its
//! folded name is derived from the display name and is never set directly,
//! so the pair can't drift apart.

use std::fmt;
use std::str::FromStr;

use crate::text::fold;

/// The six kinds of subdivision the dataset carries, from largest to smallest.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Departamento (first-level division, includes Bogotá D.C.)
    Department,
    /// Municipio
    Municipality,
    /// Barrio, grouped into communes (comunas) inside a municipality
    Neighborhood,
    /// Corregimiento (rural division of a municipality)
    Corregimiento,
    /// Vereda (rural village, usually inside a corregimiento)
    Village,
    /// Centro poblado (populated place that is not a municipal seat)
    PopulationCenter,
}

impl EntityKind {
    pub const ALL: [Self; 6] = [
        Self::Department,
        Self::Municipality,
        Self::Neighborhood,
        Self::Corregimiento,
        Self::Village,
        Self::PopulationCenter,
    ];

    /// Stable Spanish identifier, used for table names and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Department => "departamento",
            Self::Municipality => "municipio",
            Self::Neighborhood => "barrio",
            Self::Corregimiento => "corregimiento",
            Self::Village => "vereda",
            Self::PopulationCenter => "centro_poblado",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntityKind(pub String);

impl fmt::Display for UnknownEntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownEntityKind {}

impl FromStr for EntityKind {
    type Err = UnknownEntityKind;

    /// Accepts the Spanish identifiers (singular or plural) and the English
    /// variant names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match fold(s.trim()).replace([' ', '-'], "_").as_str() {
            "departamento" | "departamentos" | "department" | "departments" => Self::Department,
            "municipio" | "municipios" | "municipality" | "municipalities" => Self::Municipality,
            "barrio" | "barrios" | "comuna_barrio" | "neighborhood" | "neighborhoods" => {
                Self::Neighborhood
            }
            "corregimiento" | "corregimientos" => Self::Corregimiento,
            "vereda" | "veredas" | "village" | "villages" => Self::Village,
            "centro_poblado" | "centros_poblados" | "population_center"
            | "population_centers" => Self::PopulationCenter,
            _ => return Err(UnknownEntityKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// Foreign keys to the enclosing subdivisions. Which ones are set depends on
/// the kind: a village knows its municipality and usually its corregimiento,
/// a department knows nothing.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Parents {
    pub department_id: Option<u32>,
    pub municipality_id: Option<u32>,
    pub corregimiento_id: Option<u32>,
}

/// Kind-specific attributes that don't take part in search.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EntityDetails {
    #[default]
    None,
    Municipality {
        map_link: Option<String>,
    },
    Neighborhood {
        commune_number: Option<u32>,
        commune_name: Option<String>,
    },
    PopulationCenter {
        center_type: Option<String>,
    },
}

/// A named subdivision record.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoEntity {
    id: u32,
    kind: EntityKind,
    name: String,
    normalized_name: String,
    pub parents: Parents,
    pub details: EntityDetails,
}

impl GeoEntity {
    pub fn new(kind: EntityKind, id: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        let normalized_name = fold(&name);
        Self {
            id,
            kind,
            name,
            normalized_name,
            parents: Parents::default(),
            details: EntityDetails::default(),
        }
    }

    pub fn with_parents(mut self, parents: Parents) -> Self {
        self.parents = parents;
        self
    }

    pub fn with_details(mut self, details: EntityDetails) -> Self {
        self.details = details;
        self
    }

    /// Replace the display name; the folded name follows.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.normalized_name = fold(&self.name);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased, accent-stripped name used for every comparison.
    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }
}

impl fmt::Display for GeoEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}:{}]", self.name, self.kind, self.id)
    }
}
