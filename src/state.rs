//! Per-cell state and its construction from configuration records.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::terrain::Terrain;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cell state is missing required field '{0}'")]
    MissingField(&'static str),
    #[error("terrain code {0} is not one of 0 (water), 1 (land), 2 (forest), 3 (desert)")]
    TerrainOutOfRange(i64),
    #[error("terrain parameters are incomplete: '{0}' is missing")]
    IncompleteParams(&'static str),
    #[error("'{field}' must lie in [0, 1], got {value}")]
    RateOutOfRange { field: &'static str, value: f64 },
    #[error("'{field}' must be finite and non-negative, got {value}")]
    InvalidMultiplier { field: &'static str, value: f64 },
    #[error("unknown rule set '{0}' (expected conway, coastline or terrain)")]
    UnknownRuleSet(String),
    #[error("output delay must be finite and non-negative, got {0}")]
    InvalidDelay(f64),
    #[error("grid must have at least one cell, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("cell ({x}, {y}) lies outside the {width}x{height} grid")]
    CellOutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
}

/// Stochastic and threshold parameters for the terrain rules.
///
/// Attached to a cell at construction time and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainParams {
    pub land_birth_limit: u32,
    pub land_death_limit: u32,
    pub desert_base_rate: f64,
    pub desert_multiplier: f64,
    pub forest_base_rate: f64,
    pub forest_multiplier: f64,
    pub forest_death_limit: u32,
    pub desert_death_limit: u32,
}

impl TerrainParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("desert_base_rate", self.desert_base_rate)?;
        check_rate("forest_base_rate", self.forest_base_rate)?;
        check_multiplier("desert_multiplier", self.desert_multiplier)?;
        check_multiplier("forest_multiplier", self.forest_multiplier)?;
        Ok(())
    }

    /// Probability threshold for Land turning into Desert.
    pub fn desert_threshold(&self, water_neighbors: u32) -> f64 {
        self.desert_base_rate + self.desert_multiplier * f64::from(water_neighbors)
    }

    /// Probability threshold for Land turning into Forest.
    pub fn forest_threshold(&self, forest_neighbors: u32) -> f64 {
        self.forest_base_rate + self.forest_multiplier * f64::from(forest_neighbors)
    }
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            land_birth_limit: 3,
            land_death_limit: 2,
            desert_base_rate: 0.05,
            desert_multiplier: 0.05,
            forest_base_rate: 0.05,
            forest_multiplier: 0.1,
            forest_death_limit: 2,
            desert_death_limit: 1,
        }
    }
}

fn check_rate(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { field, value })
    }
}

fn check_multiplier(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidMultiplier { field, value })
    }
}

/// The value each grid cell carries.
///
/// Two states compare equal when their terrain matches; parameters are
/// configuration and never part of the visible output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellState {
    pub terrain: Terrain,
    pub params: Option<TerrainParams>,
}

impl CellState {
    pub fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            params: None,
        }
    }

    pub fn with_params(terrain: Terrain, params: TerrainParams) -> Self {
        Self {
            terrain,
            params: Some(params),
        }
    }

    /// Functional update: same parameters, new terrain.
    pub fn with_terrain(self, terrain: Terrain) -> Self {
        Self { terrain, ..self }
    }

    pub fn from_record(record: &CellStateRecord) -> Result<Self, ConfigError> {
        let code = record.terrain.ok_or(ConfigError::MissingField("terrain"))?;
        let terrain = Terrain::from_code(code).ok_or(ConfigError::TerrainOutOfRange(code))?;
        let params = record.params()?;
        Ok(Self { terrain, params })
    }

    pub fn to_record(&self) -> CellStateRecord {
        let params = self.params;
        CellStateRecord {
            terrain: Some(i64::from(self.terrain.code())),
            land_birth_limit: params.map(|p| p.land_birth_limit),
            land_death_limit: params.map(|p| p.land_death_limit),
            desert_base_rate: params.map(|p| p.desert_base_rate),
            desert_multiplier: params.map(|p| p.desert_multiplier),
            forest_base_rate: params.map(|p| p.forest_base_rate),
            forest_multiplier: params.map(|p| p.forest_multiplier),
            forest_death_limit: params.map(|p| p.forest_death_limit),
            desert_death_limit: params.map(|p| p.desert_death_limit),
        }
    }
}

impl PartialEq for CellState {
    fn eq(&self, other: &Self) -> bool {
        self.terrain == other.terrain
    }
}

impl Eq for CellState {}

impl From<Terrain> for CellState {
    fn from(terrain: Terrain) -> Self {
        CellState::new(terrain)
    }
}

/// Log form: the terrain code in angle brackets, e.g. `<1>` for Land.
impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.terrain.code())
    }
}

/// Declarative cell state as it appears in a scenario file.
///
/// The parameter block is all-or-nothing: either every stochastic field is
/// present or none is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellStateRecord {
    #[serde(default)]
    pub terrain: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_birth_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub land_death_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desert_base_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desert_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forest_base_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forest_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forest_death_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desert_death_limit: Option<u32>,
}

impl CellStateRecord {
    pub fn terrain(terrain: Terrain) -> Self {
        Self {
            terrain: Some(i64::from(terrain.code())),
            ..Self::default()
        }
    }

    fn has_any_param(&self) -> bool {
        self.land_birth_limit.is_some()
            || self.land_death_limit.is_some()
            || self.desert_base_rate.is_some()
            || self.desert_multiplier.is_some()
            || self.forest_base_rate.is_some()
            || self.forest_multiplier.is_some()
            || self.forest_death_limit.is_some()
            || self.desert_death_limit.is_some()
    }

    fn params(&self) -> Result<Option<TerrainParams>, ConfigError> {
        if !self.has_any_param() {
            return Ok(None);
        }
        let params = TerrainParams {
            land_birth_limit: required(self.land_birth_limit, "land_birth_limit")?,
            land_death_limit: required(self.land_death_limit, "land_death_limit")?,
            desert_base_rate: required(self.desert_base_rate, "desert_base_rate")?,
            desert_multiplier: required(self.desert_multiplier, "desert_multiplier")?,
            forest_base_rate: required(self.forest_base_rate, "forest_base_rate")?,
            forest_multiplier: required(self.forest_multiplier, "forest_multiplier")?,
            forest_death_limit: required(self.forest_death_limit, "forest_death_limit")?,
            desert_death_limit: required(self.desert_death_limit, "desert_death_limit")?,
        };
        params.validate()?;
        Ok(Some(params))
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::IncompleteParams(field))
}

impl TryFrom<CellStateRecord> for CellState {
    type Error = ConfigError;

    fn try_from(record: CellStateRecord) -> Result<Self, Self::Error> {
        CellState::from_record(&record)
    }
}
