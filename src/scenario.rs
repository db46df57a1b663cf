use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    cell::TerrainCell,
    delay::ConstantDelay,
    grid::{CellId, TerrainGrid},
    rules::RuleSet,
    state::{CellState, CellStateRecord, ConfigError, TerrainParams},
};

fn default_rules() -> String {
    "terrain".to_string()
}

fn default_wrap() -> bool {
    true
}

fn default_delay() -> f64 {
    1.0
}

fn default_duration() -> f64 {
    500.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    /// Rule-set preset: `conway`, `coastline` or `terrain`.
    #[serde(default = "default_rules")]
    pub rules: String,
    /// Replaces the preset's default terrain parameters.
    #[serde(default)]
    pub params: Option<TerrainParams>,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_wrap")]
    pub wrap: bool,
    #[serde(default = "default_delay")]
    pub delay: f64,
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// State of every cell not listed in `cells`.
    pub default: CellStateRecord,
    #[serde(default)]
    pub cells: Vec<CellGroup>,
}

/// Cells sharing one initial state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellGroup {
    #[serde(default)]
    pub name: Option<String>,
    pub state: CellStateRecord,
    pub cell_map: Vec<[i64; 2]>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// `.json` files go through serde_json, everything else through serde_yaml.
    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let scenario: Scenario = if is_json {
            serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            serde_yaml::from_str(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        };
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rule_set()?;
        ConstantDelay::new(self.delay)?;
        self.build_grid()?;
        Ok(())
    }

    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let rules = RuleSet::from_name(&self.rules)?;
        match self.params {
            Some(params) => rules.with_defaults(params),
            None => Ok(rules),
        }
    }

    pub fn cell_model(&self) -> Result<TerrainCell, ConfigError> {
        Ok(TerrainCell::new(self.rule_set()?).with_delay(ConstantDelay::new(self.delay)?))
    }

    pub fn build_grid(&self) -> Result<TerrainGrid, ConfigError> {
        let fill = CellState::from_record(&self.default)?;
        let mut grid = TerrainGrid::new(self.width, self.height, self.wrap, fill)?;
        for group in &self.cells {
            let state = CellState::from_record(&group.state)?;
            for &[x, y] in &group.cell_map {
                let id = self.cell_id(x, y)?;
                grid.set(id, state)?;
            }
        }
        Ok(grid)
    }

    pub fn duration(&self, override_duration: Option<f64>) -> f64 {
        override_duration.unwrap_or(self.duration)
    }

    fn cell_id(&self, x: i64, y: i64) -> Result<CellId, ConfigError> {
        let out_of_bounds = ConfigError::CellOutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        };
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(x), Ok(y)) if x < self.width && y < self.height => Ok(CellId::new(x, y)),
            _ => Err(out_of_bounds),
        }
    }
}
