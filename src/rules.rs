//! Rule sets and the terrain state machine.
//!
//! One engine covers every variant of the rule family; Conway's Game of Life
//! is the `conway` preset with Water as dead and Land as alive.

use serde::{Deserialize, Serialize};

use crate::rng::{Randomness, RandomnessError};
use crate::state::{ConfigError, TerrainParams};
use crate::tally::NeighborTally;
use crate::terrain::Terrain;

/// How a land-like neighbour count is matched for birth or survival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountRule {
    /// Compare against the limit in the cell's terrain parameters
    /// (`land_birth_limit` for birth, `land_death_limit` for survival).
    Threshold,
    /// Match an explicit set of counts, B/S notation style.
    OneOf(Vec<u32>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Unchanged,
    Birth,
    Death,
    Desertification,
    Afforestation,
    Reversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub terrain: Terrain,
    pub kind: TransitionKind,
}

impl Outcome {
    fn stays(terrain: Terrain) -> Self {
        Self {
            terrain,
            kind: TransitionKind::Unchanged,
        }
    }

    fn to(terrain: Terrain, kind: TransitionKind) -> Self {
        Self { terrain, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    pub land_birth: CountRule,
    pub land_survival: CountRule,
    /// Land next to water may turn into Desert.
    pub desertification: bool,
    /// Land away from water may turn into Forest.
    pub afforestation: bool,
    /// Neighbourhoods delivered to the engine contain the acting cell.
    pub self_in_neighborhood: bool,
    /// Used for cells that carry no parameters of their own.
    pub defaults: TerrainParams,
}

impl RuleSet {
    /// B3/S23 over Water (dead) and Land (alive).
    pub fn conway() -> Self {
        Self {
            name: "conway".into(),
            land_birth: CountRule::OneOf(vec![3]),
            land_survival: CountRule::OneOf(vec![2, 3]),
            desertification: false,
            afforestation: false,
            self_in_neighborhood: true,
            defaults: TerrainParams::default(),
        }
    }

    /// Threshold birth and death between Water and Land only.
    pub fn coastline() -> Self {
        Self {
            name: "coastline".into(),
            land_birth: CountRule::Threshold,
            land_survival: CountRule::Threshold,
            desertification: false,
            afforestation: false,
            self_in_neighborhood: true,
            defaults: TerrainParams::default(),
        }
    }

    /// Full four-terrain model with stochastic Forest and Desert formation.
    pub fn terrain() -> Self {
        Self {
            name: "terrain".into(),
            desertification: true,
            afforestation: true,
            ..Self::coastline()
        }
    }

    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "conway" => Ok(Self::conway()),
            "coastline" => Ok(Self::coastline()),
            "terrain" => Ok(Self::terrain()),
            _ => Err(ConfigError::UnknownRuleSet(name.to_string())),
        }
    }

    pub fn with_defaults(mut self, defaults: TerrainParams) -> Result<Self, ConfigError> {
        defaults.validate()?;
        self.defaults = defaults;
        Ok(self)
    }

    /// Evaluates one step of the state machine.
    ///
    /// Draws at most once from `rng`, and only in the stochastic Land
    /// branches.
    pub fn evaluate<R>(
        &self,
        current: Terrain,
        params: &TerrainParams,
        tally: &NeighborTally,
        rng: &mut R,
    ) -> Result<Outcome, RandomnessError>
    where
        R: Randomness + ?Sized,
    {
        let outcome = match current {
            Terrain::Water => {
                if self.is_born(params, tally.non_water()) {
                    Outcome::to(Terrain::Land, TransitionKind::Birth)
                } else {
                    Outcome::stays(Terrain::Water)
                }
            }
            Terrain::Land => {
                if !self.survives(params, tally.non_water()) {
                    Outcome::to(Terrain::Water, TransitionKind::Death)
                } else if tally.water > 0 {
                    if self.desertification
                        && rng.draw()? <= params.desert_threshold(tally.water)
                    {
                        Outcome::to(Terrain::Desert, TransitionKind::Desertification)
                    } else {
                        Outcome::stays(Terrain::Land)
                    }
                } else if self.afforestation
                    && rng.draw()? <= params.forest_threshold(tally.forest)
                {
                    Outcome::to(Terrain::Forest, TransitionKind::Afforestation)
                } else {
                    Outcome::stays(Terrain::Land)
                }
            }
            // Forest and Desert look at raw water pressure, not land-like count.
            Terrain::Forest => {
                if tally.water > params.forest_death_limit {
                    Outcome::to(Terrain::Land, TransitionKind::Reversion)
                } else {
                    Outcome::stays(Terrain::Forest)
                }
            }
            Terrain::Desert => {
                if tally.water < params.desert_death_limit {
                    Outcome::to(Terrain::Land, TransitionKind::Reversion)
                } else {
                    Outcome::stays(Terrain::Desert)
                }
            }
        };
        Ok(outcome)
    }

    fn is_born(&self, params: &TerrainParams, non_water: u32) -> bool {
        match &self.land_birth {
            CountRule::Threshold => non_water >= params.land_birth_limit,
            CountRule::OneOf(counts) => counts.contains(&non_water),
        }
    }

    fn survives(&self, params: &TerrainParams, non_water: u32) -> bool {
        match &self.land_survival {
            CountRule::Threshold => non_water >= params.land_death_limit,
            CountRule::OneOf(counts) => counts.contains(&non_water),
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::terrain()
    }
}
