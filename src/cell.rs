//! The per-cell model an engine invokes once per event.

use std::sync::Arc;

use thiserror::Error;

use crate::delay::{ConstantDelay, DelayPolicy};
use crate::rng::{Randomness, RandomnessError};
use crate::rules::{Outcome, RuleSet};
use crate::state::CellState;
use crate::tally::{NeighborTally, Neighborhood};

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("random draw failed: {0}")]
    Randomness(#[from] RandomnessError),
}

/// Rule set plus delay policy, shared by every cell of a grid.
///
/// `local_computation` only reads its inputs and returns a new state, so
/// cells can be evaluated in any order.
#[derive(Clone)]
pub struct TerrainCell {
    rules: Arc<RuleSet>,
    delay: Arc<dyn DelayPolicy>,
}

impl TerrainCell {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
            delay: Arc::new(ConstantDelay::default()),
        }
    }

    pub fn with_delay(mut self, delay: impl DelayPolicy + 'static) -> Self {
        self.delay = Arc::new(delay);
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn local_computation<R>(
        &self,
        state: &CellState,
        neighborhood: &Neighborhood,
        rng: &mut R,
    ) -> Result<CellState, TransitionError>
    where
        R: Randomness + ?Sized,
    {
        let tally = NeighborTally::aggregate(state, neighborhood, self.rules.self_in_neighborhood);
        let outcome = self.evaluate(state, &tally, rng)?;
        Ok(state.with_terrain(outcome.terrain))
    }

    /// Same as [`local_computation`](Self::local_computation) for an already
    /// aggregated tally.
    pub fn evaluate<R>(
        &self,
        state: &CellState,
        tally: &NeighborTally,
        rng: &mut R,
    ) -> Result<Outcome, TransitionError>
    where
        R: Randomness + ?Sized,
    {
        let params = state.params.as_ref().unwrap_or(&self.rules.defaults);
        Ok(self.rules.evaluate(state.terrain, params, tally, rng)?)
    }

    pub fn output_delay(&self, state: &CellState) -> f64 {
        self.delay.output_delay(state)
    }
}

impl std::fmt::Debug for TerrainCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainCell")
            .field("rules", &self.rules.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellId;
    use crate::rng::ReplaySource;
    use crate::rules::TransitionKind;
    use crate::state::TerrainParams;
    use crate::terrain::Terrain;

    /// Self at (1,1) plus the given neighbours laid out around it.
    fn hood(own: Terrain, neighbors: &[Terrain]) -> Neighborhood {
        let mut map: Neighborhood = neighbors
            .iter()
            .enumerate()
            .map(|(i, t)| (CellId::new(i as u32 + 10, 0), CellState::new(*t)))
            .collect();
        map.insert(CellId::new(1, 1), CellState::new(own));
        map
    }

    #[test]
    fn own_cell_is_excluded_from_tally() {
        let cell = TerrainCell::new(RuleSet::conway());
        // Three live entries including self leave two live neighbours.
        let state = CellState::new(Terrain::Land);
        let neighbors = hood(Terrain::Land, &[Terrain::Land, Terrain::Land, Terrain::Water]);
        let mut rng = ReplaySource::default();
        let next = cell.local_computation(&state, &neighbors, &mut rng).unwrap();
        assert_eq!(next.terrain, Terrain::Land);

        let lonely = hood(Terrain::Land, &[Terrain::Land, Terrain::Water]);
        let next = cell.local_computation(&state, &lonely, &mut rng).unwrap();
        assert_eq!(next.terrain, Terrain::Water);
    }

    #[test]
    fn unchanged_cell_returns_equal_state() {
        let cell = TerrainCell::new(RuleSet::terrain());
        let state = CellState::new(Terrain::Water);
        let neighbors = hood(Terrain::Water, &[Terrain::Water; 8]);
        let next = cell
            .local_computation(&state, &neighbors, &mut ReplaySource::default())
            .unwrap();
        assert_eq!(next, state);
    }

    #[test]
    fn per_cell_params_override_defaults() {
        let cell = TerrainCell::new(RuleSet::terrain());
        let strict = TerrainParams {
            land_birth_limit: 5,
            ..TerrainParams::default()
        };
        let neighbors = NeighborTally {
            water: 4,
            land: 4,
            forest: 0,
            desert: 0,
        };
        let mut rng = ReplaySource::default();
        let default_outcome = cell
            .evaluate(&CellState::new(Terrain::Water), &neighbors, &mut rng)
            .unwrap();
        assert_eq!(default_outcome.kind, TransitionKind::Birth);
        let strict_outcome = cell
            .evaluate(
                &CellState::with_params(Terrain::Water, strict),
                &neighbors,
                &mut rng,
            )
            .unwrap();
        assert_eq!(strict_outcome.kind, TransitionKind::Unchanged);
    }

    #[test]
    fn params_survive_transition() {
        let cell = TerrainCell::new(RuleSet::terrain());
        let params = TerrainParams {
            forest_multiplier: 0.3,
            ..TerrainParams::default()
        };
        let state = CellState::with_params(Terrain::Water, params);
        let neighbors = hood(Terrain::Water, &[Terrain::Land; 4]);
        let next = cell
            .local_computation(&state, &neighbors, &mut ReplaySource::default())
            .unwrap();
        assert_eq!(next.terrain, Terrain::Land);
        assert_eq!(next.params, Some(params));
    }

    #[test]
    fn replayed_draws_give_identical_sequences() {
        let cell = TerrainCell::new(RuleSet::terrain());
        let inputs = [
            (Terrain::Land, NeighborTally { water: 2, land: 4, forest: 0, desert: 0 }),
            (Terrain::Land, NeighborTally { water: 0, land: 3, forest: 3, desert: 0 }),
            (Terrain::Water, NeighborTally { water: 5, land: 3, forest: 0, desert: 0 }),
            (Terrain::Land, NeighborTally { water: 1, land: 7, forest: 0, desert: 0 }),
        ];
        let draws = [0.08, 0.5, 0.02];
        let run = || {
            let mut rng = ReplaySource::new(draws);
            inputs
                .iter()
                .map(|(terrain, tally)| {
                    cell.evaluate(&CellState::new(*terrain), tally, &mut rng)
                        .unwrap()
                        .terrain
                })
                .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());
        assert_eq!(
            first,
            vec![Terrain::Desert, Terrain::Land, Terrain::Land, Terrain::Desert]
        );
    }

    #[test]
    fn custom_delay_policy_is_used() {
        let cell = TerrainCell::new(RuleSet::terrain()).with_delay(|state: &CellState| {
            if state.terrain == Terrain::Forest {
                2.5
            } else {
                1.0
            }
        });
        assert_eq!(cell.output_delay(&CellState::new(Terrain::Forest)), 2.5);
        assert_eq!(cell.output_delay(&CellState::new(Terrain::Water)), 1.0);
    }
}
