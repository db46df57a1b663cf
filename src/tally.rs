//! Neighbourhood aggregation.

use std::collections::HashMap;

use crate::grid::CellId;
use crate::state::CellState;
use crate::terrain::Terrain;

/// Immutable snapshot of the states around a cell, keyed by neighbour id.
///
/// Cells missing from the map (grid edges without wrap-around) simply do not
/// contribute to the tally.
pub type Neighborhood = HashMap<CellId, CellState>;

/// Neighbour counts per terrain category, rebuilt on every evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeighborTally {
    pub water: u32,
    pub land: u32,
    pub forest: u32,
    pub desert: u32,
}

impl NeighborTally {
    pub fn count<'a, I>(neighbors: I) -> Self
    where
        I: IntoIterator<Item = &'a CellState>,
    {
        let mut tally = Self::default();
        for state in neighbors {
            *tally.slot(state.terrain) += 1;
        }
        tally
    }

    /// Tally a neighbourhood on behalf of `own`.
    ///
    /// When the neighbourhood contains the acting cell, exactly one count is
    /// removed from the category of its own terrain.
    pub fn aggregate(own: &CellState, neighborhood: &Neighborhood, includes_self: bool) -> Self {
        let tally = Self::count(neighborhood.values());
        if includes_self {
            tally.excluding(own.terrain)
        } else {
            tally
        }
    }

    /// Removes one count from `terrain`, saturating at zero.
    pub fn excluding(mut self, terrain: Terrain) -> Self {
        let slot = self.slot(terrain);
        *slot = slot.saturating_sub(1);
        self
    }

    pub fn get(&self, terrain: Terrain) -> u32 {
        match terrain {
            Terrain::Water => self.water,
            Terrain::Land => self.land,
            Terrain::Forest => self.forest,
            Terrain::Desert => self.desert,
        }
    }

    pub fn non_water(&self) -> u32 {
        self.land + self.forest + self.desert
    }

    pub fn total(&self) -> u32 {
        self.water + self.non_water()
    }

    fn slot(&mut self, terrain: Terrain) -> &mut u32 {
        match terrain {
            Terrain::Water => &mut self.water,
            Terrain::Land => &mut self.land,
            Terrain::Forest => &mut self.forest,
            Terrain::Desert => &mut self.desert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neighborhood(terrains: &[Terrain]) -> Neighborhood {
        terrains
            .iter()
            .enumerate()
            .map(|(i, t)| (CellId::new(i as u32, 0), CellState::new(*t)))
            .collect()
    }

    #[test]
    fn counts_each_category() {
        let hood = neighborhood(&[
            Terrain::Water,
            Terrain::Water,
            Terrain::Land,
            Terrain::Forest,
            Terrain::Forest,
            Terrain::Forest,
            Terrain::Desert,
        ]);
        let tally = NeighborTally::count(hood.values());
        assert_eq!(
            tally,
            NeighborTally {
                water: 2,
                land: 1,
                forest: 3,
                desert: 1
            }
        );
        assert_eq!(tally.non_water(), 5);
        assert_eq!(tally.total(), 7);
    }

    #[test]
    fn self_exclusion_touches_only_own_category() {
        let hood = neighborhood(&[
            Terrain::Water,
            Terrain::Land,
            Terrain::Land,
            Terrain::Forest,
            Terrain::Desert,
        ]);
        let raw = NeighborTally::count(hood.values());
        for own in Terrain::ALL {
            let excluded = NeighborTally::aggregate(&CellState::new(own), &hood, true);
            for category in Terrain::ALL {
                let expected = if category == own {
                    raw.get(category) - 1
                } else {
                    raw.get(category)
                };
                assert_eq!(excluded.get(category), expected, "own={own} category={category}");
            }
        }
    }

    #[test]
    fn no_exclusion_when_self_absent() {
        let hood = neighborhood(&[Terrain::Land, Terrain::Land]);
        let tally = NeighborTally::aggregate(&CellState::new(Terrain::Land), &hood, false);
        assert_eq!(tally.land, 2);
    }

    #[test]
    fn empty_neighborhood_is_all_zero() {
        let hood = Neighborhood::new();
        let tally = NeighborTally::aggregate(&CellState::new(Terrain::Forest), &hood, true);
        assert_eq!(tally, NeighborTally::default());
    }
}
