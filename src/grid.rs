//! Rectangular grid of cell states with a Moore neighbourhood.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{CellState, ConfigError};
use crate::tally::Neighborhood;
use crate::terrain::Terrain;

/// Cell position in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId {
    pub x: u32,
    pub y: u32,
}

impl CellId {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

const MOORE: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone)]
pub struct TerrainGrid {
    width: u32,
    height: u32,
    wrap: bool,
    cells: Vec<CellState>,
}

impl TerrainGrid {
    pub fn new(width: u32, height: u32, wrap: bool, fill: CellState) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid { width, height });
        }
        Ok(Self {
            width,
            height,
            wrap,
            cells: vec![fill; width as usize * height as usize],
        })
    }

    /// Builds a grid from rows of terrain, top row first. Rows must share a length.
    pub fn from_rows(rows: &[&[Terrain]], wrap: bool) -> Result<Self, ConfigError> {
        let height = rows.len() as u32;
        let width = rows.first().map(|row| row.len() as u32).unwrap_or(0);
        let mut grid = Self::new(width, height, wrap, CellState::default())?;
        for (y, row) in rows.iter().enumerate() {
            for (x, terrain) in row.iter().enumerate() {
                grid.set(CellId::new(x as u32, y as u32), CellState::new(*terrain))?;
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn wraps(&self) -> bool {
        self.wrap
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn index_of(&self, id: CellId) -> Option<usize> {
        if id.x < self.width && id.y < self.height {
            Some(id.y as usize * self.width as usize + id.x as usize)
        } else {
            None
        }
    }

    pub fn id_of(&self, index: usize) -> Option<CellId> {
        if index < self.cells.len() {
            let width = self.width as usize;
            Some(CellId::new((index % width) as u32, (index / width) as u32))
        } else {
            None
        }
    }

    pub fn get(&self, id: CellId) -> Option<&CellState> {
        self.index_of(id).map(|index| &self.cells[index])
    }

    pub fn set(&mut self, id: CellId, state: CellState) -> Result<(), ConfigError> {
        let index = self.index_of(id).ok_or(ConfigError::CellOutOfBounds {
            x: i64::from(id.x),
            y: i64::from(id.y),
            width: self.width,
            height: self.height,
        })?;
        self.cells[index] = state;
        Ok(())
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [CellState] {
        &mut self.cells
    }

    pub fn terrain_at(&self, x: u32, y: u32) -> Option<Terrain> {
        self.get(CellId::new(x, y)).map(|state| state.terrain)
    }

    /// Moore neighbours of `id`, deduplicated, without the centre cell.
    ///
    /// Without wrap-around, edge cells just have fewer neighbours.
    pub fn neighbor_ids(&self, id: CellId) -> Vec<CellId> {
        let mut ids = Vec::with_capacity(MOORE.len());
        for (dx, dy) in MOORE {
            if let Some(neighbor) = self.offset(id, dx, dy) {
                if neighbor != id && !ids.contains(&neighbor) {
                    ids.push(neighbor);
                }
            }
        }
        ids
    }

    /// Snapshot of the states around `id`, keyed by neighbour id.
    pub fn neighborhood(&self, id: CellId, include_self: bool) -> Neighborhood {
        let mut hood: Neighborhood = self
            .neighbor_ids(id)
            .into_iter()
            .filter_map(|neighbor| self.get(neighbor).map(|state| (neighbor, *state)))
            .collect();
        if include_self {
            if let Some(state) = self.get(id) {
                hood.insert(id, *state);
            }
        }
        hood
    }

    pub fn count(&self, terrain: Terrain) -> usize {
        self.cells
            .iter()
            .filter(|state| state.terrain == terrain)
            .count()
    }

    fn offset(&self, id: CellId, dx: i64, dy: i64) -> Option<CellId> {
        let (w, h) = (i64::from(self.width), i64::from(self.height));
        let (mut x, mut y) = (i64::from(id.x) + dx, i64::from(id.y) + dy);
        if self.wrap {
            x = x.rem_euclid(w);
            y = y.rem_euclid(h);
        } else if x < 0 || x >= w || y < 0 || y >= h {
            return None;
        }
        Some(CellId::new(x as u32, y as u32))
    }
}

/// One character per cell: `~` water, `.` land, `^` forest, `:` desert.
impl fmt::Display for TerrainGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width as usize) {
            for state in row {
                let glyph = match state.terrain {
                    Terrain::Water => '~',
                    Terrain::Land => '.',
                    Terrain::Forest => '^',
                    Terrain::Desert => ':',
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
