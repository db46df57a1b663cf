//! Reference Cell-DEVS style driver for a [`TerrainGrid`].
//!
//! At time zero every cell computes. A changed state becomes visible after
//! its output delay; once a batch of changes is visible, the changed cells
//! and their neighbours recompute against an immutable snapshot of the grid.
//! A newer computation replaces a pending one for the same cell, and a
//! computation equal to the visible state cancels it.

use std::collections::BTreeSet;
use std::io;

use thiserror::Error;
use tracing::{debug, trace};

use crate::cell::{TerrainCell, TransitionError};
use crate::events::EventSink;
use crate::grid::{CellId, TerrainGrid};
use crate::rng::{EntropySource, Randomness, RngManager};
use crate::state::CellState;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("cell {cell} failed to compute: {source}")]
    Transition {
        cell: CellId,
        #[source]
        source: TransitionError,
    },
    #[error("event log error: {0}")]
    Log(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomnessMode {
    /// One seeded stream per cell, derived from the run seed.
    #[default]
    Seeded,
    /// Fresh OS entropy on every draw.
    Entropy,
}

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub duration: f64,
    pub max_steps: u64,
    pub randomness: RandomnessMode,
}

impl SimulationSettings {
    pub fn new(scenario_name: impl Into<String>, seed: u64, duration: f64) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            seed,
            duration,
            max_steps: 1_000_000,
            randomness: RandomnessMode::Seeded,
        }
    }
}

pub struct SimulationBuilder {
    settings: SimulationSettings,
    cell: TerrainCell,
}

impl SimulationBuilder {
    pub fn new(settings: SimulationSettings, cell: TerrainCell) -> Self {
        Self { settings, cell }
    }

    pub fn with_randomness(mut self, mode: RandomnessMode) -> Self {
        self.settings.randomness = mode;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.settings.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Simulation {
        Simulation {
            rng: RngManager::new(self.settings.seed),
            cell: self.cell,
            settings: self.settings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Nothing left to publish.
    Quiescent,
    /// The next change would land after the configured duration.
    DurationReached,
    StepLimit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub events: u64,
    pub final_time: f64,
    pub stop: StopReason,
}

pub struct Simulation {
    rng: RngManager,
    cell: TerrainCell,
    settings: SimulationSettings,
}

impl Simulation {
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn cell(&self) -> &TerrainCell {
        &self.cell
    }

    /// Runs until quiescence, the configured duration, or the step limit.
    ///
    /// Initial states are recorded at time zero, then every visible change.
    pub fn run<S>(&mut self, grid: &mut TerrainGrid, mut sink: S) -> Result<RunSummary, SimulationError>
    where
        S: EventSink,
    {
        let mut streams = self.streams(grid.cell_count());
        let mut pending: Vec<Option<(f64, CellState)>> = vec![None; grid.cell_count()];
        let mut now = 0.0;
        let mut steps = 0;
        let mut events = 0;

        for (index, state) in grid.cells().iter().enumerate() {
            if let Some(id) = grid.id_of(index) {
                sink.record(now, id, state)?;
            }
        }

        let mut affected: BTreeSet<usize> = (0..grid.cell_count()).collect();
        let stop = loop {
            self.compute(grid, &affected, now, &mut pending, &mut streams)?;

            let next = pending
                .iter()
                .flatten()
                .map(|(time, _)| *time)
                .min_by(f64::total_cmp);
            let Some(next) = next else {
                break StopReason::Quiescent;
            };
            if next > self.settings.duration {
                break StopReason::DurationReached;
            }
            if steps >= self.settings.max_steps {
                break StopReason::StepLimit;
            }

            now = next;
            steps += 1;
            affected.clear();
            let mut changed = 0;
            for index in 0..pending.len() {
                let due = matches!(pending[index], Some((time, _)) if time == now);
                if !due {
                    continue;
                }
                let Some((_, state)) = pending[index].take() else {
                    continue;
                };
                let Some(id) = grid.id_of(index) else {
                    continue;
                };
                grid.cells_mut()[index] = state;
                sink.record(now, id, &state)?;
                changed += 1;
                affected.insert(index);
                for neighbor in grid.neighbor_ids(id) {
                    if let Some(neighbor_index) = grid.index_of(neighbor) {
                        affected.insert(neighbor_index);
                    }
                }
            }
            events += changed;
            debug!(
                scenario = %self.settings.scenario_name,
                time = now,
                changed,
                "published state changes"
            );
        };

        sink.flush()?;
        Ok(RunSummary {
            steps,
            events,
            final_time: now,
            stop,
        })
    }

    fn compute(
        &self,
        grid: &TerrainGrid,
        affected: &BTreeSet<usize>,
        now: f64,
        pending: &mut [Option<(f64, CellState)>],
        streams: &mut [Box<dyn Randomness>],
    ) -> Result<(), SimulationError> {
        let include_self = self.cell.rules().self_in_neighborhood;
        // Every evaluation in this batch sees the same visible states.
        let snapshot = grid.clone();
        for &index in affected {
            let Some(id) = snapshot.id_of(index) else {
                continue;
            };
            let current = snapshot.cells()[index];
            let neighborhood = snapshot.neighborhood(id, include_self);
            let next = self
                .cell
                .local_computation(&current, &neighborhood, &mut streams[index])
                .map_err(|source| SimulationError::Transition { cell: id, source })?;
            pending[index] = if next != current {
                let at = now + self.cell.output_delay(&next);
                trace!(%id, from = %current, to = %next, at, "scheduled change");
                Some((at, next))
            } else {
                None
            };
        }
        Ok(())
    }

    fn streams(&self, count: usize) -> Vec<Box<dyn Randomness>> {
        (0..count)
            .map(|index| -> Box<dyn Randomness> {
                match self.settings.randomness {
                    RandomnessMode::Seeded => Box::new(self.rng.cell_stream(index as u64)),
                    RandomnessMode::Entropy => Box::new(EntropySource),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MemorySink, NullSink};
    use crate::rules::RuleSet;
    use crate::terrain::Terrain;

    const W: Terrain = Terrain::Water;
    const L: Terrain = Terrain::Land;

    fn conway(duration: f64) -> Simulation {
        SimulationBuilder::new(
            SimulationSettings::new("test", 1, duration),
            TerrainCell::new(RuleSet::conway()),
        )
        .build()
    }

    #[test]
    fn static_grid_is_quiescent_immediately() {
        let mut grid = TerrainGrid::from_rows(&[&[W, W, W], &[W, W, W], &[W, W, W]], true).unwrap();
        let mut sink = MemorySink::new();
        let summary = conway(10.0).run(&mut grid, &mut sink).unwrap();
        assert_eq!(summary.stop, StopReason::Quiescent);
        assert_eq!(summary.steps, 0);
        assert_eq!(sink.events().len(), 9, "initial states are logged");
    }

    #[test]
    fn lone_cell_dies_after_one_delay() {
        let mut grid = TerrainGrid::from_rows(&[&[W, W, W], &[W, L, W], &[W, W, W]], false).unwrap();
        let mut sink = MemorySink::new();
        let summary = conway(10.0).run(&mut grid, &mut sink).unwrap();
        assert_eq!(summary.events, 1);
        assert_eq!(summary.final_time, 1.0);
        assert_eq!(grid.terrain_at(1, 1), Some(W));
        let changes: Vec<_> = sink.at(1.0).collect();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].cell, CellId::new(1, 1));
    }

    #[test]
    fn duration_bounds_the_run() {
        let rows: [&[Terrain]; 5] = [
            &[W, W, W, W, W],
            &[W, W, L, W, W],
            &[W, W, L, W, W],
            &[W, W, L, W, W],
            &[W, W, W, W, W],
        ];
        let mut grid = TerrainGrid::from_rows(&rows, false).unwrap();
        let summary = conway(3.0).run(&mut grid, NullSink).unwrap();
        assert_eq!(summary.stop, StopReason::DurationReached);
        assert_eq!(summary.steps, 3);
        assert_eq!(summary.final_time, 3.0);
    }

    #[test]
    fn step_limit_stops_oscillators() {
        let rows: [&[Terrain]; 5] = [
            &[W, W, W, W, W],
            &[W, W, W, W, W],
            &[W, L, L, L, W],
            &[W, W, W, W, W],
            &[W, W, W, W, W],
        ];
        let mut grid = TerrainGrid::from_rows(&rows, false).unwrap();
        let mut sim = SimulationBuilder::new(
            SimulationSettings::new("limit", 1, f64::INFINITY),
            TerrainCell::new(RuleSet::conway()),
        )
        .with_max_steps(4)
        .build();
        let summary = sim.run(&mut grid, NullSink).unwrap();
        assert_eq!(summary.stop, StopReason::StepLimit);
        assert_eq!(summary.steps, 4);
    }

    #[test]
    fn longer_delays_shift_publish_times() {
        let mut grid = TerrainGrid::from_rows(&[&[W, W, W], &[W, L, W], &[W, W, W]], false).unwrap();
        let cell = TerrainCell::new(RuleSet::conway()).with_delay(|_: &CellState| 2.5);
        let mut sim = SimulationBuilder::new(SimulationSettings::new("slow", 1, 10.0), cell).build();
        let mut sink = MemorySink::new();
        let summary = sim.run(&mut grid, &mut sink).unwrap();
        assert_eq!(summary.final_time, 2.5);
        assert_eq!(sink.at(2.5).count(), 1);
    }

    #[test]
    fn exhausted_randomness_is_reported_with_cell() {
        let rules = RuleSet::terrain();
        let cell = TerrainCell::new(rules);
        let sim = SimulationBuilder::new(SimulationSettings::new("err", 1, 1.0), cell).build();
        let grid = TerrainGrid::from_rows(&[&[L, L, L], &[L, L, L], &[L, L, L]], true).unwrap();
        let mut streams: Vec<Box<dyn Randomness>> = (0..grid.cell_count())
            .map(|_| Box::new(crate::rng::ReplaySource::default()) as Box<dyn Randomness>)
            .collect();
        let mut pending = vec![None; grid.cell_count()];
        let affected: BTreeSet<usize> = [4].into_iter().collect();
        let err = sim
            .compute(&grid, &affected, 0.0, &mut pending, &mut streams)
            .unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Transition { cell, .. } if cell == CellId::new(1, 1)
        ));
    }
}
