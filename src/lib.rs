//! Local transition engine for a grid-based Cell-DEVS terrain automaton.
//!
//! A [`TerrainCell`] turns a cell's [`CellState`] and a snapshot of its
//! neighbourhood into the next state, using a configurable [`RuleSet`] that
//! covers Conway's Game of Life as well as the four-terrain
//! (water/land/forest/desert) generator. [`Simulation`] is a small reference
//! driver that runs those rules over a [`TerrainGrid`].

pub mod cell;
pub mod delay;
pub mod events;
pub mod grid;
pub mod rng;
pub mod rules;
pub mod scenario;
pub mod simulation;
pub mod state;
pub mod tally;
pub mod terrain;

pub use cell::{TerrainCell, TransitionError};
pub use delay::{ConstantDelay, DelayPolicy};
pub use grid::{CellId, TerrainGrid};
pub use rng::{CellRng, EntropySource, Randomness, RandomnessError, ReplaySource, RngManager};
pub use rules::{CountRule, Outcome, RuleSet, TransitionKind};
pub use scenario::{Scenario, ScenarioLoader};
pub use simulation::{RunSummary, Simulation, SimulationBuilder, SimulationSettings, StopReason};
pub use state::{CellState, CellStateRecord, ConfigError, TerrainParams};
pub use tally::{NeighborTally, Neighborhood};
pub use terrain::Terrain;
