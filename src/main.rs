use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mapgen::{
    events::CsvLogger,
    scenario::ScenarioLoader,
    simulation::{RandomnessMode, SimulationBuilder, SimulationSettings},
    terrain::Terrain,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Terrain generation cellular automaton runner")]
struct Cli {
    /// Path to the scenario file (YAML, or JSON by extension)
    #[arg(long, default_value = "scenarios/island.yaml")]
    scenario: PathBuf,

    /// Override simulated duration (uses scenario value when omitted)
    #[arg(long)]
    duration: Option<f64>,

    /// Event log destination
    #[arg(long, default_value = "output/mapgen_grid_log.csv")]
    output: PathBuf,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Draw from OS entropy instead of seeded per-cell streams
    #[arg(long)]
    entropy: bool,

    /// Log filter, e.g. `info` or `mapgen=debug` (RUST_LOG wins when set)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;
    let mut grid = scenario.build_grid()?;
    let cell = scenario.cell_model()?;
    let duration = scenario.duration(cli.duration);
    let seed = cli.seed.unwrap_or(scenario.seed);
    info!(
        scenario = %scenario.name,
        rules = %cell.rules().name,
        width = grid.width(),
        height = grid.height(),
        duration,
        seed,
        "starting simulation"
    );

    let mode = if cli.entropy {
        RandomnessMode::Entropy
    } else {
        RandomnessMode::Seeded
    };
    let mut simulation =
        SimulationBuilder::new(SimulationSettings::new(&scenario.name, seed, duration), cell)
            .with_randomness(mode)
            .build();
    let logger = CsvLogger::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    let summary = simulation.run(&mut grid, logger)?;

    info!(
        steps = summary.steps,
        events = summary.events,
        final_time = summary.final_time,
        stop = ?summary.stop,
        "simulation finished"
    );
    let census: Vec<String> = Terrain::ALL
        .iter()
        .map(|terrain| format!("{terrain}={}", grid.count(*terrain)))
        .collect();
    println!(
        "Scenario '{}' ran to t={} ({} changes). Terrain: {}. Log: {}",
        scenario.name,
        summary.final_time,
        summary.events,
        census.join(" "),
        cli.output.display()
    );
    Ok(())
}
