//! Carousel — Production Line Simulator Demo CLI
//!
//! Runs a simulated circular production line: a coordinator injects raw
//! components at the outlet, a fleet of robots assembles and operates on
//! products as the ring rotates, and finished products are drained at the
//! inlet.
//!
//! Usage:
//!   cargo run -p demo -- run
//!   cargo run -p demo -- run --rotations 200 --cadence-ms 100
//!   cargo run -p demo -- run --scenario scenarios/line.toml
//!   cargo run -p demo -- show-scenario

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use carousel_contracts::config::ScenarioConfig;
use carousel_contracts::error::{CarouselError, CarouselResult};
use carousel_contracts::item::ProductKind;
use carousel_runtime::{JournalEvent, Simulation, SimulationReport};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Carousel — circular production line simulator.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Carousel production line simulator demo",
    long_about = "Simulates a rotating production line: component injection at the\n\
                  outlet, robot assembly and operation along the ring, product\n\
                  drain at the inlet."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a simulation and print the production report.
    Run {
        /// Scenario TOML file; the built-in reference line when omitted.
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Stop after this many rotations.
        #[arg(long, default_value_t = 400)]
        rotations: u64,
        /// Milliseconds between rotations, overriding the scenario.
        #[arg(long)]
        cadence_ms: Option<u64>,
        /// Switch the whole fleet to degraded mode after roughly this many
        /// rotations.
        #[arg(long)]
        degrade_after: Option<u64>,
    },
    /// Print the effective scenario as TOML and exit.
    ShowScenario {
        /// Scenario TOML file; the built-in reference line when omitted.
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            scenario,
            rotations,
            cadence_ms,
            degrade_after,
        } => run(scenario, rotations, cadence_ms, degrade_after),
        Command::ShowScenario { scenario } => show_scenario(scenario),
    };

    if let Err(e) = result {
        eprintln!("Demo error: {e}");
        std::process::exit(1);
    }
}

fn load_scenario(path: Option<PathBuf>) -> CarouselResult<ScenarioConfig> {
    match path {
        Some(path) => ScenarioConfig::from_file(&path),
        None => Ok(ScenarioConfig::default()),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run(
    scenario: Option<PathBuf>,
    rotations: u64,
    cadence_ms: Option<u64>,
    degrade_after: Option<u64>,
) -> CarouselResult<()> {
    let mut config = load_scenario(scenario)?;
    if let Some(cadence_ms) = cadence_ms {
        config.simulation.cadence_ms = cadence_ms;
    }

    print_banner(&config, rotations);

    let handle = Simulation::start(&config, Some(rotations))?;
    info!(run_id = %handle.run_id(), robots = handle.robots().len(), "line started");

    // The operator's degraded-mode switch: wait out the requested number of
    // rotations, then toggle every admitted robot.
    if let Some(after) = degrade_after {
        std::thread::sleep(Duration::from_millis(
            after.saturating_mul(config.simulation.cadence_ms),
        ));
        for robot in handle.robots() {
            let delivered = handle.toggle_mode(robot.id);
            info!(robot = %robot.id, delivered, "degraded-mode toggle sent");
        }
    }

    let report = handle.wait()?;
    print_report(&report);
    Ok(())
}

fn show_scenario(scenario: Option<PathBuf>) -> CarouselResult<()> {
    let config = load_scenario(scenario)?;
    let text = toml::to_string_pretty(&config).map_err(|e| CarouselError::ConfigInvalid {
        reason: e.to_string(),
    })?;
    println!("{text}");
    Ok(())
}

// ── Output ────────────────────────────────────────────────────────────────────

fn print_banner(config: &ScenarioConfig, rotations: u64) {
    println!();
    println!("Carousel — Production Line Simulator");
    println!("====================================");
    println!();
    println!(
        "  ring: {} slots, rotating every {} ms, {} rotations",
        config.simulation.ring_slots, config.simulation.cadence_ms, rotations
    );
    println!(
        "  fleet: {} robots (max {})",
        config.robots.len(),
        config.simulation.max_robots
    );
    println!();
}

fn print_report(report: &SimulationReport) {
    println!("Run {} finished after {} rotations.", report.run_id, report.rotations);
    println!();
    println!("  kind   planned left   completed   stock left");
    let summary = &report.summary;
    for index in 0..summary.planned.len() {
        println!(
            "  {:<5} {:>12} {:>11} {:>12}",
            ProductKind::from_index(index).to_string(),
            summary.planned[index],
            summary.completed[index],
            summary.remaining_stock[index]
        );
    }
    println!();

    let drained = report
        .journal
        .iter()
        .filter(|r| matches!(r.event, JournalEvent::ProductDrained { .. }))
        .count();
    let distributed = report
        .journal
        .iter()
        .filter(|r| matches!(r.event, JournalEvent::ComponentDistributed { .. }))
        .count();
    println!("  {distributed} components distributed, {drained} products drained.");
}
