use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use city_parking::simulation::{CityConfig, SimWorld};

#[derive(Parser)]
#[command(name = "city_parking")]
#[command(about = "Headless grid parking simulation, one JSON line per tick")]
struct Cli {
    /// City map JSON file (defaults to the bundled downtown map)
    #[arg(long)]
    map: Option<PathBuf>,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "100")]
    ticks: u64,

    /// Number of randomly placed cars (overrides the map)
    #[arg(long)]
    cars: Option<usize>,

    /// RNG seed for reproducible runs (overrides the map)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the text map to stderr every N ticks (0 disables)
    #[arg(long, default_value = "0")]
    map_every: u64,

    /// Delay between ticks in milliseconds
    #[arg(long, default_value = "0")]
    delay_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,city_parking=info"),
    )
    .init();

    let cli = Cli::parse();

    let mut config = match &cli.map {
        Some(path) => CityConfig::from_file(path)?,
        None => CityConfig::downtown()?,
    };
    if let Some(cars) = cli.cars {
        config.num_cars = cars;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let mut world = SimWorld::initialize(&config).context("Failed to initialize simulation")?;
    run_headless(&mut world, &cli)?;

    let stats = world.stats();
    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks run: {}", world.steps());
    info!("Total cars spawned: {}", stats.total_cars_spawned);
    info!("Total cars parked: {}", stats.total_cars_parked);
    info!("Cars without destination: {}", stats.cars_deactivated);
    info!("Cars on grid: {}", world.active_car_positions().len());
    info!(
        "Moves: {} routed, {} wandering, {} blocked, {} waiting",
        stats.moves, stats.wandered_moves, stats.blocked_moves, stats.waits
    );
    info!(
        "Parked rate: {:.1}%",
        if stats.total_cars_spawned > 0 {
            (stats.total_cars_parked as f32 / stats.total_cars_spawned as f32) * 100.0
        } else {
            0.0
        }
    );

    Ok(())
}

/// Run the simulation without graphics, streaming snapshots to stdout
fn run_headless(world: &mut SimWorld, cli: &Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if cli.map_every > 0 {
        eprintln!("{}", world.draw_map());
    }

    for _ in 0..cli.ticks {
        world.step();

        let line = serde_json::to_string(&world.snapshot())?;
        writeln!(out, "{}", line)?;

        if cli.map_every > 0 && world.steps() % cli.map_every == 0 {
            eprintln!("--- After tick {} ---", world.steps());
            eprintln!("{}", world.draw_map());
        }

        if world.cars().all(|car| !car.active) {
            info!("No active cars left after tick {}", world.steps());
            break;
        }

        if cli.delay_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(cli.delay_ms));
        }
    }

    out.flush()?;
    world.print_summary();
    Ok(())
}
