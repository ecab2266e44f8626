use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use traffic_world::{Config, ConfigError, Map, Options, Simulation};

/// Runs a headless driving episode loop and reports its speed.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The map description (YAML)
    #[arg(short, long)]
    map: PathBuf,

    /// The simulation constants (YAML); defaults are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// The number of ticks to simulate
    #[arg(short, long, default_value_t = 1000)]
    steps: usize,

    /// Seed of the random number generator
    #[arg(long)]
    seed: Option<u64>,

    /// Add the scripted obstacle vehicle
    #[arg(long)]
    obstacle: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), ConfigError> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    match serde_yaml::to_string(&config) {
        Ok(yaml) => log::debug!("Effective config:\n{}", yaml),
        Err(err) => log::warn!("Could not serialize the config: {}", err),
    }
    let map = Map::from_file(&args.map)?;
    let options = Options {
        obstacle: args.obstacle,
        seed: args.seed,
        ..Default::default()
    };
    let mut sim = Simulation::new(config, map, options)?;

    println!("Simulating...");
    sim.reset(None);
    let mut episodes = 1;
    let mut elapsed = Duration::ZERO;
    for _ in 0..args.steps {
        let start = Instant::now();
        let result = sim.step([0.5, 0.0], None);
        elapsed += start.elapsed();
        if result.done {
            log::info!(
                "Episode {} ended after frame {} in zone {:?}",
                episodes,
                sim.frame(),
                sim.get_zone().as_tuple()
            );
            sim.reset(None);
            episodes += 1;
        }
    }

    let frame = average_frame(elapsed, args.steps);
    println!(
        "Avg. frame: {:?} over {} frames, {} episodes ({} vehicles at the end)",
        frame,
        args.steps,
        episodes,
        sim.iter_vehicles().count(),
    );
    Ok(())
}

/// The mean time per step; zero steps count as one.
fn average_frame(elapsed: Duration, steps: usize) -> Duration {
    elapsed.div_f64(steps.max(1) as f64)
}
