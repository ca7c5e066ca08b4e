//! Contagion Simulator CLI
//!
//! Run a deterministic SIR epidemic over a random contact network.
//!
//! # Example
//!
//! ```bash
//! # Defaults: 100 nodes, fan-out 10, horizon 300
//! contagion-sim
//!
//! # Larger population, strict SIR, fixed seed
//! contagion-sim -n 10000 -f 6 --reinfection sir --seed 42
//!
//! # Settings from a file, one flag overriding it
//! contagion-sim --config run.toml --horizon 1000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use contagion_simulation::EpidemicRunner;
use contagion_simulator::{dump_adjacency, dump_partitions, resolve_config, ConfigOverrides};
use contagion_types::ReinfectionPolicy;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Contagion Simulator
///
/// Single-threaded and reproducible: the same seed and settings always
/// produce the same run.
#[derive(Parser, Debug)]
#[command(name = "contagion-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML); flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of nodes
    #[arg(short = 'n', long)]
    population: Option<usize>,

    /// Maximum neighbours per node
    #[arg(short = 'f', long)]
    fanout: Option<usize>,

    /// Virtual time at which the run stops
    #[arg(short = 't', long)]
    horizon: Option<u64>,

    /// Per-tick transmission probability (0.0-1.0)
    #[arg(long)]
    transmission: Option<f64>,

    /// Per-tick recovery probability (0.0-1.0)
    #[arg(long)]
    recovery: Option<f64>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Reinfection policy: sir or sirs
    #[arg(long)]
    reinfection: Option<ReinfectionPolicy>,

    /// Link pool size (defaults to population * (fanout + 1))
    #[arg(long)]
    link_pool_capacity: Option<usize>,

    /// Upper bound on queued events
    #[arg(long)]
    max_pending_events: Option<usize>,

    /// Log the members of each partition after the run
    #[arg(long)]
    dump_partitions: bool,

    /// Log every node's neighbours after building the network
    #[arg(long)]
    dump_adjacency: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            population_size: self.population,
            max_fanout: self.fanout,
            horizon: self.horizon,
            transmission_probability: self.transmission,
            recovery_probability: self.recovery,
            seed: self.seed,
            reinfection: self.reinfection,
            link_pool_capacity: self.link_pool_capacity,
            max_pending_events: self.max_pending_events,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warn,contagion_sim=info,contagion_simulator=info,contagion_simulation=info")
        }))
        .init();

    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), &args.overrides())
        .context("Failed to resolve configuration")?;

    info!(
        population = config.population_size,
        max_fanout = config.max_fanout,
        horizon = %config.horizon,
        transmission = config.transmission_probability,
        recovery = config.recovery_probability,
        seed = config.seed,
        reinfection = %config.reinfection,
        "Resolved configuration"
    );

    let mut runner = EpidemicRunner::new(&config).context("Failed to build population")?;
    if args.dump_adjacency {
        dump_adjacency(runner.graph());
    }

    runner
        .seed_random_spreaders()
        .context("Failed to seed initial spreaders")?;
    let report = runner.run().context("Simulation failed")?;

    report.print_summary();

    if args.dump_partitions {
        dump_partitions(runner.graph());
    }

    Ok(())
}
