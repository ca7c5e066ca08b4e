//! Contagion Simulator
//!
//! Driver around `contagion-simulation`: resolves a run configuration from
//! defaults, an optional TOML file and command-line overrides, and renders
//! the diagnostic dumps of the final graph.
//!
//! # Example
//!
//! ```no_run
//! use contagion_simulation::EpidemicRunner;
//! use contagion_simulator::{resolve_config, ConfigOverrides};
//!
//! let overrides = ConfigOverrides {
//!     population_size: Some(1_000),
//!     seed: Some(42),
//!     ..Default::default()
//! };
//! let config = resolve_config(None, &overrides).unwrap();
//!
//! let mut runner = EpidemicRunner::new(&config).unwrap();
//! runner.seed_random_spreaders().unwrap();
//! runner.run().unwrap().print_summary();
//! ```

pub mod config;
pub mod report;

pub use config::{resolve_config, ConfigOverrides, SimulatorConfigError};
pub use report::{adjacency_lines, dump_adjacency, dump_partitions, partition_members};
