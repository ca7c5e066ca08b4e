//! Error types for simulation runs.

use crate::{ConfigError, QueueError};
use contagion_graph::GraphError;
use thiserror::Error;

/// Errors that can stop a simulation from being built or run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Configuration rejected before anything was allocated.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Population, pool or partition failure.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Event queue could not accept an event during setup.
    #[error("event queue error: {0}")]
    Queue(#[from] QueueError),
}
