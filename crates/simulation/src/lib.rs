//! Deterministic discrete-event epidemic simulation.
//!
//! Nodes of a random contact graph move through Susceptible, Infected and
//! Recovered as timestamped events are drained from a binary min-heap.
//! Given the same seed and configuration, a run produces identical results
//! every time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    EpidemicRunner                       │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  PriorityQueue (min-heap over GrowableBuffer)      │ │
//! │  │  Ordered by: timestamp                             │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ pop earliest                │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  Transmit / Recover processing                     │ │
//! │  │  Graph: partitions + adjacency over one LinkPool   │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ coin-toss delays            │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │  Neighbour Transmit/Recover pairs → queue          │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All randomness comes from one `ChaCha8Rng` drawn in a fixed order:
//! contact network, spreader count, spreader choice, then coin tosses.

mod config;
mod delay;
mod error;
mod event_queue;
mod network;
mod runner;

pub use config::{ConfigError, SimulationConfig};
pub use delay::toss_coin;
pub use error::SimulationError;
pub use event_queue::{Event, EventKind, EventProbabilities, PriorityQueue, QueueError};
pub use network::{build_contact_network, NetworkSummary};
pub use runner::{EpidemicRunner, SimulationReport, SimulationStats, StepOutcome, Transition};
