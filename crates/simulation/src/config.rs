//! Configuration for a simulation run.

use contagion_graph::Graph;
use contagion_types::{NodeIndex, ReinfectionPolicy, Timestamp};
use thiserror::Error;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Number of nodes in the population.
    pub population_size: usize,

    /// Maximum number of neighbours any node may have.
    pub max_fanout: usize,

    /// Events at or after this time are never processed.
    pub horizon: Timestamp,

    /// Per-tick success probability of a transmission coin toss.
    pub transmission_probability: f64,

    /// Per-tick success probability of a recovery coin toss.
    pub recovery_probability: f64,

    /// Random seed for deterministic simulation.
    pub seed: u64,

    /// Whether recovered nodes can be infected again.
    pub reinfection: ReinfectionPolicy,

    /// Link pool size. Derived from population and fan-out when `None`.
    pub link_pool_capacity: Option<usize>,

    /// Upper bound on queued events. Unbounded (platform limit) when `None`.
    pub max_pending_events: Option<usize>,
}

impl SimulationConfig {
    /// Create a configuration for a population of `population_size` nodes.
    pub fn new(population_size: usize) -> Self {
        Self {
            population_size,
            ..Default::default()
        }
    }

    /// Set the maximum fan-out.
    pub fn with_max_fanout(mut self, max_fanout: usize) -> Self {
        self.max_fanout = max_fanout;
        self
    }

    /// Set the horizon.
    pub fn with_horizon(mut self, horizon: Timestamp) -> Self {
        self.horizon = horizon;
        self
    }

    /// Set the transmission probability.
    pub fn with_transmission_probability(mut self, probability: f64) -> Self {
        self.transmission_probability = probability;
        self
    }

    /// Set the recovery probability.
    pub fn with_recovery_probability(mut self, probability: f64) -> Self {
        self.recovery_probability = probability;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the reinfection policy.
    pub fn with_reinfection(mut self, policy: ReinfectionPolicy) -> Self {
        self.reinfection = policy;
        self
    }

    /// Override the link pool size.
    pub fn with_link_pool_capacity(mut self, capacity: usize) -> Self {
        self.link_pool_capacity = Some(capacity);
        self
    }

    /// Bound the number of queued events.
    pub fn with_max_pending_events(mut self, max: usize) -> Self {
        self.max_pending_events = Some(max);
        self
    }

    /// Link pool size to allocate.
    ///
    /// The derived size holds one partition record per node and both records
    /// of every edge the fan-out bound allows.
    pub fn resolved_pool_capacity(&self) -> Result<usize, ConfigError> {
        match self.link_pool_capacity {
            Some(capacity) => Ok(capacity),
            None => Graph::pool_capacity_for(self.population_size, self.max_fanout).ok_or(
                ConfigError::PoolSizeOverflow {
                    population_size: self.population_size,
                    max_fanout: self.max_fanout,
                },
            ),
        }
    }

    /// Check the configuration for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if NodeIndex::try_from(self.population_size).is_err() {
            return Err(ConfigError::PopulationTooLarge {
                size: self.population_size,
            });
        }
        if self.horizon == Timestamp::ZERO || self.horizon == Timestamp::MAX {
            return Err(ConfigError::InvalidHorizon {
                horizon: self.horizon,
            });
        }
        check_probability("transmission", self.transmission_probability)?;
        check_probability("recovery", self.recovery_probability)?;

        // Every node needs one record for its partition entry
        let capacity = self.resolved_pool_capacity()?;
        if capacity < self.population_size {
            return Err(ConfigError::PoolTooSmall {
                capacity,
                required: self.population_size,
            });
        }

        if self.max_pending_events == Some(0) {
            return Err(ConfigError::ZeroPendingEvents);
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_fanout: 10,
            horizon: Timestamp(300),
            transmission_probability: 0.5,
            recovery_probability: 0.2,
            seed: 0xface_b00c,
            reinfection: ReinfectionPolicy::default(),
            link_pool_capacity: None,
            max_pending_events: None,
        }
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { name, value })
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Population size of zero.
    #[error("population size must be at least 1")]
    EmptyPopulation,

    /// Population cannot be indexed.
    #[error("population size {size} exceeds the node index space")]
    PopulationTooLarge {
        /// Requested size.
        size: usize,
    },

    /// Horizon of zero leaves nothing to simulate; the maximum is reserved.
    #[error("horizon {horizon} must lie strictly between 0 and the maximum timestamp")]
    InvalidHorizon {
        /// Requested horizon.
        horizon: Timestamp,
    },

    /// Probability outside [0, 1] or NaN.
    #[error("{name} probability {value} must lie within [0, 1]")]
    InvalidProbability {
        /// Which probability.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Derived pool size overflows.
    #[error("link pool size for {population_size} nodes with fan-out {max_fanout} overflows")]
    PoolSizeOverflow {
        /// Population size.
        population_size: usize,
        /// Maximum fan-out.
        max_fanout: usize,
    },

    /// Pool cannot even hold the partition entries.
    #[error("link pool capacity {capacity} is below the {required} records membership needs")]
    PoolTooSmall {
        /// Configured capacity.
        capacity: usize,
        /// Records required for partition membership alone.
        required: usize,
    },

    /// Event queue bound of zero.
    #[error("maximum pending events must be at least 1")]
    ZeroPendingEvents,
}
