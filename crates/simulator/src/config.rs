//! Layered run configuration.
//!
//! Settings are merged in increasing precedence: [`SimulationConfig`]
//! defaults, then an optional TOML file, then command-line flags. File and
//! flags share one shape, [`ConfigOverrides`], where an absent field leaves
//! the lower layer untouched.
//!
//! Example file:
//!
//! ```toml
//! population_size = 500
//! max_fanout = 8
//! horizon = 400
//! transmission_probability = 0.4
//! recovery_probability = 0.1
//! seed = 42
//! reinfection = "sir"
//! ```

use contagion_simulation::{ConfigError, SimulationConfig};
use contagion_types::{ReinfectionPolicy, Timestamp};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Optional values layered over a [`SimulationConfig`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub population_size: Option<usize>,

    #[serde(default)]
    pub max_fanout: Option<usize>,

    /// Horizon in ticks.
    #[serde(default)]
    pub horizon: Option<u64>,

    #[serde(default)]
    pub transmission_probability: Option<f64>,

    #[serde(default)]
    pub recovery_probability: Option<f64>,

    #[serde(default)]
    pub seed: Option<u64>,

    /// `"sir"` or `"sirs"`.
    #[serde(default)]
    pub reinfection: Option<ReinfectionPolicy>,

    #[serde(default)]
    pub link_pool_capacity: Option<usize>,

    #[serde(default)]
    pub max_pending_events: Option<usize>,
}

impl ConfigOverrides {
    /// Read overrides from a TOML file.
    pub fn load(path: &Path) -> Result<Self, SimulatorConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| SimulatorConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| SimulatorConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrite every field of `config` that is set here.
    pub fn apply(&self, mut config: SimulationConfig) -> SimulationConfig {
        if let Some(size) = self.population_size {
            config.population_size = size;
        }
        if let Some(fanout) = self.max_fanout {
            config.max_fanout = fanout;
        }
        if let Some(horizon) = self.horizon {
            config.horizon = Timestamp(horizon);
        }
        if let Some(p) = self.transmission_probability {
            config.transmission_probability = p;
        }
        if let Some(p) = self.recovery_probability {
            config.recovery_probability = p;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(policy) = self.reinfection {
            config.reinfection = policy;
        }
        if self.link_pool_capacity.is_some() {
            config.link_pool_capacity = self.link_pool_capacity;
        }
        if self.max_pending_events.is_some() {
            config.max_pending_events = self.max_pending_events;
        }
        config
    }
}

/// Merge defaults, the file at `file` (if any) and `flags`, then validate.
pub fn resolve_config(
    file: Option<&Path>,
    flags: &ConfigOverrides,
) -> Result<SimulationConfig, SimulatorConfigError> {
    let mut config = SimulationConfig::default();
    if let Some(path) = file {
        let from_file = ConfigOverrides::load(path)?;
        debug!(path = %path.display(), ?from_file, "Loaded config file");
        config = from_file.apply(config);
    }
    let config = flags.apply(config);
    config.validate()?;
    Ok(config)
}

/// Errors resolving the run configuration.
#[derive(Debug, Error)]
pub enum SimulatorConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
