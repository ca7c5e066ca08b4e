//! Epidemiological state of a node.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Compartment a node currently occupies.
///
/// Each state doubles as the key of the membership partition holding every
/// node in that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// Not yet infected.
    Susceptible,
    /// Currently infected and spreading.
    Infected,
    /// No longer spreading.
    Recovered,
}

impl NodeState {
    /// All states, in partition order.
    pub const ALL: [NodeState; 3] = [
        NodeState::Susceptible,
        NodeState::Infected,
        NodeState::Recovered,
    ];

    /// Dense index of this state, matching [`NodeState::ALL`].
    pub fn index(self) -> usize {
        match self {
            NodeState::Susceptible => 0,
            NodeState::Infected => 1,
            NodeState::Recovered => 2,
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeState::Susceptible => "Susceptible",
            NodeState::Infected => "Infected",
            NodeState::Recovered => "Recovered",
        };
        f.write_str(name)
    }
}

/// Whether a recovered node can be infected again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReinfectionPolicy {
    /// Strictly forward: Recovered is terminal.
    Sir,
    /// Recovered nodes may return to Infected.
    #[default]
    Sirs,
}

impl ReinfectionPolicy {
    /// Whether a Transmit event may move a node in `state` into Infected.
    ///
    /// This is the only rule deciding infection; every transmit path and
    /// every neighbour filter goes through it.
    pub fn admits_infection(self, state: NodeState) -> bool {
        match state {
            NodeState::Susceptible => true,
            NodeState::Infected => false,
            NodeState::Recovered => self == ReinfectionPolicy::Sirs,
        }
    }
}

impl fmt::Display for ReinfectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReinfectionPolicy::Sir => f.write_str("SIR"),
            ReinfectionPolicy::Sirs => f.write_str("SIRS"),
        }
    }
}

/// Name that is neither `sir` nor `sirs`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reinfection policy {0:?}, expected \"sir\" or \"sirs\"")]
pub struct UnknownPolicy(pub String);

impl FromStr for ReinfectionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sir" => Ok(ReinfectionPolicy::Sir),
            "sirs" => Ok(ReinfectionPolicy::Sirs),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}
