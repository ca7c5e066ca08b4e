//! Error types for graph construction and membership changes.

use contagion_types::{IdSpaceExhausted, NodeId, NodeState};
use thiserror::Error;

/// Errors from the contact graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The link pool has no records left.
    #[error("link pool exhausted: all {capacity} records in use")]
    PoolExhausted {
        /// Configured pool size.
        capacity: usize,
    },

    /// The requested pool size cannot be addressed by a link handle.
    #[error("link pool capacity {requested} exceeds the handle space")]
    PoolTooLarge {
        /// Requested pool size.
        requested: usize,
    },

    /// Storage for nodes or link records could not be obtained.
    #[error("failed to allocate storage for {count} {what}")]
    AllocationFailure {
        /// What was being allocated.
        what: &'static str,
        /// How many of them.
        count: usize,
    },

    /// Not enough node identifiers left.
    #[error(transparent)]
    IdentifierSpaceExhausted(#[from] IdSpaceExhausted),

    /// A population is already alive.
    #[error("a population of {size} nodes already exists")]
    PopulationExists {
        /// Size of the live population.
        size: usize,
    },

    /// Membership partitions were already populated.
    #[error("population is already enrolled in membership partitions")]
    AlreadyEnrolled,

    /// A node was missing from the partition matching its state.
    #[error("{node} is not in the {state} partition")]
    NotInPartition {
        /// The node.
        node: NodeId,
        /// The partition it should have been in.
        state: NodeState,
    },
}
