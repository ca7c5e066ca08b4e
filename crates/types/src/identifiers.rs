//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Position of a node inside its population.
///
/// Dense and zero-based. Events, link records and adjacency lists refer to
/// nodes by index; [`NodeId`] is the identifier shown to humans.
pub type NodeIndex = u32;

/// Node identifier.
///
/// Identifiers are handed out in strictly ascending order by a
/// [`NodeIdGenerator`] and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Virtual simulation time.
///
/// A discrete, simulation-relative unit with no relation to wall-clock time.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Start of every simulation.
    pub const ZERO: Self = Timestamp(0);

    /// Largest representable time. Reserved for the end-of-run drain marker.
    pub const MAX: Self = Timestamp(u64::MAX);

    /// Get the raw value.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Advance by `ticks`, saturating at [`Timestamp::MAX`].
    pub fn saturating_add(self, ticks: u64) -> Self {
        Timestamp(self.0.saturating_add(ticks))
    }

    /// Ticks remaining until `later`, or zero if `later` is not after `self`.
    pub fn ticks_until(self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}", self.0)
    }
}

/// The identifier space cannot cover a requested allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("node identifier space exhausted: requested {requested}, remaining {remaining}")]
pub struct IdSpaceExhausted {
    /// Number of identifiers asked for.
    pub requested: usize,
    /// Identifiers still available.
    pub remaining: u32,
}

/// Issues ascending [`NodeId`]s, starting at 1.
///
/// The generator outlives any single population, so identifiers keep
/// ascending when a population is destroyed and rebuilt.
#[derive(Debug, Clone, Default)]
pub struct NodeIdGenerator {
    /// Last identifier issued (0 = none yet).
    last: u32,
}

impl NodeIdGenerator {
    /// Create a generator that has issued nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a generator whose next identifier is `last + 1`.
    pub fn resuming_after(last: u32) -> Self {
        Self { last }
    }

    /// Last identifier issued, if any.
    pub fn last_issued(&self) -> Option<NodeId> {
        (self.last > 0).then_some(NodeId(self.last))
    }

    /// Identifiers that can still be issued.
    pub fn remaining(&self) -> u32 {
        u32::MAX - self.last
    }

    /// Reserve `count` consecutive identifiers.
    ///
    /// Either all `count` identifiers are issued or none are.
    pub fn allocate(
        &mut self,
        count: usize,
    ) -> Result<impl Iterator<Item = NodeId>, IdSpaceExhausted> {
        let remaining = self.remaining();
        let fits = u32::try_from(count).is_ok_and(|count| count <= remaining);
        if !fits {
            return Err(IdSpaceExhausted {
                requested: count,
                remaining,
            });
        }

        let start = u64::from(self.last) + 1;
        let end = start + count as u64;
        self.last += count as u32;
        Ok((start..end).map(|id| NodeId(id as u32)))
    }
}
