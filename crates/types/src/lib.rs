//! Core types shared by the contagion crates.
//!
//! Identifiers, virtual time and the epidemiological state of a node. These
//! types carry no behaviour beyond validation and ordering; the graph and the
//! scheduler live in their own crates.

mod identifiers;
mod state;

pub use identifiers::{IdSpaceExhausted, NodeId, NodeIdGenerator, NodeIndex, Timestamp};
pub use state::{NodeState, ReinfectionPolicy, UnknownPolicy};
