//! Contact graph backed by a single pool of link records.
//!
//! Every adjacency entry and every membership-partition entry is a [`Link`]
//! carved from one [`LinkPool`]. Lists thread records together by
//! [`LinkHandle`]; records are never freed individually and are reclaimed
//! only when the whole population is destroyed.
//!
//! ```text
//!   LinkPool: [ L0 | L1 | L2 | L3 | L4 | ... ]      (fixed capacity)
//!
//!   Susceptible ─► L0 ─► L2 ─► ∅
//!   Infected    ─► L1 ─► ∅
//!   Recovered   ─► ∅
//!   node 0 adj  ─► L3 ─► ∅          (edge 0 ↔ 1 = L3 + L4)
//!   node 1 adj  ─► L4 ─► ∅
//! ```
//!
//! Moving a node between partitions unlinks its record from one list and
//! threads the same record into another, so state transitions never draw
//! from the pool.

mod error;
mod graph;
mod list;
mod pool;

pub use error::GraphError;
pub use graph::{Graph, Node};
pub use list::{LinkList, ListIter};
pub use pool::{Link, LinkHandle, LinkPool};
