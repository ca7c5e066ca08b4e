//! Fixed-capacity arena of link records.

use crate::GraphError;
use contagion_types::NodeIndex;
use std::fmt;
use std::ops::Index;

/// Handle to a record in a [`LinkPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHandle(u32);

impl LinkHandle {
    /// Position of the record in its pool.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

/// A pool record: a non-owning node reference plus the next record in
/// whichever list it is threaded into.
///
/// The same record type serves adjacency edges and partition entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// The node this record refers to.
    pub node: NodeIndex,
    /// Next record in the list, `None` at the tail.
    pub(crate) next: Option<LinkHandle>,
}

impl Link {
    /// Next record in the list.
    pub fn next(&self) -> Option<LinkHandle> {
        self.next
    }
}

/// Arena of [`Link`] records with an explicit, checked capacity.
///
/// Records are handed out in order and never recycled; [`release`](Self::release)
/// drops them all at once.
#[derive(Debug)]
pub struct LinkPool {
    records: Vec<Link>,
    capacity: usize,
}

impl LinkPool {
    /// Create a pool able to hold `capacity` records and reserve its storage.
    pub fn with_capacity(capacity: usize) -> Result<Self, GraphError> {
        // Handles are u32, so the pool cannot address more records than that
        if capacity > u32::MAX as usize {
            return Err(GraphError::PoolTooLarge {
                requested: capacity,
            });
        }

        let mut pool = Self {
            records: Vec::new(),
            capacity,
        };
        pool.prepare()?;
        Ok(pool)
    }

    /// Reserve storage for the full capacity if it is not already held.
    pub fn prepare(&mut self) -> Result<(), GraphError> {
        let missing = self.capacity.saturating_sub(self.records.len());
        self.records
            .try_reserve_exact(missing)
            .map_err(|_| GraphError::AllocationFailure {
                what: "link records",
                count: self.capacity,
            })
    }

    /// Carve a new record referring to `node`.
    pub fn alloc(&mut self, node: NodeIndex) -> Result<LinkHandle, GraphError> {
        if self.records.len() >= self.capacity {
            return Err(GraphError::PoolExhausted {
                capacity: self.capacity,
            });
        }

        let handle = LinkHandle(self.records.len() as u32);
        self.records.push(Link { node, next: None });
        Ok(handle)
    }

    /// Records handed out so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records have been handed out.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records still available.
    pub fn available(&self) -> usize {
        self.capacity - self.records.len()
    }

    /// Release every record and the backing storage.
    pub fn release(&mut self) {
        self.records = Vec::new();
    }

    pub(crate) fn set_next(&mut self, handle: LinkHandle, next: Option<LinkHandle>) {
        self.records[handle.index()].next = next;
    }
}

impl Index<LinkHandle> for LinkPool {
    type Output = Link;

    fn index(&self, handle: LinkHandle) -> &Link {
        &self.records[handle.index()]
    }
}
