//! Singly linked lists threaded through a [`LinkPool`].

use crate::{LinkHandle, LinkPool};
use contagion_types::NodeIndex;

/// Anchor of a list of pool records.
///
/// The list owns no records; it only remembers head, tail and length. All
/// mutation goes through the pool the records live in, which the caller
/// passes in.
#[derive(Debug, Clone, Default)]
pub struct LinkList {
    head: Option<LinkHandle>,
    tail: Option<LinkHandle>,
    len: usize,
}

impl LinkList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in the list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Thread `handle` onto the tail of the list.
    ///
    /// The record must not currently belong to any list.
    pub fn append(&mut self, pool: &mut LinkPool, handle: LinkHandle) {
        pool.set_next(handle, None);
        match self.tail {
            Some(tail) => pool.set_next(tail, Some(handle)),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        self.len += 1;
    }

    /// Unlink the first record referring to `node` and return its handle.
    ///
    /// The returned record is detached and can be appended to another list
    /// without drawing from the pool.
    pub fn remove(&mut self, pool: &mut LinkPool, node: NodeIndex) -> Option<LinkHandle> {
        let mut prev = None;
        let mut cursor = self.head;

        while let Some(handle) = cursor {
            let link = pool[handle];
            if link.node == node {
                match prev {
                    Some(prev) => pool.set_next(prev, link.next),
                    None => self.head = link.next,
                }
                if self.tail == Some(handle) {
                    self.tail = prev;
                }
                pool.set_next(handle, None);
                self.len -= 1;
                return Some(handle);
            }
            prev = cursor;
            cursor = link.next;
        }

        None
    }

    /// Whether some record in the list refers to `node`.
    pub fn contains(&self, pool: &LinkPool, node: NodeIndex) -> bool {
        self.iter(pool).any(|n| n == node)
    }

    /// Iterate over the nodes in list order.
    ///
    /// Each call starts again from the head.
    pub fn iter<'a>(&self, pool: &'a LinkPool) -> ListIter<'a> {
        ListIter {
            pool,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Forget every record without touching the pool.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Iterator over the nodes of a [`LinkList`].
#[derive(Debug, Clone)]
pub struct ListIter<'a> {
    pool: &'a LinkPool,
    cursor: Option<LinkHandle>,
    remaining: usize,
}

impl Iterator for ListIter<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let handle = self.cursor?;
        let link = self.pool[handle];
        self.cursor = link.next;
        self.remaining -= 1;
        Some(link.node)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ListIter<'_> {}
