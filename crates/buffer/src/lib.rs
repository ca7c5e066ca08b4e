//! Growable contiguous buffer with chunked capacity management.
//!
//! [`GrowableBuffer`] stores fixed-size elements contiguously and grows its
//! capacity in whole chunks rather than doubling. A chunk is
//! `max(size_of::<T>(), DEFAULT_CHUNK_BYTES)` bytes, which bounds how often
//! the storage is reallocated while keeping the overhead predictable.
//!
//! Every fallible operation reports a [`BufferError`] instead of aborting on
//! allocation failure, so callers can decide whether to drop, retry or stop.
//!
//! ```
//! use contagion_buffer::GrowableBuffer;
//!
//! let mut buffer = GrowableBuffer::<u32>::new().unwrap();
//! buffer.push_back(7).unwrap();
//! buffer.insert_many(0, &[1, 2]).unwrap();
//! assert_eq!(buffer.as_slice(), &[1, 2, 7]);
//! assert_eq!(buffer.pop_back(), Some(7));
//! ```

mod error;

pub use error::BufferError;

use std::mem;

/// Smallest chunk size in bytes.
pub const DEFAULT_CHUNK_BYTES: usize = 4096;

/// A resizable contiguous store that grows by whole chunks.
///
/// Capacity is tracked in chunks. Emptying the buffer through
/// [`pop_back`](Self::pop_back) releases all storage, so capacity does not
/// survive a round trip through zero length.
#[derive(Debug)]
pub struct GrowableBuffer<T> {
    /// Backing storage. Its allocation is managed chunk by chunk.
    items: Vec<T>,

    /// Size of one element in bytes.
    unit: usize,

    /// Size of one chunk in bytes.
    chunk_bytes: usize,

    /// Number of chunks currently held.
    chunks: usize,

    /// Largest element count this buffer accepts.
    max_len: usize,
}

impl<T> GrowableBuffer<T> {
    /// Create a buffer holding one empty chunk.
    ///
    /// Fails with [`BufferError::AllocationFailure`] for zero-sized element
    /// types or when the first chunk cannot be allocated.
    pub fn new() -> Result<Self, BufferError> {
        let unit = mem::size_of::<T>();
        if unit == 0 {
            return Err(BufferError::AllocationFailure { bytes: 0 });
        }

        let mut buffer = Self {
            items: Vec::new(),
            unit,
            chunk_bytes: unit.max(DEFAULT_CHUNK_BYTES),
            chunks: 0,
            max_len: isize::MAX as usize / unit,
        };
        buffer.grow_to_chunks(1)?;
        Ok(buffer)
    }

    /// Lower the maximum element count.
    ///
    /// The limit can only tighten the platform bound, never widen it.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = self.max_len.min(max_len);
        self
    }

    /// Number of stored elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements the held chunks can store.
    pub fn capacity(&self) -> usize {
        Self::elements_in(self.chunks, self.chunk_bytes, self.unit)
    }

    /// Number of chunks currently held.
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Size of one chunk in bytes.
    pub fn chunk_bytes(&self) -> usize {
        self.chunk_bytes
    }

    /// Largest element count this buffer accepts.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// View the stored elements.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Mutable view of the stored elements.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Element at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Swap the elements at `a` and `b`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
    }

    /// Insert the elements yielded by `elements` starting at `pos`.
    ///
    /// Trailing elements shift right. Checks run in this order: length
    /// overflow, maximum length, position, allocation. A failed call leaves
    /// the buffer unchanged.
    pub fn insert_from<I>(&mut self, pos: usize, elements: I) -> Result<(), BufferError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let elements = elements.into_iter();
        let count = elements.len();
        let len = self.items.len();

        let new_len = self.checked_new_len(count)?;
        if pos > len {
            return Err(BufferError::InvalidPosition { pos, len });
        }
        if count == 0 {
            return Ok(());
        }

        self.ensure_capacity(new_len)?;
        self.items.splice(pos..pos, elements);
        Ok(())
    }

    /// Append one element.
    pub fn push_back(&mut self, element: T) -> Result<(), BufferError> {
        self.insert_from(self.items.len(), std::iter::once(element))
    }

    /// Remove and return the last element.
    ///
    /// Removing the last remaining element releases all storage.
    pub fn pop_back(&mut self) -> Option<T> {
        let element = self.items.pop()?;
        if self.items.is_empty() {
            self.release();
        }
        Some(element)
    }

    /// Make sure the next `additional` insertions cannot fail.
    pub fn reserve(&mut self, additional: usize) -> Result<(), BufferError> {
        let new_len = self.checked_new_len(additional)?;
        self.ensure_capacity(new_len)
    }

    /// Release whole unused chunks.
    ///
    /// Only acts when the stored bytes fill an exact number of chunks; a
    /// partially used trailing chunk pins the current capacity. Returns the
    /// number of chunks released.
    pub fn shrink_to_fit(&mut self) -> usize {
        if self.items.is_empty() {
            return 0;
        }

        let used = self.items.len() * self.unit;
        if used % self.chunk_bytes != 0 {
            return 0;
        }

        let needed = used / self.chunk_bytes;
        let released = self.chunks.saturating_sub(needed);
        if released > 0 {
            self.items.shrink_to(Self::elements_in(needed, self.chunk_bytes, self.unit));
            self.chunks = needed;
        }
        released
    }

    fn elements_in(chunks: usize, chunk_bytes: usize, unit: usize) -> usize {
        chunks.saturating_mul(chunk_bytes) / unit
    }

    fn checked_new_len(&self, count: usize) -> Result<usize, BufferError> {
        let len = self.items.len();
        let new_len = len
            .checked_add(count)
            .ok_or(BufferError::Overflow { len, count })?;
        if new_len > self.max_len {
            return Err(BufferError::CapacityExceeded {
                requested: new_len,
                max: self.max_len,
            });
        }
        Ok(new_len)
    }

    fn ensure_capacity(&mut self, len: usize) -> Result<(), BufferError> {
        if len <= self.capacity() {
            return Ok(());
        }
        // len <= max_len, so len * unit <= isize::MAX
        let chunks = (len * self.unit).div_ceil(self.chunk_bytes);
        self.grow_to_chunks(chunks)
    }

    fn grow_to_chunks(&mut self, chunks: usize) -> Result<(), BufferError> {
        let bytes = chunks
            .checked_mul(self.chunk_bytes)
            .ok_or(BufferError::AllocationFailure { bytes: usize::MAX })?;
        let capacity = bytes / self.unit;
        self.items
            .try_reserve_exact(capacity - self.items.len())
            .map_err(|_| BufferError::AllocationFailure { bytes })?;
        self.chunks = chunks;
        Ok(())
    }

    fn release(&mut self) {
        self.items = Vec::new();
        self.chunks = 0;
    }
}

impl<T: Clone> GrowableBuffer<T> {
    /// Insert a copy of `elements` starting at `pos`.
    pub fn insert_many(&mut self, pos: usize, elements: &[T]) -> Result<(), BufferError> {
        self.insert_from(pos, elements.iter().cloned())
    }
}
