//! Bump allocator over a fixed buffer.
//!
//! The arena hands out memory by advancing a single offset through its
//! [`Buffer`]. It provides:
//!
//! - **O(1) allocation**: align the offset, check the remaining space, bump
//! - **Bounded in-place resize**: only the most recent allocation can grow or
//!   shrink, which is exactly the pattern of a builder appending to its tail
//! - **Bulk release**: `free_all` rewinds the offset to zero; individual
//!   `free` calls are accepted and ignored
//!
//! # Lifetime
//!
//! Allocations live until the next `free_all`. Every `free_all` starts a new
//! epoch, and handles from an earlier epoch are rejected (panic) instead of
//! silently aliasing newer data.
//!
//! # Examples
//!
//! ```
//! use prelude_mem::{Arena, Allocator};
//!
//! let mut arena = Arena::new(4096).unwrap();
//!
//! let a = arena.alloc(20, 4).unwrap();
//! let b = arena.alloc(20, 4).unwrap();
//!
//! // Only the last allocation can be resized in place.
//! assert!(arena.resize(a, 40).is_none());
//! let b = arena.resize(b, 40).unwrap();
//! assert_eq!(b.len(), 40);
//!
//! arena.free_all();
//! assert_eq!(arena.offset(), 0);
//! assert!(arena.alloc(4096, 1).is_some());
//! ```

use prelude_log::{debug, trace};

use crate::align::padding_for;
use crate::allocator::{
    Allocation, Allocator, AllocatorId, check_alignment, check_owner,
};
use crate::buffer::Buffer;
use crate::bytes;
use crate::capability::Capabilities;
use crate::error::Result;

/// Arena usage statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    /// Bytes consumed, alignment padding included.
    pub used: usize,
    /// Total capacity of the backing buffer in bytes.
    pub capacity: usize,
    /// Allocations made since the last `free_all`.
    pub allocations: usize,
}

/// A bump allocator that owns its backing buffer.
///
/// # Invariants
///
/// - `0 <= offset <= buffer.capacity()`
/// - every live allocation lies in `[0, offset)`
/// - `last_allocation`, when set, is the start and serial of the allocation
///   that ends at `offset`
///
/// # Thread Safety
///
/// `Arena` is not internally synchronized. Share it behind a lock such as
/// [`SpinMutex`](crate::SpinMutex).
#[derive(Debug)]
pub struct Arena {
    id: AllocatorId,
    epoch: u32,
    buffer: Buffer,
    /// Bytes consumed so far.
    offset: usize,
    /// Start offset and serial of the most recent allocation.
    last_allocation: Option<(usize, u32)>,
    next_serial: u32,
    allocations: usize,
}

impl Arena {
    /// Creates an arena over a fresh zeroed buffer of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferAllocationFailed`](crate::Error::BufferAllocationFailed)
    /// if the backing buffer cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::init(Buffer::new(capacity)?))
    }

    /// Creates an arena over caller-supplied storage.
    #[must_use]
    pub fn init(buffer: Buffer) -> Self {
        let arena = Arena {
            id: AllocatorId::next(),
            epoch: 0,
            buffer,
            offset: 0,
            last_allocation: None,
            next_serial: 0,
            allocations: 0,
        };
        debug!(
            "arena {} created with {} bytes",
            arena.id.as_u32(),
            arena.capacity()
        );
        arena
    }

    /// Tears the arena down and hands the backing storage back.
    #[must_use]
    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }

    /// Total capacity in bytes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Bytes consumed so far, padding included.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes still available (before any alignment padding).
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    /// Returns usage statistics.
    #[must_use]
    pub const fn stats(&self) -> ArenaStats {
        ArenaStats {
            used: self.offset,
            capacity: self.capacity(),
            allocations: self.allocations,
        }
    }

    /// Padding plus size needed to place `size` bytes at `align` right now.
    fn required(&self, size: usize, align: usize) -> Option<usize> {
        let current = self.buffer.addr() + self.offset;
        padding_for(current, align).checked_add(size)
    }
}

impl Allocator for Arena {
    fn id(&self) -> AllocatorId {
        self.id
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALLOC_ANY
            | Capabilities::FREE_ALL
            | Capabilities::ALIGN_ANY
            | Capabilities::RESIZE
    }

    fn alloc(&mut self, size: usize, align: usize) -> Option<Allocation> {
        check_alignment(align);

        let required = match self.required(size, align) {
            Some(required) if required <= self.remaining() => required,
            _ => {
                trace!(
                    "arena {} exhausted: requested {size} bytes (align {align}), {} remaining",
                    self.id.as_u32(),
                    self.remaining()
                );
                return None;
            }
        };

        let start = self.offset + required - size;
        self.offset += required;
        let serial = self.next_serial;
        self.next_serial = serial.wrapping_add(1);
        self.last_allocation = Some((start, serial));
        self.allocations += 1;

        let allocation =
            Allocation::new(self.id, self.epoch, start, size).with_serial(serial);
        // Memory is reused after free_all, so zero it explicitly.
        bytes::set(&mut self.buffer.as_mut_slice()[allocation.range()], 0);
        Some(allocation)
    }

    fn resize(
        &mut self,
        allocation: Allocation,
        new_size: usize,
    ) -> Option<Allocation> {
        check_owner(self.id, self.epoch, allocation);

        // A handle shrunk to zero shares its offset with whatever is
        // allocated next, so the serial decides.
        if self.last_allocation != Some((allocation.offset(), allocation.serial())) {
            return None;
        }

        let end = allocation.offset().checked_add(new_size)?;
        if end > self.capacity() {
            trace!(
                "arena {} cannot grow last allocation to {new_size} bytes",
                self.id.as_u32()
            );
            return None;
        }

        if end > self.offset {
            bytes::set(&mut self.buffer.as_mut_slice()[self.offset..end], 0);
        }
        self.offset = end;
        Some(allocation.with_len(new_size))
    }

    fn free(&mut self, allocation: Allocation) {
        // Individual frees are not supported; only validate the handle.
        debug_assert_eq!(
            allocation.allocator(),
            self.id,
            "allocation is not owned by this allocator"
        );
    }

    fn free_all(&mut self) {
        self.offset = 0;
        self.last_allocation = None;
        self.allocations = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn bytes(&self, allocation: Allocation) -> &[u8] {
        check_owner(self.id, self.epoch, allocation);
        &self.buffer.as_slice()[allocation.range()]
    }

    fn bytes_mut(&mut self, allocation: Allocation) -> &mut [u8] {
        check_owner(self.id, self.epoch, allocation);
        &mut self.buffer.as_mut_slice()[allocation.range()]
    }

    fn copy_nonoverlapping(
        &mut self,
        src: Allocation,
        dst: Allocation,
        len: usize,
    ) {
        check_owner(self.id, self.epoch, src);
        check_owner(self.id, self.epoch, dst);
        assert!(
            len <= src.len() && len <= dst.len(),
            "copy of {len} bytes exceeds source or destination"
        );
        bytes::copy(self.buffer.as_mut_slice(), src.offset(), dst.offset(), len);
    }
}
