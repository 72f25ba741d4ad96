//! Fixed-size node allocator with an intrusive free list.
//!
//! The pool carves its [`Buffer`] into equally sized, equally aligned nodes.
//! Free nodes are chained through a link stored in their own first bytes, so
//! the free list costs no memory beyond the nodes themselves.
//!
//! - `alloc` pops the head of the free list (O(1)) and zero-fills the node
//! - `free` pushes the node back (O(1))
//! - `resize` succeeds without moving as long as the new size fits a node
//! - `free_all` rebuilds the list from every node in the buffer
//!
//! The pool never grows: once the free list is empty, `alloc` returns `None`.
//!
//! # Examples
//!
//! ```
//! use prelude_mem::{Pool, Allocator};
//!
//! // 256 bytes of 32-byte nodes aligned to 8.
//! let mut pool = Pool::new(256, 32, 8).unwrap();
//! assert_eq!(pool.node_count(), 8);
//!
//! let nodes: Vec<_> = (0..8).map(|_| pool.alloc(32, 8).unwrap()).collect();
//! assert!(pool.alloc(32, 8).is_none());
//!
//! pool.free(nodes[3]);
//! assert_eq!(pool.alloc(16, 8).unwrap().offset(), nodes[3].offset());
//! ```

use prelude_log::{debug, trace};

use crate::align::{align_forward_size, is_valid_alignment, padding_for};
use crate::allocator::{
    Allocation, Allocator, AllocatorId, check_alignment, check_owner,
};
use crate::buffer::Buffer;
use crate::bytes;
use crate::capability::Capabilities;
use crate::error::{Error, Result};

/// Size of the free-list link stored in each free node.
const LINK_SIZE: usize = std::mem::size_of::<usize>();

/// Link value terminating the free list.
const NIL: usize = usize::MAX;

/// A fixed-size node allocator that owns its backing buffer.
///
/// # Invariants
///
/// - every node starts at `start + k * node_size` for `k < node_count`
/// - `node_size` is a multiple of `node_align` and at least one link wide
/// - free nodes hold the offset of the next free node in their first
///   `LINK_SIZE` bytes
///
/// # Thread Safety
///
/// `Pool` is not internally synchronized. Share it behind a lock such as
/// [`SpinMutex`](crate::SpinMutex).
#[derive(Debug)]
pub struct Pool {
    id: AllocatorId,
    epoch: u32,
    buffer: Buffer,
    /// Offset of the first node (the buffer start aligned to `node_align`).
    start: usize,
    /// Usable bytes from `start`.
    capacity: usize,
    node_size: usize,
    node_align: usize,
    /// Offset of the first free node.
    free_list: Option<usize>,
    free_count: usize,
}

impl Pool {
    /// Creates a pool over a fresh buffer of `capacity` bytes aligned to
    /// `node_align`.
    ///
    /// # Errors
    ///
    /// See [`Pool::init`]; additionally fails if the buffer cannot be
    /// allocated.
    pub fn new(capacity: usize, node_size: usize, node_align: usize) -> Result<Self> {
        let buffer = Buffer::with_alignment(capacity, node_align)?;
        Self::init(buffer, node_size, node_align)
    }

    /// Creates a pool over caller-supplied storage.
    ///
    /// The buffer start is aligned forward to `node_align`, and `node_size`
    /// is rounded up to a multiple of `node_align`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAlignment`] if `node_align` is not a power of two
    /// - [`Error::NodeTooSmall`] if a node cannot hold a free-list link
    /// - [`Error::BufferTooSmall`] if not even one node fits
    pub fn init(buffer: Buffer, node_size: usize, node_align: usize) -> Result<Self> {
        if !is_valid_alignment(node_align) {
            return Err(Error::InvalidAlignment {
                alignment: node_align,
            });
        }

        let start = padding_for(buffer.addr(), node_align);
        let capacity = buffer.capacity().saturating_sub(start);
        let node_size = align_forward_size(node_size, node_align);

        if node_size < LINK_SIZE {
            return Err(Error::NodeTooSmall {
                node_size,
                minimum: LINK_SIZE,
            });
        }
        if capacity < node_size {
            return Err(Error::BufferTooSmall {
                capacity,
                node_size,
            });
        }

        let mut pool = Pool {
            id: AllocatorId::next(),
            epoch: 0,
            buffer,
            start,
            capacity,
            node_size,
            node_align,
            free_list: None,
            free_count: 0,
        };
        pool.relink();

        debug!(
            "pool {} created: {} nodes of {} bytes",
            pool.id.as_u32(),
            pool.node_count(),
            node_size
        );
        Ok(pool)
    }

    /// Tears the pool down and hands the backing storage back.
    #[must_use]
    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }

    /// Size of every node, after rounding to the node alignment.
    #[must_use]
    pub const fn node_size(&self) -> usize {
        self.node_size
    }

    /// Alignment of every node.
    #[must_use]
    pub const fn node_align(&self) -> usize {
        self.node_align
    }

    /// Total number of nodes.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.capacity / self.node_size
    }

    /// Number of nodes currently on the free list.
    #[must_use]
    pub const fn free_count(&self) -> usize {
        self.free_count
    }

    /// Returns `true` if `allocation` is a live node handle of this pool.
    #[must_use]
    pub fn owns(&self, allocation: Allocation) -> bool {
        allocation.allocator() == self.id
            && allocation.epoch() == self.epoch
            && self.owns_offset(allocation.offset())
    }

    fn owns_offset(&self, offset: usize) -> bool {
        offset >= self.start
            && offset < self.start + self.capacity
            && (offset - self.start) % self.node_size == 0
    }

    /// Threads every node onto the free list, lowest address first.
    fn relink(&mut self) {
        self.free_list = None;
        self.free_count = 0;
        for index in (0..self.node_count()).rev() {
            self.push(self.start + index * self.node_size);
        }
    }

    fn push(&mut self, node: usize) {
        let next = self.free_list.unwrap_or(NIL);
        let link = &mut self.buffer.as_mut_slice()[node..node + LINK_SIZE];
        bytes::copy_nonoverlapping(link, &next.to_ne_bytes());
        self.free_list = Some(node);
        self.free_count += 1;
    }

    fn pop(&mut self) -> Option<usize> {
        let node = self.free_list?;

        let mut link = [0u8; LINK_SIZE];
        link.copy_from_slice(&self.buffer.as_slice()[node..node + LINK_SIZE]);
        let next = usize::from_ne_bytes(link);

        self.free_list = (next != NIL).then_some(next);
        self.free_count -= 1;
        Some(node)
    }
}

impl Allocator for Pool {
    fn id(&self) -> AllocatorId {
        self.id
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FREE_ALL | Capabilities::FREE_ANY | Capabilities::RESIZE
    }

    fn alloc(&mut self, size: usize, align: usize) -> Option<Allocation> {
        check_alignment(align);

        if size > self.node_size || align > self.node_align {
            trace!(
                "pool {} cannot serve {size} bytes at align {align} (node {} at align {})",
                self.id.as_u32(),
                self.node_size,
                self.node_align
            );
            return None;
        }

        let Some(node) = self.pop() else {
            trace!("pool {} exhausted", self.id.as_u32());
            return None;
        };

        bytes::set(&mut self.buffer.as_mut_slice()[node..node + self.node_size], 0);
        Some(Allocation::new(self.id, self.epoch, node, size))
    }

    fn resize(
        &mut self,
        allocation: Allocation,
        new_size: usize,
    ) -> Option<Allocation> {
        check_owner(self.id, self.epoch, allocation);
        debug_assert!(
            self.owns_offset(allocation.offset()),
            "pointer is not owned by allocator"
        );

        if new_size > self.node_size {
            return None;
        }

        if new_size > allocation.len() {
            let offset = allocation.offset();
            let grown = offset + allocation.len()..offset + new_size;
            bytes::set(&mut self.buffer.as_mut_slice()[grown], 0);
        }
        Some(allocation.with_len(new_size))
    }

    fn free(&mut self, allocation: Allocation) {
        debug_assert!(self.owns(allocation), "pointer is not owned by allocator");
        self.push(allocation.offset());
    }

    fn free_all(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.relink();
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_node_count() {
        let pool = Pool::new(1024, 16, 8).unwrap();
        assert_eq!(pool.node_size(), 16);
        assert_eq!(pool.node_count(), 64);
        assert_eq!(pool.free_count(), 64);
    }

    #[test]
    fn test_pool_node_size_rounds_up() {
        let pool = Pool::new(100, 10, 8).unwrap();
        assert_eq!(pool.node_size(), 16);
        assert_eq!(pool.node_count(), 6);
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut pool = Pool::new(128, 32, 16).unwrap();

        let nodes: Vec<_> = (0..4).map(|_| pool.alloc(32, 16).unwrap()).collect();
        assert!(pool.alloc(1, 1).is_none());
        assert_eq!(pool.free_count(), 0);

        // Nodes are evenly spaced and distinct.
        let mut offsets: Vec<_> = nodes.iter().map(Allocation::offset).collect();
        offsets.sort_unstable();
        assert_eq!(offsets, vec![0, 32, 64, 96]);
    }

    #[test]
    fn test_pool_free_and_reuse() {
        let mut pool = Pool::new(64, 16, 8).unwrap();
        let nodes: Vec<_> = (0..4).map(|_| pool.alloc(16, 8).unwrap()).collect();

        pool.free(nodes[2]);
        pool.free(nodes[0]);
        assert_eq!(pool.free_count(), 2);

        // LIFO reuse.
        assert_eq!(pool.alloc(16, 8).unwrap().offset(), nodes[0].offset());
        assert_eq!(pool.alloc(16, 8).unwrap().offset(), nodes[2].offset());
        assert!(pool.alloc(16, 8).is_none());
    }

    #[test]
    fn test_pool_alloc_zero_fills_reused_node() {
        let mut pool = Pool::new(64, 16, 8).unwrap();
        let node = pool.alloc(16, 8).unwrap();
        pool.bytes_mut(node).fill(0xEE);
        pool.free(node);

        let again = pool.alloc(16, 8).unwrap();
        assert_eq!(again.offset(), node.offset());
        assert!(pool.bytes(again).iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pool_rejects_oversized_requests() {
        let mut pool = Pool::new(64, 16, 8).unwrap();
        assert!(pool.alloc(17, 8).is_none());
        assert!(pool.alloc(8, 16).is_none());
        assert_eq!(pool.free_count(), 4);
    }

    #[test]
    fn test_pool_resize_within_node() {
        let mut pool = Pool::new(64, 16, 8).unwrap();
        let node = pool.alloc(4, 8).unwrap();
        pool.bytes_mut(node).copy_from_slice(b"abcd");

        let grown = pool.resize(node, 16).unwrap();
        assert_eq!(grown.offset(), node.offset());
        assert_eq!(&pool.bytes(grown)[..4], b"abcd");
        assert!(pool.resize(grown, 17).is_none());
    }

    #[test]
    fn test_pool_free_all_relinks_every_node() {
        let mut pool = Pool::new(256, 32, 8).unwrap();
        for _ in 0..5 {
            pool.alloc(32, 8).unwrap();
        }
        pool.free_all();
        assert_eq!(pool.free_count(), 8);

        let mut offsets: Vec<_> =
            (0..8).map(|_| pool.alloc(32, 8).unwrap().offset()).collect();
        offsets.sort_unstable();
        let expected: Vec<_> = (0..8).map(|i| i * 32).collect();
        assert_eq!(offsets, expected);
    }

    #[test]
    fn test_pool_owns() {
        let mut pool = Pool::new(64, 16, 8).unwrap();
        let other = Pool::new(64, 16, 8).unwrap();
        let node = pool.alloc(16, 8).unwrap();
        assert!(pool.owns(node));
        assert!(!other.owns(node));

        pool.free_all();
        assert!(!pool.owns(node));
    }

    #[test]
    fn test_pool_init_errors() {
        assert_eq!(
            Pool::new(64, 2, 2).unwrap_err(),
            Error::NodeTooSmall {
                node_size: 2,
                minimum: LINK_SIZE
            }
        );
        assert_eq!(
            Pool::new(16, 32, 8).unwrap_err(),
            Error::BufferTooSmall {
                capacity: 16,
                node_size: 32
            }
        );
        assert_eq!(
            Pool::new(64, 16, 12).unwrap_err(),
            Error::InvalidAlignment { alignment: 12 }
        );
    }

    #[test]
    fn test_pool_init_aligns_unaligned_storage() {
        // A byte-aligned buffer may start anywhere; nodes must still be aligned.
        let buffer = Buffer::with_alignment(200, 1).unwrap();
        let base = buffer.addr();
        let mut pool = Pool::init(buffer, 24, 8).unwrap();

        let expected_start = padding_for(base, 8);
        assert_eq!(pool.node_count(), (200 - expected_start) / 24);
        while let Some(node) = pool.alloc(24, 8) {
            assert_eq!((base + node.offset()) % 8, 0);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not owned by allocator")]
    fn test_pool_foreign_free_panics_in_debug() {
        let mut first = Pool::new(64, 16, 8).unwrap();
        let mut second = Pool::new(64, 16, 8).unwrap();
        let node = first.alloc(16, 8).unwrap();
        second.free(node);
    }
}
