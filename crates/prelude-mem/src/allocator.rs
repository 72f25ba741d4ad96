//! The uniform allocator interface.
//!
//! Every strategy ([`Arena`](crate::Arena), [`Pool`](crate::Pool),
//! [`LibcAllocator`](crate::LibcAllocator)) implements [`Allocator`]. Callers
//! hold [`Allocation`] handles instead of raw pointers and reach the bytes
//! through the allocator that produced them.
//!
//! # Failure model
//!
//! - Exhaustion and unsupported operations are ordinary results: `alloc` and
//!   `resize` return `None`, `free`/`free_all` become no-ops.
//! - Misuse is a contract violation and panics: a non power-of-two alignment,
//!   a handle from another allocator, or a handle that outlived `free_all`.
//!   Ownership checks on `free` are debug-only.
//!
//! # Examples
//!
//! ```
//! use prelude_mem::{allocator, Arena, Allocator, Capabilities};
//!
//! let mut arena = Arena::new(1024).unwrap();
//!
//! let caps = allocator::query(&arena);
//! assert!(caps.contains(Capabilities::FREE_ALL));
//!
//! let a = allocator::alloc(&mut arena, 16, 8).unwrap();
//! arena.bytes_mut(a).copy_from_slice(b"0123456789abcdef");
//!
//! // Grow; the arena resizes its last allocation in place.
//! let a = allocator::realloc(&mut arena, Some(a), 32, 8).unwrap();
//! assert_eq!(&arena.bytes(a)[..16], b"0123456789abcdef");
//! ```

use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::align::is_valid_alignment;
use crate::capability::Capabilities;

/// Identity of one allocator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocatorId(u32);

impl AllocatorId {
    /// Returns a process-wide unique id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// A handle to a region handed out by an allocator.
///
/// The handle names `len` bytes at `offset` inside the allocator identified by
/// `allocator`, valid during `epoch` (every `free_all` starts a new epoch).
/// It carries no lifetime and no pointer; it is only meaningful when given
/// back to the allocator that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    allocator: AllocatorId,
    epoch: u32,
    /// Tells apart allocations that reuse an offset within one epoch.
    serial: u32,
    offset: usize,
    len: usize,
}

impl Allocation {
    pub(crate) const fn new(
        allocator: AllocatorId,
        epoch: u32,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            allocator,
            epoch,
            serial: 0,
            offset,
            len,
        }
    }

    pub(crate) const fn with_serial(self, serial: u32) -> Self {
        Self { serial, ..self }
    }

    pub(crate) const fn serial(&self) -> u32 {
        self.serial
    }

    /// The allocator this handle belongs to.
    #[must_use]
    pub const fn allocator(&self) -> AllocatorId {
        self.allocator
    }

    /// The `free_all` generation this handle was issued in.
    #[must_use]
    pub const fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Position of the region inside its allocator.
    ///
    /// For arenas and pools this is a byte offset into the backing buffer;
    /// for the libc allocator it is the block address.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Size of the region in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` for zero-sized regions.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn with_len(self, len: usize) -> Self {
        Self { len, ..self }
    }

    pub(crate) const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// A memory allocation strategy.
///
/// Implementations are not internally synchronized; wrap a shared instance
/// in [`SpinMutex`](crate::SpinMutex) (or any lock) to use it from several
/// threads.
pub trait Allocator {
    /// Identity used to tag every [`Allocation`] this allocator returns.
    fn id(&self) -> AllocatorId;

    /// The operations this strategy supports.
    fn capabilities(&self) -> Capabilities;

    /// Returns a zero-filled region of `size` bytes aligned to `align`, or
    /// `None` when the request cannot be satisfied.
    ///
    /// # Panics
    ///
    /// Panics if `align` is not a power of two.
    fn alloc(&mut self, size: usize, align: usize) -> Option<Allocation>;

    /// Grows or shrinks `allocation` without moving it. Returns the updated
    /// handle (same offset, new length) or `None` if that is not possible.
    fn resize(
        &mut self,
        allocation: Allocation,
        new_size: usize,
    ) -> Option<Allocation>;

    /// Releases a single allocation. A no-op for strategies that cannot free
    /// individually.
    fn free(&mut self, allocation: Allocation);

    /// Releases every outstanding allocation at once. A no-op for strategies
    /// that do not advertise [`Capabilities::FREE_ALL`].
    fn free_all(&mut self);

    /// The bytes of a live allocation.
    ///
    /// # Panics
    ///
    /// Panics if `allocation` was not issued by this allocator or predates
    /// the last `free_all`.
    fn bytes(&self, allocation: Allocation) -> &[u8];

    /// The bytes of a live allocation, mutably.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Allocator::bytes`].
    fn bytes_mut(&mut self, allocation: Allocation) -> &mut [u8];

    /// Copies the first `len` bytes of `src` to the front of `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds either region or either handle is not live.
    fn copy_nonoverlapping(
        &mut self,
        src: Allocation,
        dst: Allocation,
        len: usize,
    );
}

/// Asserts the allocation alignment contract.
#[inline]
#[track_caller]
pub(crate) fn check_alignment(align: usize) {
    assert!(
        is_valid_alignment(align),
        "alignment must be a power of two, got {align}"
    );
}

/// Asserts that `allocation` is a live handle of the allocator `id`/`epoch`.
#[inline]
#[track_caller]
pub(crate) fn check_owner(id: AllocatorId, epoch: u32, allocation: Allocation) {
    assert_eq!(
        allocation.allocator, id,
        "allocation is not owned by this allocator"
    );
    assert_eq!(
        allocation.epoch, epoch,
        "allocation was invalidated by free_all"
    );
}

/// Returns the capability set of `allocator`.
pub fn query<A: Allocator + ?Sized>(allocator: &A) -> Capabilities {
    allocator.capabilities()
}

/// Allocates `size` zero-filled bytes aligned to `align`.
///
/// # Panics
///
/// Panics if `align` is not a power of two.
pub fn alloc<A: Allocator + ?Sized>(
    allocator: &mut A,
    size: usize,
    align: usize,
) -> Option<Allocation> {
    allocator.alloc(size, align)
}

/// Allocates room for `count` values of `T`.
///
/// Returns `None` on exhaustion or when the byte size overflows.
pub fn alloc_array<T, A: Allocator + ?Sized>(
    allocator: &mut A,
    count: usize,
) -> Option<Allocation> {
    let size = std::mem::size_of::<T>().checked_mul(count)?;
    allocator.alloc(size, std::mem::align_of::<T>())
}

/// Resizes `allocation` in place.
pub fn resize<A: Allocator + ?Sized>(
    allocator: &mut A,
    allocation: Allocation,
    new_size: usize,
) -> Option<Allocation> {
    allocator.resize(allocation, new_size)
}

/// Frees `allocation`; freeing `None` is a no-op.
pub fn free<A: Allocator + ?Sized>(
    allocator: &mut A,
    allocation: Option<Allocation>,
) {
    if let Some(allocation) = allocation {
        allocator.free(allocation);
    }
}

/// Frees every allocation owned by `allocator`.
pub fn free_all<A: Allocator + ?Sized>(allocator: &mut A) {
    allocator.free_all();
}

/// Resizes `old` to `new_size`, moving it if it cannot grow in place.
///
/// The in-place path is tried first. Otherwise a fresh region is allocated,
/// the lesser of the old and new sizes is copied over and the old region is
/// freed. `None` as `old` behaves like [`alloc`]. On failure `old` is left
/// untouched and still owned by the caller.
pub fn realloc<A: Allocator + ?Sized>(
    allocator: &mut A,
    old: Option<Allocation>,
    new_size: usize,
    align: usize,
) -> Option<Allocation> {
    let Some(old) = old else {
        return allocator.alloc(new_size, align);
    };

    if let Some(resized) = allocator.resize(old, new_size) {
        return Some(resized);
    }

    let moved = allocator.alloc(new_size, align)?;
    allocator.copy_nonoverlapping(old, moved, old.len().min(new_size));
    allocator.free(old);
    Some(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arena, Pool};

    #[test]
    fn test_allocator_ids_are_unique() {
        let a = AllocatorId::next();
        let b = AllocatorId::next();
        assert_ne!(a, b);
        assert!(b.as_u32() > a.as_u32());
    }

    #[test]
    fn test_allocation_accessors() {
        let id = AllocatorId::next();
        let allocation = Allocation::new(id, 3, 64, 16);
        assert_eq!(allocation.allocator(), id);
        assert_eq!(allocation.epoch(), 3);
        assert_eq!(allocation.offset(), 64);
        assert_eq!(allocation.len(), 16);
        assert!(!allocation.is_empty());
        assert_eq!(allocation.range(), 64..80);
        assert_eq!(allocation.with_len(0).range(), 64..64);
        assert_eq!(allocation.with_serial(9).with_len(4).serial(), 9);
        assert_ne!(allocation, allocation.with_serial(1));
    }

    #[test]
    fn test_free_none_is_noop() {
        let mut arena = Arena::new(64).unwrap();
        free(&mut arena, None);
        assert_eq!(arena.offset(), 0);
    }

    #[test]
    fn test_realloc_none_allocates() {
        let mut arena = Arena::new(64).unwrap();
        let allocation = realloc(&mut arena, None, 24, 8).unwrap();
        assert_eq!(allocation.len(), 24);
    }

    #[test]
    fn test_realloc_moves_and_preserves_prefix() {
        let mut arena = Arena::new(256).unwrap();
        let first = alloc(&mut arena, 8, 8).unwrap();
        arena.bytes_mut(first).copy_from_slice(b"abcdefgh");
        // A later allocation pins `first`, forcing a move.
        let _pin = alloc(&mut arena, 8, 8).unwrap();

        let grown = realloc(&mut arena, Some(first), 32, 8).unwrap();
        assert_ne!(grown.offset(), first.offset());
        assert_eq!(&arena.bytes(grown)[..8], b"abcdefgh");
        assert!(arena.bytes(grown)[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_realloc_shrink_copies_new_size() {
        let mut pool = Pool::new(256, 16, 8).unwrap();
        let node = alloc(&mut pool, 16, 8).unwrap();
        pool.bytes_mut(node).copy_from_slice(b"0123456789abcdef");

        let shrunk = realloc(&mut pool, Some(node), 4, 8).unwrap();
        assert_eq!(shrunk.offset(), node.offset());
        assert_eq!(pool.bytes(shrunk), b"0123");
    }

    #[test]
    fn test_realloc_failure_keeps_old() {
        let mut pool = Pool::new(64, 16, 8).unwrap();
        let node = alloc(&mut pool, 8, 8).unwrap();
        pool.bytes_mut(node).copy_from_slice(b"keepthis");

        // Larger than a node: resize fails and so does alloc.
        assert!(realloc(&mut pool, Some(node), 64, 8).is_none());
        assert_eq!(pool.bytes(node), b"keepthis");
    }

    #[test]
    fn test_alloc_array_sizes() {
        let mut arena = Arena::new(256).unwrap();
        let values = alloc_array::<u64, _>(&mut arena, 4).unwrap();
        assert_eq!(values.len(), 32);
        assert!(alloc_array::<u64, _>(&mut arena, usize::MAX).is_none());
    }

    #[test]
    fn test_query_through_dyn() {
        let arena = Arena::new(16).unwrap();
        let dynamic: &dyn Allocator = &arena;
        assert_eq!(query(dynamic), arena.capabilities());
    }
}
