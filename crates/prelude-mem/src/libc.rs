//! General-purpose allocator backed by the platform heap.
//!
//! Each allocation is its own block from `std::alloc`. The allocator keeps a
//! table of live blocks so handles can be resolved back to memory, and frees
//! whatever is still outstanding when it is dropped.
//!
//! It cannot free everything at once and cannot resize in place; use
//! [`allocator::realloc`](crate::allocator::realloc) to grow a block by
//! moving it.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use hashbrown::HashMap;
use prelude_log::{trace, warn};

use crate::allocator::{Allocation, Allocator, AllocatorId, check_alignment};
use crate::capability::Capabilities;

/// One live heap block.
#[derive(Debug)]
struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
    /// Requested size; the layout is at least one byte.
    len: usize,
}

/// Allocator that forwards every request to the platform heap.
///
/// Handles use the block address as their offset, so they stay valid until
/// the block is freed.
#[derive(Debug)]
pub struct LibcAllocator {
    id: AllocatorId,
    blocks: HashMap<usize, Block>,
}

// SAFETY: the allocator uniquely owns every block in its table.
unsafe impl Send for LibcAllocator {}

impl LibcAllocator {
    /// Creates an allocator with no live blocks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: AllocatorId::next(),
            blocks: HashMap::new(),
        }
    }

    /// Number of blocks not yet freed.
    #[must_use]
    pub fn live_blocks(&self) -> usize {
        self.blocks.len()
    }

    #[track_caller]
    fn block(&self, allocation: Allocation) -> &Block {
        assert_eq!(
            allocation.allocator(),
            self.id,
            "allocation is not owned by this allocator"
        );
        match self.blocks.get(&allocation.offset()) {
            Some(block) => block,
            None => panic!("allocation was already freed"),
        }
    }
}

impl Default for LibcAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for LibcAllocator {
    fn id(&self) -> AllocatorId {
        self.id
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALIGN_ANY | Capabilities::ALLOC_ANY | Capabilities::FREE_ANY
    }

    fn alloc(&mut self, size: usize, align: usize) -> Option<Allocation> {
        check_alignment(align);

        let layout = Layout::from_size_align(size.max(1), align).ok()?;
        // SAFETY: layout has a non-zero size.
        let ptr = NonNull::new(unsafe { alloc::alloc_zeroed(layout) });
        let Some(ptr) = ptr else {
            trace!("heap refused {size} bytes at align {align}");
            return None;
        };

        let addr = ptr.as_ptr().addr();
        self.blocks.insert(addr, Block { ptr, layout, len: size });
        Some(Allocation::new(self.id, 0, addr, size))
    }

    fn resize(
        &mut self,
        _allocation: Allocation,
        _new_size: usize,
    ) -> Option<Allocation> {
        None
    }

    fn free(&mut self, allocation: Allocation) {
        debug_assert_eq!(
            allocation.allocator(),
            self.id,
            "pointer is not owned by allocator"
        );

        debug_assert!(
            self.blocks.contains_key(&allocation.offset()),
            "double free of block {:#x}",
            allocation.offset()
        );
        let Some(block) = self.blocks.remove(&allocation.offset()) else {
            return;
        };

        // SAFETY: the block was allocated with this layout and is removed from
        // the table, so it is freed exactly once.
        unsafe { alloc::dealloc(block.ptr.as_ptr(), block.layout) };
    }

    fn free_all(&mut self) {
        warn!("free_all is not supported by the libc allocator");
    }

    fn bytes(&self, allocation: Allocation) -> &[u8] {
        let block = self.block(allocation);
        // SAFETY: the block holds at least `len` initialised bytes and lives
        // as long as it stays in the table, which `&self` pins.
        unsafe { std::slice::from_raw_parts(block.ptr.as_ptr(), block.len) }
    }

    fn bytes_mut(&mut self, allocation: Allocation) -> &mut [u8] {
        let block = self.block(allocation);
        let (ptr, len) = (block.ptr, block.len);
        // SAFETY: as above; `&mut self` gives exclusive access.
        unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), len) }
    }

    fn copy_nonoverlapping(
        &mut self,
        src: Allocation,
        dst: Allocation,
        len: usize,
    ) {
        let src_block = self.block(src);
        let dst_block = self.block(dst);
        assert!(
            len <= src_block.len && len <= dst_block.len,
            "copy of {len} bytes exceeds source or destination"
        );
        assert_ne!(
            src.offset(),
            dst.offset(),
            "source and destination must not overlap"
        );

        // SAFETY: distinct live blocks never overlap and both hold `len` bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(
                src_block.ptr.as_ptr(),
                dst_block.ptr.as_ptr(),
                len,
            );
        }
    }
}

impl Drop for LibcAllocator {
    fn drop(&mut self) {
        if !self.blocks.is_empty() {
            trace!("releasing {} outstanding heap blocks", self.blocks.len());
        }
        for (_, block) in self.blocks.drain() {
            // SAFETY: every block in the table is live with this layout.
            unsafe { alloc::dealloc(block.ptr.as_ptr(), block.layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator;

    #[test]
    fn test_libc_capabilities() {
        let heap = LibcAllocator::new();
        let caps = heap.capabilities();
        assert!(caps.contains(Capabilities::ALLOC_ANY | Capabilities::FREE_ANY));
        assert!(!caps.contains(Capabilities::FREE_ALL));
        assert!(!caps.contains(Capabilities::RESIZE));
    }

    #[test]
    fn test_libc_alloc_is_aligned_and_zeroed() {
        let mut heap = LibcAllocator::new();
        for align in [1, 8, 64, 4096] {
            let block = heap.alloc(100, align).unwrap();
            assert_eq!(block.offset() % align, 0);
            assert_eq!(heap.bytes(block).len(), 100);
            assert!(heap.bytes(block).iter().all(|&b| b == 0));
        }
        assert_eq!(heap.live_blocks(), 4);
    }

    #[test]
    fn test_libc_free_releases_block() {
        let mut heap = LibcAllocator::new();
        let a = heap.alloc(32, 8).unwrap();
        let b = heap.alloc(32, 8).unwrap();
        heap.free(a);
        assert_eq!(heap.live_blocks(), 1);
        heap.free(b);
        assert_eq!(heap.live_blocks(), 0);
    }

    #[test]
    fn test_libc_resize_unsupported() {
        let mut heap = LibcAllocator::new();
        let a = heap.alloc(32, 8).unwrap();
        assert!(heap.resize(a, 16).is_none());
        assert!(heap.resize(a, 64).is_none());
    }

    #[test]
    fn test_libc_free_all_is_noop() {
        let mut heap = LibcAllocator::new();
        let a = heap.alloc(8, 8).unwrap();
        heap.bytes_mut(a).copy_from_slice(b"survives");
        heap.free_all();
        assert_eq!(heap.bytes(a), b"survives");
    }

    #[test]
    fn test_libc_realloc_moves() {
        let mut heap = LibcAllocator::new();
        let a = heap.alloc(4, 4).unwrap();
        heap.bytes_mut(a).copy_from_slice(b"wxyz");

        let b = allocator::realloc(&mut heap, Some(a), 12, 4).unwrap();
        assert_eq!(&heap.bytes(b)[..4], b"wxyz");
        assert!(heap.bytes(b)[4..].iter().all(|&byte| byte == 0));
        assert_eq!(heap.live_blocks(), 1);
    }

    #[test]
    fn test_libc_zero_sized_alloc() {
        let mut heap = LibcAllocator::new();
        let empty = heap.alloc(0, 16).unwrap();
        assert!(empty.is_empty());
        assert!(heap.bytes(empty).is_empty());
        heap.free(empty);
    }

    #[test]
    #[should_panic(expected = "not owned by this allocator")]
    fn test_libc_foreign_handle_panics() {
        let mut first = LibcAllocator::new();
        let second = LibcAllocator::new();
        let a = first.alloc(8, 8).unwrap();
        let _ = second.bytes(a);
    }
}
