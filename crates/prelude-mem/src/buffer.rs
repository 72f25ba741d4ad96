//! Owned, aligned backing storage for the arena and pool allocators.
//!
//! A [`Buffer`] is one contiguous block obtained from `std::alloc` and
//! returned to it on drop. It is zero-initialised and never moves, so an
//! offset into it is a stable name for the bytes at that position.
//!
//! # Examples
//!
//! ```
//! use prelude_mem::Buffer;
//!
//! let buffer = Buffer::with_alignment(4096, 64).unwrap();
//! assert_eq!(buffer.capacity(), 4096);
//! assert_eq!(buffer.as_slice().as_ptr().addr() % 64, 0);
//! assert!(buffer.as_slice().iter().all(|&b| b == 0));
//! ```

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::NonNull;

use crate::align::is_valid_alignment;
use crate::error::{Error, Result};

/// A heap block with a fixed size and alignment.
///
/// # Safety
///
/// - `start` points to `capacity` bytes allocated with this size and alignment (or is
///   dangling when `capacity == 0`, in which case nothing was allocated)
/// - The memory is initialised (zeroed on creation) for its whole lifetime
/// - The block is uniquely owned; shared access hands out `&[u8]`, exclusive
///   access hands out `&mut [u8]`
pub struct Buffer {
    start: NonNull<u8>,
    capacity: usize,
    alignment: usize,
}

// SAFETY: Buffer uniquely owns its allocation, like Box<[u8]>.
unsafe impl Send for Buffer {}
// SAFETY: &Buffer only exposes &[u8].
unsafe impl Sync for Buffer {}

impl Buffer {
    /// Alignment used by [`Buffer::new`].
    pub const DEFAULT_ALIGNMENT: usize = 16;

    /// Allocates a zeroed buffer aligned to [`Buffer::DEFAULT_ALIGNMENT`].
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_alignment(capacity, Self::DEFAULT_ALIGNMENT)
    }

    /// Allocates a zeroed buffer whose first byte is aligned to `alignment`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAlignment`] if `alignment` is not a power of two
    /// - [`Error::BufferAllocationFailed`] if the layout is unrepresentable or
    ///   the platform allocator returns null
    pub fn with_alignment(capacity: usize, alignment: usize) -> Result<Self> {
        if !is_valid_alignment(alignment) {
            return Err(Error::InvalidAlignment { alignment });
        }

        if capacity == 0 {
            // Zero-sized blocks are never handed to the allocator.
            let start = NonNull::new(std::ptr::without_provenance_mut::<u8>(alignment))
                .ok_or(Error::InvalidAlignment { alignment })?;
            return Ok(Buffer {
                start,
                capacity,
                alignment,
            });
        }

        let layout = Layout::from_size_align(capacity, alignment)
            .map_err(|_| Error::BufferAllocationFailed { size: capacity })?;

        // SAFETY: layout has a non-zero size (checked above).
        let start = unsafe { alloc::alloc_zeroed(layout) };
        let start = NonNull::new(start)
            .ok_or(Error::BufferAllocationFailed { size: capacity })?;

        Ok(Buffer {
            start,
            capacity,
            alignment,
        })
    }

    /// Total size in bytes.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Alignment of the first byte.
    #[must_use]
    pub const fn alignment(&self) -> usize {
        self.alignment
    }

    /// Address of the first byte, for alignment arithmetic.
    #[must_use]
    pub fn addr(&self) -> usize {
        self.start.as_ptr().addr()
    }

    /// The whole buffer as a byte slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: start is valid for capacity initialised bytes (see type docs).
        unsafe { std::slice::from_raw_parts(self.start.as_ptr(), self.capacity) }
    }

    /// The whole buffer as a mutable byte slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe {
            std::slice::from_raw_parts_mut(self.start.as_ptr(), self.capacity)
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }

        // SAFETY: this exact layout was validated in with_alignment.
        let layout = unsafe {
            Layout::from_size_align_unchecked(self.capacity, self.alignment)
        };

        unsafe {
            alloc::dealloc(self.start.as_ptr(), layout);
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("start", &self.start)
            .field("capacity", &self.capacity)
            .field("alignment", &self.alignment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_is_zeroed_and_aligned() {
        for alignment in [1, 8, 16, 256, 4096] {
            let buffer = Buffer::with_alignment(1000, alignment).unwrap();
            assert_eq!(buffer.addr() % alignment, 0);
            assert_eq!(buffer.as_slice().len(), 1000);
            assert!(buffer.as_slice().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_buffer_writes_persist() {
        let mut buffer = Buffer::new(64).unwrap();
        buffer.as_mut_slice()[10] = 0xAB;
        assert_eq!(buffer.as_slice()[10], 0xAB);
    }

    #[test]
    fn test_buffer_rejects_bad_alignment() {
        assert_eq!(
            Buffer::with_alignment(64, 24).unwrap_err(),
            Error::InvalidAlignment { alignment: 24 }
        );
    }

    #[test]
    fn test_zero_capacity_buffer() {
        let mut buffer = Buffer::new(0).unwrap();
        assert_eq!(buffer.capacity(), 0);
        assert!(buffer.as_slice().is_empty());
        assert!(buffer.as_mut_slice().is_empty());
    }

    #[test]
    fn test_unrepresentable_layout_fails() {
        assert_eq!(
            Buffer::with_alignment(usize::MAX, 16).unwrap_err(),
            Error::BufferAllocationFailed { size: usize::MAX }
        );
    }
}
