//! Growable byte string backed by any [`Allocator`].
//!
//! The builder owns one allocation and grows it through
//! [`allocator::realloc`], so on an arena (where the builder's buffer is
//! usually the last allocation) growth happens in place.
//!
//! # Examples
//!
//! ```
//! use prelude_mem::Arena;
//! use prelude_str::{Str, StringBuilder};
//!
//! let mut arena = Arena::new(1024).unwrap();
//!
//! let mut builder = StringBuilder::new(&mut arena, 8).unwrap();
//! builder.append_str("hello".into()).unwrap();
//! builder.append_rune(' ' as u32).unwrap();
//! builder.append_bytes("wörld".as_bytes()).unwrap();
//! let text = builder.build().unwrap();
//!
//! assert_eq!(Str::from_allocation(&arena, text), "hello wörld");
//! ```

use std::fmt;

use prelude_log::trace;
use prelude_mem::{Allocation, Allocator, allocator};

use crate::error::{Error, Result};
use crate::string::Str;
use crate::utf8;

/// Smallest capacity the builder grows to.
const MIN_GROWTH: usize = 16;

/// An append-only byte buffer living in an allocator.
///
/// The buffer is freed on drop unless it was handed out by
/// [`StringBuilder::build`].
pub struct StringBuilder<'a> {
    allocator: &'a mut dyn Allocator,
    data: Option<Allocation>,
    len: usize,
}

impl<'a> StringBuilder<'a> {
    /// Creates a builder with room for `initial_cap` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the initial buffer cannot be allocated.
    pub fn new(allocator: &'a mut dyn Allocator, initial_cap: usize) -> Result<Self> {
        let data = if initial_cap > 0 {
            let allocation = allocator.alloc(initial_cap, 1).ok_or(Error::OutOfMemory {
                requested: initial_cap,
            })?;
            Some(allocation)
        } else {
            None
        };

        Ok(Self {
            allocator,
            data,
            len: 0,
        })
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes that fit before the next growth.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.map_or(0, |data| data.len())
    }

    /// The bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self.data {
            Some(data) => &self.allocator.bytes(data)[..self.len],
            None => &[],
        }
    }

    /// The bytes written so far as a string view.
    #[must_use]
    pub fn as_str(&self) -> Str<'_> {
        Str::from_bytes(self.as_bytes())
    }

    /// Appends raw bytes and returns how many were written.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the buffer has to grow and cannot. The
    /// builder keeps its previous contents in that case.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        if bytes.is_empty() {
            return Ok(0);
        }

        let needed = self.len + bytes.len();
        if needed > self.capacity() {
            self.grow(needed)?;
        }

        let data = self.data.ok_or(Error::OutOfMemory { requested: needed })?;
        self.allocator.bytes_mut(data)[self.len..needed].copy_from_slice(bytes);
        self.len = needed;
        Ok(bytes.len())
    }

    /// Appends the bytes of a string view.
    ///
    /// # Errors
    ///
    /// See [`StringBuilder::append_bytes`].
    pub fn append_str(&mut self, s: Str<'_>) -> Result<usize> {
        self.append_bytes(s.as_bytes())
    }

    /// Appends the UTF-8 encoding of `codepoint`, or U+FFFD if it cannot be
    /// encoded.
    ///
    /// # Errors
    ///
    /// See [`StringBuilder::append_bytes`].
    pub fn append_rune(&mut self, codepoint: u32) -> Result<usize> {
        let mut encoded = utf8::encode(codepoint);
        if encoded.is_error() {
            encoded = utf8::encode(utf8::ERROR_RUNE);
        }
        self.append_bytes(encoded.as_bytes())
    }

    /// Empties the builder, keeping its capacity.
    pub fn clear(&mut self) {
        if let Some(data) = self.data {
            self.allocator.bytes_mut(data)[..self.len].fill(0);
        }
        self.len = 0;
    }

    /// Finishes the builder and hands its buffer to the caller.
    ///
    /// The buffer is shrunk to the written length (in place when the
    /// allocator supports it). The returned allocation belongs to the
    /// allocator the builder was created with.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the final buffer cannot be produced.
    pub fn build(mut self) -> Result<Allocation> {
        let len = self.len;
        let Some(data) = self.data.take() else {
            return self
                .allocator
                .alloc(0, 1)
                .ok_or(Error::OutOfMemory { requested: 0 });
        };

        match allocator::realloc(&mut *self.allocator, Some(data), len, 1) {
            Some(built) => Ok(built),
            None => {
                self.allocator.free(data);
                Err(Error::OutOfMemory { requested: len })
            }
        }
    }

    /// Frees the buffer and consumes the builder.
    pub fn destroy(self) {
        drop(self);
    }

    fn grow(&mut self, needed: usize) -> Result<()> {
        let cap = self.capacity();
        let new_cap = MIN_GROWTH.max(cap * 7 / 4).max(needed);

        let grown = allocator::realloc(&mut *self.allocator, self.data, new_cap, 1)
            .ok_or(Error::OutOfMemory { requested: new_cap })?;

        if self.data.is_some_and(|old| old.offset() != grown.offset()) {
            trace!("string builder moved while growing {cap} -> {new_cap}");
        }
        self.data = Some(grown);
        Ok(())
    }
}

impl Drop for StringBuilder<'_> {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.allocator.free(data);
        }
    }
}

impl fmt::Write for StringBuilder<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append_bytes(s.as_bytes()).map(|_| ()).map_err(|_| fmt::Error)
    }
}

impl fmt::Debug for StringBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringBuilder")
            .field("data", &self.data)
            .field("len", &self.len)
            .field("text", &self.as_str())
            .finish()
    }
}
