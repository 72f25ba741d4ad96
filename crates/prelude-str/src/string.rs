//! Non-owning UTF-8 byte-string views.
//!
//! A [`Str`] is a borrowed run of bytes that is expected to hold UTF-8 but is
//! never assumed to be valid or null-terminated. Slicing and trimming only
//! narrow the view; copying goes through an [`Allocator`].

use std::fmt;

use prelude_mem::{Allocation, Allocator};

use crate::error::{Error, Result};
use crate::utf8::{Reversed, Utf8Iter};

/// A borrowed UTF-8 byte string.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Str<'a> {
    bytes: &'a [u8],
}

impl<'a> Str<'a> {
    /// The empty view.
    pub const EMPTY: Str<'static> = Str { bytes: &[] };

    /// Views a Rust string slice.
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub const fn from_str(s: &'a str) -> Self {
        Self {
            bytes: s.as_bytes(),
        }
    }

    /// Views raw bytes without validating them.
    #[must_use]
    pub const fn from_bytes(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Views the bytes of an allocation.
    ///
    /// # Panics
    ///
    /// Panics if `allocation` is not live in `allocator`.
    #[must_use]
    pub fn from_allocation<A: Allocator + ?Sized>(
        allocator: &'a A,
        allocation: Allocation,
    ) -> Self {
        Self::from_bytes(allocator.bytes(allocation))
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The `byte_count` bytes starting at byte `start`, or `None` if that
    /// range leaves the view.
    #[must_use]
    pub fn sub(&self, start: usize, byte_count: usize) -> Option<Str<'a>> {
        let end = start.checked_add(byte_count)?;
        self.bytes.get(start..end).map(Str::from_bytes)
    }

    /// Number of codepoints, counting each malformed byte as one.
    #[must_use]
    pub fn codepoint_count(&self) -> usize {
        self.iter().count()
    }

    /// Byte offset of the `n`th codepoint, or the length when the view has
    /// `n` or fewer codepoints.
    #[must_use]
    pub fn codepoint_offset(&self, n: usize) -> usize {
        let mut iter = self.iter();
        for _ in 0..n {
            if iter.next().is_none() {
                break;
            }
        }
        iter.position()
    }

    #[must_use]
    pub fn starts_with(&self, prefix: Str<'_>) -> bool {
        self.bytes.starts_with(prefix.bytes)
    }

    #[must_use]
    pub fn ends_with(&self, suffix: Str<'_>) -> bool {
        self.bytes.ends_with(suffix.bytes)
    }

    /// Removes leading codepoints that appear in `cutset`.
    #[must_use]
    pub fn trim_leading(&self, cutset: Str<'_>) -> Str<'a> {
        let set = cutset.codepoints();
        let mut cut = 0;
        for (codepoint, len) in self.iter() {
            if !set.contains(&codepoint) {
                break;
            }
            cut += len;
        }
        Str::from_bytes(&self.bytes[cut..])
    }

    /// Removes trailing codepoints that appear in `cutset`.
    #[must_use]
    pub fn trim_trailing(&self, cutset: Str<'_>) -> Str<'a> {
        let set = cutset.codepoints();
        let mut until = self.len();
        for (codepoint, len) in self.iter_reversed() {
            if !set.contains(&codepoint) {
                break;
            }
            until -= len;
        }
        Str::from_bytes(&self.bytes[..until])
    }

    /// Removes codepoints in `cutset` from both ends.
    #[must_use]
    pub fn trim(&self, cutset: Str<'_>) -> Str<'a> {
        self.trim_trailing(cutset).trim_leading(cutset)
    }

    /// Forward codepoint iterator.
    #[must_use]
    pub const fn iter(&self) -> Utf8Iter<'a> {
        Utf8Iter::new(self.bytes)
    }

    /// Codepoints from last to first.
    #[must_use]
    pub fn iter_reversed(&self) -> Reversed<'a> {
        Utf8Iter::at_end(self.bytes).reversed()
    }

    /// Copies the bytes into a fresh allocation.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the allocator cannot provide `len` bytes.
    pub fn clone_in<A: Allocator + ?Sized>(&self, allocator: &mut A) -> Result<Allocation> {
        let allocation = allocator.alloc(self.len(), 1).ok_or(Error::OutOfMemory {
            requested: self.len(),
        })?;
        allocator.bytes_mut(allocation).copy_from_slice(self.bytes);
        Ok(allocation)
    }

    /// Allocates `self` followed by `other`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfMemory`] if the combined length cannot be allocated.
    pub fn concat_in<A: Allocator + ?Sized>(
        &self,
        other: Str<'_>,
        allocator: &mut A,
    ) -> Result<Allocation> {
        let total = self.len() + other.len();
        let allocation = allocator
            .alloc(total, 1)
            .ok_or(Error::OutOfMemory { requested: total })?;

        let bytes = allocator.bytes_mut(allocation);
        bytes[..self.len()].copy_from_slice(self.bytes);
        bytes[self.len()..].copy_from_slice(other.bytes);
        Ok(allocation)
    }

    fn codepoints(&self) -> Vec<u32> {
        self.iter().map(|(codepoint, _)| codepoint).collect()
    }
}

impl<'a> From<&'a str> for Str<'a> {
    fn from(s: &'a str) -> Self {
        Str::from_str(s)
    }
}

impl<'a> From<&'a [u8]> for Str<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Str::from_bytes(bytes)
    }
}

impl PartialEq<str> for Str<'_> {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for Str<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl<'a> IntoIterator for Str<'a> {
    type Item = (u32, usize);
    type IntoIter = Utf8Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Str<'_> {
    /// Writes the text, substituting U+FFFD for malformed bytes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;

        for (codepoint, _) in self.iter() {
            let c = char::from_u32(codepoint).unwrap_or(char::REPLACEMENT_CHARACTER);
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Str<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prelude_mem::{Arena, Pool};

    #[test]
    fn test_sub() {
        let s = Str::from_str("hello world");
        assert_eq!(s.sub(6, 5).unwrap(), "world");
        assert_eq!(s.sub(0, 0).unwrap(), "");
        assert!(s.sub(6, 6).is_none());
        assert!(s.sub(usize::MAX, 2).is_none());
    }

    #[test]
    fn test_codepoint_count_and_offset() {
        let s = Str::from_str("añ€😀");
        assert_eq!(s.len(), 10);
        assert_eq!(s.codepoint_count(), 4);
        assert_eq!(s.codepoint_offset(0), 0);
        assert_eq!(s.codepoint_offset(1), 1);
        assert_eq!(s.codepoint_offset(2), 3);
        assert_eq!(s.codepoint_offset(3), 6);
        assert_eq!(s.codepoint_offset(4), 10);
        assert_eq!(s.codepoint_offset(99), 10);
    }

    #[test]
    fn test_malformed_bytes_count_once() {
        let s = Str::from_bytes(&[0x61, 0xff, 0x62]);
        assert_eq!(s.codepoint_count(), 3);
        assert_eq!(s.to_string(), "a\u{fffd}b");
    }

    #[test]
    fn test_prefix_suffix() {
        let s = Str::from_str("prelude.rs");
        assert!(s.starts_with("pre".into()));
        assert!(s.ends_with(".rs".into()));
        assert!(!s.ends_with(".c".into()));
        assert!(s.starts_with(Str::EMPTY));
    }

    #[test]
    fn test_equality() {
        let a = Str::from_str("abc");
        let b = Str::from_bytes(b"abc");
        assert_eq!(a, b);
        assert_ne!(a, Str::from_str("abd"));
        assert_ne!(a, Str::from_str("ab"));
        assert!(a == "abc");
    }

    #[test]
    fn test_trim() {
        let cutset = Str::from_str(" \t\n");
        let s = Str::from_str("\t  hello world \n");
        assert_eq!(s.trim_leading(cutset), "hello world \n");
        assert_eq!(s.trim_trailing(cutset), "\t  hello world");
        assert_eq!(s.trim(cutset), "hello world");
    }

    #[test]
    fn test_trim_multibyte_cutset() {
        let s = Str::from_str("€€ok€");
        assert_eq!(s.trim("€".into()), "ok");
        assert_eq!(Str::from_str("€€€").trim("€".into()), "");
        assert_eq!(s.trim(Str::EMPTY), s);
    }

    #[test]
    fn test_trim_trailing_malformed_run() {
        let mut bytes = b"ok".to_vec();
        bytes.extend(std::iter::repeat_n(0x80, 50_000));
        let s = Str::from_bytes(&bytes);
        assert_eq!(s.trim_trailing("\u{fffd}".into()), "ok");
    }

    #[test]
    fn test_iter_reversed() {
        let s = Str::from_str("ab€");
        let codepoints: Vec<u32> = s.iter_reversed().map(|(c, _)| c).collect();
        assert_eq!(codepoints, vec![0x20ac, 0x62, 0x61]);
    }

    #[test]
    fn test_clone_in_copies_bytes() {
        let mut arena = Arena::new(64).unwrap();
        let copy = Str::from_str("copied").clone_in(&mut arena).unwrap();
        assert_eq!(Str::from_allocation(&arena, copy), "copied");
    }

    #[test]
    fn test_concat_in() {
        let mut arena = Arena::new(64).unwrap();
        let joined = Str::from_str("pre")
            .concat_in("lude".into(), &mut arena)
            .unwrap();
        assert_eq!(Str::from_allocation(&arena, joined), "prelude");
    }

    #[test]
    fn test_clone_in_out_of_memory() {
        let mut pool = Pool::new(64, 8, 8).unwrap();
        assert_eq!(
            Str::from_str("longer than a node").clone_in(&mut pool),
            Err(Error::OutOfMemory { requested: 18 })
        );
    }

    #[test]
    fn test_display_and_debug() {
        let s = Str::from_str("tab\there");
        assert_eq!(format!("{s}"), "tab\there");
        assert_eq!(format!("{s:?}"), "\"tab\\there\"");
    }
}
