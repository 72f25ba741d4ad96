//! Raw byte operations over slices.
//!
//! Thin, bounds-checked counterparts of `memset`/`memmove`/`memcpy`/`memcmp`.

use std::cmp::Ordering;

/// Sets every byte of `dest` to `value`.
#[inline]
pub fn set(dest: &mut [u8], value: u8) {
    dest.fill(value);
}

/// Copies `len` bytes inside `buf` from `src` to `dest`; the two ranges may
/// overlap.
///
/// # Panics
///
/// Panics if either range falls outside `buf`.
#[inline]
pub fn copy(buf: &mut [u8], src: usize, dest: usize, len: usize) {
    buf.copy_within(src..src + len, dest);
}

/// Copies all of `src` into the front of `dest`.
///
/// # Panics
///
/// Panics if `dest` is shorter than `src`.
#[inline]
pub fn copy_nonoverlapping(dest: &mut [u8], src: &[u8]) {
    dest[..src.len()].copy_from_slice(src);
}

/// Lexicographically compares two buffers.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use prelude_mem::bytes::compare;
///
/// assert_eq!(compare(b"abc", b"abd"), Ordering::Less);
/// assert_eq!(compare(b"abc", b"abc"), Ordering::Equal);
/// ```
#[inline]
#[must_use]
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Reverses the byte order of `data` in place (endianness swap).
#[inline]
pub fn swap_bytes(data: &mut [u8]) {
    data.reverse();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set() {
        let mut buf = [1u8; 8];
        set(&mut buf[2..6], 0);
        assert_eq!(buf, [1, 1, 0, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_copy_overlapping_forward() {
        let mut buf = *b"abcdef";
        copy(&mut buf, 0, 2, 4);
        assert_eq!(&buf, b"ababcd");
    }

    #[test]
    fn test_copy_overlapping_backward() {
        let mut buf = *b"abcdef";
        copy(&mut buf, 2, 0, 4);
        assert_eq!(&buf, b"cdefef");
    }

    #[test]
    fn test_copy_nonoverlapping() {
        let mut dest = [0u8; 5];
        copy_nonoverlapping(&mut dest, b"hey");
        assert_eq!(&dest, b"hey\0\0");
    }

    #[test]
    fn test_compare_prefix_is_less() {
        assert_eq!(compare(b"ab", b"abc"), Ordering::Less);
        assert_eq!(compare(b"b", b"abc"), Ordering::Greater);
    }

    #[test]
    fn test_swap_bytes_matches_endianness() {
        let value: u32 = 0x1122_3344;
        let mut raw = value.to_le_bytes();
        swap_bytes(&mut raw);
        assert_eq!(raw, value.to_be_bytes());
    }
}
