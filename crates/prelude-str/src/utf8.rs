//! UTF-8 encoding, decoding and bidirectional iteration.
//!
//! Decoding is total: malformed input never panics, it produces
//! [`ERROR_RUNE`] with a zero length, and the iterator steps over the bad
//! byte so it always makes progress.
//!
//! # Examples
//!
//! ```
//! use prelude_str::utf8::{self, Utf8Iter};
//!
//! let encoded = utf8::encode(0x20AC);
//! assert_eq!(encoded.as_bytes(), "€".as_bytes());
//! assert_eq!(utf8::decode(encoded.as_bytes()).codepoint, 0x20AC);
//!
//! let forward: Vec<u32> = Utf8Iter::new("añ€".as_bytes()).map(|(c, _)| c).collect();
//! assert_eq!(forward, vec![0x61, 0xF1, 0x20AC]);
//! ```

const RANGE1: u32 = 0x7f;
const RANGE2: u32 = 0x7ff;
const RANGE3: u32 = 0xffff;
const RANGE4: u32 = 0x10ffff;

const SURROGATE_LOW: u32 = 0xd800;
const SURROGATE_HIGH: u32 = 0xdfff;

// Payload masks for the lead byte of 2, 3 and 4 byte sequences.
const MASK2: u8 = 0x1f;
const MASK3: u8 = 0x0f;
const MASK4: u8 = 0x07;
// Payload mask for continuation bytes.
const MASKX: u8 = 0x3f;

// Lead byte size markers.
const SIZE2: u8 = 0xc0;
const SIZE3: u8 = 0xe0;
const SIZE4: u8 = 0xf0;

const CONT: u8 = 0x80;

/// Codepoint reported for anything that fails to decode (U+FFFD).
pub const ERROR_RUNE: u32 = 0xfffd;

/// Result of a failed [`encode`]: the bytes of U+FFFD with a zero length.
pub const ERROR_ENCODED: EncodeResult = EncodeResult {
    bytes: [0xef, 0xbf, 0xbd, 0],
    len: 0,
};

const DECODE_ERROR: DecodeResult = DecodeResult {
    codepoint: ERROR_RUNE,
    len: 0,
};

/// Up to four encoded bytes.
///
/// A zero `len` marks an invalid codepoint; `bytes` then holds the
/// replacement character so callers can substitute it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeResult {
    pub bytes: [u8; 4],
    pub len: u8,
}

impl EncodeResult {
    /// The encoded bytes (empty on error).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.len == 0
    }
}

/// A decoded codepoint and the number of bytes it occupied.
///
/// A zero `len` marks malformed input, with `codepoint == ERROR_RUNE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeResult {
    pub codepoint: u32,
    pub len: u8,
}

impl DecodeResult {
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.len == 0
    }
}

/// Returns `true` for bytes of the form `10xxxxxx`.
#[inline]
#[must_use]
pub const fn is_continuation_byte(byte: u8) -> bool {
    byte & 0xc0 == CONT
}

/// Encodes `codepoint` as UTF-8.
///
/// Surrogates (U+D800..=U+DFFF) and values above U+10FFFF yield
/// [`ERROR_ENCODED`]. U+0080..=U+00BF are not rejected; they encode as
/// ordinary two byte sequences so every scalar value round-trips.
#[must_use]
pub const fn encode(codepoint: u32) -> EncodeResult {
    if (codepoint >= SURROGATE_LOW && codepoint <= SURROGATE_HIGH) || codepoint > RANGE4 {
        return ERROR_ENCODED;
    }

    let c = codepoint;
    let mut bytes = [0u8; 4];
    let len = if c <= RANGE1 {
        bytes[0] = c as u8;
        1
    } else if c <= RANGE2 {
        bytes[0] = SIZE2 | ((c >> 6) as u8 & MASK2);
        bytes[1] = CONT | (c as u8 & MASKX);
        2
    } else if c <= RANGE3 {
        bytes[0] = SIZE3 | ((c >> 12) as u8 & MASK3);
        bytes[1] = CONT | ((c >> 6) as u8 & MASKX);
        bytes[2] = CONT | (c as u8 & MASKX);
        3
    } else {
        bytes[0] = SIZE4 | ((c >> 18) as u8 & MASK4);
        bytes[1] = CONT | ((c >> 12) as u8 & MASKX);
        bytes[2] = CONT | ((c >> 6) as u8 & MASKX);
        bytes[3] = CONT | (c as u8 & MASKX);
        4
    };

    EncodeResult { bytes, len }
}

/// Decodes the sequence at the start of `buf`.
///
/// Fails (zero length, [`ERROR_RUNE`]) on an empty buffer, a stray
/// continuation or invalid lead byte, a sequence cut short by the end of the
/// buffer, a missing continuation byte, a surrogate, or a value above
/// U+10FFFF. Overlong forms are not rejected.
#[must_use]
pub const fn decode(buf: &[u8]) -> DecodeResult {
    let Some(&first) = buf.first() else {
        return DECODE_ERROR;
    };

    let (len, mut codepoint) = if first & CONT == 0 {
        (1, first as u32)
    } else if first & !MASK2 == SIZE2 {
        (2, (first & MASK2) as u32)
    } else if first & !MASK3 == SIZE3 {
        (3, (first & MASK3) as u32)
    } else if first & !MASK4 == SIZE4 {
        (4, (first & MASK4) as u32)
    } else {
        return DECODE_ERROR;
    };

    if buf.len() < len {
        return DECODE_ERROR;
    }

    let mut i = 1;
    while i < len {
        if !is_continuation_byte(buf[i]) {
            return DECODE_ERROR;
        }
        codepoint = (codepoint << 6) | (buf[i] & MASKX) as u32;
        i += 1;
    }

    if (codepoint >= SURROGATE_LOW && codepoint <= SURROGATE_HIGH) || codepoint > RANGE4 {
        return DECODE_ERROR;
    }

    DecodeResult {
        codepoint,
        len: len as u8,
    }
}

/// A cursor over UTF-8 bytes that can step in both directions.
///
/// Forward iteration (the [`Iterator`] impl) yields `(codepoint, len)` pairs.
/// A malformed byte yields `(ERROR_RUNE, 1)` and is skipped, so every byte of
/// the buffer is covered exactly once. [`Utf8Iter::prev`] walks the same
/// pairs backwards.
#[derive(Debug, Clone)]
pub struct Utf8Iter<'a> {
    data: &'a [u8],
    current: usize,
}

impl<'a> Utf8Iter<'a> {
    /// A cursor at the start of `data`.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, current: 0 }
    }

    /// A cursor at the end of `data`, ready for [`Utf8Iter::prev`].
    #[must_use]
    pub const fn at_end(data: &'a [u8]) -> Self {
        Self {
            data,
            current: data.len(),
        }
    }

    /// Byte offset of the cursor.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.current
    }

    /// The bytes not yet visited by forward iteration.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.current..]
    }

    /// Steps the cursor back over the preceding sequence and returns it.
    ///
    /// The cursor moves back one byte, then over up to three continuation
    /// bytes, and decodes from there. If that does not produce one
    /// well-formed sequence ending exactly at the old position, only the last
    /// byte is consumed and reported as `(ERROR_RUNE, 1)`, mirroring what
    /// forward iteration reports for the same bytes.
    pub fn prev(&mut self) -> Option<(u32, usize)> {
        if self.current == 0 {
            return None;
        }

        // A sequence is at most four bytes, so never look further back.
        let end = self.current;
        let floor = end.saturating_sub(4);
        let mut start = end - 1;
        while start > floor && is_continuation_byte(self.data[start]) {
            start -= 1;
        }

        let decoded = decode(&self.data[start..end]);
        if !decoded.is_error() && usize::from(decoded.len) == end - start {
            self.current = start;
            Some((decoded.codepoint, end - start))
        } else {
            self.current = end - 1;
            Some((ERROR_RUNE, 1))
        }
    }

    /// Turns the cursor into an iterator that walks backwards from its
    /// current position.
    #[must_use]
    pub fn reversed(self) -> Reversed<'a> {
        Reversed { inner: self }
    }
}

impl Iterator for Utf8Iter<'_> {
    type Item = (u32, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.data.len() {
            return None;
        }

        let decoded = decode(&self.data[self.current..]);
        if decoded.is_error() {
            self.current += 1;
            return Some((ERROR_RUNE, 1));
        }

        let len = usize::from(decoded.len);
        self.current += len;
        Some((decoded.codepoint, len))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len() - self.current;
        (remaining.div_ceil(4), Some(remaining))
    }
}

/// Backward iteration over a [`Utf8Iter`].
#[derive(Debug, Clone)]
pub struct Reversed<'a> {
    inner: Utf8Iter<'a>,
}

impl Reversed<'_> {
    /// Byte offset of the underlying cursor.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.inner.position()
    }
}

impl Iterator for Reversed<'_> {
    type Item = (u32, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.prev()
    }
}
