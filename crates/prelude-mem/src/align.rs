//! Alignment arithmetic shared by every allocator.

/// Returns `true` if `align` is a non-zero power of two.
#[inline]
#[must_use]
pub const fn is_valid_alignment(align: usize) -> bool {
    align != 0 && (align & (align - 1)) == 0
}

/// Rounds `addr` up to the next multiple of `align`.
///
/// # Panics
///
/// Panics if `align` is not a power of two, or if the rounded address
/// would overflow `usize`.
///
/// # Examples
///
/// ```
/// use prelude_mem::align::align_forward;
///
/// assert_eq!(align_forward(13, 8), 16);
/// assert_eq!(align_forward(16, 8), 16);
/// assert_eq!(align_forward(0, 64), 0);
/// ```
#[inline]
#[must_use]
pub const fn align_forward(addr: usize, align: usize) -> usize {
    assert!(is_valid_alignment(align), "alignment must be a power of two");
    let modulo = addr & (align - 1);
    if modulo > 0 { addr + (align - modulo) } else { addr }
}

/// Rounds `size` up to the next multiple of `align`, which may be any
/// positive value (not only a power of two).
///
/// # Panics
///
/// Panics if `align` is zero.
///
/// # Examples
///
/// ```
/// use prelude_mem::align::align_forward_size;
///
/// assert_eq!(align_forward_size(10, 3), 12);
/// assert_eq!(align_forward_size(24, 8), 24);
/// ```
#[inline]
#[must_use]
pub const fn align_forward_size(size: usize, align: usize) -> usize {
    assert!(align > 0, "size alignment must be positive");
    let modulo = size % align;
    if modulo > 0 { size + (align - modulo) } else { size }
}

/// Number of bytes needed to move `addr` forward to an `align` boundary.
#[inline]
#[must_use]
pub const fn padding_for(addr: usize, align: usize) -> usize {
    align_forward(addr, align) - addr
}
