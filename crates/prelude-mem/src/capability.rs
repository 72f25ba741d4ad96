//! Capability flags advertised by allocator strategies.

use bitflags::bitflags;

bitflags! {
    /// Operations an allocator strategy supports.
    ///
    /// Generic code queries these before relying on `free_all` or on
    /// in-place `resize`; consumers never mutate them.
    ///
    /// ```
    /// use prelude_mem::Capabilities;
    ///
    /// let caps = Capabilities::ALLOC_ANY | Capabilities::FREE_ALL;
    /// assert!(caps.contains(Capabilities::FREE_ALL));
    /// assert!(!caps.contains(Capabilities::RESIZE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u32 {
        /// Can allocate any size.
        const ALLOC_ANY = 1 << 0;
        /// Can free allocations in any order.
        const FREE_ANY = 1 << 1;
        /// Can free all allocations at once.
        const FREE_ALL = 1 << 2;
        /// Can resize an allocation in place.
        const RESIZE = 1 << 3;
        /// Can honor any power-of-two alignment.
        const ALIGN_ANY = 1 << 4;
    }
}
