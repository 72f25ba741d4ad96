//! Pluggable memory allocators
//!
//! This crate provides allocation strategies behind one capability-queryable
//! interface:
//!
//! - **Arena**: bump allocation over a fixed buffer, bulk release
//! - **Pool**: fixed-size nodes with an intrusive free list
//! - **Libc**: passthrough to the platform heap (requires `libc-allocator`
//!   feature)
//!
//! Allocations are [`Allocation`] handles rather than pointers. Code that
//! should work with any strategy takes `&mut dyn Allocator` (or a generic
//! `A: Allocator`) and checks [`Allocator::capabilities`] before relying on
//! optional operations.
//!
//! Alongside the allocators live the alignment and byte primitives they are
//! built on, and a [`Spinlock`]/[`SpinMutex`] for sharing an allocator
//! between threads.

pub mod align;
pub mod allocator;
pub mod arena;
pub mod buffer;
pub mod bytes;
pub mod capability;
pub mod error;
#[cfg(feature = "libc-allocator")]
pub mod libc;
pub mod pool;
pub mod spinlock;

pub use allocator::{Allocation, Allocator, AllocatorId};
pub use arena::{Arena, ArenaStats};
pub use buffer::Buffer;
pub use capability::Capabilities;
pub use error::{Error, Result};
#[cfg(feature = "libc-allocator")]
pub use libc::LibcAllocator;
pub use pool::Pool;
pub use spinlock::{SpinMutex, SpinMutexGuard, Spinlock, SpinlockGuard};
