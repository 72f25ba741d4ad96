//! UTF-8 strings over pluggable allocators
//!
//! This crate provides the string layer built on `prelude-mem`:
//!
//! - **UTF-8 codec**: total encode/decode and a bidirectional codepoint
//!   cursor that steps over malformed bytes
//! - **String views**: [`Str`], a borrowed byte string with slicing,
//!   trimming and codepoint helpers
//! - **String builder**: [`StringBuilder`], an append-only buffer living in
//!   any [`Allocator`](prelude_mem::Allocator)

pub mod builder;
pub mod error;
pub mod string;
pub mod utf8;

pub use builder::StringBuilder;
pub use error::{Error, Result};
pub use string::Str;
pub use utf8::{DecodeResult, EncodeResult, Utf8Iter};
