//! # segstack
//!
//! A LIFO stack stored in a chain of fixed-capacity blocks.
//!
//! Growing a contiguous stack means reallocating and moving every element.
//! A segmented stack links a new block instead, so:
//! - pushes never move existing elements, and references to them stay valid
//! - blocks emptied by pops can be kept as a spare and reused
//! - whole chains can be spliced onto another stack without moving elements
//!
//! ## Quick Start
//!
//! ```rust
//! use segstack::prelude::*;
//!
//! let mut stack = Stack::with_block_limits(50, 100)?;
//! for _ in 0..256 {
//!     stack.push(10)?;
//! }
//!
//! let mut other: Stack<i32> = (0..20).collect();
//! stack.append(&mut other)?;
//! assert!(other.is_empty());
//!
//! let mut total = 0;
//! while let Some(value) = stack.try_pop() {
//!     total += value;
//! }
//! assert_eq!(total, 2560 + 190);
//! # Ok::<(), StackError>(())
//! ```
//!
//! ## Features
//!
//! - `logging` (default): block traffic and errors reported through `tracing`
//!
//! ## Architecture
//!
//! - Standalone error handling via [`error`]
//! - Pluggable block memory via [`allocator::Allocator`]
//! - Block sizing and spare retention driven by [`StackConfig`]

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rust_2018_idioms)]
// The block chain is raw-pointer code; every unsafe block carries a SAFETY note
#![allow(unsafe_code)]

// Error types
pub mod error;

// Core modules
pub mod allocator;
mod block;
mod chain;
pub mod config;
mod policy;
pub mod stack;
pub mod stats;

pub use crate::config::StackConfig;
pub use crate::error::{StackError, StackResult};
pub use crate::stack::Stack;
pub use crate::stats::StackStats;

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::StackConfig;
    pub use crate::error::{StackError, StackResult};
    pub use crate::stack::Stack;
    pub use crate::stats::StackStats;

    pub use crate::allocator::{Allocator, SystemAllocator, TrackedAllocator};
}
