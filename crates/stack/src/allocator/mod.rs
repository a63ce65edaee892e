//! Allocators backing stack blocks
//!
//! The stack is generic over an [`Allocator`]. [`SystemAllocator`] is the
//! default; [`TrackedAllocator`] wraps any allocator to count block traffic
//! and, optionally, to refuse allocations past a byte limit.

mod stats;
mod system;
mod tracked;
mod traits;

pub use crate::error::{AllocError, AllocResult};
pub use stats::{AllocatorStats, AtomicAllocatorStats};
pub use system::SystemAllocator;
pub use tracked::TrackedAllocator;
pub use traits::Allocator;
