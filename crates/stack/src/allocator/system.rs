//! System allocator implementation
//!
//! Provides an allocator that wraps the system's default memory allocator.
//! This is the allocator every stack uses unless another one is supplied.

use core::alloc::{GlobalAlloc, Layout};
use core::ptr::NonNull;
use std::alloc::System;

use super::{AllocError, AllocResult, Allocator};

/// Wrapper for the system's default allocator
///
/// Stateless, so all instances compare equal and any instance may release
/// memory obtained from any other. Blocks therefore always transfer between
/// `SystemAllocator`-backed stacks without copying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Creates a new SystemAllocator
    #[inline]
    pub const fn new() -> Self {
        SystemAllocator
    }
}

// SAFETY: Delegates to `std::alloc::System`, which upholds the global
// allocator contract; zero-sized requests never reach it.
unsafe impl Allocator for SystemAllocator {
    #[inline]
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        if layout.size() == 0 {
            // Well-aligned dangling pointer for zero-sized requests
            let ptr = NonNull::<u8>::dangling();
            return Ok(NonNull::slice_from_raw_parts(ptr, 0));
        }

        // SAFETY: layout has non-zero size (checked above)
        let ptr = unsafe { System.alloc(layout) };

        NonNull::new(ptr)
            .map(|ptr| NonNull::slice_from_raw_parts(ptr, layout.size()))
            .ok_or_else(|| AllocError::allocation_failed_with_layout(layout))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }

        // SAFETY: ptr came from `allocate` above with the same non-zero layout
        // (caller contract)
        unsafe { System.dealloc(ptr.as_ptr(), layout) };
    }
}
