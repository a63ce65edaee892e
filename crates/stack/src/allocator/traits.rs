//! Allocator trait consumed by the block chain
//!
//! The stack never talks to the global allocator directly. Every block is
//! obtained through an [`Allocator`] value owned by the stack, which is what
//! makes allocator-extended copy and move meaningful.
//!
//! # Safety
//!
//! `Allocator` is an unsafe trait: the chain writes elements straight into
//! the returned memory and hands the same pointer and layout back on release.
//! Implementors must uphold:
//! - returned pointers are valid for reads and writes of `layout.size()` bytes
//! - returned pointers are aligned to `layout.align()`
//! - memory stays valid until `deallocate` is called with the same layout
//! - two allocators that compare equal (`PartialEq`) can free each other's
//!   memory; the stack relies on this to transfer blocks without copying

use core::alloc::Layout;
use core::ptr::NonNull;

use super::AllocResult;

/// Memory source for stack blocks
///
/// # Safety Requirements
///
/// Implementors must ensure that:
/// - Returned pointers are valid for the requested lifetime
/// - Memory is properly aligned according to the layout
/// - Deallocation only occurs for previously allocated pointers
/// - Equal allocators (by `PartialEq`, when implemented) share ownership of
///   each other's allocations
pub unsafe trait Allocator {
    /// Allocates memory with the given layout
    ///
    /// # Safety
    /// - `layout` must have a non-zero size
    /// - Memory content is uninitialized and must be initialized before use
    ///
    /// # Errors
    /// - Returns `AllocationFailed` if memory cannot be allocated
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>>;

    /// Deallocates memory at the given pointer with the specified layout
    ///
    /// # Safety
    /// - `ptr` must have been allocated by this allocator (or one equal to it)
    /// - `layout` must match the original allocation layout exactly
    /// - After this call, `ptr` becomes invalid and must not be used
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Returns maximum supported allocation size for this allocator
    fn max_allocation_size() -> usize {
        isize::MAX as usize
    }
}

// SAFETY: Forwarding impl for shared references.
// - Every call delegates to the referenced allocator with the same arguments
// - No additional unsafe operations introduced
unsafe impl<A: Allocator> Allocator for &A {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        // SAFETY: caller upholds `allocate`'s contract, forwarded unchanged
        unsafe { (**self).allocate(layout) }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller upholds `deallocate`'s contract, forwarded unchanged
        unsafe { (**self).deallocate(ptr, layout) }
    }

    fn max_allocation_size() -> usize {
        A::max_allocation_size()
    }
}
