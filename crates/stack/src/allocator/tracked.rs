//! Tracked allocator implementation
//!
//! Wraps another allocator and records every block that passes through it.
//! Clones share one statistics record, so a stack and every copy or splice
//! made with the same handle report into the same counters. An optional byte
//! limit turns the wrapper into a failure injector for exercising the
//! stack's allocation-failure paths.
//!
//! ## Invariants
//!
//! - Every successful allocation is tracked in stats
//! - Every deallocation adjusts stats to match
//! - Refused allocations only bump the failure count

use core::alloc::Layout;
use core::ptr::NonNull;
use std::sync::Arc;

use super::{AllocError, AllocResult, Allocator, AllocatorStats, AtomicAllocatorStats};

#[derive(Debug, Default)]
struct Tracker {
    stats: AtomicAllocatorStats,
    limit: Option<usize>,
}

/// A wrapper allocator that tracks memory usage statistics
///
/// Two handles compare equal when they share the same tracker and their inner
/// allocators compare equal; only then may one release the other's blocks
/// without skewing the counters.
#[derive(Debug, Clone)]
pub struct TrackedAllocator<A> {
    inner: A,
    tracker: Arc<Tracker>,
}

impl<A> TrackedAllocator<A> {
    /// Creates a new TrackedAllocator wrapping the provided allocator
    pub fn new(allocator: A) -> Self {
        Self {
            inner: allocator,
            tracker: Arc::new(Tracker::default()),
        }
    }

    /// Creates a tracker that refuses allocations beyond `limit` live bytes
    pub fn with_limit(allocator: A, limit: usize) -> Self {
        Self {
            inner: allocator,
            tracker: Arc::new(Tracker {
                stats: AtomicAllocatorStats::new(),
                limit: Some(limit),
            }),
        }
    }

    /// Returns the total bytes currently allocated
    pub fn allocated_bytes(&self) -> usize {
        self.tracker.stats.current_allocated()
    }

    /// Returns the configured byte limit, if any
    pub fn limit(&self) -> Option<usize> {
        self.tracker.limit
    }

    /// Get detailed statistics snapshot
    pub fn stats(&self) -> AllocatorStats {
        self.tracker.stats.snapshot()
    }

    /// Check if there are any memory leaks (allocations > deallocations)
    pub fn has_leaks(&self) -> bool {
        self.stats().has_active_allocations()
    }
}

impl<A: PartialEq> PartialEq for TrackedAllocator<A> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tracker, &other.tracker) && self.inner == other.inner
    }
}

impl<A: Eq> Eq for TrackedAllocator<A> {}

impl<A: Default> Default for TrackedAllocator<A> {
    fn default() -> Self {
        Self::new(A::default())
    }
}

// SAFETY: TrackedAllocator implements Allocator by forwarding to inner allocator.
// - All unsafe trait methods forward to A's implementation with same contracts
// - Statistics tracking is side-effect only (no memory safety impact)
unsafe impl<A: Allocator> Allocator for TrackedAllocator<A> {
    unsafe fn allocate(&self, layout: Layout) -> AllocResult<NonNull<[u8]>> {
        let stats = &self.tracker.stats;

        if let Some(limit) = self.tracker.limit
            && stats.current_allocated().saturating_add(layout.size()) > limit
        {
            stats.record_allocation_failure();
            return Err(AllocError::allocation_failed_with_layout(layout));
        }

        // SAFETY: Forwarding to inner allocator's allocate.
        // - layout validity is enforced by caller's contract
        match unsafe { self.inner.allocate(layout) } {
            Ok(ptr) => {
                stats.record_allocation(layout.size());
                Ok(ptr)
            }
            Err(err) => {
                stats.record_allocation_failure();
                Err(err)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: Forwarding to inner allocator's deallocate.
        // - ptr was allocated by an equal handle, hence by an equal inner allocator
        // - layout matches the original allocation (caller's responsibility)
        unsafe { self.inner.deallocate(ptr, layout) };

        self.tracker.stats.record_deallocation(layout.size());
    }

    fn max_allocation_size() -> usize {
        A::max_allocation_size()
    }
}
