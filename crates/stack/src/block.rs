//! Storage blocks
//!
//! A block is a single allocation: this header followed by an array of
//! `capacity` element slots. Slots `[0, len)` hold live elements in push
//! order; the rest are uninitialized. Blocks are linked both ways into a
//! [`BlockChain`](crate::chain::BlockChain), which owns them.
//!
//! ## Invariants
//!
//! - `len <= capacity`
//! - `capacity` never changes after allocation
//! - The element array starts at [`Block::data_offset`], for every capacity

use core::alloc::Layout;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::allocator::Allocator;
use crate::error::{StackError, StackResult};

/// Raw handle to a block owned by a chain
pub(crate) type BlockPtr<T> = NonNull<Block<T>>;

/// Block header, placed at the start of its own allocation
pub(crate) struct Block<T> {
    pub(crate) capacity: usize,
    pub(crate) len: usize,
    pub(crate) next: Option<BlockPtr<T>>,
    pub(crate) prev: Option<BlockPtr<T>>,
    _marker: PhantomData<T>,
}

impl<T> Block<T> {
    /// Byte offset of slot 0 from the header
    const fn data_offset() -> usize {
        size_of::<Self>().next_multiple_of(align_of::<T>())
    }

    /// Layout of a block holding `capacity` slots
    fn layout(capacity: usize) -> StackResult<Layout> {
        let slots =
            Layout::array::<T>(capacity).map_err(|_| StackError::capacity_overflow(capacity))?;
        let (layout, offset) = Layout::new::<Self>()
            .extend(slots)
            .map_err(|_| StackError::capacity_overflow(capacity))?;
        debug_assert_eq!(offset, Self::data_offset());

        Ok(layout.pad_to_align())
    }

    /// Allocates an empty, unlinked block
    pub(crate) fn allocate<A: Allocator>(alloc: &A, capacity: usize) -> StackResult<BlockPtr<T>> {
        debug_assert!(capacity > 0);

        let layout = Self::layout(capacity)?;
        if layout.size() > A::max_allocation_size() {
            return Err(StackError::capacity_overflow(capacity));
        }

        // SAFETY: layout has non-zero size (it contains the header)
        let raw = unsafe { alloc.allocate(layout)? };
        let block = raw.cast::<Self>();

        // SAFETY: Initializing the header of a fresh allocation.
        // - block is aligned for Self (layout starts with Layout::new::<Self>())
        // - the allocation is at least size_of::<Self>() bytes
        unsafe {
            block.as_ptr().write(Self {
                capacity,
                len: 0,
                next: None,
                prev: None,
                _marker: PhantomData,
            });
        }

        Ok(block)
    }

    /// Drops the block's live elements and returns its memory to `alloc`
    ///
    /// # Safety
    ///
    /// - `block` was allocated by `alloc` (or an allocator equal to it)
    /// - `block` is unlinked and never used again
    pub(crate) unsafe fn release<A: Allocator>(block: BlockPtr<T>, alloc: &A) {
        // SAFETY: block is a live header (caller contract)
        let (capacity, len) = unsafe {
            let header = block.as_ref();
            (header.capacity, header.len)
        };

        // SAFETY: slots [0, len) are initialized and dropped exactly once here
        unsafe {
            (*block.as_ptr()).len = 0;
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(Self::slot(block, 0), len));
        }

        // SAFETY: the same computation succeeded when the block was allocated
        let layout = unsafe { Self::layout(capacity).unwrap_unchecked() };

        // SAFETY: block came from alloc with this layout (caller contract)
        unsafe { alloc.deallocate(block.cast(), layout) };
    }

    /// Pointer to slot `index`
    ///
    /// # Safety
    ///
    /// `block` is live and `index <= capacity`.
    #[inline]
    pub(crate) unsafe fn slot(block: BlockPtr<T>, index: usize) -> *mut T {
        // SAFETY: the element array starts at data_offset and spans capacity slots
        unsafe {
            block
                .as_ptr()
                .cast::<u8>()
                .add(Self::data_offset())
                .cast::<T>()
                .add(index)
        }
    }

    /// Live elements as a slice
    ///
    /// # Safety
    ///
    /// `block` is live and stays unmodified for `'a`.
    #[inline]
    pub(crate) unsafe fn as_slice<'a>(block: BlockPtr<T>) -> &'a [T] {
        // SAFETY: slots [0, len) are initialized (block invariant)
        unsafe { core::slice::from_raw_parts(Self::slot(block, 0), block.as_ref().len) }
    }

    #[inline]
    pub(crate) fn free_slots(&self) -> usize {
        self.capacity - self.len
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{SystemAllocator, TrackedAllocator};

    #[test]
    fn test_data_offset_respects_alignment() {
        #[repr(align(64))]
        struct Wide(#[allow(dead_code)] u8);

        assert_eq!(Block::<u8>::data_offset(), size_of::<Block<u8>>());
        assert_eq!(Block::<Wide>::data_offset() % 64, 0);
    }

    #[test]
    fn test_allocate_and_release() {
        let alloc = TrackedAllocator::new(SystemAllocator::new());
        let block = Block::<u64>::allocate(&alloc, 16).unwrap();

        unsafe {
            assert_eq!(block.as_ref().capacity, 16);
            assert_eq!(block.as_ref().free_slots(), 16);
            assert!(block.as_ref().next.is_none());

            Block::slot(block, 0).write(7);
            Block::slot(block, 1).write(9);
            (*block.as_ptr()).len = 2;
            assert_eq!(Block::as_slice(block), &[7, 9]);

            Block::release(block, &alloc);
        }

        assert!(!alloc.has_leaks());
    }

    #[test]
    fn test_release_drops_live_elements() {
        use std::rc::Rc;

        let alloc = SystemAllocator::new();
        let shared = Rc::new(());
        let block = Block::<Rc<()>>::allocate(&alloc, 4).unwrap();

        unsafe {
            for i in 0..3 {
                Block::slot(block, i).write(Rc::clone(&shared));
            }
            (*block.as_ptr()).len = 3;
            assert_eq!(Rc::strong_count(&shared), 4);

            Block::release(block, &alloc);
        }

        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn test_capacity_overflow() {
        let result = Block::<u64>::allocate(&SystemAllocator::new(), usize::MAX / 4);
        assert_eq!(result.unwrap_err().code(), "STACK:ALLOC:OVERFLOW");
    }

    #[test]
    fn test_zero_sized_elements() {
        let alloc = SystemAllocator::new();
        let block = Block::<()>::allocate(&alloc, 8192).unwrap();
        unsafe {
            assert_eq!(Block::<()>::layout(8192).unwrap(), Layout::new::<Block<()>>());
            Block::release(block, &alloc);
        }
    }
}
