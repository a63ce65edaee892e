//! Block chain: the linked sequence of blocks behind one stack
//!
//! # Safety
//!
//! The chain is an intrusive doubly linked list of raw block allocations.
//! It never allocates or frees on its own: blocks arrive through
//! [`BlockChain::link_back`] and leave as detached runs that the caller hands
//! back to the allocator, so every allocator call stays in the stack.
//!
//! ## Invariants
//!
//! - `current` is `None` exactly when `first` is `None`
//! - Blocks from `first` up to `current` hold at least one element each,
//!   except `current` itself when the stack is empty
//! - Every block after `current` is empty (unused)
//! - `len`, `capacity` and `blocks` match a walk of the list
//! - `first.prev` and the last block's `next` are `None`

use core::marker::PhantomData;
use core::mem;
use core::ptr;

use crate::block::{Block, BlockPtr};

/// Ordered chain of blocks with cached totals
pub(crate) struct BlockChain<T> {
    first: Option<BlockPtr<T>>,
    current: Option<BlockPtr<T>>,
    len: usize,
    capacity: usize,
    blocks: usize,
    _owns: PhantomData<T>,
}

impl<T> BlockChain<T> {
    pub(crate) const fn new() -> Self {
        Self {
            first: None,
            current: None,
            len: 0,
            capacity: 0,
            blocks: 0,
            _owns: PhantomData,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn blocks(&self) -> usize {
        self.blocks
    }

    /// Capacity of the active block
    pub(crate) fn current_capacity(&self) -> Option<usize> {
        // SAFETY: blocks reachable from the chain are live
        self.current.map(|block| unsafe { block.as_ref().capacity })
    }

    /// Free slots in the active block
    pub(crate) fn current_free(&self) -> usize {
        // SAFETY: blocks reachable from the chain are live
        self.current
            .map_or(0, |block| unsafe { block.as_ref().free_slots() })
    }

    /// Total capacity of the unused blocks after `current`
    pub(crate) fn unused_capacity(&self) -> usize {
        let mut total = 0;
        let mut cursor = self.next_unused();
        while let Some(block) = cursor {
            // SAFETY: blocks reachable from the chain are live
            let header = unsafe { block.as_ref() };
            total += header.capacity;
            cursor = header.next;
        }
        total
    }

    /// Whether a push can proceed without a new block
    pub(crate) fn has_free_slot(&self) -> bool {
        self.current_free() > 0 || self.next_unused().is_some()
    }

    fn next_unused(&self) -> Option<BlockPtr<T>> {
        // SAFETY: blocks reachable from the chain are live
        self.current.and_then(|block| unsafe { block.as_ref().next })
    }

    fn last(&self) -> Option<BlockPtr<T>> {
        let mut last = self.current?;
        // SAFETY: blocks reachable from the chain are live
        while let Some(next) = unsafe { last.as_ref().next } {
            last = next;
        }
        Some(last)
    }

    /// Links a fresh empty block after the last block
    ///
    /// On an empty chain the block becomes both `first` and `current`.
    ///
    /// # Safety
    ///
    /// `block` is live, empty, unlinked and not owned by any other chain.
    pub(crate) unsafe fn link_back(&mut self, block: BlockPtr<T>) {
        // SAFETY: block is live (caller contract)
        let capacity = unsafe { block.as_ref().capacity };

        match self.last() {
            Some(mut last) => {
                // SAFETY: last and block are distinct live blocks
                unsafe {
                    last.as_mut().next = Some(block);
                    (*block.as_ptr()).prev = Some(last);
                }
            }
            None => {
                self.first = Some(block);
                self.current = Some(block);
            }
        }

        self.capacity += capacity;
        self.blocks += 1;
    }

    /// Makes the next unused block active if `current` is full
    ///
    /// Returns `true` when `current` moved.
    pub(crate) fn advance(&mut self) -> bool {
        let Some(block) = self.current else {
            return false;
        };

        // SAFETY: blocks reachable from the chain are live
        let header = unsafe { block.as_ref() };
        match header.next {
            Some(next) if header.is_full() => {
                self.current = Some(next);
                true
            }
            _ => false,
        }
    }

    /// Writes `value` into the active block's next slot
    ///
    /// # Safety
    ///
    /// `current` exists and has a free slot.
    pub(crate) unsafe fn push_unchecked(&mut self, value: T) -> *mut T {
        // SAFETY: current exists with a free slot (caller contract)
        unsafe {
            let block = self.current.unwrap_unchecked();
            let header = &mut *block.as_ptr();
            let slot = Block::slot(block, header.len);
            slot.write(value);
            header.len += 1;
            self.len += 1;
            slot
        }
    }

    /// Pointer to the top element, if any
    pub(crate) fn top(&self) -> Option<*mut T> {
        if self.len == 0 {
            return None;
        }
        let block = self.current?;
        // SAFETY: a non-empty stack has a non-empty current block
        unsafe { Some(Block::slot(block, block.as_ref().len - 1)) }
    }

    /// Moves the top element out without retiring an emptied block
    pub(crate) fn pop_top(&mut self) -> Option<T> {
        let slot = self.top()?;
        // SAFETY: slot is the initialized top slot; the count drops first so it
        // is never read again
        unsafe {
            let block = self.current.unwrap_unchecked();
            (*block.as_ptr()).len -= 1;
            self.len -= 1;
            Some(ptr::read(slot))
        }
    }

    /// Whether `current` ran empty while an older block remains below it
    pub(crate) fn current_spent(&self) -> bool {
        self.current.is_some_and(|block| {
            // SAFETY: blocks reachable from the chain are live
            let header = unsafe { block.as_ref() };
            header.len == 0 && header.prev.is_some()
        })
    }

    /// Steps `current` back after it emptied
    ///
    /// Everything after the new `current` is detached. When `keep_spare` is
    /// set, the largest detached block is linked back as the single unused
    /// block. Returns the run left for the caller to release.
    pub(crate) fn retire_current(&mut self, keep_spare: bool) -> Option<BlockPtr<T>> {
        // SAFETY: blocks reachable from the chain are live
        let prev = unsafe { self.current?.as_ref().prev? };
        self.current = Some(prev);

        let mut run = self.detach_unused();
        if keep_spare && let Some(head) = run {
            // SAFETY: the run consists of live, detached blocks
            unsafe {
                let spare = largest_in_run(head);
                run = unlink_from_run(head, spare);
                self.link_back(spare);
            }
        }
        run
    }

    /// Detaches every block after `current` and returns the run's head
    pub(crate) fn detach_unused(&mut self) -> Option<BlockPtr<T>> {
        let mut current = self.current?;
        // SAFETY: current and its successors are live; the run is cut loose
        // before the totals are adjusted
        unsafe {
            let head = current.as_mut().next.take()?;
            (*head.as_ptr()).prev = None;

            let (blocks, capacity) = run_totals(head);
            self.blocks -= blocks;
            self.capacity -= capacity;
            Some(head)
        }
    }

    /// Detaches the whole chain, leaving `self` without blocks
    pub(crate) fn detach_all(&mut self) -> Option<BlockPtr<T>> {
        let head = self.first;
        *self = Self::new();
        head
    }

    /// Links `other`'s blocks after `current`, taking its elements in place
    ///
    /// `other` becomes empty; its active block becomes ours.
    ///
    /// # Safety
    ///
    /// - `self` is non-empty and has no unused blocks
    /// - `other` is non-empty and has no unused blocks
    /// - both chains' blocks are releasable by the same allocator
    pub(crate) unsafe fn splice(&mut self, other: &mut Self) {
        let other = mem::take(other);

        // SAFETY: both chains are non-empty (caller contract), so both ends
        // exist; other's first block leaves its own chain here
        unsafe {
            let mut tail = self.current.unwrap_unchecked();
            let head = other.first.unwrap_unchecked();
            tail.as_mut().next = Some(head);
            (*head.as_ptr()).prev = Some(tail);
        }

        self.current = other.current;
        self.len += other.len;
        self.capacity += other.capacity;
        self.blocks += other.blocks;
    }

    /// Links a detached run of empty blocks after the last block
    ///
    /// # Safety
    ///
    /// Every block in the run is live, empty and owned by no chain.
    pub(crate) unsafe fn link_run(&mut self, mut run: Option<BlockPtr<T>>) {
        while let Some(block) = run {
            // SAFETY: block is live and detached (caller contract)
            unsafe {
                run = block.as_ref().next;
                (*block.as_ptr()).next = None;
                (*block.as_ptr()).prev = None;
                self.link_back(block);
            }
        }
    }

    /// Moves every element of `other` onto `self` bitwise, bottom to top
    ///
    /// `other` keeps its blocks, all of them emptied.
    ///
    /// # Safety
    ///
    /// The free slots of `current` plus the unused blocks after it hold at
    /// least `other.len()` elements.
    pub(crate) unsafe fn move_from(&mut self, other: &mut Self) {
        let mut source = other.first;

        while let Some(block) = source {
            // SAFETY: source blocks are live; destination capacity was
            // checked by the caller, and the two chains never share blocks
            unsafe {
                let header = &mut *block.as_ptr();
                let mut moved = 0;

                while moved < header.len {
                    if self.current_free() == 0 {
                        self.advance();
                    }

                    let target = self.current.unwrap_unchecked();
                    let target_header = &mut *target.as_ptr();
                    let count = target_header.free_slots().min(header.len - moved);

                    ptr::copy_nonoverlapping(
                        Block::slot(block, moved),
                        Block::slot(target, target_header.len),
                        count,
                    );
                    target_header.len += count;
                    self.len += count;
                    moved += count;
                }

                header.len = 0;
                source = if Some(block) == other.current {
                    None
                } else {
                    header.next
                };
            }
        }

        other.len = 0;
        other.current = other.first;
    }

    /// Drops every element, keeping all blocks as unused capacity
    pub(crate) fn clear_elements(&mut self) {
        let mut cursor = self.first;
        while let Some(block) = cursor {
            // SAFETY: slots [0, len) are live; the count is zeroed before the
            // drop so a panicking destructor cannot cause a double drop
            unsafe {
                let header = &mut *block.as_ptr();
                let len = mem::replace(&mut header.len, 0);
                self.len -= len;
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(Block::slot(block, 0), len));
                cursor = if Some(block) == self.current {
                    None
                } else {
                    header.next
                };
            }
        }
        self.current = self.first;
    }

    /// Live elements as slices, bottom block first
    pub(crate) fn slices(&self) -> Slices<'_, T> {
        Slices {
            next: if self.len == 0 { None } else { self.first },
            last: self.current,
            _marker: PhantomData,
        }
    }

    /// Live elements, bottom to top
    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> {
        self.slices().flatten()
    }
}

impl<T> Default for BlockChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the live part of each block from `first` to `current`
pub(crate) struct Slices<'a, T> {
    next: Option<BlockPtr<T>>,
    last: Option<BlockPtr<T>>,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Slices<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.next?;
        // SAFETY: the chain is borrowed for 'a, so its blocks are live and unchanged
        unsafe {
            self.next = if Some(block) == self.last {
                None
            } else {
                block.as_ref().next
            };
            Some(Block::as_slice(block))
        }
    }
}

/// Number of blocks and summed capacity of a detached run
///
/// # Safety
///
/// Every block in the run is live.
unsafe fn run_totals<T>(head: BlockPtr<T>) -> (usize, usize) {
    let (mut blocks, mut capacity) = (0, 0);
    let mut cursor = Some(head);
    while let Some(block) = cursor {
        // SAFETY: block is live (caller contract)
        let header = unsafe { block.as_ref() };
        blocks += 1;
        capacity += header.capacity;
        cursor = header.next;
    }
    (blocks, capacity)
}

/// Largest block of a detached run; the earliest wins ties
///
/// # Safety
///
/// Every block in the run is live.
unsafe fn largest_in_run<T>(head: BlockPtr<T>) -> BlockPtr<T> {
    let mut best = head;
    // SAFETY: blocks in the run are live (caller contract)
    unsafe {
        let mut cursor = head.as_ref().next;
        while let Some(block) = cursor {
            if block.as_ref().capacity > best.as_ref().capacity {
                best = block;
            }
            cursor = block.as_ref().next;
        }
    }
    best
}

/// Removes `block` from the run starting at `head`; returns the new head
///
/// # Safety
///
/// `block` belongs to the live, detached run starting at `head`.
unsafe fn unlink_from_run<T>(head: BlockPtr<T>, block: BlockPtr<T>) -> Option<BlockPtr<T>> {
    // SAFETY: block and its neighbours are live (caller contract)
    unsafe {
        let header = &mut *block.as_ptr();
        let prev = header.prev.take();
        let next = header.next.take();

        if let Some(next) = next {
            (*next.as_ptr()).prev = prev;
        }
        match prev {
            Some(prev) => {
                (*prev.as_ptr()).next = next;
                Some(head)
            }
            None => next,
        }
    }
}
