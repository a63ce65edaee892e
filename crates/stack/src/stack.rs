//! Segmented LIFO stack
//!
//! [`Stack`] stores its elements in a chain of fixed-capacity blocks. Growth
//! links a new block instead of reallocating, so existing elements never
//! move and references to them stay valid across pushes.
//!
//! ## Invariants
//!
//! - `len()` equals the number of live elements in the chain
//! - `capacity()` is the sum of all block capacities, unused blocks included
//! - After a pop empties a block, at most one unused block remains
//! - A stack created with `new()` owns no blocks

use core::fmt;
use core::mem;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use crate::allocator::{Allocator, SystemAllocator};
use crate::block::{Block, BlockPtr};
use crate::chain::BlockChain;
use crate::config::{DEFAULT_MAX_BLOCK_CAPACITY, StackConfig};
use crate::error::{StackError, StackResult};
use crate::policy::BlockPolicy;
use crate::stats::StackStats;

/// Segmented, reference-stable LIFO stack
///
/// Elements live in blocks obtained from `A`. Pushing never moves existing
/// elements; popping hands back emptied blocks according to the configured
/// retention policy.
///
/// # Examples
///
/// ```
/// use segstack::Stack;
///
/// let mut stack = Stack::new();
/// stack.push(1)?;
/// stack.push(2)?;
///
/// assert_eq!(stack.top()?, &2);
/// assert_eq!(stack.pop()?, 2);
/// assert_eq!(stack.len(), 1);
/// # Ok::<(), segstack::StackError>(())
/// ```
pub struct Stack<T, A: Allocator = SystemAllocator> {
    chain: BlockChain<T>,
    policy: BlockPolicy,
    stats: StackStats,
    alloc: A,
}

impl<T> Stack<T> {
    /// Creates an empty stack; no memory is allocated until the first push
    pub fn new() -> Self {
        Self::new_in(SystemAllocator::new())
    }

    /// Creates an empty stack whose first block holds `hint` elements
    ///
    /// The hint is raised to at least one, and the block ceiling is raised to
    /// the hint when it is larger. Nothing is allocated until the first push.
    pub fn with_capacity(hint: usize) -> Self {
        let first = hint.max(1);
        let config = StackConfig::new()
            .with_min_block_capacity(first)
            .with_max_block_capacity(DEFAULT_MAX_BLOCK_CAPACITY.max(first));

        Self::from_parts(BlockPolicy::resolve::<T>(config), SystemAllocator::new())
    }

    /// Creates an empty stack with explicit minimum and maximum block capacities
    pub fn with_block_limits(min: usize, max: usize) -> StackResult<Self> {
        Self::with_config(
            StackConfig::new()
                .with_min_block_capacity(min)
                .with_max_block_capacity(max),
        )
    }

    /// Creates an empty stack from a validated configuration
    pub fn with_config(config: StackConfig) -> StackResult<Self> {
        Self::with_config_in(config, SystemAllocator::new())
    }
}

impl<T, A: Allocator> Stack<T, A> {
    /// Creates an empty stack drawing blocks from `alloc`
    pub fn new_in(alloc: A) -> Self {
        Self::from_parts(BlockPolicy::resolve::<T>(StackConfig::default()), alloc)
    }

    /// Creates an empty stack with `config`, drawing blocks from `alloc`
    pub fn with_config_in(config: StackConfig, alloc: A) -> StackResult<Self> {
        Ok(Self::from_parts(BlockPolicy::for_type::<T>(config)?, alloc))
    }

    fn from_parts(policy: BlockPolicy, alloc: A) -> Self {
        Self {
            chain: BlockChain::new(),
            policy,
            stats: StackStats::new(),
            alloc,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Total element slots across all owned blocks, unused blocks included
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chain.capacity()
    }

    /// Number of blocks currently owned
    #[inline]
    pub fn block_count(&self) -> usize {
        self.chain.blocks()
    }

    /// Largest element count the allocator could ever describe
    pub fn max_size(&self) -> usize {
        match size_of::<T>() {
            0 => usize::MAX,
            size => A::max_allocation_size() / size,
        }
    }

    /// Configuration this stack was built with
    pub fn config(&self) -> &StackConfig {
        self.policy.config()
    }

    /// Smallest and largest capacity a new block may get
    pub fn block_limits(&self) -> (usize, usize) {
        (self.policy.min_capacity(), self.policy.max_capacity())
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Snapshot of block traffic counters
    pub fn stats(&self) -> StackStats {
        self.stats
    }

    // ========================================================================
    // Push / emplace
    // ========================================================================

    /// Pushes `value` on top
    ///
    /// On allocation failure the stack is unchanged and `value` is dropped;
    /// use [`Stack::try_push`] to get it back.
    pub fn push(&mut self, value: T) -> StackResult<()> {
        self.try_push(value).map_err(|(_, err)| err)
    }

    /// Pushes `value` on top, handing it back if no block could be obtained
    pub fn try_push(&mut self, value: T) -> Result<(), (T, StackError)> {
        match self.reserve_slot() {
            Ok(fresh) => {
                // SAFETY: reserve_slot just secured a slot
                unsafe { self.write_reserved(value, fresh) };
                Ok(())
            }
            Err(err) => Err((value, err)),
        }
    }

    /// Constructs the new top element in place from `f`
    ///
    /// The slot is secured before `f` runs. If `f` panics, the stack is
    /// unchanged apart from possibly holding one more unused block.
    pub fn emplace_with<F>(&mut self, f: F) -> StackResult<&mut T>
    where
        F: FnOnce() -> T,
    {
        let fresh = self.reserve_slot()?;
        let value = f();

        // SAFETY: the slot secured above is untouched; f cannot reach self
        unsafe { Ok(&mut *self.write_reserved(value, fresh)) }
    }

    /// Constructs the new top element in place from a fallible `f`
    ///
    /// A construction error becomes [`StackError::ConstructionFailed`] and
    /// leaves the stack unchanged.
    pub fn try_emplace_with<F, E>(&mut self, f: F) -> StackResult<&mut T>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let fresh = self.reserve_slot()?;
        let value = f().map_err(StackError::construction_failed)?;

        // SAFETY: the slot secured above is untouched; f cannot reach self
        unsafe { Ok(&mut *self.write_reserved(value, fresh)) }
    }

    /// Secures a free slot in `current` or in the next unused block
    ///
    /// Returns `true` when a new block had to be allocated.
    fn reserve_slot(&mut self) -> StackResult<bool> {
        if self.chain.has_free_slot() {
            return Ok(false);
        }

        let capacity = match self.chain.current_capacity() {
            Some(previous) => self.policy.next_capacity(previous, self.chain.len()),
            None => self.policy.first_capacity(),
        };

        let block = self.allocate_block(capacity)?;
        // SAFETY: the block is fresh, empty and unlinked
        unsafe { self.chain.link_back(block) };
        Ok(true)
    }

    /// Writes `value` into the slot secured by [`Stack::reserve_slot`] or `reserve`
    ///
    /// # Safety
    ///
    /// `current` or the next unused block has a free slot.
    unsafe fn write_reserved(&mut self, value: T, fresh: bool) -> *mut T {
        if self.chain.advance() && !fresh {
            self.stats.record_reuse();

            #[cfg(feature = "logging")]
            trace!(len = self.chain.len(), "advanced into unused block");
        }

        // SAFETY: after advancing, current has a free slot (caller contract)
        let slot = unsafe { self.chain.push_unchecked(value) };
        self.stats.record_len(self.chain.len());
        slot
    }

    // ========================================================================
    // Pop / top
    // ========================================================================

    /// Top element
    pub fn top(&self) -> StackResult<&T> {
        self.peek().ok_or_else(|| StackError::empty_access("top"))
    }

    /// Mutable top element
    pub fn top_mut(&mut self) -> StackResult<&mut T> {
        match self.chain.top() {
            // SAFETY: the slot is live and uniquely borrowed through &mut self
            Some(slot) => Ok(unsafe { &mut *slot }),
            None => Err(StackError::empty_access("top_mut")),
        }
    }

    /// Top element, or `None` when empty
    pub fn peek(&self) -> Option<&T> {
        // SAFETY: the slot is live for as long as self is borrowed
        self.chain.top().map(|slot| unsafe { &*slot })
    }

    /// Removes and returns the top element
    pub fn pop(&mut self) -> StackResult<T> {
        self.try_pop().ok_or_else(|| StackError::empty_access("pop"))
    }

    /// Removes and returns the top element, or `None` when empty
    pub fn try_pop(&mut self) -> Option<T> {
        let value = self.chain.pop_top()?;

        if self.chain.current_spent() {
            let run = self.chain.retire_current(self.policy.retain_spare());
            // SAFETY: the run was detached from our own chain
            unsafe { self.release_run(run) };
        }

        Some(value)
    }

    // ========================================================================
    // Capacity management
    // ========================================================================

    /// Ensures `additional` more pushes succeed without allocating
    ///
    /// Appends blocks after the last one; existing blocks and elements are
    /// untouched. If an allocation fails midway, blocks appended so far stay.
    /// Zero-sized elements need no storage up front, so for them only the
    /// length bound is checked.
    pub fn reserve(&mut self, additional: usize) -> StackResult<()> {
        if size_of::<T>() == 0 {
            return self.check_headroom(additional);
        }
        self.reserve_storage(additional)
    }

    fn check_headroom(&self, additional: usize) -> StackResult<()> {
        let requested = self.len().saturating_add(additional);
        if self.len().checked_add(additional).is_none() || requested > self.max_size() {
            return Err(StackError::capacity_overflow(requested));
        }
        Ok(())
    }

    /// Links blocks until `additional` slots are free, whatever the element size
    fn reserve_storage(&mut self, additional: usize) -> StackResult<()> {
        self.check_headroom(additional)?;

        let mut available = self.chain.current_free() + self.chain.unused_capacity();
        while available < additional {
            let capacity = self.policy.reserve_capacity(additional - available);
            let block = self.allocate_block(capacity)?;
            // SAFETY: the block is fresh, empty and unlinked
            unsafe { self.chain.link_back(block) };
            available += capacity;
        }

        Ok(())
    }

    /// Releases every empty block
    ///
    /// Partially used blocks are not compacted; `len()` and element order
    /// never change.
    pub fn shrink_to_fit(&mut self) {
        let run = if self.chain.is_empty() {
            self.chain.detach_all()
        } else {
            self.chain.detach_unused()
        };

        // SAFETY: the run was detached from our own chain
        let released = unsafe { self.release_run(run) };

        #[cfg(feature = "logging")]
        {
            if released > 0 {
                debug!(released, capacity = self.capacity(), "shrunk stack");
            }
        }
        #[cfg(not(feature = "logging"))]
        let _ = released;
    }

    /// Drops every element and releases every block
    pub fn clear(&mut self) {
        let run = self.chain.detach_all();
        // SAFETY: the run is our whole chain, now detached
        unsafe { self.release_run(run) };
    }

    /// Exchanges the contents, allocators and configuration of two stacks
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    // ========================================================================
    // Block traffic
    // ========================================================================

    fn allocate_block(&mut self, capacity: usize) -> StackResult<BlockPtr<T>> {
        match Block::allocate(&self.alloc, capacity) {
            Ok(block) => {
                self.stats.record_allocation();

                #[cfg(feature = "logging")]
                trace!(capacity, blocks = self.chain.blocks() + 1, "allocated block");

                Ok(block)
            }
            Err(err) => {
                #[cfg(feature = "logging")]
                debug!(capacity, error = %err, "block allocation refused");

                Err(err)
            }
        }
    }

    /// Drops and frees a detached run of blocks; returns how many were freed
    ///
    /// # Safety
    ///
    /// The run is detached from every chain and its blocks came from an
    /// allocator equal to `self.alloc`.
    unsafe fn release_run(&mut self, mut run: Option<BlockPtr<T>>) -> usize {
        let mut released = 0;

        while let Some(block) = run {
            // SAFETY: the successor is read before the block is freed; the
            // block is owned by nobody else (caller contract)
            unsafe {
                run = block.as_ref().next;
                Block::release(block, &self.alloc);
            }
            released += 1;
        }

        if released > 0 {
            self.stats.record_release(released);

            #[cfg(feature = "logging")]
            trace!(released, blocks = self.chain.blocks(), "released blocks");
        }

        released
    }
}

impl<T, A: Allocator + PartialEq> Stack<T, A> {
    /// Moves every element of `other` onto `self`, leaving `other` empty
    ///
    /// Elements keep `other`'s bottom-to-top order on top of `self`'s. When
    /// both stacks share an allocator and `other` does not fit into the
    /// active block, its blocks are relinked into `self` and no element
    /// moves. `other` keeps its allocator and configuration but owns no
    /// blocks afterwards.
    pub fn append(&mut self, other: &mut Self) -> StackResult<()> {
        if other.is_empty() {
            return Ok(());
        }

        if self.alloc != other.alloc {
            self.reserve_storage(other.len())?;
            self.move_elements_from(other);
        } else if other.len() <= self.chain.current_free() {
            self.move_elements_from(other);
        } else if self.is_empty() {
            self.clear();
            self.chain = mem::take(&mut other.chain);
        } else {
            let spare = other.chain.detach_unused();
            // SAFETY: the run was detached from other's chain
            unsafe { other.release_run(spare) };

            let unused = self.chain.detach_unused();
            // SAFETY: neither chain has unused blocks left, both are non-empty
            // and the allocators are equal; the detached run is empty blocks
            unsafe {
                self.chain.splice(&mut other.chain);
                self.chain.link_run(unused);
            }
            self.stats.record_relink();

            #[cfg(feature = "logging")]
            debug!(
                len = self.len(),
                blocks = self.block_count(),
                "relinked appended chain"
            );
        }

        self.stats.record_len(self.len());
        Ok(())
    }

    /// Builds a stack on `alloc` from `other`'s elements
    ///
    /// When `alloc` equals `other`'s allocator the chain is taken over as is;
    /// otherwise the elements move into fresh blocks from `alloc`. On
    /// allocation failure `other` and its elements are dropped.
    pub fn from_stack_in(mut other: Self, alloc: A) -> StackResult<Self> {
        let policy = other.policy.clone();

        if alloc == other.alloc {
            let stats = other.stats;
            let chain = mem::take(&mut other.chain);
            return Ok(Self {
                chain,
                policy,
                stats,
                alloc,
            });
        }

        let mut moved = Self::from_parts(policy, alloc);
        moved.reserve_storage(other.len())?;
        moved.move_elements_from(&mut other);
        moved.stats.record_len(moved.len());
        Ok(moved)
    }

    /// Moves `other`'s elements bitwise into our free slots and frees its blocks
    fn move_elements_from(&mut self, other: &mut Self) {
        debug_assert!(
            self.chain.current_free() + self.chain.unused_capacity() >= other.len()
        );

        // SAFETY: the caller made room for other.len() elements; the chains
        // are distinct
        unsafe { self.chain.move_from(&mut other.chain) };
        other.clear();
    }
}

impl<T: Clone, A: Allocator> Stack<T, A> {
    /// Deep copy drawing blocks from `alloc`
    pub fn try_clone_in<B: Allocator>(&self, alloc: B) -> StackResult<Stack<T, B>> {
        let mut copy: Stack<T, B> = Stack::from_parts(self.policy.clone(), alloc);
        copy.reserve_storage(self.len())?;

        for value in self.chain.iter() {
            // SAFETY: reserve above made room for every element
            unsafe { copy.write_reserved(value.clone(), false) };
        }

        Ok(copy)
    }

    /// Deep copy with a clone of this stack's allocator
    pub fn try_clone(&self) -> StackResult<Self>
    where
        A: Clone,
    {
        self.try_clone_in(self.alloc.clone())
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Stack<T, A> {
    /// # Panics
    ///
    /// Panics if a block cannot be allocated.
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("stack clone failed: {err}"),
        }
    }

    /// Reuses this stack's blocks; the allocator is kept
    fn clone_from(&mut self, source: &Self) {
        self.chain.clear_elements();
        self.policy = source.policy.clone();

        if let Err(err) = self.reserve_storage(source.len()) {
            panic!("stack clone failed: {err}");
        }
        for value in source.chain.iter() {
            // SAFETY: reserve above made room for every element
            unsafe { self.write_reserved(value.clone(), false) };
        }
    }
}

impl<T, A: Allocator> Drop for Stack<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, A: Allocator + Default> Default for Stack<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A, B> PartialEq<Stack<T, B>> for Stack<T, A>
where
    T: PartialEq,
    A: Allocator,
    B: Allocator,
{
    fn eq(&self, other: &Stack<T, B>) -> bool {
        self.len() == other.len() && self.chain.iter().eq(other.chain.iter())
    }
}

impl<T: Eq, A: Allocator> Eq for Stack<T, A> {}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Stack<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("blocks", &self.block_count())
            .field("top", &self.peek())
            .finish()
    }
}

impl<T, A: Allocator> Extend<T> for Stack<T, A> {
    /// # Panics
    ///
    /// Panics if a block cannot be allocated.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            if let Err(err) = self.push(value) {
                panic!("stack extend failed: {err}");
            }
        }
    }
}

impl<'a, T: Copy + 'a, A: Allocator> Extend<&'a T> for Stack<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T, A: Allocator + Default> FromIterator<T> for Stack<T, A> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut stack = Self::default();
        stack.extend(iter);
        stack
    }
}

// SAFETY: The stack exclusively owns its blocks and the elements in them.
// - Sending it moves the elements (T: Send) and the allocator (A: Send)
// - No block is shared with another stack
unsafe impl<T: Send, A: Allocator + Send> Send for Stack<T, A> {}

// SAFETY: Shared access only yields `&T` (top/peek) and `&A`.
// - No interior mutability through &self
unsafe impl<T: Sync, A: Allocator + Sync> Sync for Stack<T, A> {}
