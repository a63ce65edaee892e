//! Block sizing and retention policy
//!
//! Resolves a [`StackConfig`] against a concrete element type and answers the
//! two questions the chain asks: how large the next block should be, and
//! whether a block emptied by pops stays around.


use crate::block::Block;
use crate::chain::BlockChain;
use crate::config::StackConfig;
use crate::error::StackResult;

/// Fixed per-block and per-stack bookkeeping, in bytes
const BOOKKEEPING_BYTES: usize = size_of::<Block<()>>() + size_of::<BlockChain<()>>();

/// Smallest first block for `T` when none is configured
///
/// Large elements start with 8 slots. Small elements get enough slots for the
/// block's storage to outweigh twice the bookkeeping it carries. Zero-sized
/// elements take the ceiling.
pub(crate) const fn default_min_capacity<T>(max: usize) -> usize {
    let size = size_of::<T>();
    let overhead = BOOKKEEPING_BYTES * 2;

    let capacity = if size == 0 {
        max
    } else if size.saturating_mul(8) > overhead {
        8
    } else {
        overhead / size + 1
    };

    if capacity > max { max } else { capacity }
}

/// Resolved block policy for one stack
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BlockPolicy {
    config: StackConfig,
    min: usize,
}

impl BlockPolicy {
    /// Validates `config` and resolves the element-size default
    pub(crate) fn for_type<T>(config: StackConfig) -> StackResult<Self> {
        config.validate()?;
        Ok(Self::resolve::<T>(config))
    }

    /// Resolves a configuration already known to be valid
    pub(crate) fn resolve<T>(config: StackConfig) -> Self {
        let min = match config.min_block_capacity {
            Some(min) => min,
            None => default_min_capacity::<T>(config.max_block_capacity),
        };

        Self { config, min }
    }

    pub(crate) fn config(&self) -> &StackConfig {
        &self.config
    }

    pub(crate) fn min_capacity(&self) -> usize {
        self.min
    }

    pub(crate) fn max_capacity(&self) -> usize {
        self.config.max_block_capacity
    }

    pub(crate) fn retain_spare(&self) -> bool {
        self.config.retain_spare
    }

    /// Capacity of the first block
    pub(crate) fn first_capacity(&self) -> usize {
        self.min
    }

    /// Capacity of the block following one of `previous` slots
    ///
    /// Geometric growth, never below what the stack already holds, clamped
    /// into `[min, max]`.
    pub(crate) fn next_capacity(&self, previous: usize, total_len: usize) -> usize {
        let grown = (previous as f64 * self.config.growth_factor) as usize;

        grown
            .max(previous.saturating_add(1))
            .max(total_len)
            .clamp(self.min, self.max_capacity())
    }

    /// Capacity of a block appended by `reserve` when `remaining` slots are missing
    pub(crate) fn reserve_capacity(&self, remaining: usize) -> usize {
        remaining.clamp(self.min, self.max_capacity())
    }
}
