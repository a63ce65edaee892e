//! Stack configuration
//!
//! [`StackConfig`] controls how the block chain grows: the first block's
//! capacity, the ceiling for any single block, the geometric growth factor
//! and whether a block emptied by pops is kept as a spare.

use crate::error::{StackError, StackResult};

/// Default ceiling on the number of elements in a single block
pub const DEFAULT_MAX_BLOCK_CAPACITY: usize = 8192;

/// Default growth factor between consecutive blocks
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

/// Stack configuration builder
#[derive(Debug, Clone, PartialEq)]
pub struct StackConfig {
    /// Capacity of the first block; `None` derives it from the element size
    pub min_block_capacity: Option<usize>,
    /// Maximum capacity of a single block
    pub max_block_capacity: usize,
    /// Growth factor for subsequent blocks (must be >= 1.0)
    pub growth_factor: f64,
    /// Keep one emptied block around for the next growth
    pub retain_spare: bool,
}

impl StackConfig {
    /// Creates new config with default values
    pub fn new() -> Self {
        Self {
            min_block_capacity: None,
            max_block_capacity: DEFAULT_MAX_BLOCK_CAPACITY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            retain_spare: true,
        }
    }

    /// Production configuration - fewer, larger blocks
    pub fn production() -> Self {
        Self {
            min_block_capacity: Some(64),
            max_block_capacity: 64 * 1024,
            growth_factor: 2.0,
            retain_spare: true,
        }
    }

    /// Memory saving configuration - small blocks, emptied blocks released at once
    pub fn memory_saving() -> Self {
        Self {
            min_block_capacity: Some(8),
            max_block_capacity: 1024,
            growth_factor: 1.5,
            retain_spare: false,
        }
    }

    /// Debug configuration - tiny blocks so every operation crosses boundaries
    pub fn debug() -> Self {
        Self {
            min_block_capacity: Some(1),
            max_block_capacity: 4,
            growth_factor: 2.0,
            retain_spare: true,
        }
    }

    /// Sets the first block's capacity
    #[must_use = "builder methods must be chained or built"]
    pub fn with_min_block_capacity(mut self, capacity: usize) -> Self {
        self.min_block_capacity = Some(capacity);
        self
    }

    /// Sets maximum block capacity
    #[must_use = "builder methods must be chained or built"]
    pub fn with_max_block_capacity(mut self, capacity: usize) -> Self {
        self.max_block_capacity = capacity;
        self
    }

    /// Sets growth factor (validated by [`StackConfig::validate`])
    #[must_use = "builder methods must be chained or built"]
    pub fn with_growth_factor(mut self, factor: f64) -> Self {
        self.growth_factor = factor;
        self
    }

    /// Enables/disables keeping one emptied block as a spare
    #[must_use = "builder methods must be chained or built"]
    pub fn with_spare_retention(mut self, enabled: bool) -> Self {
        self.retain_spare = enabled;
        self
    }

    /// Checks the configuration for values the block chain cannot work with
    pub fn validate(&self) -> StackResult<()> {
        if self.max_block_capacity == 0 {
            return Err(StackError::invalid_config(
                "max_block_capacity must be at least 1",
            ));
        }

        match self.min_block_capacity {
            Some(0) => {
                return Err(StackError::invalid_config(
                    "min_block_capacity must be at least 1",
                ));
            }
            Some(min) if min > self.max_block_capacity => {
                return Err(StackError::invalid_config(
                    "min_block_capacity exceeds max_block_capacity",
                ));
            }
            _ => {}
        }

        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(StackError::invalid_config(
                "growth_factor must be a finite value >= 1.0",
            ));
        }

        Ok(())
    }
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::new()
    }
}
