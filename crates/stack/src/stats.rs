//! Statistics tracking for block traffic
//!
//! Updated under `&mut self`, so plain counters are enough.

/// Counters describing how a stack has used its blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackStats {
    /// Blocks obtained from the allocator
    pub blocks_allocated: usize,
    /// Blocks handed back to the allocator
    pub blocks_released: usize,
    /// Growth events served by an unused block instead of a new allocation
    pub blocks_reused: usize,
    /// Appends that spliced the other chain in without moving elements
    pub relinked_appends: usize,
    /// Highest element count observed
    pub peak_len: usize,
}

impl StackStats {
    /// Creates zeroed statistics
    pub const fn new() -> Self {
        Self {
            blocks_allocated: 0,
            blocks_released: 0,
            blocks_reused: 0,
            relinked_appends: 0,
            peak_len: 0,
        }
    }

    /// Blocks currently owned according to the counters
    pub fn live_blocks(&self) -> usize {
        self.blocks_allocated.saturating_sub(self.blocks_released)
    }

    /// Fraction of growth events that avoided the allocator
    pub fn reuse_ratio(&self) -> f64 {
        let growth = self.blocks_allocated + self.blocks_reused;
        if growth == 0 {
            0.0
        } else {
            self.blocks_reused as f64 / growth as f64
        }
    }

    pub(crate) fn record_allocation(&mut self) {
        self.blocks_allocated += 1;
    }

    pub(crate) fn record_release(&mut self, blocks: usize) {
        self.blocks_released += blocks;
    }

    pub(crate) fn record_reuse(&mut self) {
        self.blocks_reused += 1;
    }

    pub(crate) fn record_relink(&mut self) {
        self.relinked_appends += 1;
    }

    pub(crate) fn record_len(&mut self, len: usize) {
        self.peak_len = self.peak_len.max(len);
    }
}

impl core::fmt::Display for StackStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Stack Statistics:")?;
        writeln!(f, "  Blocks allocated: {}", self.blocks_allocated)?;
        writeln!(f, "  Blocks released: {}", self.blocks_released)?;
        writeln!(
            f,
            "  Blocks reused: {} ({:.1}%)",
            self.blocks_reused,
            self.reuse_ratio() * 100.0
        )?;
        writeln!(f, "  Relinked appends: {}", self.relinked_appends)?;
        writeln!(f, "  Peak length: {}", self.peak_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let stats = StackStats::new();
        assert_eq!(stats, StackStats::default());
        assert_eq!(stats.live_blocks(), 0);
        assert_eq!(stats.reuse_ratio(), 0.0);
    }

    #[test]
    fn test_counters() {
        let mut stats = StackStats::new();
        stats.record_allocation();
        stats.record_allocation();
        stats.record_reuse();
        stats.record_release(1);
        stats.record_len(10);
        stats.record_len(4);

        assert_eq!(stats.live_blocks(), 1);
        assert_eq!(stats.peak_len, 10);
        assert!((stats.reuse_ratio() - 1.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display() {
        let mut stats = StackStats::new();
        stats.record_relink();
        let text = stats.to_string();
        assert!(text.contains("Relinked appends: 1"));
    }
}
