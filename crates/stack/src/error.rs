//! Standalone error types for segstack
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use core::alloc::Layout;
use core::fmt::Display;
use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Main Error Types
// ============================================================================

/// Stack operation errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    // --- Access Errors ---
    #[error("Empty stack access: `{operation}` called on a stack with no elements")]
    EmptyAccess { operation: &'static str },

    // --- Allocation Errors ---
    #[error("Block allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed { size: usize, align: usize },

    #[error("Capacity overflow: {requested} elements cannot be represented")]
    CapacityOverflow { requested: usize },

    // --- Element Errors ---
    #[error("Element construction failed: {reason}")]
    ConstructionFailed { reason: String },

    // --- Configuration Errors ---
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl StackError {
    /// Check if error is retryable
    ///
    /// Only allocation failures may succeed on a later attempt; everything
    /// else is a caller error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllocationFailed { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyAccess { .. } => "STACK:EMPTY",
            Self::AllocationFailed { .. } => "STACK:ALLOC:FAILED",
            Self::CapacityOverflow { .. } => "STACK:ALLOC:OVERFLOW",
            Self::ConstructionFailed { .. } => "STACK:CONSTRUCT:FAILED",
            Self::InvalidConfig { .. } => "STACK:CONFIG:INVALID",
        }
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create empty access error for the named operation
    pub fn empty_access(operation: &'static str) -> Self {
        Self::EmptyAccess { operation }
    }

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "block allocation failed");

        Self::AllocationFailed { size, align }
    }

    /// Create allocation failed error from layout
    pub fn allocation_failed_with_layout(layout: Layout) -> Self {
        Self::allocation_failed(layout.size(), layout.align())
    }

    /// Create capacity overflow error
    pub fn capacity_overflow(requested: usize) -> Self {
        #[cfg(feature = "logging")]
        warn!(requested, "stack capacity overflow");

        Self::CapacityOverflow { requested }
    }

    /// Create construction failed error from the element's own error
    pub fn construction_failed(reason: impl Display) -> Self {
        Self::ConstructionFailed {
            reason: reason.to_string(),
        }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Check if this is an empty-stack access error
    #[must_use]
    pub fn is_empty_access(&self) -> bool {
        matches!(self, Self::EmptyAccess { .. })
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for stack operations
pub type StackResult<T> = core::result::Result<T, StackError>;

/// Allocation results share the stack error type
pub type AllocError = StackError;
pub type AllocResult<T> = StackResult<T>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_access_message() {
        let error = StackError::empty_access("pop");
        assert!(error.is_empty_access());
        assert!(error.to_string().contains("pop"));
    }

    #[test]
    fn test_error_with_layout() {
        let layout = Layout::new::<u64>();
        let error = StackError::allocation_failed_with_layout(layout);
        assert!(error.to_string().contains(&layout.size().to_string()));
        assert_eq!(
            error,
            StackError::AllocationFailed {
                size: layout.size(),
                align: layout.align()
            }
        );
    }

    #[test]
    fn test_construction_failed_keeps_reason() {
        let error = StackError::construction_failed("bad input: 7");
        assert!(error.to_string().contains("bad input: 7"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(StackError::empty_access("top").code(), "STACK:EMPTY");
        assert_eq!(
            StackError::allocation_failed(1024, 8).code(),
            "STACK:ALLOC:FAILED"
        );
        assert_eq!(
            StackError::capacity_overflow(usize::MAX).code(),
            "STACK:ALLOC:OVERFLOW"
        );
        assert_eq!(
            StackError::construction_failed("x").code(),
            "STACK:CONSTRUCT:FAILED"
        );
        assert_eq!(
            StackError::invalid_config("x").code(),
            "STACK:CONFIG:INVALID"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(StackError::allocation_failed(64, 8).is_retryable());
        assert!(!StackError::empty_access("pop").is_retryable());
        assert!(!StackError::invalid_config("zero").is_retryable());
    }
}
