//! Error handling for the sparsehash library
//!
//! All fallible operations in the crate return [`Result`] with a
//! [`SparseError`] describing the failure. Allocation failures are surfaced
//! rather than aborting so that callers can degrade gracefully.

use thiserror::Error;

/// Main error type for the sparsehash library
#[derive(Error, Debug)]
pub enum SparseError {
    /// Memory allocation failures
    #[error("Memory allocation failed: requested {size} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        size: usize,
    },

    /// The growth policy has no larger capacity to offer
    #[error("Maximum capacity exceeded: requested {requested} buckets, policy maximum {maximum}")]
    MaxCapacityExceeded {
        /// Requested bucket count
        requested: usize,
        /// Largest bucket count the policy supports
        maximum: usize,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Configuration error message
        message: String,
    },

    /// Serialized state incompatible with the restoring container
    #[error("Deserialization mismatch: {message}")]
    DeserializationMismatch {
        /// Description of the incompatibility
        message: String,
    },

    /// Index out of bounds access
    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The invalid index
        index: usize,
        /// The valid size/length
        size: usize,
    },

    /// I/O related errors from serialization transports
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SparseError {
    /// Create an out of memory error
    pub fn out_of_memory(size: usize) -> Self {
        Self::OutOfMemory { size }
    }

    /// Create a max capacity exceeded error
    pub fn max_capacity_exceeded(requested: usize, maximum: usize) -> Self {
        Self::MaxCapacityExceeded { requested, maximum }
    }

    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a deserialization mismatch error
    pub fn deserialization_mismatch<S: Into<String>>(message: S) -> Self {
        Self::DeserializationMismatch {
            message: message.into(),
        }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::OutOfBounds { index, size }
    }

    /// Create an I/O error from a message
    pub fn io_error<S: Into<String>>(message: S) -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            message.into(),
        ))
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::OutOfMemory { .. } => true,
            Self::Io(_) => true,
            Self::MaxCapacityExceeded { .. } => false,
            Self::InvalidConfig { .. } => false,
            Self::DeserializationMismatch { .. } => false,
            Self::OutOfBounds { .. } => false,
        }
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::OutOfMemory { .. } => "memory",
            Self::MaxCapacityExceeded { .. } => "capacity",
            Self::InvalidConfig { .. } => "config",
            Self::DeserializationMismatch { .. } => "deserialization",
            Self::OutOfBounds { .. } => "bounds",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SparseError>;

/// Assert that an index is within bounds
#[inline]
pub fn check_bounds(index: usize, size: usize) -> Result<()> {
    if index >= size {
        Err(SparseError::out_of_bounds(index, size))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SparseError::out_of_memory(4096);
        assert_eq!(err.category(), "memory");
        assert!(err.is_recoverable());

        let err = SparseError::invalid_config("load factor out of range");
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_max_capacity_display() {
        let err = SparseError::max_capacity_exceeded(1 << 40, 1 << 32);
        let display = format!("{}", err);
        assert!(display.contains("Maximum capacity exceeded"));
        assert_eq!(err.category(), "capacity");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_deserialization_mismatch() {
        let err = SparseError::deserialization_mismatch("policy state 17 not a power of two");
        let display = format!("{}", err);
        assert!(display.contains("Deserialization mismatch"));
        assert!(display.contains("17"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_bounds_checking() {
        assert!(check_bounds(5, 10).is_ok());
        assert!(check_bounds(10, 10).is_err());
        assert!(check_bounds(0, 0).is_err());
    }

    #[test]
    fn test_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated stream");
        let sparse_error: SparseError = io_error.into();

        assert_eq!(sparse_error.category(), "io");
        assert!(sparse_error.is_recoverable());

        let display = format!("{}", sparse_error);
        assert!(display.contains("I/O error"));
    }

    #[test]
    fn test_error_debug() {
        let err = SparseError::out_of_bounds(10, 5);
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("OutOfBounds"));
    }
}
