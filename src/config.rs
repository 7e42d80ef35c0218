//! Configuration for sparse hash containers
//!
//! [`SparseHashConfig`] bundles the tunable parameters shared by
//! [`SparseHashMap`](crate::SparseHashMap) and
//! [`SparseHashSet`](crate::SparseHashSet): load thresholds and the dense
//! slot allocation block size. Presets cover the common trade-off points.

use crate::error::{Result, SparseError};
use serde::{Deserialize, Serialize};

/// Default initial bucket count for new containers
pub const DEFAULT_BUCKET_COUNT: usize = 16;

/// Default maximum load factor before a growing rehash
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.5;

/// Default tombstone fraction before a sweeping rehash
pub const DEFAULT_MAX_TOMBSTONE_FACTOR: f64 = 0.125;

/// Default dense-array allocation block size (slots)
pub const DEFAULT_SLOT_BLOCK: usize = 4;

/// Allowed dense-array allocation block sizes
pub const SLOT_BLOCK_CHOICES: [usize; 3] = [2, 4, 8];

/// Configuration for sparse hash containers
///
/// # Examples
///
/// ```rust
/// use sparsehash::SparseHashConfig;
///
/// let config = SparseHashConfig::memory_optimized();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.slot_block, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparseHashConfig {
    /// Minimum bucket count requested from the growth policy at construction
    pub initial_capacity: usize,
    /// Load factor (`(size + tombstones) / bucket_count`) above which the
    /// table grows; must lie in (0.0, 1.0)
    pub max_load_factor: f64,
    /// Tombstone fraction (`tombstones / bucket_count`) above which the
    /// table is swept by a rehash; must lie in (0.0, 1.0)
    pub max_tombstone_factor: f64,
    /// Block size, in slots, by which per-group dense arrays grow
    pub slot_block: usize,
}

impl Default for SparseHashConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_BUCKET_COUNT,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            max_tombstone_factor: DEFAULT_MAX_TOMBSTONE_FACTOR,
            slot_block: DEFAULT_SLOT_BLOCK,
        }
    }
}

impl SparseHashConfig {
    /// Configuration minimizing memory slack: smallest allocation block,
    /// tighter tombstone sweeping
    pub fn memory_optimized() -> Self {
        Self {
            slot_block: 2,
            max_tombstone_factor: 0.0625,
            ..Self::default()
        }
    }

    /// Configuration for workloads with heavy insert/erase churn: larger
    /// allocation blocks amortize slot shifting, tombstones are swept early
    pub fn high_churn() -> Self {
        Self {
            slot_block: 8,
            max_tombstone_factor: 0.0625,
            ..Self::default()
        }
    }

    /// Configuration starting at the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            initial_capacity: capacity,
            ..Self::default()
        }
    }

    /// Validate all parameters, returning `InvalidConfig` on the first
    /// violation
    pub fn validate(&self) -> Result<()> {
        if !(self.max_load_factor > 0.0 && self.max_load_factor < 1.0) {
            return Err(SparseError::invalid_config(format!(
                "max_load_factor {} outside (0.0, 1.0)",
                self.max_load_factor
            )));
        }
        if !(self.max_tombstone_factor > 0.0 && self.max_tombstone_factor < 1.0) {
            return Err(SparseError::invalid_config(format!(
                "max_tombstone_factor {} outside (0.0, 1.0)",
                self.max_tombstone_factor
            )));
        }
        if !SLOT_BLOCK_CHOICES.contains(&self.slot_block) {
            return Err(SparseError::invalid_config(format!(
                "slot_block {} not one of {:?}",
                self.slot_block, SLOT_BLOCK_CHOICES
            )));
        }
        Ok(())
    }
}
