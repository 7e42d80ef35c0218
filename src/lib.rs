//! # sparsehash: Memory-Efficient Hash Map and Hash Set
//!
//! This crate provides associative containers built on open addressing with
//! quadratic probing over a sparse, bit-indexed bucket array. The design
//! goal is minimal memory overhead per entry, especially at low load
//! factors, while keeping lookup performance competitive.
//!
//! ## Key Features
//!
//! - **Sparse Storage**: buckets cost one bitmap bit until used; dense slot
//!   arrays grow in small configurable blocks
//! - **Tombstoned Deletion**: erasure never moves neighbouring entries;
//!   tombstones are swept by threshold-driven rehashes
//! - **Pluggable Growth Policies**: power-of-two masking, tabulated prime
//!   modulo, or arbitrary-factor growth
//! - **Heterogeneous Lookup**: borrow-based lookups (e.g. `&str` against
//!   `String` keys)
//! - **Byte-Span Serialization**: persist and restore tables through the
//!   [`io::DataOutput`]/[`io::DataInput`] hooks
//! - **Fallible Allocation**: allocation failures surface as errors instead
//!   of aborting
//!
//! ## Quick Start
//!
//! ```rust
//! use sparsehash::{SparseHashMap, SparseHashSet};
//!
//! // Map with default power-of-two policy and ahash hasher
//! let mut map = SparseHashMap::new();
//! map.insert("answer", 42).unwrap();
//! assert_eq!(map.get("answer"), Some(&42));
//!
//! // Set sharing the same engine
//! let mut set = SparseHashSet::new();
//! set.insert("answer").unwrap();
//! assert!(set.contains("answer"));
//!
//! // Memory shape is observable
//! let stats = map.stats();
//! assert_eq!(stats.size, 1);
//! assert_eq!(stats.dense_slots, stats.size + stats.tombstones);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod error;
pub mod hash_map;
pub mod io;
pub mod sparse_array;

// Re-export core types
pub use config::SparseHashConfig;
pub use error::{Result, SparseError};
pub use hash_map::{
    FactorPolicy, GrowthPolicy, PowerOfTwoPolicy, PrimePolicy, SparseHashMap, SparseHashSet,
    TableStats,
};
pub use sparse_array::{BucketState, SparseArray};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library (currently no-op, for future use)
pub fn init() {
    log::debug!("Initializing sparsehash v{}", VERSION);
}
