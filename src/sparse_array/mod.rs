//! Two-level sparse storage of bucket slots
//!
//! The logical bucket space is partitioned into fixed windows of
//! [`GROUP_BITS`] buckets. Each group keeps an occupied bitmap, a deleted
//! bitmap, and a densely packed slot array holding only the
//! occupied-or-tombstoned positions; the dense index of a bucket is the
//! popcount of the union bitmap below its bit. [`SparseArray`] stitches the
//! groups into one logical array addressed by bucket index.

mod group;
mod sparse_array;

pub use group::GROUP_BITS;
pub use sparse_array::{Drain, SparseArray, SparseArrayIntoIter, SparseIter, SparseIterMut};

pub(crate) use group::SparseGroup;

/// State of a logical bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketState {
    /// Never occupied since the last rehash
    Empty,
    /// Holds a live entry
    Occupied,
    /// Tombstone: held an entry that has been erased
    Deleted,
}
