//! Sparse hash map and hash set
//!
//! Both containers share one engine: open addressing over a
//! bitmap-compressed [`SparseArray`](crate::sparse_array::SparseArray) with
//! quadratic (triangular-number) probing and tombstoned deletion. The
//! bucket geometry is pluggable through [`GrowthPolicy`]:
//!
//! - [`PowerOfTwoPolicy`] masks hashes against a power-of-two capacity
//!   (default, fastest);
//! - [`PrimePolicy`] takes hashes modulo a tabulated prime, robust against
//!   correlated low bits;
//! - [`FactorPolicy`] grows by an arbitrary factor with a generic modulo.
//!
//! # Examples
//!
//! ```rust
//! use sparsehash::{SparseHashMap, SparseHashSet};
//!
//! let mut map = SparseHashMap::new();
//! map.insert("a", 1).unwrap();
//! map.insert("b", 2).unwrap();
//! assert_eq!(map.remove("a"), Some(1));
//!
//! let mut set = SparseHashSet::new();
//! set.insert(42).unwrap();
//! assert!(set.contains(&42));
//! ```

mod growth_policy;
mod sparse_hash_map;
mod sparse_hash_set;
mod table;

pub use growth_policy::{
    FactorPolicy, GrowthPolicy, PowerOfTwoPolicy, PrimePolicy, GOLDEN_GROWTH_FACTOR,
};
pub use sparse_hash_map::{
    IntoIter as MapIntoIter, Iter as MapIter, IterMut as MapIterMut, Keys, SparseHashMap, Values,
    ValuesMut,
};
pub use sparse_hash_set::{IntoIter as SetIntoIter, Iter as SetIter, SparseHashSet};
pub use table::TableStats;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_and_set_share_engine_behavior() {
        let mut map = SparseHashMap::new();
        let mut set = SparseHashSet::new();
        for i in 0..100u64 {
            map.insert(i, i).unwrap();
            set.insert(i).unwrap();
        }
        assert_eq!(map.len(), set.len());
        assert_eq!(map.bucket_count(), set.bucket_count());
    }

    #[test]
    fn test_prime_policy_map() {
        use crate::config::SparseHashConfig;
        use ahash::RandomState;

        let mut map: SparseHashMap<u64, u64, RandomState, PrimePolicy> =
            SparseHashMap::with_parts(
                SparseHashConfig::default(),
                RandomState::new(),
                PrimePolicy::default(),
            )
            .unwrap();

        for i in 0..100 {
            map.insert(i, i).unwrap();
        }
        assert_eq!(map.len(), 100);
        for i in 0..100 {
            assert_eq!(map.get(&i), Some(&i));
        }
        // Capacity always comes from the prime table
        assert!(crate::hash_map::growth_policy::PRIME_TABLE
            .contains(&(map.bucket_count() as u64)));
    }

    #[test]
    fn test_factor_policy_map() {
        use crate::config::SparseHashConfig;
        use ahash::RandomState;

        let mut map: SparseHashMap<u64, u64, RandomState, FactorPolicy> =
            SparseHashMap::with_parts(
                SparseHashConfig::default(),
                RandomState::new(),
                FactorPolicy::new(2.5).unwrap(),
            )
            .unwrap();

        for i in 0..200 {
            map.insert(i, i * 7).unwrap();
        }
        for i in 0..200 {
            assert_eq!(map.get(&i), Some(&(i * 7)));
        }
    }
}
