//! Property-based testing for the sparse hash containers
//!
//! Random operation sequences are replayed against
//! `std::collections::HashMap` as the reference model; structural
//! invariants are checked through the stats snapshot after every sequence.

use ahash::RandomState;
use proptest::prelude::*;
use sparsehash::io::{SliceDataInput, VecDataOutput};
use sparsehash::{PowerOfTwoPolicy, PrimePolicy, SparseHashConfig, SparseHashMap, SparseHashSet};
use std::collections::HashMap;

// =============================================================================
// OPERATION SEQUENCES
// =============================================================================

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u64, u64),
    Remove(u64),
    Get(u64),
    Clear,
}

fn map_ops_strategy() -> impl Strategy<Value = Vec<MapOp>> {
    prop::collection::vec(
        prop_oneof![
            // Small key space forces collisions, replacements, and
            // tombstone reuse
            (0u64..200, any::<u64>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
            (0u64..200).prop_map(MapOp::Remove),
            (0u64..200).prop_map(MapOp::Get),
            Just(MapOp::Clear),
        ],
        0..400,
    )
}

fn check_invariants(map: &SparseHashMap<u64, u64>, model: &HashMap<u64, u64>) {
    assert_eq!(map.len(), model.len());
    let stats = map.stats();
    assert_eq!(stats.size, map.len());
    assert_eq!(stats.dense_slots, stats.size + stats.tombstones);
    assert!(stats.allocated_slots >= stats.dense_slots);
    assert!(stats.size + stats.tombstones <= stats.bucket_count);
}

proptest! {
    #[test]
    fn prop_map_matches_std_model(ops in map_ops_strategy()) {
        let mut map = SparseHashMap::new();
        let mut model: HashMap<u64, u64> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Insert(k, v) => {
                    prop_assert_eq!(map.insert(k, v).unwrap(), model.insert(k, v));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(map.remove(&k), model.remove(&k));
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(map.get(&k), model.get(&k));
                }
                MapOp::Clear => {
                    map.clear();
                    model.clear();
                }
            }
        }

        check_invariants(&map, &model);
        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(v));
        }
    }

    #[test]
    fn prop_prime_policy_matches_std_model(ops in map_ops_strategy()) {
        let mut map: SparseHashMap<u64, u64, RandomState, PrimePolicy> =
            SparseHashMap::with_parts(
                SparseHashConfig::default(),
                RandomState::new(),
                PrimePolicy::default(),
            )
            .unwrap();
        let mut model: HashMap<u64, u64> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Insert(k, v) => {
                    prop_assert_eq!(map.insert(k, v).unwrap(), model.insert(k, v));
                }
                MapOp::Remove(k) => {
                    prop_assert_eq!(map.remove(&k), model.remove(&k));
                }
                MapOp::Get(k) => {
                    prop_assert_eq!(map.get(&k), model.get(&k));
                }
                MapOp::Clear => {
                    map.clear();
                    model.clear();
                }
            }
        }

        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(v));
        }
    }

    #[test]
    fn prop_iteration_yields_exact_content(
        keys in prop::collection::btree_set(any::<u64>(), 0..500)
    ) {
        let mut set = SparseHashSet::new();
        for &k in &keys {
            prop_assert!(set.insert(k).unwrap());
        }

        let collected: std::collections::BTreeSet<u64> = set.iter().copied().collect();
        prop_assert_eq!(collected, keys);
    }

    #[test]
    fn prop_insert_erase_insert_equivalent_to_single_insert(
        key in any::<u64>(),
        value in any::<u64>(),
        churn in 1usize..5
    ) {
        let mut churned = SparseHashMap::new();
        for _ in 0..churn {
            churned.insert(key, value).unwrap();
            churned.remove(&key).unwrap();
        }
        churned.insert(key, value).unwrap();

        let mut fresh = SparseHashMap::new();
        fresh.insert(key, value).unwrap();

        prop_assert_eq!(churned, fresh);
    }

    #[test]
    fn prop_serialize_round_trip(
        entries in prop::collection::hash_map(any::<u64>(), any::<u64>(), 0..200),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..20)
    ) {
        let seeds = (3, 7, 31, 127);
        let mut map: SparseHashMap<u64, u64> = SparseHashMap::with_parts(
            SparseHashConfig::default(),
            RandomState::with_seeds(seeds.0, seeds.1, seeds.2, seeds.3),
            PowerOfTwoPolicy::default(),
        )
        .unwrap();

        let keys: Vec<u64> = entries.keys().copied().collect();
        for (&k, &v) in &entries {
            map.insert(k, v).unwrap();
        }
        // Punch tombstones into the image
        if !keys.is_empty() {
            for idx in removals {
                let k = keys[idx.index(keys.len())];
                map.remove(&k);
            }
        }

        let mut out = VecDataOutput::new();
        map.serialize_into(&mut out).unwrap();
        let bytes = out.into_vec();

        let mut input = SliceDataInput::new(&bytes);
        let restored: SparseHashMap<u64, u64> = SparseHashMap::deserialize_from_parts(
            &mut input,
            SparseHashConfig::default(),
            RandomState::with_seeds(seeds.0, seeds.1, seeds.2, seeds.3),
            PowerOfTwoPolicy::default(),
        )
        .unwrap();

        prop_assert_eq!(restored.len(), map.len());
        prop_assert_eq!(restored.bucket_count(), map.bucket_count());
        for (k, v) in map.iter() {
            prop_assert_eq!(restored.get(k), Some(v));
        }
    }

    #[test]
    fn prop_reserve_allows_insertions_without_rehash(n in 1usize..500) {
        let mut map = SparseHashMap::new();
        map.reserve(n).unwrap();
        let bucket_count = map.bucket_count();

        for i in 0..n as u64 {
            map.insert(i, i).unwrap();
        }
        prop_assert_eq!(map.bucket_count(), bucket_count);
    }

    #[test]
    fn prop_retain_agrees_with_model(
        entries in prop::collection::hash_map(0u64..500, any::<u64>(), 0..300),
        modulus in 2u64..7
    ) {
        let mut map = SparseHashMap::new();
        let mut model = entries.clone();
        for (&k, &v) in &entries {
            map.insert(k, v).unwrap();
        }

        map.retain(|k, _| k % modulus == 0);
        model.retain(|k, _| k % modulus == 0);

        assert_eq!(map.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(v));
        }
        check_invariants(&map, &model);
    }
}
