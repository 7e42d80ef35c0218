//! SparseHashMap - memory-efficient key/value container
//!
//! The map front over the sparse table engine. Compared to
//! `std::collections::HashMap` it trades a little lookup speed for a much
//! smaller footprint at low load factors: buckets without an entry cost one
//! bitmap bit instead of a full slot.

use crate::config::SparseHashConfig;
use crate::error::Result;
use crate::hash_map::growth_policy::{GrowthPolicy, PowerOfTwoPolicy};
use crate::hash_map::table::{InsertOutcome, MapEntry, SparseTable, TableStats};
use crate::io::{DataDeserialize, DataInput, DataOutput, DataSerialize};
use crate::sparse_array::{SparseArrayIntoIter, SparseIter, SparseIterMut};
use ahash::RandomState;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::mem;

/// Memory-efficient hash map built on bitmap-compressed sparse storage
///
/// Open addressing with quadratic (triangular-number) probing; erased
/// buckets become tombstones that are swept by rehash. The growth policy
/// `P` decides bucket geometry, the hasher state `S` supplies hashes.
///
/// # Examples
///
/// ```rust
/// use sparsehash::SparseHashMap;
///
/// let mut map = SparseHashMap::new();
/// map.insert("key", "value").unwrap();
/// assert_eq!(map.get("key"), Some(&"value"));
/// ```
///
/// # Reference stability
///
/// Any mutation may relocate entries; references and iterators obtained
/// earlier are invalidated (the borrow checker enforces this).
#[derive(Clone)]
pub struct SparseHashMap<K, V, S = RandomState, P = PowerOfTwoPolicy> {
    table: SparseTable<MapEntry<K, V>, S, P>,
}

impl<K, V> SparseHashMap<K, V>
where
    K: Hash + Eq,
{
    /// Creates an empty map with the default configuration
    pub fn new() -> Self {
        Self::with_config(SparseHashConfig::default()).unwrap()
    }

    /// Creates an empty map with at least the specified bucket capacity
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(SparseHashConfig::with_capacity(capacity))
    }

    /// Creates an empty map from a configuration
    pub fn with_config(config: SparseHashConfig) -> Result<Self> {
        Self::with_parts(config, RandomState::new(), PowerOfTwoPolicy::default())
    }
}

impl<K, V, S> SparseHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty map using the given hasher state
    pub fn with_hasher(hash_builder: S) -> Result<Self> {
        Self::with_parts(
            SparseHashConfig::default(),
            hash_builder,
            PowerOfTwoPolicy::default(),
        )
    }

    /// Creates an empty map with the given capacity and hasher state
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self> {
        Self::with_parts(
            SparseHashConfig::with_capacity(capacity),
            hash_builder,
            PowerOfTwoPolicy::default(),
        )
    }
}

impl<K, V, S, P> SparseHashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    /// Creates an empty map from explicit configuration, hasher state, and
    /// growth policy
    pub fn with_parts(config: SparseHashConfig, hash_builder: S, policy: P) -> Result<Self> {
        Ok(Self {
            table: SparseTable::new(config, hash_builder, policy)?,
        })
    }

    /// Returns the number of entries in the map
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the map is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current logical bucket count
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the number of tombstoned buckets awaiting the next rehash
    #[inline]
    pub fn tombstone_count(&self) -> usize {
        self.table.tombstone_count()
    }

    /// Returns the current load factor
    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.table.load_factor()
    }

    /// Returns the configured maximum load factor
    #[inline]
    pub fn max_load_factor(&self) -> f64 {
        self.table.max_load_factor()
    }

    /// Sets the maximum load factor; must lie in (0.0, 1.0)
    pub fn set_max_load_factor(&mut self, factor: f64) -> Result<()> {
        self.table.set_max_load_factor(factor)
    }

    /// Borrows the hasher state
    #[inline]
    pub fn hasher(&self) -> &S {
        self.table.hasher()
    }

    /// Computes the hash of a key with this map's hasher, for use with the
    /// `*_with_hash` operations
    #[inline]
    pub fn hash_key<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.table.hash_key(key)
    }

    /// Inserts a key-value pair, returning the previous value for the key
    /// if one was present
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.table.hash_key(&key);
        self.insert_with_hash(key, value, hash)
    }

    /// Inserts with a caller-supplied hash, avoiding recomputation in
    /// caller loops
    pub fn insert_with_hash(&mut self, key: K, value: V, hash: u64) -> Result<Option<V>> {
        match self
            .table
            .insert_entry_with_hash(MapEntry { key, value }, hash)?
        {
            InsertOutcome::Inserted => Ok(None),
            InsertOutcome::Existing { bucket, entry } => {
                let slot = self.table.entry_at_mut(bucket);
                Ok(Some(mem::replace(&mut slot.value, entry.value)))
            }
        }
    }

    /// Gets a reference to the value for a key
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_entry(key).map(|entry| &entry.value)
    }

    /// Gets a reference to the value for a key with a caller-supplied hash
    pub fn get_with_hash<Q>(&self, key: &Q, hash: u64) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.table
            .get_entry_with_hash(key, hash)
            .map(|entry| &entry.value)
    }

    /// Gets a mutable reference to the value for a key
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_entry_mut(key).map(|entry| &mut entry.value)
    }

    /// Gets the stored key and value for a key
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .get_entry(key)
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Checks if the map contains a key
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_entry(key).is_some()
    }

    /// Number of probes needed to reach a present key
    pub fn probe_length<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.probe_length(key)
    }

    /// Removes a key, returning its value if present
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key, returning the stored key and value if present
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table
            .remove_entry(key)
            .map(|entry| (entry.key, entry.value))
    }

    /// Removes a key with a caller-supplied hash
    pub fn remove_with_hash<Q>(&mut self, key: &Q, hash: u64) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.table
            .remove_entry_with_hash(key, hash)
            .map(|entry| entry.value)
    }

    /// Ensures `n` total entries fit without an intermediate rehash
    pub fn reserve(&mut self, n: usize) -> Result<()> {
        self.table.reserve(n)
    }

    /// Rehashes so the bucket count is at least `min_bucket_count`
    pub fn rehash(&mut self, min_bucket_count: usize) -> Result<()> {
        self.table.rehash(min_bucket_count)
    }

    /// Rehashes down to the smallest capacity holding the current size
    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.table.shrink_to_fit()
    }

    /// Removes all entries, keeping the bucket count
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Keeps only the pairs for which the predicate returns true
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.table.retain(|entry| {
            let MapEntry { key, value } = entry;
            f(&*key, value)
        });
    }

    /// Snapshot of table shape and memory usage
    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    /// Returns an iterator over key-value pairs in bucket order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator with mutable values in bucket order
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over keys
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over values
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable values
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Serializes the map into a [`DataOutput`]
    pub fn serialize_into<O>(&self, output: &mut O) -> Result<()>
    where
        O: DataOutput + ?Sized,
        K: DataSerialize,
        V: DataSerialize,
    {
        self.table.serialize_into(output)
    }

    /// Restores a map serialized by [`serialize_into`](Self::serialize_into)
    ///
    /// Entries are placed back at their recorded buckets without probing.
    /// `hash_builder` must be equivalent to the hasher used before
    /// serialization or subsequent lookups will miss.
    pub fn deserialize_from_parts<I>(
        input: &mut I,
        config: SparseHashConfig,
        hash_builder: S,
        policy: P,
    ) -> Result<Self>
    where
        I: DataInput + ?Sized,
        K: DataDeserialize,
        V: DataDeserialize,
    {
        Ok(Self {
            table: SparseTable::deserialize_from(input, config, hash_builder, policy)?,
        })
    }
}

impl<K, V, S, P> SparseHashMap<K, V, S, P>
where
    K: Hash + Eq + DataDeserialize,
    V: DataDeserialize,
    S: BuildHasher + Default,
    P: GrowthPolicy + Default,
{
    /// Restores a map with default configuration, hasher, and policy
    ///
    /// Only valid when the default hasher is deterministic (or seeded
    /// identically to the serializing map); see
    /// [`deserialize_from_parts`](Self::deserialize_from_parts).
    pub fn deserialize_from<I>(input: &mut I) -> Result<Self>
    where
        I: DataInput + ?Sized,
    {
        Self::deserialize_from_parts(
            input,
            SparseHashConfig::default(),
            S::default(),
            P::default(),
        )
    }
}

impl<K, V> Default for SparseHashMap<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, P> fmt::Debug for SparseHashMap<K, V, S, P>
where
    K: Hash + Eq + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
    P: GrowthPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, P> PartialEq for SparseHashMap<K, V, S, P>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, S, P> Eq for SparseHashMap<K, V, S, P>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
}

impl<K, V, S, P> Extend<(K, V)> for SparseHashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value)
                .expect("allocation failed while extending SparseHashMap");
        }
    }
}

impl<K, V> FromIterator<(K, V)> for SparseHashMap<K, V>
where
    K: Hash + Eq,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a SparseHashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, P> IntoIterator for &'a mut SparseHashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, S, P> IntoIterator for SparseHashMap<K, V, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.table.into_entries(),
        }
    }
}

/// Iterator over key-value pairs in bucket order
pub struct Iter<'a, K, V> {
    inner: SparseIter<'a, MapEntry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(_, entry)| (&entry.key, &entry.value))
    }
}

/// Iterator over pairs with mutable values, keys immutable
pub struct IterMut<'a, K, V> {
    inner: SparseIterMut<'a, MapEntry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, entry)| {
            let MapEntry { key, value } = entry;
            (&*key, value)
        })
    }
}

/// Iterator over keys
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }
}

/// Iterator over values
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }
}

/// Iterator over mutable values
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }
}

/// Owning iterator over key-value pairs
pub struct IntoIter<K, V> {
    inner: SparseArrayIntoIter<MapEntry<K, V>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(_, entry)| (entry.key, entry.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_map() {
        let map = SparseHashMap::<i32, String>::new();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.bucket_count(), 16);
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = SparseHashMap::new();

        assert_eq!(map.insert("key1", "value1").unwrap(), None);
        assert_eq!(map.insert("key2", "value2").unwrap(), None);
        assert_eq!(map.len(), 2);

        assert_eq!(map.get("key1"), Some(&"value1"));
        assert_eq!(map.get("key2"), Some(&"value2"));
        assert_eq!(map.get("key3"), None);
    }

    #[test]
    fn test_insert_replace() {
        let mut map = SparseHashMap::new();

        assert_eq!(map.insert("key", "value1").unwrap(), None);
        assert_eq!(map.insert("key", "value2").unwrap(), Some("value1"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("key"), Some(&"value2"));
    }

    #[test]
    fn test_remove() {
        let mut map = SparseHashMap::new();

        map.insert("key1", "value1").unwrap();
        map.insert("key2", "value2").unwrap();

        assert_eq!(map.remove("key1"), Some("value1"));
        assert_eq!(map.remove("key1"), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("key2"), Some(&"value2"));
    }

    #[test]
    fn test_heterogeneous_lookup() {
        let mut map = SparseHashMap::new();
        map.insert(String::from("alpha"), 1).unwrap();

        // &str lookups against String keys
        assert_eq!(map.get("alpha"), Some(&1));
        assert!(map.contains_key("alpha"));
        assert_eq!(map.remove("alpha"), Some(1));
    }

    #[test]
    fn test_get_mut_value_accessor() {
        let mut map = SparseHashMap::new();
        map.insert("key", 42).unwrap();

        if let Some(value) = map.get_mut("key") {
            *value = 84;
        }

        assert_eq!(map.get("key"), Some(&84));
    }

    #[test]
    fn test_get_key_value() {
        let mut map = SparseHashMap::new();
        map.insert(String::from("k"), 9).unwrap();
        let (key, value) = map.get_key_value("k").unwrap();
        assert_eq!(key, "k");
        assert_eq!(*value, 9);
    }

    #[test]
    fn test_large_dataset() {
        let mut map = SparseHashMap::new();

        for i in 0..1000 {
            map.insert(format!("key_{}", i), i).unwrap();
        }
        assert_eq!(map.len(), 1000);

        for i in 0..1000 {
            assert_eq!(map.get(&format!("key_{}", i)), Some(&i));
        }

        assert!(map.load_factor() <= map.max_load_factor());
    }

    #[test]
    fn test_iter_and_collect() {
        let mut map = SparseHashMap::new();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();
        map.insert("c", 3).unwrap();

        let mut items: Vec<_> = map.iter().collect();
        items.sort_by_key(|(k, _)| *k);
        assert_eq!(items, vec![(&"a", &1), (&"b", &2), (&"c", &3)]);
    }

    #[test]
    fn test_iter_mut() {
        let mut map = SparseHashMap::new();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();

        for (_, value) in map.iter_mut() {
            *value *= 10;
        }

        assert_eq!(map.get("a"), Some(&10));
        assert_eq!(map.get("b"), Some(&20));
    }

    #[test]
    fn test_keys_values() {
        let mut map = SparseHashMap::new();
        map.insert("a", 1).unwrap();
        map.insert("b", 2).unwrap();

        let mut keys: Vec<_> = map.keys().copied().collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        let mut values: Vec<_> = map.values().copied().collect();
        values.sort();
        assert_eq!(values, vec![1, 2]);

        for value in map.values_mut() {
            *value += 100;
        }
        assert_eq!(map.get("a"), Some(&101));
    }

    #[test]
    fn test_into_iter() {
        let mut map = SparseHashMap::new();
        map.insert("x", 1).unwrap();
        map.insert("y", 2).unwrap();

        let mut pairs: Vec<_> = map.into_iter().collect();
        pairs.sort();
        assert_eq!(pairs, vec![("x", 1), ("y", 2)]);
    }

    #[test]
    fn test_from_iterator_and_extend() {
        let mut map: SparseHashMap<i32, i32> = (0..10).map(|i| (i, i * i)).collect();
        assert_eq!(map.len(), 10);
        assert_eq!(map.get(&3), Some(&9));

        map.extend((10..20).map(|i| (i, i * i)));
        assert_eq!(map.len(), 20);
        assert_eq!(map.get(&15), Some(&225));
    }

    #[test]
    fn test_retain() {
        let mut map: SparseHashMap<i32, i32> = (0..100).map(|i| (i, i)).collect();
        map.retain(|key, _| key % 3 == 0);
        assert_eq!(map.len(), 34);
        assert!(map.contains_key(&99));
        assert!(!map.contains_key(&98));
    }

    #[test]
    fn test_clear() {
        let mut map = SparseHashMap::new();
        map.insert("key1", "value1").unwrap();
        map.insert("key2", "value2").unwrap();

        let buckets = map.bucket_count();
        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.get("key1"), None);
        assert_eq!(map.bucket_count(), buckets);
    }

    #[test]
    fn test_equality() {
        let mut a = SparseHashMap::new();
        let mut b = SparseHashMap::with_capacity(256).unwrap();
        for i in 0..50 {
            a.insert(i, i * 2).unwrap();
            b.insert(49 - i, (49 - i) * 2).unwrap();
        }
        assert_eq!(a, b);

        b.insert(100, 0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_impl() {
        let mut map = SparseHashMap::new();
        map.insert("key", "value").unwrap();

        let debug_output = format!("{:?}", map);
        assert!(debug_output.contains("key"));
        assert!(debug_output.contains("value"));
    }

    #[test]
    fn test_clone_independent() {
        let mut map = SparseHashMap::new();
        map.insert(String::from("a"), 1).unwrap();

        let mut copy = map.clone();
        copy.insert(String::from("b"), 2).unwrap();

        assert_eq!(map.len(), 1);
        assert_eq!(copy.len(), 2);
        assert_eq!(map.get("b"), None);
    }

    #[test]
    fn test_with_hash_operations() {
        let mut map = SparseHashMap::new();
        let hash = map.hash_key("key");

        assert_eq!(map.insert_with_hash("key", 1, hash).unwrap(), None);
        assert_eq!(map.get_with_hash("key", hash), Some(&1));
        assert_eq!(map.remove_with_hash("key", hash), Some(1));
        assert_eq!(map.get_with_hash("key", hash), None);
    }

    #[test]
    fn test_stats() {
        let mut map = SparseHashMap::new();
        for i in 0..8 {
            map.insert(i, i).unwrap();
        }
        map.remove(&0);
        let stats = map.stats();
        assert_eq!(stats.size, 7);
        assert_eq!(stats.dense_slots, stats.size + stats.tombstones);
    }
}
