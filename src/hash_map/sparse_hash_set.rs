//! SparseHashSet - memory-efficient key-only container

use crate::config::SparseHashConfig;
use crate::error::Result;
use crate::hash_map::growth_policy::{GrowthPolicy, PowerOfTwoPolicy};
use crate::hash_map::table::{InsertOutcome, SetEntry, SparseTable, TableStats};
use crate::io::{DataDeserialize, DataInput, DataOutput, DataSerialize};
use crate::sparse_array::{SparseArrayIntoIter, SparseIter};
use ahash::RandomState;
use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};

/// Memory-efficient hash set built on the same sparse table engine as
/// [`SparseHashMap`](crate::SparseHashMap)
///
/// # Examples
///
/// ```rust
/// use sparsehash::SparseHashSet;
///
/// let mut set = SparseHashSet::new();
/// assert!(set.insert(42).unwrap());
/// assert!(!set.insert(42).unwrap());
/// assert!(set.contains(&42));
/// ```
#[derive(Clone)]
pub struct SparseHashSet<K, S = RandomState, P = PowerOfTwoPolicy> {
    table: SparseTable<SetEntry<K>, S, P>,
}

impl<K> SparseHashSet<K>
where
    K: Hash + Eq,
{
    /// Creates an empty set with the default configuration
    pub fn new() -> Self {
        Self::with_config(SparseHashConfig::default()).unwrap()
    }

    /// Creates an empty set with at least the specified bucket capacity
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_config(SparseHashConfig::with_capacity(capacity))
    }

    /// Creates an empty set from a configuration
    pub fn with_config(config: SparseHashConfig) -> Result<Self> {
        Self::with_parts(config, RandomState::new(), PowerOfTwoPolicy::default())
    }
}

impl<K, S, P> SparseHashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    /// Creates an empty set from explicit configuration, hasher state, and
    /// growth policy
    pub fn with_parts(config: SparseHashConfig, hash_builder: S, policy: P) -> Result<Self> {
        Ok(Self {
            table: SparseTable::new(config, hash_builder, policy)?,
        })
    }

    /// Returns the number of keys in the set
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the set is empty
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

    /// Computes the hash of a key with this set's hasher
    #[inline]
    pub fn hash_key<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.table.hash_key(key)
    }

    /// Inserts a key; returns true if it was not already present
    pub fn insert(&mut self, key: K) -> Result<bool> {
        let hash = self.table.hash_key(&key);
        self.insert_with_hash(key, hash)
    }

    /// Inserts with a caller-supplied hash
    pub fn insert_with_hash(&mut self, key: K, hash: u64) -> Result<bool> {
        match self.table.insert_entry_with_hash(SetEntry(key), hash)? {
            InsertOutcome::Inserted => Ok(true),
            InsertOutcome::Existing { .. } => Ok(false),
        }
    }

    /// Checks if the set contains a key
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_entry(key).is_some()
    }

    /// Gets a reference to the stored key equal to `key`
    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.get_entry(key).map(|entry| &entry.0)
    }

    /// Number of probes needed to reach a present key
    pub fn probe_length<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.probe_length(key)
    }

    /// Removes a key; returns true if it was present
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_entry(key).is_some()
    }

    /// Removes and returns the stored key equal to `key`
    pub fn take<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_entry(key).map(|entry| entry.0)
    }

    /// Ensures `n` total keys fit without an intermediate rehash
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

    /// Removes all keys, keeping the bucket count
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Keeps only the keys for which the predicate returns true
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K) -> bool,
    {
        self.table.retain(|entry| f(&entry.0));
    }

    /// Snapshot of table shape and memory usage
    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }

    /// Returns an iterator over keys in bucket order
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Serializes the set into a [`DataOutput`]
    pub fn serialize_into<O>(&self, output: &mut O) -> Result<()>
    where
        O: DataOutput + ?Sized,
        K: DataSerialize,
    {
        self.table.serialize_into(output)
    }

    /// Restores a set serialized by [`serialize_into`](Self::serialize_into)
    ///
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
    {
        Ok(Self {
            table: SparseTable::deserialize_from(input, config, hash_builder, policy)?,
        })
    }
}

impl<K> Default for SparseHashSet<K>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S, P> fmt::Debug for SparseHashSet<K, S, P>
where
    K: Hash + Eq + fmt::Debug,
    S: BuildHasher,
    P: GrowthPolicy,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, S, P> PartialEq for SparseHashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|key| other.contains(key))
    }
}

impl<K, S, P> Eq for SparseHashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
}

impl<K, S, P> Extend<K> for SparseHashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        for key in iter {
            self.insert(key)
                .expect("allocation failed while extending SparseHashSet");
        }
    }
}

impl<K> FromIterator<K> for SparseHashSet<K>
where
    K: Hash + Eq,
{
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a, K, S, P> IntoIterator for &'a SparseHashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K, S, P> IntoIterator for SparseHashSet<K, S, P>
where
    K: Hash + Eq,
    S: BuildHasher,
    P: GrowthPolicy,
{
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            inner: self.table.into_entries(),
        }
    }
}

/// Iterator over keys in bucket order
pub struct Iter<'a, K> {
    inner: SparseIter<'a, SetEntry<K>>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, entry)| &entry.0)
    }
}

/// Owning iterator over keys
pub struct IntoIter<K> {
    inner: SparseArrayIntoIter<SetEntry<K>>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, entry)| entry.0)
    }
}
