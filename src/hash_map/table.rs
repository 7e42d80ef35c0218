//! Hash table engine: probe sequence, tombstones, load management, rehash
//!
//! The engine is generic over the stored entry type so that the map and set
//! fronts share one implementation. It owns a [`SparseArray`] of entries
//! and a [`GrowthPolicy`]; every key operation becomes a walk of the
//! quadratic probe sequence `b_k = b_0 + k(k+1)/2 (mod N)` over the array.

use crate::config::SparseHashConfig;
use crate::error::{Result, SparseError};
use crate::hash_map::growth_policy::GrowthPolicy;
use crate::io::{DataDeserialize, DataInput, DataOutput, DataSerialize};
use crate::sparse_array::{BucketState, SparseArray, SparseIter, SparseIterMut};
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash, Hasher};

/// Serialized stream format version
const SERIAL_FORMAT_VERSION: u8 = 1;

/// Entries stored in a [`SparseTable`] expose the key they hash and compare
/// by
pub trait TableEntry {
    /// Key type the table probes with
    type Key;

    /// The stored key
    fn key(&self) -> &Self::Key;
}

/// Map entry: a key with its value
#[derive(Debug, Clone)]
pub(crate) struct MapEntry<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> TableEntry for MapEntry<K, V> {
    type Key = K;

    #[inline]
    fn key(&self) -> &K {
        &self.key
    }
}

impl<K: DataSerialize, V: DataSerialize> DataSerialize for MapEntry<K, V> {
    fn serialize_to<O: DataOutput + ?Sized>(&self, output: &mut O) -> Result<()> {
        self.key.serialize_to(output)?;
        self.value.serialize_to(output)
    }
}

impl<K: DataDeserialize, V: DataDeserialize> DataDeserialize for MapEntry<K, V> {
    fn deserialize_from<I: DataInput + ?Sized>(input: &mut I) -> Result<Self> {
        Ok(Self {
            key: K::deserialize_from(input)?,
            value: V::deserialize_from(input)?,
        })
    }
}

/// Set entry: a bare key
#[derive(Debug, Clone)]
pub(crate) struct SetEntry<K>(pub K);

impl<K> TableEntry for SetEntry<K> {
    type Key = K;

    #[inline]
    fn key(&self) -> &K {
        &self.0
    }
}

impl<K: DataSerialize> DataSerialize for SetEntry<K> {
    fn serialize_to<O: DataOutput + ?Sized>(&self, output: &mut O) -> Result<()> {
        self.0.serialize_to(output)
    }
}

impl<K: DataDeserialize> DataDeserialize for SetEntry<K> {
    fn deserialize_from<I: DataInput + ?Sized>(input: &mut I) -> Result<Self> {
        Ok(Self(K::deserialize_from(input)?))
    }
}

/// Result of inserting an entry
pub(crate) enum InsertOutcome<E> {
    /// The entry was placed into a previously vacant bucket
    Inserted,
    /// An equal key already occupies `bucket`; the offered entry is
    /// returned unchanged
    Existing { bucket: usize, entry: E },
}

/// Outcome of a vacancy probe
enum InsertProbe {
    Found(usize),
    Vacant { bucket: usize, tombstone: bool },
    Exhausted,
}

/// Point-in-time snapshot of table shape and memory usage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    /// Live entries
    pub size: usize,
    /// Logical buckets
    pub bucket_count: usize,
    /// Tombstoned buckets awaiting the next rehash
    pub tombstones: usize,
    /// Sparse groups in the directory
    pub groups: usize,
    /// Dense slots in use (live plus tombstoned)
    pub dense_slots: usize,
    /// Dense slots allocated
    pub allocated_slots: usize,
    /// Current load factor
    pub load_factor: f64,
}

/// The shared engine beneath [`SparseHashMap`](crate::SparseHashMap) and
/// [`SparseHashSet`](crate::SparseHashSet)
#[derive(Clone)]
pub(crate) struct SparseTable<E, S, P> {
    array: SparseArray<E>,
    policy: P,
    hash_builder: S,
    len: usize,
    tombstones: usize,
    max_load_factor: f64,
    max_tombstone_factor: f64,
}

impl<E, S, P> SparseTable<E, S, P>
where
    E: TableEntry,
    S: BuildHasher,
    P: GrowthPolicy,
{
    /// Create an empty table from its three collaborators
    pub fn new(config: SparseHashConfig, hash_builder: S, mut policy: P) -> Result<Self> {
        config.validate()?;
        let bucket_count = policy.initialize(config.initial_capacity.max(1))?;
        let array = SparseArray::with_buckets(bucket_count, config.slot_block)?;
        Ok(Self {
            array,
            policy,
            hash_builder,
            len: 0,
            tombstones: 0,
            max_load_factor: config.max_load_factor,
            max_tombstone_factor: config.max_tombstone_factor,
        })
    }

    /// Number of live entries
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the table holds no live entries
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current logical bucket count
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.policy.bucket_count()
    }

    /// Current tombstone count
    #[inline]
    pub fn tombstone_count(&self) -> usize {
        self.tombstones
    }

    /// `size / bucket_count`
    #[inline]
    pub fn load_factor(&self) -> f64 {
        if self.bucket_count() == 0 {
            0.0
        } else {
            self.len as f64 / self.bucket_count() as f64
        }
    }

    /// Configured maximum load factor
    #[inline]
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Reconfigure the maximum load factor; must lie in (0.0, 1.0). Takes
    /// effect on the next threshold check.
    pub fn set_max_load_factor(&mut self, factor: f64) -> Result<()> {
        if !(factor > 0.0 && factor < 1.0) {
            return Err(SparseError::invalid_config(format!(
                "max_load_factor {} outside (0.0, 1.0)",
                factor
            )));
        }
        self.max_load_factor = factor;
        Ok(())
    }

    /// Borrow the hasher state
    #[inline]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Hash a key with the table's hasher
    #[inline]
    pub fn hash_key<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Walk the probe sequence for `key`, returning the occupied bucket and
    /// the probe count at which it was found
    fn probe_find<Q>(&self, key: &Q, hash: u64) -> Option<(usize, usize)>
    where
        E::Key: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let n = self.bucket_count();
        let mut bucket = self.policy.bucket_for_hash(hash);
        for k in 0..n {
            match self.array.state(bucket) {
                BucketState::Empty => return None,
                BucketState::Occupied => {
                    let entry = unsafe { self.array.get(bucket).unwrap_unchecked() };
                    if entry.key().borrow() == key {
                        return Some((bucket, k));
                    }
                }
                BucketState::Deleted => {}
            }
            bucket = (bucket + k + 1) % n;
        }
        // A full cycle without an empty bucket: the key is absent. Only
        // reachable with growth policies whose probe sequence does not
        // cover the whole bucket space.
        None
    }

    /// Walk the probe sequence looking for `key` or a vacancy, remembering
    /// the first tombstone passed
    fn probe_vacancy<Q>(&self, key: &Q, hash: u64) -> InsertProbe
    where
        E::Key: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let n = self.bucket_count();
        let mut bucket = self.policy.bucket_for_hash(hash);
        let mut first_tombstone = None;
        for k in 0..n {
            match self.array.state(bucket) {
                BucketState::Empty => {
                    return match first_tombstone {
                        Some(tomb) => InsertProbe::Vacant {
                            bucket: tomb,
                            tombstone: true,
                        },
                        None => InsertProbe::Vacant {
                            bucket,
                            tombstone: false,
                        },
                    };
                }
                BucketState::Occupied => {
                    let entry = unsafe { self.array.get(bucket).unwrap_unchecked() };
                    if entry.key().borrow() == key {
                        return InsertProbe::Found(bucket);
                    }
                }
                BucketState::Deleted => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(bucket);
                    }
                }
            }
            bucket = (bucket + k + 1) % n;
        }
        match first_tombstone {
            Some(tomb) => InsertProbe::Vacant {
                bucket: tomb,
                tombstone: true,
            },
            None => InsertProbe::Exhausted,
        }
    }

    /// Bucket index holding `key`, if present
    pub fn find_bucket<Q>(&self, key: &Q, hash: u64) -> Option<usize>
    where
        E::Key: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.probe_find(key, hash).map(|(bucket, _)| bucket)
    }

    /// Number of probes needed to reach `key`, if present
    pub fn probe_length<Q>(&self, key: &Q) -> Option<usize>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        self.probe_find(key, hash).map(|(_, k)| k)
    }

    /// Entry for `key`, if present
    pub fn get_entry<Q>(&self, key: &Q) -> Option<&E>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        self.get_entry_with_hash(key, hash)
    }

    /// Entry for `key` with a caller-supplied hash
    pub fn get_entry_with_hash<Q>(&self, key: &Q, hash: u64) -> Option<&E>
    where
        E::Key: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let bucket = self.find_bucket(key, hash)?;
        self.array.get(bucket)
    }

    /// Mutable entry for `key`, if present
    pub fn get_entry_mut<Q>(&mut self, key: &Q) -> Option<&mut E>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        let bucket = self.find_bucket(key, hash)?;
        self.array.get_mut(bucket)
    }

    /// Mutable entry at a bucket returned by a preceding probe
    pub fn entry_at_mut(&mut self, bucket: usize) -> &mut E {
        self.array
            .get_mut(bucket)
            .unwrap_or_else(|| unreachable!("bucket came from a probe on this table"))
    }

    /// Insert an entry, hashing its key
    pub fn insert_entry(&mut self, entry: E) -> Result<InsertOutcome<E>>
    where
        E::Key: Hash + Eq,
    {
        let hash = self.hash_key(entry.key());
        self.insert_entry_with_hash(entry, hash)
    }

    /// Insert an entry with a caller-supplied hash
    ///
    /// On success the entry occupies the first tombstone of its probe chain
    /// if one exists, otherwise the first empty bucket. A threshold breach
    /// afterwards triggers a rehash; if the growth policy is at its maximum
    /// the entry stays inserted and the error is surfaced.
    pub fn insert_entry_with_hash(&mut self, entry: E, hash: u64) -> Result<InsertOutcome<E>>
    where
        E::Key: Hash + Eq,
    {
        loop {
            match self.probe_vacancy(entry.key(), hash) {
                InsertProbe::Found(bucket) => {
                    return Ok(InsertOutcome::Existing { bucket, entry });
                }
                InsertProbe::Vacant { bucket, tombstone } => {
                    self.array.set(bucket, entry)?;
                    if tombstone {
                        self.tombstones -= 1;
                    }
                    self.len += 1;
                    self.maybe_rehash_after_insert()?;
                    return Ok(InsertOutcome::Inserted);
                }
                InsertProbe::Exhausted => {
                    // The probe sequence covered no vacancy; grow until the
                    // geometry admits one. Unreachable for the power-of-two
                    // and prime policies under the load-factor bound.
                    log::debug!("probe space exhausted at {} buckets", self.bucket_count());
                    let next = self.policy.next_bucket_count()?;
                    self.rehash_to(next)?;
                }
            }
        }
    }

    /// Remove the entry for `key`, hashing it
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<E>
    where
        E::Key: Borrow<Q> + Hash + Eq,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        self.remove_entry_with_hash(key, hash)
    }

    /// Remove the entry for `key` with a caller-supplied hash
    pub fn remove_entry_with_hash<Q>(&mut self, key: &Q, hash: u64) -> Option<E>
    where
        E::Key: Borrow<Q> + Hash + Eq,
        Q: Eq + ?Sized,
    {
        let bucket = self.find_bucket(key, hash)?;
        let entry = self.array.take(bucket)?;
        self.len -= 1;
        self.tombstones += 1;
        self.sweep_if_needed();
        Some(entry)
    }

    /// Keep only entries for which `f` returns true
    pub fn retain<F>(&mut self, mut f: F)
    where
        E::Key: Hash + Eq,
        F: FnMut(&mut E) -> bool,
    {
        let removed = self.array.retain(|_, entry| f(entry));
        self.len -= removed;
        self.tombstones += removed;
        self.sweep_if_needed();
    }

    /// Drop every entry, keeping the bucket count and policy state
    pub fn clear(&mut self) {
        self.array.clear();
        self.len = 0;
        self.tombstones = 0;
    }

    /// Ensure `n` total entries fit without an intermediate rehash
    pub fn reserve(&mut self, n: usize) -> Result<()>
    where
        E::Key: Hash + Eq,
    {
        let total = n.max(self.len) + self.tombstones;
        let needed = (total as f64 / self.max_load_factor).ceil() as usize;
        if needed > self.bucket_count() {
            self.rehash_to(needed)?;
        }
        Ok(())
    }

    /// Rehash so that the bucket count is at least `min_bucket_count` and
    /// large enough for the current size
    pub fn rehash(&mut self, min_bucket_count: usize) -> Result<()>
    where
        E::Key: Hash + Eq,
    {
        self.rehash_to(min_bucket_count)
    }

    /// Rehash down to the smallest policy capacity holding the current size
    pub fn shrink_to_fit(&mut self) -> Result<()>
    where
        E::Key: Hash + Eq,
    {
        self.rehash_to(1)
    }

    fn maybe_rehash_after_insert(&mut self) -> Result<()>
    where
        E::Key: Hash + Eq,
    {
        let n = self.bucket_count() as f64;
        if (self.len + self.tombstones) as f64 > self.max_load_factor * n {
            let next = self.policy.next_bucket_count()?;
            self.rehash_to(next)
        } else if self.tombstones as f64 > self.max_tombstone_factor * n {
            self.rehash_to(self.bucket_count())
        } else {
            Ok(())
        }
    }

    /// Sweep tombstones with a same-size rehash when they pass the
    /// configured fraction; allocation failure here is non-fatal and leaves
    /// the tombstones in place
    fn sweep_if_needed(&mut self)
    where
        E::Key: Hash + Eq,
    {
        let n = self.bucket_count() as f64;
        if self.tombstones as f64 > self.max_tombstone_factor * n {
            if let Err(err) = self.rehash_to(self.bucket_count()) {
                log::debug!("tombstone sweep deferred: {}", err);
            }
        }
    }

    /// Relocate every entry into a fresh sparse array sized by the policy
    ///
    /// The rebuilt array starts tombstone-free, so placement probes for the
    /// first empty bucket only. Entries are moved in bucket order; hashes
    /// are recomputed from the keys.
    fn rehash_to(&mut self, min_bucket_count: usize) -> Result<()>
    where
        E::Key: Hash + Eq,
    {
        let floor_for_len = (self.len as f64 / self.max_load_factor).ceil() as usize;
        let target = min_bucket_count.max(floor_for_len).max(1);

        let mut new_policy = self.policy.clone();
        let new_count = new_policy.initialize(target)?;
        let mut new_array = SparseArray::with_buckets(new_count, self.array.slot_block())?;

        let hash_builder = &self.hash_builder;
        for (_, entry) in self.array.drain() {
            let mut hasher = hash_builder.build_hasher();
            entry.key().hash(&mut hasher);
            let hash = hasher.finish();

            let mut bucket = new_policy.bucket_for_hash(hash);
            let mut vacancy = None;
            for k in 0..new_count {
                if new_array.state(bucket) != BucketState::Occupied {
                    vacancy = Some(bucket);
                    break;
                }
                bucket = (bucket + k + 1) % new_count;
            }
            match vacancy {
                Some(vacant) => new_array.set(vacant, entry)?,
                None => {
                    debug_assert!(false, "probe space exhausted during rehash");
                    return Err(SparseError::invalid_config(format!(
                        "growth policy probe sequence cannot place {} entries in {} buckets",
                        self.len, new_count
                    )));
                }
            }
        }

        log::debug!(
            "rehashed {} entries: {} -> {} buckets",
            self.len,
            self.array.bucket_count(),
            new_count
        );
        self.array = new_array;
        self.policy = new_policy;
        self.tombstones = 0;
        Ok(())
    }

    /// Iterate entries in ascending bucket order
    pub fn iter(&self) -> SparseIter<'_, E> {
        self.array.iter()
    }

    /// Iterate entries mutably in ascending bucket order
    pub fn iter_mut(&mut self) -> SparseIterMut<'_, E> {
        self.array.iter_mut()
    }

    /// Consume the table, yielding entries in ascending bucket order
    pub fn into_entries(self) -> crate::sparse_array::SparseArrayIntoIter<E> {
        self.array.into_iter()
    }

    /// Snapshot of table shape and memory usage
    pub fn stats(&self) -> TableStats {
        TableStats {
            size: self.len,
            bucket_count: self.bucket_count(),
            tombstones: self.tombstones,
            groups: self.array.group_count(),
            dense_slots: self.array.dense_slot_count(),
            allocated_slots: self.array.allocated_slot_count(),
            load_factor: self.load_factor(),
        }
    }

    /// Write the table to `output`: header, policy state, tombstoned bucket
    /// indices, then `(bucket_index, entry)` per occupied bucket
    pub fn serialize_into<O>(&self, output: &mut O) -> Result<()>
    where
        O: DataOutput + ?Sized,
        E: DataSerialize,
    {
        output.write_u8(SERIAL_FORMAT_VERSION)?;
        output.write_var_int(self.bucket_count() as u64)?;
        output.write_var_int(self.len as u64)?;
        output.write_var_int(self.tombstones as u64)?;
        output.write_f64(self.max_load_factor)?;
        output.write_u64(self.policy.state())?;

        for bucket in self.array.tombstones() {
            output.write_var_int(bucket as u64)?;
        }
        for (bucket, entry) in self.array.iter() {
            output.write_var_int(bucket as u64)?;
            entry.serialize_to(output)?;
        }
        output.flush()
    }

    /// Rebuild a table from `input` by direct bucket placement
    ///
    /// Tombstone holes are recreated first so every probe chain matches the
    /// serialized table exactly. The caller must supply a hasher equivalent
    /// to the one the table was serialized with; the policy geometry itself
    /// is restored from the stream.
    pub fn deserialize_from<I>(
        input: &mut I,
        config: SparseHashConfig,
        hash_builder: S,
        mut policy: P,
    ) -> Result<Self>
    where
        I: DataInput + ?Sized,
        E: DataDeserialize,
    {
        config.validate()?;

        let version = input.read_u8()?;
        if version != SERIAL_FORMAT_VERSION {
            return Err(SparseError::deserialization_mismatch(format!(
                "unsupported format version {}",
                version
            )));
        }

        let bucket_count = input.read_var_int()? as usize;
        let len = input.read_var_int()? as usize;
        let tombstones = input.read_var_int()? as usize;
        let max_load_factor = input.read_f64()?;
        let policy_state = input.read_u64()?;

        if !(max_load_factor > 0.0 && max_load_factor < 1.0) {
            return Err(SparseError::deserialization_mismatch(format!(
                "serialized max_load_factor {} outside (0.0, 1.0)",
                max_load_factor
            )));
        }
        match len.checked_add(tombstones) {
            Some(used) if used <= bucket_count => {}
            _ => {
                return Err(SparseError::deserialization_mismatch(format!(
                    "{} entries and {} tombstones exceed {} buckets",
                    len, tombstones, bucket_count
                )));
            }
        }

        policy.restore(policy_state)?;
        if policy.bucket_count() != bucket_count {
            return Err(SparseError::deserialization_mismatch(format!(
                "policy restored {} buckets, stream declares {}",
                policy.bucket_count(),
                bucket_count
            )));
        }

        let mut array: SparseArray<E> = SparseArray::with_buckets(bucket_count, config.slot_block)?;

        for _ in 0..tombstones {
            let bucket = input.read_var_int()? as usize;
            if bucket >= bucket_count || array.state(bucket) != BucketState::Empty {
                return Err(SparseError::deserialization_mismatch(format!(
                    "invalid tombstone bucket {}",
                    bucket
                )));
            }
            array.set_deleted(bucket)?;
        }

        for _ in 0..len {
            let bucket = input.read_var_int()? as usize;
            if bucket >= bucket_count || array.state(bucket) != BucketState::Empty {
                return Err(SparseError::deserialization_mismatch(format!(
                    "invalid entry bucket {}",
                    bucket
                )));
            }
            let entry = E::deserialize_from(input)?;
            array.set(bucket, entry)?;
        }

        Ok(Self {
            array,
            policy,
            hash_builder,
            len,
            tombstones,
            max_load_factor,
            max_tombstone_factor: config.max_tombstone_factor,
        })
    }
}
