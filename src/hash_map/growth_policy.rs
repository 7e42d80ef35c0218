//! Growth policies: hash-to-bucket mapping and capacity sequencing
//!
//! A policy is a small value object owning the current bucket count. The
//! table engine never computes bucket geometry itself: it asks the policy
//! for the initial probe bucket and for the next capacity when a rehash is
//! due. Rehash works on a clone initialized at the target capacity, which
//! is committed together with the rebuilt storage.

use crate::error::{Result, SparseError};

/// Strategy mapping hashes to buckets and choosing successive capacities
pub trait GrowthPolicy: Clone {
    /// Adopt the smallest capacity this policy supports that is at least
    /// `min_bucket_count`, returning it
    fn initialize(&mut self, min_bucket_count: usize) -> Result<usize>;

    /// Currently adopted bucket count
    fn bucket_count(&self) -> usize;

    /// Map a hash to a bucket index in `[0, bucket_count)`
    fn bucket_for_hash(&self, hash: u64) -> usize;

    /// The next larger capacity this policy supports; strictly greater than
    /// the current one
    fn next_bucket_count(&self) -> Result<usize>;

    /// Largest capacity this policy can ever adopt
    fn max_bucket_count(&self) -> usize;

    /// Opaque word from which [`GrowthPolicy::restore`] can reproduce the
    /// current geometry
    fn state(&self) -> u64 {
        self.bucket_count() as u64
    }

    /// Re-adopt a previously serialized geometry
    fn restore(&mut self, state: u64) -> Result<()> {
        let requested = state as usize;
        let adopted = self.initialize(requested)?;
        if adopted != requested {
            return Err(SparseError::deserialization_mismatch(format!(
                "bucket count {} is not valid for this growth policy",
                requested
            )));
        }
        Ok(())
    }
}

const MAX_POWER_OF_TWO: usize = 1 << (usize::BITS - 1);

/// Power-of-two capacities with mask-based bucket mapping
///
/// The fastest policy, but sensitive to hash functions with correlated low
/// bits; pair it with a mixing hasher such as the default `ahash`.
#[derive(Debug, Clone, Default)]
pub struct PowerOfTwoPolicy {
    bucket_count: usize,
}

impl GrowthPolicy for PowerOfTwoPolicy {
    fn initialize(&mut self, min_bucket_count: usize) -> Result<usize> {
        let min = min_bucket_count.max(2);
        if min > self.max_bucket_count() {
            return Err(SparseError::max_capacity_exceeded(
                min,
                self.max_bucket_count(),
            ));
        }
        self.bucket_count = min.next_power_of_two();
        Ok(self.bucket_count)
    }

    #[inline]
    fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    #[inline]
    fn bucket_for_hash(&self, hash: u64) -> usize {
        debug_assert!(self.bucket_count.is_power_of_two());
        (hash as usize) & (self.bucket_count - 1)
    }

    fn next_bucket_count(&self) -> Result<usize> {
        self.bucket_count
            .checked_mul(2)
            .filter(|&n| n <= self.max_bucket_count())
            .ok_or_else(|| {
                SparseError::max_capacity_exceeded(
                    self.bucket_count.saturating_mul(2),
                    self.max_bucket_count(),
                )
            })
    }

    fn max_bucket_count(&self) -> usize {
        MAX_POWER_OF_TWO
    }
}

// Table index and prime value in one place so the modulo jump table below
// cannot drift from the capacity table.
macro_rules! prime_table {
    ($(($index:literal, $prime:literal)),+ $(,)?) => {
        /// Capacity sequence for [`PrimePolicy`], roughly doubling
        pub(crate) const PRIME_TABLE: &[u64] = &[$($prime),+];

        /// Modulo with a compile-time-known divisor per arm, letting the
        /// compiler emit magic-number division instead of `div`
        #[inline]
        fn mod_prime(hash: u64, index: usize) -> u64 {
            match index {
                $($index => hash % $prime,)+
                _ => unreachable!("prime table index out of range"),
            }
        }
    };
}

prime_table! {
    (0, 5),
    (1, 11),
    (2, 23),
    (3, 53),
    (4, 97),
    (5, 193),
    (6, 389),
    (7, 769),
    (8, 1543),
    (9, 3079),
    (10, 6151),
    (11, 12289),
    (12, 24593),
    (13, 49157),
    (14, 98317),
    (15, 196613),
    (16, 393241),
    (17, 786433),
    (18, 1572869),
    (19, 3145739),
    (20, 6291469),
    (21, 12582917),
    (22, 25165843),
    (23, 50331653),
    (24, 100663319),
    (25, 201326611),
    (26, 402653189),
    (27, 805306457),
    (28, 1610612741),
    (29, 3221225473),
    (30, 4294967291),
}

/// Prime capacities from a fixed table, modulo-based bucket mapping
///
/// Robust against hashes with correlated low bits at the cost of a
/// (specialized) division per probe.
#[derive(Debug, Clone, Default)]
pub struct PrimePolicy {
    index: usize,
    initialized: bool,
}

impl GrowthPolicy for PrimePolicy {
    fn initialize(&mut self, min_bucket_count: usize) -> Result<usize> {
        let min = min_bucket_count.max(2) as u64;
        match PRIME_TABLE
            .iter()
            .position(|&p| p >= min && p <= usize::MAX as u64)
        {
            Some(index) => {
                self.index = index;
                self.initialized = true;
                Ok(PRIME_TABLE[index] as usize)
            }
            None => Err(SparseError::max_capacity_exceeded(
                min_bucket_count,
                self.max_bucket_count(),
            )),
        }
    }

    #[inline]
    fn bucket_count(&self) -> usize {
        debug_assert!(self.initialized);
        PRIME_TABLE[self.index] as usize
    }

    #[inline]
    fn bucket_for_hash(&self, hash: u64) -> usize {
        debug_assert!(self.initialized);
        mod_prime(hash, self.index) as usize
    }

    fn next_bucket_count(&self) -> Result<usize> {
        match PRIME_TABLE.get(self.index + 1) {
            Some(&p) if p <= usize::MAX as u64 => Ok(p as usize),
            _ => Err(SparseError::max_capacity_exceeded(
                self.bucket_count().saturating_mul(2),
                self.max_bucket_count(),
            )),
        }
    }

    fn max_bucket_count(&self) -> usize {
        PRIME_TABLE
            .iter()
            .rev()
            .find(|&&p| p <= usize::MAX as u64)
            .copied()
            .unwrap_or(0) as usize
    }
}

/// Golden-ratio growth factor used by [`FactorPolicy::default`]
pub const GOLDEN_GROWTH_FACTOR: f64 = 1.618033988749895;

/// Capacities grown by a configurable multiplicative factor, generic
/// runtime modulo
///
/// The slowest mapping of the three policies but the most flexible: any
/// factor above 1.0 works, trading rehash frequency against memory slack.
#[derive(Debug, Clone)]
pub struct FactorPolicy {
    factor: f64,
    bucket_count: usize,
}

impl FactorPolicy {
    /// Create a policy growing capacities by `factor` (> 1.0)
    pub fn new(factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 1.0 {
            return Err(SparseError::invalid_config(format!(
                "growth factor {} must be finite and greater than 1.0",
                factor
            )));
        }
        Ok(Self {
            factor,
            bucket_count: 0,
        })
    }

    /// Configured growth factor
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for FactorPolicy {
    fn default() -> Self {
        Self {
            factor: GOLDEN_GROWTH_FACTOR,
            bucket_count: 0,
        }
    }
}

impl GrowthPolicy for FactorPolicy {
    fn initialize(&mut self, min_bucket_count: usize) -> Result<usize> {
        let min = min_bucket_count.max(2);
        if min > self.max_bucket_count() {
            return Err(SparseError::max_capacity_exceeded(
                min,
                self.max_bucket_count(),
            ));
        }
        self.bucket_count = min;
        Ok(self.bucket_count)
    }

    #[inline]
    fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    #[inline]
    fn bucket_for_hash(&self, hash: u64) -> usize {
        debug_assert!(self.bucket_count > 0);
        (hash % self.bucket_count as u64) as usize
    }

    fn next_bucket_count(&self) -> Result<usize> {
        let scaled = (self.bucket_count as f64 * self.factor).ceil() as usize;
        let next = scaled.max(self.bucket_count + 1);
        if next > self.max_bucket_count() {
            return Err(SparseError::max_capacity_exceeded(
                next,
                self.max_bucket_count(),
            ));
        }
        Ok(next)
    }

    fn max_bucket_count(&self) -> usize {
        MAX_POWER_OF_TWO
    }
}
