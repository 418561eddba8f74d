//! Sharded map used to accumulate relevance from several threads at once.
//!
//! Keys are routed to one of a fixed number of buckets by `key mod bucket_count`.
//! Each bucket sits behind its own mutex, so writers touching different buckets
//! never contend. [`ConcurrentMap::access`] hands out a guard that holds the
//! bucket lock for exactly as long as the guard lives.

use crate::error::{Result, SearchError};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;

/// Integer keys that can be routed to a bucket.
pub trait BucketKey: Copy + Ord {
    fn bucket(self, bucket_count: usize) -> usize;
}

macro_rules! impl_bucket_key {
    ($($t:ty),*) => {
        $(
            impl BucketKey for $t {
                #[inline]
                fn bucket(self, bucket_count: usize) -> usize {
                    // rem_euclid keeps negative keys in range
                    (self as i128).rem_euclid(bucket_count as i128) as usize
                }
            }
        )*
    };
}

impl_bucket_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Exclusive handle to one value; the bucket unlocks when it is dropped.
pub type Access<'a, V> = MappedMutexGuard<'a, V>;

pub struct ConcurrentMap<K, V> {
    buckets: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K: BucketKey, V> ConcurrentMap<K, V> {
    pub fn new(bucket_count: usize) -> Result<Self> {
        if bucket_count == 0 {
            return Err(SearchError::invalid("concurrent map needs at least one bucket"));
        }
        let buckets = (0..bucket_count).map(|_| Mutex::new(BTreeMap::new())).collect();
        Ok(Self { buckets })
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Lock the bucket owning `key` and return its value, inserting the default first.
    pub fn access(&self, key: K) -> Access<'_, V>
    where
        V: Default,
    {
        let idx = key.bucket(self.buckets.len());
        MutexGuard::map(self.buckets[idx].lock(), |bucket| bucket.entry(key).or_default())
    }

    /// Merge every bucket into one map.
    ///
    /// All bucket locks are taken in ascending index order and held only while
    /// copying, so this is the single point that sees a consistent snapshot.
    pub fn build_ordinary_map(&self) -> BTreeMap<K, V>
    where
        V: Clone,
    {
        let guards: Vec<_> = self.buckets.iter().map(|bucket| bucket.lock()).collect();
        let mut merged = BTreeMap::new();
        for guard in &guards {
            merged.extend(guard.iter().map(|(k, v)| (*k, v.clone())));
        }
        merged
    }

    /// Consume the map without locking; exclusive ownership already rules out writers.
    pub fn into_ordinary_map(self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for bucket in self.buckets {
            merged.append(&mut bucket.into_inner());
        }
        merged
    }
}
