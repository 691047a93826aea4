use std::borrow::Borrow;
use std::fmt::{self, Debug};
use std::hash::{BuildHasher, Hash};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::errors::CollectionError;
use super::hasher::{CyclicShiftBuildHasher, DEFAULT_PRIME, MadCompression};


/// Construction parameters for a [`ChainedHashMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Initial bucket count, also the floor the table never shrinks below
    pub capacity: usize,
    /// Modulus of the MAD compression
    pub prime: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            capacity: 11,
            prime: DEFAULT_PRIME,
        }
    }
}


/// Hash map using separate chaining over a dynamically resized bucket array
///
/// Keys are hashed with a 5-bit cyclic shift hash code and compressed with
/// MAD compression. The table grows to `2N - 1` buckets once the load factor
/// exceeds 1/2 and shrinks to `N / 2 + 1` once it drops below 1/4, never
/// going under the configured capacity. Every resize rehashes all entries,
/// so insert and remove are amortized O(1).
///
/// Iteration order is unspecified but stable as long as the map is not
/// modified.
#[derive(Clone)]
pub struct ChainedHashMap<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
    min_capacity: usize,
    mad: MadCompression,
    hash_builder: CyclicShiftBuildHasher,
}

impl<K, V> ChainedHashMap<K, V> {

    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Map whose MAD coefficients are drawn from the thread-local generator
    pub fn with_config(config: MapConfig) -> Self {
        Self::with_rng(config, &mut rand::rng())
    }

    /// Map with reproducible MAD coefficients
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(MapConfig::default(), &mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng>(config: MapConfig, rng: &mut R) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            buckets: make_table(capacity),
            len: 0,
            min_capacity: capacity,
            mad: MadCompression::new(config.prime, rng),
            hash_builder: CyclicShiftBuildHasher::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of buckets
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Iterate (key, value) pairs bucket by bucket
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(key, value)| (key, value)))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Remove every entry and return the table to its minimum capacity
    pub fn clear(&mut self) {
        self.buckets = make_table(self.min_capacity);
        self.len = 0;
    }
}

impl<K: Hash + Eq, V> ChainedHashMap<K, V> {

    /// Value stored for `key`, or [`CollectionError::KeyNotFound`]
    pub fn get<Q>(&self, key: &Q) -> Result<&V, CollectionError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        self.buckets[index]
            .iter()
            .find(|(k, _)| Borrow::<Q>::borrow(k) == key)
            .map(|(_, value)| value)
            .ok_or(CollectionError::KeyNotFound)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V, CollectionError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        self.buckets[index]
            .iter_mut()
            .find(|(k, _)| Borrow::<Q>::borrow(k) == key)
            .map(|(_, value)| value)
            .ok_or(CollectionError::KeyNotFound)
    }

    /// Value stored for `key`, falling back to `default` when absent
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_ok()
    }

    /// Insert or overwrite; returns the previous value when overwriting
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let index = self.bucket_index(&key);
        let bucket = &mut self.buckets[index];
        if let Some((_, existing)) = bucket.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, value));
        }

        bucket.push((key, value));
        self.len += 1;

        if self.len > self.buckets.len() / 2 {
            self.resize(2 * self.buckets.len() - 1);
        }
        None
    }

    /// Remove `key`, returning its value or [`CollectionError::KeyNotFound`]
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V, CollectionError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        let bucket = &mut self.buckets[index];
        let position = bucket
            .iter()
            .position(|(k, _)| Borrow::<Q>::borrow(k) == key)
            .ok_or(CollectionError::KeyNotFound)?;

        let (_, value) = bucket.swap_remove(position);
        self.len -= 1;

        let capacity = self.buckets.len();
        if self.len < capacity / 4 && capacity > self.min_capacity {
            self.resize((capacity / 2 + 1).max(self.min_capacity));
        }
        Ok(value)
    }

    fn bucket_index<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        let hash_code = self.hash_builder.hash_one(key);
        self.mad.compress(hash_code, self.buckets.len())
    }

    /// Rehash every entry into a fresh table of `capacity` buckets
    fn resize(&mut self, capacity: usize) {
        debug!(from = self.buckets.len(), to = capacity, len = self.len, "resizing hash table");
        let old = std::mem::replace(&mut self.buckets, make_table(capacity));
        for (key, value) in old.into_iter().flatten() {
            let index = self.bucket_index(&key);
            self.buckets[index].push((key, value));
        }
    }
}

fn make_table<K, V>(capacity: usize) -> Vec<Vec<(K, V)>> {
    (0..capacity).map(|_| Vec::new()).collect()
}

impl<K, V> Default for ChainedHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Debug, V: Debug> Debug for ChainedHashMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Hash + Eq, V> Extend<(K, V)> for ChainedHashMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for ChainedHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}
