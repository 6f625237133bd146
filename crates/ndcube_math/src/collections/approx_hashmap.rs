//! Approximate hash map for floating-point values such as vectors, using a
//! `BTreeMap` to record arbitrary hash values for floats.

pub use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::marker::PhantomData;

use float_ord::FloatOrd;
use smallvec::SmallVec;

use crate::*;

/// Arbitrary hash value for a float.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FloatHash(usize);

/// Approximate hash map for objects with floating-point values, using a
/// `BTreeMap` to record arbitrary hash values for floats.
///
/// Two floats within [`EPSILON`] of each other hash the same as long as no
/// third float lies between them.
#[derive(Debug, Clone)]
pub struct ApproxHashMap<K: ApproxHashMapKey, V> {
    inner: HashMap<K::Hash, V>,
    float_hashes: BTreeMap<FloatOrd<Float>, FloatHash>,
    _phantom: PhantomData<K>,
}
impl<K: ApproxHashMapKey, V> Default for ApproxHashMap<K, V> {
    fn default() -> Self {
        Self {
            inner: HashMap::new(),
            float_hashes: BTreeMap::new(),
            _phantom: PhantomData,
        }
    }
}
impl<K: ApproxHashMapKey, V> ApproxHashMap<K, V> {
    /// Constructs an empty map.
    pub fn new() -> Self {
        ApproxHashMap::default()
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    /// Returns whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Inserts an entry into the map and returns the old value, if any.
    ///
    /// `key` is assumed to be already canonicalized, if necessary. For example,
    /// hyperplanes should have a normalized normal vector.
    pub fn insert(&mut self, key: &K, value: V) -> Option<V> {
        let hash_key = key.approx_hash(|x| self.hash_float(x));
        self.inner.insert(hash_key, value)
    }
    /// Returns an entry in the map.
    pub fn entry(&mut self, key: &K) -> Entry<'_, K::Hash, V> {
        let hash_key = key.approx_hash(|x| self.hash_float(x));
        self.inner.entry(hash_key)
    }
    /// Returns the value for a key, if there is one.
    pub fn get(&self, key: &K) -> Option<&V> {
        let mut is_unknown = false;
        let hash_key = key.approx_hash(|x| {
            self.existing_float_hash(x).unwrap_or_else(|| {
                is_unknown = true;
                FloatHash(usize::MAX)
            })
        });
        if is_unknown {
            return None;
        }
        self.inner.get(&hash_key)
    }
    /// Returns whether the map contains a key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns an iterator over the values in the map, in arbitrary order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }
    /// Consumes the map and returns its values, in arbitrary order.
    pub fn into_values(self) -> impl Iterator<Item = V> {
        self.inner.into_values()
    }

    fn existing_float_hash(&self, x: Float) -> Option<FloatHash> {
        self.float_hashes
            .range(FloatOrd(x - EPSILON)..=FloatOrd(x + EPSILON))
            .next()
            .map(|(_, &hash)| hash)
    }

    /// Search for an existing hash value for a float that is approximately
    /// equal to `x`, and returns it if found. If none is found, assign a new
    /// hash value to `x` and returns that.
    fn hash_float(&mut self, x: Float) -> FloatHash {
        self.existing_float_hash(x).unwrap_or_else(|| {
            let new_hash = FloatHash(self.float_hashes.len());
            self.float_hashes.insert(FloatOrd(x), new_hash);
            new_hash
        })
    }
}

/// Type that can be used as a key in an [`ApproxHashMap`].
pub trait ApproxHashMapKey {
    /// Hashable representation of the type, using [`FloatHash`] instead of any
    /// floating-point values.
    type Hash: Eq + Hash;

    /// Returns a hashable representation of a value, using [`FloatHash`]
    /// instead of any floating-point values.
    fn approx_hash(&self, float_hash_fn: impl FnMut(Float) -> FloatHash) -> Self::Hash;
}

/// Value derived from a floating-point vector that can be hashed. Don't use
/// this directly; use via [`ApproxHashMap`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct VectorHash(SmallVec<[(u8, FloatHash); 6]>);

impl ApproxHashMapKey for Vector {
    type Hash = VectorHash;

    fn approx_hash(&self, mut float_hash_fn: impl FnMut(Float) -> FloatHash) -> Self::Hash {
        VectorHash(
            (0..self.ndim())
                .map(|i| (i, self.get(i)))
                .filter(|(_, x)| is_approx_nonzero(x))
                .map(|(i, x)| (i, float_hash_fn(x)))
                .collect(),
        )
    }
}

impl<T: Clone + Eq + Hash> ApproxHashMapKey for T {
    type Hash = T;

    fn approx_hash(&self, _float_hash_fn: impl FnMut(Float) -> FloatHash) -> Self::Hash {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_hashmap_vectors() {
        let mut map = ApproxHashMap::new();
        assert_eq!(map.insert(&vector![1.0, 0.5], 'a'), None);
        assert_eq!(map.insert(&vector![1.0 + EPSILON / 10.0, 0.5, 0.0], 'b'), Some('a'));
        assert_eq!(map.get(&vector![1.0, 0.5]), Some(&'b'));
        assert_eq!(map.get(&vector![1.0, 0.25]), None);
        assert_eq!(map.get(&vector![0.5, 1.0]), None);
        assert_eq!(map.len(), 1);

        *map.entry(&vector![0.0, 0.0, 3.0]).or_insert('c') = 'd';
        assert_eq!(map.get(&vector![0.0, 0.0, 3.0]), Some(&'d'));
        assert_eq!(map.len(), 2);
    }
}
