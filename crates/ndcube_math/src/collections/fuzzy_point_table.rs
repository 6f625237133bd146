//! Spatial hash table mapping points to values using fuzzy equality.
//!
//! Two points are considered equal if every coordinate differs by at most
//! `little_eps`, and unequal if any coordinate differs by more than `big_eps`.
//! Anything in between is ambiguous and reported as an error, since it means
//! the geometry feeding the table is inconsistent.

use std::collections::HashMap;

use itertools::Itertools;
use smallvec::SmallVec;

use crate::{Float, Vector, VectorRef};

/// Tolerances for a [`FuzzyPointTable`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FuzzyTolerance {
    /// Maximum per-coordinate difference for two points to be equal.
    pub little_eps: Float,
    /// Minimum per-coordinate difference for two points to be unequal.
    pub big_eps: Float,
    /// Width of each bucket along each axis.
    pub bucket_size: Float,
}
impl Default for FuzzyTolerance {
    fn default() -> Self {
        Self {
            little_eps: 1e-9,
            big_eps: 1e-8,
            bucket_size: 1.0 / 128.0,
        }
    }
}
impl FuzzyTolerance {
    /// Constructs a set of tolerances, checking that they are consistent.
    pub fn new(little_eps: Float, big_eps: Float, bucket_size: Float) -> Result<Self, FuzzyError> {
        let ret = Self {
            little_eps,
            big_eps,
            bucket_size,
        };
        if 0.0 <= little_eps && little_eps <= big_eps && 1e4 * big_eps <= bucket_size {
            Ok(ret)
        } else {
            Err(FuzzyError::InvalidTolerance(ret))
        }
    }

    fn compare(&self, a: &Vector, b: &Vector) -> FuzzyOrdering {
        let max_diff = (a - b).iter().map(Float::abs).fold(0.0, Float::max);
        if max_diff <= self.little_eps {
            FuzzyOrdering::Equal
        } else if max_diff > self.big_eps {
            FuzzyOrdering::Unequal
        } else {
            FuzzyOrdering::Ambiguous
        }
    }

    fn bucket_coordinate(&self, x: Float) -> i64 {
        ((x + self.big_eps) / self.bucket_size).floor() as i64
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FuzzyOrdering {
    Equal,
    Unequal,
    Ambiguous,
}

/// Error from a [`FuzzyPointTable`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FuzzyError {
    /// Two points were neither clearly equal nor clearly unequal.
    #[error("points {0} and {1} are too close to distinguish but too far to identify")]
    Ambiguous(Vector, Vector),
    /// The tolerances are inconsistent.
    #[error("invalid fuzzy tolerances {0:?}")]
    InvalidTolerance(FuzzyTolerance),
}

type BucketKey = SmallVec<[i64; 4]>;

/// Spatial hash table mapping points to values using fuzzy equality.
#[derive(Debug, Clone)]
pub struct FuzzyPointTable<V> {
    ndim: u8,
    tolerance: FuzzyTolerance,
    buckets: HashMap<BucketKey, Vec<(Vector, V)>>,
    len: usize,
}
impl<V> FuzzyPointTable<V> {
    /// Constructs an empty table for points in `ndim`-dimensional space.
    pub fn new(ndim: u8, tolerance: FuzzyTolerance) -> Self {
        Self {
            ndim,
            tolerance,
            buckets: HashMap::new(),
            len: 0,
        }
    }

    /// Returns the number of points in the table.
    pub fn len(&self) -> usize {
        self.len
    }
    /// Returns whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn home_bucket(&self, point: &Vector) -> BucketKey {
        point
            .pad(self.ndim)
            .iter()
            .map(|x| self.tolerance.bucket_coordinate(x))
            .collect()
    }

    /// Returns every bucket that could contain a point within `big_eps` of
    /// `point`. A point `y` within `big_eps` of `x` has `y + big_eps` in
    /// `[x, x + 2*big_eps]`, which spans at most two buckets per axis.
    fn candidate_buckets(&self, point: &Vector) -> Vec<BucketKey> {
        let bucket_size = self.tolerance.bucket_size;
        let big_eps = self.tolerance.big_eps;
        point
            .pad(self.ndim)
            .iter()
            .map(|x| {
                let lo = (x / bucket_size).floor() as i64;
                let hi = ((x + 2.0 * big_eps) / bucket_size).floor() as i64;
                lo..=hi
            })
            .multi_cartesian_product()
            .map(BucketKey::from_vec)
            .collect()
    }

    fn find(&self, point: &Vector) -> Result<Option<(&BucketKey, usize)>, FuzzyError> {
        let mut found = None;
        for key in self.candidate_buckets(point) {
            let Some((key, bucket)) = self.buckets.get_key_value(&key) else {
                continue;
            };
            for (i, (p, _)) in bucket.iter().enumerate() {
                match self.tolerance.compare(point, p) {
                    FuzzyOrdering::Equal => found = Some((key, i)),
                    FuzzyOrdering::Unequal => (),
                    FuzzyOrdering::Ambiguous => {
                        return Err(FuzzyError::Ambiguous(point.clone(), p.clone()));
                    }
                }
            }
        }
        Ok(found)
    }

    /// Returns the value associated with a point, or `None` if there is no
    /// matching point.
    pub fn get(&self, point: impl VectorRef) -> Result<Option<&V>, FuzzyError> {
        let point = point.to_vector();
        Ok(self
            .find(&point)?
            .and_then(|(key, i)| Some(&self.buckets.get(key)?.get(i)?.1)))
    }

    /// Inserts a point into the table, returning the old value associated
    /// with the point, if any.
    pub fn insert(&mut self, point: impl VectorRef, value: V) -> Result<Option<V>, FuzzyError> {
        let point = point.to_vector();
        if let Some((key, i)) = self.find(&point)? {
            let key = key.clone();
            if let Some(entry) = self.buckets.get_mut(&key).and_then(|b| b.get_mut(i)) {
                return Ok(Some(std::mem::replace(&mut entry.1, value)));
            }
        }
        let key = self.home_bucket(&point);
        self.buckets.entry(key).or_default().push((point, value));
        self.len += 1;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::vector;

    #[test]
    fn test_fuzzy_tolerance_validation() {
        assert!(FuzzyTolerance::new(1e-9, 1e-8, 1.0 / 128.0).is_ok());
        assert!(FuzzyTolerance::new(1e-8, 1e-9, 1.0 / 128.0).is_err());
        assert!(FuzzyTolerance::new(1e-9, 1e-3, 1.0 / 128.0).is_err());
    }

    #[test]
    fn test_fuzzy_point_table() {
        let mut table = FuzzyPointTable::new(2, FuzzyTolerance::default());
        assert_eq!(table.insert(vector![0.5, 0.25], 1), Ok(None));
        assert_eq!(table.insert(vector![0.5, -0.25], 2), Ok(None));
        assert_eq!(table.len(), 2);

        assert_eq!(table.get(vector![0.5 + 1e-10, 0.25]), Ok(Some(&1)));
        assert_eq!(table.get(vector![0.5, -0.25 - 1e-10]), Ok(Some(&2)));
        assert_eq!(table.get(vector![0.5, 0.0]), Ok(None));
        assert!(matches!(
            table.get(vector![0.5 + 5e-9, 0.25]),
            Err(FuzzyError::Ambiguous(_, _)),
        ));

        assert_eq!(table.insert(vector![0.5, 0.25 - 1e-10], 3), Ok(Some(1)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_fuzzy_point_table_bucket_boundary() {
        let mut table = FuzzyPointTable::new(1, FuzzyTolerance::default());
        let boundary = 1.0 / 128.0 - 1e-8;
        table.insert(vector![boundary - 2e-10], 'a').expect("insert");
        assert_eq!(table.get(vector![boundary + 2e-10]), Ok(Some(&'a')));
    }

    proptest! {
        #[test]
        fn proptest_fuzzy_point_table_finds_perturbed_points(
            x in -2.0..2.0_f64,
            y in -2.0..2.0_f64,
            dx in -1e-9..1e-9_f64,
            dy in -1e-9..1e-9_f64,
        ) {
            let mut table = FuzzyPointTable::new(2, FuzzyTolerance::default());
            table.insert(vector![x, y], ()).expect("insert");
            let perturbed = vector![x + dx / 2.0, y + dy / 2.0];
            prop_assert_eq!(table.get(perturbed), Ok(Some(&())));
        }
    }
}
