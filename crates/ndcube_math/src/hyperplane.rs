//! Oriented hyperplanes, which double as half-spaces.

use std::cmp::Ordering;

use crate::collections::approx_hashmap::{FloatHash, VectorHash};
use crate::{ApproxHashMapKey, Float, Vector, VectorRef, approx_cmp};

/// Side of an oriented hyperplane on which a point lies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PointWhichSide {
    /// Within [`EPSILON`](crate::EPSILON) of the hyperplane.
    On,
    /// On the side that the normal points away from.
    Inside,
    /// On the side that the normal points toward.
    Outside,
}
impl PointWhichSide {
    fn from_signed_distance(h: Float) -> Self {
        match approx_cmp(&h, &0.0) {
            Ordering::Less => Self::Inside,
            Ordering::Equal => Self::On,
            Ordering::Greater => Self::Outside,
        }
    }
}

/// The points `x` where `normal · x = distance`, with a unit normal.
///
/// As a half-space, the inside is where `normal · x < distance`, so a plane
/// with positive distance has the origin inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Hyperplane {
    normal: Vector,
    distance: Float,
}

impl Hyperplane {
    /// Returns the hyperplane `normal · x = distance` after normalizing
    /// `normal`, or `None` if `normal` is zero.
    ///
    /// `distance` is measured along the normalized normal.
    pub fn new(normal: impl VectorRef, distance: Float) -> Option<Self> {
        Some(Self {
            normal: normal.normalize()?,
            distance,
        })
    }
    /// Returns the hyperplane with the direction of `normal` that contains
    /// `point`, or `None` if `normal` is zero.
    pub fn through_point(normal: impl VectorRef, point: impl VectorRef) -> Option<Self> {
        let normal = normal.normalize()?;
        let distance = normal.dot(point);
        Some(Self { normal, distance })
    }
    /// Returns the same hyperplane with inside and outside swapped.
    #[must_use]
    pub fn flip(&self) -> Self {
        Self {
            normal: -&self.normal,
            distance: -self.distance,
        }
    }

    /// Returns the unit normal.
    pub fn normal(&self) -> &Vector {
        &self.normal
    }
    /// Returns the signed distance from the origin along the normal.
    pub fn distance(&self) -> Float {
        self.distance
    }

    /// Returns how far `p` lies outside the hyperplane. Points inside give a
    /// negative result.
    pub fn signed_distance_to_point(&self, p: impl VectorRef) -> Float {
        self.normal.dot(p) - self.distance
    }
    /// Returns which side of the hyperplane `p` is on.
    pub fn location_of_point(&self, p: impl VectorRef) -> PointWhichSide {
        PointWhichSide::from_signed_distance(self.signed_distance_to_point(p))
    }

    /// Classifies both endpoints of the segment from `a` to `b`, and finds
    /// where the segment crosses the hyperplane if its endpoints are strictly
    /// on opposite sides.
    pub fn intersection_with_line_segment(
        &self,
        [a, b]: [impl VectorRef; 2],
    ) -> HyperplaneLineIntersection {
        let ha = self.signed_distance_to_point(&a);
        let hb = self.signed_distance_to_point(&b);
        let a_loc = PointWhichSide::from_signed_distance(ha);
        let b_loc = PointWhichSide::from_signed_distance(hb);
        let crosses = matches!(
            (a_loc, b_loc),
            (PointWhichSide::Inside, PointWhichSide::Outside)
                | (PointWhichSide::Outside, PointWhichSide::Inside)
        );
        HyperplaneLineIntersection {
            a_loc,
            b_loc,
            intersection: crosses
                .then(|| (a.to_vector() * hb - b.to_vector() * ha) / (hb - ha)),
        }
    }
}

/// Result of [`Hyperplane::intersection_with_line_segment()`].
#[derive(Debug, Clone, PartialEq)]
pub struct HyperplaneLineIntersection {
    /// Side of the first endpoint.
    pub a_loc: PointWhichSide,
    /// Side of the second endpoint.
    pub b_loc: PointWhichSide,
    /// Crossing point, present only when one endpoint is inside and the other
    /// is outside.
    pub intersection: Option<Vector>,
}

impl ApproxHashMapKey for Hyperplane {
    type Hash = VectorHash;

    fn approx_hash(&self, float_hash_fn: impl FnMut(Float) -> FloatHash) -> Self::Hash {
        let mut key = self.normal.clone();
        key.0.insert(0, self.distance);
        key.approx_hash(float_hash_fn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_approx_eq, vector};

    #[test]
    fn test_point_sides() {
        let h = Hyperplane::new(vector![0.0, 2.0], 1.0).expect("nonzero normal");
        assert_eq!(h.normal(), &vector![0.0, 1.0]);
        assert_eq!(h.location_of_point(vector![5.0, 0.0]), PointWhichSide::Inside);
        assert_eq!(h.location_of_point(vector![5.0, 1.0 + 1e-9]), PointWhichSide::On);
        assert_eq!(h.location_of_point(vector![5.0, 3.0]), PointWhichSide::Outside);
        assert_eq!(h.flip().location_of_point(vector![5.0, 3.0]), PointWhichSide::Inside);
        assert_approx_eq!(h.signed_distance_to_point(vector![0.0, -1.0]), -2.0);
        assert_eq!(Hyperplane::new(Vector::zero(3), 1.0), None);
    }

    #[test]
    fn test_segment_crossing() {
        let h = Hyperplane::through_point(vector![3.0], vector![1.0, 7.0]).expect("nonzero");
        assert_approx_eq!(h.distance(), 1.0);

        let result = h.intersection_with_line_segment([vector![0.0, 0.0], vector![4.0, 4.0]]);
        assert_eq!(result.a_loc, PointWhichSide::Inside);
        assert_eq!(result.b_loc, PointWhichSide::Outside);
        assert_approx_eq!(result.intersection.expect("segment crosses"), vector![1.0, 1.0]);

        let result = h.intersection_with_line_segment([vector![1.0, 0.0], vector![4.0, 4.0]]);
        assert_eq!(result.a_loc, PointWhichSide::On);
        assert_eq!(result.intersection, None);
    }
}
