//! Point averaging and interpolation.

use crate::{Float, Vector, VectorRef};

/// Returns the point a fraction `t` of the way from `a` to `b`.
pub fn lerp(a: impl VectorRef, b: impl VectorRef, t: Float) -> Vector {
    a.to_vector() * (1.0 - t) + b.to_vector() * t
}

/// Returns the average of some points, or `None` if there are none.
pub fn centroid<V: VectorRef>(points: impl IntoIterator<Item = V>) -> Option<Vector> {
    let (sum, count) = points
        .into_iter()
        .fold((Vector::EMPTY, 0_usize), |(sum, count), p| (sum + p, count + 1));
    (count > 0).then(|| sum / count as Float)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector;

    #[test]
    fn test_centroid() {
        assert_eq!(centroid::<Vector>([]), None);
        assert_eq!(
            centroid([vector![1.0, 0.0], vector![3.0, 2.0, 4.0]]),
            Some(vector![2.0, 1.0, 2.0]),
        );
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(vector![0.0, 2.0], vector![4.0], 0.25), vector![1.0, 1.5]);
    }
}
