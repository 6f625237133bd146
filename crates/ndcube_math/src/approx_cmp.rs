//! Comparisons that treat values within [`EPSILON`] of each other as equal.

pub use approx::AbsDiffEq;
use num_traits::Zero;

use crate::{EPSILON, Float};

/// Returns whether `a` and `b` are within [`EPSILON`] of each other. Equal
/// infinities count as equal.
pub fn approx_eq<T: AbsDiffEq<Epsilon = Float>>(a: &T, b: &T) -> bool {
    a == b || a.abs_diff_eq(b, EPSILON)
}

/// Orders `a` and `b`, treating them as equal if [`approx_eq()`] holds.
pub fn approx_cmp<T: AbsDiffEq<Epsilon = Float> + PartialOrd>(a: &T, b: &T) -> std::cmp::Ordering {
    use std::cmp::Ordering::*;

    match (approx_eq(a, b), a < b) {
        (true, _) => Equal,
        (false, true) => Less,
        (false, false) => Greater,
    }
}

/// Returns whether `x` is farther than [`EPSILON`] from zero.
pub fn is_approx_nonzero<T: AbsDiffEq<Epsilon = Float> + Zero>(x: &T) -> bool {
    !approx_eq(x, &T::zero())
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    #[test]
    fn test_tolerant_ordering() {
        assert!(approx_eq(&1.0, &(1.0 + EPSILON / 2.0)));
        assert!(approx_eq(&Float::INFINITY, &Float::INFINITY));
        assert_eq!(approx_cmp(&1.0, &(1.0 + EPSILON / 2.0)), Ordering::Equal);
        assert_eq!(approx_cmp(&1.0, &1.1), Ordering::Less);
        assert_eq!(approx_cmp(&0.0, &-0.5), Ordering::Greater);
        assert!(!is_approx_nonzero(&(EPSILON / 2.0)));
        assert!(is_approx_nonzero(&-0.5));
    }
}
