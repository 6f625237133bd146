//! Vector, matrix, and hyperplane primitives for 3D and 4D puzzle geometry.

pub use {approx, num_traits as num, smallvec};

/// Floating-point type used for geometry.
pub type Float = f64;

/// Small floating-point value used for comparisons and tiny offsets.
pub const EPSILON: Float = 0.000001;

/// Maximum number of dimensions supported by puzzles.
pub const MAX_NDIM: u8 = 4;

/// Asserts that both arguments are approximately equal.
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr $(,)?) => {
        $crate::approx::assert_abs_diff_eq!($a, $b, epsilon = $crate::EPSILON)
    };
}

#[macro_use]
mod vector;
#[macro_use]
pub mod collections;

pub mod approx_cmp;
pub mod hyperplane;
pub mod matrix;
pub mod util;

pub use hyperplane::PointWhichSide;

/// Structs, traits, and constants (excluding [`crate::collections`]).
pub mod prelude {
    pub use crate::approx_cmp::*;
    pub use crate::collections::{
        ApproxHashMap, ApproxHashMapKey, FuzzyPointTable, FuzzyTolerance, IndexOutOfRange,
        IndexOverflow,
    };
    pub use crate::hyperplane::*;
    pub use crate::matrix::*;
    pub use crate::traits::*;
    pub use crate::vector::*;
    pub use crate::{EPSILON, Float, MAX_NDIM, vector};
}
pub use prelude::*;

/// Traits only.
pub mod traits {
    pub use approx::AbsDiffEq;
    pub use tinyset::Fits64;

    pub use crate::collections::{ApproxHashMapKey, IndexNewtype};
    pub use crate::vector::VectorRef;
}
