//! Twisty puzzle generator and twist engine for 3D and 4D polytope puzzles.
//!
//! A puzzle is described by a [`Prescription`] such as `{4,3,3} 3`: a
//! Schläfli product naming the shape and an edge length naming how many
//! slices each face is cut into. [`PuzzleDescription`] slices the polytope
//! into stickers, groups them into cubies, and finds every grip that can be
//! twisted. [`PuzzleState`] tracks which color occupies each sticker.

#[macro_use]
extern crate lazy_static;

mod description;
mod error;
mod fingerprint;
mod prescription;
mod progress;
mod state;
mod summary;
mod twist;

pub use ndcube_math;
pub use ndcube_shape;
pub use prelude::*;

/// Prelude of common imports.
pub mod prelude {
    pub use crate::description::{
        BuildOptions, BuildOutcome, FaceInfo, GripInfo, PuzzleDescription, RestVertex,
    };
    pub use crate::error::{BuildError, PrescriptionError, TwistError};
    pub use crate::fingerprint::{NOT_FINGERPRINTABLE, PuzzleFingerprint};
    pub use crate::prescription::Prescription;
    pub use crate::progress::{FnProgress, LogProgress, Progress, ProgressEvent};
    pub use crate::state::{PuzzleState, Twist, rng_from_seed};
    pub use crate::summary::PuzzleSummary;
    pub use crate::twist::{point_is_in_slice_mask, which_slice};
    pub use crate::{Cubie, Face, Grip, PerCubie, PerFace, PerGrip, PerSticker, Sticker};
}

ndcube_math::idx_struct! {
    /// ID for a face of the original polytope.
    pub struct Face(pub u16);
    /// ID for a sticker, which is a facet of the sliced polytope.
    pub struct Sticker(pub u32);
    /// ID for a cubie, which is a set of stickers that always move together.
    pub struct Cubie(pub u32);
    /// ID for a grip, which is an axis that can be twisted.
    pub struct Grip(pub u32);
}

/// List containing a value per face.
pub type PerFace<T> = ndcube_math::collections::GenericVec<Face, T>;
/// List containing a value per sticker.
pub type PerSticker<T> = ndcube_math::collections::GenericVec<Sticker, T>;
/// List containing a value per cubie.
pub type PerCubie<T> = ndcube_math::collections::GenericVec<Cubie, T>;
/// List containing a value per grip.
pub type PerGrip<T> = ndcube_math::collections::GenericVec<Grip, T>;

/// Twist direction that rotates counterclockwise.
pub const CCW: i32 = 1;
/// Twist direction that rotates clockwise.
pub const CW: i32 = -1;

/// Tolerance used when deduplicating cut offsets.
const CUT_DEDUP_EPSILON: ndcube_math::Float = 1e-6;
/// Maximum disagreement between the cuts of opposite faces before they are
/// reconciled.
const CUT_RECONCILE_EPSILON: ndcube_math::Float = 1e-3;
