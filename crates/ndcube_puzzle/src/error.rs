use ndcube_math::Float;
use ndcube_math::collections::{FuzzyError, IndexOverflow};
use ndcube_shape::{SchlafliError, ShapeError};

use crate::{Face, Grip};

/// Error encountered while parsing a puzzle prescription.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum PrescriptionError {
    #[error("expected \"<schlafli product> <length>\", got {0:?}")]
    Malformed(String),
    #[error("invalid length {0:?}")]
    BadLength(String),
    #[error("length must be at least 1, got {0}")]
    IntLengthTooSmall(i64),
    #[error("length must be positive, got {0}")]
    NonPositiveLength(Float),
    #[error(transparent)]
    Schlafli(#[from] SchlafliError),
}

/// Error encountered while building a puzzle.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
pub enum BuildError {
    #[error(transparent)]
    Prescription(#[from] PrescriptionError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    IndexOverflow(#[from] IndexOverflow),
    #[error("puzzles must have 3 or 4 dimensions, but {schlafli} has {ndim}")]
    UnsupportedDimension { schlafli: String, ndim: u8 },
    #[error("cuts of face {face} and its opposite face {opposite} disagree: {reason}")]
    InconsistentCuts {
        face: Face,
        opposite: Face,
        reason: String,
    },
    #[error("fuzzy point lookup failed: {0}")]
    Fuzzy(#[from] FuzzyError),
    #[error("two stickers share the center {0}")]
    DuplicateStickerCenter(ndcube_math::Vector),
    #[error("inconsistent puzzle geometry: {0}")]
    Geometry(String),
}
impl From<eyre::Report> for BuildError {
    fn from(value: eyre::Report) -> Self {
        BuildError::Shape(ShapeError::from(value))
    }
}

/// Error encountered while twisting a puzzle.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum TwistError {
    #[error("grip {grip} is out of range; there are only {count} grips")]
    BadGrip { grip: i64, count: usize },
    #[error("grip {0} has no rotational symmetry and cannot be twisted")]
    ZeroOrder(Grip),
    #[error("state has {actual} entries, but the puzzle has {expected} stickers")]
    WrongStateLength { expected: usize, actual: usize },
    #[error("puzzle has no grips that can be used for scrambling")]
    NothingToScramble,
}
