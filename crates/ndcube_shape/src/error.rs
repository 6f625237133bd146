use ndcube_math::collections::IndexOverflow;

/// Error encountered while parsing a Schläfli product.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum SchlafliError {
    #[error("empty Schläfli product")]
    Empty,
    #[error("expected '{{' or '(' at {0:?}")]
    ExpectedFactor(String),
    #[error("missing '}}' in {0:?}")]
    UnclosedBrace(String),
    #[error("missing ')' in {0:?}")]
    UnclosedParen(String),
    #[error("invalid index {0:?} in Schläfli symbol; expected p or p/q with p > 2q")]
    BadIndex(String),
    #[error("invalid node {0:?} in Wythoff diagram; expected a non-negative number")]
    BadNodeValue(String),
    #[error("invalid link {0:?} in Wythoff diagram; expected an integer of at least 2 between nodes")]
    BadLink(String),
    #[error("{0:?} is flat; every connected part of a Wythoff diagram needs a nonzero node")]
    FlatDiagram(String),
    #[error("unsupported shape notation {0:?}")]
    Unsupported(String),
    #[error("unexpected {0:?} after Schläfli symbol; factors must be joined by 'x' or 'v'")]
    TrailingInput(String),
}

/// Error encountered while constructing or slicing a polytope.
#[derive(thiserror::Error, Debug)]
pub enum ShapeError {
    /// Malformed Schläfli product.
    #[error(transparent)]
    Schlafli(#[from] SchlafliError),
    /// Too many vertices or elements.
    #[error(transparent)]
    IndexOverflow(#[from] IndexOverflow),
    /// The symmetry group of a Schläfli symbol is not finite.
    #[error("{0} does not describe a finite polytope")]
    NotFinite(String),
    /// A facet hyperplane passes through the center of the shape.
    #[error("{0} has a facet through its center")]
    Degenerate(String),
    /// The polytope has too many dimensions.
    #[error("{symbol} has {ndim} dimensions; at most {max} are supported")]
    TooManyDimensions {
        /// Schläfli product.
        symbol: String,
        /// Number of dimensions.
        ndim: u8,
        /// Maximum number of dimensions.
        max: u8,
    },
    /// Construction produced an inconsistent polytope.
    #[error("geometry error: {0:#}")]
    Geometry(eyre::Report),
}
impl From<eyre::Report> for ShapeError {
    fn from(value: eyre::Report) -> Self {
        ShapeError::Geometry(value)
    }
}
