//! Convex polytope construction and slicing.
//!
//! Polytopes live in a [`Space`], which memoizes every vertex and every
//! element so that elements shared between polytopes (such as the ridge
//! between two facets) have a single ID. Polytopes are built by carving a
//! large cube with hyperplanes and are refined by slicing.

use ndcube_math::collections::GenericVec;
use tinyset::Set64;

mod cut;
mod cut_output;
mod element_table;
mod error;
mod fingerprint;
mod polytope;
mod polytope_data;
mod regular;
mod schlafli;
mod space;

pub use cut::{Cut, CutParams, PolytopeFate};
pub use cut_output::ElementCutOutput;
pub use element_table::ElementTable;
pub use error::{SchlafliError, ShapeError};
pub use fingerprint::{element_type_summaries, polytope_fingerprint};
pub use polytope::Polytope;
pub use polytope_data::PolytopeData;
pub use regular::{
    FacetPlanes, facet_planes_of_factor, facet_planes_of_product,
    facet_planes_of_regular_polytope, facet_planes_of_wythoff, mirrors,
};
pub use schlafli::{SchlafliFactor, SchlafliIndex, SchlafliProduct, ShapeFactor, WythoffDiagram};
pub use space::Space;

/// Result type for shape operations.
pub type ShapeResult<T> = Result<T, ShapeError>;

/// Set of elements in a [`Space`].
pub type ElementSet = Set64<ElementId>;
/// Set of vertices in a [`Space`].
pub type VertexSet = Set64<VertexId>;

ndcube_math::idx_struct! {
    /// ID for a memoized vertex in a [`Space`].
    pub struct VertexId(pub u32);
    /// ID for a memoized polytope element in a [`Space`].
    pub struct ElementId(pub u32);
}

/// List containing a value per vertex.
pub type PerVertex<T> = GenericVec<VertexId, T>;
/// List containing a value per element.
pub type PerElement<T> = GenericVec<ElementId, T>;
