use eyre::{Result, bail};

use super::*;

/// Description of a polytope element that is stored in a [`Space`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolytopeData {
    /// Vertex (polytope with rank 0).
    Vertex(VertexId),
    /// Polytope with rank greater than 0.
    Polytope {
        /// Rank of the polytope.
        rank: u8,
        /// Facets of the polytope.
        boundary: ElementSet,
        /// Whether the element lies on the surface of the primordial cube.
        is_primordial: bool,
    },
}
impl From<VertexId> for PolytopeData {
    fn from(value: VertexId) -> Self {
        PolytopeData::Vertex(value)
    }
}
impl PolytopeData {
    /// Returns the rank of the polytope.
    pub fn rank(&self) -> u8 {
        match self {
            PolytopeData::Vertex(_) => 0,
            PolytopeData::Polytope { rank, .. } => *rank,
        }
    }

    /// Returns the polytope as a single vertex, or `None` if the polytope is
    /// not a vertex.
    pub fn to_vertex(&self) -> Option<VertexId> {
        match self {
            PolytopeData::Vertex(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the set of boundary elements, or an error if the polytope is a
    /// vertex.
    pub fn boundary(&self) -> Result<&ElementSet> {
        match self {
            PolytopeData::Polytope { boundary, .. } => Ok(boundary),
            PolytopeData::Vertex(_) => bail!("cannot take boundary of a vertex"),
        }
    }

    /// Returns whether the element lies on the surface of the primordial cube.
    pub fn is_primordial(&self) -> bool {
        match self {
            PolytopeData::Vertex(_) => false,
            PolytopeData::Polytope { is_primordial, .. } => *is_primordial,
        }
    }
}
