use std::collections::{HashMap, hash_map};
use std::fmt;

use eyre::{OptionExt, Result, bail};
use itertools::Itertools;
use ndcube_math::prelude::*;

use super::*;

/// Euclidean space in which flat polytopes can be constructed.
///
/// Vertices are memoized by approximate position and elements are memoized by
/// rank and boundary, so constructing the same element twice returns the same
/// ID.
#[derive(Clone)]
pub struct Space {
    ndim: u8,

    vertices: PerVertex<Vector>,
    vertex_data_to_id: ApproxHashMap<Vector, VertexId>,

    polytopes: PerElement<PolytopeData>,
    polytope_data_to_id: HashMap<PolytopeData, ElementId>,

    hyperplane_of_facet: HashMap<ElementId, Hyperplane>,
}

impl fmt::Debug for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Space")
            .field("ndim", &self.ndim)
            .field("vertex_count", &self.vertices.len())
            .field("element_count", &self.polytopes.len())
            .finish_non_exhaustive()
    }
}

impl Space {
    /// Constructs a new space containing no polytopes.
    ///
    /// # Panics
    ///
    /// Panics if `ndim` is zero or exceeds [`MAX_NDIM`].
    pub fn new(ndim: u8) -> Self {
        assert!(ndim >= 1, "ndim={ndim} is below min value of 1");
        assert!(ndim <= MAX_NDIM, "ndim={ndim} exceeds max value of {MAX_NDIM}");
        Self {
            ndim,

            vertices: PerVertex::new(),
            vertex_data_to_id: ApproxHashMap::new(),

            polytopes: PerElement::new(),
            polytope_data_to_id: HashMap::new(),

            hyperplane_of_facet: HashMap::new(),
        }
    }

    /// Returns the number of dimensions of the space.
    pub fn ndim(&self) -> u8 {
        self.ndim
    }

    /// Returns the position of a vertex.
    pub fn vertex_pos(&self, v: VertexId) -> &Vector {
        &self.vertices[v]
    }
    /// Returns the data for an element.
    pub fn element(&self, e: ElementId) -> &PolytopeData {
        &self.polytopes[e]
    }
    /// Returns the rank of an element.
    pub fn rank(&self, e: ElementId) -> u8 {
        self.polytopes[e].rank()
    }
    /// Returns the boundary of an element, sorted by ID. Vertices have an
    /// empty boundary.
    pub fn boundary(&self, e: ElementId) -> Vec<ElementId> {
        match &self.polytopes[e] {
            PolytopeData::Vertex(_) => vec![],
            PolytopeData::Polytope { boundary, .. } => boundary.iter().sorted().collect(),
        }
    }

    /// Memoizes a vertex.
    pub fn add_vertex(&mut self, v: Vector) -> Result<VertexId, IndexOverflow> {
        let v = v.pad(self.ndim);
        if let Some(&id) = self.vertex_data_to_id.get(&v) {
            return Ok(id);
        }
        let vertex_id = self.vertices.push(v.clone())?;
        self.vertex_data_to_id.insert(&v, vertex_id);
        // Ensure that the vertex has an element ID as well.
        self.add_polytope(vertex_id.into())?;
        Ok(vertex_id)
    }
    /// Returns the element ID for a vertex.
    pub fn vertex_element(&mut self, v: VertexId) -> Result<ElementId, IndexOverflow> {
        self.add_polytope(v.into())
    }

    /// Memoizes a polytope element.
    pub fn add_polytope(&mut self, p: PolytopeData) -> Result<ElementId, IndexOverflow> {
        #[cfg(debug_assertions)]
        self.validate_boundary(&p);

        match self.polytope_data_to_id.entry(p) {
            hash_map::Entry::Occupied(e) => Ok(*e.get()),
            hash_map::Entry::Vacant(e) => {
                let id = self.polytopes.push(e.key().clone())?;
                Ok(*e.insert(id))
            }
        }
    }
    #[cfg(debug_assertions)]
    fn validate_boundary(&self, p: &PolytopeData) {
        let PolytopeData::Polytope { rank, boundary, .. } = p else {
            return;
        };
        for b in boundary.iter() {
            assert_eq!(self.rank(b) + 1, *rank, "bad boundary ranks of polytope");
        }
        if *rank == 1 {
            assert_eq!(boundary.len(), 2, "line must have two endpoints");
        }
        if *rank == 2 {
            let mut multiplicity = HashMap::<VertexId, usize>::new();
            for b in boundary.iter() {
                for v in self.line_endpoints(b).into_iter().flatten() {
                    *multiplicity.entry(v).or_default() += 1;
                }
            }
            for &m in multiplicity.values() {
                assert_eq!(m, 2, "bad polygon structure");
            }
        }
    }

    /// Memoizes a polytope element, unless it has too few facets to enclose
    /// any volume.
    pub(crate) fn add_polytope_if_non_degenerate(
        &mut self,
        p: PolytopeData,
    ) -> Result<Option<ElementId>, IndexOverflow> {
        if let PolytopeData::Polytope { rank, boundary, .. } = &p {
            if boundary.len() <= *rank as usize {
                return Ok(None);
            }
        }
        self.add_polytope(p).map(Some)
    }
    /// Memoizes a piece of `original` with a new boundary, carrying over the
    /// primordial flag and the facet hyperplane.
    pub(crate) fn add_subpolytope_if_non_degenerate(
        &mut self,
        original: ElementId,
        new_boundary: ElementSet,
    ) -> Result<Option<ElementId>> {
        let p = match &self.polytopes[original] {
            PolytopeData::Vertex(_) => bail!("expected polytope; got vertex"),
            PolytopeData::Polytope {
                rank,
                boundary: _,
                is_primordial,
            } => PolytopeData::Polytope {
                rank: *rank,
                boundary: new_boundary,
                is_primordial: *is_primordial,
            },
        };
        let new_id = self.add_polytope_if_non_degenerate(p)?;
        if let Some(new) = new_id {
            if let Some(plane) = self.hyperplane_of_facet.get(&original).cloned() {
                self.hyperplane_of_facet.entry(new).or_insert(plane);
            }
        }
        Ok(new_id)
    }

    /// Returns the endpoints of a line, or `None` if `line` is not a line.
    pub fn line_endpoints(&self, line: ElementId) -> Option<[VertexId; 2]> {
        let mut points = self.polytopes[line]
            .boundary()
            .ok()?
            .iter()
            .sorted()
            .map(|p| self.polytopes[p].to_vertex());
        Some([points.next()??, points.next()??])
    }

    /// Returns the set of vertices of an element, sorted by ID.
    pub fn vertex_set(&self, element: ElementId) -> Vec<VertexId> {
        self.subelements_with_rank(element, 0)
            .into_iter()
            .filter_map(|e| self.polytopes[e].to_vertex())
            .sorted()
            .collect()
    }
    /// Returns the positions of the vertices of an element.
    pub fn vertex_positions(&self, element: ElementId) -> Vec<Vector> {
        self.vertex_set(element)
            .into_iter()
            .map(|v| self.vertices[v].clone())
            .collect()
    }
    /// Returns the average of the vertices of an element.
    pub fn vertex_centroid(&self, element: ElementId) -> Vector {
        ndcube_math::util::centroid(self.vertex_positions(element)).unwrap_or_default()
    }

    /// Returns the set of all subelements of `root` with rank `rank`, sorted
    /// by ID. If `rank` is equal to the rank of `root`, returns `[root]`.
    pub fn subelements_with_rank(&self, root: ElementId, rank: u8) -> Vec<ElementId> {
        if rank > self.rank(root) {
            return vec![];
        }
        let mut ret = ElementSet::new();
        ret.insert(root);
        for _ in rank..self.rank(root) {
            ret = ret
                .iter()
                .filter_map(|p| self.polytopes[p].boundary().ok())
                .flat_map(|b| b.iter())
                .collect();
        }
        ret.iter().sorted().collect()
    }

    /// Records the hyperplane in which a facet lives.
    pub(crate) fn set_hyperplane_of_facet(&mut self, facet: ElementId, plane: Hyperplane) {
        self.hyperplane_of_facet.insert(facet, plane);
    }
    /// Returns the hyperplane in which a facet lives, if it was created by a
    /// cut or derived from a facet created by a cut.
    pub fn hyperplane_of_facet(&self, facet: ElementId) -> Result<&Hyperplane> {
        let expected_rank = self.ndim - 1;
        let actual_rank = self.rank(facet);
        if expected_rank != actual_rank {
            bail!("expected polytope with rank {expected_rank}; got {actual_rank}");
        }
        self.hyperplane_of_facet
            .get(&facet)
            .ok_or_eyre("facet has no known hyperplane")
    }

    /// Adds a primordial cube to the space, with vertices at `±size` along
    /// each axis. Every facet of the cube is flagged as primordial.
    pub fn add_primordial_cube(&mut self, size: Float) -> Result<ElementId> {
        let ndim = self.ndim;
        // Construct a 3^d array of polytope elements. Along each axis X, the
        // elements at X=0 and X=1 are on the boundary of X=2.
        let mut elements = Vec::<ElementId>::with_capacity(3_usize.pow(ndim as _));
        let mut position = vec![0_u8; ndim as usize];
        'outer: loop {
            let element_rank = position.iter().filter(|&&x| x == 2).count() as u8;
            let polytope_data = if element_rank == 0 {
                self.add_vertex(
                    position
                        .iter()
                        .map(|&x| size * (x as Float * 2.0 - 1.0))
                        .collect(),
                )?
                .into()
            } else {
                let stride = |i| 3_usize.pow(i as _);
                let base: usize = position
                    .iter()
                    .enumerate()
                    .map(|(i, &x)| stride(i) * x as usize)
                    .sum();
                let boundary = position
                    .iter()
                    .positions(|&x| x == 2)
                    .flat_map(|i| [base - stride(i), base - stride(i) * 2])
                    .map(|i| elements[i])
                    .collect();
                PolytopeData::Polytope {
                    rank: element_rank,
                    boundary,
                    is_primordial: element_rank == ndim - 1,
                }
            };

            let new_id = self.add_polytope(polytope_data)?;
            if element_rank == ndim {
                return Ok(new_id);
            }
            elements.push(new_id);

            // Move to the next element position.
            for component in &mut position {
                *component += 1;
                if *component > 2 {
                    *component = 0;
                } else {
                    continue 'outer;
                }
            }
            bail!("primordial cube construction did not reach the whole cube");
        }
    }

    /// Returns `root` and every element in its transitive boundary, grouped
    /// by rank.
    ///
    /// Within each rank, elements are listed in the order that a depth-first
    /// walk from `root` first reaches them, visiting each boundary in order
    /// of ID.
    pub fn elements_in_discovery_order(&self, root: ElementId) -> Vec<Vec<ElementId>> {
        let mut ret = vec![vec![]; self.rank(root) as usize + 1];
        let mut seen = ElementSet::new();
        let mut stack = vec![root];
        while let Some(e) = stack.pop() {
            if seen.insert(e) {
                ret[self.rank(e) as usize].push(e);
                stack.extend(self.boundary(e).into_iter().rev());
            }
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primordial_square() {
        let mut space = Space::new(2);
        let root = space.add_primordial_cube(10.0).expect("cube");
        assert_eq!(space.rank(root), 2);
        assert_eq!(space.subelements_with_rank(root, 1).len(), 4);
        assert_eq!(space.vertex_set(root).len(), 4);
        assert_eq!(space.subelements_with_rank(root, 3), vec![]);
        assert_eq!(space.subelements_with_rank(root, 2), vec![root]);
        for edge in space.subelements_with_rank(root, 1) {
            assert!(space.element(edge).is_primordial());
        }
    }

    #[test]
    fn test_primordial_tesseract_counts() {
        let mut space = Space::new(4);
        let root = space.add_primordial_cube(1.0).expect("cube");
        let counts = (0..=4)
            .map(|rank| space.subelements_with_rank(root, rank).len())
            .collect_vec();
        assert_eq!(counts, vec![16, 32, 24, 8, 1]);
    }

    #[test]
    fn test_discovery_order() {
        let mut space = Space::new(3);
        let root = space.add_primordial_cube(1.0).expect("cube");
        let found = space.elements_in_discovery_order(root);
        assert_eq!(found.iter().map(Vec::len).collect_vec(), vec![8, 12, 6, 1]);
        assert_eq!(found[3], vec![root]);
        assert_eq!(found[2], space.boundary(root));

        // The first face is walked completely before the second one.
        let first_face = found[2][0];
        assert_eq!(found[1][..4], space.boundary(first_face)[..]);
        let first_edge = found[1][0];
        assert_eq!(found[0][..2], space.boundary(first_edge)[..]);
        let first_face_vertices = space.subelements_with_rank(first_face, 0);
        assert!(found[0][..4].iter().all(|v| first_face_vertices.contains(v)));
    }

    #[test]
    fn test_vertex_memoization() {
        let mut space = Space::new(3);
        let a = space.add_vertex(vector![1.0, 2.0]).expect("vertex");
        let b = space.add_vertex(vector![1.0, 2.0 + EPSILON / 10.0, 0.0]).expect("vertex");
        assert_eq!(a, b);
        assert_eq!(space.vertex_pos(a), &vector![1.0, 2.0, 0.0]);
        let c = space.add_vertex(vector![1.0, 2.5]).expect("vertex");
        assert_ne!(a, c);
    }
}
