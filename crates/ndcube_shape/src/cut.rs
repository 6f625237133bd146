use std::collections::HashMap;
use std::fmt;

use eyre::Result;
use ndcube_math::hyperplane::HyperplaneLineIntersection;
use ndcube_math::prelude::*;

use super::*;

/// Parameters for cutting polytopes.
#[derive(Clone)]
pub struct CutParams {
    /// Plane that divides the inside of the cut from the outside of the cut.
    pub divider: Hyperplane,
    /// What to do with the pieces on the inside of the cut.
    pub inside: PolytopeFate,
    /// What to do with the pieces on the outside of the cut.
    pub outside: PolytopeFate,
}
impl fmt::Debug for CutParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ divider: {:?}, inside: {}, outside: {} }}",
            self.divider, self.inside, self.outside,
        )
    }
}

/// What to do with a piece resulting from a cutting operation.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PolytopeFate {
    /// The piece should be removed.
    #[default]
    Remove,
    /// The piece should remain.
    Keep,
}
impl fmt::Display for PolytopeFate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolytopeFate::Remove => write!(f, "REMOVE"),
            PolytopeFate::Keep => write!(f, "KEEP"),
        }
    }
}

/// In-progress cut operation, which caches the result for every element it
/// has touched.
///
/// The cache is what lets callers find out how an element that they care about
/// (such as a ridge of the original polytope) was split, after the cut has
/// been applied to some larger element containing it.
#[derive(Debug)]
pub struct Cut {
    params: CutParams,
    output_cache: HashMap<ElementId, ElementCutOutput>,
}
impl Cut {
    /// Constructs a cutting operation that deletes everything outside the
    /// divider and keeps everything inside it.
    pub fn carve(divider: Hyperplane) -> Self {
        Self::new(CutParams {
            divider,
            inside: PolytopeFate::Keep,
            outside: PolytopeFate::Remove,
        })
    }
    /// Constructs a cutting operation that keeps both sides.
    pub fn slice(divider: Hyperplane) -> Self {
        Self::new(CutParams {
            divider,
            inside: PolytopeFate::Keep,
            outside: PolytopeFate::Keep,
        })
    }
    /// Constructs a cutting operation.
    pub fn new(params: CutParams) -> Self {
        Self {
            params,
            output_cache: HashMap::new(),
        }
    }

    /// Returns the parameters used to create the cut.
    pub fn params(&self) -> &CutParams {
        &self.params
    }

    /// Returns the cached result of cutting an element, if this cut has
    /// touched it.
    pub fn cached_output(&self, element: ElementId) -> Option<ElementCutOutput> {
        self.output_cache.get(&element).copied()
    }

    /// Cuts an element, recursively cutting its boundary.
    pub fn cut(&mut self, space: &mut Space, element: ElementId) -> Result<ElementCutOutput> {
        if let Some(&result) = self.output_cache.get(&element) {
            return Ok(result);
        }

        let result = match space.element(element).clone() {
            PolytopeData::Vertex(v) => match self.params.divider.location_of_point(space.vertex_pos(v)) {
                PointWhichSide::On => ElementCutOutput::Flush,
                PointWhichSide::Inside => ElementCutOutput::all_inside(element),
                PointWhichSide::Outside => ElementCutOutput::all_outside(element),
            },
            PolytopeData::Polytope { rank, boundary, .. } => {
                let mut inside_boundary = ElementSet::new();
                let mut outside_boundary = ElementSet::new();
                let mut flush_polytopes = vec![];
                let mut flush_polytope_boundary = ElementSet::new();

                if let Some(line @ [a, b]) = space.line_endpoints(element) {
                    let HyperplaneLineIntersection {
                        a_loc,
                        b_loc,
                        intersection,
                    } = self
                        .params
                        .divider
                        .intersection_with_line_segment(line.map(|i| space.vertex_pos(i)));
                    for (v, v_loc) in [(a, a_loc), (b, b_loc)] {
                        let v = space.vertex_element(v)?;
                        // Record endpoints too so that callers can look them up.
                        self.output_cache.entry(v).or_insert(match v_loc {
                            PointWhichSide::On => ElementCutOutput::Flush,
                            PointWhichSide::Inside => ElementCutOutput::all_inside(v),
                            PointWhichSide::Outside => ElementCutOutput::all_outside(v),
                        });
                        match v_loc {
                            PointWhichSide::On => flush_polytopes.push(v),
                            PointWhichSide::Inside => {
                                inside_boundary.insert(v);
                            }
                            PointWhichSide::Outside => {
                                outside_boundary.insert(v);
                            }
                        }
                    }
                    if flush_polytopes.is_empty() {
                        if let Some(intersection_point) = intersection {
                            let v = space.add_vertex(intersection_point)?;
                            flush_polytopes.push(space.vertex_element(v)?);
                        }
                    }
                } else {
                    for b in boundary.iter() {
                        match self.cut(space, b)? {
                            ElementCutOutput::Flush => flush_polytopes.push(b),
                            ElementCutOutput::NonFlush {
                                inside,
                                outside,
                                intersection,
                            } => {
                                inside_boundary.extend(inside);
                                outside_boundary.extend(outside);
                                flush_polytope_boundary.extend(intersection);
                            }
                        }
                    }
                }

                if flush_polytopes.len() > 1 {
                    ElementCutOutput::Flush
                } else {
                    let intersection = match flush_polytopes.first() {
                        Some(&p) => Some(p),
                        None => {
                            let new_id =
                                space.add_polytope_if_non_degenerate(PolytopeData::Polytope {
                                    rank: rank - 1,
                                    boundary: flush_polytope_boundary,
                                    is_primordial: false,
                                })?;
                            if let Some(new) = new_id {
                                if rank == space.ndim() {
                                    // New facet; remember its hyperplane.
                                    space.set_hyperplane_of_facet(new, self.params.divider.clone());
                                }
                            }
                            new_id
                        }
                    };

                    let inside = match self.params.inside {
                        PolytopeFate::Keep => {
                            inside_boundary.extend(intersection);
                            space.add_subpolytope_if_non_degenerate(element, inside_boundary)?
                        }
                        PolytopeFate::Remove => None,
                    };
                    let outside = match self.params.outside {
                        PolytopeFate::Keep => {
                            outside_boundary.extend(intersection);
                            space.add_subpolytope_if_non_degenerate(element, outside_boundary)?
                        }
                        PolytopeFate::Remove => None,
                    };

                    ElementCutOutput::NonFlush {
                        inside,
                        outside,
                        intersection,
                    }
                }
            }
        };

        self.output_cache.insert(element, result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(normal: Vector, distance: Float) -> Hyperplane {
        Hyperplane::new(normal, distance).expect("nonzero normal")
    }

    #[test]
    fn test_carve_square_into_triangle() {
        let mut space = Space::new(2);
        let square = space.add_primordial_cube(1.0).expect("cube");
        let mut cut = Cut::carve(plane(vector![1.0, 1.0], 0.0));
        let out = cut.cut(&mut space, square).expect("cut");
        let triangle = out.inside().expect("inside piece");
        assert_eq!(out.outside(), None);
        assert_eq!(space.vertex_set(triangle).len(), 3);
        assert_eq!(space.subelements_with_rank(triangle, 1).len(), 3);
    }

    #[test]
    fn test_slice_cube_keeps_both_halves() {
        let mut space = Space::new(3);
        let cube = space.add_primordial_cube(1.0).expect("cube");
        let divider = plane(vector![0.0, 0.0, 1.0], 0.25);
        let mut cut = Cut::slice(divider.clone());
        let out = cut.cut(&mut space, cube).expect("cut");
        let (Some(inside), Some(outside)) = (out.inside(), out.outside()) else {
            panic!("expected two pieces; got {out}");
        };
        assert_eq!(space.subelements_with_rank(inside, 2).len(), 6);
        assert_eq!(space.subelements_with_rank(outside, 2).len(), 6);

        let ElementCutOutput::NonFlush {
            intersection: Some(facet),
            ..
        } = out
        else {
            panic!("expected intersection");
        };
        assert_eq!(space.hyperplane_of_facet(facet).expect("plane"), &divider);

        // Every original face was touched by the cut.
        for face in space.subelements_with_rank(cube, 2) {
            assert!(cut.cached_output(face).is_some());
        }
    }

    #[test]
    fn test_cut_along_existing_face_is_flush() {
        let mut space = Space::new(3);
        let cube = space.add_primordial_cube(1.0).expect("cube");
        let mut cut = Cut::slice(plane(vector![1.0, 0.0, 0.0], 1.0));
        let out = cut.cut(&mut space, cube).expect("cut");
        // The cube is entirely inside; the +X face is the intersection.
        assert_eq!(out.inside(), Some(cube));
        assert_eq!(out.outside(), None);
    }
}
