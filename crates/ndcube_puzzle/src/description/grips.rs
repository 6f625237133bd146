//! Grips: the axes around which the puzzle can be twisted.

use std::f64::consts::TAU;

use ndcube_math::collections::ApproxHashMap;
use ndcube_math::prelude::*;
use ndcube_shape::{ElementId, Polytope, Space};
use rayon::prelude::*;

use super::{BuildOptions, FaceInfo, GripInfo};
use crate::progress::Progress;
use crate::*;

/// Fraction of the way from the element center to the face center to place
/// each grip, so that grips of adjacent faces never coincide.
const GRIP_NUDGE: Float = 0.01;

/// Computes a grip for every element of every face. Grips are numbered by
/// face, then by rank, then in the order that a depth-first walk of the
/// face's boundary first reaches each element. Returns `None` if
/// construction was cancelled.
pub(super) fn compute_grips(
    polytope: &Polytope,
    faces: &PerFace<FaceInfo>,
    options: &BuildOptions,
    progress: &mut impl Progress,
) -> Result<Option<PerGrip<GripInfo>>, BuildError> {
    let space = polytope.space();
    let ndim = polytope.ndim();

    let vertices = polytope.vertex_positions();
    let mut vertex_set = ApproxHashMap::new();
    for v in &vertices {
        vertex_set.insert(v, ());
    }
    let symmetry_check = SymmetryCheck {
        vertices: &vertices,
        vertex_set: &vertex_set,
    };

    let mut work = vec![];
    for (face, info) in faces.iter() {
        let facet = polytope.facets().get(face.to_usize()).copied().ok_or_else(|| {
            BuildError::Geometry(format!("face {face} has no facet in the polytope"))
        })?;
        let by_rank = space.elements_in_discovery_order(facet);
        let face_vertex_count = by_rank.first().map_or(0, Vec::len);
        let elements = (0..ndim)
            .zip(by_rank)
            .flat_map(|(rank, elements)| elements.into_iter().map(move |e| (e, rank)))
            .collect::<Vec<_>>();
        work.push((face, info, face_vertex_count, elements));
    }
    let total = work.iter().map(|(.., elements)| elements.len()).sum();

    if !progress.subtask_init("Calculating possible twists", Some(total)) {
        return Ok(None);
    }

    let compute_face_grips = |&(face, info, face_vertex_count, ref elements): &(
        Face,
        &FaceInfo,
        usize,
        Vec<(ElementId, u8)>,
    )| {
        elements
            .iter()
            .map(|&(element, rank)| {
                compute_grip(space, face, info, element, rank, face_vertex_count, symmetry_check)
            })
            .collect::<Vec<_>>()
    };

    let mut grips = PerGrip::new();
    if options.parallel_grips {
        let per_face = work.par_iter().map(compute_face_grips).collect::<Vec<_>>();
        for grip in per_face.into_iter().flatten() {
            grips.push(grip)?;
        }
        if !progress.update_progress(total) {
            return Ok(None);
        }
    } else {
        for item in &work {
            for grip in compute_face_grips(item) {
                grips.push(grip)?;
                if !progress.update_progress(grips.len()) {
                    return Ok(None);
                }
            }
        }
    }

    log::debug!(
        "{} grips, {} of which can be twisted",
        grips.len(),
        grips.iter_values().filter(|g| g.order > 1).count(),
    );
    if !progress.subtask_done() {
        return Ok(None);
    }
    Ok(Some(grips))
}

fn compute_grip(
    space: &Space,
    face: Face,
    info: &FaceInfo,
    element: ElementId,
    rank: u8,
    face_vertex_count: usize,
    symmetry_check: SymmetryCheck<'_>,
) -> GripInfo {
    let ndim = space.ndim();
    let element_center = space.vertex_centroid(element);

    let fixed = gram_schmidt([info.normal.clone(), &element_center - &info.center]);
    let fixed_count = fixed.len();
    let mut basis = complete_orthonormal_basis(fixed, ndim);
    if Matrix::from_rows(&basis).determinant() < 0.0
        && let Some(last) = basis.last_mut()
    {
        *last = -&*last;
    }
    let useful_matrix = Matrix::from_rows(&basis);

    let order = if fixed_count + 2 == ndim as usize && basis.len() == ndim as usize {
        symmetry_check.rotational_order(&useful_matrix, face_vertex_count)
    } else {
        0
    };

    GripInfo {
        face,
        dim: rank,
        order,
        center: ndcube_math::util::lerp(&element_center, &info.center, GRIP_NUDGE),
        useful_matrix,
    }
}

/// Vertices of the original polytope, for testing whether a rotation is a
/// symmetry.
#[derive(Debug, Copy, Clone)]
struct SymmetryCheck<'a> {
    vertices: &'a [Vector],
    vertex_set: &'a ApproxHashMap<Vector, ()>,
}
impl SymmetryCheck<'_> {
    /// Returns whether `transform` maps every vertex onto a vertex.
    fn is_symmetry(&self, transform: &Matrix) -> bool {
        self.vertices
            .iter()
            .all(|v| self.vertex_set.contains_key(&(transform * v)))
    }

    /// Returns the largest `k` such that rotating by `2pi/k` in the plane of
    /// the last two rows of `useful_matrix` is a symmetry, or 1 if there is
    /// none.
    fn rotational_order(&self, useful_matrix: &Matrix, max_order: usize) -> u32 {
        let ndim = useful_matrix.ndim();
        (2..=max_order as u32)
            .rev()
            .find(|&k| {
                let angle = TAU / k as Float;
                let rotation = Matrix::from_rotation_in_plane(ndim, ndim - 2, ndim - 1, angle);
                self.is_symmetry(&(useful_matrix.transpose() * rotation * useful_matrix))
            })
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grips_of(schlafli: &str, parallel_grips: bool) -> PerGrip<GripInfo> {
        let polytope = Polytope::from_schlafli_product(&schlafli.parse().unwrap()).unwrap();
        let original = ndcube_shape::ElementTable::new(polytope.space(), &[polytope.root()]);
        let faces = super::super::cuts::compute_faces(&polytope, &original).unwrap();
        let options = BuildOptions { parallel_grips };
        compute_grips(&polytope, &faces, &options, &mut ())
            .unwrap()
            .unwrap()
    }

    fn order_histogram(grips: &PerGrip<GripInfo>) -> Vec<(u8, u32, usize)> {
        let mut ret = std::collections::BTreeMap::new();
        for g in grips.iter_values() {
            *ret.entry((g.dim, g.order)).or_insert(0) += 1;
        }
        ret.into_iter().map(|((d, o), n)| (d, o, n)).collect()
    }

    #[test]
    fn test_hypercube_grips() {
        let grips = grips_of("{4,3,3}", true);
        // Per cell: 8 vertices, 12 edges, 6 faces, 1 center
        assert_eq!(grips.len(), 8 * 27);
        assert_eq!(
            order_histogram(&grips),
            [(0, 3, 64), (1, 2, 96), (2, 4, 48), (3, 0, 8)],
        );

        for g in grips.iter_values() {
            ndcube_math::assert_approx_eq!(g.useful_matrix.determinant(), 1.0);
        }
    }

    #[test]
    fn test_grip_numbering() {
        let grips = grips_of("{4,3,3}", false);
        let dims = grips.iter_values().map(|g| g.dim).collect::<Vec<_>>();
        for (face, chunk) in dims.chunks(27).enumerate() {
            let expected = [vec![0; 8], vec![1; 12], vec![2; 6], vec![3]].concat();
            assert_eq!(chunk, &expected[..], "face {face}");
        }
        for (face, chunk) in grips.chunks(27).enumerate() {
            assert!(chunk.iter().all(|g| g.face == Face(face as u16)));
            // The first two vertices bound the first edge, which is reached
            // right after them.
            let distance = |a: usize, b: usize| (&chunk[a].center - &chunk[b].center).mag();
            ndcube_math::assert_approx_eq!(distance(0, 1), 2.0 * (1.0 - GRIP_NUDGE));
            ndcube_math::assert_approx_eq!(distance(0, 8), 1.0 - GRIP_NUDGE);
            ndcube_math::assert_approx_eq!(distance(1, 8), 1.0 - GRIP_NUDGE);
        }
    }

    #[test]
    fn test_parallel_grips_match_sequential() {
        assert_eq!(grips_of("{5}x{4}", true), grips_of("{5}x{4}", false));
    }

    #[test]
    fn test_cube_grips() {
        let grips = grips_of("{4,3}", false);
        assert_eq!(
            order_histogram(&grips),
            [(0, 0, 24), (1, 0, 24), (2, 4, 6)],
        );
    }

    #[test]
    fn test_duoprism_grips() {
        // Pentagonal prism cells only have 2-fold symmetry through their
        // square faces, and 5-fold through their pentagons.
        let grips = grips_of("{5}x{4}", false);
        let max_order = grips.iter_values().map(|g| g.order).max().unwrap();
        assert_eq!(max_order, 5);
        assert!(grips.iter_values().all(|g| g.order <= 5));
    }

    #[test]
    fn test_grip_centers_are_nudged() {
        let grips = grips_of("{4,3,3}", false);
        for g in grips.iter_values().filter(|g| g.dim == 0) {
            // Vertex (1, 1, 1, 1) nudged toward a cell center such as (1, 0, 0, 0).
            let sorted = g.center.iter().map(|x| x.abs()).collect::<Vec<_>>();
            assert!(sorted.iter().filter(|&&x| (x - 1.0).abs() < 1e-9).count() == 1);
            assert!(sorted.iter().filter(|&&x| (x - 0.99).abs() < 1e-9).count() == 3);
        }
    }
}
