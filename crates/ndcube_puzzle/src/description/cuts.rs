//! Faces of the original polytope and the cut planes parallel to them.

use ndcube_math::collections::{FuzzyPointTable, FuzzyTolerance};
use ndcube_math::prelude::*;
use ndcube_shape::{ElementTable, Polytope};

use super::FaceInfo;
use crate::*;

/// Minimum thickness of a slice.
const MIN_THICKNESS: Float = 1e-6;

/// Computes the inward normal, offset, center, and opposite of each face.
/// Cuts are left empty.
pub(super) fn compute_faces(
    polytope: &Polytope,
    original: &ElementTable,
) -> Result<PerFace<FaceInfo>, BuildError> {
    let space = polytope.space();
    let mut faces = PerFace::new();
    let mut face_normals = FuzzyPointTable::new(polytope.ndim(), FuzzyTolerance::default());
    for (&facet, plane) in std::iter::zip(polytope.facets(), polytope.facet_planes()) {
        if original.index_of(facet).is_none() {
            return Err(BuildError::Geometry(format!(
                "facet {facet} is missing from the element table",
            )));
        }
        // Face normals point inward.
        let inward = plane.flip();
        let face = faces.push(FaceInfo {
            normal: inward.normal().clone(),
            offset: inward.distance(),
            opposite: None,
            cuts: vec![],
            center: space.vertex_centroid(facet),
        })?;
        face_normals.insert(inward.normal(), face)?;
    }

    for face in Face::iter(faces.len()) {
        let opposite_normal = -&faces[face].normal;
        faces[face].opposite = face_normals.get(opposite_normal)?.copied();
    }

    Ok(faces)
}

/// Returns the full thickness of the polytope along each face normal, as
/// seen from each face: the shortest nonzero projection onto the face normal
/// of an edge that touches the face at exactly one vertex.
///
/// For uniform polytopes this is the edge that leaves the face, which gives
/// the correct depth even when the vertex figure is irregular.
pub(super) fn compute_face_thicknesses(
    polytope: &Polytope,
    original: &ElementTable,
    faces: &PerFace<FaceInfo>,
) -> PerFace<Option<Float>> {
    let space = polytope.space();
    let ridge_rank = polytope.ndim() - 1;
    faces.map_ref(|face, info| {
        let facet = polytope.facets()[face.to_usize()];
        let facet_index = original.index_of(facet)?;
        let mut thickness: Option<Float> = None;
        for &vertex in original.incidences(ridge_rank, facet_index, 0) {
            for &edge in original.incidences(0, vertex, 1) {
                if original.incidences(1, edge, ridge_rank).contains(&facet_index) {
                    continue;
                }
                let Some([a, b]) = space.line_endpoints(original.elements(1)[edge]) else {
                    continue;
                };
                let projection = (space.vertex_pos(a) - space.vertex_pos(b))
                    .dot(&info.normal)
                    .abs();
                if projection > MIN_THICKNESS {
                    thickness = Some(thickness.map_or(projection, |t| t.min(projection)));
                }
            }
        }
        if thickness.is_none() {
            log::warn!("face {face} has no edge leaving it; it will not be cut");
        }
        thickness
    })
}

/// Computes the cuts for every face.
///
/// Each face gets `int_length / 2` cuts near it, spaced by the full
/// thickness divided by `double_length`, plus the mirror images of its
/// opposite face's near cuts. The cut sets of opposite faces are then made
/// exact mirror images of each other so that every sticker is in the same
/// slice from either side.
pub(super) fn compute_cuts(
    faces: &mut PerFace<FaceInfo>,
    thicknesses: &PerFace<Option<Float>>,
    prescription: &Prescription,
) -> Result<(), BuildError> {
    let num_near_cuts = prescription.num_near_cuts();

    let near_cuts: PerFace<Vec<Float>> = faces.map_ref(|face, info| match thicknesses[face] {
        Some(full_thickness) => {
            let slice_thickness = full_thickness / prescription.double_length;
            (0..num_near_cuts)
                .map(|i| info.offset + (i + 1) as Float * slice_thickness)
                .collect()
        }
        None => vec![],
    });

    for face in Face::iter(faces.len()) {
        let mut cuts = near_cuts[face].clone();
        if let Some(opposite) = faces[face].opposite {
            cuts.extend(near_cuts[opposite].iter().rev().map(|&c| -c));
        }
        cuts.sort_by(Float::total_cmp);
        cuts.dedup_by(|a, b| (*a - *b).abs() < CUT_DEDUP_EPSILON);
        faces[face].cuts = cuts;
    }

    for face in Face::iter(faces.len()) {
        let Some(opposite) = faces[face].opposite else {
            continue;
        };
        if opposite <= face {
            continue;
        }
        let cuts = faces[face].cuts.clone();
        let opposite_cuts = &mut faces[opposite].cuts;
        if cuts.len() != opposite_cuts.len() {
            return Err(BuildError::InconsistentCuts {
                face,
                opposite,
                reason: format!("{} cuts vs. {}", cuts.len(), opposite_cuts.len()),
            });
        }
        let n = cuts.len();
        for (i, &cut) in cuts.iter().enumerate() {
            let mirrored = &mut opposite_cuts[n - 1 - i];
            if (*mirrored + cut).abs() > CUT_RECONCILE_EPSILON {
                return Err(BuildError::InconsistentCuts {
                    face,
                    opposite,
                    reason: format!("cut at {cut} has no mirror image (nearest is {mirrored})"),
                });
            }
            *mirrored = -cut;
        }
    }

    for (face, info) in faces.iter() {
        log::trace!("face {face} cuts: {:?}", info.cuts);
    }

    Ok(())
}
