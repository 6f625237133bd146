//! Slicing the faces of the polytope into stickers and grouping stickers into
//! cubies.

use std::collections::HashSet;

use ndcube_math::prelude::*;
use ndcube_shape::{Cut, ElementCutOutput, ElementId, ElementTable, Polytope};

use super::FaceInfo;
use crate::progress::Progress;
use crate::*;

/// Stickers produced by slicing, along with the provenance needed to find
/// cubies.
#[derive(Debug, Default, Clone)]
pub(super) struct SlicedStickers {
    /// Sticker elements, in sticker order.
    pub stickers: Vec<ElementId>,
    /// Original face of each sticker.
    pub faces: Vec<Face>,
    /// Ridges that are pieces of ridges of the original polytope, as opposed
    /// to ridges introduced by cuts.
    pub original_ridges: HashSet<ElementId>,
}

/// Slices every face of the polytope by every cut. Returns `None` if
/// construction was cancelled.
///
/// Opposite faces share their cuts, so only the face with the lower index of
/// each opposite pair is used.
pub(super) fn slice_stickers(
    polytope: &mut Polytope,
    original: &ElementTable,
    faces: &PerFace<FaceInfo>,
    progress: &mut impl Progress,
) -> Result<Option<SlicedStickers>, BuildError> {
    let ndim = polytope.ndim();

    let cuts = faces
        .iter()
        .filter(|(face, info)| info.opposite.is_none_or(|opposite| opposite > *face))
        .flat_map(|(face, info)| info.cuts.iter().map(move |&offset| (face, info, offset)))
        .collect::<Vec<_>>();

    if !progress.subtask_init("Slicing", Some(cuts.len())) {
        return Ok(None);
    }

    let mut ret = SlicedStickers {
        stickers: polytope.facets().to_vec(),
        faces: Face::iter(faces.len()).collect(),
        original_ridges: original.elements(ndim - 2).iter().copied().collect(),
    };

    for (i, (face, info, offset)) in cuts.into_iter().enumerate() {
        let divider = Hyperplane::new(&info.normal, offset)
            .ok_or_else(|| BuildError::Geometry(format!("face {face} has no normal")))?;
        let mut cut = Cut::slice(divider);
        let space = polytope.space_mut();

        let mut new_stickers = Vec::with_capacity(ret.stickers.len() * 2);
        let mut new_faces = Vec::with_capacity(ret.stickers.len() * 2);
        for (&sticker, &sticker_face) in std::iter::zip(&ret.stickers, &ret.faces) {
            match cut.cut(space, sticker)? {
                ElementCutOutput::Flush => {
                    new_stickers.push(sticker);
                    new_faces.push(sticker_face);
                }
                output @ ElementCutOutput::NonFlush { .. } => {
                    for piece in output.iter_inside_and_outside() {
                        new_stickers.push(piece);
                        new_faces.push(sticker_face);
                    }
                }
            }
        }
        ret.stickers = new_stickers;
        ret.faces = new_faces;

        ret.original_ridges = ret
            .original_ridges
            .iter()
            .flat_map(|&ridge| match cut.cached_output(ridge) {
                Some(output @ ElementCutOutput::NonFlush { .. }) => {
                    output.iter_inside_and_outside().collect::<Vec<_>>()
                }
                Some(ElementCutOutput::Flush) | None => vec![ridge],
            })
            .collect();

        log::trace!(
            "cut {i} (face {face} at {offset}): {} stickers",
            ret.stickers.len(),
        );
        if !progress.update_progress(i + 1) {
            return Ok(None);
        }
    }

    log::debug!("sliced into {} stickers", ret.stickers.len());
    if !progress.subtask_done() {
        return Ok(None);
    }
    Ok(Some(ret))
}

/// Groups stickers into cubies. Two stickers are on the same cubie if they
/// share a ridge that came from the original polytope, rather than from a cut.
///
/// Cubies are numbered in order of their lowest sticker.
pub(super) fn compute_cubies(
    sliced: &ElementTable,
    original_ridges: &HashSet<ElementId>,
) -> Result<PerSticker<Cubie>, BuildError> {
    let sticker_rank = sliced.top_rank();
    let ridge_rank = sticker_rank
        .checked_sub(1)
        .ok_or_else(|| BuildError::Geometry("stickers have rank 0".to_owned()))?;
    let sticker_count = sliced.count(sticker_rank);

    let mut disjoint_sets = disjoint::DisjointSet::with_len(sticker_count);
    for (ridge_index, ridge) in sliced.elements(ridge_rank).iter().enumerate() {
        if !original_ridges.contains(ridge) {
            continue;
        }
        if let &[a, b] = sliced.incidences(ridge_rank, ridge_index, sticker_rank) {
            disjoint_sets.join(a, b);
        }
    }

    let mut sets = disjoint_sets.sets();
    for set in &mut sets {
        set.sort_unstable();
    }
    sets.sort_unstable_by_key(|set| set.first().copied());

    let mut sticker_cubies = vec![Cubie::default(); sticker_count];
    for (i, set) in sets.iter().enumerate() {
        let cubie = Cubie::try_from_usize(i)?;
        for &sticker in set {
            sticker_cubies[sticker] = cubie;
        }
    }
    log::debug!("{} cubies", sets.len());
    Ok(sticker_cubies.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(schlafli: &str, length: &str) -> (Polytope, SlicedStickers, PerFace<FaceInfo>) {
        let prescription = Prescription::new(schlafli, length).unwrap();
        let mut polytope = Polytope::from_schlafli_product(&prescription.schlafli).unwrap();
        let original = ElementTable::new(polytope.space(), &[polytope.root()]);
        let mut faces = super::super::cuts::compute_faces(&polytope, &original).unwrap();
        let thicknesses =
            super::super::cuts::compute_face_thicknesses(&polytope, &original, &faces);
        super::super::cuts::compute_cuts(&mut faces, &thicknesses, &prescription).unwrap();
        let sliced = slice_stickers(&mut polytope, &original, &faces, &mut ())
            .unwrap()
            .unwrap();
        (polytope, sliced, faces)
    }

    #[test]
    fn test_slice_cube() {
        let (polytope, sliced, faces) = slice("{4,3}", "3");
        assert_eq!(sliced.stickers.len(), 54);
        for face in Face::iter(faces.len()) {
            assert_eq!(sliced.faces.iter().filter(|&&f| f == face).count(), 9);
        }

        // Each sticker lies on its face.
        for (&sticker, &face) in std::iter::zip(&sliced.stickers, &sliced.faces) {
            let center = polytope.space().vertex_centroid(sticker);
            let info = &faces[face];
            ndcube_math::assert_approx_eq!(center.dot(&info.normal), info.offset);
        }

        // 12 edges of the cube, each cut into 3 pieces
        assert_eq!(sliced.original_ridges.len(), 36);
    }

    #[test]
    fn test_cubies_of_cube() {
        let (polytope, sliced, _) = slice("{4,3}", "3");
        let table = ElementTable::new(polytope.space(), &sliced.stickers);
        let cubies = compute_cubies(&table, &sliced.original_ridges).unwrap();
        let cubie_count = cubies.iter_values().max().unwrap().0 + 1;
        assert_eq!(cubie_count, 26);

        // Cubies are numbered by their lowest sticker.
        let mut next = 0;
        for &cubie in cubies.iter_values() {
            assert!(cubie.0 <= next);
            if cubie.0 == next {
                next += 1;
            }
        }
    }

    #[test]
    fn test_slice_hypercube() {
        let (polytope, sliced, _) = slice("{4,3,3}", "3");
        assert_eq!(sliced.stickers.len(), 8 * 27);
        let table = ElementTable::new(polytope.space(), &sliced.stickers);
        let cubies = compute_cubies(&table, &sliced.original_ridges).unwrap();
        assert_eq!(cubies.iter_values().max().unwrap().0 + 1, 80);
    }
}
