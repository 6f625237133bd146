//! Twisting: which stickers a twist moves and where they go.

use std::f64::consts::TAU;

use ndcube_math::prelude::*;

use crate::*;

/// Returns the index of the slice containing `point`, counting from the face
/// with inward normal `normal` whose cut offsets are `cuts`.
///
/// This is the number of cuts strictly below the height of the point along
/// the normal, so slice 0 is the layer touching the face.
pub fn which_slice(point: impl VectorRef, normal: impl VectorRef, cuts: &[Float]) -> usize {
    let height = point.dot(normal);
    cuts.iter().filter(|&&cut| height > cut).count()
}

/// Returns whether `point` is in one of the slices selected by `slice_mask`.
/// A mask of 0 selects slice 0.
pub fn point_is_in_slice_mask(
    point: impl VectorRef,
    normal: impl VectorRef,
    cuts: &[Float],
    slice_mask: i32,
) -> bool {
    let slice_mask = normalize_slice_mask(slice_mask) as u32;
    let slice = which_slice(point, normal, cuts);
    u32::try_from(slice)
        .ok()
        .and_then(|slice| slice_mask.checked_shr(slice))
        .is_some_and(|bits| bits & 1 != 0)
}

/// Returns the slice mask with 0 replaced by 1.
pub(crate) fn normalize_slice_mask(slice_mask: i32) -> i32 {
    if slice_mask == 0 { 1 } else { slice_mask }
}

impl PuzzleDescription {
    /// Returns the grip with index `index`, or an error if it is out of
    /// range.
    pub fn grip_from_index(&self, index: i64) -> Result<Grip, TwistError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.grips.len())
            .and_then(|i| Grip::try_from_usize(i).ok())
            .ok_or(TwistError::BadGrip {
                grip: index,
                count: self.grips.len(),
            })
    }

    fn twistable_grip(&self, grip: Grip) -> Result<&GripInfo, TwistError> {
        let info = self.grips.get(grip).map_err(|_| TwistError::BadGrip {
            grip: grip.0 as i64,
            count: self.grips.len(),
        })?;
        if info.order == 0 {
            return Err(TwistError::ZeroOrder(grip));
        }
        Ok(info)
    }

    /// Returns the number of slices along the axis of a grip.
    pub fn num_slices_for_grip(&self, grip: Grip) -> usize {
        self.grips
            .get(grip)
            .map_or(0, |info| self.faces[info.face].cuts.len() + 1)
    }

    /// Returns the rotation matrix for a fraction `frac` of a twist of `grip`
    /// in direction `dir`, where `dir` is a number of twist increments.
    pub fn twist_matrix(&self, grip: Grip, dir: i32, frac: Float) -> Result<Matrix, TwistError> {
        let info = self.twistable_grip(grip)?;
        Ok(twist_matrix(info, dir, frac))
    }

    /// Returns whether a twist of `grip` with `slice_mask` moves `sticker`.
    pub fn sticker_is_in_twist(&self, sticker: Sticker, grip: Grip, slice_mask: i32) -> bool {
        let (Ok(info), Ok(center)) = (self.grips.get(grip), self.sticker_centers.get(sticker))
        else {
            return false;
        };
        let face = &self.faces[info.face];
        point_is_in_slice_mask(center, &face.normal, &face.cuts, slice_mask)
    }

    /// Applies a twist to `state`, which holds the color of each sticker.
    ///
    /// # Panics
    ///
    /// Panics if a twisted sticker does not land on another sticker, which
    /// means the puzzle geometry is inconsistent.
    pub fn apply_twist_to_state(
        &self,
        state: &mut PerSticker<Face>,
        grip: Grip,
        dir: i32,
        slice_mask: i32,
    ) -> Result<(), TwistError> {
        let info = self.twistable_grip(grip)?;
        if state.len() != self.num_stickers() {
            return Err(TwistError::WrongStateLength {
                expected: self.num_stickers(),
                actual: state.len(),
            });
        }
        let slice_mask = normalize_slice_mask(slice_mask);
        let face = &self.faces[info.face];
        let matrix = twist_matrix(info, dir, 1.0);

        let mut new_state = state.clone();
        for (sticker, center) in self.sticker_centers.iter() {
            if !point_is_in_slice_mask(center, &face.normal, &face.cuts, slice_mask) {
                continue;
            }
            let new_center = &matrix * center;
            match self.sticker_center_table.get(&new_center) {
                Ok(Some(&destination)) => new_state[destination] = state[sticker],
                Ok(None) => panic!(
                    "sticker {sticker} twisted by grip {grip} landed at {new_center}, \
                     which is not a sticker",
                ),
                Err(e) => panic!("sticker {sticker} twisted by grip {grip}: {e}"),
            }
        }
        *state = new_state;
        Ok(())
    }

    /// Returns the positions of every vertex with the given shrink factors,
    /// with the stickers affected by a twist rotated part of the way.
    pub fn compute_sticker_verts_partially_twisted(
        &self,
        face_shrink: f32,
        sticker_shrink: f32,
        grip: Grip,
        dir: i32,
        slice_mask: i32,
        frac: Float,
    ) -> Result<Vec<[f32; 4]>, TwistError> {
        let info = self.twistable_grip(grip)?;
        let face = &self.faces[info.face];
        let matrix = twist_matrix(info, dir, frac);

        let mut verts = self.compute_sticker_verts_at_rest(face_shrink, sticker_shrink);
        for (sticker, center) in self.sticker_centers.iter() {
            if !point_is_in_slice_mask(center, &face.normal, &face.cuts, slice_mask) {
                continue;
            }
            for v in &mut verts[self.sticker_vertex_ranges[sticker].clone()] {
                let pos: Vector = v.iter().map(|&x| x as Float).collect();
                *v = (&matrix * pos).to_f32_array();
            }
        }
        Ok(verts)
    }
}

fn twist_matrix(info: &GripInfo, dir: i32, frac: Float) -> Matrix {
    let ndim = info.useful_matrix.ndim();
    let angle = dir as Float * TAU / info.order as Float * frac;
    let rotation = Matrix::from_rotation_in_plane(ndim, ndim - 2, ndim - 1, angle);
    info.useful_matrix.transpose() * rotation * &info.useful_matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_which_slice() {
        let cuts = [-1.0 / 3.0, 1.0 / 3.0];
        let normal = vector![0.0, 0.0, 1.0];
        assert_eq!(which_slice(vector![5.0, 5.0, -1.0], &normal, &cuts), 0);
        assert_eq!(which_slice(vector![0.0, 0.0, -0.5], &normal, &cuts), 0);
        assert_eq!(which_slice(vector![0.0, 0.0, 0.0], &normal, &cuts), 1);
        assert_eq!(which_slice(vector![0.0, 0.0, 0.9], &normal, &cuts), 2);
        // Exactly on a cut counts as below it.
        assert_eq!(which_slice(vector![0.0, 0.0, 1.0 / 3.0], &normal, &cuts), 1);
        assert_eq!(which_slice(vector![0.0, 0.0, 0.0], &normal, &[]), 0);
    }

    #[test]
    fn test_point_is_in_slice_mask() {
        let cuts = [-0.5, 0.0, 0.5];
        let normal = vector![1.0];
        let slice_of = |x: Float| {
            (0..4)
                .filter(|&i| point_is_in_slice_mask(vector![x], &normal, &cuts, 1 << i))
                .collect::<Vec<_>>()
        };
        assert_eq!(slice_of(-0.75), [0]);
        assert_eq!(slice_of(-0.25), [1]);
        assert_eq!(slice_of(0.25), [2]);
        assert_eq!(slice_of(0.75), [3]);

        // 0 means the first slice
        assert!(point_is_in_slice_mask(vector![-0.75], &normal, &cuts, 0));
        assert!(!point_is_in_slice_mask(vector![0.75], &normal, &cuts, 0));
        // -1 means every slice
        assert!(point_is_in_slice_mask(vector![0.75], &normal, &cuts, -1));
        assert!(point_is_in_slice_mask(vector![0.75], &normal, &cuts, 0b1010));
        assert!(!point_is_in_slice_mask(vector![0.25], &normal, &cuts, 0b1010));
    }

    #[test]
    fn test_slices_cover_every_sticker_once() {
        let p = PuzzleDescription::build("{4,3,3}", "3").unwrap();
        for grip in Grip::iter(p.num_grips()) {
            let slices = p.num_slices_for_grip(grip);
            assert_eq!(slices, 3);
            for sticker in Sticker::iter(p.num_stickers()) {
                let count = (0..slices)
                    .filter(|&i| p.sticker_is_in_twist(sticker, grip, 1 << i))
                    .count();
                assert_eq!(count, 1);
            }
        }
    }

    #[test]
    fn test_twist_errors() {
        let p = PuzzleDescription::build("{4,3,3}", "2").unwrap();
        let mut state = PuzzleState::new(&p).into_stickers();

        let center_grip = p.grips().iter().find(|(_, g)| g.order == 0).unwrap().0;
        assert_eq!(
            p.apply_twist_to_state(&mut state, center_grip, 1, 1),
            Err(TwistError::ZeroOrder(center_grip)),
        );

        let bad_grip = Grip(p.num_grips() as u32);
        assert!(matches!(
            p.apply_twist_to_state(&mut state, bad_grip, 1, 1),
            Err(TwistError::BadGrip { .. }),
        ));
        assert!(matches!(p.grip_from_index(-1), Err(TwistError::BadGrip { grip: -1, .. })));
        assert_eq!(p.grip_from_index(0), Ok(Grip(0)));

        let mut short_state: PerSticker<Face> = state.iter_values().skip(1).copied().collect();
        assert_eq!(
            p.apply_twist_to_state(&mut short_state, Grip(0), 1, 1),
            Err(TwistError::WrongStateLength {
                expected: p.num_stickers(),
                actual: p.num_stickers() - 1,
            }),
        );
    }

    #[test]
    fn test_partial_twist() {
        let p = PuzzleDescription::build("{4,3}", "3").unwrap();
        let grip = p.grips().iter().find(|(_, g)| g.order == 4).unwrap().0;

        let rest = p.standard_sticker_verts_at_rest();
        let unmoved = p
            .compute_sticker_verts_partially_twisted(1.0, 1.0, grip, 1, 1, 0.0)
            .unwrap();
        for (a, b) in std::iter::zip(&rest, &unmoved) {
            for i in 0..4 {
                assert!((a[i] - b[i]).abs() < 1e-5);
            }
        }

        let half = p
            .compute_sticker_verts_partially_twisted(1.0, 1.0, grip, 1, 1, 0.5)
            .unwrap();
        let moved = std::iter::zip(&rest, &half)
            .filter(|(a, b)| (0..4).any(|i| (a[i] - b[i]).abs() > 1e-3))
            .count();
        // The top layer of a 3x3x3 has 21 stickers with 4 vertices each.
        assert_eq!(moved, 21 * 4);
    }
}
