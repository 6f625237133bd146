//! Sliced puzzle geometry: faces, stickers, cubies, and grips.

use std::ops::Range;

use itertools::Itertools;
use ndcube_math::collections::FuzzyPointTable;
use ndcube_math::prelude::*;
use ndcube_shape::{ElementTable, Polytope};

use crate::fingerprint::PuzzleFingerprint;
use crate::progress::Progress;
use crate::*;

mod cuts;
mod geometry;
mod grips;
mod slicing;

/// Options for building a puzzle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Whether to compute grips on multiple threads.
    pub parallel_grips: bool,
}
impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            parallel_grips: true,
        }
    }
}

/// Result of building a puzzle that was not an error.
#[derive(Debug)]
#[allow(clippy::large_enum_variant)]
pub enum BuildOutcome {
    /// The puzzle was built successfully.
    Built(PuzzleDescription),
    /// Construction was cancelled by the progress callback.
    Cancelled,
}
impl BuildOutcome {
    /// Returns the puzzle, or `None` if construction was cancelled.
    pub fn built(self) -> Option<PuzzleDescription> {
        match self {
            BuildOutcome::Built(puzzle) => Some(puzzle),
            BuildOutcome::Cancelled => None,
        }
    }
}

/// Face of the original polytope.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceInfo {
    /// Unit normal vector pointing into the polytope.
    pub normal: Vector,
    /// Signed distance of the face plane along `normal`. This is negative for
    /// polytopes containing the origin.
    pub offset: Float,
    /// Face with the opposite normal, if there is one.
    pub opposite: Option<Face>,
    /// Offsets of the cut planes parallel to this face along `normal`, in
    /// increasing order.
    pub cuts: Vec<Float>,
    /// Centroid of the face's vertices.
    pub center: Vector,
}

/// Twistable axis of the puzzle.
#[derive(Debug, Clone, PartialEq)]
pub struct GripInfo {
    /// Face that the grip belongs to.
    pub face: Face,
    /// Rank of the element of the original polytope that the grip is
    /// centered on.
    pub dim: u8,
    /// Number of distinct twists around the grip needed to return to the
    /// start, or 0 if the grip cannot be twisted.
    pub order: u32,
    /// Point near the center of the element, nudged slightly toward the face
    /// center.
    pub center: Vector,
    /// Orthonormal matrix whose last two rows span the plane of rotation.
    pub useful_matrix: Matrix,
}

/// Rest position of a sticker vertex, decomposed so that shrink factors can
/// be applied cheaply.
///
/// The position with face shrink `f` and sticker shrink `s` is
/// `(vertex_offset * s + sticker_offset) * f + face_center`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RestVertex {
    /// Vertex position relative to the sticker center.
    pub vertex_offset: [f32; 4],
    /// Sticker center relative to the face center.
    pub sticker_offset: [f32; 4],
    /// Face center.
    pub face_center: [f32; 4],
}
impl RestVertex {
    /// Returns the position of the vertex after applying shrink factors.
    pub fn position(&self, face_shrink: f32, sticker_shrink: f32) -> [f32; 4] {
        std::array::from_fn(|i| {
            (self.vertex_offset[i] * sticker_shrink + self.sticker_offset[i]) * face_shrink
                + self.face_center[i]
        })
    }
}

/// Fully built puzzle.
///
/// Everything here is immutable once built. The only thing that changes
/// while solving is which color occupies each sticker, which is tracked
/// separately by [`PuzzleState`].
#[derive(Debug)]
pub struct PuzzleDescription {
    pub(crate) prescription: Prescription,
    pub(crate) ndim: u8,
    pub(crate) original_element_counts: Vec<usize>,

    pub(crate) circumradius: Float,
    pub(crate) inradius: Float,
    pub(crate) faces: PerFace<FaceInfo>,

    pub(crate) sticker_faces: PerSticker<Face>,
    pub(crate) sticker_cubies: PerSticker<Cubie>,
    pub(crate) sticker_centers: PerSticker<Vector>,
    pub(crate) sticker_center_table: FuzzyPointTable<Sticker>,
    pub(crate) cubie_stickers: PerCubie<Vec<Sticker>>,

    pub(crate) rest_vertices: Vec<RestVertex>,
    pub(crate) sticker_vertex_ranges: PerSticker<Range<usize>>,
    pub(crate) sticker_polygons: PerSticker<Vec<Vec<usize>>>,

    pub(crate) grips: PerGrip<GripInfo>,
    pub(crate) nice_points: Vec<Vector>,

    pub(crate) fingerprint: PuzzleFingerprint,
}

/// Returns from the enclosing function if construction has been cancelled.
macro_rules! check_cancel {
    ($continue:expr) => {
        if !$continue {
            log::debug!("puzzle construction cancelled");
            return Ok(BuildOutcome::Cancelled);
        }
    };
}

impl PuzzleDescription {
    /// Builds a puzzle from a Schläfli product and a length, such as
    /// `"{4,3,3}"` and `"3"`.
    pub fn build(schlafli: &str, length: &str) -> Result<Self, BuildError> {
        Self::from_prescription(&Prescription::new(schlafli, length)?)
    }

    /// Builds a puzzle from a prescription with default options.
    pub fn from_prescription(prescription: &Prescription) -> Result<Self, BuildError> {
        match Self::build_with(prescription, &BuildOptions::default(), &mut ())? {
            BuildOutcome::Built(puzzle) => Ok(puzzle),
            BuildOutcome::Cancelled => Err(BuildError::Geometry(
                "construction was cancelled without a progress callback".to_owned(),
            )),
        }
    }

    /// Builds a puzzle, reporting progress to `progress`, which may cancel
    /// construction.
    pub fn build_with(
        prescription: &Prescription,
        options: &BuildOptions,
        progress: &mut impl Progress,
    ) -> Result<BuildOutcome, BuildError> {
        let schlafli = &prescription.schlafli;
        let ndim = schlafli.ndim();
        if !(3..=4).contains(&ndim) {
            return Err(BuildError::UnsupportedDimension {
                schlafli: schlafli.to_string(),
                ndim: ndim.min(u8::MAX as usize) as u8,
            });
        }

        check_cancel!(progress.subtask_init("Constructing polytope", None));
        let mut polytope = Polytope::from_schlafli_product(schlafli)?;
        let ndim = polytope.ndim();
        check_cancel!(progress.subtask_done());

        check_cancel!(progress.subtask_init("Computing fingerprint of original polytope", None));
        let original = ElementTable::new(polytope.space(), &[polytope.root()]);
        let original_element_counts = (0..=ndim).map(|rank| original.count(rank)).collect_vec();
        log::debug!("original polytope element counts: {original_element_counts:?}");
        let polytope_fingerprint = ndcube_shape::polytope_fingerprint(&original);
        let mut element_types = ndcube_shape::element_type_summaries(&original);
        let facet_types = element_types.swap_remove(ndim as usize - 1);
        let edge_length_range = original
            .elements(1)
            .iter()
            .filter_map(|&edge| polytope.space().line_endpoints(edge))
            .map(|[a, b]| (polytope.space().vertex_pos(a) - polytope.space().vertex_pos(b)).mag())
            .fold((Float::INFINITY, 0.0), |(min, max), len| {
                (Float::min(min, len), Float::max(max, len))
            });
        check_cancel!(progress.subtask_done());

        let mut faces = cuts::compute_faces(&polytope, &original)?;
        let circumradius = polytope
            .vertex_positions()
            .iter()
            .map(|v| v.mag())
            .fold(0.0, Float::max);
        let inradius = faces
            .iter_values()
            .map(|face| face.offset.abs())
            .fold(Float::INFINITY, Float::min);
        let thicknesses = cuts::compute_face_thicknesses(&polytope, &original, &faces);
        cuts::compute_cuts(&mut faces, &thicknesses, prescription)?;
        log::debug!(
            "{} faces, circumradius {circumradius}, inradius {inradius}",
            faces.len(),
        );

        let Some(sliced) = slicing::slice_stickers(&mut polytope, &original, &faces, progress)?
        else {
            return Ok(BuildOutcome::Cancelled);
        };

        check_cancel!(progress.subtask_init("Fixing orientations", None));
        let sliced_table = ElementTable::new(polytope.space(), &sliced.stickers);
        let sticker_cubies = slicing::compute_cubies(&sliced_table, &sliced.original_ridges)?;
        let geometry = geometry::compute_geometry(polytope.space(), &sliced, &faces)?;
        check_cancel!(progress.subtask_done());

        let mut cubie_stickers = PerCubie::<Vec<Sticker>>::new();
        for (sticker, &cubie) in sticker_cubies.iter() {
            while cubie_stickers.len() <= cubie.to_usize() {
                cubie_stickers.push(vec![])?;
            }
            cubie_stickers[cubie].push(sticker);
        }

        let nice_points = (0..=ndim)
            .flat_map(|rank| original.elements(rank))
            .map(|&element| polytope.space().vertex_centroid(element))
            .collect();

        let mut ret = Self {
            prescription: prescription.clone(),
            ndim,
            original_element_counts,

            circumradius,
            inradius,
            faces,

            sticker_faces: sliced.faces.into(),
            sticker_cubies,
            sticker_centers: geometry.centers,
            sticker_center_table: geometry.center_table,
            cubie_stickers,

            rest_vertices: geometry.rest_vertices,
            sticker_vertex_ranges: geometry.vertex_ranges,
            sticker_polygons: geometry.polygons,

            grips: PerGrip::new(),
            nice_points,

            fingerprint: PuzzleFingerprint::default(),
        };

        check_cancel!(progress.subtask_init("Computing fingerprint of polytope", None));
        let face_types = polytope
            .facets()
            .iter()
            .map(|&facet| {
                original
                    .index_of(facet)
                    .map(|i| facet_types[i].clone())
                    .unwrap_or_default()
            })
            .collect::<PerFace<String>>();
        ret.fingerprint =
            PuzzleFingerprint::new(&polytope_fingerprint, &ret, &face_types, edge_length_range);
        check_cancel!(progress.subtask_done());

        let Some(grips) =
            grips::compute_grips(&polytope, &ret.faces, options, progress)?
        else {
            return Ok(BuildOutcome::Cancelled);
        };
        ret.grips = grips;

        log::info!(
            "built {}: {} dimensions, {} faces, {} stickers, {} cubies, {} grips",
            ret.prescription,
            ret.ndim,
            ret.faces.len(),
            ret.sticker_faces.len(),
            ret.cubie_stickers.len(),
            ret.grips.len(),
        );

        Ok(BuildOutcome::Built(ret))
    }

    /// Returns the prescription that the puzzle was built from.
    pub fn prescription(&self) -> &Prescription {
        &self.prescription
    }
    /// Returns the number of dimensions of the puzzle.
    pub fn ndim(&self) -> u8 {
        self.ndim
    }
    /// Returns the number of elements of each rank in the original polytope.
    pub fn original_element_counts(&self) -> &[usize] {
        &self.original_element_counts
    }
    /// Returns the distance from the origin to the farthest vertex.
    pub fn circumradius(&self) -> Float {
        self.circumradius
    }
    /// Returns the distance from the origin to the nearest face plane.
    pub fn inradius(&self) -> Float {
        self.inradius
    }

    /// Returns the number of faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }
    /// Returns the number of stickers.
    pub fn num_stickers(&self) -> usize {
        self.sticker_faces.len()
    }
    /// Returns the number of cubies.
    pub fn num_cubies(&self) -> usize {
        self.cubie_stickers.len()
    }
    /// Returns the number of grips.
    pub fn num_grips(&self) -> usize {
        self.grips.len()
    }

    /// Returns all faces.
    pub fn faces(&self) -> &PerFace<FaceInfo> {
        &self.faces
    }
    /// Returns all grips.
    pub fn grips(&self) -> &PerGrip<GripInfo> {
        &self.grips
    }
    /// Returns the face of each sticker.
    pub fn sticker_faces(&self) -> &PerSticker<Face> {
        &self.sticker_faces
    }
    /// Returns the cubie of each sticker.
    pub fn sticker_cubies(&self) -> &PerSticker<Cubie> {
        &self.sticker_cubies
    }
    /// Returns the center of each sticker.
    pub fn sticker_centers(&self) -> &PerSticker<Vector> {
        &self.sticker_centers
    }
    /// Returns the stickers of each cubie.
    pub fn cubie_stickers(&self) -> &PerCubie<Vec<Sticker>> {
        &self.cubie_stickers
    }
    /// Returns the sticker whose center is at `point`, if any.
    pub fn sticker_at(&self, point: impl VectorRef) -> Option<Sticker> {
        self.sticker_center_table.get(point).ok().flatten().copied()
    }

    /// Returns every rest vertex. Each sticker owns a contiguous range.
    pub fn rest_vertices(&self) -> &[RestVertex] {
        &self.rest_vertices
    }
    /// Returns the range of rest vertices owned by each sticker.
    pub fn sticker_vertex_ranges(&self) -> &PerSticker<Range<usize>> {
        &self.sticker_vertex_ranges
    }
    /// Returns the polygons of each sticker as cycles of indices into
    /// [`Self::rest_vertices()`], wound consistently.
    pub fn sticker_polygons(&self) -> &PerSticker<Vec<Vec<usize>>> {
        &self.sticker_polygons
    }

    /// Returns the centers of every element of the original polytope, which
    /// are candidates for rotating the whole puzzle to the center of view.
    pub fn nice_points(&self) -> &[Vector] {
        &self.nice_points
    }
    /// Returns the topological fingerprint of the puzzle.
    pub fn fingerprint(&self) -> &PuzzleFingerprint {
        &self.fingerprint
    }

    /// Returns the positions of every vertex with the given shrink factors.
    pub fn compute_sticker_verts_at_rest(
        &self,
        face_shrink: f32,
        sticker_shrink: f32,
    ) -> Vec<[f32; 4]> {
        self.rest_vertices
            .iter()
            .map(|v| v.position(face_shrink, sticker_shrink))
            .collect()
    }
    /// Returns the positions of every vertex without any shrinking.
    pub fn standard_sticker_verts_at_rest(&self) -> Vec<[f32; 4]> {
        self.compute_sticker_verts_at_rest(1.0, 1.0)
    }

    /// Returns the number of stickers on each cubie.
    pub fn num_colors_for_cubie(&self, cubie: Cubie) -> usize {
        self.cubie_stickers.get(cubie).map_or(0, |stickers| stickers.len())
    }
    /// Returns the number of cubies with `num_colors` stickers.
    pub fn num_cubies_with_num_colors(&self, num_colors: usize) -> usize {
        self.cubie_stickers
            .iter_values()
            .filter(|stickers| stickers.len() == num_colors)
            .count()
    }

    /// Returns the grip nearest to `pick` among grips on `face` whose
    /// dimension matches the kind of piece that `sticker` is on.
    ///
    /// The kind of piece is inferred from the number of stickers on the
    /// cubie, which does not always distinguish pieces (for example, on
    /// puzzles where the pieces of a cell have mixed shapes). `is_2x2x2_cell`
    /// forces edge-like grips, for cells that only have corner pieces.
    pub fn closest_grip(
        &self,
        pick: impl VectorRef,
        face: Face,
        sticker: Sticker,
        is_2x2x2_cell: bool,
    ) -> Option<Grip> {
        let grip_dim = if is_2x2x2_cell {
            2
        } else {
            let cubie = *self.sticker_cubies.get(sticker).ok()?;
            let num_colors = self.num_colors_for_cubie(cubie);
            (self.ndim as usize)
                .checked_sub(num_colors)
                .unwrap_or(self.ndim as usize - 1) as u8
        };
        self.grips
            .iter()
            .filter(|(_, grip)| grip.face == face && grip.dim == grip_dim)
            .map(|(id, grip)| (id, grip.center.distance2(&pick)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(id, _)| id)
    }

    /// Returns the grip whose center is nearest to `point`, on any face.
    pub fn nearest_grip(&self, point: impl VectorRef) -> Option<Grip> {
        self.grips
            .iter()
            .map(|(id, grip)| (id, grip.center.distance2(&point)))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(id, _)| id)
    }

    /// Returns the element center nearest to `pick`.
    pub fn closest_nice_point_to_rotate_to_center(&self, pick: impl VectorRef) -> Option<&Vector> {
        self.nice_points
            .iter()
            .min_by(|a, b| a.distance2(&pick).total_cmp(&b.distance2(&pick)))
    }
}
