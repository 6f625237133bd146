//! Sticker centers, polygons, and rest positions of vertices.

use std::collections::HashMap;
use std::ops::Range;

use ndcube_math::collections::{FuzzyPointTable, FuzzyTolerance};
use ndcube_math::prelude::*;
use ndcube_shape::{ElementId, Space, VertexId};

use super::slicing::SlicedStickers;
use super::{FaceInfo, RestVertex};
use crate::*;

#[derive(Debug)]
pub(super) struct StickerGeometry {
    pub centers: PerSticker<Vector>,
    pub center_table: FuzzyPointTable<Sticker>,
    pub rest_vertices: Vec<RestVertex>,
    pub vertex_ranges: PerSticker<Range<usize>>,
    pub polygons: PerSticker<Vec<Vec<usize>>>,
}

pub(super) fn compute_geometry(
    space: &Space,
    sliced: &SlicedStickers,
    faces: &PerFace<FaceInfo>,
) -> Result<StickerGeometry, BuildError> {
    let ndim = space.ndim();

    let mut ret = StickerGeometry {
        centers: PerSticker::new(),
        center_table: FuzzyPointTable::new(ndim, FuzzyTolerance::default()),
        rest_vertices: vec![],
        vertex_ranges: PerSticker::new(),
        polygons: PerSticker::new(),
    };

    for (&element, &face) in std::iter::zip(&sliced.stickers, &sliced.faces) {
        let face_info = &faces[face];
        let center = space.vertex_centroid(element);
        let sticker = ret.centers.push(center.clone())?;
        if ret.center_table.insert(&center, sticker)?.is_some() {
            return Err(BuildError::DuplicateStickerCenter(center));
        }

        let vertices = space.vertex_set(element);
        let base = ret.rest_vertices.len();
        let local_index: HashMap<VertexId, usize> =
            vertices.iter().enumerate().map(|(i, &v)| (v, i)).collect();

        let sticker_offset = (&center - &face_info.center).to_f32_array();
        let face_center = face_info.center.to_f32_array();
        ret.rest_vertices
            .extend(vertices.iter().map(|&v| RestVertex {
                vertex_offset: (space.vertex_pos(v) - &center).to_f32_array(),
                sticker_offset,
                face_center,
            }));
        ret.vertex_ranges.push(base..ret.rest_vertices.len())?;

        let polygon_elements = match ndim {
            3 => vec![element],
            _ => space.subelements_with_rank(element, 2),
        };
        let mut polygons = vec![];
        for polygon in polygon_elements {
            let mut cycle = polygon_cycle(space, polygon)?;
            orient_polygon(space, &mut cycle, &center, &face_info.normal);
            polygons.push(cycle);
        }
        if ndim == 4 {
            rotate_second_polygon(&mut polygons);
        }
        let polygons = polygons
            .into_iter()
            .map(|cycle| cycle.iter().map(|v| base + local_index[v]).collect())
            .collect();
        ret.polygons.push(polygons)?;
    }

    log::debug!(
        "{} stickers with {} vertices",
        ret.centers.len(),
        ret.rest_vertices.len(),
    );
    Ok(ret)
}

/// Returns the vertices of a polygon in cyclic order, starting from the
/// vertex with the lowest ID.
fn polygon_cycle(space: &Space, polygon: ElementId) -> Result<Vec<VertexId>, BuildError> {
    let bad_polygon = || BuildError::Geometry(format!("element {polygon} is not a polygon"));

    let mut neighbors: HashMap<VertexId, Vec<VertexId>> = HashMap::new();
    for edge in space.subelements_with_rank(polygon, 1) {
        let [a, b] = space.line_endpoints(edge).ok_or_else(bad_polygon)?;
        neighbors.entry(a).or_default().push(b);
        neighbors.entry(b).or_default().push(a);
    }
    if neighbors.values().any(|n| n.len() != 2) {
        return Err(bad_polygon());
    }
    let start = *neighbors.keys().min().ok_or_else(bad_polygon)?;

    let mut cycle = vec![start];
    let mut prev = start;
    let mut current = neighbors[&start][0];
    while current != start {
        if cycle.len() > neighbors.len() {
            return Err(bad_polygon());
        }
        cycle.push(current);
        let next = neighbors[&current]
            .iter()
            .copied()
            .find(|&n| n != prev)
            .ok_or_else(bad_polygon)?;
        prev = current;
        current = next;
    }
    if cycle.len() != neighbors.len() {
        return Err(bad_polygon());
    }
    Ok(cycle)
}

/// Reverses the polygon if needed so that all polygons are wound the same way
/// relative to the outward normal of their face.
fn orient_polygon(
    space: &Space,
    cycle: &mut [VertexId],
    sticker_center: &Vector,
    inward_normal: &Vector,
) {
    let ndim = space.ndim();
    let points = cycle.iter().map(|&v| space.vertex_pos(v)).collect::<Vec<_>>();
    let Some(polygon_center) = ndcube_math::util::centroid(&points) else {
        return;
    };
    if points.len() < 2 {
        return;
    }

    let mut rows = vec![points[0] - &polygon_center, points[1] - &polygon_center];
    if ndim == 4 {
        rows.push(&polygon_center - sticker_center);
    }
    rows.push(-inward_normal);
    let rows = rows.into_iter().map(|row| row.pad(ndim)).collect::<Vec<_>>();

    if Matrix::from_rows(&rows).determinant() < 0.0 {
        cycle.reverse();
    }
}

/// Rotates the second polygon of a sticker so that it starts at a vertex
/// that is not in the first polygon, if there is one.
fn rotate_second_polygon(polygons: &mut [Vec<VertexId>]) {
    let [first, second, ..] = polygons else {
        return;
    };
    if let Some(start) = second.iter().position(|v| !first.contains(v)) {
        second.rotate_left(start);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_second_polygon() {
        let v = |i| VertexId(i);
        let mut polygons = vec![
            vec![v(0), v(1), v(2), v(3)],
            vec![v(0), v(1), v(5), v(4)],
        ];
        rotate_second_polygon(&mut polygons);
        assert_eq!(polygons[1], [v(5), v(4), v(0), v(1)]);

        let mut polygons = vec![vec![v(0), v(1), v(2)], vec![v(2), v(1), v(0)]];
        rotate_second_polygon(&mut polygons);
        assert_eq!(polygons[1], [v(2), v(1), v(0)]);
    }

    #[test]
    fn test_polygon_cycle_and_orientation() {
        let mut space = Space::new(3);
        let cube = space.add_primordial_cube(1.0).unwrap();
        for face in space.subelements_with_rank(cube, 2) {
            let mut cycle = polygon_cycle(&space, face).unwrap();
            assert_eq!(cycle.len(), 4);
            for (a, b) in std::iter::zip(&cycle, cycle.iter().cycle().skip(1)) {
                let d = space.vertex_pos(*a).distance2(space.vertex_pos(*b));
                ndcube_math::assert_approx_eq!(d, 4.0);
            }

            let center = space.vertex_centroid(face);
            let inward_normal = -&center;
            orient_polygon(&space, &mut cycle, &center, &inward_normal);
            let p = |i: usize| space.vertex_pos(cycle[i]) - &center;
            // Counterclockwise when viewed from outside
            let winding = p(0).cross_product_3d(p(1));
            assert!(winding.dot(&center) > 0.0);
        }
    }
}
