//! Facet hyperplanes of uniform polytopes, their products, and their joins.

use std::cmp::Ordering;

use itertools::Itertools;
use ndcube_math::collections::ApproxHashMap;
use ndcube_math::prelude::*;

use crate::{
    SchlafliError, SchlafliFactor, SchlafliProduct, ShapeError, ShapeFactor, ShapeResult,
    WythoffDiagram,
};

/// Orbits larger than this are assumed to come from an infinite group. The
/// largest finite orbit in 4D is the 120 facets of the 120-cell.
const MAX_FACET_COUNT: usize = 10_000;

/// Facet hyperplanes of a shape centered at the origin.
#[derive(Debug, Clone)]
pub struct FacetPlanes {
    /// Number of dimensions of the shape.
    pub ndim: u8,
    /// Outward-facing hyperplanes, whose intersection is the shape.
    pub planes: Vec<Hyperplane>,
    /// Distance from the origin to the farthest vertex.
    pub circumradius: Float,
}

/// Returns the unit normal vectors of the mirrors generating the symmetry
/// group of a regular polytope.
///
/// The mirror vectors are arranged so that each one is perpendicular to all
/// the others except its neighbors:
///
/// ```text
/// [ ? 0 0 0 ]
/// [ ? ? 0 0 ]
/// [ 0 ? ? 0 ]
/// [ 0 0 ? ? ]
/// ```
pub fn mirrors(factor: &SchlafliFactor) -> ShapeResult<Vec<Vector>> {
    let angles = factor.indices().iter().map(|index| index.mirror_angle());
    mirrors_with_angles(&factor.to_string(), angles)
}

/// Returns the mirror vectors for a linear diagram whose neighboring mirrors
/// meet at the given fractions of a half turn.
fn mirrors_with_angles(
    label: &str,
    angles: impl IntoIterator<Item = Float>,
) -> ShapeResult<Vec<Vector>> {
    let angles = angles.into_iter().collect_vec();
    let ndim = angles.len() as u8 + 1;
    let mut ret = vec![];
    let mut last = Vector::unit(0);
    for (i, angle) in angles.into_iter().enumerate() {
        let i = i as u8;
        ret.push(last.clone());
        // Only one axis is shared between the last vector and the new one, so
        // only that axis affects their dot product. The mirrors face each
        // other, hence the negation.
        let q = last[i];
        let dot = -(std::f64::consts::PI as Float * angle).cos();
        let y = dot / q;
        let z = (1.0 - y * y).sqrt();
        if !z.is_finite() || z <= EPSILON {
            return Err(ShapeError::NotFinite(label.to_owned()));
        }
        last = Vector::zero(ndim);
        last[i] = y;
        last[i + 1] = z;
    }
    ret.push(last);
    Ok(ret)
}

/// Returns the facet hyperplanes of a regular polytope with edge length 2,
/// centered at the origin.
///
/// Star polytopes give the hyperplanes of their faces, which bound the convex
/// kernel of the star.
pub fn facet_planes_of_regular_polytope(factor: &SchlafliFactor) -> ShapeResult<FacetPlanes> {
    let label = factor.to_string();
    let mirrors = mirrors(factor)?;
    let ndim = factor.ndim() as usize;
    let mut nodes = vec![0.0; ndim];
    nodes[0] = 1.0;
    // The base facet is fixed by every mirror except the last one.
    kaleidoscope(&label, &mirrors, &nodes, |k| k == ndim - 1)
}

/// Returns the facet hyperplanes of the uniform polytope described by a
/// Wythoff diagram, centered at the origin.
pub fn facet_planes_of_wythoff(diagram: &WythoffDiagram) -> ShapeResult<FacetPlanes> {
    let label = diagram.to_string();
    let angles = diagram.links().iter().map(|&link| 1.0 / link as Float);
    let mirrors = mirrors_with_angles(&label, angles)?;
    kaleidoscope(&label, &mirrors, diagram.nodes(), |k| diagram.is_facet_node(k))
}

/// Places a vertex at distance `nodes[i]` from each mirror `i` and returns
/// the orbit of the hyperplane through it parallel to each mirror `k` for
/// which `is_facet_node(k)`.
fn kaleidoscope(
    label: &str,
    mirrors: &[Vector],
    nodes: &[Float],
    is_facet_node: impl Fn(usize) -> bool,
) -> ShapeResult<FacetPlanes> {
    let not_finite = || ShapeError::NotFinite(label.to_owned());

    // Column `i` of the inverse is perpendicular to every mirror except
    // mirror `i`.
    let mirror_basis = Matrix::from_rows(mirrors).inverse().ok_or_else(not_finite)?;
    let vertex = &mirror_basis * nodes.iter().copied().collect::<Vector>();

    let mut base_planes = vec![];
    for k in (0..mirrors.len()).filter(|&k| is_facet_node(k)) {
        let normal = &mirror_basis * Vector::unit(k as u8);
        let plane = Hyperplane::through_point(normal, &vertex).ok_or_else(not_finite)?;
        base_planes.push(match approx_cmp(&plane.distance(), &0.0) {
            Ordering::Less => plane.flip(),
            Ordering::Equal => return Err(ShapeError::Degenerate(label.to_owned())),
            Ordering::Greater => plane,
        });
    }

    Ok(FacetPlanes {
        ndim: mirrors.len() as u8,
        planes: orbit_of_planes(label, mirrors, base_planes)?,
        circumradius: vertex.mag(),
    })
}

/// Returns every image of the base planes under the group generated by
/// reflections through the mirrors, starting with the base planes.
fn orbit_of_planes(
    label: &str,
    mirrors: &[Vector],
    base_planes: Vec<Hyperplane>,
) -> ShapeResult<Vec<Hyperplane>> {
    let not_finite = || ShapeError::NotFinite(label.to_owned());
    let reflections = mirrors.iter().map(Matrix::from_reflection).collect_vec();

    let mut seen = ApproxHashMap::new();
    let mut planes = vec![];
    for plane in base_planes {
        if seen.insert(&plane, ()).is_none() {
            planes.push(plane);
        }
    }
    let mut next_unprocessed_index = 0;
    while next_unprocessed_index < planes.len() {
        let unprocessed = planes[next_unprocessed_index].clone();
        for reflection in &reflections {
            let new_plane = Hyperplane::new(reflection * unprocessed.normal(), unprocessed.distance())
                .ok_or_else(not_finite)?;
            if seen.insert(&new_plane, ()).is_none() {
                planes.push(new_plane);
                if planes.len() > MAX_FACET_COUNT {
                    return Err(not_finite());
                }
            }
        }
        next_unprocessed_index += 1;
    }
    Ok(planes)
}

/// Returns the facet hyperplanes of a single factor.
pub fn facet_planes_of_factor(factor: &ShapeFactor) -> ShapeResult<FacetPlanes> {
    match factor {
        ShapeFactor::Regular(f) => facet_planes_of_regular_polytope(f),
        ShapeFactor::Wythoff(d) => facet_planes_of_wythoff(d),
    }
}

/// Returns the facet hyperplanes of a join of products.
///
/// Within a product, each factor occupies its own block of coordinate axes.
/// Joined operands are stacked along one extra axis each, so `{5}x{4}` uses
/// axes 0 to 3 and `{3}v{}` puts the triangle in axes 0 and 1, the segment in
/// axis 2, and separates them along axis 3.
pub fn facet_planes_of_product(product: &SchlafliProduct) -> ShapeResult<FacetPlanes> {
    let label = product.canonical();
    let mut ret: Option<FacetPlanes> = None;
    for factors in product.join_operands() {
        let next = product_of_factors(factors)?;
        ret = Some(match ret {
            Some(prev) => join(&label, &prev, &next),
            None => next,
        });
    }
    ret.ok_or(ShapeError::Schlafli(SchlafliError::Empty))
}

fn product_of_factors(factors: &[ShapeFactor]) -> ShapeResult<FacetPlanes> {
    let parts: Vec<FacetPlanes> = factors.iter().map(facet_planes_of_factor).try_collect()?;
    let ndim = parts.iter().map(|part| part.ndim).sum();

    let mut planes = vec![];
    let mut offset = 0;
    for part in &parts {
        for plane in &part.planes {
            let normal = embed(plane.normal(), offset, ndim);
            planes.extend(Hyperplane::new(normal, plane.distance()));
        }
        offset += part.ndim;
    }
    let circumradius = parts
        .iter()
        .map(|part| part.circumradius * part.circumradius)
        .sum::<Float>()
        .sqrt();
    Ok(FacetPlanes {
        ndim,
        planes,
        circumradius,
    })
}

/// Returns the convex hull of `p` and `q`, with `p` shifted along the new
/// last axis by `+h` and `q` by `-h`.
///
/// `h` is chosen so that edges between the two operands have length 2. If
/// the operands are too large for that, they are placed 2 apart and the
/// connecting edges are longer.
fn join(label: &str, p: &FacetPlanes, q: &FacetPlanes) -> FacetPlanes {
    let ndim = p.ndim + q.ndim + 1;
    let w = ndim - 1;

    let gap2 = 4.0 - p.circumradius * p.circumradius - q.circumradius * q.circumradius;
    let h = if gap2 > EPSILON {
        gap2.sqrt() / 2.0
    } else {
        log::warn!("operands of {label} are too large for uniform edges; joining them 2 units apart");
        1.0
    };

    let mut planes = vec![];
    for (part, offset, own_w) in [(p, 0, h), (q, p.ndim, -h)] {
        for plane in &part.planes {
            // Tilt the facet plane so that it contains the other operand.
            let mut normal = embed(plane.normal(), offset, ndim);
            normal[w] = -plane.distance() / (2.0 * own_w);
            let mut other_center = Vector::zero(ndim);
            other_center[w] = -own_w;
            planes.extend(Hyperplane::through_point(normal, other_center));
        }
    }

    let circumradius = Float::max(p.circumradius.hypot(h), q.circumradius.hypot(h));
    FacetPlanes {
        ndim,
        planes,
        circumradius,
    }
}

/// Copies `v` into a zero vector of `ndim` dimensions, starting at axis
/// `offset`.
fn embed(v: &Vector, offset: u8, ndim: u8) -> Vector {
    let mut ret = Vector::zero(ndim);
    for (i, x) in v.iter().enumerate() {
        ret[offset + i as u8] = x;
    }
    ret
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use ndcube_math::assert_approx_eq;

    use super::*;

    fn factor(indices: &[usize]) -> SchlafliFactor {
        SchlafliFactor::from_indices(indices.to_vec())
    }

    fn planes_of(s: &str) -> FacetPlanes {
        let product: SchlafliProduct = s.parse().expect("valid symbol");
        facet_planes_of_product(&product).expect("finite")
    }

    #[test]
    fn test_mirror_angles() {
        let m = mirrors(&factor(&[5, 3, 3])).expect("finite");
        assert_eq!(m.len(), 4);
        for (i, a) in m.iter().enumerate() {
            assert_approx_eq!(a.mag(), 1.0);
            for (j, b) in m.iter().enumerate().skip(i + 1) {
                if j == i + 1 {
                    continue;
                }
                assert_approx_eq!(a.dot(b), 0.0);
            }
        }
        assert_approx_eq!(m[0].dot(&m[1]), -(PI / 5.0).cos());
    }

    #[test]
    fn test_facet_counts() {
        let count = |indices: &[usize]| {
            facet_planes_of_regular_polytope(&factor(indices)).map(|p| p.planes.len())
        };
        assert_eq!(count(&[]).ok(), Some(2));
        assert_eq!(count(&[5]).ok(), Some(5));
        assert_eq!(count(&[4, 3]).ok(), Some(6));
        assert_eq!(count(&[3, 5]).ok(), Some(20));
        assert_eq!(count(&[4, 3, 3]).ok(), Some(8));
        assert_eq!(count(&[3, 3, 3]).ok(), Some(5));
        assert_eq!(count(&[3, 4, 3]).ok(), Some(24));
        assert_eq!(count(&[5, 3, 3]).ok(), Some(120));
    }

    #[test]
    fn test_cube_planes() {
        let cube = facet_planes_of_regular_polytope(&factor(&[4, 3])).expect("finite");
        assert_approx_eq!(cube.circumradius, 3.0_f64.sqrt());
        for plane in cube.planes {
            assert_approx_eq!(plane.distance(), 1.0);
            assert_eq!(plane.normal().iter().filter(|x| x.abs() > 0.5).count(), 1);
        }
    }

    #[test]
    fn test_infinite_groups_rejected() {
        for indices in [&[4, 4][..], &[6, 3], &[3, 6], &[7, 3], &[4, 3, 4], &[5, 3, 5]] {
            let result = facet_planes_of_regular_polytope(&factor(indices));
            assert!(matches!(result, Err(ShapeError::NotFinite(_))), "{indices:?}");
        }
        let product: SchlafliProduct = "(1)7(1)3(0)".parse().expect("valid symbol");
        assert!(matches!(facet_planes_of_product(&product), Err(ShapeError::NotFinite(_))));
    }

    #[test]
    fn test_star_polygon_planes() {
        let pentagram = planes_of("{5/2}");
        assert_eq!(pentagram.planes.len(), 5);
        // Each edge spans 144 degrees of the circumcircle and has length 2.
        assert_approx_eq!(pentagram.circumradius, 1.0 / (0.4 * PI).sin());
        for plane in &pentagram.planes {
            assert_approx_eq!(plane.distance(), pentagram.circumradius * (0.4 * PI).cos());
        }
        assert_eq!(planes_of("{5/2,5}").planes.len(), 12);
        assert_eq!(planes_of("{5/2}x{4}").planes.len(), 9);
    }

    #[test]
    fn test_wythoff_planes() {
        let count = |s: &str| planes_of(s).planes.len();
        assert_eq!(count("(1)3(1)3(0)"), 8);
        assert_eq!(count("(1)3(0)3(1)"), 14);
        assert_eq!(count("(1)3(1)5(0)"), 32);
        assert_eq!(count("(1)3(1)3(1)3(1)"), 30);
        assert_eq!(count("(1)3(1)4(0)3(0)"), 48);
        assert_eq!(count("(1)---(1)-5-(0)x{}"), 34);

        // Rings on only the first node give the regular polytope.
        let tetrahedron = planes_of("(1)3(0)3(0)");
        let regular = facet_planes_of_regular_polytope(&factor(&[3, 3])).expect("finite");
        assert_approx_eq!(tetrahedron.circumradius, regular.circumradius);
        assert_eq!(tetrahedron.planes, regular.planes);

        let rectangle = planes_of("(1)2(1.5)");
        let mut distances = rectangle.planes.iter().map(|p| p.distance()).collect_vec();
        distances.sort_by(Float::total_cmp);
        for (distance, expected) in std::iter::zip(distances, [1.0, 1.0, 1.5, 1.5]) {
            assert_approx_eq!(distance, expected);
        }
        assert_eq!(planes_of("(2)").planes.len(), 2);
    }

    #[test]
    fn test_product_planes() {
        let planes = planes_of("{5}x{4}").planes;
        assert_eq!(planes.len(), 9);
        // The square's planes live in the last two coordinates.
        for plane in &planes[5..] {
            assert_approx_eq!(plane.normal().get(0), 0.0);
            assert_approx_eq!(plane.normal().get(1), 0.0);
        }

        let prism = planes_of("{3}x{}");
        assert_eq!(prism.planes.len(), 5);
        assert_eq!(prism.planes[3].normal(), &vector![0.0, 0.0, 1.0]);
        assert_approx_eq!(prism.circumradius, (4.0 / 3.0 + 1.0_f64).sqrt());
    }

    #[test]
    fn test_join_planes() {
        let tetrahedron = planes_of("{}v{}");
        assert_eq!(tetrahedron.ndim, 3);
        assert_eq!(tetrahedron.planes.len(), 4);
        let regular = facet_planes_of_regular_polytope(&factor(&[3, 3])).expect("finite");
        for plane in &tetrahedron.planes {
            assert_approx_eq!(plane.distance(), regular.planes[0].distance());
        }
        assert_approx_eq!(tetrahedron.circumradius, regular.circumradius);

        let pyramid = planes_of("{3}v{}");
        assert_eq!(pyramid.ndim, 4);
        assert_eq!(pyramid.planes.len(), 5);
        assert_eq!(planes_of("{6}v{}").planes.len(), 8);
    }
}
