use eyre::{OptionExt, ensure};
use ndcube_math::collections::ApproxHashMap;
use ndcube_math::prelude::*;

use super::*;

/// Convex polytope built from a Schläfli product, along with the space it
/// lives in.
#[derive(Debug, Clone)]
pub struct Polytope {
    space: Space,
    root: ElementId,
    schlafli: SchlafliProduct,
    facet_planes: Vec<Hyperplane>,
    facets: Vec<ElementId>,
}

impl Polytope {
    /// Constructs a polytope by carving a large cube with every facet plane of
    /// a Schläfli product.
    pub fn from_schlafli_product(schlafli: &SchlafliProduct) -> ShapeResult<Self> {
        let ndim = schlafli.ndim();
        if ndim > MAX_NDIM as usize {
            return Err(ShapeError::TooManyDimensions {
                symbol: schlafli.to_string(),
                ndim: ndim.min(u8::MAX as usize) as u8,
                max: MAX_NDIM,
            });
        }
        let ndim = ndim as u8;

        let FacetPlanes {
            planes,
            circumradius,
            ..
        } = crate::facet_planes_of_product(schlafli)?;
        log::trace!(
            "carving {} with {} facet planes",
            schlafli.canonical(),
            planes.len(),
        );

        let (space, root, facet_planes, facets) = carve_polytope(ndim, &planes, circumradius)?;
        Ok(Self {
            space,
            root,
            schlafli: schlafli.clone(),
            facet_planes,
            facets,
        })
    }

    /// Returns the number of dimensions of the polytope.
    pub fn ndim(&self) -> u8 {
        self.space.ndim()
    }
    /// Returns the space containing the polytope.
    pub fn space(&self) -> &Space {
        &self.space
    }
    /// Returns the space containing the polytope, so that it can be sliced.
    pub fn space_mut(&mut self) -> &mut Space {
        &mut self.space
    }
    /// Returns the top-rank element of the polytope.
    pub fn root(&self) -> ElementId {
        self.root
    }
    /// Returns the Schläfli product that the polytope was built from.
    pub fn schlafli(&self) -> &SchlafliProduct {
        &self.schlafli
    }
    /// Returns the facets of the polytope, in the same order as
    /// [`Self::facet_planes()`].
    pub fn facets(&self) -> &[ElementId] {
        &self.facets
    }
    /// Returns the outward-facing hyperplanes of the facets of the polytope.
    pub fn facet_planes(&self) -> &[Hyperplane] {
        &self.facet_planes
    }
    /// Returns the positions of every vertex of the polytope.
    pub fn vertex_positions(&self) -> Vec<Vector> {
        self.space.vertex_positions(self.root)
    }
}

/// Carves a cube containing the ball of radius `circumradius` with each
/// plane and returns the resulting space, the root element, and the planes
/// that produced a facet along with those facets.
///
/// Planes that do not touch the result, such as the outer planes of a star
/// polygon's points, are dropped.
fn carve_polytope(
    ndim: u8,
    planes: &[Hyperplane],
    circumradius: Float,
) -> eyre::Result<(Space, ElementId, Vec<Hyperplane>, Vec<ElementId>)> {
    let max_distance = planes
        .iter()
        .map(|plane| plane.distance())
        .fold(circumradius, Float::max);

    let mut space = Space::new(ndim);
    let mut root = space.add_primordial_cube(2.0 * max_distance)?;
    for plane in planes {
        root = Cut::carve(plane.clone())
            .cut(&mut space, root)?
            .inside()
            .ok_or_eyre("polytope was carved away entirely")?;
    }

    let all_facets = space.subelements_with_rank(root, ndim - 1);
    ensure!(
        all_facets.iter().all(|&f| !space.element(f).is_primordial()),
        "polytope is unbounded",
    );

    let mut facet_of_plane = ApproxHashMap::new();
    for &f in &all_facets {
        facet_of_plane.insert(space.hyperplane_of_facet(f)?, f);
    }
    let mut facet_planes = vec![];
    let mut facets = vec![];
    for plane in planes {
        match facet_of_plane.get(plane) {
            Some(&facet) => {
                facet_planes.push(plane.clone());
                facets.push(facet);
            }
            None => log::debug!("dropping redundant facet plane {plane:?}"),
        }
    }
    ensure!(facets.len() == all_facets.len(), "polytope has unexpected facets");

    Ok((space, root, facet_planes, facets))
}
