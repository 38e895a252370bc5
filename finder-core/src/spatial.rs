//! Spatial relations evaluated against session and venue points.
//!
//! The relations follow the OGC definitions for a point tested against an
//! area: `Within` excludes the boundary, `CoveredBy` includes it and
//! `Intersects` accepts any contact. For a single point the last two agree;
//! both are kept so predicates read the same way as the queries they
//! express.

use std::{fmt, sync::Arc};

use geo::{
    BoundingRect, Contains, Coord, Distance, Geodesic, Intersects, MultiPolygon, Point, Rect,
};
use rstar::{AABB, RTree, RTreeObject};

use crate::County;

/// How a point must relate to a [`Region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRelation {
    /// Strictly inside; boundary points do not count.
    Within,
    /// Inside or on the boundary.
    CoveredBy,
    /// Any contact with the region.
    Intersects,
}

impl SpatialRelation {
    /// Test `point` against `region` under this relation.
    #[must_use]
    pub fn holds(self, region: &Region, point: &Point<f64>) -> bool {
        match region {
            Region::Rect(rect) => self.holds_for_rect(rect, point),
            Region::Area(area) => self.holds_for_area(area, point),
        }
    }

    fn holds_for_rect(self, rect: &Rect<f64>, point: &Point<f64>) -> bool {
        match self {
            Self::Within => rect.contains(point),
            Self::CoveredBy | Self::Intersects => rect.intersects(point),
        }
    }

    pub(crate) fn holds_for_area(self, area: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
        match self {
            Self::Within => area.contains(point),
            Self::CoveredBy => area.contains(point) || on_boundary(area, point),
            Self::Intersects => area.intersects(point),
        }
    }
}

fn on_boundary(area: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
    area.iter().any(|polygon| {
        polygon.exterior().intersects(point)
            || polygon.interiors().iter().any(|ring| ring.intersects(point))
    })
}

/// An area a point can be tested against.
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    /// Axis-aligned rectangle in lon/lat space.
    Rect(Rect<f64>),
    /// Arbitrary polygonal area, typically a county boundary.
    Area(Arc<MultiPolygon<f64>>),
}

/// Rectangle given by its western, southern, eastern and northern edges.
///
/// Edges are degrees of longitude/latitude. Corners are normalised when the
/// box is turned into a [`Region`], so a swapped pair still describes the
/// same rectangle. Boxes crossing the antimeridian are not modelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// The box as an axis-aligned rectangle.
    #[must_use]
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.west,
                y: self.south,
            },
            Coord {
                x: self.east,
                y: self.north,
            },
        )
    }

    /// The box as a region for predicate evaluation.
    #[must_use]
    pub fn to_region(&self) -> Region {
        Region::Rect(self.to_rect())
    }
}

/// Geodesic distance in metres on the WGS84 ellipsoid.
#[must_use]
pub fn distance_metres(from: Point<f64>, to: Point<f64>) -> f64 {
    Geodesic.distance(from, to)
}

/// Round a distance to centimetre precision for presentation.
#[must_use]
pub fn round_metres(metres: f64) -> f64 {
    (metres * 100.0).round() / 100.0
}

/// Envelope of one county held in the R\*-tree.
#[derive(Debug, Clone)]
struct CountyEnvelope {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for CountyEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Point-in-county lookup accelerated by an R\*-tree over county envelopes.
///
/// Envelope hits are only candidates; the exact relation is evaluated
/// against the county geometry. Candidates are examined in ascending id
/// order so lookups are deterministic when boundaries overlap.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use finder_core::{County, CountyIndex};
/// use geo::{MultiPolygon, Point, polygon};
///
/// let square = polygon![
///     (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0),
/// ];
/// let counties = vec![County {
///     id: 1,
///     name: "Dublin".into(),
///     province: Some("Leinster".into()),
///     geometry: Arc::new(MultiPolygon::new(vec![square])),
/// }];
/// let index = CountyIndex::new(&counties);
/// let found = index.locate(&Point::new(0.5, 0.5)).map(|county| county.name.as_str());
/// assert_eq!(found, Some("Dublin"));
/// ```
pub struct CountyIndex<'a> {
    counties: &'a [County],
    tree: RTree<CountyEnvelope>,
}

impl fmt::Debug for CountyIndex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountyIndex")
            .field("entries", &self.tree.size())
            .finish_non_exhaustive()
    }
}

impl<'a> CountyIndex<'a> {
    /// Build an index over the given counties. Counties with empty geometry
    /// are never returned.
    #[must_use]
    pub fn new(counties: &'a [County]) -> Self {
        let entries = counties
            .iter()
            .enumerate()
            .filter_map(|(position, county)| {
                county.geometry.bounding_rect().map(|rect| CountyEnvelope {
                    position,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();
        Self {
            counties,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Counties whose envelope contains the point, by ascending id.
    fn candidates(&self, point: &Point<f64>) -> Vec<&'a County> {
        let envelope = AABB::from_point([point.x(), point.y()]);
        let mut found: Vec<&County> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| self.counties.get(entry.position))
            .collect();
        found.sort_unstable_by_key(|county| county.id);
        found
    }

    /// The county covering the point, falling back to any county the point
    /// intersects when no county covers it.
    #[must_use]
    pub fn locate(&self, point: &Point<f64>) -> Option<&'a County> {
        let candidates = self.candidates(point);
        candidates
            .iter()
            .find(|county| county.covers(point))
            .or_else(|| candidates.iter().find(|county| county.intersects(point)))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use rstest::{fixture, rstest};

    fn square(id: i64, min: f64, max: f64) -> County {
        let ring = polygon![
            (x: min, y: min),
            (x: max, y: min),
            (x: max, y: max),
            (x: min, y: max),
            (x: min, y: min),
        ];
        County {
            id,
            name: format!("county-{id}"),
            province: Some("Leinster".into()),
            geometry: Arc::new(MultiPolygon::new(vec![ring])),
        }
    }

    #[fixture]
    fn rect() -> Region {
        BoundingBox {
            west: -1.0,
            south: -1.0,
            east: 1.0,
            north: 1.0,
        }
        .to_region()
    }

    #[rstest]
    #[case(SpatialRelation::Within, Point::new(0.0, 0.0), true)]
    #[case(SpatialRelation::Within, Point::new(1.0, 0.0), false)]
    #[case(SpatialRelation::CoveredBy, Point::new(1.0, 0.0), true)]
    #[case(SpatialRelation::Intersects, Point::new(1.0, 1.0), true)]
    #[case(SpatialRelation::Intersects, Point::new(1.5, 0.0), false)]
    fn rect_relations(
        rect: Region,
        #[case] relation: SpatialRelation,
        #[case] point: Point<f64>,
        #[case] expected: bool,
    ) {
        assert_eq!(relation.holds(&rect, &point), expected);
    }

    #[rstest]
    fn swapped_corners_describe_same_box() {
        let swapped = BoundingBox {
            west: 1.0,
            south: 1.0,
            east: -1.0,
            north: -1.0,
        };
        assert!(SpatialRelation::Within.holds(&swapped.to_region(), &Point::new(0.0, 0.0)));
    }

    #[rstest]
    fn area_boundary_is_covered_but_not_within() {
        let county = square(1, 0.0, 1.0);
        let region = Region::Area(Arc::clone(&county.geometry));
        let edge = Point::new(0.0, 0.5);
        assert!(!SpatialRelation::Within.holds(&region, &edge));
        assert!(SpatialRelation::CoveredBy.holds(&region, &edge));
        assert!(SpatialRelation::Intersects.holds(&region, &edge));
    }

    #[rstest]
    fn index_prefers_lowest_id_on_overlap() {
        let counties = vec![square(7, 0.0, 2.0), square(3, 1.0, 3.0)];
        let index = CountyIndex::new(&counties);
        let found = index.locate(&Point::new(1.5, 1.5)).map(|county| county.id);
        assert_eq!(found, Some(3));
    }

    #[rstest]
    fn index_returns_none_outside_every_county() {
        let counties = vec![square(1, 0.0, 1.0)];
        let index = CountyIndex::new(&counties);
        assert!(index.locate(&Point::new(5.0, 5.0)).is_none());
    }

    #[rstest]
    fn index_finds_point_on_shared_edge() {
        let counties = vec![square(1, 0.0, 1.0), square(2, 1.0, 2.0)];
        let index = CountyIndex::new(&counties);
        let found = index.locate(&Point::new(1.0, 1.0)).map(|county| county.id);
        assert_eq!(found, Some(1));
    }

    #[rstest]
    fn distance_is_zero_for_same_point() {
        let point = Point::new(-6.27, 53.35);
        assert!(distance_metres(point, point).abs() < 1e-6);
    }

    #[rstest]
    fn one_degree_of_latitude_is_roughly_111_km() {
        let metres = distance_metres(Point::new(-6.0, 53.0), Point::new(-6.0, 54.0));
        assert!((111_000.0..111_500.0).contains(&metres), "got {metres}");
    }

    #[rstest]
    #[case(12.345_6, 12.35)]
    #[case(0.004, 0.0)]
    #[case(100.0, 100.0)]
    fn rounds_to_centimetres(#[case] input: f64, #[case] expected: f64) {
        assert!((round_metres(input) - expected).abs() < 1e-9);
    }
}
