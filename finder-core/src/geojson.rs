//! GeoJSON shapes returned to clients and read from county imports.

use chrono::{DateTime, Utc};
use geo::{LineString, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{County, SessionId, SessionRecord, Venue, VenueId};

type Position = [f64; 2];
type Ring = Vec<Position>;

/// The geometry member of a feature.
///
/// Only the shapes this service stores are modelled. Positions are
/// `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

/// Raised when a geometry does not have the shape a caller requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("expected {expected} geometry, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("polygon has no exterior ring")]
    MissingExterior,
}

impl Geometry {
    /// The GeoJSON type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Interpret the geometry as a point.
    pub fn into_point(self) -> Result<Point<f64>, GeometryError> {
        match self {
            Self::Point([x, y]) => Ok(Point::new(x, y)),
            other => Err(GeometryError::UnexpectedType {
                expected: "Point",
                found: other.type_name(),
            }),
        }
    }

    /// Interpret the geometry as an area, promoting a single polygon to a
    /// one-member multipolygon.
    pub fn into_multi_polygon(self) -> Result<MultiPolygon<f64>, GeometryError> {
        match self {
            Self::Polygon(rings) => Ok(MultiPolygon::new(vec![polygon_from_rings(rings)?])),
            Self::MultiPolygon(polygons) => polygons
                .into_iter()
                .map(polygon_from_rings)
                .collect::<Result<Vec<_>, _>>()
                .map(MultiPolygon::new),
            other @ Self::Point(_) => Err(GeometryError::UnexpectedType {
                expected: "Polygon or MultiPolygon",
                found: other.type_name(),
            }),
        }
    }

    /// Apply `transform` to every position, preserving the shape.
    #[must_use]
    pub fn map_positions(self, transform: impl Fn(Position) -> Position) -> Self {
        let ring = |ring: Ring| ring.into_iter().map(&transform).collect::<Ring>();
        match self {
            Self::Point(position) => Self::Point(transform(position)),
            Self::Polygon(rings) => Self::Polygon(rings.into_iter().map(ring).collect()),
            Self::MultiPolygon(polygons) => Self::MultiPolygon(
                polygons
                    .into_iter()
                    .map(|rings| rings.into_iter().map(ring).collect())
                    .collect(),
            ),
        }
    }
}

fn polygon_from_rings(rings: Vec<Ring>) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.into_iter().map(LineString::from);
    let exterior = rings.next().ok_or(GeometryError::MissingExterior)?;
    Ok(Polygon::new(exterior, rings.collect()))
}

fn ring_positions(ring: &LineString<f64>) -> Ring {
    ring.coords().map(|coord| [coord.x, coord.y]).collect()
}

impl From<Point<f64>> for Geometry {
    fn from(point: Point<f64>) -> Self {
        Self::Point([point.x(), point.y()])
    }
}

impl From<&MultiPolygon<f64>> for Geometry {
    fn from(area: &MultiPolygon<f64>) -> Self {
        Self::MultiPolygon(
            area.iter()
                .map(|polygon| {
                    std::iter::once(polygon.exterior())
                        .chain(polygon.interiors())
                        .map(ring_positions)
                        .collect()
                })
                .collect(),
        )
    }
}

/// Type tag of a single feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
    #[default]
    Feature,
}

/// Type tag of a feature collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionTag {
    #[default]
    FeatureCollection,
}

/// A GeoJSON feature with typed properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<P> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "type")]
    pub tag: FeatureTag,
    pub geometry: Geometry,
    pub properties: P,
}

impl<P> Feature<P> {
    /// Feature without a top-level id.
    pub fn new(geometry: Geometry, properties: P) -> Self {
        Self {
            id: None,
            tag: FeatureTag::Feature,
            geometry,
            properties,
        }
    }
}

/// The point a nearest-session search was measured from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A GeoJSON feature collection.
///
/// Nearest-session results additionally carry the `search_point` they were
/// measured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<P> {
    #[serde(rename = "type")]
    pub tag: CollectionTag,
    pub features: Vec<Feature<P>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_point: Option<SearchPoint>,
}

impl<P> FeatureCollection<P> {
    /// Collection without a search point.
    #[must_use]
    pub const fn new(features: Vec<Feature<P>>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
            search_point: None,
        }
    }
}

/// Properties of a session feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProperties {
    pub id: SessionId,
    pub title: String,
    pub description: String,
    pub game_system: String,
    pub points_level: String,
    pub is_open: bool,
    pub start_time: DateTime<Utc>,
    pub organiser: String,
    pub organiser_contact: String,
    pub current_players: u32,
    pub max_players: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    /// Metres from the search point, only set for nearest-session results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
}

/// Properties of a venue feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueProperties {
    pub id: VenueId,
    pub name: String,
}

/// Properties of a county feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyProperties {
    pub name: String,
    pub province: Option<String>,
}

/// Render a session as a point feature.
///
/// Returns `None` when neither the session nor its venue has a location;
/// such sessions are left off the map rather than drawn without geometry.
#[must_use]
pub fn session_feature(
    record: &SessionRecord,
    distance_m: Option<f64>,
) -> Option<Feature<SessionProperties>> {
    let location = record.effective_location()?;
    let session = &record.session;
    let properties = SessionProperties {
        id: session.id,
        title: session.title.clone(),
        description: session.description.clone(),
        game_system: session.game_system.clone(),
        points_level: session.points_level.clone(),
        is_open: session.is_open,
        start_time: session.start_time,
        organiser: session.organiser.clone(),
        organiser_contact: session.organiser_contact.clone(),
        current_players: session.current_players,
        max_players: session.max_players,
        venue_name: record.venue_name().map(str::to_owned),
        distance_m,
    };
    Some(Feature::new(Geometry::from(location), properties))
}

/// Render sessions as a collection, skipping those that cannot be placed.
#[must_use]
pub fn session_collection<'a>(
    records: impl IntoIterator<Item = &'a SessionRecord>,
) -> FeatureCollection<SessionProperties> {
    FeatureCollection::new(
        records
            .into_iter()
            .filter_map(|record| session_feature(record, None))
            .collect(),
    )
}

/// Render venues with a location as point features.
#[must_use]
pub fn venue_collection<'a>(
    venues: impl IntoIterator<Item = &'a Venue>,
) -> FeatureCollection<VenueProperties> {
    FeatureCollection::new(
        venues
            .into_iter()
            .filter_map(|venue| {
                venue.location.map(|location| {
                    Feature::new(
                        Geometry::from(location),
                        VenueProperties {
                            id: venue.id,
                            name: venue.name.clone(),
                        },
                    )
                })
            })
            .collect(),
    )
}

/// Render a county boundary with its id at the feature level.
#[must_use]
pub fn county_feature(county: &County) -> Feature<CountyProperties> {
    Feature {
        id: Some(county.id),
        ..Feature::new(
            Geometry::from(county.geometry.as_ref()),
            CountyProperties {
                name: county.name.clone(),
                province: county.province.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameSession;
    use geo::polygon;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn lower_house() -> Venue {
        Venue {
            id: 1,
            name: "lower house".into(),
            description: String::new(),
            location: Some(Point::new(-6.278_249, 53.352_439)),
        }
    }

    fn session(location: Option<Point<f64>>, venue_id: Option<VenueId>) -> GameSession {
        GameSession {
            id: 4,
            title: "game test 1".into(),
            description: String::new(),
            game_system: "Warhammer 40,000".into(),
            points_level: "1000pts".into(),
            organiser: "Sam".into(),
            organiser_contact: String::new(),
            start_time: DateTime::parse_from_rfc3339("2025-11-20T19:00:00Z")
                .map(|time| time.with_timezone(&Utc))
                .expect("valid timestamp"),
            max_players: 2,
            current_players: 1,
            is_open: true,
            location,
            venue_id,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn session_falls_back_to_venue_point(lower_house: Venue) {
        let record = SessionRecord {
            session: session(None, Some(1)),
            venue: Some(lower_house),
        };
        let feature = session_feature(&record, None).expect("placed session");
        let value = serde_json::to_value(&feature).expect("serialise feature");
        assert_eq!(value["geometry"]["coordinates"], json!([-6.278_249, 53.352_439]));
        assert_eq!(value["properties"]["venue_name"], "lower house");
        assert!(value["properties"].get("distance_m").is_none());
        assert!(value.get("id").is_none());
    }

    #[rstest]
    fn unplaced_session_is_skipped() {
        let record = SessionRecord {
            session: session(None, None),
            venue: None,
        };
        assert!(session_collection([&record]).features.is_empty());
    }

    #[rstest]
    fn session_without_venue_omits_venue_name() {
        let record = SessionRecord {
            session: session(Some(Point::new(-8.47, 51.9)), None),
            venue: None,
        };
        let value = serde_json::to_value(session_feature(&record, Some(12.5)))
            .expect("serialise feature");
        assert!(value["properties"].get("venue_name").is_none());
        assert_eq!(value["properties"]["distance_m"], json!(12.5));
        assert_eq!(value["properties"]["start_time"], "2025-11-20T19:00:00Z");
    }

    #[rstest]
    fn venues_without_location_are_skipped(lower_house: Venue) {
        let unplaced = Venue {
            id: 2,
            name: "somewhere".into(),
            description: String::new(),
            location: None,
        };
        let collection = venue_collection([&lower_house, &unplaced]);
        let value = serde_json::to_value(&collection).expect("serialise venues");
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [-6.278_249, 53.352_439]},
                    "properties": {"id": 1, "name": "lower house"},
                }],
            })
        );
    }

    #[rstest]
    fn polygon_is_promoted_to_multipolygon() {
        let geometry: Geometry = serde_json::from_value(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
        }))
        .expect("parse polygon");
        let area = geometry.into_multi_polygon().expect("area geometry");
        assert_eq!(area.0.len(), 1);
        assert_eq!(area.0[0].exterior().0.len(), 4);
    }

    #[rstest]
    fn point_is_not_an_area() {
        let err = Geometry::Point([0.0, 0.0])
            .into_multi_polygon()
            .expect_err("point rejected");
        assert!(matches!(err, GeometryError::UnexpectedType { found: "Point", .. }));
    }

    #[rstest]
    fn county_feature_round_trips_rings() {
        let area = MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ]]);
        let county = County {
            id: 12,
            name: "Dublin".into(),
            province: Some("Leinster".into()),
            geometry: std::sync::Arc::new(area.clone()),
        };
        let feature = county_feature(&county);
        assert_eq!(feature.id, Some(12));
        assert_eq!(feature.geometry.into_multi_polygon(), Ok(area));
    }
}
