//! Read operations behind the map endpoints.
//!
//! Each function loads what it needs from a [`GameStore`], applies a
//! [`SessionFilter`] and renders GeoJSON or plain label lists.

use std::collections::{BTreeSet, HashSet};

use geo::Point;

use crate::{
    BoundingBox, County, CountyIndex, FeatureCollection, GameStore, SearchPoint, SessionFilter,
    SessionProperties, StoreError,
    geojson::{
        CountyProperties, Feature, VenueProperties, county_feature, session_collection,
        session_feature, venue_collection,
    },
    spatial::{distance_metres, round_metres},
};

/// Number of sessions returned by a nearest search without an explicit
/// limit.
pub const DEFAULT_NEAREST_LIMIT: usize = 10;

/// Attribute filters shared by the session endpoints.
///
/// Blank strings disable their filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQuery {
    /// Free-text search over title, description, game system and venue name.
    pub text: String,
    /// Exact game system label.
    pub game_system: String,
    pub open_only: bool,
    /// Province label matched case-insensitively against counties.
    pub province: String,
}

impl SessionQuery {
    fn filter<S>(&self, store: &S) -> Result<SessionFilter, StoreError>
    where
        S: GameStore + ?Sized,
    {
        let counties = province_counties(store, &self.province)?;
        Ok(SessionFilter::new()
            .text(&self.text)
            .game_system(&self.game_system)
            .open_only(self.open_only)
            .province(&counties))
    }
}

/// Parameters of a nearest-session search.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestQuery {
    /// Search origin with `x = longitude` and `y = latitude`.
    pub origin: Point<f64>,
    pub limit: usize,
    pub filters: SessionQuery,
}

impl NearestQuery {
    /// Search from `origin` with the default limit and no filters.
    #[must_use]
    pub fn new(origin: Point<f64>) -> Self {
        Self {
            origin,
            limit: DEFAULT_NEAREST_LIMIT,
            filters: SessionQuery::default(),
        }
    }
}

/// Counties whose province matches `province`, ignoring case and
/// surrounding whitespace. A blank province selects nothing.
pub fn province_counties<S>(store: &S, province: &str) -> Result<Vec<County>, StoreError>
where
    S: GameStore + ?Sized,
{
    let province = province.trim();
    if province.is_empty() {
        return Ok(Vec::new());
    }
    let counties: Vec<County> = store
        .counties()?
        .into_iter()
        .filter(|county| county.in_province(province))
        .collect();
    if counties.is_empty() {
        log::debug!("province '{province}' matched no counties; ignoring filter");
    }
    Ok(counties)
}

/// Filtered sessions as GeoJSON.
pub fn sessions_geojson<S>(
    store: &S,
    query: &SessionQuery,
) -> Result<FeatureCollection<SessionProperties>, StoreError>
where
    S: GameStore + ?Sized,
{
    let filter = query.filter(store)?;
    let records = filter.apply(store.sessions()?);
    Ok(session_collection(&records))
}

/// Filtered sessions whose own point or venue point lies within `bbox`.
///
/// A session matching through both of its points is reported once.
pub fn sessions_in_bbox<S>(
    store: &S,
    bbox: &BoundingBox,
    query: &SessionQuery,
) -> Result<FeatureCollection<SessionProperties>, StoreError>
where
    S: GameStore + ?Sized,
{
    let filter = query.filter(store)?.within(&bbox.to_region());
    let mut seen = HashSet::new();
    let records: Vec<_> = filter
        .apply(store.sessions()?)
        .into_iter()
        .filter(|record| seen.insert(record.session.id))
        .collect();
    Ok(session_collection(&records))
}

/// Sessions with a location of their own, closest first.
///
/// Filters are applied before truncating to `limit`. Each feature carries
/// its distance from the origin in metres, and the collection echoes the
/// origin as `search_point`.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use finder_core::{GameStore, NearestQuery, NewGameSession, SqliteGameStore, query};
/// use geo::Point;
///
/// let store = SqliteGameStore::open_in_memory().expect("open store");
/// store
///     .insert_session(NewGameSession::new("Kill Team", "Sam", Utc::now()).at(Point::new(-6.27, 53.35)))
///     .expect("insert session");
///
/// let mut nearest = NearestQuery::new(Point::new(-6.27, 53.35));
/// nearest.limit = 1;
/// let found = query::nearest_sessions(&store, &nearest).expect("query");
/// assert_eq!(found.features.len(), 1);
/// assert_eq!(found.features[0].properties.distance_m, Some(0.0));
/// ```
pub fn nearest_sessions<S>(
    store: &S,
    nearest: &NearestQuery,
) -> Result<FeatureCollection<SessionProperties>, StoreError>
where
    S: GameStore + ?Sized,
{
    let filter = nearest.filters.filter(store)?.with_own_location();
    let mut ranked: Vec<_> = filter
        .apply(store.sessions()?)
        .into_iter()
        .filter_map(|record| {
            record
                .session
                .location
                .map(|location| (distance_metres(nearest.origin, location), record))
        })
        .collect();
    ranked.sort_by(|(left, left_record), (right, right_record)| {
        left.total_cmp(right)
            .then(left_record.session.id.cmp(&right_record.session.id))
    });
    ranked.truncate(nearest.limit);

    let mut collection = FeatureCollection::new(
        ranked
            .iter()
            .filter_map(|(distance, record)| session_feature(record, Some(round_metres(*distance))))
            .collect(),
    );
    collection.search_point = Some(SearchPoint {
        lat: nearest.origin.y(),
        lng: nearest.origin.x(),
    });
    Ok(collection)
}

/// Sorted, de-duplicated non-empty game system labels.
pub fn distinct_game_systems<S>(store: &S) -> Result<Vec<String>, StoreError>
where
    S: GameStore + ?Sized,
{
    let systems: BTreeSet<String> = store
        .sessions()?
        .into_iter()
        .map(|record| record.session.game_system)
        .filter(|system| !system.is_empty())
        .collect();
    Ok(systems.into_iter().collect())
}

/// Venues that have a location, as GeoJSON.
pub fn venues_geojson<S>(store: &S) -> Result<FeatureCollection<VenueProperties>, StoreError>
where
    S: GameStore + ?Sized,
{
    Ok(venue_collection(&store.venues()?))
}

/// The county containing `point`, or `None` when no county covers or
/// touches it.
pub fn county_for_point<S>(
    store: &S,
    point: &Point<f64>,
) -> Result<Option<Feature<CountyProperties>>, StoreError>
where
    S: GameStore + ?Sized,
{
    let counties = store.counties()?;
    let index = CountyIndex::new(&counties);
    Ok(index.locate(point).map(county_feature))
}

/// Sorted, de-duplicated non-empty province labels.
pub fn distinct_provinces<S>(store: &S) -> Result<Vec<String>, StoreError>
where
    S: GameStore + ?Sized,
{
    let provinces: BTreeSet<String> = store
        .counties()?
        .into_iter()
        .filter_map(|county| county.province)
        .filter(|province| !province.is_empty())
        .collect();
    Ok(provinces.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewCounty, NewGameSession, NewVenue, test_support::MemoryStore};
    use chrono::Utc;
    use geo::{MultiPolygon, polygon};
    use rstest::{fixture, rstest};

    fn dublin() -> NewCounty {
        NewCounty {
            name: "Dublin".into(),
            province: Some("Leinster".into()),
            geometry: MultiPolygon::new(vec![polygon![
                (x: -6.5, y: 53.2),
                (x: -6.0, y: 53.2),
                (x: -6.0, y: 53.6),
                (x: -6.5, y: 53.6),
                (x: -6.5, y: 53.2),
            ]]),
        }
    }

    fn cork() -> NewCounty {
        NewCounty {
            name: "Cork".into(),
            province: Some("Munster".into()),
            geometry: MultiPolygon::new(vec![polygon![
                (x: -9.0, y: 51.5),
                (x: -8.0, y: 51.5),
                (x: -8.0, y: 52.2),
                (x: -9.0, y: 52.2),
                (x: -9.0, y: 51.5),
            ]]),
        }
    }

    /// Two Dublin sessions at a venue, one open session in Cork and one
    /// session with no location at all.
    #[fixture]
    fn store() -> MemoryStore {
        let store = MemoryStore::with_counties([dublin(), cork()]);
        let venue = store
            .insert_venue(NewVenue::new("lower house").at(Point::new(-6.278_249, 53.352_439)))
            .expect("insert venue");
        let now = Utc::now();
        for title in ["game test 1", "game test 2"] {
            store
                .insert_session(NewGameSession::new(title, "Sam", now).with_venue(venue.id))
                .expect("insert dublin session");
        }
        store
            .insert_session(
                NewGameSession::new("Cork Kill Team", "Ann", now)
                    .with_game_system("Kill Team")
                    .at(Point::new(-8.47, 51.9)),
            )
            .expect("insert cork session");
        store
            .insert_session(NewGameSession::new("Nowhere", "Bob", now).open(false))
            .expect("insert unplaced session");
        store
    }

    fn titles(collection: &FeatureCollection<SessionProperties>) -> Vec<&str> {
        collection
            .features
            .iter()
            .map(|feature| feature.properties.title.as_str())
            .collect()
    }

    #[rstest]
    fn geojson_skips_unplaced_sessions(store: MemoryStore) {
        let all = sessions_geojson(&store, &SessionQuery::default()).expect("query");
        assert_eq!(titles(&all), ["game test 1", "game test 2", "Cork Kill Team"]);
    }

    #[rstest]
    fn text_search_reaches_venue_name(store: MemoryStore) {
        let query = SessionQuery {
            text: "LOWER".into(),
            ..SessionQuery::default()
        };
        let found = sessions_geojson(&store, &query).expect("query");
        assert_eq!(titles(&found), ["game test 1", "game test 2"]);
    }

    #[rstest]
    #[case("munster", vec!["Cork Kill Team"])]
    #[case(" Leinster ", vec!["game test 1", "game test 2"])]
    #[case("Atlantis", vec!["game test 1", "game test 2", "Cork Kill Team"])]
    fn province_filter(store: MemoryStore, #[case] province: &str, #[case] expected: Vec<&str>) {
        let query = SessionQuery {
            province: province.into(),
            ..SessionQuery::default()
        };
        let found = sessions_geojson(&store, &query).expect("query");
        assert_eq!(titles(&found), expected);
    }

    #[rstest]
    fn bbox_limits_to_dublin(store: MemoryStore) {
        let bbox = BoundingBox {
            west: -6.4,
            south: 53.3,
            east: -6.2,
            north: 53.4,
        };
        let found = sessions_in_bbox(&store, &bbox, &SessionQuery::default()).expect("query");
        assert_eq!(titles(&found), ["game test 1", "game test 2"]);
    }

    #[rstest]
    fn nearest_orders_and_truncates(store: MemoryStore) {
        let mut nearest = NearestQuery::new(Point::new(-6.27, 53.35));
        nearest.limit = 2;
        let found = nearest_sessions(&store, &nearest).expect("query");
        assert_eq!(titles(&found), ["game test 1", "game test 2"]);
        assert_eq!(
            found.search_point,
            Some(SearchPoint {
                lat: 53.35,
                lng: -6.27
            })
        );
        let distance = found.features[0].properties.distance_m.expect("distance");
        assert!(distance > 0.0 && distance < 1_000.0, "got {distance}");
    }

    #[rstest]
    fn nearest_applies_filters_before_limit(store: MemoryStore) {
        let mut nearest = NearestQuery::new(Point::new(-6.27, 53.35));
        nearest.limit = 1;
        nearest.filters.game_system = "Kill Team".into();
        let found = nearest_sessions(&store, &nearest).expect("query");
        assert_eq!(titles(&found), ["Cork Kill Team"]);
    }

    #[rstest]
    fn zero_limit_is_empty(store: MemoryStore) {
        let mut nearest = NearestQuery::new(Point::new(-6.27, 53.35));
        nearest.limit = 0;
        let found = nearest_sessions(&store, &nearest).expect("query");
        assert!(found.features.is_empty());
        assert!(found.search_point.is_some());
    }

    #[rstest]
    fn distinct_systems_are_sorted(store: MemoryStore) {
        assert_eq!(
            distinct_game_systems(&store).expect("query"),
            ["Kill Team", "Warhammer 40,000"]
        );
    }

    #[rstest]
    fn county_lookup(store: MemoryStore) {
        let feature = county_for_point(&store, &Point::new(-6.26, 53.35))
            .expect("query")
            .expect("inside Dublin");
        assert_eq!(feature.properties.name, "Dublin");
        assert_eq!(feature.properties.province.as_deref(), Some("Leinster"));
        assert!(
            county_for_point(&store, &Point::new(0.0, 0.0))
                .expect("query")
                .is_none()
        );
    }

    #[rstest]
    fn provinces_are_sorted(store: MemoryStore) {
        store
            .replace_counties(vec![
                cork(),
                dublin(),
                NewCounty {
                    province: Some(String::new()),
                    ..dublin()
                },
                NewCounty {
                    province: None,
                    ..cork()
                },
            ])
            .expect("replace counties");
        assert_eq!(
            distinct_provinces(&store).expect("query"),
            ["Leinster", "Munster"]
        );
    }
}
