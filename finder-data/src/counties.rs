//! County boundary import from an ITM GeoJSON export.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use finder_core::{GameStore, Geometry, GeometryError, NewCounty, StoreError};
use log::{info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ItmToWgs84;

const UNKNOWN_COUNTY: &str = "Unknown";

/// Errors raised while importing county boundaries.
#[derive(Debug, Error)]
pub enum CountyImportError {
    #[error("county file not found: {path}")]
    NotFound { path: Utf8PathBuf },
    #[error("failed to read county file {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse county GeoJSON")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("no features in the county GeoJSON")]
    Empty,
    #[error("feature {index} has unusable geometry")]
    Geometry {
        index: usize,
        #[source]
        source: GeometryError,
    },
    #[error("failed to store counties")]
    Store(#[from] StoreError),
}

/// Outcome of a county import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountyImport {
    /// Counties written to the store.
    pub inserted: usize,
    /// Features left out because they had no geometry.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct SourceCollection {
    #[serde(default)]
    features: Vec<SourceFeature>,
}

#[derive(Debug, Deserialize)]
struct SourceFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

/// First non-empty string among `keys`.
fn text_property<'a>(properties: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| properties.get(*key).and_then(Value::as_str))
        .find(|value| !value.is_empty())
}

/// Parse an ITM feature collection into WGS84 county drafts.
///
/// Returns the drafts together with the number of features skipped for
/// lacking geometry.
///
/// # Errors
/// Fails on malformed JSON, an empty feature list, or a geometry that is
/// neither a polygon nor a multipolygon.
pub fn parse_counties(source: &str) -> Result<(Vec<NewCounty>, usize), CountyImportError> {
    let collection: SourceCollection =
        serde_json::from_str(source).map_err(|source| CountyImportError::Parse { source })?;
    if collection.features.is_empty() {
        return Err(CountyImportError::Empty);
    }

    let itm = ItmToWgs84::new();
    let mut skipped = 0;
    let mut counties = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            skipped += 1;
            continue;
        };
        let properties = feature.properties.unwrap_or_default();
        let name = text_property(&properties, &["COUNTY", "ENGLISH"]).unwrap_or(UNKNOWN_COUNTY);
        let province = text_property(&properties, &["PROVINCE"]).map_or("", str::trim);
        let area = geometry
            .map_positions(|position| itm.convert_position(position))
            .into_multi_polygon()
            .map_err(|source| CountyImportError::Geometry { index, source })?;
        counties.push(NewCounty {
            name: name.to_owned(),
            province: Some(province.to_owned()),
            geometry: area,
        });
    }
    Ok((counties, skipped))
}

/// Replace the stored counties with those in the GeoJSON file at `path`.
///
/// # Errors
/// Fails when the file is missing or unreadable, when parsing fails, or when
/// the store rejects the write. The stored counties are left untouched on
/// failure.
pub fn load_counties<S>(store: &S, path: &Utf8Path) -> Result<CountyImport, CountyImportError>
where
    S: GameStore + ?Sized,
{
    let read_error = |source| CountyImportError::Read {
        path: path.to_path_buf(),
        source,
    };
    if !finder_fs::is_regular_file(path).map_err(read_error)? {
        return Err(CountyImportError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let source = finder_fs::read_text_file(path).map_err(read_error)?;
    let (counties, skipped) = parse_counties(&source)?;
    if skipped > 0 {
        warn!("skipped {skipped} county features without geometry");
    }
    let inserted = store.replace_counties(counties)?;
    info!("inserted {inserted} counties from {path} (EPSG:2157 to WGS84)");
    Ok(CountyImport { inserted, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn square(min_e: f64, min_n: f64, size: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [min_e, min_n],
                [min_e + size, min_n],
                [min_e + size, min_n + size],
                [min_e, min_n + size],
                [min_e, min_n],
            ]],
        })
    }

    #[rstest]
    fn names_fall_back_in_order() {
        let source = json!({
            "type": "FeatureCollection",
            "features": [
                {"properties": {"COUNTY": "DUBLIN", "ENGLISH": "Dublin", "PROVINCE": " Leinster "},
                 "geometry": square(700_000.0, 730_000.0, 10_000.0)},
                {"properties": {"COUNTY": "", "ENGLISH": "Cork", "PROVINCE": "Munster"},
                 "geometry": square(560_000.0, 560_000.0, 10_000.0)},
                {"properties": {}, "geometry": square(600_000.0, 750_000.0, 10_000.0)},
            ],
        })
        .to_string();
        let (counties, skipped) = parse_counties(&source).expect("parse counties");
        assert_eq!(skipped, 0);
        let labels: Vec<_> = counties
            .iter()
            .map(|county| (county.name.as_str(), county.province.as_deref()))
            .collect();
        assert_eq!(
            labels,
            [
                ("DUBLIN", Some("Leinster")),
                ("Cork", Some("Munster")),
                (UNKNOWN_COUNTY, Some("")),
            ]
        );
    }

    #[rstest]
    fn features_without_geometry_are_skipped() {
        let source = json!({
            "features": [
                {"properties": {"COUNTY": "Nowhere"}, "geometry": null},
                {"properties": {"COUNTY": "Dublin"}, "geometry": square(700_000.0, 730_000.0, 1_000.0)},
            ],
        })
        .to_string();
        let (counties, skipped) = parse_counties(&source).expect("parse counties");
        assert_eq!((counties.len(), skipped), (1, 1));
    }

    #[rstest]
    fn vertices_are_projected_to_degrees() {
        let source = json!({
            "features": [{"properties": {"COUNTY": "Dublin"}, "geometry": square(700_000.0, 730_000.0, 20_000.0)}],
        })
        .to_string();
        let (counties, _) = parse_counties(&source).expect("parse counties");
        let exterior = counties[0].geometry.0[0].exterior();
        for coord in exterior.coords() {
            assert!((-6.6..-6.0).contains(&coord.x), "longitude {}", coord.x);
            assert!((53.2..53.6).contains(&coord.y), "latitude {}", coord.y);
        }
    }

    #[rstest]
    #[case(json!({"features": []}))]
    #[case(json!({"type": "FeatureCollection"}))]
    fn empty_collections_are_rejected(#[case] source: Value) {
        let err = parse_counties(&source.to_string()).expect_err("empty collection");
        assert!(matches!(err, CountyImportError::Empty));
    }

    #[rstest]
    fn point_features_are_rejected() {
        let source = json!({
            "features": [{"properties": {}, "geometry": {"type": "Point", "coordinates": [600_000.0, 750_000.0]}}],
        })
        .to_string();
        let err = parse_counties(&source).expect_err("point geometry");
        assert!(matches!(err, CountyImportError::Geometry { index: 0, .. }));
    }
}
