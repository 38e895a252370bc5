//! Query-string and body parameter parsing.

use axum::{
    Form, Json,
    extract::{FromRequest, Path, Request, rejection::PathRejection},
    http::header::CONTENT_TYPE,
};
use finder_core::{BoundingBox, DEFAULT_NEAREST_LIMIT, NearestQuery, SessionQuery};
use geo::Point;
use serde::Deserialize;
use serde_json::Value;

use crate::ApiError;

pub(crate) const BBOX_REQUIRED: &str = "west, south, east, north are required as floats";
pub(crate) const NEAREST_REQUIRED: &str = "lat and lng are required and must be numbers";
pub(crate) const POINT_REQUIRED: &str = "lat and lng are required";
pub(crate) const POINT_NOT_NUMERIC: &str = "lat and lng must be numbers";

const FALSY: [&str; 4] = ["0", "false", "no", "off"];
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decoded query-string or form pairs, in request order.
pub(crate) type Pairs = Vec<(String, String)>;

/// The value given for `key`; when repeated, the last one wins.
fn last<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn last_owned(pairs: &[(String, String)], key: &str) -> Option<String> {
    last(pairs, key).map(str::to_owned)
}

/// Whether a query-string flag is set.
pub(crate) fn truthy(raw: &str) -> bool {
    let raw = raw.trim();
    !raw.is_empty() && !FALSY.iter().any(|falsy| raw.eq_ignore_ascii_case(falsy))
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Unknown or malformed ids answer 404 like a missing row.
pub(crate) fn path_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    id.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

/// Filters shared by the session map endpoints.
#[derive(Debug, Default)]
pub(crate) struct FilterParams {
    q: String,
    system: String,
    open: String,
    province: String,
}

impl FilterParams {
    pub(crate) fn from_pairs(pairs: &[(String, String)]) -> Self {
        let field = |key| last(pairs, key).unwrap_or_default().to_owned();
        Self {
            q: field("q"),
            system: field("system"),
            open: field("open"),
            province: field("province"),
        }
    }

    pub(crate) fn into_query(self) -> SessionQuery {
        SessionQuery {
            text: self.q.trim().to_owned(),
            game_system: self.system.trim().to_owned(),
            open_only: truthy(&self.open),
            province: self.province.trim().to_owned(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BboxParams {
    west: Option<String>,
    south: Option<String>,
    east: Option<String>,
    north: Option<String>,
    filters: FilterParams,
}

impl BboxParams {
    pub(crate) fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            west: last_owned(pairs, "west"),
            south: last_owned(pairs, "south"),
            east: last_owned(pairs, "east"),
            north: last_owned(pairs, "north"),
            filters: FilterParams::from_pairs(pairs),
        }
    }

    pub(crate) fn into_parts(self) -> Result<(BoundingBox, SessionQuery), ApiError> {
        let edge = |raw: Option<&String>| {
            raw.and_then(|raw| parse_float(raw))
                .ok_or(ApiError::BadRequest(BBOX_REQUIRED))
        };
        let bbox = BoundingBox {
            west: edge(self.west.as_ref())?,
            south: edge(self.south.as_ref())?,
            east: edge(self.east.as_ref())?,
            north: edge(self.north.as_ref())?,
        };
        Ok((bbox, self.filters.into_query()))
    }
}

#[derive(Debug, Default)]
pub(crate) struct PointParams {
    lat: Option<String>,
    lng: Option<String>,
}

impl PointParams {
    pub(crate) fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            lat: last_owned(pairs, "lat"),
            lng: last_owned(pairs, "lng"),
        }
    }

    /// The requested point with `x = lng` and `y = lat`.
    pub(crate) fn point(&self) -> Result<Point<f64>, ApiError> {
        fn present(raw: Option<&String>) -> Option<&str> {
            raw.map(String::as_str).filter(|raw| !raw.is_empty())
        }
        let (Some(lat), Some(lng)) = (present(self.lat.as_ref()), present(self.lng.as_ref()))
        else {
            return Err(ApiError::BadRequest(POINT_REQUIRED));
        };
        match (parse_float(lat), parse_float(lng)) {
            (Some(lat), Some(lng)) => Ok(Point::new(lng, lat)),
            _ => Err(ApiError::BadRequest(POINT_NOT_NUMERIC)),
        }
    }
}

/// Body of a nearest-session search, sent as JSON or as a urlencoded
/// form. Fields stay loosely typed so numeric strings and missing values
/// can be told apart.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct NearestBody {
    lat: Value,
    lng: Value,
    limit: Value,
    system: Value,
    open: Value,
    province: Value,
}

impl NearestBody {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        let field = |key| last(pairs, key).map_or(Value::Null, |raw| Value::String(raw.to_owned()));
        Self {
            lat: field("lat"),
            lng: field("lng"),
            limit: field("limit"),
            system: field("system"),
            open: field("open"),
            province: field("province"),
        }
    }

    pub(crate) fn into_query(self) -> Result<NearestQuery, ApiError> {
        let (Some(lat), Some(lng)) = (number(&self.lat), number(&self.lng)) else {
            return Err(ApiError::BadRequest(NEAREST_REQUIRED));
        };
        Ok(NearestQuery {
            origin: Point::new(lng, lat),
            limit: limit(&self.limit),
            filters: SessionQuery {
                text: String::new(),
                game_system: text(&self.system),
                open_only: flag(&self.open),
                province: text(&self.province),
            },
        })
    }
}

impl<S> FromRequest<S> for NearestBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));
        if is_form {
            let Form(pairs) = Form::<Pairs>::from_request(request, state)
                .await
                .map_err(|_| ApiError::BadRequest(NEAREST_REQUIRED))?;
            Ok(Self::from_pairs(&pairs))
        } else {
            let Json(body) = Json::<Self>::from_request(request, state)
                .await
                .map_err(|_| ApiError::BadRequest(NEAREST_REQUIRED))?;
            Ok(body)
        }
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        Value::String(raw) => parse_float(raw),
        _ => None,
    }
}

/// Whole-number conversion: JSON numbers truncate toward zero and booleans
/// count as 0 or 1; strings must hold an integer. Negative or unreadable
/// values fall back to the default.
fn limit(value: &Value) -> usize {
    let parsed = match value {
        Value::Bool(flag) => Some(u64::from(*flag)),
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .map(f64::trunc)
                .filter(|whole| (0.0..=f64::from(u32::MAX)).contains(whole))
                .map(|whole| whole as u64)
        }),
        Value::String(raw) => raw.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|limit| usize::try_from(limit).ok())
        .unwrap_or(DEFAULT_NEAREST_LIMIT)
}

fn text(value: &Value) -> String {
    value.as_str().map(str::trim).unwrap_or_default().to_owned()
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|value| value != 0.0),
        Value::String(raw) => truthy(raw),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
