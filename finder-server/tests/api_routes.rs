//! In-process HTTP tests for the router.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use finder_core::{GameStore, NewCounty, NewVenue, test_support::MemoryStore};
use finder_server::{AppState, router};
use geo::{MultiPolygon, Point, polygon};
use http_body_util::BodyExt;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tower::ServiceExt;

const LOWER_HOUSE: (f64, f64) = (-6.278_249, 53.352_439);

struct TestApp {
    router: Router,
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }
}

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

/// A store holding the lower house venue and the Dublin county.
#[fixture]
fn app() -> TestApp {
    let store = MemoryStore::with_counties([dublin()]);
    let (lng, lat) = LOWER_HOUSE;
    store
        .insert_venue(NewVenue::new("lower house").at(Point::new(lng, lat)))
        .expect("insert venue");
    TestApp {
        router: router(AppState::new(store)),
    }
}

fn session(title: &str, venue_id: i64) -> Value {
    json!({
        "title": title,
        "organiser": "Sam",
        "start_time": "2025-03-01T18:00:00Z",
        "venue_id": venue_id,
    })
}

#[rstest]
#[tokio::test]
async fn created_session_copies_venue_location(app: TestApp) {
    let (status, created) = app.post("/sessions/", session("game test 1", 1)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (lng, lat) = LOWER_HOUSE;
    assert_eq!(created["location"], json!({"type": "Point", "coordinates": [lng, lat]}));
    assert_eq!(created["venue"]["name"], "lower house");
    assert_eq!(created["game_system"], "Warhammer 40,000");

    let (status, fetched) = app.get(&format!("/sessions/{}/", created["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[rstest]
#[tokio::test]
async fn invalid_session_reports_fields(app: TestApp) {
    let (status, body) = app.post("/sessions/", json!({"title": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("organiser").is_some());
    assert!(body.get("start_time").is_some());
}

#[rstest]
#[tokio::test]
async fn unknown_venue_is_a_field_error(app: TestApp) {
    let (status, body) = app.post("/sessions/", session("orphan", 99)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["venue_id"].is_array());
}

#[rstest]
#[case("/sessions/42/")]
#[case("/sessions/abc/")]
#[case("/venues/42/")]
#[tokio::test]
async fn missing_rows_are_not_found(app: TestApp, #[case] uri: &str) {
    let (status, body) = app.get(uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"detail": "Not found."}));
}

#[rstest]
#[tokio::test]
async fn patch_and_delete_session(app: TestApp) {
    let (_, created) = app.post("/sessions/", session("game test 1", 1)).await;
    let uri = format!("/sessions/{}/", created["id"]);

    let (status, patched) = app
        .send(Method::PATCH, &uri, Some(json!({"is_open": false, "points_level": "1000"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["is_open"], false);
    assert_eq!(patched["title"], "game test 1");
    assert_eq!(patched["created_at"], created["created_at"]);

    let (status, _) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test]
async fn deleting_venue_keeps_session_location(app: TestApp) {
    let (_, created) = app.post("/sessions/", session("game test 1", 1)).await;
    let (status, _) = app.send(Method::DELETE, "/venues/1/", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fetched) = app.get(&format!("/sessions/{}/", created["id"])).await;
    assert!(fetched["venue"].is_null());
    assert_eq!(fetched["location"], created["location"]);
}

#[rstest]
#[tokio::test]
async fn bbox_requires_floats(app: TestApp) {
    let (status, body) = app.get("/sessions/in-bbox/?west=-7&south=53").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "west, south, east, north are required as floats"}));
}

#[rstest]
#[tokio::test]
async fn bbox_finds_sessions_at_venue(app: TestApp) {
    app.post("/sessions/", session("game test 1", 1)).await;
    let (status, body) = app
        .get("/sessions/in-bbox/?west=-7&south=53&east=-6&north=54&open=1")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");
    assert_eq!(body["features"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[tokio::test]
async fn nearest_requires_coordinates(app: TestApp) {
    let (status, body) = app.post("/sessions/nearest/", json!({"lat": 53.35})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "lat and lng are required and must be numbers"}));
}

#[rstest]
#[tokio::test]
async fn distinct_systems_are_sorted(app: TestApp) {
    let mut kill_team = session("kt", 1);
    kill_team["game_system"] = json!("Kill Team");
    app.post("/sessions/", kill_team).await;
    app.post("/sessions/", session("40k", 1)).await;
    app.post("/sessions/", session("40k again", 1)).await;

    let (status, body) = app.get("/sessions/distinct-systems/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Kill Team", "Warhammer 40,000"]));
}

#[rstest]
#[tokio::test]
async fn venue_crud_round(app: TestApp) {
    let (status, created) = app
        .post(
            "/venues/",
            json!({"name": "Warhammer Cork", "location": {"type": "Point", "coordinates": [-8.4697, 51.9023]}}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["description"], "");

    let (_, listed) = app.get("/venues/").await;
    let names: Vec<_> = listed
        .as_array()
        .expect("venue list")
        .iter()
        .map(|venue| venue["name"].as_str().expect("name"))
        .collect();
    assert_eq!(names, ["Warhammer Cork", "lower house"]);

    let (status, replaced) = app
        .send(
            Method::PUT,
            &format!("/venues/{}/", created["id"]),
            Some(json!({"name": "Warhammer Cork City"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["location"], created["location"]);

    let (_, layer) = app.get("/venues/geojson/").await;
    assert_eq!(layer["features"].as_array().map(Vec::len), Some(2));
}

#[rstest]
#[case("/counties/for-point/?lat=53.35", StatusCode::BAD_REQUEST, json!({"error": "lat and lng are required"}))]
#[case("/counties/for-point/?lat=north&lng=-6", StatusCode::BAD_REQUEST, json!({"error": "lat and lng must be numbers"}))]
#[case("/counties/for-point/?lat=0&lng=0", StatusCode::NOT_FOUND, json!({"error": "No county found"}))]
#[tokio::test]
async fn county_lookup_errors(
    app: TestApp,
    #[case] uri: &str,
    #[case] expected_status: StatusCode,
    #[case] expected_body: Value,
) {
    let (status, body) = app.get(uri).await;
    assert_eq!(status, expected_status);
    assert_eq!(body, expected_body);
}

#[rstest]
#[tokio::test]
async fn county_lookup_and_provinces(app: TestApp) {
    let (status, county) = app.get("/counties/for-point/?lat=53.35&lng=-6.27").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(county["type"], "Feature");
    assert_eq!(county["geometry"]["type"], "MultiPolygon");
    assert_eq!(county["properties"], json!({"name": "Dublin", "province": "Leinster"}));

    let (_, provinces) = app.get("/counties/distinct-provinces/").await;
    assert_eq!(provinces, json!(["Leinster"]));
}

#[rstest]
#[tokio::test]
async fn map_page_is_html(app: TestApp) {
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("router is infallible");
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/html"));
}

#[rstest]
#[tokio::test]
async fn repeated_query_keys_take_the_last_value(app: TestApp) {
    app.post("/sessions/", session("game test 1", 1)).await;
    let (status, body) = app.get("/sessions/geojson/?q=nothing&q=game").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"].as_array().map(Vec::len), Some(1));

    let (status, county) = app
        .get("/counties/for-point/?lat=0&lng=-6.27&lat=53.35")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(county["properties"]["name"], "Dublin");
}

#[rstest]
#[tokio::test]
async fn nearest_truncates_fractional_limit(app: TestApp) {
    app.post("/sessions/", session("game test 1", 1)).await;
    app.post("/sessions/", session("game test 2", 1)).await;
    let (status, body) = app
        .post(
            "/sessions/nearest/",
            json!({"lat": 53.35, "lng": -6.27, "limit": 1.0}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[tokio::test]
async fn nearest_accepts_form_body(app: TestApp) {
    app.post("/sessions/", session("game test 1", 1)).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/sessions/nearest/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("lat=53.35&lng=-6.27&limit=5"))
        .expect("build request");
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let body: Value = serde_json::from_slice(&bytes).expect("JSON body");
    assert_eq!(body["search_point"], json!({"lat": 53.35, "lng": -6.27}));
    assert_eq!(body["features"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[tokio::test]
async fn null_venue_name_is_rejected(app: TestApp) {
    let (status, body) = app
        .send(Method::PATCH, "/venues/1/", Some(json!({"name": null})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"name": ["This field may not be null."]}));

    let (_, venue) = app.get("/venues/1/").await;
    assert_eq!(venue["name"], "lower house");
}
