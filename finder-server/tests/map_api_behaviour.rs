//! Behavioural tests for the map API using rstest-bdd.

use std::cell::RefCell;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use finder_core::test_support::MemoryStore;
use finder_server::{AppState, router};
use http_body_util::BodyExt;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tower::ServiceExt;

const LOWER_HOUSE: [f64; 2] = [-6.278_249, 53.352_439];

/// Drives the router from synchronous steps.
struct ApiWorld {
    runtime: Runtime,
    router: Router,
    venue_id: RefCell<Option<i64>>,
    response: RefCell<Option<Value>>,
}

impl ApiWorld {
    fn call(&self, method: Method, uri: &str, body: Option<Value>) -> Value {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");
        self.runtime.block_on(async {
            let response = self
                .router
                .clone()
                .oneshot(request)
                .await
                .expect("router is infallible");
            assert!(
                response.status() == StatusCode::OK || response.status() == StatusCode::CREATED,
                "unexpected status {}",
                response.status()
            );
            let bytes = response
                .into_body()
                .collect()
                .await
                .expect("read body")
                .to_bytes();
            serde_json::from_slice(&bytes).expect("JSON body")
        })
    }

    fn add_session(&self, title: &str) {
        let venue_id = self.venue_id.borrow().expect("venue created first");
        self.call(
            Method::POST,
            "/sessions/",
            Some(json!({
                "title": title,
                "organiser": "Sam",
                "start_time": "2025-03-01T18:00:00Z",
                "venue_id": venue_id,
            })),
        );
    }

    fn only_feature(&self) -> Value {
        let response = self.response.borrow();
        let features = response
            .as_ref()
            .and_then(|body| body["features"].as_array())
            .expect("a feature collection was returned");
        assert_eq!(features.len(), 1, "expected exactly one feature");
        features[0].clone()
    }
}

#[fixture]
fn world() -> ApiWorld {
    ApiWorld {
        runtime: tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build runtime"),
        router: router(AppState::new(MemoryStore::new())),
        venue_id: RefCell::new(None),
        response: RefCell::new(None),
    }
}

#[given("the lower house venue at latitude 53.352439 and longitude -6.278249")]
fn given_venue(world: &ApiWorld) {
    let venue = world.call(
        Method::POST,
        "/venues/",
        Some(json!({
            "name": "lower house",
            "location": {"type": "Point", "coordinates": LOWER_HOUSE},
        })),
    );
    world.venue_id.replace(venue["id"].as_i64());
}

#[given("the first session at the lower house")]
fn given_first_session(world: &ApiWorld) {
    world.add_session("game test 1");
}

#[given("the second session at the lower house")]
fn given_second_session(world: &ApiWorld) {
    world.add_session("game test 2");
}

#[when("the map requests the session GeoJSON")]
fn when_geojson(world: &ApiWorld) {
    let body = world.call(Method::GET, "/sessions/geojson/", None);
    world.response.replace(Some(body));
}

#[when("the map asks for one session nearest to Dublin city centre")]
fn when_nearest(world: &ApiWorld) {
    let body = world.call(
        Method::POST,
        "/sessions/nearest/",
        Some(json!({"lat": 53.35, "lng": -6.27, "limit": 1})),
    );
    world.response.replace(Some(body));
}

#[then("one feature is returned at the lower house")]
fn then_at_venue(world: &ApiWorld) {
    let feature = world.only_feature();
    assert_eq!(
        feature["geometry"],
        json!({"type": "Point", "coordinates": LOWER_HOUSE})
    );
}

#[then("the feature is labelled with the lower house")]
fn then_venue_name(world: &ApiWorld) {
    let feature = world.only_feature();
    assert_eq!(feature["properties"]["venue_name"], "lower house");
    assert!(feature.get("id").is_none());
}

#[then("the response echoes the search point")]
fn then_search_point(world: &ApiWorld) {
    let feature = world.only_feature();
    let distance = feature["properties"]["distance_m"]
        .as_f64()
        .expect("distance reported");
    assert!(distance >= 0.0);
    let response = world.response.borrow();
    let body = response.as_ref().expect("response recorded");
    assert_eq!(body["search_point"], json!({"lat": 53.35, "lng": -6.27}));
}

#[scenario(path = "tests/features/map_api.feature", index = 0)]
fn session_drawn_at_venue(world: ApiWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/map_api.feature", index = 1)]
fn nearest_session(world: ApiWorld) {
    let _ = world;
}
