//! Core domain types for the game finder.
//!
//! Venues, game sessions and county boundaries are modelled here together
//! with the predicate layer used to filter sessions, the spatial relations
//! those predicates rely on, and the GeoJSON shapes returned to clients.
//!
//! Coordinates are WGS84 throughout with `x = longitude` and `y = latitude`.
//! Persistence is abstracted behind [`GameStore`]; the SQLite implementation
//! is enabled by the `store-sqlite` feature.

#![forbid(unsafe_code)]

mod county;
pub mod filter;
pub mod geojson;
pub mod query;
mod session;
pub mod spatial;
pub mod store;
mod validation;
mod venue;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use county::{County, CountyId, NewCounty};
pub use filter::{GeometrySource, Predicate, SessionFilter, TextField};
pub use geojson::{
    CountyProperties, Feature, FeatureCollection, Geometry, GeometryError, SearchPoint,
    SessionProperties, VenueProperties,
};
pub use query::{DEFAULT_NEAREST_LIMIT, NearestQuery, SessionQuery};
pub use session::{DEFAULT_GAME_SYSTEM, GameSession, NewGameSession, SessionId, SessionRecord};
pub use spatial::{BoundingBox, CountyIndex, Region, SpatialRelation};
pub use store::{GameStore, StoreError};
pub use validation::FieldErrors;
pub use venue::{NewVenue, Venue, VenueId};

#[cfg(feature = "store-sqlite")]
pub use store::SqliteGameStore;
