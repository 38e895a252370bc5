//! Facade crate for the game finder.
//!
//! This crate re-exports the core domain types and exposes the SQLite store
//! and HTTP router behind feature flags.

#![forbid(unsafe_code)]

pub use finder_core::{
    BoundingBox, County, CountyId, FeatureCollection, FieldErrors, GameSession, GameStore,
    NearestQuery, NewCounty, NewGameSession, NewVenue, SessionFilter, SessionId, SessionQuery,
    SessionRecord, StoreError, Venue, VenueId, query,
};

#[cfg(feature = "store-sqlite")]
pub use finder_core::SqliteGameStore;

#[cfg(feature = "server")]
pub use finder_server::{AppState, router};
