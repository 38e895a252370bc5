//! Persistence for venues, sessions and county boundaries.
//!
//! The [`GameStore`] trait is the seam between the query layer and storage.
//! Implementations validate drafts and apply the venue location copy before
//! writing, so every backend persists the same values.

use thiserror::Error;

use crate::{
    County, FieldErrors, GameSession, NewCounty, NewGameSession, NewVenue, SessionId,
    SessionRecord, Venue, VenueId,
};

#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use schema::SCHEMA_VERSION;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteGameStore;

/// Errors raised by [`GameStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The draft failed field validation.
    #[error(transparent)]
    Invalid(#[from] FieldErrors),
    /// A session referenced a venue that does not exist.
    #[error("venue {id} does not exist")]
    UnknownVenue { id: VenueId },
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
    /// Opening the SQLite database failed.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        path: std::path::PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[cfg(feature = "store-sqlite")]
    #[error("failed to execute migration step '{step}'")]
    Migration {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },
    #[cfg(feature = "store-sqlite")]
    #[error(
        "expected game finder schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch { expected: i64, found: i64 },
    /// A county boundary could not be encoded for storage.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to encode geometry of county '{name}': {source}")]
    EncodeGeometry {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    /// A stored county boundary was not valid GeoJSON.
    #[cfg(feature = "store-sqlite")]
    #[error("failed to parse geometry of county {county_id}: {source}")]
    InvalidGeometry {
        county_id: i64,
        #[source]
        source: serde_json::Error,
    },
    /// A stored county boundary was not an area.
    #[cfg(feature = "store-sqlite")]
    #[error("county {county_id} has unusable geometry: {source}")]
    UnexpectedGeometry {
        county_id: i64,
        #[source]
        source: crate::GeometryError,
    },
    /// Generic SQLite failure.
    #[cfg(feature = "store-sqlite")]
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Read and write access to persisted game finder records.
///
/// Lookups by id return `Ok(None)` for unknown ids; updates and deletes do
/// the same with `Ok(None)` and `Ok(false)`. Writes validate their draft and
/// reject references to missing venues.
pub trait GameStore: Send + Sync {
    /// All venues ordered by name, then id.
    fn venues(&self) -> Result<Vec<Venue>, StoreError>;

    fn venue(&self, id: VenueId) -> Result<Option<Venue>, StoreError>;

    fn insert_venue(&self, draft: NewVenue) -> Result<Venue, StoreError>;

    fn update_venue(&self, id: VenueId, draft: NewVenue) -> Result<Option<Venue>, StoreError>;

    /// Delete a venue. Sessions referencing it keep their own location and
    /// lose the reference.
    fn delete_venue(&self, id: VenueId) -> Result<bool, StoreError>;

    /// All sessions joined with their venue, ordered by start time, then id.
    fn sessions(&self) -> Result<Vec<SessionRecord>, StoreError>;

    fn session(&self, id: SessionId) -> Result<Option<SessionRecord>, StoreError>;

    /// Persist a new session. A draft without a location takes its venue's.
    fn insert_session(&self, draft: NewGameSession) -> Result<SessionRecord, StoreError>;

    /// Replace a session's values, keeping its id and creation time. The
    /// venue location copy applies as on insert.
    fn update_session(
        &self,
        id: SessionId,
        draft: NewGameSession,
    ) -> Result<Option<SessionRecord>, StoreError>;

    fn delete_session(&self, id: SessionId) -> Result<bool, StoreError>;

    /// Remove every session and venue.
    fn clear_sessions_and_venues(&self) -> Result<(), StoreError>;

    /// All county boundaries ordered by id.
    fn counties(&self) -> Result<Vec<County>, StoreError>;

    /// Replace the county table with `counties`, returning how many were
    /// stored.
    fn replace_counties(&self, counties: Vec<NewCounty>) -> Result<usize, StoreError>;
}

/// Validate a session draft and apply the venue location copy.
///
/// `venue` must be the venue named by `draft.venue_id`, already looked up by
/// the caller; a dangling reference is reported as
/// [`StoreError::UnknownVenue`].
pub(crate) fn prepare_session(
    draft: NewGameSession,
    venue: Option<&Venue>,
) -> Result<NewGameSession, StoreError> {
    draft.validate()?;
    if let Some(id) = draft.venue_id
        && venue.is_none()
    {
        return Err(StoreError::UnknownVenue { id });
    }
    let prepared = draft.adopt_venue_location(venue);
    if prepared.location.is_none() {
        log::debug!("session '{}' saved without a location", prepared.title);
    }
    Ok(prepared)
}

/// Join a stored session with its venue.
pub(crate) fn record(session: GameSession, venue: Option<Venue>) -> SessionRecord {
    SessionRecord { session, venue }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use geo::Point;
    use rstest::rstest;

    #[rstest]
    fn dangling_venue_is_rejected() {
        let draft = NewGameSession::new("Kill Team", "Sam", Utc::now()).with_venue(42);
        let err = prepare_session(draft, None).expect_err("missing venue");
        assert!(matches!(err, StoreError::UnknownVenue { id: 42 }));
    }

    #[rstest]
    fn invalid_draft_reports_fields() {
        let draft = NewGameSession::new("", "Sam", Utc::now());
        let err = prepare_session(draft, None).expect_err("blank title");
        let StoreError::Invalid(fields) = err else {
            panic!("expected validation failure, got {err:?}");
        };
        assert_eq!(fields.field_names().collect::<Vec<_>>(), ["title"]);
    }

    #[rstest]
    fn venue_location_is_copied() {
        let venue = Venue {
            id: 1,
            name: "lower house".into(),
            description: String::new(),
            location: Some(Point::new(-6.278_249, 53.352_439)),
        };
        let draft = NewGameSession::new("game test 1", "Sam", Utc::now()).with_venue(1);
        let prepared = prepare_session(draft, Some(&venue)).expect("valid draft");
        assert_eq!(prepared.location, venue.location);
    }
}
