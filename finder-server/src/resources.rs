//! JSON representations of venues and sessions for the CRUD endpoints.

use chrono::{DateTime, Utc};
use finder_core::{
    FieldErrors, GameSession, Geometry, NewGameSession, NewVenue, SessionId, SessionRecord, Venue,
    VenueId,
};
use geo::Point;
use serde::{Deserialize, Deserializer, Serialize};

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_A_POINT: &str = "Expected a GeoJSON Point.";

/// A venue as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueResource {
    pub id: VenueId,
    pub name: String,
    pub description: String,
    pub location: Option<Geometry>,
}

impl From<&Venue> for VenueResource {
    fn from(venue: &Venue) -> Self {
        Self {
            id: venue.id,
            name: venue.name.clone(),
            description: venue.description.clone(),
            location: venue.location.map(Geometry::from),
        }
    }
}

/// A session as returned by the API, with its venue nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResource {
    pub id: SessionId,
    pub title: String,
    pub description: String,
    pub game_system: String,
    pub points_level: String,
    pub organiser: String,
    pub organiser_contact: String,
    pub start_time: DateTime<Utc>,
    pub max_players: u32,
    pub current_players: u32,
    pub is_open: bool,
    pub location: Option<Geometry>,
    pub venue: Option<VenueResource>,
    pub created_at: DateTime<Utc>,
}

impl From<&SessionRecord> for SessionResource {
    fn from(record: &SessionRecord) -> Self {
        let session = &record.session;
        Self {
            id: session.id,
            title: session.title.clone(),
            description: session.description.clone(),
            game_system: session.game_system.clone(),
            points_level: session.points_level.clone(),
            organiser: session.organiser.clone(),
            organiser_contact: session.organiser_contact.clone(),
            start_time: session.start_time,
            max_players: session.max_players,
            current_players: session.current_players,
            is_open: session.is_open,
            location: session.location.map(Geometry::from),
            venue: record.venue.as_ref().map(VenueResource::from),
            created_at: session.created_at,
        }
    }
}

/// Distinguish an explicit `null` (`Some(None)`) from an absent field
/// (`None`, via `#[serde(default)]`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Unwrap a submitted non-nullable field. An explicit `null` is an error,
/// as is an absent field when `required`.
fn take<T>(
    errors: &mut FieldErrors,
    field: &str,
    submitted: Option<Option<T>>,
    required: bool,
) -> Option<T> {
    match submitted {
        Some(Some(value)) => Some(value),
        Some(None) => {
            errors.push(field, NOT_NULL);
            None
        }
        None => {
            if required {
                errors.push(field, REQUIRED);
            }
            None
        }
    }
}

/// Resolve a submitted location against the current one.
fn location(
    errors: &mut FieldErrors,
    submitted: Option<Option<Geometry>>,
    current: Option<Point<f64>>,
) -> Option<Point<f64>> {
    match submitted {
        None => current,
        Some(None) => None,
        Some(Some(geometry)) => geometry.into_point().map_or_else(
            |_| {
                errors.push("location", NOT_A_POINT);
                current
            },
            Some,
        ),
    }
}

/// Session fields accepted on create and update.
///
/// Absent fields keep their stored value (or default on create). Only
/// `location` and `venue_id` may be cleared with `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionBody {
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub game_system: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub points_level: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub organiser: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub organiser_contact: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_time: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub max_players: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub current_players: Option<Option<u32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_open: Option<Option<bool>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<Geometry>>,
    #[serde(default, deserialize_with = "nullable")]
    pub venue_id: Option<Option<VenueId>>,
}

impl SessionBody {
    /// Merge the body over `stored` (or the defaults when creating).
    ///
    /// Unless `partial`, `title`, `organiser` and `start_time` must be
    /// present.
    ///
    /// # Errors
    /// Reports missing required fields, `null` in non-nullable fields and
    /// non-point locations.
    pub fn into_draft(
        self,
        stored: Option<&GameSession>,
        partial: bool,
    ) -> Result<NewGameSession, FieldErrors> {
        let mut errors = FieldErrors::default();
        let required = !partial;
        let mut draft = stored.map_or_else(
            || NewGameSession::new(String::new(), String::new(), Utc::now()),
            NewGameSession::from_session,
        );

        if let Some(title) = take(&mut errors, "title", self.title, required) {
            draft.title = title;
        }
        if let Some(description) = take(&mut errors, "description", self.description, false) {
            draft.description = description;
        }
        if let Some(game_system) = take(&mut errors, "game_system", self.game_system, false) {
            draft.game_system = game_system;
        }
        if let Some(points_level) = take(&mut errors, "points_level", self.points_level, false) {
            draft.points_level = points_level;
        }
        if let Some(organiser) = take(&mut errors, "organiser", self.organiser, required) {
            draft.organiser = organiser;
        }
        if let Some(contact) =
            take(&mut errors, "organiser_contact", self.organiser_contact, false)
        {
            draft.organiser_contact = contact;
        }
        if let Some(start_time) = take(&mut errors, "start_time", self.start_time, required) {
            draft.start_time = start_time;
        }
        if let Some(max_players) = take(&mut errors, "max_players", self.max_players, false) {
            draft.max_players = max_players;
        }
        if let Some(current_players) =
            take(&mut errors, "current_players", self.current_players, false)
        {
            draft.current_players = current_players;
        }
        if let Some(is_open) = take(&mut errors, "is_open", self.is_open, false) {
            draft.is_open = is_open;
        }
        if let Some(venue_id) = self.venue_id {
            draft.venue_id = venue_id;
        }
        draft.location = location(&mut errors, self.location, draft.location);

        errors.into_result().map(|()| draft)
    }
}

/// Venue fields accepted on create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueBody {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub location: Option<Option<Geometry>>,
}

impl VenueBody {
    /// Merge the body over `stored`; `name` is required unless `partial`.
    ///
    /// # Errors
    /// Reports a missing or `null` name, a `null` description and
    /// non-point locations.
    pub fn into_draft(self, stored: Option<&Venue>, partial: bool) -> Result<NewVenue, FieldErrors> {
        let mut errors = FieldErrors::default();
        let mut draft = stored.map(NewVenue::from_venue).unwrap_or_default();
        if let Some(name) = take(&mut errors, "name", self.name, !partial) {
            draft.name = name;
        }
        if let Some(description) = take(&mut errors, "description", self.description, false) {
            draft.description = description;
        }
        draft.location = location(&mut errors, self.location, draft.location);
        errors.into_result().map(|()| draft)
    }
}
