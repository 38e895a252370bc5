use chrono::{DateTime, Utc};
use geo::Point;

use crate::{FieldErrors, Venue, VenueId};

/// Identifier assigned to a persisted [`GameSession`].
pub type SessionId = i64;

/// Game system assumed when a session does not name one.
pub const DEFAULT_GAME_SYSTEM: &str = "Warhammer 40,000";

const TITLE_MAX_CHARS: usize = 200;
const GAME_SYSTEM_MAX_CHARS: usize = 100;
const POINTS_LEVEL_MAX_CHARS: usize = 50;
const ORGANISER_MAX_CHARS: usize = 100;
const CONTACT_MAX_CHARS: usize = 100;

/// A scheduled, joinable tabletop game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
    pub id: SessionId,
    pub title: String,
    pub description: String,
    pub game_system: String,
    /// Free-form army size, e.g. `1000pts` or `Combat Patrol`.
    pub points_level: String,
    pub organiser: String,
    pub organiser_contact: String,
    pub start_time: DateTime<Utc>,
    pub max_players: u32,
    pub current_players: u32,
    pub is_open: bool,
    pub location: Option<Point<f64>>,
    pub venue_id: Option<VenueId>,
    pub created_at: DateTime<Utc>,
}

/// A session joined with the venue it references, if any.
///
/// This is the unit every filter and serializer works on: the venue is
/// needed both for text search on its name and as the fallback geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub session: GameSession,
    pub venue: Option<Venue>,
}

impl SessionRecord {
    /// Location used when placing the session on a map.
    ///
    /// The session's own point wins; otherwise the venue's point is used.
    /// `None` means the session cannot be drawn at all.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use finder_core::{GameSession, SessionRecord, Venue};
    /// use geo::Point;
    ///
    /// let venue = Venue {
    ///     id: 1,
    ///     name: "lower house".into(),
    ///     description: String::new(),
    ///     location: Some(Point::new(-6.278249, 53.352439)),
    /// };
    /// let session = GameSession {
    ///     id: 1,
    ///     title: "game test 1".into(),
    ///     description: String::new(),
    ///     game_system: "Warhammer 40,000".into(),
    ///     points_level: String::new(),
    ///     organiser: "Sam".into(),
    ///     organiser_contact: String::new(),
    ///     start_time: Utc::now(),
    ///     max_players: 2,
    ///     current_players: 1,
    ///     is_open: true,
    ///     location: None,
    ///     venue_id: Some(1),
    ///     created_at: Utc::now(),
    /// };
    /// let record = SessionRecord { session, venue: Some(venue) };
    /// assert_eq!(record.effective_location(), Some(Point::new(-6.278249, 53.352439)));
    /// ```
    #[must_use]
    pub fn effective_location(&self) -> Option<Point<f64>> {
        self.session
            .location
            .or_else(|| self.venue.as_ref().and_then(|venue| venue.location))
    }

    /// The venue's name, when the session references a venue.
    #[must_use]
    pub fn venue_name(&self) -> Option<&str> {
        self.venue.as_ref().map(|venue| venue.name.as_str())
    }
}

/// Values for creating a session or replacing an existing one.
///
/// Defaults mirror what a freshly announced game looks like: the default
/// game system, two seats with the organiser in one of them, and open for
/// sign-ups.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGameSession {
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
    pub location: Option<Point<f64>>,
    pub venue_id: Option<VenueId>,
}

impl NewGameSession {
    /// Start a draft with the required fields and defaults for the rest.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use finder_core::{DEFAULT_GAME_SYSTEM, NewGameSession};
    ///
    /// let draft = NewGameSession::new("Kill Team night", "Sam", Utc::now());
    /// assert_eq!(draft.game_system, DEFAULT_GAME_SYSTEM);
    /// assert_eq!((draft.current_players, draft.max_players), (1, 2));
    /// assert!(draft.is_open);
    /// ```
    pub fn new(
        title: impl Into<String>,
        organiser: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            game_system: DEFAULT_GAME_SYSTEM.to_owned(),
            points_level: String::new(),
            organiser: organiser.into(),
            organiser_contact: String::new(),
            start_time,
            max_players: 2,
            current_players: 1,
            is_open: true,
            location: None,
            venue_id: None,
        }
    }

    /// Draft carrying the current values of a stored session.
    #[must_use]
    pub fn from_session(session: &GameSession) -> Self {
        Self {
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
            location: session.location,
            venue_id: session.venue_id,
        }
    }

    /// Reference a venue.
    #[must_use]
    pub fn with_venue(mut self, venue_id: VenueId) -> Self {
        self.venue_id = Some(venue_id);
        self
    }

    /// Pin the session to an explicit location.
    #[must_use]
    pub fn at(mut self, location: Point<f64>) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the game system label.
    #[must_use]
    pub fn with_game_system(mut self, game_system: impl Into<String>) -> Self {
        self.game_system = game_system.into();
        self
    }

    /// Mark the session open or closed for sign-ups.
    #[must_use]
    pub fn open(mut self, is_open: bool) -> Self {
        self.is_open = is_open;
        self
    }

    /// Copy the venue's location into the draft when it has none of its own.
    ///
    /// Applied on every save. A session whose location is cleared while it
    /// still references a located venue picks the venue's point up again.
    #[must_use]
    pub fn adopt_venue_location(mut self, venue: Option<&Venue>) -> Self {
        if self.location.is_none() {
            self.location = venue.and_then(|venue| venue.location);
        }
        self
    }

    /// Check field constraints, reporting every violation at once.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        errors.require_text("title", &self.title, TITLE_MAX_CHARS);
        errors.limit_text("game_system", &self.game_system, GAME_SYSTEM_MAX_CHARS);
        errors.limit_text("points_level", &self.points_level, POINTS_LEVEL_MAX_CHARS);
        errors.require_text("organiser", &self.organiser, ORGANISER_MAX_CHARS);
        errors.limit_text(
            "organiser_contact",
            &self.organiser_contact,
            CONTACT_MAX_CHARS,
        );
        errors.check_point("location", self.location.as_ref());
        errors.into_result()
    }
}
