//! Test-only, in-memory `GameStore` implementation used by unit and
//! behaviour tests across the workspace.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::{
    County, GameSession, GameStore, NewCounty, NewGameSession, NewVenue, SessionId,
    SessionRecord, StoreError, Venue, VenueId,
    store::{prepare_session, record},
};

#[derive(Debug, Default)]
struct State {
    venues: Vec<Venue>,
    sessions: Vec<GameSession>,
    counties: Vec<County>,
    next_venue_id: VenueId,
    next_session_id: SessionId,
    next_county_id: i64,
}

impl State {
    fn venue(&self, id: VenueId) -> Option<&Venue> {
        self.venues.iter().find(|venue| venue.id == id)
    }

    fn record(&self, session: &GameSession) -> SessionRecord {
        let venue = session.venue_id.and_then(|id| self.venue(id)).cloned();
        record(session.clone(), venue)
    }

    fn replace_counties(&mut self, counties: impl IntoIterator<Item = NewCounty>) {
        self.counties.clear();
        for county in counties {
            self.next_county_id += 1;
            self.counties.push(County {
                id: self.next_county_id,
                name: county.name,
                province: county.province,
                geometry: Arc::new(county.geometry),
            });
        }
    }

    fn prepare(&self, draft: NewGameSession) -> Result<NewGameSession, StoreError> {
        let venue = draft.venue_id.and_then(|id| self.venue(id));
        prepare_session(draft, venue)
    }
}

fn session_from_draft(
    id: SessionId,
    draft: NewGameSession,
    created_at: DateTime<Utc>,
) -> GameSession {
    GameSession {
        id,
        title: draft.title,
        description: draft.description,
        game_system: draft.game_system,
        points_level: draft.points_level,
        organiser: draft.organiser,
        organiser_contact: draft.organiser_contact,
        start_time: draft.start_time,
        max_players: draft.max_players,
        current_players: draft.current_players,
        is_open: draft.is_open,
        location: draft.location,
        venue_id: draft.venue_id,
        created_at,
    }
}

/// In-memory `GameStore` performing linear scans.
///
/// Mirrors the SQLite store's observable behaviour: ids start at one,
/// deleting a venue clears session references, and lists are ordered the
/// same way.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given county boundaries.
    pub fn with_counties<I>(counties: I) -> Self
    where
        I: IntoIterator<Item = NewCounty>,
    {
        let mut state = State::default();
        state.replace_counties(counties);
        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }
}

impl GameStore for MemoryStore {
    fn venues(&self) -> Result<Vec<Venue>, StoreError> {
        let mut venues = self.read()?.venues.clone();
        venues.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));
        Ok(venues)
    }

    fn venue(&self, id: VenueId) -> Result<Option<Venue>, StoreError> {
        Ok(self.read()?.venue(id).cloned())
    }

    fn insert_venue(&self, draft: NewVenue) -> Result<Venue, StoreError> {
        draft.validate()?;
        let mut state = self.write()?;
        state.next_venue_id += 1;
        let venue = Venue {
            id: state.next_venue_id,
            name: draft.name,
            description: draft.description,
            location: draft.location,
        };
        state.venues.push(venue.clone());
        Ok(venue)
    }

    fn update_venue(&self, id: VenueId, draft: NewVenue) -> Result<Option<Venue>, StoreError> {
        draft.validate()?;
        let mut state = self.write()?;
        let Some(venue) = state.venues.iter_mut().find(|venue| venue.id == id) else {
            return Ok(None);
        };
        venue.name = draft.name;
        venue.description = draft.description;
        venue.location = draft.location;
        Ok(Some(venue.clone()))
    }

    fn delete_venue(&self, id: VenueId) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let before = state.venues.len();
        state.venues.retain(|venue| venue.id != id);
        if state.venues.len() == before {
            return Ok(false);
        }
        for session in &mut state.sessions {
            if session.venue_id == Some(id) {
                session.venue_id = None;
            }
        }
        Ok(true)
    }

    fn sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let state = self.read()?;
        let mut records: Vec<_> = state
            .sessions
            .iter()
            .map(|session| state.record(session))
            .collect();
        records.sort_by(|left, right| {
            left.session
                .start_time
                .cmp(&right.session.start_time)
                .then(left.session.id.cmp(&right.session.id))
        });
        Ok(records)
    }

    fn session(&self, id: SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let state = self.read()?;
        Ok(state
            .sessions
            .iter()
            .find(|session| session.id == id)
            .map(|session| state.record(session)))
    }

    fn insert_session(&self, draft: NewGameSession) -> Result<SessionRecord, StoreError> {
        let mut state = self.write()?;
        let draft = state.prepare(draft)?;
        state.next_session_id += 1;
        let session = session_from_draft(state.next_session_id, draft, Utc::now());
        let saved = state.record(&session);
        state.sessions.push(session);
        Ok(saved)
    }

    fn update_session(
        &self,
        id: SessionId,
        draft: NewGameSession,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let mut state = self.write()?;
        let Some(position) = state.sessions.iter().position(|session| session.id == id) else {
            return Ok(None);
        };
        let draft = state.prepare(draft)?;
        let created_at = state.sessions[position].created_at;
        let session = session_from_draft(id, draft, created_at);
        let saved = state.record(&session);
        state.sessions[position] = session;
        Ok(Some(saved))
    }

    fn delete_session(&self, id: SessionId) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let before = state.sessions.len();
        state.sessions.retain(|session| session.id != id);
        Ok(state.sessions.len() != before)
    }

    fn clear_sessions_and_venues(&self) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state.sessions.clear();
        state.venues.clear();
        Ok(())
    }

    fn counties(&self) -> Result<Vec<County>, StoreError> {
        Ok(self.read()?.counties.clone())
    }

    fn replace_counties(&self, counties: Vec<NewCounty>) -> Result<usize, StoreError> {
        let mut state = self.write()?;
        state.replace_counties(counties);
        Ok(state.counties.len())
    }
}
