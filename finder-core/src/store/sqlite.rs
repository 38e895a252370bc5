//! SQLite-backed implementation of [`GameStore`].

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, SecondsFormat, Utc};
use geo::{BoundingRect, Point};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};

use crate::{
    County, GameSession, Geometry, NewCounty, NewGameSession, NewVenue, SessionId, SessionRecord,
    Venue, VenueId,
};

use super::{GameStore, StoreError, prepare_session, record, schema::initialise_schema};

const VENUE_COLUMNS: &str = "id, name, description, lon, lat";

const SESSION_SELECT: &str = "SELECT
        s.id, s.title, s.description, s.game_system, s.points_level,
        s.organiser, s.organiser_contact, s.start_time, s.max_players,
        s.current_players, s.is_open, s.lon, s.lat, s.venue_id, s.created_at,
        v.name, v.description, v.lon, v.lat
    FROM game_sessions AS s
    LEFT JOIN venues AS v ON v.id = s.venue_id";

/// Game finder store persisted in a single SQLite database.
///
/// The connection is shared behind a mutex; callers on an async runtime
/// should invoke the store from a blocking task.
///
/// # Examples
/// ```
/// use finder_core::{GameStore, NewVenue, SqliteGameStore};
/// use geo::Point;
///
/// let store = SqliteGameStore::open_in_memory().expect("open store");
/// let venue = store
///     .insert_venue(NewVenue::new("lower house").at(Point::new(-6.278249, 53.352439)))
///     .expect("insert venue");
/// assert_eq!(store.venue(venue.id).expect("lookup"), Some(venue));
/// ```
pub struct SqliteGameStore {
    connection: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl fmt::Debug for SqliteGameStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteGameStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteGameStore {
    /// Open or create the database at `path`, initialising the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| StoreError::OpenDatabase {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("opened game finder database at {}", path.display());
        Self::with_connection(connection, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection =
            Connection::open_in_memory().map_err(|source| StoreError::OpenDatabase {
                path: PathBuf::from(":memory:"),
                source,
            })?;
        Self::with_connection(connection, None)
    }

    fn with_connection(mut connection: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
            path,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn point(lon: Option<f64>, lat: Option<f64>) -> Option<Point<f64>> {
    lon.zip(lat).map(|(lon, lat)| Point::new(lon, lat))
}

fn coordinates(location: Option<Point<f64>>) -> (Option<f64>, Option<f64>) {
    location.map_or((None, None), |point| (Some(point.x()), Some(point.y())))
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let value: String = row.get(index)?;
    DateTime::parse_from_rfc3339(&value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|source| {
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(source))
        })
}

fn venue_from_row(row: &Row<'_>) -> rusqlite::Result<Venue> {
    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        location: point(row.get(3)?, row.get(4)?),
    })
}

fn find_venue(connection: &Connection, id: VenueId) -> Result<Option<Venue>, StoreError> {
    let sql = format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = ?1");
    Ok(connection
        .query_row(&sql, [id], venue_from_row)
        .optional()?)
}

fn referenced_venue(
    connection: &Connection,
    draft: &NewGameSession,
) -> Result<Option<Venue>, StoreError> {
    match draft.venue_id {
        Some(id) => find_venue(connection, id),
        None => Ok(None),
    }
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<SessionRecord> {
    let venue_id: Option<VenueId> = row.get(13)?;
    let venue_name: Option<String> = row.get(15)?;
    let venue = match (venue_id, venue_name) {
        (Some(id), Some(name)) => Some(Venue {
            id,
            name,
            description: row.get::<_, Option<String>>(16)?.unwrap_or_default(),
            location: point(row.get(17)?, row.get(18)?),
        }),
        _ => None,
    };
    let session = GameSession {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        game_system: row.get(3)?,
        points_level: row.get(4)?,
        organiser: row.get(5)?,
        organiser_contact: row.get(6)?,
        start_time: parse_timestamp(row, 7)?,
        max_players: row.get(8)?,
        current_players: row.get(9)?,
        is_open: row.get(10)?,
        location: point(row.get(11)?, row.get(12)?),
        venue_id,
        created_at: parse_timestamp(row, 14)?,
    };
    Ok(record(session, venue))
}

fn find_session(connection: &Connection, id: SessionId) -> Result<Option<SessionRecord>, StoreError> {
    let sql = format!("{SESSION_SELECT} WHERE s.id = ?1");
    Ok(connection
        .query_row(&sql, [id], session_from_row)
        .optional()?)
}

fn county_from_parts(
    id: i64,
    name: String,
    province: Option<String>,
    geometry: &str,
) -> Result<County, StoreError> {
    let parsed: Geometry = serde_json::from_str(geometry)
        .map_err(|source| StoreError::InvalidGeometry {
            county_id: id,
            source,
        })?;
    let area = parsed
        .into_multi_polygon()
        .map_err(|source| StoreError::UnexpectedGeometry {
            county_id: id,
            source,
        })?;
    Ok(County {
        id,
        name,
        province,
        geometry: Arc::new(area),
    })
}

impl GameStore for SqliteGameStore {
    fn venues(&self) -> Result<Vec<Venue>, StoreError> {
        let connection = self.lock()?;
        let sql = format!("SELECT {VENUE_COLUMNS} FROM venues ORDER BY name, id");
        let mut statement = connection.prepare(&sql)?;
        let venues = statement
            .query_map([], venue_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(venues)
    }

    fn venue(&self, id: VenueId) -> Result<Option<Venue>, StoreError> {
        let connection = self.lock()?;
        find_venue(&connection, id)
    }

    fn insert_venue(&self, draft: NewVenue) -> Result<Venue, StoreError> {
        draft.validate()?;
        let connection = self.lock()?;
        let (lon, lat) = coordinates(draft.location);
        connection.execute(
            "INSERT INTO venues (name, description, lon, lat) VALUES (?1, ?2, ?3, ?4)",
            params![draft.name, draft.description, lon, lat],
        )?;
        let id = connection.last_insert_rowid();
        log::debug!("inserted venue {id} '{}'", draft.name);
        Ok(Venue {
            id,
            name: draft.name,
            description: draft.description,
            location: draft.location,
        })
    }

    fn update_venue(&self, id: VenueId, draft: NewVenue) -> Result<Option<Venue>, StoreError> {
        draft.validate()?;
        let connection = self.lock()?;
        let (lon, lat) = coordinates(draft.location);
        let changed = connection.execute(
            "UPDATE venues SET name = ?1, description = ?2, lon = ?3, lat = ?4 WHERE id = ?5",
            params![draft.name, draft.description, lon, lat, id],
        )?;
        Ok((changed > 0).then(|| Venue {
            id,
            name: draft.name,
            description: draft.description,
            location: draft.location,
        }))
    }

    fn delete_venue(&self, id: VenueId) -> Result<bool, StoreError> {
        let connection = self.lock()?;
        let removed = connection.execute("DELETE FROM venues WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let connection = self.lock()?;
        let sql = format!("{SESSION_SELECT} ORDER BY s.start_time, s.id");
        let mut statement = connection.prepare(&sql)?;
        let sessions = statement
            .query_map([], session_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    fn session(&self, id: SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let connection = self.lock()?;
        find_session(&connection, id)
    }

    fn insert_session(&self, draft: NewGameSession) -> Result<SessionRecord, StoreError> {
        let connection = self.lock()?;
        let venue = referenced_venue(&connection, &draft)?;
        let draft = prepare_session(draft, venue.as_ref())?;
        let (lon, lat) = coordinates(draft.location);
        connection.execute(
            "INSERT INTO game_sessions (
                title, description, game_system, points_level, organiser,
                organiser_contact, start_time, max_players, current_players,
                is_open, lon, lat, venue_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                draft.title,
                draft.description,
                draft.game_system,
                draft.points_level,
                draft.organiser,
                draft.organiser_contact,
                timestamp(draft.start_time),
                draft.max_players,
                draft.current_players,
                draft.is_open,
                lon,
                lat,
                draft.venue_id,
                timestamp(Utc::now()),
            ],
        )?;
        let id = connection.last_insert_rowid();
        log::debug!("inserted session {id} '{}'", draft.title);
        find_session(&connection, id)?
            .ok_or(StoreError::Database(rusqlite::Error::QueryReturnedNoRows))
    }

    fn update_session(
        &self,
        id: SessionId,
        draft: NewGameSession,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let connection = self.lock()?;
        let venue = referenced_venue(&connection, &draft)?;
        let draft = prepare_session(draft, venue.as_ref())?;
        let (lon, lat) = coordinates(draft.location);
        let changed = connection.execute(
            "UPDATE game_sessions SET
                title = ?1, description = ?2, game_system = ?3, points_level = ?4,
                organiser = ?5, organiser_contact = ?6, start_time = ?7,
                max_players = ?8, current_players = ?9, is_open = ?10,
                lon = ?11, lat = ?12, venue_id = ?13
            WHERE id = ?14",
            params![
                draft.title,
                draft.description,
                draft.game_system,
                draft.points_level,
                draft.organiser,
                draft.organiser_contact,
                timestamp(draft.start_time),
                draft.max_players,
                draft.current_players,
                draft.is_open,
                lon,
                lat,
                draft.venue_id,
                id,
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        find_session(&connection, id)
    }

    fn delete_session(&self, id: SessionId) -> Result<bool, StoreError> {
        let connection = self.lock()?;
        let removed = connection.execute("DELETE FROM game_sessions WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    fn clear_sessions_and_venues(&self) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction()?;
        let sessions = transaction.execute("DELETE FROM game_sessions", [])?;
        let venues = transaction.execute("DELETE FROM venues", [])?;
        transaction.commit()?;
        log::info!("cleared {sessions} sessions and {venues} venues");
        Ok(())
    }

    fn counties(&self) -> Result<Vec<County>, StoreError> {
        let connection = self.lock()?;
        let mut statement =
            connection.prepare("SELECT id, name, province, geometry FROM counties ORDER BY id")?;
        let rows = statement
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(id, name, province, geometry)| county_from_parts(id, name, province, &geometry))
            .collect()
    }

    fn replace_counties(&self, counties: Vec<NewCounty>) -> Result<usize, StoreError> {
        let mut connection = self.lock()?;
        let transaction = connection.transaction()?;
        transaction.execute("DELETE FROM counties", [])?;
        let mut inserted = 0;
        {
            let mut statement = transaction.prepare(
                "INSERT INTO counties (name, province, geometry, min_lon, min_lat, max_lon, max_lat)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for county in counties {
                let Some(envelope) = county.geometry.bounding_rect() else {
                    log::warn!("skipping county '{}' with empty geometry", county.name);
                    continue;
                };
                let geometry = serde_json::to_string(&Geometry::from(&county.geometry))
                    .map_err(|source| StoreError::EncodeGeometry {
                        name: county.name.clone(),
                        source,
                    })?;
                statement.execute(params![
                    county.name,
                    county.province,
                    geometry,
                    envelope.min().x,
                    envelope.min().y,
                    envelope.max().x,
                    envelope.max().y,
                ])?;
                inserted += 1;
            }
        }
        transaction.commit()?;
        log::info!("stored {inserted} counties");
        Ok(inserted)
    }
}
