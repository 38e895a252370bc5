//! Schema creation for the SQLite store.

use rusqlite::{Connection, OptionalExtension, Transaction};

use super::StoreError;

pub const SCHEMA_VERSION: i64 = 1;

/// Create tables and indexes when missing and check the recorded version.
///
/// Runs in a single transaction so a failed step leaves the database as it
/// was. Foreign keys are enabled on the connection first.
pub(super) fn initialise_schema(connection: &mut Connection) -> Result<(), StoreError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| StoreError::Migration {
            step: "enable foreign keys",
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| StoreError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create venues",
        "CREATE TABLE IF NOT EXISTS venues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            description TEXT NOT NULL DEFAULT '',
            lon REAL,
            lat REAL,
            CHECK ((lon IS NULL) = (lat IS NULL))
        )",
    )?;
    run_migration_step(
        transaction,
        "create game_sessions",
        "CREATE TABLE IF NOT EXISTS game_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            game_system TEXT NOT NULL,
            points_level TEXT NOT NULL DEFAULT '',
            organiser TEXT NOT NULL,
            organiser_contact TEXT NOT NULL DEFAULT '',
            start_time TEXT NOT NULL,
            max_players INTEGER NOT NULL CHECK (max_players >= 0),
            current_players INTEGER NOT NULL CHECK (current_players >= 0),
            is_open INTEGER NOT NULL,
            lon REAL,
            lat REAL,
            venue_id INTEGER REFERENCES venues(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL,
            CHECK ((lon IS NULL) = (lat IS NULL))
        )",
    )?;
    run_migration_step(
        transaction,
        "create counties",
        "CREATE TABLE IF NOT EXISTS counties (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            province TEXT,
            geometry TEXT NOT NULL,
            min_lon REAL NOT NULL,
            min_lat REAL NOT NULL,
            max_lon REAL NOT NULL,
            max_lat REAL NOT NULL
        )",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "index venue locations",
        "CREATE INDEX IF NOT EXISTS idx_venues_location ON venues(lon, lat)",
    )?;
    run_migration_step(
        transaction,
        "index session locations",
        "CREATE INDEX IF NOT EXISTS idx_game_sessions_location ON game_sessions(lon, lat)",
    )?;
    run_migration_step(
        transaction,
        "index session start times",
        "CREATE INDEX IF NOT EXISTS idx_game_sessions_start ON game_sessions(start_time, id)",
    )?;
    run_migration_step(
        transaction,
        "index session venues",
        "CREATE INDEX IF NOT EXISTS idx_game_sessions_venue ON game_sessions(venue_id)",
    )?;
    run_migration_step(
        transaction,
        "index county envelopes",
        "CREATE INDEX IF NOT EXISTS idx_counties_envelope
            ON counties(min_lon, max_lon, min_lat, max_lat)",
    )?;
    run_migration_step(
        transaction,
        "index county provinces",
        "CREATE INDEX IF NOT EXISTS idx_counties_province ON counties(province COLLATE NOCASE)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS finder_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM finder_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(StoreError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        None => {
            transaction
                .execute(
                    "INSERT INTO finder_schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )
                .map_err(|source| StoreError::Migration {
                    step: "record schema version",
                    source,
                })?;
            log::info!("initialised game finder schema version {SCHEMA_VERSION}");
        }
    }

    Ok(())
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreError::Migration { step, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn connection() -> Connection {
        Connection::open_in_memory().expect("open in-memory database")
    }

    #[rstest]
    fn schema_is_idempotent(mut connection: Connection) {
        initialise_schema(&mut connection).expect("first run");
        initialise_schema(&mut connection).expect("second run");
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM finder_schema_version", [], |row| {
                row.get(0)
            })
            .expect("count versions");
        assert_eq!(count, 1);
    }

    #[rstest]
    fn newer_schema_is_rejected(mut connection: Connection) {
        initialise_schema(&mut connection).expect("initialise");
        connection
            .execute("UPDATE finder_schema_version SET version = 7", [])
            .expect("bump version");
        let err = initialise_schema(&mut connection).expect_err("mismatch");
        assert!(matches!(
            err,
            StoreError::VersionMismatch {
                expected: 1,
                found: 7
            }
        ));
    }
}
