//! Demonstration data: a handful of Irish venues and open games at them.

use std::collections::HashMap;

use chrono::Utc;
use finder_core::{GameStore, NewGameSession, NewVenue, StoreError, VenueId};
use geo::Point;
use log::{info, warn};

/// Organiser recorded on seeded sessions.
pub const SEED_ORGANISER: &str = "Community";

/// Seed venues as `(name, latitude, longitude)`.
pub const VENUES: [(&str, f64, f64); 10] = [
    ("lower house", 53.352_439_487_969_924, -6.278_248_889_568_315),
    ("gamers world", 53.346_883_702_331_64, -6.265_873_177_175_519),
    ("Wahammer shop", 53.346_978_687_115_76, -6.263_218_134_018_802),
    ("Underworld Gaming", 53.2862, -6.3739),
    ("The Warchest", 53.2941, -6.1334),
    ("Warhammer Cork", 51.9023, -8.4697),
    ("The Gathering Games Club", 52.6613, -8.6305),
    ("Dungeons & Donuts", 53.2734, -9.0493),
    ("EireHobbies", 54.0007, -6.4031),
    ("Broadsword Wargaming", 53.3498, -6.2615),
];

/// Seed games as `(title, game system, venue name)`.
pub const GAMES: [(&str, &str, &str); 27] = [
    ("game test 1", "Warhammer 40,000", "lower house"),
    ("40k 1k pts – need 1", "Warhammer 40,000", "lower house"),
    ("test2", "Age of Sigmar", "gamers world"),
    ("test3", "Warhammer 40,000", "Wahammer shop"),
    ("test4", "Warhammer 40,000", "Wahammer shop"),
    ("test4", "Warhammer 40,000", "Wahammer shop"),
    ("test5", "Warhammer 40,000", "Wahammer shop"),
    ("Warcry at Underworld Gaming #6-4108", "Warcry", "Underworld Gaming"),
    (
        "Warhammer 40,000 at The Gathering Games Club #2-2526",
        "Warhammer 40,000",
        "The Gathering Games Club",
    ),
    ("The Horus Heresy at EireHobbies #8-3010", "The Horus Heresy", "EireHobbies"),
    ("Kill Team at gamers world #4-6105", "Kill Team", "gamers world"),
    (
        "Warhammer 40,000 at Dungeons & Donuts #3-7175",
        "Warhammer 40,000",
        "Dungeons & Donuts",
    ),
    ("Kill Team at Broadsword Wargaming #7-7482", "Kill Team", "Broadsword Wargaming"),
    (
        "Warhammer Age of Sigmar at Dungeons & Donuts #16-6202",
        "Age of Sigmar",
        "Dungeons & Donuts",
    ),
    ("Warcry at Dungeons & Donuts #18-8914", "Warcry", "Dungeons & Donuts"),
    ("Kill Team at EireHobbies #5-5352", "Kill Team", "EireHobbies"),
    ("Necromunda at EireHobbies #10-5526", "Necromunda", "EireHobbies"),
    (
        "Warhammer 40,000 at Warhammer Cork #9-2146",
        "Warhammer 40,000",
        "Warhammer Cork",
    ),
    ("Kill Team at Wahammer shop #17-5166", "Kill Team", "Wahammer shop"),
    (
        "Warhammer Age of Sigmar at gamers world #13-4206",
        "Age of Sigmar",
        "gamers world",
    ),
    (
        "Warhammer 40,000 at Broadsword Wargaming #20-2030",
        "Warhammer 40,000",
        "Broadsword Wargaming",
    ),
    ("Warcry at Underworld Gaming #15-6033", "Warcry", "Underworld Gaming"),
    (
        "Warhammer Age of Sigmar at Dungeons & Donuts #1-1699",
        "Age of Sigmar",
        "Dungeons & Donuts",
    ),
    (
        "Necromunda at The Gathering Games Club #11-8512",
        "Necromunda",
        "The Gathering Games Club",
    ),
    (
        "Warhammer Age of Sigmar at gamers world #14-6857",
        "Age of Sigmar",
        "gamers world",
    ),
    (
        "Warhammer 40,000 at Warhammer Cork #12-6847",
        "Warhammer 40,000",
        "Warhammer Cork",
    ),
    (
        "Warhammer 40,000 at lower house #19-2101",
        "Warhammer 40,000",
        "lower house",
    ),
];

/// Counts written by [`seed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub venues: usize,
    pub sessions: usize,
}

/// Wipe sessions and venues, then write the demonstration data set.
///
/// Every seeded session starts now, is open, and takes its point from its
/// venue. Counties are left untouched.
///
/// # Errors
/// Propagates store failures. Rows written before a failure remain.
pub fn seed<S>(store: &S) -> Result<SeedReport, StoreError>
where
    S: GameStore + ?Sized,
{
    store.clear_sessions_and_venues()?;

    let mut venue_by_name: HashMap<&str, VenueId> = HashMap::with_capacity(VENUES.len());
    for (name, lat, lng) in VENUES {
        let venue = store.insert_venue(NewVenue::new(name).at(Point::new(lng, lat)))?;
        venue_by_name.insert(name, venue.id);
    }

    let now = Utc::now();
    let mut sessions = 0;
    for (title, game_system, venue_name) in GAMES {
        let Some(&venue_id) = venue_by_name.get(venue_name) else {
            warn!("skipping '{title}': venue '{venue_name}' not found");
            continue;
        };
        let draft = NewGameSession::new(title, SEED_ORGANISER, now)
            .with_game_system(game_system)
            .with_venue(venue_id)
            .open(true);
        store.insert_session(draft)?;
        sessions += 1;
    }

    let report = SeedReport {
        venues: venue_by_name.len(),
        sessions,
    };
    info!(
        "seeded {} venues and {} game sessions",
        report.venues, report.sessions
    );
    Ok(report)
}
