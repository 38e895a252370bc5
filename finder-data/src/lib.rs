//! Data loaders for the game finder.
//!
//! - [`load_counties`] imports county boundaries from an ITM GeoJSON export,
//!   reprojecting them to WGS84 with [`ItmToWgs84`].
//! - [`seed`] resets venues and sessions to a demonstration data set.
#![forbid(unsafe_code)]

mod counties;
mod itm;
pub mod seed;

pub use counties::{CountyImport, CountyImportError, load_counties, parse_counties};
pub use itm::ItmToWgs84;
pub use seed::{SeedReport, seed};
