//! Irish Transverse Mercator (EPSG:2157) to WGS84 conversion.
//!
//! ITM is a Transverse Mercator projection of ETRS89 on the GRS80
//! ellipsoid. ETRS89 and WGS84 agree to well under a metre in Ireland, so
//! the geographic result is used directly as WGS84.
//!
//! The inverse uses the footpoint-latitude series from Snyder, *Map
//! Projections: A Working Manual* (USGS PP 1395), which is accurate to a few
//! millimetres across the island.

use geo::Point;

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const INVERSE_FLATTENING: f64 = 298.257_222_101;
const SCALE_FACTOR: f64 = 0.999_82;
const ORIGIN_LATITUDE_DEG: f64 = 53.5;
const CENTRAL_MERIDIAN_DEG: f64 = -8.0;
const FALSE_EASTING: f64 = 600_000.0;
const FALSE_NORTHING: f64 = 750_000.0;

/// Ellipsoid constants derived once per conversion batch.
#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    e2: f64,
    ep2: f64,
    meridian_origin: f64,
}

impl Ellipsoid {
    fn grs80() -> Self {
        let flattening = 1.0 / INVERSE_FLATTENING;
        let e2 = flattening * (2.0 - flattening);
        let mut ellipsoid = Self {
            e2,
            ep2: e2 / (1.0 - e2),
            meridian_origin: 0.0,
        };
        ellipsoid.meridian_origin = ellipsoid.meridian_arc(ORIGIN_LATITUDE_DEG.to_radians());
        ellipsoid
    }

    fn rectifying_factor(self) -> f64 {
        let e4 = self.e2 * self.e2;
        let e6 = e4 * self.e2;
        1.0 - self.e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0
    }

    /// Distance along the meridian from the equator to `phi`.
    fn meridian_arc(self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        SEMI_MAJOR_AXIS
            * (self.rectifying_factor() * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Latitude whose meridian arc equals `arc`.
    fn footpoint_latitude(self, arc: f64) -> f64 {
        let mu = arc / (SEMI_MAJOR_AXIS * self.rectifying_factor());
        let root = (1.0 - self.e2).sqrt();
        let e1 = (1.0 - root) / (1.0 + root);
        mu + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin()
    }
}

/// Converts ITM eastings and northings to longitude/latitude.
///
/// # Examples
/// ```
/// use finder_data::ItmToWgs84;
///
/// let origin = ItmToWgs84::new().convert(600_000.0, 750_000.0);
/// assert!((origin.x() + 8.0).abs() < 1e-9);
/// assert!((origin.y() - 53.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ItmToWgs84 {
    ellipsoid: Ellipsoid,
}

impl Default for ItmToWgs84 {
    fn default() -> Self {
        Self::new()
    }
}

impl ItmToWgs84 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ellipsoid: Ellipsoid::grs80(),
        }
    }

    /// Convert one position, returning `x = longitude`, `y = latitude` in
    /// degrees.
    #[must_use]
    pub fn convert(&self, easting: f64, northing: f64) -> Point<f64> {
        let ellipsoid = self.ellipsoid;
        let (e2, ep2) = (ellipsoid.e2, ellipsoid.ep2);

        let arc = ellipsoid.meridian_origin + (northing - FALSE_NORTHING) / SCALE_FACTOR;
        let phi1 = ellipsoid.footpoint_latitude(arc);
        let (sin1, cos1, tan1) = (phi1.sin(), phi1.cos(), phi1.tan());

        let c1 = ep2 * cos1 * cos1;
        let t1 = tan1 * tan1;
        let denominator = 1.0 - e2 * sin1 * sin1;
        let n1 = SEMI_MAJOR_AXIS / denominator.sqrt();
        let r1 = SEMI_MAJOR_AXIS * (1.0 - e2) / denominator.powf(1.5);
        let d = (easting - FALSE_EASTING) / (n1 * SCALE_FACTOR);

        let latitude = phi1
            - (n1 * tan1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let longitude = CENTRAL_MERIDIAN_DEG.to_radians()
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos1;

        Point::new(longitude.to_degrees(), latitude.to_degrees())
    }

    /// Convert a GeoJSON `[easting, northing]` position.
    #[must_use]
    pub fn convert_position(&self, [easting, northing]: [f64; 2]) -> [f64; 2] {
        let point = self.convert(easting, northing);
        [point.x(), point.y()]
    }
}
