// Coordinate reprojection between the wire frame (WGS84) and the map frame (Web Mercator)

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;


/// Equatorial radius used by EPSG:3857 (metres)
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude limit of the square Web Mercator world
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Longitude/latitude pair in degrees (EPSG:4326)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub longitude: f64,
    pub latitude: f64,
}

/// Projected coordinate in metres (EPSG:3857)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl LonLat {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Project into Web Mercator.
    ///
    /// Latitude is clamped to [`MAX_LATITUDE`] so the poles map to finite
    /// values.
    pub fn to_mercator(self) -> MercatorPoint {
        let lat = self.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE);
        let x = EARTH_RADIUS * self.longitude.to_radians();
        let y = EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        MercatorPoint { x, y }
    }
}

impl MercatorPoint {
    /// Inverse projection back to longitude/latitude degrees
    pub fn to_lon_lat(self) -> LonLat {
        let longitude = (self.x / EARTH_RADIUS).to_degrees();
        let latitude = (2.0 * (self.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        LonLat {
            longitude,
            latitude,
        }
    }
}

impl From<LonLat> for MercatorPoint {
    fn from(value: LonLat) -> Self {
        value.to_mercator()
    }
}
