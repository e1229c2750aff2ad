//! Geographic and screen-space value types.

use std::fmt;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Maximum supported zoom level.
pub const MAX_ZOOM: f64 = 22.0;

/// Side length in pixels of one Web Mercator tile.
pub const TILE_SIZE: f64 = 256.0;

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    /// Latitude outside -90..=90 or not finite.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside -180..=180 or not finite.
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// Zoom outside 0..=22 or not finite.
    #[error("Invalid zoom: {0}")]
    InvalidZoom(f64),

    /// Viewport with a non-positive width or height.
    #[error("Invalid viewport size: {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
}

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl LatLon {
    /// Create a coordinate without validation.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range values.
    pub fn try_new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::InvalidLatitude(lat));
        }
        if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(GeoError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// GeoJSON position order: `[lon, lat]`.
    pub fn to_position(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Build from a GeoJSON `[lon, lat]` position.
    pub fn from_position(position: [f64; 2]) -> Result<Self, GeoError> {
        Self::try_new(position[1], position[0])
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lon)
    }
}

/// A point in screen pixels, origin at the top-left of the map view.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Offset this point by `(dx, dy)` pixels.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}
