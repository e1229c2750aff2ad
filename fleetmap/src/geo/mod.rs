//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator pixel coordinates, plus the [`Viewport`] camera used to
//! place markers on screen and resolve taps back to the map.

mod types;

pub use types::{
    GeoError, LatLon, ScreenPoint, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON, TILE_SIZE,
};

use std::f64::consts::PI;

/// Size in pixels of the whole Web Mercator world at `zoom`.
#[inline]
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2.0_f64.powf(zoom)
}

/// Converts a geographic coordinate to global Web Mercator pixels.
///
/// Latitude is clamped to the Mercator limits so polar inputs stay finite.
#[inline]
pub fn to_world_pixels(point: LatLon, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = point.lat.clamp(MIN_LAT, MAX_LAT);

    let x = (point.lon + 180.0) / 360.0 * size;
    let lat_rad = lat * PI / 180.0;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * size;

    (x, y)
}

/// Converts global Web Mercator pixels back to a geographic coordinate.
#[inline]
pub fn from_world_pixels(x: f64, y: f64, zoom: f64) -> LatLon {
    let size = world_size(zoom);

    let lon = x / size * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * y / size)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    LatLon::new(lat, lon)
}

/// Map camera: what part of the world is on screen and at what scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Geographic point at the center of the view.
    pub center: LatLon,
    /// Fractional zoom level (0 = whole world in one tile).
    pub zoom: f64,
    /// View width in pixels.
    pub width: f64,
    /// View height in pixels.
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: LatLon::new(40.7128, -74.0060),
            zoom: 11.0,
            width: 1080.0,
            height: 1920.0,
        }
    }
}

impl Viewport {
    /// Re-run the checks of [`Viewport::new`] on a value whose public
    /// fields may have been set directly.
    pub fn validated(self) -> Result<Self, GeoError> {
        Self::new(self.center, self.zoom, self.width, self.height)
    }

    /// Create a validated viewport.
    pub fn new(center: LatLon, zoom: f64, width: f64, height: f64) -> Result<Self, GeoError> {
        let center = LatLon::try_new(center.lat, center.lon)?;
        if !zoom.is_finite() || !(0.0..=MAX_ZOOM).contains(&zoom) {
            return Err(GeoError::InvalidZoom(zoom));
        }
        if !(width > 0.0 && height > 0.0) {
            return Err(GeoError::InvalidSize { width, height });
        }
        Ok(Self {
            center,
            zoom,
            width,
            height,
        })
    }

    /// Move the camera to a new center.
    pub fn with_center(mut self, center: LatLon) -> Self {
        self.center = center;
        self
    }

    /// Projects a coordinate to screen pixels.
    ///
    /// Longitudes are wrapped to the copy of the world nearest the center,
    /// so markers just across the antimeridian land next to the view.
    pub fn project(&self, point: LatLon) -> ScreenPoint {
        let size = world_size(self.zoom);
        let (cx, cy) = to_world_pixels(self.center, self.zoom);
        let (px, py) = to_world_pixels(point, self.zoom);

        let mut dx = px - cx;
        if dx > size / 2.0 {
            dx -= size;
        } else if dx < -size / 2.0 {
            dx += size;
        }

        ScreenPoint::new(self.width / 2.0 + dx, self.height / 2.0 + (py - cy))
    }

    /// Converts screen pixels back to a coordinate.
    pub fn unproject(&self, point: ScreenPoint) -> LatLon {
        let size = world_size(self.zoom);
        let (cx, cy) = to_world_pixels(self.center, self.zoom);

        let mut x = cx + (point.x - self.width / 2.0);
        let y = (cy + (point.y - self.height / 2.0)).clamp(0.0, size);
        x = x.rem_euclid(size);

        from_world_pixels(x, y, self.zoom)
    }

    /// Whether a screen point lies inside the view bounds.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nyc_viewport() -> Viewport {
        Viewport::new(LatLon::new(40.7128, -74.0060), 12.0, 800.0, 600.0).unwrap()
    }

    #[test]
    fn test_center_projects_to_view_middle() {
        let viewport = nyc_viewport();
        let point = viewport.project(viewport.center);
        assert!((point.x - 400.0).abs() < 1e-6);
        assert!((point.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_world_pixels_at_zoom_zero() {
        let (x, y) = to_world_pixels(LatLon::new(0.0, 0.0), 0.0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_north_is_up_and_east_is_right() {
        let viewport = nyc_viewport();
        let north = viewport.project(LatLon::new(40.75, -74.0060));
        let east = viewport.project(LatLon::new(40.7128, -73.95));

        assert!(north.y < 300.0, "north should be above center");
        assert!(east.x > 400.0, "east should be right of center");
    }

    #[test]
    fn test_unproject_roundtrip() {
        let viewport = nyc_viewport();
        let original = LatLon::new(40.73, -73.99);
        let screen = viewport.project(original);
        let back = viewport.unproject(screen);

        assert!((back.lat - original.lat).abs() < 1e-9);
        assert!((back.lon - original.lon).abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_wraps_to_nearest_copy() {
        let viewport = Viewport::new(LatLon::new(0.0, 179.9), 6.0, 400.0, 400.0).unwrap();
        let across = viewport.project(LatLon::new(0.0, -179.9));
        assert!(across.x > 200.0, "marker across the antimeridian lies east");
        assert!(across.x < 400.0);
    }

    #[test]
    fn test_invalid_viewport_rejected() {
        assert!(matches!(
            Viewport::new(LatLon::new(0.0, 0.0), 30.0, 100.0, 100.0),
            Err(GeoError::InvalidZoom(_))
        ));
        assert!(matches!(
            Viewport::new(LatLon::new(0.0, 0.0), 3.0, 0.0, 100.0),
            Err(GeoError::InvalidSize { .. })
        ));
        assert!(matches!(
            Viewport::new(LatLon::new(95.0, 0.0), 3.0, 10.0, 100.0),
            Err(GeoError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_validated_catches_field_edits() {
        assert_eq!(nyc_viewport().validated(), Ok(nyc_viewport()));

        let mut viewport = nyc_viewport();
        viewport.zoom = f64::NAN;
        assert!(matches!(viewport.validated(), Err(GeoError::InvalidZoom(_))));

        let mut viewport = nyc_viewport();
        viewport.height = -1.0;
        assert!(matches!(viewport.validated(), Err(GeoError::InvalidSize { .. })));
    }

    #[test]
    fn test_latlon_position_order() {
        let point = LatLon::new(40.1, -73.9);
        assert_eq!(point.to_position(), [-73.9, 40.1]);
        assert_eq!(LatLon::from_position([-73.9, 40.1]).unwrap(), point);
    }

    #[test]
    fn test_latlon_rejects_nan() {
        assert!(LatLon::try_new(f64::NAN, 0.0).is_err());
        assert!(LatLon::try_new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_contains() {
        let viewport = nyc_viewport();
        assert!(viewport.contains(ScreenPoint::new(10.0, 10.0)));
        assert!(!viewport.contains(ScreenPoint::new(-1.0, 10.0)));
        assert!(!viewport.contains(ScreenPoint::new(10.0, 601.0)));
    }
}
