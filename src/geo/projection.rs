//! Map projection and coordinate transformation.
//!
//! Handles converting between geographic coordinates (lng/lat) and
//! screen coordinates using the Web Mercator projection with 512 px tiles,
//! the same zoom scale the analysis dashboards are tuned for.

use eframe::egui::{Pos2, Rect, Vec2};
use geo_types::Coord;
use std::f64::consts::PI;

/// Tile size in pixels at zoom 0.
pub const TILE_SIZE: f64 = 512.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Lowest and highest zoom levels the camera accepts.
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;

/// Returns the world width in pixels at the given zoom level.
pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Projects lng/lat to normalized mercator coordinates in `[0, 1]`.
pub fn to_mercator(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coord {
        x: (coord.x + 180.0) / 360.0,
        y: (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0,
    }
}

/// Inverse of [`to_mercator`].
pub fn from_mercator(merc: Coord<f64>) -> Coord<f64> {
    let n = PI - 2.0 * PI * merc.y;
    Coord {
        x: merc.x * 360.0 - 180.0,
        y: n.sinh().atan().to_degrees(),
    }
}

/// Map projection for converting geographic to screen coordinates.
#[derive(Debug, Clone)]
pub struct MapProjection {
    /// Geographic center of the view
    pub center: Coord<f64>,
    /// Current zoom level
    pub zoom: f64,
    /// Pan offset in screen pixels (applied during an active drag)
    pub pan_offset: Vec2,
    /// Screen rectangle for the canvas
    pub screen_rect: Rect,
}

impl Default for MapProjection {
    fn default() -> Self {
        Self {
            center: Coord {
                x: 125.1275,
                y: 8.1569,
            },
            zoom: 7.0,
            pan_offset: Vec2::ZERO,
            screen_rect: Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
        }
    }
}

impl MapProjection {
    /// Creates a new projection centered on a coordinate.
    pub fn new(center: Coord<f64>, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            ..Default::default()
        }
    }

    /// Updates the projection with current view state.
    pub fn update(&mut self, pan_offset: Vec2, screen_rect: Rect) {
        self.pan_offset = pan_offset;
        self.screen_rect = screen_rect;
    }

    /// Converts geographic coordinates (lng, lat) to screen position.
    pub fn geo_to_screen(&self, coord: Coord<f64>) -> Pos2 {
        let size = world_size(self.zoom);
        let point = to_mercator(coord);
        let center = to_mercator(self.center);

        let origin = self.screen_rect.center() + self.pan_offset;
        Pos2::new(
            origin.x + ((point.x - center.x) * size) as f32,
            origin.y + ((point.y - center.y) * size) as f32,
        )
    }

    /// Converts screen position to geographic coordinates (lng, lat).
    pub fn screen_to_geo(&self, pos: Pos2) -> Coord<f64> {
        let size = world_size(self.zoom);
        let center = to_mercator(self.center);
        let origin = self.screen_rect.center() + self.pan_offset;

        from_mercator(Coord {
            x: center.x + (pos.x - origin.x) as f64 / size,
            y: center.y + (pos.y - origin.y) as f64 / size,
        })
    }

    /// Returns the visible geographic bounds as (min_lon, min_lat, max_lon, max_lat).
    pub fn visible_bounds(&self) -> (f64, f64, f64, f64) {
        let top_left = self.screen_to_geo(self.screen_rect.left_top());
        let bottom_right = self.screen_to_geo(self.screen_rect.right_bottom());

        (
            top_left.x.min(bottom_right.x),
            top_left.y.min(bottom_right.y),
            top_left.x.max(bottom_right.x),
            top_left.y.max(bottom_right.y),
        )
    }

    /// Checks if a bounding box intersects with the visible bounds.
    pub fn bbox_visible(&self, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> bool {
        let (vis_min_lon, vis_min_lat, vis_max_lon, vis_max_lat) = self.visible_bounds();

        !(max_lon < vis_min_lon
            || min_lon > vis_max_lon
            || max_lat < vis_min_lat
            || min_lat > vis_max_lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercator_round_trip_near_region() {
        let coord = Coord {
            x: 125.1275,
            y: 8.1569,
        };
        let back = from_mercator(to_mercator(coord));
        assert!((back.x - coord.x).abs() < 1e-9);
        assert!((back.y - coord.y).abs() < 1e-9);
    }

    #[test]
    fn test_center_projects_to_screen_center() {
        let projection = MapProjection::default();
        let pos = projection.geo_to_screen(projection.center);
        assert_eq!(pos, projection.screen_rect.center());
    }

    #[test]
    fn test_higher_zoom_shrinks_visible_bounds() {
        let low = MapProjection::new(Coord { x: 125.0, y: 8.0 }, 7.0);
        let high = MapProjection::new(Coord { x: 125.0, y: 8.0 }, 9.0);

        let (l_min_x, _, l_max_x, _) = low.visible_bounds();
        let (h_min_x, _, h_max_x, _) = high.visible_bounds();
        assert!((h_max_x - h_min_x) < (l_max_x - l_min_x));
        assert!(high.bbox_visible(124.99, 7.99, 125.01, 8.01));
        assert!(!high.bbox_visible(10.0, 10.0, 11.0, 11.0));
    }
}
