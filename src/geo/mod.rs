//! Geographic helpers for map overlays.
//!
//! This module converts GeoJSON into renderable features, projects
//! coordinates to the canvas, and paints map layers.

mod feature;
pub mod projection;
mod renderer;

pub use feature::{features_bounds, features_from_geojson, polygons_from_geometry, GeoFeature};
pub use projection::MapProjection;
pub use renderer::render_map_layers;
