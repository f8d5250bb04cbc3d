//! Map layer rendering.
//!
//! Paints the layers of a `MapScene` onto the egui canvas, bottom first.

use super::{GeoFeature, MapProjection};
use crate::map::{LayerKind, LayerSpec, MapScene};
use eframe::egui::{epaint::PathShape, Color32, Painter, Pos2, Shape, Stroke};
use geo_types::{Coord, LineString, Polygon};

/// Renders all visible layers of the scene.
pub fn render_map_layers(painter: &Painter, scene: &MapScene) {
    let projection = scene.projection();

    for layer in scene.layers() {
        if !layer.paint.is_visible() {
            continue;
        }
        let Some(source) = scene.source(&layer.source) else {
            continue;
        };
        if let Some(bounds) = source.bounds {
            if !projection.bbox_visible(
                bounds.min().x,
                bounds.min().y,
                bounds.max().x,
                bounds.max().y,
            ) {
                continue;
            }
        }

        for feature in &source.features {
            render_feature(painter, layer, feature, &projection);
        }
    }
}

fn render_feature(
    painter: &Painter,
    layer: &LayerSpec,
    feature: &GeoFeature,
    projection: &MapProjection,
) {
    let color = layer.paint.effective_color();

    match (layer.kind, feature) {
        (LayerKind::Fill, GeoFeature::Polygons(polygons)) => {
            for polygon in polygons {
                render_polygon_fill(painter, polygon, projection, color);
            }
        }
        (LayerKind::Line, GeoFeature::Polygons(polygons)) => {
            let stroke = Stroke::new(layer.paint.width, color);
            for polygon in polygons {
                render_ring(painter, polygon.exterior(), projection, stroke);
                for hole in polygon.interiors() {
                    render_ring(painter, hole, projection, stroke);
                }
            }
        }
        (LayerKind::Line, GeoFeature::LineString(coords)) => {
            render_line_string(painter, coords, projection, Stroke::new(layer.paint.width, color));
        }
        (LayerKind::Line, GeoFeature::MultiLineString(lines)) => {
            let stroke = Stroke::new(layer.paint.width, color);
            for coords in lines {
                render_line_string(painter, coords, projection, stroke);
            }
        }
        (_, GeoFeature::Point(coord)) => {
            painter.circle_filled(projection.geo_to_screen(*coord), 3.0, color);
        }
        _ => {}
    }
}

/// Fills the exterior ring of a polygon.
///
/// egui path fills assume a convex outline, so concave boundaries are drawn
/// approximately; the outline layer carries the exact shape.
fn render_polygon_fill(
    painter: &Painter,
    polygon: &Polygon<f64>,
    projection: &MapProjection,
    color: Color32,
) {
    let points: Vec<Pos2> = polygon
        .exterior()
        .coords()
        .map(|c| projection.geo_to_screen(*c))
        .collect();
    if points.len() < 3 {
        return;
    }
    painter.add(Shape::Path(PathShape::convex_polygon(
        points,
        color,
        Stroke::NONE,
    )));
}

fn render_ring(
    painter: &Painter,
    ring: &LineString<f64>,
    projection: &MapProjection,
    stroke: Stroke,
) {
    render_line_string(painter, &ring.0, projection, stroke);
}

/// Renders a line string (boundary, outline, etc.).
fn render_line_string(
    painter: &Painter,
    coords: &[Coord<f64>],
    projection: &MapProjection,
    stroke: Stroke,
) {
    if coords.len() < 2 || stroke.width <= 0.0 {
        return;
    }

    let screen_points: Vec<Pos2> = coords
        .iter()
        .map(|c| projection.geo_to_screen(*c))
        .collect();

    for window in screen_points.windows(2) {
        if let [p1, p2] = window {
            // Skip sub-pixel segments
            let dist_sq = (p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2);
            if dist_sq > 0.5 {
                painter.line_segment([*p1, *p2], stroke);
            }
        }
    }
}
