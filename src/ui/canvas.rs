//! Central canvas UI: the map.

use super::colors;
use crate::areas::AreaKind;
use crate::geo::{render_map_layers, MapProjection};
use crate::map::{BaseStyle, CameraView, MapHandle, MapScene, Popup};
use crate::reports::MARKER_SIZE;
use crate::state::AppState;
use eframe::egui::{self, Align2, FontId, Painter, Pos2, Rect, RichText, Sense, Stroke, Vec2};
use std::time::Duration;

const DOUBLE_CLICK_ZOOM: f64 = 2.0;
const DOUBLE_CLICK_DURATION: Duration = Duration::from_millis(800);

/// Render the map canvas and route pointer input to the map.
pub fn render_canvas(ctx: &egui::Context, state: &mut AppState) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE)
        .show(ctx, |ui| {
            let available_size = ui.available_size();
            let (response, painter) = ui.allocate_painter(available_size, Sense::click_and_drag());
            let rect = response.rect;

            let Some(map) = state.map.as_mut() else {
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    "Map not initialized",
                    FontId::proportional(14.0),
                    colors::map::OVERLAY_TEXT,
                );
                return;
            };
            map.set_screen_rect(rect);

            let projection = map.projection();
            render_base(&painter, &projection, rect, map.base_style());
            render_map_layers(&painter, map);

            if state.layer_state.labels && map.base_style().shows_labels() {
                render_area_labels(&painter, state, &projection);
            }
            if state.layer_state.reports {
                render_report_markers(&painter, state, &projection);
            }

            handle_canvas_interaction(&response, rect, state);

            if let Some(map) = state.map.as_ref() {
                if let Some(popup) = map.popup() {
                    render_popup(&painter, &map.projection(), popup);
                }
                draw_overlay_info(ui, &rect, map, response.hover_pos());
            }
        });
}

/// Background fill and a graticule scaled to the zoom level.
fn render_base(painter: &Painter, projection: &MapProjection, rect: Rect, style: BaseStyle) {
    painter.rect_filled(rect, 0.0, style.background());

    let step = graticule_step(projection.zoom);
    let (min_lon, min_lat, max_lon, max_lat) = projection.visible_bounds();
    let stroke = Stroke::new(1.0, style.grid());

    let mut lon = (min_lon / step).floor() * step;
    while lon <= max_lon {
        let top = projection.geo_to_screen(geo_types::Coord { x: lon, y: max_lat });
        let bottom = projection.geo_to_screen(geo_types::Coord { x: lon, y: min_lat });
        painter.line_segment([top, bottom], stroke);
        lon += step;
    }

    let mut lat = (min_lat / step).floor() * step;
    while lat <= max_lat {
        let left = projection.geo_to_screen(geo_types::Coord { x: min_lon, y: lat });
        let right = projection.geo_to_screen(geo_types::Coord { x: max_lon, y: lat });
        painter.line_segment([left, right], stroke);
        lat += step;
    }
}

/// Degrees between grid lines.
fn graticule_step(zoom: f64) -> f64 {
    match zoom {
        z if z < 4.0 => 10.0,
        z if z < 6.0 => 5.0,
        z if z < 8.0 => 1.0,
        z if z < 10.0 => 0.5,
        z if z < 12.0 => 0.1,
        _ => 0.05,
    }
}

fn render_area_labels(painter: &Painter, state: &AppState, projection: &MapProjection) {
    for area in state.registry.all() {
        if !state.layer_state.shows(area.kind) || !state.areas.is_on_map(&area.id) {
            continue;
        }
        // Barangay names only once they have room.
        if area.kind == AreaKind::Barangay && projection.zoom < 10.0 {
            continue;
        }
        let Ok(bounds) = area.bounds() else {
            continue;
        };
        let at = projection.geo_to_screen(bounds.center());
        if !painter.clip_rect().contains(at) {
            continue;
        }
        let size = if area.kind == AreaKind::Municipality {
            13.0
        } else {
            11.0
        };
        painter.text(
            at,
            Align2::CENTER_CENTER,
            &area.name,
            FontId::proportional(size),
            colors::map::LABEL,
        );
    }
}

fn render_report_markers(painter: &Painter, state: &AppState, projection: &MapProjection) {
    let selected = state.report_markers.selected_report();
    for marker in state.report_markers.markers() {
        let at = projection.geo_to_screen(marker.at);
        if !painter.clip_rect().expand(MARKER_SIZE).contains(at) {
            continue;
        }
        let stroke_width = if selected == Some(marker.report_id.as_str()) {
            3.0
        } else {
            2.0
        };
        painter.circle(
            at,
            MARKER_SIZE / 2.0,
            marker.status.color(),
            Stroke::new(stroke_width, egui::Color32::WHITE),
        );
        painter.text(
            at,
            Align2::CENTER_CENTER,
            marker.status.icon(),
            FontId::proportional(12.0),
            egui::Color32::WHITE,
        );
    }
}

fn render_popup(painter: &Painter, projection: &MapProjection, popup: &Popup) {
    let anchor = projection.geo_to_screen(popup.at) + Vec2::new(12.0, -12.0);
    let text = format!("{}\n{}", popup.title, popup.body);
    let galley = painter.layout_no_wrap(text, FontId::proportional(12.0), colors::map::LABEL);

    let rect = Rect::from_min_size(
        anchor - Vec2::new(0.0, galley.size().y),
        galley.size() + Vec2::splat(12.0),
    );
    painter.rect_filled(rect, 4.0, colors::map::POPUP_FILL);
    painter.rect_stroke(
        rect,
        4.0,
        Stroke::new(1.0, colors::map::POPUP_BORDER),
        egui::StrokeKind::Inside,
    );
    painter.galley(rect.min + Vec2::splat(6.0), galley, colors::map::LABEL);
}

fn draw_overlay_info(ui: &mut egui::Ui, rect: &Rect, map: &MapScene, hover: Option<Pos2>) {
    let overlay_pos = rect.left_top() + Vec2::new(10.0, 10.0);
    let overlay_rect = Rect::from_min_size(overlay_pos, Vec2::new(220.0, 50.0));
    let projection = map.projection();

    ui.scope_builder(egui::UiBuilder::new().max_rect(overlay_rect), |ui| {
        ui.vertical(|ui| {
            ui.label(
                RichText::new(format!("Zoom: {:.2}", projection.zoom))
                    .monospace()
                    .size(12.0)
                    .color(colors::map::OVERLAY_TEXT),
            );
            if let Some(pos) = hover {
                let at = projection.screen_to_geo(pos);
                ui.label(
                    RichText::new(format!("{:.4}, {:.4}", at.y, at.x))
                        .monospace()
                        .size(12.0)
                        .color(colors::map::OVERLAY_TEXT),
                );
            }
        });
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CanvasClick {
    Select,
    FlyIn,
}

/// The second click of a double-click only zooms.
fn canvas_click(clicked: bool, double_clicked: bool) -> Option<CanvasClick> {
    match (clicked, double_clicked) {
        (_, true) => Some(CanvasClick::FlyIn),
        (true, false) => Some(CanvasClick::Select),
        (false, false) => None,
    }
}

fn handle_canvas_interaction(response: &egui::Response, rect: Rect, state: &mut AppState) {
    let Some(map) = state.map.as_mut() else {
        return;
    };
    let mut events = Vec::new();

    if response.dragged() {
        map.pan_by(response.drag_delta());
    }

    if response.hovered() {
        let scroll_delta = response.ctx.input(|i| i.raw_scroll_delta);
        if scroll_delta.y != 0.0 {
            let anchor = response.hover_pos().unwrap_or(rect.center());
            let zoom = map.camera().view().zoom + scroll_delta.y as f64 * 0.002;
            map.zoom_around(zoom, anchor);
        }
    }

    let hover = response.hover_pos().filter(|p| rect.contains(*p));
    let pointer = hover.map(|p| map.projection().screen_to_geo(p));
    if !response.dragged() {
        events.extend(map.pointer_moved(pointer));
    }

    let mut report_hit = None;
    match (pointer, canvas_click(response.clicked(), response.double_clicked())) {
        (Some(at), Some(CanvasClick::Select)) => {
            // Markers sit above every map layer.
            let marker = hover
                .filter(|_| state.layer_state.reports)
                .and_then(|p| state.report_markers.marker_at(&map.projection(), p));
            match marker {
                Some(marker) => report_hit = Some(marker.report_id.clone()),
                None => events.extend(map.click(at)),
            }
        }
        (Some(at), Some(CanvasClick::FlyIn)) => {
            // Stack on a fly-in that is still running.
            let zoom = map.camera().destination().zoom + DOUBLE_CLICK_ZOOM;
            map.fly_to(CameraView::new(at, zoom), DOUBLE_CLICK_DURATION);
        }
        _ => {}
    }

    if !events.is_empty() {
        state.dispatch(events);
    }
    if let Some(report_id) = report_hit {
        state.fly_to_report(&report_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_click_of_double_click_does_not_select() {
        assert_eq!(canvas_click(true, false), Some(CanvasClick::Select));
        assert_eq!(canvas_click(true, true), Some(CanvasClick::FlyIn));
        assert_eq!(canvas_click(false, false), None);
    }

    #[test]
    fn test_graticule_gets_finer_with_zoom() {
        assert!(graticule_step(3.0) > graticule_step(7.0));
        assert!(graticule_step(7.0) > graticule_step(13.0));
    }
}
