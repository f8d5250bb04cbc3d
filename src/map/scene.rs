//! Retained map scene: the single live map the UI renders.

use super::camera::{AnimationId, Camera, CameraCurve, CameraView};
use super::styles::BaseStyle;
use super::{LayerEvent, LayerSpec, MapError, MapEvent, MapHandle, PaintProperty, Popup};
use crate::geo::projection::{from_mercator, to_mercator, world_size, MapProjection};
use crate::geo::{features_bounds, features_from_geojson, GeoFeature};
use eframe::egui::{Pos2, Rect as ScreenRect, Vec2};
use geo_types::{Coord, Rect};
use geojson::GeoJson;
use std::collections::HashSet;
use std::time::Duration;

/// A GeoJSON source with its features pre-converted for rendering.
#[derive(Debug, Clone)]
pub struct Source {
    pub features: Vec<GeoFeature>,
    pub bounds: Option<Rect<f64>>,
}

impl Source {
    fn contains(&self, at: Coord<f64>) -> bool {
        let in_bounds = self.bounds.is_some_and(|b| {
            at.x >= b.min().x && at.x <= b.max().x && at.y >= b.min().y && at.y <= b.max().y
        });
        in_bounds && self.features.iter().any(|f| f.contains(at))
    }
}

/// The live map: sources, ordered layers, listeners, camera and tooltip.
#[derive(Debug, Clone)]
pub struct MapScene {
    sources: Vec<(String, Source)>,
    layers: Vec<LayerSpec>,
    listeners: HashSet<(MapEvent, String)>,
    camera: Camera,
    screen_rect: ScreenRect,
    popup: Option<Popup>,
    base_style: BaseStyle,
    hovered: Vec<String>,
    last_pointer: Option<Coord<f64>>,
}

impl MapScene {
    pub fn new(view: CameraView, base_style: BaseStyle) -> Self {
        Self {
            sources: Vec::new(),
            layers: Vec::new(),
            listeners: HashSet::new(),
            camera: Camera::new(view),
            screen_rect: ScreenRect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0)),
            popup: None,
            base_style,
            hovered: Vec::new(),
            last_pointer: None,
        }
    }

    /// Layers in draw order (bottom first).
    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn source(&self, id: &str) -> Option<&Source> {
        self.sources.iter().find(|(k, _)| k == id).map(|(_, s)| s)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn listener_count(&self, event: MapEvent) -> usize {
        self.listeners.iter().filter(|(e, _)| *e == event).count()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn base_style(&self) -> BaseStyle {
        self.base_style
    }

    /// Switches the base style. Custom sources and layers are kept as they are.
    pub fn set_base_style(&mut self, key: &str) -> Result<BaseStyle, MapError> {
        let style = BaseStyle::from_key(key).ok_or_else(|| MapError::UnknownStyle(key.into()))?;
        if style != self.base_style {
            log::info!(
                "Changing base style to {} ({} custom layer(s) kept)",
                style.label(),
                self.layers.len()
            );
            self.base_style = style;
        }
        Ok(style)
    }

    /// Updates the canvas rectangle used for projection and fitting.
    pub fn set_screen_rect(&mut self, rect: ScreenRect) {
        self.screen_rect = rect;
    }

    pub fn projection(&self) -> MapProjection {
        let view = self.camera.view();
        let mut projection = MapProjection::new(view.center, view.zoom);
        projection.update(Vec2::ZERO, self.screen_rect);
        projection
    }

    /// Steps camera transitions. Returns the id of a transition that just finished.
    pub fn advance(&mut self, dt: Duration) -> Option<AnimationId> {
        self.camera.advance(dt)
    }

    /// Pans the camera by a screen-space drag delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        let projection = self.projection();
        let center = projection.screen_to_geo(self.screen_rect.center() - delta);
        let zoom = self.camera.view().zoom;
        self.camera.jump_to(CameraView::new(center, zoom));
    }

    /// Zooms keeping the geographic point under `anchor` fixed on screen.
    pub fn zoom_around(&mut self, zoom: f64, anchor: Pos2) {
        let projection = self.projection();
        let fixed = to_mercator(projection.screen_to_geo(anchor));
        let target = CameraView::new(self.camera.view().center, zoom);

        let size = world_size(target.zoom);
        let offset = anchor - self.screen_rect.center();
        let center = from_mercator(Coord {
            x: fixed.x - offset.x as f64 / size,
            y: fixed.y - offset.y as f64 / size,
        });
        self.camera.jump_to(CameraView::new(center, target.zoom));
    }

    /// Listening layers whose source geometry contains `at`, topmost first.
    pub fn hit_test(&self, at: Coord<f64>) -> Vec<String> {
        self.layers
            .iter()
            .rev()
            .filter(|layer| {
                MapEvent::all()
                    .iter()
                    .any(|e| self.listeners.contains(&(*e, layer.id.clone())))
            })
            .filter(|layer| self.source(&layer.source).is_some_and(|s| s.contains(at)))
            .map(|layer| layer.id.clone())
            .collect()
    }

    /// Tracks the pointer and reports enter/leave events for listening layers.
    ///
    /// `None` means the pointer left the map.
    pub fn pointer_moved(&mut self, at: Option<Coord<f64>>) -> Vec<LayerEvent> {
        let hits = at.map(|c| self.hit_test(c)).unwrap_or_default();
        let anchor = at.or(self.last_pointer).unwrap_or(self.camera.view().center);
        let mut events = Vec::new();

        for layer_id in &self.hovered {
            if !hits.contains(layer_id) && self.has_listener(MapEvent::PointerLeave, layer_id) {
                events.push(LayerEvent {
                    event: MapEvent::PointerLeave,
                    layer_id: layer_id.clone(),
                    at: anchor,
                });
            }
        }
        for layer_id in &hits {
            if !self.hovered.contains(layer_id)
                && self.has_listener(MapEvent::PointerEnter, layer_id)
            {
                events.push(LayerEvent {
                    event: MapEvent::PointerEnter,
                    layer_id: layer_id.clone(),
                    at: anchor,
                });
            }
        }

        self.hovered = hits;
        self.last_pointer = at;
        events
    }

    /// Click events for every click-listening layer under `at`.
    pub fn click(&self, at: Coord<f64>) -> Vec<LayerEvent> {
        self.hit_test(at)
            .into_iter()
            .filter(|id| self.has_listener(MapEvent::Click, id))
            .map(|layer_id| LayerEvent {
                event: MapEvent::Click,
                layer_id,
                at,
            })
            .collect()
    }

    fn viewport(&self) -> (f32, f32) {
        (self.screen_rect.width(), self.screen_rect.height())
    }
}

impl Default for MapScene {
    fn default() -> Self {
        Self::new(
            CameraView::new(
                Coord {
                    x: 125.1275,
                    y: 8.1569,
                },
                7.0,
            ),
            BaseStyle::default(),
        )
    }
}

impl MapHandle for MapScene {
    fn add_source(&mut self, id: &str, data: GeoJson) -> Result<(), MapError> {
        if self.has_source(id) {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        let features =
            features_from_geojson(&data).map_err(|reason| MapError::InvalidGeometry {
                source_id: id.to_string(),
                reason,
            })?;
        let bounds = features_bounds(&features);
        self.sources.push((
            id.to_string(),
            Source { features, bounds },
        ));
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), MapError> {
        if let Some(layer) = self.layers.iter().find(|l| l.source == id) {
            return Err(MapError::SourceInUse {
                source_id: id.to_string(),
                layer_id: layer.id.clone(),
            });
        }
        let index = self
            .sources
            .iter()
            .position(|(k, _)| k == id)
            .ok_or_else(|| MapError::UnknownSource(id.to_string()))?;
        self.sources.remove(index);
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|(k, _)| k == id)
    }

    fn add_layer(&mut self, layer: LayerSpec, before: Option<&str>) -> Result<(), MapError> {
        if self.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id));
        }
        if !self.has_source(&layer.source) {
            return Err(MapError::UnknownSource(layer.source));
        }
        match before.and_then(|id| self.layers.iter().position(|l| l.id == id)) {
            Some(index) => self.layers.insert(index, layer),
            None => self.layers.push(layer),
        }
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| MapError::UnknownLayer(id.to_string()))?;
        self.layers.remove(index);
        self.listeners.retain(|(_, layer_id)| layer_id != id);
        self.hovered.retain(|layer_id| layer_id != id);
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    fn set_paint(&mut self, layer_id: &str, property: PaintProperty) -> Result<(), MapError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == layer_id)
            .ok_or_else(|| MapError::UnknownLayer(layer_id.to_string()))?;

        if property.applies_to() != layer.kind {
            return Err(MapError::PaintMismatch {
                layer_id: layer_id.to_string(),
                property: property.name(),
                kind: layer.kind.label(),
            });
        }

        match property {
            PaintProperty::FillColor(c) | PaintProperty::LineColor(c) => layer.paint.color = c,
            PaintProperty::FillOpacity(o) | PaintProperty::LineOpacity(o) => {
                layer.paint.opacity = o
            }
            PaintProperty::LineWidth(w) => layer.paint.width = w,
        }
        Ok(())
    }

    fn zoom(&self) -> f64 {
        self.camera.view().zoom
    }

    fn ease_to(&mut self, view: CameraView, duration: Duration) -> AnimationId {
        self.camera.start(view, duration, CameraCurve::Ease)
    }

    fn fly_to(&mut self, view: CameraView, duration: Duration) -> AnimationId {
        self.camera.start(view, duration, CameraCurve::Fly)
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: f32, duration: Duration) -> AnimationId {
        let view = Camera::fit_view(bounds, self.viewport(), padding);
        self.camera.start(view, duration, CameraCurve::Ease)
    }

    fn is_animating(&self, id: AnimationId) -> bool {
        self.camera.is_animating(id)
    }

    fn on(&mut self, event: MapEvent, layer_id: &str) -> bool {
        self.listeners.insert((event, layer_id.to_string()))
    }

    fn off(&mut self, event: MapEvent, layer_id: &str) {
        self.listeners.remove(&(event, layer_id.to_string()));
    }

    fn has_listener(&self, event: MapEvent, layer_id: &str) -> bool {
        self.listeners.contains(&(event, layer_id.to_string()))
    }

    fn show_popup(&mut self, popup: Popup) {
        self.popup = Some(popup);
    }

    fn hide_popup(&mut self) {
        self.popup = None;
    }
}
