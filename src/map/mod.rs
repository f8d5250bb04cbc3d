//! Live map handle: sources, paint layers, camera, listeners and tooltip.
//!
//! `MapHandle` is the capability surface the area and analysis managers
//! work against. `MapScene` is the retained implementation the canvas
//! renders every frame.

mod camera;
mod scene;
mod styles;

pub use camera::{AnimationId, Camera, CameraView};
pub use scene::MapScene;
pub use styles::BaseStyle;

use eframe::egui::Color32;
use geo_types::{Coord, Rect};
use geojson::GeoJson;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by map operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    #[error("source '{0}' already exists")]
    DuplicateSource(String),

    #[error("layer '{0}' already exists")]
    DuplicateLayer(String),

    #[error("source '{0}' does not exist")]
    UnknownSource(String),

    #[error("layer '{0}' does not exist")]
    UnknownLayer(String),

    #[error("source '{source_id}' is still used by layer '{layer_id}'")]
    SourceInUse { source_id: String, layer_id: String },

    #[error("paint property {property} does not apply to {kind} layer '{layer_id}'")]
    PaintMismatch {
        layer_id: String,
        property: &'static str,
        kind: &'static str,
    },

    #[error("invalid geometry in source '{source_id}': {reason}")]
    InvalidGeometry { source_id: String, reason: String },

    #[error("unknown base style '{0}'")]
    UnknownStyle(String),
}

/// Geometry type a layer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Fill,
    Line,
}

impl LayerKind {
    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
        }
    }
}

/// Paint state of a layer. Line width is ignored for fill layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color32,
    pub opacity: f32,
    pub width: f32,
}

impl Paint {
    /// Fully transparent paint, the initial state of area layers.
    pub const HIDDEN: Paint = Paint {
        color: Color32::TRANSPARENT,
        opacity: 0.0,
        width: 0.0,
    };

    pub fn fill(color: Color32, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            width: 0.0,
        }
    }

    pub fn line(color: Color32, width: f32, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            width,
        }
    }

    /// Whether anything would be drawn with this paint.
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && self.color.a() > 0
    }

    /// Color with the layer opacity applied.
    pub fn effective_color(&self) -> Color32 {
        self.color.gamma_multiply(self.opacity.clamp(0.0, 1.0))
    }
}

/// A single paint property update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintProperty {
    FillColor(Color32),
    FillOpacity(f32),
    LineColor(Color32),
    LineOpacity(f32),
    LineWidth(f32),
}

impl PaintProperty {
    pub fn name(&self) -> &'static str {
        match self {
            PaintProperty::FillColor(_) => "fill-color",
            PaintProperty::FillOpacity(_) => "fill-opacity",
            PaintProperty::LineColor(_) => "line-color",
            PaintProperty::LineOpacity(_) => "line-opacity",
            PaintProperty::LineWidth(_) => "line-width",
        }
    }

    fn applies_to(&self) -> LayerKind {
        match self {
            PaintProperty::FillColor(_) | PaintProperty::FillOpacity(_) => LayerKind::Fill,
            _ => LayerKind::Line,
        }
    }
}

/// Declarative description of a layer to add.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    pub paint: Paint,
}

impl LayerSpec {
    pub fn fill(id: impl Into<String>, source: impl Into<String>, paint: Paint) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            kind: LayerKind::Fill,
            paint,
        }
    }

    pub fn line(id: impl Into<String>, source: impl Into<String>, paint: Paint) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            kind: LayerKind::Line,
            paint,
        }
    }
}

/// Pointer events a layer can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEvent {
    Click,
    PointerEnter,
    PointerLeave,
}

impl MapEvent {
    pub fn all() -> &'static [MapEvent] {
        &[MapEvent::Click, MapEvent::PointerEnter, MapEvent::PointerLeave]
    }
}

/// An event delivered to a listening layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEvent {
    pub event: MapEvent,
    pub layer_id: String,
    pub at: Coord<f64>,
}

/// Tooltip anchored to a map coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub at: Coord<f64>,
    pub title: String,
    pub body: String,
}

/// Capability surface of the live map.
pub trait MapHandle {
    fn add_source(&mut self, id: &str, data: GeoJson) -> Result<(), MapError>;
    fn remove_source(&mut self, id: &str) -> Result<(), MapError>;
    fn has_source(&self, id: &str) -> bool;

    /// Adds a layer on top, or directly below `before` when that layer exists.
    fn add_layer(&mut self, layer: LayerSpec, before: Option<&str>) -> Result<(), MapError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), MapError>;
    fn has_layer(&self, id: &str) -> bool;
    /// Layer ids in draw order, bottom first.
    fn layer_ids(&self) -> Vec<String>;
    fn set_paint(&mut self, layer_id: &str, property: PaintProperty) -> Result<(), MapError>;

    /// Current zoom level (mid-animation when a transition is running).
    fn zoom(&self) -> f64;
    fn ease_to(&mut self, view: CameraView, duration: Duration) -> AnimationId;
    fn fly_to(&mut self, view: CameraView, duration: Duration) -> AnimationId;
    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: f32, duration: Duration) -> AnimationId;
    /// Whether the transition with this id is still running.
    fn is_animating(&self, id: AnimationId) -> bool;

    /// Registers a listener; returns false when it was already registered.
    fn on(&mut self, event: MapEvent, layer_id: &str) -> bool;
    fn off(&mut self, event: MapEvent, layer_id: &str);
    fn has_listener(&self, event: MapEvent, layer_id: &str) -> bool;

    fn show_popup(&mut self, popup: Popup);
    fn hide_popup(&mut self);
}
