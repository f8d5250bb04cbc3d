//! Per-area map layers, hover/click behaviour and the single selection.

use super::registry::{Area, AreaError};
use crate::map::{
    AnimationId, CameraView, LayerEvent, LayerSpec, MapEvent, MapHandle, Paint, PaintProperty,
    Popup,
};
use eframe::egui::Color32;
use geo_types::Coord;
use geojson::GeoJson;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Padding around a selected area when fitting the camera, in pixels.
pub const FIT_PADDING: f32 = 30.0;
const FIT_DURATION: Duration = Duration::from_millis(2000);
const RESET_DURATION: Duration = Duration::from_millis(1000);
const CLICK_ZOOM_DURATION: Duration = Duration::from_millis(1000);

const CLICK_ZOOM_THRESHOLD: f64 = 6.25;
const CLICK_ZOOM_LOW: f64 = 6.0;
const CLICK_ZOOM_HIGH: f64 = 8.0;

pub const SELECTED_OUTLINE_OPACITY: f32 = 0.8;
pub const SELECTED_OUTLINE_WIDTH: f32 = 4.0;
const HOVER_FILL_OPACITY: f32 = 0.5;

/// Snapshot of the selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub selected_area_id: Option<String>,
    /// A selection camera transition is still running.
    pub is_locked: bool,
}

/// Outcome of a bulk `setup_areas` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetupSummary {
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
}

/// Zoom level the click-to-zoom step targets from the current zoom.
pub fn click_zoom_target(current_zoom: f64) -> f64 {
    if current_zoom < CLICK_ZOOM_THRESHOLD {
        CLICK_ZOOM_LOW
    } else {
        CLICK_ZOOM_HIGH
    }
}

/// Owns the area layers on the map and the selection state machine.
#[derive(Debug, Clone)]
pub struct AreaLayerManager {
    home: CameraView,
    selected: Option<Area>,
    lock: Option<AnimationId>,
    show_area_details: bool,
    /// Fill layer ids that already have listeners attached.
    listeners: HashSet<String>,
    /// Fill layer id -> area, for routing layer events.
    on_map: HashMap<String, Area>,
}

impl AreaLayerManager {
    /// `home` is the default camera that resets return to.
    pub fn new(home: CameraView) -> Self {
        Self {
            home,
            selected: None,
            lock: None,
            show_area_details: false,
            listeners: HashSet::new(),
            on_map: HashMap::new(),
        }
    }

    pub fn selected_area(&self) -> Option<&Area> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|a| a.id.as_str())
    }

    pub fn show_area_details(&self) -> bool {
        self.show_area_details
    }

    /// True while the camera transition started by a selection is running.
    pub fn is_locked(&self, map: &dyn MapHandle) -> bool {
        self.lock.is_some_and(|id| map.is_animating(id))
    }

    pub fn selection_state(&self, map: &dyn MapHandle) -> SelectionState {
        SelectionState {
            selected_area_id: self.selected_id().map(str::to_string),
            is_locked: self.is_locked(map),
        }
    }

    /// Whether the area's layers are on the map.
    pub fn is_on_map(&self, area_id: &str) -> bool {
        self.on_map.values().any(|a| a.id == area_id)
    }

    /// Adds a source and a transparent fill/outline pair for every area not yet on the map.
    ///
    /// Failures are logged per area and do not stop the batch.
    pub fn setup_areas(&mut self, map: &mut dyn MapHandle, areas: &[Area]) -> SetupSummary {
        let mut summary = SetupSummary::default();

        for area in areas {
            let present = map.has_source(area.source_id())
                && map.has_layer(&area.fill_layer_id())
                && map.has_layer(&area.outline_layer_id());

            match self.setup_area(map, area) {
                Ok(()) if present => summary.existing += 1,
                Ok(()) => summary.created += 1,
                Err(e) => {
                    log::error!("Failed to set up area {}: {}", area.id, e);
                    summary.failed += 1;
                }
            }
        }

        log::debug!(
            "Area setup: {} created, {} existing, {} failed",
            summary.created,
            summary.existing,
            summary.failed
        );
        summary
    }

    fn setup_area(&mut self, map: &mut dyn MapHandle, area: &Area) -> Result<(), AreaError> {
        area.bounds()?;

        let fill_id = area.fill_layer_id();
        let outline_id = area.outline_layer_id();

        if !map.has_source(area.source_id()) {
            map.add_source(area.source_id(), GeoJson::Feature(area.boundary.clone()))?;
        }
        let before = self.insertion_anchor(map, area);
        if !map.has_layer(&fill_id) {
            let fill = LayerSpec::fill(&fill_id, area.source_id(), Paint::HIDDEN);
            map.add_layer(fill, before.as_deref())?;
        }
        if !map.has_layer(&outline_id) {
            let outline = LayerSpec::line(&outline_id, area.source_id(), Paint::HIDDEN);
            map.add_layer(outline, before.as_deref())?;
        }

        if !self.listeners.contains(&fill_id) {
            map.on(MapEvent::Click, &fill_id);
            if area.kind.hoverable() {
                map.on(MapEvent::PointerEnter, &fill_id);
                map.on(MapEvent::PointerLeave, &fill_id);
            }
            self.listeners.insert(fill_id.clone());
        }

        self.on_map.insert(fill_id, area.clone());
        Ok(())
    }

    /// First layer that must stay above `area`: a finer area level or any
    /// layer that is not an area (analysis overlays).
    fn insertion_anchor(&self, map: &dyn MapHandle, area: &Area) -> Option<String> {
        let level = area.kind.stack_level();
        let own_fill = area.fill_layer_id();
        map.layer_ids().into_iter().find(|layer_id| {
            let fill_id = layer_id.strip_suffix("-outline").unwrap_or(layer_id);
            if fill_id == own_fill {
                return false;
            }
            match self.on_map.get(fill_id) {
                Some(other) => other.kind.stack_level() > level,
                None => true,
            }
        })
    }

    /// Selects `area`, or resets to the default view when it is already selected.
    pub fn click_area(&mut self, map: &mut dyn MapHandle, area: &Area) -> Result<(), AreaError> {
        if self.selected_id() == Some(area.id.as_str()) {
            self.reset_to_default(map);
            return Ok(());
        }

        let bounds = area.bounds()?;
        if !map.has_layer(&area.outline_layer_id()) {
            self.setup_area(map, area)?;
        }

        if let Some(previous) = self.selected.take() {
            reset_highlight(map, &previous);
        }

        self.lock = Some(map.fit_bounds(bounds, FIT_PADDING, FIT_DURATION));

        let outline_id = area.outline_layer_id();
        map.set_paint(&outline_id, PaintProperty::LineColor(area.kind.color()))?;
        map.set_paint(&outline_id, PaintProperty::LineOpacity(SELECTED_OUTLINE_OPACITY))?;
        map.set_paint(&outline_id, PaintProperty::LineWidth(SELECTED_OUTLINE_WIDTH))?;

        let fill_id = area.fill_layer_id();
        map.set_paint(&fill_id, PaintProperty::FillColor(Color32::TRANSPARENT))?;
        map.set_paint(&fill_id, PaintProperty::FillOpacity(0.0))?;

        log::info!("Selected {} {}", area.kind.label(), area.name);
        self.selected = Some(area.clone());
        self.show_area_details = true;
        Ok(())
    }

    /// Clears the selection and eases back to the default view.
    pub fn reset_to_default(&mut self, map: &mut dyn MapHandle) {
        self.clear_selection(map);
        map.ease_to(self.home, RESET_DURATION);
    }

    /// Clears the selection without moving the camera.
    pub fn clear_selection(&mut self, map: &mut dyn MapHandle) {
        if let Some(previous) = self.selected.take() {
            reset_highlight(map, &previous);
        }
        self.lock = None;
        self.show_area_details = false;
    }

    /// Click on an area layer: optional zoom towards the click point, then selection.
    pub fn handle_click(
        &mut self,
        map: &mut dyn MapHandle,
        area: &Area,
        at: Coord<f64>,
    ) -> Result<(), AreaError> {
        let reselecting = self.selected_id() == Some(area.id.as_str());
        if !reselecting && !self.is_locked(map) {
            let zoom = click_zoom_target(map.zoom());
            map.ease_to(CameraView::new(at, zoom), CLICK_ZOOM_DURATION);
        }
        self.click_area(map, area)
    }

    /// Pointer entered an area: hover fill and tooltip.
    pub fn pointer_enter(&mut self, map: &mut dyn MapHandle, area: &Area, at: Coord<f64>) {
        if !area.kind.hoverable() {
            return;
        }

        let fill_id = area.fill_layer_id();
        let result = if self.selected_id() == Some(area.id.as_str()) {
            map.set_paint(&fill_id, PaintProperty::FillColor(Color32::TRANSPARENT))
        } else {
            map.set_paint(&fill_id, PaintProperty::FillColor(area.kind.color())).and_then(|_| {
                map.set_paint(&fill_id, PaintProperty::FillOpacity(HOVER_FILL_OPACITY))
            })
        };
        if let Err(e) = result {
            log::debug!("Hover paint skipped for {}: {}", area.id, e);
        }

        map.show_popup(Popup {
            at,
            title: area.name.clone(),
            body: area.kind.label().to_string(),
        });
    }

    /// Pointer left an area: clear the hover fill and tooltip.
    pub fn pointer_leave(&mut self, map: &mut dyn MapHandle, area: &Area) {
        if !area.kind.hoverable() {
            return;
        }
        clear_fill(map, area);
        map.hide_popup();
    }

    /// Routes a layer event to the area it belongs to. Returns false for foreign layers.
    pub fn handle_event(&mut self, map: &mut dyn MapHandle, event: &LayerEvent) -> bool {
        let Some(area) = self.on_map.get(&event.layer_id).cloned() else {
            return false;
        };

        match event.event {
            MapEvent::Click => {
                if let Err(e) = self.handle_click(map, &area, event.at) {
                    log::error!("Failed to select {}: {}", area.id, e);
                }
            }
            MapEvent::PointerEnter => self.pointer_enter(map, &area, event.at),
            MapEvent::PointerLeave => self.pointer_leave(map, &area),
        }
        true
    }

    /// Detaches listeners and removes the layers and source of each area.
    ///
    /// Areas that are not on the map are skipped.
    pub fn remove_areas(&mut self, map: &mut dyn MapHandle, areas: &[Area]) {
        for area in areas {
            let fill_id = area.fill_layer_id();
            let outline_id = area.outline_layer_id();

            for event in MapEvent::all() {
                map.off(*event, &fill_id);
            }
            self.listeners.remove(&fill_id);
            self.on_map.remove(&fill_id);

            for layer_id in [&fill_id, &outline_id] {
                if map.has_layer(layer_id) {
                    if let Err(e) = map.remove_layer(layer_id) {
                        log::warn!("Failed to remove layer {}: {}", layer_id, e);
                    }
                }
            }
            if map.has_source(area.source_id()) {
                if let Err(e) = map.remove_source(area.source_id()) {
                    log::warn!("Failed to remove source {}: {}", area.id, e);
                }
            }

            if self.selected_id() == Some(area.id.as_str()) {
                self.selected = None;
                self.lock = None;
                self.show_area_details = false;
            }
        }
    }
}

fn clear_fill(map: &mut dyn MapHandle, area: &Area) {
    let fill_id = area.fill_layer_id();
    let result = map
        .set_paint(&fill_id, PaintProperty::FillColor(Color32::TRANSPARENT))
        .and_then(|_| map.set_paint(&fill_id, PaintProperty::FillOpacity(0.0)));
    if let Err(e) = result {
        log::debug!("Fill reset skipped for {}: {}", area.id, e);
    }
}

/// Returns an area's fill and outline to fully transparent.
fn reset_highlight(map: &mut dyn MapHandle, area: &Area) {
    clear_fill(map, area);

    let outline_id = area.outline_layer_id();
    let result = map
        .set_paint(&outline_id, PaintProperty::LineColor(Color32::TRANSPARENT))
        .and_then(|_| map.set_paint(&outline_id, PaintProperty::LineOpacity(0.0)));
    if let Err(e) = result {
        log::debug!("Outline reset skipped for {}: {}", area.id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::registry::{AreaKind, AreaRegistry};
    use crate::map::{Camera, MapScene};
    use geojson::{Feature, Geometry, Value};

    fn home() -> CameraView {
        CameraView::new(
            Coord {
                x: 125.1275,
                y: 8.1569,
            },
            7.0,
        )
    }

    fn square_area(id: &str, name: &str, kind: AreaKind, x: f64, y: f64) -> Area {
        let geometry = Geometry::new(Value::Polygon(vec![vec![
            vec![x, y],
            vec![x + 0.02, y],
            vec![x + 0.02, y + 0.02],
            vec![x, y + 0.02],
            vec![x, y],
        ]]));
        Area {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            boundary: Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            },
            parent_municipality: None,
        }
    }

    fn fixture() -> (MapScene, AreaLayerManager, Vec<Area>) {
        let scene = MapScene::new(home(), Default::default());
        let manager = AreaLayerManager::new(home());
        let areas = vec![
            square_area("brgy-1", "Poblacion", AreaKind::Barangay, 125.12, 8.14),
            square_area("brgy-2", "Casisang", AreaKind::Barangay, 125.10, 8.10),
            square_area("mun-1", "Malaybalay City", AreaKind::Municipality, 125.0, 8.0),
        ];
        (scene, manager, areas)
    }

    fn highlighted_layers(scene: &MapScene) -> Vec<String> {
        scene
            .layers()
            .iter()
            .filter(|l| l.paint.is_visible())
            .map(|l| l.id.clone())
            .collect()
    }

    #[test]
    fn test_setup_is_idempotent() {
        let (mut scene, mut manager, areas) = fixture();

        let first = manager.setup_areas(&mut scene, &areas);
        assert_eq!(first.created, 3);
        let second = manager.setup_areas(&mut scene, &areas);
        assert_eq!(second.created, 0);
        assert_eq!(second.existing, 3);

        assert_eq!(scene.source_count(), 3);
        assert_eq!(scene.layers().len(), 6);
        assert_eq!(scene.listener_count(MapEvent::Click), 3);
        // Only barangays listen for hover.
        assert_eq!(scene.listener_count(MapEvent::PointerEnter), 2);
        assert!(highlighted_layers(&scene).is_empty());
    }

    #[test]
    fn test_setup_skips_malformed_area() {
        let (mut scene, mut manager, mut areas) = fixture();
        let mut broken = square_area("brgy-9", "Broken", AreaKind::Barangay, 0.0, 0.0);
        broken.boundary.geometry = Some(Geometry::new(Value::Point(vec![0.0, 0.0])));
        areas.insert(1, broken);

        let summary = manager.setup_areas(&mut scene, &areas);
        assert_eq!(summary.created, 3);
        assert_eq!(summary.failed, 1);
        assert!(!scene.has_source("brgy-9"));
        assert!(scene.has_source("mun-1"));
    }

    #[test]
    fn test_select_twice_is_a_no_op() {
        let (mut scene, mut manager, areas) = fixture();
        manager.setup_areas(&mut scene, &areas);

        manager.click_area(&mut scene, &areas[0]).unwrap();
        manager.click_area(&mut scene, &areas[0]).unwrap();

        assert_eq!(manager.selected_id(), None);
        assert!(!manager.show_area_details());
        assert_eq!(scene.camera().destination(), home());
        assert!(highlighted_layers(&scene).is_empty());
    }

    #[test]
    fn test_select_then_other_leaves_only_second_highlighted() {
        let (mut scene, mut manager, areas) = fixture();
        manager.setup_areas(&mut scene, &areas);

        manager.click_area(&mut scene, &areas[0]).unwrap();
        manager.click_area(&mut scene, &areas[1]).unwrap();

        assert_eq!(manager.selected_id(), Some("brgy-2"));
        assert_eq!(highlighted_layers(&scene), vec!["id-brgy-2-outline".to_string()]);

        let a_fill = scene.layer("id-brgy-1").unwrap();
        assert_eq!(a_fill.paint.color, Color32::TRANSPARENT);
        assert_eq!(a_fill.paint.opacity, 0.0);
        let a_outline = scene.layer("id-brgy-1-outline").unwrap();
        assert_eq!(a_outline.paint.opacity, 0.0);
    }

    #[test]
    fn test_poblacion_select_and_reset() {
        let registry = AreaRegistry::load_embedded().unwrap();
        let poblacion = registry.get("brgy-1").unwrap().clone();
        let mut scene = MapScene::new(home(), Default::default());
        let mut manager = AreaLayerManager::new(home());
        manager.setup_areas(&mut scene, registry.all());

        manager.click_area(&mut scene, &poblacion).unwrap();

        let expected = Camera::fit_view(poblacion.bounds().unwrap(), (800.0, 600.0), FIT_PADDING);
        assert_eq!(scene.camera().destination(), expected);

        let outline = scene.layer("id-brgy-1-outline").unwrap();
        assert_eq!(outline.paint.color, AreaKind::Barangay.color());
        assert_eq!(outline.paint.opacity, SELECTED_OUTLINE_OPACITY);
        assert_eq!(outline.paint.width, SELECTED_OUTLINE_WIDTH);
        assert!(!scene.layer("id-brgy-1").unwrap().paint.is_visible());

        manager.click_area(&mut scene, &poblacion).unwrap();
        let destination = scene.camera().destination();
        assert_eq!(destination.center, Coord { x: 125.1275, y: 8.1569 });
        assert_eq!(destination.zoom, 7.0);
        assert!(!scene.layer("id-brgy-1-outline").unwrap().paint.is_visible());
    }

    #[test]
    fn test_hover_respects_selection_and_kind() {
        let (mut scene, mut manager, areas) = fixture();
        manager.setup_areas(&mut scene, &areas);
        let at = Coord { x: 125.13, y: 8.15 };

        manager.pointer_enter(&mut scene, &areas[0], at);
        let fill = scene.layer("id-brgy-1").unwrap();
        assert_eq!(fill.paint.color, AreaKind::Barangay.color());
        assert_eq!(fill.paint.opacity, HOVER_FILL_OPACITY);
        assert_eq!(scene.popup().unwrap().title, "Poblacion");
        assert_eq!(scene.popup().unwrap().body, "Barangay");

        manager.pointer_leave(&mut scene, &areas[0]);
        assert!(!scene.layer("id-brgy-1").unwrap().paint.is_visible());
        assert!(scene.popup().is_none());

        // The selected area keeps its outline-only look.
        manager.click_area(&mut scene, &areas[0]).unwrap();
        manager.pointer_enter(&mut scene, &areas[0], at);
        assert!(!scene.layer("id-brgy-1").unwrap().paint.is_visible());

        // Municipalities ignore hover.
        manager.pointer_enter(&mut scene, &areas[2], at);
        assert!(!scene.layer("id-mun-1").unwrap().paint.is_visible());
    }

    #[test]
    fn test_click_to_zoom_skipped_while_locked() {
        let (mut scene, mut manager, areas) = fixture();
        manager.setup_areas(&mut scene, &areas);
        let at = Coord { x: 125.13, y: 8.15 };

        // Unlocked: pre-zoom (generation 1) then fit (generation 2).
        manager.handle_click(&mut scene, &areas[0], at).unwrap();
        assert_eq!(scene.camera().active(), Some(AnimationId(2)));
        assert!(manager.selection_state(&scene).is_locked);

        // Locked: only the fit runs.
        manager.handle_click(&mut scene, &areas[1], at).unwrap();
        assert_eq!(scene.camera().active(), Some(AnimationId(3)));

        scene.advance(FIT_DURATION);
        assert!(!manager.selection_state(&scene).is_locked);

        manager.handle_click(&mut scene, &areas[2], at).unwrap();
        assert_eq!(scene.camera().active(), Some(AnimationId(5)));
    }

    #[test]
    fn test_click_zoom_target_threshold() {
        assert_eq!(click_zoom_target(5.0), 6.0);
        assert_eq!(click_zoom_target(6.25), 8.0);
        assert_eq!(click_zoom_target(9.0), 8.0);
    }

    #[test]
    fn test_events_route_through_scene() {
        let (mut scene, mut manager, areas) = fixture();
        manager.setup_areas(&mut scene, &areas);
        let inside = Coord { x: 125.13, y: 8.15 };

        let events = scene.pointer_moved(Some(inside));
        assert_eq!(events.len(), 1);
        assert!(manager.handle_event(&mut scene, &events[0]));
        assert!(scene.popup().is_some());

        for event in scene.click(inside) {
            manager.handle_event(&mut scene, &event);
        }
        assert_eq!(manager.selected_id(), Some("brgy-1"));

        let foreign = LayerEvent {
            event: MapEvent::Click,
            layer_id: "satellite-flood-layer".into(),
            at: inside,
        };
        assert!(!manager.handle_event(&mut scene, &foreign));
    }

    #[test]
    fn test_readded_level_keeps_stacking_order() {
        let (mut scene, mut manager, areas) = fixture();
        manager.setup_areas(&mut scene, &areas);
        let municipalities = &areas[2..];

        manager.remove_areas(&mut scene, municipalities);
        manager.setup_areas(&mut scene, municipalities);

        let order = scene.layer_ids();
        let position = |id: &str| order.iter().position(|l| l == id).unwrap();
        assert_eq!(position("id-mun-1"), 0);
        assert_eq!(position("id-mun-1-outline"), 1);
        assert!(position("id-brgy-1") < position("id-brgy-1-outline"));
    }

    #[test]
    fn test_areas_stay_below_foreign_layers() {
        let (mut scene, mut manager, areas) = fixture();
        scene
            .add_source("overlay", GeoJson::Feature(areas[0].boundary.clone()))
            .unwrap();
        scene
            .add_layer(LayerSpec::fill("overlay-layer", "overlay", Paint::HIDDEN), None)
            .unwrap();

        manager.setup_areas(&mut scene, &areas);

        assert_eq!(scene.layer_ids().last().map(String::as_str), Some("overlay-layer"));
    }

    #[test]
    fn test_remove_areas_is_safe_and_allows_resetup() {
        let (mut scene, mut manager, areas) = fixture();
        manager.setup_areas(&mut scene, &areas);
        manager.click_area(&mut scene, &areas[0]).unwrap();

        manager.remove_areas(&mut scene, &areas[..2]);
        assert!(!scene.has_layer("id-brgy-1"));
        assert!(!scene.has_layer("id-brgy-1-outline"));
        assert!(!scene.has_source("brgy-1"));
        assert!(!scene.has_listener(MapEvent::Click, "id-brgy-1"));
        assert_eq!(manager.selected_id(), None);

        // Removing again is a no-op.
        manager.remove_areas(&mut scene, &areas[..2]);
        assert_eq!(scene.source_count(), 1);

        let summary = manager.setup_areas(&mut scene, &areas);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.existing, 1);
        assert_eq!(scene.listener_count(MapEvent::Click), 3);
    }
}
