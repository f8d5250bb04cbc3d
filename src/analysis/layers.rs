//! One overlay pair per analysis kind.

use super::kind::AnalysisKind;
use super::result::AnalysisResult;
use crate::map::{LayerEvent, LayerSpec, MapError, MapEvent, MapHandle, Paint, Popup};
use geojson::{FeatureCollection, GeoJson};

pub const OVERLAY_FILL_OPACITY: f32 = 0.6;
pub const OVERLAY_BORDER_WIDTH: f32 = 2.0;
pub const OVERLAY_BORDER_OPACITY: f32 = 0.8;

/// Tracks which analysis overlays are on the map.
#[derive(Debug, Clone, Default)]
pub struct AnalysisLayerManager {
    visible: [bool; AnalysisKind::COUNT],
}

impl AnalysisLayerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, kind: AnalysisKind) -> bool {
        self.visible[kind.index()]
    }

    /// Replaces the overlay for `kind` with `data`.
    pub fn add_layer(
        &mut self,
        map: &mut dyn MapHandle,
        kind: AnalysisKind,
        data: &FeatureCollection,
    ) -> Result<(), MapError> {
        self.remove_layer(map, kind);

        if let Err(e) = add_overlay(map, kind, data) {
            log::error!("Error adding {} layer to map: {}", kind, e);
            self.remove_layer(map, kind);
            return Err(e);
        }

        log::info!(
            "{} layer added ({} feature(s))",
            kind,
            data.features.len()
        );
        self.visible[kind.index()] = true;
        Ok(())
    }

    /// Removes the overlay for `kind`. Absent layers are skipped and errors are logged.
    pub fn remove_layer(&mut self, map: &mut dyn MapHandle, kind: AnalysisKind) {
        let fill_id = kind.layer_id();
        map.off(MapEvent::Click, &fill_id);

        for layer_id in [kind.border_layer_id(), fill_id] {
            if map.has_layer(&layer_id) {
                if let Err(e) = map.remove_layer(&layer_id) {
                    log::error!("Error removing layer {}: {}", layer_id, e);
                }
            }
        }

        let source_id = kind.source_id();
        if map.has_source(&source_id) {
            if let Err(e) = map.remove_source(&source_id) {
                log::error!("Error removing source {}: {}", source_id, e);
            }
        }

        self.visible[kind.index()] = false;
    }

    /// Hides a visible overlay, or re-adds a hidden one from the cached result.
    pub fn toggle(
        &mut self,
        map: &mut dyn MapHandle,
        kind: AnalysisKind,
        cached: Option<&AnalysisResult>,
    ) -> Result<(), MapError> {
        if self.is_visible(kind) {
            self.remove_layer(map, kind);
            return Ok(());
        }
        match cached {
            Some(result) => self.add_layer(map, kind, result.data()),
            None => Ok(()),
        }
    }

    /// Shows a popup for a click on an overlay. Returns false for other layers.
    pub fn handle_event(
        &self,
        map: &mut dyn MapHandle,
        event: &LayerEvent,
        result: impl Fn(AnalysisKind) -> Option<(String, String)>,
    ) -> bool {
        let Some(kind) = AnalysisKind::from_layer_id(&event.layer_id) else {
            return false;
        };
        if event.event != MapEvent::Click {
            return true;
        }

        let (area, sensor) = result(kind).unwrap_or_else(|| ("Unknown".into(), "Unknown".into()));
        log::debug!("{} feature clicked in {}", kind, area);
        map.show_popup(Popup {
            at: event.at,
            title: kind.detection_title().to_string(),
            body: format!(
                "Source: {}\nDetection: {}\nArea: {}",
                sensor,
                kind.detection_method(),
                area
            ),
        });
        true
    }
}

fn add_overlay(
    map: &mut dyn MapHandle,
    kind: AnalysisKind,
    data: &FeatureCollection,
) -> Result<(), MapError> {
    let source_id = kind.source_id();
    let fill_id = kind.layer_id();

    map.add_source(&source_id, GeoJson::FeatureCollection(data.clone()))?;
    // Overlays always go on top of the area layers.
    let fill = LayerSpec::fill(
        &fill_id,
        &source_id,
        Paint::fill(kind.fill_color(), OVERLAY_FILL_OPACITY),
    );
    map.add_layer(fill, None)?;
    let border = LayerSpec::line(
        kind.border_layer_id(),
        &source_id,
        Paint::line(
            kind.border_color(),
            OVERLAY_BORDER_WIDTH,
            OVERLAY_BORDER_OPACITY,
        ),
    );
    map.add_layer(border, None)?;
    map.on(MapEvent::Click, &fill_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{LayerKind, MapScene};
    use geo_types::Coord;
    use geojson::{Feature, Geometry, Value};

    fn one_square() -> FeatureCollection {
        let geometry = Geometry::new(Value::Polygon(vec![vec![
            vec![125.12, 8.14],
            vec![125.13, 8.14],
            vec![125.13, 8.15],
            vec![125.12, 8.15],
            vec![125.12, 8.14],
        ]]));
        FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        }
    }

    #[test]
    fn test_add_creates_one_pair_on_one_source() {
        let mut scene = MapScene::default();
        let mut layers = AnalysisLayerManager::new();

        layers
            .add_layer(&mut scene, AnalysisKind::Flood, &one_square())
            .unwrap();
        layers
            .add_layer(&mut scene, AnalysisKind::Flood, &one_square())
            .unwrap();

        assert!(layers.is_visible(AnalysisKind::Flood));
        assert_eq!(scene.source_count(), 1);
        assert_eq!(scene.layers().len(), 2);

        let fill = scene.layer("satellite-flood-layer").unwrap();
        assert_eq!(fill.kind, LayerKind::Fill);
        assert_eq!(fill.source, "satellite-flood-source");
        assert_eq!(fill.paint.opacity, OVERLAY_FILL_OPACITY);
        let border = scene.layer("satellite-flood-layer-border").unwrap();
        assert_eq!(border.kind, LayerKind::Line);
        assert_eq!(border.source, "satellite-flood-source");
        assert_eq!(border.paint.width, OVERLAY_BORDER_WIDTH);

        layers.remove_layer(&mut scene, AnalysisKind::Flood);
        assert!(!layers.is_visible(AnalysisKind::Flood));
        assert_eq!(scene.source_count(), 0);
        assert!(scene.layers().is_empty());
        assert!(!scene.has_listener(MapEvent::Click, "satellite-flood-layer"));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut scene = MapScene::default();
        let mut layers = AnalysisLayerManager::new();
        for kind in AnalysisKind::ALL {
            layers.remove_layer(&mut scene, kind);
            assert!(!layers.is_visible(kind));
        }
        assert_eq!(scene.source_count(), 0);
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut scene = MapScene::default();
        let mut layers = AnalysisLayerManager::new();
        layers
            .add_layer(&mut scene, AnalysisKind::Flood, &one_square())
            .unwrap();
        layers
            .add_layer(&mut scene, AnalysisKind::Fire, &one_square())
            .unwrap();

        layers.remove_layer(&mut scene, AnalysisKind::Flood);
        assert!(layers.is_visible(AnalysisKind::Fire));
        assert!(scene.has_layer("satellite-fire-layer"));
    }

    #[test]
    fn test_toggle_without_cache_stays_hidden() {
        let mut scene = MapScene::default();
        let mut layers = AnalysisLayerManager::new();
        layers
            .toggle(&mut scene, AnalysisKind::Water, None)
            .unwrap();
        assert!(!layers.is_visible(AnalysisKind::Water));
        assert_eq!(scene.source_count(), 0);
    }

    #[test]
    fn test_overlay_click_shows_popup() {
        let mut scene = MapScene::default();
        let mut layers = AnalysisLayerManager::new();
        layers
            .add_layer(&mut scene, AnalysisKind::Flood, &one_square())
            .unwrap();

        let events = scene.click(Coord { x: 125.125, y: 8.145 });
        assert_eq!(events.len(), 1);
        let handled = layers.handle_event(&mut scene, &events[0], |_| {
            Some(("Poblacion".into(), "Sentinel-1".into()))
        });
        assert!(handled);

        let popup = scene.popup().unwrap();
        assert_eq!(popup.title, "Flood Area Detected");
        assert!(popup.body.contains("Poblacion"));
        assert!(popup.body.contains("Sentinel-1"));
    }
}
