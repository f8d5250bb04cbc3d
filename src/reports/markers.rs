//! Report markers on the map and the per-barangay report panel.

use super::registry::{CitizenReport, ReportRegistry, ReportStatus};
use crate::areas::{Area, AreaKind};
use crate::geo::MapProjection;
use crate::map::{AnimationId, CameraView, MapHandle};
use eframe::egui::Pos2;
use geo_types::Coord;
use std::time::Duration;

/// Marker diameter in pixels.
pub const MARKER_SIZE: f32 = 24.0;
const FLY_TO_ZOOM: f64 = 16.0;
const FLY_TO_DURATION: Duration = Duration::from_millis(1500);

/// A placed marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMarker {
    pub report_id: String,
    pub at: Coord<f64>,
    pub status: ReportStatus,
}

/// Owns the markers, the focused report and the barangay whose reports are listed.
#[derive(Debug, Clone, Default)]
pub struct ReportManager {
    markers: Vec<ReportMarker>,
    selected_barangay: Option<String>,
    show_report_details: bool,
    selected_report: Option<String>,
}

impl ReportManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> &[ReportMarker] {
        &self.markers
    }

    pub fn selected_barangay(&self) -> Option<&str> {
        self.selected_barangay.as_deref()
    }

    pub fn show_report_details(&self) -> bool {
        self.show_report_details
    }

    pub fn selected_report(&self) -> Option<&str> {
        self.selected_report.as_deref()
    }

    /// Places one marker per located report, replacing any existing markers.
    pub fn add_markers(&mut self, registry: &ReportRegistry) {
        self.remove_markers();
        self.markers = registry
            .all()
            .iter()
            .filter_map(|report| {
                Some(ReportMarker {
                    report_id: report.id.clone(),
                    at: report.coord()?,
                    status: report.status,
                })
            })
            .collect();
        log::debug!("Placed {} report markers", self.markers.len());
    }

    pub fn remove_markers(&mut self) {
        self.markers.clear();
    }

    /// Topmost marker under a screen position.
    pub fn marker_at(&self, projection: &MapProjection, pos: Pos2) -> Option<&ReportMarker> {
        let radius = MARKER_SIZE / 2.0;
        self.markers
            .iter()
            .rev()
            .find(|m| projection.geo_to_screen(m.at).distance(pos) <= radius)
    }

    pub fn set_selected_barangay(&mut self, barangay: &Area) {
        if self.selected_barangay.as_deref() != Some(barangay.id.as_str()) {
            self.selected_report = None;
        }
        self.selected_barangay = Some(barangay.id.clone());
        self.show_report_details = true;
    }

    pub fn clear_selected_barangay(&mut self) {
        self.selected_barangay = None;
        self.show_report_details = false;
    }

    /// Lists reports for a selected barangay; any other selection closes the panel.
    pub fn follow_selection(&mut self, selected: Option<&Area>) {
        match selected {
            Some(area) if area.kind == AreaKind::Barangay => self.set_selected_barangay(area),
            _ => self.clear_selected_barangay(),
        }
    }

    /// Focuses a report and flies to it when it has a position.
    pub fn fly_to_report(
        &mut self,
        map: &mut dyn MapHandle,
        report: &CitizenReport,
    ) -> Option<AnimationId> {
        self.selected_report = Some(report.id.clone());
        let at = report.coord()?;
        Some(map.fly_to(CameraView::new(at, FLY_TO_ZOOM), FLY_TO_DURATION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::areas::AreaRegistry;
    use crate::map::MapScene;

    fn loaded() -> (ReportRegistry, ReportManager) {
        let registry = ReportRegistry::load_embedded().unwrap();
        let mut manager = ReportManager::new();
        manager.add_markers(&registry);
        (registry, manager)
    }

    #[test]
    fn test_markers_skip_unlocated_reports() {
        let (registry, mut manager) = loaded();
        let located = registry.all().iter().filter(|r| r.coord().is_some()).count();
        assert!(located < registry.len());
        assert_eq!(manager.markers().len(), located);

        // Re-adding replaces rather than duplicates.
        manager.add_markers(&registry);
        assert_eq!(manager.markers().len(), located);

        manager.remove_markers();
        assert!(manager.markers().is_empty());
    }

    #[test]
    fn test_marker_hit_uses_screen_radius() {
        let (registry, manager) = loaded();
        let projection = MapScene::default().projection();
        let report = registry.get("rpt-001").unwrap();
        let pos = projection.geo_to_screen(report.coord().unwrap());

        let hit = manager.marker_at(&projection, pos + eframe::egui::Vec2::new(5.0, 0.0));
        assert_eq!(hit.map(|m| m.report_id.as_str()), Some("rpt-001"));
        assert!(manager
            .marker_at(&projection, pos + eframe::egui::Vec2::new(MARKER_SIZE, 0.0))
            .is_none());
    }

    #[test]
    fn test_fly_to_report() {
        let (registry, mut manager) = loaded();
        let mut scene = MapScene::default();
        let report = registry.get("rpt-004").unwrap();

        let id = manager.fly_to_report(&mut scene, report).unwrap();
        assert!(scene.is_animating(id));
        let destination = scene.camera().destination();
        assert_eq!(destination.center, report.coord().unwrap());
        assert_eq!(destination.zoom, FLY_TO_ZOOM);
        assert_eq!(manager.selected_report(), Some("rpt-004"));

        scene.advance(FLY_TO_DURATION);
        assert!(!scene.is_animating(id));

        // Unlocated reports are focused without moving the camera.
        let unlocated = registry.get("rpt-008").unwrap();
        assert_eq!(manager.fly_to_report(&mut scene, unlocated), None);
        assert_eq!(manager.selected_report(), Some("rpt-008"));
    }

    #[test]
    fn test_panel_follows_barangay_selection() {
        let areas = AreaRegistry::load_embedded().unwrap();
        let mut manager = ReportManager::new();

        manager.follow_selection(areas.get("brgy-1"));
        assert_eq!(manager.selected_barangay(), Some("brgy-1"));
        assert!(manager.show_report_details());

        manager.follow_selection(areas.get("mun-malaybalay"));
        assert_eq!(manager.selected_barangay(), None);
        assert!(!manager.show_report_details());

        manager.follow_selection(None);
        assert!(!manager.show_report_details());
    }
}
