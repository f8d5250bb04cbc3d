//! Application state management.
//!
//! `AppState` is the single owner of the map, the area and analysis
//! managers, and the UI inputs. Panels receive it by reference.

mod date_range;
mod layer;

pub use date_range::DateRangeState;
pub use layer::LayerState;

use crate::analysis::{
    AnalysisClient, AnalysisCompletion, AnalysisError, AnalysisKind, AnalysisLayerManager,
    AnalysisRequest, CompletionOutcome, HealthReport, PendingAnalysis, ServiceEvent,
};
use crate::areas::{Area, AreaKind, AreaLayerManager, AreaRegistry};
use crate::config::DashboardConfig;
use crate::map::{LayerEvent, MapEvent, MapHandle, MapScene};
use crate::reports::{ReportManager, ReportRegistry};

/// Last known state of the analysis service.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ServiceHealth {
    #[default]
    Unknown,
    Checking,
    Online(HealthReport),
    Offline(String),
}

/// Root application state containing all sub-states.
pub struct AppState {
    pub config: DashboardConfig,

    /// The live map; `None` until the canvas exists.
    pub map: Option<MapScene>,

    /// Selectable administrative areas
    pub registry: AreaRegistry,

    /// Area layers and the current selection
    pub areas: AreaLayerManager,

    /// Per-kind analysis status and results
    pub analysis: AnalysisClient,

    /// Analysis overlays on the map
    pub analysis_layers: AnalysisLayerManager,

    /// Citizen-submitted reports
    pub reports: ReportRegistry,

    /// Report markers and the per-barangay report panel
    pub report_markers: ReportManager,

    pub date_range: DateRangeState,

    /// Area layer visibility toggles
    pub layer_state: LayerState,

    /// Filter text for the area list
    pub area_filter: String,

    /// Application status message displayed in top bar
    pub status_message: String,

    pub health: ServiceHealth,

    /// Validated requests waiting for the transport
    pub outbox: Vec<PendingAnalysis>,

    /// Set by the UI when a health check should be sent
    pub health_check_requested: bool,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let (registry, status_message) = match AreaRegistry::load_embedded() {
            Ok(registry) => {
                log::info!("Loaded {} areas", registry.len());
                (registry, "Ready".to_string())
            }
            Err(e) => {
                log::error!("Failed to load area registry: {}", e);
                (AreaRegistry::default(), format!("Area data unavailable: {}", e))
            }
        };

        let reports = match ReportRegistry::load_embedded() {
            Ok(reports) => {
                log::info!("Loaded {} citizen reports", reports.len());
                reports
            }
            Err(e) => {
                log::error!("Failed to load citizen reports: {}", e);
                ReportRegistry::default()
            }
        };

        let mut state = Self {
            areas: AreaLayerManager::new(config.home_view()),
            map: Some(MapScene::new(config.home_view(), config.base_style)),
            config,
            registry,
            analysis: AnalysisClient::new(),
            analysis_layers: AnalysisLayerManager::new(),
            reports,
            report_markers: ReportManager::new(),
            date_range: DateRangeState::default(),
            layer_state: LayerState::default(),
            area_filter: String::new(),
            status_message,
            health: ServiceHealth::Unknown,
            outbox: Vec::new(),
            health_check_requested: true,
        };
        state.sync_area_layers();
        state.sync_report_markers();
        state
    }

    /// Adds layers for visible area levels and removes the hidden ones.
    pub fn sync_area_layers(&mut self) {
        let Some(map) = self.map.as_mut() else {
            return;
        };

        for kind in [AreaKind::Municipality, AreaKind::Barangay] {
            let areas: Vec<Area> = self
                .registry
                .of_kind(kind)
                .into_iter()
                .cloned()
                .collect();
            if self.layer_state.shows(kind) {
                let summary = self.areas.setup_areas(map, &areas);
                if summary.failed > 0 {
                    self.status_message =
                        format!("{} {} area(s) could not be drawn", summary.failed, kind.label());
                }
            } else {
                self.areas.remove_areas(map, &areas);
            }
        }
        log::debug!(
            "Map has {} sources, {} click listeners",
            map.source_count(),
            map.listener_count(MapEvent::Click)
        );
        self.sync_report_panel();
    }

    /// Shows or hides the report markers per the layer toggle.
    pub fn sync_report_markers(&mut self) {
        if self.layer_state.reports {
            self.report_markers.add_markers(&self.reports);
        } else {
            self.report_markers.remove_markers();
        }
    }

    /// Lists reports for the selected barangay, or closes the list.
    fn sync_report_panel(&mut self) {
        self.report_markers.follow_selection(self.areas.selected_area());
    }

    /// Focuses a report and flies the camera to it.
    pub fn fly_to_report(&mut self, report_id: &str) {
        let Some(report) = self.reports.get(report_id) else {
            log::warn!("Unknown report {}", report_id);
            return;
        };
        let Some(map) = self.map.as_mut() else {
            return;
        };
        if self.report_markers.fly_to_report(map, report).is_none() {
            self.status_message = format!("{} has no recorded location", report.title);
        }
    }

    /// Routes pointer events from the canvas to the managers owning the layers.
    ///
    /// Only the topmost layer under the pointer receives a click.
    pub fn dispatch(&mut self, events: Vec<LayerEvent>) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        let analysis = &self.analysis;
        let mut clicked = false;

        for event in events {
            if event.event == MapEvent::Click {
                if clicked {
                    continue;
                }
                clicked = true;
            }
            if self.areas.handle_event(map, &event) {
                continue;
            }
            let handled = self.analysis_layers.handle_event(map, &event, |kind| {
                let result = analysis.result(kind)?;
                let area = analysis
                    .current_area(kind)
                    .unwrap_or(result.area())
                    .to_string();
                Some((area, result.common_metadata().sensor.clone()))
            });
            if !handled {
                log::debug!("Unhandled {:?} on {}", event.event, event.layer_id);
            }
        }
        self.sync_report_panel();
    }

    /// Selects (or deselects) an area from the list.
    pub fn select_area(&mut self, area_id: &str) {
        let Some(area) = self.registry.get(area_id).cloned() else {
            log::warn!("Unknown area {}", area_id);
            return;
        };
        let Some(map) = self.map.as_mut() else {
            self.status_message = AnalysisError::MapNotInitialized.to_string();
            return;
        };
        if let Err(e) = self.areas.click_area(map, &area) {
            self.status_message = format!("Could not select {}: {}", area.name, e);
        }
        self.sync_report_panel();
    }

    /// Clears the selection and returns to the default view.
    pub fn reset_view(&mut self) {
        if let Some(map) = self.map.as_mut() {
            self.areas.reset_to_default(map);
        }
        self.sync_report_panel();
    }

    /// Closes the area details without moving the camera.
    pub fn close_area_details(&mut self) {
        if let Some(map) = self.map.as_mut() {
            self.areas.clear_selection(map);
        }
        self.sync_report_panel();
    }

    /// Validates and queues a run of `kind` for the selected area.
    pub fn run_analysis(&mut self, kind: AnalysisKind) {
        let Some(area) = self.areas.selected_area().cloned() else {
            self.status_message = "Select an area before running an analysis".to_string();
            return;
        };
        let (start, end) = match self.date_range.parse() {
            Ok(range) => range,
            Err(message) => {
                self.status_message = message;
                return;
            }
        };

        let request = AnalysisRequest::for_area(kind, &area, start, end);
        let map = self.map.as_mut().map(|m| m as &mut dyn MapHandle);
        match self.analysis.begin(map, &mut self.analysis_layers, request) {
            Ok(pending) => {
                self.status_message = format!("Running {} analysis for {}...", kind, area.name);
                self.outbox.push(pending);
            }
            Err(e) => {
                log::warn!("{} analysis not started: {}", kind, e);
                self.status_message = e.to_string();
            }
        }
    }

    pub fn clear_analysis(&mut self, kind: AnalysisKind) {
        let map = self.map.as_mut().map(|m| m as &mut dyn MapHandle);
        self.analysis.clear(map, &mut self.analysis_layers, kind);
    }

    pub fn toggle_analysis(&mut self, kind: AnalysisKind) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        if let Err(e) = self.analysis.toggle(map, &mut self.analysis_layers, kind) {
            self.status_message = e.to_string();
        }
    }

    /// Switches the base map; all area and analysis layers stay.
    pub fn set_base_style(&mut self, key: &str) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        match map.set_base_style(key) {
            Ok(style) => {
                self.config.base_style = style;
                self.config.save();
            }
            Err(e) => self.status_message = e.to_string(),
        }
    }

    /// Applies a message from the transport.
    pub fn apply_service_event(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::Analysis(completion) => self.apply_completion(completion),
            ServiceEvent::Health(Ok(report)) => {
                log::info!("Analysis service: {} ({})", report.status, report.gee_status);
                self.health = ServiceHealth::Online(report);
            }
            ServiceEvent::Health(Err(e)) => {
                log::warn!("Backend server not available: {}", e);
                self.health = ServiceHealth::Offline(e.to_string());
            }
        }
    }

    fn apply_completion(&mut self, completion: AnalysisCompletion) {
        let kind = completion.kind;
        let map = self.map.as_mut().map(|m| m as &mut dyn MapHandle);
        let outcome = self
            .analysis
            .complete(map, &mut self.analysis_layers, completion);
        let area = self.analysis.current_area(kind).unwrap_or("the selected area");

        match outcome {
            CompletionOutcome::Stale => {}
            CompletionOutcome::Rendered { features } => {
                self.status_message =
                    format!("{}: {} area(s) detected in {}", kind, features, area);
            }
            CompletionOutcome::Empty => {
                self.status_message = format!("{}: nothing detected in {}", kind, area);
            }
            CompletionOutcome::Failed(e) => {
                self.status_message = e.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{interpret_response, AnalysisStatus};
    use geo_types::Coord;

    #[test]
    fn test_new_state_draws_visible_areas() {
        let state = AppState::new(DashboardConfig::default());
        let map = state.map.as_ref().unwrap();
        assert_eq!(map.source_count(), state.registry.len());
        assert!(map.has_listener(MapEvent::Click, "id-brgy-1"));
        assert!(state.health_check_requested);
    }

    #[test]
    fn test_hiding_barangays_removes_their_layers() {
        let mut state = AppState::new(DashboardConfig::default());
        state.layer_state.barangays = false;
        state.sync_area_layers();

        let map = state.map.as_ref().unwrap();
        assert!(!map.has_layer("id-brgy-1"));
        assert!(map.has_layer("id-mun-malaybalay"));
    }

    #[test]
    fn test_reshown_municipalities_stay_below_barangays() {
        let mut state = AppState::new(DashboardConfig::default());
        state.layer_state.municipalities = false;
        state.sync_area_layers();
        state.layer_state.municipalities = true;
        state.sync_area_layers();

        let inside = Coord { x: 125.13, y: 8.15 };
        let events = state.map.as_ref().unwrap().click(inside);
        assert_eq!(events[0].layer_id, "id-brgy-1");
        state.dispatch(events);
        assert_eq!(state.areas.selected_id(), Some("brgy-1"));
    }

    #[test]
    fn test_overlay_stays_on_top_when_barangays_reshown() {
        let mut state = AppState::new(DashboardConfig::default());
        let overlay: geojson::FeatureCollection = serde_json::from_str(
            r#"{"type": "FeatureCollection", "features": [{"type": "Feature", "properties": {},
                "geometry": {"type": "Polygon", "coordinates": [[[125.12, 8.14], [125.14, 8.14],
                [125.14, 8.16], [125.12, 8.16], [125.12, 8.14]]]}}]}"#,
        )
        .unwrap();
        let map = state.map.as_mut().unwrap();
        state
            .analysis_layers
            .add_layer(map, AnalysisKind::Flood, &overlay)
            .unwrap();

        state.layer_state.barangays = false;
        state.sync_area_layers();
        state.layer_state.barangays = true;
        state.sync_area_layers();

        let map = state.map.as_ref().unwrap();
        let order = map.layer_ids();
        assert_eq!(
            order.last().map(String::as_str),
            Some("satellite-flood-layer-border")
        );
        let events = map.click(Coord { x: 125.13, y: 8.15 });
        assert_eq!(events[0].layer_id, "satellite-flood-layer");
    }

    #[test]
    fn test_selected_barangay_lists_its_reports() {
        let mut state = AppState::new(DashboardConfig::default());
        assert!(!state.report_markers.markers().is_empty());

        state.select_area("brgy-1");
        assert_eq!(state.report_markers.selected_barangay(), Some("brgy-1"));
        assert!(state.report_markers.show_report_details());

        state.select_area("mun-malaybalay");
        assert!(!state.report_markers.show_report_details());

        state.select_area("brgy-2");
        state.close_area_details();
        assert_eq!(state.report_markers.selected_barangay(), None);
    }

    #[test]
    fn test_fly_to_report_moves_camera() {
        let mut state = AppState::new(DashboardConfig::default());
        state.fly_to_report("rpt-002");

        let map = state.map.as_ref().unwrap();
        assert_eq!(map.camera().destination().zoom, 16.0);
        assert_eq!(state.report_markers.selected_report(), Some("rpt-002"));

        state.fly_to_report("rpt-008");
        assert!(state.status_message.contains("no recorded location"));
    }

    #[test]
    fn test_hiding_reports_removes_markers() {
        let mut state = AppState::new(DashboardConfig::default());
        state.layer_state.reports = false;
        state.sync_report_markers();
        assert!(state.report_markers.markers().is_empty());
    }

    #[test]
    fn test_run_requires_selection() {
        let mut state = AppState::new(DashboardConfig::default());
        state.run_analysis(AnalysisKind::Flood);
        assert!(state.outbox.is_empty());
        assert_eq!(state.analysis.status(AnalysisKind::Flood), AnalysisStatus::Idle);
    }

    #[test]
    fn test_click_select_run_and_complete() {
        let mut state = AppState::new(DashboardConfig::default());
        let inside = Coord { x: 125.13, y: 8.15 };
        let events = state.map.as_ref().unwrap().click(inside);
        state.dispatch(events);
        assert_eq!(state.areas.selected_id(), Some("brgy-1"));

        state.date_range = DateRangeState {
            start_input: "2024-01-01".into(),
            end_input: "2024-03-31".into(),
        };
        state.run_analysis(AnalysisKind::Flood);
        let pending = state.outbox.pop().unwrap();

        let body = r#"{"success": true, "area": "Poblacion", "dateRange": "2024-01-01 to 2024-03-31",
            "floodData": {"type": "FeatureCollection", "features": []},
            "metadata": {"sensor": "Sentinel-1", "threshold": "-17 dB", "scale": "30m",
                         "analysisDate": "2024-04-01"}}"#;
        state.apply_service_event(ServiceEvent::Analysis(AnalysisCompletion {
            kind: pending.kind,
            token: pending.token,
            outcome: interpret_response(pending.kind, 200, body),
        }));

        assert_eq!(state.analysis.status(AnalysisKind::Flood), AnalysisStatus::Succeeded);
        assert!(state.status_message.contains("nothing detected in Poblacion"));
        assert!(!state.map.as_ref().unwrap().has_layer("satellite-flood-layer"));
    }

    #[test]
    fn test_base_style_switch_keeps_area_layers() {
        let mut state = AppState::new(DashboardConfig::default());
        let before = state.map.as_ref().unwrap().layers().len();
        state.set_base_style("hybrid");
        let map = state.map.as_ref().unwrap();
        assert_eq!(map.layers().len(), before);
        assert_eq!(state.config.base_style, map.base_style());
    }
}
