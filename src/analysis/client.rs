//! Per-kind analysis state machine.
//!
//! `begin` validates a request and hands back the work for the transport;
//! `complete` applies whatever the transport reports. Each kind carries a
//! monotonically increasing token so a re-run supersedes the request in
//! flight and its late completion is dropped.

use super::error::AnalysisError;
use super::kind::AnalysisKind;
use super::layers::AnalysisLayerManager;
use super::result::AnalysisResult;
use crate::areas::Area;
use crate::map::MapHandle;
use chrono::NaiveDate;
use geojson::Geometry;
use serde_json::json;

/// Lifecycle of the latest run of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl AnalysisStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisStatus::Idle => "Idle",
            AnalysisStatus::Running => "Running",
            AnalysisStatus::Succeeded => "Done",
            AnalysisStatus::Failed => "Failed",
        }
    }
}

/// Everything known about one analysis kind.
#[derive(Debug, Clone, Default)]
pub struct AnalysisLayerState {
    pub status: AnalysisStatus,
    pub result: Option<AnalysisResult>,
    /// Token of the request whose completion is still accepted.
    pub token: u64,
    /// Name of the area the current result or run belongs to.
    pub area: Option<String>,
    pub last_error: Option<AnalysisError>,
}

/// Inputs for one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    pub area_id: String,
    pub area_name: String,
    pub geometry: Option<Geometry>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AnalysisRequest {
    pub fn for_area(
        kind: AnalysisKind,
        area: &Area,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            area_id: area.id.clone(),
            area_name: area.name.clone(),
            geometry: area.boundary.geometry.clone(),
            start_date,
            end_date,
        }
    }
}

/// A validated request ready for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnalysis {
    pub kind: AnalysisKind,
    pub token: u64,
    /// Path relative to the service base URL.
    pub endpoint: String,
    pub body: serde_json::Value,
}

/// What the transport reports back for a pending request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisCompletion {
    pub kind: AnalysisKind,
    pub token: u64,
    pub outcome: Result<AnalysisResult, AnalysisError>,
}

/// How a completion was applied.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Superseded or cleared; nothing changed.
    Stale,
    /// Result stored and drawn.
    Rendered { features: usize },
    /// Result stored; no features, so no overlay.
    Empty,
    Failed(AnalysisError),
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisClient {
    states: [AnalysisLayerState; AnalysisKind::COUNT],
}

impl AnalysisClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, kind: AnalysisKind) -> &AnalysisLayerState {
        &self.states[kind.index()]
    }

    pub fn status(&self, kind: AnalysisKind) -> AnalysisStatus {
        self.state(kind).status
    }

    pub fn result(&self, kind: AnalysisKind) -> Option<&AnalysisResult> {
        self.state(kind).result.as_ref()
    }

    /// Name of the area the current result belongs to.
    pub fn current_area(&self, kind: AnalysisKind) -> Option<&str> {
        self.state(kind).area.as_deref()
    }

    pub fn any_running(&self) -> bool {
        self.states
            .iter()
            .any(|s| s.status == AnalysisStatus::Running)
    }

    /// Validates `request`, clears the kind's previous output and marks it running.
    pub fn begin(
        &mut self,
        map: Option<&mut dyn MapHandle>,
        layers: &mut AnalysisLayerManager,
        request: AnalysisRequest,
    ) -> Result<PendingAnalysis, AnalysisError> {
        let map = map.ok_or(AnalysisError::MapNotInitialized)?;
        let geometry = request
            .geometry
            .ok_or_else(|| AnalysisError::MissingGeometry(request.area_name.clone()))?;
        if request.start_date > request.end_date {
            return Err(AnalysisError::InvalidDateRange {
                start: request.start_date,
                end: request.end_date,
            });
        }

        let kind = request.kind;
        self.clear(Some(map), layers, kind);

        let state = &mut self.states[kind.index()];
        state.token += 1;
        state.status = AnalysisStatus::Running;
        state.area = Some(request.area_name.clone());

        log::info!(
            "Starting {} analysis for {} ({} to {})",
            kind,
            request.area_name,
            request.start_date,
            request.end_date
        );

        Ok(PendingAnalysis {
            kind,
            token: state.token,
            endpoint: kind.endpoint(),
            body: json!({
                "geometry": geometry,
                "startDate": request.start_date.format("%Y-%m-%d").to_string(),
                "endDate": request.end_date.format("%Y-%m-%d").to_string(),
                "areaName": request.area_name,
            }),
        })
    }

    /// Applies a transport completion. Superseded completions are ignored.
    pub fn complete(
        &mut self,
        map: Option<&mut dyn MapHandle>,
        layers: &mut AnalysisLayerManager,
        completion: AnalysisCompletion,
    ) -> CompletionOutcome {
        let kind = completion.kind;
        let state = &mut self.states[kind.index()];
        if completion.token != state.token || state.status != AnalysisStatus::Running {
            log::debug!(
                "Dropping stale {} completion (token {}, current {})",
                kind,
                completion.token,
                state.token
            );
            return CompletionOutcome::Stale;
        }

        let result = match completion.outcome {
            Ok(result) => result,
            Err(e) => {
                log::error!("{} analysis failed: {}", kind, e);
                state.status = AnalysisStatus::Failed;
                state.last_error = Some(e.clone());
                return CompletionOutcome::Failed(e);
            }
        };

        let features = result.feature_count();
        log::info!(
            "{} analysis completed: {} feature(s), sensor {}",
            kind,
            features,
            result.common_metadata().sensor
        );

        let outcome = if features == 0 {
            log::info!("No {} areas detected, no layer to add", kind);
            CompletionOutcome::Empty
        } else {
            let drawn = match map {
                Some(map) => layers
                    .add_layer(map, kind, result.data())
                    .map_err(AnalysisError::from),
                None => Err(AnalysisError::MapNotInitialized),
            };
            if let Err(e) = drawn {
                state.status = AnalysisStatus::Failed;
                state.last_error = Some(e.clone());
                state.result = Some(result);
                return CompletionOutcome::Failed(e);
            }
            CompletionOutcome::Rendered { features }
        };

        state.result = Some(result);
        state.status = AnalysisStatus::Succeeded;
        outcome
    }

    /// Drops the result and overlay of `kind`; an in-flight run becomes stale.
    pub fn clear(
        &mut self,
        map: Option<&mut dyn MapHandle>,
        layers: &mut AnalysisLayerManager,
        kind: AnalysisKind,
    ) {
        let state = &mut self.states[kind.index()];
        state.result = None;
        state.area = None;
        state.last_error = None;
        if state.status == AnalysisStatus::Running {
            state.token += 1;
        }
        state.status = AnalysisStatus::Idle;

        if let Some(map) = map {
            layers.remove_layer(map, kind);
        }
    }

    /// Shows or hides the overlay of `kind` using the stored result.
    pub fn toggle(
        &self,
        map: &mut dyn MapHandle,
        layers: &mut AnalysisLayerManager,
        kind: AnalysisKind,
    ) -> Result<(), AnalysisError> {
        layers.toggle(map, kind, self.result(kind))?;
        Ok(())
    }
}
