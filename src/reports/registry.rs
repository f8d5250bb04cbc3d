//! Citizen-submitted environmental reports.

use chrono::{DateTime, Utc};
use eframe::egui::Color32;
use egui_phosphor::regular;
use geo_types::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded reports for the default region.
static REPORTS_JSON: &str = include_str!("../../assets/reports.json");

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    #[error("failed to parse citizen reports: {0}")]
    Parse(String),

    #[error("duplicate report id '{0}'")]
    DuplicateId(String),
}

/// Handling state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 3] = [
        ReportStatus::Pending,
        ReportStatus::InProgress,
        ReportStatus::Resolved,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::InProgress => "In Progress",
            ReportStatus::Resolved => "Resolved",
        }
    }

    /// Marker fill.
    pub fn color(&self) -> Color32 {
        match self {
            // #f57c00
            ReportStatus::Pending => Color32::from_rgb(0xF5, 0x7C, 0x00),
            // #1976d2
            ReportStatus::InProgress => Color32::from_rgb(0x19, 0x76, 0xD2),
            // #388e3c
            ReportStatus::Resolved => Color32::from_rgb(0x38, 0x8E, 0x3C),
        }
    }

    /// Glyph drawn inside the marker.
    pub fn icon(&self) -> &'static str {
        match self {
            ReportStatus::Pending => regular::EXCLAMATION_MARK,
            ReportStatus::InProgress => regular::ARROWS_CLOCKWISE,
            ReportStatus::Resolved => regular::CHECK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportLocation {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Administrative link of a report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLink {
    #[serde(default)]
    pub barangay_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitizenReport {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub status: ReportStatus,
    #[serde(default)]
    pub reporter_name: Option<String>,
    #[serde(default)]
    pub location: ReportLocation,
    #[serde(rename = "geojson", default)]
    pub link: Option<ReportLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CitizenReport {
    /// Map position, when both coordinates are known.
    pub fn coord(&self) -> Option<Coord<f64>> {
        match (self.location.longitude, self.location.latitude) {
            (Some(x), Some(y)) => Some(Coord { x, y }),
            _ => None,
        }
    }

    pub fn barangay_id(&self) -> Option<&str> {
        self.link.as_ref()?.barangay_id.as_deref()
    }
}

/// All known reports, loaded once.
#[derive(Debug, Clone, Default)]
pub struct ReportRegistry {
    reports: Vec<CitizenReport>,
}

impl ReportRegistry {
    pub fn load_embedded() -> Result<Self, ReportError> {
        Self::from_json(REPORTS_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        let reports: Vec<CitizenReport> =
            serde_json::from_str(json).map_err(|e| ReportError::Parse(e.to_string()))?;
        let mut seen = std::collections::HashSet::new();
        for report in &reports {
            if !seen.insert(report.id.as_str()) {
                return Err(ReportError::DuplicateId(report.id.clone()));
            }
        }
        Ok(Self { reports })
    }

    pub fn all(&self) -> &[CitizenReport] {
        &self.reports
    }

    pub fn get(&self, id: &str) -> Option<&CitizenReport> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn by_barangay(&self, barangay_id: &str) -> Vec<&CitizenReport> {
        self.reports
            .iter()
            .filter(|r| r.barangay_id() == Some(barangay_id))
            .collect()
    }

    pub fn count_by_barangay(&self, barangay_id: &str) -> usize {
        self.by_barangay(barangay_id).len()
    }

    pub fn count_by_status(&self, barangay_id: &str, status: ReportStatus) -> usize {
        self.by_barangay(barangay_id)
            .into_iter()
            .filter(|r| r.status == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }
}
