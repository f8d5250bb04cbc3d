//! The seven environmental indicators and their fixed map styling.

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An environmental indicator with its own endpoint and overlay pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisKind {
    Flood,
    Forest,
    BuiltUp,
    Water,
    Dumpsite,
    Logging,
    Fire,
}

impl AnalysisKind {
    pub const COUNT: usize = 7;

    pub const ALL: [AnalysisKind; Self::COUNT] = [
        AnalysisKind::Flood,
        AnalysisKind::Forest,
        AnalysisKind::BuiltUp,
        AnalysisKind::Water,
        AnalysisKind::Dumpsite,
        AnalysisKind::Logging,
        AnalysisKind::Fire,
    ];

    /// Position in `ALL`, used to index per-kind tables.
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisKind::Flood => "Flood",
            AnalysisKind::Forest => "Forest Cover",
            AnalysisKind::BuiltUp => "Built-up Area",
            AnalysisKind::Water => "Water Bodies",
            AnalysisKind::Dumpsite => "Dumpsites",
            AnalysisKind::Logging => "Illegal Logging",
            AnalysisKind::Fire => "Forest Fire",
        }
    }

    /// URL and layer id segment.
    pub fn slug(&self) -> &'static str {
        match self {
            AnalysisKind::Flood => "flood",
            AnalysisKind::Forest => "forest",
            AnalysisKind::BuiltUp => "built-up",
            AnalysisKind::Water => "water",
            AnalysisKind::Dumpsite => "dumpsite",
            AnalysisKind::Logging => "logging",
            AnalysisKind::Fire => "fire",
        }
    }

    /// Name of the feature collection field in a successful response.
    pub fn data_field(&self) -> &'static str {
        match self {
            AnalysisKind::Flood => "floodData",
            AnalysisKind::Forest => "forestData",
            AnalysisKind::BuiltUp => "builtUpData",
            AnalysisKind::Water => "waterData",
            AnalysisKind::Dumpsite => "dumpsiteData",
            AnalysisKind::Logging => "loggingData",
            AnalysisKind::Fire => "fireData",
        }
    }

    /// Request path relative to the service base URL.
    pub fn endpoint(&self) -> String {
        format!("/analyze-{}", self.slug())
    }

    pub fn source_id(&self) -> String {
        format!("satellite-{}-source", self.slug())
    }

    pub fn layer_id(&self) -> String {
        format!("satellite-{}-layer", self.slug())
    }

    pub fn border_layer_id(&self) -> String {
        format!("{}-border", self.layer_id())
    }

    /// The kind owning an overlay layer id (fill or border).
    pub fn from_layer_id(layer_id: &str) -> Option<AnalysisKind> {
        Self::ALL
            .into_iter()
            .find(|k| layer_id == k.layer_id() || layer_id == k.border_layer_id())
    }

    pub fn fill_color(&self) -> Color32 {
        match self {
            AnalysisKind::Flood => Color32::from_rgb(0xDC, 0x35, 0x45),
            AnalysisKind::Forest => Color32::from_rgb(0x28, 0xA7, 0x45),
            AnalysisKind::BuiltUp => Color32::from_rgb(0x6F, 0x42, 0xC1),
            AnalysisKind::Water => Color32::from_rgb(0x00, 0x7B, 0xFF),
            AnalysisKind::Dumpsite => Color32::from_rgb(0x8B, 0x45, 0x13),
            AnalysisKind::Logging => Color32::from_rgb(0xFF, 0xC1, 0x07),
            AnalysisKind::Fire => Color32::from_rgb(0xFD, 0x7E, 0x14),
        }
    }

    pub fn border_color(&self) -> Color32 {
        match self {
            AnalysisKind::Flood => Color32::from_rgb(0x72, 0x1C, 0x24),
            AnalysisKind::Forest => Color32::from_rgb(0x15, 0x57, 0x24),
            AnalysisKind::BuiltUp => Color32::from_rgb(0x3D, 0x22, 0x6E),
            AnalysisKind::Water => Color32::from_rgb(0x00, 0x40, 0x85),
            AnalysisKind::Dumpsite => Color32::from_rgb(0x4A, 0x23, 0x0A),
            AnalysisKind::Logging => Color32::from_rgb(0x85, 0x64, 0x04),
            AnalysisKind::Fire => Color32::from_rgb(0x8A, 0x3B, 0x00),
        }
    }

    pub fn icon(&self) -> &'static str {
        use egui_phosphor::regular;
        match self {
            AnalysisKind::Flood => regular::WAVES,
            AnalysisKind::Forest => regular::TREE,
            AnalysisKind::BuiltUp => regular::BUILDINGS,
            AnalysisKind::Water => regular::DROP,
            AnalysisKind::Dumpsite => regular::TRASH,
            AnalysisKind::Logging => regular::WARNING,
            AnalysisKind::Fire => regular::FIRE,
        }
    }

    /// Popup title for a clicked overlay feature.
    pub fn detection_title(&self) -> &'static str {
        match self {
            AnalysisKind::Flood => "Flood Area Detected",
            AnalysisKind::Forest => "Forest Cover",
            AnalysisKind::BuiltUp => "Built-up Area",
            AnalysisKind::Water => "Water Body",
            AnalysisKind::Dumpsite => "Possible Dumpsite",
            AnalysisKind::Logging => "Forest Loss Detected",
            AnalysisKind::Fire => "Burned Area Detected",
        }
    }

    /// Detection method shown in popups and the results panel.
    pub fn detection_method(&self) -> &'static str {
        match self {
            AnalysisKind::Flood => "Radar backscatter analysis",
            AnalysisKind::Forest => "Canopy cover classification",
            AnalysisKind::BuiltUp => "Built-up index thresholding",
            AnalysisKind::Water => "Water index thresholding",
            AnalysisKind::Dumpsite => "Spectral anomaly detection",
            AnalysisKind::Logging => "Forest loss change detection",
            AnalysisKind::Fire => "Burn severity analysis",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_naming() {
        let kind = AnalysisKind::Flood;
        assert_eq!(kind.endpoint(), "/analyze-flood");
        assert_eq!(kind.source_id(), "satellite-flood-source");
        assert_eq!(kind.layer_id(), "satellite-flood-layer");
        assert_eq!(kind.border_layer_id(), "satellite-flood-layer-border");
        assert_eq!(AnalysisKind::BuiltUp.endpoint(), "/analyze-built-up");
    }

    #[test]
    fn test_from_layer_id_covers_every_kind() {
        for (i, kind) in AnalysisKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(AnalysisKind::from_layer_id(&kind.layer_id()), Some(*kind));
            assert_eq!(
                AnalysisKind::from_layer_id(&kind.border_layer_id()),
                Some(*kind)
            );
        }
        assert_eq!(AnalysisKind::from_layer_id("id-brgy-1"), None);
    }
}
