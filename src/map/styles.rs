//! Base map style catalog.

use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

/// Available base map styles. Custom sources and layers survive a style change.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseStyle {
    Streets,
    #[serde(rename = "topo")]
    Topographic,
    Terrain,
    #[default]
    Satellite,
    Hybrid,
}

impl BaseStyle {
    pub fn all() -> &'static [BaseStyle] {
        &[
            BaseStyle::Streets,
            BaseStyle::Topographic,
            BaseStyle::Terrain,
            BaseStyle::Satellite,
            BaseStyle::Hybrid,
        ]
    }

    /// Stable key used in settings.
    pub fn key(&self) -> &'static str {
        match self {
            BaseStyle::Streets => "streets",
            BaseStyle::Topographic => "topo",
            BaseStyle::Terrain => "terrain",
            BaseStyle::Satellite => "satellite",
            BaseStyle::Hybrid => "hybrid",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|s| s.key() == key)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BaseStyle::Streets => "Streets",
            BaseStyle::Topographic => "Topographic",
            BaseStyle::Terrain => "Terrain",
            BaseStyle::Satellite => "Satellite",
            BaseStyle::Hybrid => "Hybrid",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BaseStyle::Streets => "Roads, landmarks and points of interest",
            BaseStyle::Topographic => "Terrain, elevations and natural features",
            BaseStyle::Terrain => "Hillshading and natural landscape",
            BaseStyle::Satellite => "High-resolution satellite imagery",
            BaseStyle::Hybrid => "Satellite imagery with place labels",
        }
    }

    /// Canvas background drawn under all layers.
    pub fn background(&self) -> Color32 {
        match self {
            BaseStyle::Streets => Color32::from_rgb(236, 232, 224),
            BaseStyle::Topographic => Color32::from_rgb(222, 228, 206),
            BaseStyle::Terrain => Color32::from_rgb(205, 214, 188),
            BaseStyle::Satellite => Color32::from_rgb(28, 42, 34),
            BaseStyle::Hybrid => Color32::from_rgb(34, 46, 40),
        }
    }

    /// Graticule color that reads well on the background.
    pub fn grid(&self) -> Color32 {
        match self {
            BaseStyle::Satellite | BaseStyle::Hybrid => {
                Color32::from_rgba_unmultiplied(200, 220, 200, 30)
            }
            _ => Color32::from_rgba_unmultiplied(60, 60, 60, 40),
        }
    }

    /// Whether place labels are drawn for this style.
    pub fn shows_labels(&self) -> bool {
        !matches!(self, BaseStyle::Satellite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for style in BaseStyle::all() {
            assert_eq!(BaseStyle::from_key(style.key()), Some(*style));
        }
        assert_eq!(BaseStyle::from_key("dark"), None);
    }

    #[test]
    fn test_default_is_satellite() {
        assert_eq!(BaseStyle::default(), BaseStyle::Satellite);
        assert_eq!(serde_json::to_string(&BaseStyle::Topographic).unwrap(), "\"topo\"");
    }
}
