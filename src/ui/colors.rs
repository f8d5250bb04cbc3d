//! Centralized color constants for the UI.

use eframe::egui::Color32;

/// General UI colors for labels and values.
pub mod ui {
    use super::Color32;

    /// Muted gray for labels.
    pub const LABEL: Color32 = Color32::from_rgb(100, 100, 100);
    /// Slightly brighter for values.
    pub const VALUE: Color32 = Color32::from_rgb(160, 160, 160);
    /// Emphasized color for active states.
    pub const ACTIVE: Color32 = Color32::from_rgb(100, 180, 255);
    pub const SUCCESS: Color32 = Color32::from_rgb(100, 200, 100);
    pub const WARNING: Color32 = Color32::from_rgb(255, 180, 50);
    pub const ERROR: Color32 = Color32::from_rgb(255, 80, 80);
}

/// Colors drawn on the map canvas.
pub mod map {
    use super::Color32;

    /// Area name labels.
    pub const LABEL: Color32 = Color32::from_rgb(230, 230, 230);
    /// Tooltip background.
    pub const POPUP_FILL: Color32 = Color32::from_rgba_premultiplied(20, 20, 28, 235);
    pub const POPUP_BORDER: Color32 = Color32::from_rgb(90, 90, 110);
    /// Zoom / coordinate readout.
    pub const OVERLAY_TEXT: Color32 = Color32::from_rgb(180, 180, 190);
}
