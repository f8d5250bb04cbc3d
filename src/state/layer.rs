//! Area layer visibility state.

use crate::areas::AreaKind;

/// Which administrative levels are drawn on the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerState {
    /// Show municipality boundaries
    pub municipalities: bool,

    /// Show barangay boundaries (hover highlighting lives here)
    pub barangays: bool,

    /// Draw area names at their centers
    pub labels: bool,

    /// Citizen report markers
    pub reports: bool,
}

impl Default for LayerState {
    fn default() -> Self {
        Self {
            municipalities: true,
            barangays: true,
            labels: false,
            reports: true,
        }
    }
}

impl LayerState {
    pub fn shows(&self, kind: AreaKind) -> bool {
        match kind {
            AreaKind::Municipality => self.municipalities,
            AreaKind::Barangay => self.barangays,
        }
    }
}
