//! Static registry of selectable administrative areas.

use crate::geo::polygons_from_geometry;
use crate::map::MapError;
use eframe::egui::Color32;
use geo::BoundingRect;
use geo_types::{MultiPolygon, Rect};
use geojson::{Feature, Geometry};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Embedded area boundaries for the default region.
static AREAS_JSON: &str = include_str!("../../assets/areas.json");

/// Errors raised while loading or reading areas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AreaError {
    #[error("failed to parse area registry: {0}")]
    Parse(String),

    #[error("duplicate area id '{0}'")]
    DuplicateId(String),

    #[error("area '{0}' has no boundary geometry")]
    MissingGeometry(String),

    #[error("area '{id}' has an invalid boundary: {reason}")]
    InvalidGeometry { id: String, reason: String },

    #[error(transparent)]
    Map(#[from] MapError),
}

/// Administrative level of an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaKind {
    Municipality,
    Barangay,
}

impl AreaKind {
    pub fn label(&self) -> &'static str {
        match self {
            AreaKind::Municipality => "Municipality",
            AreaKind::Barangay => "Barangay",
        }
    }

    /// Highlight color used for the selected outline and hover fill.
    pub fn color(&self) -> Color32 {
        match self {
            // #00ACC1
            AreaKind::Barangay => Color32::from_rgb(0x00, 0xAC, 0xC1),
            // #0027C1
            AreaKind::Municipality => Color32::from_rgb(0x00, 0x27, 0xC1),
        }
    }

    /// Stacking level on the map. Finer levels draw above coarser ones.
    pub fn stack_level(&self) -> u8 {
        match self {
            AreaKind::Municipality => 0,
            AreaKind::Barangay => 1,
        }
    }

    /// Only the finer-grained level reacts to hover.
    pub fn hoverable(&self) -> bool {
        matches!(self, AreaKind::Barangay)
    }
}

/// A named administrative region with its boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AreaKind,
    #[serde(rename = "geojson")]
    pub boundary: Feature,
    #[serde(default, rename = "municipality", skip_serializing_if = "Option::is_none")]
    pub parent_municipality: Option<String>,
}

impl Area {
    /// The boundary geometry.
    pub fn geometry(&self) -> Result<&Geometry, AreaError> {
        self.boundary
            .geometry
            .as_ref()
            .ok_or_else(|| AreaError::MissingGeometry(self.id.clone()))
    }

    /// The boundary as polygons, validated.
    pub fn polygons(&self) -> Result<MultiPolygon<f64>, AreaError> {
        polygons_from_geometry(self.geometry()?).map_err(|reason| AreaError::InvalidGeometry {
            id: self.id.clone(),
            reason,
        })
    }

    /// Bounding box of the boundary.
    pub fn bounds(&self) -> Result<Rect<f64>, AreaError> {
        self.polygons()?
            .bounding_rect()
            .ok_or_else(|| AreaError::InvalidGeometry {
                id: self.id.clone(),
                reason: "empty boundary".to_string(),
            })
    }

    /// Fill layer id.
    pub fn fill_layer_id(&self) -> String {
        format!("id-{}", self.id)
    }

    /// Outline layer id.
    pub fn outline_layer_id(&self) -> String {
        format!("id-{}-outline", self.id)
    }

    /// Source id.
    pub fn source_id(&self) -> &str {
        &self.id
    }
}

/// The set of selectable areas, loaded once.
#[derive(Debug, Clone, Default)]
pub struct AreaRegistry {
    areas: Vec<Area>,
}

impl AreaRegistry {
    /// Loads the embedded registry.
    pub fn load_embedded() -> Result<Self, AreaError> {
        Self::from_json(AREAS_JSON)
    }

    /// Parses a registry from JSON. Ids must be unique.
    pub fn from_json(json: &str) -> Result<Self, AreaError> {
        let areas: Vec<Area> =
            serde_json::from_str(json).map_err(|e| AreaError::Parse(e.to_string()))?;
        Self::from_areas(areas)
    }

    pub fn from_areas(areas: Vec<Area>) -> Result<Self, AreaError> {
        let mut seen = std::collections::HashSet::new();
        for area in &areas {
            if !seen.insert(area.id.as_str()) {
                return Err(AreaError::DuplicateId(area.id.clone()));
            }
        }
        Ok(Self { areas })
    }

    pub fn all(&self) -> &[Area] {
        &self.areas
    }

    pub fn get(&self, id: &str) -> Option<&Area> {
        self.areas.iter().find(|a| a.id == id)
    }

    pub fn of_kind(&self, kind: AreaKind) -> Vec<&Area> {
        self.areas.iter().filter(|a| a.kind == kind).collect()
    }

    /// Barangays belonging to a municipality.
    pub fn barangays_of(&self, municipality: &str) -> Vec<&Area> {
        self.areas
            .iter()
            .filter(|a| {
                a.kind == AreaKind::Barangay
                    && a.parent_municipality.as_deref() == Some(municipality)
            })
            .collect()
    }

    /// Areas whose name contains `query`, case-insensitively.
    pub fn search(&self, query: &str) -> Vec<&Area> {
        let query = query.trim().to_lowercase();
        self.areas
            .iter()
            .filter(|a| query.is_empty() || a.name.to_lowercase().contains(&query))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_registry_loads() {
        let registry = AreaRegistry::load_embedded().unwrap();
        assert!(!registry.is_empty());
        assert!(!registry.of_kind(AreaKind::Municipality).is_empty());
        assert!(!registry.of_kind(AreaKind::Barangay).is_empty());

        for area in registry.all() {
            assert!(area.bounds().is_ok(), "bad boundary for {}", area.id);
        }

        let poblacion = registry.get("brgy-1").unwrap();
        assert_eq!(poblacion.name, "Poblacion");
        assert_eq!(poblacion.kind, AreaKind::Barangay);
        assert_eq!(poblacion.fill_layer_id(), "id-brgy-1");
        assert_eq!(poblacion.outline_layer_id(), "id-brgy-1-outline");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": "a", "name": "A", "type": "Barangay",
             "geojson": {"type": "Feature", "properties": {}, "geometry": null}},
            {"id": "a", "name": "B", "type": "Barangay",
             "geojson": {"type": "Feature", "properties": {}, "geometry": null}}
        ]"#;
        assert_eq!(
            AreaRegistry::from_json(json).unwrap_err(),
            AreaError::DuplicateId("a".into())
        );
    }

    #[test]
    fn test_missing_geometry_reported_per_area() {
        let json = r#"[
            {"id": "a", "name": "A", "type": "Municipality",
             "geojson": {"type": "Feature", "properties": {}, "geometry": null}}
        ]"#;
        let registry = AreaRegistry::from_json(json).unwrap();
        assert_eq!(
            registry.get("a").unwrap().bounds(),
            Err(AreaError::MissingGeometry("a".into()))
        );
    }

    #[test]
    fn test_search_and_hierarchy() {
        let registry = AreaRegistry::load_embedded().unwrap();
        let hits = registry.search("pob");
        assert!(hits.iter().any(|a| a.id == "brgy-1"));
        assert_eq!(registry.search("").len(), registry.len());

        let parent = registry.get("brgy-1").unwrap().parent_municipality.clone().unwrap();
        assert!(registry.barangays_of(&parent).iter().any(|a| a.id == "brgy-1"));
    }
}
