//! Typed analysis responses, one schema per kind.

use super::error::AnalysisError;
use super::kind::AnalysisKind;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

/// Metadata fields every kind reports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonMetadata {
    /// Sensor or dataset the detection ran on.
    #[serde(default, alias = "dataset")]
    pub sensor: String,
    #[serde(default)]
    pub scale: String,
    #[serde(default)]
    pub analysis_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodMetadata {
    #[serde(flatten)]
    pub common: CommonMetadata,
    /// Backscatter threshold, e.g. "-17 dB".
    pub threshold: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestMetadata {
    #[serde(flatten)]
    pub common: CommonMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canopy_threshold: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltUpMetadata {
    #[serde(flatten)]
    pub common: CommonMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ndbi_threshold: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterMetadata {
    #[serde(flatten)]
    pub common: CommonMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ndwi_threshold: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpsiteMetadata {
    #[serde(flatten)]
    pub common: CommonMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingMetadata {
    #[serde(flatten)]
    pub common: CommonMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_threshold: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireMetadata {
    #[serde(flatten)]
    pub common: CommonMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burn_threshold: Option<String>,
}

/// Declares a response struct whose feature collection lives under `$field`.
macro_rules! kind_response {
    ($name:ident, $meta:ty, $field:literal) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub success: bool,
            #[serde(default)]
            pub area: String,
            #[serde(default)]
            pub date_range: String,
            #[serde(rename = $field)]
            pub data: FeatureCollection,
            pub metadata: $meta,
        }
    };
}

kind_response!(FloodResult, FloodMetadata, "floodData");
kind_response!(ForestResult, ForestMetadata, "forestData");
kind_response!(BuiltUpResult, BuiltUpMetadata, "builtUpData");
kind_response!(WaterResult, WaterMetadata, "waterData");
kind_response!(DumpsiteResult, DumpsiteMetadata, "dumpsiteData");
kind_response!(LoggingResult, LoggingMetadata, "loggingData");
kind_response!(FireResult, FireMetadata, "fireData");

/// A successful analysis response, discriminated by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Flood(FloodResult),
    Forest(ForestResult),
    BuiltUp(BuiltUpResult),
    Water(WaterResult),
    Dumpsite(DumpsiteResult),
    Logging(LoggingResult),
    Fire(FireResult),
}

/// Applies `$body` to the inner response of whichever variant `$result` holds.
macro_rules! with_response {
    ($result:expr, $r:ident => $body:expr) => {
        match $result {
            AnalysisResult::Flood($r) => $body,
            AnalysisResult::Forest($r) => $body,
            AnalysisResult::BuiltUp($r) => $body,
            AnalysisResult::Water($r) => $body,
            AnalysisResult::Dumpsite($r) => $body,
            AnalysisResult::Logging($r) => $body,
            AnalysisResult::Fire($r) => $body,
        }
    };
}

impl AnalysisResult {
    /// Decodes a 2xx response body with the schema of `kind`.
    pub fn parse(kind: AnalysisKind, body: &str) -> Result<Self, AnalysisError> {
        fn decode<'a, T: Deserialize<'a>>(
            kind: AnalysisKind,
            body: &'a str,
        ) -> Result<T, AnalysisError> {
            serde_json::from_str(body).map_err(|e| {
                AnalysisError::Decode(format!("{} response ({}): {}", kind, kind.data_field(), e))
            })
        }

        Ok(match kind {
            AnalysisKind::Flood => AnalysisResult::Flood(decode(kind, body)?),
            AnalysisKind::Forest => AnalysisResult::Forest(decode(kind, body)?),
            AnalysisKind::BuiltUp => AnalysisResult::BuiltUp(decode(kind, body)?),
            AnalysisKind::Water => AnalysisResult::Water(decode(kind, body)?),
            AnalysisKind::Dumpsite => AnalysisResult::Dumpsite(decode(kind, body)?),
            AnalysisKind::Logging => AnalysisResult::Logging(decode(kind, body)?),
            AnalysisKind::Fire => AnalysisResult::Fire(decode(kind, body)?),
        })
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisResult::Flood(_) => AnalysisKind::Flood,
            AnalysisResult::Forest(_) => AnalysisKind::Forest,
            AnalysisResult::BuiltUp(_) => AnalysisKind::BuiltUp,
            AnalysisResult::Water(_) => AnalysisKind::Water,
            AnalysisResult::Dumpsite(_) => AnalysisKind::Dumpsite,
            AnalysisResult::Logging(_) => AnalysisKind::Logging,
            AnalysisResult::Fire(_) => AnalysisKind::Fire,
        }
    }

    pub fn success(&self) -> bool {
        with_response!(self, r => r.success)
    }

    pub fn area(&self) -> &str {
        with_response!(self, r => &r.area)
    }

    pub fn date_range(&self) -> &str {
        with_response!(self, r => &r.date_range)
    }

    /// The detected features.
    pub fn data(&self) -> &FeatureCollection {
        with_response!(self, r => &r.data)
    }

    pub fn feature_count(&self) -> usize {
        self.data().features.len()
    }

    pub fn common_metadata(&self) -> &CommonMetadata {
        with_response!(self, r => &r.metadata.common)
    }

    /// The kind-specific threshold, when the service reports one.
    pub fn threshold(&self) -> Option<&str> {
        match self {
            AnalysisResult::Flood(r) => Some(r.metadata.threshold.as_str()),
            AnalysisResult::Forest(r) => r.metadata.canopy_threshold.as_deref(),
            AnalysisResult::BuiltUp(r) => r.metadata.ndbi_threshold.as_deref(),
            AnalysisResult::Water(r) => r.metadata.ndwi_threshold.as_deref(),
            AnalysisResult::Dumpsite(r) => r.metadata.detection_method.as_deref(),
            AnalysisResult::Logging(r) => r.metadata.loss_threshold.as_deref(),
            AnalysisResult::Fire(r) => r.metadata.burn_threshold.as_deref(),
        }
    }

    /// Label/value rows for the results panel.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let meta = self.common_metadata();
        let mut rows = vec![
            ("Area", self.area().to_string()),
            ("Dates", self.date_range().to_string()),
            ("Features", self.feature_count().to_string()),
            ("Sensor", meta.sensor.clone()),
            ("Scale", meta.scale.clone()),
        ];
        if let Some(threshold) = self.threshold() {
            rows.push(("Threshold", threshold.to_string()));
        }
        if let Some(count) = meta.image_count {
            rows.push(("Images", count.to_string()));
        }
        rows.push(("Analyzed", meta.analysis_date.clone()));
        if let Some(note) = &meta.note {
            rows.push(("Note", note.clone()));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOD_EMPTY: &str = r#"{
        "success": true,
        "area": "Poblacion",
        "dateRange": "2024-01-01 to 2024-03-31",
        "floodData": {"type": "FeatureCollection", "features": []},
        "metadata": {
            "sensor": "Sentinel-1",
            "threshold": "-17 dB",
            "scale": "30m",
            "analysisDate": "2024-04-01T00:00:00.000Z"
        }
    }"#;

    #[test]
    fn test_parse_flood_response() {
        let result = AnalysisResult::parse(AnalysisKind::Flood, FLOOD_EMPTY).unwrap();
        assert_eq!(result.kind(), AnalysisKind::Flood);
        assert!(result.success());
        assert_eq!(result.area(), "Poblacion");
        assert_eq!(result.feature_count(), 0);
        assert_eq!(result.common_metadata().sensor, "Sentinel-1");
        assert_eq!(result.threshold(), Some("-17 dB"));
        assert!(result.summary().iter().any(|(k, v)| *k == "Scale" && v == "30m"));
    }

    #[test]
    fn test_data_field_is_kind_specific() {
        // A flood body is not a forest body.
        match AnalysisResult::parse(AnalysisKind::Forest, FLOOD_EMPTY) {
            Err(AnalysisError::Decode(message)) => assert!(message.contains("forestData")),
            other => panic!("expected decode error, got {:?}", other),
        }

        let forest = r#"{
            "success": true,
            "forestData": {"type": "FeatureCollection", "features": []},
            "metadata": {"dataset": "Hansen GFC", "scale": "30m",
                         "analysisDate": "2024-04-01", "imageCount": 12,
                         "note": "Cloud-masked composite"}
        }"#;
        let result = AnalysisResult::parse(AnalysisKind::Forest, forest).unwrap();
        assert_eq!(result.kind(), AnalysisKind::Forest);
        assert_eq!(result.common_metadata().sensor, "Hansen GFC");
        assert_eq!(result.common_metadata().image_count, Some(12));
        assert_eq!(result.threshold(), None);
        assert_eq!(result.area(), "");
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        assert!(matches!(
            AnalysisResult::parse(AnalysisKind::Fire, "not json"),
            Err(AnalysisError::Decode(_))
        ));
    }
}
