//! Geographic feature conversion from GeoJSON.

use geo::{BoundingRect, Contains};
use geo_types::{Coord, LineString, MultiPolygon, Point, Polygon, Rect};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

/// A geographic feature that can be rendered and hit-tested.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoFeature {
    /// A single point
    Point(Coord<f64>),
    /// A series of connected line segments
    LineString(Vec<Coord<f64>>),
    /// Multiple line strings
    MultiLineString(Vec<Vec<Coord<f64>>>),
    /// One or more polygons, each an exterior ring plus holes
    Polygons(MultiPolygon<f64>),
}

impl GeoFeature {
    /// Bounding rectangle of the feature, if it has any coordinates.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        match self {
            GeoFeature::Point(c) => Some(Rect::new(*c, *c)),
            GeoFeature::LineString(coords) => LineString::from(coords.clone()).bounding_rect(),
            GeoFeature::MultiLineString(lines) => lines
                .iter()
                .filter_map(|l| LineString::from(l.clone()).bounding_rect())
                .reduce(union_rect),
            GeoFeature::Polygons(polygons) => polygons.bounding_rect(),
        }
    }

    /// Whether the point lies inside the feature. Only polygons have an interior.
    pub fn contains(&self, coord: Coord<f64>) -> bool {
        match self {
            GeoFeature::Polygons(polygons) => polygons.contains(&Point::from(coord)),
            _ => false,
        }
    }
}

/// Union of two bounding rectangles.
pub fn union_rect(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Bounding rectangle of a set of features.
pub fn features_bounds(features: &[GeoFeature]) -> Option<Rect<f64>> {
    features
        .iter()
        .filter_map(GeoFeature::bounds)
        .reduce(union_rect)
}

/// Converts any GeoJSON document into renderable features.
///
/// Features without geometry are skipped.
pub fn features_from_geojson(geojson: &GeoJson) -> Result<Vec<GeoFeature>, String> {
    match geojson {
        GeoJson::FeatureCollection(fc) => features_from_collection(fc),
        GeoJson::Feature(f) => features_from_feature(f),
        GeoJson::Geometry(g) => convert_geometry(g),
    }
}

/// Converts every feature of a collection.
pub fn features_from_collection(fc: &FeatureCollection) -> Result<Vec<GeoFeature>, String> {
    let mut out = Vec::new();
    for feature in &fc.features {
        out.extend(features_from_feature(feature)?);
    }
    Ok(out)
}

fn features_from_feature(feature: &Feature) -> Result<Vec<GeoFeature>, String> {
    match &feature.geometry {
        Some(g) => convert_geometry(g),
        None => Ok(Vec::new()),
    }
}

/// Converts a GeoJSON polygonal geometry into a `MultiPolygon`.
///
/// Returns an error for non-polygonal or degenerate geometry.
pub fn polygons_from_geometry(geometry: &Geometry) -> Result<MultiPolygon<f64>, String> {
    let mut polygons = Vec::new();
    for feature in convert_geometry(geometry)? {
        match feature {
            GeoFeature::Polygons(mp) => polygons.extend(mp.0),
            other => {
                return Err(format!(
                    "expected polygonal geometry, found {}",
                    feature_name(&other)
                ))
            }
        }
    }
    if polygons.is_empty() {
        return Err("geometry has no polygons".to_string());
    }
    Ok(MultiPolygon::new(polygons))
}

fn feature_name(feature: &GeoFeature) -> &'static str {
    match feature {
        GeoFeature::Point(_) => "point",
        GeoFeature::LineString(_) => "line string",
        GeoFeature::MultiLineString(_) => "multi line string",
        GeoFeature::Polygons(_) => "polygon",
    }
}

fn convert_position(position: &[f64]) -> Result<Coord<f64>, String> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        _ => Err(format!("invalid position {:?}", position)),
    }
}

fn convert_ring(ring: &[Vec<f64>]) -> Result<LineString<f64>, String> {
    if ring.len() < 4 {
        return Err(format!("ring has {} positions, need at least 4", ring.len()));
    }
    let coords = ring
        .iter()
        .map(|p| convert_position(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LineString::from(coords))
}

fn convert_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>, String> {
    let (exterior, holes) = rings
        .split_first()
        .ok_or_else(|| "polygon has no rings".to_string())?;
    let exterior = convert_ring(exterior)?;
    let holes = holes
        .iter()
        .map(|h| convert_ring(h))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, holes))
}

fn convert_geometry(geometry: &Geometry) -> Result<Vec<GeoFeature>, String> {
    let feature = match &geometry.value {
        Value::Point(p) => GeoFeature::Point(convert_position(p)?),
        Value::MultiPoint(points) => {
            return points
                .iter()
                .map(|p| convert_position(p).map(GeoFeature::Point))
                .collect();
        }
        Value::LineString(coords) => GeoFeature::LineString(
            coords
                .iter()
                .map(|p| convert_position(p))
                .collect::<Result<_, _>>()?,
        ),
        Value::MultiLineString(lines) => GeoFeature::MultiLineString(
            lines
                .iter()
                .map(|line| line.iter().map(|p| convert_position(p)).collect())
                .collect::<Result<_, _>>()?,
        ),
        Value::Polygon(rings) => {
            GeoFeature::Polygons(MultiPolygon::new(vec![convert_polygon(rings)?]))
        }
        Value::MultiPolygon(polygons) => GeoFeature::Polygons(MultiPolygon::new(
            polygons
                .iter()
                .map(|rings| convert_polygon(rings))
                .collect::<Result<_, _>>()?,
        )),
        Value::GeometryCollection(geometries) => {
            let mut out = Vec::new();
            for g in geometries {
                out.extend(convert_geometry(g)?);
            }
            return Ok(out);
        }
    };
    Ok(vec![feature])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, size: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![x, y],
            vec![x + size, y],
            vec![x + size, y + size],
            vec![x, y + size],
            vec![x, y],
        ]]))
    }

    fn feature(geometry: Option<Geometry>) -> Feature {
        Feature {
            bbox: None,
            geometry,
            id: None,
            properties: None,
            foreign_members: None,
        }
    }

    #[test]
    fn test_polygon_bounds_and_contains() {
        let polygons = polygons_from_geometry(&square(125.0, 8.0, 0.1)).unwrap();
        let feature = GeoFeature::Polygons(polygons);

        let bounds = feature.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 125.0, y: 8.0 });
        assert!((bounds.max().x - 125.1).abs() < 1e-12);

        assert!(feature.contains(Coord { x: 125.05, y: 8.05 }));
        assert!(!feature.contains(Coord { x: 125.2, y: 8.05 }));
    }

    #[test]
    fn test_degenerate_ring_is_rejected() {
        let geometry = Geometry::new(Value::Polygon(vec![vec![vec![0.0, 0.0], vec![1.0, 1.0]]]));
        assert!(polygons_from_geometry(&geometry).is_err());
    }

    #[test]
    fn test_point_is_not_polygonal() {
        let geometry = Geometry::new(Value::Point(vec![125.0, 8.0]));
        assert!(polygons_from_geometry(&geometry).is_err());
    }

    #[test]
    fn test_collection_bounds_span_all_features() {
        let fc = FeatureCollection {
            bbox: None,
            features: vec![
                feature(Some(square(0.0, 0.0, 1.0))),
                feature(Some(square(5.0, 5.0, 1.0))),
                feature(None),
            ],
            foreign_members: None,
        };
        let features = features_from_collection(&fc).unwrap();
        assert_eq!(features.len(), 2);

        let bounds = features_bounds(&features).unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 6.0, y: 6.0 });
    }
}
