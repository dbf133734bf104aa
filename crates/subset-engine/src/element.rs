//! Result elements and their GeoJSON rendering.

use geo::algorithm::centroid::Centroid;
use geo::{Area, MultiPolygon, Point};
use serde::Serialize;
use serde_json::{json, Map, Value};

use subset_common::CfDate;

/// One emitted record: a geometry with its value and axis coordinates.
///
/// Without dissolve there is one element per selected cell per
/// time/level slice; with dissolve, one per slice.
#[derive(Debug, Clone)]
pub struct Element {
    pub geometry: MultiPolygon<f64>,
    pub value: f64,
    pub timestamp: CfDate,
    /// Level identifier, present when the variable carries a level
    /// axis.
    pub level: Option<i64>,
}

impl Element {
    /// Planar area of the element geometry.
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    /// Centroid of the element geometry. `None` only for empty
    /// geometries, which the engine never emits.
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }

    /// Renders the element as a GeoJSON feature, with the value keyed
    /// by the variable name. Single-polygon geometries render as
    /// `Polygon`, others as `MultiPolygon`.
    pub fn to_feature(&self, variable: &str) -> Feature {
        let mut properties = Map::new();
        properties.insert(variable.to_string(), json!(self.value));
        properties.insert("timestamp".to_string(), json!(self.timestamp.to_string()));
        if let Some(level) = self.level {
            properties.insert("level".to_string(), json!(level));
        }
        Feature {
            r#type: "Feature",
            geometry: geometry_value(&self.geometry),
            properties,
        }
    }
}

/// A GeoJSON feature.
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub r#type: &'static str,
    pub geometry: Value,
    pub properties: Map<String, Value>,
}

fn ring_coords(ring: &geo::LineString<f64>) -> Value {
    Value::Array(
        ring.coords()
            .map(|c| json!([c.x, c.y]))
            .collect(),
    )
}

fn polygon_coords(polygon: &geo::Polygon<f64>) -> Value {
    let mut rings = vec![ring_coords(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring_coords));
    Value::Array(rings)
}

fn geometry_value(geometry: &MultiPolygon<f64>) -> Value {
    if geometry.0.len() == 1 {
        json!({
            "type": "Polygon",
            "coordinates": polygon_coords(&geometry.0[0]),
        })
    } else {
        json!({
            "type": "MultiPolygon",
            "coordinates": Value::Array(geometry.0.iter().map(polygon_coords).collect()),
        })
    }
}
