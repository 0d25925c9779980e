// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoJSON data model.
//!
//! Positions are kept as loose `Vec<f64>` so 2D and 3D inputs both
//! deserialize; consumers read the first two ordinates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single coordinate tuple. At least two ordinates (x, y); any
/// further ordinates (altitude etc.) are carried but ignored downstream.
pub type Position = Vec<f64>;

/// An ordered group of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `"FeatureCollection"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// An empty collection with the correct type tag.
    pub fn empty() -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features: Vec::new(),
        }
    }
}

/// One geographic entity with optional id, attributes and geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Always `"Feature"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// GeoJSON geometry, tagged by its `type` member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_roundtrip() {
        let json = r#"{"type":"Feature","properties":{"name":"a"},"geometry":{"type":"Point","coordinates":[1.5,2.5]}}"#;
        let f: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(f.kind, "Feature");
        match f.geometry.as_ref().unwrap() {
            Geometry::Point { coordinates } => assert_eq!(coordinates, &vec![1.5, 2.5]),
            other => panic!("expected Point, got {:?}", other),
        }
    }

    #[test]
    fn test_three_dimensional_position() {
        let json = r#"{"type":"LineString","coordinates":[[0.0,0.0,10.0],[1.0,1.0,12.0]]}"#;
        let g: Geometry = serde_json::from_str(json).unwrap();
        match g {
            Geometry::LineString { coordinates } => {
                assert_eq!(coordinates[0].len(), 3);
            }
            other => panic!("expected LineString, got {:?}", other),
        }
    }

    #[test]
    fn test_null_geometry() {
        let json = r#"{"type":"Feature","properties":null,"geometry":null}"#;
        let f: Feature = serde_json::from_str(json).unwrap();
        assert!(f.geometry.is_none());
        assert!(f.properties.is_none());
    }
}
