// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TopoJSON output model.
//!
//! Coordinates are quantized grid positions (integers); arcs are stored
//! delta-encoded, first position absolute and the rest as differences.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A quantized grid position.
pub type QuantizedPoint = [i64; 2];

/// The affine transform restoring quantized positions to input coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    /// Map a quantized position back to input-space coordinates.
    pub fn decode(&self, p: QuantizedPoint) -> [f64; 2] {
        [
            p[0] as f64 * self.scale[0] + self.translate[0],
            p[1] as f64 * self.scale[1] + self.translate[1],
        ]
    }
}

/// A complete topology artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    /// Always `"Topology"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub bbox: [f64; 4],
    pub transform: Transform,
    pub objects: BTreeMap<String, TopoGeometry>,
    /// Shared arcs, delta-encoded.
    pub arcs: Vec<Vec<QuantizedPoint>>,
}

/// A geometry object referencing shared arcs by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopoGeometry {
    #[serde(flatten)]
    pub value: TopoValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl TopoGeometry {
    pub fn bare(value: TopoValue) -> Self {
        Self {
            value,
            id: None,
            properties: None,
        }
    }
}

/// Geometry payload. Arc indices use ones' complement (`!i`) to reference
/// arc `i` in reverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopoValue {
    Point { coordinates: QuantizedPoint },
    MultiPoint { coordinates: Vec<QuantizedPoint> },
    LineString { arcs: Vec<i32> },
    MultiLineString { arcs: Vec<Vec<i32>> },
    Polygon { arcs: Vec<Vec<i32>> },
    MultiPolygon { arcs: Vec<Vec<Vec<i32>>> },
    GeometryCollection { geometries: Vec<TopoGeometry> },
}
