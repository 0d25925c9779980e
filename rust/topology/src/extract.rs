// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coordinate quantization and line/ring extraction.
//!
//! Coordinates are snapped to the quantization grid before junction
//! detection, so point identity is exact integer comparison rather than
//! float tolerance. Consecutive positions that collapse onto the same
//! grid cell are merged here.

use geo2topo_core::{FeatureCollection, Geometry, Position};

use crate::error::{Error, Result};
use crate::model::{QuantizedPoint, Transform};

/// Snaps input coordinates onto a `quantization x quantization` grid.
#[derive(Debug, Clone)]
pub(crate) struct Quantizer {
    kx: f64,
    ky: f64,
    x0: f64,
    y0: f64,
}

impl Quantizer {
    pub fn new(bbox: [f64; 4], quantization: u32) -> Self {
        let [x0, y0, x1, y1] = bbox;
        let n = (quantization - 1).max(1) as f64;
        Self {
            kx: if x1 > x0 { n / (x1 - x0) } else { 1.0 },
            ky: if y1 > y0 { n / (y1 - y0) } else { 1.0 },
            x0,
            y0,
        }
    }

    pub fn quantize(&self, position: &Position) -> Result<QuantizedPoint> {
        if position.len() < 2 {
            return Err(Error::InvalidPosition(position.len()));
        }
        Ok([
            ((position[0] - self.x0) * self.kx).round() as i64,
            ((position[1] - self.y0) * self.ky).round() as i64,
        ])
    }

    pub fn transform(&self) -> Transform {
        Transform {
            scale: [1.0 / self.kx, 1.0 / self.ky],
            translate: [self.x0, self.y0],
        }
    }
}

/// Bounding box over every position in the collection, `None` when the
/// collection carries no coordinates at all.
pub(crate) fn bbox_of(collection: &FeatureCollection) -> Result<Option<[f64; 4]>> {
    let mut bbox = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
    let mut any = false;
    for feature in &collection.features {
        if let Some(geometry) = &feature.geometry {
            each_position(geometry, &mut |p| {
                if p.len() < 2 {
                    return Err(Error::InvalidPosition(p.len()));
                }
                bbox[0] = bbox[0].min(p[0]);
                bbox[1] = bbox[1].min(p[1]);
                bbox[2] = bbox[2].max(p[0]);
                bbox[3] = bbox[3].max(p[1]);
                any = true;
                Ok(())
            })?;
        }
    }
    Ok(if any { Some(bbox) } else { None })
}

fn each_position<F>(geometry: &Geometry, f: &mut F) -> Result<()>
where
    F: FnMut(&Position) -> Result<()>,
{
    match geometry {
        Geometry::Point { coordinates } => f(coordinates),
        Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
            coordinates.iter().try_for_each(|p| f(p))
        }
        Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
            coordinates.iter().flatten().try_for_each(|p| f(p))
        }
        Geometry::MultiPolygon { coordinates } => coordinates
            .iter()
            .flatten()
            .flatten()
            .try_for_each(|p| f(p)),
        Geometry::GeometryCollection { geometries } => {
            geometries.iter().try_for_each(|g| each_position(g, f))
        }
    }
}

/// Index of one extracted line or ring in the arena.
pub(crate) type SegId = usize;

#[derive(Debug, Clone)]
pub(crate) struct Seg {
    pub start: usize,
    pub end: usize,
    pub ring: bool,
}

/// Geometry skeleton: the original structure with every line and ring
/// replaced by its arena segment.
#[derive(Debug, Clone)]
pub(crate) enum Skeleton {
    Point(QuantizedPoint),
    MultiPoint(Vec<QuantizedPoint>),
    Line(SegId),
    MultiLine(Vec<SegId>),
    Polygon(Vec<SegId>),
    MultiPolygon(Vec<Vec<SegId>>),
    Collection(Vec<Skeleton>),
}

/// Arena of quantized line/ring coordinates shared by the whole topology.
#[derive(Debug, Default)]
pub(crate) struct Extractor {
    pub points: Vec<QuantizedPoint>,
    pub segs: Vec<Seg>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points of one segment. Rings are stored closed (first == last).
    pub fn seg_points(&self, id: SegId) -> &[QuantizedPoint] {
        let seg = &self.segs[id];
        &self.points[seg.start..seg.end]
    }

    fn push_seg(&mut self, pts: Vec<QuantizedPoint>, ring: bool) -> SegId {
        let start = self.points.len();
        self.points.extend(pts);
        self.segs.push(Seg {
            start,
            end: self.points.len(),
            ring,
        });
        self.segs.len() - 1
    }

    fn add_line(&mut self, coordinates: &[Position], q: &Quantizer) -> Result<SegId> {
        let mut pts: Vec<QuantizedPoint> = Vec::with_capacity(coordinates.len());
        for position in coordinates {
            let p = q.quantize(position)?;
            if pts.last() != Some(&p) {
                pts.push(p);
            }
        }
        // A line fully collapsed by quantization still needs two points
        while pts.len() < 2 {
            let p = pts.last().copied().unwrap_or([0, 0]);
            pts.push(p);
        }
        Ok(self.push_seg(pts, false))
    }

    fn add_ring(&mut self, coordinates: &[Position], q: &Quantizer) -> Result<SegId> {
        let mut pts: Vec<QuantizedPoint> = Vec::with_capacity(coordinates.len());
        for position in coordinates {
            let p = q.quantize(position)?;
            if pts.last() != Some(&p) {
                pts.push(p);
            }
        }
        if pts.is_empty() {
            pts.push([0, 0]);
        }
        // Re-close: the closing duplicate may have been merged above
        if pts.first() != pts.last() || pts.len() == 1 {
            let first = pts[0];
            pts.push(first);
        }
        Ok(self.push_seg(pts, true))
    }

    pub fn extract(&mut self, geometry: &Geometry, q: &Quantizer) -> Result<Skeleton> {
        Ok(match geometry {
            Geometry::Point { coordinates } => Skeleton::Point(q.quantize(coordinates)?),
            Geometry::MultiPoint { coordinates } => Skeleton::MultiPoint(
                coordinates
                    .iter()
                    .map(|p| q.quantize(p))
                    .collect::<Result<_>>()?,
            ),
            Geometry::LineString { coordinates } => Skeleton::Line(self.add_line(coordinates, q)?),
            Geometry::MultiLineString { coordinates } => Skeleton::MultiLine(
                coordinates
                    .iter()
                    .map(|line| self.add_line(line, q))
                    .collect::<Result<_>>()?,
            ),
            Geometry::Polygon { coordinates } => Skeleton::Polygon(
                coordinates
                    .iter()
                    .map(|ring| self.add_ring(ring, q))
                    .collect::<Result<_>>()?,
            ),
            Geometry::MultiPolygon { coordinates } => Skeleton::MultiPolygon(
                coordinates
                    .iter()
                    .map(|polygon| {
                        polygon
                            .iter()
                            .map(|ring| self.add_ring(ring, q))
                            .collect::<Result<_>>()
                    })
                    .collect::<Result<_>>()?,
            ),
            Geometry::GeometryCollection { geometries } => Skeleton::Collection(
                geometries
                    .iter()
                    .map(|g| self.extract(g, q))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}
