// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology construction from a feature collection.
//!
//! Pipeline: quantize onto the option grid, extract lines and rings,
//! detect junctions, cut at junctions, deduplicate shared arcs, delta
//! encode. The input collection becomes one `GeometryCollection` object
//! named `collection`, with ids and properties resolved through the
//! session's property hooks.

use geo2topo_core::FeatureCollection;
use std::collections::BTreeMap;

use crate::arcs::{cut_line, cut_ring, junctions, ArcStore};
use crate::capture::DiagnosticCapture;
use crate::error::Result;
use crate::extract::{bbox_of, Extractor, Quantizer, SegId, Skeleton};
use crate::hooks::PropertyHooks;
use crate::model::{TopoGeometry, TopoValue, Topology};
use crate::options::TopologyOptions;

/// Build a quantized topology from `collection`.
pub fn topology(
    collection: &FeatureCollection,
    options: &TopologyOptions,
    hooks: &mut PropertyHooks,
    capture: &mut DiagnosticCapture,
) -> Result<Topology> {
    let bbox = bbox_of(collection)?.unwrap_or([0.0, 0.0, 0.0, 0.0]);
    let quantizer = Quantizer::new(bbox, options.quantization);

    if options.verbose {
        capture.line(format!(
            "bounds: {} {} {} {}",
            bbox[0], bbox[1], bbox[2], bbox[3]
        ));
        capture.line(format!(
            "pre-quantization: {}x{}",
            options.quantization, options.quantization
        ));
        if let Some(projection) = &options.projection {
            capture.line(format!("projection: {}", projection));
        }
    }

    let mut extractor = Extractor::new();
    let mut skeletons: Vec<Skeleton> = Vec::with_capacity(collection.features.len());
    for feature in &collection.features {
        let skeleton = match &feature.geometry {
            Some(geometry) => extractor.extract(geometry, &quantizer)?,
            // Null geometry carries no shape but keeps its slot
            None => Skeleton::Collection(Vec::new()),
        };
        skeletons.push(skeleton);
    }

    let junction_set = junctions(&extractor);
    let mut store = ArcStore::new();

    let mut geometries: Vec<TopoGeometry> = Vec::with_capacity(skeletons.len());
    for (skeleton, feature) in skeletons.iter().zip(&collection.features) {
        let value = realize(skeleton, &extractor, &junction_set, &mut store);
        geometries.push(TopoGeometry {
            value,
            id: hooks.feature_id(feature),
            properties: hooks.feature_properties(feature),
        });
    }

    if options.verbose {
        capture.line(format!(
            "topology: {} features, {} junctions, {} arcs",
            geometries.len(),
            junction_set.len(),
            store.len()
        ));
    }
    tracing::debug!(
        features = geometries.len(),
        junctions = junction_set.len(),
        arcs = store.len(),
        quantization = options.quantization,
        "built topology"
    );

    Ok(Topology {
        kind: "Topology".to_string(),
        bbox,
        transform: quantizer.transform(),
        objects: BTreeMap::from([(
            "collection".to_string(),
            TopoGeometry::bare(TopoValue::GeometryCollection { geometries }),
        )]),
        arcs: store.into_encoded(),
    })
}

fn line_arcs(
    seg: SegId,
    extractor: &Extractor,
    junction_set: &rustc_hash::FxHashSet<[i64; 2]>,
    store: &mut ArcStore,
) -> Vec<i32> {
    cut_line(extractor.seg_points(seg), junction_set)
        .into_iter()
        .map(|arc| store.insert(arc))
        .collect()
}

fn ring_arcs(
    seg: SegId,
    extractor: &Extractor,
    junction_set: &rustc_hash::FxHashSet<[i64; 2]>,
    store: &mut ArcStore,
) -> Vec<i32> {
    cut_ring(extractor.seg_points(seg), junction_set)
        .into_iter()
        .map(|arc| store.insert(arc))
        .collect()
}

fn realize(
    skeleton: &Skeleton,
    extractor: &Extractor,
    junction_set: &rustc_hash::FxHashSet<[i64; 2]>,
    store: &mut ArcStore,
) -> TopoValue {
    match skeleton {
        Skeleton::Point(p) => TopoValue::Point { coordinates: *p },
        Skeleton::MultiPoint(pts) => TopoValue::MultiPoint {
            coordinates: pts.clone(),
        },
        Skeleton::Line(seg) => TopoValue::LineString {
            arcs: line_arcs(*seg, extractor, junction_set, store),
        },
        Skeleton::MultiLine(segs) => TopoValue::MultiLineString {
            arcs: segs
                .iter()
                .map(|seg| line_arcs(*seg, extractor, junction_set, store))
                .collect(),
        },
        Skeleton::Polygon(rings) => TopoValue::Polygon {
            arcs: rings
                .iter()
                .map(|seg| ring_arcs(*seg, extractor, junction_set, store))
                .collect(),
        },
        Skeleton::MultiPolygon(polygons) => TopoValue::MultiPolygon {
            arcs: polygons
                .iter()
                .map(|rings| {
                    rings
                        .iter()
                        .map(|seg| ring_arcs(*seg, extractor, junction_set, store))
                        .collect()
                })
                .collect(),
        },
        Skeleton::Collection(items) => TopoValue::GeometryCollection {
            geometries: items
                .iter()
                .map(|item| TopoGeometry::bare(realize(item, extractor, junction_set, store)))
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(json: &str, options: &TopologyOptions) -> Topology {
        let collection: FeatureCollection = serde_json::from_str(json).unwrap();
        let mut hooks = PropertyHooks::from_options(options);
        let mut capture = DiagnosticCapture::new();
        topology(&collection, options, &mut hooks, &mut capture).unwrap()
    }

    const TWO_SQUARES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"gid":1},"geometry":{"type":"Polygon","coordinates":[
            [[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]}},
        {"type":"Feature","properties":{"gid":2},"geometry":{"type":"Polygon","coordinates":[
            [[1.0,0.0],[2.0,0.0],[2.0,1.0],[1.0,1.0],[1.0,0.0]]]}}
    ]}"#;

    #[test]
    fn test_adjacent_polygons_share_an_arc() {
        let topo = build(TWO_SQUARES, &TopologyOptions::default());
        // Shared border plus one outline arc per square
        assert_eq!(topo.arcs.len(), 3);
        let geometries = match &topo.objects["collection"].value {
            TopoValue::GeometryCollection { geometries } => geometries,
            other => panic!("expected GeometryCollection, got {:?}", other),
        };
        let arcs_of = |g: &TopoGeometry| match &g.value {
            TopoValue::Polygon { arcs } => arcs[0].clone(),
            other => panic!("expected Polygon, got {:?}", other),
        };
        let a = arcs_of(&geometries[0]);
        let b = arcs_of(&geometries[1]);
        // One arc index appears in both rings, forward in one and
        // complemented in the other
        let shared = a
            .iter()
            .find(|&&i| b.contains(&!i))
            .copied()
            .expect("no shared arc between adjacent squares");
        assert!(b.contains(&!shared));
    }

    #[test]
    fn test_arcs_decode_back_to_input_coordinates() {
        let topo = build(TWO_SQUARES, &TopologyOptions::default());
        // Walk every arc, undoing the delta encoding, and check each
        // decoded position lands within one quantum of the unit grid
        for arc in &topo.arcs {
            let mut x = 0i64;
            let mut y = 0i64;
            for (i, d) in arc.iter().enumerate() {
                if i == 0 {
                    x = d[0];
                    y = d[1];
                } else {
                    x += d[0];
                    y += d[1];
                }
                let [gx, gy] = topo.transform.decode([x, y]);
                assert!((gx - gx.round()).abs() <= topo.transform.scale[0]);
                assert!((gy - gy.round()).abs() <= topo.transform.scale[1]);
                assert!((0.0..=2.0).contains(&gx.round()));
                assert!((0.0..=1.0).contains(&gy.round()));
            }
        }
    }

    #[test]
    fn test_bbox_and_transform() {
        let topo = build(TWO_SQUARES, &TopologyOptions::default());
        assert_eq!(topo.bbox, [0.0, 0.0, 2.0, 1.0]);
        assert_eq!(topo.transform.translate, [0.0, 0.0]);
    }

    #[test]
    fn test_point_features_survive() {
        let topo = build(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[0.5,0.5]}},
                {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1.5,0.5]}}
            ]}"#,
            &TopologyOptions::default(),
        );
        assert!(topo.arcs.is_empty());
        match &topo.objects["collection"].value {
            TopoValue::GeometryCollection { geometries } => {
                assert_eq!(geometries.len(), 2);
                assert!(matches!(geometries[0].value, TopoValue::Point { .. }));
            }
            other => panic!("expected GeometryCollection, got {:?}", other),
        }
    }

    #[test]
    fn test_id_promotion_flows_into_objects() {
        let options = TopologyOptions {
            id_property: Some("gid".to_string()),
            ..Default::default()
        };
        let topo = build(TWO_SQUARES, &options);
        match &topo.objects["collection"].value {
            TopoValue::GeometryCollection { geometries } => {
                assert_eq!(geometries[0].id, Some(serde_json::Value::from(1)));
                assert_eq!(geometries[1].id, Some(serde_json::Value::from(2)));
            }
            other => panic!("expected GeometryCollection, got {:?}", other),
        }
    }

    #[test]
    fn test_verbose_writes_diagnostics() {
        let collection: FeatureCollection = serde_json::from_str(TWO_SQUARES).unwrap();
        let options = TopologyOptions {
            verbose: true,
            ..Default::default()
        };
        let mut hooks = PropertyHooks::from_options(&options);
        let mut capture = DiagnosticCapture::new();
        topology(&collection, &options, &mut hooks, &mut capture).unwrap();
        let stderr = capture.into_string();
        assert!(stderr.contains("bounds: 0 0 2 1"));
        assert!(stderr.contains("pre-quantization"));
        assert!(stderr.contains("3 arcs"));
    }

    #[test]
    fn test_empty_collection_builds_empty_topology() {
        let topo = build(
            r#"{"type":"FeatureCollection","features":[]}"#,
            &TopologyOptions::default(),
        );
        assert!(topo.arcs.is_empty());
        assert_eq!(topo.bbox, [0.0, 0.0, 0.0, 0.0]);
    }
}
