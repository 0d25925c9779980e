// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end conversion: scanned GeoJSON bytes through the topology
//! builder, then decoded back and checked against the input geometry.

use geo2topo_core::parse_collection;
use geo2topo_topology::{
    convert, DiagnosticCapture, PropertyHooks, TopoValue, Topology, TopologyOptions,
};

/// Three districts: A and B share a vertical border, C is detached.
const DISTRICTS: &[u8] = br#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"gid":1,"name":"alpha","pop":1200},"geometry":{"type":"Polygon","coordinates":[[[0.0,0.0],[2.0,0.0],[2.0,2.0],[0.0,2.0],[0.0,0.0]]]}},{"type":"Feature","properties":{"gid":2,"name":"beta","pop":800},"geometry":{"type":"Polygon","coordinates":[[[2.0,0.0],[4.0,0.0],[4.0,2.0],[2.0,2.0],[2.0,0.0]]]}},{"type":"Feature","properties":{"gid":3,"name":"gamma","pop":50},"geometry":{"type":"Polygon","coordinates":[[[6.0,6.0],[7.0,6.0],[7.0,7.0],[6.0,7.0],[6.0,6.0]]]}}]}"#;

fn convert_districts(options: &TopologyOptions) -> (Topology, PropertyHooks) {
    let report = parse_collection(DISTRICTS).expect("districts should parse");
    assert_eq!(report.feature_count, 3);
    let mut hooks = PropertyHooks::from_options(options);
    let conversion =
        convert(&report.collection, options, &mut hooks, DISTRICTS).expect("conversion");
    (conversion.topology, hooks)
}

/// Undo the delta encoding of one arc into absolute decoded coordinates.
fn decode_arc(topology: &Topology, index: usize) -> Vec<[f64; 2]> {
    let mut x = 0i64;
    let mut y = 0i64;
    let mut out = Vec::new();
    for (i, d) in topology.arcs[index].iter().enumerate() {
        if i == 0 {
            x = d[0];
            y = d[1];
        } else {
            x += d[0];
            y += d[1];
        }
        out.push(topology.transform.decode([x, y]));
    }
    out
}

#[test]
fn test_districts_share_one_border_arc() {
    let (topology, _) = convert_districts(&TopologyOptions::default());

    // Adjacent squares contribute a shared border arc plus one outline
    // each; the detached square is a single ring arc.
    assert_eq!(topology.arcs.len(), 4);
    assert_eq!(topology.bbox, [0.0, 0.0, 7.0, 7.0]);

    let geometries = match &topology.objects["collection"].value {
        TopoValue::GeometryCollection { geometries } => geometries,
        other => panic!("expected GeometryCollection, got {:?}", other),
    };
    assert_eq!(geometries.len(), 3);

    let ring_of = |i: usize| match &geometries[i].value {
        TopoValue::Polygon { arcs } => arcs[0].clone(),
        other => panic!("expected Polygon, got {:?}", other),
    };
    let a = ring_of(0);
    let b = ring_of(1);
    let c = ring_of(2);

    // The shared arc appears forward in one ring and reversed in the other
    let shared = a
        .iter()
        .find(|&&i| b.contains(&!i))
        .copied()
        .expect("districts alpha and beta should share an arc");
    // The detached district references exactly one arc nobody else uses
    assert_eq!(c.len(), 1);
    assert!(!a.contains(&c[0]) && !b.contains(&c[0]));

    // The shared border runs between (2,0) and (2,2)
    let arc_index = if shared >= 0 { shared } else { !shared } as usize;
    let border = decode_arc(&topology, arc_index);
    let quantum = topology.transform.scale[0].max(topology.transform.scale[1]);
    for p in [border.first().unwrap(), border.last().unwrap()] {
        assert!((p[0] - 2.0).abs() <= quantum, "border x at {:?}", p);
    }
}

#[test]
fn test_every_ring_arc_chain_closes() {
    let (topology, _) = convert_districts(&TopologyOptions::default());
    let geometries = match &topology.objects["collection"].value {
        TopoValue::GeometryCollection { geometries } => geometries,
        other => panic!("expected GeometryCollection, got {:?}", other),
    };
    for geometry in geometries {
        let rings = match &geometry.value {
            TopoValue::Polygon { arcs } => arcs,
            other => panic!("expected Polygon, got {:?}", other),
        };
        for ring in rings {
            // Walk the arc chain honouring reversal; it must end where
            // it started
            let mut points: Vec<[f64; 2]> = Vec::new();
            for &index in ring {
                let mut arc = decode_arc(&topology, if index >= 0 { index } else { !index } as usize);
                if index < 0 {
                    arc.reverse();
                }
                points.extend(arc);
            }
            assert!(points.len() >= 4);
            let first = points.first().unwrap();
            let last = points.last().unwrap();
            assert_eq!(first, last, "ring chain did not close");
        }
    }
}

#[test]
fn test_id_promotion_and_property_transform_together() {
    let options = TopologyOptions {
        id_property: Some("gid".to_string()),
        property_transform: Some(vec!["name".to_string()]),
        ..Default::default()
    };
    let (topology, hooks) = convert_districts(&options);
    assert_eq!(hooks.field_errors(), 0);

    let geometries = match &topology.objects["collection"].value {
        TopoValue::GeometryCollection { geometries } => geometries,
        other => panic!("expected GeometryCollection, got {:?}", other),
    };
    for (i, geometry) in geometries.iter().enumerate() {
        assert_eq!(geometry.id, Some(serde_json::Value::from(i as i64 + 1)));
        let properties = geometry.properties.as_ref().unwrap();
        assert!(properties.contains_key("name"));
        // Untransformed properties are dropped from the output
        assert!(!properties.contains_key("pop"));
    }
}

#[test]
fn test_artifact_roundtrips_through_serde() {
    let options = TopologyOptions {
        verbose: true,
        ..Default::default()
    };
    let report = parse_collection(DISTRICTS).unwrap();
    let mut hooks = PropertyHooks::from_options(&options);
    let conversion = convert(&report.collection, &options, &mut hooks, DISTRICTS).unwrap();
    assert!(!conversion.stderr.is_empty());

    let serialized = serde_json::to_string(&conversion.topology).unwrap();
    assert_eq!(serialized.len(), conversion.output_size);
    let reparsed: Topology = serde_json::from_str(&serialized).unwrap();
    assert_eq!(reparsed.kind, "Topology");
    assert_eq!(reparsed.arcs, conversion.topology.arcs);
}

#[test]
fn test_quantization_bounds_coordinate_range() {
    let options = TopologyOptions {
        quantization: 400,
        ..Default::default()
    };
    let (topology, _) = convert_districts(&options);
    for arc in &topology.arcs {
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
            assert!((0..400).contains(&x), "x {} out of quantized range", x);
            assert!((0..400).contains(&y), "y {} out of quantized range", y);
        }
    }
}
