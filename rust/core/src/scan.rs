// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Large-buffer feature collection parsing.
//!
//! Multi-gigabyte GeoJSON uploads cannot be converted to one string and
//! handed to a whole-document parser. Instead the buffer is scanned for
//! feature boundaries with [memchr](https://docs.rs/memchr) and each
//! feature is parsed as an independent slice, so peak allocation stays at
//! one feature rather than one file.
//!
//! Feature ends are located by balanced-brace scanning (string and escape
//! aware), so point, line and geometry-collection features are handled the
//! same as polygons.

use crate::error::{Error, Result};
use crate::geojson::{Feature, FeatureCollection};
use memchr::memmem;
use std::time::Instant;

/// Byte prefix identifying a parseable feature collection.
pub const COLLECTION_PREFIX: &[u8] = br#"{"type":"FeatureCollection","features":["#;

/// Byte literal opening each feature object.
pub const FEATURE_START: &[u8] = br#"{"type":"Feature","#;

/// Largest buffer handed to a whole-buffer parse when it is not a feature
/// collection. Beyond this a single contiguous string conversion is refused.
pub const MAX_WHOLE_PARSE_BYTES: usize = (1 << 28) - 16;

/// Outcome of a successful parse, with diagnostics for the message log.
#[derive(Debug)]
pub struct ParseReport {
    pub collection: FeatureCollection,
    /// Number of features detected by the offset scan (0 when the
    /// whole-buffer fallback was used).
    pub feature_count: usize,
    /// Wall-clock seconds spent parsing.
    pub parse_time: f64,
    /// Human-readable diagnostics, including the zero-feature warning.
    pub messages: Vec<String>,
}

/// Scanner yielding the byte range of each feature in a collection buffer.
///
/// Start offsets come from literal matches of [`FEATURE_START`]; the end of
/// each feature is the matching close brace of its object.
pub struct FeatureScanner<'a> {
    data: &'a [u8],
    finder: memmem::Finder<'static>,
    position: usize,
}

impl<'a> FeatureScanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            finder: memmem::Finder::new(FEATURE_START),
            position: 0,
        }
    }

    /// Scan for the next feature, returning its `[start, end)` byte range.
    ///
    /// An unterminated feature runs to the end of the buffer; the slice
    /// parse downstream reports it.
    pub fn next_feature(&mut self) -> Option<(usize, usize)> {
        let start = self.position + self.finder.find(&self.data[self.position..])?;
        let end = object_end(self.data, start).unwrap_or(self.data.len());
        // Resume after the start literal so every occurrence is indexed
        self.position = start + FEATURE_START.len();
        Some((start, end))
    }
}

/// Find the offset one past the close brace matching the open brace at
/// `start`. JSON string contents and escapes do not affect the depth count.
fn object_end(data: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in data[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a buffer that may hold a feature collection too large for a
/// whole-buffer string conversion. See [`parse_collection_with_limit`].
pub fn parse_collection(data: &[u8]) -> Result<ParseReport> {
    parse_collection_with_limit(data, MAX_WHOLE_PARSE_BYTES)
}

/// As [`parse_collection`], with an explicit whole-parse ceiling.
///
/// Buffers starting with [`COLLECTION_PREFIX`] are parsed feature by
/// feature regardless of size. Other buffers fall back to a whole-buffer
/// parse when below `limit` and fail with `BufferTooLargeToParse` above it.
pub fn parse_collection_with_limit(data: &[u8], limit: usize) -> Result<ParseReport> {
    let start = Instant::now();

    if !data.starts_with(COLLECTION_PREFIX) {
        if data.len() >= limit {
            return Err(Error::BufferTooLargeToParse {
                size: data.len(),
                limit,
            });
        }
        let collection: FeatureCollection = serde_json::from_slice(data)?;
        let feature_count = collection.features.len();
        return Ok(ParseReport {
            collection,
            feature_count,
            parse_time: start.elapsed().as_secs_f64(),
            messages: Vec::new(),
        });
    }

    let mut messages = vec![format!(
        "parsing feature collection; data length: {}",
        data.len()
    )];

    // FeatureOffsetIndex: one [start, end) range per feature
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut scanner = FeatureScanner::new(data);
    while let Some(range) = scanner.next_feature() {
        ranges.push(range);
    }

    if ranges.is_empty() {
        // A collection prefix with no features is a parse anomaly, not a
        // valid empty result; surface it rather than swallowing it.
        messages.push(format!(
            "WARNING: no features detected in feature collection; data length: {}",
            data.len()
        ));
        return Ok(ParseReport {
            collection: FeatureCollection::empty(),
            feature_count: 0,
            parse_time: start.elapsed().as_secs_f64(),
            messages,
        });
    }

    let total = ranges.len();
    let mut failed = 0usize;
    let mut features: Vec<Option<Feature>> = Vec::with_capacity(total);
    for (i, &(s, e)) in ranges.iter().enumerate() {
        match serde_json::from_slice::<Feature>(&data[s..e]) {
            Ok(feature) => features.push(Some(feature)),
            Err(err) => {
                failed += 1;
                features.push(None);
                messages.push(format!(
                    "feature [{}/{}] start: {}; end: {}; could not be parsed: {}",
                    i,
                    total - 1,
                    s,
                    e,
                    err
                ));
            }
        }
    }

    // The first slice carries the collection wrapper; close its feature
    // array before parsing so the enclosing object is well formed.
    let mut wrapper = {
        let mut head = data[..ranges[0].1].to_vec();
        head.extend_from_slice(b"]}");
        match serde_json::from_slice::<FeatureCollection>(&head) {
            Ok(collection) => collection,
            Err(err) => {
                if features[0].is_some() {
                    failed += 1;
                }
                messages.push(format!("collection wrapper could not be parsed: {}", err));
                FeatureCollection::empty()
            }
        }
    };

    if failed > 0 {
        return Err(Error::PartialParseFailure { failed, total });
    }

    wrapper.features = features.into_iter().flatten().collect();
    let parse_time = start.elapsed().as_secs_f64();
    messages.push(format!(
        "feature collection parse complete; features detected: {}; data length: {}; took: {} S",
        total,
        data.len(),
        parse_time
    ));

    Ok(ParseReport {
        collection: wrapper,
        feature_count: total,
        parse_time,
        messages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson::Geometry;

    fn collection_of(features: &[&str]) -> Vec<u8> {
        let mut buf = COLLECTION_PREFIX.to_vec();
        buf.extend_from_slice(features.join(",").as_bytes());
        buf.extend_from_slice(b"]}");
        buf
    }

    const POLY: &str = r#"{"type":"Feature","properties":{"gid":1},"geometry":{"type":"Polygon","coordinates":[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]]}}"#;
    const POINT: &str = r#"{"type":"Feature","properties":{"gid":2},"geometry":{"type":"Point","coordinates":[3.0,4.0]}}"#;

    #[test]
    fn test_parse_completeness() {
        let features: Vec<String> = (0..20)
            .map(|i| {
                format!(
                    r#"{{"type":"Feature","properties":{{"gid":{}}},"geometry":{{"type":"Point","coordinates":[{}.0,1.0]}}}}"#,
                    i, i
                )
            })
            .collect();
        let refs: Vec<&str> = features.iter().map(String::as_str).collect();
        let buf = collection_of(&refs);

        let report = parse_collection(&buf).unwrap();
        assert_eq!(report.feature_count, 20);
        assert_eq!(report.collection.features.len(), 20);
        for (i, feature) in report.collection.features.iter().enumerate() {
            let expected: Feature = serde_json::from_str(&features[i]).unwrap();
            assert_eq!(feature, &expected);
        }
    }

    #[test]
    fn test_partial_failure_reports_counts() {
        let bad = r#"{"type":"Feature","properties":{"gid":9},"geometry":{"type":"Point","coordinates":[oops]}}"#;
        let buf = collection_of(&[POLY, bad, POINT]);
        match parse_collection(&buf) {
            Err(Error::PartialParseFailure { failed, total }) => {
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
            }
            other => panic!("expected PartialParseFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_non_polygon_features_scan_correctly() {
        // Point and GeometryCollection features have no "]]}}" close; the
        // balanced scan must still find their boundaries.
        let gc = r#"{"type":"Feature","properties":{},"geometry":{"type":"GeometryCollection","geometries":[{"type":"Point","coordinates":[0.0,0.0]}]}}"#;
        let buf = collection_of(&[POINT, gc]);
        let report = parse_collection(&buf).unwrap();
        assert_eq!(report.collection.features.len(), 2);
        assert!(matches!(
            report.collection.features[1].geometry,
            Some(Geometry::GeometryCollection { .. })
        ));
    }

    #[test]
    fn test_braces_inside_property_strings() {
        let tricky = r#"{"type":"Feature","properties":{"name":"has }} and \" inside"},"geometry":{"type":"Point","coordinates":[1.0,2.0]}}"#;
        let buf = collection_of(&[tricky, POINT]);
        let report = parse_collection(&buf).unwrap();
        assert_eq!(report.collection.features.len(), 2);
        assert_eq!(
            report.collection.features[0].properties.as_ref().unwrap()["name"],
            "has }} and \" inside"
        );
    }

    #[test]
    fn test_zero_features_is_surfaced_as_warning() {
        let buf = b"{\"type\":\"FeatureCollection\",\"features\":[]}".to_vec();
        let report = parse_collection(&buf).unwrap();
        assert_eq!(report.feature_count, 0);
        assert!(report.collection.features.is_empty());
        assert!(report
            .messages
            .iter()
            .any(|m| m.contains("WARNING") && m.contains("no features")));
    }

    #[test]
    fn test_whole_buffer_fallback() {
        // Leading whitespace defeats the prefix check; small buffers still
        // parse whole.
        let buf = format!(" {{\"type\":\"FeatureCollection\",\"features\":[{}]}}", POINT);
        let report = parse_collection(buf.as_bytes()).unwrap();
        assert_eq!(report.collection.features.len(), 1);
    }

    #[test]
    fn test_oversized_non_collection_is_refused() {
        let buf = format!(" {{\"type\":\"FeatureCollection\",\"features\":[{}]}}", POINT);
        match parse_collection_with_limit(buf.as_bytes(), 8) {
            Err(Error::BufferTooLargeToParse { size, limit }) => {
                assert_eq!(size, buf.len());
                assert_eq!(limit, 8);
            }
            other => panic!("expected BufferTooLargeToParse, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_fallback_json() {
        assert!(matches!(
            parse_collection(b"not json at all"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_scanner_ranges_are_balanced() {
        let buf = collection_of(&[POLY, POINT]);
        let mut scanner = FeatureScanner::new(&buf);
        let (s1, e1) = scanner.next_feature().unwrap();
        let (s2, e2) = scanner.next_feature().unwrap();
        assert!(scanner.next_feature().is_none());
        assert_eq!(&buf[s1..e1], POLY.as_bytes());
        assert_eq!(&buf[s2..e2], POINT.as_bytes());
    }
}
