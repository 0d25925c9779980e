// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Junction detection, arc cutting and shared-arc deduplication.
//!
//! A junction is any point where the set of neighbouring points differs
//! between traversals: line endpoints, and interior points visited twice
//! with different neighbours. Lines and rings are cut at junctions and the
//! resulting arcs are deduplicated, matching forward or reversed; rings
//! without junctions are rotated to a canonical start point first.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::extract::Extractor;
use crate::model::QuantizedPoint;

type Pt = QuantizedPoint;

/// Unordered neighbour pair, canonicalized for comparison.
fn neighbour_pair(a: Pt, b: Pt) -> (Pt, Pt) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Detect junction points across every extracted line and ring.
pub(crate) fn junctions(extractor: &Extractor) -> FxHashSet<Pt> {
    let mut junctions: FxHashSet<Pt> = FxHashSet::default();
    let mut seen: FxHashMap<Pt, (Pt, Pt)> = FxHashMap::default();

    let mut visit = |junctions: &mut FxHashSet<Pt>, p: Pt, prev: Pt, next: Pt| {
        if junctions.contains(&p) {
            return;
        }
        let pair = neighbour_pair(prev, next);
        match seen.get(&p) {
            Some(existing) if *existing != pair => {
                junctions.insert(p);
            }
            Some(_) => {}
            None => {
                seen.insert(p, pair);
            }
        }
    };

    for id in 0..extractor.segs.len() {
        let pts = extractor.seg_points(id);
        if extractor.segs[id].ring {
            // Closed: last point duplicates the first, neighbours wrap
            let n = pts.len() - 1;
            if n == 0 {
                continue;
            }
            for i in 0..n {
                let prev = pts[(i + n - 1) % n];
                let next = pts[(i + 1) % n];
                visit(&mut junctions, pts[i], prev, next);
            }
        } else {
            junctions.insert(pts[0]);
            junctions.insert(pts[pts.len() - 1]);
            for i in 1..pts.len() - 1 {
                visit(&mut junctions, pts[i], pts[i - 1], pts[i + 1]);
            }
        }
    }

    junctions
}

/// Split an open line at interior junction points. Adjacent arcs share the
/// junction point.
pub(crate) fn cut_line(pts: &[Pt], junctions: &FxHashSet<Pt>) -> Vec<Vec<Pt>> {
    let mut arcs = Vec::new();
    let mut start = 0;
    for i in 1..pts.len().saturating_sub(1) {
        if junctions.contains(&pts[i]) {
            arcs.push(pts[start..=i].to_vec());
            start = i;
        }
    }
    arcs.push(pts[start..].to_vec());
    arcs
}

/// Split a closed ring at junction points.
///
/// A ring containing junctions is rotated to start at its first junction
/// and cut like a line. A junction-free ring stays one closed arc, rotated
/// to its minimum point so equal rings in different files or windings
/// deduplicate.
pub(crate) fn cut_ring(pts: &[Pt], junctions: &FxHashSet<Pt>) -> Vec<Vec<Pt>> {
    let open = &pts[..pts.len() - 1];
    if open.is_empty() {
        return vec![pts.to_vec()];
    }
    match open.iter().position(|p| junctions.contains(p)) {
        Some(j) => cut_line(&rotate_closed(open, j), junctions),
        None => {
            let m = open
                .iter()
                .enumerate()
                .min_by_key(|(_, p)| **p)
                .map(|(i, _)| i)
                .unwrap_or(0);
            vec![rotate_closed(open, m)]
        }
    }
}

/// Rotate an open ring so index `k` comes first, then re-close it.
fn rotate_closed(open: &[Pt], k: usize) -> Vec<Pt> {
    let mut out = Vec::with_capacity(open.len() + 1);
    out.extend_from_slice(&open[k..]);
    out.extend_from_slice(&open[..k]);
    out.push(open[k]);
    out
}

/// Deduplicating arc store. Arc indices reference arcs forward; ones'
/// complement references them reversed.
#[derive(Debug, Default)]
pub(crate) struct ArcStore {
    arcs: Vec<Vec<Pt>>,
    index: FxHashMap<Vec<Pt>, usize>,
}

impl ArcStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an arc, returning its index, or the (possibly complemented)
    /// index of an existing equal arc.
    pub fn insert(&mut self, arc: Vec<Pt>) -> i32 {
        if let Some(&i) = self.index.get(&arc) {
            return i as i32;
        }
        let reversed: Vec<Pt> = arc.iter().rev().copied().collect();
        if let Some(&i) = self.index.get(&reversed) {
            return !(i as i32);
        }
        let i = self.arcs.len();
        self.index.insert(arc.clone(), i);
        self.arcs.push(arc);
        i as i32
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Delta-encode all arcs: first position absolute, the rest relative.
    pub fn into_encoded(self) -> Vec<Vec<Pt>> {
        self.arcs.into_iter().map(|arc| delta_encode(&arc)).collect()
    }
}

fn delta_encode(arc: &[Pt]) -> Vec<Pt> {
    let mut out = Vec::with_capacity(arc.len());
    let mut last = [0i64, 0i64];
    for (i, p) in arc.iter().enumerate() {
        if i == 0 {
            out.push(*p);
        } else {
            out.push([p[0] - last[0], p[1] - last[1]]);
        }
        last = *p;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Extractor, Quantizer};
    use geo2topo_core::Geometry;

    fn extract_all(geometries: &[Geometry]) -> Extractor {
        let mut ex = Extractor::new();
        let q = Quantizer::new([0.0, 0.0, 10.0, 10.0], 11);
        for g in geometries {
            ex.extract(g, &q).unwrap();
        }
        ex
    }

    fn line(coords: &[[f64; 2]]) -> Geometry {
        Geometry::LineString {
            coordinates: coords.iter().map(|c| c.to_vec()).collect(),
        }
    }

    #[test]
    fn test_line_endpoints_are_junctions() {
        let ex = extract_all(&[line(&[[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]])]);
        let j = junctions(&ex);
        assert!(j.contains(&[0, 0]));
        assert!(j.contains(&[10, 0]));
        assert!(!j.contains(&[5, 0]));
    }

    #[test]
    fn test_diverging_paths_create_junction() {
        // Two lines share [0,0]..[5,0] then diverge at [5,0]
        let ex = extract_all(&[
            line(&[[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]]),
            line(&[[0.0, 0.0], [5.0, 0.0], [5.0, 10.0]]),
        ]);
        let j = junctions(&ex);
        assert!(j.contains(&[5, 0]));
    }

    #[test]
    fn test_cut_line_at_junction() {
        let pts = vec![[0, 0], [5, 0], [10, 0]];
        let mut j = FxHashSet::default();
        j.insert([5i64, 0i64]);
        let arcs = cut_line(&pts, &j);
        assert_eq!(arcs, vec![vec![[0, 0], [5, 0]], vec![[5, 0], [10, 0]]]);
    }

    #[test]
    fn test_cut_ring_without_junctions_is_canonical() {
        let j = FxHashSet::default();
        // Same ring, different start points
        let a = cut_ring(&[[5, 5], [0, 0], [5, 0], [5, 5]], &j);
        let b = cut_ring(&[[5, 0], [5, 5], [0, 0], [5, 0]], &j);
        assert_eq!(a, b);
        assert_eq!(a[0][0], [0, 0]);
        assert_eq!(a[0].first(), a[0].last());
    }

    #[test]
    fn test_arc_store_dedups_forward_and_reversed() {
        let mut store = ArcStore::new();
        let forward = vec![[0i64, 0i64], [1, 1], [2, 0]];
        let reversed: Vec<_> = forward.iter().rev().copied().collect();
        assert_eq!(store.insert(forward.clone()), 0);
        assert_eq!(store.insert(forward), 0);
        assert_eq!(store.insert(reversed), !0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delta_encoding() {
        let mut store = ArcStore::new();
        store.insert(vec![[4, 4], [6, 7], [5, 7]]);
        let encoded = store.into_encoded();
        assert_eq!(encoded, vec![vec![[4, 4], [2, 3], [-1, 0]]]);
    }
}
