//! Per-pass table of half-edge departure angles.

use crate::graph::EdgeIx;
use crate::model::Side;
use crate::route::EdgeGeometry;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// `(edge, side) → tangent angle` for the half-edges routed during one pass.
///
/// Built explicitly for each redraw and handed to the ring builder; angles of edges the pass did
/// not touch are derived from the stored geometry, never from rendered output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeAngleMap {
    angles: FxHashMap<(EdgeIx, Side), f64>,
}

impl EdgeAngleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, e: EdgeIx, geometry: &EdgeGeometry) {
        for side in Side::BOTH {
            if let Some(half) = geometry.half(side) {
                self.angles.insert((e, side), half.departure_angle());
            }
        }
    }

    pub(crate) fn insert(&mut self, e: EdgeIx, side: Side, angle: f64) {
        self.angles.insert((e, side), angle);
    }

    pub fn get(&self, e: EdgeIx, side: Side) -> Option<f64> {
        self.angles.get(&(e, side)).copied()
    }

    /// Cached angle, or the one derived from `edges` when this pass did not route `e`.
    pub fn resolve(&self, e: EdgeIx, side: Side, edges: &[Option<EdgeGeometry>]) -> Option<f64> {
        self.get(e, side).or_else(|| {
            edges
                .get(e)?
                .as_ref()?
                .half(side)
                .map(|h| h.departure_angle())
        })
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeIx, Side, f64)> + '_ {
        self.angles.iter().map(|((e, s), a)| (*e, *s, *a))
    }
}

/// Serializable row of the angle table, keyed by edge id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeAngle {
    pub edge_id: String,
    pub side: Side,
    pub angle: f64,
}
