//! Mutable diagram state: metadata, classification and every piece of derived geometry.
//!
//! One instance per displayed diagram. Construction (and [`Diagram::replace_metadata`]) runs the
//! batch router; afterwards geometry only changes through the redraw engine (`redraw.rs`) and the
//! data overlay (`overlay.rs`).

use crate::angles::{EdgeAngle, EdgeAngleMap};
use crate::bus::{BusShape, bus_radius, bus_shape};
use crate::config::DiagramParameters;
use crate::error::{Diagnostic, Error, Result};
use crate::geom::Point;
use crate::graph::{DiagramGraph, EdgeIx, NodeIx};
use crate::model::{DiagramMetadata, Side};
use crate::overlay::Overlay;
use crate::redraw::DragState;
use crate::route::{EdgeGeometry, Router};
use crate::text::{TextNodeGeometry, text_node_geometry};
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Diagram {
    pub(crate) graph: DiagramGraph,
    pub(crate) params: DiagramParameters,
    pub(crate) edges: Vec<Option<EdgeGeometry>>,
    pub(crate) bus_shapes: Vec<Option<BusShape>>,
    pub(crate) texts: Vec<Option<TextNodeGeometry>>,
    pub(crate) overlay: Overlay,
    pub(crate) drag: DragState,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

/// Everything derived from the metadata, keyed by svg id in metadata order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramSnapshot {
    pub edges: IndexMap<String, EdgeGeometry>,
    pub buses: IndexMap<String, BusShape>,
    pub text_nodes: IndexMap<String, TextNodeGeometry>,
}

impl Diagram {
    pub fn new(metadata: DiagramMetadata) -> Self {
        let params = DiagramParameters::from_config(&metadata.svg_parameters);
        Self::with_parameters(metadata, params)
    }

    pub fn with_parameters(metadata: DiagramMetadata, params: DiagramParameters) -> Self {
        let mut diagnostics = Vec::new();
        let graph = DiagramGraph::build(metadata, &mut diagnostics);
        let mut diagram = Self {
            edges: Vec::new(),
            bus_shapes: Vec::new(),
            texts: Vec::new(),
            overlay: Overlay::default(),
            drag: DragState::Idle,
            diagnostics,
            graph,
            params,
        };
        diagram.route_all();
        diagram
    }

    /// Parses and validates a metadata document, then routes it.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let metadata = DiagramMetadata::from_json_str(text)?;
        metadata.validate()?;
        Ok(Self::new(metadata))
    }

    /// Swaps in new metadata and reroutes everything. Overlay values are dropped.
    pub fn replace_metadata(&mut self, metadata: DiagramMetadata) {
        *self = Self::new(metadata);
    }

    /// Batch pass: every bundle, then self-loops, then rings and labels.
    fn route_all(&mut self) {
        let mut diagnostics = Vec::new();
        let mut edges: Vec<Option<EdgeGeometry>> = vec![None; self.graph.metadata().edges.len()];
        let mut angles = EdgeAngleMap::new();
        {
            let router = Router::new(&self.graph, &self.params);
            for (b, bundle) in self.graph.bundles().iter().enumerate() {
                if bundle.is_loop() {
                    continue;
                }
                for (e, geometry) in router.route_bundle(b, &mut diagnostics) {
                    angles.record(e, &geometry);
                    edges[e] = Some(geometry);
                }
            }
            for (b, bundle) in self.graph.bundles().iter().enumerate() {
                let crate::graph::BundleKind::SelfLoop { node } = bundle.kind else {
                    continue;
                };
                let existing = non_loop_angles(&self.graph, &edges, &angles, node);
                for (e, geometry) in router.route_loops(b, &existing) {
                    angles.record(e, &geometry);
                    edges[e] = Some(geometry);
                }
            }
        }
        self.edges = edges;
        self.bus_shapes = vec![None; self.graph.metadata().bus_nodes.len()];
        for n in 0..self.graph.node_count() {
            self.rebuild_rings(n, &angles);
        }
        self.texts = vec![None; self.graph.metadata().text_nodes.len()];
        for n in 0..self.graph.node_count() {
            self.rebuild_text(n);
        }
        for d in diagnostics {
            self.report(d);
        }
        tracing::debug!(
            edges = self.edges.iter().filter(|g| g.is_some()).count(),
            buses = self.bus_shapes.iter().filter(|s| s.is_some()).count(),
            "batch routing done"
        );
    }

    /// Rebuilds the ring shapes of every bus of `n` from the angles of the edges attached to it.
    pub(crate) fn rebuild_rings(&mut self, n: NodeIx, angles: &EdgeAngleMap) -> Vec<usize> {
        let buses = self.graph.buses(n).to_vec();
        if buses.is_empty() {
            return Vec::new();
        }
        let meta = self.graph.metadata();
        let attached: Vec<(usize, f64)> = self
            .graph
            .sides_at(n)
            .iter()
            .filter_map(|&(e, side)| {
                let b = self.graph.ends(e)?.bus(side)?;
                if self.graph.bus_owner(b) != Some(n) {
                    return None;
                }
                let a = angles.resolve(e, side, &self.edges)?;
                Some((meta.bus_nodes[b].index, a))
            })
            .collect();

        let base = Router::new(&self.graph, &self.params).base_radius(n);
        let mut shapes = Vec::with_capacity(buses.len());
        for &b in &buses {
            let bus = &meta.bus_nodes[b];
            let radius = bus_radius(
                bus.nb_neighbours,
                bus.index,
                base,
                self.params.inter_annulus_space,
            );
            let crossing: Vec<f64> = attached
                .iter()
                .filter(|(index, _)| *index < bus.index)
                .map(|(_, a)| *a)
                .collect();
            shapes.push((
                b,
                bus_shape(radius, bus.index, &crossing, self.params.node_hollow_width),
            ));
        }
        for (b, shape) in shapes {
            self.bus_shapes[b] = Some(shape);
        }
        buses
    }

    pub(crate) fn rebuild_text(&mut self, n: NodeIx) -> Option<usize> {
        let t = self.graph.text_of_node(n)?;
        let radius = Router::new(&self.graph, &self.params).node_radius(n);
        let text = &self.graph.metadata().text_nodes[t];
        self.texts[t] = Some(text_node_geometry(self.graph.position(n), radius, text));
        Some(t)
    }

    pub(crate) fn report(&mut self, d: Diagnostic) {
        if self.diagnostics.contains(&d) {
            return;
        }
        d.log();
        self.diagnostics.push(d);
    }

    pub fn metadata(&self) -> &DiagramMetadata {
        self.graph.metadata()
    }

    pub fn parameters(&self) -> &DiagramParameters {
        &self.params
    }

    pub fn graph(&self) -> &DiagramGraph {
        &self.graph
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn node_position(&self, id: &str) -> Result<Point> {
        let n = self.node_ix(id)?;
        Ok(self.graph.position(n))
    }

    pub fn edge_geometry(&self, id: &str) -> Result<Option<&EdgeGeometry>> {
        let e = self.edge_ix(id)?;
        Ok(self.edges[e].as_ref())
    }

    pub fn bus_shape(&self, id: &str) -> Result<Option<&BusShape>> {
        let b = self
            .graph
            .bus_ix(id)
            .ok_or_else(|| Error::UnknownBusNode { id: id.to_string() })?;
        Ok(self.bus_shapes[b].as_ref())
    }

    pub fn text_node_geometry(&self, id: &str) -> Result<Option<&TextNodeGeometry>> {
        let t = self
            .graph
            .text_ix(id)
            .ok_or_else(|| Error::UnknownTextNode { id: id.to_string() })?;
        Ok(self.texts[t].as_ref())
    }

    pub fn edge_angle(&self, id: &str, side: Side) -> Result<Option<f64>> {
        let e = self.edge_ix(id)?;
        Ok(self.edges[e]
            .as_ref()
            .and_then(|g| g.half(side))
            .map(|h| h.departure_angle()))
    }

    /// The full tangent-angle table, in metadata order.
    pub fn edge_angles(&self) -> Vec<EdgeAngle> {
        let meta = self.graph.metadata();
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(e, g)| g.as_ref().map(|g| (e, g)))
            .flat_map(|(e, g)| {
                Side::BOTH.into_iter().filter_map(move |side| {
                    g.half(side).map(|h| EdgeAngle {
                        edge_id: meta.edges[e].svg_id.clone(),
                        side,
                        angle: h.departure_angle(),
                    })
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> DiagramSnapshot {
        let meta = self.graph.metadata();
        DiagramSnapshot {
            edges: self
                .edges
                .iter()
                .enumerate()
                .filter_map(|(e, g)| Some((meta.edges[e].svg_id.clone(), g.clone()?)))
                .collect(),
            buses: self
                .bus_shapes
                .iter()
                .enumerate()
                .filter_map(|(b, s)| Some((meta.bus_nodes[b].svg_id.clone(), s.clone()?)))
                .collect(),
            text_nodes: self
                .texts
                .iter()
                .enumerate()
                .filter_map(|(t, g)| Some((meta.text_nodes[t].svg_id.clone(), g.clone()?)))
                .collect(),
        }
    }

    pub(crate) fn node_ix(&self, id: &str) -> Result<NodeIx> {
        self.graph
            .node_ix(id)
            .ok_or_else(|| Error::UnknownNode { id: id.to_string() })
    }

    pub(crate) fn edge_ix(&self, id: &str) -> Result<EdgeIx> {
        self.graph
            .edge_ix(id)
            .ok_or_else(|| Error::UnknownEdge { id: id.to_string() })
    }
}

/// Departure angles at `n` of every drawn edge except its self-loops.
pub(crate) fn non_loop_angles(
    graph: &DiagramGraph,
    edges: &[Option<EdgeGeometry>],
    angles: &EdgeAngleMap,
    n: NodeIx,
) -> Vec<f64> {
    graph
        .sides_at(n)
        .iter()
        .filter(|(e, _)| {
            graph
                .ends(*e)
                .is_some_and(|ends| ends.node1 != ends.node2)
        })
        .filter_map(|&(e, side)| angles.resolve(e, side, edges))
        .collect()
}
