//! Indexed view over diagram metadata and the edge classification shared by the batch router and
//! the incremental redraw engine.
//!
//! Classification is computed once per metadata load. It only depends on topology (node ids, edge
//! kinds), never on coordinates, so dragging a node keeps every bundle stable.

use crate::error::Diagnostic;
use crate::geom::{Point, point};
use crate::model::{DiagramMetadata, EdgeKind, Side};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

pub type NodeIx = usize;
pub type EdgeIx = usize;
pub type BusIx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    VoltageLevel,
    /// Far end of a dangling line.
    Boundary,
    /// Shared center of a three-winding transformer.
    ThreeTerminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    /// Edges between the same unordered node pair; `a` is `node1` of the first edge.
    Parallel { a: NodeIx, b: NodeIx },
    SelfLoop { node: NodeIx },
    ThreeTerminal { anchor: NodeIx },
}

#[derive(Debug, Clone)]
pub struct Bundle {
    pub kind: BundleKind,
    pub edges: Vec<EdgeIx>,
}

impl Bundle {
    pub fn is_loop(&self) -> bool {
        matches!(self.kind, BundleKind::SelfLoop { .. })
    }
}

/// Edge endpoints resolved to indices.
#[derive(Debug, Clone, Copy)]
pub struct EdgeEnds {
    pub node1: NodeIx,
    pub node2: NodeIx,
    pub bus1: Option<BusIx>,
    pub bus2: Option<BusIx>,
}

impl EdgeEnds {
    pub fn node(&self, side: Side) -> NodeIx {
        match side {
            Side::One => self.node1,
            Side::Two => self.node2,
        }
    }

    pub fn bus(&self, side: Side) -> Option<BusIx> {
        match side {
            Side::One => self.bus1,
            Side::Two => self.bus2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiagramGraph {
    pub(crate) meta: DiagramMetadata,
    node_ix: FxHashMap<String, NodeIx>,
    bus_ix: FxHashMap<String, BusIx>,
    bus_by_equipment: FxHashMap<String, BusIx>,
    edge_ix: FxHashMap<String, EdgeIx>,
    edges_by_equipment: FxHashMap<String, Vec<EdgeIx>>,
    text_ix: FxHashMap<String, usize>,
    text_by_node: FxHashMap<NodeIx, usize>,
    bus_node: Vec<Option<NodeIx>>,
    buses_by_node: Vec<Vec<BusIx>>,
    roles: Vec<NodeRole>,
    ends: Vec<Option<EdgeEnds>>,
    bundles: Vec<Bundle>,
    bundle_of_edge: Vec<Option<usize>>,
    bundles_by_node: Vec<Vec<usize>>,
    loop_bundle_by_node: FxHashMap<NodeIx, usize>,
    sides_by_node: Vec<Vec<(EdgeIx, Side)>>,
}

impl DiagramGraph {
    /// Indexes `meta` and classifies its edges. Edges that cannot be drawn are reported and left
    /// out of every bundle.
    pub fn build(meta: DiagramMetadata, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let node_ix: FxHashMap<String, NodeIx> = meta
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.svg_id.clone(), i))
            .collect();
        let bus_ix: FxHashMap<String, BusIx> = meta
            .bus_nodes
            .iter()
            .enumerate()
            .map(|(i, b)| (b.svg_id.clone(), i))
            .collect();
        let bus_by_equipment: FxHashMap<String, BusIx> = meta
            .bus_nodes
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.equipment_id.is_empty())
            .map(|(i, b)| (b.equipment_id.clone(), i))
            .collect();
        let edge_ix: FxHashMap<String, EdgeIx> = meta
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.svg_id.clone(), i))
            .collect();
        let mut edges_by_equipment: FxHashMap<String, Vec<EdgeIx>> = FxHashMap::default();
        for (i, e) in meta.edges.iter().enumerate() {
            if !e.equipment_id.is_empty() {
                edges_by_equipment
                    .entry(e.equipment_id.clone())
                    .or_default()
                    .push(i);
            }
        }
        let text_ix: FxHashMap<String, usize> = meta
            .text_nodes
            .iter()
            .enumerate()
            .map(|(i, t)| (t.svg_id.clone(), i))
            .collect();
        let text_by_node: FxHashMap<NodeIx, usize> = meta
            .text_nodes
            .iter()
            .enumerate()
            .filter_map(|(i, t)| node_ix.get(&t.vl_node).map(|n| (*n, i)))
            .collect();

        let bus_node: Vec<Option<NodeIx>> = meta
            .bus_nodes
            .iter()
            .map(|b| node_ix.get(&b.vl_node).copied())
            .collect();
        let mut buses_by_node: Vec<Vec<BusIx>> = vec![Vec::new(); meta.nodes.len()];
        for (b, n) in bus_node.iter().enumerate() {
            if let Some(n) = n {
                buses_by_node[*n].push(b);
            }
        }
        for buses in &mut buses_by_node {
            buses.sort_by_key(|b| meta.bus_nodes[*b].index);
        }

        let mut graph = Self {
            node_ix,
            bus_ix,
            bus_by_equipment,
            edge_ix,
            edges_by_equipment,
            text_ix,
            text_by_node,
            bus_node,
            buses_by_node,
            roles: vec![NodeRole::VoltageLevel; meta.nodes.len()],
            ends: vec![None; meta.edges.len()],
            bundles: Vec::new(),
            bundle_of_edge: vec![None; meta.edges.len()],
            bundles_by_node: vec![Vec::new(); meta.nodes.len()],
            loop_bundle_by_node: FxHashMap::default(),
            sides_by_node: vec![Vec::new(); meta.nodes.len()],
            meta,
        };
        graph.classify(diagnostics);
        tracing::debug!(
            nodes = graph.meta.nodes.len(),
            edges = graph.meta.edges.len(),
            bundles = graph.bundles.len(),
            "diagram graph indexed"
        );
        graph
    }

    fn resolve_ends(&self, e: EdgeIx) -> Result<EdgeEnds, Diagnostic> {
        let edge = &self.meta.edges[e];
        let missing = |reference: &str| Diagnostic::MissingMetadata {
            edge_id: edge.svg_id.clone(),
            reference: reference.to_string(),
        };
        let node1 = *self.node_ix.get(&edge.node1).ok_or_else(|| missing(&edge.node1))?;
        let node2 = *self.node_ix.get(&edge.node2).ok_or_else(|| missing(&edge.node2))?;
        let bus = |id: &str| -> Result<Option<BusIx>, Diagnostic> {
            if id.is_empty() {
                return Ok(None);
            }
            self.bus_ix.get(id).copied().map(Some).ok_or_else(|| missing(id))
        };
        Ok(EdgeEnds {
            node1,
            node2,
            bus1: bus(&edge.bus_node1)?,
            bus2: bus(&edge.bus_node2)?,
        })
    }

    fn classify(&mut self, diagnostics: &mut Vec<Diagnostic>) {
        let mut parallel: IndexMap<(NodeIx, NodeIx), Vec<EdgeIx>> = IndexMap::new();
        let mut loops: IndexMap<NodeIx, Vec<EdgeIx>> = IndexMap::new();
        let mut three: IndexMap<NodeIx, Vec<EdgeIx>> = IndexMap::new();

        for e in 0..self.meta.edges.len() {
            let edge = &self.meta.edges[e];
            if let EdgeKind::Unknown(kind) = &edge.kind {
                let d = Diagnostic::UnknownEdgeKind {
                    edge_id: edge.svg_id.clone(),
                    kind: kind.clone(),
                };
                d.log();
                diagnostics.push(d);
                continue;
            }
            let ends = match self.resolve_ends(e) {
                Ok(ends) => ends,
                Err(d) => {
                    d.log();
                    diagnostics.push(d);
                    continue;
                }
            };
            self.ends[e] = Some(ends);

            match &edge.kind {
                EdgeKind::ThreeWindingTransformer => {
                    self.roles[ends.node2] = NodeRole::ThreeTerminal;
                    three.entry(ends.node2).or_default().push(e);
                }
                _ if ends.node1 == ends.node2 => {
                    loops.entry(ends.node1).or_default().push(e);
                }
                kind => {
                    if *kind == EdgeKind::DanglingLine {
                        self.roles[ends.node2] = NodeRole::Boundary;
                    }
                    let key = (ends.node1.min(ends.node2), ends.node1.max(ends.node2));
                    parallel.entry(key).or_default().push(e);
                }
            }
        }

        for (_, edges) in parallel {
            let first = edges[0];
            let ends = self.ends[first].map(|x| (x.node1, x.node2));
            if let Some((a, b)) = ends {
                self.push_bundle(BundleKind::Parallel { a, b }, edges);
            }
        }
        for (anchor, edges) in three {
            self.push_bundle(BundleKind::ThreeTerminal { anchor }, edges);
        }
        for (node, edges) in loops {
            let b = self.push_bundle(BundleKind::SelfLoop { node }, edges);
            self.loop_bundle_by_node.insert(node, b);
        }
    }

    fn push_bundle(&mut self, kind: BundleKind, edges: Vec<EdgeIx>) -> usize {
        let b = self.bundles.len();
        let mut touched: Vec<NodeIx> = Vec::new();
        for &e in &edges {
            self.bundle_of_edge[e] = Some(b);
            let Some(ends) = self.ends[e] else {
                continue;
            };
            touched.push(ends.node1);
            touched.push(ends.node2);
            self.sides_by_node[ends.node1].push((e, Side::One));
            // Three-terminal legs are drawn from the voltage-level side only.
            if !matches!(kind, BundleKind::ThreeTerminal { .. }) {
                self.sides_by_node[ends.node2].push((e, Side::Two));
            }
        }
        touched.sort_unstable();
        touched.dedup();
        for n in touched {
            self.bundles_by_node[n].push(b);
        }
        self.bundles.push(Bundle { kind, edges });
        b
    }

    pub fn metadata(&self) -> &DiagramMetadata {
        &self.meta
    }

    pub fn node_count(&self) -> usize {
        self.meta.nodes.len()
    }

    pub fn node_ix(&self, id: &str) -> Option<NodeIx> {
        self.node_ix.get(id).copied()
    }

    pub fn edge_ix(&self, id: &str) -> Option<EdgeIx> {
        self.edge_ix.get(id).copied()
    }

    /// Edges carrying `equipment_id`, in metadata order. A three-winding transformer has one per leg.
    pub fn edges_by_equipment(&self, equipment_id: &str) -> &[EdgeIx] {
        self.edges_by_equipment
            .get(equipment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn bus_ix(&self, id: &str) -> Option<BusIx> {
        self.bus_ix.get(id).copied()
    }

    pub fn bus_ix_by_equipment(&self, equipment_id: &str) -> Option<BusIx> {
        self.bus_by_equipment.get(equipment_id).copied()
    }

    pub fn text_ix(&self, id: &str) -> Option<usize> {
        self.text_ix.get(id).copied()
    }

    pub fn text_of_node(&self, n: NodeIx) -> Option<usize> {
        self.text_by_node.get(&n).copied()
    }

    pub fn position(&self, n: NodeIx) -> Point {
        let node = &self.meta.nodes[n];
        point(node.x, node.y)
    }

    pub(crate) fn set_position(&mut self, n: NodeIx, p: Point) {
        let node = &mut self.meta.nodes[n];
        node.x = p.x;
        node.y = p.y;
    }

    pub fn role(&self, n: NodeIx) -> NodeRole {
        self.roles[n]
    }

    pub fn bus_owner(&self, b: BusIx) -> Option<NodeIx> {
        self.bus_node[b]
    }

    /// Buses of a node, innermost first.
    pub fn buses(&self, n: NodeIx) -> &[BusIx] {
        &self.buses_by_node[n]
    }

    pub fn ends(&self, e: EdgeIx) -> Option<EdgeEnds> {
        self.ends[e]
    }

    pub(crate) fn set_bus(&mut self, e: EdgeIx, side: Side, b: BusIx) {
        let id = self.meta.bus_nodes[b].svg_id.clone();
        *self.meta.edges[e].bus_node_mut(side) = id;
        if let Some(ends) = self.ends[e].as_mut() {
            match side {
                Side::One => ends.bus1 = Some(b),
                Side::Two => ends.bus2 = Some(b),
            }
        }
    }

    pub fn kind(&self, e: EdgeIx) -> &EdgeKind {
        &self.meta.edges[e].kind
    }

    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    pub fn bundle(&self, b: usize) -> &Bundle {
        &self.bundles[b]
    }

    pub fn bundle_of_edge(&self, e: EdgeIx) -> Option<usize> {
        self.bundle_of_edge[e]
    }

    /// Bundles with at least one edge ending on `n`.
    pub fn bundles_at(&self, n: NodeIx) -> &[usize] {
        &self.bundles_by_node[n]
    }

    pub fn loop_bundle_at(&self, n: NodeIx) -> Option<usize> {
        self.loop_bundle_by_node.get(&n).copied()
    }

    /// Drawn half-edges leaving `n`.
    pub fn sides_at(&self, n: NodeIx) -> &[(EdgeIx, Side)] {
        &self.sides_by_node[n]
    }

    /// Nodes joined by the edges of bundle `b`.
    pub fn bundle_nodes(&self, b: usize) -> Vec<NodeIx> {
        let mut nodes: Vec<NodeIx> = self.bundles[b]
            .edges
            .iter()
            .filter_map(|e| self.ends[*e])
            .flat_map(|ends| [ends.node1, ends.node2])
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}
