//! Incremental redraw engine and the pointer state machine driving it.
//!
//! A node move recomputes, in two phases:
//! 1. the bundles incident to the moved node (then the self-loops of every node those bundles
//!    touch, since loop slots depend on the other edges' angles);
//! 2. the bus rings of the moved node and of every touched neighbour.
//!
//! Nothing else is visited, so the cost of one update follows the moved node's degree, not the
//! diagram size.

use crate::angles::EdgeAngleMap;
use crate::diagram::{Diagram, non_loop_angles};
use crate::error::{Error, Result};
use crate::geom::{Point, Vector, round_point, vector};
use crate::graph::NodeIx;
use crate::route::Router;
use crate::text::apply_label_position;
use serde::Serialize;

/// What a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    Node(String),
    TextNode(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Grabbed {
    Node { n: NodeIx, origin: Point },
    Text { t: usize, origin: (Point, Vector) },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) enum DragState {
    #[default]
    Idle,
    /// Pointer is down, nothing moved yet.
    Pressed { grabbed: Grabbed, offset: Vector },
    Dragging { grabbed: Grabbed, offset: Vector },
}

/// Move notification, emitted once when a node drag ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMoved {
    pub id: String,
    pub equipment_id: String,
    pub x: f64,
    pub y: f64,
    pub x_orig: f64,
    pub y_orig: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNodeMoved {
    pub id: String,
    pub equipment_id: String,
    pub vl_node_id: String,
    pub shift_x: f64,
    pub shift_y: f64,
    pub shift_x_orig: f64,
    pub shift_y_orig: f64,
    pub connection_shift_x: f64,
    pub connection_shift_y: f64,
    pub connection_shift_x_orig: f64,
    pub connection_shift_y_orig: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub id: String,
    pub equipment_id: String,
}

/// How a press/release cycle resolved. Moving and selecting are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PointerOutcome {
    NodeMoved(NodeMoved),
    TextNodeMoved(TextNodeMoved),
    Selected(Selection),
}

/// Ids of everything one update rewrote; the renderer only needs to touch these.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedrawReport {
    pub edges: Vec<String>,
    pub buses: Vec<String>,
    pub text_nodes: Vec<String>,
    /// Departure angles of the edges routed by this update.
    pub angles: EdgeAngleMap,
}

impl Diagram {
    pub fn pointer_down(&mut self, target: DragTarget, at: Point) -> Result<()> {
        let grabbed = match &target {
            DragTarget::Node(id) => {
                let n = self.node_ix(id)?;
                Grabbed::Node {
                    n,
                    origin: self.graph.position(n),
                }
            }
            DragTarget::TextNode(id) => {
                let t = self
                    .graph
                    .text_ix(id)
                    .ok_or_else(|| Error::UnknownTextNode { id: id.clone() })?;
                let text = &self.graph.metadata().text_nodes[t];
                Grabbed::Text {
                    t,
                    origin: (
                        crate::geom::point(text.shift_x, text.shift_y),
                        vector(text.connection_shift_x, text.connection_shift_y),
                    ),
                }
            }
        };
        let offset = self.grabbed_position(grabbed)? - at;
        self.drag = DragState::Pressed { grabbed, offset };
        Ok(())
    }

    /// Applies one pointer position. Returns `None` when no drag is in progress.
    pub fn pointer_move(&mut self, at: Point) -> Result<Option<RedrawReport>> {
        let (grabbed, offset) = match self.drag {
            DragState::Idle => return Ok(None),
            DragState::Pressed { grabbed, offset } | DragState::Dragging { grabbed, offset } => {
                (grabbed, offset)
            }
        };
        self.drag = DragState::Dragging { grabbed, offset };
        let target = at + offset;
        let report = match grabbed {
            Grabbed::Node { n, .. } => self.move_node_ix(n, target),
            Grabbed::Text { t, .. } => self.move_text_ix(t, target)?,
        };
        Ok(Some(report))
    }

    /// Ends the press: commits a drag, or reports a selection when nothing moved.
    pub fn pointer_up(&mut self) -> Option<PointerOutcome> {
        let state = std::mem::take(&mut self.drag);
        let meta = self.graph.metadata();
        match state {
            DragState::Idle => None,
            DragState::Pressed { grabbed, .. } => Some(PointerOutcome::Selected(match grabbed {
                Grabbed::Node { n, .. } => Selection {
                    id: meta.nodes[n].svg_id.clone(),
                    equipment_id: meta.nodes[n].equipment_id.clone(),
                },
                Grabbed::Text { t, .. } => Selection {
                    id: meta.text_nodes[t].svg_id.clone(),
                    equipment_id: meta.text_nodes[t].equipment_id.clone(),
                },
            })),
            DragState::Dragging { grabbed, .. } => Some(match grabbed {
                Grabbed::Node { n, origin } => {
                    let node = &meta.nodes[n];
                    PointerOutcome::NodeMoved(NodeMoved {
                        id: node.svg_id.clone(),
                        equipment_id: node.equipment_id.clone(),
                        x: node.x,
                        y: node.y,
                        x_orig: origin.x,
                        y_orig: origin.y,
                    })
                }
                Grabbed::Text { t, origin } => {
                    let text = &meta.text_nodes[t];
                    PointerOutcome::TextNodeMoved(TextNodeMoved {
                        id: text.svg_id.clone(),
                        equipment_id: text.equipment_id.clone(),
                        vl_node_id: text.vl_node.clone(),
                        shift_x: text.shift_x,
                        shift_y: text.shift_y,
                        shift_x_orig: origin.0.x,
                        shift_y_orig: origin.0.y,
                        connection_shift_x: text.connection_shift_x,
                        connection_shift_y: text.connection_shift_y,
                        connection_shift_x_orig: origin.1.x,
                        connection_shift_y_orig: origin.1.y,
                    })
                }
            }),
        }
    }

    /// Leaving the drawing area keeps the last computed position.
    pub fn pointer_leave(&mut self) -> Option<PointerOutcome> {
        match self.drag {
            DragState::Dragging { .. } => self.pointer_up(),
            DragState::Idle | DragState::Pressed { .. } => {
                self.drag = DragState::Idle;
                None
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    fn grabbed_position(&self, grabbed: Grabbed) -> Result<Point> {
        match grabbed {
            Grabbed::Node { n, .. } => Ok(self.graph.position(n)),
            Grabbed::Text { t, .. } => self
                .texts
                .get(t)
                .and_then(|g| g.as_ref())
                .map(|g| g.position)
                .ok_or_else(|| Error::UnknownTextNode {
                    id: self.graph.metadata().text_nodes[t].svg_id.clone(),
                }),
        }
    }

    /// Moves a node to `position` (rounded to two decimals) and redraws what depends on it.
    pub fn move_node(&mut self, id: &str, position: Point) -> Result<RedrawReport> {
        let n = self.node_ix(id)?;
        Ok(self.move_node_ix(n, position))
    }

    /// Moves a label so that its top-left corner sits at `position`.
    pub fn move_text_node(&mut self, id: &str, position: Point) -> Result<RedrawReport> {
        let t = self
            .graph
            .text_ix(id)
            .ok_or_else(|| Error::UnknownTextNode { id: id.to_string() })?;
        self.move_text_ix(t, position)
    }

    fn move_node_ix(&mut self, n: NodeIx, position: Point) -> RedrawReport {
        self.graph.set_position(n, round_point(position));
        let bundles: Vec<usize> = self
            .graph
            .bundles_at(n)
            .iter()
            .copied()
            .filter(|b| !self.graph.bundle(*b).is_loop())
            .collect();
        let mut report = self.redraw_bundles(&[n], &bundles);
        if let Some(t) = self.rebuild_text(n) {
            report
                .text_nodes
                .push(self.graph.metadata().text_nodes[t].svg_id.clone());
        }
        report
    }

    fn move_text_ix(&mut self, t: usize, position: Point) -> Result<RedrawReport> {
        let params = &self.params;
        let text = &self.graph.metadata().text_nodes[t];
        let n = self
            .graph
            .node_ix(&text.vl_node)
            .ok_or_else(|| Error::UnknownNode {
                id: text.vl_node.clone(),
            })?;
        let width = text.width.unwrap_or(params.text_node_width);
        let height = text.height.unwrap_or(params.text_node_height);
        let center = self.graph.position(n);
        apply_label_position(
            &mut self.graph.meta.text_nodes[t],
            center,
            position,
            width,
            height,
        );
        self.rebuild_text(n);
        Ok(RedrawReport {
            text_nodes: vec![self.graph.metadata().text_nodes[t].svg_id.clone()],
            ..Default::default()
        })
    }

    /// Reroutes `bundles` (never self-loop bundles), then the self-loops and bus rings of every
    /// node they touch plus `seeds`.
    pub(crate) fn redraw_bundles(&mut self, seeds: &[NodeIx], bundles: &[usize]) -> RedrawReport {
        let mut diagnostics = Vec::new();
        let mut angles = EdgeAngleMap::new();
        let mut touched: Vec<NodeIx> = seeds.to_vec();
        let mut routed = Vec::new();
        {
            let router = Router::new(&self.graph, &self.params);
            for &b in bundles {
                touched.extend(self.graph.bundle_nodes(b));
                for (e, geometry) in router.route_bundle(b, &mut diagnostics) {
                    angles.record(e, &geometry);
                    self.edges[e] = Some(geometry);
                    routed.push(e);
                }
            }
            touched.sort_unstable();
            touched.dedup();

            for &n in &touched {
                let Some(b) = self.graph.loop_bundle_at(n) else {
                    continue;
                };
                let existing = non_loop_angles(&self.graph, &self.edges, &angles, n);
                for (e, geometry) in router.route_loops(b, &existing) {
                    angles.record(e, &geometry);
                    self.edges[e] = Some(geometry);
                    routed.push(e);
                }
            }
        }

        let mut buses = Vec::new();
        for &n in &touched {
            // A lone bus is a plain circle: nothing to re-fragment.
            if self.graph.buses(n).len() <= 1 {
                continue;
            }
            buses.extend(self.rebuild_rings(n, &angles));
        }
        for d in diagnostics {
            self.report(d);
        }
        tracing::trace!(
            touched = touched.len(),
            edges = routed.len(),
            buses = buses.len(),
            "incremental redraw"
        );

        let meta = self.graph.metadata();
        RedrawReport {
            edges: routed
                .into_iter()
                .map(|e| meta.edges[e].svg_id.clone())
                .collect(),
            buses: buses
                .into_iter()
                .map(|b| meta.bus_nodes[b].svg_id.clone())
                .collect(),
            text_nodes: Vec::new(),
            angles,
        }
    }
}
