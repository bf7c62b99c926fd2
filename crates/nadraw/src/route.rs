//! Edge routing: from node positions and bundle classification to half-edge point lists.
//!
//! Every function here is a pure transform of the current metadata. The batch pass routes all
//! bundles once; the redraw engine calls the very same per-bundle functions for the bundles a drag
//! touches, which is what keeps incremental and batch results identical.

use crate::bus::bus_radius;
use crate::config::DiagramParameters;
use crate::error::Diagnostic;
use crate::geom::{Point, angle, midpoint, point_at_angle, point_towards, try_angle};
use crate::graph::{BundleKind, BusIx, DiagramGraph, EdgeEnds, EdgeIx, NodeIx, NodeRole};
use crate::model::{EdgeKind, Side};
use crate::path::boundary_semicircle_path;
use crate::slots::allocate_loop_angles;
use serde::Serialize;
use std::f64::consts::PI;

/// One side of an edge, from its anchor bus outwards. Always at least two points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HalfEdge {
    pub points: Vec<Point>,
}

impl HalfEdge {
    fn new(points: Vec<Point>) -> Self {
        debug_assert!(points.len() >= 2);
        Self { points }
    }

    /// Tangent angle where the half-edge leaves its node.
    pub fn departure_angle(&self) -> f64 {
        angle(self.points[0], self.points[1])
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EdgeSymbol {
    Transformer { windings: [Point; 2], radius: f64 },
    PhaseShifter { windings: [Point; 2], radius: f64 },
    ConverterStation { from: Point, to: Point },
    /// Boundary node of a dangling line; `path` is relative to `center`.
    Boundary { center: Point, path: String },
    ThreeWindingLeg { winding: Point, radius: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeGeometry {
    pub half1: Option<HalfEdge>,
    pub half2: Option<HalfEdge>,
    /// Angular offset from the straight line between the nodes, for forked parallel edges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fork_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<EdgeSymbol>,
}

impl EdgeGeometry {
    pub fn half(&self, side: Side) -> Option<&HalfEdge> {
        match side {
            Side::One => self.half1.as_ref(),
            Side::Two => self.half2.as_ref(),
        }
    }
}

pub struct Router<'a> {
    graph: &'a DiagramGraph,
    params: &'a DiagramParameters,
}

impl<'a> Router<'a> {
    pub fn new(graph: &'a DiagramGraph, params: &'a DiagramParameters) -> Self {
        Self { graph, params }
    }

    pub fn base_radius(&self, n: NodeIx) -> f64 {
        if self.graph.metadata().nodes[n].fictitious {
            self.params.fictitious_voltage_level_circle_radius
        } else {
            self.params.voltage_level_circle_radius
        }
    }

    /// Outer radius of the whole node, whatever bus it is drawn with.
    pub fn node_radius(&self, n: NodeIx) -> f64 {
        match self.graph.buses(n).first() {
            Some(&b) => {
                let bus = &self.graph.metadata().bus_nodes[b];
                bus_radius(
                    bus.nb_neighbours,
                    0,
                    self.base_radius(n),
                    self.params.inter_annulus_space,
                )
                .display
            }
            None => self.base_radius(n),
        }
    }

    fn edge_start(&self, n: NodeIx, bus: Option<BusIx>, towards: Point) -> Point {
        let center = self.graph.position(n);
        match bus {
            Some(b) => {
                let bus = &self.graph.metadata().bus_nodes[b];
                let owner = self.graph.bus_owner(b).unwrap_or(n);
                let r = bus_radius(
                    bus.nb_neighbours,
                    bus.index,
                    self.base_radius(owner),
                    self.params.inter_annulus_space,
                );
                point_towards(center, towards, r.outer - self.params.edge_start_shift)
            }
            None => match self.graph.role(n) {
                NodeRole::VoltageLevel => point_towards(
                    center,
                    towards,
                    self.node_radius(n) + self.params.unknown_bus_node_extra_radius,
                ),
                NodeRole::Boundary | NodeRole::ThreeTerminal => center,
            },
        }
    }

    fn check_distinct(
        &self,
        e: EdgeIx,
        a: NodeIx,
        b: NodeIx,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if try_angle(self.graph.position(a), self.graph.position(b)).is_none() {
            diagnostics.push(Diagnostic::DegenerateEdge {
                edge_id: self.graph.metadata().edges[e].svg_id.clone(),
            });
        }
    }

    /// Routes a parallel or three-terminal bundle. Self-loop bundles go through
    /// [`Router::route_loops`], which needs the angles of the node's other edges.
    pub fn route_bundle(
        &self,
        b: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<(EdgeIx, EdgeGeometry)> {
        let bundle = self.graph.bundle(b);
        match bundle.kind {
            BundleKind::Parallel { a, b: other } => {
                if let Some(&e) = bundle.edges.first() {
                    self.check_distinct(e, a, other, diagnostics);
                }
                if bundle.edges.len() == 1 {
                    let e = bundle.edges[0];
                    self.graph
                        .ends(e)
                        .map(|ends| vec![(e, self.route_single(e, ends))])
                        .unwrap_or_default()
                } else {
                    self.route_parallel(a, other, &bundle.edges)
                }
            }
            BundleKind::ThreeTerminal { anchor } => {
                self.route_three_terminal(anchor, &bundle.edges, diagnostics)
            }
            BundleKind::SelfLoop { .. } => Vec::new(),
        }
    }

    fn route_single(&self, e: EdgeIx, ends: EdgeEnds) -> EdgeGeometry {
        let p1 = self.graph.position(ends.node1);
        let p2 = self.graph.position(ends.node2);
        let bends: Vec<Point> = self.graph.metadata().edges[e]
            .points
            .iter()
            .map(|p| crate::geom::point(p.x, p.y))
            .collect();

        let (Some(&first_bend), Some(&last_bend)) = (bends.first(), bends.last()) else {
            let start1 = self.edge_start(ends.node1, ends.bus1, p2);
            let start2 = self.edge_start(ends.node2, ends.bus2, p1);
            return self.terminate(e, vec![start1], vec![start2], midpoint(start1, start2));
        };

        let start1 = self.edge_start(ends.node1, ends.bus1, first_bend);
        let start2 = self.edge_start(ends.node2, ends.bus2, last_bend);
        let mut polyline = Vec::with_capacity(bends.len() + 2);
        polyline.push(start1);
        polyline.extend(bends);
        polyline.push(start2);

        let (middle, segment) = half_length_point(&polyline);
        let side1 = polyline[..=segment].to_vec();
        let side2 = polyline[segment + 1..].iter().rev().copied().collect();
        self.terminate(e, side1, side2, middle)
    }

    fn route_parallel(&self, a: NodeIx, b: NodeIx, edges: &[EdgeIx]) -> Vec<(EdgeIx, EdgeGeometry)> {
        let pa = self.graph.position(a);
        let pb = self.graph.position(b);
        let base = angle(pa, pb);
        let aperture = self.params.fork_aperture_rad();
        let fork_length = self.params.edges_fork_length;
        let m = edges.len();

        let mut out = Vec::with_capacity(m);
        for (i, &e) in edges.iter().enumerate() {
            let Some(ends) = self.graph.ends(e) else {
                continue;
            };
            if 2 * i + 1 == m {
                out.push((e, self.route_single(e, ends)));
                continue;
            }
            let alpha = aperture * (i as f64 / (m - 1) as f64 - 0.5);
            let fork_a = point_at_angle(pa, fork_length, base - alpha);
            let fork_b = point_at_angle(pb, fork_length, base + PI + alpha);
            let middle = midpoint(fork_a, fork_b);

            let side_a = if ends.node1 == a { Side::One } else { Side::Two };
            let start_a = self.edge_start(a, ends.bus(side_a), fork_a);
            let start_b = self.edge_start(b, ends.bus(side_a.opposite()), fork_b);
            let (side1, side2) = match side_a {
                Side::One => (vec![start_a, fork_a], vec![start_b, fork_b]),
                Side::Two => (vec![start_b, fork_b], vec![start_a, fork_a]),
            };
            let mut geometry = self.terminate(e, side1, side2, middle);
            geometry.fork_offset = Some(alpha);
            out.push((e, geometry));
        }
        out
    }

    /// Closes both sides at `middle`, applying the kind's termination rule.
    fn terminate(
        &self,
        e: EdgeIx,
        mut side1: Vec<Point>,
        mut side2: Vec<Point>,
        middle: Point,
    ) -> EdgeGeometry {
        let radius = self.params.transformer_circle_radius;
        let last = |pts: &[Point]| pts[pts.len() - 1];
        let symbol = match self.graph.kind(e) {
            EdgeKind::TwoWindingTransformer | EdgeKind::PhaseShifter => {
                let end1 = point_towards(middle, last(&side1), 1.5 * radius);
                let end2 = point_towards(middle, last(&side2), 1.5 * radius);
                side1.push(end1);
                side2.push(end2);
                let windings = [
                    point_towards(end1, middle, radius),
                    point_towards(end2, middle, radius),
                ];
                if *self.graph.kind(e) == EdgeKind::PhaseShifter {
                    Some(EdgeSymbol::PhaseShifter { windings, radius })
                } else {
                    Some(EdgeSymbol::Transformer { windings, radius })
                }
            }
            EdgeKind::Hvdc => {
                let half = self.params.converter_station_width / 2.0;
                let from = point_towards(middle, last(&side1), half);
                let to = point_towards(middle, last(&side2), half);
                side1.push(middle);
                side2.push(middle);
                Some(EdgeSymbol::ConverterStation { from, to })
            }
            EdgeKind::DanglingLine => {
                side1.push(middle);
                side2.push(middle);
                self.graph.ends(e).map(|ends| EdgeSymbol::Boundary {
                    center: self.graph.position(ends.node2),
                    path: boundary_semicircle_path(
                        self.params.voltage_level_circle_radius,
                        angle(side2[0], side2[1]),
                    ),
                })
            }
            EdgeKind::Line | EdgeKind::ThreeWindingTransformer | EdgeKind::Unknown(_) => {
                side1.push(middle);
                side2.push(middle);
                None
            }
        };
        EdgeGeometry {
            half1: Some(HalfEdge::new(side1)),
            half2: Some(HalfEdge::new(side2)),
            fork_offset: None,
            symbol,
        }
    }

    /// Places the legs of a three-winding transformer 120° apart around its anchor.
    ///
    /// The leg following the two closest legs (in increasing-angle order) keeps its natural
    /// direction and leads; the others follow at fixed steps.
    fn route_three_terminal(
        &self,
        anchor: NodeIx,
        legs: &[EdgeIx],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<(EdgeIx, EdgeGeometry)> {
        let center = self.graph.position(anchor);
        let legs: Vec<(EdgeIx, EdgeEnds)> = legs
            .iter()
            .filter_map(|&e| self.graph.ends(e).map(|ends| (e, ends)))
            .collect();
        let n = legs.len();
        if n == 0 {
            return Vec::new();
        }

        let angles: Vec<f64> = legs
            .iter()
            .map(|(e, ends)| {
                self.check_distinct(*e, anchor, ends.node1, diagnostics);
                angle(center, self.graph.position(ends.node1))
            })
            .collect();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| angles[i].total_cmp(&angles[j]));

        let gap = |k: usize| {
            let next = if k + 1 == n {
                angles[order[0]] + 2.0 * PI
            } else {
                angles[order[k + 1]]
            };
            next - angles[order[k]]
        };
        let tightest = (0..n).fold(0, |best, k| if gap(k) < gap(best) { k } else { best });
        let lead = (tightest + n - 1) % n;
        let leading_angle = angles[order[lead]];
        let step = 2.0 * PI / n.max(3) as f64;

        let stub = self.params.three_wt_stub_length;
        let radius = self.params.transformer_circle_radius;
        (0..n)
            .map(|i| {
                let (e, ends) = legs[order[(lead + i) % n]];
                let leg_angle = leading_angle + i as f64 * step;
                let stub_end = point_at_angle(center, stub, leg_angle);
                let start = self.edge_start(ends.node1, ends.bus1, stub_end);
                let geometry = EdgeGeometry {
                    half1: Some(HalfEdge::new(vec![start, stub_end])),
                    half2: None,
                    fork_offset: None,
                    symbol: Some(EdgeSymbol::ThreeWindingLeg {
                        winding: point_at_angle(center, stub - radius, leg_angle),
                        radius,
                    }),
                };
                (e, geometry)
            })
            .collect()
    }

    /// Routes the self-loops of one node, avoiding the `existing` departure angles of its other
    /// edges.
    pub fn route_loops(&self, b: usize, existing: &[f64]) -> Vec<(EdgeIx, EdgeGeometry)> {
        let bundle = self.graph.bundle(b);
        let BundleKind::SelfLoop { node } = bundle.kind else {
            return Vec::new();
        };
        let center = self.graph.position(node);
        let aperture = self.params.loop_aperture_rad();
        let slots = allocate_loop_angles(existing, bundle.edges.len(), aperture);
        let radius = self.params.transformer_circle_radius;
        let control = self.params.loop_control_distance;
        let windings = |e: EdgeIx| self.graph.kind(e).has_windings();

        let mut out = Vec::with_capacity(bundle.edges.len());
        for (&e, &loop_angle) in bundle.edges.iter().zip(&slots) {
            let Some(ends) = self.graph.ends(e) else {
                continue;
            };
            let middle = point_at_angle(center, self.params.loop_distance, loop_angle);
            let half = |side: Side| {
                let sign = match side {
                    Side::One => -1.0,
                    Side::Two => 1.0,
                };
                let start_angle = loop_angle + sign * aperture / 2.0;
                let fork = point_at_angle(center, self.params.edges_fork_length, start_angle);
                let start = self.edge_start(node, ends.bus(side), fork);
                let end_angle = loop_angle + sign * PI / 2.0;
                let end = if windings(e) {
                    point_at_angle(middle, 1.5 * radius, end_angle)
                } else {
                    middle
                };
                HalfEdge::new(vec![
                    start,
                    point_at_angle(start, control, start_angle),
                    point_at_angle(end, control, end_angle),
                    end,
                ])
            };
            let half1 = half(Side::One);
            let half2 = half(Side::Two);

            let symbol = match self.graph.kind(e) {
                EdgeKind::TwoWindingTransformer | EdgeKind::PhaseShifter => {
                    let windings = [
                        point_towards(half1.end(), middle, radius),
                        point_towards(half2.end(), middle, radius),
                    ];
                    if *self.graph.kind(e) == EdgeKind::PhaseShifter {
                        Some(EdgeSymbol::PhaseShifter { windings, radius })
                    } else {
                        Some(EdgeSymbol::Transformer { windings, radius })
                    }
                }
                EdgeKind::Hvdc => {
                    let half_width = self.params.converter_station_width / 2.0;
                    Some(EdgeSymbol::ConverterStation {
                        from: point_at_angle(middle, half_width, loop_angle - PI / 2.0),
                        to: point_at_angle(middle, half_width, loop_angle + PI / 2.0),
                    })
                }
                EdgeKind::Line
                | EdgeKind::DanglingLine
                | EdgeKind::ThreeWindingTransformer
                | EdgeKind::Unknown(_) => None,
            };
            out.push((
                e,
                EdgeGeometry {
                    half1: Some(half1),
                    half2: Some(half2),
                    fork_offset: None,
                    symbol,
                },
            ));
        }
        out
    }
}

/// Point halfway along a polyline, with the index of the segment holding it.
fn half_length_point(polyline: &[Point]) -> (Point, usize) {
    let total: f64 = polyline.windows(2).map(|w| w[0].distance_to(w[1])).sum();
    let mut remaining = total / 2.0;
    for (i, w) in polyline.windows(2).enumerate() {
        let len = w[0].distance_to(w[1]);
        if remaining <= len {
            return (point_towards(w[0], w[1], remaining), i);
        }
        remaining -= len;
    }
    let last = polyline.len().saturating_sub(2);
    (polyline[polyline.len() - 1], last)
}

/// Point at `dist` along a polyline from its first point, clamped to its end.
pub(crate) fn point_along(points: &[Point], dist: f64) -> (Point, f64) {
    let mut remaining = dist;
    for w in points.windows(2) {
        let len = w[0].distance_to(w[1]);
        if remaining <= len {
            return (point_towards(w[0], w[1], remaining), angle(w[0], w[1]));
        }
        remaining -= len;
    }
    match points {
        [.., a, b] => (*b, angle(*a, *b)),
        [a] => (*a, 0.0),
        [] => (crate::geom::point(0.0, 0.0), 0.0),
    }
}
