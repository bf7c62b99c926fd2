//! Live network state pushed over a loaded diagram.
//!
//! Flow values, per-side connectivity and bus voltages only change what is displayed. The one
//! topology-changing request, bus reassignment, is validated against the edge's voltage level and
//! reroutes that edge's bundle; node coordinates are never touched.

use crate::diagram::Diagram;
use crate::error::{Diagnostic, Error, Result};
use crate::geom::{Point, rad_to_deg};
use crate::graph::{BusIx, EdgeIx};
use crate::model::Side;
use crate::redraw::RedrawReport;
use crate::route::point_along;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// State of one branch, keyed by equipment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchState {
    pub branch_id: String,
    #[serde(default)]
    pub value1: Option<f64>,
    #[serde(default)]
    pub value2: Option<f64>,
    #[serde(default = "connected")]
    pub connected1: bool,
    #[serde(default = "connected")]
    pub connected2: bool,
    /// Equipment id of the bus side 1 is now connected to.
    #[serde(default)]
    pub connected_bus1: Option<String>,
    #[serde(default)]
    pub connected_bus2: Option<String>,
}

fn connected() -> bool {
    true
}

/// Voltage and angle of one bus, keyed by bus equipment id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusState {
    pub bus_id: String,
    pub voltage: f64,
    pub angle: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowDirection {
    /// Towards the branch, out of the node.
    Out,
    In,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SideState {
    value: Option<f64>,
    connected: bool,
}

impl Default for SideState {
    fn default() -> Self {
        Self {
            value: None,
            connected: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Overlay {
    branches: FxHashMap<EdgeIx, [SideState; 2]>,
    buses: FxHashMap<BusIx, (f64, f64)>,
}

/// Arrow/label placement on one half-edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeInfo {
    pub position: Point,
    /// Degrees, tangent to the half-edge at `position`.
    pub rotation: f64,
    pub direction: Option<FlowDirection>,
    pub label: String,
    pub connected: bool,
}

fn side_slot(side: Side) -> usize {
    match side {
        Side::One => 0,
        Side::Two => 1,
    }
}

impl Diagram {
    /// Applies branch values and connectivity; a `connectedBus` entry triggers a reassignment.
    ///
    /// Branches naming no edge are ignored. Rejected reassignments are recorded as diagnostics and
    /// leave the other fields applied.
    pub fn set_branch_states(&mut self, states: &[BranchState]) -> RedrawReport {
        let mut report = RedrawReport::default();
        for state in states {
            let edges: Vec<EdgeIx> = self.graph.edges_by_equipment(&state.branch_id).to_vec();
            for e in edges {
                self.overlay.branches.insert(
                    e,
                    [
                        SideState {
                            value: state.value1,
                            connected: state.connected1,
                        },
                        SideState {
                            value: state.value2,
                            connected: state.connected2,
                        },
                    ],
                );
                for (side, bus) in [
                    (Side::One, &state.connected_bus1),
                    (Side::Two, &state.connected_bus2),
                ] {
                    let Some(bus) = bus else {
                        continue;
                    };
                    let Some(b) = self.graph.bus_ix_by_equipment(bus) else {
                        self.report(Diagnostic::MissingMetadata {
                            edge_id: self.graph.metadata().edges[e].svg_id.clone(),
                            reference: bus.clone(),
                        });
                        continue;
                    };
                    if let Ok(r) = self.reassign_bus_ix(e, side, b) {
                        merge(&mut report, r);
                    }
                }
            }
        }
        report
    }

    pub fn set_bus_states(&mut self, states: &[BusState]) {
        for state in states {
            if let Some(b) = self.graph.bus_ix_by_equipment(&state.bus_id) {
                self.overlay.buses.insert(b, (state.voltage, state.angle));
            }
        }
    }

    /// Moves one side of an edge onto another bus of the same voltage level.
    pub fn reassign_bus(&mut self, edge_id: &str, side: Side, bus_id: &str) -> Result<RedrawReport> {
        let e = self.edge_ix(edge_id)?;
        let b = self
            .graph
            .bus_ix(bus_id)
            .ok_or_else(|| Error::UnknownBusNode {
                id: bus_id.to_string(),
            })?;
        self.reassign_bus_ix(e, side, b)
    }

    fn reassign_bus_ix(&mut self, e: EdgeIx, side: Side, b: BusIx) -> Result<RedrawReport> {
        let meta = self.graph.metadata();
        let Some(ends) = self.graph.ends(e) else {
            return Err(Error::UnknownEdge {
                id: meta.edges[e].svg_id.clone(),
            });
        };
        let current_level = match ends.bus(side) {
            Some(current) => self.graph.bus_owner(current),
            None => Some(ends.node(side)),
        };
        if current_level.is_none() || self.graph.bus_owner(b) != current_level {
            let d = Diagnostic::InvalidTargetBus {
                edge_id: meta.edges[e].svg_id.clone(),
                side,
                bus_id: meta.bus_nodes[b].svg_id.clone(),
            };
            self.report(d.clone());
            return Err(d.into());
        }
        if ends.bus(side) == Some(b) {
            return Ok(RedrawReport::default());
        }

        self.graph.set_bus(e, side, b);
        tracing::debug!(
            edge_id = %self.graph.metadata().edges[e].svg_id,
            ?side,
            bus_id = %self.graph.metadata().bus_nodes[b].svg_id,
            "bus reassigned"
        );
        let Some(bundle) = self.graph.bundle_of_edge(e) else {
            return Ok(RedrawReport::default());
        };
        let seeds = self.graph.bundle_nodes(bundle);
        if self.graph.bundle(bundle).is_loop() {
            Ok(self.redraw_bundles(&seeds, &[]))
        } else {
            Ok(self.redraw_bundles(&seeds, &[bundle]))
        }
    }

    /// Arrow and label placement for one half-edge, from the current geometry and overlay.
    pub fn edge_info(&self, edge_id: &str, side: Side) -> Result<Option<EdgeInfo>> {
        let e = self.edge_ix(edge_id)?;
        let Some(half) = self.edges[e].as_ref().and_then(|g| g.half(side)) else {
            return Ok(None);
        };
        let state = self
            .overlay
            .branches
            .get(&e)
            .map(|s| s[side_slot(side)])
            .unwrap_or_default();
        let (position, tangent) = point_along(&half.points, self.params.arrow_shift);
        let direction = state.value.and_then(|v| {
            if v > 0.0 {
                Some(FlowDirection::Out)
            } else if v < 0.0 {
                Some(FlowDirection::In)
            } else {
                None
            }
        });
        let precision = self.params.flow_precision;
        Ok(Some(EdgeInfo {
            position,
            rotation: rad_to_deg(tangent),
            direction,
            label: state
                .value
                .map(|v| format!("{:.*}", precision, v.abs()))
                .unwrap_or_default(),
            connected: state.connected,
        }))
    }

    /// `"<voltage> kV / <angle>°"` for a bus with pushed state.
    pub fn bus_legend(&self, bus_id: &str) -> Result<Option<String>> {
        let b = self
            .graph
            .bus_ix(bus_id)
            .ok_or_else(|| Error::UnknownBusNode {
                id: bus_id.to_string(),
            })?;
        Ok(self.overlay.buses.get(&b).map(|(v, a)| {
            format!(
                "{:.*} kV / {:.*}°",
                self.params.voltage_precision, v, self.params.angle_precision, a
            )
        }))
    }
}

fn merge(into: &mut RedrawReport, from: RedrawReport) {
    into.edges.extend(from.edges);
    into.buses.extend(from.buses);
    into.text_nodes.extend(from.text_nodes);
    for (e, side, a) in from.angles.iter() {
        into.angles.insert(e, side, a);
    }
}
