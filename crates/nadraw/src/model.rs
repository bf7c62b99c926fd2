//! Diagram metadata: the durable part of a diagram.
//!
//! Mirrors the JSON metadata document shipped next to the rendered diagram. Only these records
//! are ever written back (node coordinates, text-node shifts, bus references); every piece of
//! geometry is derived from them.

use crate::error::{Error, Result};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramMetadata {
    #[serde(default)]
    pub nodes: Vec<NodeMetadata>,
    #[serde(default)]
    pub bus_nodes: Vec<BusNodeMetadata>,
    #[serde(default)]
    pub edges: Vec<EdgeMetadata>,
    #[serde(default)]
    pub text_nodes: Vec<TextNodeMetadata>,
    /// Layout/display parameter block, see [`crate::config::DiagramParameters`].
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub svg_parameters: Value,
}

impl DiagramMetadata {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Rejects documents no diagram can be built from: duplicate svg ids within one table, or
    /// non-finite node coordinates. Dangling references are not errors here; they only cost the
    /// edge that carries them.
    pub fn validate(&self) -> Result<()> {
        fn unique<'a>(table: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
            let mut seen = FxHashSet::default();
            for id in ids {
                if !seen.insert(id) {
                    return Err(Error::InvalidMetadata {
                        message: format!("duplicate {table} svgId {id:?}"),
                    });
                }
            }
            Ok(())
        }
        unique("node", self.nodes.iter().map(|n| n.svg_id.as_str()))?;
        unique("bus node", self.bus_nodes.iter().map(|b| b.svg_id.as_str()))?;
        unique("edge", self.edges.iter().map(|e| e.svg_id.as_str()))?;
        unique("text node", self.text_nodes.iter().map(|t| t.svg_id.as_str()))?;
        if let Some(node) = self
            .nodes
            .iter()
            .find(|n| !n.x.is_finite() || !n.y.is_finite())
        {
            return Err(Error::InvalidMetadata {
                message: format!("node {:?} has non-finite coordinates", node.svg_id),
            });
        }
        Ok(())
    }
}

/// A voltage-level node, or a fictitious/boundary/three-terminal anchor node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub svg_id: String,
    #[serde(default)]
    pub equipment_id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub fictitious: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusNodeMetadata {
    pub svg_id: String,
    #[serde(default)]
    pub equipment_id: String,
    pub nb_neighbours: usize,
    pub index: usize,
    /// Owning voltage-level node.
    pub vl_node: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetadata {
    pub svg_id: String,
    #[serde(default)]
    pub equipment_id: String,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    pub node1: String,
    pub node2: String,
    /// Empty when the bus is unknown.
    #[serde(default)]
    pub bus_node1: String,
    #[serde(default)]
    pub bus_node2: String,
    /// User bend points, in diagram coordinates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<PointMetadata>,
}

impl EdgeMetadata {
    pub fn node(&self, side: Side) -> &str {
        match side {
            Side::One => &self.node1,
            Side::Two => &self.node2,
        }
    }

    pub fn bus_node(&self, side: Side) -> &str {
        match side {
            Side::One => &self.bus_node1,
            Side::Two => &self.bus_node2,
        }
    }

    pub(crate) fn bus_node_mut(&mut self, side: Side) -> &mut String {
        match side {
            Side::One => &mut self.bus_node1,
            Side::Two => &mut self.bus_node2,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.node1 == self.node2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMetadata {
    pub x: f64,
    pub y: f64,
}

/// Label attached to one voltage-level node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNodeMetadata {
    pub svg_id: String,
    #[serde(default)]
    pub equipment_id: String,
    pub vl_node: String,
    /// Label box top-left corner relative to the node center.
    pub shift_x: f64,
    pub shift_y: f64,
    /// Connector anchor relative to the label box top-left corner.
    #[serde(default)]
    pub connection_shift_x: f64,
    #[serde(default)]
    pub connection_shift_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// Closed set of edge kinds; every drawing path matches on it exhaustively.
///
/// Tags read from metadata that name no known kind are kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeKind {
    Line,
    TwoWindingTransformer,
    PhaseShifter,
    /// One leg of a three-winding transformer; `node2` is the transformer anchor node.
    ThreeWindingTransformer,
    Hvdc,
    /// `node2` is the boundary node.
    DanglingLine,
    Unknown(String),
}

impl Default for EdgeKind {
    fn default() -> Self {
        EdgeKind::Unknown(String::new())
    }
}

impl From<String> for EdgeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "LineEdge" => EdgeKind::Line,
            "TwoWtEdge" => EdgeKind::TwoWindingTransformer,
            "PhaseShiftTransformerEdge" => EdgeKind::PhaseShifter,
            "ThreeWtEdge" => EdgeKind::ThreeWindingTransformer,
            "HvdcLineEdge" => EdgeKind::Hvdc,
            "DanglingLineEdge" => EdgeKind::DanglingLine,
            _ => EdgeKind::Unknown(tag),
        }
    }
}

impl From<EdgeKind> for String {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Line => "LineEdge".to_string(),
            EdgeKind::TwoWindingTransformer => "TwoWtEdge".to_string(),
            EdgeKind::PhaseShifter => "PhaseShiftTransformerEdge".to_string(),
            EdgeKind::ThreeWindingTransformer => "ThreeWtEdge".to_string(),
            EdgeKind::Hvdc => "HvdcLineEdge".to_string(),
            EdgeKind::DanglingLine => "DanglingLineEdge".to_string(),
            EdgeKind::Unknown(tag) => tag,
        }
    }
}

impl EdgeKind {
    /// Kinds whose half-edges stop short of the midpoint to leave room for winding circles.
    pub fn has_windings(&self) -> bool {
        matches!(
            self,
            EdgeKind::TwoWindingTransformer | EdgeKind::PhaseShifter
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::One, Side::Two];

    pub fn opposite(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}
