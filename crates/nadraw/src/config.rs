//! Layout and display parameters.
//!
//! Read from the metadata's `svgParameters` block. Every key is optional: a missing or
//! non-numeric value keeps its default, so older metadata documents still load.

use crate::geom::deg_to_rad;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramParameters {
    pub voltage_level_circle_radius: f64,
    pub fictitious_voltage_level_circle_radius: f64,
    pub inter_annulus_space: f64,
    pub node_hollow_width: f64,
    pub edge_start_shift: f64,
    pub unknown_bus_node_extra_radius: f64,
    pub edges_fork_length: f64,
    /// Degrees.
    pub edges_fork_aperture: f64,
    pub loop_distance: f64,
    /// Degrees.
    pub loop_edges_aperture: f64,
    pub loop_control_distance: f64,
    pub transformer_circle_radius: f64,
    pub three_wt_stub_length: f64,
    pub converter_station_width: f64,
    pub arrow_shift: f64,
    pub text_node_width: f64,
    pub text_node_height: f64,
    pub flow_precision: usize,
    pub voltage_precision: usize,
    pub angle_precision: usize,
}

impl Default for DiagramParameters {
    fn default() -> Self {
        Self {
            voltage_level_circle_radius: 30.0,
            fictitious_voltage_level_circle_radius: 15.0,
            inter_annulus_space: 5.0,
            node_hollow_width: 15.0,
            edge_start_shift: 0.0,
            unknown_bus_node_extra_radius: 10.0,
            edges_fork_length: 80.0,
            edges_fork_aperture: 60.0,
            loop_distance: 120.0,
            loop_edges_aperture: 60.0,
            loop_control_distance: 40.0,
            transformer_circle_radius: 20.0,
            three_wt_stub_length: 32.0,
            converter_station_width: 70.0,
            arrow_shift: 30.0,
            text_node_width: 100.0,
            text_node_height: 40.0,
            flow_precision: 0,
            voltage_precision: 1,
            angle_precision: 1,
        }
    }
}

fn json_f64(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_i64().map(|n| n as f64))
        .or_else(|| v.as_u64().map(|n| n as f64))
        .filter(|n| n.is_finite())
}

fn config_f64(cfg: &Value, path: &[&str]) -> Option<f64> {
    let mut cur = cfg;
    for key in path {
        cur = cur.get(*key)?;
    }
    json_f64(cur)
}

/// Upper bound for the `*Precision` keys.
pub const MAX_PRECISION: usize = 10;

fn config_usize(cfg: &Value, path: &[&str]) -> Option<usize> {
    config_f64(cfg, path)
        .filter(|n| *n >= 0.0)
        .map(|n| n as usize)
}

fn config_positive(cfg: &Value, path: &[&str]) -> Option<f64> {
    config_f64(cfg, path).filter(|n| *n > 0.0)
}

impl DiagramParameters {
    /// Defaults overridden by whatever `cfg` provides.
    pub fn from_config(cfg: &Value) -> Self {
        let d = Self::default();
        let f = |key: &str, default: f64| config_f64(cfg, &[key]).unwrap_or(default);
        // Zero or negative apertures and lengths keep their defaults.
        let pos = |key: &str, default: f64| config_positive(cfg, &[key]).unwrap_or(default);
        let u = |key: &str, default: usize| {
            config_usize(cfg, &[key])
                .unwrap_or(default)
                .min(MAX_PRECISION)
        };
        Self {
            voltage_level_circle_radius: f("voltageLevelCircleRadius", d.voltage_level_circle_radius),
            fictitious_voltage_level_circle_radius: f(
                "fictitiousVoltageLevelCircleRadius",
                d.fictitious_voltage_level_circle_radius,
            ),
            inter_annulus_space: f("interAnnulusSpace", d.inter_annulus_space),
            node_hollow_width: f("nodeHollowWidth", d.node_hollow_width),
            edge_start_shift: f("edgeStartShift", d.edge_start_shift),
            unknown_bus_node_extra_radius: f(
                "unknownBusNodeExtraRadius",
                d.unknown_bus_node_extra_radius,
            ),
            edges_fork_length: pos("edgesForkLength", d.edges_fork_length),
            edges_fork_aperture: pos("edgesForkAperture", d.edges_fork_aperture),
            loop_distance: pos("loopDistance", d.loop_distance),
            loop_edges_aperture: pos("loopEdgesAperture", d.loop_edges_aperture),
            loop_control_distance: f("loopControlDistance", d.loop_control_distance),
            transformer_circle_radius: f("transformerCircleRadius", d.transformer_circle_radius),
            three_wt_stub_length: f("threeWtStubLength", d.three_wt_stub_length),
            converter_station_width: f("converterStationWidth", d.converter_station_width),
            arrow_shift: f("arrowShift", d.arrow_shift),
            text_node_width: f("textNodeWidth", d.text_node_width),
            text_node_height: f("textNodeHeight", d.text_node_height),
            flow_precision: u("flowPrecision", d.flow_precision),
            voltage_precision: u("voltagePrecision", d.voltage_precision),
            angle_precision: u("anglePrecision", d.angle_precision),
        }
    }

    pub fn fork_aperture_rad(&self) -> f64 {
        deg_to_rad(self.edges_fork_aperture)
    }

    pub fn loop_aperture_rad(&self) -> f64 {
        deg_to_rad(self.loop_edges_aperture)
    }
}
