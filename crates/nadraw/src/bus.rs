//! Bus ring radii and shapes.

use crate::path::bus_annulus_path;
use serde::Serialize;

/// Radii of one bus ring inside its voltage-level node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BusRadius {
    pub inner: f64,
    pub outer: f64,
    /// Radius of the whole voltage-level node.
    pub display: f64,
}

/// Radii for the bus at `index` among `nb_neighbours + 1` buses sharing a node.
///
/// The node radius is capped at twice `base_radius`; rings split it evenly, each shrunk by half of
/// `inter_annulus_space` on both sides except the innermost, which has no inner edge.
pub fn bus_radius(
    nb_neighbours: usize,
    index: usize,
    base_radius: f64,
    inter_annulus_space: f64,
) -> BusRadius {
    let rings = (nb_neighbours + 1) as f64;
    let display = base_radius * rings.clamp(1.0, 2.0);
    let unitary = display / rings;
    let inner = if index == 0 {
        0.0
    } else {
        index as f64 * unitary + inter_annulus_space / 2.0
    };
    BusRadius {
        inner,
        outer: (index + 1) as f64 * unitary - inter_annulus_space / 2.0,
        display,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BusShape {
    Circle { radius: f64 },
    Annulus { path: String },
}

/// Shape of one bus ring given the angles of the edges crossing it.
///
/// The innermost bus is a disc; any other ring is an annulus cut where edges pass through it.
pub fn bus_shape(radius: BusRadius, index: usize, crossing: &[f64], hollow_width: f64) -> BusShape {
    if index == 0 {
        return BusShape::Circle {
            radius: radius.outer,
        };
    }
    BusShape::Annulus {
        path: bus_annulus_path(crossing, radius.inner, radius.outer, hollow_width),
    }
}
