//! Voltage-level labels and their connector lines.

use crate::geom::{Point, Vector, angle, point, point_towards, round2, vector};
use crate::model::TextNodeMetadata;
use serde::Serialize;
use std::f64::consts::FRAC_PI_4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNodeGeometry {
    /// Top-left corner of the label box.
    pub position: Point,
    /// From the node's outline to the anchor on the label box.
    pub connector: [Point; 2],
}

/// Label position and connector, from metadata shifts only.
pub fn text_node_geometry(
    center: Point,
    node_radius: f64,
    text: &TextNodeMetadata,
) -> TextNodeGeometry {
    let position = center + vector(text.shift_x, text.shift_y);
    let anchor = position + vector(text.connection_shift_x, text.connection_shift_y);
    TextNodeGeometry {
        position,
        connector: [point_towards(center, anchor, node_radius), anchor],
    }
}

/// Connector anchor on a `width × height` box whose top-left corner is `position`, relative to
/// that corner, picked from where the box sits around `center`:
/// right of the node → middle of the left side, below → middle of the top side,
/// above → middle of the bottom side, left → middle of the right side.
pub fn connection_shift(center: Point, position: Point, width: f64, height: f64) -> Vector {
    let box_center = point(position.x + width / 2.0, position.y + height / 2.0);
    let a = angle(center, box_center);
    if (-FRAC_PI_4..=FRAC_PI_4).contains(&a) {
        vector(0.0, height / 2.0)
    } else if a > FRAC_PI_4 && a < 3.0 * FRAC_PI_4 {
        vector(width / 2.0, 0.0)
    } else if a < -FRAC_PI_4 && a > -3.0 * FRAC_PI_4 {
        vector(width / 2.0, height)
    } else {
        vector(width, height / 2.0)
    }
}

/// Stores a new label position as shifts relative to `center`, re-picking the connector anchor.
pub(crate) fn apply_label_position(
    text: &mut TextNodeMetadata,
    center: Point,
    position: Point,
    width: f64,
    height: f64,
) {
    text.shift_x = round2(position.x - center.x);
    text.shift_y = round2(position.y - center.y);
    let stored = center + vector(text.shift_x, text.shift_y);
    let conn = connection_shift(center, stored, width, height);
    text.connection_shift_x = round2(conn.x);
    text.connection_shift_y = round2(conn.y);
}
