//! SVG path-string builders for bus rings and boundary nodes.
//!
//! Paths are expressed relative to the owning node's center; the renderer applies the node
//! translation. Numbers are written with three fixed decimals so identical inputs always produce
//! byte-identical strings.

use crate::geom::rad_to_deg;
use std::f64::consts::PI;
use std::fmt::Write as _;

pub(crate) fn fmt_fixed3_into(out: &mut String, v: f64) {
    // Anything that prints as `-0.000` is written as `0.000`.
    let v = if v.abs() < 0.0005 { 0.0 } else { v };
    let _ = write!(out, "{v:.3}");
}

pub fn fmt_fixed3(v: f64) -> String {
    let mut out = String::new();
    fmt_fixed3_into(&mut out, v);
    out
}

/// Writes `x0,y0 A r,r rot large sweep x1,y1` for a circular arc centered on the origin.
///
/// The caller prefixes the command letter (`M` or `L`). The large-arc flag is set when the swept
/// angle exceeds π; `clockwise` selects the SVG sweep flag.
pub fn arc_path_into(out: &mut String, radius: f64, start: f64, end: f64, clockwise: bool) {
    let sweep = end - start;
    let large_arc = if sweep.abs() > PI { 1 } else { 0 };
    fmt_fixed3_into(out, radius * start.cos());
    out.push(',');
    fmt_fixed3_into(out, radius * start.sin());
    out.push_str(" A");
    fmt_fixed3_into(out, radius);
    out.push(',');
    fmt_fixed3_into(out, radius);
    out.push(' ');
    fmt_fixed3_into(out, rad_to_deg(sweep));
    let _ = write!(out, " {large_arc} {} ", if clockwise { 1 } else { 0 });
    fmt_fixed3_into(out, radius * end.cos());
    out.push(',');
    fmt_fixed3_into(out, radius * end.sin());
}

pub fn arc_path(radius: f64, start: f64, end: f64, clockwise: bool) -> String {
    let mut out = String::new();
    arc_path_into(&mut out, radius, start, end, clockwise);
    out
}

/// One closed ring wedge per consecutive pair of `angles`.
///
/// `angles` is used as given: callers that want the wrap-around wedge append
/// `angles[0] + 2π` themselves (see [`bus_annulus_path`]). Each wedge leaves half of
/// `hollow_width` free at both ends, measured as arc length on the respective circle; wedges whose
/// span collapses are dropped.
pub fn fragmented_annulus_path(
    angles: &[f64],
    inner_radius: f64,
    outer_radius: f64,
    hollow_width: f64,
) -> String {
    let half_width = hollow_width / 2.0;
    let outer_delta = half_width / outer_radius;
    let inner_delta = half_width / inner_radius;

    let mut out = String::new();
    for pair in angles.windows(2) {
        let outer_start = pair[0] + outer_delta;
        let outer_end = pair[1] - outer_delta;
        let inner_start = pair[1] - inner_delta;
        let inner_end = pair[0] + inner_delta;
        if outer_end > outer_start && inner_end < inner_start {
            out.push('M');
            arc_path_into(&mut out, outer_radius, outer_start, outer_end, true);
            out.push_str(" L");
            arc_path_into(&mut out, inner_radius, inner_start, inner_end, false);
            out.push_str(" Z ");
        }
    }
    out
}

/// A complete ring. A single 360° arc cannot be expressed as one SVG arc segment, so each circle
/// is drawn as two half arcs.
pub fn full_annulus_path(inner_radius: f64, outer_radius: f64) -> String {
    let mut out = String::new();
    out.push('M');
    arc_path_into(&mut out, outer_radius, 0.0, PI, true);
    out.push_str(" A");
    half_arc_tail_into(&mut out, outer_radius, 1);
    out.push_str(" Z M");
    arc_path_into(&mut out, inner_radius, 0.0, -PI, false);
    out.push_str(" A");
    half_arc_tail_into(&mut out, inner_radius, 0);
    out.push_str(" Z");
    out
}

fn half_arc_tail_into(out: &mut String, radius: f64, sweep_flag: u8) {
    fmt_fixed3_into(out, radius);
    out.push(',');
    fmt_fixed3_into(out, radius);
    let _ = write!(out, " 180.000 0 {sweep_flag} ");
    fmt_fixed3_into(out, radius);
    out.push_str(",0.000");
}

/// Ring path for one bus given the tangent angles of the edges crossing it.
///
/// Sorts the angles, closes the circle and fragments; without crossing edges the ring is whole.
pub fn bus_annulus_path(
    crossing_angles: &[f64],
    inner_radius: f64,
    outer_radius: f64,
    hollow_width: f64,
) -> String {
    if crossing_angles.is_empty() {
        return full_annulus_path(inner_radius, outer_radius);
    }
    let mut angles: Vec<f64> = crossing_angles.to_vec();
    angles.sort_by(|a, b| a.total_cmp(b));
    angles.push(angles[0] + 2.0 * PI);
    fragmented_annulus_path(&angles, inner_radius, outer_radius, hollow_width)
}

/// Half circle facing `arrival_angle`, used for the boundary end of a dangling line.
pub fn boundary_semicircle_path(radius: f64, arrival_angle: f64) -> String {
    let start = arrival_angle - PI / 2.0;
    let mut out = String::from("M");
    arc_path_into(&mut out, radius, start, start + PI, true);
    out
}
