//! Point and angle helpers shared by the router, the redraw engine and the path builders.
//!
//! Angles are radians in SVG screen space (y grows downwards), normalized to `(-π, π]`.

use std::f64::consts::PI;

pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

pub fn distance(a: Point, b: Point) -> f64 {
    a.distance_to(b)
}

pub fn midpoint(a: Point, b: Point) -> Point {
    a.lerp(b, 0.5)
}

/// Point at `dist` from `from`, walking towards `towards`.
///
/// A zero-length segment yields `from` unchanged.
pub fn point_towards(from: Point, towards: Point, dist: f64) -> Point {
    let len = distance(from, towards);
    if len == 0.0 || !len.is_finite() {
        return from;
    }
    from + (towards - from) * (dist / len)
}

/// Polar offset: the point at `dist` from `from` in direction `angle`.
pub fn point_at_angle(from: Point, dist: f64, angle: f64) -> Point {
    from + vector(dist * angle.cos(), dist * angle.sin())
}

/// Folds any finite angle into `(-π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}

/// Direction from `a` to `b`, or `None` when both points coincide.
pub fn try_angle(a: Point, b: Point) -> Option<f64> {
    let d = b - a;
    if d.x == 0.0 && d.y == 0.0 {
        return None;
    }
    Some(normalize_angle(d.y.atan2(d.x)))
}

/// Direction from `a` to `b`; coincident points have direction 0.
pub fn angle(a: Point, b: Point) -> f64 {
    try_angle(a, b).unwrap_or(0.0)
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Rounds to two decimals, the precision stored back into diagram metadata.
pub fn round2(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 { 0.0 } else { r }
}

pub fn round_point(p: Point) -> Point {
    point(round2(p.x), round2(p.y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_minus_pi_to_pi() {
        assert_eq!(normalize_angle(-PI), PI);
        assert_eq!(normalize_angle(PI), PI);
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-2.5 * PI) + 0.5 * PI).abs() < 1e-12);
    }

    #[test]
    fn horizontal_reverse_angle_is_pi() {
        assert_eq!(angle(point(1.0, 0.0), point(0.0, 0.0)), PI);
        assert_eq!(angle(point(0.0, 0.0), point(1.0, 0.0)), 0.0);
    }

    #[test]
    fn coincident_points_have_no_direction() {
        let p = point(3.0, 4.0);
        assert_eq!(try_angle(p, p), None);
        assert_eq!(angle(p, p), 0.0);
        assert_eq!(point_towards(p, p, 10.0), p);
    }

    #[test]
    fn round2_drops_negative_zero() {
        assert_eq!(round2(-0.001).to_bits(), 0.0f64.to_bits());
        assert_eq!(round2(-395.1338734), -395.13);
    }
}
