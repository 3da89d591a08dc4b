//! Small 2D helpers over `geo` primitives.
//!
//! Map coordinates are feet after pixel conversion. All helpers are plain
//! functions; the crate carries no vector type of its own.

use geo::{Coord, Line, Point};

/// Map coordinates in feet.
pub type Coords = Point<f64>;

/// Origin sentinel.
pub const ZERO: Coords = Point(Coord { x: 0.0, y: 0.0 });

/// Euclidean distance between two points.
pub fn distance(a: Coords, b: Coords) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

/// Manhattan (taxicab) distance between two points.
pub fn manhattan_distance(a: Coords, b: Coords) -> f64 {
    (a.x() - b.x()).abs() + (a.y() - b.y()).abs()
}

/// Length of a vector interpreted from the origin.
pub fn norm(v: Coords) -> f64 {
    v.x().hypot(v.y())
}

/// Unit vector in the direction of `v`, or `ZERO` for a zero vector.
pub fn normalize(v: Coords) -> Coords {
    let len = norm(v);
    if len == 0.0 { ZERO } else { v / len }
}

pub fn dot(a: Coords, b: Coords) -> f64 {
    a.x() * b.x() + a.y() * b.y()
}

/// Projection of `point` onto the infinite line through `line`.
///
/// Returns the projected point and the parameter `t` along the segment
/// (`t == 0` at `line.start`, `t == 1` at `line.end`). A degenerate
/// segment projects onto its start with `t == 0`.
pub fn project_onto(point: Coords, line: Line<f64>) -> (Coords, f64) {
    let start: Coords = line.start.into();
    let end: Coords = line.end.into();
    let axis = end - start;
    let len_sq = dot(axis, axis);
    if len_sq == 0.0 {
        return (start, 0.0);
    }
    let t = dot(point - start, axis) / len_sq;
    (start + axis * t, t)
}
