//! Street network components - nodes, edges, streets and points of interest.

use std::collections::BTreeSet;

use geo::Line;
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Coords};
use crate::{EdgeId, NodeId, PoiId, StreetId};

/// Per-node annotations from the map definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeFeatures {
    /// Node sits on the map border; border nodes are never dead ends.
    #[serde(default)]
    pub on_border: bool,
}

/// Per-edge annotations from the map definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeFeatures {
    #[serde(default)]
    pub roadwork: bool,
    #[serde(default)]
    pub slope: Option<String>,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub traffic_direction: Option<String>,
    #[serde(default)]
    pub bike_lane: bool,
    #[serde(default)]
    pub stairs: bool,
}

/// An intersection or dead end.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub coords: Coords,
    /// Names of the streets meeting at this node.
    pub streets: BTreeSet<String>,
    pub features: NodeFeatures,
}

impl Node {
    /// A dead end has exactly one adjacent street and does not sit on the
    /// map border (border nodes merely run off the map).
    pub fn is_dead_end(&self) -> bool {
        self.streets.len() == 1 && !self.features.on_border
    }

    pub fn description(&self) -> String {
        let streets: Vec<&str> = self.streets.iter().map(String::as_str).collect();
        if self.is_dead_end() {
            format!("the dead end of {}", streets.join(" and "))
        } else {
            format!("the intersection of {}", streets.join(" and "))
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// An oriented street segment between two distinct nodes.
#[derive(Debug, Clone)]
pub struct Edge {
    pub id: EdgeId,
    pub node1: NodeId,
    pub node2: NodeId,
    pub start: Coords,
    pub end: Coords,
    pub street: String,
    pub features: EdgeFeatures,
    /// Streets crossing this segment at either endpoint, filled at load.
    pub between_streets: BTreeSet<String>,
}

impl Edge {
    pub fn length(&self) -> f64 {
        geometry::distance(self.start, self.end)
    }

    pub fn line(&self) -> Line<f64> {
        Line::new(self.start.0, self.end.0)
    }

    /// Slope/intercept form of the supporting line. A vertical segment
    /// yields an infinite slope and its x coordinate as the intercept.
    pub fn line_equation(&self) -> (f64, f64) {
        let dx = self.end.x() - self.start.x();
        if dx == 0.0 {
            return (f64::INFINITY, self.start.x());
        }
        let slope = (self.end.y() - self.start.y()) / dx;
        (slope, self.start.y() - slope * self.start.x())
    }

    /// Unit vector from `start` towards `end`.
    pub fn direction(&self) -> Coords {
        geometry::normalize(self.end - self.start)
    }

    /// True when the perpendicular projection of `point` falls strictly
    /// between the endpoints.
    pub fn contains_projection(&self, point: Coords) -> bool {
        let (_, t) = geometry::project_onto(point, self.line());
        t > 0.0 && t < 1.0
    }

    /// Perpendicular distance when the projection is strictly interior,
    /// otherwise the distance to the nearer endpoint.
    pub fn distance_to(&self, point: Coords) -> f64 {
        geometry::distance(point, self.closest_point(point))
    }

    /// Point on the segment closest to `point`.
    pub fn closest_point(&self, point: Coords) -> Coords {
        let (projected, t) = geometry::project_onto(point, self.line());
        if t > 0.0 && t < 1.0 {
            projected
        } else if geometry::distance(point, self.start) <= geometry::distance(point, self.end) {
            self.start
        } else {
            self.end
        }
    }

    pub fn description(&self) -> String {
        let crossing: Vec<&str> = self.between_streets.iter().map(String::as_str).collect();
        match crossing.len() {
            0 => format!("on {}", self.street),
            1 => format!("on {}, near {}", self.street, crossing[0]),
            _ => format!(
                "on {}, between {} and {}",
                self.street, crossing[0], crossing[1]
            ),
        }
    }
}

/// A named ordered run of edges.
#[derive(Debug, Clone)]
pub struct Street {
    pub id: StreetId,
    pub name: String,
    pub edges: Vec<EdgeId>,
}

/// A point of interest anchored to an edge.
#[derive(Debug, Clone)]
pub struct Poi {
    pub id: PoiId,
    pub name: String,
    pub coords: Coords,
    pub edge: EdgeId,
    /// Free-form attribute bag from the map definition.
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Gates exposure to the assistant layer, nothing else.
    pub enabled: bool,
}

impl Poi {
    /// Plain point distance; a PoI occupies a point, not its anchor edge.
    pub fn distance_to(&self, point: Coords) -> f64 {
        geometry::distance(self.coords, point)
    }

    pub fn description(&self) -> String {
        format!("at {}", self.name)
    }
}

/// A resolved place on the graph. "Nothing resolved" is `Option::None`
/// at the call sites; every variant here is a real element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphElement {
    Node(NodeId),
    Edge(EdgeId),
    Poi(PoiId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    fn edge(start: (f64, f64), end: (f64, f64)) -> Edge {
        Edge {
            id: 0,
            node1: 0,
            node2: 1,
            start: Point::new(start.0, start.1),
            end: Point::new(end.0, end.1),
            street: "Broadway".to_string(),
            features: EdgeFeatures::default(),
            between_streets: BTreeSet::new(),
        }
    }

    #[test]
    fn interior_projection_uses_perpendicular_distance() {
        let e = edge((0.0, 0.0), (100.0, 0.0));
        assert!(e.contains_projection(Point::new(40.0, 7.0)));
        assert!((e.distance_to(Point::new(40.0, 7.0)) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn exterior_projection_uses_nearer_endpoint() {
        let e = edge((0.0, 0.0), (100.0, 0.0));
        let p = Point::new(103.0, 4.0);
        assert!(!e.contains_projection(p));
        assert!((e.distance_to(p) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn endpoint_projection_is_not_interior() {
        let e = edge((0.0, 0.0), (100.0, 0.0));
        assert!(!e.contains_projection(Point::new(0.0, 3.0)));
        assert!(!e.contains_projection(Point::new(100.0, 3.0)));
    }

    #[test]
    fn vertical_line_equation() {
        let e = edge((5.0, 0.0), (5.0, 50.0));
        let (slope, intercept) = e.line_equation();
        assert!(slope.is_infinite());
        assert!((intercept - 5.0).abs() < 1e-9);
    }

    #[test]
    fn sloped_line_equation() {
        let e = edge((0.0, 1.0), (2.0, 5.0));
        let (slope, intercept) = e.line_equation();
        assert!((slope - 2.0).abs() < 1e-9);
        assert!((intercept - 1.0).abs() < 1e-9);
    }

    #[test]
    fn dead_end_requires_single_street_off_border() {
        let mut node = Node {
            id: 0,
            coords: Point::new(0.0, 0.0),
            streets: BTreeSet::from(["Broadway".to_string()]),
            features: NodeFeatures::default(),
        };
        assert!(node.is_dead_end());
        node.features.on_border = true;
        assert!(!node.is_dead_end());
        node.features.on_border = false;
        node.streets.insert("Pacific".to_string());
        assert!(!node.is_dead_end());
    }

    #[test]
    fn node_equality_by_id() {
        let a = Node {
            id: 3,
            coords: Point::new(0.0, 0.0),
            streets: BTreeSet::new(),
            features: NodeFeatures::default(),
        };
        let b = Node {
            id: 3,
            coords: Point::new(9.0, 9.0),
            streets: BTreeSet::from(["Pierce".to_string()]),
            features: NodeFeatures::default(),
        };
        assert_eq!(a, b);
    }
}
