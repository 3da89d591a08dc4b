//! Waypoint-following guidance with turn instructions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use log::debug;

use super::{NavState, Navigator, NavigatorConfig};
use crate::geometry;
use crate::model::{Graph, GraphElement};
use crate::nav::events::NavigationEvent;
use crate::nav::waypoint::WayPoint;
use crate::position::{MovementDirection, PositionInfo};

/// Follows an ordered waypoint list, detecting arrival, lingering,
/// stalls (which request a reroute) and wrong-direction movement.
///
/// Ticks with no resolved graph element are skipped without resetting
/// progress, so short sensor gaps are harmless.
pub struct StreetByStreetNavigator {
    graph: Arc<Graph>,
    waypoints: VecDeque<WayPoint>,
    config: NavigatorConfig,
    state: NavState,
    /// Arrival at the current waypoint has been announced.
    at_waypoint: bool,
    arrived_at: Option<Instant>,
    stall_since: Instant,
    /// A reroute was requested; updates are suppressed until a new
    /// navigator replaces this one.
    waiting_for_route: bool,
    last_element: Option<GraphElement>,
    recent_distances: VecDeque<f64>,
    wrong_direction_armed: bool,
}

impl StreetByStreetNavigator {
    pub fn new(graph: Arc<Graph>, waypoints: Vec<WayPoint>, config: NavigatorConfig) -> Self {
        Self {
            graph,
            waypoints: waypoints.into(),
            config,
            state: NavState::Idle,
            at_waypoint: false,
            arrived_at: None,
            stall_since: Instant::now(),
            waiting_for_route: false,
            last_element: None,
            recent_distances: VecDeque::new(),
            wrong_direction_armed: true,
        }
    }

    /// Network distance to the waypoint, Euclidean when disconnected.
    fn distance_to_waypoint(&self, position: &PositionInfo, waypoint: &WayPoint) -> f64 {
        self.graph
            .distance_between(position.real_position, waypoint.coords)
            .unwrap_or_else(|_| geometry::distance(position.real_position, waypoint.coords))
    }

    fn rolling_average(&self) -> Option<f64> {
        if self.recent_distances.is_empty() {
            return None;
        }
        Some(self.recent_distances.iter().sum::<f64>() / self.recent_distances.len() as f64)
    }

    fn push_distance(&mut self, distance: f64) {
        if self.recent_distances.len() == self.config.rolling_window {
            self.recent_distances.pop_front();
        }
        self.recent_distances.push_back(distance);
    }
}

impl Navigator for StreetByStreetNavigator {
    fn start(&mut self) -> Vec<NavigationEvent> {
        if self.state != NavState::Idle {
            return Vec::new();
        }
        let Some(first) = self.waypoints.front() else {
            self.state = NavState::Reached;
            return vec![NavigationEvent::DestinationReached {
                waypoint: WayPoint::none(),
            }];
        };
        self.state = NavState::Running;
        self.stall_since = Instant::now();
        vec![NavigationEvent::AnnounceDirection {
            instructions: first.instructions.clone(),
        }]
    }

    fn update(
        &mut self,
        position: &PositionInfo,
        ignore_not_moving: bool,
    ) -> Vec<NavigationEvent> {
        if !self.is_running() {
            return Vec::new();
        }

        let element_changed =
            position.element.is_some() && position.element != self.last_element;
        if ignore_not_moving || element_changed || position.movement != MovementDirection::None {
            self.stall_since = Instant::now();
        }
        if let Some(element) = position.element {
            self.last_element = Some(element);
        }

        // Sensor gap or pending reroute: skip the tick, keep progress.
        if position.element.is_none() || self.waiting_for_route {
            return Vec::new();
        }

        let Some(waypoint) = self.waypoints.front().cloned() else {
            return Vec::new();
        };
        let distance = self.distance_to_waypoint(position, &waypoint);

        if distance <= self.config.waypoint_threshold {
            if self.waypoints.len() == 1 {
                self.state = NavState::Reached;
                return vec![NavigationEvent::DestinationReached { waypoint }];
            }
            if !self.at_waypoint {
                self.at_waypoint = true;
                self.arrived_at = Some(Instant::now());
                return vec![NavigationEvent::WaypointReached { waypoint }];
            }
            let lingered = self
                .arrived_at
                .is_some_and(|at| at.elapsed() >= self.config.dwell_interval);
            if lingered {
                self.waypoints.pop_front();
                self.at_waypoint = false;
                self.arrived_at = None;
                self.recent_distances.clear();
                self.stall_since = Instant::now();
                debug!("waypoint advanced, {} remaining", self.waypoints.len());
                if let Some(next) = self.waypoints.front() {
                    return vec![NavigationEvent::AnnounceDirection {
                        instructions: next.instructions.clone(),
                    }];
                }
            }
            return Vec::new();
        }

        self.at_waypoint = false;
        self.arrived_at = None;

        if self.stall_since.elapsed() >= self.config.dwell_interval {
            if let Some(destination) = self.waypoints.back() {
                self.waiting_for_route = true;
                debug!("no progress for the dwell interval, requesting reroute");
                return vec![NavigationEvent::NewRoute {
                    start: position.real_position,
                    destination: destination.coords,
                }];
            }
        }

        let mut events = Vec::new();
        if position.movement != MovementDirection::None {
            if let Some(average) = self.rolling_average() {
                if distance > average + self.config.wrong_direction_margin {
                    if self.wrong_direction_armed {
                        self.wrong_direction_armed = false;
                        events.push(NavigationEvent::WrongDirection);
                    }
                } else if distance < average {
                    self.wrong_direction_armed = true;
                }
            }
        }
        self.push_distance(distance);
        events
    }

    fn is_running(&self) -> bool {
        self.state == NavState::Running && !self.waypoints.is_empty()
    }

    fn cancel(&mut self) {
        self.state = NavState::Cancelled;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use geo::Point;

    use super::*;
    use crate::model::definition::{
        EdgeDefinition, GraphDefinition, LatLngReference, NodeDefinition, ReferenceSystem,
        StreetDefinition,
    };
    use crate::position::info::DEFAULT_MAX_LIFE;

    /// One street running east through three nodes, 200 ft apart.
    fn test_graph() -> Arc<Graph> {
        let def = GraphDefinition {
            nodes: vec![
                NodeDefinition {
                    coords: [0.0, 0.0],
                    features: Default::default(),
                },
                NodeDefinition {
                    coords: [200.0, 0.0],
                    features: Default::default(),
                },
                NodeDefinition {
                    coords: [400.0, 0.0],
                    features: Default::default(),
                },
            ],
            edges: vec![
                EdgeDefinition {
                    nodes: [0, 1],
                    features: Default::default(),
                },
                EdgeDefinition {
                    nodes: [1, 2],
                    features: Default::default(),
                },
            ],
            streets: vec![StreetDefinition {
                name: "Broadway".to_string(),
                edges: vec![0, 1],
            }],
            pois: vec![],
            reference_system: ReferenceSystem {
                north: [0.0, 1.0],
                east: [1.0, 0.0],
                south: [0.0, -1.0],
                west: [-1.0, 0.0],
            },
            latlng_reference: LatLngReference {
                coords: [0.0, 0.0],
                lat: 37.79,
                lng: -122.44,
            },
        };
        Arc::new(Graph::from_definition(&def).unwrap())
    }

    fn config() -> NavigatorConfig {
        NavigatorConfig {
            waypoint_threshold: 40.0,
            dwell_interval: Duration::from_millis(40),
            wrong_direction_margin: 10.0,
            rolling_window: 3,
            ..NavigatorConfig::default()
        }
    }

    fn waypoints() -> Vec<WayPoint> {
        vec![
            WayPoint::new(Point::new(200.0, 0.0), "Continue to the intersection"),
            WayPoint::new(Point::new(400.0, 0.0), "Continue east to the destination"),
        ]
    }

    fn on_edge(x: f64, movement: MovementDirection) -> PositionInfo {
        let edge = if x < 200.0 { 0 } else { 1 };
        PositionInfo::new(
            Point::new(x, 0.0),
            Some(GraphElement::Edge(edge)),
            "on Broadway".to_string(),
            movement,
            0.0,
            DEFAULT_MAX_LIFE,
        )
    }

    fn unresolved(x: f64) -> PositionInfo {
        PositionInfo::new(
            Point::new(x, 0.0),
            None,
            String::new(),
            MovementDirection::None,
            0.0,
            DEFAULT_MAX_LIFE,
        )
    }

    #[test]
    fn start_announces_first_instruction() {
        let mut nav = StreetByStreetNavigator::new(test_graph(), waypoints(), config());
        let events = nav.start();
        assert_eq!(
            events,
            vec![NavigationEvent::AnnounceDirection {
                instructions: "Continue to the intersection".to_string()
            }]
        );
        assert!(nav.is_running());
    }

    #[test]
    fn empty_waypoints_reach_immediately() {
        let mut nav = StreetByStreetNavigator::new(test_graph(), vec![], config());
        let events = nav.start();
        assert!(matches!(
            events.as_slice(),
            [NavigationEvent::DestinationReached { .. }]
        ));
        assert!(!nav.is_running());
    }

    #[test]
    fn waypoint_linger_advances_to_next_instruction() {
        let mut nav = StreetByStreetNavigator::new(test_graph(), waypoints(), config());
        nav.start();

        // Within 40 ft of waypoint 1: first arrival announces it.
        let events = nav.update(&on_edge(170.0, MovementDirection::Forward), false);
        assert!(matches!(
            events.as_slice(),
            [NavigationEvent::WaypointReached { .. }]
        ));

        // Still there before the dwell interval: silent.
        assert!(nav.update(&on_edge(172.0, MovementDirection::None), false).is_empty());

        // Lingering past the dwell interval pops the waypoint and
        // announces the next instruction; no destination event yet.
        std::thread::sleep(Duration::from_millis(50));
        let events = nav.update(&on_edge(172.0, MovementDirection::None), false);
        assert_eq!(
            events,
            vec![NavigationEvent::AnnounceDirection {
                instructions: "Continue east to the destination".to_string()
            }]
        );
        assert!(nav.is_running());
    }

    #[test]
    fn last_waypoint_reaches_destination() {
        let mut nav = StreetByStreetNavigator::new(
            test_graph(),
            vec![WayPoint::new(Point::new(400.0, 0.0), "Continue east")],
            config(),
        );
        nav.start();
        let events = nav.update(&on_edge(380.0, MovementDirection::Forward), false);
        assert!(matches!(
            events.as_slice(),
            [NavigationEvent::DestinationReached { .. }]
        ));
        assert!(!nav.is_running());
        assert!(nav.update(&on_edge(380.0, MovementDirection::None), false).is_empty());
    }

    #[test]
    fn stationary_stall_requests_reroute_once() {
        let mut nav = StreetByStreetNavigator::new(test_graph(), waypoints(), config());
        nav.start();

        // Away from the waypoint, same element, not moving.
        assert!(nav.update(&on_edge(80.0, MovementDirection::None), false).is_empty());
        std::thread::sleep(Duration::from_millis(50));
        let events = nav.update(&on_edge(80.0, MovementDirection::None), false);
        assert_eq!(
            events,
            vec![NavigationEvent::NewRoute {
                start: Point::new(80.0, 0.0),
                destination: Point::new(400.0, 0.0),
            }]
        );

        // Further updates are suppressed until a new navigator arrives.
        std::thread::sleep(Duration::from_millis(50));
        assert!(nav.update(&on_edge(80.0, MovementDirection::None), false).is_empty());
        assert!(nav.update(&on_edge(170.0, MovementDirection::Forward), false).is_empty());
    }

    #[test]
    fn movement_resets_the_stall_timer() {
        let mut nav = StreetByStreetNavigator::new(test_graph(), waypoints(), config());
        nav.start();
        nav.update(&on_edge(80.0, MovementDirection::None), false);
        std::thread::sleep(Duration::from_millis(25));
        // Moving resets the timer; no reroute after the full interval.
        nav.update(&on_edge(90.0, MovementDirection::Forward), false);
        std::thread::sleep(Duration::from_millis(25));
        let events = nav.update(&on_edge(95.0, MovementDirection::Forward), false);
        assert!(!events.contains(&NavigationEvent::NewRoute {
            start: Point::new(95.0, 0.0),
            destination: Point::new(400.0, 0.0),
        }));
    }

    #[test]
    fn ignore_not_moving_suppresses_reroute() {
        let mut nav = StreetByStreetNavigator::new(test_graph(), waypoints(), config());
        nav.start();
        nav.update(&on_edge(80.0, MovementDirection::None), true);
        std::thread::sleep(Duration::from_millis(50));
        let events = nav.update(&on_edge(80.0, MovementDirection::None), true);
        assert!(events.is_empty());
    }

    #[test]
    fn sensor_gaps_do_not_reset_progress() {
        let mut nav = StreetByStreetNavigator::new(test_graph(), waypoints(), config());
        nav.start();
        let events = nav.update(&on_edge(170.0, MovementDirection::Forward), false);
        assert!(matches!(
            events.as_slice(),
            [NavigationEvent::WaypointReached { .. }]
        ));
        // Hand disappears for a few ticks.
        assert!(nav.update(&unresolved(170.0), false).is_empty());
        assert!(nav.update(&unresolved(170.0), false).is_empty());
        // Still at the waypoint afterwards; linger advances as usual.
        std::thread::sleep(Duration::from_millis(50));
        let events = nav.update(&on_edge(170.0, MovementDirection::None), false);
        assert!(matches!(
            events.as_slice(),
            [NavigationEvent::AnnounceDirection { .. }]
        ));
    }

    #[test]
    fn wrong_direction_fires_when_distance_grows() {
        let mut nav = StreetByStreetNavigator::new(test_graph(), waypoints(), config());
        nav.start();
        // Build up the rolling average while approaching.
        nav.update(&on_edge(100.0, MovementDirection::Forward), false);
        nav.update(&on_edge(105.0, MovementDirection::Forward), false);
        nav.update(&on_edge(110.0, MovementDirection::Forward), false);
        // Sharp reversal well past the margin.
        let events = nav.update(&on_edge(60.0, MovementDirection::Backward), false);
        assert_eq!(events, vec![NavigationEvent::WrongDirection]);
        // Keeps quiet until the trend improves again.
        let events = nav.update(&on_edge(55.0, MovementDirection::Backward), false);
        assert!(events.is_empty());
    }
}
