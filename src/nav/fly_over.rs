//! "As the crow flies" guidance towards a single destination.

use std::sync::Arc;
use std::time::Instant;

use super::{NavState, Navigator, NavigatorConfig};
use crate::geometry::{self, Coords};
use crate::model::Graph;
use crate::nav::events::NavigationEvent;
use crate::nav::waypoint::WayPoint;
use crate::position::PositionInfo;

/// Guides by coarse compass direction, no route required. Announcements
/// are throttled to one per announce interval.
pub struct FlyOverNavigator {
    graph: Arc<Graph>,
    destination: WayPoint,
    config: NavigatorConfig,
    state: NavState,
    last_announce: Option<Instant>,
}

impl FlyOverNavigator {
    pub fn new(graph: Arc<Graph>, destination: WayPoint, config: NavigatorConfig) -> Self {
        Self {
            graph,
            destination,
            config,
            state: NavState::Idle,
            last_announce: None,
        }
    }

    /// Cardinal name of the dominant error-vector direction, in the
    /// map's own reference system.
    fn compass_direction(&self, from: Coords) -> &'static str {
        let error = self.destination.coords - from;
        self.graph
            .reference_system()
            .directions()
            .into_iter()
            .max_by(|(_, a), (_, b)| {
                geometry::dot(error, *a).total_cmp(&geometry::dot(error, *b))
            })
            .map(|(name, _)| name)
            .unwrap_or("north")
    }
}

impl Navigator for FlyOverNavigator {
    fn start(&mut self) -> Vec<NavigationEvent> {
        if self.state != NavState::Idle {
            return Vec::new();
        }
        if self.destination.is_none() {
            self.state = NavState::Reached;
            return vec![NavigationEvent::DestinationReached {
                waypoint: WayPoint::none(),
            }];
        }
        self.state = NavState::Running;
        vec![NavigationEvent::AnnounceDirection {
            instructions: self.destination.instructions.clone(),
        }]
    }

    fn update(&mut self, position: &PositionInfo, _ignore_not_moving: bool) -> Vec<NavigationEvent> {
        if self.state != NavState::Running {
            return Vec::new();
        }
        // Sensor gap: the sentinel carries no usable position, wait for
        // the next resolved tick.
        if position.is_none() {
            return Vec::new();
        }

        let distance = geometry::distance(position.real_position, self.destination.coords);
        if distance < self.config.arrived_threshold {
            self.state = NavState::Reached;
            return vec![NavigationEvent::DestinationReached {
                waypoint: self.destination.clone(),
            }];
        }

        let due = self
            .last_announce
            .is_none_or(|at| at.elapsed() >= self.config.announce_interval);
        if !due {
            return Vec::new();
        }
        self.last_announce = Some(Instant::now());

        let direction = self.compass_direction(position.real_position);
        let instructions = if distance > self.config.far_threshold {
            format!("far {direction}")
        } else {
            direction.to_string()
        };
        vec![NavigationEvent::AnnounceDirection { instructions }]
    }

    fn is_running(&self) -> bool {
        self.state == NavState::Running
    }

    fn cancel(&mut self) {
        self.state = NavState::Cancelled;
    }
}
