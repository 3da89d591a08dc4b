//! Outbound navigation events.

use crate::geometry::Coords;

use super::waypoint::WayPoint;

/// Discrete guidance events consumed by the announcement layer.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    /// The user stalled away from the route; a fresh route from `start`
    /// to `destination` should be fetched and navigation restarted.
    NewRoute { start: Coords, destination: Coords },
    WaypointReached { waypoint: WayPoint },
    DestinationReached { waypoint: WayPoint },
    AnnounceDirection { instructions: String },
    WrongDirection,
}

/// Fire-and-forget event consumer; the engine never waits for the
/// announcement to complete.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: NavigationEvent);
}

impl<F> EventSink for F
where
    F: Fn(NavigationEvent) + Send + Sync,
{
    fn emit(&self, event: NavigationEvent) {
        self(event);
    }
}
