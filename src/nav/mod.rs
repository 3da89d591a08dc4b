//! Navigator state machines and the controller that owns them.

pub mod controller;
pub mod events;
pub mod fly_over;
pub mod street;
pub mod waypoint;

use std::time::Duration;

pub use controller::NavigationController;
pub use events::{EventSink, NavigationEvent};
pub use fly_over::FlyOverNavigator;
pub use street::StreetByStreetNavigator;
pub use waypoint::WayPoint;

use crate::position::PositionInfo;

/// Tunables shared by the navigator family, physical units (feet).
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Fly-over arrival distance.
    pub arrived_threshold: f64,
    /// Beyond this the compass announcement gets a "far" prefix.
    pub far_threshold: f64,
    /// Minimum spacing between fly-over announcements.
    pub announce_interval: Duration,
    /// Waypoint arrival distance for step navigation.
    pub waypoint_threshold: f64,
    /// Stationary time before a waypoint advance or a reroute request.
    pub dwell_interval: Duration,
    /// Distance growth over the rolling average that counts as heading
    /// the wrong way.
    pub wrong_direction_margin: f64,
    /// Rolling-average window for the wrong-direction check.
    pub rolling_window: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            arrived_threshold: 30.0,
            far_threshold: 150.0,
            announce_interval: Duration::from_secs(3),
            waypoint_threshold: 40.0,
            dwell_interval: Duration::from_secs(4),
            wrong_direction_margin: 10.0,
            rolling_window: 5,
        }
    }
}

/// Navigator lifecycle: Idle until started, Running while guiding,
/// terminal once reached or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NavState {
    Idle,
    Running,
    Reached,
    Cancelled,
}

/// The closed set of guidance state machines. Events are returned to the
/// caller (the controller) rather than emitted directly, so the
/// controller can observe terminal events before forwarding them.
pub trait Navigator: Send {
    /// Idle to Running; announces the first instruction, or signals
    /// arrival immediately when there is nothing to navigate to.
    fn start(&mut self) -> Vec<NavigationEvent>;

    /// One tick per resolved position; a no-op unless Running.
    fn update(&mut self, position: &PositionInfo, ignore_not_moving: bool)
    -> Vec<NavigationEvent>;

    fn is_running(&self) -> bool;

    /// Terminal; safe to call in any state.
    fn cancel(&mut self);
}
