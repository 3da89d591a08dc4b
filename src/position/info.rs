//! Snapshot of a resolved map position.

use std::time::{Duration, Instant};

use crate::geometry::{self, Coords};
use crate::model::GraphElement;

/// Default time-to-live of a resolved position.
pub const DEFAULT_MAX_LIFE: Duration = Duration::from_millis(1500);

/// Direction of travel along an edge axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementDirection {
    Forward,
    Backward,
    #[default]
    None,
}

/// A timestamped snapshot of where the fingertip resolved on the graph.
///
/// "Nothing resolved" is a first-class value ([`PositionInfo::none`]),
/// never a null: the element is simply absent and the description empty.
#[derive(Debug, Clone)]
pub struct PositionInfo {
    /// Unsnapped averaged position, map feet.
    pub real_position: Coords,
    pub element: Option<GraphElement>,
    pub description: String,
    pub movement: MovementDirection,
    /// Distance from the real position to the resolved element.
    pub distance: f64,
    created: Instant,
    max_life: Duration,
}

impl PositionInfo {
    pub fn new(
        real_position: Coords,
        element: Option<GraphElement>,
        description: String,
        movement: MovementDirection,
        distance: f64,
        max_life: Duration,
    ) -> Self {
        Self {
            real_position,
            element,
            description,
            movement,
            distance,
            created: Instant::now(),
            max_life,
        }
    }

    /// The "no position" value.
    pub fn none() -> Self {
        Self::new(
            geometry::ZERO,
            None,
            String::new(),
            MovementDirection::None,
            0.0,
            DEFAULT_MAX_LIFE,
        )
    }

    pub fn is_none(&self) -> bool {
        self.element.is_none() && self.description.is_empty()
    }

    /// False once the snapshot outlived its max-life.
    pub fn is_still_valid(&self) -> bool {
        self.created.elapsed() <= self.max_life
    }

    /// Same snapshot carried to a new position and timestamp. Reuse only
    /// happens when the fingertip is effectively stationary, so the
    /// movement resets to `None`.
    pub(crate) fn refreshed(&self, real_position: Coords, distance: f64) -> Self {
        Self {
            real_position,
            element: self.element,
            description: self.description.clone(),
            movement: MovementDirection::None,
            distance,
            created: Instant::now(),
            max_life: self.max_life,
        }
    }
}
