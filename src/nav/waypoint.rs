//! Waypoints for step-following navigation.

use crate::geometry::{self, Coords};

/// A coordinate plus the instruction spoken when heading for it.
#[derive(Debug, Clone, PartialEq)]
pub struct WayPoint {
    pub coords: Coords,
    pub instructions: String,
}

impl WayPoint {
    pub fn new(coords: Coords, instructions: impl Into<String>) -> Self {
        Self {
            coords,
            instructions: instructions.into(),
        }
    }

    /// The "no destination" value.
    pub fn none() -> Self {
        Self {
            coords: geometry::ZERO,
            instructions: String::new(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.instructions.is_empty() && self.coords == geometry::ZERO
    }
}
