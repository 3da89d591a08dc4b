//! Position buffering and graph resolution.

pub mod handler;
pub mod info;

pub use handler::{PositionHandler, ResolverConfig};
pub use info::{MovementDirection, PositionInfo};
