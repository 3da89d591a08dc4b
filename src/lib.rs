//! Spatial reasoning and navigation engine for tactile street maps.
//!
//! Translates a noisy, camera-derived fingertip position into a stable
//! place on a street-network graph ("on Broadway, between Pacific and
//! Pierce") and runs waypoint-following guidance on top of it. The crate
//! is a library driven by an external frame loop; it performs no I/O of
//! its own except the optional external directions call.

pub mod error;
pub mod geometry;
pub mod model;
pub mod nav;
pub mod position;
pub mod prelude;
pub mod routing;

pub use error::Error;

/// Index-derived identifier of a graph node (intersection or dead end).
pub type NodeId = usize;
/// Index-derived identifier of a street segment.
pub type EdgeId = usize;
/// Identifier of a named street.
pub type StreetId = usize;
/// Index of a point of interest.
pub type PoiId = usize;

/// Spoken distances are rounded to this step (feet) for stability.
pub const DISTANCE_STEP: f64 = 5.0;

/// Feet per degree of latitude, used for the lat/lng calibration.
pub const FEET_PER_DEGREE_LAT: f64 = 364_000.0;
