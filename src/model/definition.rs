//! Input contract for graph construction.
//!
//! The definition originates from a JSON/YAML map description; parsing the
//! file is the application's concern, this module only fixes the shape the
//! builder consumes.

use serde::{Deserialize, Serialize};

use super::components::{EdgeFeatures, NodeFeatures};
use crate::geometry::Coords;

#[derive(Debug, Clone, Deserialize)]
pub struct GraphDefinition {
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
    pub streets: Vec<StreetDefinition>,
    #[serde(default)]
    pub pois: Vec<PoiDefinition>,
    pub reference_system: ReferenceSystem,
    pub latlng_reference: LatLngReference,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDefinition {
    /// `[x, y]` in map feet.
    pub coords: [f64; 2],
    #[serde(default)]
    pub features: NodeFeatures,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeDefinition {
    /// Endpoint node indices.
    pub nodes: [usize; 2],
    #[serde(default)]
    pub features: EdgeFeatures,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreetDefinition {
    pub name: String,
    /// Ordered indices into the flat edge list.
    pub edges: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoiDefinition {
    pub name: String,
    pub coords: [f64; 2],
    /// Index of the anchor edge.
    pub edge: usize,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Four cardinal unit vectors in map space. The tactile map is not
/// necessarily aligned with the screen axes.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceSystem {
    pub north: [f64; 2],
    pub east: [f64; 2],
    pub south: [f64; 2],
    pub west: [f64; 2],
}

impl ReferenceSystem {
    /// Cardinal names paired with their map-space unit vectors.
    pub fn directions(&self) -> [(&'static str, Coords); 4] {
        [
            ("north", self.north.into()),
            ("east", self.east.into()),
            ("south", self.south.into()),
            ("west", self.west.into()),
        ]
    }
}

/// One calibration point with a known geographic position.
#[derive(Debug, Clone, Deserialize)]
pub struct LatLngReference {
    pub coords: [f64; 2],
    pub lat: f64,
    pub lng: f64,
}

/// A geographic coordinate produced by calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}
