//! Street network model: components, input contract and the graph itself.

pub mod components;
pub mod definition;
pub mod graph;

pub use components::{Edge, EdgeFeatures, GraphElement, Node, NodeFeatures, Poi, Street};
pub use definition::{GraphDefinition, LatLng, LatLngReference, ReferenceSystem};
pub use graph::{Graph, SnapThresholds};
