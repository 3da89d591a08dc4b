// Re-export of the key components.
pub use crate::geometry::Coords;
pub use crate::model::{Graph, GraphDefinition, GraphElement, LatLng, SnapThresholds};
pub use crate::nav::{
    EventSink, FlyOverNavigator, NavigationController, NavigationEvent, Navigator,
    NavigatorConfig, StreetByStreetNavigator, WayPoint,
};
pub use crate::position::{MovementDirection, PositionHandler, PositionInfo, ResolverConfig};
pub use crate::routing::{
    DirectionsApi, HttpDirectionsClient, RoutePreferences, RouteStep, TravelMode,
};

// Core identifiers and constants.
pub use crate::{DISTANCE_STEP, EdgeId, Error, NodeId, PoiId, StreetId};
