//! External directions service contract.
//!
//! Routing to off-map destinations is delegated to an HTTP directions
//! service. The contract degrades instead of failing: any transport or
//! parse problem yields the one-element "No route found" placeholder, so
//! the guidance layer can always say something sensible. The HTTP call
//! blocks and must run off the frame-loop thread.

use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::model::LatLng;

pub const NO_ROUTE_FOUND: &str = "No route found";

/// One turn-by-turn step of a fetched route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub instructions: String,
    pub travel_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit: Option<TransitDetails>,
}

impl RouteStep {
    /// The placeholder returned when no route could be produced.
    pub fn no_route() -> Vec<RouteStep> {
        vec![RouteStep {
            instructions: NO_ROUTE_FOUND.to_string(),
            travel_mode: String::new(),
            transit: None,
        }]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitDetails {
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub departure_stop: String,
    #[serde(default)]
    pub arrival_stop: String,
    #[serde(default)]
    pub num_stops: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Walking,
    Transit,
    Bicycling,
    Driving,
}

impl TravelMode {
    fn as_str(self) -> &'static str {
        match self {
            TravelMode::Walking => "walking",
            TravelMode::Transit => "transit",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Driving => "driving",
        }
    }
}

/// Travel mode and transit preferences for a route request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutePreferences {
    pub mode: TravelMode,
    /// Allowed transit vehicles (bus, subway, ...), service-defined.
    #[serde(default)]
    pub transit_modes: Vec<String>,
    /// e.g. "less_walking" or "fewer_transfers".
    #[serde(default)]
    pub routing_preference: Option<String>,
}

/// Seam to the external directions service. Implementations never fail:
/// they fall back to [`RouteStep::no_route`] and log the cause.
pub trait DirectionsApi: Send + Sync {
    fn fetch_route(
        &self,
        origin: LatLng,
        destination: LatLng,
        preferences: &RoutePreferences,
    ) -> Vec<RouteStep>;
}

/// Blocking HTTP client for a Directions-style JSON endpoint.
pub struct HttpDirectionsClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl HttpDirectionsClient {
    /// # Errors
    ///
    /// Returns [`Error::RouteService`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    fn request(
        &self,
        origin: LatLng,
        destination: LatLng,
        preferences: &RoutePreferences,
    ) -> Result<Vec<RouteStep>, Error> {
        let mut query: Vec<(&str, String)> = vec![
            ("origin", format!("{},{}", origin.lat, origin.lng)),
            (
                "destination",
                format!("{},{}", destination.lat, destination.lng),
            ),
            ("mode", preferences.mode.as_str().to_string()),
            ("key", self.api_key.clone()),
        ];
        if !preferences.transit_modes.is_empty() {
            query.push(("transit_mode", preferences.transit_modes.join("|")));
        }
        if let Some(pref) = &preferences.routing_preference {
            query.push(("transit_routing_preference", pref.clone()));
        }

        let response: DirectionsResponse = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(parse_steps(response))
    }
}

impl DirectionsApi for HttpDirectionsClient {
    fn fetch_route(
        &self,
        origin: LatLng,
        destination: LatLng,
        preferences: &RoutePreferences,
    ) -> Vec<RouteStep> {
        match self.request(origin, destination, preferences) {
            Ok(steps) => steps,
            Err(e) => {
                warn!("directions request failed, degrading to placeholder: {e}");
                RouteStep::no_route()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    #[serde(default)]
    legs: Vec<RawLeg>,
}

#[derive(Debug, Deserialize)]
struct RawLeg {
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default, alias = "html_instructions")]
    instructions: String,
    #[serde(default)]
    travel_mode: String,
    #[serde(default)]
    transit_details: Option<RawTransitDetails>,
}

#[derive(Debug, Deserialize)]
struct RawTransitDetails {
    #[serde(default)]
    line: RawLine,
    #[serde(default)]
    departure_stop: RawStop,
    #[serde(default)]
    arrival_stop: RawStop,
    #[serde(default)]
    num_stops: u32,
}

#[derive(Debug, Default, Deserialize)]
struct RawLine {
    #[serde(default, alias = "short_name")]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawStop {
    #[serde(default)]
    name: String,
}

fn parse_steps(response: DirectionsResponse) -> Vec<RouteStep> {
    let steps: Vec<RouteStep> = response
        .routes
        .into_iter()
        .take(1)
        .flat_map(|route| route.legs)
        .flat_map(|leg| leg.steps)
        .map(|step| RouteStep {
            instructions: step.instructions,
            travel_mode: step.travel_mode,
            transit: step.transit_details.map(|t| TransitDetails {
                line: t.line.name,
                departure_stop: t.departure_stop.name,
                arrival_stop: t.arrival_stop.name,
                num_stops: t.num_stops,
            }),
        })
        .collect();
    if steps.is_empty() {
        RouteStep::no_route()
    } else {
        steps
    }
}
