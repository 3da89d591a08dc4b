//! Street network graph and its derived data.
//!
//! The graph is built once from a [`GraphDefinition`] and is read-only for
//! the rest of the session, apart from the PoI `enabled` flag. Construction
//! precomputes the all-pairs node distance table and the map bounds, so
//! every per-frame query is a cheap scan over a few hundred elements.

use geo::{Coord, Rect};
use hashbrown::HashMap;
use itertools::Itertools;
use log::info;
use petgraph::graph::{NodeIndex, UnGraph};
use rayon::prelude::*;

use super::components::{Edge, GraphElement, Node, Poi, Street};
use super::definition::{GraphDefinition, LatLng, LatLngReference, ReferenceSystem};
use crate::geometry::{self, Coords};
use crate::nav::WayPoint;
use crate::routing::{DirectionsApi, RoutePreferences, RouteStep};
use crate::{DISTANCE_STEP, EdgeId, Error, FEET_PER_DEGREE_LAT, NodeId, PoiId};

/// Per-kind snap distances in feet.
#[derive(Debug, Clone, Copy)]
pub struct SnapThresholds {
    pub node: f64,
    pub edge: f64,
    pub poi: f64,
}

impl Default for SnapThresholds {
    fn default() -> Self {
        Self {
            node: 25.0,
            edge: 20.0,
            poi: 15.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    streets: Vec<Street>,
    street_ids: HashMap<String, usize>,
    pois: Vec<Poi>,
    /// Topology container; node weight is the node id, edge weight the
    /// edge id into `edges`.
    topology: UnGraph<NodeId, EdgeId>,
    /// Flat `n * n` all-pairs distance matrix, `INFINITY` = disconnected.
    distances: Vec<f64>,
    reference_system: ReferenceSystem,
    latlng_reference: LatLngReference,
    bounds: Rect<f64>,
}

impl Graph {
    /// Builds the graph from an in-memory definition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDefinition`] for out-of-range indices,
    /// self-loop edges, edges claimed by two streets, an empty node
    /// list, or a node no street passes through.
    pub fn from_definition(def: &GraphDefinition) -> Result<Self, Error> {
        if def.nodes.is_empty() {
            return Err(Error::InvalidDefinition("no nodes defined".to_string()));
        }

        let mut nodes: Vec<Node> = def
            .nodes
            .iter()
            .enumerate()
            .map(|(id, nd)| Node {
                id,
                coords: nd.coords.into(),
                streets: Default::default(),
                features: nd.features.clone(),
            })
            .collect();

        let mut topology = UnGraph::<NodeId, EdgeId>::with_capacity(nodes.len(), def.edges.len());
        for node in &nodes {
            topology.add_node(node.id);
        }

        // Edges materialize in street order; a definition edge belongs to
        // exactly one street.
        let mut edges: Vec<Edge> = Vec::with_capacity(def.edges.len());
        let mut streets: Vec<Street> = Vec::with_capacity(def.streets.len());
        let mut street_ids = HashMap::with_capacity(def.streets.len());
        let mut claimed: Vec<bool> = vec![false; def.edges.len()];

        for (street_id, sd) in def.streets.iter().enumerate() {
            let mut street_edges = Vec::with_capacity(sd.edges.len());
            for &edge_index in &sd.edges {
                let ed = def.edges.get(edge_index).ok_or_else(|| {
                    Error::InvalidDefinition(format!(
                        "street {} references unknown edge {edge_index}",
                        sd.name
                    ))
                })?;
                if claimed[edge_index] {
                    return Err(Error::InvalidDefinition(format!(
                        "edge {edge_index} belongs to more than one street"
                    )));
                }
                claimed[edge_index] = true;

                let [a, b] = ed.nodes;
                if a == b || a >= nodes.len() || b >= nodes.len() {
                    return Err(Error::InvalidDefinition(format!(
                        "edge {edge_index} must join two distinct existing nodes"
                    )));
                }

                let id = edges.len();
                edges.push(Edge {
                    id,
                    node1: a,
                    node2: b,
                    start: nodes[a].coords,
                    end: nodes[b].coords,
                    street: sd.name.clone(),
                    features: ed.features.clone(),
                    between_streets: Default::default(),
                });
                nodes[a].streets.insert(sd.name.clone());
                nodes[b].streets.insert(sd.name.clone());
                topology.add_edge(NodeIndex::new(a), NodeIndex::new(b), id);
                street_edges.push(id);
            }
            street_ids.insert(sd.name.clone(), street_id);
            streets.push(Street {
                id: street_id,
                name: sd.name.clone(),
                edges: street_edges,
            });
        }

        if let Some(orphan) = nodes.iter().find(|n| n.streets.is_empty()) {
            return Err(Error::InvalidDefinition(format!(
                "node {} is not on any street",
                orphan.id
            )));
        }

        // Reciprocal between-streets for edge pairs on different streets
        // sharing an endpoint. O(E^2) is fine at this graph scale.
        let crossings: Vec<(usize, usize)> = (0..edges.len())
            .tuple_combinations()
            .filter(|&(i, j)| {
                edges[i].street != edges[j].street
                    && (edges[i].node1 == edges[j].node1
                        || edges[i].node1 == edges[j].node2
                        || edges[i].node2 == edges[j].node1
                        || edges[i].node2 == edges[j].node2)
            })
            .collect();
        for (i, j) in crossings {
            let si = edges[i].street.clone();
            let sj = edges[j].street.clone();
            edges[i].between_streets.insert(sj);
            edges[j].between_streets.insert(si);
        }

        let pois: Vec<Poi> = def
            .pois
            .iter()
            .enumerate()
            .map(|(id, pd)| {
                if pd.edge >= edges.len() {
                    return Err(Error::InvalidDefinition(format!(
                        "poi {} references unknown edge {}",
                        pd.name, pd.edge
                    )));
                }
                Ok(Poi {
                    id,
                    name: pd.name.clone(),
                    coords: pd.coords.into(),
                    edge: pd.edge,
                    attributes: pd.attributes.clone(),
                    enabled: pd.enabled,
                })
            })
            .collect::<Result<_, _>>()?;

        let distances = all_pairs_distances(&topology, &edges, nodes.len());
        let bounds = node_bounds(&nodes);

        info!(
            "Graph built: {} nodes, {} edges, {} streets, {} pois",
            nodes.len(),
            edges.len(),
            streets.len(),
            pois.len()
        );

        Ok(Self {
            nodes,
            edges,
            streets,
            street_ids,
            pois,
            topology,
            distances,
            reference_system: def.reference_system.clone(),
            latlng_reference: def.latlng_reference.clone(),
            bounds,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn streets(&self) -> &[Street] {
        &self.streets
    }

    pub fn pois(&self) -> &[Poi] {
        &self.pois
    }

    pub fn street_by_name(&self, name: &str) -> Option<&Street> {
        self.street_ids.get(name).map(|&id| &self.streets[id])
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, Error> {
        self.nodes.get(id).ok_or(Error::InvalidNodeIndex)
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge, Error> {
        self.edges.get(id).ok_or(Error::InvalidEdgeIndex)
    }

    pub fn poi(&self, id: PoiId) -> Result<&Poi, Error> {
        self.pois.get(id).ok_or(Error::InvalidPoiIndex(id))
    }

    pub fn reference_system(&self) -> &ReferenceSystem {
        &self.reference_system
    }

    /// Map bounds spanned by the nodes (unexpanded).
    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }

    /// Precomputed node-to-node network distance; `INFINITY` when the
    /// nodes are disconnected.
    pub fn node_distance(&self, a: NodeId, b: NodeId) -> Result<f64, Error> {
        if a >= self.nodes.len() || b >= self.nodes.len() {
            return Err(Error::InvalidNodeIndex);
        }
        Ok(self.distances[a * self.nodes.len() + b])
    }

    /// Edge whose perpendicular projection of `point` falls strictly
    /// inside the segment, nearest first; falls back to the edge with the
    /// nearest endpoint.
    pub fn nearest_edge(&self, point: Coords) -> Option<&Edge> {
        let interior = self
            .edges
            .iter()
            .filter(|e| e.contains_projection(point))
            .min_by(|a, b| a.distance_to(point).total_cmp(&b.distance_to(point)));
        interior.or_else(|| {
            self.edges
                .iter()
                .min_by(|a, b| a.distance_to(point).total_cmp(&b.distance_to(point)))
        })
    }

    /// Network distance between two arbitrary map points, unrounded.
    ///
    /// Each point is snapped to its nearest edge; the result is the best
    /// composition of point-to-endpoint legs and the precomputed table.
    ///
    /// # Errors
    ///
    /// [`Error::Unreachable`] when the graph has no edges or the snapped
    /// edges lie in disconnected components.
    pub fn distance_between(&self, a: Coords, b: Coords) -> Result<f64, Error> {
        let ea = self.nearest_edge(a).ok_or(Error::Unreachable)?;
        let eb = self.nearest_edge(b).ok_or(Error::Unreachable)?;

        let mut best = if ea.id == eb.id {
            geometry::distance(a, b)
        } else {
            f64::INFINITY
        };
        for &na in &[ea.node1, ea.node2] {
            for &nb in &[eb.node1, eb.node2] {
                let via = geometry::distance(a, self.nodes[na].coords)
                    + self.distances[na * self.nodes.len() + nb]
                    + geometry::distance(self.nodes[nb].coords, b);
                best = best.min(via);
            }
        }

        if best.is_infinite() {
            Err(Error::Unreachable)
        } else {
            Ok(best)
        }
    }

    /// Spoken-friendly network distance, rounded to [`DISTANCE_STEP`].
    pub fn get_distance(&self, a: Coords, b: Coords) -> Result<f64, Error> {
        Ok(round_to_step(self.distance_between(a, b)?))
    }

    /// Rounded network distance from `point` to a PoI.
    pub fn get_distance_to_poi(&self, point: Coords, poi: PoiId) -> Result<f64, Error> {
        let target = self.poi(poi)?.coords;
        self.get_distance(point, target)
    }

    /// PoIs reachable from `point` within `budget` feet; a negative
    /// budget means all of them. Unreachable PoIs are skipped.
    pub fn get_nearby_pois(&self, point: Coords, budget: f64) -> Vec<PoiId> {
        if budget < 0.0 {
            return (0..self.pois.len()).collect();
        }
        self.pois
            .iter()
            .filter(|poi| {
                self.distance_between(point, poi.coords)
                    .is_ok_and(|d| d <= budget)
            })
            .map(|poi| poi.id)
            .collect()
    }

    /// Resolves `point` to the closest graph element within the given
    /// thresholds, PoI first, then node, then edge. Returns the element
    /// and its distance; `None` means free space.
    pub fn snap(&self, point: Coords, thresholds: &SnapThresholds) -> Option<(GraphElement, f64)> {
        if let Some(poi) = self
            .pois
            .iter()
            .min_by(|a, b| a.distance_to(point).total_cmp(&b.distance_to(point)))
        {
            let d = poi.distance_to(point);
            if d <= thresholds.poi {
                return Some((GraphElement::Poi(poi.id), d));
            }
        }

        if let Some(node) = self.nodes.iter().min_by(|a, b| {
            geometry::distance(a.coords, point).total_cmp(&geometry::distance(b.coords, point))
        }) {
            let d = geometry::distance(node.coords, point);
            if d <= thresholds.node {
                return Some((GraphElement::Node(node.id), d));
            }
        }

        if let Some(edge) = self.nearest_edge(point) {
            let d = edge.distance_to(point);
            if d <= thresholds.edge {
                return Some((GraphElement::Edge(edge.id), d));
            }
        }

        None
    }

    /// Human description of a resolved element.
    pub fn describe(&self, element: GraphElement) -> String {
        match element {
            GraphElement::Node(id) => self.nodes[id].description(),
            GraphElement::Edge(id) => self.edges[id].description(),
            GraphElement::Poi(id) => self.pois[id].description(),
        }
    }

    /// Description of the place under `point`, or an empty string for
    /// free space.
    pub fn am_i_at(&self, point: Coords, thresholds: &SnapThresholds) -> String {
        self.snap(point, thresholds)
            .map(|(element, _)| self.describe(element))
            .unwrap_or_default()
    }

    /// Attribute bag of a PoI for the assistant layer.
    pub fn get_poi_details(
        &self,
        poi: PoiId,
    ) -> Result<&serde_json::Map<String, serde_json::Value>, Error> {
        Ok(&self.poi(poi)?.attributes)
    }

    /// Marks the given PoIs as visible to the assistant layer.
    pub fn enable_pois(&mut self, ids: &[PoiId]) -> Result<(), Error> {
        self.set_pois_enabled(ids, true)
    }

    pub fn disable_pois(&mut self, ids: &[PoiId]) -> Result<(), Error> {
        self.set_pois_enabled(ids, false)
    }

    fn set_pois_enabled(&mut self, ids: &[PoiId], enabled: bool) -> Result<(), Error> {
        for &id in ids {
            if id >= self.pois.len() {
                return Err(Error::InvalidPoiIndex(id));
            }
        }
        for &id in ids {
            self.pois[id].enabled = enabled;
        }
        Ok(())
    }

    pub fn enabled_pois(&self) -> Vec<PoiId> {
        self.pois
            .iter()
            .filter(|poi| poi.enabled)
            .map(|poi| poi.id)
            .collect()
    }

    /// Fly-over destination for a PoI.
    pub fn guide_to_poi(&self, poi: PoiId) -> Result<WayPoint, Error> {
        let poi = self.poi(poi)?;
        Ok(WayPoint::new(
            poi.coords,
            format!("Head towards {}", poi.name),
        ))
    }

    /// Converts a map point to geographic coordinates through the
    /// calibration reference, projecting the displacement onto the
    /// reference-system axes.
    pub fn to_lat_lng(&self, point: Coords) -> LatLng {
        let origin: Coords = self.latlng_reference.coords.into();
        let displacement = point - origin;
        let north = geometry::normalize(self.reference_system.north.into());
        let east = geometry::normalize(self.reference_system.east.into());
        let lat = self.latlng_reference.lat
            + geometry::dot(displacement, north) / FEET_PER_DEGREE_LAT;
        let lng = self.latlng_reference.lng
            + geometry::dot(displacement, east)
                / (FEET_PER_DEGREE_LAT * lat.to_radians().cos());
        LatLng { lat, lng }
    }

    /// Turn-by-turn steps to an off-map destination via the external
    /// directions service. Network failures degrade to the "No route
    /// found" placeholder inside the client; see [`DirectionsApi`].
    ///
    /// Blocking call, must run off the frame-loop thread.
    pub fn route_to_destination(
        &self,
        start: Coords,
        destination: LatLng,
        preferences: &RoutePreferences,
        api: &dyn DirectionsApi,
    ) -> Vec<RouteStep> {
        api.fetch_route(self.to_lat_lng(start), destination, preferences)
    }

    pub fn node_count(&self) -> usize {
        self.topology.node_count()
    }
}

/// Floyd-Warshall over the topology, seeded from edge lengths. The inner
/// relaxation is parallelized per row.
fn all_pairs_distances(topology: &UnGraph<NodeId, EdgeId>, edges: &[Edge], n: usize) -> Vec<f64> {
    let mut dist = vec![f64::INFINITY; n * n];
    for i in 0..n {
        dist[i * n + i] = 0.0;
    }
    for edge_ref in topology.edge_indices() {
        if let (Some((a, b)), Some(&edge_id)) = (
            topology.edge_endpoints(edge_ref),
            topology.edge_weight(edge_ref),
        ) {
            let (a, b) = (a.index(), b.index());
            let length = edges[edge_id].length();
            if length < dist[a * n + b] {
                dist[a * n + b] = length;
                dist[b * n + a] = length;
            }
        }
    }

    for k in 0..n {
        let row_k = dist[k * n..(k + 1) * n].to_vec();
        dist.par_chunks_mut(n).for_each(|row| {
            let dik = row[k];
            if dik.is_finite() {
                for (cell, &dkj) in row.iter_mut().zip(&row_k) {
                    let via = dik + dkj;
                    if via < *cell {
                        *cell = via;
                    }
                }
            }
        });
    }
    dist
}

fn node_bounds(nodes: &[Node]) -> Rect<f64> {
    let mut min = Coord {
        x: f64::INFINITY,
        y: f64::INFINITY,
    };
    let mut max = Coord {
        x: f64::NEG_INFINITY,
        y: f64::NEG_INFINITY,
    };
    for node in nodes {
        min.x = min.x.min(node.coords.x());
        min.y = min.y.min(node.coords.y());
        max.x = max.x.max(node.coords.x());
        max.y = max.y.max(node.coords.y());
    }
    Rect::new(min, max)
}

fn round_to_step(distance: f64) -> f64 {
    (distance / DISTANCE_STEP).round() * DISTANCE_STEP
}
