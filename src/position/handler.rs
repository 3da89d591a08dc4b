//! Buffering and hysteresis on top of raw fingertip positions.
//!
//! The handler consumes pixel-space positions from the camera frame loop,
//! keeps a short time-windowed buffer, and resolves the averaged position
//! to a stable place on the graph. Two suppression rules keep the spoken
//! label from flickering: a gravity margin around a resolved node or PoI,
//! and reuse of the previous snapshot while sitting still on the same
//! edge.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use geo::{Contains, Coord, Rect};
use log::debug;

use super::info::{MovementDirection, PositionInfo};
use crate::geometry::{self, Coords};
use crate::model::{Graph, GraphElement, SnapThresholds};

/// Tunables for position resolution, physical units (feet).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Pixel-to-feet conversion for incoming raw positions.
    pub feet_per_pixel: f64,
    pub thresholds: SnapThresholds,
    /// Extra stickiness margin around a resolved node or PoI.
    pub gravity: f64,
    /// Displacements below this are "not moving".
    pub movement_threshold: f64,
    /// Buffer entries older than this are dropped on read.
    pub sample_max_life: Duration,
    /// Time-to-live of the resolved snapshot.
    pub info_max_life: Duration,
    /// Positions outside the node bounding box plus this margin are
    /// rejected.
    pub bounds_margin: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            feet_per_pixel: 1.0,
            thresholds: SnapThresholds::default(),
            gravity: 10.0,
            movement_threshold: 5.0,
            sample_max_life: Duration::from_millis(700),
            info_max_life: Duration::from_millis(1500),
            bounds_margin: 50.0,
        }
    }
}

pub struct PositionHandler {
    graph: Arc<Graph>,
    config: ResolverConfig,
    samples: VecDeque<(Coords, Instant)>,
    last: PositionInfo,
    bounds: Rect<f64>,
}

impl PositionHandler {
    pub fn new(graph: Arc<Graph>, config: ResolverConfig) -> Self {
        let raw = graph.bounds();
        let bounds = Rect::new(
            Coord {
                x: raw.min().x - config.bounds_margin,
                y: raw.min().y - config.bounds_margin,
            },
            Coord {
                x: raw.max().x + config.bounds_margin,
                y: raw.max().y + config.bounds_margin,
            },
        );
        Self {
            graph,
            config,
            samples: VecDeque::new(),
            last: PositionInfo::none(),
            bounds,
        }
    }

    /// Feeds one raw pixel-space position. Returns false (and changes
    /// nothing) when the converted position falls outside the expanded
    /// map bounds.
    pub fn process_position(&mut self, raw: Coords) -> bool {
        let position = raw * self.config.feet_per_pixel;
        if !self.bounds.contains(&position) {
            return false;
        }
        self.samples.push_back((position, Instant::now()));
        true
    }

    /// Drops all buffered samples and the last resolution. Safe to call
    /// repeatedly.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.last = PositionInfo::none();
    }

    pub fn last_info(&self) -> &PositionInfo {
        &self.last
    }

    /// Resolves the buffered positions to a place on the graph.
    ///
    /// An empty (or fully expired) buffer yields the "no position" value
    /// and leaves the previous resolution untouched so stickiness can
    /// resume after a short sensor gap.
    pub fn get_position_info(&mut self) -> PositionInfo {
        let now = Instant::now();
        while let Some(&(_, arrived)) = self.samples.front() {
            if now.duration_since(arrived) > self.config.sample_max_life {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        if self.samples.is_empty() {
            return PositionInfo::none();
        }
        let average = self.average_position();

        if let Some(info) = self.sticky_resolution(average) {
            self.last = info.clone();
            return info;
        }

        let info = match self.graph.snap(average, &self.config.thresholds) {
            Some((element @ GraphElement::Edge(edge_id), distance)) => {
                let movement = self.classify_movement(average, edge_id);
                if self.last.element == Some(element)
                    && movement == MovementDirection::None
                    && self.last.is_still_valid()
                {
                    // Same edge, not moving: nothing new to announce.
                    self.last.refreshed(average, distance)
                } else {
                    PositionInfo::new(
                        average,
                        Some(element),
                        self.graph.describe(element),
                        movement,
                        distance,
                        self.config.info_max_life,
                    )
                }
            }
            Some((element, distance)) => PositionInfo::new(
                average,
                Some(element),
                self.graph.describe(element),
                MovementDirection::None,
                distance,
                self.config.info_max_life,
            ),
            None => PositionInfo::new(
                average,
                None,
                String::new(),
                MovementDirection::None,
                0.0,
                self.config.info_max_life,
            ),
        };

        if info.element != self.last.element {
            debug!("position resolved to {:?}", info.element);
        }
        self.last = info.clone();
        info
    }

    fn average_position(&self) -> Coords {
        let n = self.samples.len() as f64;
        let sum = self
            .samples
            .iter()
            .fold(geometry::ZERO, |acc, &(p, _)| acc + p);
        sum / n
    }

    /// A previously resolved node or PoI keeps capturing the position
    /// while it stays within (threshold + gravity) of the element.
    fn sticky_resolution(&self, average: Coords) -> Option<PositionInfo> {
        if !self.last.is_still_valid() {
            return None;
        }
        let (anchor, threshold) = match self.last.element {
            Some(GraphElement::Node(id)) => (
                self.graph.node(id).ok()?.coords,
                self.config.thresholds.node,
            ),
            Some(GraphElement::Poi(id)) => {
                (self.graph.poi(id).ok()?.coords, self.config.thresholds.poi)
            }
            _ => return None,
        };
        let distance = geometry::distance(average, anchor);
        if distance <= threshold + self.config.gravity {
            Some(self.last.refreshed(average, distance))
        } else {
            None
        }
    }

    /// Classifies the displacement since the previous resolution against
    /// the edge axis: below the movement threshold or more than 60 deg
    /// off-axis means "not moving".
    fn classify_movement(&self, average: Coords, edge_id: usize) -> MovementDirection {
        if self.last.is_none() || !self.last.is_still_valid() {
            return MovementDirection::None;
        }
        let displacement = average - self.last.real_position;
        let span = geometry::norm(displacement);
        if span < self.config.movement_threshold {
            return MovementDirection::None;
        }
        let Ok(edge) = self.graph.edge(edge_id) else {
            return MovementDirection::None;
        };
        let along = geometry::dot(displacement, edge.direction());
        // cos 60 deg
        if along.abs() / span < 0.5 {
            return MovementDirection::None;
        }
        if along > 0.0 {
            MovementDirection::Forward
        } else {
            MovementDirection::Backward
        }
    }
}
