//! Owns at most one live navigator and mediates start/stop/replace.
//!
//! The controller is called from two threads: the camera frame loop
//! (`update`) and the command worker (`navigate_*`, `clear`). A single
//! mutex guards the active-navigator slot for the whole of each cycle;
//! events are forwarded after the lock is released so a sink may call
//! back into the controller.

use std::sync::{Arc, Mutex};

use log::debug;

use super::events::{EventSink, NavigationEvent};
use super::fly_over::FlyOverNavigator;
use super::street::StreetByStreetNavigator;
use super::waypoint::WayPoint;
use super::{Navigator, NavigatorConfig};
use crate::model::Graph;
use crate::position::PositionInfo;

struct ActiveNavigator {
    navigator: Box<dyn Navigator>,
    started: bool,
}

pub struct NavigationController {
    graph: Arc<Graph>,
    config: NavigatorConfig,
    events: Arc<dyn EventSink>,
    active: Mutex<Option<ActiveNavigator>>,
}

impl NavigationController {
    pub fn new(graph: Arc<Graph>, config: NavigatorConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            graph,
            config,
            events,
            active: Mutex::new(None),
        }
    }

    /// Replaces the active navigator with a waypoint-following one. The
    /// previous navigator, if any, is cancelled and discarded.
    pub fn navigate_route(&self, waypoints: Vec<WayPoint>) {
        self.replace(Box::new(StreetByStreetNavigator::new(
            Arc::clone(&self.graph),
            waypoints,
            self.config.clone(),
        )));
    }

    /// Replaces the active navigator with direct-bearing guidance.
    pub fn navigate_fly_over(&self, destination: WayPoint) {
        self.replace(Box::new(FlyOverNavigator::new(
            Arc::clone(&self.graph),
            destination,
            self.config.clone(),
        )));
    }

    /// Drops the active navigator. Idempotent and safe at any time,
    /// including between an update and its event forwarding.
    pub fn clear(&self) {
        let mut active = self.lock();
        if let Some(mut slot) = active.take() {
            slot.navigator.cancel();
            debug!("navigation cancelled");
        }
    }

    pub fn is_navigating(&self) -> bool {
        self.lock().is_some()
    }

    /// One tick per resolved position. Lazily starts a freshly supplied
    /// navigator, then forwards its events; a `DestinationReached` clears
    /// the controller before the event goes out, so it never points at a
    /// finished navigator.
    pub fn update(&self, position: &PositionInfo, ignore_not_moving: bool) {
        let events = {
            let mut active = self.lock();
            let Some(slot) = active.as_mut() else {
                return;
            };
            let events = if slot.started {
                slot.navigator.update(position, ignore_not_moving)
            } else {
                slot.started = true;
                slot.navigator.start()
            };
            if events
                .iter()
                .any(|e| matches!(e, NavigationEvent::DestinationReached { .. }))
            {
                *active = None;
            }
            events
        };
        for event in events {
            self.events.emit(event);
        }
    }

    fn replace(&self, navigator: Box<dyn Navigator>) {
        let mut active = self.lock();
        if let Some(mut previous) = active.take() {
            previous.navigator.cancel();
        }
        *active = Some(ActiveNavigator {
            navigator,
            started: false,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ActiveNavigator>> {
        // A poisoned lock means a panic mid-update; the slot itself is
        // still structurally sound, so keep going.
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}
