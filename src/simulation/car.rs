//! Car movement logic for the parking simulation
//!
//! Each tick an active car either follows its planned route one cell, waits
//! in front of an occupied destination lot, drops a stale route, or (with no
//! route at all) wanders to a random legal neighbor.

use anyhow::{Context, Result};
use log::debug;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::{BTreeMap, VecDeque};

use super::layout::CityLayout;
use super::occupancy::Occupancy;
use super::pathfinding::TrafficView;
use super::traffic_light::TrafficLight;
use super::types::{CarId, Cell, LightId};

/// Where a car stands in its trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarState {
    /// No route held; one will be planned on the next update
    Unrouted,
    /// Following a planned route
    Routed,
    /// Planning failed; moving at random until a route appears
    Stalled,
    /// Parked at its destination and taken off the grid
    Removed,
}

/// Result of a car update indicating what happened this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarUpdateResult {
    /// Car is inactive and did nothing
    Idle,
    /// Car advanced one cell along its route
    Moved(Cell),
    /// Car had no route and stepped to a random neighbor
    Wandered(Cell),
    /// Car had no route and no legal neighbor
    Stuck,
    /// Next cell is the destination lot, which is occupied
    Waiting,
    /// Next cell became illegal; the route was dropped
    Blocked,
    /// Car entered its destination lot and must be despawned
    Parked(Cell),
}

/// A car in the parking simulation
#[derive(Debug, Clone)]
pub struct SimCar {
    pub id: CarId,
    /// `None` once the car has left the grid
    pub position: Option<Cell>,
    pub destination: Option<Cell>,
    /// Cells still to enter; the front is the next one
    pub path: VecDeque<Cell>,
    pub active: bool,
    pub state: CarState,
}

impl SimCar {
    pub fn new(id: CarId, position: Cell) -> Self {
        Self {
            id,
            position: Some(position),
            destination: None,
            path: VecDeque::new(),
            active: true,
            state: CarState::Unrouted,
        }
    }

    /// Plan a route from the current position to the destination
    /// Returns true if a route was adopted
    pub fn plan_route(&mut self, view: &TrafficView) -> bool {
        let (Some(position), Some(destination)) = (self.position, self.destination) else {
            return false;
        };

        let plan = view.find_path(position, destination);
        // The plan starts with the cell the car is already on
        self.path = plan.into_iter().skip(1).collect();
        if self.path.is_empty() {
            return false;
        }

        self.state = CarState::Routed;
        true
    }

    /// Take the car off the board permanently
    pub fn deactivate(&mut self) {
        self.active = false;
        self.path.clear();
    }

    /// Update car movement logic
    /// Returns CarUpdateResult indicating what happened
    pub fn update(
        &mut self,
        layout: &CityLayout,
        occupancy: &mut Occupancy,
        lights: &BTreeMap<LightId, TrafficLight>,
        rng: &mut impl Rng,
    ) -> Result<CarUpdateResult> {
        if !self.active {
            return Ok(CarUpdateResult::Idle);
        }

        let position = self.position.context("Active car has no position")?;
        let destination = self
            .destination
            .context("Active car has no destination")?;

        if self.path.is_empty() {
            let view = TrafficView::new(layout, occupancy, lights);
            if !self.plan_route(&view) {
                self.state = CarState::Stalled;
                let options = view.valid_neighbors(position);
                let Some(&next) = options.choose(rng) else {
                    debug!("Car {:?} is stuck at {}", self.id, position);
                    return Ok(CarUpdateResult::Stuck);
                };

                if next == destination {
                    return self.park(occupancy, position, destination);
                }

                occupancy.move_car(position, next, self.id)?;
                self.position = Some(next);
                debug!("Car {:?} has no route, wandered to {}", self.id, next);
                return Ok(CarUpdateResult::Wandered(next));
            }
            debug!(
                "Car {:?} planned {} steps to {}",
                self.id,
                self.path.len(),
                destination
            );
        }

        let next = *self.path.front().context("Routed car has an empty path")?;

        if next == destination {
            let lot_free = layout.is_parking_lot(destination) && !occupancy.has_car(destination);
            if !lot_free {
                debug!(
                    "Car {:?} waiting: parking lot at {} is occupied",
                    self.id, destination
                );
                return Ok(CarUpdateResult::Waiting);
            }
            self.path.pop_front();
            return self.park(occupancy, position, destination);
        }

        let valid = TrafficView::new(layout, occupancy, lights).is_valid_move(position, next);
        if !valid {
            debug!(
                "Car {:?} cannot move {} -> {}, dropping route",
                self.id, position, next
            );
            self.path.clear();
            self.state = CarState::Unrouted;
            return Ok(CarUpdateResult::Blocked);
        }

        occupancy.move_car(position, next, self.id)?;
        self.position = Some(next);
        self.path.pop_front();
        Ok(CarUpdateResult::Moved(next))
    }

    /// Enter the destination lot and leave the grid
    ///
    /// Arrival only requires the lot to be free; a red light on the lot does
    /// not hold the car back.
    fn park(
        &mut self,
        occupancy: &mut Occupancy,
        position: Cell,
        destination: Cell,
    ) -> Result<CarUpdateResult> {
        occupancy.move_car(position, destination, self.id)?;
        occupancy.remove_car(destination, self.id)?;
        self.position = None;
        self.deactivate();
        self.state = CarState::Removed;
        Ok(CarUpdateResult::Parked(destination))
    }
}
