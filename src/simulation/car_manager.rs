//! Car spawning and management for the parking simulation
//!
//! This module contains functions for placing cars, picking their destination
//! lots, stepping them in creation order and despawning them once parked.

use anyhow::{Context, Result};
use log::{info, warn};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::BTreeMap;

use super::car::{CarUpdateResult, SimCar};
use super::layout::CityLayout;
use super::occupancy::Occupancy;
use super::pathfinding::TrafficView;
use super::traffic_light::TrafficLight;
use super::types::{CarId, Cell, LightId};

/// Pick a random free parking lot for the car, other than `exclude`
///
/// When every candidate lot is taken the car is deactivated for good.
/// Returns the chosen destination if any
pub fn assign_random_destination(
    car: &mut SimCar,
    exclude: Option<Cell>,
    layout: &CityLayout,
    occupancy: &Occupancy,
    rng: &mut impl Rng,
) -> Option<Cell> {
    let candidates: Vec<Cell> = layout
        .parking_lots()
        .iter()
        .copied()
        .filter(|lot| Some(*lot) != exclude && !occupancy.has_car(*lot))
        .collect();

    let Some(&destination) = candidates.choose(rng) else {
        info!(
            "No free parking lot for car {:?}, deactivating it",
            car.id
        );
        car.deactivate();
        return None;
    };

    car.destination = Some(destination);
    log_departure(car, exclude, destination, layout);
    Some(destination)
}

fn log_departure(car: &SimCar, start: Option<Cell>, destination: Cell, layout: &CityLayout) {
    let dest_lot = layout.parking_lot_id(destination).unwrap_or_default();
    match start.and_then(|cell| layout.parking_lot_id(cell).map(|id| (cell, id))) {
        Some((cell, start_lot)) => info!(
            "Car {:?} leaves parking lot {} at {} for parking lot {} at {}",
            car.id, start_lot, cell, dest_lot, destination
        ),
        None => info!(
            "Car {:?} starts on the road at {:?} for parking lot {} at {}",
            car.id, car.position, dest_lot, destination
        ),
    }
}

/// Choose where a randomly placed car starts
///
/// Takes a random lot out of `free_lots` while any remain, then falls back to
/// a random road cell holding neither a car nor a traffic light.
pub fn choose_start_cell(
    free_lots: &mut Vec<Cell>,
    layout: &CityLayout,
    occupancy: &Occupancy,
    rng: &mut impl Rng,
) -> Result<Cell> {
    if !free_lots.is_empty() {
        let index = rng.random_range(0..free_lots.len());
        return Ok(free_lots.remove(index));
    }

    let road_cells: Vec<Cell> = layout
        .road_cells()
        .filter(|cell| occupancy.is_empty(*cell))
        .collect();

    road_cells
        .choose(rng)
        .copied()
        .context("No free cell left to place a car")
}

/// Place a car on the grid, give it a destination and an initial route
///
/// # Arguments
/// * `car_id` - The pre-generated car ID
/// * `start` - The cell the car starts on
/// * `destination` - A fixed destination lot, or `None` for a random one
pub fn spawn_car(
    car_id: CarId,
    start: Cell,
    destination: Option<Cell>,
    layout: &CityLayout,
    occupancy: &mut Occupancy,
    lights: &BTreeMap<LightId, TrafficLight>,
    rng: &mut impl Rng,
) -> Result<SimCar> {
    if !layout.in_bounds(start) {
        anyhow::bail!("Car start {} lies outside the grid", start);
    }
    if layout.is_building(start) {
        anyhow::bail!("Car start {} is inside a building", start);
    }
    occupancy
        .place_car(start, car_id)
        .with_context(|| format!("Cannot place car {:?}", car_id))?;

    let mut car = SimCar::new(car_id, start);

    match destination {
        Some(destination) => {
            if !layout.is_parking_lot(destination) {
                anyhow::bail!("Car destination {} is not a parking lot", destination);
            }
            if destination == start {
                anyhow::bail!("Car destination {} equals its start", destination);
            }
            car.destination = Some(destination);
            log_departure(&car, Some(start), destination, layout);
        }
        None => {
            assign_random_destination(&mut car, Some(start), layout, occupancy, rng);
        }
    }

    if car.active && !car.plan_route(&TrafficView::new(layout, occupancy, lights)) {
        warn!(
            "Car {:?} has no initial route from {} to {:?}",
            car.id, start, car.destination
        );
    }

    Ok(car)
}

/// Update all cars in creation order
///
/// Each car commits its move before the next one is evaluated, so earlier
/// cars win contested cells. Returns a list of (car_id, result) tuples.
pub fn update_cars(
    cars: &mut BTreeMap<CarId, SimCar>,
    layout: &CityLayout,
    occupancy: &mut Occupancy,
    lights: &BTreeMap<LightId, TrafficLight>,
    rng: &mut impl Rng,
) -> Vec<(CarId, CarUpdateResult)> {
    let mut results = Vec::with_capacity(cars.len());

    for (car_id, car) in cars.iter_mut() {
        match car.update(layout, occupancy, lights, rng) {
            Ok(result) => results.push((*car_id, result)),
            Err(err) => warn!("Car {:?} failed to update: {:#}", car_id, err),
        }
    }

    results
}

/// Despawn a car and clear its cell if it still holds one
pub fn despawn_car(
    car_id: CarId,
    cars: &mut BTreeMap<CarId, SimCar>,
    occupancy: &mut Occupancy,
) -> Option<SimCar> {
    let car = cars.remove(&car_id)?;
    if let Some(position) = car.position {
        if let Err(err) = occupancy.remove_car(position, car_id) {
            warn!("Despawned car {:?} was not tracked: {:#}", car_id, err);
        }
    }
    Some(car)
}
