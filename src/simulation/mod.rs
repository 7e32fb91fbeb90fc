//! Grid parking simulation
//!
//! This module contains all the core simulation logic: the static city
//! layout, the route planner, the car and traffic light state machines and
//! the world that steps them tick by tick.

mod car;
mod car_manager;
mod config;
mod layout;
mod occupancy;
mod pathfinding;
mod traffic_light;
mod types;
mod world;

pub use car::{CarState, CarUpdateResult, SimCar};
pub use car_manager::{assign_random_destination, choose_start_cell};
pub use config::{CarSpec, CityConfig, RoadRun, TrafficLightSpec, DOWNTOWN_MAP};
pub use layout::{CityLayout, MAX_GRID_CELLS};
pub use occupancy::{Occupancy, Occupant};
pub use pathfinding::TrafficView;
pub use traffic_light::{LightDurations, LightState, TrafficLight};
pub use types::{CarId, Cell, Direction, Directions, LightId, SimId};
pub use world::{CarPosition, SimWorld, SimulationStats, TickSnapshot};
