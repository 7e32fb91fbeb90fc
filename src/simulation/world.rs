//! Main simulation world that ties everything together
//!
//! Owns the static layout, the occupant registry, the traffic lights, the
//! cars and the RNG, and advances them one tick at a time.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;

use super::car::{CarUpdateResult, SimCar};
use super::car_manager;
use super::config::CityConfig;
use super::layout::CityLayout;
use super::occupancy::Occupancy;
use super::traffic_light::{LightDurations, LightState, TrafficLight};
use super::types::{CarId, Cell, Directions, LightId, SimId};

/// Position of a car still on the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CarPosition {
    pub id: CarId,
    pub position: Cell,
    /// False once the car has been parked for good for lack of destinations
    pub active: bool,
}

/// Car positions after a given tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickSnapshot {
    pub step: u64,
    pub cars: Vec<CarPosition>,
}

/// Running counters for the simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub total_cars_spawned: usize,
    pub total_cars_parked: usize,
    /// Cars that never got a destination
    pub cars_deactivated: usize,
    pub moves: usize,
    pub wandered_moves: usize,
    pub blocked_moves: usize,
    pub waits: usize,
}

/// The main simulation world
pub struct SimWorld {
    layout: CityLayout,

    occupancy: Occupancy,

    /// All traffic lights, stepped in id order
    lights: BTreeMap<LightId, TrafficLight>,

    /// All cars on the grid, stepped in creation order
    cars: BTreeMap<CarId, SimCar>,

    /// Next ID to assign
    next_id: usize,

    /// Ticks run so far
    steps: u64,

    rng: StdRng,

    stats: SimulationStats,
}

impl SimWorld {
    /// Build a world from a city description
    ///
    /// Fails without returning a partial world if the description is
    /// inconsistent or cars cannot be placed.
    pub fn initialize(config: &CityConfig) -> Result<Self> {
        let layout = CityLayout::new(config).context("Invalid city layout")?;

        for lot in layout.disconnected_parking_lots() {
            warn!(
                "Parking lot {} at {} is cut off from every other lot",
                layout.parking_lot_id(lot).unwrap_or_default(),
                lot
            );
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut world = Self {
            occupancy: Occupancy::new(&layout),
            layout,
            lights: BTreeMap::new(),
            cars: BTreeMap::new(),
            next_id: 0,
            steps: 0,
            rng,
            stats: SimulationStats::default(),
        };

        for spec in &config.traffic_lights {
            world
                .add_traffic_light(spec.position, spec.state, spec.durations)
                .context("Invalid traffic light")?;
        }

        for spec in &config.cars {
            world
                .spawn_car(spec.start, spec.destination)
                .context("Invalid car")?;
        }

        let mut free_lots: Vec<Cell> = world
            .layout
            .parking_lots()
            .iter()
            .copied()
            .filter(|lot| !world.occupancy.has_car(*lot))
            .collect();
        for _ in 0..config.num_cars {
            let start = car_manager::choose_start_cell(
                &mut free_lots,
                &world.layout,
                &world.occupancy,
                &mut world.rng,
            )?;
            world.spawn_car(start, None)?;
        }

        info!(
            "City {}x{} ready: {} parking lots, {} traffic lights, {} cars",
            world.layout.width(),
            world.layout.height(),
            world.layout.parking_lots().len(),
            world.lights.len(),
            world.cars.len()
        );

        Ok(world)
    }

    fn next_sim_id(&mut self) -> SimId {
        let id = SimId(self.next_id);
        self.next_id += 1;
        id
    }

    fn add_traffic_light(
        &mut self,
        position: Cell,
        state: LightState,
        durations: LightDurations,
    ) -> Result<LightId> {
        if !self.layout.in_bounds(position) {
            anyhow::bail!("Traffic light {} lies outside the grid", position);
        }
        if self.layout.is_building(position) {
            anyhow::bail!("Traffic light {} is inside a building", position);
        }
        if durations.green == 0 || durations.yellow == 0 || durations.red == 0 {
            anyhow::bail!("Traffic light {} has a zero-length phase", position);
        }

        let id = LightId(self.next_sim_id());
        self.occupancy.place_light(position, id)?;
        self.lights
            .insert(id, TrafficLight::new(id, position, state, durations));
        Ok(id)
    }

    fn spawn_car(&mut self, start: Cell, destination: Option<Cell>) -> Result<CarId> {
        let id = CarId(self.next_sim_id());
        let car = car_manager::spawn_car(
            id,
            start,
            destination,
            &self.layout,
            &mut self.occupancy,
            &self.lights,
            &mut self.rng,
        )?;

        self.stats.total_cars_spawned += 1;
        if !car.active {
            self.stats.cars_deactivated += 1;
        }
        self.cars.insert(id, car);
        Ok(id)
    }

    /// Advance the simulation by exactly one tick
    ///
    /// Every traffic light updates before any car moves.
    pub fn step(&mut self) {
        self.steps += 1;
        debug!("Simulation step {}", self.steps);

        for light in self.lights.values_mut() {
            if light.update() {
                debug!(
                    "Traffic light {:?} at {} turned {:?}",
                    light.id, light.position, light.state
                );
            }
        }

        let results = car_manager::update_cars(
            &mut self.cars,
            &self.layout,
            &mut self.occupancy,
            &self.lights,
            &mut self.rng,
        );

        for (car_id, result) in results {
            match result {
                CarUpdateResult::Moved(_) => self.stats.moves += 1,
                CarUpdateResult::Wandered(_) => self.stats.wandered_moves += 1,
                CarUpdateResult::Blocked => self.stats.blocked_moves += 1,
                CarUpdateResult::Waiting => self.stats.waits += 1,
                CarUpdateResult::Parked(lot) => {
                    info!(
                        "Car {:?} arrived at parking lot {} at {}",
                        car_id,
                        self.layout.parking_lot_id(lot).unwrap_or_default(),
                        lot
                    );
                    car_manager::despawn_car(car_id, &mut self.cars, &mut self.occupancy);
                    self.stats.total_cars_parked += 1;
                }
                CarUpdateResult::Idle | CarUpdateResult::Stuck => {}
            }
        }
    }

    /// Run `ticks` steps, collecting a snapshot after each one
    pub fn run(&mut self, ticks: u64) -> Vec<TickSnapshot> {
        (0..ticks)
            .map(|_| {
                self.step();
                self.snapshot()
            })
            .collect()
    }

    /// Positions of every car still on the grid, in creation order
    pub fn active_car_positions(&self) -> Vec<CarPosition> {
        self.cars
            .values()
            .filter_map(|car| {
                car.position.map(|position| CarPosition {
                    id: car.id,
                    position,
                    active: car.active,
                })
            })
            .collect()
    }

    pub fn snapshot(&self) -> TickSnapshot {
        TickSnapshot {
            step: self.steps,
            cars: self.active_car_positions(),
        }
    }

    pub fn is_building(&self, cell: Cell) -> bool {
        self.layout.is_building(cell)
    }

    pub fn is_parking_lot(&self, cell: Cell) -> bool {
        self.layout.is_parking_lot(cell)
    }

    /// A parking lot no car currently stands on
    pub fn is_parking_lot_available(&self, cell: Cell) -> bool {
        self.layout.is_parking_lot(cell) && !self.occupancy.has_car(cell)
    }

    pub fn allowed_directions(&self, cell: Cell) -> Directions {
        self.layout.allowed_directions(cell)
    }

    /// State of the traffic light on a cell, if there is one
    pub fn light_state_at(&self, cell: Cell) -> Option<LightState> {
        self.occupancy
            .light_at(cell)
            .and_then(|id| self.lights.get(&id))
            .map(|light| light.state)
    }

    pub fn car(&self, id: CarId) -> Option<&SimCar> {
        self.cars.get(&id)
    }

    pub fn cars(&self) -> impl Iterator<Item = &SimCar> {
        self.cars.values()
    }

    pub fn lights(&self) -> impl Iterator<Item = &TrafficLight> {
        self.lights.values()
    }

    pub fn layout(&self) -> &CityLayout {
        &self.layout
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Log a summary of the world state
    pub fn print_summary(&self) {
        info!("=== Parking Simulation Summary ===");
        info!("Step: {}", self.steps);
        info!(
            "Grid: {}x{}, parking lots: {}, traffic lights: {}",
            self.layout.width(),
            self.layout.height(),
            self.layout.parking_lots().len(),
            self.lights.len()
        );
        info!("Cars on grid: {}", self.cars.len());
        for car in self.cars.values() {
            info!(
                "  Car {:?}: position={:?}, destination={:?}, state={:?}, path_remaining={}",
                car.id,
                car.position,
                car.destination,
                car.state,
                car.path.len()
            );
        }
    }

    /// Render the grid as text, north at the top
    ///
    /// Legend: `#` building, `P` free lot, `C` car, `G`/`Y`/`R` traffic
    /// light, `.` road
    pub fn draw_map(&self) -> String {
        let mut map = String::new();
        for y in (0..self.layout.height()).rev() {
            for x in 0..self.layout.width() {
                let cell = Cell::new(x, y);
                let symbol = if self.occupancy.has_car(cell) {
                    'C'
                } else if let Some(state) = self.light_state_at(cell) {
                    match state {
                        LightState::Green => 'G',
                        LightState::Yellow => 'Y',
                        LightState::Red => 'R',
                    }
                } else if self.layout.is_building(cell) {
                    '#'
                } else if self.layout.is_parking_lot(cell) {
                    'P'
                } else {
                    '.'
                };
                map.push(symbol);
            }
            map.push('\n');
        }
        map
    }
}
