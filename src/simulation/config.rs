//! City description loaded from JSON
//!
//! Everything the simulation needs to build its static layout and initial
//! population: grid size, buildings, parking lots, one-way road overrides,
//! traffic lights and cars.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::traffic_light::{LightDurations, LightState};
use super::types::Cell;

/// The downtown map the simulation was designed around, shipped with the crate
pub const DOWNTOWN_MAP: &str = include_str!("../../maps/downtown.json");

/// Full city description
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CityConfig {
    pub width: i32,
    pub height: i32,
    /// Number of randomly placed cars, in addition to `cars`
    #[serde(default)]
    pub num_cars: usize,
    /// Seed for the simulation RNG; entropy is used when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Groups of building cells, one group per building
    #[serde(default)]
    pub buildings: Vec<Vec<Cell>>,
    /// Parking lots; ids are assigned 1..=N in this order
    #[serde(default)]
    pub parking_lots: Vec<Cell>,
    /// Per-cell allowed-direction overrides
    #[serde(default)]
    pub roads: Vec<RoadRun>,
    /// Directions for road cells not covered by `roads`
    #[serde(default = "default_directions")]
    pub default_directions: String,
    #[serde(default)]
    pub traffic_lights: Vec<TrafficLightSpec>,
    /// Cars with a fixed start (and optionally a fixed destination)
    #[serde(default)]
    pub cars: Vec<CarSpec>,
}

/// A set of cells sharing the same allowed directions, e.g. `"NE"`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoadRun {
    pub directions: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficLightSpec {
    pub position: Cell,
    #[serde(default)]
    pub state: LightState,
    #[serde(default)]
    pub durations: LightDurations,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarSpec {
    pub start: Cell,
    #[serde(default)]
    pub destination: Option<Cell>,
}

fn default_directions() -> String {
    "NSEW".to_string()
}

impl CityConfig {
    /// An empty grid: no buildings, lots, lights or cars, every direction allowed
    pub fn open_grid(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            num_cars: 0,
            seed: None,
            buildings: Vec::new(),
            parking_lots: Vec::new(),
            roads: Vec::new(),
            default_directions: default_directions(),
            traffic_lights: Vec::new(),
            cars: Vec::new(),
        }
    }

    /// The bundled 24x24 downtown map
    pub fn downtown() -> Result<Self> {
        Self::from_json(DOWNTOWN_MAP).context("Bundled downtown map is invalid")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse city config")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read map file {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid map file {}", path.display()))
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_num_cars(mut self, num_cars: usize) -> Self {
        self.num_cars = num_cars;
        self
    }

    pub fn with_parking_lots(mut self, lots: impl IntoIterator<Item = Cell>) -> Self {
        self.parking_lots.extend(lots);
        self
    }

    pub fn with_building(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.buildings.push(cells.into_iter().collect());
        self
    }

    pub fn with_road(mut self, directions: &str, cells: impl IntoIterator<Item = Cell>) -> Self {
        self.roads.push(RoadRun {
            directions: directions.to_string(),
            cells: cells.into_iter().collect(),
        });
        self
    }

    pub fn with_traffic_light(mut self, position: Cell, state: LightState) -> Self {
        self.traffic_lights.push(TrafficLightSpec {
            position,
            state,
            durations: LightDurations::default(),
        });
        self
    }

    pub fn with_car(mut self, start: Cell, destination: Option<Cell>) -> Self {
        self.cars.push(CarSpec { start, destination });
        self
    }
}
