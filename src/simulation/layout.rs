//! Static city layout and road graph
//!
//! Per-cell building / parking-lot classification and allowed departure
//! directions, built once from a `CityConfig` and never mutated afterwards.
//! The allowed moves are also kept as a petgraph directed graph so the
//! planner and connectivity checks can walk them directly.

use anyhow::{Context, Result};
use log::debug;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;

use super::config::CityConfig;
use super::types::{Cell, Direction, Directions};

/// Largest grid accepted, in cells
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// Immutable static layer of the city grid
#[derive(Debug, Clone)]
pub struct CityLayout {
    width: i32,
    height: i32,

    /// Building flag per cell, indexed by `x * height + y`
    buildings: Vec<bool>,

    /// Parking lot id per cell (1-based), indexed like `buildings`
    parking_lot_ids: Vec<Option<u32>>,

    /// Allowed departure directions per cell, indexed like `buildings`
    directions: Vec<Directions>,

    /// Parking lot cells in id order
    parking_lots: Vec<Cell>,

    /// Static one-step moves: an edge `a -> b` exists when `b` is an
    /// in-bounds non-building neighbor reachable by a direction allowed at `a`
    roads: DiGraphMap<Cell, Direction>,
}

impl CityLayout {
    pub fn new(config: &CityConfig) -> Result<Self> {
        let (width, height) = (config.width, config.height);
        if width <= 0 || height <= 0 {
            anyhow::bail!("Grid must be at least 1x1, got {}x{}", width, height);
        }

        let default_directions = Directions::parse(&config.default_directions)
            .context("Invalid default road directions")?;
        if default_directions.is_empty() {
            anyhow::bail!("Default road directions must not be empty");
        }

        let cell_count = width
            .checked_mul(height)
            .and_then(|cells| usize::try_from(cells).ok())
            .filter(|cells| *cells <= MAX_GRID_CELLS)
            .with_context(|| {
                format!(
                    "Grid {}x{} exceeds the limit of {} cells",
                    width, height, MAX_GRID_CELLS
                )
            })?;
        let mut layout = Self {
            width,
            height,
            buildings: vec![false; cell_count],
            parking_lot_ids: vec![None; cell_count],
            directions: vec![Directions::NONE; cell_count],
            parking_lots: Vec::with_capacity(config.parking_lots.len()),
            roads: DiGraphMap::new(),
        };

        for (building_index, building) in config.buildings.iter().enumerate() {
            for &cell in building {
                let idx = layout
                    .checked_index(cell)
                    .with_context(|| format!("Building {} is misplaced", building_index + 1))?;
                layout.buildings[idx] = true;
            }
        }

        for (lot_index, &cell) in config.parking_lots.iter().enumerate() {
            let lot_id = lot_index as u32 + 1;
            let idx = layout
                .checked_index(cell)
                .with_context(|| format!("Parking lot {} is misplaced", lot_id))?;
            if layout.buildings[idx] {
                anyhow::bail!("Cell {} is marked as both building and parking lot", cell);
            }
            if let Some(existing) = layout.parking_lot_ids[idx] {
                anyhow::bail!(
                    "Cell {} is listed as parking lot {} and {}",
                    cell,
                    existing,
                    lot_id
                );
            }
            layout.parking_lot_ids[idx] = Some(lot_id);
            layout.parking_lots.push(cell);
        }

        // Overrides listed more than once for a cell are combined
        let mut overrides: Vec<Option<Directions>> = vec![None; cell_count];
        for run in &config.roads {
            let run_directions = Directions::parse(&run.directions)
                .with_context(|| format!("Invalid road directions '{}'", run.directions))?;
            if run_directions.is_empty() {
                anyhow::bail!("Road override with no directions");
            }
            for &cell in &run.cells {
                let idx = layout
                    .checked_index(cell)
                    .context("Road override is misplaced")?;
                if layout.buildings[idx] || layout.parking_lot_ids[idx].is_some() {
                    debug!("Ignoring direction override on non-road cell {}", cell);
                    continue;
                }
                let merged = overrides[idx].unwrap_or(Directions::NONE).union(run_directions);
                overrides[idx] = Some(merged);
            }
        }

        for idx in 0..cell_count {
            if !layout.buildings[idx] {
                layout.directions[idx] = overrides[idx].unwrap_or(default_directions);
            }
        }

        layout.build_road_graph();
        Ok(layout)
    }

    fn build_road_graph(&mut self) {
        let cells: Vec<Cell> = self.cells().filter(|c| !self.is_building(*c)).collect();
        for &cell in &cells {
            self.roads.add_node(cell);
        }
        for &cell in &cells {
            for direction in self.allowed_directions(cell).iter() {
                let neighbor = cell.step(direction);
                if self.in_bounds(neighbor) && !self.is_building(neighbor) {
                    self.roads.add_edge(cell, neighbor, direction);
                }
            }
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y)
    }

    /// Flat index of an in-bounds cell
    pub fn index(&self, cell: Cell) -> usize {
        cell.x as usize * self.height as usize + cell.y as usize
    }

    fn checked_index(&self, cell: Cell) -> Result<usize> {
        if !self.in_bounds(cell) {
            anyhow::bail!(
                "Cell {} lies outside the {}x{} grid",
                cell,
                self.width,
                self.height
            );
        }
        Ok(self.index(cell))
    }

    /// All cells, column by column
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Cell::new(x, y)))
    }

    pub fn is_building(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.buildings[self.index(cell)]
    }

    pub fn is_parking_lot(&self, cell: Cell) -> bool {
        self.parking_lot_id(cell).is_some()
    }

    pub fn parking_lot_id(&self, cell: Cell) -> Option<u32> {
        if !self.in_bounds(cell) {
            return None;
        }
        self.parking_lot_ids[self.index(cell)]
    }

    /// Parking lot cells in id order
    pub fn parking_lots(&self) -> &[Cell] {
        &self.parking_lots
    }

    /// Plain road cells: neither building nor parking lot
    pub fn road_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells()
            .filter(|c| !self.is_building(*c) && !self.is_parking_lot(*c))
    }

    pub fn allowed_directions(&self, cell: Cell) -> Directions {
        if !self.in_bounds(cell) {
            return Directions::NONE;
        }
        self.directions[self.index(cell)]
    }

    /// Whether the static layout permits a single step from `from` to `to`
    pub fn permits_move(&self, from: Cell, to: Cell) -> bool {
        self.roads.contains_edge(from, to)
    }

    /// Statically reachable neighbors of a cell, ignoring cars and lights
    pub fn road_neighbors(&self, cell: Cell) -> impl Iterator<Item = (Cell, Direction)> + '_ {
        self.roads.edges(cell).map(|(_, to, direction)| (to, *direction))
    }

    /// Parking lots that share no strongly connected road component with any
    /// other lot: cars leaving them can never come back, or never get in
    pub fn disconnected_parking_lots(&self) -> Vec<Cell> {
        if self.parking_lots.len() < 2 {
            return Vec::new();
        }

        let mut component_of: HashMap<Cell, usize> = HashMap::new();
        for (component, cells) in tarjan_scc(&self.roads).into_iter().enumerate() {
            for cell in cells {
                component_of.insert(cell, component);
            }
        }

        let mut lots_per_component: HashMap<usize, usize> = HashMap::new();
        for lot in &self.parking_lots {
            if let Some(component) = component_of.get(lot) {
                *lots_per_component.entry(*component).or_default() += 1;
            }
        }

        self.parking_lots
            .iter()
            .copied()
            .filter(|lot| {
                component_of
                    .get(lot)
                    .and_then(|component| lots_per_component.get(component))
                    .map_or(true, |count| *count < 2)
            })
            .collect()
    }
}
