//! Occupant registry keyed by cell
//!
//! Tracks which car and which traffic light sit on each cell. A cell holds
//! at most one car and at most one light; a car may share a cell with a light.

use anyhow::Result;

use super::layout::CityLayout;
use super::types::{CarId, Cell, LightId};

/// What currently sits on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occupant {
    #[default]
    Empty,
    Car(CarId),
    Light(LightId),
    Both(CarId, LightId),
}

impl Occupant {
    pub fn car(self) -> Option<CarId> {
        match self {
            Occupant::Car(car) | Occupant::Both(car, _) => Some(car),
            _ => None,
        }
    }

    pub fn light(self) -> Option<LightId> {
        match self {
            Occupant::Light(light) | Occupant::Both(_, light) => Some(light),
            _ => None,
        }
    }

    fn from_parts(car: Option<CarId>, light: Option<LightId>) -> Self {
        match (car, light) {
            (None, None) => Occupant::Empty,
            (Some(car), None) => Occupant::Car(car),
            (None, Some(light)) => Occupant::Light(light),
            (Some(car), Some(light)) => Occupant::Both(car, light),
        }
    }
}

/// Live occupancy of every grid cell
#[derive(Debug, Clone)]
pub struct Occupancy {
    width: i32,
    height: i32,
    cells: Vec<Occupant>,
    car_count: usize,
}

impl Occupancy {
    pub fn new(layout: &CityLayout) -> Self {
        Self {
            width: layout.width(),
            height: layout.height(),
            cells: vec![Occupant::Empty; layout.cell_count()],
            car_count: 0,
        }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        let in_bounds = (0..self.width).contains(&cell.x) && (0..self.height).contains(&cell.y);
        in_bounds.then(|| cell.x as usize * self.height as usize + cell.y as usize)
    }

    /// Occupant of a cell; out-of-bounds cells read as empty
    pub fn get(&self, cell: Cell) -> Occupant {
        self.index(cell)
            .map(|idx| self.cells[idx])
            .unwrap_or_default()
    }

    pub fn car_at(&self, cell: Cell) -> Option<CarId> {
        self.get(cell).car()
    }

    pub fn light_at(&self, cell: Cell) -> Option<LightId> {
        self.get(cell).light()
    }

    pub fn has_car(&self, cell: Cell) -> bool {
        self.car_at(cell).is_some()
    }

    pub fn is_empty(&self, cell: Cell) -> bool {
        self.get(cell) == Occupant::Empty
    }

    /// Number of cars currently on the grid
    pub fn car_count(&self) -> usize {
        self.car_count
    }

    fn slot(&mut self, cell: Cell) -> Result<&mut Occupant> {
        let idx = self
            .index(cell)
            .ok_or_else(|| anyhow::anyhow!("Cell {} is outside the grid", cell))?;
        Ok(&mut self.cells[idx])
    }

    pub fn place_car(&mut self, cell: Cell, car: CarId) -> Result<()> {
        let slot = self.slot(cell)?;
        if let Some(other) = slot.car() {
            anyhow::bail!("Cell {} already holds car {:?}", cell, other);
        }
        *slot = Occupant::from_parts(Some(car), slot.light());
        self.car_count += 1;
        Ok(())
    }

    pub fn remove_car(&mut self, cell: Cell, car: CarId) -> Result<()> {
        let slot = self.slot(cell)?;
        if slot.car() != Some(car) {
            anyhow::bail!("Car {:?} is not at {}", car, cell);
        }
        *slot = Occupant::from_parts(None, slot.light());
        self.car_count -= 1;
        Ok(())
    }

    pub fn move_car(&mut self, from: Cell, to: Cell, car: CarId) -> Result<()> {
        if let Some(other) = self.car_at(to) {
            anyhow::bail!("Cannot move car {:?} into {}: held by {:?}", car, to, other);
        }
        self.remove_car(from, car)?;
        self.place_car(to, car)
    }

    pub fn place_light(&mut self, cell: Cell, light: LightId) -> Result<()> {
        let slot = self.slot(cell)?;
        if let Some(other) = slot.light() {
            anyhow::bail!("Cell {} already holds traffic light {:?}", cell, other);
        }
        *slot = Occupant::from_parts(slot.car(), Some(light));
        Ok(())
    }
}
