//! Route planning and move validity
//!
//! A* over the static road graph, filtered by what the live grid looks like
//! at planning time: cells holding a car or a red light are impassable.
//! Plans are not reserved, so a route can go stale as soon as other cars move.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use log::debug;

use super::layout::CityLayout;
use super::occupancy::Occupancy;
use super::traffic_light::TrafficLight;
use super::types::{Cell, LightId};

/// Read-only view of the grid a car consults before moving or planning
#[derive(Clone, Copy)]
pub struct TrafficView<'a> {
    pub layout: &'a CityLayout,
    pub occupancy: &'a Occupancy,
    pub lights: &'a BTreeMap<LightId, TrafficLight>,
}

impl<'a> TrafficView<'a> {
    pub fn new(
        layout: &'a CityLayout,
        occupancy: &'a Occupancy,
        lights: &'a BTreeMap<LightId, TrafficLight>,
    ) -> Self {
        Self {
            layout,
            occupancy,
            lights,
        }
    }

    /// Whether the cell holds a light currently showing red
    pub fn has_red_light(&self, cell: Cell) -> bool {
        self.occupancy
            .light_at(cell)
            .and_then(|id| self.lights.get(&id))
            .is_some_and(TrafficLight::blocks_entry)
    }

    /// Check whether a car at `from` may step into `to` right now
    pub fn is_valid_move(&self, from: Cell, to: Cell) -> bool {
        if !self.layout.in_bounds(to) {
            return false;
        }
        if self.occupancy.has_car(to) {
            return false;
        }
        if self.layout.is_building(to) {
            return false;
        }
        if self.has_red_light(to) {
            return false;
        }
        // Covers adjacency and the allowed directions of the cell being left
        self.layout.permits_move(from, to)
    }

    /// Neighbors of `cell` a car could step into this tick
    pub fn valid_neighbors(&self, cell: Cell) -> Vec<Cell> {
        self.layout
            .road_neighbors(cell)
            .map(|(neighbor, _)| neighbor)
            .filter(|neighbor| self.is_valid_move(cell, *neighbor))
            .collect()
    }

    /// Find a shortest route from `start` to `goal` with A*
    ///
    /// Returns the cells from `start` to `goal` inclusive, `[start]` when they
    /// coincide, or an empty vector when no route exists right now.
    pub fn find_path(&self, start: Cell, goal: Cell) -> Vec<Cell> {
        if !self.layout.in_bounds(start) || !self.layout.in_bounds(goal) {
            return Vec::new();
        }
        if start == goal {
            return vec![start];
        }

        let cell_count = self.layout.cell_count();
        let mut g_score = vec![u32::MAX; cell_count];
        let mut came_from: Vec<Option<Cell>> = vec![None; cell_count];
        let mut closed = vec![false; cell_count];
        let mut open = BinaryHeap::new();

        let start_h = start.manhattan(goal);
        g_score[self.layout.index(start)] = 0;
        open.push(Reverse(Frontier {
            f: start_h,
            h: start_h,
            cell: start,
        }));

        let mut expanded = 0usize;
        while let Some(Reverse(Frontier { cell: current, .. })) = open.pop() {
            let current_idx = self.layout.index(current);
            if closed[current_idx] {
                continue;
            }
            closed[current_idx] = true;
            expanded += 1;

            if current == goal {
                debug!(
                    "Planned {} -> {} after expanding {} cells",
                    start, goal, expanded
                );
                return reconstruct_path(self.layout, &came_from, current);
            }

            let next_g = g_score[current_idx] + 1;
            for neighbor in self.valid_neighbors(current) {
                let neighbor_idx = self.layout.index(neighbor);
                if closed[neighbor_idx] || next_g >= g_score[neighbor_idx] {
                    continue;
                }
                came_from[neighbor_idx] = Some(current);
                g_score[neighbor_idx] = next_g;
                let h = neighbor.manhattan(goal);
                open.push(Reverse(Frontier {
                    f: next_g + h,
                    h,
                    cell: neighbor,
                }));
            }
        }

        debug!("No route from {} to {} ({} cells expanded)", start, goal, expanded);
        Vec::new()
    }
}

/// Open-set entry ordered by `f`, then `h`, then row-major cell order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    f: u32,
    h: u32,
    cell: Cell,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.f, self.h, self.cell.y, self.cell.x).cmp(&(
            other.f,
            other.h,
            other.cell.y,
            other.cell.x,
        ))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn reconstruct_path(layout: &CityLayout, came_from: &[Option<Cell>], goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(previous) = came_from[layout.index(current)] {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}
