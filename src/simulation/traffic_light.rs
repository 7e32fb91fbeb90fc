//! Traffic light logic for the parking simulation
//!
//! A light sits on a single cell and cycles Green -> Yellow -> Red -> Green.
//! Only Red blocks cars from entering the cell; Yellow is treated like Green.

use serde::{Deserialize, Serialize};

use super::types::{Cell, LightId};

/// The phase a traffic light is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightState {
    #[default]
    Green,
    Yellow,
    Red,
}

impl LightState {
    /// The phase that follows this one in the cycle
    pub fn next(self) -> LightState {
        match self {
            LightState::Green => LightState::Yellow,
            LightState::Yellow => LightState::Red,
            LightState::Red => LightState::Green,
        }
    }
}

/// Number of ticks spent in each phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightDurations {
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
}

impl Default for LightDurations {
    fn default() -> Self {
        Self {
            green: 5,
            yellow: 2,
            red: 5,
        }
    }
}

impl LightDurations {
    pub fn for_state(&self, state: LightState) -> u32 {
        match state {
            LightState::Green => self.green,
            LightState::Yellow => self.yellow,
            LightState::Red => self.red,
        }
    }

    /// Total length of one full Green/Yellow/Red cycle in ticks
    pub fn cycle_length(&self) -> u32 {
        self.green + self.yellow + self.red
    }
}

/// A traffic light in the parking simulation
#[derive(Debug, Clone)]
pub struct TrafficLight {
    pub id: LightId,
    pub position: Cell,
    pub state: LightState,
    /// Ticks spent in the current phase
    pub timer: u32,
    pub durations: LightDurations,
}

impl TrafficLight {
    pub fn new(id: LightId, position: Cell, state: LightState, durations: LightDurations) -> Self {
        Self {
            id,
            position,
            state,
            timer: 0,
            durations,
        }
    }

    /// Advance the light by one tick
    /// Returns true if the light changed phase
    pub fn update(&mut self) -> bool {
        self.timer += 1;
        if self.timer >= self.durations.for_state(self.state) {
            self.state = self.state.next();
            self.timer = 0;
            return true;
        }
        false
    }

    /// Whether cars are currently forbidden from entering this light's cell
    pub fn blocks_entry(&self) -> bool {
        self.state == LightState::Red
    }
}
