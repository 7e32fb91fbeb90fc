//! Grid Parking Simulation Library
//!
//! Cars drive across a static city grid toward parking lots, obeying one-way
//! roads and traffic lights, one cell per tick.

pub mod simulation;
