//! Simulation engine for Corsair.
//!
//! Owns the hecs ECS world of ships, projectiles and flotsam, runs the
//! systems at a fixed tick rate, and produces GameStateSnapshots for the
//! presentation layer.

pub mod armament;
pub mod cargo;
pub mod collision;
pub mod cues;
pub mod damage;
pub mod engine;
pub mod environment;
pub mod hardpoint;
pub mod projectile;
pub mod ship;
pub mod systems;
pub mod world;
pub mod world_setup;

pub use corsair_core as core;
pub use engine::{SimConfig, SimulationEngine};

#[cfg(test)]
mod tests;
