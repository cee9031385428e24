//! Core types and content definitions for the Corsair simulation.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, masks, bodies, commands, weapons, outfits, ship templates,
//! star systems, governments, events and constants, plus the text content
//! format and the [`catalog::Catalog`] that loads it.
//! It has no dependency on the ECS or any runtime framework.

pub mod body;
pub mod catalog;
pub mod command;
pub mod constants;
pub mod damage;
pub mod datanode;
pub mod effect;
pub mod error;
pub mod escape;
pub mod events;
pub mod fleet;
pub mod geometry;
pub mod government;
pub mod hazard;
pub mod mask;
pub mod outfit;
pub mod random;
pub mod save;
pub mod state;
pub mod ship_model;
pub mod types;
pub mod universe;
pub mod weapon;

#[cfg(test)]
mod tests;
