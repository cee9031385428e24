//! Pilots for CORSAIR.
//!
//! Computer-controlled ships decide through [`behavior::step`], the
//! player's flagship through [`player::PlayerController`]. Both read a
//! flat [`view::AiContext`] and return [`view::ShipOrders`], so nothing in
//! this crate mutates the world directly.

pub mod behavior;
pub mod distance_map;
pub mod maneuver;
pub mod player;
pub mod targeting;
pub mod view;

pub use corsair_core as core;
