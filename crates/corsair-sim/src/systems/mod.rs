//! Systems that advance the simulation world each tick.
//!
//! Systems are plain functions over `&mut World` plus whatever shared
//! state they need. Anything created during a tick goes into the
//! [`Frame`] and is folded into the world near the end of the tick.

pub mod ai;
pub mod cleanup;
pub mod collision;
pub mod environment;
pub mod interaction;
pub mod movement;
pub mod point_defense;
pub mod projectiles;
pub mod snapshot;
pub mod spawner;

use hecs::Entity;

use corsair_core::events::{Cue, ShipEvent};
use corsair_core::geometry::Point;
use corsair_core::types::{GovernmentId, ShipModelId, SystemId};

use crate::cargo::Flotsam;
use crate::damage::DamageLedger;
use crate::projectile::Projectile;
use crate::ship::Ship;

/// A ship's dying blast, applied once the collision grids are current.
#[derive(Debug, Clone)]
pub struct Blast {
    /// Ship model whose explosion weapon goes off.
    pub model: ShipModelId,
    pub position: Point,
    pub system: Option<SystemId>,
    pub source: Entity,
    pub government: Option<GovernmentId>,
}

/// Everything one tick produces besides changes to existing entities.
#[derive(Debug, Default)]
pub struct Frame {
    pub events: Vec<ShipEvent>,
    pub cues: Vec<Cue>,
    pub ledger: DamageLedger,
    pub blasts: Vec<Blast>,
    pub projectiles: Vec<Projectile>,
    /// Fighters launched this tick, with their carrier.
    pub launched: Vec<(Ship, Entity)>,
    pub flotsam: Vec<Flotsam>,
    pub despawn: Vec<Entity>,
}
