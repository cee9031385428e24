//! Entity bookkeeping for the simulation world.
//!
//! Every ship, projectile and piece of flotsam carries a [`Serial`] in
//! spawn order. Systems walk entities by serial, never by archetype
//! order, so a tick is reproducible from the seed alone.

use hecs::{Component, Entity, World};

use corsair_core::types::EntityRef;

use crate::cargo::Flotsam;
use crate::projectile::Projectile;
use crate::ship::Ship;

/// Spawn order of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Serial(pub u64);

/// Hands out serials.
#[derive(Debug, Clone, Default)]
pub struct Serials {
    next: u64,
}

impl Serials {
    pub fn next(&mut self) -> Serial {
        let serial = Serial(self.next);
        self.next += 1;
        serial
    }
}

pub fn spawn_ship(world: &mut World, serials: &mut Serials, ship: Ship) -> Entity {
    world.spawn((serials.next(), ship))
}

pub fn spawn_projectile(world: &mut World, serials: &mut Serials, projectile: Projectile) -> Entity {
    world.spawn((serials.next(), projectile))
}

pub fn spawn_flotsam(world: &mut World, serials: &mut Serials, flotsam: Flotsam) -> Entity {
    world.spawn((serials.next(), flotsam))
}

/// Entities holding a `T`, in spawn order.
pub fn ordered<T: Component>(world: &World) -> Vec<Entity> {
    let mut entities: Vec<(Serial, Entity)> = world
        .query::<(&Serial, &T)>()
        .iter()
        .map(|(entity, (serial, _))| (*serial, entity))
        .collect();
    entities.sort_unstable_by_key(|&(serial, _)| serial);
    entities.into_iter().map(|(_, entity)| entity).collect()
}

/// Handle of an entity as it appears in events and snapshots.
pub fn entity_ref(entity: Entity) -> EntityRef {
    EntityRef(entity.to_bits().get())
}

pub fn resolve(world: &World, handle: EntityRef) -> Option<Entity> {
    Entity::from_bits(handle.0).filter(|&entity| world.contains(entity))
}
