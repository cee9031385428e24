//! Collision grid rebuild: one ship grid and one missile grid per
//! occupied system, refilled every tick after ships have moved.

use std::collections::BTreeMap;

use hecs::{Entity, World};

use corsair_core::catalog::Catalog;
use corsair_core::constants::{SHIP_CELL_COUNT, SHIP_CELL_SIZE};
use corsair_core::types::SystemId;

use crate::collision::{CollisionGrid, GridBody};
use crate::projectile::Projectile;
use crate::ship::Ship;
use crate::world::ordered;

pub type EntityGrid = CollisionGrid<Entity>;

#[derive(Debug, Default)]
pub struct Grids {
    ships: BTreeMap<SystemId, EntityGrid>,
    missiles: BTreeMap<SystemId, EntityGrid>,
}

impl Grids {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refill every grid from the current world. Bodies are added in
    /// spawn order, projectiles first.
    pub fn rebuild(&mut self, world: &World, catalog: &Catalog, step: u64) {
        for grid in self.ships.values_mut().chain(self.missiles.values_mut()) {
            grid.clear(step);
        }

        for entity in ordered::<Projectile>(world) {
            let Ok(projectile) = world.get::<&Projectile>(entity) else {
                continue;
            };
            let Some(system) = projectile.system else {
                continue;
            };
            let is_missile = catalog
                .weapon(projectile.weapon)
                .is_some_and(|weapon| weapon.missile_strength > 0);
            if is_missile && !projectile.shot_down {
                grid_for(&mut self.missiles, system, step)
                    .add(GridBody::from_body(entity, &projectile.body));
            }
        }

        for entity in ordered::<Ship>(world) {
            let Ok(ship) = world.get::<&Ship>(entity) else {
                continue;
            };
            let Some(system) = ship.system else {
                continue;
            };
            if ship.is_targetable() {
                grid_for(&mut self.ships, system, step).add(GridBody::from_body(entity, &ship.body));
            }
        }

        for grid in self.ships.values_mut().chain(self.missiles.values_mut()) {
            grid.finish();
        }
    }

    pub fn ships(&self, system: Option<SystemId>) -> Option<&EntityGrid> {
        system.and_then(|system| self.ships.get(&system))
    }

    pub fn missiles(&self, system: Option<SystemId>) -> Option<&EntityGrid> {
        system.and_then(|system| self.missiles.get(&system))
    }
}

fn grid_for(grids: &mut BTreeMap<SystemId, EntityGrid>, system: SystemId, step: u64) -> &mut EntityGrid {
    grids.entry(system).or_insert_with(|| {
        let mut grid = CollisionGrid::new(SHIP_CELL_SIZE, SHIP_CELL_COUNT);
        grid.clear(step);
        grid
    })
}
