//! Entity spawn factories for setting up the simulation world.
//!
//! Creates the player's fleet from start conditions and single ships for
//! scripted setups.

use hecs::{Entity, World};
use rand::Rng;

use corsair_core::catalog::Catalog;
use corsair_core::constants::PLANET_SPAWN_SPREAD;
use corsair_core::geometry::{Angle, Point};
use corsair_core::random;
use corsair_core::types::{GovernmentId, ShipModelId, SystemId};
use corsair_core::universe::{StartConditions, System};

use crate::ship::Ship;
use crate::world::{spawn_ship, Serials};

/// Spawn the player's ships for a new pilot: the first ship is the
/// flagship, the rest escort it. All of them start on the launch pad,
/// taking off. Returns the flagship.
pub fn setup_start<R: Rng + ?Sized>(
    world: &mut World,
    serials: &mut Serials,
    catalog: &Catalog,
    systems: &[System],
    start: &StartConditions,
    rng: &mut R,
) -> Option<Entity> {
    let system = start.system?;
    let pad = start
        .planet
        .and_then(|planet| systems.get(system.index())?.find_stellar(planet))
        .map_or(Point::ZERO, |object| object.position);

    let mut flagship = None;
    for &model in &start.ships {
        let Some(mut ship) = build_ship(catalog, model, start.government) else {
            log::warn!("start {}: unknown ship model {:?}", start.name, model);
            continue;
        };
        ship.is_player = flagship.is_none();
        ship.is_special = true;
        ship.system = Some(system);
        ship.body.position = pad + Angle::random(rng).unit() * (random::real(rng) * PLANET_SPAWN_SPREAD);
        ship.body.facing = Angle::random(rng);
        ship.body.zoom = 0.0;
        ship.parent = flagship;
        let entity = spawn_ship(world, serials, ship);
        match flagship {
            None => flagship = Some(entity),
            Some(lead) => {
                if let Ok(lead) = world.query_one_mut::<&mut Ship>(lead) {
                    lead.escorts.push(entity);
                }
            }
        }
    }
    if flagship.is_some() {
        log::info!("{} starts in system {:?}", start.name, system);
    }
    flagship
}

/// A fully supplied ship of `model`, flying for `government`.
pub fn build_ship(catalog: &Catalog, model: ShipModelId, government: Option<GovernmentId>) -> Option<Ship> {
    let template = catalog.ship(model)?;
    let mut ship = Ship::new(model, template, catalog);
    ship.body.government = government;
    Some(ship)
}

/// Spawn one ship in flight at `position`, facing `facing`.
#[allow(clippy::too_many_arguments)]
pub fn spawn_at(
    world: &mut World,
    serials: &mut Serials,
    catalog: &Catalog,
    model: ShipModelId,
    government: Option<GovernmentId>,
    system: SystemId,
    position: Point,
    facing: Angle,
) -> Option<Entity> {
    let mut ship = build_ship(catalog, model, government)?;
    ship.system = Some(system);
    ship.body.position = position;
    ship.body.facing = facing;
    Some(spawn_ship(world, serials, ship))
}
