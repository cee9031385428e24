//! Fleet spawning: periodic NPC traffic in the focus system.

use hecs::{Entity, World};
use rand::Rng;

use corsair_core::catalog::Catalog;
use corsair_core::constants::{FLEET_ENTRY_DISTANCE, PLANET_SPAWN_SPREAD};
use corsair_core::geometry::{Angle, Point};
use corsair_core::random;
use corsair_core::types::{FleetId, SystemId};
use corsair_core::universe::System;

use crate::ship::Ship;
use crate::world::{spawn_ship, Serials};

/// Roll every periodic fleet of `system`; each comes in with odds
/// `1 / period` per tick.
pub fn run<R: Rng + ?Sized>(
    world: &mut World,
    serials: &mut Serials,
    catalog: &Catalog,
    systems: &[System],
    system: SystemId,
    rng: &mut R,
) -> Vec<Entity> {
    let Some(here) = systems.get(system.index()) else {
        return Vec::new();
    };
    let mut spawned = Vec::new();
    for periodic in &here.fleets {
        if random::int(rng, periodic.period) == 0 {
            spawned.extend(place_fleet(world, serials, catalog, systems, periodic.item, system, rng));
        }
    }
    spawned
}

/// Where a fleet shows up.
enum Entry {
    /// Jumping in from a neighbor.
    Link(SystemId),
    /// Taking off from a planet at this position.
    Planet(Point),
}

/// Pick a variant of `fleet` and bring it into `system`. Returns the
/// spawned entities, flagship first. Carried fighters are not spawned
/// separately.
pub fn place_fleet<R: Rng + ?Sized>(
    world: &mut World,
    serials: &mut Serials,
    catalog: &Catalog,
    systems: &[System],
    fleet_id: FleetId,
    system: SystemId,
    rng: &mut R,
) -> Vec<Entity> {
    let (Some(fleet), Some(here)) = (catalog.fleets.get(fleet_id), systems.get(system.index())) else {
        return Vec::new();
    };
    let weights: Vec<u32> = fleet.variants.iter().map(|v| v.weight).collect();
    let Some(variant) = random::weighted_pick(rng, &weights).and_then(|i| fleet.variants.get(i)) else {
        return Vec::new();
    };
    let Some(entry) = choose_entry(catalog, here, rng) else {
        log::debug!("{} has nowhere to enter {}", fleet.name, here.name);
        return Vec::new();
    };

    let government = fleet.government.or(here.government);
    let commodities: Vec<&str> = here.commodity_prices.keys().map(String::as_str).collect();

    let mut ships: Vec<Ship> = Vec::new();
    for model_id in variant.expanded() {
        let Some(model) = catalog.ship(model_id) else {
            continue;
        };
        let mut ship = Ship::new(model_id, model, catalog);
        ship.body.government = government;
        ship.personality = fleet.personality.clone();
        augment_crew(&mut ship, rng);
        let space = ship.attr("cargo space").max(0.0) as u32;
        ship.cargo.fill_random(&commodities, fleet.cargo, space, rng);

        if ship.can_be_carried() {
            let mut fighter = Some(ship);
            for carrier in &mut ships {
                let Some(candidate) = fighter.take() else {
                    break;
                };
                if let Err(back) = carrier.carry(candidate) {
                    fighter = Some(*back);
                }
            }
            match fighter {
                Some(unplaced) => ships.push(unplaced),
                None => continue,
            }
        } else {
            ships.push(ship);
        }
    }
    if ships.is_empty() {
        return Vec::new();
    }

    for ship in &mut ships {
        match entry {
            Entry::Link(source) => enter_from(ship, source, system, systems, rng),
            Entry::Planet(position) => take_off(ship, system, position, rng),
        }
    }

    let entities: Vec<Entity> = ships
        .into_iter()
        .map(|ship| spawn_ship(world, serials, ship))
        .collect();
    let (&lead, escorts) = match entities.split_first() {
        Some(split) => split,
        None => return entities,
    };
    for &escort in escorts {
        if let Ok(ship) = world.query_one_mut::<&mut Ship>(escort) {
            ship.parent = Some(lead);
        }
    }
    if let Ok(ship) = world.query_one_mut::<&mut Ship>(lead) {
        ship.escorts.extend_from_slice(escorts);
    }
    log::debug!("{} ({} ships) enters {}", fleet.name, entities.len(), here.name);
    entities
}

/// A linked system with odds `links / (links + inhabited planets)`,
/// otherwise a random inhabited planet.
fn choose_entry<R: Rng + ?Sized>(catalog: &Catalog, here: &System, rng: &mut R) -> Option<Entry> {
    let planets: Vec<Point> = here
        .objects
        .iter()
        .filter(|object| {
            object
                .planet
                .and_then(|planet| catalog.planet(planet))
                .is_some_and(|planet| planet.inhabited)
        })
        .map(|object| object.position)
        .collect();
    let links = here.links.len() as u32;
    let total = links + planets.len() as u32;
    if total == 0 {
        return None;
    }
    let pick = random::int(rng, total);
    if pick < links {
        Some(Entry::Link(here.links[pick as usize]))
    } else {
        Some(Entry::Planet(planets[(pick - links) as usize]))
    }
}

/// Place a ship out in `source`, already jumping toward `system`.
fn enter_from<R: Rng + ?Sized>(
    ship: &mut Ship,
    source: SystemId,
    system: SystemId,
    systems: &[System],
    rng: &mut R,
) {
    let heading = match (systems.get(source.index()), systems.get(system.index())) {
        (Some(from), Some(to)) if from.position != to.position => {
            Angle::from_vector(to.position - from.position)
        }
        _ => Angle::random(rng),
    };
    ship.system = Some(source);
    ship.body.position = Angle::random(rng).unit() * FLEET_ENTRY_DISTANCE;
    ship.body.facing = heading;
    ship.body.velocity = Point::ZERO;
    ship.target_system = Some(system);
    ship.hyperspace_system = Some(system);
    ship.using_jump_drive = !systems
        .get(source.index())
        .is_some_and(|from| from.is_linked(system))
        && ship.has_jump_drive();
}

/// Place a ship on a planet, just starting to take off.
fn take_off<R: Rng + ?Sized>(ship: &mut Ship, system: SystemId, planet: Point, rng: &mut R) {
    ship.system = Some(system);
    ship.body.position = planet + Angle::random(rng).unit() * (random::real(rng) * PLANET_SPAWN_SPREAD);
    ship.body.facing = Angle::random(rng);
    ship.body.velocity = Point::ZERO;
    ship.body.zoom = 0.0;
}

/// Fill some of the spare bunks.
fn augment_crew<R: Rng + ?Sized>(ship: &mut Ship, rng: &mut R) {
    let bunks = ship.attr("bunks").max(0.0) as u32;
    let spare = bunks.saturating_sub(ship.crew);
    ship.crew += random::int(rng, spare + 1);
}
