//! Anti-missile and tractor beam sweeps.
//!
//! Only ships whose last firing pass found a special weapon take part.
//! Each special hardpoint gets at most one shot per tick.

use hecs::{Entity, World};
use rand::Rng;

use corsair_core::catalog::Catalog;
use corsair_core::geometry::Point;
use corsair_core::government::Politics;
use corsair_core::types::{GovernmentId, OutfitId, SystemId};

use crate::cargo::Flotsam;
use crate::hardpoint::Hardpoint;
use crate::projectile::Projectile;
use crate::ship::Ship;
use crate::systems::collision::Grids;
use crate::systems::Frame;
use crate::world::ordered;

/// A special weapon slot ready to sweep.
struct Station {
    index: usize,
    weapon: OutfitId,
    anti_missile: u32,
    tractor_beam: f64,
    reach: f64,
}

pub fn run<R: Rng + ?Sized>(
    world: &mut World,
    catalog: &Catalog,
    grids: &Grids,
    politics: &Politics,
    rng: &mut R,
    frame: &mut Frame,
) {
    let flotsam = ordered::<Flotsam>(world);
    for entity in ordered::<Ship>(world) {
        let Some((position, radius, government, system, stations)) = stations(world, entity, catalog) else {
            continue;
        };
        for station in stations {
            if station.anti_missile > 0 {
                let candidates = grids
                    .missiles(system)
                    .map(|grid| grid.circle(position, station.reach + radius))
                    .unwrap_or_default();
                for missile in candidates {
                    let Some((point, strength)) = missile_in_reach(world, missile, catalog, government, politics)
                    else {
                        continue;
                    };
                    if !fire(world, entity, station.index, catalog, point, frame) {
                        continue;
                    }
                    let Some(weapon) = catalog.weapon(station.weapon) else {
                        break;
                    };
                    if Hardpoint::anti_missile_roll(weapon, strength, rng) {
                        if let Ok(projectile) = world.query_one_mut::<&mut Projectile>(missile) {
                            projectile.kill();
                        }
                    }
                    break;
                }
            } else if station.tractor_beam > 0.0 {
                for &item in &flotsam {
                    let Some(point) = world.get::<&Flotsam>(item).ok().and_then(|f| {
                        let pullable = f.system == system
                            && f.source != Some(entity)
                            && !f.is_expired()
                            && f.body.position.distance(position) <= station.reach + radius;
                        pullable.then_some(f.body.position)
                    }) else {
                        continue;
                    };
                    if !fire(world, entity, station.index, catalog, point, frame) {
                        continue;
                    }
                    if let Ok(pulled) = world.query_one_mut::<&mut Flotsam>(item) {
                        pulled.pull(position, station.tractor_beam);
                    }
                    break;
                }
            }
        }
    }
}

type Stations = (Point, f64, Option<GovernmentId>, Option<SystemId>, Vec<Station>);

fn stations(world: &World, entity: Entity, catalog: &Catalog) -> Option<Stations> {
    let ship = world.get::<&Ship>(entity).ok()?;
    if !ship.has_special_weapons || ship.system.is_none() || !ship.can_fire() {
        return None;
    }
    let stations = ship
        .armament
        .hardpoints()
        .iter()
        .enumerate()
        .filter_map(|(index, hardpoint)| {
            let id = hardpoint.outfit?;
            let weapon = catalog.weapon(id)?;
            weapon.is_special().then_some(Station {
                index,
                weapon: id,
                anti_missile: weapon.anti_missile,
                tractor_beam: weapon.tractor_beam,
                reach: weapon.velocity,
            })
        })
        .collect();
    Some((
        ship.body.position,
        ship.body.radius(),
        ship.body.government,
        ship.system,
        stations,
    ))
}

/// Position and strength of a hostile missile that has not been shot down.
fn missile_in_reach(
    world: &World,
    missile: Entity,
    catalog: &Catalog,
    government: Option<GovernmentId>,
    politics: &Politics,
) -> Option<(Point, u32)> {
    let projectile = world.get::<&Projectile>(missile).ok()?;
    if projectile.shot_down || projectile.is_dead() {
        return None;
    }
    let hostile = match (government, projectile.body.government) {
        (Some(own), Some(other)) => politics.is_enemy(own, other),
        _ => false,
    };
    let strength = catalog.weapon(projectile.weapon)?.missile_strength;
    (hostile && strength > 0).then_some((projectile.body.position, strength))
}

fn fire(world: &mut World, entity: Entity, index: usize, catalog: &Catalog, point: Point, frame: &mut Frame) -> bool {
    world
        .query_one_mut::<&mut Ship>(entity)
        .map(|ship| ship.fire_special(index, catalog, point, &mut frame.cues))
        .unwrap_or(false)
}
