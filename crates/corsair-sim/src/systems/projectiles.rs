//! Projectile system: advance every projectile, spawn submunitions on
//! death, and resolve hits against ships and asteroid fields.
//!
//! Damage lands the moment a hit is found, so a ship destroyed by one
//! projectile is already untargetable for the next one in the same tick.

use std::collections::{BTreeMap, HashMap};

use hecs::{Entity, World};
use rand::Rng;

use corsair_core::catalog::Catalog;
use corsair_core::events::{ShipEvent, ShipEventKind};
use corsair_core::geometry::Point;
use corsair_core::government::Politics;
use corsair_core::types::{EntityRef, GovernmentId, SystemId};
use corsair_core::weapon::Weapon;

use crate::collision::GridBody;
use crate::damage::{blast_scale, minable_damage};
use crate::environment::{AsteroidField, FieldHit};
use crate::projectile::{Flight, Projectile, TargetState};
use crate::ship::Ship;
use crate::systems::collision::Grids;
use crate::systems::Frame;
use crate::world::{entity_ref, ordered};

/// Who is responsible for a hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Attacker {
    pub entity: Option<EntityRef>,
    pub government: Option<GovernmentId>,
}

/// Apply one weapon hit to a ship, with bookkeeping: the damage ledger,
/// hit, disable and destroy events, and provocation of the victim.
#[allow(clippy::too_many_arguments)]
pub fn strike(
    world: &mut World,
    victim: Entity,
    weapon: &Weapon,
    scale: f64,
    distance_traveled: f64,
    source: Option<Point>,
    attacker: Attacker,
    politics: &mut Politics,
    frame: &mut Frame,
) {
    let Ok(ship) = world.query_one_mut::<&mut Ship>(victim) else {
        return;
    };
    if ship.is_destroyed() {
        return;
    }
    let before = ship.shields + ship.hull;
    let dealt = ship.take_damage(weapon, scale, distance_traveled, source);
    let after = ship.shields + ship.hull;
    frame.ledger.record(&dealt, before, after);
    let victim_government = ship.body.government;

    let target = Some(entity_ref(victim));
    frame
        .events
        .push(ShipEvent::new(ShipEventKind::Hit, attacker.entity, target));
    if dealt.disabled {
        frame
            .events
            .push(ShipEvent::new(ShipEventKind::Disable, attacker.entity, target));
    }
    if dealt.destroyed {
        frame
            .events
            .push(ShipEvent::new(ShipEventKind::Destroy, attacker.entity, target));
    }

    if let (Some(victim), Some(offender)) = (victim_government, attacker.government) {
        provoke(politics, victim, offender, attacker.entity, target, frame);
    }
}

/// The victim's government and everyone allied with it turn on the offender.
fn provoke(
    politics: &mut Politics,
    victim: GovernmentId,
    offender: GovernmentId,
    actor: Option<EntityRef>,
    target: Option<EntityRef>,
    frame: &mut Frame,
) {
    let mut index = 0;
    while let Some(government) = politics.get(GovernmentId(index)) {
        let id = GovernmentId(index);
        index += 1;
        if id != victim && !government.allies.contains(&victim) {
            continue;
        }
        if politics.provoke(id, offender) {
            frame.events.push(ShipEvent::new(
                ShipEventKind::Provoke {
                    victim: id,
                    offender,
                },
                actor,
                target,
            ));
        }
    }
}

/// Damage every ship caught in a blast centered on `center`.
#[allow(clippy::too_many_arguments)]
pub fn blast(
    world: &mut World,
    grids: &Grids,
    system: Option<SystemId>,
    center: Point,
    weapon: &Weapon,
    distance_traveled: f64,
    attacker: Attacker,
    politics: &mut Politics,
    frame: &mut Frame,
) {
    let Some(grid) = grids.ships(system) else {
        return;
    };
    for victim in grid.circle(center, weapon.blast_radius) {
        let Ok(ship) = world.get::<&Ship>(victim) else {
            continue;
        };
        if weapon.safe && ship.body.government == attacker.government {
            continue;
        }
        let scale = blast_scale(weapon, ship.body.edge_distance(center));
        drop(ship);
        strike(
            world,
            victim,
            weapon,
            scale,
            distance_traveled,
            Some(center),
            attacker,
            politics,
            frame,
        );
    }
}

/// Tracking state of every ship, for homing projectiles.
pub fn target_states(world: &World) -> HashMap<Entity, TargetState> {
    world
        .query::<&Ship>()
        .iter()
        .map(|(entity, ship)| (entity, ship.target_state(entity)))
        .collect()
}

/// Everything the projectile system reads besides the world.
pub struct Inputs<'a> {
    pub catalog: &'a Catalog,
    pub grids: &'a Grids,
}

pub fn run<R: Rng + ?Sized>(
    world: &mut World,
    inputs: &Inputs<'_>,
    fields: &mut BTreeMap<SystemId, AsteroidField>,
    politics: &mut Politics,
    rng: &mut R,
    frame: &mut Frame,
) {
    let catalog = inputs.catalog;
    let grids = inputs.grids;
    explode_ships(world, catalog, grids, politics, frame);

    let targets = target_states(world);
    for entity in ordered::<Projectile>(world) {
        let Some(mut projectile) = world.get::<&Projectile>(entity).ok().map(|p| (*p).clone()) else {
            continue;
        };
        let Some(weapon) = catalog.weapon(projectile.weapon) else {
            frame.despawn.push(entity);
            continue;
        };
        if projectile.is_dead() {
            frame.despawn.push(entity);
            continue;
        }

        let target = projectile.target.and_then(|t| targets.get(&t));
        if let Flight::Dead(death) = projectile.advance(weapon, target, rng, &mut frame.cues) {
            for sub in &weapon.submunitions {
                if !Projectile::spawns_on(sub, death) {
                    continue;
                }
                let Some(child) = catalog.weapon(sub.weapon) else {
                    continue;
                };
                for _ in 0..sub.count {
                    frame
                        .projectiles
                        .push(Projectile::submunition(&projectile, weapon, sub, child, rng));
                }
            }
            frame.despawn.push(entity);
            continue;
        }

        let finished = collide(world, &mut projectile, weapon, inputs, fields, politics, rng, frame);
        if finished {
            frame.despawn.push(entity);
        } else if let Ok(slot) = world.query_one_mut::<&mut Projectile>(entity) {
            *slot = projectile;
        }
    }
}

/// Resolve this tick's segment of one projectile. Returns true when the
/// projectile is used up.
#[allow(clippy::too_many_arguments)]
fn collide<R: Rng + ?Sized>(
    world: &mut World,
    projectile: &mut Projectile,
    weapon: &Weapon,
    inputs: &Inputs<'_>,
    fields: &mut BTreeMap<SystemId, AsteroidField>,
    politics: &mut Politics,
    rng: &mut R,
    frame: &mut Frame,
) -> bool {
    let velocity = projectile.body.velocity;
    let start = projectile.body.position - velocity;
    let attacker = Attacker {
        entity: projectile.shooter.map(entity_ref),
        government: projectile.body.government,
    };
    let grid = inputs.grids.ships(projectile.system);
    let view: &Politics = politics;

    // Proximity fuses go off as soon as an enemy is inside the trigger radius.
    if weapon.trigger_radius > 0.0 {
        let triggered = grid.is_some_and(|grid| {
            grid.circle_bodies(projectile.body.position, weapon.trigger_radius)
                .into_iter()
                .any(|body| accepts(projectile, weapon, body, view))
        });
        if triggered {
            detonate(world, projectile, weapon, 1.0, None, inputs, attacker, politics, frame);
            return projectile.explode(weapon, 1.0, &mut frame.cues);
        }
    }

    let ship_hit =
        grid.and_then(|grid| grid.line(start, velocity, |body| accepts(projectile, weapon, body, view)));
    let field_hit = projectile
        .system
        .and_then(|system| fields.get(&system))
        .and_then(|field| field.line(start, velocity));

    match (ship_hit, field_hit) {
        (Some(hit), field) if field.map_or(true, |f| hit.t <= f.t()) => {
            detonate(world, projectile, weapon, hit.t, Some(hit.key), inputs, attacker, politics, frame);
            let used_up = projectile.explode(weapon, hit.t, &mut frame.cues);
            projectile.phased = Some(hit.key);
            used_up
        }
        (_, Some(field_hit)) => {
            if let FieldHit::Minable { index, .. } = field_hit {
                mine(projectile, weapon, index, inputs.catalog, fields, rng, frame);
            }
            projectile.explode(weapon, field_hit.t(), &mut frame.cues)
        }
        _ => {
            projectile.phased = None;
            false
        }
    }
}

/// Apply a projectile's damage at fraction `t` of its segment: to the
/// struck ship, or to everything in the blast radius.
#[allow(clippy::too_many_arguments)]
fn detonate(
    world: &mut World,
    projectile: &Projectile,
    weapon: &Weapon,
    t: f64,
    struck: Option<Entity>,
    inputs: &Inputs<'_>,
    attacker: Attacker,
    politics: &mut Politics,
    frame: &mut Frame,
) {
    let point = projectile.body.position - projectile.body.velocity * (1.0 - t);
    let traveled = projectile.distance_traveled;
    if weapon.blast_radius > 0.0 {
        blast(
            world,
            inputs.grids,
            projectile.system,
            point,
            weapon,
            traveled,
            attacker,
            politics,
            frame,
        );
    } else if let Some(victim) = struck {
        strike(world, victim, weapon, 1.0, traveled, Some(point), attacker, politics, frame);
    }
}

fn mine<R: Rng + ?Sized>(
    projectile: &Projectile,
    weapon: &Weapon,
    index: usize,
    catalog: &Catalog,
    fields: &mut BTreeMap<SystemId, AsteroidField>,
    rng: &mut R,
    frame: &mut Frame,
) {
    let Some(field) = projectile.system.and_then(|system| fields.get_mut(&system)) else {
        return;
    };
    let Some(max_hull) = field.minables().get(index).map(|m| m.max_hull) else {
        return;
    };
    let amount = minable_damage(weapon, 1.0, max_hull);
    if field.damage_minable(index, amount) {
        let flotsam = field.break_up(index, catalog, projectile.system, rng, &mut frame.cues);
        frame.flotsam.extend(flotsam);
    }
}

/// Whether a projectile may strike this body: its own target always, an
/// enemy of its government otherwise, and never the ship that fired it
/// or the one it is already passing through.
fn accepts(projectile: &Projectile, weapon: &Weapon, body: &GridBody<Entity>, politics: &Politics) -> bool {
    if Some(body.key) == projectile.shooter || Some(body.key) == projectile.phased {
        return false;
    }
    if Some(body.key) == projectile.target {
        return true;
    }
    if weapon.phasing {
        return false;
    }
    match (projectile.body.government, body.government) {
        (Some(own), Some(other)) => politics.is_enemy(own, other),
        (None, _) => true,
        (Some(_), None) => false,
    }
}

/// Dying ships whose explosion weapon went off during movement.
fn explode_ships(world: &mut World, catalog: &Catalog, grids: &Grids, politics: &mut Politics, frame: &mut Frame) {
    for blast_at in std::mem::take(&mut frame.blasts) {
        let Some(weapon) = catalog.ship(blast_at.model).and_then(|m| m.explosion_weapon.as_ref()) else {
            continue;
        };
        let attacker = Attacker {
            entity: Some(entity_ref(blast_at.source)),
            government: blast_at.government,
        };
        blast(
            world,
            grids,
            blast_at.system,
            blast_at.position,
            weapon,
            0.0,
            attacker,
            politics,
            frame,
        );
    }
}
