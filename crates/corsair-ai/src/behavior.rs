//! Per-ship decision tree for computer-controlled ships.
//!
//! Pure functions: a [`AiContext`] and a ship index go in, [`ShipOrders`]
//! come out. Decisions work on a private copy of the ship's view so that
//! target changes made early in the tree are seen by later branches.

use rand::Rng;

use corsair_core::command::Command;
use corsair_core::geometry::Point;
use corsair_core::random;
use corsair_core::types::{PlanetId, SystemId};

use crate::distance_map::DistanceMap;
use crate::maneuver::{
    circle_around, move_to, move_to_attack, move_to_planet, prepare_for_hyperspace, stop, thrust,
    turn_toward,
};
use crate::targeting::{aim_turrets, auto_fire, find_target, target_aim};
use crate::view::{AiContext, ShipOrders, ShipView};

/// Ticks between routine target re-evaluations.
pub const TARGET_INTERVAL: u64 = 32;

/// Escorts that are timid stay within this distance of their parent.
const TIMID_LEASH: f64 = 500.0;

/// Targets beyond this distance are ignored by escorts unless heroic.
const ESCORT_ENGAGE_RANGE: f64 = 2000.0;

/// Decide what the ship at `index` does this tick.
pub fn step<R: Rng + ?Sized>(ctx: &AiContext<'_>, index: usize, rng: &mut R) -> ShipOrders {
    let Some(ship) = ctx.ships.get(index) else {
        return ShipOrders::default();
    };
    let mut orders = ShipOrders::keep(ship);
    if ship.is_player || ship.system.is_none() || ship.personality.derelict || !ship.can_act() {
        return orders;
    }

    let mut me = ship.clone();
    let mut command = Command::NONE;

    let current = ctx.ship(me.target_ship);
    let stale = current.map_or(true, |t| {
        !t.is_targetable
            || t.is_destroyed
            || t.system != me.system
            || (t.is_disabled && me.personality.disables)
    });
    if stale || (ctx.step + index as u64) % TARGET_INTERVAL == 0 {
        me.target_ship = find_target(ctx, &me);
    }
    command.merge(&auto_fire(ctx, &me));
    orders.turret_aim = aim_turrets(ctx, &me);

    // Cowards abandon their fleets when near death.
    let health = 0.5 * me.shields + me.hull;
    if health < 1.0 && me.personality.coward && me.parent.is_some() {
        log::debug!("ship {} abandons its fleet", me.id);
        me.parent = None;
    }

    if me.can_be_carried && return_to_carrier(ctx, &mut me, &mut command) {
        return finish(me, command, orders);
    }

    let target_distance = ctx
        .ship(me.target_ship)
        .map_or(f64::INFINITY, |t| t.position.distance(me.position));
    let parent = ctx.ship(me.parent);

    if must_recall(ctx, &me) {
        stop(&me, &mut command, 0.0);
    } else {
        match parent {
            None => move_independent(ctx, &mut me, &mut command, rng),
            Some(p) if p.is_destroyed || p.is_disabled => {
                move_independent(ctx, &mut me, &mut command, rng)
            }
            Some(p) if p.system != me.system => {
                if me.personality.staying || !(me.has_hyperdrive || me.has_jump_drive) {
                    move_independent(ctx, &mut me, &mut command, rng)
                } else {
                    move_escort(ctx, &mut me, &mut command)
                }
            }
            Some(p) if me.personality.staying || ctx.politics.is_enemy(p.government, me.government) => {
                move_independent(ctx, &mut me, &mut command, rng)
            }
            Some(p) if parent_is_jumping(p) && me.jumps_remaining > 0 => {
                move_escort(ctx, &mut me, &mut command)
            }
            Some(p) if me.personality.timid && p.position.distance(me.position) > TIMID_LEASH => {
                move_escort(ctx, &mut me, &mut command)
            }
            Some(_)
                if me.target_ship.is_some()
                    && (target_distance < ESCORT_ENGAGE_RANGE || me.personality.heroic) =>
            {
                move_independent(ctx, &mut me, &mut command, rng)
            }
            Some(_) => move_escort(ctx, &mut me, &mut command),
        }
    }

    if me.has_afterburner && command.has(Command::FORWARD) && target_distance < 1000.0 {
        if let Some(target) = ctx.ship(me.target_ship) {
            if !target.is_disabled && target.is_targetable && ctx.is_enemy(&me, target) {
                command.set(Command::AFTERBURNER);
            }
        }
    }

    finish(me, command, orders)
}

fn finish(me: ShipView, command: Command, mut orders: ShipOrders) -> ShipOrders {
    orders.command = command;
    orders.target_ship = me.target_ship;
    orders.target_system = me.target_system;
    orders.target_planet = me.target_planet;
    orders.parent = me.parent;
    orders
}

fn parent_is_jumping(parent: &ShipView) -> bool {
    parent.is_entering_hyperspace
        || (parent.commands.has(Command::HYPERSPACE) && parent.target_system.is_some())
}

/// Fighters dock with their carrier unless it is launching. Returns true
/// when the fighter is busy returning.
fn return_to_carrier(ctx: &AiContext<'_>, me: &mut ShipView, command: &mut Command) -> bool {
    let parent = ctx.ship(me.parent);
    let usable = parent.is_some_and(|p| {
        p.bays_free > 0
            && !p.is_destroyed
            && p.system == me.system
            && !ctx.politics.is_enemy(p.government, me.government)
    });
    if !usable {
        // Orphaned fighters adopt any friendly carrier with room.
        me.parent = ctx
            .ships
            .iter()
            .find(|other| {
                other.government == me.government
                    && other.system == me.system
                    && !other.is_disabled
                    && !other.can_be_carried
                    && other.bays_free > 0
            })
            .map(|other| other.id);
        return false;
    }
    let Some(parent) = parent else {
        return false;
    };
    if parent.commands.has(Command::LAUNCH) {
        return false;
    }
    me.target_ship = Some(parent.id);
    move_to(me, command, parent.position, 40.0, 0.8);
    command.set(Command::BOARD);
    true
}

/// Carriers hold still while their fighters are out and nothing needs
/// shooting.
fn must_recall(ctx: &AiContext<'_>, me: &ShipView) -> bool {
    if me.bays_free == 0 || me.commands.has(Command::LAUNCH) || me.target_ship.is_some() {
        return false;
    }
    ctx.ships.iter().any(|escort| {
        escort.parent == Some(me.id)
            && escort.can_be_carried
            && escort.system == me.system
            && !escort.is_disabled
    })
}

/// Wander between systems and planets, fighting whatever is targeted.
pub fn move_independent<R: Rng + ?Sized>(
    ctx: &AiContext<'_>,
    me: &mut ShipView,
    command: &mut Command,
    rng: &mut R,
) {
    if let Some(target) = ctx.ship(me.target_ship) {
        if ctx.is_enemy(me, target) {
            if me.personality.plunders && target.is_disabled {
                move_to(me, command, target.position, 40.0, 0.8);
                command.set(Command::BOARD);
            } else {
                attack(me, command, target);
            }
            return;
        }
        if me.scan_range > 0.0 && !ctx.has_scanned(me, target) {
            circle_around(me, command, target.position);
            command.set(Command::SCAN);
            return;
        }
        me.target_ship = None;
    }

    // Ships that only broke formation to fight make no travel plans.
    if me.parent.is_some() && !me.personality.staying {
        if me.jumps_remaining == 0 {
            refuel(ctx, me, command);
        }
        return;
    }

    if me.target_system.is_none() && me.target_planet.is_none() && !me.personality.staying {
        if !choose_destination(ctx, me, command, rng) {
            return;
        }
    }

    if let Some(target_system) = me.target_system {
        let direction = me
            .system
            .and_then(|here| ctx.jump_direction(here, target_system))
            .unwrap_or(Point::ZERO);
        prepare_for_hyperspace(me, command, direction);
        let must_wait = me.bays_free > 0
            && ctx.ships.iter().any(|escort| {
                escort.parent == Some(me.id) && escort.can_be_carried && !escort.is_disabled
            });
        if !must_wait {
            command.set(Command::HYPERSPACE);
        }
    } else if let Some(planet) = me.target_planet {
        move_to_planet(ctx, me, command);
        if !me.personality.staying {
            command.set(Command::LAND);
        } else if ctx
            .stellar(me.system, planet)
            .is_some_and(|object| object.position.distance(me.position) < 100.0)
        {
            me.target_planet = None;
        }
    } else if me.personality.staying {
        let Some(system) = me.system.and_then(|id| ctx.system(id)) else {
            return;
        };
        let planets: Vec<_> = system.objects.iter().filter_map(|o| o.planet).collect();
        if !planets.is_empty() {
            let choice = random::int(rng, planets.len() as u32) as usize;
            me.target_planet = Some(planets[choice]);
        }
    }
}

/// Weighted pick among outgoing links (favoring the current heading) and
/// landable planets. Returns false when the ship should simply hover.
fn choose_destination<R: Rng + ?Sized>(
    ctx: &AiContext<'_>,
    me: &mut ShipView,
    command: &mut Command,
    rng: &mut R,
) -> bool {
    let Some(system) = me.system.and_then(|id| ctx.system(id)) else {
        return false;
    };
    let jumps = me.jumps_remaining;
    // With one jump left, landing becomes much more likely.
    let planet_weight = if jumps > 0 { 1 + 40 / jumps } else { 1 };

    let links = if me.has_jump_drive {
        &system.neighbors
    } else {
        &system.links
    };
    let mut system_weights = Vec::new();
    if jumps > 0 {
        let facing = me.facing.unit();
        for &link in links {
            let direction = ctx
                .system(link)
                .map_or(Point::ZERO, |other| other.position - system.position);
            let weight = (11.0 + 10.0 * facing.dot(direction.normalize_or_zero())) as u32;
            system_weights.push(weight);
        }
    }
    let system_total: u32 = system_weights.iter().sum();

    let planets: Vec<_> = system
        .objects
        .iter()
        .filter_map(|object| object.planet)
        .filter(|&id| {
            ctx.catalog
                .planet(id)
                .is_some_and(|planet| planet.has_spaceport && planet.landable)
        })
        .collect();
    let total = system_total + planet_weight * planets.len() as u32;

    if total == 0 {
        // Nothing to do here: hover over the first stellar object.
        if let Some(object) = system.objects.first() {
            move_to(me, command, object.position, object.radius, 1.0);
        }
        return false;
    }

    let mut choice = random::int(rng, total);
    if choice < system_total {
        for (i, weight) in system_weights.iter().enumerate() {
            if choice < *weight {
                me.target_system = Some(links[i]);
                break;
            }
            choice -= weight;
        }
    } else {
        let index = ((choice - system_total) / planet_weight) as usize;
        me.target_planet = planets.get(index).copied();
    }
    log::debug!(
        "ship {} heads for system {:?} planet {:?}",
        me.id,
        me.target_system,
        me.target_planet
    );
    true
}

/// Engage `target`, keeping long-range boats at a distance.
fn attack(me: &ShipView, command: &mut Command, target: &ShipView) {
    let shortest_range = me
        .weapons
        .iter()
        .filter(|w| !w.is_special)
        .map(|w| {
            let multiplier = if w.is_homing || w.is_turret { 1.0 } else { 0.5 };
            multiplier * w.range()
        })
        .fold(4000.0, f64::min);

    command.set(Command::LAUNCH);
    let d = target.position - me.position;
    if shortest_range > 1000.0 && d.length() < 0.5 * shortest_range {
        command.set_turn(turn_toward(me, -d));
        if me.facing.unit().dot(d) <= 0.0 {
            thrust(command, 1.0);
        }
        return;
    }
    move_to_attack(me, command, target, target_aim(me, target));
}

/// Follow the parent: across systems, down to planets, into hyperspace,
/// or in a loose orbit around it.
pub fn move_escort(ctx: &AiContext<'_>, me: &mut ShipView, command: &mut Command) {
    let Some(parent) = ctx.ship(me.parent) else {
        return;
    };
    let has_drive = me.has_hyperdrive || me.has_jump_drive;
    let is_staying = me.personality.staying || !has_drive;
    let parent_here = parent.system == me.system;

    if has_drive && me.jumps_remaining == 0 {
        refuel(ctx, me, command);
    } else if !parent_here && !is_staying {
        if me.target_system.is_none() && me.target_planet.is_none() {
            me.target_system = route_toward(ctx, me, parent.system);
            if me.target_system.is_none() {
                refuel(ctx, me, command);
            }
        }
        if me.target_planet.is_some() {
            move_to_planet(ctx, me, command);
            command.set(Command::LAND);
        } else if let Some(target_system) = me.target_system {
            let direction = jump_vector(ctx, me, target_system);
            prepare_for_hyperspace(me, command, direction);
            command.set(Command::HYPERSPACE);
        }
    } else if parent.commands.has(Command::LAND) && parent.target_planet.is_some() && parent_here {
        me.target_planet = parent.target_planet;
        move_to_planet(ctx, me, command);
        if parent.is_landing {
            command.set(Command::LAND);
        }
    } else if parent.commands.has(Command::BOARD) && parent.target_ship == Some(me.id) {
        stop(me, command, 0.2);
    } else if parent_is_jumping(parent) && !is_staying {
        let destination = parent.hyperspace_system.or(parent.target_system);
        me.target_system = destination.and_then(|to| route_toward(ctx, me, Some(to)));
        match me.target_system {
            None => refuel(ctx, me, command),
            Some(target_system) => {
                let direction = jump_vector(ctx, me, target_system);
                prepare_for_hyperspace(me, command, direction);
                if parent.is_entering_hyperspace {
                    command.set(Command::HYPERSPACE);
                }
            }
        }
    } else {
        circle_around(me, command, parent.position);
    }
}

/// First hop from the ship's system toward `destination`.
fn route_toward(
    ctx: &AiContext<'_>,
    me: &ShipView,
    destination: Option<SystemId>,
) -> Option<SystemId> {
    let from = me.system?;
    let to = destination?;
    if from == to {
        return None;
    }
    let map = DistanceMap::toward(ctx.catalog, from, to, me.has_hyperdrive, me.has_jump_drive, None);
    map.route(from)
}

fn jump_vector(ctx: &AiContext<'_>, me: &ShipView, to: SystemId) -> Point {
    me.system
        .and_then(|from| ctx.jump_direction(from, to))
        .unwrap_or(Point::ZERO)
}

/// Land somewhere with a spaceport, preferring the parent's destination.
fn refuel(ctx: &AiContext<'_>, me: &mut ShipView, command: &mut Command) {
    let landable = |id: PlanetId| {
        ctx.catalog
            .planet(id)
            .is_some_and(|planet| planet.has_spaceport && planet.landable)
    };
    let parent_planet = ctx
        .ship(me.parent)
        .and_then(|p| p.target_planet)
        .filter(|&id| landable(id) && ctx.stellar(me.system, id).is_some());
    if parent_planet.is_some() {
        me.target_planet = parent_planet;
    } else if me.target_planet.is_none() {
        if let Some(system) = me.system.and_then(|id| ctx.system(id)) {
            me.target_planet = system
                .objects
                .iter()
                .filter(|object| object.planet.is_some_and(landable))
                .min_by(|a, b| {
                    a.position
                        .distance(me.position)
                        .total_cmp(&b.position.distance(me.position))
                })
                .and_then(|object| object.planet);
        }
    }
    if me.target_planet.is_some() {
        move_to_planet(ctx, me, command);
        command.set(Command::LAND);
    }
}
