//! Target selection, gun aim and automatic fire.

use corsair_core::command::Command;
use corsair_core::constants::{
    DISABLED_TARGET_PENALTY, TARGET_LOOKAHEAD, TARGET_SEARCH_RANGE, TARGET_STICKINESS,
    UNARMED_TARGET_PENALTY,
};
use corsair_core::geometry::{rendezvous_time, unit, Angle, Point};

use crate::view::{AiContext, ShipView, WeaponView};

/// Pick the enemy this ship should engage, if any.
///
/// Targets are scored by their distance one second from now, with
/// penalties that steer ships away from disabled or unarmed prey and
/// toward damaged ones. Badly damaged ships with somewhere to go return
/// no target so they can run.
pub fn find_target(ctx: &AiContext<'_>, ship: &ShipView) -> Option<usize> {
    if ship.personality.pacifist {
        return None;
    }
    let (min_range, max_range) = weapon_ranges(ship);
    if max_range == 0.0 {
        return None;
    }

    let person = &ship.personality;
    let mut old_target = ctx
        .ship(ship.target_ship)
        .filter(|t| t.is_targetable && t.system == ship.system);
    if old_target.is_some_and(|t| {
        person.timid && t.is_disabled && t.position.distance(ship.position) > 1000.0
    }) {
        old_target = None;
    }
    let parent = ctx.ship(ship.parent);
    let parent_is_enemy = parent.is_some_and(|p| ctx.politics.is_enemy(p.government, ship.government));
    let parent_target = parent
        .filter(|_| !parent_is_enemy)
        .and_then(|p| ctx.ship(p.target_ship))
        .filter(|t| t.is_targetable);

    let mut closest = if person.heroic {
        f64::INFINITY
    } else if min_range > 1000.0 {
        max_range * 1.5
    } else {
        TARGET_SEARCH_RANGE
    };
    let mut target: Option<&ShipView> = None;
    let here = ship.position + TARGET_LOOKAHEAD * ship.velocity;
    for other in ctx.ships {
        if other.id == ship.id
            || other.system != ship.system
            || !other.is_targetable
            || !ctx.is_enemy(ship, other)
        {
            continue;
        }
        let is_old = old_target.is_some_and(|t| t.id == other.id);
        let is_parents = parent_target.is_some_and(|t| t.id == other.id);
        if other.is_disabled && !person.plunders && (person.disables || !is_old) {
            continue;
        }

        let mut range = (other.position + TARGET_LOOKAHEAD * other.velocity).distance(here);
        if is_old || is_parents {
            range -= TARGET_STICKINESS;
        }
        let disabled = f64::from(u8::from(other.is_disabled));
        if person.plunders {
            range += 2000.0 * (2.0 * disabled - 1.0);
        } else {
            range += DISABLED_TARGET_PENALTY * disabled;
        }
        if !other.is_armed() {
            let factor = if person.plunders { 1.0 } else { 2.0 };
            range += UNARMED_TARGET_PENALTY * factor;
        }
        range += 500.0 * (other.shields + other.hull);

        if range < closest {
            closest = range;
            target = Some(other);
        }
    }

    if target.is_none() && ship.scan_range > 0.0 && !ship.is_player {
        target = ctx
            .ships
            .iter()
            .filter(|other| {
                other.id != ship.id
                    && other.system == ship.system
                    && other.government != ship.government
                    && other.is_targetable
                    && !ctx.has_scanned(ship, other)
            })
            .min_by(|a, b| {
                a.position
                    .distance(ship.position)
                    .total_cmp(&b.position.distance(ship.position))
            });
    }

    if let Some(found) = target {
        if !found.is_disabled && should_flee(ctx, ship, parent_is_enemy) {
            log::debug!("ship {} breaks off from {}", ship.id, found.id);
            target = None;
        }
    }
    if target.is_none() && person.vindictive {
        target = ctx.ship(ship.target_ship).filter(|t| !t.is_cloaked);
    }
    target.map(|t| t.id)
}

/// Whether a damaged ship would rather leave than fight, given that it
/// has a way out.
fn should_flee(ctx: &AiContext<'_>, ship: &ShipView, parent_is_enemy: bool) -> bool {
    let person = &ship.personality;
    let wants = person.fleeing
        || (0.5 * ship.shields + ship.hull < 1.0
            && !person.heroic
            && !person.staying
            && !parent_is_enemy);
    if !wants {
        return false;
    }
    let Some(system) = ship.system.and_then(|id| ctx.system(id)) else {
        return false;
    };
    if ship.jumps_remaining > 0 && (!system.links.is_empty() || ship.has_jump_drive) {
        return true;
    }
    system.objects.iter().any(|object| {
        object
            .planet
            .and_then(|id| ctx.catalog.planet(id))
            .is_some_and(|planet| planet.has_spaceport && planet.landable)
    })
}

/// Shortest and longest range among the weapons this ship fights with.
fn weapon_ranges(ship: &ShipView) -> (f64, f64) {
    ship.weapons
        .iter()
        .filter(|w| !w.is_special)
        .map(WeaponView::range)
        .fold((f64::INFINITY, 0.0), |(lo, hi), r| (lo.min(r), hi.max(r)))
}

/// Direction to face so the fixed guns hit `target`, weighted by the
/// damage of each gun. Falls back to the direction of the target.
pub fn target_aim(ship: &ShipView, target: &ShipView) -> Point {
    let mut result = Point::ZERO;
    for weapon in &ship.weapons {
        if weapon.is_homing || weapon.is_turret || weapon.is_special {
            continue;
        }
        let start = ship.position + ship.facing.rotate(weapon.point);
        let mut p = target.position - start + ship.confusion;
        let v = target.velocity - ship.velocity;
        let Some(steps) = rendezvous_time(p, v, weapon.velocity) else {
            continue;
        };
        p += steps.min(weapon.total_lifetime) * v;
        result += unit(p) * weapon.damage.abs();
    }
    if result == Point::ZERO {
        target.position - ship.position
    } else {
        result
    }
}

/// Fire bits for every weapon that would hit a hostile ship right now.
pub fn auto_fire(ctx: &AiContext<'_>, ship: &ShipView) -> Command {
    let mut command = Command::NONE;
    if ship.personality.pacifist || ship.is_cloaked {
        return command;
    }

    let current = ctx
        .ship(ship.target_ship)
        .filter(|t| t.system == ship.system && ctx.is_enemy(ship, t));
    let spare_disabled = ship.personality.disables || ship.personality.plunders;

    let max_range = 1.5
        * ship
            .weapons
            .iter()
            .filter(|w| w.is_ready && !w.is_homing && !w.is_special)
            .map(WeaponView::range)
            .fold(0.0, f64::max);

    let mut enemies: Vec<&ShipView> = current.into_iter().collect();
    enemies.extend(ctx.ships.iter().filter(|other| {
        other.id != ship.id
            && other.is_targetable
            && other.system == ship.system
            && ctx.is_enemy(ship, other)
            && !(other.is_hyperspacing && other.speed() > 10.0)
            && other.position.distance(ship.position) < max_range
            && current.map_or(true, |c| c.id != other.id)
    }));

    for weapon in &ship.weapons {
        if !weapon.is_ready || weapon.is_special || (current.is_none() && weapon.is_homing) {
            continue;
        }
        let start = ship.position + ship.facing.rotate(weapon.point) + ship.confusion;

        if let Some(target) = current.filter(|_| weapon.is_homing || weapon.is_turret) {
            if target.is_disabled && spare_disabled {
                continue;
            }
            if weapon.is_turret && target.is_hyperspacing && target.speed() > 10.0 {
                continue;
            }
            let mut v = target.velocity - ship.velocity;
            // Both ships move one step before the shot exists.
            let p = target.position - start + v;
            if p.length() < weapon.blast_radius {
                continue;
            }
            if weapon.is_homing {
                v = target.velocity;
            }
            if rendezvous_time(p, v, weapon.velocity).is_some_and(|t| t <= weapon.total_lifetime) {
                command.set(Command::fire(weapon.index));
                continue;
            }
        }
        if weapon.is_homing {
            continue;
        }

        for target in &enemies {
            if target.is_disabled && spare_disabled {
                continue;
            }
            let v = target.velocity - ship.velocity;
            let p = target.position - start + v;
            let travel = ((ship.facing + weapon.angle).unit() * weapon.velocity - v)
                * weapon.total_lifetime;
            if segment_hits(target, -p, travel) {
                command.set(Command::fire(weapon.index));
                break;
            }
        }
    }
    command
}

/// Whether a segment from `offset` (relative to the target's center)
/// along `travel` touches the target.
fn segment_hits(target: &ShipView, offset: Point, travel: Point) -> bool {
    if let Some(mask) = target.mask.as_deref().filter(|m| m.is_loaded()) {
        return mask.collide(offset, travel, target.facing) < 1.0;
    }
    let length_squared = travel.length_squared();
    let t = if length_squared > 0.0 {
        (-offset.dot(travel) / length_squared).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (offset + travel * t).length() <= target.radius
}

/// Turret rotation requests that track the current target.
pub fn aim_turrets(ctx: &AiContext<'_>, ship: &ShipView) -> Vec<(usize, f64)> {
    let Some(target) = ctx.ship(ship.target_ship).filter(|t| t.system == ship.system) else {
        return Vec::new();
    };
    ship.weapons
        .iter()
        .filter(|w| w.is_turret && w.turret_turn > 0.0)
        .map(|weapon| {
            let start = ship.position + ship.facing.rotate(weapon.point);
            let mut p = target.position - start + ship.confusion;
            let v = target.velocity - ship.velocity;
            if let Some(steps) = rendezvous_time(p, v, weapon.velocity) {
                p += steps.min(weapon.total_lifetime) * v;
            }
            let wanted = Angle::from_vector(p) - ship.facing;
            let delta = wanted.delta_from(Angle::new(weapon.angle));
            (weapon.index, (delta / weapon.turret_turn).clamp(-1.0, 1.0))
        })
        .collect()
}
