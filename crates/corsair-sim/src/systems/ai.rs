//! AI system: flatten the ships into views, let each pilot decide, and
//! write the orders back.

use std::collections::{BTreeSet, HashMap};

use hecs::{Entity, World};
use rand::Rng;

use corsair_ai::behavior;
use corsair_ai::distance_map::PlayerKnowledge;
use corsair_ai::player::PlayerController;
use corsair_ai::view::{AiContext, ShipOrders, ShipView, WeaponView};
use corsair_core::catalog::Catalog;
use corsair_core::command::Command;
use corsair_core::damage::DamageChannel;
use corsair_core::government::Politics;
use corsair_core::types::{EntityRef, GovernmentId};
use corsair_core::universe::System;

use crate::ship::Ship;
use crate::world::{entity_ref, ordered};

/// Read-only state shared by every decision this tick.
pub struct Inputs<'a> {
    pub catalog: &'a Catalog,
    pub politics: &'a Politics,
    pub systems: &'a [System],
    pub knowledge: Option<&'a PlayerKnowledge>,
    pub scanned: &'a BTreeSet<(GovernmentId, EntityRef)>,
    pub step: u64,
}

/// Decide for every ship and apply the orders.
pub fn run<R: Rng + ?Sized>(
    world: &mut World,
    inputs: &Inputs<'_>,
    player: &mut PlayerController,
    held: Command,
    rng: &mut R,
) {
    let order = ordered::<Ship>(world);
    let index: HashMap<Entity, usize> = order.iter().enumerate().map(|(i, &e)| (e, i)).collect();
    let views: Vec<ShipView> = order
        .iter()
        .enumerate()
        .filter_map(|(i, &entity)| {
            let ship = world.get::<&Ship>(entity).ok()?;
            Some(view(i, entity, &ship, &index, inputs.catalog))
        })
        .collect();
    if views.len() != order.len() {
        return;
    }

    let ctx = AiContext {
        catalog: inputs.catalog,
        politics: inputs.politics,
        systems: inputs.systems,
        ships: &views,
        knowledge: inputs.knowledge,
        scanned: inputs.scanned,
        step: inputs.step,
    };
    let orders: Vec<ShipOrders> = (0..views.len())
        .map(|i| {
            if views[i].is_player {
                player.control(&ctx, i, held)
            } else {
                behavior::step(&ctx, i, rng)
            }
        })
        .collect();

    for (entity, orders) in order.iter().zip(orders) {
        let Ok(ship) = world.query_one_mut::<&mut Ship>(*entity) else {
            continue;
        };
        apply(ship, orders, &order, inputs.catalog);
    }
}

fn apply(ship: &mut Ship, orders: ShipOrders, order: &[Entity], catalog: &Catalog) {
    let lookup = |i: Option<usize>| i.and_then(|i| order.get(i).copied());
    ship.commands = orders.command;
    ship.target_ship = lookup(orders.target_ship);
    ship.parent = lookup(orders.parent);
    ship.target_system = orders.target_system;
    ship.target_planet = orders.target_planet;
    ship.aim_turrets(&orders.turret_aim, catalog);
}

/// Flatten one ship for the decision layer.
pub fn view(
    id: usize,
    entity: Entity,
    ship: &Ship,
    index: &HashMap<Entity, usize>,
    catalog: &Catalog,
) -> ShipView {
    let fraction = |value: f64, max: f64| if max > 0.0 { value / max } else { 0.0 };
    let scan_power = ship.attr("cargo scan power").max(ship.attr("outfit scan power"));
    let weapons = ship
        .armament
        .hardpoints()
        .iter()
        .enumerate()
        .filter_map(|(i, hardpoint)| {
            let weapon = catalog.weapon(hardpoint.outfit?)?;
            Some(WeaponView {
                index: i,
                is_turret: hardpoint.is_turret,
                point: hardpoint.point,
                angle: hardpoint.angle,
                turret_turn: weapon.turret_turn,
                velocity: weapon.velocity,
                total_lifetime: weapon.total_lifetime(),
                damage: weapon.total_damage(DamageChannel::Shield)
                    + weapon.total_damage(DamageChannel::Hull),
                blast_radius: weapon.blast_radius,
                is_homing: weapon.is_homing(),
                is_special: weapon.is_special(),
                is_ready: hardpoint.is_ready(weapon),
            })
        })
        .collect();

    ShipView {
        id,
        entity: entity_ref(entity),
        government: ship.body.government.unwrap_or_default(),
        system: ship.system,
        position: ship.body.position,
        velocity: ship.body.velocity,
        facing: ship.body.facing,
        radius: ship.body.radius(),
        mask: ship.body.mask.clone(),
        shields: fraction(ship.shields, ship.max_shields()),
        hull: fraction(ship.hull, ship.max_hull()),
        is_disabled: ship.is_disabled(),
        is_targetable: ship.is_targetable(),
        is_hyperspacing: ship.is_hyperspacing(),
        is_entering_hyperspace: ship.is_entering_hyperspace(),
        is_landing: ship.is_landing(),
        is_player: ship.is_player,
        is_destroyed: ship.is_destroyed(),
        is_cloaked: ship.is_cloaked(),
        can_be_carried: ship.can_be_carried(),
        carried: ship.carried(),
        bays_free: ship.bays_free(None),
        turn_rate: ship.turn_rate(),
        acceleration: ship.acceleration(),
        max_velocity: ship.max_velocity(),
        reverse_acceleration: ship.reverse_acceleration(),
        has_afterburner: ship.attr("afterburner thrust") > 0.0,
        has_hyperdrive: ship.has_hyperdrive(),
        has_jump_drive: ship.has_jump_drive(),
        jumps_remaining: ship.jumps_remaining(),
        scan_range: scan_power.max(0.0).sqrt() * 100.0,
        target_ship: ship.target_ship.and_then(|t| index.get(&t).copied()),
        parent: ship.parent.and_then(|p| index.get(&p).copied()),
        target_system: ship.target_system,
        target_planet: ship.target_planet,
        hyperspace_system: ship.hyperspace_system,
        landing_planet: ship.landing_planet,
        personality: ship.personality,
        confusion: ship.confusion,
        commands: ship.commands,
        weapons,
    }
}
