//! Movement system: move every ship one tick, then fire its weapons and
//! launch its fighters.

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::Rng;

use corsair_ai::distance_map::PlayerKnowledge;
use corsair_core::catalog::Catalog;
use corsair_core::command::Command;
use corsair_core::events::{ShipEvent, ShipEventKind};
use corsair_core::geometry::Point;
use corsair_core::government::Politics;
use corsair_core::types::SystemId;
use corsair_core::universe::System;

use crate::cargo::Flotsam;
use crate::projectile::TargetState;
use crate::ship::{Ship, Surroundings};
use crate::systems::{Blast, Frame};
use crate::world::{entity_ref, ordered};

pub fn run<R: Rng + ?Sized>(
    world: &mut World,
    catalog: &Catalog,
    systems: &[System],
    politics: &mut Politics,
    knowledge: &mut PlayerKnowledge,
    rng: &mut R,
    frame: &mut Frame,
) {
    let order = ordered::<Ship>(world);
    let mut places: HashMap<Entity, (Point, Option<SystemId>)> = HashMap::new();
    let mut targets: HashMap<Entity, TargetState> = HashMap::new();
    for (entity, ship) in world.query::<&Ship>().iter() {
        places.insert(entity, (ship.body.position, ship.system));
        targets.insert(entity, ship.target_state(entity));
    }

    for entity in order {
        let Ok(ship) = world.query_one_mut::<&mut Ship>(entity) else {
            continue;
        };
        let parent_position = ship
            .parent
            .and_then(|parent| places.get(&parent))
            .filter(|(_, system)| *system == ship.system)
            .map(|(position, _)| *position);
        let around = Surroundings {
            catalog,
            systems,
            parent_position,
        };
        ship.drift_confusion(rng);
        let motion = ship.advance(&around, rng, &mut frame.cues);
        let handle = Some(entity_ref(entity));

        if let Some((from, to)) = motion.jumped {
            frame
                .events
                .push(ShipEvent::new(ShipEventKind::Jump { from, to }, handle, None));
            if ship.is_player {
                politics.reset_provocations();
                knowledge.visit(catalog, to);
            }
        }
        if let Some(planet) = motion.landed {
            frame
                .events
                .push(ShipEvent::new(ShipEventKind::Land { planet }, handle, None));
        }
        if motion.final_explosion {
            if catalog.ship(ship.model).is_some_and(|m| m.explosion_weapon.is_some()) {
                frame.blasts.push(Blast {
                    model: ship.model,
                    position: ship.body.position,
                    system: ship.system,
                    source: entity,
                    government: ship.body.government,
                });
            }
            let cargo = ship.cargo.take();
            frame
                .flotsam
                .extend(Flotsam::spill(cargo, &ship.body, ship.system, Some(entity), rng));
        }
        if motion.remove {
            frame.despawn.push(entity);
            continue;
        }

        if ship.commands.has(Command::LAUNCH) && ship.can_act() {
            for mut fighter in ship.launch() {
                fighter.parent = Some(entity);
                log::debug!("{} launches {}", ship.name, fighter.name);
                frame.launched.push((fighter, entity));
            }
        }
        let target = ship.target_ship.and_then(|t| targets.get(&t));
        let shots = ship.fire(entity, catalog, target, rng, &mut frame.cues);
        frame.projectiles.extend(shots);
    }
}
