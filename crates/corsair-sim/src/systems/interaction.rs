//! Ship-to-ship and ship-to-flotsam interaction: scooping up flotsam,
//! scanning, boarding and capture.

use std::collections::BTreeSet;

use hecs::{Entity, World};
use rand::Rng;

use corsair_core::catalog::Catalog;
use corsair_core::command::Command;
use corsair_core::constants::{BOARDING_DISTANCE, SCAN_TIME};
use corsair_core::events::{ShipEvent, ShipEventKind};
use corsair_core::geometry::Point;
use corsair_core::types::{EntityRef, GovernmentId, SystemId};

use crate::cargo::{Contents, Flotsam};
use crate::ship::Ship;
use crate::systems::collision::Grids;
use crate::systems::Frame;
use crate::world::{entity_ref, ordered};

/// Boarding needs the two ships nearly at rest relative to each other.
const BOARDING_SPEED: f64 = 1.0;

/// Drift flotsam, expire old pieces and let ships scoop up what they touch.
pub fn collect_flotsam(world: &mut World, catalog: &Catalog, grids: &Grids, frame: &mut Frame) {
    for item in ordered::<Flotsam>(world) {
        let Ok(flotsam) = world.query_one_mut::<&mut Flotsam>(item) else {
            continue;
        };
        flotsam.advance();
        if flotsam.is_expired() {
            frame.despawn.push(item);
            continue;
        }
        let flotsam = flotsam.clone();
        let Some(grid) = grids.ships(flotsam.system) else {
            continue;
        };

        let mut remaining = flotsam.count;
        let per_unit = flotsam.tons(catalog) / f64::from(flotsam.count.max(1));
        for collector in grid.circle(flotsam.body.position, 0.0) {
            if Some(collector) == flotsam.source {
                continue;
            }
            let Ok(ship) = world.query_one_mut::<&mut Ship>(collector) else {
                continue;
            };
            if !ship.can_act() {
                continue;
            }
            let free = (ship.attr("cargo space") - ship.cargo.used(catalog)).max(0.0);
            let fits = if per_unit > 0.0 {
                ((free / per_unit).floor() as u32).min(remaining)
            } else {
                remaining
            };
            if fits == 0 {
                continue;
            }
            let outfit = match &flotsam.contents {
                Contents::Commodity { name } => {
                    ship.cargo.add_commodity(name, fits);
                    None
                }
                Contents::Outfit { outfit } => {
                    ship.cargo.add_outfit(*outfit, fits);
                    Some(*outfit)
                }
            };
            remaining -= fits;
            frame.events.push(ShipEvent::new(
                ShipEventKind::Pickup {
                    outfit,
                    count: fits,
                },
                Some(entity_ref(collector)),
                None,
            ));
            if remaining == 0 {
                break;
            }
        }

        if remaining == 0 {
            frame.despawn.push(item);
        } else if let Ok(left) = world.query_one_mut::<&mut Flotsam>(item) {
            left.count = remaining;
        }
    }
}

/// Advance scans of every ship holding `SCAN`. Finished scans go into
/// `scanned` under the scanning ship's government.
pub fn scan(world: &mut World, scanned: &mut BTreeSet<(GovernmentId, EntityRef)>, frame: &mut Frame) {
    for entity in ordered::<Ship>(world) {
        let Some((target, position, system)) = world.get::<&Ship>(entity).ok().and_then(|ship| {
            if !ship.commands.has(Command::SCAN) || !ship.can_act() {
                return None;
            }
            Some((ship.target_ship?, ship.body.position, ship.system))
        }) else {
            continue;
        };
        let Some(target_position) = world
            .get::<&Ship>(target)
            .ok()
            .filter(|other| other.system == system && other.is_targetable())
            .map(|other| other.body.position)
        else {
            continue;
        };

        let Ok(ship) = world.query_one_mut::<&mut Ship>(entity) else {
            continue;
        };
        if ship.scan_target != Some(target) {
            ship.scan_target = Some(target);
            ship.cargo_scan = 0.0;
            ship.outfit_scan = 0.0;
        }
        let distance = position.distance(target_position);
        let cargo_power = ship.attr("cargo scan power");
        let outfit_power = ship.attr("outfit scan power");
        let mut finished = Vec::new();
        for (power, progress, kind) in [
            (cargo_power, &mut ship.cargo_scan, ShipEventKind::ScanCargo),
            (outfit_power, &mut ship.outfit_scan, ShipEventKind::ScanOutfits),
        ] {
            if power <= 0.0 || *progress >= 1.0 || distance > power.sqrt() * 100.0 {
                continue;
            }
            *progress += 1.0 / SCAN_TIME;
            // Summing SCAN_TIME steps may land a hair under 1.
            if *progress >= 1.0 - 1e-9 {
                *progress = 1.0;
                finished.push(kind);
            }
        }
        let government = ship.body.government;
        for kind in finished {
            frame
                .events
                .push(ShipEvent::new(kind, Some(entity_ref(entity)), Some(entity_ref(target))));
            if let Some(government) = government {
                scanned.insert((government, entity_ref(target)));
            }
        }
    }
}

/// Resolve `BOARD` commands. NPCs plunder the cargo of the ship they
/// board; a player ship boarding a crewless hulk captures it.
pub fn board<R: Rng + ?Sized>(world: &mut World, rng: &mut R, frame: &mut Frame) {
    for entity in ordered::<Ship>(world) {
        let Some(boarder) = world.get::<&Ship>(entity).ok().and_then(|ship| {
            if !ship.commands.has(Command::BOARD) || !ship.can_act() {
                return None;
            }
            let target = ship.target_ship?;
            (ship.boarded != Some(target)).then(|| Boarder {
                target,
                position: ship.body.position,
                velocity: ship.body.velocity,
                radius: ship.body.radius(),
                system: ship.system,
                government: ship.body.government,
                is_player: ship.is_player,
            })
        }) else {
            continue;
        };
        let reachable = world.get::<&Ship>(boarder.target).ok().is_some_and(|target| {
            target.system == boarder.system
                && target.is_disabled()
                && !target.is_destroyed()
                && target.body.position.distance(boarder.position)
                    <= target.body.radius() + boarder.radius + BOARDING_DISTANCE
                && target.body.velocity.distance(boarder.velocity) <= BOARDING_SPEED
        });
        if !reachable {
            continue;
        }

        if let Ok(ship) = world.query_one_mut::<&mut Ship>(entity) {
            ship.boarded = Some(boarder.target);
        }
        let actor = Some(entity_ref(entity));
        let victim = Some(entity_ref(boarder.target));
        frame
            .events
            .push(ShipEvent::new(ShipEventKind::Board, actor, victim));

        let Ok(target) = world.query_one_mut::<&mut Ship>(boarder.target) else {
            continue;
        };
        if boarder.is_player {
            if target.crew > 0 {
                continue;
            }
            target.body.government = boarder.government;
            target.parent = Some(entity);
            log::debug!("{} captured", target.name);
            if let Ok(ship) = world.query_one_mut::<&mut Ship>(entity) {
                ship.escorts.push(boarder.target);
            }
            frame
                .events
                .push(ShipEvent::new(ShipEventKind::Capture, actor, victim));
        } else {
            let cargo = target.cargo.take();
            let spilled = Flotsam::spill(cargo, &target.body, target.system, None, rng);
            frame.flotsam.extend(spilled);
        }
    }
}

struct Boarder {
    target: Entity,
    position: Point,
    velocity: Point,
    radius: f64,
    system: Option<SystemId>,
    government: Option<GovernmentId>,
    is_player: bool,
}
