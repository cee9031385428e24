//! Snapshot system: queries the ECS world and builds a complete GameStateSnapshot.
//!
//! This system is read-only; it never modifies the world.

use hecs::World;

use corsair_core::catalog::Catalog;
use corsair_core::state::*;
use corsair_core::types::{SimTime, SystemId};

use crate::cargo::{Contents, Flotsam};
use crate::damage::DamageLedger;
use crate::projectile::Projectile;
use crate::ship::Ship;
use crate::systems::environment::Environment;
use crate::systems::Frame;
use crate::world::{entity_ref, ordered};

/// Build a GameStateSnapshot from the world and this tick's frame.
pub fn build_snapshot(
    world: &World,
    catalog: &Catalog,
    environment: &Environment,
    time: &SimTime,
    focus: Option<SystemId>,
    frame: Frame,
) -> GameStateSnapshot {
    GameStateSnapshot {
        time: *time,
        focus,
        ships: build_ships(world),
        projectiles: build_projectiles(world),
        flotsam: build_flotsam(world, catalog),
        minables: build_minables(environment),
        weather: build_weather(environment),
        events: frame.events,
        cues: frame.cues,
        damage: totals(&frame.ledger),
    }
}

fn totals(ledger: &DamageLedger) -> DamageTotals {
    DamageTotals {
        hits: ledger.hits,
        delivered: ledger.delivered,
        applied: ledger.applied,
    }
}

/// Ships in spawn order.
fn build_ships(world: &World) -> Vec<ShipView> {
    ordered::<Ship>(world)
        .into_iter()
        .filter_map(|entity| {
            let ship = world.get::<&Ship>(entity).ok()?;
            Some(ShipView {
                id: entity_ref(entity),
                name: ship.name.clone(),
                model: ship.model,
                government: ship.body.government,
                system: ship.system,
                position: ship.body.position,
                velocity: ship.body.velocity,
                facing: ship.body.facing,
                zoom: ship.body.zoom,
                shields: ship.shields,
                hull: ship.hull,
                energy: ship.energy,
                fuel: ship.fuel,
                heat: ship.heat,
                crew: ship.crew,
                cloak: ship.cloak,
                disabled: ship.is_disabled(),
                destroyed: ship.is_destroyed(),
                hyperspacing: ship.is_hyperspacing(),
                is_player: ship.is_player,
                parent: ship.parent.map(entity_ref),
                target: ship.target_ship.map(entity_ref),
                carried: ship.carried(),
            })
        })
        .collect()
}

fn build_projectiles(world: &World) -> Vec<ProjectileView> {
    ordered::<Projectile>(world)
        .into_iter()
        .filter_map(|entity| {
            let projectile = world.get::<&Projectile>(entity).ok()?;
            Some(ProjectileView {
                id: entity_ref(entity),
                weapon: projectile.weapon,
                system: projectile.system,
                position: projectile.body.position,
                velocity: projectile.body.velocity,
                facing: projectile.body.facing,
                target: projectile.target.map(entity_ref),
                lifetime: projectile.lifetime,
            })
        })
        .collect()
}

fn build_flotsam(world: &World, catalog: &Catalog) -> Vec<FlotsamView> {
    ordered::<Flotsam>(world)
        .into_iter()
        .filter_map(|entity| {
            let flotsam = world.get::<&Flotsam>(entity).ok()?;
            let label = match &flotsam.contents {
                Contents::Commodity { name } => name.clone(),
                Contents::Outfit { outfit } => catalog.outfits.name(*outfit).to_string(),
            };
            Some(FlotsamView {
                id: entity_ref(entity),
                system: flotsam.system,
                position: flotsam.body.position,
                label,
                count: flotsam.count,
                lifetime: flotsam.lifetime,
            })
        })
        .collect()
}

/// Minables of every live field. Plain rocks tile the plane and are left
/// to the presentation layer.
fn build_minables(environment: &Environment) -> Vec<MinableView> {
    environment
        .fields
        .iter()
        .flat_map(|(&system, field)| {
            field
                .minables()
                .iter()
                .filter(|minable| !minable.is_destroyed())
                .map(move |minable| MinableView {
                    system,
                    kind: minable.kind,
                    position: minable.body.position,
                    hull: minable.hull,
                })
        })
        .collect()
}

fn build_weather(environment: &Environment) -> Vec<WeatherView> {
    environment
        .weather
        .iter()
        .map(|weather| WeatherView {
            hazard: weather.hazard,
            system: weather.system,
            origin: weather.origin,
            strength: weather.current_strength(),
            remaining: weather.remaining,
        })
        .collect()
}
