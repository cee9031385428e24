//! Asteroid fields and hazard weather for every occupied system.

use std::collections::{BTreeMap, BTreeSet};

use hecs::World;
use rand::Rng;

use corsair_core::body::Body;
use corsair_core::catalog::Catalog;
use corsair_core::geometry::{Angle, Point};
use corsair_core::government::Politics;
use corsair_core::random;
use corsair_core::types::SystemId;
use corsair_core::universe::System;

use crate::cues;
use crate::environment::{AsteroidField, Weather};
use crate::ship::Ship;
use crate::systems::collision::Grids;
use crate::systems::projectiles::{strike, Attacker};
use crate::systems::Frame;

/// Environment state that persists between ticks.
#[derive(Debug, Default)]
pub struct Environment {
    pub fields: BTreeMap<SystemId, AsteroidField>,
    pub weather: Vec<Weather>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create fields for systems that just became occupied. Fields are
    /// kept once made, so a belt does not reshuffle when ships leave.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        world: &World,
        catalog: &Catalog,
        systems: &[System],
        rng: &mut R,
    ) {
        for id in occupied(world) {
            if self.fields.contains_key(&id) {
                continue;
            }
            let Some(system) = systems.get(id.index()) else {
                continue;
            };
            if system.asteroids.is_empty() {
                continue;
            }
            log::debug!("asteroid field created in {}", system.name);
            self.fields
                .insert(id, AsteroidField::new(&system.asteroids, catalog, rng));
        }
    }
}

/// Systems with at least one ship in them, in id order.
pub fn occupied(world: &World) -> BTreeSet<SystemId> {
    world
        .query::<&Ship>()
        .iter()
        .filter_map(|(_, ship)| ship.system)
        .collect()
}

pub struct Inputs<'a> {
    pub catalog: &'a Catalog,
    pub systems: &'a [System],
    pub grids: &'a Grids,
}

pub fn run<R: Rng + ?Sized>(
    world: &mut World,
    inputs: &Inputs<'_>,
    environment: &mut Environment,
    politics: &mut Politics,
    rng: &mut R,
    frame: &mut Frame,
) {
    let catalog = inputs.catalog;
    for field in environment.fields.values_mut() {
        field.step();
    }

    // New weather in each occupied system.
    for id in occupied(world) {
        let Some(system) = inputs.systems.get(id.index()) else {
            continue;
        };
        for periodic in &system.hazards {
            if random::int(rng, periodic.period) != 0 {
                continue;
            }
            let Some(hazard) = catalog.hazards.get(periodic.item) else {
                continue;
            };
            let origin = Angle::random(rng).unit() * (random::real(rng) * system.belt);
            log::debug!("{} flares up in {}", hazard.name, system.name);
            environment
                .weather
                .push(Weather::new(periodic.item, hazard, id, origin, rng));
        }
    }

    for weather in &mut environment.weather {
        let Some(pulse) = weather.step() else {
            continue;
        };
        let Some(hazard) = catalog.hazards.get(weather.hazard) else {
            continue;
        };
        let at = Body::new(weather.origin, Point::ZERO, Angle::default());
        cues::place(&mut frame.cues, &hazard.environmental_effects, &at);

        let Some(grid) = inputs.grids.ships(Some(weather.system)) else {
            continue;
        };
        for victim in grid.ring(weather.origin, hazard.min_range, hazard.max_range) {
            strike(
                world,
                victim,
                &hazard.weapon,
                pulse.scale,
                0.0,
                Some(weather.origin),
                Attacker::default(),
                politics,
                frame,
            );
        }
    }
    environment.weather.retain(|weather| !weather.is_expired());
}
