//! Simulation engine: the core of the game.
//!
//! `SimulationEngine` owns the hecs ECS world, runs the systems in a fixed
//! order each tick, and produces `GameStateSnapshot`s. Completely headless,
//! enabling deterministic testing.

use std::collections::BTreeSet;
use std::sync::Arc;

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use corsair_ai::distance_map::PlayerKnowledge;
use corsair_ai::player::PlayerController;
use corsair_core::catalog::Catalog;
use corsair_core::command::Command;
use corsair_core::events::{ShipEvent, ShipEventKind};
use corsair_core::geometry::{Angle, Point};
use corsair_core::government::Politics;
use corsair_core::state::GameStateSnapshot;
use corsair_core::types::{EntityRef, FleetId, GovernmentId, ShipModelId, SimTime, SystemId};
use corsair_core::universe::{StartConditions, System};

use crate::damage::DamageLedger;
use crate::projectile::Projectile;
use crate::ship::Ship;
use crate::systems;
use crate::systems::collision::Grids;
use crate::systems::environment::Environment;
use crate::systems::Frame;
use crate::world::{self as entities, entity_ref, Serials};
use crate::world_setup;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Game date at tick 0, in days.
    pub start_day: f64,
    /// Projectiles beyond this many are dropped as they are fired.
    pub max_projectiles: usize,
    /// Roll periodic fleets in the focus system.
    pub spawn_fleets: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_day: 0.0,
            max_projectiles: 4096,
            spawn_fleets: true,
        }
    }
}

/// The simulation engine. Owns the ECS world and all sim state.
pub struct SimulationEngine {
    catalog: Arc<Catalog>,
    world: World,
    serials: Serials,
    time: SimTime,
    rng: ChaCha8Rng,
    config: SimConfig,
    /// Systems with orbits placed for the current date.
    systems: Vec<System>,
    politics: Politics,
    knowledge: PlayerKnowledge,
    player: PlayerController,
    held: Command,
    grids: Grids,
    environment: Environment,
    scanned: BTreeSet<(GovernmentId, EntityRef)>,
    /// System to simulate traffic in when there is no player ship.
    focus: Option<SystemId>,
    ledger: DamageLedger,
}

impl SimulationEngine {
    /// Create a new simulation engine over loaded content.
    pub fn new(catalog: Arc<Catalog>, config: SimConfig) -> Self {
        let systems = (0..catalog.systems.len())
            .map(|index| {
                catalog
                    .systems
                    .get(SystemId(index as u32))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        let politics = catalog.politics();
        Self {
            world: World::new(),
            serials: Serials::default(),
            time: SimTime {
                tick: 0,
                day: config.start_day,
            },
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            systems,
            politics,
            knowledge: PlayerKnowledge::default(),
            player: PlayerController::new(),
            held: Command::NONE,
            grids: Grids::new(),
            environment: Environment::new(),
            scanned: BTreeSet::new(),
            focus: None,
            ledger: DamageLedger::default(),
            catalog,
            config,
        }
    }

    /// Put the player's fleet in place. Returns the flagship.
    pub fn start(&mut self, start: &StartConditions) -> Option<Entity> {
        self.time.day = start.day;
        self.set_date();
        let flagship = world_setup::setup_start(
            &mut self.world,
            &mut self.serials,
            &self.catalog,
            &self.systems,
            start,
            &mut self.rng,
        );
        if let Some(system) = start.system {
            self.knowledge.visit(&self.catalog, system);
            self.focus = Some(system);
        }
        flagship
    }

    /// Keys held by the player for the next tick.
    pub fn set_input(&mut self, held: Command) {
        self.held = held;
    }

    /// Advance the simulation by one tick and return the resulting snapshot.
    pub fn tick(&mut self) -> GameStateSnapshot {
        let mut frame = Frame::default();
        self.run_systems(&mut frame);

        for event in &mut frame.events {
            event.tick = self.time.tick;
        }
        self.ledger = frame.ledger;
        self.time.advance();

        let focus = self.focus_system();
        systems::snapshot::build_snapshot(
            &self.world,
            &self.catalog,
            &self.environment,
            &self.time,
            focus,
            frame,
        )
    }

    /// Run all systems in order.
    fn run_systems(&mut self, frame: &mut Frame) {
        let catalog = Arc::clone(&self.catalog);
        let catalog = catalog.as_ref();
        let step = self.time.tick;
        self.set_date();

        // 1. AI and player control
        let inputs = systems::ai::Inputs {
            catalog,
            politics: &self.politics,
            systems: &self.systems,
            knowledge: Some(&self.knowledge),
            scanned: &self.scanned,
            step,
        };
        systems::ai::run(&mut self.world, &inputs, &mut self.player, self.held, &mut self.rng);
        // 2. Movement, weapons fire and fighter launch
        systems::movement::run(
            &mut self.world,
            catalog,
            &self.systems,
            &mut self.politics,
            &mut self.knowledge,
            &mut self.rng,
            frame,
        );
        // 3. Fleet spawn
        if self.config.spawn_fleets {
            if let Some(system) = self.focus_system() {
                systems::spawner::run(
                    &mut self.world,
                    &mut self.serials,
                    catalog,
                    &self.systems,
                    system,
                    &mut self.rng,
                );
            }
        }
        // 4. Collision grids
        self.environment
            .populate(&self.world, catalog, &self.systems, &mut self.rng);
        self.grids.rebuild(&self.world, catalog, step);
        // 5. Projectiles and ship blasts
        systems::projectiles::run(
            &mut self.world,
            &systems::projectiles::Inputs {
                catalog,
                grids: &self.grids,
            },
            &mut self.environment.fields,
            &mut self.politics,
            &mut self.rng,
            frame,
        );
        // 6. Hazards and asteroids
        systems::environment::run(
            &mut self.world,
            &systems::environment::Inputs {
                catalog,
                systems: &self.systems,
                grids: &self.grids,
            },
            &mut self.environment,
            &mut self.politics,
            &mut self.rng,
            frame,
        );
        // 7. Anti-missile and tractor beams
        systems::point_defense::run(
            &mut self.world,
            catalog,
            &self.grids,
            &self.politics,
            &mut self.rng,
            frame,
        );
        // 8. Flotsam, scanning and boarding
        systems::interaction::collect_flotsam(&mut self.world, catalog, &self.grids, frame);
        systems::interaction::scan(&mut self.world, &mut self.scanned, frame);
        systems::interaction::board(&mut self.world, &mut self.rng, frame);
        // 9. Fold in everything created this tick
        self.fold(frame);
        // 10. Dead removal
        systems::cleanup::run(&mut self.world, &mut frame.despawn);
    }

    /// Spawn the projectiles, fighters and flotsam a tick produced.
    fn fold(&mut self, frame: &mut Frame) {
        let existing = self.world.query::<&Projectile>().iter().count();
        let room = self.config.max_projectiles.saturating_sub(existing);
        let fired = std::mem::take(&mut frame.projectiles);
        if fired.len() > room {
            log::debug!("projectile cap reached, dropping {}", fired.len() - room);
        }
        for projectile in fired.into_iter().take(room) {
            entities::spawn_projectile(&mut self.world, &mut self.serials, projectile);
        }

        for (fighter, carrier) in std::mem::take(&mut frame.launched) {
            let entity = entities::spawn_ship(&mut self.world, &mut self.serials, fighter);
            if let Ok(carrier_ship) = self.world.query_one_mut::<&mut Ship>(carrier) {
                carrier_ship.escorts.push(entity);
            }
            frame.events.push(ShipEvent::new(
                ShipEventKind::Launch,
                Some(entity_ref(entity)),
                Some(entity_ref(carrier)),
            ));
        }

        for flotsam in std::mem::take(&mut frame.flotsam) {
            entities::spawn_flotsam(&mut self.world, &mut self.serials, flotsam);
        }
    }

    fn set_date(&mut self) {
        let day = self.time.day;
        for system in &mut self.systems {
            system.set_date(day);
        }
    }

    /// The player's system, or the configured focus.
    fn focus_system(&self) -> Option<SystemId> {
        self.player_ship()
            .and_then(|entity| self.world.get::<&Ship>(entity).ok().and_then(|ship| ship.system))
            .or(self.focus)
    }

    /// The ship under player control, if any.
    pub fn player_ship(&self) -> Option<Entity> {
        self.world
            .query::<&Ship>()
            .iter()
            .find(|(_, ship)| ship.is_player)
            .map(|(entity, _)| entity)
    }

    /// Spawn one ship in flight.
    pub fn add_ship(
        &mut self,
        model: ShipModelId,
        government: Option<GovernmentId>,
        system: SystemId,
        position: Point,
        facing: Angle,
    ) -> Option<Entity> {
        world_setup::spawn_at(
            &mut self.world,
            &mut self.serials,
            &self.catalog,
            model,
            government,
            system,
            position,
            facing,
        )
    }

    /// Bring a fleet into `system` right now.
    pub fn spawn_fleet(&mut self, fleet: FleetId, system: SystemId) -> Vec<Entity> {
        self.set_date();
        systems::spawner::place_fleet(
            &mut self.world,
            &mut self.serials,
            &self.catalog,
            &self.systems,
            fleet,
            system,
            &mut self.rng,
        )
    }

    /// Put a projectile into the world directly.
    pub fn add_projectile(&mut self, projectile: Projectile) -> Entity {
        entities::spawn_projectile(&mut self.world, &mut self.serials, projectile)
    }

    /// System to run traffic in when no player ship exists.
    pub fn set_focus(&mut self, system: Option<SystemId>) {
        self.focus = system;
    }

    /// Get the current simulation time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn politics(&self) -> &Politics {
        &self.politics
    }

    pub fn politics_mut(&mut self) -> &mut Politics {
        &mut self.politics
    }

    pub fn knowledge_mut(&mut self) -> &mut PlayerKnowledge {
        &mut self.knowledge
    }

    /// Damage bookkeeping of the last tick.
    pub fn ledger(&self) -> &DamageLedger {
        &self.ledger
    }

    /// `(government, ship)` pairs whose scan has finished.
    pub fn scanned(&self) -> &BTreeSet<(GovernmentId, EntityRef)> {
        &self.scanned
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Systems as placed for the current date.
    pub fn systems(&self) -> &[System] {
        &self.systems
    }
}
