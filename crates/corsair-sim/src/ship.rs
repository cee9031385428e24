//! A ship in flight: summed attributes, supplies, the motion state machines,
//! the firing loop and damage intake.
//!
//! The motion states are checked in priority order each tick: destroyed,
//! hyperspacing, landing, disabled, then normal flight. Only the normal
//! state obeys commands.

use std::collections::BTreeMap;

use hecs::Entity;
use rand::Rng;

use corsair_ai::maneuver::is_aligned_for_jump;
use corsair_core::body::Body;
use corsair_core::catalog::Catalog;
use corsair_core::command::Command;
use corsair_core::constants::{
    DEFAULT_EXPLOSIONS, DISABLE_HULL, DISABLE_MAX_FRACTION, DISABLE_MIN_FRACTION,
    DISABLE_RECOVERY, EXPLOSION_ODDS, HEAT_PER_MASS, HEAT_RETENTION, HYPERDRIVE_FUEL, HYPER_A,
    HYPER_C, HYPER_D, JUMP_DRIVE_FUEL, LANDING_PULL, LANDING_SPEED, LANDING_ZOOM_STEP,
    MAX_HYPERSPACE_OFFSET, OVERHEAT_RECOVERY, STATUS_DECAY, UNTARGETABLE_HYPERSPACE_COUNT,
};
use corsair_core::damage::DamageChannel;
use corsair_core::events::Cue;
use corsair_core::fleet::Personality;
use corsair_core::geometry::{unit, Angle, Point};
use corsair_core::outfit::Attributes;
use corsair_core::random;
use corsair_core::ship_model::ShipModel;
use corsair_core::types::{OutfitId, PlanetId, ShipModelId, SystemId};
use corsair_core::universe::System;
use corsair_core::weapon::Weapon;

use crate::armament::Armament;
use crate::cargo::Cargo;
use crate::cues;
use crate::damage::DamageDealt;
use crate::projectile::{Projectile, TargetState};

/// Slowing reduces thrust and turning by `1 / (1 + SLOWING_FACTOR * slowing)`.
const SLOWING_FACTOR: f64 = 0.05;

/// Disruption weakens shields by `1 / (1 + DISRUPTION_FACTOR * disruption)`.
const DISRUPTION_FACTOR: f64 = 0.01;

/// Scramble at which a weapon jams half the time.
const SCRAMBLE_HALF: f64 = 100.0;

/// Jump drive arrivals scatter up to this far (times one to two).
const JUMP_SCATTER: f64 = 300.0;

/// Categories that ride in carrier bays.
const CARRIED_CATEGORIES: [&str; 2] = ["Fighter", "Drone"];

/// A bay slot and the fighter parked in it.
#[derive(Debug, Clone)]
pub struct Bay {
    pub category: String,
    /// Launch point in the ship frame, at half the sprite scale.
    pub point: Point,
    pub fighter: Option<Box<Ship>>,
}

/// What moving one tick did, for the engine to act on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Motion {
    pub jumped: Option<(SystemId, SystemId)>,
    pub landed: Option<PlanetId>,
    /// The last explosion went off this tick.
    pub final_explosion: bool,
    /// Take the ship out of the world.
    pub remove: bool,
}

/// Where a ship is flying, as far as moving it is concerned.
pub struct Surroundings<'a> {
    pub catalog: &'a Catalog,
    /// Systems with stellar positions for the current date, indexed by id.
    pub systems: &'a [System],
    /// Position of the ship's parent, when it is in the same system.
    pub parent_position: Option<Point>,
}

impl Surroundings<'_> {
    fn system(&self, id: Option<SystemId>) -> Option<&System> {
        id.and_then(|id| self.systems.get(id.index()))
    }
}

#[derive(Debug, Clone)]
pub struct Ship {
    pub body: Body,
    pub model: ShipModelId,
    pub name: String,
    pub category: String,
    /// Template attributes plus every installed outfit.
    pub attributes: Attributes,
    pub outfits: BTreeMap<OutfitId, i32>,
    pub armament: Armament,

    pub shields: f64,
    pub hull: f64,
    pub energy: f64,
    pub fuel: f64,
    pub heat: f64,

    pub ion: f64,
    pub scramble: f64,
    pub disruption: f64,
    pub slowing: f64,
    pub discharge: f64,
    pub corrosion: f64,
    pub leak: f64,
    pub burn: f64,

    pub cargo: Cargo,
    pub crew: u32,

    pub system: Option<SystemId>,
    pub target_system: Option<SystemId>,
    pub target_planet: Option<PlanetId>,
    pub target_ship: Option<Entity>,
    pub parent: Option<Entity>,
    pub escorts: Vec<Entity>,
    pub commands: Command,
    pub landing_planet: Option<PlanetId>,

    pub hyperspace_system: Option<SystemId>,
    pub hyperspace_count: i32,
    pub using_jump_drive: bool,
    /// Offset from the parent kept through a jump.
    pub hyperspace_offset: Point,

    pub explosion_count: i32,
    pub explosion_rate: i32,
    pub explosion_total: i32,

    /// Survives landing (the player's fleet).
    pub is_special: bool,
    pub is_player: bool,
    disabled: bool,
    overheated: bool,
    pub personality: Personality,
    /// Aim wobble of the pilot.
    pub confusion: Point,
    /// 0 is visible, 1 fully cloaked.
    pub cloak: f64,
    pub bays: Vec<Bay>,

    /// Scan progress against `scan_target`.
    pub scan_target: Option<Entity>,
    pub cargo_scan: f64,
    pub outfit_scan: f64,
    /// Last ship boarded, so a held key boards only once.
    pub boarded: Option<Entity>,
    /// Set by the firing loop when an anti-missile or tractor beam is mounted.
    pub has_special_weapons: bool,
}

impl Ship {
    /// A fully supplied ship built from a template and its default outfits.
    pub fn new(id: ShipModelId, model: &ShipModel, catalog: &Catalog) -> Self {
        let mut outfits: BTreeMap<OutfitId, i32> = BTreeMap::new();
        for &(outfit, count) in &model.outfits {
            *outfits.entry(outfit).or_default() += count;
        }
        let mut attributes = model.attributes.clone();
        for (&outfit, &count) in &outfits {
            match catalog.outfit(outfit) {
                Some(definition) => attributes.add(&definition.attributes, count),
                None => log::warn!("{}: unknown outfit {:?}", model.name, outfit),
            }
        }
        let explosions: u32 = model.explode.iter().map(|&(_, count)| count).sum();
        let mut ship = Self {
            body: Body {
                sprite: model.sprite.clone(),
                mask: model.mask.clone(),
                ..Default::default()
            },
            model: id,
            name: model.name.clone(),
            category: model.category.clone(),
            armament: Armament::new(model, &outfits, catalog),
            attributes,
            outfits,
            shields: 0.0,
            hull: 0.0,
            energy: 0.0,
            fuel: 0.0,
            heat: 0.0,
            ion: 0.0,
            scramble: 0.0,
            disruption: 0.0,
            slowing: 0.0,
            discharge: 0.0,
            corrosion: 0.0,
            leak: 0.0,
            burn: 0.0,
            cargo: Cargo::default(),
            crew: 0,
            system: None,
            target_system: None,
            target_planet: None,
            target_ship: None,
            parent: None,
            escorts: Vec::new(),
            commands: Command::NONE,
            landing_planet: None,
            hyperspace_system: None,
            hyperspace_count: 0,
            using_jump_drive: false,
            hyperspace_offset: Point::ZERO,
            explosion_count: 0,
            explosion_rate: 0,
            explosion_total: if explosions == 0 {
                DEFAULT_EXPLOSIONS
            } else {
                explosions as i32
            },
            is_special: false,
            is_player: false,
            disabled: false,
            overheated: false,
            personality: Personality::default(),
            confusion: Point::ZERO,
            cloak: 0.0,
            bays: model
                .bays
                .iter()
                .map(|bay| Bay {
                    category: bay.category.clone(),
                    point: bay.point * 0.5,
                    fighter: None,
                })
                .collect(),
            scan_target: None,
            cargo_scan: 0.0,
            outfit_scan: 0.0,
            boarded: None,
            has_special_weapons: false,
        };
        ship.crew = ship.attr("required crew").max(0.0) as u32;
        ship.recharge();
        ship
    }

    pub fn attr(&self, name: &str) -> f64 {
        self.attributes.get(name)
    }

    /// Refill every supply and clear status effects.
    pub fn recharge(&mut self) {
        self.shields = self.max_shields();
        self.hull = self.max_hull();
        self.energy = self.max_energy();
        self.fuel = self.max_fuel();
        self.heat = 0.0;
        self.ion = 0.0;
        self.scramble = 0.0;
        self.disruption = 0.0;
        self.slowing = 0.0;
        self.discharge = 0.0;
        self.corrosion = 0.0;
        self.leak = 0.0;
        self.burn = 0.0;
        self.disabled = false;
        self.overheated = false;
    }

    // ---- Derived quantities ----

    pub fn max_shields(&self) -> f64 {
        self.attr("shields")
    }

    pub fn max_hull(&self) -> f64 {
        self.attr("hull")
    }

    pub fn max_energy(&self) -> f64 {
        self.attr("energy capacity")
    }

    pub fn max_fuel(&self) -> f64 {
        self.attr("fuel capacity")
    }

    pub fn mass(&self) -> f64 {
        (self.attr("mass") + f64::from(self.cargo.commodity_tons())).max(1.0)
    }

    pub fn max_heat(&self) -> f64 {
        self.mass() * HEAT_PER_MASS
    }

    /// Heat as a fraction of the overheating point.
    pub fn heat_fraction(&self) -> f64 {
        self.heat / self.max_heat()
    }

    fn slow_factor(&self) -> f64 {
        1.0 / (1.0 + SLOWING_FACTOR * self.slowing)
    }

    /// Degrees per tick.
    pub fn turn_rate(&self) -> f64 {
        self.attr("turn") / self.mass() * self.slow_factor()
    }

    pub fn acceleration(&self) -> f64 {
        self.attr("thrust") / self.mass() * self.slow_factor()
    }

    pub fn reverse_acceleration(&self) -> f64 {
        self.attr("reverse thrust") / self.mass() * self.slow_factor()
    }

    pub fn max_velocity(&self) -> f64 {
        let drag = self.attr("drag");
        if drag > 0.0 {
            self.attr("thrust") / drag
        } else {
            f64::INFINITY
        }
    }

    /// Fraction of velocity kept each tick.
    fn drag_factor(&self) -> f64 {
        1.0 - (self.attr("drag") / self.mass()).clamp(0.0, 1.0)
    }

    /// Hull below which the ship is disabled.
    pub fn disable_threshold(&self) -> f64 {
        let max_hull = self.max_hull();
        (DISABLE_MIN_FRACTION * max_hull).max((DISABLE_MAX_FRACTION * max_hull).min(DISABLE_HULL))
    }

    pub fn has_hyperdrive(&self) -> bool {
        self.attr("hyperdrive") > 0.0
    }

    pub fn has_jump_drive(&self) -> bool {
        self.attr("jump drive") > 0.0
    }

    pub fn jump_fuel(&self, jump_drive: bool) -> f64 {
        let explicit = self.attr("jump fuel");
        if explicit > 0.0 {
            explicit
        } else if jump_drive {
            JUMP_DRIVE_FUEL
        } else {
            HYPERDRIVE_FUEL
        }
    }

    pub fn jumps_remaining(&self) -> u32 {
        if !self.has_hyperdrive() && !self.has_jump_drive() {
            return 0;
        }
        let cost = self.jump_fuel(!self.has_hyperdrive());
        (self.fuel / cost).floor().max(0.0) as u32
    }

    // ---- State ----

    pub fn is_destroyed(&self) -> bool {
        self.hull <= 0.0
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled || self.overheated
    }

    pub fn is_overheated(&self) -> bool {
        self.overheated
    }

    pub fn is_hyperspacing(&self) -> bool {
        self.hyperspace_system.is_some() || self.hyperspace_count > 0
    }

    pub fn is_entering_hyperspace(&self) -> bool {
        self.hyperspace_system.is_some()
    }

    pub fn is_landing(&self) -> bool {
        self.landing_planet.is_some() || self.body.zoom < 1.0
    }

    pub fn is_cloaked(&self) -> bool {
        self.cloak >= 1.0
    }

    pub fn is_targetable(&self) -> bool {
        self.body.zoom >= 1.0
            && self.explosion_rate == 0
            && !self.is_destroyed()
            && self.hyperspace_count < UNTARGETABLE_HYPERSPACE_COUNT
            && !self.is_cloaked()
    }

    /// Steering, firing and the like are possible.
    pub fn can_act(&self) -> bool {
        !self.is_destroyed() && !self.is_disabled() && !self.is_hyperspacing() && !self.is_landing()
    }

    /// Tracking view of this ship for projectiles aimed at it.
    pub fn target_state(&self, entity: Entity) -> TargetState {
        TargetState {
            entity,
            position: self.body.position,
            velocity: self.body.velocity,
            government: self.body.government,
            system: self.system,
            is_targetable: self.is_targetable(),
            is_disabled: self.is_disabled(),
            heat: self.heat_fraction(),
            mass: self.mass(),
            optical_jamming: self.attr("optical jamming"),
            radar_jamming: self.attr("radar jamming"),
        }
    }

    /// Re-derive the disabled flag from the hull, with hysteresis.
    fn update_disabled(&mut self) {
        let threshold = self.disable_threshold();
        if self.disabled {
            if self.hull >= DISABLE_RECOVERY * threshold {
                self.disabled = false;
            }
        } else if self.hull < threshold {
            self.disabled = true;
        }
    }

    fn clamp_supplies(&mut self) {
        self.shields = self.shields.clamp(0.0, self.max_shields());
        self.hull = self.hull.clamp(0.0, self.max_hull());
        self.energy = self.energy.clamp(0.0, self.max_energy());
        self.fuel = self.fuel.clamp(0.0, self.max_fuel());
        self.heat = self.heat.max(0.0);
    }

    /// One tick of status drain and decay, generation, repair and cooling.
    pub fn regenerate(&mut self) {
        if self.is_destroyed() {
            return;
        }
        self.energy -= self.ion;
        self.shields -= self.discharge;
        self.hull -= self.corrosion;
        self.fuel -= self.leak;
        self.heat += self.burn;

        let decay = |value: f64, resistance: f64| (STATUS_DECAY * value - resistance).max(0.0);
        self.ion = decay(self.ion, self.attr("ion resistance"));
        self.scramble = decay(self.scramble, self.attr("scramble resistance"));
        self.disruption = decay(self.disruption, self.attr("disruption resistance"));
        self.slowing = decay(self.slowing, self.attr("slowing resistance"));
        self.discharge = decay(self.discharge, self.attr("discharge resistance"));
        self.corrosion = decay(self.corrosion, self.attr("corrosion resistance"));
        self.leak = decay(self.leak, self.attr("leak resistance"));
        self.burn = decay(self.burn, self.attr("burn resistance"));

        self.energy += self.attr("energy generation") - self.attr("energy consumption");
        self.fuel += self.attr("fuel generation");
        self.hull += self.attr("hull repair rate");
        if !self.is_disabled() {
            self.shields += self.attr("shield generation");
        }
        self.heat = self.heat * HEAT_RETENTION + self.attr("heat generation") - self.attr("cooling");
        self.clamp_supplies();

        let max_heat = self.max_heat();
        if self.heat > max_heat {
            self.overheated = true;
        } else if self.overheated && self.heat < OVERHEAT_RECOVERY * max_heat {
            self.overheated = false;
        }
        self.update_disabled();
    }

    /// Randomly wander the pilot's aim by its personality's confusion.
    pub fn drift_confusion<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let amount = self.personality.confusion;
        if amount <= 0.0 {
            self.confusion = Point::ZERO;
            return;
        }
        let nudge = Point::new(random::normal(rng), random::normal(rng)) * (0.1 * amount);
        self.confusion = (self.confusion + nudge) * 0.99;
        let limit = 10.0 * amount;
        if self.confusion.length() > limit {
            self.confusion = unit(self.confusion) * limit;
        }
    }

    // ---- Motion ----

    /// Move one tick. Supplies regenerate first.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        around: &Surroundings<'_>,
        rng: &mut R,
        out: &mut Vec<Cue>,
    ) -> Motion {
        let mut motion = Motion::default();
        self.regenerate();
        self.armament.step(around.catalog);

        if self.is_destroyed() {
            self.explode(around.catalog, rng, out, &mut motion);
            self.body.velocity *= self.drag_factor();
            self.body.position += self.body.velocity;
        } else if self.is_hyperspacing() {
            self.fly_hyperspace(around, rng, &mut motion);
        } else if self.is_landing() {
            self.fly_landing(around, &mut motion);
        } else if self.is_disabled() {
            self.body.velocity *= self.drag_factor();
            self.body.position += self.body.velocity;
        } else {
            self.fly(around);
        }
        motion
    }

    fn explode<R: Rng + ?Sized>(
        &mut self,
        catalog: &Catalog,
        rng: &mut R,
        out: &mut Vec<Cue>,
        motion: &mut Motion,
    ) {
        let Some(model) = catalog.ship(self.model) else {
            motion.remove = true;
            return;
        };
        self.explosion_rate += 1;
        if (random::int(rng, EXPLOSION_ODDS) as i32) < self.explosion_rate {
            self.small_explosion(model, rng, out);
            self.explosion_count += 1;
        }
        if self.explosion_count >= self.explosion_total {
            cues::place(out, &model.explode, &self.body);
            cues::place(out, &model.final_explode, &self.body);
            log::debug!("{} explodes", self.name);
            motion.final_explosion = true;
            motion.remove = true;
        }
    }

    fn small_explosion<R: Rng + ?Sized>(&self, model: &ShipModel, rng: &mut R, out: &mut Vec<Cue>) {
        if model.explode.is_empty() {
            return;
        }
        let (effect, _) = model.explode[random::int(rng, model.explode.len() as u32) as usize];
        let mut at = self.body.clone();
        let spread = 0.5 * self.body.radius() * random::real(rng);
        at.position += Angle::random(rng).unit() * spread;
        cues::place(out, &[(effect, 1)], &at);
    }

    fn fly_hyperspace<R: Rng + ?Sized>(
        &mut self,
        around: &Surroundings<'_>,
        rng: &mut R,
        motion: &mut Motion,
    ) {
        let facing = self.body.facing.unit();
        if let Some(destination) = self.hyperspace_system {
            self.hyperspace_count += 1;
            if !self.using_jump_drive {
                self.body.velocity += facing * HYPER_A;
            }
            self.body.position += self.body.velocity;
            if self.hyperspace_count < HYPER_C {
                return;
            }

            let Some(from) = self.system else {
                self.hyperspace_system = None;
                return;
            };
            self.hyperspace_system = None;
            self.system = Some(destination);
            self.target_system = None;
            let arrival = around.system(Some(destination)).and_then(|system| {
                self.target_planet
                    .and_then(|planet| system.find_stellar(planet))
                    .or_else(|| system.objects.iter().find(|o| o.planet.is_some()))
                    .map(|object| object.position)
            });
            let target = arrival.unwrap_or(Point::ZERO) + self.hyperspace_offset;
            if self.using_jump_drive {
                let scatter = JUMP_SCATTER * (1.0 + random::real(rng));
                self.body.position = target + Angle::random(rng).unit() * scatter;
                self.body.velocity = Point::ZERO;
                self.hyperspace_count = 0;
            } else {
                let c = f64::from(HYPER_C);
                self.body.position = target - facing * (c * c * 0.5 * HYPER_A + HYPER_D);
                self.body.velocity = facing * (c * HYPER_A);
            }
            log::debug!("{} jumps from {:?} to {:?}", self.name, from, destination);
            motion.jumped = Some((from, destination));
        } else {
            self.hyperspace_count -= 1;
            let speed = self.body.velocity.length();
            let floor = HYPER_A.max(self.max_velocity());
            if speed > floor {
                self.body.velocity *= (speed - HYPER_A).max(floor) / speed;
            }
            self.body.position += self.body.velocity;
        }
    }

    fn fly_landing(&mut self, around: &Surroundings<'_>, motion: &mut Motion) {
        let Some(planet) = self.landing_planet else {
            // Taking off.
            self.body.zoom = (self.body.zoom + LANDING_ZOOM_STEP).min(1.0);
            self.body.position += self.body.velocity;
            return;
        };
        let Some(object) = around.system(self.system).and_then(|s| s.find_stellar(planet)) else {
            self.landing_planet = None;
            return;
        };
        self.body.velocity = (object.position - self.body.position) * LANDING_PULL;
        self.body.position += self.body.velocity;
        self.body.zoom = (self.body.zoom - LANDING_ZOOM_STEP).max(0.0);
        if self.body.zoom > 0.0 {
            return;
        }
        log::debug!("{} lands on {:?}", self.name, planet);
        motion.landed = Some(planet);
        if self.is_special {
            self.fuel = self.max_fuel();
            self.energy = self.max_energy();
            self.landing_planet = None;
            self.target_planet = None;
            self.body.velocity = Point::ZERO;
        } else {
            motion.remove = true;
        }
    }

    fn fly(&mut self, around: &Surroundings<'_>) {
        let commands = self.commands;

        let cloak_rate = self.attr("cloak");
        if cloak_rate > 0.0 {
            let energy = self.attr("cloaking energy");
            let fuel = self.attr("cloaking fuel");
            if commands.has(Command::CLOAK) && self.energy >= energy && self.fuel >= fuel {
                self.cloak = (self.cloak + cloak_rate).min(1.0);
                self.energy -= energy;
                self.fuel -= fuel;
            } else {
                self.cloak = (self.cloak - cloak_rate).max(0.0);
            }
            self.body.alpha = 1.0 - self.cloak;
        }

        let mut turn = commands.turn();
        if turn == 0.0 {
            turn = f64::from(u8::from(commands.has(Command::RIGHT)))
                - f64::from(u8::from(commands.has(Command::LEFT)));
        }
        if turn != 0.0 {
            let cost = turn.abs() * self.attr("turning energy");
            if self.energy >= cost {
                self.energy -= cost;
                self.heat += turn.abs() * self.attr("turning heat");
                self.body.facing += self.turn_rate() * turn;
            }
        }

        let mut thrust = commands.thrust();
        if thrust == 0.0 {
            if commands.has(Command::FORWARD) {
                thrust = 1.0;
            } else if commands.has(Command::REVERSE) {
                thrust = -1.0;
            }
        }
        let facing = self.body.facing.unit();
        if thrust > 0.0 && self.attr("thrust") > 0.0 {
            let cost = thrust * self.attr("thrusting energy");
            if self.energy >= cost {
                self.energy -= cost;
                self.heat += thrust * self.attr("thrusting heat");
                self.body.velocity += facing * (self.acceleration() * thrust);
            }
        } else if thrust < 0.0 && self.attr("reverse thrust") > 0.0 {
            let cost = -thrust * self.attr("reverse thrusting energy");
            if self.energy >= cost {
                self.energy -= cost;
                self.heat += -thrust * self.attr("reverse thrusting heat");
                self.body.velocity += facing * (self.reverse_acceleration() * thrust);
            }
        }
        let afterburner = self.attr("afterburner thrust");
        if commands.has(Command::AFTERBURNER) && afterburner > 0.0 {
            let energy = self.attr("afterburner energy");
            let fuel = self.attr("afterburner fuel");
            if self.energy >= energy && self.fuel >= fuel {
                self.energy -= energy;
                self.fuel -= fuel;
                self.heat += self.attr("afterburner heat");
                self.body.velocity += facing * (afterburner / self.mass() * self.slow_factor());
            }
        }

        self.body.velocity *= self.drag_factor();
        self.body.position += self.body.velocity;

        if commands.has(Command::LAND) {
            self.try_land(around);
        }
        if commands.has(Command::HYPERSPACE) {
            self.try_jump(around);
        }
    }

    fn try_land(&mut self, around: &Surroundings<'_>) {
        let Some(planet) = self.target_planet else {
            return;
        };
        let landable = around.catalog.planet(planet).is_some_and(|p| p.landable);
        let Some(object) = around.system(self.system).and_then(|s| s.find_stellar(planet)) else {
            return;
        };
        if landable
            && self.body.position.distance(object.position) < object.radius
            && self.body.velocity.length() < LANDING_SPEED
        {
            self.landing_planet = Some(planet);
        }
    }

    fn try_jump(&mut self, around: &Surroundings<'_>) {
        let (Some(to), Some(here)) = (self.target_system, around.system(self.system)) else {
            return;
        };
        let jump_drive = if self.has_hyperdrive() && here.is_linked(to) {
            false
        } else if self.has_jump_drive() && (here.is_neighbor(to) || here.is_linked(to)) {
            true
        } else {
            return;
        };
        let Some(there) = around.system(Some(to)) else {
            return;
        };
        let direction = there.position - here.position;
        let cost = self.jump_fuel(jump_drive);
        if self.fuel < cost
            || !is_aligned_for_jump(self.body.facing, self.body.velocity, self.turn_rate(), direction)
        {
            return;
        }
        self.fuel -= cost;
        self.body.facing = Angle::from_vector(direction);
        self.hyperspace_system = Some(to);
        self.hyperspace_count = 0;
        self.using_jump_drive = jump_drive;
        self.hyperspace_offset = around.parent_position.map_or(Point::ZERO, |parent| {
            let offset = self.body.position - parent;
            if offset.length() > MAX_HYPERSPACE_OFFSET {
                unit(offset) * MAX_HYPERSPACE_OFFSET
            } else {
                offset
            }
        });
        log::debug!("{} enters hyperspace toward {:?}", self.name, to);
    }

    // ---- Weapons ----

    pub fn can_fire(&self) -> bool {
        self.can_act() && !self.is_cloaked()
    }

    fn can_afford(&self, weapon: &Weapon) -> bool {
        let cost = &weapon.firing;
        let ammo = weapon.ammo.map_or(true, |ammo| {
            self.outfits.get(&ammo).copied().unwrap_or(0) >= weapon.ammo_usage as i32
        });
        ammo && self.energy >= cost.energy + cost.relative_energy * self.max_energy()
            && self.fuel >= cost.fuel + cost.relative_fuel * self.max_fuel()
            && self.hull > cost.hull + cost.relative_hull * self.max_hull()
            && self.shields >= cost.shields + cost.relative_shields * self.max_shields()
    }

    /// Pay the firing costs and ammunition of one shot.
    fn expend(&mut self, weapon: &Weapon, catalog: &Catalog) {
        let cost = &weapon.firing;
        self.energy -= cost.energy + cost.relative_energy * self.max_energy();
        self.fuel -= cost.fuel + cost.relative_fuel * self.max_fuel();
        self.hull -= cost.hull + cost.relative_hull * self.max_hull();
        self.shields -= cost.shields + cost.relative_shields * self.max_shields();
        self.heat += cost.heat + cost.relative_heat * self.max_heat();
        if let Some(ammo) = weapon.ammo {
            self.remove_outfit(ammo, weapon.ammo_usage as i32, catalog);
        }
        self.clamp_supplies();
    }

    /// Take `count` of an outfit out, with its attributes.
    pub fn remove_outfit(&mut self, outfit: OutfitId, count: i32, catalog: &Catalog) {
        let Some(installed) = self.outfits.get_mut(&outfit) else {
            return;
        };
        let count = count.min(*installed);
        *installed -= count;
        if *installed == 0 {
            self.outfits.remove(&outfit);
        }
        if let Some(definition) = catalog.outfit(outfit) {
            self.attributes.add(&definition.attributes, -count);
        }
    }

    /// Fire every commanded, ready weapon. `target` is this ship's target,
    /// if it still exists.
    pub fn fire<R: Rng + ?Sized>(
        &mut self,
        me: Entity,
        catalog: &Catalog,
        target: Option<&TargetState>,
        rng: &mut R,
        out: &mut Vec<Cue>,
    ) -> Vec<Projectile> {
        let mut projectiles = Vec::new();
        self.has_special_weapons = false;
        if !self.can_fire() {
            return projectiles;
        }
        let jam_chance = self.scramble / (self.scramble + SCRAMBLE_HALF);
        for index in 0..self.armament.hardpoints().len() {
            let Some(id) = self.armament.hardpoints()[index].outfit else {
                continue;
            };
            let Some(weapon) = catalog.weapon(id) else {
                continue;
            };
            if weapon.is_special() {
                self.has_special_weapons = true;
                continue;
            }
            if !self.commands.has_fire(index)
                || !self.armament.hardpoints()[index].is_ready(weapon)
                || !self.can_afford(weapon)
            {
                continue;
            }
            if jam_chance > 0.0 && random::real(rng) < jam_chance {
                self.armament.hardpoints_mut()[index].jam(weapon);
                continue;
            }
            let shots = if weapon.cluster {
                self.armament.hardpoints()[index].burst_count().max(1)
            } else {
                1
            };
            for _ in 0..shots {
                if !self.can_afford(weapon) {
                    break;
                }
                let Some(shot) = self.armament.hardpoints_mut()[index].fire(weapon, &self.body, rng)
                else {
                    break;
                };
                let projectile = Projectile::fire(
                    me, &self.body, self.system, shot.start, shot.aim, id, weapon, target, rng,
                );
                let mut muzzle = projectile.body.clone();
                muzzle.velocity = self.body.velocity;
                cues::place(out, &weapon.fire_effects, &muzzle);
                cues::sound(out, weapon.sound.as_deref(), &muzzle);
                projectiles.push(projectile);
                self.expend(weapon, catalog);
                if weapon.firing_force != 0.0 {
                    self.body.velocity -= shot.aim.unit() * (weapon.firing_force / self.mass());
                    self.body.velocity *= self.drag_factor();
                }
            }
        }
        projectiles
    }

    /// Fire the anti-missile or tractor beam at `index` toward `target`,
    /// paying its costs. False when out of range, arc or reload.
    pub fn fire_special(
        &mut self,
        index: usize,
        catalog: &Catalog,
        target: Point,
        out: &mut Vec<Cue>,
    ) -> bool {
        let Some(id) = self.armament.hardpoints().get(index).and_then(|h| h.outfit) else {
            return false;
        };
        let Some(weapon) = catalog.weapon(id) else {
            return false;
        };
        if !weapon.is_special() || !self.can_fire() || !self.can_afford(weapon) {
            return false;
        }
        let Some(shot) = self.armament.hardpoints_mut()[index].fire_special(weapon, &self.body, target)
        else {
            return false;
        };
        let mut at = Body::new(shot.start, self.body.velocity, shot.aim);
        cues::place(out, &weapon.fire_effects, &at);
        cues::sound(out, weapon.sound.as_deref(), &at);
        at.position = target;
        cues::place(out, &weapon.hit_effects, &at);
        self.expend(weapon, catalog);
        true
    }

    /// Turn turrets by the given amounts of their turn rates.
    pub fn aim_turrets(&mut self, aim: &[(usize, f64)], catalog: &Catalog) {
        let multiplier = self.attr("turret turn multiplier");
        for &(index, amount) in aim {
            self.armament.aim(index, amount, multiplier, catalog);
        }
    }

    // ---- Damage ----

    /// Apply a weapon hit at `scale` (blast falloff or hazard strength).
    /// `source` is where the hit came from, for the direction of hit force.
    pub fn take_damage(
        &mut self,
        weapon: &Weapon,
        scale: f64,
        distance_traveled: f64,
        source: Option<Point>,
    ) -> DamageDealt {
        use DamageChannel as C;

        let scale = scale * weapon.dropoff(distance_traveled);
        let damage = &weapon.damage;
        let amount = |absolute: C, relative: C, max: f64| {
            (damage[absolute] + damage[relative] * max) * scale
        };
        let protect = |value: f64, name: &str| value / (1.0 + self.attr(name));

        let shield_damage = protect(amount(C::Shield, C::RelativeShield, self.max_shields()), "shield protection");
        let hull_damage = protect(amount(C::Hull, C::RelativeHull, self.max_hull()), "hull protection");
        let disabled_damage =
            protect(amount(C::Disabled, C::RelativeDisabled, self.max_hull()), "hull protection");
        let energy_damage =
            protect(amount(C::Energy, C::RelativeEnergy, self.max_energy()), "energy protection");
        let fuel_damage = protect(amount(C::Fuel, C::RelativeFuel, self.max_fuel()), "fuel protection");
        let heat_damage = protect(amount(C::Heat, C::RelativeHeat, self.max_heat()), "heat protection");
        let ion = protect(damage[C::Ion] * scale, "ion protection");
        let scramble = protect(damage[C::Scramble] * scale, "scramble protection");
        let disruption = protect(damage[C::Disruption] * scale, "disruption protection");
        let slowing = protect(damage[C::Slowing] * scale, "slowing protection");
        let discharge = protect(damage[C::Discharge] * scale, "discharge protection");
        let corrosion = protect(damage[C::Corrosion] * scale, "corrosion protection");
        let leak = protect(damage[C::Leak] * scale, "leak protection");
        let burn = protect(damage[C::Burn] * scale, "burn protection");
        let hit_force = protect(damage[C::HitForce] * scale, "force protection");
        let piercing = protect(weapon.piercing, "piercing protection").clamp(0.0, 1.0);

        let mut shield_fraction = (1.0 - piercing) / (1.0 + self.disruption * DISRUPTION_FACTOR);
        if self.shields <= 0.0 {
            shield_fraction = 0.0;
        } else if shield_damage > 0.0 {
            shield_fraction = shield_fraction.min(self.shields / shield_damage);
        }
        let was_disabled = self.is_disabled();
        let was_alive = !self.is_destroyed();
        let hull_source = if was_disabled && disabled_damage > 0.0 {
            disabled_damage
        } else {
            hull_damage
        };

        let mut dealt = DamageDealt {
            shield: (shield_damage * shield_fraction).min(self.shields),
            ..Default::default()
        };
        self.shields -= dealt.shield;
        dealt.hull = (hull_source * (1.0 - shield_fraction)).min(self.hull.max(0.0));
        self.hull -= dealt.hull;

        let leakage = 1.0 - 0.5 * shield_fraction;
        dealt.energy = energy_damage * leakage;
        dealt.fuel = fuel_damage * leakage;
        dealt.heat = heat_damage * leakage;
        dealt.ion = ion * leakage;
        dealt.scramble = scramble * leakage;
        dealt.disruption = disruption * leakage;
        dealt.slowing = slowing * leakage;
        dealt.discharge = discharge * leakage;
        dealt.corrosion = corrosion * leakage;
        dealt.leak = leak * leakage;
        dealt.burn = burn * leakage;
        self.energy = (self.energy - dealt.energy).max(0.0);
        self.fuel = (self.fuel - dealt.fuel).max(0.0);
        self.heat += dealt.heat;
        self.ion += dealt.ion;
        self.scramble += dealt.scramble;
        self.disruption += dealt.disruption;
        self.slowing += dealt.slowing;
        self.discharge += dealt.discharge;
        self.corrosion += dealt.corrosion;
        self.leak += dealt.leak;
        self.burn += dealt.burn;

        if hit_force != 0.0 {
            if let Some(source) = source {
                let direction = unit(self.body.position - source);
                let push = if weapon.gravitational {
                    hit_force
                } else {
                    hit_force / self.mass()
                };
                self.body.velocity += direction * push;
                dealt.hit_force = push;
            }
        }

        self.update_disabled();
        dealt.disabled = !was_disabled && self.is_disabled();
        dealt.destroyed = was_alive && self.is_destroyed();
        dealt
    }

    // ---- Carried ships ----

    pub fn can_be_carried(&self) -> bool {
        CARRIED_CATEGORIES.contains(&self.category.as_str())
    }

    pub fn bays_free(&self, category: Option<&str>) -> usize {
        self.bays
            .iter()
            .filter(|bay| bay.fighter.is_none() && category.map_or(true, |c| bay.category == c))
            .count()
    }

    pub fn carried(&self) -> usize {
        self.bays.iter().filter(|bay| bay.fighter.is_some()).count()
    }

    /// Park a fighter in a free bay of its category. Hands it back when
    /// there is no room.
    pub fn carry(&mut self, mut fighter: Ship) -> Result<(), Box<Ship>> {
        if !fighter.can_be_carried() {
            return Err(Box::new(fighter));
        }
        let Some(bay) = self
            .bays
            .iter_mut()
            .find(|bay| bay.fighter.is_none() && bay.category == fighter.category)
        else {
            return Err(Box::new(fighter));
        };
        fighter.commands = Command::NONE;
        fighter.target_ship = None;
        fighter.body.velocity = Point::ZERO;
        bay.fighter = Some(Box::new(fighter));
        Ok(())
    }

    /// Deploy every carried fighter at its bay, moving with the carrier.
    pub fn launch(&mut self) -> Vec<Ship> {
        let mut launched = Vec::new();
        for bay in &mut self.bays {
            let Some(mut fighter) = bay.fighter.take() else {
                continue;
            };
            fighter.body.position = self.body.position + self.body.facing.rotate(bay.point);
            fighter.body.velocity = self.body.velocity;
            fighter.body.facing = self.body.facing;
            fighter.body.zoom = 1.0;
            fighter.system = self.system;
            fighter.body.government = self.body.government;
            launched.push(*fighter);
        }
        launched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corsair_core::damage::DamageVector;
    use corsair_core::outfit::Outfit;
    use corsair_core::ship_model::{BaySpec, HardpointSpec};
    use corsair_core::universe::StellarObject;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hull_weapon(hull: f64) -> Weapon {
        let mut damage = DamageVector::default();
        damage[DamageChannel::Hull] = hull;
        let mut weapon = Weapon::default();
        weapon.velocity = 10.0;
        weapon.lifetime = 100;
        weapon.damage = damage;
        weapon.sanitize(false);
        weapon
    }

    fn catalog_with(attributes: Attributes) -> (Catalog, ShipModelId) {
        let mut catalog = Catalog::new();
        let model = ShipModel {
            name: "Hauler".into(),
            attributes,
            ..Default::default()
        };
        let id = catalog.add_ship(model);
        (catalog, id)
    }

    fn ship_with(attributes: Attributes) -> (Catalog, Ship) {
        let (catalog, id) = catalog_with(attributes);
        let ship = Ship::new(id, catalog.ship(id).unwrap(), &catalog);
        (catalog, ship)
    }

    fn base() -> Attributes {
        Attributes::new()
            .with("mass", 100.0)
            .with("hull", 200.0)
            .with("drag", 1.0)
            .with("thrust", 10.0)
            .with("turn", 200.0)
            .with("energy capacity", 100.0)
            .with("fuel capacity", 300.0)
    }

    // ---- Condition ----

    #[test]
    fn test_disable_hysteresis() {
        let (_, mut ship) = ship_with(base().with("hull repair rate", 2.0));
        assert_eq!(ship.disable_threshold(), 100.0);

        let dealt = ship.take_damage(&hull_weapon(101.0), 1.0, 0.0, None);
        assert_eq!(ship.hull, 99.0);
        assert!(dealt.disabled);
        assert!(ship.is_disabled());

        ship.regenerate();
        ship.regenerate();
        assert_eq!(ship.hull, 103.0);
        assert!(ship.is_disabled(), "still disabled above the threshold");
        ship.regenerate();
        assert_eq!(ship.hull, 105.0);
        assert!(!ship.is_disabled());
    }

    #[test]
    fn test_disable_threshold_bounds() {
        let (_, small) = ship_with(Attributes::new().with("hull", 100.0));
        assert_eq!(small.disable_threshold(), 50.0);
        let (_, large) = ship_with(Attributes::new().with("hull", 5000.0));
        assert_eq!(large.disable_threshold(), 500.0);
    }

    #[test]
    fn test_shields_absorb_before_hull() {
        let (_, mut ship) = ship_with(base().with("shields", 10.0));
        let mut weapon = hull_weapon(20.0);
        weapon.damage[DamageChannel::Shield] = 15.0;
        let dealt = ship.take_damage(&weapon, 1.0, 0.0, None);
        // Only two thirds of the shot fits in the shields.
        assert!((dealt.shield - 10.0).abs() < 1e-9);
        assert!((dealt.hull - 20.0 / 3.0).abs() < 1e-9);
        assert_eq!(ship.shields, 0.0);

        let dealt = ship.take_damage(&weapon, 1.0, 0.0, None);
        assert_eq!(dealt.shield, 0.0);
        assert_eq!(dealt.hull, 20.0);
    }

    #[test]
    fn test_piercing_and_protection() {
        let (_, mut ship) = ship_with(base().with("shields", 100.0).with("hull protection", 1.0));
        let mut weapon = hull_weapon(20.0);
        weapon.damage[DamageChannel::Shield] = 10.0;
        weapon.piercing = 0.5;
        let dealt = ship.take_damage(&weapon, 1.0, 0.0, None);
        assert!((dealt.shield - 5.0).abs() < 1e-9);
        assert!((dealt.hull - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_hull_never_negative() {
        let (_, mut ship) = ship_with(base());
        let dealt = ship.take_damage(&hull_weapon(1000.0), 1.0, 0.0, None);
        assert_eq!(ship.hull, 0.0);
        assert_eq!(dealt.hull, 200.0);
        assert!(dealt.destroyed);
        assert!(!ship.is_targetable());
    }

    #[test]
    fn test_status_counters_decay() {
        let (_, mut ship) = ship_with(base());
        let mut weapon = hull_weapon(0.0);
        weapon.damage[DamageChannel::Ion] = 10.0;
        ship.take_damage(&weapon, 1.0, 0.0, None);
        assert_eq!(ship.ion, 10.0);
        ship.regenerate();
        assert!((ship.ion - 9.9).abs() < 1e-9);
        assert!(ship.energy < ship.max_energy());
    }

    #[test]
    fn test_hit_force_pushes_away() {
        let (_, mut ship) = ship_with(base());
        let mut weapon = hull_weapon(0.0);
        weapon.damage[DamageChannel::HitForce] = 200.0;
        ship.take_damage(&weapon, 1.0, 0.0, Some(Point::new(-10.0, 0.0)));
        assert!((ship.body.velocity.x - 2.0).abs() < 1e-9);

        weapon.gravitational = true;
        ship.body.velocity = Point::ZERO;
        ship.take_damage(&weapon, 1.0, 0.0, Some(Point::new(-10.0, 0.0)));
        assert!((ship.body.velocity.x - 200.0).abs() < 1e-9);
    }

    // ---- Motion ----

    fn systems() -> Vec<System> {
        let home = System {
            name: "Home".into(),
            links: vec![SystemId(1)],
            objects: vec![StellarObject {
                planet: Some(PlanetId(0)),
                radius: 100.0,
                position: Point::new(0.0, 0.0),
                ..Default::default()
            }],
            ..Default::default()
        };
        let away = System {
            name: "Away".into(),
            position: Point::new(0.0, -100.0),
            links: vec![SystemId(0)],
            objects: vec![StellarObject {
                planet: Some(PlanetId(1)),
                radius: 100.0,
                position: Point::new(500.0, 500.0),
                ..Default::default()
            }],
            ..Default::default()
        };
        vec![home, away]
    }

    #[test]
    fn test_thrust_and_drag() {
        let (catalog, mut ship) = ship_with(base());
        let systems = systems();
        let around = Surroundings {
            catalog: &catalog,
            systems: &systems,
            parent_position: None,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut cues = Vec::new();
        ship.commands = Command::FORWARD;
        ship.advance(&around, &mut rng, &mut cues);
        // 0.1 px/tick² of thrust, then 1% drag.
        assert!((ship.body.velocity.y + 0.099).abs() < 1e-12);
        assert!(ship.body.velocity.x.abs() < 1e-12);
        assert!(ship.max_velocity() == 10.0);
    }

    #[test]
    fn test_hyperspace_arrival() {
        let (catalog, mut ship) = ship_with(base().with("hyperdrive", 1.0).with("thrust", 0.0));
        let systems = systems();
        let around = Surroundings {
            catalog: &catalog,
            systems: &systems,
            parent_position: None,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut cues = Vec::new();
        ship.system = Some(SystemId(0));
        ship.target_system = Some(SystemId(1));
        ship.commands = Command::HYPERSPACE;
        ship.advance(&around, &mut rng, &mut cues);
        assert!(ship.is_entering_hyperspace());
        assert_eq!(ship.fuel, 200.0);
        ship.commands = Command::NONE;

        let mut jumped = None;
        for _ in 0..HYPER_C {
            let motion = ship.advance(&around, &mut rng, &mut cues);
            if motion.jumped.is_some() {
                jumped = motion.jumped;
                break;
            }
        }
        assert_eq!(jumped, Some((SystemId(0), SystemId(1))));
        assert_eq!(ship.system, Some(SystemId(1)));
        assert!(ship.target_system.is_none());
        let behind = Point::new(500.0, 500.0) - ship.body.position;
        assert!((behind.length() - 11_000.0).abs() < 1e-6);

        for _ in 0..HYPER_C {
            ship.advance(&around, &mut rng, &mut cues);
        }
        assert!(!ship.is_hyperspacing());
        let remaining = ship.body.position.distance(Point::new(500.0, 500.0));
        assert!(remaining < 1100.0 && remaining > 900.0, "{remaining}");
    }

    #[test]
    fn test_landing_removes_ordinary_ships() {
        let (mut catalog, _) = catalog_with(base());
        catalog.add_planet(corsair_core::universe::Planet {
            name: "Dock".into(),
            landable: true,
            has_spaceport: true,
            ..Default::default()
        });
        let id = ShipModelId(0);
        let mut ship = Ship::new(id, catalog.ship(id).unwrap(), &catalog);
        let systems = systems();
        let around = Surroundings {
            catalog: &catalog,
            systems: &systems,
            parent_position: None,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut cues = Vec::new();
        ship.system = Some(SystemId(0));
        ship.body.position = Point::new(20.0, 0.0);
        ship.target_planet = Some(PlanetId(0));
        ship.commands = Command::LAND;
        ship.advance(&around, &mut rng, &mut cues);
        assert!(ship.is_landing());
        ship.commands = Command::NONE;

        let mut landed = None;
        for _ in 0..60 {
            let motion = ship.advance(&around, &mut rng, &mut cues);
            if motion.remove {
                landed = motion.landed;
                break;
            }
        }
        assert_eq!(landed, Some(PlanetId(0)));
    }

    #[test]
    fn test_dead_ship_explodes_out() {
        let (catalog, mut ship) = ship_with(base());
        let systems = systems();
        let around = Surroundings {
            catalog: &catalog,
            systems: &systems,
            parent_position: None,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut cues = Vec::new();
        ship.hull = 0.0;
        let mut ticks = 0;
        loop {
            ticks += 1;
            let motion = ship.advance(&around, &mut rng, &mut cues);
            if motion.remove {
                assert!(motion.final_explosion);
                break;
            }
            assert!(ticks < 2000, "explosions never finished");
        }
        assert_eq!(ship.explosion_count, DEFAULT_EXPLOSIONS);
    }

    // ---- Weapons and bays ----

    #[test]
    fn test_fire_spends_ammo_and_energy() {
        let mut catalog = Catalog::new();
        let ammo = catalog.add_outfit(Outfit {
            name: "Rocket".into(),
            attributes: Attributes::new().with("mass", 1.0),
            ..Default::default()
        });
        let mut weapon = hull_weapon(5.0);
        weapon.ammo = Some(ammo);
        weapon.firing.energy = 10.0;
        let launcher = catalog.add_outfit(Outfit {
            name: "Launcher".into(),
            weapon: Some(weapon),
            ..Default::default()
        });
        let id = catalog.add_ship(ShipModel {
            name: "Gunboat".into(),
            attributes: base(),
            outfits: vec![(launcher, 1), (ammo, 2)],
            hardpoints: vec![HardpointSpec::default()],
            ..Default::default()
        });
        let mut ship = Ship::new(id, catalog.ship(id).unwrap(), &catalog);
        let me = hecs::World::new().spawn(());
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut cues = Vec::new();
        ship.commands = Command::fire(0);

        let mut fired = 0;
        for _ in 0..300 {
            ship.armament.step(&catalog);
            fired += ship.fire(me, &catalog, None, &mut rng, &mut cues).len();
        }
        assert_eq!(fired, 2);
        assert!(!ship.outfits.contains_key(&ammo));
        assert_eq!(ship.attr("mass"), 100.0);
    }

    #[test]
    fn test_carry_and_launch() {
        let mut catalog = Catalog::new();
        let carrier = catalog.add_ship(ShipModel {
            name: "Carrier".into(),
            attributes: base(),
            bays: vec![BaySpec {
                point: Point::new(0.0, 40.0),
                category: "Fighter".into(),
            }],
            ..Default::default()
        });
        let fighter = catalog.add_ship(ShipModel {
            name: "Dart".into(),
            category: "Fighter".into(),
            attributes: base(),
            ..Default::default()
        });
        let mut carrier = Ship::new(carrier, catalog.ship(carrier).unwrap(), &catalog);
        carrier.body.velocity = Point::new(3.0, 0.0);
        let dart = Ship::new(fighter, catalog.ship(fighter).unwrap(), &catalog);
        assert!(dart.can_be_carried());
        assert_eq!(carrier.bays_free(Some("Fighter")), 1);
        assert!(carrier.carry(dart.clone()).is_ok());
        assert!(carrier.carry(dart).is_err());
        assert_eq!(carrier.carried(), 1);

        let launched = carrier.launch();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].body.velocity, Point::new(3.0, 0.0));
        assert_eq!(launched[0].body.position, Point::new(0.0, 20.0));
        assert_eq!(carrier.carried(), 0);
    }
}
