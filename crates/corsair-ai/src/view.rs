//! Plain-data views of the world handed to the decision layer.
//!
//! The engine flattens each ship into a [`ShipView`] once per tick and
//! writes the returned [`ShipOrders`] back. Nothing here touches the ECS.

use std::collections::BTreeSet;
use std::sync::Arc;

use corsair_core::catalog::Catalog;
use corsair_core::command::Command;
use corsair_core::fleet::Personality;
use corsair_core::geometry::{Angle, Point};
use corsair_core::government::Politics;
use corsair_core::mask::Mask;
use corsair_core::types::{EntityRef, GovernmentId, PlanetId, SystemId};
use corsair_core::universe::{StellarObject, System};

use crate::distance_map::PlayerKnowledge;

/// One weapon mount as the AI sees it.
#[derive(Debug, Clone, Default)]
pub struct WeaponView {
    /// Hardpoint index, used for the fire bit.
    pub index: usize,
    pub is_turret: bool,
    /// Mount position in the ship frame.
    pub point: Point,
    /// Current mount angle relative to the ship's facing.
    pub angle: f64,
    pub turret_turn: f64,
    pub velocity: f64,
    pub total_lifetime: f64,
    /// Shield plus hull damage, including submunitions.
    pub damage: f64,
    pub blast_radius: f64,
    pub is_homing: bool,
    /// Anti-missile or tractor beam; fired by the engine, not by command.
    pub is_special: bool,
    pub is_ready: bool,
}

impl WeaponView {
    pub fn range(&self) -> f64 {
        self.velocity * self.total_lifetime
    }
}

/// Snapshot of one ship.
#[derive(Debug, Clone, Default)]
pub struct ShipView {
    pub id: usize,
    pub entity: EntityRef,
    pub government: GovernmentId,
    pub system: Option<SystemId>,
    pub position: Point,
    pub velocity: Point,
    pub facing: Angle,
    pub radius: f64,
    pub mask: Option<Arc<Mask>>,
    /// Shields as a fraction of maximum.
    pub shields: f64,
    /// Hull as a fraction of maximum.
    pub hull: f64,

    pub is_disabled: bool,
    pub is_targetable: bool,
    pub is_hyperspacing: bool,
    /// Committed to a jump that has not completed yet.
    pub is_entering_hyperspace: bool,
    pub is_landing: bool,
    pub is_player: bool,
    pub is_destroyed: bool,
    pub is_cloaked: bool,
    pub can_be_carried: bool,
    /// Number of fighters waiting in bays.
    pub carried: usize,
    /// Empty bays able to take a fighter back.
    pub bays_free: usize,

    pub turn_rate: f64,
    pub acceleration: f64,
    pub max_velocity: f64,
    pub reverse_acceleration: f64,
    pub has_afterburner: bool,
    pub has_hyperdrive: bool,
    pub has_jump_drive: bool,
    pub jumps_remaining: u32,
    pub scan_range: f64,

    pub target_ship: Option<usize>,
    pub parent: Option<usize>,
    pub target_system: Option<SystemId>,
    pub target_planet: Option<PlanetId>,
    pub hyperspace_system: Option<SystemId>,
    pub landing_planet: Option<PlanetId>,

    pub personality: Personality,
    /// Aiming error of this pilot, added to every firing solution.
    pub confusion: Point,
    pub commands: Command,
    pub weapons: Vec<WeaponView>,
}

impl ShipView {
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn is_armed(&self) -> bool {
        self.weapons.iter().any(|w| !w.is_special && w.damage > 0.0)
    }

    /// Ships able to pick their own maneuvers this tick.
    pub fn can_act(&self) -> bool {
        !self.is_disabled && !self.is_destroyed && !self.is_landing && !self.is_hyperspacing
    }

    pub fn can_jump(&self) -> bool {
        (self.has_hyperdrive || self.has_jump_drive) && self.jumps_remaining > 0
    }
}

/// Everything a decision may read.
pub struct AiContext<'a> {
    pub catalog: &'a Catalog,
    pub politics: &'a Politics,
    /// Systems with stellar positions for the current date, indexed by id.
    pub systems: &'a [System],
    pub ships: &'a [ShipView],
    pub knowledge: Option<&'a PlayerKnowledge>,
    /// `(government, ship)` pairs whose scan has completed.
    pub scanned: &'a BTreeSet<(GovernmentId, EntityRef)>,
    pub step: u64,
}

impl<'a> AiContext<'a> {
    pub fn ship(&self, index: Option<usize>) -> Option<&'a ShipView> {
        index.and_then(|i| self.ships.get(i))
    }

    pub fn system(&self, id: SystemId) -> Option<&'a System> {
        self.systems.get(id.index())
    }

    /// The stellar object carrying `planet` in `system`.
    pub fn stellar(&self, system: Option<SystemId>, planet: PlanetId) -> Option<&'a StellarObject> {
        system
            .and_then(|id| self.system(id))
            .and_then(|system| system.find_stellar(planet))
    }

    /// Vector from one system to another on the map.
    pub fn jump_direction(&self, from: SystemId, to: SystemId) -> Option<Point> {
        let from = self.system(from)?;
        let to = self.system(to)?;
        Some(to.position - from.position)
    }

    pub fn is_enemy(&self, ship: &ShipView, other: &ShipView) -> bool {
        self.politics.is_enemy(ship.government, other.government)
    }

    pub fn has_scanned(&self, ship: &ShipView, other: &ShipView) -> bool {
        self.scanned.contains(&(ship.government, other.entity))
    }
}

/// Decisions for one ship. Fields replace the ship's current values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipOrders {
    pub command: Command,
    pub target_ship: Option<usize>,
    pub target_system: Option<SystemId>,
    pub target_planet: Option<PlanetId>,
    pub parent: Option<usize>,
    /// Per-turret aim amounts in `[-1, 1]`, by hardpoint index.
    pub turret_aim: Vec<(usize, f64)>,
}

impl ShipOrders {
    /// Orders that keep the ship's current targets and clear its commands.
    pub fn keep(ship: &ShipView) -> Self {
        Self {
            command: Command::NONE,
            target_ship: ship.target_ship,
            target_system: ship.target_system,
            target_planet: ship.target_planet,
            parent: ship.parent,
            turret_aim: Vec::new(),
        }
    }
}
