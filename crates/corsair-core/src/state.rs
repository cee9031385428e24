//! Game state snapshot: the complete visible state handed to the
//! presentation layer after each tick.

use serde::{Deserialize, Serialize};

use crate::events::{Cue, ShipEvent};
use crate::geometry::{Angle, Point};
use crate::types::{EntityRef, GovernmentId, HazardId, MinableId, OutfitId, ShipModelId, SimTime, SystemId};

/// Everything visible after one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub time: SimTime,
    /// System the presentation layer is looking at.
    pub focus: Option<SystemId>,
    pub ships: Vec<ShipView>,
    pub projectiles: Vec<ProjectileView>,
    pub flotsam: Vec<FlotsamView>,
    pub minables: Vec<MinableView>,
    pub weather: Vec<WeatherView>,
    /// Events raised during the tick, in the order they happened.
    pub events: Vec<ShipEvent>,
    pub cues: Vec<Cue>,
    pub damage: DamageTotals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipView {
    pub id: EntityRef,
    pub name: String,
    pub model: ShipModelId,
    pub government: Option<GovernmentId>,
    pub system: Option<SystemId>,
    pub position: Point,
    pub velocity: Point,
    pub facing: Angle,
    pub zoom: f64,
    pub shields: f64,
    pub hull: f64,
    pub energy: f64,
    pub fuel: f64,
    pub heat: f64,
    pub crew: u32,
    pub cloak: f64,
    pub disabled: bool,
    pub destroyed: bool,
    pub hyperspacing: bool,
    pub is_player: bool,
    pub parent: Option<EntityRef>,
    pub target: Option<EntityRef>,
    pub carried: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: EntityRef,
    pub weapon: OutfitId,
    pub system: Option<SystemId>,
    pub position: Point,
    pub velocity: Point,
    pub facing: Angle,
    pub target: Option<EntityRef>,
    pub lifetime: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlotsamView {
    pub id: EntityRef,
    pub system: Option<SystemId>,
    pub position: Point,
    /// Commodity name or outfit name.
    pub label: String,
    pub count: u32,
    pub lifetime: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinableView {
    pub system: SystemId,
    pub kind: MinableId,
    pub position: Point,
    pub hull: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherView {
    pub hazard: HazardId,
    pub system: SystemId,
    pub origin: Point,
    pub strength: f64,
    pub remaining: u32,
}

/// Damage bookkeeping for one tick: what hits delivered against what
/// ships actually lost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageTotals {
    pub hits: u32,
    pub delivered: f64,
    pub applied: f64,
}
