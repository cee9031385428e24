//! Events emitted by the simulation for the layers above it.

use serde::{Deserialize, Serialize};

use crate::geometry::{Angle, Point};
use crate::types::{EffectId, EntityRef, GovernmentId, OutfitId, PlanetId, SystemId};

/// What happened between two ships (or to one ship).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShipEventKind {
    /// A projectile or hazard damaged the target.
    Hit,
    /// The target just became disabled.
    Disable,
    /// The target's hull dropped to zero.
    Destroy,
    /// The actor docked with a disabled target.
    Board,
    /// The actor finished scanning the target's cargo.
    ScanCargo,
    /// The actor finished scanning the target's outfits.
    ScanOutfits,
    /// The target's government now treats the actor's as hostile.
    Provoke { victim: GovernmentId, offender: GovernmentId },
    /// The actor left for another system.
    Jump { from: SystemId, to: SystemId },
    /// The actor landed.
    Land { planet: PlanetId },
    /// The actor (a fighter) launched from the target (its carrier).
    Launch,
    /// The actor collected flotsam.
    Pickup { outfit: Option<OutfitId>, count: u32 },
    /// The actor took over the target.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipEvent {
    pub kind: ShipEventKind,
    pub actor: Option<EntityRef>,
    pub target: Option<EntityRef>,
    pub tick: u64,
}

impl ShipEvent {
    pub fn new(kind: ShipEventKind, actor: Option<EntityRef>, target: Option<EntityRef>) -> Self {
        Self {
            kind,
            actor,
            target,
            tick: 0,
        }
    }
}

/// Presentation-only output: effect placements and sounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Cue {
    Effect {
        effect: EffectId,
        position: Point,
        velocity: Point,
        facing: Angle,
    },
    Sound {
        name: String,
        position: Point,
    },
}
