//! Environmental hazards and minable asteroid definitions.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::datanode::DataNode;
use crate::error::Diagnostics;
use crate::types::{EffectId, OutfitId};
use crate::weapon::Weapon;

/// A periodic damage field that can flare up in a system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub name: String,
    /// Damage delivered on each pulse, before the strength multiplier.
    pub weapon: Weapon,
    /// Base ticks between damage pulses.
    pub period: u32,
    pub min_duration: u32,
    pub max_duration: u32,
    pub min_strength: f64,
    pub max_strength: f64,
    /// Ring around the origin where ships are affected.
    pub min_range: f64,
    pub max_range: f64,
    /// Strength follows a bell curve over the hazard's lifetime.
    pub deviates: bool,
    pub environmental_effects: Vec<(EffectId, u32)>,
}

impl Default for Hazard {
    fn default() -> Self {
        Self {
            name: String::new(),
            weapon: Weapon::default(),
            period: 1,
            min_duration: 1,
            max_duration: 1,
            min_strength: 1.0,
            max_strength: 1.0,
            min_range: 0.0,
            max_range: 10_000.0,
            deviates: true,
            environmental_effects: Vec::new(),
        }
    }
}

impl Hazard {
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut hazard = Hazard {
            name: node.token(1).to_string(),
            ..Default::default()
        };
        // Weapon keys may appear directly under the hazard; collect the rest.
        let mut weapon_keys = Vec::new();
        for child in node.children() {
            match child.key() {
                "period" => hazard.period = child.value(1, diagnostics).max(1.0) as u32,
                "duration" => {
                    hazard.min_duration = child.value(1, diagnostics).max(1.0) as u32;
                    hazard.max_duration = if child.size() >= 3 {
                        child.value(2, diagnostics).max(hazard.min_duration as f64) as u32
                    } else {
                        hazard.min_duration
                    };
                }
                "strength" => {
                    hazard.min_strength = child.value(1, diagnostics).max(0.0);
                    hazard.max_strength = if child.size() >= 3 {
                        child.value(2, diagnostics).max(hazard.min_strength)
                    } else {
                        hazard.min_strength
                    };
                }
                "range" => {
                    if child.size() >= 3 {
                        hazard.min_range = child.value(1, diagnostics).max(0.0);
                        hazard.max_range = child.value(2, diagnostics).max(hazard.min_range);
                    } else {
                        hazard.max_range = child.value(1, diagnostics).max(0.0);
                    }
                }
                "constant strength" => hazard.deviates = false,
                "environmental effect" => {
                    let count = if child.size() >= 3 {
                        child.value(2, diagnostics).max(1.0) as u32
                    } else {
                        1
                    };
                    hazard
                        .environmental_effects
                        .push((catalog.effects.id(child.token(1)), count));
                }
                "weapon" => hazard.weapon = Weapon::load(child, catalog, diagnostics),
                _ => weapon_keys.push(child),
            }
        }
        if !weapon_keys.is_empty() {
            hazard.weapon.load_keys(weapon_keys, catalog, diagnostics);
        }
        hazard
    }

    /// Draw a lifetime in ticks.
    pub fn random_duration<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        self.min_duration + crate::random::int(rng, self.max_duration - self.min_duration + 1)
    }

    /// Draw a peak strength.
    pub fn random_strength<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.min_strength + rng.gen::<f64>() * (self.max_strength - self.min_strength)
    }
}

/// A destructible asteroid that drops cargo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinableDef {
    pub name: String,
    pub sprite: Option<String>,
    pub hull: f64,
    /// Outfits dropped as flotsam when destroyed.
    pub payload: Vec<(OutfitId, u32)>,
    pub explode: Vec<(EffectId, u32)>,
    /// Collision radius.
    pub radius: f64,
}

impl MinableDef {
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut minable = MinableDef {
            name: node.token(1).to_string(),
            hull: 1000.0,
            radius: 30.0,
            ..Default::default()
        };
        for child in node.children() {
            let count = if child.size() >= 3 {
                child.value(2, diagnostics).max(0.0) as u32
            } else {
                1
            };
            match child.key() {
                "sprite" => minable.sprite = Some(child.token(1).to_string()),
                "hull" => minable.hull = child.value(1, diagnostics).max(1.0),
                "radius" => minable.radius = child.value(1, diagnostics).max(1.0),
                "payload" => minable.payload.push((catalog.outfits.id(child.token(1)), count)),
                "explode" => minable.explode.push((catalog.effects.id(child.token(1)), count)),
                _ => child.report_unknown(diagnostics),
            }
        }
        minable
    }
}
