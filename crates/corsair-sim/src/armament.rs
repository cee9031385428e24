//! The set of weapon mounts on one ship.

use std::collections::BTreeMap;

use corsair_core::catalog::Catalog;
use corsair_core::ship_model::ShipModel;
use corsair_core::types::OutfitId;

use crate::hardpoint::Hardpoint;

#[derive(Debug, Clone, Default)]
pub struct Armament {
    hardpoints: Vec<Hardpoint>,
}

impl Armament {
    /// Mount the template's ports, then fill them from the outfit list:
    /// ports that name an outfit first, then turret weapons into empty
    /// turrets and everything else into empty guns.
    pub fn new(model: &ShipModel, outfits: &BTreeMap<OutfitId, i32>, catalog: &Catalog) -> Self {
        let mut armament = Self {
            hardpoints: model.hardpoints.iter().map(Hardpoint::new).collect(),
        };
        let mut remaining: BTreeMap<OutfitId, i32> = outfits
            .iter()
            .filter(|(&id, _)| catalog.weapon(id).is_some())
            .map(|(&id, &count)| (id, count))
            .collect();

        for (hardpoint, spec) in armament.hardpoints.iter_mut().zip(&model.hardpoints) {
            let Some(id) = spec.outfit else { continue };
            let Some(count) = remaining.get_mut(&id).filter(|count| **count > 0) else {
                continue;
            };
            if let Some(weapon) = catalog.weapon(id) {
                hardpoint.install(id, weapon);
                *count -= 1;
            }
        }
        for (id, count) in remaining {
            let (Some(outfit), Some(weapon)) = (catalog.outfit(id), catalog.weapon(id)) else {
                continue;
            };
            for _ in 0..count {
                let slot = armament
                    .hardpoints
                    .iter_mut()
                    .find(|h| h.outfit.is_none() && h.is_turret == outfit.is_turret());
                match slot {
                    Some(hardpoint) => hardpoint.install(id, weapon),
                    None => {
                        log::warn!("{}: no free mount for {}", model.name, outfit.name);
                        break;
                    }
                }
            }
        }
        armament
    }

    pub fn hardpoints(&self) -> &[Hardpoint] {
        &self.hardpoints
    }

    pub fn hardpoints_mut(&mut self) -> &mut [Hardpoint] {
        &mut self.hardpoints
    }

    pub fn step(&mut self, catalog: &Catalog) {
        for hardpoint in &mut self.hardpoints {
            if let Some(weapon) = hardpoint.outfit.and_then(|id| catalog.weapon(id)) {
                hardpoint.step(weapon);
            }
        }
    }

    /// Turn the turret at `index` by `amount` of its turn rate.
    pub fn aim(&mut self, index: usize, amount: f64, multiplier: f64, catalog: &Catalog) {
        let Some(hardpoint) = self.hardpoints.get_mut(index) else {
            return;
        };
        if let Some(weapon) = hardpoint.outfit.and_then(|id| catalog.weapon(id)) {
            hardpoint.aim(weapon, amount, multiplier);
        }
    }

    /// Whether any mount carries an anti-missile or tractor beam.
    pub fn has_special(&self, catalog: &Catalog) -> bool {
        self.hardpoints.iter().any(|h| {
            h.outfit
                .and_then(|id| catalog.weapon(id))
                .is_some_and(|weapon| weapon.is_special())
        })
    }
}
