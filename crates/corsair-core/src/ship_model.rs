//! Ship templates: base attributes, hardpoint layout and default loadout.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::datanode::DataNode;
use crate::error::Diagnostics;
use crate::geometry::Point;
use crate::mask::Mask;
use crate::outfit::Attributes;
use crate::types::{EffectId, OutfitId};
use crate::weapon::Weapon;

/// A weapon mount as declared by the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardpointSpec {
    /// Position in sprite coordinates (full scale).
    pub point: Point,
    pub is_turret: bool,
    /// Base facing relative to the ship, in degrees.
    pub base_angle: f64,
    /// Allowed arc relative to the base angle; `None` is omnidirectional
    /// for turrets and fixed for guns.
    pub arc: Option<(f64, f64)>,
    pub parallel: bool,
    /// Angle ranges (relative to the ship) that the mount may not fire into.
    pub blindspots: Vec<(f64, f64)>,
    pub outfit: Option<OutfitId>,
}

/// A fighter or drone bay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaySpec {
    pub point: Point,
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShipModel {
    pub name: String,
    pub sprite: Option<String>,
    /// `Fighter`, `Drone` and the like; carried ships fill bays of the
    /// same category.
    pub category: String,
    pub attributes: Attributes,
    pub outfits: Vec<(OutfitId, i32)>,
    pub hardpoints: Vec<HardpointSpec>,
    pub engines: Vec<Point>,
    pub bays: Vec<BaySpec>,
    pub explode: Vec<(EffectId, u32)>,
    pub final_explode: Vec<(EffectId, u32)>,
    #[serde(skip)]
    pub mask: Option<Arc<Mask>>,
    pub explosion_weapon: Option<Weapon>,
}

impl ShipModel {
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut model = ShipModel {
            name: node.token(1).to_string(),
            ..Default::default()
        };
        for child in node.children() {
            match child.key() {
                "sprite" => model.sprite = Some(child.token(1).to_string()),
                "attributes" => {
                    for grand in child.children() {
                        if grand.key() == "category" {
                            model.category = grand.token(1).to_string();
                            continue;
                        }
                        let value = if grand.size() >= 2 {
                            grand.value(1, diagnostics)
                        } else {
                            1.0
                        };
                        model.attributes.set(grand.key(), value);
                    }
                }
                "outfits" => {
                    for grand in child.children() {
                        let count = if grand.size() >= 2 {
                            grand.value(1, diagnostics) as i32
                        } else {
                            1
                        };
                        model.outfits.push((catalog.outfits.id(grand.key()), count));
                    }
                }
                "gun" | "turret" => {
                    let mut spec = HardpointSpec {
                        point: Point::new(child.value(1, diagnostics), child.value(2, diagnostics)),
                        is_turret: child.key() == "turret",
                        ..Default::default()
                    };
                    if child.size() >= 4 {
                        spec.outfit = Some(catalog.outfits.id(child.token(3)));
                    }
                    for grand in child.children() {
                        match grand.key() {
                            "angle" => spec.base_angle = grand.value(1, diagnostics),
                            "parallel" => spec.parallel = true,
                            "arc" => {
                                let a = grand.value(1, diagnostics);
                                let b = grand.value(2, diagnostics);
                                spec.arc = Some((a.min(b), a.max(b)));
                            }
                            "blindspot" => {
                                let a = grand.value(1, diagnostics);
                                let b = grand.value(2, diagnostics);
                                spec.blindspots.push((a, b));
                            }
                            _ => grand.report_unknown(diagnostics),
                        }
                    }
                    model.hardpoints.push(spec);
                }
                "engine" => model.engines.push(Point::new(
                    child.value(1, diagnostics),
                    child.value(2, diagnostics),
                )),
                "bay" => model.bays.push(BaySpec {
                    category: child.token(1).to_string(),
                    point: Point::new(child.value(2, diagnostics), child.value(3, diagnostics)),
                }),
                "explode" | "final explode" => {
                    let count = if child.size() >= 3 {
                        child.value(2, diagnostics).max(0.0) as u32
                    } else {
                        1
                    };
                    let entry = (catalog.effects.id(child.token(1)), count);
                    if child.key() == "explode" {
                        model.explode.push(entry);
                    } else {
                        model.final_explode.push(entry);
                    }
                }
                "mask" => model.mask = Some(Arc::new(load_mask(child, diagnostics))),
                "explosion weapon" => {
                    model.explosion_weapon = Some(Weapon::load(child, catalog, diagnostics))
                }
                "description" | "thumbnail" | "plural" | "noun" => {}
                _ => child.report_unknown(diagnostics),
            }
        }
        model
    }

    /// Number of gun and turret mounts.
    pub fn mount_counts(&self) -> (usize, usize) {
        let turrets = self.hardpoints.iter().filter(|h| h.is_turret).count();
        (self.hardpoints.len() - turrets, turrets)
    }
}

/// `mask <radius>` builds a circle; otherwise child `point x y` lines form
/// an outline.
fn load_mask(node: DataNode<'_>, diagnostics: &mut Diagnostics) -> Mask {
    if node.size() >= 2 {
        return Mask::circle(node.value(1, diagnostics), 24);
    }
    let outline = node
        .children()
        .filter(|child| child.key() == "point")
        .map(|child| Point::new(child.value(1, diagnostics), child.value(2, diagnostics)))
        .collect();
    Mask::from_outline(outline)
}
