//! Fleet definitions and AI personalities.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::datanode::DataNode;
use crate::error::Diagnostics;
use crate::types::{GovernmentId, ShipModelId};

/// Behavior traits that bias AI decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Never attacks.
    pub pacifist: bool,
    /// Only fights back when attacked.
    pub forbearing: bool,
    /// Avoids targets that are not already weakened.
    pub timid: bool,
    /// Stops shooting once the target is disabled.
    pub disables: bool,
    /// Boards disabled ships to take their cargo.
    pub plunders: bool,
    /// Picks the strongest targets.
    pub heroic: bool,
    /// Never leaves the system it is in.
    pub staying: bool,
    /// Arrives from hyperspace rather than taking off.
    pub entering: bool,
    /// Spawns disabled and does nothing.
    pub derelict: bool,
    /// Runs from combat toward an exit.
    pub fleeing: bool,
    /// Flees when its hull drops low.
    pub coward: bool,
    /// Keeps attacking after provocation ends.
    pub vindictive: bool,
    /// Attacks asteroids.
    pub mining: bool,
    /// Collects flotsam.
    pub harvests: bool,
    /// Ignores distance limits when chasing.
    pub unconstrained: bool,
    /// Does not pick targets at all.
    pub uninterested: bool,
    /// Extra aim error in pixels.
    pub confusion: f64,
}

impl Personality {
    pub fn load(node: DataNode<'_>, diagnostics: &mut Diagnostics) -> Self {
        let mut personality = Personality::default();
        for token in &node.tokens()[1..] {
            personality.set_flag(token, node, diagnostics);
        }
        for child in node.children() {
            if child.key() == "confusion" {
                personality.confusion = child.value(1, diagnostics);
            } else {
                for token in child.tokens() {
                    personality.set_flag(token, child, diagnostics);
                }
            }
        }
        personality
    }

    fn set_flag(&mut self, token: &str, node: DataNode<'_>, diagnostics: &mut Diagnostics) {
        let flag = match token {
            "pacifist" => &mut self.pacifist,
            "forbearing" => &mut self.forbearing,
            "timid" => &mut self.timid,
            "disables" => &mut self.disables,
            "plunders" => &mut self.plunders,
            "heroic" => &mut self.heroic,
            "staying" => &mut self.staying,
            "entering" => &mut self.entering,
            "derelict" => &mut self.derelict,
            "fleeing" => &mut self.fleeing,
            "coward" => &mut self.coward,
            "vindictive" => &mut self.vindictive,
            "mining" => &mut self.mining,
            "harvests" => &mut self.harvests,
            "unconstrained" => &mut self.unconstrained,
            "uninterested" => &mut self.uninterested,
            _ => {
                diagnostics.report(node.issue(crate::error::ContentError::UnknownToken {
                    token: token.to_string(),
                }));
                return;
            }
        };
        *flag = true;
    }
}

/// One weighted composition of a fleet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetVariant {
    pub weight: u32,
    pub ships: Vec<(ShipModelId, u32)>,
}

impl FleetVariant {
    /// Ship models in spawn order, expanded by count.
    pub fn expanded(&self) -> Vec<ShipModelId> {
        self.ships
            .iter()
            .flat_map(|&(model, count)| std::iter::repeat(model).take(count as usize))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    pub name: String,
    pub government: Option<GovernmentId>,
    pub personality: Personality,
    pub variants: Vec<FleetVariant>,
    /// Number of commodity types loaded as cargo.
    pub cargo: u32,
}

impl Fleet {
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut fleet = Fleet {
            name: node.token(1).to_string(),
            cargo: 3,
            ..Default::default()
        };
        for child in node.children() {
            match child.key() {
                "government" => fleet.government = Some(catalog.governments.id(child.token(1))),
                "personality" => fleet.personality = Personality::load(child, diagnostics),
                "cargo" => fleet.cargo = child.value(1, diagnostics).max(0.0) as u32,
                "variant" => {
                    let weight = if child.size() >= 2 {
                        child.value(1, diagnostics).max(0.0) as u32
                    } else {
                        1
                    };
                    let ships = child
                        .children()
                        .map(|grand| {
                            let count = if grand.size() >= 2 {
                                grand.value(1, diagnostics).max(0.0) as u32
                            } else {
                                1
                            };
                            (catalog.ships.id(grand.key()), count)
                        })
                        .collect();
                    fleet.variants.push(FleetVariant { weight, ships });
                }
                "names" | "fighters" | "commodities" | "outfitters" => {}
                _ => child.report_unknown(diagnostics),
            }
        }
        fleet
    }

    pub fn total_weight(&self) -> u32 {
        self.variants.iter().map(|v| v.weight).sum()
    }
}
