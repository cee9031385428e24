//! Outfits: attribute bags that ships sum at install time, optionally
//! carrying a weapon.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::datanode::DataNode;
use crate::error::Diagnostics;
use crate::weapon::Weapon;

/// Named numeric attributes. Missing attributes read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes(BTreeMap<String, f64>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> f64 {
        self.0.get(name).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, name: &str, value: f64) {
        if value == 0.0 {
            self.0.remove(name);
        } else {
            self.0.insert(name.to_string(), value);
        }
    }

    /// Add `count` copies of another bag (negative to remove).
    pub fn add(&mut self, other: &Attributes, count: i32) {
        for (name, value) in &other.0 {
            let sum = self.get(name) + value * count as f64;
            // Snap tiny float residue from add-then-remove back to zero.
            self.set(name, if sum.abs() < 1e-9 { 0.0 } else { sum });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, &value)| (name.as_str(), value))
    }

    /// Builder helper for tests and programmatic content.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outfit {
    pub name: String,
    pub category: String,
    pub cost: i64,
    pub attributes: Attributes,
    pub weapon: Option<Weapon>,
}

impl Outfit {
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut outfit = Outfit {
            name: node.token(1).to_string(),
            ..Default::default()
        };
        for child in node.children() {
            match child.key() {
                "category" => outfit.category = child.token(1).to_string(),
                "cost" => outfit.cost = child.value(1, diagnostics) as i64,
                "weapon" => outfit.weapon = Some(Weapon::load(child, catalog, diagnostics)),
                "description" | "thumbnail" | "plural" | "flare sprite" | "flare sound" => {}
                key if child.size() >= 2 => {
                    let value = child.value(1, diagnostics);
                    outfit.attributes.set(key, value);
                }
                key => outfit.attributes.set(key, 1.0),
            }
        }
        outfit
    }

    pub fn get(&self, attribute: &str) -> f64 {
        self.attributes.get(attribute)
    }

    pub fn mass(&self) -> f64 {
        self.attributes.get("mass")
    }

    pub fn is_weapon(&self) -> bool {
        self.weapon.is_some()
    }

    /// Whether this weapon must be installed in a turret mount.
    pub fn is_turret(&self) -> bool {
        self.attributes.get("turret mounts") != 0.0
    }
}
