//! Visual effect definitions.

use serde::{Deserialize, Serialize};

use crate::datanode::DataNode;
use crate::error::Diagnostics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub name: String,
    pub sprite: Option<String>,
    pub sound: Option<String>,
    pub lifetime: i32,
    pub random_lifetime: i32,
    /// Fraction of the source velocity the effect inherits.
    pub velocity_scale: f64,
    pub random_velocity: f64,
    pub random_angle: f64,
    pub random_spin: f64,
}

impl Default for Effect {
    fn default() -> Self {
        Self {
            name: String::new(),
            sprite: None,
            sound: None,
            lifetime: 0,
            random_lifetime: 0,
            velocity_scale: 1.0,
            random_velocity: 0.0,
            random_angle: 0.0,
            random_spin: 0.0,
        }
    }
}

impl Effect {
    pub fn load(node: DataNode<'_>, diagnostics: &mut Diagnostics) -> Self {
        let mut effect = Effect {
            name: node.token(1).to_string(),
            ..Default::default()
        };
        for child in node.children() {
            match child.key() {
                "sprite" => effect.sprite = Some(child.token(1).to_string()),
                "sound" => effect.sound = Some(child.token(1).to_string()),
                "lifetime" => effect.lifetime = child.value(1, diagnostics) as i32,
                "random lifetime" => effect.random_lifetime = child.value(1, diagnostics) as i32,
                "velocity scale" => effect.velocity_scale = child.value(1, diagnostics),
                "random velocity" => effect.random_velocity = child.value(1, diagnostics),
                "random angle" => effect.random_angle = child.value(1, diagnostics),
                "random spin" => effect.random_spin = child.value(1, diagnostics),
                _ => child.report_unknown(diagnostics),
            }
        }
        effect
    }
}
