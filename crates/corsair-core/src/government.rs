//! Governments and their mutual attitudes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::datanode::DataNode;
use crate::error::Diagnostics;
use crate::types::GovernmentId;

/// Static definition of a government.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Government {
    pub name: String,
    pub color: [f32; 3],
    pub allies: BTreeSet<GovernmentId>,
    pub enemies: BTreeSet<GovernmentId>,
    /// The player's own government is never provoked automatically.
    pub is_player: bool,
}

impl Government {
    /// Parse a `government` node. Attitudes below zero make enemies,
    /// above zero allies.
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut gov = Government {
            name: node.token(1).to_string(),
            color: [1.0, 1.0, 1.0],
            ..Default::default()
        };
        for child in node.children() {
            match child.key() {
                "color" if child.size() >= 4 => {
                    for (i, channel) in gov.color.iter_mut().enumerate() {
                        *channel = child.value(i + 1, diagnostics) as f32;
                    }
                }
                "attitude toward" => {
                    for grand in child.children() {
                        if grand.size() < 2 {
                            grand.report_unknown(diagnostics);
                            continue;
                        }
                        let other = catalog.governments.id(grand.key());
                        let attitude = grand.value(1, diagnostics);
                        if attitude < 0.0 {
                            gov.enemies.insert(other);
                        } else if attitude > 0.0 {
                            gov.allies.insert(other);
                        }
                    }
                }
                "player" => gov.is_player = true,
                "swizzle" | "player reputation" | "penalty for" | "bribe" | "fine"
                | "language" | "raid" | "friendly hail" | "hostile hail"
                | "friendly disabled hail" | "hostile disabled hail" | "death sentence" => {}
                _ => child.report_unknown(diagnostics),
            }
        }
        gov
    }
}

/// Runtime attitudes: static enmity plus provocations accumulated in the
/// current system.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Politics {
    governments: Vec<Government>,
    /// `(victim, offender)` pairs.
    provoked: BTreeSet<(GovernmentId, GovernmentId)>,
}

impl Politics {
    pub fn new(governments: Vec<Government>) -> Self {
        Self {
            governments,
            provoked: BTreeSet::new(),
        }
    }

    pub fn get(&self, id: GovernmentId) -> Option<&Government> {
        self.governments.get(id.index())
    }

    /// Whether `a` treats `b` as hostile. Not symmetric.
    pub fn is_enemy(&self, a: GovernmentId, b: GovernmentId) -> bool {
        if a == b {
            return false;
        }
        let Some(gov) = self.get(a) else {
            return false;
        };
        if gov.allies.contains(&b) {
            return self.provoked.contains(&(a, b));
        }
        gov.enemies.contains(&b) || self.provoked.contains(&(a, b))
    }

    /// Whether either side is hostile to the other.
    pub fn is_hostile_pair(&self, a: GovernmentId, b: GovernmentId) -> bool {
        self.is_enemy(a, b) || self.is_enemy(b, a)
    }

    /// Record that `offender` attacked `victim`. Returns true if this is a
    /// new provocation.
    pub fn provoke(&mut self, victim: GovernmentId, offender: GovernmentId) -> bool {
        if victim == offender || self.is_enemy(victim, offender) {
            return false;
        }
        if self.get(victim).is_some_and(|gov| gov.is_player) {
            return false;
        }
        log::debug!("government {victim:?} provoked by {offender:?}");
        self.provoked.insert((victim, offender))
    }

    /// Forget all provocations (on entering a new system).
    pub fn reset_provocations(&mut self) {
        self.provoked.clear();
    }

    pub fn is_provoked(&self, victim: GovernmentId, offender: GovernmentId) -> bool {
        self.provoked.contains(&(victim, offender))
    }
}
