//! Damage channels carried by weapons.

use std::ops::{Add, AddAssign, Index, IndexMut, Mul};

use serde::{Deserialize, Serialize};

/// One kind of damage a weapon can deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DamageChannel {
    Shield,
    Hull,
    /// Hull damage used instead of `Hull` against an already disabled ship.
    Disabled,
    Minable,
    Fuel,
    Heat,
    Energy,
    Ion,
    Scramble,
    Disruption,
    Slowing,
    Discharge,
    Corrosion,
    Leak,
    Burn,
    RelativeShield,
    RelativeHull,
    RelativeDisabled,
    RelativeMinable,
    RelativeFuel,
    RelativeHeat,
    RelativeEnergy,
    HitForce,
}

impl DamageChannel {
    pub const COUNT: usize = 23;

    pub const ALL: [DamageChannel; Self::COUNT] = [
        DamageChannel::Shield,
        DamageChannel::Hull,
        DamageChannel::Disabled,
        DamageChannel::Minable,
        DamageChannel::Fuel,
        DamageChannel::Heat,
        DamageChannel::Energy,
        DamageChannel::Ion,
        DamageChannel::Scramble,
        DamageChannel::Disruption,
        DamageChannel::Slowing,
        DamageChannel::Discharge,
        DamageChannel::Corrosion,
        DamageChannel::Leak,
        DamageChannel::Burn,
        DamageChannel::RelativeShield,
        DamageChannel::RelativeHull,
        DamageChannel::RelativeDisabled,
        DamageChannel::RelativeMinable,
        DamageChannel::RelativeFuel,
        DamageChannel::RelativeHeat,
        DamageChannel::RelativeEnergy,
        DamageChannel::HitForce,
    ];

    /// Content key naming this channel inside a `weapon` node.
    pub fn key(self) -> &'static str {
        match self {
            DamageChannel::Shield => "shield damage",
            DamageChannel::Hull => "hull damage",
            DamageChannel::Disabled => "disabled damage",
            DamageChannel::Minable => "minable damage",
            DamageChannel::Fuel => "fuel damage",
            DamageChannel::Heat => "heat damage",
            DamageChannel::Energy => "energy damage",
            DamageChannel::Ion => "ion damage",
            DamageChannel::Scramble => "scrambling damage",
            DamageChannel::Disruption => "disruption damage",
            DamageChannel::Slowing => "slowing damage",
            DamageChannel::Discharge => "discharge damage",
            DamageChannel::Corrosion => "corrosion damage",
            DamageChannel::Leak => "leak damage",
            DamageChannel::Burn => "burn damage",
            DamageChannel::RelativeShield => "relative shield damage",
            DamageChannel::RelativeHull => "relative hull damage",
            DamageChannel::RelativeDisabled => "relative disabled damage",
            DamageChannel::RelativeMinable => "relative minable damage",
            DamageChannel::RelativeFuel => "relative fuel damage",
            DamageChannel::RelativeHeat => "relative heat damage",
            DamageChannel::RelativeEnergy => "relative energy damage",
            DamageChannel::HitForce => "hit force",
        }
    }

    pub fn from_key(key: &str) -> Option<DamageChannel> {
        Self::ALL.into_iter().find(|channel| channel.key() == key)
    }
}

/// Per-channel damage amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageVector([f64; DamageChannel::COUNT]);

impl Default for DamageVector {
    fn default() -> Self {
        Self([0.0; DamageChannel::COUNT])
    }
}

impl DamageVector {
    pub fn get(&self, channel: DamageChannel) -> f64 {
        self.0[channel as usize]
    }

    pub fn set(&mut self, channel: DamageChannel, value: f64) {
        self.0[channel as usize] = value;
    }

    /// Whether any channel other than hit force is non-zero.
    pub fn does_damage(&self) -> bool {
        DamageChannel::ALL
            .iter()
            .any(|&c| c != DamageChannel::HitForce && self.get(c) > 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DamageChannel, f64)> + '_ {
        DamageChannel::ALL.iter().map(|&c| (c, self.get(c)))
    }
}

impl Index<DamageChannel> for DamageVector {
    type Output = f64;
    fn index(&self, channel: DamageChannel) -> &f64 {
        &self.0[channel as usize]
    }
}

impl IndexMut<DamageChannel> for DamageVector {
    fn index_mut(&mut self, channel: DamageChannel) -> &mut f64 {
        &mut self.0[channel as usize]
    }
}

impl Add for DamageVector {
    type Output = DamageVector;
    fn add(mut self, rhs: DamageVector) -> DamageVector {
        self += rhs;
        self
    }
}

impl AddAssign for DamageVector {
    fn add_assign(&mut self, rhs: DamageVector) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl Mul<f64> for DamageVector {
    type Output = DamageVector;
    fn mul(mut self, rhs: f64) -> DamageVector {
        for a in self.0.iter_mut() {
            *a *= rhs;
        }
        self
    }
}
