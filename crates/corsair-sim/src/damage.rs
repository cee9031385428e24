//! What a single hit did, and the per-tick tally of all hits.

use serde::{Deserialize, Serialize};

use corsair_core::damage::DamageChannel;
use corsair_core::weapon::Weapon;

/// The outcome of one weapon hitting one ship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageDealt {
    pub shield: f64,
    pub hull: f64,
    pub energy: f64,
    pub fuel: f64,
    pub heat: f64,
    pub ion: f64,
    pub scramble: f64,
    pub disruption: f64,
    pub slowing: f64,
    pub discharge: f64,
    pub corrosion: f64,
    pub leak: f64,
    pub burn: f64,
    pub hit_force: f64,
    /// The hit pushed the ship below its disable threshold.
    pub disabled: bool,
    /// The hit brought the hull to zero.
    pub destroyed: bool,
}

impl DamageDealt {
    /// Shield plus hull damage.
    pub fn total(&self) -> f64 {
        self.shield + self.hull
    }
}

/// Damage delivered by collisions versus damage the ships actually lost,
/// over one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageLedger {
    pub hits: u32,
    pub delivered: f64,
    pub applied: f64,
}

impl DamageLedger {
    /// Record a hit along with the ship's shields plus hull before and after.
    pub fn record(&mut self, dealt: &DamageDealt, before: f64, after: f64) {
        self.hits += 1;
        self.delivered += dealt.total();
        self.applied += before - after;
    }

    pub fn is_balanced(&self) -> bool {
        (self.delivered - self.applied).abs() <= 1e-6 * self.delivered.abs().max(1.0)
    }
}

/// Blast falloff for `damage scaled` weapons, with `distance` measured to
/// the target's edge.
pub fn blast_scale(weapon: &Weapon, distance: f64) -> f64 {
    if !weapon.damage_scaled || weapon.blast_radius <= 0.0 {
        return 1.0;
    }
    let r2 = distance * distance / (weapon.blast_radius * weapon.blast_radius);
    1.0 / (1.0 + r2 * r2).powi(2)
}

/// Damage against asteroids and other minables.
pub fn minable_damage(weapon: &Weapon, scale: f64, max_hull: f64) -> f64 {
    (weapon.damage[DamageChannel::Minable]
        + weapon.damage[DamageChannel::RelativeMinable] * max_hull)
        * scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blast_scale_falls_off() {
        let mut weapon = Weapon::default();
        weapon.blast_radius = 100.0;
        weapon.damage_scaled = true;
        weapon.sanitize(false);
        assert_eq!(blast_scale(&weapon, 0.0), 1.0);
        assert!((blast_scale(&weapon, 100.0) - 0.25).abs() < 1e-12);
        assert!(blast_scale(&weapon, 200.0) < 0.01);

        let mut flat = Weapon::default();
        flat.blast_radius = 100.0;
        flat.sanitize(false);
        assert_eq!(blast_scale(&flat, 90.0), 1.0);
    }

    #[test]
    fn test_ledger_balance() {
        let mut ledger = DamageLedger::default();
        let dealt = DamageDealt {
            shield: 3.0,
            hull: 2.0,
            ..Default::default()
        };
        ledger.record(&dealt, 100.0, 95.0);
        assert!(ledger.is_balanced());
        ledger.record(&dealt, 100.0, 99.0);
        assert!(!ledger.is_balanced());
    }
}
