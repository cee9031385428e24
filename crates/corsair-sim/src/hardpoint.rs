//! Weapon mounts: reload counters, arc of fire and the fire decision.
//!
//! All angles here are in degrees relative to the ship's facing. A fixed
//! gun's arc collapses to its (harmonized) base angle; a turret sweeps
//! between `min_arc` and `max_arc`, or all the way round when it is
//! omnidirectional.

use rand::Rng;

use corsair_core::body::Body;
use corsair_core::geometry::{Angle, Point};
use corsair_core::random;
use corsair_core::ship_model::HardpointSpec;
use corsair_core::types::OutfitId;
use corsair_core::weapon::Weapon;

/// Harmonized guns converge at this fraction of their range.
const HARMONIZE_RANGE: f64 = 0.9;

/// Where and in which direction a shot leaves the ship.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub start: Point,
    pub aim: Angle,
}

#[derive(Debug, Clone, Default)]
pub struct Hardpoint {
    pub outfit: Option<OutfitId>,
    /// Mount position in the ship frame, at half the sprite scale.
    pub point: Point,
    pub base_angle: f64,
    pub angle: f64,
    min_arc: f64,
    max_arc: f64,
    pub is_turret: bool,
    pub is_omnidirectional: bool,
    pub is_parallel: bool,
    reload: f64,
    burst_reload: f64,
    burst_count: u32,
    is_firing: bool,
    was_firing: bool,
    blindspots: Vec<(f64, f64)>,
    port_arc: Option<(f64, f64)>,
    port_angle: f64,
    port_parallel: bool,
}

impl Hardpoint {
    pub fn new(spec: &HardpointSpec) -> Self {
        let mut hardpoint = Self {
            point: spec.point * 0.5,
            base_angle: spec.base_angle,
            angle: spec.base_angle,
            min_arc: spec.base_angle,
            max_arc: spec.base_angle,
            is_turret: spec.is_turret,
            is_omnidirectional: spec.is_turret && spec.arc.is_none(),
            is_parallel: spec.parallel,
            blindspots: spec.blindspots.clone(),
            port_arc: spec.arc,
            port_angle: spec.base_angle,
            port_parallel: spec.parallel,
            ..Default::default()
        };
        hardpoint.set_arc(None);
        hardpoint
    }

    /// Mount a weapon, resetting the counters and recomputing the arc.
    pub fn install(&mut self, outfit: OutfitId, weapon: &Weapon) {
        self.outfit = Some(outfit);
        self.reload = 0.0;
        self.burst_reload = 0.0;
        self.burst_count = weapon.burst_count;
        self.is_firing = false;
        self.was_firing = false;
        self.base_angle = self.port_angle;
        self.is_omnidirectional = self.is_turret && self.port_arc.is_none() && weapon.arc.is_none();
        self.set_arc(weapon.arc);

        self.is_parallel = self.port_parallel;
        if !self.is_parallel && !weapon.parallel {
            let range = weapon.range();
            let sine = -self.point.x / (HARMONIZE_RANGE * range);
            if range > 0.0 && sine.abs() <= 1.0 {
                let harmonized = self.base_angle + sine.asin().to_degrees();
                let free_gun = !self.is_turret && self.port_arc.is_none();
                if free_gun || self.in_arc(harmonized) {
                    self.base_angle = harmonized;
                    if free_gun {
                        self.min_arc = harmonized;
                        self.max_arc = harmonized;
                    }
                } else if self.is_turret {
                    // Cannot converge inside its arc: fire straight out instead.
                    self.is_parallel = true;
                }
            }
        }
        self.angle = self.base_angle;
        if !self.in_arc(self.angle) {
            self.angle = self.min_arc;
        }
    }

    pub fn uninstall(&mut self) {
        self.outfit = None;
        self.base_angle = self.port_angle;
        self.angle = self.port_angle;
        self.set_arc(None);
    }

    /// Intersect the port's arc with the weapon's, both relative to the
    /// port's base angle.
    fn set_arc(&mut self, weapon_arc: Option<(f64, f64)>) {
        let arc = match (self.port_arc, weapon_arc) {
            (Some((a, b)), Some((c, d))) => {
                let (lo, hi) = (a.max(c), b.min(d));
                if lo <= hi {
                    Some((lo, hi))
                } else {
                    Some((0.0, 0.0))
                }
            }
            (Some(arc), None) | (None, Some(arc)) => Some(arc),
            (None, None) => None,
        };
        match arc {
            Some((lo, hi)) if self.is_turret || self.port_arc.is_some() => {
                self.min_arc = self.port_angle + lo;
                self.max_arc = self.port_angle + hi.min(lo + 360.0);
            }
            _ => {
                self.min_arc = self.port_angle;
                self.max_arc = self.port_angle;
            }
        }
    }

    pub fn arc(&self) -> (f64, f64) {
        (self.min_arc, self.max_arc)
    }

    /// Whether `angle` lies within the arc, wrapping around the circle.
    pub fn in_arc(&self, angle: f64) -> bool {
        if self.is_omnidirectional {
            return true;
        }
        let span = self.max_arc - self.min_arc;
        (angle - self.min_arc).rem_euclid(360.0) <= span + 1e-9
    }

    /// Rotate a turret by `amount` of its turn rate, stopping at the ends
    /// of the arc.
    pub fn aim(&mut self, weapon: &Weapon, amount: f64, multiplier: f64) {
        if !self.is_turret || self.outfit.is_none() {
            return;
        }
        let delta = weapon.turret_turn * (1.0 + multiplier) * amount.clamp(-1.0, 1.0);
        if self.is_omnidirectional {
            self.angle = (self.angle + delta).rem_euclid(360.0);
            return;
        }
        let span = self.max_arc - self.min_arc;
        let mut offset = (self.angle - self.min_arc).rem_euclid(360.0);
        if offset > span {
            // Snap to whichever end is nearer.
            offset = if offset - span < 360.0 - offset { span } else { 0.0 };
        }
        self.angle = self.min_arc + (offset + delta).clamp(0.0, span);
        debug_assert!(self.angle >= self.min_arc && self.angle <= self.max_arc);
    }

    /// Advance the counters by one tick.
    pub fn step(&mut self, weapon: &Weapon) {
        if self.outfit.is_none() {
            return;
        }
        self.was_firing = self.is_firing;
        if self.reload > 0.0 {
            self.reload = (self.reload - 1.0).max(0.0);
        }
        if self.reload <= 0.0 {
            self.burst_count = weapon.burst_count;
        }
        if self.burst_reload > 0.0 {
            self.burst_reload = (self.burst_reload - 1.0).max(0.0);
        }
        if self.burst_reload <= 0.0 {
            self.is_firing = false;
        }
    }

    /// Ready to fire, ignoring blindspots.
    pub fn is_loaded(&self) -> bool {
        self.outfit.is_some() && self.burst_reload <= 0.0 && self.burst_count > 0
    }

    pub fn is_ready(&self, weapon: &Weapon) -> bool {
        self.is_loaded() && (weapon.is_special() || !self.is_blind())
    }

    /// Pointing into one of the ship's blindspots.
    pub fn is_blind(&self) -> bool {
        self.is_blind_at(self.angle)
    }

    fn is_blind_at(&self, angle: f64) -> bool {
        self.blindspots.iter().any(|&(lo, hi)| {
            let span = (hi - lo).rem_euclid(360.0);
            (angle - lo).rem_euclid(360.0) <= span
        })
    }

    pub fn is_firing(&self) -> bool {
        self.is_firing
    }

    pub fn was_firing(&self) -> bool {
        self.was_firing
    }

    pub fn reload(&self) -> f64 {
        self.reload
    }

    pub fn burst_count(&self) -> u32 {
        self.burst_count
    }

    /// Fire along the current angle. Returns `None` when not ready.
    pub fn fire<R: Rng + ?Sized>(&mut self, weapon: &Weapon, ship: &Body, rng: &mut R) -> Option<Shot> {
        if !self.is_ready(weapon) || weapon.is_special() {
            return None;
        }
        let aim = ship.facing + self.angle + weapon.distribution.sample(rng, weapon.inaccuracy);
        let start = self.origin(ship) + aim.rotate(Point::new(0.0, -weapon.hardpoint_offset));
        self.charge(weapon);
        Some(Shot {
            start: start - 0.5 * ship.velocity,
            aim,
        })
    }

    /// Aim an anti-missile or tractor beam at `target`. Returns the shot
    /// when the target is within instant range, the arc and clear of
    /// blindspots; the counters are charged as for a normal shot.
    pub fn fire_special(&mut self, weapon: &Weapon, ship: &Body, target: Point) -> Option<Shot> {
        if !self.is_loaded() || !weapon.is_special() {
            return None;
        }
        let start = self.origin(ship);
        let offset = target - start;
        if offset.length() > weapon.velocity {
            return None;
        }
        let aim = Angle::from_vector(offset);
        let relative = (aim - ship.facing).degrees();
        if !self.in_arc(relative) || self.is_blind_at(relative) {
            return None;
        }
        self.charge(weapon);
        Some(Shot { start, aim })
    }

    /// Shoot-down roll of an anti-missile against a missile.
    pub fn anti_missile_roll<R: Rng + ?Sized>(weapon: &Weapon, missile_strength: u32, rng: &mut R) -> bool {
        random::int(rng, weapon.anti_missile) > random::int(rng, missile_strength)
    }

    /// A scrambled weapon misfires: the counters run as if it had fired.
    pub fn jam(&mut self, weapon: &Weapon) {
        if self.is_loaded() {
            self.charge(weapon);
        }
    }

    fn origin(&self, ship: &Body) -> Point {
        ship.position + ship.facing.rotate(self.point)
    }

    fn charge(&mut self, weapon: &Weapon) {
        // The full reload is paid once per burst, at its first shot.
        if self.burst_count == weapon.burst_count {
            self.reload += weapon.reload;
        }
        self.burst_reload += weapon.burst_reload;
        self.burst_count = self.burst_count.saturating_sub(1);
        self.is_firing = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn weapon(reload: f64, burst_reload: f64, burst_count: u32) -> Weapon {
        let mut weapon = Weapon::default();
        weapon.velocity = 10.0;
        weapon.lifetime = 60;
        weapon.reload = reload;
        weapon.burst_reload = burst_reload;
        weapon.burst_count = burst_count;
        weapon.turret_turn = 4.0;
        weapon.sanitize(true);
        weapon
    }

    fn turret(arc: Option<(f64, f64)>) -> Hardpoint {
        Hardpoint::new(&HardpointSpec {
            point: Point::new(0.0, -10.0),
            is_turret: true,
            arc,
            ..Default::default()
        })
    }

    #[test]
    fn test_burst_then_pause() {
        let weapon = weapon(10.0, 1.0, 3);
        let mut gun = Hardpoint::new(&HardpointSpec::default());
        gun.install(OutfitId(0), &weapon);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let ship = Body::default();

        let mut shots = Vec::new();
        for tick in 1..=25 {
            gun.step(&weapon);
            if gun.fire(&weapon, &ship, &mut rng).is_some() {
                shots.push(tick);
            }
        }
        assert_eq!(shots, vec![1, 2, 3, 11, 12, 13, 21, 22, 23]);
    }

    #[test]
    fn test_single_shot_reload() {
        let weapon = weapon(5.0, 1.0, 1);
        let mut gun = Hardpoint::new(&HardpointSpec::default());
        gun.install(OutfitId(0), &weapon);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut shots = Vec::new();
        for tick in 1..=12 {
            gun.step(&weapon);
            if gun.fire(&weapon, &Body::default(), &mut rng).is_some() {
                shots.push(tick);
            }
        }
        assert_eq!(shots, vec![1, 6, 11]);
        assert!(gun.reload() >= 0.0);
    }

    #[test]
    fn test_harmonization_tilts_inward() {
        let mut weapon = weapon(1.0, 1.0, 1);
        weapon.set_totals(*weapon.total_damage_vector(), 100.0);
        let mut right = Hardpoint::new(&HardpointSpec {
            point: Point::new(40.0, 0.0),
            ..Default::default()
        });
        right.install(OutfitId(0), &weapon);
        // Half-scale x of 20 against 90% of a 1000 px range.
        let expected = (-20.0f64 / 900.0).asin().to_degrees();
        assert!((right.angle - expected).abs() < 1e-9);

        let mut parallel = Hardpoint::new(&HardpointSpec {
            point: Point::new(40.0, 0.0),
            parallel: true,
            ..Default::default()
        });
        parallel.install(OutfitId(0), &weapon);
        assert_eq!(parallel.angle, 0.0);
    }

    #[test]
    fn test_turrets_harmonize_unless_out_of_arc() {
        let mut weapon = weapon(1.0, 1.0, 1);
        weapon.set_totals(*weapon.total_damage_vector(), 100.0);
        let expected = (-20.0f64 / 900.0).asin().to_degrees();

        let mut wide = Hardpoint::new(&HardpointSpec {
            point: Point::new(40.0, 0.0),
            is_turret: true,
            arc: Some((-45.0, 45.0)),
            ..Default::default()
        });
        wide.install(OutfitId(0), &weapon);
        assert!((wide.base_angle - expected).abs() < 1e-9);
        assert!(!wide.is_parallel);
        // The turret keeps its full sweep.
        assert_eq!(wide.arc(), (-45.0, 45.0));

        let mut omni = Hardpoint::new(&HardpointSpec {
            point: Point::new(40.0, 0.0),
            is_turret: true,
            ..Default::default()
        });
        omni.install(OutfitId(0), &weapon);
        assert!((omni.base_angle - expected).abs() < 1e-9);

        // Harmonizing would tilt left, but the arc only allows right.
        let mut narrow = Hardpoint::new(&HardpointSpec {
            point: Point::new(40.0, 0.0),
            is_turret: true,
            arc: Some((0.0, 30.0)),
            ..Default::default()
        });
        narrow.install(OutfitId(0), &weapon);
        assert!(narrow.is_parallel);
        assert_eq!(narrow.base_angle, 0.0);

        // Reinstalling a weapon that fits re-evaluates the mount.
        let mut short = weapon.clone();
        short.range_override = Some(0.0);
        narrow.install(OutfitId(0), &short);
        assert!(!narrow.is_parallel);
    }

    #[test]
    fn test_turret_arc_intersects_weapon_arc() {
        let mut weapon = weapon(1.0, 1.0, 1);
        weapon.arc = Some((-20.0, 90.0));
        let mut mount = turret(Some((-45.0, 45.0)));
        mount.install(OutfitId(0), &weapon);
        assert_eq!(mount.arc(), (-20.0, 45.0));
        assert!(!mount.is_omnidirectional);
        for _ in 0..50 {
            mount.aim(&weapon, 1.0, 0.0);
        }
        assert_eq!(mount.angle, 45.0);
        for _ in 0..50 {
            mount.aim(&weapon, -1.0, 0.0);
        }
        assert_eq!(mount.angle, -20.0);
    }

    #[test]
    fn test_special_fire_needs_range_and_arc() {
        let mut weapon = weapon(1.0, 1.0, 1);
        weapon.anti_missile = 10;
        weapon.velocity = 100.0;
        let mut mount = turret(Some((-45.0, 45.0)));
        mount.install(OutfitId(0), &weapon);
        let ship = Body::default();
        // Behind the ship: out of arc.
        assert!(mount.fire_special(&weapon, &ship, Point::new(0.0, 50.0)).is_none());
        // Ahead but out of range.
        assert!(mount.fire_special(&weapon, &ship, Point::new(0.0, -300.0)).is_none());
        assert!(mount.fire_special(&weapon, &ship, Point::new(10.0, -60.0)).is_some());
        // Regular fire never triggers a special weapon.
        mount.step(&weapon);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(mount.fire(&weapon, &ship, &mut rng).is_none());
    }

    #[test]
    fn test_blindspot_blocks_normal_fire() {
        let weapon = weapon(1.0, 1.0, 1);
        let mut gun = Hardpoint::new(&HardpointSpec {
            blindspots: vec![(350.0, 10.0)],
            parallel: true,
            ..Default::default()
        });
        gun.install(OutfitId(0), &weapon);
        assert!(gun.is_blind());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(gun.fire(&weapon, &Body::default(), &mut rng).is_none());
    }

    proptest! {
        #[test]
        fn prop_aim_stays_in_arc(
            lo in -180.0f64..0.0,
            width in 0.0f64..300.0,
            turns in prop::collection::vec(-1.5f64..1.5, 1..80),
            turn_rate in 0.5f64..30.0,
        ) {
            let mut weapon = weapon(1.0, 1.0, 1);
            weapon.turret_turn = turn_rate;
            let mut mount = turret(Some((lo, lo + width)));
            mount.install(OutfitId(0), &weapon);
            let (min, max) = mount.arc();
            for amount in turns {
                mount.aim(&weapon, amount, 0.5);
                prop_assert!(mount.angle >= min - 1e-9 && mount.angle <= max + 1e-9);
            }
        }
    }
}
