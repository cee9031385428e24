//! Projectiles in flight.
//!
//! A projectile owns only its mutable flight state. Everything constant
//! lives in its [`Weapon`], which callers look up from the catalog and
//! pass in, along with a [`TargetState`] snapshot of the ship it chases.

use hecs::Entity;
use rand::Rng;

use corsair_core::body::Body;
use corsair_core::constants::{LOCK_INTERVAL, UNNATURAL_DEATH};
use corsair_core::events::Cue;
use corsair_core::geometry::{cross, unit, Angle, Point};
use corsair_core::random;
use corsair_core::types::{GovernmentId, OutfitId, SystemId};
use corsair_core::weapon::{Submunition, Weapon};

use crate::cues;

/// What a projectile needs to know about the ship it is chasing.
#[derive(Debug, Clone, Copy)]
pub struct TargetState {
    pub entity: Entity,
    pub position: Point,
    pub velocity: Point,
    pub government: Option<GovernmentId>,
    pub system: Option<SystemId>,
    pub is_targetable: bool,
    pub is_disabled: bool,
    /// Heat as a fraction of the overheating point.
    pub heat: f64,
    pub mass: f64,
    pub optical_jamming: f64,
    pub radar_jamming: f64,
}

/// How a projectile's flight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Death {
    /// Lifetime ran out (or the split range was reached).
    Natural,
    /// Shot down by an anti-missile.
    AntiMissile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flight {
    Alive,
    Dead(Death),
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub body: Body,
    pub weapon: OutfitId,
    pub system: Option<SystemId>,
    /// Ship that fired this, if any.
    pub shooter: Option<Entity>,
    pub target: Option<Entity>,
    pub target_government: Option<GovernmentId>,
    /// Whether the target was already disabled when this was fired.
    pub target_disabled: bool,
    pub lifetime: i32,
    /// Ticks since launch.
    pub age: i32,
    pub distance_traveled: f64,
    /// Velocity contributed by the weapon itself.
    pub dv: Point,
    pub hits_remaining: u16,
    pub has_lock: bool,
    pub is_confused: bool,
    /// Turn direction while confused: +1 clockwise, -1 counter-clockwise.
    pub confusion_direction: f64,
    /// Ship the projectile is currently passing through after a hit.
    pub phased: Option<Entity>,
    pub shot_down: bool,
}

impl Projectile {
    /// A shot leaving a ship's hardpoint at `start` along `aim`.
    #[allow(clippy::too_many_arguments)]
    pub fn fire<R: Rng + ?Sized>(
        shooter: Entity,
        ship: &Body,
        system: Option<SystemId>,
        start: Point,
        aim: Angle,
        weapon_id: OutfitId,
        weapon: &Weapon,
        target: Option<&TargetState>,
        rng: &mut R,
    ) -> Self {
        let dv = aim.unit() * (weapon.velocity + random::real(rng) * weapon.random_velocity);
        let mut body = Body::new(start, ship.velocity + dv, aim);
        body.government = ship.government;
        body.sprite = weapon.sprite.clone();
        let mut projectile = Self::launch(body, weapon_id, weapon, system, Some(shooter), dv, rng);
        if let Some(target) = target {
            projectile.target = Some(target.entity);
            projectile.target_government = target.government;
            projectile.target_disabled = target.is_disabled;
            projectile.has_lock = weapon.homing;
        }
        projectile
    }

    /// A child spawned from `parent` when it dies.
    pub fn submunition<R: Rng + ?Sized>(
        parent: &Projectile,
        parent_weapon: &Weapon,
        sub: &Submunition,
        weapon: &Weapon,
        rng: &mut R,
    ) -> Self {
        let facing = parent.body.facing
            + sub.facing
            + weapon.distribution.sample(rng, weapon.inaccuracy);
        let mut velocity = parent.body.velocity;
        if parent_weapon.acceleration == 0.0 {
            // Redirect the inherited weapon speed along the new facing.
            velocity += (facing.unit() - parent.body.facing.unit()) * parent_weapon.velocity;
        }
        let dv = facing.unit() * (weapon.velocity + random::real(rng) * weapon.random_velocity);
        let position = parent.body.position + parent.body.facing.rotate(sub.offset);
        let mut body = Body::new(position, velocity + dv, facing);
        body.government = parent.body.government;
        body.sprite = weapon.sprite.clone();
        let mut child =
            Self::launch(body, sub.weapon, weapon, parent.system, parent.shooter, dv, rng);
        child.target = parent.target;
        child.target_government = parent.target_government;
        child.target_disabled = parent.target_disabled;
        child.has_lock = weapon.homing && parent.target.is_some();
        child
    }

    fn launch<R: Rng + ?Sized>(
        body: Body,
        weapon_id: OutfitId,
        weapon: &Weapon,
        system: Option<SystemId>,
        shooter: Option<Entity>,
        dv: Point,
        rng: &mut R,
    ) -> Self {
        let extra = random::int(rng, weapon.random_lifetime.max(0) as u32 + 1) as i32;
        let confusion_direction = if weapon.homing && rng.gen_bool(0.5) {
            -1.0
        } else {
            1.0
        };
        Self {
            body,
            weapon: weapon_id,
            system,
            shooter,
            target: None,
            target_government: None,
            target_disabled: false,
            lifetime: weapon.lifetime + extra,
            age: 0,
            distance_traveled: 0.0,
            dv,
            hits_remaining: weapon.penetration_count.max(1),
            has_lock: false,
            is_confused: false,
            confusion_direction,
            phased: None,
            shot_down: false,
        }
    }

    /// Advance one tick. `target` is the current state of [`Self::target`],
    /// or `None` if that ship no longer exists.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        weapon: &Weapon,
        target: Option<&TargetState>,
        rng: &mut R,
        out: &mut Vec<Cue>,
    ) -> Flight {
        self.lifetime -= 1;
        if self.lifetime <= 0 {
            if self.lifetime > UNNATURAL_DEATH {
                cues::place(out, &weapon.die_effects, &self.body);
            }
            return Flight::Dead(if self.shot_down {
                Death::AntiMissile
            } else {
                Death::Natural
            });
        }
        for live in &weapon.live_effects {
            if random::real(rng) < live.chance {
                cues::place(out, &[(live.effect, 1)], &self.body);
            }
        }

        let target = self.validate_target(target);
        let mut turn = weapon.turn;
        let mut acceleration = weapon.acceleration;
        if weapon.homing {
            match target {
                Some(target) => {
                    if self.age > 0 && self.age % LOCK_INTERVAL == 0 {
                        self.check_lock(weapon, target, rng);
                    }
                    if weapon.turn > 0.0 {
                        let period = (180.0 / weapon.turn).ceil() as i32;
                        if period > 0 && self.age > 0 && self.age % period == 0 {
                            self.confusion_direction = if rng.gen_bool(0.5) { -1.0 } else { 1.0 };
                        }
                    }
                    if self.has_lock {
                        let (steer, throttle) = self.steer(weapon, target);
                        turn = steer;
                        if !throttle {
                            acceleration = 0.0;
                        }
                    } else if self.is_confused {
                        turn = weapon.turn * self.confusion_direction;
                    } else {
                        turn = 0.0;
                    }
                }
                None => turn = 0.0,
            }
        }

        if turn != 0.0 {
            self.body.facing += turn;
        }
        if acceleration != 0.0 {
            let push = self.body.facing.unit() * acceleration;
            self.body.velocity = self.body.velocity * (1.0 - weapon.drag) + push;
            self.dv = self.dv * (1.0 - weapon.drag) + push;
        }
        self.body.position += self.body.velocity;
        self.distance_traveled += self.dv.length();

        if let Some(target) = target {
            if weapon.split_range > 0.0
                && self.body.position.distance(target.position) < weapon.split_range
            {
                self.lifetime = 0;
            }
        }
        if weapon.fade_out > 0 && self.lifetime < weapon.fade_out {
            self.body.alpha = f64::from(self.lifetime.max(0)) / f64::from(weapon.fade_out);
        }
        self.age += 1;
        Flight::Alive
    }

    /// Drop a target that left, changed hands or was disabled mid-flight.
    fn validate_target<'a>(&mut self, target: Option<&'a TargetState>) -> Option<&'a TargetState> {
        self.target?;
        let valid = target.filter(|t| {
            Some(t.entity) == self.target
                && t.is_targetable
                && t.system == self.system
                && t.government == self.target_government
                && (self.target_disabled || !t.is_disabled)
        });
        if valid.is_none() {
            self.target = None;
            self.has_lock = false;
        }
        valid
    }

    /// Turn toward the target. Returns the turn and whether to keep
    /// accelerating.
    fn steer(&mut self, weapon: &Weapon, target: &TargetState) -> (f64, bool) {
        let facing = self.body.facing.unit();
        let mut d = target.position - self.body.position;
        let mut u = unit(d);
        let speed = if weapon.drag > 0.0 {
            weapon.acceleration / weapon.drag
        } else {
            self.body.velocity.length()
        };
        let mut steps = if speed > 0.0 {
            d.length() / speed
        } else {
            f64::INFINITY
        };

        if weapon.leading && speed > 0.0 {
            let normal = Point::new(u.y, -u.x);
            let sideways = normal.dot(target.velocity);
            if u.dot(target.velocity) < 0.0 && sideways.abs() <= speed {
                // Closing target: match its sideways speed.
                let along = (speed * speed - sideways * sideways).max(0.0).sqrt();
                d = along * u + sideways * normal;
            } else {
                d += steps * target.velocity;
                steps = d.length() / speed;
            }
            u = unit(d);
        }

        if weapon.blindspot && d.dot(facing) < 0.0 {
            self.has_lock = false;
            return (0.0, true);
        }
        let desired = cross(facing, u).clamp(-1.0, 1.0).asin().to_degrees();
        let turn = desired.clamp(-weapon.turn, weapon.turn);
        let mut throttle = true;
        if weapon.throttle_control && weapon.turn > 0.0 {
            let to_face = facing.dot(u).clamp(-1.0, 1.0).acos().to_degrees() / weapon.turn;
            if to_face * 1.5 > steps {
                throttle = false;
            }
        }
        (turn, throttle)
    }

    /// Re-roll the lock against each tracking method. Losing the lock may
    /// leave the projectile confused.
    pub fn check_lock<R: Rng + ?Sized>(&mut self, weapon: &Weapon, target: &TargetState, rng: &mut R) {
        let chances = lock_chances(weapon, target, self.body.position.distance(target.position));
        let base = if self.has_lock { 1.0 } else { 0.5 };
        let mut locked = false;
        for &p in &chances {
            locked |= lock_roll(p, base, rng);
        }
        self.has_lock = locked;
        self.is_confused =
            !locked && !chances.is_empty() && chances.iter().all(|&p| !lock_roll(p, base, rng));
    }

    /// Register a hit at fraction `t` of this tick's motion. Returns true
    /// once the projectile has no penetration left.
    pub fn explode(&mut self, weapon: &Weapon, t: f64, out: &mut Vec<Cue>) -> bool {
        let mut at = self.body.clone();
        at.position = self.body.position - self.body.velocity * (1.0 - t);
        cues::place(out, &weapon.hit_effects, &at);
        self.hits_remaining = self.hits_remaining.saturating_sub(1);
        if self.hits_remaining == 0 {
            self.lifetime = UNNATURAL_DEATH;
            true
        } else {
            false
        }
    }

    /// Mark as destroyed by an anti-missile; dies on its next step.
    pub fn kill(&mut self) {
        self.lifetime = 0;
        self.shot_down = true;
    }

    pub fn is_dead(&self) -> bool {
        self.lifetime <= UNNATURAL_DEATH
    }

    /// Children to spawn for a death of the given kind.
    pub fn spawns_on(sub: &Submunition, death: Death) -> bool {
        match death {
            Death::Natural => sub.spawn_on_natural_death,
            Death::AntiMissile => sub.spawn_on_anti_missile_death,
        }
    }
}

/// One lock check. `chance` holds over five checks, so each check tests
/// its fifth root, scaled by `base` (1 to keep a lock, 0.5 to gain one).
pub fn lock_roll<R: Rng + ?Sized>(chance: f64, base: f64, rng: &mut R) -> bool {
    random::real(rng) < base * chance.max(0.0).powf(0.2)
}

/// Lock probability of each tracking method the weapon has, over five checks.
pub fn lock_chances(weapon: &Weapon, target: &TargetState, distance: f64) -> Vec<f64> {
    let mut chances = Vec::new();
    if weapon.tracking > 0.0 {
        chances.push(weapon.tracking);
    }
    if weapon.optical_tracking > 0.0 {
        let weight = target.mass.powi(3) / 1e9;
        let visible = weight / (1.0 + weight);
        let jam = jamming(target.optical_jamming, distance);
        chances.push(weapon.optical_tracking * visible / (1.0 + jam));
    }
    if weapon.infrared_tracking > 0.0 {
        let third = weapon.range() / 3.0;
        let boost = if third > 0.0 {
            1.0 + 2.0 * (1.0 - distance / third).clamp(0.0, 1.0)
        } else {
            1.0
        };
        chances.push(weapon.infrared_tracking * (target.heat * boost).min(1.0));
    }
    if weapon.radar_tracking > 0.0 {
        let jam = jamming(target.radar_jamming, distance);
        chances.push(weapon.radar_tracking / (1.0 + jam));
    }
    chances
}

/// Jamming strength, fading linearly to nothing at `500 + 500·√jam`.
fn jamming(jam: f64, distance: f64) -> f64 {
    if jam <= 0.0 {
        return 0.0;
    }
    let reach = 500.0 + 500.0 * jam.sqrt();
    jam * (1.0 - distance / reach).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn target_at(position: Point) -> TargetState {
        let mut world = hecs::World::new();
        TargetState {
            entity: world.spawn(()),
            position,
            velocity: Point::ZERO,
            government: None,
            system: None,
            is_targetable: true,
            is_disabled: false,
            heat: 0.0,
            mass: 100.0,
            optical_jamming: 0.0,
            radar_jamming: 0.0,
        }
    }

    fn missile() -> Weapon {
        let mut weapon = Weapon::default();
        weapon.homing = true;
        weapon.velocity = 8.0;
        weapon.acceleration = 1.0;
        weapon.drag = 0.125;
        weapon.turn = 6.0;
        weapon.lifetime = 400;
        weapon.sanitize(false);
        weapon
    }

    #[test]
    fn test_homing_converges_on_stationary_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let weapon = missile();
        let target = target_at(Point::new(0.0, -600.0));
        let mut world = hecs::World::new();
        let shooter = world.spawn(());
        let mut ship = Body::default();
        ship.facing = Angle::new(90.0);
        let mut projectile = Projectile::fire(
            shooter,
            &ship,
            None,
            Point::ZERO,
            Angle::new(90.0),
            OutfitId(0),
            &weapon,
            Some(&target),
            &mut rng,
        );
        assert!(projectile.has_lock);

        let tolerance = weapon.velocity / weapon.turn;
        let mut closest = f64::INFINITY;
        let mut cues = Vec::new();
        for _ in 0..weapon.lifetime {
            let start = projectile.body.position;
            if projectile.advance(&weapon, Some(&target), &mut rng, &mut cues) != Flight::Alive {
                break;
            }
            let step = projectile.body.position - start;
            let along = ((target.position - start).dot(step) / step.length_squared()).clamp(0.0, 1.0);
            closest = closest.min((start + step * along).distance(target.position));
        }
        assert!(closest <= tolerance, "closest approach {closest:.2} > {tolerance:.2}");
    }

    #[test]
    fn test_lifetime_expiry_is_natural_death() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut weapon = Weapon::default();
        weapon.velocity = 5.0;
        weapon.lifetime = 3;
        weapon.sanitize(false);
        let mut world = hecs::World::new();
        let shooter = world.spawn(());
        let mut projectile = Projectile::fire(
            shooter,
            &Body::default(),
            None,
            Point::ZERO,
            Angle::default(),
            OutfitId(0),
            &weapon,
            None,
            &mut rng,
        );
        let mut cues = Vec::new();
        assert_eq!(projectile.advance(&weapon, None, &mut rng, &mut cues), Flight::Alive);
        assert_eq!(projectile.advance(&weapon, None, &mut rng, &mut cues), Flight::Alive);
        assert_eq!(
            projectile.advance(&weapon, None, &mut rng, &mut cues),
            Flight::Dead(Death::Natural)
        );

        projectile.lifetime = 10;
        projectile.kill();
        assert_eq!(
            projectile.advance(&weapon, None, &mut rng, &mut cues),
            Flight::Dead(Death::AntiMissile)
        );
    }

    #[test]
    fn test_lost_target_stops_homing() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let weapon = missile();
        let target = target_at(Point::new(300.0, 0.0));
        let mut world = hecs::World::new();
        let shooter = world.spawn(());
        let mut projectile = Projectile::fire(
            shooter,
            &Body::default(),
            None,
            Point::ZERO,
            Angle::default(),
            OutfitId(0),
            &weapon,
            Some(&target),
            &mut rng,
        );
        let mut cues = Vec::new();
        projectile.advance(&weapon, None, &mut rng, &mut cues);
        assert!(projectile.target.is_none());
        assert_eq!(projectile.body.facing, Angle::default());
    }

    #[test]
    fn test_penetration_counts_down() {
        let mut weapon = Weapon::default();
        weapon.penetration_count = 2;
        weapon.lifetime = 50;
        weapon.sanitize(false);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut world = hecs::World::new();
        let shooter = world.spawn(());
        let mut projectile = Projectile::fire(
            shooter,
            &Body::default(),
            None,
            Point::ZERO,
            Angle::default(),
            OutfitId(0),
            &weapon,
            None,
            &mut rng,
        );
        let mut cues = Vec::new();
        assert!(!projectile.explode(&weapon, 0.5, &mut cues));
        assert!(projectile.explode(&weapon, 0.5, &mut cues));
        assert!(projectile.is_dead());
    }

    #[test]
    fn test_optical_lock_favors_heavy_targets() {
        let mut weapon = Weapon::default();
        weapon.optical_tracking = 1.0;
        weapon.sanitize(false);
        let mut light = target_at(Point::ZERO);
        light.mass = 50.0;
        let mut heavy = light;
        heavy.mass = 2000.0;
        let light_chance = lock_chances(&weapon, &light, 100.0)[0];
        let heavy_chance = lock_chances(&weapon, &heavy, 100.0)[0];
        assert!(light_chance < 0.01 && heavy_chance > 0.8);

        heavy.optical_jamming = 4.0;
        let jammed = lock_chances(&weapon, &heavy, 100.0)[0];
        let far = lock_chances(&weapon, &heavy, 5000.0)[0];
        assert!(jammed < heavy_chance && far > jammed);
    }

    fn tracked(weapon: &Weapon, target: &TargetState, rng: &mut ChaCha8Rng) -> Projectile {
        let mut world = hecs::World::new();
        let shooter = world.spawn(());
        Projectile::fire(
            shooter,
            &Body::default(),
            None,
            Point::ZERO,
            Angle::default(),
            OutfitId(0),
            weapon,
            Some(target),
            rng,
        )
    }

    #[test]
    fn test_lock_is_easier_to_keep_than_to_gain() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut weapon = missile();
        weapon.tracking = 0.5;
        let target = target_at(Point::new(0.0, -300.0));
        let mut projectile = tracked(&weapon, &target, &mut rng);

        let trials = 20_000u32;
        let (mut kept, mut gained) = (0u32, 0u32);
        for _ in 0..trials {
            projectile.has_lock = true;
            projectile.check_lock(&weapon, &target, &mut rng);
            kept += u32::from(projectile.has_lock);
            projectile.has_lock = false;
            projectile.check_lock(&weapon, &target, &mut rng);
            gained += u32::from(projectile.has_lock);
        }
        let n = f64::from(trials);
        let keep = 0.5f64.powf(0.2);
        let (kept, gained) = (f64::from(kept) / n, f64::from(gained) / n);
        assert!((kept - keep).abs() < 0.015, "kept {kept:.3}, expected {keep:.3}");
        assert!((gained - 0.5 * keep).abs() < 0.015, "gained {gained:.3}, expected {:.3}", 0.5 * keep);
    }

    #[test]
    fn test_confused_only_when_every_method_confuses() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut single = missile();
        single.tracking = 0.5;
        let mut double = single.clone();
        double.radar_tracking = 0.5;
        let target = target_at(Point::new(0.0, -300.0));

        let trials = 20_000u32;
        let miss = 1.0 - 0.5 * 0.5f64.powf(0.2);
        for (weapon, methods) in [(&single, 2), (&double, 4)] {
            let mut projectile = tracked(weapon, &target, &mut rng);
            let mut confused = 0u32;
            for _ in 0..trials {
                projectile.has_lock = false;
                projectile.check_lock(weapon, &target, &mut rng);
                assert!(!(projectile.is_confused && projectile.has_lock));
                confused += u32::from(projectile.is_confused);
            }
            // Every lock roll and every confusion roll has to miss.
            let expected = miss.powi(methods);
            let rate = f64::from(confused) / f64::from(trials);
            assert!((rate - expected).abs() < 0.015, "confused {rate:.3}, expected {expected:.3}");
        }
    }
}
