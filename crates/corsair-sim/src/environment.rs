//! Asteroid belts and hazard weather.
//!
//! Plain rocks live in an infinite grid, so a field of a few dozen rocks
//! tiles the whole system every [`ASTEROID_WRAP`] pixels. Minables are
//! finite: each one exists once, can be shot apart and drops its payload.

use std::sync::Arc;

use rand::Rng;

use corsair_core::body::Body;
use corsair_core::catalog::Catalog;
use corsair_core::constants::{ASTEROID_CELL_COUNT, ASTEROID_CELL_SIZE, ASTEROID_WRAP, ROCK_RADIUS};
use corsair_core::events::Cue;
use corsair_core::geometry::{Angle, Point};
use corsair_core::hazard::Hazard;
use corsair_core::mask::Mask;
use corsair_core::random;
use corsair_core::types::{HazardId, MinableId, SystemId};
use corsair_core::universe::AsteroidSpec;

use crate::cargo::{Cargo, Flotsam};
use crate::collision::{CollisionGrid, GridBody};
use crate::cues;

/// Outline segments of a rock's collision circle.
const ROCK_SEGMENTS: usize = 12;

/// Largest spin of an asteroid, in degrees per tick.
const MAX_SPIN: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct Asteroid {
    pub name: String,
    pub body: Body,
    pub spin: f64,
}

#[derive(Debug, Clone)]
pub struct Minable {
    pub kind: MinableId,
    pub body: Body,
    pub spin: f64,
    pub hull: f64,
    pub max_hull: f64,
}

impl Minable {
    pub fn is_destroyed(&self) -> bool {
        self.hull <= 0.0
    }
}

/// What a projectile ran into in a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldHit {
    Rock { index: usize, t: f64 },
    Minable { index: usize, t: f64 },
}

impl FieldHit {
    pub fn t(&self) -> f64 {
        match *self {
            FieldHit::Rock { t, .. } | FieldHit::Minable { t, .. } => t,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AsteroidField {
    rocks: Vec<Asteroid>,
    minables: Vec<Minable>,
    rock_grid: CollisionGrid<usize>,
    minable_grid: CollisionGrid<usize>,
    step: u64,
}

impl AsteroidField {
    pub fn new<R: Rng + ?Sized>(specs: &[AsteroidSpec], catalog: &Catalog, rng: &mut R) -> Self {
        let rock_mask = Arc::new(Mask::circle(ROCK_RADIUS, ROCK_SEGMENTS));
        let mut field = Self {
            rocks: Vec::new(),
            minables: Vec::new(),
            rock_grid: CollisionGrid::infinite(ASTEROID_CELL_SIZE, ASTEROID_CELL_COUNT),
            minable_grid: CollisionGrid::new(ASTEROID_CELL_SIZE, ASTEROID_CELL_COUNT),
            step: 0,
        };
        for spec in specs {
            match spec {
                AsteroidSpec::Rock { name, count, energy } => {
                    for _ in 0..*count {
                        let (mut body, spin) = drifting(*energy, rng);
                        body.mask = Some(rock_mask.clone());
                        field.rocks.push(Asteroid {
                            name: name.clone(),
                            body,
                            spin,
                        });
                    }
                }
                AsteroidSpec::Minable { minable, count, energy } => {
                    let Some(definition) = catalog.minables.get(*minable) else {
                        log::warn!("asteroid field names an unknown minable {:?}", minable);
                        continue;
                    };
                    let mask = Arc::new(Mask::circle(definition.radius, ROCK_SEGMENTS));
                    for _ in 0..*count {
                        let (mut body, spin) = drifting(*energy, rng);
                        body.mask = Some(mask.clone());
                        body.sprite = definition.sprite.clone();
                        field.minables.push(Minable {
                            kind: *minable,
                            body,
                            spin,
                            hull: definition.hull,
                            max_hull: definition.hull,
                        });
                    }
                }
            }
        }
        field.rebuild();
        field
    }

    pub fn rocks(&self) -> &[Asteroid] {
        &self.rocks
    }

    pub fn minables(&self) -> &[Minable] {
        &self.minables
    }

    pub fn is_empty(&self) -> bool {
        self.rocks.is_empty() && self.minables.is_empty()
    }

    /// Drift and spin everything, drop destroyed minables and re-index.
    pub fn step(&mut self) {
        self.minables.retain(|m| !m.is_destroyed());
        for rock in &mut self.rocks {
            advance(&mut rock.body, rock.spin);
        }
        for minable in &mut self.minables {
            advance(&mut minable.body, minable.spin);
        }
        self.step += 1;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.rock_grid.clear(self.step);
        for (index, rock) in self.rocks.iter().enumerate() {
            self.rock_grid.add(GridBody::from_body(index, &rock.body));
        }
        self.rock_grid.finish();
        self.minable_grid.clear(self.step);
        for (index, minable) in self.minables.iter().enumerate() {
            if !minable.is_destroyed() {
                self.minable_grid.add(GridBody::from_body(index, &minable.body));
            }
        }
        self.minable_grid.finish();
    }

    /// The first rock or minable along the segment.
    pub fn line(&self, start: Point, velocity: Point) -> Option<FieldHit> {
        let rock = self
            .rock_grid
            .line(start, velocity, |_| true)
            .map(|hit| FieldHit::Rock { index: hit.key, t: hit.t });
        let minables = &self.minables;
        let minable = self
            .minable_grid
            .line(start, velocity, |body| !minables[body.key].is_destroyed())
            .map(|hit| FieldHit::Minable { index: hit.key, t: hit.t });
        match (rock, minable) {
            (Some(a), Some(b)) => Some(if b.t() < a.t() { b } else { a }),
            (a, b) => a.or(b),
        }
    }

    /// Damage a minable. Returns true when this blow broke it up.
    pub fn damage_minable(&mut self, index: usize, amount: f64) -> bool {
        let Some(minable) = self.minables.get_mut(index) else {
            return false;
        };
        if minable.is_destroyed() || amount <= 0.0 {
            return false;
        }
        minable.hull -= amount;
        minable.is_destroyed()
    }

    /// Scatter a destroyed minable's payload as flotsam.
    pub fn break_up<R: Rng + ?Sized>(
        &self,
        index: usize,
        catalog: &Catalog,
        system: Option<SystemId>,
        rng: &mut R,
        out: &mut Vec<Cue>,
    ) -> Vec<Flotsam> {
        let Some(minable) = self.minables.get(index) else {
            return Vec::new();
        };
        let Some(definition) = catalog.minables.get(minable.kind) else {
            return Vec::new();
        };
        cues::place(out, &definition.explode, &minable.body);
        let mut payload = Cargo::default();
        for &(outfit, count) in &definition.payload {
            // Each unit of payload survives the blast with even odds.
            let survived = (0..count).filter(|_| rng.gen_bool(0.5)).count() as u32;
            payload.add_outfit(outfit, survived);
        }
        log::debug!("{} broken up", definition.name);
        Flotsam::spill(payload, &minable.body, system, None, rng)
    }
}

fn drifting<R: Rng + ?Sized>(energy: f64, rng: &mut R) -> (Body, f64) {
    let position = Point::new(random::real(rng), random::real(rng)) * ASTEROID_WRAP;
    let velocity = Angle::random(rng).unit() * (random::real(rng) * energy);
    let spin = (2.0 * random::real(rng) - 1.0) * MAX_SPIN * energy.min(1.0).max(0.1);
    (Body::new(position, velocity, Angle::random(rng)), spin)
}

fn advance(body: &mut Body, spin: f64) {
    body.position += body.velocity;
    body.position = Point::new(
        body.position.x.rem_euclid(ASTEROID_WRAP),
        body.position.y.rem_euclid(ASTEROID_WRAP),
    );
    body.facing += spin;
}

/// A hazard flaring up somewhere in a system.
#[derive(Debug, Clone)]
pub struct Weather {
    pub hazard: HazardId,
    pub system: SystemId,
    pub origin: Point,
    pub total: u32,
    pub remaining: u32,
    /// Peak strength.
    pub strength: f64,
    deviation: f64,
    period: u32,
    deviates: bool,
    /// Ticks since the last damage pulse.
    since_pulse: u32,
}

/// One tick of weather: the strength multiplier of a damage pulse, if
/// one goes off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub scale: f64,
}

impl Weather {
    pub fn new<R: Rng + ?Sized>(
        id: HazardId,
        hazard: &Hazard,
        system: SystemId,
        origin: Point,
        rng: &mut R,
    ) -> Self {
        let total = hazard.random_duration(rng).max(1);
        let spread = f64::from(total) / 4.3;
        Self {
            hazard: id,
            system,
            origin,
            total,
            remaining: total,
            strength: hazard.random_strength(rng),
            deviation: 2.0 * spread * spread,
            period: hazard.period.max(1),
            deviates: hazard.deviates,
            since_pulse: 0,
        }
    }

    /// Strength at the current point of the lifetime.
    pub fn current_strength(&self) -> f64 {
        if !self.deviates || self.deviation <= 0.0 {
            return self.strength;
        }
        let offset = f64::from(self.remaining) - f64::from(self.total) / 2.0;
        self.strength * (-offset * offset / self.deviation).exp()
    }

    /// Ticks between damage pulses at the current strength.
    pub fn interval(&self) -> u32 {
        let strength = self.current_strength();
        if strength <= 0.0 {
            return u32::MAX;
        }
        (f64::from(self.period) / strength.sqrt()).max(1.0) as u32
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Count down one tick.
    pub fn step(&mut self) -> Option<Pulse> {
        if self.is_expired() {
            return None;
        }
        self.remaining -= 1;
        self.since_pulse += 1;
        let strength = self.current_strength();
        if strength <= 0.0 || self.since_pulse < self.interval() {
            return None;
        }
        self.since_pulse = 0;
        Some(Pulse {
            scale: strength.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corsair_core::hazard::MinableDef;
    use corsair_core::types::OutfitId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rocks(count: u32, energy: f64) -> Vec<AsteroidSpec> {
        vec![AsteroidSpec::Rock {
            name: "small rock".into(),
            count,
            energy,
        }]
    }

    #[test]
    fn test_rocks_stay_in_wrap_square() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut field = AsteroidField::new(&rocks(20, 5.0), &Catalog::new(), &mut rng);
        for _ in 0..2000 {
            field.step();
        }
        for rock in field.rocks() {
            assert!((0.0..ASTEROID_WRAP).contains(&rock.body.position.x));
            assert!((0.0..ASTEROID_WRAP).contains(&rock.body.position.y));
        }
    }

    #[test]
    fn test_rocks_repeat_every_wrap() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let field = AsteroidField::new(&rocks(1, 0.0), &Catalog::new(), &mut rng);
        let rock = field.rocks()[0].body.position;
        // A shot straight down through the rock's copy three tiles over.
        let copy = rock + Point::new(3.0 * ASTEROID_WRAP, -2.0 * ASTEROID_WRAP);
        let start = copy - Point::new(0.0, 100.0);
        let hit = field.line(start, Point::new(0.0, 200.0));
        assert!(matches!(hit, Some(FieldHit::Rock { index: 0, .. })), "{hit:?}");
        assert!(field.line(copy + Point::new(300.0, 0.0), Point::new(0.0, 50.0)).is_none());
    }

    #[test]
    fn test_minable_breaks_into_payload() {
        let mut catalog = Catalog::new();
        let ore = OutfitId(0);
        let kind = catalog.add_minable(MinableDef {
            name: "iron asteroid".into(),
            hull: 50.0,
            radius: 30.0,
            payload: vec![(ore, 40)],
            ..Default::default()
        });
        let spec = vec![AsteroidSpec::Minable {
            minable: kind,
            count: 1,
            energy: 0.0,
        }];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut field = AsteroidField::new(&spec, &catalog, &mut rng);
        assert!(!field.damage_minable(0, 30.0));
        assert!(field.damage_minable(0, 30.0));
        assert!(!field.damage_minable(0, 30.0), "already broken");

        let mut cues = Vec::new();
        let pieces = field.break_up(0, &catalog, Some(SystemId(0)), &mut rng, &mut cues);
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].count > 0 && pieces[0].count < 40);

        field.step();
        assert!(field.minables().is_empty());
    }

    #[test]
    fn test_weather_bell_curve() {
        let hazard = Hazard {
            period: 100,
            min_duration: 430,
            max_duration: 430,
            min_strength: 4.0,
            max_strength: 4.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut weather = Weather::new(HazardId(0), &hazard, SystemId(0), Point::ZERO, &mut rng);
        assert_eq!(weather.deviation, 2.0 * 100.0 * 100.0);

        // Peak strength halfway through the lifetime.
        weather.remaining = 215;
        assert!((weather.current_strength() - 4.0).abs() < 1e-12);
        assert_eq!(weather.interval(), 50);
        weather.remaining = 430;
        let edge = 4.0 * (-(215.0f64 * 215.0) / 20_000.0).exp();
        assert!((weather.current_strength() - edge).abs() < 1e-12);

        let mut pulses = Vec::new();
        while !weather.is_expired() {
            if let Some(pulse) = weather.step() {
                pulses.push(pulse.scale);
            }
        }
        assert!(!pulses.is_empty());
        assert!(pulses.iter().all(|&scale| scale > 0.0 && scale <= 2.0 + 1e-12));
    }

    #[test]
    fn test_constant_weather_pulses_on_schedule() {
        let hazard = Hazard {
            period: 40,
            min_duration: 200,
            max_duration: 200,
            min_strength: 4.0,
            max_strength: 4.0,
            deviates: false,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut weather = Weather::new(HazardId(0), &hazard, SystemId(0), Point::ZERO, &mut rng);
        let pulses = (0..200).filter_map(|_| weather.step()).collect::<Vec<_>>();
        assert_eq!(pulses.len(), 10);
        assert!(pulses.iter().all(|p| p.scale == 2.0));
        assert!(weather.is_expired());
    }
}
