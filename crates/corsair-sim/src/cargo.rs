//! Ship holds and the flotsam they spill.

use std::collections::BTreeMap;

use hecs::Entity;
use rand::Rng;
use serde::{Deserialize, Serialize};

use corsair_core::body::Body;
use corsair_core::catalog::Catalog;
use corsair_core::constants::FLOTSAM_LIFETIME;
use corsair_core::geometry::{Angle, Point};
use corsair_core::random;
use corsair_core::types::{OutfitId, SystemId};

/// Flotsam drag per tick.
const FLOTSAM_DRAG: f64 = 0.01;

/// Commodities by name, in tons, plus loose outfits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    pub commodities: BTreeMap<String, u32>,
    pub outfits: BTreeMap<OutfitId, u32>,
}

impl Cargo {
    pub fn commodity_tons(&self) -> u32 {
        self.commodities.values().sum()
    }

    /// Tons in use, counting outfits by their mass.
    pub fn used(&self, catalog: &Catalog) -> f64 {
        let outfits: f64 = self
            .outfits
            .iter()
            .map(|(&id, &count)| catalog.outfit(id).map_or(0.0, |o| o.mass()) * f64::from(count))
            .sum();
        f64::from(self.commodity_tons()) + outfits
    }

    pub fn is_empty(&self) -> bool {
        self.commodities.values().all(|&tons| tons == 0) && self.outfits.values().all(|&n| n == 0)
    }

    pub fn add_commodity(&mut self, name: &str, tons: u32) {
        if tons > 0 {
            *self.commodities.entry(name.to_string()).or_default() += tons;
        }
    }

    pub fn add_outfit(&mut self, outfit: OutfitId, count: u32) {
        if count > 0 {
            *self.outfits.entry(outfit).or_default() += count;
        }
    }

    /// Fill up to `space` tons with a random mix of up to `kinds` of the
    /// given commodities.
    pub fn fill_random<R: Rng + ?Sized>(
        &mut self,
        names: &[&str],
        kinds: u32,
        space: u32,
        rng: &mut R,
    ) {
        if names.is_empty() {
            return;
        }
        let mut free = space.saturating_sub(self.commodity_tons());
        for _ in 0..kinds {
            if free == 0 {
                break;
            }
            let name = names[random::int(rng, names.len() as u32) as usize];
            let tons = random::int(rng, free + 1);
            self.add_commodity(name, tons);
            free -= tons;
        }
    }

    /// Empty the hold.
    pub fn take(&mut self) -> Cargo {
        std::mem::take(self)
    }
}

/// What a piece of flotsam holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Contents {
    Commodity { name: String },
    Outfit { outfit: OutfitId },
}

/// Cargo floating in space, waiting for someone to scoop it up.
#[derive(Debug, Clone)]
pub struct Flotsam {
    pub body: Body,
    pub system: Option<SystemId>,
    pub contents: Contents,
    pub count: u32,
    pub lifetime: i32,
    /// The ship that dropped this, which cannot collect it back.
    pub source: Option<Entity>,
}

impl Flotsam {
    /// One piece of flotsam per cargo line, drifting away from `origin`.
    pub fn spill<R: Rng + ?Sized>(
        cargo: Cargo,
        origin: &Body,
        system: Option<SystemId>,
        source: Option<Entity>,
        rng: &mut R,
    ) -> Vec<Flotsam> {
        let contents = cargo
            .commodities
            .into_iter()
            .filter(|(_, tons)| *tons > 0)
            .map(|(name, tons)| (Contents::Commodity { name }, tons))
            .chain(
                cargo
                    .outfits
                    .into_iter()
                    .filter(|(_, count)| *count > 0)
                    .map(|(outfit, count)| (Contents::Outfit { outfit }, count)),
            );
        contents
            .map(|(contents, count)| {
                let drift = Angle::random(rng).unit() * (0.5 + random::real(rng));
                Flotsam {
                    body: Body::new(origin.position, origin.velocity + drift, Angle::random(rng)),
                    system,
                    contents,
                    count,
                    lifetime: FLOTSAM_LIFETIME,
                    source,
                }
            })
            .collect()
    }

    pub fn advance(&mut self) {
        self.body.velocity *= 1.0 - FLOTSAM_DRAG;
        self.body.position += self.body.velocity;
        self.lifetime -= 1;
    }

    /// Pull toward `point` by `strength`, as a tractor beam does.
    pub fn pull(&mut self, point: Point, strength: f64) {
        let offset = point - self.body.position;
        let distance = offset.length();
        if distance > 0.0 {
            self.body.velocity += offset / distance * strength.min(distance);
        }
    }

    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0
    }

    /// Tons this would take in a hold.
    pub fn tons(&self, catalog: &Catalog) -> f64 {
        match &self.contents {
            Contents::Commodity { .. } => f64::from(self.count),
            Contents::Outfit { outfit } => {
                catalog.outfit(*outfit).map_or(0.0, |o| o.mass()) * f64::from(self.count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_fill_random_respects_space() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let mut cargo = Cargo::default();
            cargo.fill_random(&["Food", "Metal", "Medical"], 3, 40, &mut rng);
            assert!(cargo.commodity_tons() <= 40);
        }
    }

    #[test]
    fn test_spill_one_piece_per_line() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut cargo = Cargo::default();
        cargo.add_commodity("Food", 5);
        cargo.add_commodity("Metal", 0);
        cargo.add_outfit(OutfitId(3), 2);
        let origin = Body::new(Point::new(10.0, 10.0), Point::ZERO, Angle::default());
        let pieces = Flotsam::spill(cargo, &origin, None, None, &mut rng);
        assert_eq!(pieces.len(), 2);
        assert!(pieces.iter().all(|p| p.lifetime == FLOTSAM_LIFETIME));
        assert_eq!(pieces[0].contents, Contents::Commodity { name: "Food".into() });
        assert_eq!(pieces[1].count, 2);
    }

    #[test]
    fn test_tractor_pull_does_not_overshoot() {
        let mut flotsam = Flotsam {
            body: Body::new(Point::new(3.0, 0.0), Point::ZERO, Angle::default()),
            system: None,
            contents: Contents::Commodity { name: "Food".into() },
            count: 1,
            lifetime: 10,
            source: None,
        };
        flotsam.pull(Point::ZERO, 10.0);
        assert_eq!(flotsam.body.velocity, Point::new(-3.0, 0.0));
    }
}
