//! Random sampling helpers over any `rand::Rng`.
//!
//! The simulation threads a single seeded generator through every call so
//! that a run is reproducible from its seed.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Uniform real in `[0, 1)`.
pub fn real<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>()
}

/// Uniform integer in `[0, n)`; zero when `n` is zero.
pub fn int<R: Rng + ?Sized>(rng: &mut R, n: u32) -> u32 {
    if n == 0 {
        0
    } else {
        rng.gen_range(0..n)
    }
}

/// Standard normal sample (Box-Muller).
pub fn normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1 = 1.0 - real(rng);
    let u2 = real(rng);
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Poisson sample with the given mean (Knuth for small means, normal
/// approximation above).
pub fn poisson<R: Rng + ?Sized>(rng: &mut R, mean: f64) -> u32 {
    if mean <= 0.0 {
        return 0;
    }
    if mean > 30.0 {
        return (mean + normal(rng) * mean.sqrt()).round().max(0.0) as u32;
    }
    let limit = (-mean).exp();
    let mut product = real(rng);
    let mut count = 0;
    while product > limit {
        product *= real(rng);
        count += 1;
    }
    count
}

/// Gamma sample with integer-or-real shape `k` and unit scale
/// (Marsaglia-Tsang).
fn gamma<R: Rng + ?Sized>(rng: &mut R, k: f64) -> f64 {
    if k < 1.0 {
        let boost = real(rng).max(f64::MIN_POSITIVE).powf(1.0 / k);
        return gamma(rng, k + 1.0) * boost;
    }
    let d = k - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = normal(rng);
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }
        let u = real(rng);
        if u.ln() < 0.5 * x * x + d - d * v + d * v.ln() {
            return d * v;
        }
    }
}

/// Polya (negative binomial) sample: failures before `k` successes with
/// success probability `p`.
pub fn polya<R: Rng + ?Sized>(rng: &mut R, k: u32, p: f64) -> u32 {
    if k == 0 || p >= 1.0 {
        return 0;
    }
    let p = p.max(1e-9);
    let rate = gamma(rng, k as f64) * (1.0 - p) / p;
    poisson(rng, rate)
}

/// Pick an index proportionally to the given non-negative weights.
/// Returns `None` when every weight is zero.
pub fn weighted_pick<R: Rng + ?Sized>(rng: &mut R, weights: &[u32]) -> Option<usize> {
    let total: u64 = weights.iter().map(|&w| w as u64).sum();
    if total == 0 {
        return None;
    }
    let mut choice = rng.gen_range(0..total);
    for (index, &weight) in weights.iter().enumerate() {
        if choice < weight as u64 {
            return Some(index);
        }
        choice -= weight as u64;
    }
    None
}

/// Shape of a weapon's inaccuracy distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionKind {
    #[default]
    Triangular,
    Uniform,
    Normal,
}

/// An inaccuracy distribution. `inclusive` keeps samples within the
/// nominal inaccuracy bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub kind: DistributionKind,
    pub inclusive: bool,
}

impl Distribution {
    /// Sample an angular offset in degrees for the given inaccuracy.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, inaccuracy: f64) -> f64 {
        if inaccuracy <= 0.0 {
            return 0.0;
        }
        let raw = match self.kind {
            DistributionKind::Triangular => (real(rng) - real(rng)) * inaccuracy,
            DistributionKind::Uniform => (2.0 * real(rng) - 1.0) * inaccuracy,
            // Three sigma spans the nominal inaccuracy.
            DistributionKind::Normal => normal(rng) * inaccuracy / 3.0,
        };
        if self.inclusive {
            raw.clamp(-inaccuracy, inaccuracy)
        } else {
            raw
        }
    }

    /// Parse a distribution keyword; unknown names fall back to triangular.
    pub fn from_name(name: &str) -> Option<DistributionKind> {
        match name {
            "triangular" => Some(DistributionKind::Triangular),
            "uniform" => Some(DistributionKind::Uniform),
            "normal" | "narrow" | "medium" | "wide" => Some(DistributionKind::Normal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_int_zero_is_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(int(&mut rng, 0), 0);
        for _ in 0..100 {
            assert!(int(&mut rng, 7) < 7);
        }
    }

    #[test]
    fn test_weighted_pick_skips_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..200 {
            let pick = weighted_pick(&mut rng, &[0, 3, 0, 1]).unwrap();
            assert!(pick == 1 || pick == 3);
        }
        assert_eq!(weighted_pick(&mut rng, &[0, 0]), None);
    }

    #[test]
    fn test_inclusive_distribution_stays_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let dist = Distribution {
            kind: DistributionKind::Normal,
            inclusive: true,
        };
        for _ in 0..1000 {
            let x = dist.sample(&mut rng, 5.0);
            assert!((-5.0..=5.0).contains(&x));
        }
    }

    #[test]
    fn test_polya_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        // Mean of NB(k, p) is k(1-p)/p = 10 * 0.5 / 0.5 = 10.
        let n = 4000;
        let total: u64 = (0..n).map(|_| polya(&mut rng, 10, 0.5) as u64).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 10.0).abs() < 0.6, "polya mean: {mean:.2}");
    }
}
