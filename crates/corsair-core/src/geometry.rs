//! Plane geometry: points, angles and intercept math.
//!
//! Angles are measured in degrees with 0 pointing "up" (negative y, since
//! screen y grows downward) and increasing clockwise.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A point or vector in the simulation plane (pixels).
pub type Point = DVec2;

/// 2D cross product `a.x * b.y - a.y * b.x`.
pub fn cross(a: Point, b: Point) -> f64 {
    a.perp_dot(b)
}

/// Unit vector of `p`, or zero for the zero vector.
pub fn unit(p: Point) -> Point {
    p.normalize_or_zero()
}

/// An angle in degrees, normalized to `[0, 360)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub fn new(degrees: f64) -> Self {
        let wrapped = degrees.rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs.
        Self(if wrapped >= 360.0 { 0.0 } else { wrapped })
    }

    /// Angle of the given vector. The zero vector points up.
    pub fn from_vector(v: Point) -> Self {
        if v == Point::ZERO {
            return Self(0.0);
        }
        Self::new(v.x.atan2(-v.y).to_degrees())
    }

    /// Uniformly random direction.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen::<f64>() * 360.0)
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    /// The angle expressed in `(-180, 180]`.
    pub fn signed(self) -> f64 {
        if self.0 > 180.0 {
            self.0 - 360.0
        } else {
            self.0
        }
    }

    /// Signed rotation in `(-180, 180]` that takes `from` to `self`.
    pub fn delta_from(self, from: Angle) -> f64 {
        Angle::new(self.0 - from.0).signed()
    }

    /// Unit vector pointing in this direction.
    pub fn unit(self) -> Point {
        let (sin, cos) = self.0.to_radians().sin_cos();
        Point::new(sin, -cos)
    }

    /// Rotate a point given in a frame facing "up" into this angle's frame.
    pub fn rotate(self, p: Point) -> Point {
        let u = self.unit();
        Point::new(-u.y * p.x - u.x * p.y, u.x * p.x - u.y * p.y)
    }

    /// Rotate a world-frame point back into the frame facing "up".
    pub fn unrotate(self, p: Point) -> Point {
        (-self).rotate(p)
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle::new(self.0 + rhs.0)
    }
}

impl Add<f64> for Angle {
    type Output = Angle;
    fn add(self, rhs: f64) -> Angle {
        Angle::new(self.0 + rhs)
    }
}

impl AddAssign<f64> for Angle {
    fn add_assign(&mut self, rhs: f64) {
        *self = *self + rhs;
    }
}

impl AddAssign for Angle {
    fn add_assign(&mut self, rhs: Angle) {
        *self = *self + rhs;
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle::new(self.0 - rhs.0)
    }
}

impl SubAssign<f64> for Angle {
    fn sub_assign(&mut self, rhs: f64) {
        *self = Angle::new(self.0 - rhs);
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle::new(-self.0)
    }
}

/// Time until a projectile of the given speed, fired now from the origin,
/// meets a target at relative position `p` moving with relative velocity `v`.
///
/// Solves `|p + v t| = speed · t` for the smallest non-negative `t`.
pub fn rendezvous_time(p: Point, v: Point, speed: f64) -> Option<f64> {
    let a = v.dot(v) - speed * speed;
    let b = 2.0 * p.dot(v);
    let c = p.dot(p);

    if a.abs() < 1e-9 {
        // Projectile and target speeds match: the equation is linear.
        if b.abs() < 1e-9 {
            return (c == 0.0).then_some(0.0);
        }
        let t = -c / b;
        return (t >= 0.0).then_some(t);
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    let r1 = (-b + root) / (2.0 * a);
    let r2 = (-b - root) / (2.0 * a);
    match (r1 >= 0.0, r2 >= 0.0) {
        (true, true) => Some(r1.min(r2)),
        (true, false) => Some(r1),
        (false, true) => Some(r2),
        (false, false) => None,
    }
}
