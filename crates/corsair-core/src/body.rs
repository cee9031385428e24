//! Shared kinematic state of every simulated object.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{Angle, Point};
use crate::mask::Mask;
use crate::types::GovernmentId;

/// Position, motion and appearance common to ships, projectiles,
/// asteroids and flotsam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub position: Point,
    pub velocity: Point,
    pub facing: Angle,
    /// Animation frame.
    pub frame: f64,
    /// 1 in normal space; shrinks toward 0 while landing.
    pub zoom: f64,
    /// Opacity for fade-outs and cloaking.
    pub alpha: f64,
    pub government: Option<GovernmentId>,
    /// Sprite path for the presentation layer.
    pub sprite: Option<String>,
    /// Collision silhouette. Missing masks never collide.
    #[serde(skip)]
    pub mask: Option<Arc<Mask>>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            velocity: Point::ZERO,
            facing: Angle::default(),
            frame: 0.0,
            zoom: 1.0,
            alpha: 1.0,
            government: None,
            sprite: None,
            mask: None,
        }
    }
}

impl Body {
    pub fn new(position: Point, velocity: Point, facing: Angle) -> Self {
        Self {
            position,
            velocity,
            facing,
            ..Default::default()
        }
    }

    /// Bounding radius of the mask (0 without one).
    pub fn radius(&self) -> f64 {
        self.mask.as_ref().map_or(0.0, |mask| mask.radius())
    }

    pub fn has_mask(&self) -> bool {
        self.mask.as_ref().is_some_and(|mask| mask.is_loaded())
    }

    /// Swept-segment test of a ray starting at `start` with `velocity`.
    pub fn collide(&self, start: Point, velocity: Point) -> f64 {
        match &self.mask {
            Some(mask) => mask.collide(start - self.position, velocity, self.facing),
            None => 1.0,
        }
    }

    /// Whether any part of this body lies within `range` of `center`.
    pub fn within_range(&self, center: Point, range: f64) -> bool {
        match &self.mask {
            Some(mask) => mask.within_range(center - self.position, self.facing, range),
            None => self.position.distance(center) <= range,
        }
    }

    /// Whether any part of this body lies in the ring `[inner, outer]`.
    pub fn within_ring(&self, center: Point, inner: f64, outer: f64) -> bool {
        match &self.mask {
            Some(mask) => mask.within_ring(center - self.position, self.facing, inner, outer),
            None => {
                let d = self.position.distance(center);
                d >= inner && d <= outer
            }
        }
    }

    /// Distance from `point` to this body's outline.
    pub fn edge_distance(&self, point: Point) -> f64 {
        match &self.mask {
            Some(mask) if mask.is_loaded() => mask.range(point - self.position, self.facing),
            _ => self.position.distance(point),
        }
    }
}
