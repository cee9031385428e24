//! Polygonal collision silhouettes.
//!
//! Outlines are stored in the body's own frame (facing "up"); queries take
//! world-frame offsets and rotate them into that frame.

use serde::{Deserialize, Serialize};

use crate::geometry::{cross, Angle, Point};

/// A closed outline with its bounding radius.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    outline: Vec<Point>,
    radius: f64,
}

impl Mask {
    /// Build a mask from an outline. Fewer than three points gives an
    /// empty mask, which never collides.
    pub fn from_outline(outline: Vec<Point>) -> Self {
        if outline.len() < 3 {
            return Self::default();
        }
        let radius = outline.iter().map(|p| p.length()).fold(0.0, f64::max);
        Self { outline, radius }
    }

    /// Regular polygon approximating a circle.
    pub fn circle(radius: f64, segments: usize) -> Self {
        let segments = segments.max(3);
        let outline = (0..segments)
            .map(|i| Angle::new(360.0 * i as f64 / segments as f64).unit() * radius)
            .collect();
        Self::from_outline(outline)
    }

    pub fn is_loaded(&self) -> bool {
        !self.outline.is_empty()
    }

    pub fn outline(&self) -> &[Point] {
        &self.outline
    }

    /// Distance from the origin to the farthest outline point.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Fraction of `velocity` at which the segment starting at `offset`
    /// (relative to the body center) first touches the mask. Returns 0 if
    /// the start is already inside and 1 or more for a miss.
    pub fn collide(&self, offset: Point, velocity: Point, facing: Angle) -> f64 {
        if !self.is_loaded() || offset.length() > self.radius + velocity.length() {
            return 1.0;
        }
        let start = facing.unrotate(offset);
        let direction = facing.unrotate(velocity);
        if self.contains_local(start) {
            return 0.0;
        }
        self.intersection(start, direction)
    }

    /// Whether the world-frame offset lies inside the mask.
    pub fn contains(&self, offset: Point, facing: Angle) -> bool {
        if !self.is_loaded() || offset.length() > self.radius {
            return false;
        }
        self.contains_local(facing.unrotate(offset))
    }

    /// Whether any part of the outline lies within `range` of the offset.
    pub fn within_range(&self, offset: Point, facing: Angle, range: f64) -> bool {
        if !self.is_loaded() || offset.length() > range + self.radius {
            return false;
        }
        let point = facing.unrotate(offset);
        if self.contains_local(point) {
            return true;
        }
        let range_squared = range * range;
        self.outline
            .iter()
            .any(|p| p.distance_squared(point) <= range_squared)
    }

    /// Whether any outline point lies in the ring `[inner, outer]` around
    /// the offset.
    pub fn within_ring(&self, offset: Point, facing: Angle, inner: f64, outer: f64) -> bool {
        if !self.is_loaded() || offset.length() > outer + self.radius {
            return false;
        }
        let point = facing.unrotate(offset);
        let (inner, outer) = (inner * inner, outer * outer);
        self.outline.iter().any(|p| {
            let d = p.distance_squared(point);
            d >= inner && d <= outer
        })
    }

    /// Distance from the offset to the nearest outline point, or 0 if inside.
    pub fn range(&self, offset: Point, facing: Angle) -> f64 {
        if !self.is_loaded() {
            return f64::INFINITY;
        }
        let point = facing.unrotate(offset);
        if self.contains_local(point) {
            return 0.0;
        }
        self.outline
            .iter()
            .map(|p| p.distance(point))
            .fold(f64::INFINITY, f64::min)
    }

    fn contains_local(&self, point: Point) -> bool {
        // Count crossings of a ray cast from the point toward +y.
        let mut inside = false;
        let mut prev = self.outline[self.outline.len() - 1];
        for &next in &self.outline {
            if (prev.x <= point.x) != (next.x <= point.x) {
                let t = (point.x - prev.x) / (next.x - prev.x);
                let y = prev.y + t * (next.y - prev.y);
                if y >= point.y {
                    inside = !inside;
                }
            }
            prev = next;
        }
        inside
    }

    fn intersection(&self, start: Point, direction: Point) -> f64 {
        let mut closest = 1.0;
        let mut prev = self.outline[self.outline.len() - 1];
        for &next in &self.outline {
            let edge = next - prev;
            let denominator = cross(edge, direction);
            if denominator != 0.0 {
                let to_prev = prev - start;
                let along_edge = cross(direction, to_prev) / denominator;
                let along_ray = cross(edge, to_prev) / denominator;
                if (0.0..1.0).contains(&along_edge) && along_ray >= 0.0 {
                    closest = f64::min(closest, along_ray);
                }
            }
            prev = next;
        }
        closest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Mask {
        Mask::from_outline(vec![
            Point::new(-10.0, -10.0),
            Point::new(10.0, -10.0),
            Point::new(10.0, 10.0),
            Point::new(-10.0, 10.0),
        ])
    }

    #[test]
    fn test_collide_head_on() {
        let mask = square();
        // Start 30 below the center moving up 40: edge at y=10 reached at t=0.5.
        let t = mask.collide(Point::new(0.0, 30.0), Point::new(0.0, -40.0), Angle::new(0.0));
        assert!((t - 0.5).abs() < 1e-9, "t: {t}");
    }

    #[test]
    fn test_collide_miss_and_inside() {
        let mask = square();
        let miss = mask.collide(Point::new(50.0, 30.0), Point::new(0.0, -40.0), Angle::new(0.0));
        assert!(miss >= 1.0);
        let inside = mask.collide(Point::new(1.0, 1.0), Point::new(0.0, -5.0), Angle::new(0.0));
        assert_eq!(inside, 0.0);
    }

    #[test]
    fn test_rotation_respected() {
        let thin = Mask::from_outline(vec![
            Point::new(-1.0, -20.0),
            Point::new(1.0, -20.0),
            Point::new(1.0, 20.0),
            Point::new(-1.0, 20.0),
        ]);
        // Offset 10 to the right: misses the upright needle, hits the turned one.
        let offset = Point::new(10.0, 0.0);
        assert!(!thin.contains(offset, Angle::new(0.0)));
        assert!(thin.contains(offset, Angle::new(90.0)));
    }

    #[test]
    fn test_range_and_within_range() {
        let mask = Mask::circle(10.0, 32);
        assert!((mask.range(Point::new(30.0, 0.0), Angle::new(0.0)) - 20.0).abs() < 0.5);
        assert!(mask.within_range(Point::new(30.0, 0.0), Angle::new(0.0), 21.0));
        assert!(!mask.within_range(Point::new(30.0, 0.0), Angle::new(0.0), 15.0));
        assert_eq!(mask.range(Point::ZERO, Angle::new(0.0)), 0.0);
    }

    #[test]
    fn test_empty_mask_never_collides() {
        let mask = Mask::from_outline(vec![Point::ZERO]);
        assert!(!mask.is_loaded());
        assert_eq!(mask.collide(Point::ZERO, Point::new(1.0, 0.0), Angle::new(0.0)), 1.0);
    }
}
