//! Uniform-grid spatial index for swept-segment and area queries.
//!
//! Bodies are registered in every cell their bounding circle touches.
//! Cells are addressed through a wrap mask, so the grid covers the whole
//! plane with a fixed number of buckets. Each entry remembers its
//! unwrapped cell, which lets a finite grid reject aliases from far away
//! and lets an infinite grid treat them as repeated tiles.

use std::collections::HashSet;
use std::sync::Arc;

use corsair_core::body::Body;
use corsair_core::geometry::{Angle, Point};
use corsair_core::mask::Mask;
use corsair_core::types::GovernmentId;

/// Extra padding around a body's radius when registering it.
const REGISTER_PAD: f64 = 1.0;

/// One body as the grid stores it.
#[derive(Debug, Clone)]
pub struct GridBody<K> {
    pub key: K,
    pub position: Point,
    pub facing: Angle,
    pub radius: f64,
    pub mask: Option<Arc<Mask>>,
    pub government: Option<GovernmentId>,
}

impl<K> GridBody<K> {
    pub fn from_body(key: K, body: &Body) -> Self {
        Self {
            key,
            position: body.position,
            facing: body.facing,
            radius: body.radius(),
            mask: body.mask.clone(),
            government: body.government,
        }
    }

    fn collide(&self, position: Point, start: Point, velocity: Point) -> f64 {
        match &self.mask {
            Some(mask) => mask.collide(start - position, velocity, self.facing),
            None => 1.0,
        }
    }

    fn within_range(&self, position: Point, center: Point, range: f64) -> bool {
        let offset = center - position;
        if offset.length() <= range {
            return true;
        }
        self.mask
            .as_ref()
            .is_some_and(|mask| mask.within_range(offset, self.facing, range))
    }

    fn within_ring(&self, position: Point, center: Point, inner: f64, outer: f64) -> bool {
        let offset = center - position;
        match &self.mask {
            Some(mask) if mask.is_loaded() => mask.within_ring(offset, self.facing, inner, outer),
            _ => {
                let d = offset.length();
                d >= inner && d <= outer
            }
        }
    }
}

/// Result of a swept-segment query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit<K> {
    pub key: K,
    /// Fraction of the segment at which the body is first touched.
    pub t: f64,
    /// Position of the body (tile-shifted in an infinite grid).
    pub position: Point,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    body: usize,
    x: i64,
    y: i64,
}

#[derive(Debug, Clone)]
pub struct CollisionGrid<K> {
    cell_size: f64,
    cell_count: i64,
    wrap_mask: i64,
    infinite: bool,
    step: u64,
    bodies: Vec<GridBody<K>>,
    added: Vec<Entry>,
    sorted: Vec<Entry>,
    /// Start of each cell's range in `sorted`, plus a trailing end marker.
    starts: Vec<usize>,
    finished: bool,
}

impl<K: Copy> CollisionGrid<K> {
    /// A grid whose far-away aliases are ignored.
    pub fn new(cell_size: u32, cell_count: u32) -> Self {
        Self::build(cell_size, cell_count, false)
    }

    /// A grid whose bodies repeat every `cell_size * cell_count` pixels.
    pub fn infinite(cell_size: u32, cell_count: u32) -> Self {
        Self::build(cell_size, cell_count, true)
    }

    fn build(cell_size: u32, cell_count: u32, infinite: bool) -> Self {
        debug_assert!(cell_size.is_power_of_two() && cell_count.is_power_of_two());
        let cell_count = i64::from(cell_count.max(1));
        Self {
            cell_size: f64::from(cell_size.max(1)),
            cell_count,
            wrap_mask: cell_count - 1,
            infinite,
            step: 0,
            bodies: Vec::new(),
            added: Vec::new(),
            sorted: Vec::new(),
            starts: vec![0; (cell_count * cell_count + 1) as usize],
            finished: false,
        }
    }

    /// Width of one repeat of the grid.
    pub fn wrap(&self) -> f64 {
        self.cell_size * self.cell_count as f64
    }

    /// Animation step recorded by the last [`clear`](Self::clear).
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Reset for a new tick.
    pub fn clear(&mut self, step: u64) {
        self.step = step;
        self.bodies.clear();
        self.added.clear();
        self.sorted.clear();
        self.finished = false;
    }

    pub fn add(&mut self, body: GridBody<K>) {
        debug_assert!(!self.finished, "add after finish");
        if self.finished {
            return;
        }
        let index = self.bodies.len();
        let reach = body.radius + REGISTER_PAD;
        let (min_x, min_y) = self.cell_of(body.position - Point::splat(reach));
        let (max_x, max_y) = self.cell_of(body.position + Point::splat(reach));
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                self.added.push(Entry { body: index, x, y });
            }
        }
        self.bodies.push(body);
    }

    /// Sort the entries by cell. Queries before this return nothing.
    pub fn finish(&mut self) {
        let cells = (self.cell_count * self.cell_count) as usize;
        self.starts.iter_mut().for_each(|start| *start = 0);
        let buckets: Vec<usize> = self
            .added
            .iter()
            .map(|entry| self.bucket(entry.x, entry.y))
            .collect();
        for &bucket in &buckets {
            self.starts[bucket + 1] += 1;
        }
        for i in 0..cells {
            self.starts[i + 1] += self.starts[i];
        }
        let mut next = self.starts.clone();
        self.sorted = vec![Entry { body: 0, x: 0, y: 0 }; self.added.len()];
        for (entry, &bucket) in self.added.iter().zip(&buckets) {
            self.sorted[next[bucket]] = *entry;
            next[bucket] += 1;
        }
        self.finished = true;
    }

    /// The body with the smallest collision fraction along the segment
    /// from `start` to `start + velocity`, among those `accept` allows.
    pub fn line(
        &self,
        start: Point,
        velocity: Point,
        mut accept: impl FnMut(&GridBody<K>) -> bool,
    ) -> Option<LineHit<K>> {
        if !self.finished || self.bodies.is_empty() {
            return None;
        }
        let size = self.cell_size;
        let (mut x, mut y) = self.cell_of(start);
        let (end_x, end_y) = self.cell_of(start + velocity);

        let axis = |position: f64, speed: f64, cell: i64| -> (i64, f64, f64) {
            if speed > 0.0 {
                (1, ((cell + 1) as f64 * size - position) / speed, size / speed)
            } else if speed < 0.0 {
                (-1, (cell as f64 * size - position) / speed, -size / speed)
            } else {
                (0, f64::INFINITY, f64::INFINITY)
            }
        };
        let (step_x, mut next_x, delta_x) = axis(start.x, velocity.x, x);
        let (step_y, mut next_y, delta_y) = axis(start.y, velocity.y, y);

        let mut seen = HashSet::new();
        let mut best: Option<LineHit<K>> = None;
        let mut closest = 1.0;
        let limit = (end_x - x).abs() + (end_y - y).abs() + 2;
        for _ in 0..=limit {
            for (entry, tile) in self.cell(x, y) {
                if !seen.insert((entry.body, tile)) {
                    continue;
                }
                let body = &self.bodies[entry.body];
                if !accept(body) {
                    continue;
                }
                let position = body.position + self.shift(tile);
                let t = body.collide(position, start, velocity);
                if t < closest {
                    closest = t;
                    best = Some(LineHit {
                        key: body.key,
                        t,
                        position,
                    });
                }
            }
            if x == end_x && y == end_y {
                break;
            }
            // A later cell cannot hold a hit earlier than the one in hand.
            let entry_t = next_x.min(next_y);
            if entry_t >= closest || entry_t > 1.0 {
                break;
            }
            if next_x < next_y {
                x += step_x;
                next_x += delta_x;
            } else if next_y < next_x {
                y += step_y;
                next_y += delta_y;
            } else {
                // Exactly through a corner.
                x += step_x;
                y += step_y;
                next_x += delta_x;
                next_y += delta_y;
            }
        }
        best
    }

    /// Keys of every body within `radius` of `center`, in insertion order.
    pub fn circle(&self, center: Point, radius: f64) -> Vec<K> {
        self.circle_bodies(center, radius).into_iter().map(|body| body.key).collect()
    }

    /// [`circle`](Self::circle), returning the bodies themselves.
    pub fn circle_bodies(&self, center: Point, radius: f64) -> Vec<&GridBody<K>> {
        self.area(center, radius, |body, position| {
            body.within_range(position, center, radius)
        })
        .into_iter()
        .map(|index| &self.bodies[index])
        .collect()
    }

    /// Keys of every body with some part in the ring `[inner, outer]`.
    pub fn ring(&self, center: Point, inner: f64, outer: f64) -> Vec<K> {
        self.area(center, outer, |body, position| {
            body.within_ring(position, center, inner, outer)
        })
        .into_iter()
        .map(|index| self.bodies[index].key)
        .collect()
    }

    fn area(
        &self,
        center: Point,
        radius: f64,
        mut test: impl FnMut(&GridBody<K>, Point) -> bool,
    ) -> Vec<usize> {
        if !self.finished || self.bodies.is_empty() {
            return Vec::new();
        }
        let (min_x, min_y) = self.cell_of(center - Point::splat(radius));
        let (max_x, max_y) = self.cell_of(center + Point::splat(radius));
        let mut seen = HashSet::new();
        let mut hits = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                for (entry, tile) in self.cell(x, y) {
                    if !seen.insert((entry.body, tile)) {
                        continue;
                    }
                    let body = &self.bodies[entry.body];
                    if test(body, body.position + self.shift(tile)) {
                        hits.push(entry.body);
                    }
                }
            }
        }
        hits.sort_unstable();
        hits.dedup();
        hits
    }

    /// Entries filed under the unwrapped cell `(x, y)`, each with the tile
    /// that moves its body into that cell.
    fn cell(&self, x: i64, y: i64) -> impl Iterator<Item = (Entry, (i64, i64))> + '_ {
        let bucket = self.bucket(x, y);
        let range = self.starts[bucket]..self.starts[bucket + 1];
        let count = self.cell_count;
        let infinite = self.infinite;
        self.sorted[range].iter().filter_map(move |entry| {
            if entry.x == x && entry.y == y {
                Some((*entry, (0, 0)))
            } else if infinite {
                let tile = ((x - entry.x).div_euclid(count), (y - entry.y).div_euclid(count));
                Some((*entry, tile))
            } else {
                None
            }
        })
    }

    fn shift(&self, (x, y): (i64, i64)) -> Point {
        Point::new(x as f64, y as f64) * self.wrap()
    }

    fn cell_of(&self, p: Point) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    fn bucket(&self, x: i64, y: i64) -> usize {
        ((y & self.wrap_mask) * self.cell_count + (x & self.wrap_mask)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn disk(key: usize, x: f64, y: f64, radius: f64) -> GridBody<usize> {
        GridBody {
            key,
            position: Point::new(x, y),
            facing: Angle::default(),
            radius,
            mask: Some(Arc::new(Mask::circle(radius, 16))),
            government: None,
        }
    }

    fn grid(bodies: &[GridBody<usize>]) -> CollisionGrid<usize> {
        let mut grid = CollisionGrid::new(64, 8);
        grid.clear(0);
        for body in bodies {
            grid.add(body.clone());
        }
        grid.finish();
        grid
    }

    #[test]
    fn test_line_picks_nearest_body() {
        let grid = grid(&[disk(0, 0.0, -300.0, 20.0), disk(1, 0.0, -100.0, 20.0)]);
        let hit = grid
            .line(Point::ZERO, Point::new(0.0, -400.0), |_| true)
            .unwrap();
        assert_eq!(hit.key, 1);
        assert!((hit.t - 0.2).abs() < 0.01, "t: {}", hit.t);
    }

    #[test]
    fn test_line_respects_filter_and_empty_grid() {
        let grid = grid(&[disk(0, 0.0, -100.0, 20.0)]);
        assert!(grid
            .line(Point::ZERO, Point::new(0.0, -400.0), |body| body.key != 0)
            .is_none());
        let empty: CollisionGrid<usize> = CollisionGrid::new(64, 8);
        assert!(empty.line(Point::ZERO, Point::new(10.0, 0.0), |_| true).is_none());
        assert!(empty.circle(Point::ZERO, 100.0).is_empty());
    }

    #[test]
    fn test_finite_grid_ignores_aliases() {
        // 512 px apart: the same wrapped cell, but a different place.
        let grid = grid(&[disk(0, 512.0 + 10.0, 10.0, 5.0)]);
        assert!(grid.line(Point::new(0.0, 10.0), Point::new(20.0, 0.0), |_| true).is_none());
        assert!(grid.circle(Point::new(10.0, 10.0), 20.0).is_empty());
    }

    #[test]
    fn test_infinite_grid_repeats_bodies() {
        let mut grid = CollisionGrid::infinite(64, 8);
        grid.clear(0);
        grid.add(disk(7, 100.0, 100.0, 10.0));
        grid.finish();
        let hit = grid
            .line(Point::new(100.0 + 512.0 * 3.0, 150.0), Point::new(0.0, -100.0), |_| true)
            .unwrap();
        assert_eq!(hit.key, 7);
        assert!((hit.position.x - (100.0 + 512.0 * 3.0)).abs() < 1e-9);
        assert_eq!(grid.circle(Point::new(100.0 - 512.0, 100.0), 15.0), vec![7]);
    }

    #[test]
    fn test_circle_and_ring() {
        let grid = grid(&[
            disk(0, 0.0, 0.0, 10.0),
            disk(1, 100.0, 0.0, 10.0),
            disk(2, 300.0, 0.0, 10.0),
        ]);
        assert_eq!(grid.circle(Point::ZERO, 95.0), vec![0, 1]);
        let bodies = grid.circle_bodies(Point::ZERO, 95.0);
        assert_eq!(bodies.iter().map(|body| body.key).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(grid.ring(Point::ZERO, 50.0, 200.0), vec![1]);
    }

    #[test]
    fn test_line_through_exact_corner() {
        // The segment passes exactly through the corner at (64, 64).
        let grid = grid(&[disk(0, 100.0, 100.0, 8.0)]);
        let hit = grid.line(Point::new(32.0, 32.0), Point::new(96.0, 96.0), |_| true);
        assert_eq!(hit.map(|h| h.key), Some(0));
    }

    proptest! {
        #[test]
        fn prop_line_matches_brute_force(
            disks in prop::collection::vec((-600.0f64..600.0, -600.0f64..600.0, 2.0f64..60.0), 1..20),
            sx in -600.0f64..600.0,
            sy in -600.0f64..600.0,
            vx in -700.0f64..700.0,
            vy in -700.0f64..700.0,
        ) {
            let bodies: Vec<_> = disks
                .iter()
                .enumerate()
                .map(|(i, &(x, y, r))| disk(i, x, y, r))
                .collect();
            let grid = grid(&bodies);
            let start = Point::new(sx, sy);
            let velocity = Point::new(vx, vy);
            let brute = bodies
                .iter()
                .map(|b| b.collide(b.position, start, velocity))
                .fold(1.0, f64::min);
            match grid.line(start, velocity, |_| true) {
                Some(hit) => prop_assert!((hit.t - brute).abs() < 1e-9),
                None => prop_assert!(brute >= 1.0),
            }
        }
    }
}
