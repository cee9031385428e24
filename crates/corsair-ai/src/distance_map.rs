//! Bounded route search over the hyperlane graph.
//!
//! Expansion is best-first from a center system. Hyperlane hops cost 1 and
//! jump drive hops cost 2; among equally cheap routes the one with fewer
//! hops wins, then the one through less dangerous systems.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use corsair_core::catalog::Catalog;
use corsair_core::types::SystemId;
use serde::{Deserialize, Serialize};

/// Systems the player has seen on the map and systems they have been to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerKnowledge {
    pub seen: BTreeSet<SystemId>,
    pub visited: BTreeSet<SystemId>,
}

impl PlayerKnowledge {
    pub fn has_seen(&self, system: SystemId) -> bool {
        self.seen.contains(&system) || self.visited.contains(&system)
    }

    pub fn has_visited(&self, system: SystemId) -> bool {
        self.visited.contains(&system)
    }

    /// Visiting a system also reveals its links.
    pub fn visit(&mut self, catalog: &Catalog, system: SystemId) {
        self.visited.insert(system);
        self.seen.insert(system);
        if let Some(sys) = catalog.system(system) {
            self.seen.extend(sys.links.iter().copied());
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteOptions {
    /// Stop after this many systems have been finalized.
    pub max_count: Option<usize>,
    /// Do not expand past this route cost.
    pub max_cost: Option<u32>,
    pub hyperdrive: bool,
    pub jump_drive: bool,
    /// Stop as soon as this system is finalized.
    pub stop_at: Option<SystemId>,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            max_count: None,
            max_cost: None,
            hyperdrive: true,
            jump_drive: false,
            stop_at: None,
        }
    }
}

impl RouteOptions {
    pub fn with_drives(hyperdrive: bool, jump_drive: bool) -> Self {
        Self {
            // A ship with neither drive plans as if it had a hyperdrive.
            hyperdrive: hyperdrive || !jump_drive,
            jump_drive,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    cost: u32,
    hops: u32,
    danger: f64,
    next: Option<SystemId>,
}

/// Route key; smaller is better.
#[derive(Debug, Clone, Copy)]
struct Key {
    cost: u32,
    hops: u32,
    danger: f64,
}

impl Key {
    fn of(entry: &Entry) -> Self {
        Self {
            cost: entry.cost,
            hops: entry.hops,
            danger: entry.danger,
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then(self.hops.cmp(&other.hops))
            .then(self.danger.total_cmp(&other.danger))
    }
}

/// Min-heap item; ties fall back to system id so expansion order is fixed.
#[derive(Debug, PartialEq, Eq)]
struct Frontier {
    key: Key,
    system: SystemId,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.system.cmp(&self.system))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result of one search.
#[derive(Debug, Clone)]
pub struct DistanceMap {
    center: SystemId,
    entries: BTreeMap<SystemId, Entry>,
}

impl DistanceMap {
    /// Search outward from `center`. With `knowledge`, a hop is usable only
    /// into a system the player has seen, and only if they have visited one
    /// of its ends.
    pub fn new(
        catalog: &Catalog,
        center: SystemId,
        options: &RouteOptions,
        knowledge: Option<&PlayerKnowledge>,
    ) -> Self {
        let mut map = Self {
            center,
            entries: BTreeMap::new(),
        };
        let start = Entry {
            cost: 0,
            hops: 0,
            danger: 0.0,
            next: None,
        };
        map.entries.insert(center, start);

        let mut edge = BinaryHeap::new();
        edge.push(Frontier {
            key: Key::of(&start),
            system: center,
        });
        let mut done = BTreeSet::new();

        while let Some(Frontier { key, system }) = edge.pop() {
            if done.contains(&system) {
                continue;
            }
            // Stale heap item: a better route was recorded after the push.
            if map.entries.get(&system).map(Key::of) != Some(key) {
                continue;
            }
            done.insert(system);
            if options.stop_at == Some(system) {
                break;
            }
            if options.max_count.is_some_and(|max| done.len() >= max) {
                break;
            }
            if options.max_cost.is_some_and(|max| key.cost >= max) {
                continue;
            }
            let Some(sys) = catalog.system(system) else {
                continue;
            };

            let mut hops: Vec<(SystemId, u32)> = Vec::new();
            if options.hyperdrive {
                hops.extend(sys.links.iter().map(|&link| (link, 1)));
            }
            if options.jump_drive {
                hops.extend(sys.neighbors.iter().map(|&link| (link, 2)));
            }

            for (to, step_cost) in hops {
                if done.contains(&to) || !check_link(knowledge, system, to) {
                    continue;
                }
                let candidate = Entry {
                    cost: key.cost + step_cost,
                    hops: key.hops + 1,
                    danger: key.danger + danger(catalog, to),
                    next: Some(system),
                };
                let better = map
                    .entries
                    .get(&to)
                    .map_or(true, |old| Key::of(&candidate) < Key::of(old));
                if better {
                    map.entries.insert(to, candidate);
                    edge.push(Frontier {
                        key: Key::of(&candidate),
                        system: to,
                    });
                }
            }
        }
        map
    }

    /// Route from `from` toward `to`, searched backward from `to` so that
    /// [`DistanceMap::route`] of any system names its next hop.
    pub fn toward(
        catalog: &Catalog,
        from: SystemId,
        to: SystemId,
        hyperdrive: bool,
        jump_drive: bool,
        knowledge: Option<&PlayerKnowledge>,
    ) -> Self {
        let options = RouteOptions {
            stop_at: Some(from),
            ..RouteOptions::with_drives(hyperdrive, jump_drive)
        };
        Self::new(catalog, to, &options, knowledge)
    }

    pub fn center(&self) -> SystemId {
        self.center
    }

    pub fn has_route(&self, system: SystemId) -> bool {
        self.entries.contains_key(&system)
    }

    /// Hops on the chosen route between the center and `system`.
    pub fn distance(&self, system: SystemId) -> Option<u32> {
        self.entries.get(&system).map(|entry| entry.hops)
    }

    /// Summed edge cost of the chosen route.
    pub fn cost(&self, system: SystemId) -> Option<u32> {
        self.entries.get(&system).map(|entry| entry.cost)
    }

    /// The neighbor of `system` one hop closer to the center.
    pub fn route(&self, system: SystemId) -> Option<SystemId> {
        self.entries.get(&system).and_then(|entry| entry.next)
    }

    /// Systems from `system` to the center, inclusive.
    pub fn path(&self, system: SystemId) -> Vec<SystemId> {
        let mut path = Vec::new();
        if !self.has_route(system) {
            return path;
        }
        let mut current = Some(system);
        while let Some(id) = current {
            path.push(id);
            current = self.route(id);
        }
        path
    }

    /// Every reached system with its cost.
    pub fn costs(&self) -> impl Iterator<Item = (SystemId, u32)> + '_ {
        self.entries.iter().map(|(&id, entry)| (id, entry.cost))
    }
}

fn check_link(knowledge: Option<&PlayerKnowledge>, from: SystemId, to: SystemId) -> bool {
    let Some(player) = knowledge else {
        return true;
    };
    player.has_seen(to) && (player.has_visited(from) || player.has_visited(to))
}

/// Expected hostile traffic: the sum of fleet arrival rates.
fn danger(catalog: &Catalog, system: SystemId) -> f64 {
    catalog.system(system).map_or(0.0, |sys| {
        sys.fleets
            .iter()
            .filter(|fleet| fleet.period > 0)
            .map(|fleet| 1.0 / f64::from(fleet.period))
            .sum()
    })
}
