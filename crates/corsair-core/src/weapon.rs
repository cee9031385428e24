//! Immutable weapon definitions.
//!
//! A weapon describes how its projectiles fly, what they cost to fire,
//! the damage they deal, and what they split into. Totals that depend on
//! other weapons (submunition damage, total lifetime) are filled in once
//! the whole catalog is loaded.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::damage::{DamageChannel, DamageVector};
use crate::datanode::DataNode;
use crate::error::Diagnostics;
use crate::geometry::{Angle, Point};
use crate::random::Distribution;
use crate::types::{EffectId, OutfitId};

/// A child weapon spawned when a projectile dies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submunition {
    /// Outfit whose weapon the children use.
    pub weapon: OutfitId,
    pub count: u32,
    /// Spawn offset in the parent's frame.
    pub offset: Point,
    /// Facing relative to the parent.
    pub facing: Angle,
    pub spawn_on_natural_death: bool,
    pub spawn_on_anti_missile_death: bool,
}

/// Effect spawned continuously during a projectile's flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEffect {
    pub effect: EffectId,
    /// Expected occurrences over the projectile's lifetime, as loaded.
    pub per_lifetime: f64,
    /// Per-tick spawn probability: `1 / max(1, lifetime / per_lifetime)`.
    pub chance: f64,
}

/// Resources consumed by one shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FiringCost {
    pub energy: f64,
    pub heat: f64,
    pub fuel: f64,
    pub hull: f64,
    pub shields: f64,
    /// Fractions of the ship's capacities.
    pub relative_energy: f64,
    pub relative_heat: f64,
    pub relative_fuel: f64,
    pub relative_hull: f64,
    pub relative_shields: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub sprite: Option<String>,
    pub sound: Option<String>,
    pub ammo: Option<OutfitId>,
    pub ammo_usage: u32,

    // --- Flight ---
    pub velocity: f64,
    pub random_velocity: f64,
    pub acceleration: f64,
    pub drag: f64,
    /// Degrees per tick.
    pub turn: f64,
    pub lifetime: i32,
    pub random_lifetime: i32,
    pub fade_out: i32,
    pub inaccuracy: f64,
    pub distribution: Distribution,

    // --- Guidance ---
    pub homing: bool,
    pub tracking: f64,
    pub optical_tracking: f64,
    pub infrared_tracking: f64,
    pub radar_tracking: f64,
    pub blindspot: bool,
    pub throttle_control: bool,
    pub leading: bool,

    // --- Firing ---
    pub reload: f64,
    pub burst_reload: f64,
    pub burst_count: u32,
    pub firing: FiringCost,
    pub firing_force: f64,
    pub hardpoint_offset: f64,
    pub turret_turn: f64,
    /// Allowed firing arc relative to the hardpoint's base angle.
    pub arc: Option<(f64, f64)>,
    pub parallel: bool,
    pub stream: bool,
    /// All weapons of this kind fire on the same tick.
    pub cluster: bool,

    // --- Effect on targets ---
    pub damage: DamageVector,
    pub piercing: f64,
    pub blast_radius: f64,
    pub trigger_radius: f64,
    pub split_range: f64,
    pub safe: bool,
    pub phasing: bool,
    pub gravitational: bool,
    pub damage_scaled: bool,
    pub damage_dropoff: Option<(f64, f64)>,
    pub dropoff_modifier: f64,
    pub missile_strength: u32,
    pub anti_missile: u32,
    pub tractor_beam: f64,
    pub penetration_count: u16,
    pub range_override: Option<f64>,

    pub submunitions: Vec<Submunition>,
    pub fire_effects: Vec<(EffectId, u32)>,
    pub hit_effects: Vec<(EffectId, u32)>,
    pub die_effects: Vec<(EffectId, u32)>,
    pub live_effects: Vec<LiveEffect>,

    total_damage: DamageVector,
    total_lifetime: f64,
}

impl Default for Weapon {
    fn default() -> Self {
        Self {
            sprite: None,
            sound: None,
            ammo: None,
            ammo_usage: 1,
            velocity: 0.0,
            random_velocity: 0.0,
            acceleration: 0.0,
            drag: 0.0,
            turn: 0.0,
            lifetime: 0,
            random_lifetime: 0,
            fade_out: 0,
            inaccuracy: 0.0,
            distribution: Distribution::default(),
            homing: false,
            tracking: 0.0,
            optical_tracking: 0.0,
            infrared_tracking: 0.0,
            radar_tracking: 0.0,
            blindspot: false,
            throttle_control: false,
            leading: false,
            reload: 1.0,
            burst_reload: 1.0,
            burst_count: 1,
            firing: FiringCost::default(),
            firing_force: 0.0,
            hardpoint_offset: 0.0,
            turret_turn: 0.0,
            arc: None,
            parallel: false,
            stream: false,
            cluster: false,
            damage: DamageVector::default(),
            piercing: 0.0,
            blast_radius: 0.0,
            trigger_radius: 0.0,
            split_range: 0.0,
            safe: false,
            phasing: false,
            gravitational: false,
            damage_scaled: false,
            damage_dropoff: None,
            dropoff_modifier: 1.0,
            missile_strength: 0,
            anti_missile: 0,
            tractor_beam: 0.0,
            penetration_count: 1,
            range_override: None,
            submunitions: Vec::new(),
            fire_effects: Vec::new(),
            hit_effects: Vec::new(),
            die_effects: Vec::new(),
            live_effects: Vec::new(),
            total_damage: DamageVector::default(),
            total_lifetime: 0.0,
        }
    }
}

impl Weapon {
    /// Parse a `weapon` node. References to other outfits and effects are
    /// registered in the catalog and resolved when loading finishes.
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut weapon = Weapon::default();
        weapon.load_keys(node.children(), catalog, diagnostics);
        weapon
    }

    /// Apply weapon keys from a list of nodes, then re-sanitize.
    pub fn load_keys<'a>(
        &mut self,
        nodes: impl IntoIterator<Item = DataNode<'a>>,
        catalog: &mut Catalog,
        diagnostics: &mut Diagnostics,
    ) {
        let weapon = self;
        let mut saw_burst_reload = false;

        for child in nodes {
            let key = child.key();
            let has_value = child.size() >= 2;
            let value = |diagnostics: &mut Diagnostics| {
                if has_value {
                    child.value(1, diagnostics)
                } else {
                    1.0
                }
            };

            if let Some(channel) = DamageChannel::from_key(key) {
                weapon.damage[channel] = value(diagnostics);
                continue;
            }

            match key {
                "sprite" => weapon.sprite = Some(child.token(1).to_string()),
                "sound" => weapon.sound = Some(child.token(1).to_string()),
                "ammo" => {
                    weapon.ammo = Some(catalog.outfits.id(child.token(1)));
                    if child.size() >= 3 {
                        weapon.ammo_usage = child.value(2, diagnostics).max(1.0) as u32;
                    }
                }
                "velocity" => weapon.velocity = value(diagnostics),
                "random velocity" => weapon.random_velocity = value(diagnostics),
                "acceleration" => weapon.acceleration = value(diagnostics),
                "drag" => weapon.drag = value(diagnostics),
                "turn" => weapon.turn = value(diagnostics),
                "lifetime" => weapon.lifetime = value(diagnostics) as i32,
                "random lifetime" => weapon.random_lifetime = value(diagnostics) as i32,
                "fade out" => weapon.fade_out = value(diagnostics) as i32,
                "inaccuracy" => {
                    weapon.inaccuracy = value(diagnostics);
                    for grand in child.children() {
                        if let Some(kind) = Distribution::from_name(grand.key()) {
                            weapon.distribution.kind = kind;
                        } else if grand.key() == "inclusive" {
                            weapon.distribution.inclusive = true;
                        } else {
                            grand.report_unknown(diagnostics);
                        }
                    }
                }
                "homing" => {
                    weapon.homing = true;
                    for grand in child.children() {
                        match grand.key() {
                            "blindspot" => weapon.blindspot = true,
                            "throttle control" => weapon.throttle_control = true,
                            "leading" => weapon.leading = true,
                            _ => grand.report_unknown(diagnostics),
                        }
                    }
                }
                "blindspot" => weapon.blindspot = true,
                "throttle control" => weapon.throttle_control = true,
                "leading" => weapon.leading = true,
                "tracking" => weapon.tracking = value(diagnostics),
                "optical tracking" => weapon.optical_tracking = value(diagnostics),
                "infrared tracking" => weapon.infrared_tracking = value(diagnostics),
                "radar tracking" => weapon.radar_tracking = value(diagnostics),
                "reload" => weapon.reload = value(diagnostics),
                "burst reload" => {
                    weapon.burst_reload = value(diagnostics);
                    saw_burst_reload = true;
                }
                "burst count" => weapon.burst_count = value(diagnostics).max(0.0) as u32,
                "firing energy" => weapon.firing.energy = value(diagnostics),
                "firing heat" => weapon.firing.heat = value(diagnostics),
                "firing fuel" => weapon.firing.fuel = value(diagnostics),
                "firing hull" => weapon.firing.hull = value(diagnostics),
                "firing shields" => weapon.firing.shields = value(diagnostics),
                "relative firing energy" => weapon.firing.relative_energy = value(diagnostics),
                "relative firing heat" => weapon.firing.relative_heat = value(diagnostics),
                "relative firing fuel" => weapon.firing.relative_fuel = value(diagnostics),
                "relative firing hull" => weapon.firing.relative_hull = value(diagnostics),
                "relative firing shields" => weapon.firing.relative_shields = value(diagnostics),
                "firing force" => weapon.firing_force = value(diagnostics),
                "hardpoint offset" => weapon.hardpoint_offset = value(diagnostics),
                "turret turn" => weapon.turret_turn = value(diagnostics),
                "arc" => {
                    let first = value(diagnostics);
                    let (min, max) = if child.size() >= 3 {
                        let second = child.value(2, diagnostics);
                        (first.min(second), first.max(second))
                    } else {
                        (-first.abs(), first.abs())
                    };
                    weapon.arc = Some((min.max(-180.0), max.min(180.0)));
                }
                "parallel" => weapon.parallel = true,
                "stream" => weapon.stream = true,
                "cluster" => weapon.cluster = true,
                "piercing" => weapon.piercing = value(diagnostics),
                "blast radius" => weapon.blast_radius = value(diagnostics),
                "trigger radius" => weapon.trigger_radius = value(diagnostics),
                "split range" => weapon.split_range = value(diagnostics),
                "safe" => weapon.safe = true,
                "phasing" => weapon.phasing = true,
                "gravitational" => weapon.gravitational = true,
                "damage scaled" | "damage scaling" => weapon.damage_scaled = true,
                "damage dropoff" => {
                    let min = child.value(1, diagnostics);
                    let max = if child.size() >= 3 {
                        child.value(2, diagnostics)
                    } else {
                        min
                    };
                    weapon.damage_dropoff = Some((min.max(0.0), max.max(min.max(0.0))));
                }
                "dropoff modifier" => weapon.dropoff_modifier = value(diagnostics),
                "missile strength" => weapon.missile_strength = value(diagnostics).max(0.0) as u32,
                "anti-missile" => weapon.anti_missile = value(diagnostics).max(0.0) as u32,
                "tractor beam" => weapon.tractor_beam = value(diagnostics),
                "penetration count" => {
                    weapon.penetration_count = value(diagnostics).clamp(1.0, u16::MAX as f64) as u16
                }
                "range override" => weapon.range_override = Some(value(diagnostics)),
                "submunition" => {
                    let mut sub = Submunition {
                        weapon: catalog.outfits.id(child.token(1)),
                        count: if child.size() >= 3 {
                            child.value(2, diagnostics).max(0.0) as u32
                        } else {
                            1
                        },
                        offset: Point::ZERO,
                        facing: Angle::default(),
                        spawn_on_natural_death: true,
                        spawn_on_anti_missile_death: false,
                    };
                    for grand in child.children() {
                        match grand.key() {
                            "facing" => sub.facing = Angle::new(grand.value(1, diagnostics)),
                            "offset" => {
                                sub.offset = Point::new(
                                    grand.value(1, diagnostics),
                                    grand.value(2, diagnostics),
                                )
                            }
                            key @ ("spawn on" | "spawn") => {
                                // Accepts both `"spawn on" natural` and `spawn on natural`.
                                let skip = if key == "spawn" { 2 } else { 1 };
                                sub.spawn_on_natural_death = false;
                                for token in grand.tokens().iter().skip(skip) {
                                    match token.as_str() {
                                        "natural" => sub.spawn_on_natural_death = true,
                                        "anti-missile" => sub.spawn_on_anti_missile_death = true,
                                        _ => grand.report_unknown(diagnostics),
                                    }
                                }
                            }
                            _ => grand.report_unknown(diagnostics),
                        }
                    }
                    weapon.submunitions.push(sub);
                }
                "fire effect" | "hit effect" | "die effect" => {
                    let effect = catalog.effects.id(child.token(1));
                    let count = if child.size() >= 3 {
                        child.value(2, diagnostics).max(0.0) as u32
                    } else {
                        1
                    };
                    let list = match key {
                        "fire effect" => &mut weapon.fire_effects,
                        "hit effect" => &mut weapon.hit_effects,
                        _ => &mut weapon.die_effects,
                    };
                    list.push((effect, count));
                }
                "live effect" => {
                    let effect = catalog.effects.id(child.token(1));
                    let per_lifetime = if child.size() >= 3 {
                        child.value(2, diagnostics)
                    } else {
                        1.0
                    };
                    weapon.live_effects.push(LiveEffect {
                        effect,
                        per_lifetime,
                        chance: 0.0,
                    });
                }
                _ => child.report_unknown(diagnostics),
            }
        }

        weapon.sanitize(saw_burst_reload);
    }

    /// Clamp loaded values into their valid ranges.
    pub fn sanitize(&mut self, explicit_burst_reload: bool) {
        self.lifetime = self.lifetime.max(0);
        self.random_lifetime = self.random_lifetime.max(0);
        self.reload = self.reload.max(1.0);
        self.burst_count = self.burst_count.max(1);
        if !explicit_burst_reload && self.burst_count == 1 {
            self.burst_reload = self.reload;
        }
        self.burst_reload = self.burst_reload.clamp(1.0, self.reload);
        self.tracking = self.tracking.clamp(0.0, 1.0);
        self.optical_tracking = self.optical_tracking.clamp(0.0, 1.0);
        self.infrared_tracking = self.infrared_tracking.clamp(0.0, 1.0);
        self.radar_tracking = self.radar_tracking.clamp(0.0, 1.0);
        self.piercing = self.piercing.clamp(0.0, 1.0);
        self.penetration_count = self.penetration_count.max(1);
        for channel in DamageChannel::ALL {
            self.damage[channel] = self.damage[channel].max(0.0);
        }
        // Legacy homing with no tracking type locks perfectly.
        if self.homing
            && self.tracking == 0.0
            && self.optical_tracking == 0.0
            && self.infrared_tracking == 0.0
            && self.radar_tracking == 0.0
        {
            self.tracking = 1.0;
        }
        let lifetime = f64::from(self.lifetime.max(1));
        for live in &mut self.live_effects {
            live.chance = if live.per_lifetime > 0.0 {
                1.0 / (lifetime / live.per_lifetime).max(1.0)
            } else {
                0.0
            };
        }
        self.total_damage = self.damage;
        self.total_lifetime = f64::from(self.lifetime);
    }

    /// Record totals that include submunitions (computed by the catalog).
    pub fn set_totals(&mut self, total_damage: DamageVector, total_lifetime: f64) {
        self.total_damage = total_damage;
        self.total_lifetime = total_lifetime;
    }

    /// Own damage plus `count · TotalDamage` of every submunition.
    pub fn total_damage(&self, channel: DamageChannel) -> f64 {
        self.total_damage[channel]
    }

    pub fn total_damage_vector(&self) -> &DamageVector {
        &self.total_damage
    }

    /// Lifetime including the longest submunition chain.
    pub fn total_lifetime(&self) -> f64 {
        self.total_lifetime
    }

    /// Maximum distance a shot can reach.
    pub fn range(&self) -> f64 {
        self.range_override
            .unwrap_or(self.velocity * self.total_lifetime)
    }

    pub fn is_homing(&self) -> bool {
        self.homing
    }

    /// Anti-missile and tractor beams are fired by the sweep, not the
    /// regular firing loop.
    pub fn is_special(&self) -> bool {
        self.anti_missile > 0 || self.tractor_beam > 0.0
    }

    pub fn does_damage(&self) -> bool {
        self.total_damage.does_damage()
    }

    /// Damage multiplier for a projectile that has traveled `distance`.
    pub fn dropoff(&self, distance: f64) -> f64 {
        let Some((min, max)) = self.damage_dropoff else {
            return 1.0;
        };
        if distance <= min {
            1.0
        } else if distance >= max {
            self.dropoff_modifier
        } else {
            1.0 + (self.dropoff_modifier - 1.0) * (distance - min) / (max - min)
        }
    }

    /// Number of shots fired per second, for display and AI weighting.
    pub fn shots_per_second(&self) -> f64 {
        let period = self.reload.max(self.burst_reload * self.burst_count as f64);
        60.0 * self.burst_count as f64 / period
    }
}
