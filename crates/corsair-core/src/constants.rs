//! Simulation constants and tuning parameters.

/// Ticks per game day, used to advance orbits.
pub const TICKS_PER_DAY: f64 = 3600.0;

// --- Hyperspace ---

/// Ticks spent ramping into (and out of) hyperspace.
pub const HYPER_C: i32 = 100;

/// Hyperspace acceleration in px/tick².
pub const HYPER_A: f64 = 2.0;

/// Extra exit distance from the arrival target.
pub const HYPER_D: f64 = 1000.0;

/// Default fuel cost of a hyperdrive jump.
pub const HYPERDRIVE_FUEL: f64 = 100.0;

/// Default fuel cost of a jump drive jump.
pub const JUMP_DRIVE_FUEL: f64 = 200.0;

/// Map distance within which systems are jump drive neighbors.
pub const JUMP_RANGE: f64 = 100.0;

/// Speed below which a ship may enter hyperspace.
pub const JUMP_SPEED: f64 = 0.1;

/// A ship this far into a jump is no longer targetable.
pub const UNTARGETABLE_HYPERSPACE_COUNT: i32 = 70;

/// Escort offset from the parent is clamped to this length on arrival.
pub const MAX_HYPERSPACE_OFFSET: f64 = 1000.0;

// --- Landing ---

/// Zoom change per tick while landing or taking off.
pub const LANDING_ZOOM_STEP: f64 = 0.02;

/// Fraction of the remaining distance to the planet covered per landing tick.
pub const LANDING_PULL: f64 = 0.03;

/// Maximum speed at which a landing may begin.
pub const LANDING_SPEED: f64 = 2.0;

// --- Ship condition ---

/// Lower bound of the disable threshold as a fraction of max hull.
pub const DISABLE_MIN_FRACTION: f64 = 0.10;

/// Upper bound of the disable threshold as a fraction of max hull.
pub const DISABLE_MAX_FRACTION: f64 = 0.50;

/// Absolute hull value used between the two fractional bounds.
pub const DISABLE_HULL: f64 = 100.0;

/// A disabled ship recovers once hull reaches this multiple of the threshold.
pub const DISABLE_RECOVERY: f64 = 1.05;

/// Maximum heat per unit of mass before overheating.
pub const HEAT_PER_MASS: f64 = 100.0;

/// Overheated ships recover below this fraction of maximum heat.
pub const OVERHEAT_RECOVERY: f64 = 0.9;

/// Passive heat retention per tick.
pub const HEAT_RETENTION: f64 = 0.999;

/// Decay factor of ion, disruption and other status counters.
pub const STATUS_DECAY: f64 = 0.99;

/// Denominator of the per-tick explosion probability of a dying ship.
pub const EXPLOSION_ODDS: u32 = 1024;

/// Default number of explosions before a dead ship is removed.
pub const DEFAULT_EXPLOSIONS: i32 = 10;

// --- Collision ---

/// Cell size of the ship and projectile grid (power of two).
pub const SHIP_CELL_SIZE: u32 = 256;

/// Cells per axis of the ship grid (power of two).
pub const SHIP_CELL_COUNT: u32 = 32;

/// Asteroid field wrap extent.
pub const ASTEROID_WRAP: f64 = 4096.0;

/// Cell size of the asteroid grid.
pub const ASTEROID_CELL_SIZE: u32 = 256;

/// Cells per axis of the asteroid grid.
pub const ASTEROID_CELL_COUNT: u32 = 16;

// --- Projectiles ---

/// Ticks between lock re-evaluations.
pub const LOCK_INTERVAL: i32 = 30;

/// Lifetime marking a projectile that was destroyed rather than expiring.
pub const UNNATURAL_DEATH: i32 = -1000;

/// Default lifetime of dropped flotsam, in ticks.
pub const FLOTSAM_LIFETIME: i32 = 3600;

// --- AI ---

/// Dot product above which a ship counts as facing its goal.
pub const FACING_DOT: f64 = 0.8;

/// Overshoot tolerance of the stopping point before correcting course.
pub const STOPPING_SLACK: f64 = 20.0;

/// Escorts only thrust toward a parent farther than this.
pub const ESCORT_DISTANCE: f64 = 200.0;

/// Default search radius for new targets.
pub const TARGET_SEARCH_RANGE: f64 = 4000.0;

/// Ticks of target motion extrapolated during target selection.
pub const TARGET_LOOKAHEAD: f64 = 60.0;

/// Range bonus given to the current target (stickiness).
pub const TARGET_STICKINESS: f64 = 500.0;

/// Range penalty for targets that are already disabled.
pub const DISABLED_TARGET_PENALTY: f64 = 5000.0;

/// Range penalty for targets with no weapons.
pub const UNARMED_TARGET_PENALTY: f64 = 1000.0;

/// Speed below which a ship counts as stopped.
pub const STOPPED_SPEED: f64 = 0.001;

// --- Spawning ---

/// Distance from the system center at which arriving fleets appear.
pub const FLEET_ENTRY_DISTANCE: f64 = 1000.0;

/// Spread of ships placed near a planet.
pub const PLANET_SPAWN_SPREAD: f64 = 200.0;

// --- Interaction ---

/// Ticks a full-strength scanner needs to finish a scan.
pub const SCAN_TIME: f64 = 60.0;

/// Collision radius of a plain asteroid.
pub const ROCK_RADIUS: f64 = 20.0;

/// Extra slack beyond the sum of radii within which boarding succeeds.
pub const BOARDING_DISTANCE: f64 = 40.0;
