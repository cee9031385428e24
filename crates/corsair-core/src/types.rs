//! Fundamental identifier and time types.

use serde::{Deserialize, Serialize};

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

catalog_id!(
    /// Index of an outfit in the catalog.
    OutfitId
);
catalog_id!(
    /// Index of a ship model in the catalog.
    ShipModelId
);
catalog_id!(
    /// Index of a fleet definition.
    FleetId
);
catalog_id!(
    /// Index of a star system.
    SystemId
);
catalog_id!(
    /// Index of a planet definition.
    PlanetId
);
catalog_id!(
    /// Index of a government.
    GovernmentId
);
catalog_id!(
    /// Index of a visual effect definition.
    EffectId
);
catalog_id!(
    /// Index of a hazard definition.
    HazardId
);
catalog_id!(
    /// Index of a minable asteroid definition.
    MinableId
);

/// Opaque handle of a live simulation entity, as exposed in events.
///
/// The simulation maps these to ECS entities; a stale handle simply
/// resolves to nothing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityRef(pub u64);

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Game date in days; drives stellar orbits.
    pub day: f64,
}

impl SimTime {
    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.day += 1.0 / crate::constants::TICKS_PER_DAY;
    }
}
