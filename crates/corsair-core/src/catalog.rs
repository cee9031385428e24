//! The immutable content catalog the simulation runs against.
//!
//! Content refers to other content by name, often before the referenced
//! object has been defined. Each [`Registry`] hands out a stable id the
//! first time a name is seen; [`Catalog::finish`] then reports names that
//! were never defined and fills them with placeholders, so lookups after
//! loading never fail.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::constants::JUMP_RANGE;
use crate::damage::DamageVector;
use crate::datanode::{DataFile, DataNode};
use crate::effect::Effect;
use crate::error::{ContentError, ContentIssue, Diagnostics};
use crate::fleet::Fleet;
use crate::government::{Government, Politics};
use crate::hazard::{Hazard, MinableDef};
use crate::outfit::Outfit;
use crate::ship_model::ShipModel;
use crate::types::{
    EffectId, FleetId, GovernmentId, HazardId, MinableId, OutfitId, PlanetId, ShipModelId, SystemId,
};
use crate::universe::{Planet, StartConditions, System};
use crate::weapon::Weapon;

/// A typed index into one [`Registry`].
pub trait CatalogId: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

macro_rules! impl_catalog_id {
    ($($name:ident),*) => {
        $(impl CatalogId for $name {
            fn from_index(index: usize) -> Self {
                $name(index as u32)
            }
            fn index(self) -> usize {
                self.0 as usize
            }
        })*
    };
}

impl_catalog_id!(
    OutfitId,
    ShipModelId,
    FleetId,
    SystemId,
    PlanetId,
    GovernmentId,
    EffectId,
    HazardId,
    MinableId
);

/// Named objects of one kind, addressed by a dense id.
#[derive(Debug, Clone)]
pub struct Registry<I, T> {
    kind: &'static str,
    names: Vec<String>,
    items: Vec<Option<T>>,
    lookup: HashMap<String, usize>,
    _id: PhantomData<I>,
}

impl<I: CatalogId, T> Registry<I, T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            names: Vec::new(),
            items: Vec::new(),
            lookup: HashMap::new(),
            _id: PhantomData,
        }
    }

    /// Id for `name`, reserving a slot if the name is new.
    pub fn id(&mut self, name: &str) -> I {
        if let Some(&index) = self.lookup.get(name) {
            return I::from_index(index);
        }
        let index = self.names.len();
        self.names.push(name.to_string());
        self.items.push(None);
        self.lookup.insert(name.to_string(), index);
        I::from_index(index)
    }

    /// Id for `name` without reserving anything.
    pub fn find(&self, name: &str) -> Option<I> {
        self.lookup.get(name).map(|&index| I::from_index(index))
    }

    /// Define (or redefine) the object called `name`.
    pub fn define(&mut self, name: &str, item: T) -> I {
        let id = self.id(name);
        self.items[id.index()] = Some(item);
        id
    }

    pub fn get(&self, id: I) -> Option<&T> {
        self.items.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.items.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn by_name(&self, name: &str) -> Option<&T> {
        self.find(name).and_then(|id| self.get(id))
    }

    pub fn name(&self, id: I) -> &str {
        self.names.get(id.index()).map_or("", String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Defined objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| item.as_ref().map(|item| (I::from_index(index), item)))
    }

    /// Report each referenced-but-undefined name and substitute a
    /// placeholder built from its name.
    fn fill_placeholders(&mut self, diagnostics: &mut Diagnostics, placeholder: impl Fn(&str) -> T) {
        for (index, item) in self.items.iter_mut().enumerate() {
            if item.is_none() {
                let name = &self.names[index];
                diagnostics.report(ContentIssue::global(ContentError::UnknownReference {
                    kind: self.kind,
                    name: name.clone(),
                }));
                *item = Some(placeholder(name));
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Everything loaded from the data directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub outfits: Registry<OutfitId, Outfit>,
    pub ships: Registry<ShipModelId, ShipModel>,
    pub fleets: Registry<FleetId, Fleet>,
    pub systems: Registry<SystemId, System>,
    pub planets: Registry<PlanetId, Planet>,
    pub governments: Registry<GovernmentId, Government>,
    pub effects: Registry<EffectId, Effect>,
    pub hazards: Registry<HazardId, Hazard>,
    pub minables: Registry<MinableId, MinableDef>,
    pub starts: Vec<StartConditions>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            outfits: Registry::new("outfit"),
            ships: Registry::new("ship"),
            fleets: Registry::new("fleet"),
            systems: Registry::new("system"),
            planets: Registry::new("planet"),
            governments: Registry::new("government"),
            effects: Registry::new("effect"),
            hazards: Registry::new("hazard"),
            minables: Registry::new("minable"),
            starts: Vec::new(),
        }
    }

    /// Load every `.txt` file under `root`, in sorted path order, then
    /// finish. Content problems are returned alongside the catalog; only an
    /// unreadable directory is an error.
    pub fn load_dir(root: &Path) -> Result<(Catalog, Vec<ContentIssue>), ContentError> {
        let mut files = Vec::new();
        collect_files(root, &mut files)?;
        files.sort();

        let mut catalog = Catalog::new();
        let mut diagnostics = Diagnostics::new();
        for path in &files {
            let file = DataFile::load(path, &mut diagnostics)?;
            catalog.load_file(&file, &mut diagnostics);
        }
        catalog.finish(&mut diagnostics);
        log::info!(
            "loaded {} files: {} outfits, {} ships, {} systems ({} issues)",
            files.len(),
            catalog.outfits.len(),
            catalog.ships.len(),
            catalog.systems.len(),
            diagnostics.len()
        );
        Ok((catalog, diagnostics.into_issues()))
    }

    /// Parse content from a string. Call [`Catalog::finish`] afterwards.
    pub fn load_text(&mut self, name: &str, text: &str, diagnostics: &mut Diagnostics) {
        let file = DataFile::parse(name, text, diagnostics);
        self.load_file(&file, diagnostics);
    }

    pub fn load_file(&mut self, file: &DataFile, diagnostics: &mut Diagnostics) {
        for node in file.roots() {
            self.load_node(node, diagnostics);
        }
    }

    /// Dispatch one top-level node by its key.
    pub fn load_node(&mut self, node: DataNode<'_>, diagnostics: &mut Diagnostics) {
        let key = node.key();
        if key != "start" && node.size() < 2 {
            diagnostics.report(node.issue(ContentError::MissingValue {
                key: key.to_string(),
            }));
            return;
        }
        let name = node.token(1);
        match key {
            "outfit" => {
                let outfit = Outfit::load(node, self, diagnostics);
                self.outfits.define(name, outfit);
            }
            "ship" => {
                let model = ShipModel::load(node, self, diagnostics);
                // `ship "<base>" "<variant>"` defines a named variant.
                let name = if node.size() >= 3 { node.token(2) } else { name };
                self.ships.define(name, model);
            }
            "fleet" => {
                let fleet = Fleet::load(node, self, diagnostics);
                self.fleets.define(name, fleet);
            }
            "system" => {
                let system = System::load(node, self, diagnostics);
                self.systems.define(name, system);
            }
            "planet" => {
                let planet = Planet::load(node, self, diagnostics);
                self.planets.define(name, planet);
            }
            "government" => {
                let gov = Government::load(node, self, diagnostics);
                self.governments.define(name, gov);
            }
            "effect" => {
                let effect = Effect::load(node, diagnostics);
                self.effects.define(name, effect);
            }
            "hazard" => {
                let hazard = Hazard::load(node, self, diagnostics);
                self.hazards.define(name, hazard);
            }
            "minable" => {
                let minable = MinableDef::load(node, self, diagnostics);
                self.minables.define(name, minable);
            }
            "start" => {
                let start = StartConditions::load(node, self, diagnostics);
                self.starts.push(start);
            }
            "mission" | "event" | "phrase" | "news" | "person" | "conversation" | "interface"
            | "color" | "galaxy" | "trade" | "landing message" | "star" | "test" | "test-data"
            | "substitutions" | "wormhole" | "category" | "gamerules" => {}
            _ => node.report_unknown(diagnostics),
        }
    }

    /// Resolve cross references once all content is loaded.
    pub fn finish(&mut self, diagnostics: &mut Diagnostics) {
        self.outfits.fill_placeholders(diagnostics, |name| Outfit {
            name: name.to_string(),
            ..Default::default()
        });
        self.ships.fill_placeholders(diagnostics, |name| ShipModel {
            name: name.to_string(),
            ..Default::default()
        });
        self.fleets.fill_placeholders(diagnostics, |name| Fleet {
            name: name.to_string(),
            ..Default::default()
        });
        self.systems.fill_placeholders(diagnostics, |name| System {
            name: name.to_string(),
            ..Default::default()
        });
        self.planets.fill_placeholders(diagnostics, |name| Planet {
            name: name.to_string(),
            ..Default::default()
        });
        self.governments.fill_placeholders(diagnostics, |name| Government {
            name: name.to_string(),
            ..Default::default()
        });
        self.effects.fill_placeholders(diagnostics, |name| Effect {
            name: name.to_string(),
            ..Default::default()
        });
        self.hazards.fill_placeholders(diagnostics, |name| Hazard {
            name: name.to_string(),
            ..Default::default()
        });
        self.minables.fill_placeholders(diagnostics, |name| MinableDef {
            name: name.to_string(),
            ..Default::default()
        });

        self.resolve_weapons(diagnostics);
        self.update_neighbors();
        self.assign_planets();
        self.mark_player_government();
    }

    /// Break submunition cycles, then cache each weapon's totals.
    fn resolve_weapons(&mut self, diagnostics: &mut Diagnostics) {
        let count = self.outfits.len();
        let mut state = vec![Visit::New; count];
        let mut totals = vec![(DamageVector::default(), 0.0); count];
        let mut broken = Vec::new();
        for index in 0..count {
            self.visit_weapon(index, &mut state, &mut totals, &mut broken, diagnostics);
        }

        broken.sort_unstable();
        for &(index, sub) in broken.iter().rev() {
            if let Some(weapon) = self.weapon_mut(OutfitId(index as u32)) {
                weapon.submunitions.remove(sub);
            }
        }
        for (index, (damage, lifetime)) in totals.into_iter().enumerate() {
            if let Some(weapon) = self.weapon_mut(OutfitId(index as u32)) {
                weapon.set_totals(damage, lifetime);
            }
        }
    }

    fn visit_weapon(
        &self,
        index: usize,
        state: &mut [Visit],
        totals: &mut [(DamageVector, f64)],
        broken: &mut Vec<(usize, usize)>,
        diagnostics: &mut Diagnostics,
    ) {
        if state[index] != Visit::New {
            return;
        }
        state[index] = Visit::Active;
        let id = OutfitId(index as u32);
        let Some(weapon) = self.weapon(id) else {
            state[index] = Visit::Done;
            return;
        };

        let mut damage = weapon.damage;
        let mut longest_child = 0.0_f64;
        for (slot, sub) in weapon.submunitions.iter().enumerate() {
            let child = sub.weapon.index();
            if state[child] == Visit::Active {
                diagnostics.report(ContentIssue::global(ContentError::SubmunitionCycle {
                    weapon: self.outfits.name(id).to_string(),
                }));
                broken.push((index, slot));
                continue;
            }
            self.visit_weapon(child, state, totals, broken, diagnostics);
            if self.weapon(sub.weapon).is_some() {
                let (child_damage, child_lifetime) = totals[child];
                damage += child_damage * f64::from(sub.count);
                longest_child = longest_child.max(child_lifetime);
            }
        }
        totals[index] = (damage, f64::from(weapon.lifetime) + longest_child);
        state[index] = Visit::Done;
    }

    /// Links are always neighbors; other systems are neighbors within
    /// jump range.
    fn update_neighbors(&mut self) {
        let positions: Vec<(SystemId, glam::DVec2)> = self
            .systems
            .iter()
            .map(|(id, system)| (id, system.position))
            .collect();
        for (id, _) in positions.iter().copied() {
            let Some(system) = self.systems.get_mut(id) else {
                continue;
            };
            let range = if system.jump_range > 0.0 {
                system.jump_range
            } else {
                JUMP_RANGE
            };
            let mut neighbors = system.links.clone();
            for &(other, position) in &positions {
                if other != id
                    && !neighbors.contains(&other)
                    && position.distance(system.position) <= range
                {
                    neighbors.push(other);
                }
            }
            neighbors.sort_unstable();
            system.neighbors = neighbors;
        }
    }

    fn assign_planets(&mut self) {
        let mut owners = Vec::new();
        for (system_id, system) in self.systems.iter() {
            for object in &system.objects {
                if let Some(planet) = object.planet {
                    owners.push((planet, system_id));
                }
            }
        }
        for (planet, system) in owners {
            if let Some(planet) = self.planets.get_mut(planet) {
                planet.system = Some(system);
            }
        }
    }

    fn mark_player_government(&mut self) {
        let player = self.starts.first().and_then(|start| start.government);
        if let Some(gov) = player.and_then(|id| self.governments.get_mut(id)) {
            gov.is_player = true;
        }
    }

    // --- Convenience accessors ---

    pub fn outfit(&self, id: OutfitId) -> Option<&Outfit> {
        self.outfits.get(id)
    }

    pub fn weapon(&self, id: OutfitId) -> Option<&Weapon> {
        self.outfits.get(id).and_then(|outfit| outfit.weapon.as_ref())
    }

    fn weapon_mut(&mut self, id: OutfitId) -> Option<&mut Weapon> {
        self.outfits.get_mut(id).and_then(|outfit| outfit.weapon.as_mut())
    }

    pub fn ship(&self, id: ShipModelId) -> Option<&ShipModel> {
        self.ships.get(id)
    }

    pub fn system(&self, id: SystemId) -> Option<&System> {
        self.systems.get(id)
    }

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(id)
    }

    /// Government attitudes in id order, ready for the simulation.
    pub fn politics(&self) -> Politics {
        let governments = (0..self.governments.len())
            .map(|index| {
                self.governments
                    .get(GovernmentId(index as u32))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        Politics::new(governments)
    }

    // --- Programmatic content ---

    pub fn add_outfit(&mut self, outfit: Outfit) -> OutfitId {
        let name = outfit.name.clone();
        self.outfits.define(&name, outfit)
    }

    pub fn add_ship(&mut self, model: ShipModel) -> ShipModelId {
        let name = model.name.clone();
        self.ships.define(&name, model)
    }

    pub fn add_fleet(&mut self, fleet: Fleet) -> FleetId {
        let name = fleet.name.clone();
        self.fleets.define(&name, fleet)
    }

    pub fn add_system(&mut self, system: System) -> SystemId {
        let name = system.name.clone();
        self.systems.define(&name, system)
    }

    pub fn add_planet(&mut self, planet: Planet) -> PlanetId {
        let name = planet.name.clone();
        self.planets.define(&name, planet)
    }

    pub fn add_government(&mut self, government: Government) -> GovernmentId {
        let name = government.name.clone();
        self.governments.define(&name, government)
    }

    pub fn add_hazard(&mut self, hazard: Hazard) -> HazardId {
        let name = hazard.name.clone();
        self.hazards.define(&name, hazard)
    }

    pub fn add_minable(&mut self, minable: MinableDef) -> MinableId {
        let name = minable.name.clone();
        self.minables.define(&name, minable)
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ContentError> {
    let io_error = |err: std::io::Error| ContentError::Io {
        path: dir.display().to_string(),
        message: err.to_string(),
    };
    for entry in std::fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            out.push(path);
        }
    }
    Ok(())
}
