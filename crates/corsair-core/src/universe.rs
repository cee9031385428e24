//! Star systems, their stellar objects and planets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::datanode::DataNode;
use crate::error::Diagnostics;
use crate::geometry::{Angle, Point};
use crate::types::{FleetId, GovernmentId, HazardId, MinableId, PlanetId, SystemId};

/// A body orbiting in a system. Positions are a pure function of the date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StellarObject {
    pub sprite: Option<String>,
    pub planet: Option<PlanetId>,
    /// Index of the parent object, if this one orbits another object.
    pub parent: Option<usize>,
    pub distance: f64,
    /// Degrees per day.
    pub speed: f64,
    /// Starting phase in degrees.
    pub offset: f64,
    pub radius: f64,
    pub is_star: bool,
    /// Cached by [`System::set_date`].
    pub position: Point,
}

/// A periodic spawn source, with `1 / period` chance per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Periodic<T> {
    pub item: T,
    pub period: u32,
}

/// An asteroid belt entry: plain rocks by name, or a minable type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AsteroidSpec {
    Rock { name: String, count: u32, energy: f64 },
    Minable { minable: MinableId, count: u32, energy: f64 },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub name: String,
    /// Map coordinates.
    pub position: Point,
    pub government: Option<GovernmentId>,
    /// Hyperlanes.
    pub links: Vec<SystemId>,
    /// Systems reachable by jump drive, links included.
    pub neighbors: Vec<SystemId>,
    pub objects: Vec<StellarObject>,
    pub fleets: Vec<Periodic<FleetId>>,
    pub hazards: Vec<Periodic<HazardId>>,
    pub asteroids: Vec<AsteroidSpec>,
    pub belt: f64,
    pub jump_range: f64,
    pub commodity_prices: BTreeMap<String, i32>,
    pub starfield_density: f64,
}

impl System {
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut system = System {
            name: node.token(1).to_string(),
            belt: 1500.0,
            starfield_density: 1.0,
            ..Default::default()
        };
        for child in node.children() {
            let count = |diagnostics: &mut Diagnostics, index| {
                if child.size() > index {
                    child.value(index, diagnostics).max(1.0) as u32
                } else {
                    1
                }
            };
            match child.key() {
                "pos" if child.size() >= 3 => {
                    system.position =
                        Point::new(child.value(1, diagnostics), child.value(2, diagnostics));
                }
                "government" => system.government = Some(catalog.governments.id(child.token(1))),
                "link" => {
                    let link = catalog.systems.id(child.token(1));
                    if !system.links.contains(&link) {
                        system.links.push(link);
                    }
                }
                "fleet" => {
                    let item = catalog.fleets.id(child.token(1));
                    let period = count(diagnostics, 2);
                    system.fleets.push(Periodic { item, period });
                }
                "hazard" => {
                    let item = catalog.hazards.id(child.token(1));
                    let period = count(diagnostics, 2);
                    system.hazards.push(Periodic { item, period });
                }
                "asteroids" if child.size() >= 4 => system.asteroids.push(AsteroidSpec::Rock {
                    name: child.token(1).to_string(),
                    count: child.value(2, diagnostics).max(0.0) as u32,
                    energy: child.value(3, diagnostics),
                }),
                "minables" if child.size() >= 4 => {
                    let minable = catalog.minables.id(child.token(1));
                    system.asteroids.push(AsteroidSpec::Minable {
                        minable,
                        count: child.value(2, diagnostics).max(0.0) as u32,
                        energy: child.value(3, diagnostics),
                    });
                }
                "belt" => system.belt = child.value(1, diagnostics),
                "jump range" => system.jump_range = child.value(1, diagnostics).max(0.0),
                "trade" if child.size() >= 3 => {
                    let price = child.value(2, diagnostics) as i32;
                    system.commodity_prices.insert(child.token(1).to_string(), price);
                }
                "starfield density" => system.starfield_density = child.value(1, diagnostics),
                "object" => system.load_object(child, None, catalog, diagnostics),
                "music" | "habitable" | "haze" | "arrival" | "departure" | "attributes" => {}
                _ => child.report_unknown(diagnostics),
            }
        }
        system
    }

    fn load_object(
        &mut self,
        node: DataNode<'_>,
        parent: Option<usize>,
        catalog: &mut Catalog,
        diagnostics: &mut Diagnostics,
    ) {
        let index = self.objects.len();
        let mut object = StellarObject {
            parent,
            radius: 100.0,
            ..Default::default()
        };
        if node.size() >= 2 {
            object.planet = Some(catalog.planets.id(node.token(1)));
        }
        self.objects.push(object);

        for child in node.children() {
            let object = &mut self.objects[index];
            match child.key() {
                "sprite" => {
                    let sprite = child.token(1);
                    object.is_star = sprite.starts_with("star/");
                    object.sprite = Some(sprite.to_string());
                }
                "distance" => object.distance = child.value(1, diagnostics),
                "period" => {
                    let period = child.value(1, diagnostics);
                    object.speed = if period != 0.0 { 360.0 / period } else { 0.0 };
                }
                "offset" => object.offset = child.value(1, diagnostics),
                "radius" => object.radius = child.value(1, diagnostics).max(0.0),
                "object" => self.load_object(child, Some(index), catalog, diagnostics),
                _ => child.report_unknown(diagnostics),
            }
        }
    }

    /// Move every object to its orbital position on `day`. Parents always
    /// precede their children, so one pass suffices.
    pub fn set_date(&mut self, day: f64) {
        for i in 0..self.objects.len() {
            let object = &self.objects[i];
            let angle = Angle::new(day * object.speed + object.offset);
            let mut position = angle.unit() * object.distance;
            if let Some(parent) = object.parent {
                position += self.objects[parent].position;
            }
            self.objects[i].position = position;
        }
    }

    /// Index of the stellar object for `planet`.
    pub fn find_stellar(&self, planet: PlanetId) -> Option<&StellarObject> {
        self.objects.iter().find(|o| o.planet == Some(planet))
    }

    pub fn is_linked(&self, other: SystemId) -> bool {
        self.links.contains(&other)
    }

    pub fn is_neighbor(&self, other: SystemId) -> bool {
        self.neighbors.contains(&other)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    pub system: Option<SystemId>,
    pub government: Option<GovernmentId>,
    pub has_spaceport: bool,
    pub inhabited: bool,
    pub landable: bool,
}

impl Planet {
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut planet = Planet {
            name: node.token(1).to_string(),
            landable: true,
            ..Default::default()
        };
        let mut uninhabited = false;
        for child in node.children() {
            match child.key() {
                "spaceport" => planet.has_spaceport = true,
                "government" => planet.government = Some(catalog.governments.id(child.token(1))),
                "attributes" => {
                    for token in &child.tokens()[1..] {
                        match token.as_str() {
                            "uninhabited" => uninhabited = true,
                            "unlandable" => planet.landable = false,
                            _ => {}
                        }
                    }
                }
                "landscape" | "music" | "description" | "shipyard" | "outfitter"
                | "required reputation" | "bribe" | "security" | "tribute" => {}
                _ => child.report_unknown(diagnostics),
            }
        }
        planet.inhabited = planet.has_spaceport && !uninhabited;
        planet
    }
}

/// Where and how a new pilot begins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartConditions {
    pub name: String,
    pub system: Option<SystemId>,
    pub planet: Option<PlanetId>,
    pub day: f64,
    pub government: Option<GovernmentId>,
    pub ships: Vec<crate::types::ShipModelId>,
    pub credits: i64,
}

impl StartConditions {
    pub fn load(node: DataNode<'_>, catalog: &mut Catalog, diagnostics: &mut Diagnostics) -> Self {
        let mut start = StartConditions {
            name: node.token(1).to_string(),
            ..Default::default()
        };
        for child in node.children() {
            match child.key() {
                "system" => start.system = Some(catalog.systems.id(child.token(1))),
                "planet" => start.planet = Some(catalog.planets.id(child.token(1))),
                "date" => start.day = child.value(1, diagnostics),
                "government" => start.government = Some(catalog.governments.id(child.token(1))),
                "ship" => start.ships.push(catalog.ships.id(child.token(1))),
                "account" | "credits" => start.credits = child.value(1, diagnostics) as i64,
                "name" | "description" | "thumbnail" | "conversation" | "conditions" => {}
                _ => child.report_unknown(diagnostics),
            }
        }
        start
    }
}
