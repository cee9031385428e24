//! Tests for the simulation engine, the tick pipeline, and ship interaction.

use std::collections::BTreeSet;
use std::sync::Arc;

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use corsair_core::body::Body;
use corsair_core::catalog::Catalog;
use corsair_core::command::Command;
use corsair_core::error::Diagnostics;
use corsair_core::events::ShipEventKind;
use corsair_core::geometry::{Angle, Point};
use corsair_core::state::GameStateSnapshot;
use corsair_core::types::{GovernmentId, SystemId};
use corsair_core::weapon::Weapon;

use crate::cargo::{Contents, Flotsam};
use crate::engine::{SimConfig, SimulationEngine};
use crate::hardpoint::Hardpoint;
use crate::projectile::Projectile;
use crate::ship::Ship;
use crate::systems::collision::Grids;
use crate::systems::{cleanup, interaction, Frame};
use crate::world::{entity_ref, Serials};
use crate::world_setup;

const CONTENT: &str = r#"
outfit "Laser"
	weapon
		velocity 10
		lifetime 100
		"hull damage" 5

outfit "Pellet"
	weapon
		velocity 4
		lifetime 60
		"hull damage" 1

outfit "Scatter Rocket"
	weapon
		velocity 1
		lifetime 10
		"split range" 50
		"missile strength" 10
		"hull damage" 1
		submunition "Pellet" 3
			facing -30
		submunition "Pellet" 3
		submunition "Pellet" 3
			facing 30

outfit "Sidewinder"
	weapon
		velocity 5
		lifetime 300
		"missile strength" 1
		"hull damage" 10

outfit "Point Defense"
	category "Turrets"
	weapon
		velocity 300
		"anti-missile" 1000

hazard "Flare"
	period 1
	duration 30
	strength 1
	range 0 1000
	"constant strength"
	"hull damage" 1

ship "Hulk"
	attributes
		mass 100
		drag 1
		hull 100
		"cargo space" 10
		"cargo scan power" 4
	mask 20

ship "Picket"
	attributes
		mass 100
		drag 1
		hull 100
	outfits
		"Point Defense" 1
	turret 0 0 "Point Defense"
	mask 20

ship "Raider"
	attributes
		mass 100
		drag 5
		hull 300
		shields 200
		thrust 4
		turn 5
	outfits
		"Laser" 2
	gun -6 -20 "Laser"
	gun 6 -20 "Laser"
	mask 20

government "Merchant"
	"attitude toward"
		"Pirate" -1

government "Pirate"
	"attitude toward"
		"Merchant" -1

fleet "Raiders"
	government "Pirate"
	variant
		"Raider" 3

system "Haven"
	pos 0 0
	government "Merchant"
	link "Outpost"
	fleet "Raiders" 100
	trade "Food" 100

system "Outpost"
	pos 500 0
	link "Haven"

system "Quiet"
	pos 0 -500

system "Storm"
	pos 0 500
	belt 1
	hazard "Flare" 1

start
	system "Haven"
	government "Merchant"
	ship "Raider"
	ship "Hulk"
"#;

fn catalog() -> Arc<Catalog> {
    let mut catalog = Catalog::new();
    let mut diagnostics = Diagnostics::new();
    catalog.load_text("test.txt", CONTENT, &mut diagnostics);
    catalog.finish(&mut diagnostics);
    assert!(
        diagnostics.is_empty(),
        "unexpected issues: {:?}",
        diagnostics.issues()
    );
    Arc::new(catalog)
}

fn quiet_engine(catalog: &Arc<Catalog>) -> SimulationEngine {
    SimulationEngine::new(
        Arc::clone(catalog),
        SimConfig {
            spawn_fleets: false,
            ..Default::default()
        },
    )
}

fn system(catalog: &Catalog, name: &str) -> SystemId {
    catalog.systems.find(name).unwrap()
}

fn government(catalog: &Catalog, name: &str) -> GovernmentId {
    catalog.governments.find(name).unwrap()
}

fn add(engine: &mut SimulationEngine, model: &str, gov: &str, system: &str, position: Point) -> Entity {
    let model = engine.catalog().ships.find(model).unwrap();
    let gov = government(engine.catalog(), gov);
    let sys = self::system(engine.catalog(), system);
    engine
        .add_ship(model, Some(gov), sys, position, Angle::new(0.0))
        .unwrap()
}

/// Fire `weapon` from `shooter` straight along `aim`.
fn shoot(engine: &mut SimulationEngine, shooter: Entity, weapon: &str, aim: Angle, target: Option<Entity>) -> Entity {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let (body, sys) = {
        let ship = engine.world().get::<&Ship>(shooter).unwrap();
        (ship.body.clone(), ship.system)
    };
    let target_state = target.map(|t| {
        let ship = engine.world().get::<&Ship>(t).unwrap();
        ship.target_state(t)
    });
    let id = engine.catalog().outfits.find(weapon).unwrap();
    let projectile = {
        let stats = engine.catalog().weapon(id).unwrap();
        Projectile::fire(
            shooter,
            &body,
            sys,
            body.position,
            aim,
            id,
            stats,
            target_state.as_ref(),
            &mut rng,
        )
    };
    engine.add_projectile(projectile)
}

fn hull(engine: &SimulationEngine, entity: Entity) -> f64 {
    engine.world().get::<&Ship>(entity).unwrap().hull
}

fn json(snapshot: &GameStateSnapshot) -> String {
    serde_json::to_string(snapshot).unwrap()
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let catalog = catalog();
    let config = SimConfig {
        seed: 12345,
        ..Default::default()
    };
    let mut engine_a = SimulationEngine::new(Arc::clone(&catalog), config.clone());
    let mut engine_b = SimulationEngine::new(Arc::clone(&catalog), config);
    engine_a.start(&catalog.starts[0]).unwrap();
    engine_b.start(&catalog.starts[0]).unwrap();

    for _ in 0..300 {
        let snap_a = engine_a.tick();
        let snap_b = engine_b.tick();
        assert_eq!(json(&snap_a), json(&snap_b), "Snapshots diverged with same seed");
    }
}

#[test]
fn test_determinism_different_seeds() {
    let catalog = catalog();
    let mut engine_a = SimulationEngine::new(
        Arc::clone(&catalog),
        SimConfig {
            seed: 111,
            ..Default::default()
        },
    );
    let mut engine_b = SimulationEngine::new(
        Arc::clone(&catalog),
        SimConfig {
            seed: 222,
            ..Default::default()
        },
    );
    engine_a.start(&catalog.starts[0]).unwrap();
    engine_b.start(&catalog.starts[0]).unwrap();

    // Take-off positions are scattered around the pad, so the very first
    // snapshots already differ.
    let diverged = (0..100).any(|_| json(&engine_a.tick()) != json(&engine_b.tick()));
    assert!(diverged, "Different seeds should produce different snapshots");
}

// ---- Tick bookkeeping ----

#[test]
fn test_tick_advances_time_and_stamps_events() {
    let catalog = catalog();
    let mut engine = quiet_engine(&catalog);
    let shooter = add(&mut engine, "Hulk", "Pirate", "Quiet", Point::ZERO);
    let target = add(&mut engine, "Hulk", "Merchant", "Quiet", Point::new(0.0, -100.0));
    shoot(&mut engine, shooter, "Laser", Angle::new(0.0), None);

    let mut hit_tick = None;
    for _ in 0..20 {
        let snapshot = engine.tick();
        assert_eq!(snapshot.time.tick, engine.time().tick);
        if let Some(event) = snapshot.events.iter().find(|e| e.kind == ShipEventKind::Hit) {
            assert_eq!(event.target, Some(entity_ref(target)));
            assert_eq!(event.tick + 1, snapshot.time.tick);
            hit_tick = Some(event.tick);
        }
    }
    assert!(hit_tick.is_some(), "laser never reached the target");
}

#[test]
fn test_supplies_stay_in_bounds() {
    let catalog = catalog();
    let mut engine = SimulationEngine::new(Arc::clone(&catalog), SimConfig::default());
    engine.start(&catalog.starts[0]).unwrap();
    let haven = system(&catalog, "Haven");
    let raiders = catalog.fleets.find("Raiders").unwrap();
    engine.spawn_fleet(raiders, haven);

    for _ in 0..400 {
        engine.tick();
        assert!(engine.ledger().is_balanced(), "{:?}", engine.ledger());
        for (_, ship) in engine.world().query::<&Ship>().iter() {
            assert!(ship.shields >= 0.0 && ship.shields <= ship.max_shields());
            assert!(ship.hull >= 0.0 && ship.hull <= ship.max_hull());
            assert!(ship.energy >= 0.0 && ship.energy <= ship.max_energy());
            assert!(ship.fuel >= 0.0 && ship.fuel <= ship.max_fuel());
            assert!(ship.heat >= 0.0);
        }
    }
}

// ---- Start conditions ----

#[test]
fn test_start_places_flagship_and_escorts() {
    let catalog = catalog();
    let mut engine = quiet_engine(&catalog);
    let flagship = engine.start(&catalog.starts[0]).unwrap();
    assert_eq!(engine.player_ship(), Some(flagship));

    let lead = engine.world().get::<&Ship>(flagship).unwrap();
    assert!(lead.is_player);
    assert_eq!(lead.system, Some(system(&catalog, "Haven")));
    assert_eq!(lead.escorts.len(), 1);
    let escort = engine.world().get::<&Ship>(lead.escorts[0]).unwrap();
    assert!(!escort.is_player);
    assert_eq!(escort.parent, Some(flagship));
    assert_eq!(escort.body.zoom, 0.0);
}

// ---- Projectiles ----

#[test]
fn test_straight_shot_hits_once() {
    let catalog = catalog();
    let mut engine = quiet_engine(&catalog);
    let shooter = add(&mut engine, "Hulk", "Pirate", "Quiet", Point::ZERO);
    let target = add(&mut engine, "Hulk", "Merchant", "Quiet", Point::new(0.0, -500.0));
    let shot = shoot(&mut engine, shooter, "Laser", Angle::new(0.0), None);

    let mut hits = 0;
    let mut last_distance = 0.0;
    for _ in 0..50 {
        let snapshot = engine.tick();
        hits += snapshot
            .events
            .iter()
            .filter(|e| e.kind == ShipEventKind::Hit && e.target == Some(entity_ref(target)))
            .count();
        assert!(engine.ledger().is_balanced());
        if let Ok(projectile) = engine.world().get::<&Projectile>(shot) {
            last_distance = projectile.distance_traveled;
        }
    }

    assert_eq!(hits, 1);
    assert_eq!(hull(&engine, target), 95.0);
    assert!(!engine.world().contains(shot), "projectile should be spent");
    // The hit lands on the mask's edge, about 20 short of the center.
    assert!(last_distance > 450.0 && last_distance < 500.0, "traveled {last_distance}");
}

#[test]
fn test_friendly_shot_passes_through() {
    let catalog = catalog();
    let mut engine = quiet_engine(&catalog);
    let shooter = add(&mut engine, "Hulk", "Merchant", "Quiet", Point::ZERO);
    let friend = add(&mut engine, "Hulk", "Merchant", "Quiet", Point::new(0.0, -200.0));
    shoot(&mut engine, shooter, "Laser", Angle::new(0.0), None);

    for _ in 0..40 {
        let snapshot = engine.tick();
        assert!(snapshot.events.iter().all(|e| e.kind != ShipEventKind::Hit));
    }
    assert_eq!(hull(&engine, friend), 100.0);
}

#[test]
fn test_submunitions_spawn_on_natural_death() {
    let catalog = catalog();
    let mut engine = quiet_engine(&catalog);
    let shooter = add(&mut engine, "Hulk", "Pirate", "Quiet", Point::ZERO);
    let target = add(&mut engine, "Hulk", "Merchant", "Quiet", Point::new(0.0, -60.0));
    let rocket = shoot(&mut engine, shooter, "Scatter Rocket", Angle::new(0.0), Some(target));

    let mut death_position = Point::ZERO;
    for _ in 0..9 {
        engine.tick();
        death_position = engine.world().get::<&Projectile>(rocket).unwrap().body.position;
    }
    let snapshot = engine.tick();
    assert!(!engine.world().contains(rocket));

    let pellet = catalog.outfits.find("Pellet").unwrap();
    let children: Vec<_> = snapshot
        .projectiles
        .iter()
        .filter(|p| p.weapon == pellet)
        .collect();
    assert_eq!(children.len(), 9);
    for child in &children {
        assert!(child.position.distance(death_position) < 1e-9);
        assert_eq!(child.target, Some(entity_ref(target)));
    }
    let mut facings: Vec<i64> = children
        .iter()
        .map(|p| p.facing.degrees().round() as i64)
        .collect();
    facings.sort_unstable();
    assert_eq!(facings, vec![0, 0, 0, 30, 30, 30, 330, 330, 330]);
}

#[test]
fn test_projectile_cap_drops_excess_shots() {
    let catalog = catalog();
    let mut engine = SimulationEngine::new(
        Arc::clone(&catalog),
        SimConfig {
            max_projectiles: 0,
            spawn_fleets: false,
            ..Default::default()
        },
    );
    let gunner = add(&mut engine, "Raider", "Pirate", "Quiet", Point::ZERO);
    add(&mut engine, "Hulk", "Merchant", "Quiet", Point::new(0.0, -300.0));
    for _ in 0..60 {
        let snapshot = engine.tick();
        assert!(snapshot.projectiles.is_empty());
    }
    assert!(engine.world().contains(gunner));
}

// ---- Anti-missile ----

/// Chance that a draw from `0..a` beats a draw from `0..b`.
fn beats(a: u32, b: u32) -> f64 {
    let wins: u32 = (0..b).map(|low| a.saturating_sub(low + 1)).sum();
    f64::from(wins) / f64::from(a * b)
}

#[test]
fn test_anti_missile_kill_rate() {
    assert!((beats(10, 10) - 0.45).abs() < 1e-12);
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    for (strength, missile) in [(10, 10), (20, 10), (5, 20)] {
        let mut weapon = Weapon::default();
        weapon.anti_missile = strength;
        weapon.sanitize(false);
        let trials = 4000u32;
        let kills = (0..trials)
            .filter(|_| Hardpoint::anti_missile_roll(&weapon, missile, &mut rng))
            .count() as f64;

        // Wilson score interval at 99.9%.
        let n = f64::from(trials);
        let z = 3.29;
        let p = kills / n;
        let center = (p + z * z / (2.0 * n)) / (1.0 + z * z / n);
        let half = z * (p * (1.0 - p) / n + z * z / (4.0 * n * n)).sqrt() / (1.0 + z * z / n);
        let (low, high) = (center - half, center + half);
        let expected = beats(strength, missile);
        assert!(
            low <= expected && expected <= high,
            "{strength} vs {missile}: kill rate {p} (interval {low}..{high}) misses {expected}"
        );
    }
}

#[test]
fn test_point_defense_shoots_down_missile() {
    let catalog = catalog();
    let mut engine = quiet_engine(&catalog);
    let shooter = add(&mut engine, "Hulk", "Pirate", "Quiet", Point::ZERO);
    let picket = add(&mut engine, "Picket", "Merchant", "Quiet", Point::new(0.0, -400.0));
    let missile = shoot(&mut engine, shooter, "Sidewinder", Angle::new(0.0), None);

    for _ in 0..120 {
        let snapshot = engine.tick();
        assert!(snapshot.events.iter().all(|e| e.kind != ShipEventKind::Hit));
    }
    assert!(!engine.world().contains(missile));
    assert_eq!(hull(&engine, picket), 100.0);
}

// ---- Fleets ----

#[test]
fn test_fleet_enters_through_link() {
    let catalog = catalog();
    let mut engine = quiet_engine(&catalog);
    let haven = system(&catalog, "Haven");
    let outpost = system(&catalog, "Outpost");
    let raiders = catalog.fleets.find("Raiders").unwrap();

    let ships = engine.spawn_fleet(raiders, haven);
    assert_eq!(ships.len(), 3);
    let lead = engine.world().get::<&Ship>(ships[0]).unwrap();
    assert_eq!(lead.escorts, ships[1..].to_vec());
    assert_eq!(lead.body.government, Some(government(&catalog, "Pirate")));
    for &entity in &ships {
        let ship = engine.world().get::<&Ship>(entity).unwrap();
        // Haven has no inhabited planets, so the link is the only way in.
        assert_eq!(ship.system, Some(outpost));
        assert_eq!(ship.hyperspace_system, Some(haven));
        if entity != ships[0] {
            assert_eq!(ship.parent, Some(ships[0]));
        }
    }
}

#[test]
fn test_periodic_fleets_only_in_focus() {
    let catalog = catalog();
    let mut engine = SimulationEngine::new(Arc::clone(&catalog), SimConfig::default());
    engine.set_focus(Some(system(&catalog, "Quiet")));
    for _ in 0..600 {
        engine.tick();
    }
    assert_eq!(engine.world().query::<&Ship>().iter().count(), 0);

    engine.set_focus(Some(system(&catalog, "Haven")));
    let arrived = (0..3000).any(|_| !engine.tick().ships.is_empty());
    assert!(arrived, "a fleet every ~100 ticks should show up");
}

// ---- Hazards ----

#[test]
fn test_hazard_damages_ships_in_range() {
    let catalog = catalog();
    let mut engine = quiet_engine(&catalog);
    let victim = add(&mut engine, "Hulk", "Merchant", "Storm", Point::new(100.0, 0.0));

    let mut hits = 0;
    for _ in 0..10 {
        let snapshot = engine.tick();
        assert!(!snapshot.weather.is_empty());
        for event in snapshot.events.iter().filter(|e| e.kind == ShipEventKind::Hit) {
            assert_eq!(event.actor, None);
            assert_eq!(event.target, Some(entity_ref(victim)));
            hits += 1;
        }
        assert!(engine.ledger().is_balanced());
    }
    assert!(hits > 0);
    assert!(hull(&engine, victim) < 100.0);
}

// ---- Flotsam ----

fn world_with(catalog: &Catalog, ships: &[(&str, &str, Point)]) -> (World, Vec<Entity>) {
    let mut world = World::new();
    let mut serials = Serials::default();
    let quiet = system(catalog, "Quiet");
    let entities = ships
        .iter()
        .map(|&(model, gov, position)| {
            let model = catalog.ships.find(model).unwrap();
            let gov = government(catalog, gov);
            world_setup::spawn_at(
                &mut world,
                &mut serials,
                catalog,
                model,
                Some(gov),
                quiet,
                position,
                Angle::new(0.0),
            )
            .unwrap()
        })
        .collect();
    (world, entities)
}

#[test]
fn test_pickup_limited_by_cargo_space() {
    let catalog = catalog();
    let (mut world, ships) = world_with(&catalog, &[("Hulk", "Merchant", Point::ZERO)]);
    let food = world.spawn((
        crate::world::Serial(100),
        Flotsam {
            body: Body::new(Point::new(5.0, 0.0), Point::ZERO, Angle::new(0.0)),
            system: Some(system(&catalog, "Quiet")),
            contents: Contents::Commodity {
                name: "Food".to_string(),
            },
            count: 15,
            lifetime: 100,
            source: None,
        },
    ));
    let mut grids = Grids::new();
    grids.rebuild(&world, &catalog, 0);
    let mut frame = Frame::default();
    interaction::collect_flotsam(&mut world, &catalog, &grids, &mut frame);

    assert_eq!(frame.events.len(), 1);
    assert_eq!(
        frame.events[0].kind,
        ShipEventKind::Pickup {
            outfit: None,
            count: 10
        }
    );
    assert_eq!(frame.events[0].actor, Some(entity_ref(ships[0])));
    assert_eq!(world.get::<&Flotsam>(food).unwrap().count, 5);
    assert!(frame.despawn.is_empty());
    let ship = world.get::<&Ship>(ships[0]).unwrap();
    assert_eq!(ship.cargo.commodity_tons(), 10);
}

// ---- Scanning ----

#[test]
fn test_cargo_scan_completes() {
    let catalog = catalog();
    let (mut world, ships) = world_with(
        &catalog,
        &[
            ("Hulk", "Merchant", Point::ZERO),
            ("Hulk", "Pirate", Point::new(0.0, 150.0)),
        ],
    );
    let (scanner, target) = (ships[0], ships[1]);
    {
        let mut ship = world.get::<&mut Ship>(scanner).unwrap();
        ship.commands = Command::SCAN;
        ship.target_ship = Some(target);
    }
    let mut scanned = BTreeSet::new();
    let mut frame = Frame::default();
    for _ in 0..59 {
        interaction::scan(&mut world, &mut scanned, &mut frame);
    }
    assert!(frame.events.is_empty());
    interaction::scan(&mut world, &mut scanned, &mut frame);

    assert_eq!(frame.events.len(), 1);
    assert_eq!(frame.events[0].kind, ShipEventKind::ScanCargo);
    assert!(scanned.contains(&(government(&catalog, "Merchant"), entity_ref(target))));

    // Finished scans do not repeat.
    interaction::scan(&mut world, &mut scanned, &mut frame);
    assert_eq!(frame.events.len(), 1);
}

#[test]
fn test_scan_out_of_range_makes_no_progress() {
    let catalog = catalog();
    let (mut world, ships) = world_with(
        &catalog,
        &[
            ("Hulk", "Merchant", Point::ZERO),
            ("Hulk", "Pirate", Point::new(0.0, 250.0)),
        ],
    );
    {
        let mut ship = world.get::<&mut Ship>(ships[0]).unwrap();
        ship.commands = Command::SCAN;
        ship.target_ship = Some(ships[1]);
    }
    let mut scanned = BTreeSet::new();
    let mut frame = Frame::default();
    for _ in 0..100 {
        interaction::scan(&mut world, &mut scanned, &mut frame);
    }
    assert!(frame.events.is_empty());
    assert_eq!(world.get::<&Ship>(ships[0]).unwrap().cargo_scan, 0.0);
}

// ---- Boarding ----

fn disable(world: &mut World, entity: Entity) {
    let mut ship = world.get::<&mut Ship>(entity).unwrap();
    ship.hull = 10.0;
    ship.regenerate();
    assert!(ship.is_disabled());
}

#[test]
fn test_player_captures_crewless_hulk() {
    let catalog = catalog();
    let (mut world, ships) = world_with(
        &catalog,
        &[
            ("Hulk", "Merchant", Point::ZERO),
            ("Hulk", "Pirate", Point::new(30.0, 0.0)),
        ],
    );
    let (player, hulk) = (ships[0], ships[1]);
    disable(&mut world, hulk);
    {
        let mut ship = world.get::<&mut Ship>(player).unwrap();
        ship.is_player = true;
        ship.commands = Command::BOARD;
        ship.target_ship = Some(hulk);
    }
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut frame = Frame::default();
    interaction::board(&mut world, &mut rng, &mut frame);

    let kinds: Vec<_> = frame.events.iter().map(|e| e.kind.clone()).collect();
    assert_eq!(kinds, vec![ShipEventKind::Board, ShipEventKind::Capture]);
    {
        let captured = world.get::<&Ship>(hulk).unwrap();
        assert_eq!(captured.body.government, Some(government(&catalog, "Merchant")));
        assert_eq!(captured.parent, Some(player));
    }
    assert_eq!(world.get::<&Ship>(player).unwrap().escorts, vec![hulk]);

    // Holding the key does not board again.
    interaction::board(&mut world, &mut rng, &mut frame);
    assert_eq!(frame.events.len(), 2);
}

#[test]
fn test_npc_boarding_spills_cargo() {
    let catalog = catalog();
    let (mut world, ships) = world_with(
        &catalog,
        &[
            ("Hulk", "Pirate", Point::ZERO),
            ("Hulk", "Merchant", Point::new(30.0, 0.0)),
        ],
    );
    let (pirate, merchant) = (ships[0], ships[1]);
    disable(&mut world, merchant);
    world
        .get::<&mut Ship>(merchant)
        .unwrap()
        .cargo
        .add_commodity("Food", 5);
    {
        let mut ship = world.get::<&mut Ship>(pirate).unwrap();
        ship.commands = Command::BOARD;
        ship.target_ship = Some(merchant);
    }
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut frame = Frame::default();
    interaction::board(&mut world, &mut rng, &mut frame);

    assert_eq!(frame.events.len(), 1);
    assert_eq!(frame.flotsam.len(), 1);
    assert_eq!(frame.flotsam[0].count, 5);
    assert!(world.get::<&Ship>(merchant).unwrap().cargo.is_empty());
}

#[test]
fn test_board_needs_disabled_target_in_reach() {
    let catalog = catalog();
    let (mut world, ships) = world_with(
        &catalog,
        &[
            ("Hulk", "Pirate", Point::ZERO),
            ("Hulk", "Merchant", Point::new(30.0, 0.0)),
            ("Hulk", "Merchant", Point::new(500.0, 0.0)),
        ],
    );
    disable(&mut world, ships[2]);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut frame = Frame::default();
    for target in [ships[1], ships[2]] {
        {
            let mut ship = world.get::<&mut Ship>(ships[0]).unwrap();
            ship.commands = Command::BOARD;
            ship.target_ship = Some(target);
        }
        interaction::board(&mut world, &mut rng, &mut frame);
    }
    assert!(frame.events.is_empty());
}

// ---- Cleanup ----

#[test]
fn test_cleanup_clears_stale_links() {
    let catalog = catalog();
    let (mut world, ships) = world_with(
        &catalog,
        &[
            ("Hulk", "Merchant", Point::ZERO),
            ("Hulk", "Merchant", Point::new(100.0, 0.0)),
            ("Hulk", "Pirate", Point::new(200.0, 0.0)),
        ],
    );
    let (lead, escort, enemy) = (ships[0], ships[1], ships[2]);
    {
        let mut ship = world.get::<&mut Ship>(lead).unwrap();
        ship.escorts = vec![escort];
        ship.target_ship = Some(enemy);
        ship.scan_target = Some(enemy);
        ship.cargo_scan = 0.5;
    }
    world.get::<&mut Ship>(escort).unwrap().parent = Some(lead);

    let mut despawn = vec![enemy, escort, enemy];
    cleanup::run(&mut world, &mut despawn);
    assert!(despawn.is_empty());
    assert!(!world.contains(enemy) && !world.contains(escort));

    let ship = world.get::<&Ship>(lead).unwrap();
    assert!(ship.escorts.is_empty());
    assert_eq!(ship.target_ship, None);
    assert_eq!(ship.scan_target, None);
    assert_eq!(ship.cargo_scan, 0.0);
}
