#[cfg(test)]
mod tests {
    use crate::catalog::Catalog;
    use crate::command::Command;
    use crate::damage::DamageChannel;
    use crate::datanode::DataFile;
    use crate::error::{ContentError, Diagnostics};
    use crate::events::{ShipEvent, ShipEventKind};
    use crate::fleet::FleetVariant;
    use crate::government::{Government, Politics};
    use crate::save::SaveSummary;
    use crate::types::{EntityRef, GovernmentId, ShipModelId, SystemId};
    use crate::universe::System;

    const CONTENT: &str = r#"
effect "spark"
	lifetime 10

outfit "Blaster"
	category "Guns"
	cost 5000
	mass 3
	"gun ports" -1
	weapon
		sprite "projectile/blaster"
		velocity 10
		lifetime 100
		reload 4
		"hull damage" 5
		"shield damage" 4
		"hit effect" "spark" 2

outfit "Shard"
	weapon
		velocity 8
		lifetime 20
		"hull damage" 2

outfit "Cluster Rocket"
	weapon
		velocity 6
		lifetime 10
		"split range" 50
		"hull damage" 1
		submunition "Shard" 3
			facing -30
		submunition "Shard" 3
		submunition "Shard" 3
			facing 30
			spawn on natural anti-missile

ship "Sparrow"
	sprite "ship/sparrow"
	attributes
		mass 50
		hull 200
		shields 300
		thrust 6
		turn 100
	outfits
		"Blaster" 2
	gun -6 -20 "Blaster"
	gun 6 -20 "Blaster"
	turret 0 10
		arc -90 90
	engine 0 30
	explode "spark" 5

government "Merchant"
	color .8 .8 .2
	"attitude toward"
		"Pirate" -.5

government "Pirate"
	"attitude toward"
		"Merchant" -1

fleet "Small Merchants"
	government "Merchant"
	personality timid coward
	variant 3
		"Sparrow" 2
	variant
		"Sparrow"

system "Alpha"
	pos 0 0
	government "Merchant"
	link "Beta"
	fleet "Small Merchants" 600
	object
		sprite "star/g0"
		period 10
		object "Earth"
			distance 500
			period 100

system "Beta"
	pos 300 0
	link "Alpha"

system "Gamma"
	pos 50 50

planet "Earth"
	spaceport "Dock"
"#;

    fn load(text: &str) -> (Catalog, Diagnostics) {
        let mut catalog = Catalog::new();
        let mut diagnostics = Diagnostics::new();
        catalog.load_text("test.txt", text, &mut diagnostics);
        catalog.finish(&mut diagnostics);
        (catalog, diagnostics)
    }

    #[test]
    fn test_catalog_loads_all_kinds() {
        let (catalog, diagnostics) = load(CONTENT);
        assert!(
            diagnostics.is_empty(),
            "unexpected issues: {:?}",
            diagnostics.issues()
        );

        let blaster = catalog.outfits.by_name("Blaster").unwrap();
        assert_eq!(blaster.category, "Guns");
        assert_eq!(blaster.cost, 5000);
        assert_eq!(blaster.get("gun ports"), -1.0);
        let weapon = blaster.weapon.as_ref().unwrap();
        assert_eq!(weapon.velocity, 10.0);
        assert_eq!(weapon.lifetime, 100);
        assert_eq!(weapon.damage[DamageChannel::Hull], 5.0);
        assert_eq!(weapon.hit_effects.len(), 1);
        assert_eq!(weapon.range(), 1000.0);

        let ship = catalog.ships.by_name("Sparrow").unwrap();
        assert_eq!(ship.attributes.get("hull"), 200.0);
        assert_eq!(ship.hardpoints.len(), 3);
        assert_eq!(ship.mount_counts(), (2, 1));
        assert_eq!(ship.hardpoints[2].arc, Some((-90.0, 90.0)));
        assert_eq!(ship.engines.len(), 1);
        assert_eq!(ship.explode.len(), 1);

        let fleet = catalog.fleets.by_name("Small Merchants").unwrap();
        assert_eq!(fleet.total_weight(), 4);
        assert!(fleet.personality.timid && fleet.personality.coward);
        assert_eq!(fleet.variants[0].expanded().len(), 2);
    }

    #[test]
    fn test_total_damage_includes_submunitions() {
        let (catalog, _) = load(CONTENT);
        let rocket = catalog.outfits.find("Cluster Rocket").unwrap();
        let weapon = catalog.weapon(rocket).unwrap();
        assert_eq!(weapon.submunitions.len(), 3);
        // 1 own + 9 shards at 2 each.
        assert_eq!(weapon.total_damage(DamageChannel::Hull), 19.0);
        assert_eq!(weapon.total_lifetime(), 30.0);
        assert_eq!(weapon.submunitions[0].facing.degrees(), 330.0);
        assert!(weapon.submunitions[1].spawn_on_natural_death);
        assert!(!weapon.submunitions[1].spawn_on_anti_missile_death);
        assert!(weapon.submunitions[2].spawn_on_anti_missile_death);
    }

    #[test]
    fn test_submunition_cycle_is_reported_and_broken() {
        let text = r#"
outfit "Ouroboros"
	weapon
		lifetime 5
		"hull damage" 1
		submunition "Tail" 2
outfit "Tail"
	weapon
		lifetime 5
		"hull damage" 1
		submunition "Ouroboros" 2
"#;
        let (catalog, diagnostics) = load(text);
        let cycles = diagnostics
            .issues()
            .iter()
            .filter(|issue| matches!(issue.error, ContentError::SubmunitionCycle { .. }))
            .count();
        assert_eq!(cycles, 1, "one back edge expected");

        let head = catalog.weapon(catalog.outfits.find("Ouroboros").unwrap()).unwrap();
        let tail = catalog.weapon(catalog.outfits.find("Tail").unwrap()).unwrap();
        // The back edge Tail -> Ouroboros is dropped, totals stay finite.
        assert!(tail.submunitions.is_empty());
        assert_eq!(tail.total_damage(DamageChannel::Hull), 1.0);
        assert_eq!(head.total_damage(DamageChannel::Hull), 3.0);
    }

    #[test]
    fn test_unknown_reference_gets_placeholder() {
        let text = "ship \"Hull\"\n\toutfits\n\t\t\"Missing Gun\" 1\n";
        let (catalog, diagnostics) = load(text);
        assert!(diagnostics.issues().iter().any(|issue| matches!(
            &issue.error,
            ContentError::UnknownReference { kind: "outfit", name } if name == "Missing Gun"
        )));
        let missing = catalog.outfits.find("Missing Gun").unwrap();
        let outfit = catalog.outfit(missing).unwrap();
        assert_eq!(outfit.name, "Missing Gun");
        assert!(outfit.weapon.is_none());
    }

    #[test]
    fn test_bad_number_reports_location_and_trace() {
        let text = "outfit \"Broken\"\n\tweapon\n\t\tvelocity fast\n";
        let (catalog, diagnostics) = load(text);
        let issue = diagnostics
            .issues()
            .iter()
            .find(|issue| matches!(issue.error, ContentError::BadNumber { .. }))
            .expect("bad number reported");
        assert_eq!(issue.location.line, 3);
        assert!(issue.trace.contains("outfit Broken"), "trace: {}", issue.trace);
        assert!(issue.trace.contains("velocity fast"), "trace: {}", issue.trace);
        let weapon = catalog.weapon(catalog.outfits.find("Broken").unwrap()).unwrap();
        assert_eq!(weapon.velocity, 0.0);
    }

    #[test]
    fn test_neighbors_include_links_and_nearby_systems() {
        let (catalog, _) = load(CONTENT);
        let alpha = catalog.systems.find("Alpha").unwrap();
        let beta = catalog.systems.find("Beta").unwrap();
        let gamma = catalog.systems.find("Gamma").unwrap();
        let system = catalog.system(alpha).unwrap();
        assert_eq!(system.links, vec![beta]);
        assert!(system.is_neighbor(beta), "links are always neighbors");
        assert!(system.is_neighbor(gamma), "gamma is within jump range");
        assert!(!catalog.system(beta).unwrap().is_neighbor(gamma));
    }

    #[test]
    fn test_planets_know_their_system() {
        let (catalog, _) = load(CONTENT);
        let earth = catalog.planets.find("Earth").unwrap();
        let planet = catalog.planet(earth).unwrap();
        assert_eq!(planet.system, catalog.systems.find("Alpha"));
        assert!(planet.inhabited && planet.landable);
    }

    #[test]
    fn test_orbits_follow_the_date() {
        let (catalog, _) = load(CONTENT);
        let mut system: System = catalog.systems.by_name("Alpha").unwrap().clone();
        system.set_date(0.0);
        let earth = system.objects[1].position;
        assert!((earth.x - 0.0).abs() < 1e-9 && (earth.y + 500.0).abs() < 1e-9);

        // A quarter period later the planet has swung to the right.
        system.set_date(25.0);
        let earth = system.objects[1].position;
        assert!((earth.x - 500.0).abs() < 1e-6, "x = {:.3}", earth.x);
        assert!(earth.y.abs() < 1e-6, "y = {:.3}", earth.y);
    }

    #[test]
    fn test_government_attitudes_from_content() {
        let (catalog, _) = load(CONTENT);
        let merchant = catalog.governments.find("Merchant").unwrap();
        let pirate = catalog.governments.find("Pirate").unwrap();
        let politics = catalog.politics();
        assert!(politics.is_enemy(merchant, pirate));
        assert!(politics.is_enemy(pirate, merchant));
    }

    #[test]
    fn test_enmity_is_not_symmetric_and_provocation_resets() {
        let a = GovernmentId(0);
        let b = GovernmentId(1);
        let mut hawks = Government {
            name: "Hawks".into(),
            ..Default::default()
        };
        hawks.enemies.insert(b);
        let doves = Government {
            name: "Doves".into(),
            ..Default::default()
        };
        let mut politics = Politics::new(vec![hawks, doves]);
        assert!(politics.is_enemy(a, b));
        assert!(!politics.is_enemy(b, a));

        assert!(politics.provoke(b, a));
        assert!(politics.is_enemy(b, a));
        assert!(!politics.provoke(b, a), "already provoked");

        politics.reset_provocations();
        assert!(!politics.is_enemy(b, a));
    }

    #[test]
    fn test_player_government_is_never_provoked() {
        let player = Government {
            name: "Player".into(),
            is_player: true,
            ..Default::default()
        };
        let other = Government::default();
        let mut politics = Politics::new(vec![player, other]);
        assert!(!politics.provoke(GovernmentId(0), GovernmentId(1)));
        assert!(!politics.is_enemy(GovernmentId(0), GovernmentId(1)));
    }

    #[test]
    fn test_weapon_sanitize_clamps() {
        let text = r#"
outfit "Odd"
	weapon
		reload 3
		"burst reload" 9
		"burst count" 0
		lifetime -4
		piercing 2
		homing
"#;
        let (catalog, _) = load(text);
        let weapon = catalog.weapon(catalog.outfits.find("Odd").unwrap()).unwrap();
        assert_eq!(weapon.burst_reload, 3.0, "burst reload never exceeds reload");
        assert_eq!(weapon.burst_count, 1);
        assert_eq!(weapon.lifetime, 0);
        assert_eq!(weapon.piercing, 1.0);
        assert_eq!(weapon.tracking, 1.0, "legacy homing tracks perfectly");
    }

    #[test]
    fn test_damage_dropoff_is_linear() {
        let text = r#"
outfit "Falloff"
	weapon
		"damage dropoff" 100 200
		"dropoff modifier" .5
"#;
        let (catalog, _) = load(text);
        let weapon = catalog.weapon(catalog.outfits.find("Falloff").unwrap()).unwrap();
        assert_eq!(weapon.dropoff(50.0), 1.0);
        assert!((weapon.dropoff(150.0) - 0.75).abs() < 1e-12);
        assert_eq!(weapon.dropoff(500.0), 0.5);
    }

    #[test]
    fn test_fleet_variant_expansion_order() {
        let variant = FleetVariant {
            weight: 1,
            ships: vec![(ShipModelId(2), 1), (ShipModelId(5), 2)],
        };
        assert_eq!(
            variant.expanded(),
            vec![ShipModelId(2), ShipModelId(5), ShipModelId(5)]
        );
    }

    #[test]
    fn test_programmatic_systems_keep_explicit_links() {
        let mut catalog = Catalog::new();
        let a = catalog.add_system(System {
            name: "A".into(),
            links: vec![SystemId(1)],
            ..Default::default()
        });
        let b = catalog.add_system(System {
            name: "B".into(),
            position: glam::DVec2::new(5000.0, 0.0),
            links: vec![SystemId(0)],
            ..Default::default()
        });
        let mut diagnostics = Diagnostics::new();
        catalog.finish(&mut diagnostics);
        assert!(diagnostics.is_empty());
        assert_eq!(catalog.system(a).unwrap().neighbors, vec![b]);
    }

    #[test]
    fn test_save_summary_counts_keys() {
        let text = "pilot Jane Doe\ndate 16 10 3014\nsystem \"Alpha\"\nplanet Earth\nship Sparrow\n\tname \"A &amp; B\"\nship Sparrow\nvisited Alpha\nvisited Beta\nmystery\n";
        let mut diagnostics = Diagnostics::new();
        let file = DataFile::parse("save.txt", text, &mut diagnostics);
        let summary = SaveSummary::from_file(&file);
        assert_eq!(summary.pilot.as_deref(), Some("Jane Doe"));
        assert_eq!(summary.system.as_deref(), Some("Alpha"));
        assert_eq!(summary.count("ship"), 2);
        assert_eq!(summary.count("visited"), 2);
        assert_eq!(summary.count("cargo"), 0);
        assert_eq!(summary.unknown, 1);

        // Writing and re-reading gives the same tree.
        let again = DataFile::parse("save.txt", &file.to_text(), &mut diagnostics);
        assert_eq!(again.to_text(), file.to_text());
        assert_eq!(SaveSummary::from_file(&again), summary);
    }

    #[test]
    fn test_ship_event_serde() {
        let events = vec![
            ShipEvent::new(ShipEventKind::Hit, Some(EntityRef(1)), Some(EntityRef(2))),
            ShipEvent::new(
                ShipEventKind::Jump {
                    from: SystemId(0),
                    to: SystemId(3),
                },
                Some(EntityRef(7)),
                None,
            ),
        ];
        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let back: ShipEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event, back);
        }
    }

    #[test]
    fn test_command_fire_bits_are_independent() {
        let mut command = Command::default();
        command.set(Command::fire(0));
        command.set(Command::fire(3));
        assert!(command.has_fire(0));
        assert!(!command.has_fire(1));
        assert!(command.has_fire(3));
        assert!(!command.has(Command::FORWARD));
    }
}
