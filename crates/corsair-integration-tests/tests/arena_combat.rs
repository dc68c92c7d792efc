//! Integration test: ships fighting in a shared arena.
//!
//! Drives several ships through the per-tick pipeline (step, fire,
//! projectile resolution) and checks the cross-module outcomes: damage
//! reaches the right ship, destruction removes a ship exactly once, point
//! defense accounts for every missile, and the whole battle is reproducible.

mod common;

use common::{Arena, ShipKey};
use corsair_core::geometry::Angle;
use corsair_core::ship::{Command, Ship};
use corsair_core::test_utils::*;
use glam::DVec2;

fn firing() -> Command {
    Command {
        fire: true,
        ..Command::default()
    }
}

fn spawn(
    arena: &mut Arena,
    mut ship: Ship,
    name: &str,
    government: &str,
    position: DVec2,
    facing: f64,
) -> ShipKey {
    ship.set_name(name);
    ship.set_government(arena.catalog.government_id(government));
    ship.set_system(arena.catalog.system_id("Sol"));
    ship.place(position, DVec2::ZERO, Angle::from_degrees(facing));
    arena.add(ship)
}

/// A Navy Kestrel against an unarmed Pirate Shuttle in its line of fire.
fn one_sided_battle() -> (Arena, ShipKey, ShipKey) {
    let catalog = test_catalog();
    let mut arena = Arena::new(catalog.clone());
    let mut hunter = kestrel(&catalog);
    hunter.set_command(firing());
    let hunter = spawn(&mut arena, hunter, "Hunter", "Navy", DVec2::ZERO, 0.0);
    let prey = spawn(
        &mut arena,
        shuttle(&catalog),
        "Prey",
        "Pirate",
        DVec2::new(120.0, 0.0),
        0.0,
    );
    (arena, hunter, prey)
}

#[test]
fn destroyed_ship_is_removed_exactly_once() {
    let (mut arena, hunter, prey) = one_sided_battle();
    let blaster = outfit(&arena.catalog, "Blaster");
    let spark = arena.catalog.effect_id("spark").unwrap();
    let small_explosion = arena.catalog.effect_id("small explosion").unwrap();

    let mut saw_explosion = false;
    for _ in 0..400 {
        arena.step();
        if arena.ship(prey).is_some_and(|s| s.is_exploding()) {
            saw_explosion = true;
            assert!(!arena.ship(prey).unwrap().is_targetable());
        }
    }

    assert!(saw_explosion, "prey should explode before removal");
    assert_eq!(arena.removed, vec![prey]);
    assert!(arena.ship(prey).is_none());

    // Shields soak the first two bolts; the rest carry 3 hull damage each.
    let tally = arena.tally(blaster);
    assert!(tally.hits >= 19, "hits: {}", tally.hits);
    assert_eq!(arena.effect_count(spark), 2 * tally.hits);
    assert!(arena.effect_count(small_explosion) >= 2);

    // The hunter is untouched and still flying.
    let hunter = arena.ship(hunter).unwrap();
    assert_eq!(hunter.shield_points(), fixed(300.0));
    assert_eq!(hunter.hull_points(), fixed(400.0));
    assert!(!hunter.should_delete());
}

#[test]
fn disabled_ship_stops_returning_fire() {
    let catalog = test_catalog();
    let mut arena = Arena::new(catalog.clone());
    let blaster = outfit(&catalog, "Blaster");

    let mut hunter = kestrel(&catalog);
    hunter.set_command(firing());
    let hunter = spawn(&mut arena, hunter, "Hunter", "Navy", DVec2::ZERO, 0.0);

    let mut raider = shuttle(&catalog);
    assert_eq!(raider.add_outfit(blaster, 1), 1);
    raider.set_command(firing());
    let raider = spawn(&mut arena, raider, "Raider", "Pirate", DVec2::new(120.0, 0.0), 180.0);

    let mut disabled_at = None;
    for tick in 0..200 {
        arena.step();
        let Some(ship) = arena.ship(raider) else {
            break;
        };
        if disabled_at.is_none() && ship.is_disabled() {
            disabled_at = Some(tick);
        }
    }
    assert!(disabled_at.is_some(), "raider should be disabled before it dies");

    // The raider's few bolts only dented the hunter's shields.
    let hunter = arena.ship(hunter).unwrap();
    assert!(hunter.shield_points() < fixed(300.0));
    assert_eq!(hunter.hull_points(), fixed(400.0));
}

#[test]
fn point_defense_accounts_for_every_missile() {
    let catalog = test_catalog();
    let mut arena = Arena::new(catalog.clone());
    let blaster = outfit(&catalog, "Blaster");
    let launcher = outfit(&catalog, "Cluster Missile");
    let ammo = outfit(&catalog, "Cluster Ammo");
    let point_defense = outfit(&catalog, "Point Defense");
    let flak = catalog.effect_id("flak").unwrap();

    let mut raider = kestrel(&catalog);
    assert_eq!(raider.add_outfit(blaster, -2), -2);
    assert_eq!(raider.add_outfit(launcher, 1), 1);
    assert_eq!(raider.add_outfit(ammo, 3), 3);
    raider.set_command(firing());
    let raider = spawn(&mut arena, raider, "Raider", "Pirate", DVec2::new(-150.0, 0.0), 0.0);

    let mut escort = kestrel(&catalog);
    assert_eq!(escort.add_outfit(point_defense, 1), 1);
    spawn(&mut arena, escort, "Escort", "Navy", DVec2::ZERO, 0.0);

    arena.run(300);

    let tally = arena.tally(launcher);
    assert_eq!(tally.fired, 3);
    assert_eq!(arena.ship(raider).unwrap().outfit_count(ammo), 0);
    assert!(arena.effect_count(flak) >= 1, "point defense should take a shot");
    assert_eq!(
        tally.fired,
        tally.intercepted + tally.hits + tally.expired,
        "every missile is intercepted, hits, or expires: {tally:?}"
    );
    assert!(
        !arena.projectiles.iter().any(|p| p.weapon == launcher),
        "no missile should still be in flight"
    );
}

#[test]
fn battles_are_reproducible() {
    let (mut a, _, _) = one_sided_battle();
    let (mut b, _, _) = one_sided_battle();
    for _ in 0..250 {
        a.step();
        b.step();
        assert_eq!(a.state_hash(), b.state_hash(), "diverged at tick {}", a.tick);
    }
    assert_eq!(a.effects, b.effects);
    assert_eq!(a.removed.len(), b.removed.len());
}
