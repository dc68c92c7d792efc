//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::sync::Arc;

use glam::DVec2;

use crate::catalog::{Catalog, CatalogBuilder, EffectDef, Planet, ShipModel};
use crate::fixed::Fixed64;
use crate::id::*;
use crate::outfit::{Outfit, attr, weapon};
use crate::ship::Ship;

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Catalog
// ===========================================================================

fn effect(b: &mut CatalogBuilder, name: &str) -> EffectId {
    b.register_effect(EffectDef {
        name: name.to_string(),
        sprite: Some(SpriteHandle::new(format!("effect/{name}"))),
        lifetime: 10,
    })
}

/// A builder holding the standard fixture content. Tests that need a custom
/// [`SimConfig`](crate::config::SimConfig) or extra content start here.
pub fn test_catalog_builder() -> CatalogBuilder {
    let mut b = CatalogBuilder::new();

    // Effects
    let spark = effect(&mut b, "spark");
    let flak = effect(&mut b, "flak");
    let small_explosion = effect(&mut b, "small explosion");
    let large_explosion = effect(&mut b, "large explosion");

    // Weapons and ammunition
    b.register_outfit(
        Outfit::new("Blaster")
            .with_category("Guns")
            .with_attribute(attr::COST, 5000.0)
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::OUTFIT_SPACE, -10.0)
            .with_attribute(attr::WEAPON_CAPACITY, -5.0)
            .with_attribute(attr::GUN_PORTS, -1.0)
            .with_weapon(weapon::RELOAD, 10.0)
            .with_weapon(weapon::VELOCITY, 10.0)
            .with_weapon(weapon::LIFETIME, 30.0)
            .with_weapon(weapon::SHIELD_DAMAGE, 5.0)
            .with_weapon(weapon::HULL_DAMAGE, 3.0)
            .with_weapon(weapon::FIRING_ENERGY, 2.0)
            .with_weapon(weapon::FIRING_HEAT, 1.0)
            .with_hit_effect(spark, 2),
    );
    b.register_outfit(
        Outfit::new("Heavy Laser")
            .with_category("Guns")
            .with_attribute(attr::COST, 20000.0)
            .with_attribute(attr::MASS, 10.0)
            .with_attribute(attr::OUTFIT_SPACE, -10.0)
            .with_attribute(attr::WEAPON_CAPACITY, -10.0)
            .with_attribute(attr::GUN_PORTS, -1.0)
            .with_weapon(weapon::RELOAD, 20.0)
            .with_weapon(weapon::VELOCITY, 20.0)
            .with_weapon(weapon::LIFETIME, 20.0)
            .with_weapon(weapon::SHIELD_DAMAGE, 15.0)
            .with_weapon(weapon::HULL_DAMAGE, 15.0)
            .with_weapon(weapon::FIRING_ENERGY, 10.0)
            .with_weapon(weapon::FIRING_FORCE, 50.0)
            .with_hit_effect(spark, 1),
    );
    b.register_outfit(
        Outfit::new("Ion Cannon")
            .with_category("Guns")
            .with_attribute(attr::MASS, 10.0)
            .with_attribute(attr::WEAPON_CAPACITY, -10.0)
            .with_attribute(attr::GUN_PORTS, -1.0)
            .with_weapon(weapon::RELOAD, 15.0)
            .with_weapon(weapon::VELOCITY, 5.0)
            .with_weapon(weapon::LIFETIME, 20.0)
            .with_weapon(weapon::HULL_DAMAGE, 10.0)
            .with_weapon(weapon::HEAT_DAMAGE, 30.0)
            .with_weapon(weapon::HIT_FORCE, 100.0),
    );
    let flechette = b.register_outfit(
        Outfit::new("Flechette")
            .with_weapon(weapon::VELOCITY, 8.0)
            .with_weapon(weapon::LIFETIME, 10.0)
            .with_weapon(weapon::SHIELD_DAMAGE, 2.0)
            .with_weapon(weapon::HULL_DAMAGE, 2.0),
    );
    let ammo = b.register_outfit(
        Outfit::new("Cluster Ammo")
            .with_category("Ammunition")
            .with_attribute(attr::MASS, 1.0)
            .with_attribute(attr::OUTFIT_SPACE, -1.0),
    );
    b.register_outfit(
        Outfit::new("Cluster Missile")
            .with_category("Secondary Weapons")
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::OUTFIT_SPACE, -5.0)
            .with_attribute(attr::WEAPON_CAPACITY, -10.0)
            .with_attribute(attr::GUN_PORTS, -1.0)
            .with_weapon(weapon::RELOAD, 60.0)
            .with_weapon(weapon::VELOCITY, 6.0)
            .with_weapon(weapon::LIFETIME, 40.0)
            .with_weapon(weapon::MISSILE_STRENGTH, 10.0)
            .with_weapon(weapon::SHIELD_DAMAGE, 20.0)
            .with_weapon(weapon::HULL_DAMAGE, 20.0)
            .with_ammo(ammo)
            .with_die_effect(small_explosion, 1)
            .with_submunition(flechette, 3),
    );
    b.register_outfit(
        Outfit::new("Point Defense")
            .with_category("Turrets")
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::WEAPON_CAPACITY, -5.0)
            .with_attribute(attr::TURRET_MOUNTS, -1.0)
            .with_weapon(weapon::RELOAD, 5.0)
            .with_weapon(weapon::VELOCITY, 20.0)
            .with_weapon(weapon::LIFETIME, 10.0)
            .with_weapon(weapon::ANTI_MISSILE, 20.0)
            .with_weapon(weapon::TURRET_TURN, 15.0)
            .with_weapon(weapon::FIRING_ENERGY, 1.0)
            .with_hit_effect(flak, 1),
    );

    // Systems and equipment
    b.register_outfit(
        Outfit::new("Shield Generator")
            .with_category("Systems")
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::OUTFIT_SPACE, -10.0)
            .with_attribute(attr::SHIELD_GENERATION, 1.0)
            .with_attribute(attr::SHIELD_ENERGY, 0.5),
    );
    b.register_outfit(
        Outfit::new("Battery")
            .with_category("Power")
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::OUTFIT_SPACE, -5.0)
            .with_attribute(attr::ENERGY_CAPACITY, 500.0),
    );
    b.register_outfit(
        Outfit::new("Cargo Pod")
            .with_category("Systems")
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::OUTFIT_SPACE, -10.0)
            .with_attribute(attr::CARGO_SPACE, 20.0),
    );
    let hyperdrive = b.register_outfit(
        Outfit::new("Hyperdrive")
            .with_category("Systems")
            .with_attribute(attr::COST, 10000.0)
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::OUTFIT_SPACE, -10.0)
            .with_attribute(attr::HYPERDRIVE, 1.0),
    );
    b.register_outfit(
        Outfit::new("Jump Drive")
            .with_category("Systems")
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::OUTFIT_SPACE, -10.0)
            .with_attribute(attr::JUMP_DRIVE, 1.0)
            .with_attribute(attr::JUMP_RANGE, 200.0)
            .with_attribute(attr::JUMP_FUEL, 200.0),
    );
    b.register_outfit(
        Outfit::new("Ion Thruster")
            .with_category("Engines")
            .with_attribute(attr::MASS, 5.0)
            .with_attribute(attr::OUTFIT_SPACE, -5.0)
            .with_attribute(attr::THRUST, 10.0)
            .with_flare(SpriteHandle::new("flare/ion")),
    );

    // Galaxy
    let merchant = b.register_government("Merchant");
    let pirate = b.register_government("Pirate");
    let navy = b.register_government("Navy");
    b.declare_enemies(pirate, merchant).expect("fixture governments");
    b.declare_enemies(pirate, navy).expect("fixture governments");

    let sol = b.register_system("Sol", DVec2::ZERO);
    let alpha = b.register_system("Alpha", DVec2::new(100.0, 0.0));
    b.register_system("Far", DVec2::new(0.0, 150.0));
    b.link_systems(sol, alpha).expect("fixture systems");

    b.register_planet(Planet {
        name: "Earth".to_string(),
        system: sol,
        position: DVec2::new(500.0, 0.0),
        radius: 100.0,
        has_spaceport: true,
        government: None,
    });
    b.register_planet(Planet {
        name: "Pirate Den".to_string(),
        system: sol,
        position: DVec2::new(-500.0, 0.0),
        radius: 80.0,
        has_spaceport: false,
        government: Some(pirate),
    });

    // Ship models
    let blaster = b.outfit_id("Blaster").expect("fixture outfit");
    let mut kestrel = ShipModel::new(
        "Kestrel",
        Outfit::new("Kestrel")
            .with_attribute(attr::COST, 100000.0)
            .with_attribute(attr::MASS, 200.0)
            .with_attribute(attr::DRAG, 2.0)
            .with_attribute(attr::THRUST, 40.0)
            .with_attribute(attr::TURN, 2000.0)
            .with_attribute(attr::OUTFIT_SPACE, 100.0)
            .with_attribute(attr::WEAPON_CAPACITY, 40.0)
            .with_attribute(attr::CARGO_SPACE, 20.0)
            .with_attribute(attr::SHIELDS, 300.0)
            .with_attribute(attr::HULL, 400.0)
            .with_attribute(attr::FUEL_CAPACITY, 400.0)
            .with_attribute(attr::ENERGY_CAPACITY, 300.0)
            .with_attribute(attr::ENERGY_GENERATION, 1.0)
            .with_attribute(attr::HEAT_DISSIPATION, 0.05)
            .with_die_effect(small_explosion, 3)
            .with_die_effect(large_explosion, 1),
    );
    kestrel.description = "A versatile light warship.".to_string();
    kestrel.sprite = Some(SpriteHandle::new("ship/kestrel"));
    kestrel.gun_points = vec![DVec2::new(20.0, -5.0), DVec2::new(20.0, 5.0)];
    kestrel.turret_points = vec![DVec2::ZERO];
    kestrel.engine_points = vec![DVec2::new(-20.0, 0.0)];
    kestrel.outfits = vec![(blaster, 2), (hyperdrive, 1)];
    b.register_ship_model(kestrel);

    let mut shuttle = ShipModel::new(
        "Shuttle",
        Outfit::new("Shuttle")
            .with_attribute(attr::COST, 20000.0)
            .with_attribute(attr::MASS, 50.0)
            .with_attribute(attr::DRAG, 1.0)
            .with_attribute(attr::THRUST, 10.0)
            .with_attribute(attr::TURN, 200.0)
            .with_attribute(attr::OUTFIT_SPACE, 20.0)
            .with_attribute(attr::WEAPON_CAPACITY, 20.0)
            .with_attribute(attr::CARGO_SPACE, 10.0)
            .with_attribute(attr::SHIELDS, 10.0)
            .with_attribute(attr::HULL, 50.0)
            .with_attribute(attr::FUEL_CAPACITY, 200.0)
            .with_attribute(attr::ENERGY_CAPACITY, 100.0)
            .with_attribute(attr::HEAT_DISSIPATION, 0.1)
            .with_die_effect(small_explosion, 2),
    );
    shuttle.sprite = Some(SpriteHandle::new("ship/shuttle"));
    shuttle.gun_points = vec![DVec2::new(10.0, 0.0)];
    shuttle.engine_points = vec![DVec2::new(-10.0, 0.0)];
    b.register_ship_model(shuttle);

    b
}

/// The standard fixture catalog.
pub fn test_catalog() -> Arc<Catalog> {
    Arc::new(test_catalog_builder().build().expect("fixture catalog"))
}

// ===========================================================================
// Ship constructors
// ===========================================================================

/// A Kestrel: two blasters, a hyperdrive, one empty turret mount.
pub fn kestrel(catalog: &Arc<Catalog>) -> Ship {
    Ship::new(catalog, "Kestrel").expect("fixture model")
}

/// A Shuttle: 10 shields, 50 hull, one empty gun port.
pub fn shuttle(catalog: &Arc<Catalog>) -> Ship {
    Ship::new(catalog, "Shuttle").expect("fixture model")
}

/// Step a ship once, discarding everything it emits.
pub fn step_once(ship: &mut Ship) -> bool {
    ship.step(&mut Vec::new(), &mut Vec::new())
}

/// Look up an outfit by name.
pub fn outfit(catalog: &Catalog, name: &str) -> OutfitId {
    catalog.outfit_id(name).expect("fixture outfit")
}
