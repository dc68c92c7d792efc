//! Invariant audits and determinism checks for ships.
//!
//! [`audit_ship`] recomputes a ship's derived attributes from its chassis and
//! installed outfits and reports every attribute that drifted.
//! [`audit_armament`] checks that mounted weapons match installed weapon
//! outfits. [`diff_ships`] compares two ships field by field, for finding
//! where two supposedly identical simulations diverged.

use std::collections::BTreeSet;

use crate::fixed::Fixed64;
use crate::id::OutfitId;
use crate::outfit::combined;
use crate::ship::Ship;

// ---------------------------------------------------------------------------
// Attribute audit
// ---------------------------------------------------------------------------

/// One attribute whose derived value is not chassis + outfits.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDrift {
    pub attribute: String,
    pub expected: Fixed64,
    pub actual: Fixed64,
}

/// Recompute derived attributes and report any mismatch. An empty result
/// means the ship is consistent.
pub fn audit_ship(ship: &Ship) -> Vec<AttributeDrift> {
    let catalog = ship.catalog();
    let expected = combined(
        ship.base_attributes(),
        ship.outfits()
            .iter()
            .filter_map(|(&id, &count)| Some((catalog.outfit(id)?, count))),
    );
    let actual = ship.attributes();

    let names: BTreeSet<&String> = expected
        .attributes()
        .keys()
        .chain(actual.attributes().keys())
        .collect();
    names
        .into_iter()
        .filter_map(|name| {
            let (e, a) = (expected.get(name), actual.get(name));
            (e != a).then(|| AttributeDrift {
                attribute: name.clone(),
                expected: e,
                actual: a,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Armament audit
// ---------------------------------------------------------------------------

/// A weapon outfit whose installed count differs from the mounts holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct MountDrift {
    pub weapon: OutfitId,
    pub installed: i32,
    pub mounted: usize,
}

pub fn audit_armament(ship: &Ship) -> Vec<MountDrift> {
    let catalog = ship.catalog();
    let mut weapons: BTreeSet<OutfitId> = ship
        .outfits()
        .keys()
        .copied()
        .filter(|&id| catalog.outfit(id).is_some_and(|o| o.is_weapon()))
        .collect();
    weapons.extend(ship.armament().mounts().iter().filter_map(|m| m.weapon()));

    weapons
        .into_iter()
        .filter_map(|weapon| {
            let installed = ship.outfit_count(weapon);
            let mounted = ship.armament().weapon_count(weapon);
            (installed.max(0) as usize != mounted).then_some(MountDrift {
                weapon,
                installed,
                mounted,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Ship diff
// ---------------------------------------------------------------------------

/// Which parts of two ships differ.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipDiff {
    pub kinematics: bool,
    pub pools: bool,
    pub outfits: bool,
    pub cargo: bool,
    pub special_state: bool,
    pub armament: bool,
    /// Targets, RNG, and the forget and overheat bookkeeping.
    pub runtime: bool,
}

impl ShipDiff {
    pub fn is_identical(&self) -> bool {
        *self == ShipDiff::default()
    }
}

pub fn diff_ships(a: &Ship, b: &Ship) -> ShipDiff {
    let pools = |s: &Ship| {
        [
            s.shield_points(),
            s.hull_points(),
            s.fuel_amount(),
            s.energy_amount(),
            s.heat_amount(),
        ]
    };
    ShipDiff {
        kinematics: a.position() != b.position()
            || a.velocity() != b.velocity()
            || a.facing() != b.facing(),
        pools: pools(a) != pools(b),
        outfits: a.outfits() != b.outfits(),
        cargo: a.cargo() != b.cargo(),
        special_state: a.special_state() != b.special_state(),
        armament: a.armament() != b.armament(),
        runtime: a.target_planet() != b.target_planet()
            || a.target_system() != b.target_system()
            || a.rng_state() != b.rng_state()
            || a.forget_countdown() != b.forget_countdown()
            || a.is_overheated() != b.is_overheated(),
    }
}
