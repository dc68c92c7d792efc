//! Corsair Core -- the ship simulation for a real-time space-combat game.
//!
//! This crate provides ships, their outfits and weapon mounts, the immutable
//! content catalog they are built from, and the deterministic per-tick update
//! that moves, recharges, lands, jumps, fights, and destroys them.
//!
//! # Per-Tick Ship Update
//!
//! Each call to [`ship::Ship::step`] advances one ship by one tick:
//!
//! 1. **Explosion** -- A dying ship emits its explosion effects and, on the
//!    final tick, reports that it should be removed.
//! 2. **Destruction check** -- A flying ship with no hull starts exploding.
//! 3. **Regeneration** -- Energy, fuel, shields, and hull regenerate; heat
//!    dissipates and the overheat latch updates.
//! 4. **Special states** -- Landing and hyperspace sequences advance.
//! 5. **Flight** -- Commanded turn and thrust are applied, drag is applied,
//!    position integrates, turrets track, carried ships launch.
//!
//! Firing is a separate call ([`ship::Ship::fire`]) so the owning world can
//! order weapons fire against collision resolution as it sees fit.
//!
//! # Key Types
//!
//! - [`ship::Ship`] -- One vessel: chassis, outfits, pools, and special state.
//! - [`outfit::Outfit`] -- Attribute sheet shared by equipment and chassis.
//! - [`armament::Armament`] -- Gun ports and turrets with reload countdowns.
//! - [`catalog::Catalog`] -- Immutable content registry (frozen at startup).
//! - [`spawn::Projectile`] -- In-flight weapon fire produced by a ship.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic pools.
//! - [`serialize`] -- Versioned ship records and snapshots via bitcode.

pub mod armament;
pub mod catalog;
pub mod config;
#[cfg(feature = "data-loader")]
pub mod data_loader;
pub mod fixed;
pub mod geometry;
pub mod id;
pub mod outfit;
pub mod rng;
pub mod serialize;
pub mod ship;
pub mod sim;
pub mod spawn;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
