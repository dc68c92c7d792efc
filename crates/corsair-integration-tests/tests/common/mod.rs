//! A minimal world driver shared by the integration tests.
//!
//! Ships live in a slot map so removals never invalidate the keys the tests
//! hold. Each tick: ships step, removals and launches are applied, ships
//! fire, then projectiles move and resolve against point defense and hulls.

#![allow(dead_code)]

use std::sync::Arc;

use corsair_core::catalog::Catalog;
use corsair_core::id::{EffectId, OutfitId};
use corsair_core::ship::Ship;
use corsair_core::spawn::{EffectSpawn, Projectile};
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    pub struct ShipKey;
}

/// Projectiles within this distance of a hostile ship hit it.
pub const HIT_RADIUS: f64 = 20.0;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WeaponTally {
    pub fired: usize,
    pub hits: usize,
    pub intercepted: usize,
    pub expired: usize,
}

pub struct Arena {
    pub catalog: Arc<Catalog>,
    pub ships: SlotMap<ShipKey, Ship>,
    pub projectiles: Vec<Projectile>,
    pub effects: Vec<EffectSpawn>,
    pub removed: Vec<ShipKey>,
    pub tallies: std::collections::BTreeMap<OutfitId, WeaponTally>,
    pub tick: u64,
}

impl Arena {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            ships: SlotMap::with_key(),
            projectiles: Vec::new(),
            effects: Vec::new(),
            removed: Vec::new(),
            tallies: Default::default(),
            tick: 0,
        }
    }

    pub fn add(&mut self, ship: Ship) -> ShipKey {
        self.ships.insert(ship)
    }

    pub fn ship(&self, key: ShipKey) -> Option<&Ship> {
        self.ships.get(key)
    }

    pub fn ship_mut(&mut self, key: ShipKey) -> Option<&mut Ship> {
        self.ships.get_mut(key)
    }

    pub fn tally(&self, weapon: OutfitId) -> WeaponTally {
        self.tallies.get(&weapon).cloned().unwrap_or_default()
    }

    pub fn effect_count(&self, effect: EffectId) -> usize {
        self.effects.iter().filter(|e| e.effect == effect).count()
    }

    pub fn step(&mut self) {
        // Ships
        let mut launched = Vec::new();
        let mut finished = Vec::new();
        for (key, ship) in &mut self.ships {
            ship.mark_tracked();
            if ship.step(&mut self.effects, &mut launched) {
                finished.push(key);
            }
        }
        for key in finished {
            self.ships.remove(key);
            self.removed.push(key);
        }
        for ship in launched {
            self.ships.insert(ship);
        }

        // Weapons fire
        let before = self.projectiles.len();
        for ship in self.ships.values_mut() {
            ship.fire(&mut self.projectiles);
        }
        for p in &self.projectiles[before..] {
            self.tallies.entry(p.weapon).or_default().fired += 1;
        }

        // Projectiles
        let catalog = Arc::clone(&self.catalog);
        let mut spawned = Vec::new();
        let mut live = Vec::with_capacity(self.projectiles.len());
        for mut p in std::mem::take(&mut self.projectiles) {
            if !p.step(&catalog, &mut self.effects, &mut spawned) {
                self.tallies.entry(p.weapon).or_default().expired += 1;
                continue;
            }

            if p.missile_strength(&catalog) > 0 {
                let intercepted = self.ships.values_mut().any(|ship| {
                    catalog.is_enemy(ship.government(), p.government)
                        && ship.fire_anti_missile(&p, &mut self.effects)
                });
                if intercepted {
                    self.tallies.entry(p.weapon).or_default().intercepted += 1;
                    continue;
                }
            }

            let target = self.ships.values_mut().find(|ship| {
                ship.is_targetable()
                    && catalog.is_enemy(ship.government(), p.government)
                    && ship.position().distance(p.position) < HIT_RADIUS
            });
            if let Some(ship) = target
                && ship.take_damage(&p)
            {
                p.hit(&catalog, &mut self.effects);
                self.tallies.entry(p.weapon).or_default().hits += 1;
                continue;
            }
            live.push(p);
        }
        for p in &spawned {
            self.tallies.entry(p.weapon).or_default().fired += 1;
        }
        live.append(&mut spawned);
        self.projectiles = live;
        self.tick += 1;
    }

    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Combined hash of every live ship, in key order.
    pub fn state_hash(&self) -> u64 {
        self.ships
            .values()
            .fold(0u64, |acc, ship| acc.rotate_left(7) ^ ship.state_hash())
    }
}
