//! By-value records a ship produces during a tick.
//!
//! Ships never hold a shared registry of live projectiles or effects. They
//! push fresh records into `Vec`s supplied by the driver, which owns them
//! from then on.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::geometry::Angle;
use crate::id::{EffectId, GovernmentId, OutfitId};
use crate::outfit::{Outfit, weapon};

/// Where a shot or an effect starts out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Origin {
    pub position: DVec2,
    pub velocity: DVec2,
    pub angle: Angle,
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub weapon: OutfitId,
    pub position: DVec2,
    pub velocity: DVec2,
    pub angle: Angle,
    /// Ticks until the projectile expires.
    pub lifetime: u32,
    /// Government of the ship that fired it; `None` for stray fire.
    pub government: Option<GovernmentId>,
}

impl Projectile {
    /// A fresh shot from `weapon`, inheriting the shooter's velocity.
    pub fn new(
        weapon_id: OutfitId,
        weapon_def: &Outfit,
        origin: Origin,
        government: Option<GovernmentId>,
    ) -> Self {
        let speed = weapon_def.weapon_get_f64(weapon::VELOCITY);
        Self {
            weapon: weapon_id,
            position: origin.position,
            velocity: origin.velocity + origin.angle.unit() * speed,
            angle: origin.angle,
            lifetime: weapon_def.lifetime(),
            government,
        }
    }

    /// How hard this projectile is to shoot down. Zero means it is not a
    /// missile at all.
    pub fn missile_strength(&self, catalog: &Catalog) -> i64 {
        catalog
            .outfit(self.weapon)
            .map(|w| w.weapon_get(weapon::MISSILE_STRENGTH).to_num::<i64>())
            .unwrap_or(0)
    }

    /// Advance one tick. When the projectile expires, its die effects and
    /// submunitions are pushed into the outputs and `false` is returned.
    pub fn step(
        &mut self,
        catalog: &Catalog,
        effects: &mut Vec<EffectSpawn>,
        projectiles: &mut Vec<Projectile>,
    ) -> bool {
        self.position += self.velocity;
        self.lifetime = self.lifetime.saturating_sub(1);
        if self.lifetime > 0 {
            return true;
        }
        self.expire(catalog, effects, projectiles);
        false
    }

    /// Release die effects and submunitions at the current position.
    pub fn expire(
        &self,
        catalog: &Catalog,
        effects: &mut Vec<EffectSpawn>,
        projectiles: &mut Vec<Projectile>,
    ) {
        let Some(def) = catalog.outfit(self.weapon) else {
            return;
        };
        let origin = self.origin();
        for (&effect, &count) in def.die_effects() {
            for _ in 0..count.max(0) {
                effects.push(EffectSpawn::new(effect, origin));
            }
        }
        for (&sub, &count) in def.submunitions() {
            let Some(sub_def) = catalog.outfit(sub) else {
                continue;
            };
            for _ in 0..count.max(0) {
                projectiles.push(Projectile::new(sub, sub_def, origin, self.government));
            }
        }
    }

    /// Hit effects for an impact at the current position.
    pub fn hit(&self, catalog: &Catalog, effects: &mut Vec<EffectSpawn>) {
        let Some(def) = catalog.outfit(self.weapon) else {
            return;
        };
        let origin = self.origin();
        for (&effect, &count) in def.hit_effects() {
            for _ in 0..count.max(0) {
                effects.push(EffectSpawn::new(effect, origin));
            }
        }
    }

    pub fn origin(&self) -> Origin {
        Origin {
            position: self.position,
            velocity: self.velocity,
            angle: self.angle,
        }
    }
}

/// A visual effect to be animated by the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSpawn {
    pub effect: EffectId,
    pub position: DVec2,
    pub velocity: DVec2,
    pub angle: Angle,
}

impl EffectSpawn {
    pub fn new(effect: EffectId, origin: Origin) -> Self {
        Self {
            effect,
            position: origin.position,
            velocity: origin.velocity,
            angle: origin.angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn still() -> Origin {
        Origin {
            position: DVec2::ZERO,
            velocity: DVec2::new(1.0, 0.0),
            angle: Angle::from_degrees(0.0),
        }
    }

    #[test]
    fn projectile_inherits_shooter_velocity() {
        let catalog = test_catalog();
        let id = catalog.outfit_id("Blaster").unwrap();
        let p = Projectile::new(id, catalog.outfit(id).unwrap(), still(), None);
        assert_eq!(p.velocity, DVec2::new(11.0, 0.0));
        assert_eq!(p.lifetime, 30);
    }

    #[test]
    fn projectile_expires_into_effects_and_submunitions() {
        let catalog = test_catalog();
        let id = catalog.outfit_id("Cluster Missile").unwrap();
        let mut p = Projectile::new(id, catalog.outfit(id).unwrap(), still(), None);
        let mut effects = Vec::new();
        let mut spawned = Vec::new();

        let mut alive = true;
        let mut ticks = 0;
        while alive {
            alive = p.step(&catalog, &mut effects, &mut spawned);
            ticks += 1;
        }

        assert_eq!(ticks, 40);
        assert_eq!(effects.len(), 1);
        assert_eq!(spawned.len(), 3);
        assert!(spawned.iter().all(|s| s.weapon == catalog.outfit_id("Flechette").unwrap()));
    }

    #[test]
    fn hit_spawns_hit_effects() {
        let catalog = test_catalog();
        let id = catalog.outfit_id("Blaster").unwrap();
        let p = Projectile::new(id, catalog.outfit(id).unwrap(), still(), None);
        let mut effects = Vec::new();
        p.hit(&catalog, &mut effects);
        assert_eq!(effects.len(), 2);
        assert!(effects.iter().all(|e| e.effect == catalog.effect_id("spark").unwrap()));
    }

    #[test]
    fn missile_strength_reads_weapon() {
        let catalog = test_catalog();
        let missile = catalog.outfit_id("Cluster Missile").unwrap();
        let blaster = catalog.outfit_id("Blaster").unwrap();
        let m = Projectile::new(missile, catalog.outfit(missile).unwrap(), still(), None);
        let b = Projectile::new(blaster, catalog.outfit(blaster).unwrap(), still(), None);
        assert_eq!(m.missile_strength(&catalog), 10);
        assert_eq!(b.missile_strength(&catalog), 0);
    }
}
