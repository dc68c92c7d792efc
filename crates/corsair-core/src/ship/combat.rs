//! Damage, disabling, and firing.

use std::sync::Arc;

use tracing::trace;

use super::{Ship, SpecialState};
use crate::fixed::{Fixed64, fraction};
use crate::id::OutfitId;
use crate::outfit::{attr, weapon};
use crate::spawn::{EffectSpawn, Projectile};

impl Ship {
    /// Too damaged (or too hot) to fire or maneuver.
    pub fn is_disabled(&self) -> bool {
        self.is_hull_disabled() || self.is_overheated
    }

    /// Hull-disabled with the shields down as well. Boarding is only
    /// possible in this state.
    pub fn is_fully_disabled(&self) -> bool {
        let max_shields = self.attributes.get(attr::SHIELDS);
        let threshold = self.catalog.config().disabled_shield_fraction;
        self.is_hull_disabled()
            && (max_shields <= Fixed64::ZERO || fraction(self.shields, max_shields) <= threshold)
    }

    fn is_hull_disabled(&self) -> bool {
        let max_hull = self.attributes.get(attr::HULL);
        max_hull > Fixed64::ZERO
            && fraction(self.hull, max_hull) < self.catalog.config().disabled_hull_fraction
    }

    /// Apply a projectile hit. Only targetable ships take damage. Returns
    /// whether the hit landed.
    ///
    /// Shields soak shield damage first. Whatever fraction of the shot the
    /// shields could not absorb carries the same fraction of the hull
    /// damage through to the hull.
    pub fn take_damage(&mut self, projectile: &Projectile) -> bool {
        if !self.is_targetable() {
            return false;
        }
        let catalog = Arc::clone(&self.catalog);
        let Some(def) = catalog.outfit(projectile.weapon) else {
            return false;
        };
        let shield_damage = def.shield_damage();
        let hull_damage = def.hull_damage();

        let hull_loss = if shield_damage > Fixed64::ZERO {
            let unabsorbed = (shield_damage - self.shields).max(Fixed64::ZERO);
            self.shields = (self.shields - shield_damage).max(Fixed64::ZERO);
            hull_damage
                .saturating_mul(unabsorbed)
                .checked_div(shield_damage)
                .unwrap_or(Fixed64::ZERO)
        } else {
            hull_damage
        };
        self.hull = (self.hull - hull_loss).max(Fixed64::ZERO);
        self.heat = self.heat.saturating_add(def.weapon_get(weapon::HEAT_DAMAGE));

        let force = def.weapon_get_f64(weapon::HIT_FORCE);
        if force != 0.0 {
            let direction = projectile.velocity.normalize_or_zero();
            self.apply_force(direction * force);
        }

        trace!(
            ship = %self.name,
            weapon = def.name(),
            shields = %self.shields,
            hull = %self.hull,
            "hit"
        );
        true
    }

    /// Whether the ship can pay for one shot of `weapon`: ammunition aboard,
    /// and enough energy and fuel.
    pub fn can_fire(&self, weapon_id: OutfitId) -> bool {
        let Some(def) = self.catalog.outfit(weapon_id) else {
            return false;
        };
        if !def.is_weapon() {
            return false;
        }
        if let Some(ammo) = def.ammo()
            && self.outfit_count(ammo) <= 0
        {
            return false;
        }
        self.energy >= def.weapon_get(weapon::FIRING_ENERGY)
            && self.fuel >= def.weapon_get(weapon::FIRING_FUEL)
    }

    /// Pay for one shot of `weapon`: energy, fuel, heat, and one round of
    /// ammunition.
    pub fn expend_ammo(&mut self, weapon_id: OutfitId) {
        let catalog = Arc::clone(&self.catalog);
        let Some(def) = catalog.outfit(weapon_id) else {
            return;
        };
        self.energy = (self.energy - def.weapon_get(weapon::FIRING_ENERGY)).max(Fixed64::ZERO);
        self.fuel = (self.fuel - def.weapon_get(weapon::FIRING_FUEL)).max(Fixed64::ZERO);
        self.heat = self.heat.saturating_add(def.weapon_get(weapon::FIRING_HEAT));
        if let Some(ammo) = def.ammo() {
            self.add_outfit(ammo, -1);
        }
    }

    /// Fire every ready weapon the ship can pay for, in mount order, if the
    /// fire command is set. Anti-missile mounts are left alone. Returns
    /// whether anything fired.
    pub fn fire(&mut self, projectiles: &mut Vec<Projectile>) -> bool {
        if !self.command.fire
            || !matches!(self.state, SpecialState::Flying)
            || self.hull <= Fixed64::ZERO
            || self.is_disabled()
        {
            return false;
        }
        let catalog = Arc::clone(&self.catalog);
        let mut fired = false;
        for index in 0..self.armament.len() {
            let Some(mount) = self.armament.mount(index) else {
                continue;
            };
            if mount.is_anti_missile() || !mount.is_ready() {
                continue;
            }
            let Some(weapon_id) = mount.weapon() else {
                continue;
            };
            if !self.can_fire(weapon_id) {
                continue;
            }
            let origin = self.origin();
            if self
                .armament
                .fire(index, &catalog, origin, self.government, projectiles)
            {
                self.expend_ammo(weapon_id);
                self.recoil(weapon_id);
                trace!(ship = %self.name, mount = index, weapon = ?weapon_id, "fired");
                fired = true;
            }
        }
        fired
    }

    /// Try to shoot down an incoming missile with a ready anti-missile
    /// mount. Returns true if the missile was destroyed.
    pub fn fire_anti_missile(&mut self, missile: &Projectile, effects: &mut Vec<EffectSpawn>) -> bool {
        if !matches!(self.state, SpecialState::Flying)
            || self.hull <= Fixed64::ZERO
            || self.is_disabled()
        {
            return false;
        }
        let catalog = Arc::clone(&self.catalog);
        if missile.missile_strength(&catalog) <= 0 {
            return false;
        }
        for index in 0..self.armament.len() {
            let Some(weapon_id) = self
                .armament
                .mount(index)
                .filter(|m| m.is_anti_missile() && m.is_ready())
                .and_then(|m| m.weapon())
            else {
                continue;
            };
            if !self.can_fire(weapon_id) {
                continue;
            }
            let origin = self.origin();
            let Some(destroyed) = self.armament.fire_anti_missile(
                index,
                &catalog,
                origin,
                missile,
                &mut self.rng,
                effects,
            ) else {
                continue;
            };
            self.expend_ammo(weapon_id);
            trace!(ship = %self.name, mount = index, destroyed, "anti-missile fired");
            if destroyed {
                return true;
            }
        }
        false
    }

    fn recoil(&mut self, weapon_id: OutfitId) {
        let force = self
            .catalog
            .outfit(weapon_id)
            .map(|w| w.weapon_get_f64(weapon::FIRING_FORCE))
            .unwrap_or(0.0);
        if force != 0.0 {
            self.apply_force(-self.angle.unit() * force);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Angle;
    use crate::ship::Command;
    use crate::spawn::Origin;
    use crate::test_utils::*;
    use glam::DVec2;

    fn shot(catalog: &crate::catalog::Catalog, weapon_name: &str) -> Projectile {
        let id = catalog.outfit_id(weapon_name).unwrap();
        Projectile::new(
            id,
            catalog.outfit(id).unwrap(),
            Origin {
                position: DVec2::ZERO,
                velocity: DVec2::ZERO,
                angle: Angle::ZERO,
            },
            None,
        )
    }

    fn firing() -> Command {
        Command {
            fire: true,
            ..Command::default()
        }
    }

    #[test]
    fn shields_absorb_then_spill_to_hull() {
        let catalog = test_catalog();
        let mut ship = shuttle(&catalog);
        assert_eq!(ship.shield_points(), fixed(10.0));
        assert_eq!(ship.hull_points(), fixed(50.0));

        assert!(ship.take_damage(&shot(&catalog, "Heavy Laser")));
        assert_eq!(ship.shield_points(), fixed(0.0));
        assert_eq!(ship.hull_points(), fixed(45.0));
    }

    #[test]
    fn hull_only_damage_bypasses_shields() {
        let catalog = test_catalog();
        let mut ship = shuttle(&catalog);
        ship.take_damage(&shot(&catalog, "Ion Cannon"));
        assert_eq!(ship.shield_points(), fixed(10.0));
        assert_eq!(ship.hull_points(), fixed(40.0));
        assert_eq!(ship.heat_amount(), fixed(30.0));
    }

    #[test]
    fn hit_force_pushes_ship() {
        let catalog = test_catalog();
        let mut ship = shuttle(&catalog);
        ship.take_damage(&shot(&catalog, "Ion Cannon"));
        // 100 force on 50 tons along the shot's direction.
        assert_eq!(ship.velocity(), DVec2::new(2.0, 0.0));
    }

    #[test]
    fn hull_at_zero_explodes_on_next_step() {
        let catalog = test_catalog();
        let mut ship = shuttle(&catalog);
        for _ in 0..20 {
            ship.take_damage(&shot(&catalog, "Heavy Laser"));
        }
        assert_eq!(ship.hull_points(), fixed(0.0));
        assert!(!ship.is_targetable());
        assert!(!ship.is_exploding());
        assert!(!ship.take_damage(&shot(&catalog, "Heavy Laser")));

        step_once(&mut ship);
        assert!(ship.is_exploding());
    }

    #[test]
    fn disabled_below_half_hull() {
        let catalog = test_catalog();
        let mut ship = shuttle(&catalog);
        ship.set_pools(fixed(5.0), fixed(25.0), ship.fuel_amount(), ship.energy_amount(), fixed(0.0));
        assert!(!ship.is_disabled());
        ship.set_pools(fixed(5.0), fixed(24.0), ship.fuel_amount(), ship.energy_amount(), fixed(0.0));
        assert!(ship.is_disabled());
        assert!(!ship.is_fully_disabled());
        ship.set_pools(fixed(0.0), fixed(24.0), ship.fuel_amount(), ship.energy_amount(), fixed(0.0));
        assert!(ship.is_fully_disabled());
    }

    #[test]
    fn fire_pays_for_shots_and_reloads() {
        let catalog = test_catalog();
        let mut ship = kestrel(&catalog);
        ship.set_command(firing());
        let energy = ship.energy_amount();
        let mut projectiles = Vec::new();

        assert!(ship.fire(&mut projectiles));
        assert_eq!(projectiles.len(), 2);
        assert_eq!(ship.energy_amount(), energy - fixed(4.0));
        assert_eq!(ship.heat_amount(), fixed(2.0));

        // Blasters reload in 10 ticks.
        assert!(!ship.fire(&mut projectiles));
        for _ in 0..10 {
            step_once(&mut ship);
        }
        assert!(ship.fire(&mut projectiles));
        assert_eq!(projectiles.len(), 4);
    }

    #[test]
    fn no_fire_without_command_or_energy() {
        let catalog = test_catalog();
        let mut ship = kestrel(&catalog);
        let mut projectiles = Vec::new();
        assert!(!ship.fire(&mut projectiles));

        ship.set_command(firing());
        ship.set_pools(
            ship.shield_points(),
            ship.hull_points(),
            ship.fuel_amount(),
            fixed(1.0),
            fixed(0.0),
        );
        assert!(!ship.fire(&mut projectiles));
        assert!(projectiles.is_empty());
    }

    #[test]
    fn ammunition_is_consumed_and_limits_fire() {
        let catalog = test_catalog();
        let mut ship = shuttle(&catalog);
        let launcher = catalog.outfit_id("Cluster Missile").unwrap();
        let ammo = catalog.outfit_id("Cluster Ammo").unwrap();
        assert_eq!(ship.add_outfit(launcher, 1), 1);
        assert!(!ship.can_fire(launcher));

        ship.add_outfit(ammo, 2);
        assert!(ship.can_fire(launcher));
        ship.expend_ammo(launcher);
        ship.expend_ammo(launcher);
        assert_eq!(ship.outfit_count(ammo), 0);
        assert!(!ship.can_fire(launcher));
    }

    #[test]
    fn first_declared_mount_gets_the_last_round() {
        let catalog = test_catalog();
        let mut ship = kestrel(&catalog);
        let blaster = catalog.outfit_id("Blaster").unwrap();
        let launcher = catalog.outfit_id("Cluster Missile").unwrap();
        let ammo = catalog.outfit_id("Cluster Ammo").unwrap();
        assert_eq!(ship.add_outfit(blaster, -2), -2);
        assert_eq!(ship.add_outfit(launcher, 2), 2);
        assert_eq!(ship.add_outfit(ammo, 1), 1);
        ship.set_command(firing());

        let mut projectiles = Vec::new();
        assert!(ship.fire(&mut projectiles));
        assert_eq!(projectiles.len(), 1);
        // Mount 0 sits at (20, -5).
        assert_eq!(projectiles[0].position, DVec2::new(20.0, -5.0));
        assert_eq!(ship.outfit_count(ammo), 0);

        let mounts = ship.armament().mounts();
        assert_eq!(mounts[0].countdown(), 60);
        assert_eq!(mounts[1].weapon(), Some(launcher));
        assert!(mounts[1].is_ready());
        assert!(!ship.can_fire(launcher));
    }

    #[test]
    fn recoil_pushes_backwards() {
        let catalog = test_catalog();
        let mut ship = shuttle(&catalog);
        let laser = catalog.outfit_id("Heavy Laser").unwrap();
        assert_eq!(ship.add_outfit(laser, 1), 1);
        ship.set_command(firing());
        let mut projectiles = Vec::new();
        assert!(ship.fire(&mut projectiles));
        assert!(ship.velocity().x < 0.0);
    }

    #[test]
    fn exploding_ship_is_inert() {
        let catalog = test_catalog();
        let mut ship = kestrel(&catalog);
        ship.set_pools(fixed(0.0), fixed(0.0), ship.fuel_amount(), ship.energy_amount(), fixed(0.0));
        step_once(&mut ship);
        assert!(ship.is_exploding());

        ship.set_command(Command {
            fire: true,
            thrust: 1.0,
            ..Command::default()
        });
        let mut projectiles = Vec::new();
        assert!(!ship.fire(&mut projectiles));
        assert!(!ship.take_damage(&shot(&catalog, "Blaster")));
        step_once(&mut ship);
        assert!(ship.engine_points().is_empty());
        assert_eq!(ship.velocity(), DVec2::ZERO);
    }

    #[test]
    fn anti_missile_ignores_plain_shots() {
        let catalog = test_catalog();
        let mut ship = kestrel(&catalog);
        ship.add_outfit(catalog.outfit_id("Point Defense").unwrap(), 1);
        let mut effects = Vec::new();
        assert!(!ship.fire_anti_missile(&shot(&catalog, "Blaster"), &mut effects));
        assert!(effects.is_empty());
    }

    #[test]
    fn anti_missile_engages_missiles_in_range() {
        let catalog = test_catalog();
        let mut ship = kestrel(&catalog);
        let pd = catalog.outfit_id("Point Defense").unwrap();
        ship.add_outfit(pd, 1);
        let energy = ship.energy_amount();
        let mut missile = shot(&catalog, "Cluster Missile");
        missile.position = DVec2::new(60.0, 0.0);
        let mut effects = Vec::new();

        ship.fire_anti_missile(&missile, &mut effects);
        assert_eq!(effects.len(), 1);
        assert_eq!(ship.energy_amount(), energy - fixed(1.0));
        let mount = ship
            .armament()
            .mounts()
            .iter()
            .find(|m| m.weapon() == Some(pd))
            .unwrap();
        assert!(!mount.is_ready());
    }
}
