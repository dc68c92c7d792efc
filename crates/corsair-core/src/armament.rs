//! Weapon mounts and their reload timers.
//!
//! An [`Armament`] is an ordered list of hardpoints. Order is declaration
//! order and never changes: firing sweeps walk it front to back, so the
//! first mount in the list is the first to draw on shared ammunition.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::geometry::Angle;
use crate::id::{EffectId, GovernmentId, OutfitId};
use crate::outfit::{Outfit, weapon};
use crate::rng::SimRng;
use crate::spawn::{EffectSpawn, Origin, Projectile};

/// A single hardpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mount {
    weapon: Option<OutfitId>,
    /// Ticks until the mount may fire again.
    countdown: u32,
    is_anti_missile: bool,
    is_turret: bool,
    /// Offset from the ship center, in ship-local coordinates.
    point: DVec2,
    /// Aim relative to the ship's facing. Guns always point forward.
    aim: Angle,
}

impl Mount {
    fn empty(point: DVec2, is_turret: bool) -> Self {
        Self {
            weapon: None,
            countdown: 0,
            is_anti_missile: false,
            is_turret,
            point,
            aim: Angle::ZERO,
        }
    }

    fn install(&mut self, id: OutfitId, outfit: &Outfit) {
        self.weapon = Some(id);
        self.is_anti_missile = outfit.is_anti_missile();
        self.countdown = 0;
        self.aim = Angle::ZERO;
    }

    fn uninstall(&mut self) {
        self.weapon = None;
        self.is_anti_missile = false;
        self.countdown = 0;
        self.aim = Angle::ZERO;
    }

    pub fn weapon(&self) -> Option<OutfitId> {
        self.weapon
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn is_anti_missile(&self) -> bool {
        self.is_anti_missile
    }

    pub fn is_turret(&self) -> bool {
        self.is_turret
    }

    pub fn point(&self) -> DVec2 {
        self.point
    }

    pub fn aim(&self) -> Angle {
        self.aim
    }

    pub fn is_ready(&self) -> bool {
        self.weapon.is_some() && self.countdown == 0
    }

    /// Where a shot from this mount starts, given the ship's own origin.
    fn muzzle(&self, ship: Origin) -> Origin {
        let (sin, cos) = ship.angle.degrees().to_radians().sin_cos();
        let offset = DVec2::new(
            self.point.x * cos - self.point.y * sin,
            self.point.x * sin + self.point.y * cos,
        );
        Origin {
            position: ship.position + offset,
            velocity: ship.velocity,
            angle: ship.angle.rotated(self.aim.degrees()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Armament {
    mounts: Vec<Mount>,
}

impl Armament {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty forward-facing gun port.
    pub fn add_gun_port(&mut self, point: DVec2) {
        self.mounts.push(Mount::empty(point, false));
    }

    /// Append an empty turret mount.
    pub fn add_turret(&mut self, point: DVec2) {
        self.mounts.push(Mount::empty(point, true));
    }

    /// Append a new mount that already holds `outfit`. The mount kind
    /// follows the weapon.
    pub fn add_mount(&mut self, point: DVec2, id: OutfitId, outfit: &Outfit) {
        let mut mount = Mount::empty(point, outfit.is_turret());
        mount.install(id, outfit);
        self.mounts.push(mount);
    }

    /// Install one copy of a weapon in the first free mount of the matching
    /// kind. Returns false if every such mount is taken.
    pub fn add_weapon(&mut self, id: OutfitId, outfit: &Outfit) -> bool {
        let is_turret = outfit.is_turret();
        match self
            .mounts
            .iter_mut()
            .find(|m| m.weapon.is_none() && m.is_turret == is_turret)
        {
            Some(mount) => {
                mount.install(id, outfit);
                true
            }
            None => false,
        }
    }

    /// Overwrite mount `index` wholesale: weapon, reload countdown, and aim.
    /// Returns false if there is no such mount.
    pub(crate) fn restore_mount(
        &mut self,
        index: usize,
        weapon: Option<(OutfitId, &Outfit)>,
        countdown: u32,
        aim: Angle,
    ) -> bool {
        let Some(mount) = self.mounts.get_mut(index) else {
            return false;
        };
        match weapon {
            Some((id, outfit)) => mount.install(id, outfit),
            None => mount.uninstall(),
        }
        mount.countdown = countdown;
        mount.aim = aim;
        true
    }

    /// Empty up to `count` mounts holding `id`, starting from the back.
    /// Returns how many were emptied.
    pub fn remove_weapon(&mut self, id: OutfitId, count: u32) -> u32 {
        let mut removed = 0;
        for mount in self.mounts.iter_mut().rev() {
            if removed == count {
                break;
            }
            if mount.weapon == Some(id) {
                mount.uninstall();
                removed += 1;
            }
        }
        removed
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    pub fn mount(&self, index: usize) -> Option<&Mount> {
        self.mounts.get(index)
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    pub fn gun_count(&self) -> usize {
        self.mounts.iter().filter(|m| !m.is_turret).count()
    }

    pub fn turret_count(&self) -> usize {
        self.mounts.iter().filter(|m| m.is_turret).count()
    }

    /// How many mounts hold `id`.
    pub fn weapon_count(&self, id: OutfitId) -> usize {
        self.mounts.iter().filter(|m| m.weapon == Some(id)).count()
    }

    pub fn is_ready(&self, index: usize) -> bool {
        self.mounts.get(index).is_some_and(Mount::is_ready)
    }

    /// Advance every reload timer by one tick.
    pub fn step(&mut self) {
        for mount in &mut self.mounts {
            mount.countdown = mount.countdown.saturating_sub(1);
        }
    }

    /// Fire mount `index`. The projectile goes into `out` and the countdown
    /// is set to the weapon's reload. Resource checks belong to the caller.
    pub fn fire(
        &mut self,
        index: usize,
        catalog: &Catalog,
        origin: Origin,
        government: Option<GovernmentId>,
        out: &mut Vec<Projectile>,
    ) -> bool {
        let Some(mount) = self.mounts.get_mut(index) else {
            return false;
        };
        if !mount.is_ready() {
            return false;
        }
        let Some(id) = mount.weapon else {
            return false;
        };
        let Some(def) = catalog.outfit(id) else {
            return false;
        };
        out.push(Projectile::new(id, def, mount.muzzle(origin), government));
        mount.countdown = def.reload();
        true
    }

    /// Try to shoot down `missile` with anti-missile mount `index`.
    ///
    /// The shot is taken (and the mount reloads) whenever the missile is in
    /// range. Returns `None` if no shot was taken, otherwise whether the
    /// missile was destroyed. Hit effects of the anti-missile weapon are
    /// spawned on the missile either way.
    pub fn fire_anti_missile(
        &mut self,
        index: usize,
        catalog: &Catalog,
        origin: Origin,
        missile: &Projectile,
        rng: &mut SimRng,
        effects: &mut Vec<EffectSpawn>,
    ) -> Option<bool> {
        let mount = self.mounts.get_mut(index)?;
        if !mount.is_anti_missile || !mount.is_ready() {
            return None;
        }
        let def = mount.weapon.and_then(|id| catalog.outfit(id))?;
        let muzzle = mount.muzzle(origin);
        if muzzle.position.distance(missile.position) > def.range() {
            return None;
        }
        mount.countdown = def.reload();

        let hit_origin = Origin {
            position: missile.position,
            velocity: missile.velocity,
            angle: Angle::of(missile.position - muzzle.position),
        };
        spawn_all(def.hit_effects().iter(), hit_origin, effects);

        let strength = def.weapon_get(weapon::ANTI_MISSILE).to_num::<u64>();
        let resistance = missile.missile_strength(catalog).max(0) as u64;
        Some(rng.below(strength) >= rng.below(resistance))
    }

    /// Rotate turret `index` toward `desired` (relative to the ship's
    /// facing) by at most `turn_rate` degrees. Guns never turn.
    pub fn aim(&mut self, index: usize, desired: Angle, turn_rate: f64) {
        if let Some(mount) = self.mounts.get_mut(index)
            && mount.is_turret
            && mount.weapon.is_some()
        {
            mount.aim = mount.aim.turned_toward(desired, turn_rate);
        }
    }
}

fn spawn_all<'a>(
    table: impl Iterator<Item = (&'a EffectId, &'a i32)>,
    origin: Origin,
    effects: &mut Vec<EffectSpawn>,
) {
    for (&effect, &count) in table {
        for _ in 0..count.max(0) {
            effects.push(EffectSpawn::new(effect, origin));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn origin() -> Origin {
        Origin {
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            angle: Angle::ZERO,
        }
    }

    fn two_guns() -> Armament {
        let mut a = Armament::new();
        a.add_gun_port(DVec2::new(10.0, -4.0));
        a.add_gun_port(DVec2::new(10.0, 4.0));
        a.add_turret(DVec2::ZERO);
        a
    }

    #[test]
    fn weapons_fill_first_free_compatible_mount() {
        let catalog = test_catalog();
        let blaster = catalog.outfit_id("Blaster").unwrap();
        let turret = catalog.outfit_id("Point Defense").unwrap();
        let mut a = two_guns();

        assert!(a.add_weapon(turret, catalog.outfit(turret).unwrap()));
        assert_eq!(a.mount(2).unwrap().weapon(), Some(turret));
        assert!(a.mount(2).unwrap().is_anti_missile());

        assert!(a.add_weapon(blaster, catalog.outfit(blaster).unwrap()));
        assert!(a.add_weapon(blaster, catalog.outfit(blaster).unwrap()));
        assert!(!a.add_weapon(blaster, catalog.outfit(blaster).unwrap()));
        assert_eq!(a.weapon_count(blaster), 2);
        assert_eq!(a.gun_count(), 2);
        assert_eq!(a.turret_count(), 1);
    }

    #[test]
    fn fire_resets_countdown_to_reload() {
        let catalog = test_catalog();
        let id = catalog.outfit_id("Heavy Laser").unwrap();
        let mut a = Armament::new();
        a.add_mount(DVec2::ZERO, id, catalog.outfit(id).unwrap());
        let mut out = Vec::new();

        assert!(a.fire(0, &catalog, origin(), None, &mut out));
        assert_eq!(out.len(), 1);
        assert_eq!(a.mount(0).unwrap().countdown(), 20);

        for tick in 1..20 {
            a.step();
            assert!(!a.is_ready(0), "ready too early at T+{tick}");
            assert!(!a.fire(0, &catalog, origin(), None, &mut out));
        }
        a.step();
        assert!(a.is_ready(0));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_mount_never_ready() {
        let catalog = test_catalog();
        let mut a = two_guns();
        let mut out = Vec::new();
        assert!(!a.is_ready(0));
        assert!(!a.fire(0, &catalog, origin(), None, &mut out));
        assert!(!a.fire(99, &catalog, origin(), None, &mut out));
        assert!(out.is_empty());
    }

    #[test]
    fn muzzle_offset_rotates_with_ship() {
        let catalog = test_catalog();
        let blaster = catalog.outfit_id("Blaster").unwrap();
        let mut a = Armament::new();
        a.add_gun_port(DVec2::new(10.0, 0.0));
        a.add_weapon(blaster, catalog.outfit(blaster).unwrap());
        let ship = Origin {
            position: DVec2::new(100.0, 0.0),
            velocity: DVec2::ZERO,
            angle: Angle::from_degrees(90.0),
        };
        let mut out = Vec::new();
        a.fire(0, &catalog, ship, None, &mut out);
        assert!((out[0].position - DVec2::new(100.0, 10.0)).length() < 1e-9);
        assert!((out[0].velocity - DVec2::new(0.0, 10.0)).length() < 1e-9);
    }

    #[test]
    fn remove_weapon_empties_from_the_back() {
        let catalog = test_catalog();
        let blaster = catalog.outfit_id("Blaster").unwrap();
        let mut a = two_guns();
        a.add_weapon(blaster, catalog.outfit(blaster).unwrap());
        a.add_weapon(blaster, catalog.outfit(blaster).unwrap());

        assert_eq!(a.remove_weapon(blaster, 1), 1);
        assert_eq!(a.mount(0).unwrap().weapon(), Some(blaster));
        assert_eq!(a.mount(1).unwrap().weapon(), None);
        assert_eq!(a.remove_weapon(blaster, 5), 1);
        assert_eq!(a.weapon_count(blaster), 0);
    }

    #[test]
    fn turret_aim_is_rate_limited() {
        let catalog = test_catalog();
        let pd = catalog.outfit_id("Point Defense").unwrap();
        let blaster = catalog.outfit_id("Blaster").unwrap();
        let mut a = two_guns();
        a.add_weapon(pd, catalog.outfit(pd).unwrap());
        a.add_weapon(blaster, catalog.outfit(blaster).unwrap());

        a.aim(2, Angle::from_degrees(90.0), 15.0);
        assert!((a.mount(2).unwrap().aim().degrees() - 15.0).abs() < 1e-9);
        a.aim(0, Angle::from_degrees(90.0), 15.0);
        assert_eq!(a.mount(0).unwrap().aim(), Angle::ZERO);
    }

    #[test]
    fn anti_missile_reloads_and_spawns_effects_when_in_range() {
        let catalog = test_catalog();
        let pd = catalog.outfit_id("Point Defense").unwrap();
        let missile_id = catalog.outfit_id("Cluster Missile").unwrap();
        let mut a = Armament::new();
        a.add_turret(DVec2::ZERO);
        a.add_weapon(pd, catalog.outfit(pd).unwrap());
        let mut rng = SimRng::new(7);
        let mut effects = Vec::new();

        let far = Projectile::new(
            missile_id,
            catalog.outfit(missile_id).unwrap(),
            Origin {
                position: DVec2::new(10_000.0, 0.0),
                ..origin()
            },
            None,
        );
        assert_eq!(a.fire_anti_missile(0, &catalog, origin(), &far, &mut rng, &mut effects), None);
        assert!(a.is_ready(0));

        let near = Projectile {
            position: DVec2::new(50.0, 0.0),
            ..far
        };
        assert!(a.fire_anti_missile(0, &catalog, origin(), &near, &mut rng, &mut effects).is_some());
        assert!(!a.is_ready(0));
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn guns_cannot_shoot_down_missiles() {
        let catalog = test_catalog();
        let blaster = catalog.outfit_id("Blaster").unwrap();
        let missile_id = catalog.outfit_id("Cluster Missile").unwrap();
        let mut a = Armament::new();
        a.add_mount(DVec2::ZERO, blaster, catalog.outfit(blaster).unwrap());
        let missile = Projectile::new(missile_id, catalog.outfit(missile_id).unwrap(), origin(), None);
        let mut rng = SimRng::new(1);
        let mut effects = Vec::new();
        assert_eq!(a.fire_anti_missile(0, &catalog, origin(), &missile, &mut rng, &mut effects), None);
        assert!(a.is_ready(0));
    }
}
