//! Outfits: sparse attribute sheets for chassis, equipment, and weapons.
//!
//! An [`Outfit`] maps attribute names to [`Fixed64`] magnitudes. Missing
//! attributes read as zero. Two sheets live side by side:
//!
//! - **attributes** -- chassis/equipment values that combine additively into
//!   a ship's derived totals (mass, cost, capacities, rates).
//! - **weapon** -- per-shot values read when the outfit is fired (reload,
//!   damage, velocity, lifetime, ...). These never combine.
//!
//! # Capacities
//!
//! Capacities are positive on the chassis (`outfit space = 100`) and
//! consumption is negative on equipment (`outfit space = -30`). Summing the
//! chassis with its equipment therefore yields the free margin, and
//! [`Outfit::can_add`] clamps any install or removal that would push a margin
//! below zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, f64_to_fixed64, fixed64_to_f64, scale};
use crate::id::{EffectId, OutfitId, SpriteHandle};

/// Common attribute names read by the simulation.
pub mod attr {
    pub const MASS: &str = "mass";
    pub const COST: &str = "cost";
    pub const DRAG: &str = "drag";
    pub const THRUST: &str = "thrust";
    pub const TURN: &str = "turn";
    pub const OUTFIT_SPACE: &str = "outfit space";
    pub const WEAPON_CAPACITY: &str = "weapon capacity";
    pub const CARGO_SPACE: &str = "cargo space";
    pub const GUN_PORTS: &str = "gun ports";
    pub const TURRET_MOUNTS: &str = "turret mounts";
    pub const SHIELDS: &str = "shields";
    pub const HULL: &str = "hull";
    pub const FUEL_CAPACITY: &str = "fuel capacity";
    pub const ENERGY_CAPACITY: &str = "energy capacity";
    pub const SHIELD_GENERATION: &str = "shield generation";
    pub const SHIELD_ENERGY: &str = "shield energy";
    pub const HULL_REPAIR_RATE: &str = "hull repair rate";
    pub const HULL_ENERGY: &str = "hull energy";
    pub const ENERGY_GENERATION: &str = "energy generation";
    pub const ENERGY_CONSUMPTION: &str = "energy consumption";
    pub const FUEL_GENERATION: &str = "fuel generation";
    pub const HEAT_GENERATION: &str = "heat generation";
    pub const HEAT_DISSIPATION: &str = "heat dissipation";
    pub const THRUSTING_ENERGY: &str = "thrusting energy";
    pub const THRUSTING_HEAT: &str = "thrusting heat";
    pub const TURNING_ENERGY: &str = "turning energy";
    pub const TURNING_HEAT: &str = "turning heat";
    pub const HYPERDRIVE: &str = "hyperdrive";
    pub const JUMP_DRIVE: &str = "jump drive";
    pub const JUMP_RANGE: &str = "jump range";
    pub const JUMP_FUEL: &str = "jump fuel";
}

/// Weapon attribute names.
pub mod weapon {
    pub const RELOAD: &str = "reload";
    pub const VELOCITY: &str = "velocity";
    pub const LIFETIME: &str = "lifetime";
    pub const SHIELD_DAMAGE: &str = "shield damage";
    pub const HULL_DAMAGE: &str = "hull damage";
    pub const HEAT_DAMAGE: &str = "heat damage";
    pub const BLAST_RADIUS: &str = "blast radius";
    pub const HIT_FORCE: &str = "hit force";
    pub const FIRING_ENERGY: &str = "firing energy";
    pub const FIRING_FUEL: &str = "firing fuel";
    pub const FIRING_HEAT: &str = "firing heat";
    pub const FIRING_FORCE: &str = "firing force";
    pub const ANTI_MISSILE: &str = "anti-missile";
    pub const MISSILE_STRENGTH: &str = "missile strength";
    pub const TURRET_TURN: &str = "turret turn";
}

/// An attribute sheet: a chassis, a piece of equipment, a weapon, or a
/// running total of several of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outfit {
    name: String,
    category: String,
    description: String,
    thumbnail: Option<SpriteHandle>,

    attributes: BTreeMap<String, Fixed64>,

    flare: Option<SpriteHandle>,
    weapon_sprite: Option<SpriteHandle>,
    icon: Option<SpriteHandle>,
    ammo: Option<OutfitId>,
    hit_effects: BTreeMap<EffectId, i32>,
    die_effects: BTreeMap<EffectId, i32>,
    submunitions: BTreeMap<OutfitId, i32>,

    weapon: BTreeMap<String, Fixed64>,
}

impl Outfit {
    /// An empty, named sheet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_attribute(mut self, name: &str, value: f64) -> Self {
        self.reset(name, f64_to_fixed64(value));
        self
    }

    pub fn with_weapon(self, name: &str, value: f64) -> Self {
        self.with_weapon_value(name, f64_to_fixed64(value))
    }

    pub fn with_weapon_value(mut self, name: &str, value: Fixed64) -> Self {
        if value == Fixed64::ZERO {
            self.weapon.remove(name);
        } else {
            self.weapon.insert(name.to_string(), value);
        }
        self
    }

    pub fn with_ammo(mut self, ammo: OutfitId) -> Self {
        self.ammo = Some(ammo);
        self
    }

    pub fn with_hit_effect(mut self, effect: EffectId, count: i32) -> Self {
        *self.hit_effects.entry(effect).or_insert(0) += count;
        self
    }

    pub fn with_die_effect(mut self, effect: EffectId, count: i32) -> Self {
        *self.die_effects.entry(effect).or_insert(0) += count;
        self
    }

    pub fn with_submunition(mut self, outfit: OutfitId, count: i32) -> Self {
        *self.submunitions.entry(outfit).or_insert(0) += count;
        self
    }

    pub fn with_thumbnail(mut self, sprite: SpriteHandle) -> Self {
        self.thumbnail = Some(sprite);
        self
    }

    pub fn with_flare(mut self, sprite: SpriteHandle) -> Self {
        self.flare = Some(sprite);
        self
    }

    pub fn with_weapon_sprite(mut self, sprite: SpriteHandle) -> Self {
        self.weapon_sprite = Some(sprite);
        self
    }

    pub fn with_icon(mut self, sprite: SpriteHandle) -> Self {
        self.icon = Some(sprite);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cost(&self) -> i64 {
        self.get(attr::COST).to_num::<i64>()
    }

    /// Image shown when buying this item.
    pub fn thumbnail(&self) -> Option<&SpriteHandle> {
        self.thumbnail.as_ref()
    }

    /// Read an attribute. Absent attributes are zero.
    pub fn get(&self, attribute: &str) -> Fixed64 {
        self.attributes.get(attribute).copied().unwrap_or(Fixed64::ZERO)
    }

    /// Read an attribute as f64, for kinematics.
    pub fn get_f64(&self, attribute: &str) -> f64 {
        fixed64_to_f64(self.get(attribute))
    }

    pub fn attributes(&self) -> &BTreeMap<String, Fixed64> {
        &self.attributes
    }

    /// How many of `count` copies of `other` fit on this sheet.
    ///
    /// Returns the largest `k` with the sign of `count` and `|k| <= |count|`
    /// such that adding `k` copies leaves no attribute that is currently
    /// non-negative below zero. Works for removal (negative `count`) of
    /// capacity-providing equipment too.
    pub fn can_add(&self, other: &Outfit, count: i32) -> i32 {
        let mut count = count;
        for (name, &value) in &other.attributes {
            if count == 0 {
                break;
            }
            let have = self.get(name);
            if have < Fixed64::ZERO {
                // Never push an already negative margin further down.
                if (value < Fixed64::ZERO) == (count > 0) {
                    count = 0;
                }
                continue;
            }
            if have + scale(value, count) >= Fixed64::ZERO {
                continue;
            }
            let fit = have.saturating_div(-value).round_to_zero();
            count = fit.saturating_to_num::<i32>();
        }
        count
    }

    /// Add `count` copies of `other`'s attributes to this sheet. A negative
    /// count removes them. Weapon values and references are not combined.
    pub fn add(&mut self, other: &Outfit, count: i32) {
        if count == 0 {
            return;
        }
        for (name, &value) in &other.attributes {
            self.add_value(name, scale(value, count));
        }
    }

    /// Add `value` to a single attribute.
    pub fn add_value(&mut self, attribute: &str, value: Fixed64) {
        let current = self.get(attribute);
        self.reset(attribute, current.saturating_add(value));
    }

    /// Overwrite a single attribute. Zero removes it from the sheet.
    pub fn reset(&mut self, attribute: &str, value: Fixed64) {
        if value == Fixed64::ZERO {
            self.attributes.remove(attribute);
        } else {
            self.attributes.insert(attribute.to_string(), value);
        }
    }

    /// Engine flare sprite, if any.
    pub fn flare_sprite(&self) -> Option<&SpriteHandle> {
        self.flare.as_ref()
    }

    // -----------------------------------------------------------------------
    // Weapon surface
    // -----------------------------------------------------------------------

    pub fn is_weapon(&self) -> bool {
        !self.weapon.is_empty()
    }

    pub fn weapon_sprite(&self) -> Option<&SpriteHandle> {
        self.weapon_sprite.as_ref()
    }

    /// The outfit consumed each time this weapon fires.
    pub fn ammo(&self) -> Option<OutfitId> {
        self.ammo
    }

    pub fn icon(&self) -> Option<&SpriteHandle> {
        self.icon.as_ref()
    }

    pub fn weapon_get(&self, attribute: &str) -> Fixed64 {
        self.weapon.get(attribute).copied().unwrap_or(Fixed64::ZERO)
    }

    pub fn weapon_get_f64(&self, attribute: &str) -> f64 {
        fixed64_to_f64(self.weapon_get(attribute))
    }

    pub fn weapon_attributes(&self) -> &BTreeMap<String, Fixed64> {
        &self.weapon
    }

    /// Ticks between shots, rounded up. Never less than one.
    pub fn reload(&self) -> u32 {
        let reload = self.weapon_get(weapon::RELOAD).ceil();
        reload.saturating_to_num::<u32>().max(1)
    }

    /// Ticks a projectile from this weapon lives.
    pub fn lifetime(&self) -> u32 {
        self.weapon_get(weapon::LIFETIME)
            .ceil()
            .saturating_to_num::<u32>()
    }

    /// Distance a projectile covers before expiring.
    pub fn range(&self) -> f64 {
        self.weapon_get_f64(weapon::VELOCITY) * self.lifetime() as f64
    }

    pub fn shield_damage(&self) -> Fixed64 {
        self.weapon_get(weapon::SHIELD_DAMAGE)
    }

    pub fn hull_damage(&self) -> Fixed64 {
        self.weapon_get(weapon::HULL_DAMAGE)
    }

    pub fn is_anti_missile(&self) -> bool {
        self.weapon_get(weapon::ANTI_MISSILE) > Fixed64::ZERO
    }

    /// Whether installing this weapon takes a turret mount rather than a gun
    /// port.
    pub fn is_turret(&self) -> bool {
        self.get(attr::TURRET_MOUNTS) < Fixed64::ZERO
    }

    /// Effects spawned where a projectile hits something.
    pub fn hit_effects(&self) -> &BTreeMap<EffectId, i32> {
        &self.hit_effects
    }

    /// Effects spawned when a projectile expires, or when a chassis with
    /// this table is destroyed.
    pub fn die_effects(&self) -> &BTreeMap<EffectId, i32> {
        &self.die_effects
    }

    /// Projectiles released when a projectile from this weapon expires.
    pub fn submunitions(&self) -> &BTreeMap<OutfitId, i32> {
        &self.submunitions
    }
}

/// Fold `base` plus `count` copies of each part into a fresh sheet. `base`
/// itself is untouched.
pub fn combined<'a>(base: &Outfit, parts: impl IntoIterator<Item = (&'a Outfit, i32)>) -> Outfit {
    let mut total = base.clone();
    for (part, count) in parts {
        total.add(part, count);
    }
    total
}
