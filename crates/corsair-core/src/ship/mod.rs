//! The ship entity.
//!
//! A [`Ship`] is built from a catalog [`ShipModel`](crate::catalog::ShipModel):
//! its chassis sheet is copied into `base` and never touched again. Every
//! equipment change rebuilds the derived `attributes` from `base` plus the
//! installed outfits. Special behavior (landing, hyperspace, destruction)
//! lives in a single [`SpecialState`].
//!
//! The driver calls [`Ship::step`] once per tick and [`Ship::fire`] when it
//! wants shots resolved. Everything a ship creates during a tick is pushed
//! into caller-supplied vectors.

mod combat;
mod state;
mod update;

pub use state::{ExplosionState, JumpState, LandingPhase, LandingState, SpecialState};

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::DVec2;
use tracing::warn;

use crate::armament::Armament;
use crate::catalog::{Catalog, CatalogError, Planet, StarSystem};
use crate::fixed::{Fixed64, fraction};
use crate::geometry::Angle;
use crate::id::*;
use crate::outfit::{Outfit, attr, combined};
use crate::rng::SimRng;
use crate::sim::{StateHash, hash_str};
use crate::spawn::Origin;

/// Per-tick control input, set by whatever is flying the ship.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    /// -1 (full reverse) to 1 (full ahead).
    pub thrust: f64,
    /// -1 (clockwise) to 1 (counter-clockwise), scaled by the turn rate.
    pub turn: f64,
    pub land: bool,
    pub jump: bool,
    pub launch: bool,
    pub fire: bool,
    /// World-space heading turrets should track.
    pub aim: Option<Angle>,
}

#[derive(Debug, Clone)]
pub struct Ship {
    catalog: Arc<Catalog>,
    model: ShipModelId,
    model_name: String,
    description: String,
    sprite: Option<SpriteHandle>,
    name: String,
    government: Option<GovernmentId>,
    is_special: bool,

    base: Outfit,
    attributes: Outfit,
    outfits: BTreeMap<OutfitId, i32>,
    cargo: BTreeMap<String, i32>,
    armament: Armament,
    engine_points: Vec<DVec2>,

    position: DVec2,
    velocity: DVec2,
    angle: Angle,

    shields: Fixed64,
    hull: Fixed64,
    fuel: Fixed64,
    energy: Fixed64,
    heat: Fixed64,
    is_overheated: bool,
    is_thrusting: bool,

    system: Option<SystemId>,
    planet: Option<PlanetId>,
    target_planet: Option<PlanetId>,
    target_system: Option<SystemId>,
    command: Command,
    carried: Vec<Ship>,

    state: SpecialState,
    forget: u32,
    is_tracked: bool,
    should_delete: bool,
    rng: SimRng,
}

impl Ship {
    /// A new ship of the named model with its default loadout.
    pub fn new(catalog: &Arc<Catalog>, model: &str) -> Result<Self, CatalogError> {
        let id = catalog
            .ship_model_id(model)
            .ok_or_else(|| CatalogError::NotFound(model.to_string()))?;
        Self::from_model(catalog, id)
    }

    /// A new ship of the given model, fully repaired, fueled, and charged.
    pub fn from_model(catalog: &Arc<Catalog>, id: ShipModelId) -> Result<Self, CatalogError> {
        let model = catalog
            .ship_model(id)
            .ok_or_else(|| CatalogError::NotFound(format!("{id:?}")))?;

        let mut armament = Armament::new();
        for &point in &model.gun_points {
            armament.add_gun_port(point);
        }
        for &point in &model.turret_points {
            armament.add_turret(point);
        }
        // The hardpoints are the port capacity.
        let mut base = model.attributes.clone();
        base.reset(attr::GUN_PORTS, Fixed64::from_num(armament.gun_count()));
        base.reset(attr::TURRET_MOUNTS, Fixed64::from_num(armament.turret_count()));

        let mut ship = Self {
            catalog: Arc::clone(catalog),
            model: id,
            model_name: model.name.clone(),
            description: model.description.clone(),
            sprite: model.sprite.clone(),
            name: model.name.clone(),
            government: None,
            is_special: false,
            attributes: base.clone(),
            base,
            outfits: BTreeMap::new(),
            cargo: BTreeMap::new(),
            armament,
            engine_points: model.engine_points.clone(),
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            angle: Angle::ZERO,
            shields: Fixed64::ZERO,
            hull: Fixed64::ZERO,
            fuel: Fixed64::ZERO,
            energy: Fixed64::ZERO,
            heat: Fixed64::ZERO,
            is_overheated: false,
            is_thrusting: false,
            system: None,
            planet: None,
            target_planet: None,
            target_system: None,
            command: Command::default(),
            carried: Vec::new(),
            state: SpecialState::Flying,
            forget: catalog.config().forget_ticks,
            is_tracked: false,
            should_delete: false,
            rng: SimRng::new(hash_str(&model.name)),
        };
        for &(outfit, count) in &model.outfits {
            ship.add_outfit(outfit, count);
        }
        ship.recharge();
        Ok(ship)
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn model(&self) -> ShipModelId {
        self.model
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the ship. Also reseeds its RNG from the new name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.rng = SimRng::new(hash_str(&self.name));
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.rng = SimRng::new(seed);
    }

    pub fn government(&self) -> Option<GovernmentId> {
        self.government
    }

    pub fn set_government(&mut self, government: Option<GovernmentId>) {
        self.government = government;
    }

    pub fn is_special(&self) -> bool {
        self.is_special
    }

    /// Special ships (the player's, mission ships) survive landing and are
    /// never forgotten.
    pub fn set_is_special(&mut self, special: bool) {
        self.is_special = special;
    }

    /// Chassis cost plus everything installed.
    pub fn cost(&self) -> i64 {
        let outfits: i64 = self
            .outfits
            .iter()
            .filter_map(|(&id, &count)| Some(self.catalog.outfit(id)?.cost() * count as i64))
            .sum();
        self.base.cost() + outfits
    }

    // -----------------------------------------------------------------------
    // Placement and navigation
    // -----------------------------------------------------------------------

    pub fn place(&mut self, position: DVec2, velocity: DVec2, angle: Angle) {
        self.position = position;
        self.velocity = velocity;
        self.angle = angle;
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    pub fn facing(&self) -> Angle {
        self.angle
    }

    pub fn origin(&self) -> Origin {
        Origin {
            position: self.position,
            velocity: self.velocity,
            angle: self.angle,
        }
    }

    pub fn system(&self) -> Option<SystemId> {
        self.system
    }

    pub fn set_system(&mut self, system: Option<SystemId>) {
        self.system = system;
    }

    /// The planet the ship is docked on, if any.
    pub fn planet(&self) -> Option<PlanetId> {
        self.planet
    }

    pub fn set_planet(&mut self, planet: Option<PlanetId>) {
        self.planet = planet;
    }

    pub fn target_planet(&self) -> Option<PlanetId> {
        self.target_planet
    }

    pub fn set_target_planet(&mut self, planet: Option<PlanetId>) {
        self.target_planet = planet;
    }

    pub fn target_system(&self) -> Option<SystemId> {
        self.target_system
    }

    pub fn set_target_system(&mut self, system: Option<SystemId>) {
        self.target_system = system;
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn set_command(&mut self, command: Command) {
        self.command = command;
    }

    // -----------------------------------------------------------------------
    // Kinematics
    // -----------------------------------------------------------------------

    /// Total mass: chassis, outfits, and cargo.
    pub fn mass(&self) -> f64 {
        self.attributes.get_f64(attr::MASS) + self.cargo_tons() as f64
    }

    /// Degrees per tick at full turn command.
    pub fn turn_rate(&self) -> f64 {
        let mass = self.mass();
        if mass <= 0.0 {
            return 0.0;
        }
        self.attributes.get_f64(attr::TURN) / mass
    }

    /// Velocity gained per tick at full thrust.
    pub fn acceleration(&self) -> f64 {
        let mass = self.mass();
        if mass <= 0.0 {
            return 0.0;
        }
        self.attributes.get_f64(attr::THRUST) / mass
    }

    /// Terminal speed under full thrust.
    pub fn max_velocity(&self) -> f64 {
        let drag = self.attributes.get_f64(attr::DRAG);
        if drag <= 0.0 {
            return 0.0;
        }
        self.attributes.get_f64(attr::THRUST) / drag
    }

    /// Apply an impulse. Heavier ships are pushed less.
    pub fn apply_force(&mut self, force: DVec2) {
        let mass = self.mass();
        if mass <= 0.0 {
            return;
        }
        self.velocity += force / mass;
    }

    /// Facing vector scaled by the current zoom.
    pub fn unit(&self) -> DVec2 {
        self.angle.unit() * self.zoom()
    }

    // -----------------------------------------------------------------------
    // Rendering exposure
    // -----------------------------------------------------------------------

    pub fn sprite(&self) -> Option<&SpriteHandle> {
        self.sprite.as_ref()
    }

    /// 1 in normal flight, shrinking to 0 while landing.
    pub fn zoom(&self) -> f64 {
        match &self.state {
            SpecialState::Landing(landing) => landing.zoom,
            _ => 1.0,
        }
    }

    /// 0 in normal flight, ramping to 1 during a jump.
    pub fn distortion(&self) -> f64 {
        match &self.state {
            SpecialState::Hyperspacing(jump) => jump.distortion(),
            _ => 0.0,
        }
    }

    /// Engine flare points. Empty unless the ship is thrusting.
    pub fn engine_points(&self) -> &[DVec2] {
        if self.is_thrusting {
            &self.engine_points
        } else {
            &[]
        }
    }

    /// The flare sprite of the first installed outfit that has one.
    pub fn flare_sprite(&self) -> Option<&SpriteHandle> {
        self.outfits
            .keys()
            .filter_map(|&id| self.catalog.outfit(id))
            .find_map(Outfit::flare_sprite)
    }

    pub fn armament(&self) -> &Armament {
        &self.armament
    }

    // -----------------------------------------------------------------------
    // State queries
    // -----------------------------------------------------------------------

    pub fn special_state(&self) -> &SpecialState {
        &self.state
    }

    pub fn is_landing(&self) -> bool {
        matches!(self.state, SpecialState::Landing(_))
    }

    pub fn is_hyperspacing(&self) -> bool {
        matches!(self.state, SpecialState::Hyperspacing(_))
    }

    pub fn is_exploding(&self) -> bool {
        matches!(self.state, SpecialState::Exploding(_))
    }

    /// Whether projectiles can hit this ship.
    pub fn is_targetable(&self) -> bool {
        matches!(self.state, SpecialState::Flying) && self.hull > Fixed64::ZERO && !self.should_delete
    }

    /// Latches once `step` has reported the ship for removal.
    pub fn should_delete(&self) -> bool {
        self.should_delete
    }

    /// Mark the ship as inside a tracked region for this tick.
    pub fn mark_tracked(&mut self) {
        self.is_tracked = true;
    }

    // -----------------------------------------------------------------------
    // Pools
    // -----------------------------------------------------------------------

    pub fn attributes(&self) -> &Outfit {
        &self.attributes
    }

    pub fn base_attributes(&self) -> &Outfit {
        &self.base
    }

    /// Shield level as a fraction of maximum.
    pub fn shields(&self) -> f64 {
        fraction(self.shields, self.attributes.get(attr::SHIELDS))
    }

    pub fn hull(&self) -> f64 {
        fraction(self.hull, self.attributes.get(attr::HULL))
    }

    pub fn fuel(&self) -> f64 {
        fraction(self.fuel, self.attributes.get(attr::FUEL_CAPACITY))
    }

    pub fn energy(&self) -> f64 {
        fraction(self.energy, self.attributes.get(attr::ENERGY_CAPACITY))
    }

    /// Heat as a fraction of the overheat threshold.
    pub fn heat(&self) -> f64 {
        fraction(self.heat, self.max_heat())
    }

    pub fn shield_points(&self) -> Fixed64 {
        self.shields
    }

    pub fn hull_points(&self) -> Fixed64 {
        self.hull
    }

    pub fn fuel_amount(&self) -> Fixed64 {
        self.fuel
    }

    pub fn energy_amount(&self) -> Fixed64 {
        self.energy
    }

    pub fn heat_amount(&self) -> Fixed64 {
        self.heat
    }

    pub fn is_overheated(&self) -> bool {
        self.is_overheated
    }

    /// Heat at which the ship overheats.
    pub fn max_heat(&self) -> Fixed64 {
        Fixed64::saturating_from_num(self.mass() * self.catalog.config().heat_per_mass)
    }

    /// Fuel spent per jump.
    pub fn jump_fuel(&self) -> Fixed64 {
        let fuel = self.attributes.get(attr::JUMP_FUEL);
        if fuel > Fixed64::ZERO {
            fuel
        } else {
            Fixed64::saturating_from_num(self.catalog.config().default_jump_fuel)
        }
    }

    pub fn jumps_remaining(&self) -> u32 {
        let per_jump = self.jump_fuel();
        if per_jump <= Fixed64::ZERO {
            return 0;
        }
        (self.fuel / per_jump).to_num::<i64>().max(0) as u32
    }

    /// Fully repair, refuel, and recharge. Heat is dumped.
    pub fn recharge(&mut self) {
        self.shields = self.attributes.get(attr::SHIELDS).max(Fixed64::ZERO);
        self.hull = self.attributes.get(attr::HULL).max(Fixed64::ZERO);
        self.fuel = self.attributes.get(attr::FUEL_CAPACITY).max(Fixed64::ZERO);
        self.energy = self.attributes.get(attr::ENERGY_CAPACITY).max(Fixed64::ZERO);
        self.heat = Fixed64::ZERO;
        self.is_overheated = false;
    }

    pub(crate) fn set_pools(
        &mut self,
        shields: Fixed64,
        hull: Fixed64,
        fuel: Fixed64,
        energy: Fixed64,
        heat: Fixed64,
    ) {
        self.shields = shields;
        self.hull = hull;
        self.fuel = fuel;
        self.energy = energy;
        self.heat = heat;
        self.clamp_pools();
    }

    fn clamp_pools(&mut self) {
        let cap = |value: Fixed64, max: Fixed64| value.min(max).max(Fixed64::ZERO);
        self.shields = cap(self.shields, self.attributes.get(attr::SHIELDS));
        self.hull = cap(self.hull, self.attributes.get(attr::HULL));
        self.fuel = cap(self.fuel, self.attributes.get(attr::FUEL_CAPACITY));
        self.energy = cap(self.energy, self.attributes.get(attr::ENERGY_CAPACITY));
        self.heat = self.heat.max(Fixed64::ZERO);
    }

    // -----------------------------------------------------------------------
    // Outfits
    // -----------------------------------------------------------------------

    pub fn outfits(&self) -> &BTreeMap<OutfitId, i32> {
        &self.outfits
    }

    pub fn outfit_count(&self, id: OutfitId) -> i32 {
        self.outfits.get(&id).copied().unwrap_or(0)
    }

    /// How many of `count` copies of an outfit can be installed (or, for a
    /// negative count, removed). Cargo already aboard counts as used cargo
    /// space, so removing cargo pods never strands cargo.
    pub fn can_add_outfit(&self, id: OutfitId, count: i32) -> i32 {
        let Some(outfit) = self.catalog.outfit(id) else {
            return 0;
        };
        let count = if count < 0 {
            count.max(-self.outfit_count(id))
        } else {
            count
        };
        let mut margins = self.attributes.clone();
        margins.add_value(attr::CARGO_SPACE, -Fixed64::from_num(self.cargo_tons()));
        margins.can_add(outfit, count)
    }

    /// Install (or with a negative count, remove) up to `count` copies of an
    /// outfit. Returns the count actually applied.
    pub fn add_outfit(&mut self, id: OutfitId, count: i32) -> i32 {
        let applied = self.can_add_outfit(id, count);
        if applied != count {
            warn!(
                ship = %self.name,
                outfit = ?id,
                requested = count,
                applied,
                "outfit change clamped"
            );
        }
        self.apply_outfit(id, applied)
    }

    /// Install or remove outfits without capacity checks. Used when
    /// restoring saved ships, whose loadout was valid when it was saved.
    pub(crate) fn apply_outfit(&mut self, id: OutfitId, applied: i32) -> i32 {
        if applied == 0 {
            return 0;
        }
        let catalog = Arc::clone(&self.catalog);
        let Some(outfit) = catalog.outfit(id) else {
            return 0;
        };

        let total = self.outfit_count(id) + applied;
        if total == 0 {
            self.outfits.remove(&id);
        } else {
            self.outfits.insert(id, total);
        }

        if outfit.is_weapon() {
            if applied > 0 {
                for _ in 0..applied {
                    if !self.armament.add_weapon(id, outfit) {
                        warn!(ship = %self.name, outfit = ?id, "no free hardpoint for weapon");
                    }
                }
            } else {
                self.armament.remove_weapon(id, applied.unsigned_abs());
            }
        }

        self.rebuild_attributes();
        self.clamp_pools();
        applied
    }

    fn rebuild_attributes(&mut self) {
        let catalog = &self.catalog;
        self.attributes = combined(
            &self.base,
            self.outfits
                .iter()
                .filter_map(|(&id, &count)| Some((catalog.outfit(id)?, count))),
        );
        debug_assert!(crate::validation::audit_ship(self).is_empty());
    }

    // -----------------------------------------------------------------------
    // Cargo
    // -----------------------------------------------------------------------

    pub fn cargo(&self) -> &BTreeMap<String, i32> {
        &self.cargo
    }

    pub fn cargo_of(&self, commodity: &str) -> i32 {
        self.cargo.get(commodity).copied().unwrap_or(0)
    }

    pub fn cargo_tons(&self) -> i32 {
        self.cargo.values().sum()
    }

    pub fn free_cargo(&self) -> i32 {
        let space = self.attributes.get(attr::CARGO_SPACE).to_num::<i32>();
        (space - self.cargo_tons()).max(0)
    }

    /// Load (or with negative `tons`, unload) cargo. Loading is clamped to
    /// free space, unloading to what is aboard. Returns tons moved.
    pub fn add_cargo(&mut self, tons: i32, commodity: &str) -> i32 {
        let moved = if tons >= 0 {
            tons.min(self.free_cargo())
        } else {
            tons.max(-self.cargo_of(commodity))
        };
        if moved != tons {
            warn!(ship = %self.name, commodity, requested = tons, moved, "cargo refused");
        }
        if moved == 0 {
            return 0;
        }
        let held = self.cargo_of(commodity) + moved;
        if held == 0 {
            self.cargo.remove(commodity);
        } else {
            self.cargo.insert(commodity.to_string(), held);
        }
        moved
    }

    // -----------------------------------------------------------------------
    // Carried ships
    // -----------------------------------------------------------------------

    pub fn carried(&self) -> &[Ship] {
        &self.carried
    }

    pub fn carry(&mut self, ship: Ship) {
        self.carried.push(ship);
    }

    // -----------------------------------------------------------------------
    // Catalog lookups
    // -----------------------------------------------------------------------

    fn current_system(&self) -> Option<&StarSystem> {
        self.system.and_then(|id| self.catalog.system(id))
    }

    fn planet_def(&self, id: PlanetId) -> Option<&Planet> {
        self.catalog.planet(id)
    }

    // -----------------------------------------------------------------------
    // Restoring saves
    // -----------------------------------------------------------------------

    /// Ticks left before an untracked ship is forgotten.
    pub fn forget_countdown(&self) -> u32 {
        self.forget
    }

    pub fn is_thrusting(&self) -> bool {
        self.is_thrusting
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }

    pub(crate) fn replace_armament(&mut self, armament: Armament) {
        self.armament = armament;
    }

    pub(crate) fn restore_runtime(
        &mut self,
        state: SpecialState,
        forget: u32,
        is_overheated: bool,
        is_thrusting: bool,
    ) {
        self.state = state;
        self.forget = forget;
        self.is_overheated = is_overheated;
        self.is_thrusting = is_thrusting;
    }

    // -----------------------------------------------------------------------
    // Determinism
    // -----------------------------------------------------------------------

    /// Hash of all mutable simulation state.
    pub fn state_hash(&self) -> u64 {
        let mut h = StateHash::new();
        h.write_str(&self.name);
        h.write_f64(self.position.x);
        h.write_f64(self.position.y);
        h.write_f64(self.velocity.x);
        h.write_f64(self.velocity.y);
        h.write_f64(self.angle.degrees());
        for pool in [self.shields, self.hull, self.fuel, self.energy, self.heat] {
            h.write_fixed64(pool);
        }
        h.write_u32(self.state.discriminant());
        h.write_u32(self.forget);
        h.write_u64(self.rng.state());
        for (&id, &count) in &self.outfits {
            h.write_u32(id.0);
            h.write_i32(count);
        }
        for mount in self.armament.mounts() {
            h.write_u32(mount.countdown());
        }
        h.write_u32(self.system.map_or(u32::MAX, |s| s.0));
        h.finish()
    }
}
