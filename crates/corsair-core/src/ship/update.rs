//! Per-tick update: special state transitions, regeneration, and flight.

use glam::DVec2;
use tracing::debug;

use super::{Ship, SpecialState};
use super::state::{ExplosionState, JumpState, LandingPhase, LandingState};
use crate::fixed::{Fixed64, f64_to_fixed64};
use crate::geometry::Angle;
use crate::id::{PlanetId, SystemId};
use crate::outfit::attr;
use crate::spawn::EffectSpawn;

impl Ship {
    /// Advance one tick.
    ///
    /// Returns true exactly once: on the tick the ship should be removed
    /// (destruction finished, a non-special ship landed, or it was
    /// forgotten). Explosion effects go into `effects`, launched carried
    /// ships into `launched`.
    pub fn step(&mut self, effects: &mut Vec<EffectSpawn>, launched: &mut Vec<Ship>) -> bool {
        if self.should_delete {
            return false;
        }
        if self.is_exploding() {
            return self.step_explosion(effects);
        }
        if matches!(self.state, SpecialState::Flying) && self.hull <= Fixed64::ZERO {
            self.begin_explosion();
            return false;
        }

        if self.step_forget() {
            return true;
        }
        self.is_thrusting = false;
        self.armament.step();
        self.regenerate();

        match self.state {
            SpecialState::Landing(_) => self.step_landing(),
            SpecialState::Hyperspacing(_) => {
                self.step_hyperspace();
                false
            }
            SpecialState::Exploding(_) => false,
            SpecialState::Flying => {
                if self.command.land && self.can_land() {
                    if let Some(planet) = self.target_planet {
                        self.begin_landing(planet);
                    }
                } else if self.command.jump && self.can_hyperspace() {
                    if let Some(destination) = self.target_system {
                        self.begin_jump(destination);
                    }
                } else {
                    self.fly();
                    self.aim_turrets();
                    if !self.is_disabled() {
                        self.launch(launched);
                    }
                }
                false
            }
        }
    }

    fn step_forget(&mut self) -> bool {
        if self.is_special || self.is_tracked {
            self.forget = self.catalog.config().forget_ticks;
        } else {
            self.forget = self.forget.saturating_sub(1);
            if self.forget == 0 {
                debug!(ship = %self.name, "forgotten outside tracked regions");
                self.should_delete = true;
                return true;
            }
        }
        self.is_tracked = false;
        false
    }

    // -----------------------------------------------------------------------
    // Regeneration
    // -----------------------------------------------------------------------

    fn regenerate(&mut self) {
        let a = &self.attributes;
        let energy_net = a.get(attr::ENERGY_GENERATION) - a.get(attr::ENERGY_CONSUMPTION);
        let fuel_gen = a.get(attr::FUEL_GENERATION);
        let heat_gen = a.get(attr::HEAT_GENERATION);
        let max_shields = a.get(attr::SHIELDS);
        let max_hull = a.get(attr::HULL);
        let shield_rate = a.get(attr::SHIELD_GENERATION);
        let shield_cost = a.get(attr::SHIELD_ENERGY);
        let hull_rate = a.get(attr::HULL_REPAIR_RATE);
        let hull_cost = a.get(attr::HULL_ENERGY);
        let dissipation = a.get(attr::HEAT_DISSIPATION);

        self.energy = self.energy.saturating_add(energy_net);
        self.fuel = self.fuel.saturating_add(fuel_gen);
        self.heat = self.heat.saturating_add(heat_gen);
        self.clamp_pools();

        if let Some(shields) = repair(self.shields, max_shields, shield_rate, shield_cost, &mut self.energy) {
            self.shields = shields;
        }
        // A hull below zero is already dead; never revive it.
        if self.hull > Fixed64::ZERO
            && let Some(hull) = repair(self.hull, max_hull, hull_rate, hull_cost, &mut self.energy)
        {
            self.hull = hull;
        }

        self.heat = self
            .heat
            .saturating_sub(self.heat.saturating_mul(dissipation.min(Fixed64::ONE)));
        self.clamp_pools();

        let max_heat = self.max_heat();
        if self.heat > max_heat {
            if !self.is_overheated {
                debug!(ship = %self.name, "overheated");
            }
            self.is_overheated = true;
        } else if self.is_overheated
            && self.heat < Fixed64::saturating_from_num(self.catalog.config().overheat_recovery) * max_heat
        {
            debug!(ship = %self.name, "cooled down");
            self.is_overheated = false;
        }
    }

    // -----------------------------------------------------------------------
    // Flight
    // -----------------------------------------------------------------------

    fn fly(&mut self) {
        if !self.is_disabled() {
            let turn = self.command.turn.clamp(-1.0, 1.0);
            if turn != 0.0 {
                let cost = f64_to_fixed64(turn.abs()) * self.attributes.get(attr::TURNING_ENERGY);
                if self.energy >= cost {
                    self.energy -= cost;
                    self.heat += f64_to_fixed64(turn.abs()) * self.attributes.get(attr::TURNING_HEAT);
                    self.angle = self.angle.rotated(turn * self.turn_rate());
                }
            }

            let thrust = self.command.thrust.clamp(-1.0, 1.0);
            if thrust != 0.0 {
                let cost = f64_to_fixed64(thrust.abs()) * self.attributes.get(attr::THRUSTING_ENERGY);
                if self.energy >= cost {
                    self.energy -= cost;
                    self.heat += f64_to_fixed64(thrust.abs()) * self.attributes.get(attr::THRUSTING_HEAT);
                    self.velocity += self.angle.unit() * (thrust * self.acceleration());
                    self.is_thrusting = thrust > 0.0;
                }
            }
        }

        self.apply_drag();
        self.position += self.velocity;
    }

    fn apply_drag(&mut self) {
        let mass = self.mass();
        if mass <= 0.0 {
            return;
        }
        let drag = (self.attributes.get_f64(attr::DRAG) / mass).clamp(0.0, 1.0);
        self.velocity -= self.velocity * drag;
    }

    fn aim_turrets(&mut self) {
        let Some(aim) = self.command.aim else {
            return;
        };
        let relative = Angle::from_degrees(aim.degrees() - self.angle.degrees());
        for index in 0..self.armament.len() {
            let turn = self
                .armament
                .mount(index)
                .filter(|m| m.is_turret())
                .and_then(|m| m.weapon())
                .and_then(|id| self.catalog.outfit(id))
                .map(|w| w.weapon_get_f64(crate::outfit::weapon::TURRET_TURN));
            if let Some(turn) = turn {
                self.armament.aim(index, relative, turn);
            }
        }
    }

    fn launch(&mut self, launched: &mut Vec<Ship>) {
        if !self.command.launch || self.carried.is_empty() {
            return;
        }
        for mut ship in self.carried.drain(..) {
            ship.place(self.position, self.velocity, self.angle);
            ship.set_system(self.system);
            ship.set_government(ship.government.or(self.government));
            debug!(ship = %self.name, carried = %ship.name, "launched");
            launched.push(ship);
        }
    }

    // -----------------------------------------------------------------------
    // Landing
    // -----------------------------------------------------------------------

    /// Whether a landing on the target planet may begin this tick.
    pub fn can_land(&self) -> bool {
        if !matches!(self.state, SpecialState::Flying) || self.is_disabled() {
            return false;
        }
        let Some(planet) = self.target_planet.and_then(|id| self.planet_def(id)) else {
            return false;
        };
        let config = self.catalog.config();
        Some(planet.system) == self.system
            && self.position.distance(planet.position) < planet.radius
            && self.velocity.length() < config.landing_speed
            && !self.catalog.is_enemy(planet.government, self.government)
    }

    fn begin_landing(&mut self, planet: PlanetId) {
        debug!(ship = %self.name, planet = ?planet, "landing begun");
        self.state = SpecialState::Landing(LandingState {
            planet,
            zoom: 1.0,
            phase: LandingPhase::Descending,
            progress: 0,
        });
    }

    fn step_landing(&mut self) -> bool {
        let SpecialState::Landing(mut landing) = self.state.clone() else {
            return false;
        };
        let config = self.catalog.config().clone();
        let ticks = config.landing_ticks.max(1);
        let Some(planet) = self.planet_def(landing.planet).cloned() else {
            self.state = SpecialState::Flying;
            return false;
        };

        match landing.phase {
            LandingPhase::Descending => {
                landing.progress += 1;
                landing.zoom = 1.0 - (landing.progress as f64 / ticks as f64).min(1.0);
                let pull = (planet.position - self.position) * config.landing_pull;
                self.position += pull;
                self.velocity = pull;
                if landing.progress >= ticks {
                    if !self.is_special {
                        debug!(ship = %self.name, planet = %planet.name, "landed and removed");
                        self.should_delete = true;
                        return true;
                    }
                    debug!(ship = %self.name, planet = %planet.name, "docked");
                    self.position = planet.position;
                    self.velocity = DVec2::ZERO;
                    self.planet = Some(landing.planet);
                    landing.phase = LandingPhase::Docked;
                    landing.progress = 0;
                }
            }
            LandingPhase::Docked => {
                let capacity = self.attributes.get(attr::FUEL_CAPACITY);
                if planet.has_spaceport && self.fuel < capacity {
                    self.fuel = (self.fuel + Fixed64::ONE).min(capacity);
                } else {
                    debug!(ship = %self.name, planet = %planet.name, "taking off");
                    landing.phase = LandingPhase::TakingOff;
                    landing.progress = 0;
                }
            }
            LandingPhase::TakingOff => {
                landing.progress += 1;
                landing.zoom = (landing.progress as f64 / ticks as f64).min(1.0);
                if landing.progress >= ticks {
                    debug!(ship = %self.name, planet = %planet.name, "took off");
                    self.planet = None;
                    self.target_planet = None;
                    self.state = SpecialState::Flying;
                    return false;
                }
            }
        }
        self.state = SpecialState::Landing(landing);
        false
    }

    // -----------------------------------------------------------------------
    // Hyperspace
    // -----------------------------------------------------------------------

    /// Whether a jump to the target system may begin this tick.
    pub fn can_hyperspace(&self) -> bool {
        if !matches!(self.state, SpecialState::Flying) || self.is_disabled() {
            return false;
        }
        let (Some(here), Some(destination)) = (self.current_system(), self.target_system) else {
            return false;
        };
        if Some(destination) == self.system {
            return false;
        }
        let Some(there) = self.catalog.system(destination) else {
            return false;
        };

        let hyperdrive = self.attributes.get(attr::HYPERDRIVE) > Fixed64::ZERO
            && here.links.contains(&destination);
        let jump_drive = self.attributes.get(attr::JUMP_DRIVE) > Fixed64::ZERO
            && here.position.distance(there.position) <= self.attributes.get_f64(attr::JUMP_RANGE);
        if !hyperdrive && !jump_drive {
            return false;
        }
        if self.fuel < self.jump_fuel() {
            return false;
        }
        let heading = Angle::of(there.position - here.position);
        self.angle.delta_to(heading).abs() <= self.catalog.config().jump_alignment_degrees
    }

    fn begin_jump(&mut self, destination: SystemId) {
        self.fuel = (self.fuel - self.jump_fuel()).max(Fixed64::ZERO);
        let total = self.catalog.config().hyperspace_ticks;
        debug!(ship = %self.name, destination = ?destination, "jump begun");
        self.state = SpecialState::Hyperspacing(JumpState {
            destination,
            countdown: total,
            total,
        });
    }

    fn step_hyperspace(&mut self) {
        let SpecialState::Hyperspacing(jump) = &mut self.state else {
            return;
        };
        jump.countdown = jump.countdown.saturating_sub(1);
        let arrived = jump.countdown == 0;
        let destination = jump.destination;

        let config = self.catalog.config();
        self.velocity += self.angle.unit() * config.hyperspace_acceleration;
        self.position += self.velocity;

        if arrived {
            // System centers are the origin of their local frame.
            let arrival = config.arrival_distance;
            self.system = Some(destination);
            self.position = -self.angle.unit() * arrival;
            self.velocity = self.angle.unit() * self.max_velocity();
            self.target_system = None;
            self.target_planet = None;
            self.state = SpecialState::Flying;
            debug!(ship = %self.name, system = ?destination, "jump arrived");
        }
    }

    // -----------------------------------------------------------------------
    // Destruction
    // -----------------------------------------------------------------------

    fn begin_explosion(&mut self) {
        let config = self.catalog.config();
        debug!(ship = %self.name, "explosion begun");
        self.state = SpecialState::Exploding(ExplosionState {
            elapsed: 0,
            total: config.explosion_ticks,
            interval: config.explosion_interval,
        });
        self.is_thrusting = false;
    }

    fn step_explosion(&mut self, effects: &mut Vec<EffectSpawn>) -> bool {
        let SpecialState::Exploding(explosion) = &mut self.state else {
            return false;
        };
        explosion.elapsed += 1;
        let burst = explosion.is_burst();
        let finished = explosion.is_finished();
        let progress = explosion.progress();

        self.apply_drag();
        self.position += self.velocity;

        let origin = self.origin();
        if burst {
            for (&effect, &count) in self.base.die_effects() {
                for _ in 0..count.max(0) {
                    if self.rng.chance(progress) {
                        effects.push(EffectSpawn::new(effect, origin));
                    }
                }
            }
        }
        if finished {
            for (&effect, &count) in self.base.die_effects() {
                for _ in 0..count.max(0) {
                    effects.push(EffectSpawn::new(effect, origin));
                }
            }
            debug!(ship = %self.name, "destroyed");
            self.should_delete = true;
            return true;
        }
        false
    }
}

/// One tick of repair for a pool, paid for out of `energy`. Returns the new
/// level, or `None` if nothing changed.
fn repair(
    level: Fixed64,
    max: Fixed64,
    rate: Fixed64,
    energy_per_point: Fixed64,
    energy: &mut Fixed64,
) -> Option<Fixed64> {
    if rate <= Fixed64::ZERO || level >= max {
        return None;
    }
    let mut amount = rate.min(max - level);
    if energy_per_point > Fixed64::ZERO {
        let cost_per_rate = energy_per_point.saturating_mul(amount) / rate;
        if cost_per_rate > *energy {
            // Repair only what the remaining energy pays for.
            amount = amount.saturating_mul(*energy) / cost_per_rate;
            *energy = Fixed64::ZERO;
        } else {
            *energy -= cost_per_rate;
        }
    }
    if amount <= Fixed64::ZERO {
        return None;
    }
    Some(level + amount)
}
