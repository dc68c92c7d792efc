//! Saving and restoring ships.
//!
//! A [`ShipRecord`] is everything a ship needs to resume mid-flight with
//! every catalog reference written by name, so saves survive catalog
//! reordering. Reload timers, the special state, and the ship's RNG are
//! kept, so a restored ship continues exactly as the original would have.
//! Records go to disk as JSON text, or in bulk as a versioned `bitcode`
//! snapshot for save slots.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::armament::Armament;
use crate::catalog::Catalog;
use crate::fixed::Fixed64;
use crate::geometry::Angle;
use crate::id::{PlanetId, SystemId};
use crate::ship::{ExplosionState, JumpState, LandingPhase, LandingState, Ship, SpecialState};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a ship snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x5348_4950;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 2;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while converting between ships and records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown ship model: {0}")]
    UnknownModel(String),
    #[error("unknown outfit: {0}")]
    UnknownOutfit(String),
    #[error("unknown system: {0}")]
    UnknownSystem(String),
    #[error("unknown planet: {0}")]
    UnknownPlanet(String),
    #[error("unknown government: {0}")]
    UnknownGovernment(String),
    #[error("outfit {0} is not a weapon and cannot be mounted")]
    NotAWeapon(String),
}

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during deserialization.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Ship record
// ---------------------------------------------------------------------------

/// One hardpoint: where it sits, what it holds, and how far along its
/// reload is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountRecord {
    pub point: [f64; 2],
    #[serde(default)]
    pub is_turret: bool,
    #[serde(default)]
    pub weapon: Option<String>,
    #[serde(default)]
    pub countdown: u32,
    #[serde(default)]
    pub aim: f64,
}

/// [`SpecialState`] with its catalog references written by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum StateRecord {
    #[default]
    Flying,
    Landing {
        planet: String,
        zoom: f64,
        phase: LandingPhase,
        progress: u32,
    },
    Hyperspacing {
        destination: String,
        countdown: u32,
        total: u32,
    },
    Exploding(ExplosionState),
}

impl StateRecord {
    fn from_state(state: &SpecialState, catalog: &Catalog) -> Self {
        match state {
            SpecialState::Flying => StateRecord::Flying,
            SpecialState::Landing(landing) => match catalog.planet(landing.planet) {
                Some(planet) => StateRecord::Landing {
                    planet: planet.name.clone(),
                    zoom: landing.zoom,
                    phase: landing.phase,
                    progress: landing.progress,
                },
                None => StateRecord::Flying,
            },
            SpecialState::Hyperspacing(jump) => match catalog.system(jump.destination) {
                Some(system) => StateRecord::Hyperspacing {
                    destination: system.name.clone(),
                    countdown: jump.countdown,
                    total: jump.total,
                },
                None => StateRecord::Flying,
            },
            SpecialState::Exploding(explosion) => StateRecord::Exploding(explosion.clone()),
        }
    }

    fn to_state(&self, catalog: &Catalog) -> Result<SpecialState, RecordError> {
        Ok(match self {
            StateRecord::Flying => SpecialState::Flying,
            StateRecord::Landing {
                planet,
                zoom,
                phase,
                progress,
            } => SpecialState::Landing(LandingState {
                planet: planet_id(catalog, planet)?,
                zoom: *zoom,
                phase: *phase,
                progress: *progress,
            }),
            StateRecord::Hyperspacing {
                destination,
                countdown,
                total,
            } => SpecialState::Hyperspacing(JumpState {
                destination: system_id(catalog, destination)?,
                countdown: *countdown,
                total: *total,
            }),
            StateRecord::Exploding(explosion) => SpecialState::Exploding(explosion.clone()),
        })
    }
}

fn planet_id(catalog: &Catalog, name: &str) -> Result<PlanetId, RecordError> {
    catalog
        .planet_id(name)
        .ok_or_else(|| RecordError::UnknownPlanet(name.to_string()))
}

fn system_id(catalog: &Catalog, name: &str) -> Result<SystemId, RecordError> {
    catalog
        .system_id(name)
        .ok_or_else(|| RecordError::UnknownSystem(name.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRecord {
    pub model: String,
    pub name: String,
    #[serde(default)]
    pub government: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub planet: Option<String>,
    #[serde(default)]
    pub target_system: Option<String>,
    #[serde(default)]
    pub target_planet: Option<String>,
    #[serde(default)]
    pub position: [f64; 2],
    #[serde(default)]
    pub velocity: [f64; 2],
    #[serde(default)]
    pub angle: f64,
    #[serde(default)]
    pub outfits: BTreeMap<String, i32>,
    #[serde(default)]
    pub cargo: BTreeMap<String, i32>,
    /// Empty means the model's hardpoints with the loadout installed in
    /// order and every mount ready.
    #[serde(default)]
    pub mounts: Vec<MountRecord>,
    pub shields: Fixed64,
    pub hull: Fixed64,
    pub fuel: Fixed64,
    pub energy: Fixed64,
    #[serde(default)]
    pub heat: Fixed64,
    #[serde(default)]
    pub is_overheated: bool,
    #[serde(default)]
    pub is_thrusting: bool,
    #[serde(default)]
    pub is_special: bool,
    #[serde(default)]
    pub state: StateRecord,
    /// `None` keeps the configured forget timeout.
    #[serde(default)]
    pub forget: Option<u32>,
    /// `None` seeds the RNG from the name, as for a new ship.
    #[serde(default)]
    pub rng_state: Option<u64>,
    #[serde(default)]
    pub carried: Vec<ShipRecord>,
}

impl ShipRecord {
    /// Capture the full state of a ship.
    pub fn from_ship(ship: &Ship) -> Self {
        let catalog = ship.catalog();
        let name_of_outfit = |id| catalog.outfit(id).map(|o| o.name().to_string());
        let name_of_system = |id| catalog.system(id).map(|s| s.name.clone());
        let name_of_planet = |id| catalog.planet(id).map(|p| p.name.clone());
        Self {
            model: ship.model_name().to_string(),
            name: ship.name().to_string(),
            government: ship
                .government()
                .and_then(|id| catalog.government(id))
                .map(|g| g.name.clone()),
            system: ship.system().and_then(name_of_system),
            planet: ship.planet().and_then(name_of_planet),
            target_system: ship.target_system().and_then(name_of_system),
            target_planet: ship.target_planet().and_then(name_of_planet),
            position: ship.position().to_array(),
            velocity: ship.velocity().to_array(),
            angle: ship.facing().degrees(),
            outfits: ship
                .outfits()
                .iter()
                .filter_map(|(&id, &count)| Some((name_of_outfit(id)?, count)))
                .collect(),
            cargo: ship.cargo().clone(),
            mounts: ship
                .armament()
                .mounts()
                .iter()
                .map(|m| MountRecord {
                    point: m.point().to_array(),
                    is_turret: m.is_turret(),
                    weapon: m.weapon().and_then(name_of_outfit),
                    countdown: m.countdown(),
                    aim: m.aim().degrees(),
                })
                .collect(),
            shields: ship.shield_points(),
            hull: ship.hull_points(),
            fuel: ship.fuel_amount(),
            energy: ship.energy_amount(),
            heat: ship.heat_amount(),
            is_overheated: ship.is_overheated(),
            is_thrusting: ship.is_thrusting(),
            is_special: ship.is_special(),
            state: StateRecord::from_state(ship.special_state(), catalog),
            forget: Some(ship.forget_countdown()),
            rng_state: Some(ship.rng_state()),
            carried: ship.carried().iter().map(ShipRecord::from_ship).collect(),
        }
    }

    /// Rebuild a ship against `catalog`. The recorded loadout replaces the
    /// model's default one.
    pub fn to_ship(&self, catalog: &Arc<Catalog>) -> Result<Ship, RecordError> {
        let model = catalog
            .ship_model_id(&self.model)
            .ok_or_else(|| RecordError::UnknownModel(self.model.clone()))?;
        let mut ship =
            Ship::from_model(catalog, model).map_err(|_| RecordError::UnknownModel(self.model.clone()))?;
        ship.set_name(self.name.clone());
        if let Some(seed) = self.rng_state {
            ship.set_seed(seed);
        }
        ship.set_is_special(self.is_special);

        if let Some(name) = &self.government {
            let id = catalog
                .government_id(name)
                .ok_or_else(|| RecordError::UnknownGovernment(name.clone()))?;
            ship.set_government(Some(id));
        }
        let system = |name: &Option<String>| name.as_deref().map(|n| system_id(catalog, n)).transpose();
        let planet = |name: &Option<String>| name.as_deref().map(|n| planet_id(catalog, n)).transpose();
        ship.set_system(system(&self.system)?);
        ship.set_planet(planet(&self.planet)?);
        ship.set_target_system(system(&self.target_system)?);
        ship.set_target_planet(planet(&self.target_planet)?);

        let mut loadout = Vec::with_capacity(self.outfits.len());
        for (name, &count) in &self.outfits {
            let id = catalog
                .outfit_id(name)
                .ok_or_else(|| RecordError::UnknownOutfit(name.clone()))?;
            loadout.push((id, count));
        }
        let defaults: Vec<_> = ship.outfits().iter().map(|(&id, &count)| (id, count)).collect();
        for (id, count) in defaults {
            ship.apply_outfit(id, -count);
        }
        for (id, count) in loadout {
            ship.apply_outfit(id, count);
        }
        if !self.mounts.is_empty() {
            ship.replace_armament(self.armament(catalog)?);
        }

        for (commodity, &tons) in &self.cargo {
            ship.add_cargo(tons, commodity);
        }
        ship.place(
            DVec2::from_array(self.position),
            DVec2::from_array(self.velocity),
            Angle::from_degrees(self.angle),
        );
        ship.set_pools(self.shields, self.hull, self.fuel, self.energy, self.heat);
        ship.restore_runtime(
            self.state.to_state(catalog)?,
            self.forget.unwrap_or(catalog.config().forget_ticks),
            self.is_overheated,
            self.is_thrusting,
        );
        for carried in &self.carried {
            ship.carry(carried.to_ship(catalog)?);
        }
        Ok(ship)
    }

    /// The recorded hardpoints, in their recorded order.
    fn armament(&self, catalog: &Catalog) -> Result<Armament, RecordError> {
        let mut armament = Armament::new();
        for (index, mount) in self.mounts.iter().enumerate() {
            let point = DVec2::from_array(mount.point);
            if mount.is_turret {
                armament.add_turret(point);
            } else {
                armament.add_gun_port(point);
            }
            let weapon = match &mount.weapon {
                Some(name) => {
                    let id = catalog
                        .outfit_id(name)
                        .ok_or_else(|| RecordError::UnknownOutfit(name.clone()))?;
                    let outfit = catalog
                        .outfit(id)
                        .filter(|o| o.is_weapon())
                        .ok_or_else(|| RecordError::NotAWeapon(name.clone()))?;
                    Some((id, outfit))
                }
                None => None,
            };
            armament.restore_mount(index, weapon, mount.countdown, Angle::from_degrees(mount.aim));
        }
        Ok(armament)
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot. Enables format detection
/// and version checking before the payload is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic number for format detection.
    pub magic: u32,
    /// Format version for forward compatibility.
    pub version: u32,
    /// Tick count at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

/// A save slot: every ship worth keeping, as of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub header: SnapshotHeader,
    pub ships: Vec<ShipRecord>,
}

impl Snapshot {
    pub fn capture<'a>(tick: u64, ships: impl IntoIterator<Item = &'a Ship>) -> Self {
        Self {
            header: SnapshotHeader::new(tick),
            ships: ships.into_iter().map(ShipRecord::from_ship).collect(),
        }
    }

    /// Serialize to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        bitcode::serialize(self).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Deserialize from bytes, rejecting foreign or mismatched versions.
    pub fn deserialize(data: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot: Snapshot =
            bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        Ok(snapshot)
    }

    /// Rebuild every ship in the snapshot.
    pub fn restore(&self, catalog: &Arc<Catalog>) -> Result<Vec<Ship>, RecordError> {
        self.ships.iter().map(|r| r.to_ship(catalog)).collect()
    }
}
