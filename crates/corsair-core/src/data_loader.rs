//! Data-driven catalog loading from JSON.
//!
//! Feature-gated behind `data-loader`. Provides JSON deserialization into
//! [`CatalogBuilder`] for game content defined in data files. Every
//! reference between records is by name and is resolved here; forward
//! references (an outfit naming ammunition defined later) are allowed.

use std::collections::BTreeMap;

use glam::DVec2;

use crate::catalog::{CatalogBuilder, CatalogError, EffectDef, Planet, ShipModel};
use crate::config::SimConfig;
use crate::fixed::{Fixed64, checked_f64_to_fixed64};
use crate::id::{EffectId, GovernmentId, OutfitId, SpriteHandle, SystemId};
use crate::outfit::Outfit;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("unknown effect reference: {0}")]
    UnknownEffectRef(String),
    #[error("unknown outfit reference: {0}")]
    UnknownOutfitRef(String),
    #[error("unknown system reference: {0}")]
    UnknownSystemRef(String),
    #[error("unknown government reference: {0}")]
    UnknownGovernmentRef(String),
    #[error("{outfit}: value {value} for \"{attribute}\" is out of range")]
    ValueOutOfRange {
        outfit: String,
        attribute: String,
        value: f64,
    },
}

// ---------------------------------------------------------------------------
// JSON data structures
// ---------------------------------------------------------------------------

/// Top-level catalog data structure for JSON deserialization.
#[derive(Debug, serde::Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub config: Option<SimConfig>,
    #[serde(default)]
    pub effects: Vec<EffectData>,
    #[serde(default)]
    pub outfits: Vec<OutfitData>,
    #[serde(default)]
    pub governments: Vec<GovernmentData>,
    #[serde(default)]
    pub systems: Vec<SystemData>,
    #[serde(default)]
    pub planets: Vec<PlanetData>,
    #[serde(default)]
    pub ships: Vec<ShipData>,
}

#[derive(Debug, serde::Deserialize)]
pub struct EffectData {
    pub name: String,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub lifetime: u32,
}

#[derive(Debug, serde::Deserialize)]
pub struct OutfitData {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
    #[serde(default)]
    pub weapon: BTreeMap<String, f64>,
    #[serde(default)]
    pub flare: Option<String>,
    #[serde(default)]
    pub weapon_sprite: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub ammo: Option<String>, // references outfit by name
    #[serde(default)]
    pub hit_effects: BTreeMap<String, i32>, // effect name -> count
    #[serde(default)]
    pub die_effects: BTreeMap<String, i32>,
    #[serde(default)]
    pub submunitions: BTreeMap<String, i32>, // outfit name -> count
}

#[derive(Debug, serde::Deserialize)]
pub struct GovernmentData {
    pub name: String,
    #[serde(default)]
    pub enemies: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SystemData {
    pub name: String,
    pub position: [f64; 2],
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct PlanetData {
    pub name: String,
    pub system: String,
    pub position: [f64; 2],
    pub radius: f64,
    #[serde(default)]
    pub spaceport: bool,
    #[serde(default)]
    pub government: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct ShipData {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sprite: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
    /// Explosion table: effect name -> count.
    #[serde(default)]
    pub explode: BTreeMap<String, i32>,
    #[serde(default)]
    pub gun_points: Vec<[f64; 2]>,
    #[serde(default)]
    pub turret_points: Vec<[f64; 2]>,
    #[serde(default)]
    pub engine_points: Vec<[f64; 2]>,
    /// Default loadout: outfit name -> count.
    #[serde(default)]
    pub outfits: BTreeMap<String, i32>,
}

// ---------------------------------------------------------------------------
// Loading functions
// ---------------------------------------------------------------------------

/// Load a catalog builder from a JSON string.
pub fn load_catalog_json(json: &str) -> Result<CatalogBuilder, DataLoadError> {
    let data: CatalogData = serde_json::from_str(json)?;
    build_catalog(data)
}

/// Load a catalog builder from JSON bytes.
pub fn load_catalog_json_bytes(bytes: &[u8]) -> Result<CatalogBuilder, DataLoadError> {
    let data: CatalogData = serde_json::from_slice(bytes)?;
    build_catalog(data)
}

fn sprite(name: &Option<String>) -> Option<SpriteHandle> {
    name.as_deref().map(SpriteHandle::new)
}

fn point(p: &[f64; 2]) -> DVec2 {
    DVec2::from_array(*p)
}

fn effect_ref(builder: &CatalogBuilder, name: &str) -> Result<EffectId, DataLoadError> {
    builder
        .effect_id(name)
        .ok_or_else(|| DataLoadError::UnknownEffectRef(name.to_string()))
}

fn outfit_ref(builder: &CatalogBuilder, name: &str) -> Result<OutfitId, DataLoadError> {
    builder
        .outfit_id(name)
        .ok_or_else(|| DataLoadError::UnknownOutfitRef(name.to_string()))
}

fn system_ref(builder: &CatalogBuilder, name: &str) -> Result<SystemId, DataLoadError> {
    builder
        .system_id(name)
        .ok_or_else(|| DataLoadError::UnknownSystemRef(name.to_string()))
}

fn government_ref(builder: &CatalogBuilder, name: &str) -> Result<GovernmentId, DataLoadError> {
    builder
        .government_id(name)
        .ok_or_else(|| DataLoadError::UnknownGovernmentRef(name.to_string()))
}

fn magnitude(outfit: &str, attribute: &str, value: f64) -> Result<Fixed64, DataLoadError> {
    checked_f64_to_fixed64(value).ok_or_else(|| DataLoadError::ValueOutOfRange {
        outfit: outfit.to_string(),
        attribute: attribute.to_string(),
        value,
    })
}

/// Plain attribute sheet. Effect and outfit references are resolved by the
/// callers.
fn parse_sheet(name: &str, attributes: &BTreeMap<String, f64>) -> Result<Outfit, DataLoadError> {
    let mut sheet = Outfit::new(name);
    for (attribute, &value) in attributes {
        sheet.reset(attribute, magnitude(name, attribute, value)?);
    }
    Ok(sheet)
}

fn parse_outfit(builder: &CatalogBuilder, data: &OutfitData) -> Result<Outfit, DataLoadError> {
    let mut outfit = parse_sheet(&data.name, &data.attributes)?
        .with_category(data.category.clone())
        .with_description(data.description.clone());
    for (name, &value) in &data.weapon {
        outfit = outfit.with_weapon_value(name, magnitude(&data.name, name, value)?);
    }
    if let Some(s) = sprite(&data.thumbnail) {
        outfit = outfit.with_thumbnail(s);
    }
    if let Some(s) = sprite(&data.flare) {
        outfit = outfit.with_flare(s);
    }
    if let Some(s) = sprite(&data.weapon_sprite) {
        outfit = outfit.with_weapon_sprite(s);
    }
    if let Some(s) = sprite(&data.icon) {
        outfit = outfit.with_icon(s);
    }
    for (name, &count) in &data.hit_effects {
        outfit = outfit.with_hit_effect(effect_ref(builder, name)?, count);
    }
    for (name, &count) in &data.die_effects {
        outfit = outfit.with_die_effect(effect_ref(builder, name)?, count);
    }
    Ok(outfit)
}

fn build_catalog(data: CatalogData) -> Result<CatalogBuilder, DataLoadError> {
    let mut builder = CatalogBuilder::new();
    if let Some(config) = data.config {
        builder.set_config(config);
    }

    // Phase 1: Register effects
    for effect in &data.effects {
        builder.register_effect(EffectDef {
            name: effect.name.clone(),
            sprite: sprite(&effect.sprite),
            lifetime: effect.lifetime,
        });
    }

    // Phase 2: Register outfits, then resolve outfit-to-outfit references
    for outfit in &data.outfits {
        let parsed = parse_outfit(&builder, outfit)?;
        builder.register_outfit(parsed);
    }
    for outfit in &data.outfits {
        let ammo = outfit
            .ammo
            .as_deref()
            .map(|name| outfit_ref(&builder, name))
            .transpose()?;
        let submunitions = outfit
            .submunitions
            .iter()
            .map(|(name, &count)| Ok((outfit_ref(&builder, name)?, count)))
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        if ammo.is_none() && submunitions.is_empty() {
            continue;
        }
        builder.mutate_outfit(&outfit.name, |o| {
            let mut resolved = std::mem::take(o);
            if let Some(ammo) = ammo {
                resolved = resolved.with_ammo(ammo);
            }
            for (sub, count) in submunitions {
                resolved = resolved.with_submunition(sub, count);
            }
            *o = resolved;
        })?;
    }

    // Phase 3: Governments, then their hostilities
    for government in &data.governments {
        builder.register_government(&government.name);
    }
    for government in &data.governments {
        let id = government_ref(&builder, &government.name)?;
        for enemy in &government.enemies {
            let enemy = government_ref(&builder, enemy)?;
            builder.declare_enemies(id, enemy)?;
        }
    }

    // Phase 4: Systems, then links
    for system in &data.systems {
        builder.register_system(&system.name, point(&system.position));
    }
    for system in &data.systems {
        let id = system_ref(&builder, &system.name)?;
        for link in &system.links {
            let link = system_ref(&builder, link)?;
            builder.link_systems(id, link)?;
        }
    }

    // Phase 5: Planets
    for planet in &data.planets {
        let system = system_ref(&builder, &planet.system)?;
        let government = planet
            .government
            .as_deref()
            .map(|name| government_ref(&builder, name))
            .transpose()?;
        builder.register_planet(Planet {
            name: planet.name.clone(),
            system,
            position: point(&planet.position),
            radius: planet.radius,
            has_spaceport: planet.spaceport,
            government,
        });
    }

    // Phase 6: Ship models
    for ship in &data.ships {
        let mut chassis = parse_sheet(&ship.name, &ship.attributes)?;
        for (name, &count) in &ship.explode {
            chassis = chassis.with_die_effect(effect_ref(&builder, name)?, count);
        }
        let mut model = ShipModel::new(&ship.name, chassis);
        model.description = ship.description.clone();
        model.sprite = sprite(&ship.sprite);
        model.gun_points = ship.gun_points.iter().map(point).collect();
        model.turret_points = ship.turret_points.iter().map(point).collect();
        model.engine_points = ship.engine_points.iter().map(point).collect();
        for (name, &count) in &ship.outfits {
            model.outfits.push((outfit_ref(&builder, name)?, count));
        }
        builder.register_ship_model(model);
    }

    Ok(builder)
}
