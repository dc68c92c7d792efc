//! Immutable game data shared by every ship: outfits, effects, star systems,
//! planets, governments, and ship models.
//!
//! Built through a [`CatalogBuilder`] in three phases: registration ->
//! mutation -> finalization. [`CatalogBuilder::build`] is the point where
//! every cross reference (ammunition, submunitions, effects, links, planet
//! systems, model loadouts) must resolve. Ships assume all references they
//! hold are valid once the catalog is built.

use std::collections::{BTreeSet, HashMap};

use glam::DVec2;
use tracing::info;

use crate::config::SimConfig;
use crate::id::*;
use crate::outfit::Outfit;

/// A visual effect template.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDef {
    pub name: String,
    pub sprite: Option<SpriteHandle>,
    /// Ticks the effect stays on screen.
    pub lifetime: u32,
}

/// A region of space. Ships jump between systems.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSystem {
    pub name: String,
    /// Position on the galaxy map; jump alignment and jump range use it.
    pub position: DVec2,
    /// Systems reachable with a hyperdrive.
    pub links: BTreeSet<SystemId>,
}

/// Something a ship can land on.
#[derive(Debug, Clone, PartialEq)]
pub struct Planet {
    pub name: String,
    pub system: SystemId,
    /// Position within its system.
    pub position: DVec2,
    pub radius: f64,
    pub has_spaceport: bool,
    pub government: Option<GovernmentId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Government {
    pub name: String,
    pub enemies: BTreeSet<GovernmentId>,
}

/// A chassis template: base attributes, hardpoints, and a default loadout.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipModel {
    pub name: String,
    pub description: String,
    pub sprite: Option<SpriteHandle>,
    /// Chassis attributes. Its die effects are the explosion table.
    pub attributes: Outfit,
    /// Outfits installed on a new ship of this model, in install order.
    pub outfits: Vec<(OutfitId, i32)>,
    pub gun_points: Vec<DVec2>,
    pub turret_points: Vec<DVec2>,
    pub engine_points: Vec<DVec2>,
}

impl ShipModel {
    pub fn new(name: impl Into<String>, attributes: Outfit) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            sprite: None,
            attributes,
            outfits: Vec::new(),
            gun_points: Vec::new(),
            turret_points: Vec::new(),
            engine_points: Vec::new(),
        }
    }
}

/// Builder for constructing an immutable Catalog.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    config: SimConfig,
    outfits: Vec<Outfit>,
    outfit_names: HashMap<String, OutfitId>,
    effects: Vec<EffectDef>,
    effect_names: HashMap<String, EffectId>,
    systems: Vec<StarSystem>,
    system_names: HashMap<String, SystemId>,
    planets: Vec<Planet>,
    planet_names: HashMap<String, PlanetId>,
    governments: Vec<Government>,
    government_names: HashMap<String, GovernmentId>,
    models: Vec<ShipModel>,
    model_names: HashMap<String, ShipModelId>,
    duplicates: Vec<(&'static str, String)>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_config(&mut self, config: SimConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Phase 1: Register an outfit. Returns its ID.
    pub fn register_outfit(&mut self, outfit: Outfit) -> OutfitId {
        let id = OutfitId(self.outfits.len() as u32);
        let name = outfit.name().to_string();
        self.outfits.push(outfit);
        if self.outfit_names.insert(name.clone(), id).is_some() {
            self.duplicates.push(("outfit", name));
        }
        id
    }

    /// Phase 1: Register an effect template. Returns its ID.
    pub fn register_effect(&mut self, effect: EffectDef) -> EffectId {
        let id = EffectId(self.effects.len() as u32);
        let name = effect.name.clone();
        self.effects.push(effect);
        if self.effect_names.insert(name.clone(), id).is_some() {
            self.duplicates.push(("effect", name));
        }
        id
    }

    /// Phase 1: Register a star system. Returns its ID.
    pub fn register_system(&mut self, name: &str, position: DVec2) -> SystemId {
        let id = SystemId(self.systems.len() as u32);
        self.systems.push(StarSystem {
            name: name.to_string(),
            position,
            links: BTreeSet::new(),
        });
        if self.system_names.insert(name.to_string(), id).is_some() {
            self.duplicates.push(("system", name.to_string()));
        }
        id
    }

    /// Phase 1: Register a planet. Returns its ID.
    pub fn register_planet(&mut self, planet: Planet) -> PlanetId {
        let id = PlanetId(self.planets.len() as u32);
        let name = planet.name.clone();
        self.planets.push(planet);
        if self.planet_names.insert(name.clone(), id).is_some() {
            self.duplicates.push(("planet", name));
        }
        id
    }

    /// Phase 1: Register a government. Returns its ID.
    pub fn register_government(&mut self, name: &str) -> GovernmentId {
        let id = GovernmentId(self.governments.len() as u32);
        self.governments.push(Government {
            name: name.to_string(),
            enemies: BTreeSet::new(),
        });
        if self.government_names.insert(name.to_string(), id).is_some() {
            self.duplicates.push(("government", name.to_string()));
        }
        id
    }

    /// Phase 1: Register a ship model. Returns its ID.
    pub fn register_ship_model(&mut self, model: ShipModel) -> ShipModelId {
        let id = ShipModelId(self.models.len() as u32);
        let name = model.name.clone();
        self.models.push(model);
        if self.model_names.insert(name.clone(), id).is_some() {
            self.duplicates.push(("ship model", name));
        }
        id
    }

    /// Phase 2: Connect two systems with a hyperspace link (both directions).
    pub fn link_systems(&mut self, a: SystemId, b: SystemId) -> Result<(), CatalogError> {
        if b.0 as usize >= self.systems.len() {
            return Err(CatalogError::InvalidSystemRef(b));
        }
        self.systems
            .get_mut(a.0 as usize)
            .ok_or(CatalogError::InvalidSystemRef(a))?
            .links
            .insert(b);
        self.systems[b.0 as usize].links.insert(a);
        Ok(())
    }

    /// Phase 2: Mark two governments as hostile to each other.
    pub fn declare_enemies(&mut self, a: GovernmentId, b: GovernmentId) -> Result<(), CatalogError> {
        if b.0 as usize >= self.governments.len() {
            return Err(CatalogError::InvalidGovernmentRef(b));
        }
        self.governments
            .get_mut(a.0 as usize)
            .ok_or(CatalogError::InvalidGovernmentRef(a))?
            .enemies
            .insert(b);
        self.governments[b.0 as usize].enemies.insert(a);
        Ok(())
    }

    /// Phase 2: Mutate an existing outfit by name.
    pub fn mutate_outfit<F>(&mut self, name: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut Outfit),
    {
        let id = self
            .outfit_names
            .get(name)
            .ok_or(CatalogError::NotFound(name.to_string()))?;
        f(&mut self.outfits[id.0 as usize]);
        Ok(())
    }

    /// Phase 2: Mutate an existing ship model by name.
    pub fn mutate_ship_model<F>(&mut self, name: &str, f: F) -> Result<(), CatalogError>
    where
        F: FnOnce(&mut ShipModel),
    {
        let id = self
            .model_names
            .get(name)
            .ok_or(CatalogError::NotFound(name.to_string()))?;
        f(&mut self.models[id.0 as usize]);
        Ok(())
    }

    pub fn outfit_id(&self, name: &str) -> Option<OutfitId> {
        self.outfit_names.get(name).copied()
    }

    pub fn effect_id(&self, name: &str) -> Option<EffectId> {
        self.effect_names.get(name).copied()
    }

    pub fn system_id(&self, name: &str) -> Option<SystemId> {
        self.system_names.get(name).copied()
    }

    pub fn planet_id(&self, name: &str) -> Option<PlanetId> {
        self.planet_names.get(name).copied()
    }

    pub fn government_id(&self, name: &str) -> Option<GovernmentId> {
        self.government_names.get(name).copied()
    }

    pub fn ship_model_id(&self, name: &str) -> Option<ShipModelId> {
        self.model_names.get(name).copied()
    }

    /// Phase 3: Validate every cross reference and freeze the catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if let Some((kind, name)) = self.duplicates.first() {
            return Err(CatalogError::Duplicate {
                kind,
                name: name.clone(),
            });
        }

        let outfit_ok = |id: &OutfitId| (id.0 as usize) < self.outfits.len();
        let effect_ok = |id: &EffectId| (id.0 as usize) < self.effects.len();
        let government_ok = |id: &GovernmentId| (id.0 as usize) < self.governments.len();

        for outfit in self.outfits.iter().chain(self.models.iter().map(|m| &m.attributes)) {
            if let Some(ammo) = outfit.ammo()
                && !outfit_ok(&ammo)
            {
                return Err(CatalogError::InvalidOutfitRef(ammo));
            }
            if let Some(sub) = outfit.submunitions().keys().find(|id| !outfit_ok(id)) {
                return Err(CatalogError::InvalidOutfitRef(*sub));
            }
            if let Some(effect) = outfit
                .hit_effects()
                .keys()
                .chain(outfit.die_effects().keys())
                .find(|id| !effect_ok(id))
            {
                return Err(CatalogError::InvalidEffectRef(*effect));
            }
        }

        for system in &self.systems {
            if let Some(link) = system.links.iter().find(|id| id.0 as usize >= self.systems.len()) {
                return Err(CatalogError::InvalidSystemRef(*link));
            }
        }

        for planet in &self.planets {
            if planet.system.0 as usize >= self.systems.len() {
                return Err(CatalogError::InvalidSystemRef(planet.system));
            }
            if let Some(gov) = planet.government
                && !government_ok(&gov)
            {
                return Err(CatalogError::InvalidGovernmentRef(gov));
            }
        }

        for government in &self.governments {
            if let Some(enemy) = government.enemies.iter().find(|id| !government_ok(id)) {
                return Err(CatalogError::InvalidGovernmentRef(*enemy));
            }
        }

        for model in &self.models {
            if let Some((id, _)) = model.outfits.iter().find(|(id, _)| !outfit_ok(id)) {
                return Err(CatalogError::InvalidOutfitRef(*id));
            }
        }

        info!(
            outfits = self.outfits.len(),
            effects = self.effects.len(),
            systems = self.systems.len(),
            planets = self.planets.len(),
            governments = self.governments.len(),
            ship_models = self.models.len(),
            "catalog built"
        );

        Ok(Catalog {
            config: self.config,
            outfits: self.outfits,
            outfit_names: self.outfit_names,
            effects: self.effects,
            effect_names: self.effect_names,
            systems: self.systems,
            system_names: self.system_names,
            planets: self.planets,
            planet_names: self.planet_names,
            governments: self.governments,
            government_names: self.government_names,
            models: self.models,
            model_names: self.model_names,
        })
    }
}

/// Immutable catalog. Frozen after build(). Share it behind an `Arc`.
#[derive(Debug)]
pub struct Catalog {
    config: SimConfig,
    outfits: Vec<Outfit>,
    outfit_names: HashMap<String, OutfitId>,
    effects: Vec<EffectDef>,
    effect_names: HashMap<String, EffectId>,
    systems: Vec<StarSystem>,
    system_names: HashMap<String, SystemId>,
    planets: Vec<Planet>,
    planet_names: HashMap<String, PlanetId>,
    governments: Vec<Government>,
    government_names: HashMap<String, GovernmentId>,
    models: Vec<ShipModel>,
    model_names: HashMap<String, ShipModelId>,
}

impl Catalog {
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn outfit(&self, id: OutfitId) -> Option<&Outfit> {
        self.outfits.get(id.0 as usize)
    }

    pub fn effect(&self, id: EffectId) -> Option<&EffectDef> {
        self.effects.get(id.0 as usize)
    }

    pub fn system(&self, id: SystemId) -> Option<&StarSystem> {
        self.systems.get(id.0 as usize)
    }

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.planets.get(id.0 as usize)
    }

    pub fn government(&self, id: GovernmentId) -> Option<&Government> {
        self.governments.get(id.0 as usize)
    }

    pub fn ship_model(&self, id: ShipModelId) -> Option<&ShipModel> {
        self.models.get(id.0 as usize)
    }

    pub fn outfit_id(&self, name: &str) -> Option<OutfitId> {
        self.outfit_names.get(name).copied()
    }

    pub fn effect_id(&self, name: &str) -> Option<EffectId> {
        self.effect_names.get(name).copied()
    }

    pub fn system_id(&self, name: &str) -> Option<SystemId> {
        self.system_names.get(name).copied()
    }

    pub fn planet_id(&self, name: &str) -> Option<PlanetId> {
        self.planet_names.get(name).copied()
    }

    pub fn government_id(&self, name: &str) -> Option<GovernmentId> {
        self.government_names.get(name).copied()
    }

    pub fn ship_model_id(&self, name: &str) -> Option<ShipModelId> {
        self.model_names.get(name).copied()
    }

    /// Whether two governments are hostile. Ships without a government are
    /// hostile to no one.
    pub fn is_enemy(&self, a: Option<GovernmentId>, b: Option<GovernmentId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self
                .government(a)
                .map(|g| g.enemies.contains(&b))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn outfit_count(&self) -> usize {
        self.outfits.len()
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn ship_model_count(&self) -> usize {
        self.models.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate {kind}: {name}")]
    Duplicate { kind: &'static str, name: String },
    #[error("invalid outfit reference: {0:?}")]
    InvalidOutfitRef(OutfitId),
    #[error("invalid effect reference: {0:?}")]
    InvalidEffectRef(EffectId),
    #[error("invalid system reference: {0:?}")]
    InvalidSystemRef(SystemId),
    #[error("invalid government reference: {0:?}")]
    InvalidGovernmentRef(GovernmentId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outfit::{attr, weapon};

    fn setup_builder() -> CatalogBuilder {
        let mut b = CatalogBuilder::new();
        let spark = b.register_effect(EffectDef {
            name: "spark".to_string(),
            sprite: None,
            lifetime: 10,
        });
        let rocket = b.register_outfit(Outfit::new("Rocket").with_attribute(attr::MASS, 1.0));
        b.register_outfit(
            Outfit::new("Rocket Launcher")
                .with_weapon(weapon::RELOAD, 30.0)
                .with_ammo(rocket)
                .with_hit_effect(spark, 1),
        );
        let sol = b.register_system("Sol", DVec2::ZERO);
        let alpha = b.register_system("Alpha", DVec2::new(100.0, 0.0));
        b.link_systems(sol, alpha).unwrap();
        b.register_planet(Planet {
            name: "Earth".to_string(),
            system: sol,
            position: DVec2::new(500.0, 0.0),
            radius: 100.0,
            has_spaceport: true,
            government: None,
        });
        b
    }

    #[test]
    fn register_and_build() {
        let catalog = setup_builder().build().unwrap();
        assert_eq!(catalog.outfit_count(), 2);
        assert_eq!(catalog.effect_count(), 1);
        assert_eq!(catalog.system_count(), 2);
    }

    #[test]
    fn lookup_by_name() {
        let catalog = setup_builder().build().unwrap();
        assert!(catalog.outfit_id("Rocket").is_some());
        assert!(catalog.outfit_id("nonexistent").is_none());
        let earth = catalog.planet(catalog.planet_id("Earth").unwrap()).unwrap();
        assert_eq!(earth.system, catalog.system_id("Sol").unwrap());
    }

    #[test]
    fn links_are_bidirectional() {
        let catalog = setup_builder().build().unwrap();
        let sol = catalog.system_id("Sol").unwrap();
        let alpha = catalog.system_id("Alpha").unwrap();
        assert!(catalog.system(sol).unwrap().links.contains(&alpha));
        assert!(catalog.system(alpha).unwrap().links.contains(&sol));
    }

    #[test]
    fn mutate_outfit() {
        let mut b = setup_builder();
        b.mutate_outfit("Rocket", |o| o.reset(attr::MASS, crate::fixed::Fixed64::from_num(2)))
            .unwrap();
        let catalog = b.build().unwrap();
        let rocket = catalog.outfit(catalog.outfit_id("Rocket").unwrap()).unwrap();
        assert_eq!(rocket.get(attr::MASS), crate::fixed::Fixed64::from_num(2));
    }

    #[test]
    fn mutate_nonexistent_fails() {
        let mut b = setup_builder();
        match b.mutate_outfit("nonexistent", |_| {}) {
            Err(CatalogError::NotFound(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn dangling_ammo_fails() {
        let mut b = CatalogBuilder::new();
        b.register_outfit(Outfit::new("Launcher").with_ammo(OutfitId(999)));
        match b.build() {
            Err(CatalogError::InvalidOutfitRef(id)) => {
                assert_eq!(id, OutfitId(999));
                let msg = CatalogError::InvalidOutfitRef(id).to_string();
                assert!(msg.contains("invalid outfit reference"), "got: {msg}");
            }
            other => panic!("expected InvalidOutfitRef, got: {other:?}"),
        }
    }

    #[test]
    fn dangling_effect_in_model_explosion_fails() {
        let mut b = CatalogBuilder::new();
        b.register_ship_model(ShipModel::new(
            "Shuttle",
            Outfit::new("Shuttle").with_die_effect(EffectId(3), 1),
        ));
        assert!(matches!(b.build(), Err(CatalogError::InvalidEffectRef(EffectId(3)))));
    }

    #[test]
    fn dangling_model_outfit_fails() {
        let mut b = CatalogBuilder::new();
        let mut model = ShipModel::new("Shuttle", Outfit::new("Shuttle"));
        model.outfits.push((OutfitId(7), 1));
        b.register_ship_model(model);
        assert!(matches!(b.build(), Err(CatalogError::InvalidOutfitRef(OutfitId(7)))));
    }

    #[test]
    fn planet_in_unknown_system_fails() {
        let mut b = CatalogBuilder::new();
        b.register_planet(Planet {
            name: "Nowhere".to_string(),
            system: SystemId(4),
            position: DVec2::ZERO,
            radius: 10.0,
            has_spaceport: false,
            government: None,
        });
        assert!(matches!(b.build(), Err(CatalogError::InvalidSystemRef(SystemId(4)))));
    }

    #[test]
    fn link_to_unknown_system_fails() {
        let mut b = setup_builder();
        let sol = b.system_id("Sol").unwrap();
        assert!(b.link_systems(sol, SystemId(42)).is_err());
        assert!(b.link_systems(SystemId(42), sol).is_err());
    }

    #[test]
    fn duplicate_names_fail() {
        let mut b = setup_builder();
        b.register_outfit(Outfit::new("Rocket"));
        match b.build() {
            Err(CatalogError::Duplicate { kind, name }) => {
                assert_eq!(kind, "outfit");
                assert_eq!(name, "Rocket");
            }
            other => panic!("expected Duplicate, got: {other:?}"),
        }
    }

    #[test]
    fn enemies_are_mutual() {
        let mut b = CatalogBuilder::new();
        let pirates = b.register_government("Pirate");
        let navy = b.register_government("Navy");
        let merchants = b.register_government("Merchant");
        b.declare_enemies(pirates, navy).unwrap();
        let catalog = b.build().unwrap();
        assert!(catalog.is_enemy(Some(pirates), Some(navy)));
        assert!(catalog.is_enemy(Some(navy), Some(pirates)));
        assert!(!catalog.is_enemy(Some(merchants), Some(navy)));
        assert!(!catalog.is_enemy(None, Some(navy)));
    }

    #[test]
    fn empty_catalog_builds_successfully() {
        let catalog = CatalogBuilder::new().build().unwrap();
        assert_eq!(catalog.outfit_count(), 0);
        assert_eq!(catalog.ship_model_count(), 0);
        assert_eq!(catalog.config(), &SimConfig::default());
    }
}
