use serde::{Deserialize, Serialize};

/// Identifies an outfit (equipment, weapon, or ammunition) in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutfitId(pub u32);

/// Identifies a visual effect template in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u32);

/// Identifies a star system (a region of space ships jump between).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SystemId(pub u32);

/// Identifies a planet or station a ship can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanetId(pub u32);

/// Identifies a government (faction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GovernmentId(pub u32);

/// Identifies a ship model (chassis template).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShipModelId(pub u32);

/// An opaque sprite or animation reference. The core stores and hands these
/// to the renderer without interpreting them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpriteHandle(pub String);

impl SpriteHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outfit_id_equality() {
        assert_eq!(OutfitId(0), OutfitId(0));
        assert_ne!(OutfitId(0), OutfitId(1));
    }

    #[test]
    fn ids_order_by_index() {
        let mut ids = vec![OutfitId(3), OutfitId(1), OutfitId(2)];
        ids.sort();
        assert_eq!(ids, vec![OutfitId(1), OutfitId(2), OutfitId(3)]);
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(SystemId(0), "Sol");
        map.insert(SystemId(1), "Alpha Centauri");
        assert_eq!(map[&SystemId(0)], "Sol");
    }

    #[test]
    fn sprite_handle_is_opaque_name() {
        let sprite = SpriteHandle::new("ship/kestrel");
        assert_eq!(sprite.name(), "ship/kestrel");
    }
}
