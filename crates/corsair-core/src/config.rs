//! Tunable simulation constants.
//!
//! A [`SimConfig`] travels with the [`Catalog`](crate::catalog::Catalog) so
//! every ship built from the same game data runs under the same rules. Any
//! field missing from a data file falls back to its default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Ticks for the zoom factor to go from 1 to 0 (and back on take-off).
    pub landing_ticks: u32,
    /// Maximum speed at which a ship may begin landing.
    pub landing_speed: f64,
    /// Fraction of the remaining distance to the planet covered each
    /// landing tick.
    pub landing_pull: f64,

    /// Length of the hyperspace countdown.
    pub hyperspace_ticks: u32,
    /// Velocity gained along the facing per hyperspace tick.
    pub hyperspace_acceleration: f64,
    /// Distance from the destination system center at which ships arrive.
    pub arrival_distance: f64,
    /// Maximum angle between facing and destination for a jump to begin.
    pub jump_alignment_degrees: f64,
    /// Fuel per jump when the ship's drive does not specify `jump fuel`.
    pub default_jump_fuel: f64,

    /// Total length of the destruction sequence.
    pub explosion_ticks: u32,
    /// Ticks between explosion bursts within the sequence.
    pub explosion_interval: u32,

    /// Ticks a non-special ship may spend outside tracked regions before it
    /// is removed.
    pub forget_ticks: u32,

    /// Below this fraction of max hull a ship is disabled.
    pub disabled_hull_fraction: f64,
    /// At or below this fraction of max shields a hull-disabled ship is
    /// fully disabled.
    pub disabled_shield_fraction: f64,
    /// Heat a ship can hold per ton of mass before overheating.
    pub heat_per_mass: f64,
    /// An overheated ship recovers once heat drops below this fraction of
    /// its maximum.
    pub overheat_recovery: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            landing_ticks: 50,
            landing_speed: 1.0,
            landing_pull: 0.03,
            hyperspace_ticks: 100,
            hyperspace_acceleration: 2.0,
            arrival_distance: 1000.0,
            jump_alignment_degrees: 5.0,
            default_jump_fuel: 100.0,
            explosion_ticks: 60,
            explosion_interval: 5,
            forget_ticks: 1000,
            disabled_hull_fraction: 0.5,
            disabled_shield_fraction: 0.0,
            heat_per_mass: 100.0,
            overheat_recovery: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{ "landing_ticks": 10 }"#).unwrap();
        assert_eq!(config.landing_ticks, 10);
        assert_eq!(config.hyperspace_ticks, SimConfig::default().hyperspace_ticks);
        assert_eq!(config.forget_ticks, 1000);
    }

    #[test]
    fn empty_object_is_default() {
        let config: SimConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SimConfig::default());
    }
}
