use serde::{Deserialize, Serialize};

use crate::id::{PlanetId, SystemId};

/// What a ship is doing beyond ordinary flight. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum SpecialState {
    #[default]
    Flying,
    Landing(LandingState),
    Hyperspacing(JumpState),
    Exploding(ExplosionState),
}

impl SpecialState {
    pub fn name(&self) -> &'static str {
        match self {
            SpecialState::Flying => "flying",
            SpecialState::Landing(_) => "landing",
            SpecialState::Hyperspacing(_) => "hyperspacing",
            SpecialState::Exploding(_) => "exploding",
        }
    }

    pub(crate) fn discriminant(&self) -> u32 {
        match self {
            SpecialState::Flying => 0,
            SpecialState::Landing(_) => 1,
            SpecialState::Hyperspacing(_) => 2,
            SpecialState::Exploding(_) => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LandingPhase {
    /// Shrinking toward the planet.
    Descending,
    /// On the ground. Special ships refuel here before leaving.
    Docked,
    /// Growing back to full size.
    TakingOff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandingState {
    pub planet: PlanetId,
    /// Render scale: 1 in flight, 0 on the ground.
    pub zoom: f64,
    pub phase: LandingPhase,
    /// Ticks spent in the current phase.
    pub progress: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpState {
    pub destination: SystemId,
    /// Ticks left before arrival.
    pub countdown: u32,
    pub total: u32,
}

impl JumpState {
    /// Visual warp, ramping from 0 at departure to 1 on arrival.
    pub fn distortion(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        1.0 - self.countdown as f64 / self.total as f64
    }
}

/// Destruction sequence. Bursts happen every `interval` ticks; the last
/// tick releases the full explosion table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionState {
    pub elapsed: u32,
    pub total: u32,
    pub interval: u32,
}

impl ExplosionState {
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.elapsed as f64 / self.total as f64).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.total
    }

    /// Whether the current tick is an intermediate burst.
    pub fn is_burst(&self) -> bool {
        self.interval > 0 && self.elapsed % self.interval == 0 && !self.is_finished()
    }
}
