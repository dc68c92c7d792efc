//! Planar kinematics helpers.
//!
//! Positions and velocities are `glam::DVec2` in world units per tick. Facing
//! is an [`Angle`] in degrees, wrapped to `[-180, 180)`, where 0 degrees
//! points along +x and angles grow counter-clockwise.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A heading in degrees, always wrapped to `[-180, 180)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn from_degrees(degrees: f64) -> Self {
        Self(wrap(degrees))
    }

    /// The heading of a vector. A zero vector has heading zero.
    pub fn of(v: DVec2) -> Self {
        if v == DVec2::ZERO {
            return Self::ZERO;
        }
        Self::from_degrees(v.y.atan2(v.x).to_degrees())
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    /// Unit vector pointing along this heading.
    pub fn unit(self) -> DVec2 {
        let r = self.0.to_radians();
        DVec2::new(r.cos(), r.sin())
    }

    /// Rotate by `delta` degrees.
    pub fn rotated(self, delta: f64) -> Self {
        Self::from_degrees(self.0 + delta)
    }

    /// Signed shortest rotation in degrees that takes `self` to `target`.
    pub fn delta_to(self, target: Angle) -> f64 {
        wrap(target.0 - self.0)
    }

    /// Rotate toward `target` by at most `max_step` degrees.
    pub fn turned_toward(self, target: Angle, max_step: f64) -> Self {
        let delta = self.delta_to(target);
        let step = delta.clamp(-max_step.abs(), max_step.abs());
        self.rotated(step)
    }
}

fn wrap(degrees: f64) -> f64 {
    // In-range values pass through untouched so wrapping is idempotent.
    if (-180.0..180.0).contains(&degrees) {
        return degrees;
    }
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can land exactly on 360 for tiny negative inputs.
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}
