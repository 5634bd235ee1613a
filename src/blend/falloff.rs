use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Shoulder blend curve mapping `t ∈ [0, 1]` (0 at the road edge, 1 at the
/// outer end of the shoulder) to the weight of the original terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    Linear,
    #[default]
    Cosine,
    Cubic,
    Quintic,
}

impl Falloff {
    /// Weight of the original terrain at `t` (clamped to `[0, 1]`).
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Cosine => cosine(t),
            Self::Cubic => t * t * (3.0 - 2.0 * t),
            Self::Quintic => quintic(t),
        }
    }
}

/// `0.5 − 0.5·cos(πt)`: zero slope at both ends.
#[inline]
pub fn cosine(t: f64) -> f64 { 0.5 - 0.5 * (PI * t).cos() }

/// `t³(t(6t − 15) + 10)`: zero first and second derivative at both ends.
#[inline]
pub fn quintic(t: f64) -> f64 { t * t * t * (t * (6.0 * t - 15.0) + 10.0) }
