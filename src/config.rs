//! Tunables for every pipeline stage.
//!
//! All sections deserialize with defaults for missing fields, so a partial
//! JSON document such as `{"blend": {"falloff": "quintic"}}` is valid.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::blend::Falloff;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub smoothing: SmoothingConfig,
    pub detection: DetectionConfig,
    pub harmonize: HarmonizeConfig,
    pub blend: BlendConfig,
}

impl Config {
    /// Parse a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Check every value is in range.
    pub fn validate(&self) -> Result<()> {
        let s = &self.sampling;
        ensure!(s.interval.is_finite() && s.interval > 0.0, "sampling.interval must be > 0");
        ensure!(s.bank_gain.is_finite() && s.bank_gain >= 0.0, "sampling.bank_gain must be >= 0");
        ensure!(s.max_bank.is_finite() && s.max_bank >= 0.0, "sampling.max_bank must be >= 0");

        let m = &self.smoothing;
        match m.filter {
            FilterSpec::None => {}
            FilterSpec::MovingAverage { window } => {
                ensure!(window.is_finite() && window >= 0.0, "smoothing.filter.window must be >= 0");
            }
            FilterSpec::ZeroPhase { order, window } => {
                ensure!(order >= 1 && order <= 16, "smoothing.filter.order must be in 1..=16");
                ensure!(window.is_finite() && window > 0.0, "smoothing.filter.window must be > 0");
            }
        }
        if let Some(mean) = &m.mean_blend {
            ensure!((0.0..=1.0).contains(&mean.strength), "smoothing.mean_blend.strength must be in [0, 1]");
        }
        if let Some(grade) = m.max_grade_deg {
            ensure!(grade > 0.0 && grade < 90.0, "smoothing.max_grade_deg must be in (0, 90)");
        }
        ensure!(!m.min_valid_elevation.is_nan(), "smoothing.min_valid_elevation must not be NaN");

        let d = &self.detection;
        ensure!(d.radius.is_finite() && d.radius > 0.0, "detection.radius must be > 0");
        ensure!(d.hint_match_factor.is_finite() && d.hint_match_factor >= 1.0, "detection.hint_match_factor must be >= 1");

        let h = &self.harmonize;
        ensure!(h.propagation_distance.is_finite() && h.propagation_distance >= 0.0, "harmonize.propagation_distance must be >= 0");
        ensure!(h.dead_end_taper.is_finite() && h.dead_end_taper >= 0.0, "harmonize.dead_end_taper must be >= 0");
        ensure!((0.0..=1.0).contains(&h.endpoint_terrain_strength), "harmonize.endpoint_terrain_strength must be in [0, 1]");
        ensure!(h.idw_epsilon.is_finite() && h.idw_epsilon > 0.0, "harmonize.idw_epsilon must be > 0");

        let b = &self.blend;
        ensure!(b.blend_range.is_finite() && b.blend_range >= 0.0, "blend.blend_range must be >= 0");
        ensure!(b.protect_buffer.is_finite() && b.protect_buffer >= 0.0, "blend.protect_buffer must be >= 0");
        Ok(())
    }
}

/// Cross-section sampling along input centerlines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Arc-length spacing of cross-sections, in metres.
    pub interval: f64,
    /// Cross slope per unit curvature (1/m); 0 disables banking.
    pub bank_gain: f64,
    /// Maximum absolute cross slope.
    pub max_bank: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { interval: 2.0, bank_gain: 0.0, max_bank: 0.06 }
    }
}

/// Longitudinal filter applied to each path's elevation profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterSpec {
    None,
    /// Centred window of `window` metres.
    MovingAverage { window: f64 },
    /// Butterworth low-pass of `order`, cutoff at one cycle per `window` metres.
    ZeroPhase { order: usize, window: f64 },
}

/// Which mean a profile is pulled toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeanScope {
    Path,
    Network,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeanBlend {
    pub scope: MeanScope,
    pub strength: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub filter: FilterSpec,
    pub mean_blend: Option<MeanBlend>,
    /// Steepest allowed grade, in degrees.
    pub max_grade_deg: Option<f64>,
    /// Samples below this are treated as no-data.
    pub min_valid_elevation: f64,
    /// Cap on forward/backward grade clamping sweeps.
    pub grade_iterations: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            filter: FilterSpec::ZeroPhase { order: 4, window: 40.0 },
            mean_blend: None,
            max_grade_deg: None,
            min_valid_elevation: -1000.0,
            grade_iterations: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Endpoints and cross-sections closer than this meet, in metres.
    pub radius: f64,
    /// Inflation of `radius` when matching hints to junctions, absorbing
    /// drift between a hint and the geometric centroid.
    pub hint_match_factor: f64,
    /// Look for centerlines crossing away from any endpoint.
    pub detect_crossings: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { radius: 10.0, hint_match_factor: 1.5, detect_crossings: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonizeConfig {
    /// Arc length over which a junction value fades into a road, in metres.
    pub propagation_distance: f64,
    /// Arc length of the dead-end taper, in metres.
    pub dead_end_taper: f64,
    /// How far an isolated endpoint is pulled toward the terrain (0..=1).
    pub endpoint_terrain_strength: f64,
    /// Distance offset in inverse-distance weights.
    pub idw_epsilon: f64,
    /// Fit terminating roads to the through road's banked, graded surface.
    pub surface_constraint: bool,
}

impl Default for HarmonizeConfig {
    fn default() -> Self {
        Self {
            propagation_distance: 30.0,
            dead_end_taper: 20.0,
            endpoint_terrain_strength: 0.5,
            idw_epsilon: 1e-3,
            surface_constraint: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// Width of the shoulder beyond the road edge, in metres.
    pub blend_range: f64,
    pub falloff: Falloff,
    /// Extra radius around excluded surfaces that stays untouched, in metres.
    pub protect_buffer: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self { blend_range: 8.0, falloff: Falloff::Cosine, protect_buffer: 1.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json_str(r#"{
            "detection": { "radius": 12.5 },
            "smoothing": { "filter": { "type": "moving_average", "window": 20.0 } },
            "blend": { "falloff": "quintic" }
        }"#).unwrap();
        assert_eq!(config.detection.radius, 12.5);
        assert_eq!(config.detection.hint_match_factor, 1.5);
        assert_eq!(config.smoothing.filter, FilterSpec::MovingAverage { window: 20.0 });
        assert_eq!(config.blend.falloff, Falloff::Quintic);
        assert_eq!(config.harmonize, HarmonizeConfig::default());
    }

    #[test]
    fn round_trips_through_json() {
        let mut config = Config::default();
        config.smoothing.mean_blend = Some(MeanBlend { scope: MeanScope::Network, strength: 0.25 });
        config.smoothing.max_grade_deg = Some(6.0);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(Config::from_json_str(r#"{"detection": {"radius": 0.0}}"#).is_err());
        assert!(Config::from_json_str(r#"{"detection": {"hint_match_factor": 0.5}}"#).is_err());
        assert!(Config::from_json_str(r#"{"harmonize": {"endpoint_terrain_strength": 1.5}}"#).is_err());
        assert!(Config::from_json_str(r#"{"smoothing": {"max_grade_deg": 95.0}}"#).is_err());
        assert!(Config::from_json_str(r#"{"blend": {"falloff": "sigmoid"}}"#).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/nonexistent/roadbed.json").unwrap_err();
        assert!(err.to_string().contains("reading configuration"));
    }
}
