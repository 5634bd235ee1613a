//! Elevation smoother: raw terrain samples under every cross-section become
//! a low-pass filtered, optionally grade-limited target profile per path.

mod filter;
mod grade;

pub use filter::{butterworth, moving_average, zero_phase, Biquad};
pub use grade::clamp_grade;

use heightfield::Heightfield;
use ndarray::parallel::prelude::*;
use tracing::{debug, warn};

use crate::config::{FilterSpec, MeanScope, SmoothingConfig};
use crate::geom;
use crate::network::{RoadNetwork, RoadPath, Sampled, Smoothed};

/// Working profile of one path.
struct Profile {
    raw: Vec<f64>,
    smoothed: Vec<f64>,
    spacing: Vec<f64>,
    valid: bool,
}

/// Sample, filter, mean-blend and grade-clamp every path.
///
/// Paths without a single valid sample keep NaN elevations.
pub fn run(network: RoadNetwork<Sampled>, terrain: &Heightfield, config: &SmoothingConfig) -> RoadNetwork<Smoothed> {
    let mut profiles = network.paths().par_iter()
        .map(|path| profile(&network, path, terrain, config))
        .collect::<Vec<_>>();

    let network_mean = mean(profiles.iter().filter(|p| p.valid).flat_map(|p| p.smoothed.iter().copied()));
    profiles.par_iter_mut().filter(|p| p.valid).for_each(|p| finish(p, network_mean, config));

    let n = network.sections().len();
    let (mut raw, mut smoothed) = (vec![f64::NAN; n], vec![f64::NAN; n]);
    for (path, profile) in network.paths().iter().zip(&profiles) {
        for (k, id) in path.sections().iter().enumerate() {
            raw[id.index()] = profile.raw[k];
            smoothed[id.index()] = profile.smoothed[k];
        }
    }

    let skipped = profiles.iter().filter(|p| !p.valid).count();
    debug!(paths = profiles.len(), skipped, "smoothed elevation profiles");
    network.into_smoothed(raw, smoothed)
}

fn profile(network: &RoadNetwork<Sampled>, path: &RoadPath, terrain: &Heightfield, config: &SmoothingConfig) -> Profile {
    let positions = network.path_sections(path.id()).map(|(_, s)| s.position()).collect::<Vec<_>>();
    let spacing = positions.windows(2).map(|w| geom::distance(w[0], w[1])).collect::<Vec<_>>();
    let raw = positions.iter()
        .map(|&p| terrain.sample(p).unwrap_or(f64::NAN))
        .collect::<Vec<_>>();

    let is_valid = |v: f64| v.is_finite() && v >= config.min_valid_elevation;
    let Some(filled) = fill_invalid(&raw, is_valid) else {
        warn!(path = %path.id(), sections = raw.len(), "no valid terrain sample; leaving path unsmoothed");
        return Profile { smoothed: vec![f64::NAN; raw.len()], raw, spacing, valid: false }
    };

    let step = if positions.len() > 1 { path.length() / (positions.len() - 1) as f64 } else { 0.0 };
    let smoothed = match config.filter {
        FilterSpec::None => filled,
        _ if step <= 0.0 => filled,
        FilterSpec::MovingAverage { window } => {
            moving_average(&filled, (0.5 * window / step).round() as usize)
        }
        FilterSpec::ZeroPhase { order, window } => zero_phase(&filled, order, step / window),
    };

    Profile { raw, smoothed, spacing, valid: true }
}

fn finish(profile: &mut Profile, network_mean: f64, config: &SmoothingConfig) {
    if let Some(blend) = config.mean_blend {
        let target = match blend.scope {
            MeanScope::Path => mean(profile.smoothed.iter().copied()),
            MeanScope::Network => network_mean,
        };
        for v in &mut profile.smoothed { *v += (target - *v) * blend.strength }
    }
    if let Some(degrees) = config.max_grade_deg {
        clamp_grade(&mut profile.smoothed, &profile.spacing, degrees.to_radians().tan(), config.grade_iterations);
    }
}

/// Replace every rejected sample by the nearest accepted one along the path
/// (the earlier one on ties). `None` if nothing is accepted.
fn fill_invalid(values: &[f64], accept: impl Fn(f64) -> bool) -> Option<Vec<f64>> {
    let n = values.len();
    let mut previous = vec![None; n];
    let mut last = None;
    for i in 0..n {
        if accept(values[i]) { last = Some(i) }
        previous[i] = last;
    }
    last?;

    let mut out = values.to_vec();
    let mut next = None;
    for i in (0..n).rev() {
        if accept(values[i]) { next = Some(i); continue }
        let source = match (previous[i], next) {
            (Some(p), Some(q)) => if i - p <= q - i { p } else { q },
            (Some(p), None) => p,
            (None, Some(q)) => q,
            (None, None) => i,
        };
        out[i] = values[source];
    }
    Some(out)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}
