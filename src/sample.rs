//! Cross-section sampling of input centerlines.

use geo::Coord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SamplingConfig;
use crate::error::HarmonizeError;
use crate::geom;
use crate::network::{RoadNetwork, Sampled, SectionSpec};

/// One road as delivered by the centerline extractor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoadSpec {
    /// Ordered centerline points, in source units.
    pub points: Vec<Coord<f64>>,
    /// Multiplier taking source units to metres.
    #[serde(default = "unit_scale")]
    pub scale: f64,
    #[serde(default)]
    pub priority: i32,
    /// Full road width in metres.
    pub width: f64,
    /// Per-point excluded-surface flags (bridges, tunnels); empty for none.
    #[serde(default)]
    pub excluded: Vec<bool>,
}

fn unit_scale() -> f64 { 1.0 }

impl RoadSpec {
    pub fn new(points: Vec<Coord<f64>>, width: f64) -> Self {
        Self { points, scale: 1.0, priority: 0, width, excluded: Vec::new() }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_excluded(mut self, excluded: Vec<bool>) -> Self {
        self.excluded = excluded;
        self
    }
}

impl RoadNetwork<Sampled> {
    /// Sample every road into cross-sections. Roads with fewer than two
    /// distinct points are skipped with a warning.
    pub fn from_roads(roads: &[RoadSpec], config: &SamplingConfig) -> Result<Self, HarmonizeError> {
        let mut network = Self::new();
        for (road, spec) in roads.iter().enumerate() {
            if !spec.scale.is_finite() || spec.scale <= 0.0 {
                return Err(HarmonizeError::InvalidScale { road, scale: spec.scale })
            }
            if !spec.width.is_finite() || spec.width <= 0.0 {
                return Err(HarmonizeError::InvalidWidth { road, width: spec.width })
            }
            if spec.points.iter().any(|p| !geom::is_finite(*p)) {
                return Err(HarmonizeError::NonFiniteGeometry { road })
            }

            let sections = sample_road(spec, config);
            if sections.len() < 2 {
                warn!(road, points = spec.points.len(), "skipping degenerate road");
                continue;
            }
            network.add_path(spec.priority, &sections)?;
        }
        debug!(paths = network.paths().len(), sections = network.sections().len(), "sampled network");
        Ok(network)
    }
}

/// Resample one road at `config.interval` metres of arc length.
///
/// The first and last points are always kept; stations are spread evenly so
/// the actual spacing never exceeds the interval.
pub fn sample_road(spec: &RoadSpec, config: &SamplingConfig) -> Vec<SectionSpec> {
    // Scaled points without consecutive duplicates, with their input index.
    let mut points: Vec<(Coord<f64>, usize)> = Vec::with_capacity(spec.points.len());
    for (i, &p) in spec.points.iter().enumerate() {
        let p = p * spec.scale;
        if points.last().is_none_or(|&(q, _)| geom::distance(p, q) > 1e-9) { points.push((p, i)) }
    }
    if points.len() < 2 { return Vec::new() }

    let mut stations = vec![0.0];
    for w in points.windows(2) {
        stations.push(stations[stations.len() - 1] + geom::distance(w[0].0, w[1].0));
    }
    let total = stations[stations.len() - 1];
    let steps = ((total / config.interval).ceil() as usize).max(1);
    let step = total / steps as f64;

    let excluded_at = |i: usize| spec.excluded.get(points[i].1).copied().unwrap_or(false);
    let vertex_banks = banking(&points.iter().map(|&(p, _)| p).collect::<Vec<_>>(), config);

    let mut positions = Vec::with_capacity(steps + 1);
    let mut banks = Vec::with_capacity(steps + 1);
    let mut excluded = Vec::with_capacity(steps + 1);
    let mut seg = 0usize;
    for k in 0..=steps {
        let s = if k == steps { total } else { k as f64 * step };
        while seg + 2 < points.len() && stations[seg + 1] < s { seg += 1 }

        let (a, b) = (points[seg].0, points[seg + 1].0);
        let len = stations[seg + 1] - stations[seg];
        let t = ((s - stations[seg]) / len).clamp(0.0, 1.0);
        positions.push(a + (b - a) * t);
        banks.push(vertex_banks[seg] + (vertex_banks[seg + 1] - vertex_banks[seg]) * t);

        excluded.push(if t == 0.0 {
            excluded_at(seg)
        } else if t == 1.0 {
            excluded_at(seg + 1)
        } else {
            excluded_at(seg) && excluded_at(seg + 1)
        });
    }

    let tangents = geom::tangents(&positions);
    let half_width = 0.5 * spec.width;

    positions.into_iter().zip(tangents).zip(banks).zip(excluded)
        .map(|(((position, tangent), bank), excluded)| SectionSpec {
            position,
            half_width,
            bank,
            excluded,
            tangent: Some(tangent),
        })
        .collect()
}

/// Superelevation at polyline vertices from signed curvature: the outside
/// of every bend is raised, up to `max_bank`.
fn banking(positions: &[Coord<f64>], config: &SamplingConfig) -> Vec<f64> {
    let n = positions.len();
    let mut banks = vec![0.0; n];
    if config.bank_gain == 0.0 || n < 3 { return banks }

    for i in 1..n - 1 {
        let (a, b) = (positions[i] - positions[i - 1], positions[i + 1] - positions[i]);
        let ds = 0.5 * (geom::norm(a) + geom::norm(b));
        if ds <= 0.0 { continue }
        let turn = geom::cross(a, b).atan2(geom::dot(a, b));
        // Left turns (positive curvature) raise the right edge.
        banks[i] = (-turn / ds * config.bank_gain).clamp(-config.max_bank, config.max_bank);
    }
    banks[0] = banks[1];
    banks[n - 1] = banks[n - 2];
    banks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(interval: f64) -> SamplingConfig {
        SamplingConfig { interval, ..SamplingConfig::default() }
    }

    #[test]
    fn resamples_at_even_spacing() {
        let spec = RoadSpec::new(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 }, Coord { x: 10.0, y: 9.0 }], 6.0);
        let sections = sample_road(&spec, &config(2.0));
        // 19 m of centerline at <= 2 m spacing: 10 steps of 1.9 m.
        assert_eq!(sections.len(), 11);
        assert_eq!(sections[0].position, Coord { x: 0.0, y: 0.0 });
        assert_eq!(sections[10].position, Coord { x: 10.0, y: 9.0 });
        for w in sections.windows(2) {
            let d = geom::distance(w[0].position, w[1].position);
            assert!(d <= 1.9 + 1e-9);
        }
        assert!(sections.iter().all(|s| s.half_width == 3.0));
    }

    #[test]
    fn applies_scale_and_drops_duplicates() {
        let spec = RoadSpec::new(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 }], 8.0)
            .with_scale(10.0);
        let sections = sample_road(&spec, &config(5.0));
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[2].position, Coord { x: 10.0, y: 0.0 });
        assert_eq!(sections[1].tangent, Some(Coord { x: 1.0, y: 0.0 }));
    }

    #[test]
    fn maps_excluded_flags_by_arc_length() {
        let spec = RoadSpec::new(
            vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 0.0 }, Coord { x: 20.0, y: 0.0 }, Coord { x: 30.0, y: 0.0 }],
            4.0,
        ).with_excluded(vec![false, true, true, false]);
        let sections = sample_road(&spec, &config(5.0));
        let flags = sections.iter().map(|s| s.excluded).collect::<Vec<_>>();
        assert_eq!(flags, vec![false, false, true, true, true, false, false]);
    }

    #[test]
    fn banking_raises_outside_of_bend() {
        // Quarter circle turning left.
        let points = (0..=20).map(|i| {
            let a = i as f64 / 20.0 * std::f64::consts::FRAC_PI_2;
            Coord { x: 50.0 * a.sin(), y: 50.0 - 50.0 * a.cos() }
        }).collect();
        let spec = RoadSpec::new(points, 7.0);
        let cfg = SamplingConfig { interval: 2.0, bank_gain: 2.0, max_bank: 0.03 };
        let sections = sample_road(&spec, &cfg);
        let mid = &sections[sections.len() / 2];
        // Curvature 1/50 * gain 2 = 0.04, clamped to 0.03, right edge up.
        assert!((mid.bank + 0.03).abs() < 1e-9);

        let flat = sample_road(&RoadSpec::new(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 9.0, y: 0.0 }], 7.0), &cfg);
        assert!(flat.iter().all(|s| s.bank == 0.0));
    }

    #[test]
    fn from_roads_validates_and_skips() {
        let good = RoadSpec::new(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 8.0, y: 0.0 }], 6.0).with_priority(4);
        let single = RoadSpec::new(vec![Coord { x: 3.0, y: 3.0 }], 6.0);
        let network = RoadNetwork::from_roads(&[good.clone(), single], &config(2.0)).unwrap();
        assert_eq!(network.paths().len(), 1);
        assert_eq!(network.paths()[0].priority(), 4);
        assert_eq!(network.paths()[0].length(), 8.0);

        let bad = RoadSpec::new(good.points.clone(), -1.0);
        assert_eq!(
            RoadNetwork::from_roads(&[good.clone(), bad], &config(2.0)).unwrap_err(),
            HarmonizeError::InvalidWidth { road: 1, width: -1.0 },
        );
        let bad = good.clone().with_scale(0.0);
        assert!(matches!(RoadNetwork::from_roads(&[bad], &config(2.0)), Err(HarmonizeError::InvalidScale { .. })));
    }
}
