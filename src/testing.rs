//! Shared fixtures for unit tests.

use geo::Coord;

use crate::network::{Detected, RoadNetwork, Sampled, SectionSpec, Smoothed};

/// Cross-sections every `step` metres along the polyline through `points`.
pub(crate) fn road(points: &[(f64, f64)], step: f64, half_width: f64) -> Vec<SectionSpec> {
    let mut out = vec![SectionSpec::new(Coord { x: points[0].0, y: points[0].1 }, half_width)];
    for w in points.windows(2) {
        let (a, b) = (Coord { x: w[0].0, y: w[0].1 }, Coord { x: w[1].0, y: w[1].1 });
        let n = (crate::geom::distance(a, b) / step).round().max(1.0) as usize;
        for k in 1..=n {
            out.push(SectionSpec::new(a + (b - a) * (k as f64 / n as f64), half_width));
        }
    }
    out
}

/// Network of `(priority, polyline)` roads sampled every `step` metres.
pub(crate) fn network(roads: &[(i32, &[(f64, f64)])], step: f64, half_width: f64) -> RoadNetwork<Sampled> {
    let mut network = RoadNetwork::new();
    for &(priority, points) in roads {
        network.add_path(priority, &road(points, step, half_width)).unwrap();
    }
    network
}

/// Skip the smoother: every cross-section gets elevation `f(position)`.
pub(crate) fn smoothed(network: RoadNetwork<Sampled>, f: impl Fn(Coord<f64>) -> f64) -> RoadNetwork<Smoothed> {
    let values = network.sections().iter().map(|s| f(s.position())).collect::<Vec<_>>();
    network.into_smoothed(values.clone(), values)
}

/// Skip detection: an empty junction list.
pub(crate) fn detected(network: RoadNetwork<Smoothed>) -> RoadNetwork<Detected> {
    network.into_detected(Vec::new())
}
