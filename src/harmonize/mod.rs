//! Junction elevation harmonizer: one agreed elevation per junction, faded
//! into every terminating road by arc length.

mod propagate;
mod reconcile;

use heightfield::Heightfield;
use tracing::{debug, info};

use crate::config::HarmonizeConfig;
use crate::network::{Detected, Harmonized, RoadNetwork};

use propagate::{walk, Claim};
use reconcile::{reconcile, Resolution, Taper};

/// Reconcile every junction and propagate the results.
///
/// Continuous contributions are pinned and keep their smoothed elevation.
/// A cross-section within reach of several junctions takes the nearest one
/// by arc length.
pub fn run(network: RoadNetwork<Detected>, terrain: &Heightfield, config: &HarmonizeConfig) -> RoadNetwork<Harmonized> {
    let n = network.sections().len();
    let mut pinned = vec![false; n];
    for junction in network.junctions() {
        for c in junction.contributions().iter().filter(|c| c.continuous) {
            pinned[c.section.index()] = true;
        }
    }

    let resolutions = network.junctions().iter()
        .map(|junction| reconcile(&network, junction, terrain, config))
        .collect::<Vec<Resolution>>();

    let mut claims: Vec<Option<Claim>> = vec![None; n];
    for (j, resolution) in resolutions.iter().enumerate() {
        for target in &resolution.targets {
            if pinned[target.section.index()] { continue }
            let reach = match target.taper {
                Taper::Junction => config.propagation_distance,
                Taper::DeadEnd => config.dead_end_taper,
            };
            walk(&network, j, target, reach, &pinned, |id, claim| {
                let slot = &mut claims[id.index()];
                if slot.is_none_or(|current| claim.beats(&current)) { *slot = Some(claim) }
            });
        }
    }

    // Edge overrides belong to the junction that owns the cross-section.
    let mut edges = vec![None; n];
    for (j, resolution) in resolutions.iter().enumerate() {
        for target in &resolution.targets {
            let owned = claims[target.section.index()].is_some_and(|c| c.junction == j && c.distance == 0.0);
            if owned { edges[target.section.index()] = target.edges }
        }
    }

    let overrides = claims.iter().map(|c| c.map(|c| c.value)).collect::<Vec<_>>();
    let elevations = resolutions.iter().map(|r| r.elevation).collect::<Vec<_>>();

    debug!(
        unmodified = elevations.iter().filter(|e| e.is_nan()).count(),
        pinned = pinned.iter().filter(|&&p| p).count(),
        "reconciled junctions"
    );
    info!(
        junctions = elevations.len(),
        overridden = overrides.iter().filter(|o| o.is_some()).count(),
        "harmonized junction elevations"
    );
    network.into_harmonized(overrides, edges, elevations)
}

#[cfg(test)]
mod tests {
    use geo::Coord;

    use super::*;
    use crate::config::DetectionConfig;
    use crate::junction::detect;
    use crate::network::{CrossSection, JunctionKind, PathId, Sampled, SectionId};
    use crate::testing::{network, smoothed};

    fn terrain() -> Heightfield {
        Heightfield::filled(120, 120, 80.0, 1.0).unwrap()
    }

    fn harmonize(sampled: RoadNetwork<Sampled>, f: impl Fn(Coord<f64>) -> f64, config: &HarmonizeConfig) -> RoadNetwork<Harmonized> {
        let detected = detect(smoothed(sampled, f), &[], &DetectionConfig::default());
        run(detected, &terrain(), config)
    }

    fn at(network: &RoadNetwork<Harmonized>, path: u32, x: f64, y: f64) -> &CrossSection {
        network.path_sections(PathId(path))
            .map(|(_, s)| s)
            .find(|s| (s.position().x - x).abs() < 1e-9 && (s.position().y - y).abs() < 1e-9)
            .unwrap()
    }

    fn t_junction() -> RoadNetwork<Harmonized> {
        let sampled = network(&[(5, &[(0.0, 0.0), (100.0, 0.0)]), (1, &[(50.0, 3.0), (50.0, 63.0)])], 5.0, 3.0);
        harmonize(sampled, |p| if p.y == 0.0 { 100.0 + 0.05 * p.x } else { 90.0 }, &HarmonizeConfig::default())
    }

    #[test]
    fn through_road_wins_unchanged() {
        let network = t_junction();
        let t = network.junctions().iter().find(|j| j.kind() == JunctionKind::TJunction).unwrap();
        let through = t.contributions().iter().find(|c| c.continuous).unwrap().section;
        let through = network.section(through);

        assert_eq!(t.elevation(), through.smoothed());
        assert_eq!(through.harmonized(), None);
        assert_eq!(through.elevation(), through.smoothed());
        // Away from the dead ends the through road is untouched.
        for x in [25.0, 45.0, 55.0, 75.0] {
            assert_eq!(at(&network, 0, x, 0.0).harmonized(), None);
        }
    }

    #[test]
    fn terminating_road_meets_through_surface() {
        let network = t_junction();
        let through = at(&network, 0, 50.0, 0.0).smoothed();
        let end = at(&network, 1, 50.0, 3.0);
        // Straight into the through road: no longitudinal offset, no bank.
        assert_eq!(end.harmonized(), Some(through));

        let edges = end.edges().unwrap();
        assert!((edges.left - (through - 0.05 * 3.0)).abs() < 1e-9);
        assert!((edges.right - (through + 0.05 * 3.0)).abs() < 1e-9);

        let near = at(&network, 1, 50.0, 8.0).harmonized().unwrap();
        assert!(near < through && near > 90.0);
        assert!((at(&network, 1, 50.0, 33.0).harmonized().unwrap() - 90.0).abs() < 1e-9);
        assert_eq!(at(&network, 1, 50.0, 38.0).harmonized(), None);
    }

    #[test]
    fn bank_tilts_terminating_target() {
        let mut sampled = RoadNetwork::new();
        let mut through = crate::testing::road(&[(0.0, 0.0), (100.0, 0.0)], 5.0, 4.0);
        for s in &mut through { s.bank = 0.02 }
        sampled.add_path(5, &through).unwrap();
        sampled.add_path(1, &crate::testing::road(&[(50.0, 2.0), (50.0, 62.0)], 5.0, 3.0)).unwrap();

        let network = harmonize(sampled, |p| if p.y == 0.0 { 100.0 } else { 95.0 }, &HarmonizeConfig::default());
        let end = at(&network, 1, 50.0, 2.0);
        assert!((end.harmonized().unwrap() - 100.04).abs() < 1e-9);

        let config = HarmonizeConfig { surface_constraint: false, ..HarmonizeConfig::default() };
        let sampled = network_without_bank();
        let flat = harmonize(sampled, |p| if p.y == 0.0 { 100.0 } else { 95.0 }, &config);
        let end = at(&flat, 1, 50.0, 2.0);
        assert_eq!(end.harmonized(), Some(100.0));
        assert_eq!(end.edges(), None);
    }

    fn network_without_bank() -> RoadNetwork<Sampled> {
        network(&[(5, &[(0.0, 0.0), (100.0, 0.0)]), (1, &[(50.0, 2.0), (50.0, 62.0)])], 5.0, 3.0)
    }

    #[test]
    fn meeting_ends_are_averaged_by_inverse_distance() {
        let sampled = network(&[(0, &[(0.0, 0.0), (50.0, 0.0)]), (0, &[(53.0, 0.0), (100.0, 0.0)])], 5.0, 3.0);
        let network = harmonize(sampled, |p| if p.x <= 50.0 { 10.0 } else { 20.0 }, &HarmonizeConfig::default());

        let two = network.junctions().iter().find(|j| j.kind() == JunctionKind::TwoRoad).unwrap();
        assert!((two.elevation() - 15.0).abs() < 1e-9);
        for c in two.contributions() {
            assert_eq!(network.section(c.section).harmonized(), Some(two.elevation()));
        }
        let inner = at(&network, 0, 45.0, 0.0).harmonized().unwrap();
        assert!(inner > 10.0 && inner < 15.0);
    }

    #[test]
    fn lone_end_tapers_toward_terrain() {
        let sampled = network(&[(0, &[(0.0, 0.0), (100.0, 0.0)])], 5.0, 3.0);
        let network = harmonize(sampled, |_| 100.0, &HarmonizeConfig::default());

        assert!(network.junctions().iter().all(|j| j.kind() == JunctionKind::Endpoint));
        let start = at(&network, 0, 0.0, 0.0);
        // Halfway from 100 toward the 80 m terrain.
        assert_eq!(start.harmonized(), Some(90.0));
        assert_eq!(start.edges(), None);
        assert!((at(&network, 0, 20.0, 0.0).harmonized().unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(at(&network, 0, 25.0, 0.0).harmonized(), None);
        assert_eq!(at(&network, 0, 50.0, 0.0).harmonized(), None);
    }

    #[test]
    fn nearest_junction_wins_with_ties_to_lower_index() {
        let sampled = network(&[(0, &[(0.0, 0.0), (40.0, 0.0)])], 5.0, 3.0);
        let config = HarmonizeConfig { dead_end_taper: 30.0, endpoint_terrain_strength: 1.0, ..HarmonizeConfig::default() };
        let network = harmonize(sampled, |p| 100.0 + p.x, &config);

        // Both ends pull fully to the 80 m terrain.
        let expected = |original: f64, d: f64| propagate::propagated(80.0, original, d / 30.0, Taper::DeadEnd);
        assert!((at(&network, 0, 10.0, 0.0).harmonized().unwrap() - expected(110.0, 10.0)).abs() < 1e-9);
        assert!((at(&network, 0, 30.0, 0.0).harmonized().unwrap() - expected(130.0, 10.0)).abs() < 1e-9);
        // Equidistant: the start junction comes first.
        assert_eq!(network.junctions()[0].contributions()[0].section, SectionId(0));
        assert!((at(&network, 0, 20.0, 0.0).harmonized().unwrap() - expected(120.0, 20.0)).abs() < 1e-9);
    }

    #[test]
    fn excluded_junction_is_left_alone() {
        let mut sampled = network(&[(5, &[(0.0, 0.0), (100.0, 0.0)]), (1, &[(50.0, 3.0), (50.0, 63.0)])], 5.0, 3.0);
        sampled.mark_excluded(|s| s.path() == PathId(0) && (s.position().x - 50.0).abs() < 1e-9);
        let network = harmonize(sampled, |_| 100.0, &HarmonizeConfig::default());

        let t = network.junctions().iter().find(|j| j.kind() == JunctionKind::TJunction).unwrap();
        assert!(t.excluded());
        assert!(t.elevation().is_nan());
        assert_eq!(at(&network, 1, 50.0, 3.0).harmonized(), None);
    }
}
