use geo::{Coord, Rect};

use crate::geom::{self, SpatialIndex};
use crate::network::{CrossSection, Harmonized, RoadNetwork};

use super::mask::on_surface;

/// Where a point falls relative to the nearest road surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Projection {
    /// Distance from the centerline.
    pub distance: f64,
    /// Half-width interpolated at the foot point.
    pub half_width: f64,
    /// Road surface elevation at the point's lateral offset, clamped to the
    /// road edges.
    pub surface: f64,
}

/// R-tree over the centerline segments of surface cross-sections.
pub(crate) struct SectionIndex<'a> {
    segments: Vec<(&'a CrossSection, &'a CrossSection)>,
    index: SpatialIndex,
    max_half_width: f64,
}

impl<'a> SectionIndex<'a> {
    /// Index every pair of consecutive surface cross-sections; a surface
    /// cross-section with no surface neighbour becomes a point segment.
    pub(crate) fn new(network: &'a RoadNetwork<Harmonized>) -> Self {
        let mut segments = Vec::new();
        for path in network.paths() {
            let sections = network.path_sections(path.id()).map(|(_, s)| s).collect::<Vec<_>>();
            for (i, &s) in sections.iter().enumerate() {
                if !on_surface(s) { continue }
                match sections.get(i + 1) {
                    Some(&next) if on_surface(next) => segments.push((s, next)),
                    _ => {
                        let joined = i > 0 && on_surface(sections[i - 1]);
                        if !joined { segments.push((s, s)) }
                    }
                }
            }
        }

        let max_half_width = segments.iter()
            .map(|(a, b)| a.half_width().max(b.half_width()))
            .fold(0.0, f64::max);
        let index = SpatialIndex::new(segments.iter().enumerate()
            .map(|(k, (a, b))| (k, Rect::new(a.position(), b.position()))));
        Self { segments, index, max_half_width }
    }

    #[inline] pub(crate) fn is_empty(&self) -> bool { self.segments.is_empty() }

    /// Project `p` onto the road whose edge is nearest, looking no further
    /// than `reach` beyond any road edge.
    pub(crate) fn project(&self, p: Coord<f64>, reach: f64) -> Option<Projection> {
        let mut best: Option<(f64, usize, Projection)> = None;
        for k in self.index.around(p, self.max_half_width + reach) {
            let projection = self.project_onto(k, p);
            let edge = projection.distance - projection.half_width;
            if edge > reach { continue }
            let better = best.is_none_or(|(e, j, _)| edge < e || (edge == e && k < j));
            if better { best = Some((edge, k, projection)) }
        }
        best.map(|(_, _, projection)| projection)
    }

    fn project_onto(&self, k: usize, p: Coord<f64>) -> Projection {
        let (a, b) = self.segments[k];
        let ab = b.position() - a.position();
        let len_sq = geom::dot(ab, ab);
        let t = if len_sq > 0.0 { (geom::dot(p - a.position(), ab) / len_sq).clamp(0.0, 1.0) } else { 0.0 };
        let foot = a.position() + ab * t;

        let surface_a = a.surface_at(a.lateral_offset(p));
        let surface_b = b.surface_at(b.lateral_offset(p));
        Projection {
            distance: geom::distance(p, foot),
            half_width: a.half_width() + (b.half_width() - a.half_width()) * t,
            surface: surface_a + (surface_b - surface_a) * t,
        }
    }
}

#[cfg(test)]
mod tests {
    use heightfield::Heightfield;

    use super::*;
    use crate::config::HarmonizeConfig;
    use crate::harmonize;
    use crate::testing::{detected, network, road, smoothed};

    fn harmonized(sampled: RoadNetwork<crate::network::Sampled>, f: impl Fn(Coord<f64>) -> f64) -> RoadNetwork<Harmonized> {
        let terrain = Heightfield::filled(100, 100, 0.0, 1.0).unwrap();
        let config = HarmonizeConfig { dead_end_taper: 0.0, endpoint_terrain_strength: 0.0, ..HarmonizeConfig::default() };
        harmonize::run(detected(smoothed(sampled, f)), &terrain, &config)
    }

    #[test]
    fn projects_onto_segment_interior() {
        let network = harmonized(network(&[(0, &[(0.0, 10.0), (50.0, 10.0)])], 10.0, 4.0), |p| p.x);
        let index = SectionIndex::new(&network);
        let hit = index.project(Coord { x: 25.0, y: 16.0 }, 8.0).unwrap();
        assert!((hit.distance - 6.0).abs() < 1e-12);
        assert_eq!(hit.half_width, 4.0);
        // Clamped to the edge, halfway between the 20 m and 30 m sections.
        assert!((hit.surface - 25.0).abs() < 1e-12);

        assert_eq!(index.project(Coord { x: 25.0, y: 23.0 }, 8.0), None);
    }

    #[test]
    fn nearest_edge_wins_across_widths() {
        let mut sampled = RoadNetwork::new();
        sampled.add_path(0, &road(&[(0.0, 0.0), (60.0, 0.0)], 10.0, 10.0)).unwrap();
        sampled.add_path(0, &road(&[(0.0, 16.0), (60.0, 16.0)], 10.0, 1.0)).unwrap();
        let network = harmonized(sampled, |p| if p.y == 0.0 { 1.0 } else { 2.0 });
        let index = SectionIndex::new(&network);
        // 12 m from the wide road's centre (2 m past its edge), 4 m from the
        // narrow one's centre (3 m past its edge).
        let hit = index.project(Coord { x: 30.0, y: 12.0 }, 5.0).unwrap();
        assert_eq!(hit.half_width, 10.0);
        assert_eq!(hit.surface, 1.0);
    }

    #[test]
    fn unusable_sections_are_not_indexed() {
        let network = harmonized(network(&[(0, &[(0.0, 10.0), (50.0, 10.0)])], 10.0, 4.0), |_| f64::NAN);
        assert!(SectionIndex::new(&network).is_empty());
    }
}
