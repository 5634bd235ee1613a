use heightfield::Heightfield;
use smallvec::{smallvec, SmallVec};
use tracing::warn;

use crate::config::HarmonizeConfig;
use crate::geom;
use crate::network::{CrossSection, Detected, EdgeElevations, Junction, RoadNetwork, SectionId};

/// How a target fades back into the road.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Taper {
    /// Cosine over the propagation distance.
    Junction,
    /// Quintic over the dead-end taper.
    DeadEnd,
}

/// Target elevation for one terminating cross-section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Target {
    pub section: SectionId,
    pub value: f64,
    pub edges: Option<EdgeElevations>,
    pub taper: Taper,
}

/// Reconciled elevation of one junction plus the targets it imposes.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Resolution {
    /// NaN when the junction is left unmodified.
    pub elevation: f64,
    pub targets: SmallVec<[Target; 4]>,
}

impl Resolution {
    fn unmodified() -> Self {
        Self { elevation: f64::NAN, targets: SmallVec::new() }
    }
}

/// Agree on one elevation for `junction`.
///
/// A continuous contribution wins unchanged and terminating roads are fitted
/// to its surface. Otherwise several endpoints are averaged by inverse
/// distance to the centroid, and a lone endpoint is pulled toward the terrain.
pub(crate) fn reconcile(
    network: &RoadNetwork<Detected>,
    junction: &Junction,
    terrain: &Heightfield,
    config: &HarmonizeConfig,
) -> Resolution {
    if junction.excluded() { return Resolution::unmodified() }

    let section = |id: SectionId| network.section(id);
    let through = junction.contributions().iter()
        .filter(|c| c.continuous && section(c.section).smoothed().is_finite())
        .min_by(|a, b| {
            network.path(section(a.section).path()).precedence(network.path(section(b.section).path()))
        });

    if let Some(through) = through {
        let s = section(through.section);
        let grade = local_grade(network, through.section);
        let targets = junction.contributions().iter()
            .filter(|c| !c.continuous && section(c.section).smoothed().is_finite())
            .map(|c| {
                let t = section(c.section);
                if !config.surface_constraint {
                    return Target { section: c.section, value: s.smoothed(), edges: None, taper: Taper::Junction }
                }
                let edge = |side: f64| plane(s, grade, t.position() + t.normal() * (side * t.half_width()));
                Target {
                    section: c.section,
                    value: plane(s, grade, t.position()),
                    edges: Some(EdgeElevations { left: edge(1.0), right: edge(-1.0) }),
                    taper: Taper::Junction,
                }
            })
            .collect();
        return Resolution { elevation: s.smoothed(), targets }
    }

    let finite = junction.contributions().iter()
        .filter(|c| section(c.section).smoothed().is_finite())
        .collect::<SmallVec<[_; 4]>>();

    match finite.as_slice() {
        [] => {
            warn!(x = junction.centroid().x, y = junction.centroid().y, "junction has no elevation to reconcile");
            Resolution::unmodified()
        }
        [only] if junction.contributions().len() == 1 => {
            let s = section(only.section);
            let ground = terrain.sample(s.position()).filter(|z| z.is_finite());
            let value = match ground {
                Some(z) => s.smoothed() + (z - s.smoothed()) * config.endpoint_terrain_strength,
                None => s.smoothed(),
            };
            let target = Target { section: only.section, value, edges: None, taper: Taper::DeadEnd };
            Resolution { elevation: value, targets: smallvec![target] }
        }
        contributions => {
            let centroid = junction.centroid();
            let (mut sum, mut weights) = (0.0, 0.0);
            for c in contributions {
                let s = section(c.section);
                let w = 1.0 / (geom::distance(s.position(), centroid) + config.idw_epsilon);
                sum += w * s.smoothed();
                weights += w;
            }
            let value = sum / weights;
            let targets = contributions.iter()
                .map(|c| Target { section: c.section, value, edges: None, taper: Taper::Junction })
                .collect();
            Resolution { elevation: value, targets }
        }
    }
}

/// Through-road surface `z + bank·lateral + grade·longitudinal` at `p`.
fn plane(s: &CrossSection, grade: f64, p: geo::Coord<f64>) -> f64 {
    s.smoothed() + s.bank() * s.lateral_offset(p) + grade * s.longitudinal_offset(p)
}

/// Longitudinal slope of the smoothed profile at `id`, by central difference
/// (one-sided at path ends). Zero when undefined.
fn local_grade(network: &RoadNetwork<Detected>, id: SectionId) -> f64 {
    let (prev, next) = network.neighbors(id);
    let a = prev.unwrap_or(id);
    let b = next.unwrap_or(id);
    if a == b { return 0.0 }
    let (sa, sb) = (network.section(a), network.section(b));
    let run = geom::dot(sb.position() - sa.position(), network.section(id).tangent());
    let grade = (sb.smoothed() - sa.smoothed()) / run;
    if grade.is_finite() { grade } else { 0.0 }
}
