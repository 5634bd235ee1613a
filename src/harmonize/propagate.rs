use crate::blend::{cosine, quintic};
use crate::geom;
use crate::network::{Detected, RoadNetwork, SectionId};

use super::reconcile::{Taper, Target};

/// Arc-length slack absorbing rounding in the accumulated distance.
const SLACK: f64 = 1e-9;

/// Value at normalized arc length `t` from a junction: `target` at `t = 0`,
/// `original` at `t = 1` and beyond.
#[inline]
pub(crate) fn propagated(target: f64, original: f64, t: f64, taper: Taper) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let blend = match taper {
        Taper::Junction => cosine(t),
        Taper::DeadEnd => quintic(t),
    };
    target * (1.0 - blend) + original * blend
}

/// A candidate override for one cross-section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Claim {
    /// Arc length from the claiming junction.
    pub distance: f64,
    pub junction: usize,
    pub value: f64,
}

impl Claim {
    /// Nearer junction wins; ties go to the lower junction index.
    #[inline]
    pub(crate) fn beats(&self, other: &Claim) -> bool {
        (self.distance, self.junction) < (other.distance, other.junction)
    }
}

/// Walk away from `target.section` along its path for `reach` metres of arc
/// length, offering a claim for every cross-section passed.
///
/// The walk never enters a pinned or excluded cross-section. Every value is
/// computed from the original smoothed elevation.
pub(crate) fn walk(
    network: &RoadNetwork<Detected>,
    junction: usize,
    target: &Target,
    reach: f64,
    pinned: &[bool],
    mut offer: impl FnMut(SectionId, Claim),
) {
    let start = network.section(target.section);
    let path = network.path(start.path()).sections();
    let k = start.index() as usize;

    let t_at = |d: f64| if reach > 0.0 { d / reach } else if d > 0.0 { 1.0 } else { 0.0 };
    let claim = |id: SectionId, d: f64| Claim {
        distance: d,
        junction,
        value: propagated(target.value, network.section(id).smoothed(), t_at(d), target.taper),
    };
    offer(target.section, claim(target.section, 0.0));

    // Terminating cross-sections are path ends; walk inward. Anything else
    // walks both ways.
    let forward = !start.is_end() || start.is_start();
    let backward = !start.is_start() || start.is_end();
    let directions: [(bool, isize); 2] = [(forward, 1), (backward, -1)];

    for (enabled, step) in directions {
        if !enabled { continue }
        let (mut i, mut d) = (k, 0.0);
        loop {
            let Some(j) = i.checked_add_signed(step).filter(|&j| j < path.len()) else { break };
            let (prev, next) = (network.section(path[i]), network.section(path[j]));
            d += geom::distance(prev.position(), next.position());
            if d > reach + SLACK || pinned[path[j].index()] || next.excluded() || !next.smoothed().is_finite() { break }
            offer(path[j], claim(path[j], d));
            i = j;
        }
    }
}
