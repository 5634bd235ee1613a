use serde::{Deserialize, Serialize};
use smallvec::smallvec;
use tracing::{info, warn};

use crate::network::{Contribution, Detected, Junction, JunctionKind, RoadNetwork};

/// Outcome of one converter run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// Paths split into two.
    pub splits: usize,
    /// Mid-path crossings left in place (excluded, or a split would leave a
    /// piece with fewer than two cross-sections).
    pub unresolved: usize,
}

/// Turn every mid-path crossing into T-junctions: the primary path stays
/// continuous, every other path is split at its crossing cross-section.
///
/// Primary is the path with the highest priority, then the longest source
/// road (pieces of an earlier split keep the original length), then the
/// lowest id. Each split yields two junctions at the crossing centroid, both
/// pairing the primary with one terminating half. Running the converter on
/// its own output performs no further splits.
pub fn convert_crossings(mut network: RoadNetwork<Detected>) -> (RoadNetwork<Detected>, ConversionReport) {
    let mut report = ConversionReport::default();
    let old = std::mem::take(network.junctions_mut());
    let mut junctions = Vec::with_capacity(old.len());

    for junction in old {
        if junction.kind() != JunctionKind::MidPathCrossing {
            junctions.push(junction);
            continue;
        }
        if junction.excluded() {
            report.unresolved += 1;
            junctions.push(junction);
            continue;
        }

        let Some(primary) = junction.contributions().iter().copied().min_by(|a, b| {
            let pa = network.path(network.section(a.section).path());
            let pb = network.path(network.section(b.section).path());
            pa.precedence(pb)
        }) else { continue };

        let mut remaining = smallvec![primary];
        for &c in junction.contributions() {
            if c == primary { continue }
            let path = network.section(c.section).path();
            match network.split_path(c.section) {
                Some((_, head)) => {
                    report.splits += 1;
                    let through = Contribution { section: primary.section, continuous: true };
                    for end in [c.section, head] {
                        let contributions = smallvec![through, Contribution { section: end, continuous: false }];
                        junctions.push(Junction::new(junction.centroid(), contributions, false).with_hint_index(junction.hint()));
                    }
                }
                None => {
                    warn!(%path, section = %c.section, "crossing too close to a path end to split");
                    remaining.push(c);
                }
            }
        }

        if remaining.len() > 1 {
            report.unresolved += 1;
            junctions.push(Junction::new(junction.centroid(), remaining, false).with_hint_index(junction.hint()));
        }
    }

    *network.junctions_mut() = junctions;
    info!(splits = report.splits, unresolved = report.unresolved, "converted crossroads to T-junctions");
    (network, report)
}
