use ahash::AHashMap;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, Rect};
use rstar::AABB;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::geom::{self, SpatialIndex};
use crate::network::{
    Contribution, Contributions, CrossSection, Detected, Junction, JunctionKind, PathId, RoadNetwork, SectionId, Smoothed,
};

use super::union_find::UnionFind;

/// An externally supplied junction location (e.g. from map tags).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JunctionHint {
    pub position: Coord<f64>,
    pub kind: JunctionKind,
    /// Number of roads the source says meet here.
    #[serde(default)]
    pub connected_roads: usize,
}

impl JunctionHint {
    pub fn new(position: Coord<f64>, kind: JunctionKind) -> Self {
        Self { position, kind, connected_roads: 0 }
    }
}

/// A junction under construction.
struct Draft {
    centroid: Option<Coord<f64>>,
    contributions: Contributions,
    hint: Option<(usize, JunctionKind)>,
}

impl Draft {
    fn new(contributions: Contributions) -> Self {
        Self { centroid: None, contributions, hint: None }
    }

    fn at(centroid: Coord<f64>, contributions: Contributions) -> Self {
        Self { centroid: Some(centroid), contributions, hint: None }
    }

    fn centroid(&self, sections: &[CrossSection]) -> Coord<f64> {
        self.centroid.unwrap_or_else(|| {
            let sum = self.contributions.iter()
                .fold(Coord { x: 0.0, y: 0.0 }, |acc, c| acc + sections[c.section.index()].position());
            sum / self.contributions.len() as f64
        })
    }

    fn build(self, sections: &[CrossSection]) -> Junction {
        let centroid = self.centroid(sections);
        let excluded = self.contributions.iter().any(|c| sections[c.section.index()].excluded());
        let junction = Junction::new(centroid, self.contributions, excluded);
        match self.hint {
            Some((hint, label)) => junction.with_hint(hint, label),
            None => junction,
        }
    }
}

/// Find every place where paths meet and classify it.
///
/// Endpoints within `radius` of each other are clustered transitively; an
/// endpoint with no partner attaches to the nearest cross-section of another
/// path within `radius`, or else stays a lone endpoint. Optionally, centerline
/// crossings away from any junction become junctions too. Hints are then
/// matched to junctions, or spawn new ones.
pub fn detect(network: RoadNetwork<Smoothed>, hints: &[JunctionHint], config: &DetectionConfig) -> RoadNetwork<Detected> {
    let sections = network.sections();
    let radius = config.radius;
    let sites = SpatialIndex::points(sections.iter().enumerate().map(|(i, s)| (i, s.position())));

    let mut drafts = cluster_endpoints(&network, &sites, radius);
    if config.detect_crossings {
        let found = find_crossings(&network, &drafts, config.hint_match_factor * radius);
        debug!(crossings = found.len(), "centerline crossings");
        drafts.extend(found);
    }
    for (i, hint) in hints.iter().enumerate() {
        match_hint(&network, &sites, &mut drafts, i, hint, config);
    }

    let junctions = drafts.into_iter().map(|d| d.build(sections)).collect::<Vec<_>>();
    debug!(
        junctions = junctions.len(),
        endpoints = junctions.iter().filter(|j| j.kind() == JunctionKind::Endpoint).count(),
        crossings = junctions.iter().filter(|j| j.kind() == JunctionKind::MidPathCrossing).count(),
        "detected junctions"
    );
    network.into_detected(junctions)
}

/// Endpoint clusters, then mid-path attachment of the endpoints left alone.
fn cluster_endpoints(network: &RoadNetwork<Smoothed>, sites: &SpatialIndex, radius: f64) -> Vec<Draft> {
    let sections = network.sections();
    let mut ends: Vec<SectionId> = Vec::with_capacity(2 * network.paths().len());
    for path in network.paths() {
        let (Some(first), Some(last)) = (path.first(), path.last()) else { continue };
        ends.push(first);
        if last != first { ends.push(last) }
    }

    let position = |e: usize| sections[ends[e].index()].position();
    let owner = |e: usize| sections[ends[e].index()].path();
    let index = SpatialIndex::points((0..ends.len()).map(|e| (e, position(e))));

    let mut uf = UnionFind::new(ends.len());
    for e in 0..ends.len() {
        for f in index.around(position(e), radius) {
            // Both ends of one short path never merge on their own.
            if f > e && owner(f) != owner(e) && geom::distance(position(e), position(f)) <= radius {
                uf.union(e, f);
            }
        }
    }

    let mut drafts = Vec::new();
    let mut isolated = Vec::new();
    for group in uf.groups() {
        if group.len() == 1 {
            isolated.push(ends[group[0]]);
            continue;
        }
        let contributions = group.iter()
            .map(|&e| Contribution { section: ends[e], continuous: false })
            .collect::<Contributions>();
        drafts.push(Draft::new(contributions));
    }

    // Isolated endpoints landing on the same through cross-section share a
    // junction.
    let mut attached: AHashMap<SectionId, usize> = AHashMap::new();
    for end in isolated {
        let p = sections[end.index()].position();
        let path = sections[end.index()].path();
        let nearest = sites.nearest_within(
            p,
            radius,
            |i| geom::distance(sections[i].position(), p),
            |i| sections[i].path() != path,
        );
        let terminating = Contribution { section: end, continuous: false };
        match nearest {
            Some((i, _)) => {
                let through = SectionId(i as u32);
                match attached.get(&through) {
                    Some(&d) => drafts[d].contributions.push(terminating),
                    None => {
                        let continuous = !sections[i].is_endpoint();
                        attached.insert(through, drafts.len());
                        drafts.push(Draft::new(smallvec![Contribution { section: through, continuous }, terminating]));
                    }
                }
            }
            None => drafts.push(Draft::new(smallvec![terminating])),
        }
    }
    drafts
}

/// Proper crossings of centerline segments of different paths. A crossing
/// within `clearance` of a junction that already joins both paths is the
/// same meeting and is skipped; junctions touching only one of the two paths
/// never suppress it. Crossings involving excluded cross-sections are
/// grade-separated and ignored.
fn find_crossings(network: &RoadNetwork<Smoothed>, existing: &[Draft], clearance: f64) -> Vec<Draft> {
    let sections = network.sections();
    let segments = network.paths().iter()
        .flat_map(|path| path.sections().windows(2).map(|w| (w[0], w[1])))
        .collect::<Vec<_>>();
    let line = |k: usize| {
        let (a, b) = segments[k];
        Line::new(sections[a.index()].position(), sections[b.index()].position())
    };
    let index = SpatialIndex::new((0..segments.len()).map(|k| (k, Rect::new(line(k).start, line(k).end))));

    let joined = |d: &Draft| d.contributions.iter()
        .map(|c| sections[c.section.index()].path())
        .collect::<SmallVec<[PathId; 4]>>();
    let mut meetings = existing.iter().map(|d| (d.centroid(sections), joined(d))).collect::<Vec<_>>();
    let mut found = Vec::new();
    for k in 0..segments.len() {
        let (a, b) = segments[k];
        let owner = sections[a.index()].path();
        if sections[a.index()].excluded() || sections[b.index()].excluded() { continue }

        let l = line(k);
        let envelope = AABB::from_corners(
            [l.start.x.min(l.end.x), l.start.y.min(l.end.y)],
            [l.start.x.max(l.end.x), l.start.y.max(l.end.y)],
        );
        let mut candidates = index.query(&envelope)
            .map(|b| b.idx())
            .filter(|&m| m > k)
            .collect::<Vec<_>>();
        candidates.sort_unstable();

        for m in candidates {
            let (c, d) = segments[m];
            let other = sections[c.index()].path();
            if other == owner { continue }
            if sections[c.index()].excluded() || sections[d.index()].excluded() { continue }
            let Some(LineIntersection::SinglePoint { intersection: p, .. }) = line_intersection(l, line(m)) else { continue };
            let seen = meetings.iter()
                .any(|(q, paths)| paths.contains(&owner) && paths.contains(&other) && geom::distance(p, *q) <= clearance);
            if seen { continue }

            let nearer = |(s, t): (SectionId, SectionId)| {
                let (ds, dt) = (geom::distance(sections[s.index()].position(), p), geom::distance(sections[t.index()].position(), p));
                let section = if ds <= dt { s } else { t };
                Contribution { section, continuous: !sections[section.index()].is_endpoint() }
            };
            meetings.push((p, smallvec![owner, other]));
            found.push(Draft::at(p, smallvec![nearer((a, b)), nearer((c, d))]));
        }
    }
    found
}

fn match_hint(
    network: &RoadNetwork<Smoothed>,
    sites: &SpatialIndex,
    drafts: &mut Vec<Draft>,
    i: usize,
    hint: &JunctionHint,
    config: &DetectionConfig,
) {
    let sections = network.sections();
    let reach = config.hint_match_factor * config.radius;
    let p = hint.position;

    let nearest = drafts.iter().enumerate()
        .map(|(d, draft)| (d, geom::distance(draft.centroid(sections), p)))
        .filter(|&(_, dist)| dist <= reach)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    if let Some((d, _)) = nearest {
        match drafts[d].hint {
            None => drafts[d].hint = Some((i, hint.kind)),
            Some((other, _)) => debug!(hint = i, other, "junction already matched to another hint"),
        }
        return
    }

    // Nearest cross-section of every path within reach of the hint.
    let mut best: AHashMap<PathId, (SectionId, f64)> = AHashMap::new();
    for s in sites.around(p, config.radius) {
        let dist = geom::distance(sections[s].position(), p);
        if dist > config.radius { continue }
        let id = SectionId(s as u32);
        best.entry(sections[s].path())
            .and_modify(|e| if dist < e.1 || (dist == e.1 && id < e.0) { *e = (id, dist) })
            .or_insert((id, dist));
    }
    if best.is_empty() {
        warn!(hint = i, x = p.x, y = p.y, "hint matches no road; ignoring");
        return
    }

    let mut picked = best.into_iter().collect::<Vec<_>>();
    picked.sort_unstable_by_key(|(path, _)| *path);
    if hint.connected_roads > picked.len() {
        debug!(hint = i, expected = hint.connected_roads, found = picked.len(), "hint names more roads than were found");
    }
    let contributions = picked.into_iter()
        .map(|(_, (section, _))| Contribution { section, continuous: !sections[section.index()].is_endpoint() })
        .collect::<Contributions>();
    let mut draft = Draft::at(p, contributions);
    draft.hint = Some((i, hint.kind));
    drafts.push(draft);
}
