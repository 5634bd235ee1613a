use std::marker::PhantomData;

use geo::Coord;
use heightfield::Heightfield;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::HarmonizeError;
use crate::geom;

use super::junction::Junction;
use super::path::RoadPath;
use super::section::{CrossSection, EdgeElevations, PathId, SectionId};

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Geometry only; no elevations yet.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sampled;

/// Raw samples and smoothed target elevations are set.
#[derive(Clone, Copy, Debug, Default)]
pub struct Smoothed;

/// Junctions are detected (and crossings possibly split).
#[derive(Clone, Copy, Debug, Default)]
pub struct Detected;

/// Junction elevations and propagated overrides are set.
#[derive(Clone, Copy, Debug, Default)]
pub struct Harmonized;

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// A pre-built cross-section supplied by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    pub position: Coord<f64>,
    pub half_width: f64,
    #[serde(default)]
    pub bank: f64,
    #[serde(default)]
    pub excluded: bool,
    /// Direction of travel; derived from neighbours when absent.
    #[serde(default)]
    pub tangent: Option<Coord<f64>>,
}

impl SectionSpec {
    pub fn new(position: Coord<f64>, half_width: f64) -> Self {
        Self { position, half_width, bank: 0.0, excluded: false, tangent: None }
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// All paths, their flattened cross-sections and the junction list of one
/// run.
///
/// The stage parameter records how far the network has travelled through
/// the pipeline. Each stage consumes the network and returns it in the next
/// stage; the only writers of a field are the transitions that own it.
#[derive(Clone, Debug)]
pub struct RoadNetwork<S = Sampled> {
    paths: Vec<RoadPath>,
    sections: Vec<CrossSection>,
    junctions: Vec<Junction>,
    stage: PhantomData<S>,
}

impl Default for RoadNetwork<Sampled> {
    fn default() -> Self { Self::new() }
}

impl<S> RoadNetwork<S> {
    #[inline] pub fn paths(&self) -> &[RoadPath] { &self.paths }
    #[inline] pub fn path(&self, id: PathId) -> &RoadPath { &self.paths[id.index()] }
    #[inline] pub fn sections(&self) -> &[CrossSection] { &self.sections }
    #[inline] pub fn section(&self, id: SectionId) -> &CrossSection { &self.sections[id.index()] }
    #[inline] pub fn junctions(&self) -> &[Junction] { &self.junctions }
    #[inline] pub fn is_empty(&self) -> bool { self.paths.is_empty() }

    /// Iterate over the cross-sections of a path in order.
    pub fn path_sections(&self, id: PathId) -> impl Iterator<Item = (SectionId, &CrossSection)> + '_ {
        self.paths[id.index()].sections.iter().map(move |&s| (s, &self.sections[s.index()]))
    }

    /// Previous and next cross-section along the owning path.
    pub fn neighbors(&self, id: SectionId) -> (Option<SectionId>, Option<SectionId>) {
        let section = self.section(id);
        let path = &self.paths[section.path.index()].sections;
        let i = section.index as usize;
        (
            i.checked_sub(1).map(|j| path[j]),
            path.get(i + 1).copied(),
        )
    }

    /// Check the network against the raster it will be carved into.
    pub fn validate_against(&self, terrain: &Heightfield) -> Result<(), HarmonizeError> {
        if self.sections.is_empty() { return Ok(()) }
        if terrain.is_empty() { return Err(HarmonizeError::EmptyTerrain) }
        if !self.sections.iter().any(|s| terrain.contains(s.position)) {
            return Err(HarmonizeError::OutsideTerrain)
        }
        Ok(())
    }

    fn into_stage<T>(self) -> RoadNetwork<T> {
        RoadNetwork {
            paths: self.paths,
            sections: self.sections,
            junctions: self.junctions,
            stage: PhantomData,
        }
    }
}

impl RoadNetwork<Sampled> {
    /// An empty network.
    pub fn new() -> Self {
        Self { paths: Vec::new(), sections: Vec::new(), junctions: Vec::new(), stage: PhantomData }
    }

    /// Append a path built from pre-sampled cross-sections.
    ///
    /// Returns `Ok(None)` (with a warning) for an empty input.
    pub fn add_path(&mut self, priority: i32, specs: &[SectionSpec]) -> Result<Option<PathId>, HarmonizeError> {
        let road = self.paths.len();
        if specs.is_empty() {
            warn!(road, "skipping road without cross-sections");
            return Ok(None)
        }
        for spec in specs {
            if !geom::is_finite(spec.position) || !spec.bank.is_finite() {
                return Err(HarmonizeError::NonFiniteGeometry { road })
            }
            if !spec.half_width.is_finite() || spec.half_width <= 0.0 {
                return Err(HarmonizeError::InvalidWidth { road, width: 2.0 * spec.half_width })
            }
        }

        let positions = specs.iter().map(|s| s.position).collect::<Vec<_>>();
        let derived = geom::tangents(&positions);

        let id = PathId(self.paths.len() as u32);
        let first = self.sections.len();
        for (i, (spec, fallback)) in specs.iter().zip(derived).enumerate() {
            let tangent = spec.tangent.and_then(geom::normalize).unwrap_or(fallback);
            let mut section = CrossSection::new(spec.position, tangent, spec.half_width, spec.bank, spec.excluded);
            section.path = id;
            section.index = i as u32;
            section.is_start = i == 0;
            section.is_end = i + 1 == specs.len();
            self.sections.push(section);
        }

        let length = geom::polyline_length(&positions);
        self.paths.push(RoadPath {
            id,
            priority,
            length,
            source_length: length,
            sections: (first..self.sections.len()).map(|s| SectionId(s as u32)).collect(),
        });
        Ok(Some(id))
    }

    /// Flag every cross-section matching `predicate` as an excluded surface
    /// (bridge deck, tunnel).
    pub fn mark_excluded(&mut self, predicate: impl Fn(&CrossSection) -> bool) {
        for section in &mut self.sections {
            if predicate(section) { section.excluded = true }
        }
    }

    /// Smoother output: one raw sample and one smoothed elevation per
    /// cross-section, in flat order.
    pub(crate) fn into_smoothed(mut self, raw: Vec<f64>, smoothed: Vec<f64>) -> RoadNetwork<Smoothed> {
        assert!(raw.len() == self.sections.len(), "raw.len() must equal the number of cross-sections");
        assert!(smoothed.len() == self.sections.len(), "smoothed.len() must equal the number of cross-sections");
        for ((section, raw), smoothed) in self.sections.iter_mut().zip(raw).zip(smoothed) {
            section.raw = raw;
            section.smoothed = smoothed;
        }
        self.into_stage()
    }
}

impl RoadNetwork<Smoothed> {
    /// Detector output.
    pub(crate) fn into_detected(mut self, junctions: Vec<Junction>) -> RoadNetwork<Detected> {
        self.junctions = junctions;
        self.into_stage()
    }
}

impl RoadNetwork<Detected> {
    #[inline]
    pub(crate) fn junctions_mut(&mut self) -> &mut Vec<Junction> { &mut self.junctions }

    /// Split the path owning `at` into `start..=at` (keeps the path id) and
    /// `at..=end` (new path id, `at` duplicated as its first cross-section).
    ///
    /// Returns the new path and the duplicated cross-section, or `None` when
    /// either piece would have fewer than two cross-sections.
    pub(crate) fn split_path(&mut self, at: SectionId) -> Option<(PathId, SectionId)> {
        let owner = self.section(at).path;
        let k = self.section(at).index as usize;
        let len = self.paths[owner.index()].sections.len();
        if k + 1 < 2 || len - k < 2 { return None }

        let new_id = PathId(self.paths.len() as u32);
        let tail = self.paths[owner.index()].sections.split_off(k + 1);

        let mut head = self.sections[at.index()].clone();
        self.sections[at.index()].is_end = true;
        head.path = new_id;
        head.index = 0;
        head.is_start = true;
        head.is_end = false;
        let head_id = SectionId(self.sections.len() as u32);
        self.sections.push(head);

        let mut ids = Vec::with_capacity(tail.len() + 1);
        ids.push(head_id);
        for (i, id) in tail.into_iter().enumerate() {
            let section = &mut self.sections[id.index()];
            section.path = new_id;
            section.index = i as u32 + 1;
            ids.push(id);
        }

        let RoadPath { priority, source_length, .. } = self.paths[owner.index()];
        self.paths.push(RoadPath { id: new_id, priority, length: 0.0, source_length, sections: ids });
        for id in [owner, new_id] {
            let positions = self.paths[id.index()].sections.iter()
                .map(|s| self.sections[s.index()].position)
                .collect::<Vec<_>>();
            self.paths[id.index()].length = geom::polyline_length(&positions);
        }

        Some((new_id, head_id))
    }

    /// Harmonizer output: per-section overrides in flat order and one
    /// reconciled elevation per junction.
    pub(crate) fn into_harmonized(mut self,
        overrides: Vec<Option<f64>>,
        edges: Vec<Option<EdgeElevations>>,
        junction_elevations: Vec<f64>,
    ) -> RoadNetwork<Harmonized> {
        assert!(overrides.len() == self.sections.len(), "overrides.len() must equal the number of cross-sections");
        assert!(edges.len() == self.sections.len(), "edges.len() must equal the number of cross-sections");
        assert!(junction_elevations.len() == self.junctions.len(), "one elevation per junction");

        for ((section, value), edge) in self.sections.iter_mut().zip(overrides).zip(edges) {
            section.harmonized = value;
            section.edges = edge;
        }
        for (junction, elevation) in self.junctions.iter_mut().zip(junction_elevations) {
            junction.elevation = elevation;
        }
        self.into_stage()
    }
}
