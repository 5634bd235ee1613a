use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::network::{Contribution, EdgeElevations, Harmonized, JunctionKind, PathId, RoadNetwork};

/// Snapshot of one cross-section after harmonization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub path: PathId,
    /// Position along the path.
    pub index: u32,
    pub x: f64,
    pub y: f64,
    pub half_width: f64,
    pub bank: f64,
    pub excluded: bool,
    /// Terrain sample; `None` when rejected.
    pub raw: Option<f64>,
    /// `None` when the path had no valid samples.
    pub smoothed: Option<f64>,
    pub harmonized: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<EdgeElevations>,
}

/// Snapshot of one junction after harmonization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JunctionReport {
    pub kind: JunctionKind,
    pub x: f64,
    pub y: f64,
    /// Agreed elevation; `None` when the junction was left unmodified.
    pub elevation: Option<f64>,
    pub excluded: bool,
    /// Index of the matched junction hint.
    pub hint: Option<usize>,
    pub contributions: Vec<Contribution>,
}

/// Serializable view of a harmonized network, for visualization and
/// debugging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub sections: Vec<SectionReport>,
    pub junctions: Vec<JunctionReport>,
}

#[inline]
fn finite(v: f64) -> Option<f64> { v.is_finite().then_some(v) }

impl NetworkReport {
    pub fn new(network: &RoadNetwork<Harmonized>) -> Self {
        let sections = network.sections().iter()
            .map(|s| SectionReport {
                path: s.path(),
                index: s.index(),
                x: s.position().x,
                y: s.position().y,
                half_width: s.half_width(),
                bank: s.bank(),
                excluded: s.excluded(),
                raw: finite(s.raw()),
                smoothed: finite(s.smoothed()),
                harmonized: s.harmonized(),
                edges: s.edges(),
            })
            .collect();

        let junctions = network.junctions().iter()
            .map(|j| JunctionReport {
                kind: j.kind(),
                x: j.centroid().x,
                y: j.centroid().y,
                elevation: finite(j.elevation()),
                excluded: j.excluded(),
                hint: j.hint(),
                contributions: j.contributions().to_vec(),
            })
            .collect();

        Self { sections, junctions }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize network report")
    }

    /// Write the report as pretty-printed JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write network report to {}", path.display()))
    }

    /// Junctions of `kind`.
    pub fn count(&self, kind: JunctionKind) -> usize {
        self.junctions.iter().filter(|j| j.kind == kind).count()
    }
}
