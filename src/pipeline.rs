//! End-to-end pipeline: smooth, detect, convert, harmonize, blend.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use heightfield::Heightfield;
use tracing::{debug, info};

use crate::blend::blend_terrain;
use crate::config::Config;
use crate::error::HarmonizeError;
use crate::harmonize::run as harmonize_junctions;
use crate::junction::{convert_crossings, detect, ConversionReport, JunctionHint};
use crate::network::{Harmonized, RoadNetwork, Sampled};
use crate::report::NetworkReport;
use crate::sample::RoadSpec;
use crate::smooth;

/// Everything a pipeline run produces.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// The blended raster.
    pub terrain: Heightfield,
    pub network: RoadNetwork<Harmonized>,
    pub conversion: ConversionReport,
}

impl Outcome {
    #[inline]
    pub fn report(&self) -> NetworkReport { NetworkReport::new(&self.network) }
}

/// Configured pipeline.
///
/// ```ignore
/// let outcome = Harmonizer::new(config)
///     .with_hints(hints)
///     .run(network, &terrain)?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct Harmonizer {
    config: Config,
    hints: Vec<JunctionHint>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Harmonizer {
    pub fn new(config: Config) -> Self {
        Self { config, hints: Vec::new(), cancel: None }
    }

    /// Externally supplied junctions to reconcile with the detected ones.
    pub fn with_hints(mut self, hints: Vec<JunctionHint>) -> Self {
        self.hints = hints;
        self
    }

    /// Flag checked between stages; raising it aborts the run.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    #[inline] pub fn config(&self) -> &Config { &self.config }

    /// Sample `roads` with the configured interval, then [`Self::run`].
    pub fn run_roads(&self, roads: &[RoadSpec], terrain: &Heightfield) -> Result<Outcome> {
        self.config.validate()?;
        let network = RoadNetwork::from_roads(roads, &self.config.sampling)?;
        self.run(network, terrain)
    }

    /// Run every stage over `network` and return the blended copy of
    /// `terrain`. The input raster is never modified.
    ///
    /// Fatal input problems and cancellation are reported as
    /// [`HarmonizeError`] before any stage runs or between stages.
    pub fn run(&self, network: RoadNetwork<Sampled>, terrain: &Heightfield) -> Result<Outcome> {
        self.config.validate()?;
        network.validate_against(terrain)?;
        debug!(
            paths = network.paths().len(),
            sections = network.sections().len(),
            hints = self.hints.len(),
            "starting road harmonization"
        );

        self.check("validation")?;
        let smoothed = smooth::run(network, terrain, &self.config.smoothing);

        self.check("smoothing")?;
        let detected = detect(smoothed, &self.hints, &self.config.detection);

        self.check("detection")?;
        let (converted, conversion) = convert_crossings(detected);

        self.check("conversion")?;
        let network = harmonize_junctions(converted, terrain, &self.config.harmonize);

        self.check("harmonization")?;
        let terrain = blend_terrain(&network, terrain, &self.config.blend);

        info!(
            paths = network.paths().len(),
            junctions = network.junctions().len(),
            splits = conversion.splits,
            "road harmonization complete"
        );
        Ok(Outcome { terrain, network, conversion })
    }

    fn check(&self, stage: &'static str) -> Result<(), HarmonizeError> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(HarmonizeError::Cancelled { stage }),
            _ => Ok(()),
        }
    }
}

/// Run the pipeline with default settings and no hints.
pub fn harmonize(network: RoadNetwork<Sampled>, terrain: &Heightfield) -> Result<Heightfield> {
    Ok(Harmonizer::default().run(network, terrain)?.terrain)
}
