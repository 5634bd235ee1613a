#![doc = "Roadbed public API"]
mod blend;
mod config;
mod error;
mod geom;
mod harmonize;
mod junction;
mod network;
mod pipeline;
mod report;
mod sample;
mod smooth;

#[cfg(test)]
mod testing;

#[doc(inline)]
pub use heightfield::{Georef, GridError, Heightfield};

#[doc(inline)]
pub use config::{
    BlendConfig, Config, DetectionConfig, FilterSpec, HarmonizeConfig, MeanBlend, MeanScope, SamplingConfig,
    SmoothingConfig,
};

#[doc(inline)]
pub use error::HarmonizeError;

#[doc(inline)]
pub use network::{
    Contribution, Contributions, CrossSection, Detected, EdgeElevations, Harmonized, Junction, JunctionKind, PathId, RoadNetwork,
    RoadPath, Sampled, SectionId, SectionSpec, Smoothed,
};

#[doc(inline)]
pub use sample::{sample_road, RoadSpec};

#[doc(inline)]
pub use junction::{convert_crossings, detect, ConversionReport, JunctionHint};

#[doc(inline)]
pub use blend::{blend_terrain, Falloff};

#[doc(inline)]
pub use report::{JunctionReport, NetworkReport, SectionReport};

#[doc(inline)]
pub use pipeline::{harmonize, Harmonizer, Outcome};

/// Individual stages, for callers driving the pipeline by hand.
pub mod stages {
    pub use crate::harmonize::run as harmonize;
    pub use crate::smooth::run as smooth;
    pub use crate::smooth::{butterworth, clamp_grade, moving_average, zero_phase, Biquad};
}
