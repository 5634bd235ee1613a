use std::fmt;

/// Fatal conditions, all detected before any stage mutates the network or
/// the raster.
#[derive(Debug, Clone, PartialEq)]
pub enum HarmonizeError {
    /// The raster has no cells but the network has roads to place.
    EmptyTerrain,
    /// A road contains a NaN or infinite coordinate.
    NonFiniteGeometry { road: usize },
    /// A road width is not finite and positive.
    InvalidWidth { road: usize, width: f64 },
    /// A road point scale is not finite and positive.
    InvalidScale { road: usize, scale: f64 },
    /// No cross-section falls inside the raster: the network and the terrain
    /// are not in the same coordinate system.
    OutsideTerrain,
    /// The caller raised the cancel flag; `stage` is the last completed one.
    Cancelled { stage: &'static str },
}

impl fmt::Display for HarmonizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTerrain => write!(f, "terrain raster is empty"),
            Self::NonFiniteGeometry { road } => write!(f, "road {road} has a non-finite coordinate"),
            Self::InvalidWidth { road, width } => write!(f, "road {road} has invalid width {width}"),
            Self::InvalidScale { road, scale } => write!(f, "road {road} has invalid scale {scale}"),
            Self::OutsideTerrain => {
                write!(f, "no cross-section lies inside the terrain extent (mismatched coordinate systems?)")
            }
            Self::Cancelled { stage } => write!(f, "cancelled after {stage}"),
        }
    }
}

impl std::error::Error for HarmonizeError {}
