use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Index types
// ---------------------------------------------------------------------------

macro_rules! idx {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            #[inline] pub fn index(self) -> usize { self.0 as usize }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

idx!(PathId);
idx!(SectionId);

// ---------------------------------------------------------------------------
// Cross-section
// ---------------------------------------------------------------------------

/// Elevations of the left and right road edges, overriding the banked
/// profile of a cross-section.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeElevations {
    pub left: f64,
    pub right: f64,
}

/// A sampled centerline point plus its local width and orientation.
///
/// Fields are written only through the stage transitions of
/// [`RoadNetwork`](super::RoadNetwork): geometry at construction, samples by
/// the smoother, overrides by the harmonizer, path membership by the
/// crossroad converter.
#[derive(Clone, Debug)]
pub struct CrossSection {
    pub(super) position: Coord<f64>,
    pub(super) tangent: Coord<f64>,
    pub(super) normal: Coord<f64>,
    pub(super) half_width: f64,
    pub(super) bank: f64,
    pub(super) excluded: bool,

    pub(super) path: PathId,
    pub(super) index: u32,
    pub(super) is_start: bool,
    pub(super) is_end: bool,

    pub(super) raw: f64,
    pub(super) smoothed: f64,
    pub(super) harmonized: Option<f64>,
    pub(super) edges: Option<EdgeElevations>,
}

impl CrossSection {
    pub(super) fn new(position: Coord<f64>, tangent: Coord<f64>, half_width: f64, bank: f64, excluded: bool) -> Self {
        Self {
            position,
            tangent,
            normal: Coord { x: -tangent.y, y: tangent.x },
            half_width,
            bank,
            excluded,
            path: PathId(0),
            index: 0,
            is_start: false,
            is_end: false,
            raw: f64::NAN,
            smoothed: f64::NAN,
            harmonized: None,
            edges: None,
        }
    }

    #[inline] pub fn position(&self) -> Coord<f64> { self.position }
    #[inline] pub fn tangent(&self) -> Coord<f64> { self.tangent }

    /// Unit normal pointing to the left of travel.
    #[inline] pub fn normal(&self) -> Coord<f64> { self.normal }
    #[inline] pub fn half_width(&self) -> f64 { self.half_width }

    /// Cross slope (rise per metre toward the left edge).
    #[inline] pub fn bank(&self) -> f64 { self.bank }
    #[inline] pub fn excluded(&self) -> bool { self.excluded }
    #[inline] pub fn path(&self) -> PathId { self.path }

    /// Position along the owning path, starting at 0.
    #[inline] pub fn index(&self) -> u32 { self.index }
    #[inline] pub fn is_start(&self) -> bool { self.is_start }
    #[inline] pub fn is_end(&self) -> bool { self.is_end }
    #[inline] pub fn is_endpoint(&self) -> bool { self.is_start || self.is_end }

    /// Raw terrain sample under the centre (NaN before smoothing).
    #[inline] pub fn raw(&self) -> f64 { self.raw }

    /// Low-pass filtered target elevation (NaN before smoothing).
    #[inline] pub fn smoothed(&self) -> f64 { self.smoothed }

    /// Junction-driven override of the smoothed elevation, if any.
    #[inline] pub fn harmonized(&self) -> Option<f64> { self.harmonized }
    #[inline] pub fn edges(&self) -> Option<EdgeElevations> { self.edges }

    /// Effective centre elevation.
    #[inline] pub fn elevation(&self) -> f64 { self.harmonized.unwrap_or(self.smoothed) }

    /// Signed lateral offset of `p` from the centre (positive to the left).
    #[inline]
    pub fn lateral_offset(&self, p: Coord<f64>) -> f64 {
        let d = p - self.position;
        d.x * self.normal.x + d.y * self.normal.y
    }

    /// Signed offset of `p` along the direction of travel.
    #[inline]
    pub fn longitudinal_offset(&self, p: Coord<f64>) -> f64 {
        let d = p - self.position;
        d.x * self.tangent.x + d.y * self.tangent.y
    }

    /// Road surface elevation at lateral offset `lateral`, clamped to the
    /// road edges. Edge overrides win over banking.
    pub fn surface_at(&self, lateral: f64) -> f64 {
        let lateral = lateral.clamp(-self.half_width, self.half_width);
        match self.edges {
            Some(edges) if self.half_width > 0.0 => {
                let t = 0.5 * (lateral / self.half_width + 1.0);
                edges.right + (edges.left - edges.right) * t
            }
            _ => self.elevation() + self.bank * lateral,
        }
    }
}
