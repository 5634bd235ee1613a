use geo::Coord;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::section::SectionId;

/// Topology of a junction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JunctionKind {
    Endpoint,
    TwoRoad,
    TJunction,
    Crossroads,
    Complex,
    MidPathCrossing,
    Roundabout,
}

impl JunctionKind {
    /// Classify a set of contributions.
    ///
    /// A continuous contribution counts as two arms, a terminating one as
    /// one: 1 = endpoint, 2 = two-road, 3 = T, 4 = crossroads, 5+ = complex.
    /// Two or more contributions that all pass through form a mid-path
    /// crossing regardless of arm count.
    pub fn classify(contributions: &[Contribution]) -> Self {
        if contributions.len() >= 2 && contributions.iter().all(|c| c.continuous) {
            return Self::MidPathCrossing
        }
        match arms(contributions) {
            0 | 1 => Self::Endpoint,
            2 => Self::TwoRoad,
            3 => Self::TJunction,
            4 => Self::Crossroads,
            _ => Self::Complex,
        }
    }
}

/// Number of road arms meeting at a set of contributions.
pub fn arms(contributions: &[Contribution]) -> usize {
    contributions.iter().map(|c| if c.continuous { 2 } else { 1 }).sum()
}

/// One cross-section taking part in a junction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub section: SectionId,
    /// The path passes through the junction rather than ending at it.
    pub continuous: bool,
}

pub type Contributions = SmallVec<[Contribution; 4]>;

/// A cluster of cross-sections from one or more paths that must agree on
/// elevation.
#[derive(Clone, Debug)]
pub struct Junction {
    pub(super) centroid: Coord<f64>,
    pub(super) kind: JunctionKind,
    pub(super) contributions: Contributions,
    pub(super) elevation: f64,
    pub(super) excluded: bool,
    pub(super) hint: Option<usize>,
}

impl Junction {
    /// Build and classify a junction. Panics on an empty contribution list.
    pub(crate) fn new(centroid: Coord<f64>, contributions: Contributions, excluded: bool) -> Self {
        assert!(!contributions.is_empty(), "a junction needs at least one contribution");
        Self {
            centroid,
            kind: JunctionKind::classify(&contributions),
            contributions,
            elevation: f64::NAN,
            excluded,
            hint: None,
        }
    }

    /// Tag with the external hint it was matched to. A roundabout label wins
    /// over the geometric classification.
    pub(crate) fn with_hint(mut self, hint: usize, label: JunctionKind) -> Self {
        self.hint = Some(hint);
        if label == JunctionKind::Roundabout { self.kind = JunctionKind::Roundabout }
        self
    }

    /// Carry a hint index over to a replacement junction.
    pub(crate) fn with_hint_index(mut self, hint: Option<usize>) -> Self {
        self.hint = hint;
        self
    }

    #[inline] pub fn centroid(&self) -> Coord<f64> { self.centroid }
    #[inline] pub fn kind(&self) -> JunctionKind { self.kind }
    #[inline] pub fn contributions(&self) -> &[Contribution] { &self.contributions }

    /// Reconciled elevation (NaN until harmonized or when left unmodified).
    #[inline] pub fn elevation(&self) -> f64 { self.elevation }
    #[inline] pub fn excluded(&self) -> bool { self.excluded }
    #[inline] pub fn hint(&self) -> Option<usize> { self.hint }
    #[inline] pub fn arms(&self) -> usize { arms(&self.contributions) }

    /// Returns `true` if any contribution passes through.
    #[inline]
    pub fn has_continuous(&self) -> bool {
        self.contributions.iter().any(|c| c.continuous)
    }
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;

    use super::*;

    fn c(section: u32, continuous: bool) -> Contribution {
        Contribution { section: SectionId(section), continuous }
    }

    #[test]
    fn classify_by_arms() {
        assert_eq!(JunctionKind::classify(&[c(0, false)]), JunctionKind::Endpoint);
        assert_eq!(JunctionKind::classify(&[c(0, false), c(1, false)]), JunctionKind::TwoRoad);
        assert_eq!(JunctionKind::classify(&[c(0, false), c(1, true)]), JunctionKind::TJunction);
        assert_eq!(JunctionKind::classify(&[c(0, false), c(1, false), c(2, false)]), JunctionKind::TJunction);
        assert_eq!(JunctionKind::classify(&[c(0, false); 4]), JunctionKind::Crossroads);
        assert_eq!(JunctionKind::classify(&[c(0, false), c(1, false), c(2, true)]), JunctionKind::Crossroads);
        assert_eq!(JunctionKind::classify(&[c(0, false); 5]), JunctionKind::Complex);
    }

    #[test]
    fn all_continuous_is_mid_path_crossing() {
        assert_eq!(JunctionKind::classify(&[c(0, true), c(1, true)]), JunctionKind::MidPathCrossing);
        assert_eq!(JunctionKind::classify(&[c(0, true), c(1, true), c(2, true)]), JunctionKind::MidPathCrossing);
        // A lone through road is not a crossing.
        assert_eq!(JunctionKind::classify(&[c(0, true)]), JunctionKind::TwoRoad);
    }

    #[test]
    fn roundabout_hint_overrides_kind() {
        let j = Junction::new(Coord { x: 0.0, y: 0.0 }, smallvec![c(0, false), c(1, false)], false)
            .with_hint(3, JunctionKind::Roundabout);
        assert_eq!(j.kind(), JunctionKind::Roundabout);
        assert_eq!(j.hint(), Some(3));

        let j = Junction::new(Coord { x: 0.0, y: 0.0 }, smallvec![c(0, false)], false)
            .with_hint(0, JunctionKind::TJunction);
        assert_eq!(j.kind(), JunctionKind::Endpoint);
    }

    #[test]
    #[should_panic(expected = "a junction needs at least one contribution")]
    fn empty_junction_panics() {
        Junction::new(Coord { x: 0.0, y: 0.0 }, SmallVec::new(), false);
    }
}
