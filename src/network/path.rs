use std::cmp::Ordering;

use super::section::{PathId, SectionId};

/// An ordered run of cross-sections sharing one path id.
#[derive(Clone, Debug)]
pub struct RoadPath {
    pub(super) id: PathId,
    pub(super) priority: i32,
    pub(super) length: f64,
    pub(super) source_length: f64,
    pub(super) sections: Vec<SectionId>,
}

impl RoadPath {
    #[inline] pub fn id(&self) -> PathId { self.id }

    /// Road-class rank; higher stays continuous through junctions.
    #[inline] pub fn priority(&self) -> i32 { self.priority }

    /// Arc length of the centerline in metres.
    #[inline] pub fn length(&self) -> f64 { self.length }

    /// Arc length of the road this path was cut from. Equal to [`Self::length`]
    /// until the path is split; both pieces keep the original value.
    #[inline] pub fn source_length(&self) -> f64 { self.source_length }
    #[inline] pub fn sections(&self) -> &[SectionId] { &self.sections }
    #[inline] pub fn len(&self) -> usize { self.sections.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.sections.is_empty() }
    #[inline] pub fn first(&self) -> Option<SectionId> { self.sections.first().copied() }
    #[inline] pub fn last(&self) -> Option<SectionId> { self.sections.last().copied() }

    /// Junction precedence: higher priority, then longer source road, then
    /// lower id.
    /// `Ordering::Less` means `self` ranks ahead of `other`.
    pub fn precedence(&self, other: &RoadPath) -> Ordering {
        other.priority.cmp(&self.priority)
            .then_with(|| other.source_length.total_cmp(&self.source_length))
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(id: u32, priority: i32, length: f64) -> RoadPath {
        RoadPath { id: PathId(id), priority, length, source_length: length, sections: Vec::new() }
    }

    #[test]
    fn priority_beats_length() {
        let x = path(0, 10, 150.0);
        let y = path(1, 5, 200.0);
        assert_eq!(x.precedence(&y), Ordering::Less);
        assert_eq!(y.precedence(&x), Ordering::Greater);
    }

    #[test]
    fn length_breaks_priority_ties() {
        let a = path(4, 5, 90.0);
        let b = path(2, 5, 120.0);
        assert_eq!(b.precedence(&a), Ordering::Less);
    }

    #[test]
    fn lower_id_breaks_full_ties() {
        let a = path(1, 5, 100.0);
        let b = path(2, 5, 100.0);
        assert_eq!(a.precedence(&b), Ordering::Less);
        assert_eq!(a.precedence(&a), Ordering::Equal);
    }

    #[test]
    fn split_pieces_rank_by_their_source_road() {
        let piece = RoadPath { length: 90.0, ..path(0, 5, 300.0) };
        let whole = path(1, 5, 250.0);
        assert_eq!(piece.precedence(&whole), Ordering::Less);
    }
}
