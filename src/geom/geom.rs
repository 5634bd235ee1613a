use geo::{Coord, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// An item's envelope, tagged with the item's index.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl Entry {
    fn new(idx: usize, bbox: Rect<f64>) -> Self {
        Self { idx, envelope: AABB::from_corners(bbox.min().into(), bbox.max().into()) }
    }

    #[inline] pub(crate) fn idx(&self) -> usize { self.idx }
}

impl RTreeObject for Entry {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope { self.envelope }
}

/// R-tree over the bounding boxes of indexed items (points, segments).
#[derive(Debug, Clone)]
pub(crate) struct SpatialIndex {
    rtree: RTree<Entry>,
}

impl SpatialIndex {
    pub(crate) fn new(items: impl IntoIterator<Item = (usize, Rect<f64>)>) -> Self {
        Self {
            rtree: RTree::bulk_load(items.into_iter().map(|(i, bbox)| Entry::new(i, bbox)).collect()),
        }
    }

    /// Index of single points.
    pub(crate) fn points(points: impl IntoIterator<Item = (usize, Coord<f64>)>) -> Self {
        Self {
            rtree: RTree::bulk_load(points.into_iter().map(|(i, p)| Entry::new(i, Rect::new(p, p))).collect()),
        }
    }

    /// Query the R-tree for bounding boxes intersecting the given envelope.
    #[inline]
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = &Entry> {
        self.rtree.locate_in_envelope_intersecting(envelope)
    }

    /// Items whose bounding box comes within `radius` of `p` on both axes.
    /// Candidates only: callers measure the exact distance.
    pub(crate) fn around(&self, p: Coord<f64>, radius: f64) -> impl Iterator<Item = usize> + '_ {
        let envelope = AABB::from_corners([p.x - radius, p.y - radius], [p.x + radius, p.y + radius]);
        self.rtree.locate_in_envelope_intersecting(&envelope).map(|b| b.idx())
    }

    /// Nearest item to `p` within `radius` among those accepted by `filter`,
    /// with its distance as given by `distance`. Ties go to the lower index.
    pub(crate) fn nearest_within(&self,
        p: Coord<f64>,
        radius: f64,
        distance: impl Fn(usize) -> f64,
        filter: impl Fn(usize) -> bool,
    ) -> Option<(usize, f64)> {
        self.around(p, radius)
            .filter(|&i| filter(i))
            .map(|i| (i, distance(i)))
            .filter(|&(_, d)| d <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
    }
}
