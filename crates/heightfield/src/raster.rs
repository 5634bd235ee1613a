//! Rasterization of simple shapes into boolean masks.
//!
//! A cell is covered when its centre lies inside the shape.

use geo::Coord;
use ndarray::Array2;

use crate::grid::Georef;

/// Boolean raster aligned with a `Heightfield`.
pub type Mask = Array2<bool>;

/// Fill every cell whose centre lies inside `polygon` (even-odd rule).
///
/// The polygon is implicitly closed. Degenerate inputs (fewer than three
/// vertices, non-finite coordinates) mark nothing.
pub fn rasterize_polygon(mask: &mut Mask, georef: Georef, polygon: &[Coord<f64>]) {
    if polygon.len() < 3 || mask.is_empty() { return }
    if polygon.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) { return }

    let (rows, cols) = mask.dim();
    let (min_y, max_y) = polygon.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
    let Some((row_start, row_end)) = cell_span(min_y, max_y, georef.origin.y, georef.cell_size, rows) else { return };

    let mut crossings = Vec::with_capacity(polygon.len());
    for row in row_start..=row_end {
        let y = georef.origin.y + (row as f64 + 0.5) * georef.cell_size;

        crossings.clear();
        for (i, a) in polygon.iter().enumerate() {
            let b = polygon[(i + 1) % polygon.len()];
            // Half-open rule so shared vertices are counted once.
            if (a.y <= y) != (b.y <= y) {
                crossings.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for pair in crossings.chunks_exact(2) {
            let Some((col_start, col_end)) = cell_span(pair[0], pair[1], georef.origin.x, georef.cell_size, cols) else { continue };
            for col in col_start..=col_end { mask[(row, col)] = true }
        }
    }
}

/// Fill every cell whose centre lies within `radius` of segment `a`–`b`.
///
/// With `a == b` this stamps a disc.
pub fn rasterize_capsule(mask: &mut Mask, georef: Georef, a: Coord<f64>, b: Coord<f64>, radius: f64) {
    if mask.is_empty() || !(radius >= 0.0) { return }
    if !a.x.is_finite() || !a.y.is_finite() || !b.x.is_finite() || !b.y.is_finite() { return }

    let (rows, cols) = mask.dim();
    let Some((row_start, row_end)) = cell_span(a.y.min(b.y) - radius, a.y.max(b.y) + radius, georef.origin.y, georef.cell_size, rows) else { return };
    let Some((col_start, col_end)) = cell_span(a.x.min(b.x) - radius, a.x.max(b.x) + radius, georef.origin.x, georef.cell_size, cols) else { return };

    let radius_sq = radius * radius;
    for row in row_start..=row_end {
        for col in col_start..=col_end {
            let p = georef.cell_center(row, col);
            if segment_distance_sq(p, a, b) <= radius_sq { mask[(row, col)] = true }
        }
    }
}

/// Squared distance from `p` to segment `a`–`b`.
pub fn segment_distance_sq(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    let t = if len_sq > 0.0 {
        (((p - a).x * ab.x + (p - a).y * ab.y) / len_sq).clamp(0.0, 1.0)
    } else { 0.0 };
    let d = p - (a + ab * t);
    d.x * d.x + d.y * d.y
}

/// Inclusive range of cell indices along one axis whose centres fall inside
/// `[lo, hi]`, clipped to `0..len`.
fn cell_span(lo: f64, hi: f64, origin: f64, cell_size: f64, len: usize) -> Option<(usize, usize)> {
    if len == 0 || !(lo <= hi) { return None }
    let first = ((lo - origin) / cell_size - 0.5).ceil();
    let last = ((hi - origin) / cell_size - 0.5).floor();
    if last < 0.0 || first > (len - 1) as f64 || first > last { return None }
    Some((first.max(0.0) as usize, (last as usize).min(len - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn georef() -> Georef {
        Georef { origin: Coord { x: 0.0, y: 0.0 }, cell_size: 1.0 }
    }

    #[test]
    fn axis_aligned_square_covers_inner_centres() {
        let mut mask = Mask::from_elem((6, 6), false);
        let square = [
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 4.0, y: 1.0 },
            Coord { x: 4.0, y: 4.0 },
            Coord { x: 1.0, y: 4.0 },
        ];
        rasterize_polygon(&mut mask, georef(), &square);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 9);
        assert!(mask[(1, 1)] && mask[(3, 3)]);
        assert!(!mask[(0, 0)] && !mask[(4, 4)]);
    }

    #[test]
    fn polygon_outside_raster_marks_nothing() {
        let mut mask = Mask::from_elem((4, 4), false);
        let tri = [Coord { x: 10.0, y: 10.0 }, Coord { x: 12.0, y: 10.0 }, Coord { x: 11.0, y: 12.0 }];
        rasterize_polygon(&mut mask, georef(), &tri);
        assert!(mask.iter().all(|&m| !m));
    }

    #[test]
    fn polygon_is_clipped_to_raster() {
        let mut mask = Mask::from_elem((3, 3), false);
        let big = [
            Coord { x: -5.0, y: -5.0 },
            Coord { x: 5.0, y: -5.0 },
            Coord { x: 5.0, y: 5.0 },
            Coord { x: -5.0, y: 5.0 },
        ];
        rasterize_polygon(&mut mask, georef(), &big);
        assert!(mask.iter().all(|&m| m));
    }

    #[test]
    fn capsule_covers_segment_and_round_caps() {
        let mut mask = Mask::from_elem((10, 10), false);
        rasterize_capsule(&mut mask, georef(), Coord { x: 2.5, y: 5.5 }, Coord { x: 7.5, y: 5.5 }, 1.0);
        for col in 2..=7 { assert!(mask[(5, col)]) }
        assert!(mask[(4, 2)] && mask[(6, 7)]);
        assert!(mask[(5, 1)] && mask[(5, 8)]);
        assert!(!mask[(4, 1)] && !mask[(3, 5)]);
    }

    #[test]
    fn degenerate_capsule_is_a_disc() {
        let mut mask = Mask::from_elem((5, 5), false);
        let c = Coord { x: 2.5, y: 2.5 };
        rasterize_capsule(&mut mask, georef(), c, c, 1.0);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 5);
    }

    #[test]
    fn segment_distance_handles_projection_and_ends() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 4.0, y: 0.0 };
        assert_eq!(segment_distance_sq(Coord { x: 2.0, y: 3.0 }, a, b), 9.0);
        assert_eq!(segment_distance_sq(Coord { x: 7.0, y: 4.0 }, a, b), 25.0);
        assert_eq!(segment_distance_sq(Coord { x: 1.0, y: 1.0 }, a, a), 2.0);
    }
}
