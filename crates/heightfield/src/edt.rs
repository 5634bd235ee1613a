//! Exact Euclidean distance transform.
//!
//! Separable two-pass algorithm of Felzenszwalb & Huttenlocher: a 1-D lower
//! envelope of parabolas along every row, then along every column of the
//! intermediate result. Linear in the number of cells; each pass is
//! parallel over its lines.

use ndarray::{parallel::prelude::*, Array1, Array2, Axis};

/// Distance (in world units) from every cell centre to the nearest `true`
/// cell centre of `mask`.
///
/// Cells inside the mask are `0.0`. With an empty mask every cell is
/// `f64::INFINITY`.
pub fn distance_field(mask: &Array2<bool>, cell_size: f64) -> Array2<f64> {
    let mut field = mask.mapv(|inside| if inside { 0.0 } else { f64::INFINITY });
    if field.is_empty() { return field }

    // Rows, then columns.
    for axis in [Axis(0), Axis(1)] {
        field.axis_iter_mut(axis).into_par_iter().for_each(|mut lane| {
            let input = lane.to_vec();
            lane.assign(&Array1::from(squared_distance_1d(&input)));
        });
    }

    field.mapv_inplace(|d2| if d2.is_finite() { d2.sqrt() * cell_size } else { f64::INFINITY });
    field
}

/// Squared 1-D distance transform of a sampled function `f`.
///
/// `f[q]` is the cost of site `q` (`INFINITY` for "no site"); the result is
/// `min_p ((q - p)² + f[p])` for every `q`.
pub fn squared_distance_1d(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    let mut out = vec![f64::INFINITY; n];

    // Lower envelope: parabola roots `v` and boundaries `z`.
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];
    let mut k = 0usize;
    let mut sites = 0usize;

    for q in 0..n {
        if !f[q].is_finite() { continue }
        if sites == 0 {
            v[0] = q;
            z[0] = f64::NEG_INFINITY;
            z[1] = f64::INFINITY;
            sites = 1;
            continue;
        }

        // z[0] is -inf, so the pop loop never runs past the first parabola.
        let mut s = intersection(f, v[k], q);
        while s <= z[k] {
            k -= 1;
            s = intersection(f, v[k], q);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
        sites += 1;
    }

    if sites == 0 { return out }

    let mut j = 0usize;
    for (q, slot) in out.iter_mut().enumerate() {
        while z[j + 1] < q as f64 { j += 1 }
        let p = v[j];
        let d = q as f64 - p as f64;
        *slot = d * d + f[p];
    }
    out
}

/// Abscissa where the parabolas rooted at `p` and `q` intersect.
#[inline]
fn intersection(f: &[f64], p: usize, q: usize) -> f64 {
    let (pf, qf) = (p as f64, q as f64);
    ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * (qf - pf))
}
