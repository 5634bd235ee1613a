//! Small vector helpers over `geo::Coord`.

use geo::Coord;

#[inline]
pub(crate) fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.x + a.y * b.y }

#[inline]
pub(crate) fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 { a.x * b.y - a.y * b.x }

#[inline]
pub(crate) fn norm(a: Coord<f64>) -> f64 { a.x.hypot(a.y) }

#[inline]
pub(crate) fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 { norm(b - a) }

#[inline]
pub(crate) fn is_finite(a: Coord<f64>) -> bool { a.x.is_finite() && a.y.is_finite() }

/// Unit vector along `a`, or `None` for a (near) zero vector.
#[inline]
pub(crate) fn normalize(a: Coord<f64>) -> Option<Coord<f64>> {
    let n = norm(a);
    (n > 1e-12).then(|| a / n)
}

/// Total length of a polyline.
pub(crate) fn polyline_length(points: &[Coord<f64>]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Unit tangents of a polyline by central differences (one-sided at the
/// ends). Degenerate spots inherit the previous tangent; a fully degenerate
/// line points along +x.
pub(crate) fn tangents(points: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let n = points.len();
    let mut out = Vec::with_capacity(n);
    let mut last = Coord { x: 1.0, y: 0.0 };
    for i in 0..n {
        let prev = points[i.saturating_sub(1)];
        let next = points[(i + 1).min(n - 1)];
        if let Some(t) = normalize(next - prev) { last = t }
        out.push(last);
    }
    // Leading degenerate points take the first real direction.
    if let Some(first) = (0..n).find(|&i| normalize(points[(i + 1).min(n - 1)] - points[i.saturating_sub(1)]).is_some()) {
        let fill = out[first];
        out[..first].fill(fill);
    }
    out
}
