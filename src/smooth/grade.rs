/// Limit the slope between consecutive samples to `max_slope` (rise per
/// metre). `spacing[i]` is the distance between samples `i` and `i + 1`.
///
/// Violations are relaxed symmetrically, alternating forward and backward
/// sweeps until nothing moves or `iterations` is reached. A final forward
/// sweep guarantees the bound.
pub fn clamp_grade(values: &mut [f64], spacing: &[f64], max_slope: f64, iterations: usize) {
    assert!(spacing.len() + 1 == values.len() || values.is_empty(), "one spacing per consecutive pair");
    let n = values.len();
    if n < 2 { return }

    let relax = |values: &mut [f64], i: usize| -> bool {
        let limit = max_slope * spacing[i];
        let diff = values[i + 1] - values[i];
        let excess = diff.abs() - limit;
        if excess <= 1e-12 { return false }
        let shift = 0.5 * excess * diff.signum();
        values[i] += shift;
        values[i + 1] -= shift;
        true
    };

    for _ in 0..iterations {
        let mut moved = false;
        for i in 0..n - 1 { moved |= relax(values, i) }
        for i in (0..n - 1).rev() { moved |= relax(values, i) }
        if !moved { break }
    }

    for i in 0..n - 1 {
        let limit = max_slope * spacing[i];
        values[i + 1] = values[i + 1].clamp(values[i] - limit, values[i] + limit);
    }
}
