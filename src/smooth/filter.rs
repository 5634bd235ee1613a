//! Longitudinal low-pass filters over one elevation profile.

use std::f64::consts::PI;

/// Centred moving average over `2 * half + 1` samples. The window shrinks at
/// both ends instead of padding.
pub fn moving_average(values: &[f64], half: usize) -> Vec<f64> {
    let n = values.len();
    if half == 0 || n < 2 { return values.to_vec() }

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for &v in values { prefix.push(prefix[prefix.len() - 1] + v) }

    (0..n).map(|i| {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(n);
        (prefix[hi] - prefix[lo]) / (hi - lo) as f64
    }).collect()
}

/// One normalized second-order section (`a0 = 1`), transposed direct form II.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    /// Low-pass section at `cutoff` cycles per sample with quality `q`.
    pub fn lowpass(cutoff: f64, q: f64) -> Self {
        let w0 = 2.0 * PI * cutoff;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: 0.5 * (1.0 - cos) / a0,
            b1: (1.0 - cos) / a0,
            b2: 0.5 * (1.0 - cos) / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// Filter `signal` in place, starting from the steady state of its first
    /// sample.
    pub fn run(&self, signal: &mut [f64]) {
        let Some(&x0) = signal.first() else { return };
        let mut z2 = (self.b2 - self.a2) * x0;
        let mut z1 = (self.b1 - self.a1) * x0 + z2;
        for x in signal.iter_mut() {
            let y = self.b0 * *x + z1;
            z1 = self.b1 * *x - self.a1 * y + z2;
            z2 = self.b2 * *x - self.a2 * y;
            *x = y;
        }
    }
}

/// Butterworth low-pass of `order` (rounded up to an even number, at least
/// 2) as a cascade of second-order sections.
pub fn butterworth(order: usize, cutoff: f64) -> Vec<Biquad> {
    let order = order.max(2).next_multiple_of(2);
    (0..order / 2)
        .map(|k| {
            let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
            Biquad::lowpass(cutoff, 1.0 / (2.0 * theta.cos()))
        })
        .collect()
}

fn cascade(sections: &[Biquad], signal: &mut [f64]) {
    for section in sections { section.run(signal) }
}

/// Forward-backward Butterworth: the cascade runs once over the signal and
/// once over its reversal, and the two results are averaged. The result has
/// no phase lag and does not depend on the direction of travel.
///
/// A cutoff at or above Nyquist leaves the signal unchanged.
pub fn zero_phase(values: &[f64], order: usize, cutoff: f64) -> Vec<f64> {
    if values.len() < 3 || !(cutoff > 0.0 && cutoff < 0.5) { return values.to_vec() }
    let sections = butterworth(order, cutoff);

    let mut forward = values.to_vec();
    cascade(&sections, &mut forward);

    let mut backward = values.iter().rev().copied().collect::<Vec<_>>();
    cascade(&sections, &mut backward);
    backward.reverse();

    forward.iter().zip(&backward).map(|(f, b)| 0.5 * (f + b)).collect()
}
