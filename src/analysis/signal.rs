//! Numeric helpers shared by the analyses.
//!
//! Everything here treats NaN as "missing": reductions skip it and return NaN
//! when nothing finite is left, never 0.

use std::iter;

use itertools::Itertools;
use simple_moving_average::{SMA, SumTreeSMA};
use uom::si::{
    f64::Velocity,
    velocity::{kilometer_per_hour, meter_per_second},
};

fn finite(values: &[f64]) -> impl Iterator<Item = f64> + Clone + '_ {
    values.iter().copied().filter(|v| v.is_finite())
}

pub fn all_nan(values: &[f64]) -> bool {
    values.iter().all(|v| !v.is_finite())
}

pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = finite(values).fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

pub fn max(values: &[f64]) -> f64 {
    finite(values).reduce(f64::max).unwrap_or(f64::NAN)
}

pub fn min(values: &[f64]) -> f64 {
    finite(values).reduce(f64::min).unwrap_or(f64::NAN)
}

/// Population standard deviation of the finite values.
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    let (sum, count) = finite(values).fold((0.0, 0usize), |(s, c), v| (s + (v - m).powi(2), c + 1));
    (sum / count as f64).sqrt()
}

/// Classic median: middle element for odd lengths, mean of the two middle
/// elements for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = finite(values).sorted_by(f64::total_cmp).collect_vec();
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

/// Quantile with linear interpolation between closest ranks. `q` is clamped
/// to [0, 1]. NaN when there is nothing finite.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let sorted = finite(values).sorted_by(f64::total_cmp).collect_vec();
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = clamp01(q) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Hermite smoothstep of `x` between the two edges.
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 <= edge0 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = clamp01((x - edge0) / (edge1 - edge0));
    t * t * (3.0 - 2.0 * t)
}

pub fn kmh_to_mps(kmh: f64) -> f64 {
    Velocity::new::<kilometer_per_hour>(kmh).get::<meter_per_second>()
}

pub fn mps_to_kmh(mps: f64) -> f64 {
    Velocity::new::<meter_per_second>(mps).get::<kilometer_per_hour>()
}

/// Multiplier that brings a pedal-like series to percent: inputs whose
/// finite maximum is at most 1 are assumed to be 0..1.
pub fn percent_scale(values: &[f64]) -> f64 {
    let peak = max(values);
    if peak.is_finite() && peak <= 1.0 { 100.0 } else { 1.0 }
}

/// Replaces NaN runs by linear interpolation between their finite
/// neighbours; leading and trailing runs copy the nearest finite value.
pub fn fill_gaps(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    let known = values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, _)| i)
        .collect_vec();
    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        return out;
    };
    out[..first].fill(values[first]);
    out[last + 1..].fill(values[last]);
    for (a, b) in known.iter().copied().tuple_windows() {
        if b - a > 1 {
            let (va, vb) = (values[a], values[b]);
            for (k, slot) in out[a + 1..b].iter_mut().enumerate() {
                let t = (k + 1) as f64 / (b - a) as f64;
                *slot = va + (vb - va) * t;
            }
        }
    }
    out
}

/// Centred median filter. The window shrinks at the edges; NaN entries are
/// ignored and a window with nothing finite yields NaN.
pub fn median_filter(values: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(values.len());
            median(&values[lo..hi]).unwrap_or(f64::NAN)
        })
        .collect()
}

/// Centred moving average over an odd window `W`, padding both ends by
/// repeating the edge values. Expects finite input (see [`fill_gaps`]).
pub fn moving_average<const W: usize>(values: &[f64]) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
        return Vec::new();
    };
    let half = W / 2;
    let padded = iter::repeat_n(first, half)
        .chain(values.iter().copied())
        .chain(iter::repeat_n(last, half));

    let mut sma = SumTreeSMA::<f64, f64, W>::new();
    let mut out = Vec::with_capacity(values.len());
    for (i, v) in padded.enumerate() {
        sma.add_sample(v);
        if i + 1 >= W {
            out.push(sma.get_average());
        }
    }
    out
}

/// Monotone piecewise cubic interpolant (Fritsch-Carlson). Never overshoots
/// the data, so elapsed time stays monotone in distance.
#[derive(Clone, Debug)]
pub struct MonotoneCubic {
    xs: Vec<f64>,
    ys: Vec<f64>,
    tangents: Vec<f64>,
}

impl MonotoneCubic {
    /// Builds from paired points. Non-finite pairs and points whose x does
    /// not strictly increase are skipped. Needs at least two usable points.
    pub fn new(xs: &[f64], ys: &[f64]) -> Option<Self> {
        let mut px: Vec<f64> = Vec::with_capacity(xs.len());
        let mut py: Vec<f64> = Vec::with_capacity(ys.len());
        for (&x, &y) in xs.iter().zip(ys) {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            if px.last().is_some_and(|&prev| x <= prev) {
                continue;
            }
            px.push(x);
            py.push(y);
        }
        let n = px.len();
        if n < 2 {
            return None;
        }

        let deltas = px
            .iter()
            .tuple_windows()
            .zip(py.iter().tuple_windows())
            .map(|((x0, x1), (y0, y1))| (y1 - y0) / (x1 - x0))
            .collect_vec();

        let mut tangents = vec![0.0; n];
        tangents[0] = deltas[0];
        tangents[n - 1] = deltas[n - 2];
        for k in 1..n - 1 {
            let (d0, d1) = (deltas[k - 1], deltas[k]);
            tangents[k] = if d0 * d1 <= 0.0 { 0.0 } else { (d0 + d1) / 2.0 };
        }
        for (k, &d) in deltas.iter().enumerate() {
            if d == 0.0 {
                tangents[k] = 0.0;
                tangents[k + 1] = 0.0;
                continue;
            }
            let a = tangents[k] / d;
            let b = tangents[k + 1] / d;
            let s = a * a + b * b;
            if s > 9.0 {
                let t = 3.0 / s.sqrt();
                tangents[k] = t * a * d;
                tangents[k + 1] = t * b * d;
            }
        }

        Some(Self {
            xs: px,
            ys: py,
            tangents,
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Interpolated value at `x`; NaN outside the data range.
    pub fn eval(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        if !(lo..=hi).contains(&x) {
            return f64::NAN;
        }
        let k = self
            .xs
            .partition_point(|&v| v <= x)
            .saturating_sub(1)
            .min(self.xs.len() - 2);
        let h = self.xs[k + 1] - self.xs[k];
        let t = (x - self.xs[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        h00 * self.ys[k] + h10 * h * self.tangents[k] + h01 * self.ys[k + 1] + h11 * h * self.tangents[k + 1]
    }
}
