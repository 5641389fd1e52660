use log::debug;
use serde::{Deserialize, Serialize};

use super::signal::{self, fill_gaps, median_filter, moving_average};
use crate::telemetry::{Channel, Lap};

const SPEED_SMOOTHING: usize = 11;
const FALLBACK_SMOOTHING: usize = 21;
// Slack when locating the speed peak between two apexes
const PEAK_TOLERANCE_KMH: f64 = 0.05;

/// One corner as three positions along the lap, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerSegment {
    pub id: u32,
    pub x_start: f64,
    pub x_apex: f64,
    pub x_end: f64,
}

impl CornerSegment {
    pub fn length(&self) -> f64 {
        self.x_end - self.x_start
    }
}

/// Thresholds for corner segmentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CornerConfig {
    pub median_window: usize,
    pub warmup_speed_kmh: f64,
    pub warmup_run: usize,
    pub pit_speed_kmh: f64,
    pub pit_run: usize,
    /// Tail share of the lap searched for a pit entry
    pub pit_scan_fraction: f64,
    pub apex_merge_samples: usize,
    pub exit_margin_low: f64,
    pub exit_margin_high: f64,
    pub exit_ramp_low_kmh: f64,
    pub exit_ramp_high_kmh: f64,
    pub steer_on_deg: f64,
    pub steer_off_deg: f64,
    pub debounce_samples: usize,
    pub min_samples: usize,
    pub min_speed_drop_kmh: f64,
    pub min_steer_samples: usize,
    pub min_length_m: f64,
    /// Below this many corners the simpler detector is tried as well
    pub fallback_below: usize,
    pub fallback_half_window: usize,
    pub fallback_min_drop_kmh: f64,
    pub fallback_min_gap_m: f64,
}

impl Default for CornerConfig {
    fn default() -> Self {
        Self {
            median_window: 5,
            warmup_speed_kmh: 40.0,
            warmup_run: 20,
            pit_speed_kmh: 35.0,
            pit_run: 20,
            pit_scan_fraction: 0.25,
            apex_merge_samples: 2,
            exit_margin_low: 0.10,
            exit_margin_high: 0.18,
            exit_ramp_low_kmh: 60.0,
            exit_ramp_high_kmh: 140.0,
            steer_on_deg: 3.5,
            steer_off_deg: 2.0,
            debounce_samples: 3,
            min_samples: 8,
            min_speed_drop_kmh: 7.5,
            min_steer_samples: 6,
            min_length_m: 8.0,
            fallback_below: 6,
            fallback_half_window: 8,
            fallback_min_drop_kmh: 3.0,
            fallback_min_gap_m: 80.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CornerState {
    OutsideCorner,
    InsideCorner,
}

/// Two-gate hysteresis used to find where a corner begins and ends.
///
/// A corner is entered as soon as speed is below the exit threshold or the
/// steering angle has been above the on-gate for `debounce` samples. It is
/// left once speed is back above the threshold and steering has been below
/// the off-gate for `debounce` samples. Without steering data the steering
/// gate always reads as off.
#[derive(Clone, Debug)]
pub struct CornerGate {
    state: CornerState,
    steer_on_count: usize,
    steer_off_count: usize,
    steer_on_deg: f64,
    steer_off_deg: f64,
    debounce: usize,
}

impl CornerGate {
    pub fn new(initial: CornerState, config: &CornerConfig) -> Self {
        Self {
            state: initial,
            steer_on_count: 0,
            steer_off_count: 0,
            steer_on_deg: config.steer_on_deg,
            steer_off_deg: config.steer_off_deg,
            debounce: config.debounce_samples.max(1),
        }
    }

    pub fn state(&self) -> CornerState {
        self.state
    }

    /// Feeds one sample; `steer_deg` is the absolute angle, `None` when the
    /// lap has no steering trace.
    pub fn step(&mut self, speed_below: bool, steer_deg: Option<f64>) -> CornerState {
        let steer_on = steer_deg.is_some_and(|s| s > self.steer_on_deg);
        let steer_off = steer_deg.is_none_or(|s| s < self.steer_off_deg);
        self.steer_on_count = if steer_on { self.steer_on_count + 1 } else { 0 };
        self.steer_off_count = if steer_off { self.steer_off_count + 1 } else { 0 };

        self.state = match self.state {
            CornerState::OutsideCorner
                if speed_below || self.steer_on_count >= self.debounce =>
            {
                self.steer_off_count = 0;
                CornerState::InsideCorner
            }
            CornerState::InsideCorner
                if !speed_below && self.steer_off_count >= self.debounce =>
            {
                self.steer_on_count = 0;
                CornerState::OutsideCorner
            }
            state => state,
        };
        self.state
    }
}

// Per-sample arrays the detectors work on.
struct Traces {
    x: Vec<f64>,
    raw_kmh: Vec<f64>,
    smooth_kmh: Vec<f64>,
    smooth_mps: Vec<f64>,
    steer: Option<Vec<f64>>,
}

// Candidate segment as sample indices.
#[derive(Clone, Copy, Debug)]
struct Span {
    start: usize,
    apex: usize,
    end: usize,
}

/// Splits a lap into corners from its speed trace and, when present, its
/// steering trace.
pub struct CornerDetector {
    config: CornerConfig,
}

impl Default for CornerDetector {
    fn default() -> Self {
        Self::new(CornerConfig::default())
    }
}

impl CornerDetector {
    pub fn new(config: CornerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CornerConfig {
        &self.config
    }

    /// Ordered, non-overlapping corners numbered from 1. Empty when the lap
    /// has no speed data.
    pub fn detect(&self, lap: &Lap) -> Vec<CornerSegment> {
        let Some(traces) = self.traces(lap) else {
            return Vec::new();
        };
        let (lo, hi) = self.search_window(&traces.smooth_kmh);

        let primary = self.detect_hysteretic(&traces, lo, hi);
        if primary.len() >= self.config.fallback_below {
            return primary;
        }
        let fallback = self.detect_minima(&traces, lo, hi);
        debug!(
            "Lap {}: {} corners from hysteresis, {} from speed minima",
            lap.index(),
            primary.len(),
            fallback.len()
        );
        if fallback.len() > primary.len() {
            fallback
        } else {
            primary
        }
    }

    fn traces(&self, lap: &Lap) -> Option<Traces> {
        let n = lap.len();
        let raw_kmh = fill_gaps(&lap.channel_series(Channel::Speed));
        if n < 3 || signal::all_nan(&raw_kmh) {
            return None;
        }
        let smooth_kmh = moving_average::<SPEED_SMOOTHING>(&median_filter(
            &raw_kmh,
            self.config.median_window,
        ));
        let smooth_mps = smooth_kmh.iter().map(|v| signal::kmh_to_mps(*v)).collect();

        let steer_abs = lap
            .channel_series(Channel::SteeringAngle)
            .into_iter()
            .map(f64::abs)
            .collect::<Vec<_>>();
        let steer_known = steer_abs.iter().filter(|s| s.is_finite()).count();
        let steer = (steer_known * 2 > n)
            .then(|| fill_gaps(&median_filter(&steer_abs, self.config.median_window)));

        Some(Traces {
            x: lap.distance_axis(),
            raw_kmh,
            smooth_kmh,
            smooth_mps,
            steer,
        })
    }

    /// Index range between the end of the out-lap warmup and the start of a
    /// pit entry. The full lap when either end is degenerate.
    fn search_window(&self, kmh: &[f64]) -> (usize, usize) {
        let n = kmh.len();
        let cfg = &self.config;

        let warm_end = (0..(n + 1).saturating_sub(cfg.warmup_run))
            .find(|&i| kmh[i..i + cfg.warmup_run].iter().all(|v| *v >= cfg.warmup_speed_kmh))
            .unwrap_or(0);

        let scan_from = warm_end.max(n.saturating_sub((n as f64 * cfg.pit_scan_fraction).ceil() as usize));
        let mut pit_start = n;
        let mut run = 0;
        for i in (scan_from..n).rev() {
            if kmh[i] <= cfg.pit_speed_kmh {
                run += 1;
                if run >= cfg.pit_run {
                    let mut start = i;
                    while start > warm_end && kmh[start - 1] <= cfg.pit_speed_kmh {
                        start -= 1;
                    }
                    pit_start = start;
                    break;
                }
            } else {
                run = 0;
            }
        }

        if pit_start <= warm_end + cfg.min_samples {
            (0, n)
        } else {
            (warm_end, pit_start)
        }
    }

    /// Local minima of `v` in `[lo, hi)`, plateau aware: a flat run whose
    /// neighbours on both sides are higher yields its middle index.
    fn apex_candidates(&self, v: &[f64], lo: usize, hi: usize) -> Vec<usize> {
        let mut minima: Vec<usize> = Vec::new();
        let mut i = lo + 1;
        while i + 1 < hi {
            if v[i] >= v[i - 1] {
                i += 1;
                continue;
            }
            let mut j = i;
            while j + 1 < hi && v[j + 1] == v[i] {
                j += 1;
            }
            if j + 1 < hi && v[j + 1] > v[i] {
                let apex = (i + j) / 2;
                match minima.last_mut() {
                    Some(last) if apex - *last <= self.config.apex_merge_samples => {
                        if v[apex] < v[*last] {
                            *last = apex;
                        }
                    }
                    _ => minima.push(apex),
                }
            }
            i = j + 1;
        }
        minima
    }

    fn exit_threshold_kmh(&self, apex_kmh: f64) -> f64 {
        let cfg = &self.config;
        let ramp = signal::clamp01(
            (apex_kmh - cfg.exit_ramp_low_kmh) / (cfg.exit_ramp_high_kmh - cfg.exit_ramp_low_kmh),
        );
        let margin = cfg.exit_margin_low + (cfg.exit_margin_high - cfg.exit_margin_low) * ramp;
        apex_kmh * (1.0 + margin)
    }

    // Walks away from the apex, up to the neighbouring apex, until the gate
    // leaves the corner. When it never does (the exit threshold sits above
    // the surrounding straight) the boundary is the first sample reaching
    // the speed peak of the path.
    fn walk<I>(&self, traces: &Traces, threshold: f64, mut path: I) -> Option<usize>
    where
        I: Iterator<Item = usize> + Clone,
    {
        let mut gate = CornerGate::new(CornerState::InsideCorner, &self.config);
        for k in path.clone() {
            let steer = traces.steer.as_ref().map(|s| s[k]);
            if gate.step(traces.smooth_kmh[k] < threshold, steer) == CornerState::OutsideCorner {
                return Some(k);
            }
        }
        let peak = path.clone().map(|k| traces.smooth_kmh[k]).fold(f64::NEG_INFINITY, f64::max);
        path.find(|&k| traces.smooth_kmh[k] >= peak - PEAK_TOLERANCE_KMH)
    }

    fn detect_hysteretic(&self, traces: &Traces, lo: usize, hi: usize) -> Vec<CornerSegment> {
        let cfg = &self.config;
        let apexes = self.apex_candidates(&traces.smooth_mps, lo, hi);
        let mut spans = Vec::new();
        for (n, &apex) in apexes.iter().enumerate() {
            let left = if n == 0 { lo } else { apexes[n - 1] };
            let right = apexes.get(n + 1).map_or(hi, |next| next + 1);
            let apex_kmh = traces.smooth_kmh[apex];
            let threshold = self.exit_threshold_kmh(apex_kmh);
            let start = self.walk(traces, threshold, (left..apex).rev()).unwrap_or(apex);
            let end = self.walk(traces, threshold, apex + 1..right).unwrap_or(apex);

            if end - start + 1 < cfg.min_samples {
                debug!("Rejecting apex at {apex}: only {} samples", end - start + 1);
                continue;
            }
            let drop = signal::max(&traces.smooth_kmh[start..=end]) - apex_kmh;
            if drop < cfg.min_speed_drop_kmh {
                debug!("Rejecting apex at {apex}: speed drop {drop:.1} km/h");
                continue;
            }
            if let Some(steer) = &traces.steer {
                let steering = steer[start..=end]
                    .iter()
                    .filter(|s| **s > cfg.steer_on_deg)
                    .count();
                if steering < cfg.min_steer_samples {
                    debug!("Rejecting apex at {apex}: {steering} steering samples");
                    continue;
                }
            }
            spans.push(Span { start, apex, end });
        }
        self.finalize(&traces.x, merge_overlapping(spans, &traces.x))
    }

    // Speed minima on a coarser trace. A minimum counts when it sits at
    // least `fallback_min_drop_kmh` below the lower of the two speed peaks
    // separating it from its neighbouring minima.
    fn detect_minima(&self, traces: &Traces, lo: usize, hi: usize) -> Vec<CornerSegment> {
        let cfg = &self.config;
        let v = moving_average::<FALLBACK_SMOOTHING>(&traces.raw_kmh);
        let half = cfg.fallback_half_window;

        let minima = (lo.max(1)..hi.saturating_sub(1))
            .filter(|&i| v[i] < v[i - 1] && v[i] <= v[i + 1])
            .collect::<Vec<_>>();

        let mut kept: Vec<Span> = Vec::new();
        for (n, &i) in minima.iter().enumerate() {
            let left = if n == 0 { lo } else { minima[n - 1] };
            let right = minima.get(n + 1).map_or(hi - 1, |next| *next);
            let drop = signal::max(&v[left..=i]).min(signal::max(&v[i..=right])) - v[i];
            if drop < cfg.fallback_min_drop_kmh {
                continue;
            }
            let start = i.saturating_sub(half).max(lo);
            let end = (i + half).min(hi - 1);
            let span = Span { start, apex: i, end };
            match kept.last_mut() {
                Some(last) if traces.x[i] - traces.x[last.apex] < cfg.fallback_min_gap_m => {
                    if v[i] < v[last.apex] {
                        *last = span;
                    }
                }
                _ => kept.push(span),
            }
        }
        self.finalize(&traces.x, merge_overlapping(kept, &traces.x))
    }

    fn finalize(&self, x: &[f64], mut merged: Vec<Merged>) -> Vec<CornerSegment> {
        merged.sort_by(|a, b| x[a.start].total_cmp(&x[b.start]));
        merged
            .into_iter()
            .map(|m| (x[m.start], m.x_apex, x[m.end]))
            .filter(|(start, _, end)| end - start >= self.config.min_length_m)
            .enumerate()
            .map(|(i, (x_start, x_apex, x_end))| CornerSegment {
                id: i as u32 + 1,
                x_start,
                x_apex,
                x_end,
            })
            .collect()
    }
}

// Segment after overlap merging; the apex is the mean of the merged apexes.
struct Merged {
    start: usize,
    end: usize,
    x_apex: f64,
    apexes: usize,
}

impl Merged {
    fn from(span: Span, x: &[f64]) -> Self {
        Self {
            start: span.start,
            end: span.end,
            x_apex: x[span.apex],
            apexes: 1,
        }
    }
}

fn merge_overlapping(mut spans: Vec<Span>, x: &[f64]) -> Vec<Merged> {
    spans.sort_by_key(|s| s.start);
    let mut merged: Vec<Merged> = Vec::new();
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => {
                last.end = last.end.max(span.end);
                last.x_apex = (last.x_apex * last.apexes as f64 + x[span.apex]) / (last.apexes + 1) as f64;
                last.apexes += 1;
            }
            _ => merged.push(Merged::from(span, x)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Sample;

    const STEP_M: f64 = 2.0;

    // Baseline speed with parabolic dips centred on the given sample indices.
    fn dipped_lap(n: usize, centres: &[usize], depth: f64, half_width: f64) -> Lap {
        dipped_lap_at(n, centres, depth, half_width, 150.0, STEP_M)
    }

    fn dipped_lap_at(
        n: usize,
        centres: &[usize],
        depth: f64,
        half_width: f64,
        baseline: f64,
        step_m: f64,
    ) -> Lap {
        let samples = (0..n)
            .map(|i| {
                let dip = centres
                    .iter()
                    .map(|c| {
                        let d = (i as f64 - *c as f64) / half_width;
                        if d.abs() < 1.0 { depth * (1.0 - d * d) } else { 0.0 }
                    })
                    .fold(0.0, f64::max);
                Sample::new(i as f64 * 0.05, i as f64 * step_m)
                    .with_value(Channel::Speed, baseline - dip)
            })
            .collect();
        Lap::new(1, samples)
    }

    fn assert_corners_at(corners: &[CornerSegment], centres: &[usize], step_m: f64) {
        assert_eq!(corners.len(), centres.len(), "{corners:?}");
        for (corner, centre) in corners.iter().zip(centres) {
            assert!((corner.x_apex - *centre as f64 * step_m).abs() <= 2.0 * step_m, "{corner:?}");
            assert!(corner.x_start < corner.x_apex && corner.x_apex < corner.x_end);
        }
        assert_eq!(
            corners.iter().map(|c| c.id).collect::<Vec<_>>(),
            (1..=centres.len() as u32).collect::<Vec<_>>()
        );
        assert!(corners.windows(2).all(|w| w[0].x_end < w[1].x_start));
    }

    #[test]
    fn test_three_dips_three_corners() {
        let lap = dipped_lap(600, &[100, 300, 500], 50.0, 25.0);
        assert_corners_at(&CornerDetector::default().detect(&lap), &[100, 300, 500], STEP_M);
    }

    #[test]
    fn test_shallow_dips_on_fast_straights() {
        // exit threshold of each apex is above the 150 km/h straight
        let lap = dipped_lap_at(500, &[100, 250, 400], 10.0, 10.0, 150.0, 1.0);
        let corners = CornerDetector::default().detect(&lap);
        assert_corners_at(&corners, &[100, 250, 400], 1.0);
        assert!(corners.iter().all(|c| c.length() < 50.0), "{corners:?}");

        let lap = dipped_lap_at(500, &[100, 250, 400], 12.0, 10.0, 120.0, 1.0);
        assert_corners_at(&CornerDetector::default().detect(&lap), &[100, 250, 400], 1.0);
    }

    #[test]
    fn test_smallest_separated_dips() {
        // 10 km/h deep, 20 samples wide, 110 m apart
        let lap = dipped_lap_at(360, &[60, 170, 280], 10.0, 10.0, 150.0, 1.0);
        assert_corners_at(&CornerDetector::default().detect(&lap), &[60, 170, 280], 1.0);
    }

    #[test]
    fn test_walk_without_exit_stops_at_speed_peak() {
        let lap = dipped_lap_at(500, &[100, 250, 400], 10.0, 10.0, 150.0, 1.0);
        let detector = CornerDetector::default();
        let traces = detector.traces(&lap).unwrap();
        let corners = detector.detect_hysteretic(&traces, 0, lap.len());
        assert_corners_at(&corners, &[100, 250, 400], 1.0);
    }

    #[test]
    fn test_speed_minima_drop_measured_against_neighbouring_peaks() {
        let lap = dipped_lap_at(500, &[100, 250, 400], 10.0, 10.0, 150.0, 1.0);
        let detector = CornerDetector::default();
        let traces = detector.traces(&lap).unwrap();
        let corners = detector.detect_minima(&traces, 0, lap.len());
        assert_corners_at(&corners, &[100, 250, 400], 1.0);
    }

    #[test]
    fn test_no_speed_no_corners() {
        let samples = (0..100).map(|i| Sample::new(i as f64, i as f64)).collect();
        assert!(CornerDetector::default().detect(&Lap::new(1, samples)).is_empty());
    }

    #[test]
    fn test_constant_speed_no_corners() {
        let lap = dipped_lap(300, &[], 0.0, 1.0);
        assert!(CornerDetector::default().detect(&lap).is_empty());
    }

    #[test]
    fn test_shallow_dip_rejected() {
        let lap = dipped_lap(400, &[200], 2.0, 25.0);
        assert!(CornerDetector::default().detect(&lap).is_empty());
    }

    #[test]
    fn test_exit_threshold_ramp() {
        let detector = CornerDetector::default();
        assert!((detector.exit_threshold_kmh(50.0) - 55.0).abs() < 1e-9);
        assert!((detector.exit_threshold_kmh(100.0) - 114.0).abs() < 1e-9);
        assert!((detector.exit_threshold_kmh(200.0) - 236.0).abs() < 1e-9);
    }

    #[test]
    fn test_plateau_minimum_yields_centre() {
        let detector = CornerDetector::default();
        let v = [5.0, 4.0, 3.0, 3.0, 3.0, 4.0, 5.0];
        assert_eq!(detector.apex_candidates(&v, 0, v.len()), vec![3]);
        let close = [5.0, 3.0, 4.0, 2.0, 5.0];
        assert_eq!(detector.apex_candidates(&close, 0, close.len()), vec![3]);
    }

    #[test]
    fn test_search_window_skips_outlap_and_pit_entry() {
        let detector = CornerDetector::default();
        let mut kmh = vec![20.0; 30];
        kmh.extend(vec![150.0; 200]);
        kmh.extend(vec![30.0; 40]);
        assert_eq!(detector.search_window(&kmh), (30, 230));
        assert_eq!(detector.search_window(&[150.0; 100]), (0, 100));
    }

    #[test]
    fn test_gate_enters_on_speed() {
        let config = CornerConfig::default();
        let mut gate = CornerGate::new(CornerState::OutsideCorner, &config);
        assert_eq!(gate.step(true, None), CornerState::InsideCorner);
    }

    #[test]
    fn test_gate_steering_entry_is_debounced() {
        let config = CornerConfig::default();
        let mut gate = CornerGate::new(CornerState::OutsideCorner, &config);
        assert_eq!(gate.step(false, Some(10.0)), CornerState::OutsideCorner);
        assert_eq!(gate.step(false, Some(10.0)), CornerState::OutsideCorner);
        assert_eq!(gate.step(false, Some(1.0)), CornerState::OutsideCorner);
        assert_eq!(gate.step(false, Some(10.0)), CornerState::OutsideCorner);
        assert_eq!(gate.step(false, Some(10.0)), CornerState::OutsideCorner);
        assert_eq!(gate.step(false, Some(10.0)), CornerState::InsideCorner);
    }

    #[test]
    fn test_gate_exit_needs_speed_and_steering() {
        let config = CornerConfig::default();
        let mut gate = CornerGate::new(CornerState::InsideCorner, &config);
        // speed recovered but still steering
        for _ in 0..5 {
            assert_eq!(gate.step(false, Some(5.0)), CornerState::InsideCorner);
        }
        // between the gates: neither on nor off
        assert_eq!(gate.step(false, Some(3.0)), CornerState::InsideCorner);
        assert_eq!(gate.step(false, Some(1.0)), CornerState::InsideCorner);
        assert_eq!(gate.step(false, Some(1.0)), CornerState::InsideCorner);
        assert_eq!(gate.step(false, Some(1.0)), CornerState::OutsideCorner);
    }

    #[test]
    fn test_gate_without_steering_exits_on_speed() {
        let config = CornerConfig::default();
        let mut gate = CornerGate::new(CornerState::InsideCorner, &config);
        for _ in 0..4 {
            assert_eq!(gate.step(true, None), CornerState::InsideCorner);
        }
        assert_eq!(gate.step(false, None), CornerState::OutsideCorner);
    }

    #[test]
    fn test_steering_filter_rejects_straight_line_braking() {
        let base = dipped_lap(600, &[100, 300, 500], 50.0, 25.0);
        let samples = base
            .samples()
            .iter()
            .map(|s| s.clone().with_value(Channel::SteeringAngle, 0.5))
            .collect();
        let lap = Lap::new(1, samples);
        // the hysteresis pass rejects all three, the fallback keeps them
        let detector = CornerDetector::default();
        let traces = detector.traces(&lap).unwrap();
        assert!(detector.detect_hysteretic(&traces, 0, lap.len()).is_empty());
        assert_eq!(detector.detect(&lap).len(), 3);
    }
}
