use std::sync::OnceLock;

use crate::analysis::signal::{fill_gaps, kmh_to_mps};

use super::{
    Channel, Sample,
    validity::{LapValidity, LapValidityClassifier, SessionMedians, ValidityConfig},
};

// step assumed between samples without usable timestamps
const NOMINAL_STEP_S: f64 = 0.02;

/// An ordered run of samples sharing one lap index.
///
/// Laps are immutable once built. The only derived state is the invalidation
/// verdict, computed on first use and cached for the lifetime of the lap.
#[derive(Clone, Debug)]
pub struct Lap {
    index: u32,
    samples: Vec<Sample>,
    lap_time: f64,
    invalid: OnceLock<bool>,
}

impl Lap {
    /// Builds a lap, reading its raw lap time from the last finite
    /// [`Channel::LapTime`] value.
    pub fn new(index: u32, samples: Vec<Sample>) -> Self {
        let lap_time = samples
            .iter()
            .rev()
            .find_map(|s| s.get(Channel::LapTime))
            .unwrap_or(f64::NAN);
        Self::with_lap_time(index, samples, lap_time)
    }

    pub fn with_lap_time(index: u32, samples: Vec<Sample>, lap_time: f64) -> Self {
        Self {
            index,
            samples,
            lap_time,
            invalid: OnceLock::new(),
        }
    }

    /// 1-based lap index.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Lap time as read from the data. May be NaN.
    pub fn lap_time(&self) -> f64 {
        self.lap_time
    }

    /// The raw lap time when it is finite and positive, otherwise the span
    /// between the first and last finite timestamps.
    pub fn lap_time_safe(&self) -> f64 {
        if self.lap_time.is_finite() && self.lap_time > 0.0 {
            return self.lap_time;
        }
        let first = self.samples.iter().map(Sample::timestamp).find(|t| t.is_finite());
        let last = self
            .samples
            .iter()
            .rev()
            .map(Sample::timestamp)
            .find(|t| t.is_finite());
        match (first, last) {
            (Some(first), Some(last)) => last - first,
            _ => f64::NAN,
        }
    }

    /// Span of the finite distance values in meters. NaN without distance data.
    pub fn lap_distance(&self) -> f64 {
        let (min, max) = self
            .samples
            .iter()
            .map(Sample::distance)
            .filter(|d| d.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            });
        if min.is_finite() { max - min } else { f64::NAN }
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.samples.iter().map(Sample::timestamp).collect()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.samples.iter().map(Sample::distance).collect()
    }

    /// Per-sample values of a channel, NaN where missing.
    pub fn channel_series(&self, channel: Channel) -> Vec<f64> {
        self.samples.iter().map(|s| s.value(channel)).collect()
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.samples.iter().any(|s| s.has(channel))
    }

    /// Distance along the lap for every sample.
    ///
    /// When most samples carry a recorded distance the gaps are interpolated.
    /// Otherwise distance is integrated from speed over time, starting at 0.
    pub fn distance_axis(&self) -> Vec<f64> {
        let recorded = self.distances();
        let known = recorded.iter().filter(|d| d.is_finite()).count();
        if known * 2 > recorded.len() {
            return fill_gaps(&recorded);
        }

        let speed = fill_gaps(&self.channel_series(Channel::Speed));
        let times = self.timestamps();
        let mut travelled = 0.0;
        let mut axis = Vec::with_capacity(self.samples.len());
        for i in 0..self.samples.len() {
            if i > 0 {
                let dt = times[i] - times[i - 1];
                let dt = if dt.is_finite() && dt > 0.0 { dt } else { NOMINAL_STEP_S };
                let v = kmh_to_mps((speed[i - 1] + speed[i]) / 2.0);
                if v.is_finite() {
                    travelled += v.max(0.0) * dt;
                }
            }
            axis.push(travelled);
        }
        axis
    }

    /// Whether any invalidation heuristic fires, using the default thresholds.
    /// Computed once and cached.
    pub fn is_invalid(&self) -> bool {
        *self
            .invalid
            .get_or_init(|| LapValidityClassifier::default().is_invalid(self))
    }

    /// Classifies this lap against the rest of its session.
    pub fn validity_status(&self, session: &[Lap]) -> LapValidity {
        let medians = SessionMedians::from_laps(session);
        LapValidityClassifier::new(ValidityConfig::default()).status(self, &medians)
    }
}
