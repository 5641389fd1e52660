use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::analysis::signal;

use super::{Channel, Lap, Sample};

/// Outcome of classifying a lap against its session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LapValidity {
    /// Out lap, in lap, aborted lap or otherwise too short to be a full lap
    NotFinished,
    /// Complete, but an invalidation heuristic fired
    Invalid,
    Valid,
}

impl fmt::Display for LapValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LapValidity::NotFinished => write!(f, "not finished"),
            LapValidity::Invalid => write!(f, "invalid"),
            LapValidity::Valid => write!(f, "valid"),
        }
    }
}

/// Thresholds used by the lap validity heuristics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityConfig {
    /// Any |value| above this on the invalidation channel invalidates the lap
    pub invalidation_epsilon: f64,
    pub off_track_min_tires: f64,
    pub off_track_min_run: usize,
    pub flag_min_run: usize,
    pub in_pit_threshold: f64,
    /// Fraction of samples ignored at each end of the lap for the pit check
    pub pit_edge_fraction: f64,
    pub min_samples: usize,
    pub min_lap_time_s: f64,
    pub min_lap_distance_m: f64,
    pub median_time_ratio: f64,
    pub median_distance_ratio: f64,
}

impl Default for ValidityConfig {
    fn default() -> Self {
        Self {
            invalidation_epsilon: 0.001,
            off_track_min_tires: 3.0,
            off_track_min_run: 4,
            flag_min_run: 5,
            in_pit_threshold: 0.5,
            pit_edge_fraction: 0.10,
            min_samples: 2,
            min_lap_time_s: 5.0,
            min_lap_distance_m: 50.0,
            median_time_ratio: 0.7,
            median_distance_ratio: 0.6,
        }
    }
}

/// Session-wide reference values used by the completeness test.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionMedians {
    pub lap_time: Option<f64>,
    pub lap_distance: Option<f64>,
}

impl SessionMedians {
    /// Medians of the safe lap time and lap distance over laps with at least
    /// two samples and a positive value.
    pub fn from_laps(laps: &[Lap]) -> Self {
        let candidates = laps.iter().filter(|l| l.len() >= 2);
        let times = candidates
            .clone()
            .map(Lap::lap_time_safe)
            .filter(|t| t.is_finite() && *t > 0.0)
            .collect::<Vec<_>>();
        let distances = candidates
            .map(Lap::lap_distance)
            .filter(|d| d.is_finite() && *d > 0.0)
            .collect::<Vec<_>>();
        Self {
            lap_time: signal::median(&times),
            lap_distance: signal::median(&distances),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LapValidityClassifier {
    config: ValidityConfig,
}

impl LapValidityClassifier {
    pub fn new(config: ValidityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidityConfig {
        &self.config
    }

    /// True when any invalidation heuristic fires on the lap.
    pub fn is_invalid(&self, lap: &Lap) -> bool {
        let samples = lap.samples();
        let cfg = &self.config;

        if samples
            .iter()
            .filter_map(|s| s.get(Channel::LapInvalidated))
            .any(|v| v.abs() > cfg.invalidation_epsilon)
        {
            debug!("Lap {}: explicit invalidation flag", lap.index());
            return true;
        }

        let off_track_run = longest_run(samples, |s| {
            s.get(Channel::TiresOffTrack)
                .is_some_and(|v| v >= cfg.off_track_min_tires)
        });
        if off_track_run >= cfg.off_track_min_run {
            debug!(
                "Lap {}: tires off track for {} samples",
                lap.index(),
                off_track_run
            );
            return true;
        }

        let flag_run = longest_run(samples, |s| s.get(Channel::Flags).is_some_and(|v| v != 0.0));
        if flag_run >= cfg.flag_min_run {
            debug!("Lap {}: flag raised for {} samples", lap.index(), flag_run);
            return true;
        }

        let edge = (samples.len() as f64 * cfg.pit_edge_fraction).floor() as usize;
        let central = samples
            .get(edge..samples.len().saturating_sub(edge))
            .unwrap_or_default();
        if central
            .iter()
            .filter_map(|s| s.get(Channel::InPit))
            .any(|v| v > cfg.in_pit_threshold)
        {
            debug!("Lap {}: pit visit mid-lap", lap.index());
            return true;
        }

        false
    }

    /// True when the lap is too short, too incomplete or too far below the
    /// session medians to count as a finished lap.
    pub fn is_not_finished(&self, lap: &Lap, medians: &SessionMedians) -> bool {
        let cfg = &self.config;
        if lap.len() < cfg.min_samples {
            return true;
        }

        let time = lap.lap_time_safe();
        let distance = lap.lap_distance();
        let has_time = time.is_finite() && time > 0.0;
        let has_distance = distance.is_finite() && distance > 0.0;
        if !has_time && !has_distance {
            return true;
        }
        if has_time && time < cfg.min_lap_time_s {
            return true;
        }
        if has_distance && distance < cfg.min_lap_distance_m {
            return true;
        }
        if let Some(median) = medians.lap_time
            && has_time
            && time < cfg.median_time_ratio * median
        {
            return true;
        }
        if let Some(median) = medians.lap_distance
            && has_distance
            && distance < cfg.median_distance_ratio * median
        {
            return true;
        }
        false
    }

    pub fn status(&self, lap: &Lap, medians: &SessionMedians) -> LapValidity {
        if self.is_not_finished(lap, medians) {
            return LapValidity::NotFinished;
        }
        // the lap caches its own verdict for the default thresholds
        let invalid = if self.config == ValidityConfig::default() {
            lap.is_invalid()
        } else {
            self.is_invalid(lap)
        };
        if invalid {
            LapValidity::Invalid
        } else {
            LapValidity::Valid
        }
    }

    /// Classifies every lap of a session, computing the medians once.
    pub fn classify_session(&self, laps: &[Lap]) -> Vec<LapValidity> {
        let medians = SessionMedians::from_laps(laps);
        laps.iter().map(|l| self.status(l, &medians)).collect()
    }
}

fn longest_run(samples: &[Sample], predicate: impl Fn(&Sample) -> bool) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for sample in samples {
        if predicate(sample) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lap_with(index: u32, n: usize, f: impl Fn(usize, Sample) -> Sample) -> Lap {
        let samples = (0..n)
            .map(|i| f(i, Sample::new(i as f64 * 0.5, i as f64 * 20.0)))
            .collect();
        Lap::new(index, samples)
    }

    fn timed_lap(index: u32, lap_time: f64) -> Lap {
        let samples = (0..50)
            .map(|i| Sample::new(i as f64 * lap_time / 49.0, i as f64 * 100.0))
            .collect();
        Lap::with_lap_time(index, samples, lap_time)
    }

    fn off_track_lap(run: usize) -> Lap {
        lap_with(1, 100, |i, s| {
            let tires = if (40..40 + run).contains(&i) { 3.0 } else { 0.0 };
            s.with_value(Channel::TiresOffTrack, tires)
        })
    }

    #[test]
    fn test_off_track_boundary() {
        assert!(off_track_lap(4).is_invalid());
        assert!(!off_track_lap(3).is_invalid());
    }

    #[test]
    fn test_two_tires_off_is_tolerated() {
        let lap = lap_with(1, 100, |_, s| s.with_value(Channel::TiresOffTrack, 2.0));
        assert!(!lap.is_invalid());
    }

    #[test]
    fn test_explicit_invalidation() {
        let lap = lap_with(1, 100, |i, s| {
            s.with_value(Channel::LapInvalidated, if i == 99 { 1.0 } else { 0.0 })
        });
        assert!(lap.is_invalid());
        let tiny = lap_with(1, 100, |_, s| s.with_value(Channel::LapInvalidated, 0.0005));
        assert!(!tiny.is_invalid());
    }

    #[test]
    fn test_flag_run_boundary() {
        let flagged = |run: usize| {
            lap_with(1, 100, move |i, s| {
                s.with_value(Channel::Flags, if (10..10 + run).contains(&i) { 2.0 } else { 0.0 })
            })
        };
        assert!(flagged(5).is_invalid());
        assert!(!flagged(4).is_invalid());
    }

    #[test]
    fn test_pit_edges_are_ignored() {
        let outlap = lap_with(1, 100, |i, s| {
            s.with_value(Channel::InPit, if i < 10 || i >= 90 { 1.0 } else { 0.0 })
        });
        assert!(!outlap.is_invalid());

        let drive_through = lap_with(1, 100, |i, s| {
            s.with_value(Channel::InPit, if i == 50 { 1.0 } else { 0.0 })
        });
        assert!(drive_through.is_invalid());
    }

    #[test]
    fn test_median_completeness() {
        let laps: Vec<Lap> = [90.0, 91.0, 92.0, 93.0, 9.0]
            .iter()
            .enumerate()
            .map(|(i, t)| timed_lap(i as u32 + 1, *t))
            .collect();

        let medians = SessionMedians::from_laps(&laps);
        assert_eq!(medians.lap_time, Some(91.0));

        assert_eq!(laps[4].validity_status(&laps), LapValidity::NotFinished);
        assert_eq!(laps[0].validity_status(&laps), LapValidity::Valid);
    }

    #[test]
    fn test_not_finished_rules() {
        let classifier = LapValidityClassifier::default();
        let medians = SessionMedians::default();

        let single = Lap::new(1, vec![Sample::new(0.0, 0.0)]);
        assert!(classifier.is_not_finished(&single, &medians));

        let blind = Lap::new(1, vec![Sample::default(), Sample::default()]);
        assert!(classifier.is_not_finished(&blind, &medians));

        let short_time = timed_lap(1, 4.0);
        assert!(classifier.is_not_finished(&short_time, &medians));

        let short_distance = lap_with(1, 3, |_, s| s);
        assert!(classifier.is_not_finished(&short_distance, &medians));

        let distance_only = Lap::new(
            1,
            (0..10).map(|i| Sample::new(f64::NAN, i as f64 * 100.0)).collect(),
        );
        assert!(!classifier.is_not_finished(&distance_only, &medians));
    }

    #[test]
    fn test_distance_median_completeness() {
        let mut laps: Vec<Lap> = (0..4).map(|i| timed_lap(i + 1, 90.0)).collect();
        // same time, but covers a third of the distance
        let samples = (0..50)
            .map(|i| Sample::new(i as f64 * 90.0 / 49.0, i as f64 * 30.0))
            .collect();
        laps.push(Lap::with_lap_time(5, samples, 90.0));
        let statuses = LapValidityClassifier::default().classify_session(&laps);
        assert_eq!(statuses[4], LapValidity::NotFinished);
        assert!(statuses[..4].iter().all(|s| *s == LapValidity::Valid));
    }

    #[test]
    fn test_custom_config_is_not_cached() {
        let lap = off_track_lap(4);
        let lenient = LapValidityClassifier::new(ValidityConfig {
            off_track_min_run: 10,
            ..ValidityConfig::default()
        });
        assert!(!lenient.is_invalid(&lap));
        assert!(lap.is_invalid());
        let medians = SessionMedians::default();
        assert_eq!(lenient.status(&lap, &medians), LapValidity::Valid);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_off_track_run_threshold(run in 0usize..20) {
            let lap = off_track_lap(run);
            prop_assert_eq!(lap.is_invalid(), run >= 4);
        }
    }
}
