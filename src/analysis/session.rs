use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{
    force_stats::ForceConfig,
    lap_stats::{LapAnalysis, LapStats},
    signal,
};
use crate::telemetry::{Lap, LapValidity, LapValidityClassifier, SessionMedians, ValidityConfig};

/// Session level counts and headline times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub laps: usize,
    pub valid: usize,
    pub invalid: usize,
    pub not_finished: usize,
    pub best_lap: Option<u32>,
    pub best_lap_time: Option<f64>,
    pub median_lap_time: Option<f64>,
}

/// Session wide views over a list of laps.
#[derive(Default)]
pub struct SessionAnalysis {
    classifier: LapValidityClassifier,
    forces: ForceConfig,
}

impl SessionAnalysis {
    pub fn new(validity: ValidityConfig, forces: ForceConfig) -> Self {
        Self {
            classifier: LapValidityClassifier::new(validity),
            forces,
        }
    }

    pub fn classify(&self, laps: &[Lap]) -> Vec<LapValidity> {
        self.classifier.classify_session(laps)
    }

    /// Laps that are both complete and valid.
    pub fn valid_laps<'a>(&self, laps: &'a [Lap]) -> Vec<&'a Lap> {
        laps.iter()
            .zip(self.classify(laps))
            .filter(|(_, status)| *status == LapValidity::Valid)
            .map(|(lap, _)| lap)
            .collect()
    }

    pub fn summary(&self, laps: &[Lap]) -> SessionSummary {
        let statuses = self.classify(laps);
        let count = |wanted: LapValidity| statuses.iter().filter(|s| **s == wanted).count();
        let best = laps
            .iter()
            .zip(&statuses)
            .filter(|(lap, status)| **status == LapValidity::Valid && lap.lap_time_safe().is_finite())
            .map(|(lap, _)| (lap.index(), lap.lap_time_safe()))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        SessionSummary {
            laps: laps.len(),
            valid: count(LapValidity::Valid),
            invalid: count(LapValidity::Invalid),
            not_finished: count(LapValidity::NotFinished),
            best_lap: best.map(|(index, _)| index),
            best_lap_time: best.map(|(_, time)| time),
            median_lap_time: SessionMedians::from_laps(laps).lap_time,
        }
    }

    /// Aggregates [`LapAnalysis::basic_stats`] over the valid laps: `*_max`
    /// keys take the session maximum, `*_min` keys the minimum and every
    /// other key the mean of the per-lap values. Empty without valid laps.
    pub fn average_stats(&self, laps: &[Lap]) -> LapStats {
        let valid = self.valid_laps(laps);
        debug!("Averaging stats over {} of {} laps", valid.len(), laps.len());

        let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for lap in valid {
            for (key, value) in LapAnalysis::basic_stats(lap, &self.forces) {
                columns.entry(key).or_default().push(value);
            }
        }
        columns
            .into_iter()
            .map(|(key, values)| {
                let value = if key.ends_with("_max") {
                    signal::max(&values)
                } else if key.ends_with("_min") {
                    signal::min(&values)
                } else {
                    signal::mean(&values)
                };
                (key, value)
            })
            .collect()
    }
}
