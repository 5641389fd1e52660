use serde::{Deserialize, Serialize};

use super::{
    corner_detector::CornerSegment,
    signal::{self, percent_scale},
};
use crate::telemetry::{Channel, Lap};

pub(crate) const THROTTLE_ON_PCT: f64 = 5.0;

/// Kinematic summary of one corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CornerKpis {
    pub corner_id: u32,
    /// km/h, NaN when the corner has no speed samples
    pub min_speed: f64,
    /// 0..=100, 0 when the corner has no brake samples
    pub peak_brake_pct: f64,
    /// Seconds from corner start to the first throttle application
    pub time_to_throttle: f64,
    /// Throttle percentage at that first application
    pub throttle_at: f64,
}

// Lap-wide arrays shared by every corner of the lap.
struct KpiSeries {
    axis: Vec<f64>,
    timestamps: Vec<f64>,
    speed: Vec<f64>,
    brake_pct: Vec<f64>,
    throttle_pct: Vec<f64>,
}

impl KpiSeries {
    fn new(lap: &Lap) -> Self {
        Self {
            axis: lap.distance_axis(),
            timestamps: lap.timestamps(),
            speed: lap.channel_series(Channel::Speed),
            brake_pct: pedal_percent(lap, Channel::Brake),
            throttle_pct: pedal_percent(lap, Channel::Throttle),
        }
    }

    // Sample indices whose distance falls inside the segment.
    fn range(&self, segment: &CornerSegment) -> std::ops::Range<usize> {
        let lo = self.axis.partition_point(|d| *d < segment.x_start);
        let hi = self.axis.partition_point(|d| *d <= segment.x_end);
        lo..hi.max(lo)
    }

    fn kpis(&self, segment: &CornerSegment) -> CornerKpis {
        let range = self.range(segment);
        let mut kpis = CornerKpis {
            corner_id: segment.id,
            min_speed: f64::NAN,
            peak_brake_pct: 0.0,
            time_to_throttle: f64::NAN,
            throttle_at: f64::NAN,
        };
        if range.is_empty() {
            return kpis;
        }

        kpis.min_speed = signal::min(&self.speed[range.clone()]);
        let peak = signal::max(&self.brake_pct[range.clone()]);
        if peak.is_finite() {
            kpis.peak_brake_pct = peak.clamp(0.0, 100.0);
        }

        let start = range.start;
        if let Some(k) = range.into_iter().find(|&k| self.throttle_pct[k] > THROTTLE_ON_PCT) {
            kpis.time_to_throttle = self.timestamps[k] - self.timestamps[start];
            kpis.throttle_at = self.throttle_pct[k];
        }
        kpis
    }
}

/// Pedal channel scaled to percent for the whole lap, so 0..1 and 0..100
/// inputs read the same.
pub(crate) fn pedal_percent(lap: &Lap, channel: Channel) -> Vec<f64> {
    let values = lap.channel_series(channel);
    let scale = percent_scale(&values);
    values.into_iter().map(|v| v * scale).collect()
}

impl CornerKpis {
    pub fn compute(lap: &Lap, segment: &CornerSegment) -> Self {
        KpiSeries::new(lap).kpis(segment)
    }

    pub fn compute_all(lap: &Lap, segments: &[CornerSegment]) -> Vec<Self> {
        let series = KpiSeries::new(lap);
        segments.iter().map(|s| series.kpis(s)).collect()
    }
}
