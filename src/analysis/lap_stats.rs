use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    corner_detector::{CornerConfig, CornerDetector},
    corner_kpis::pedal_percent,
    force_stats::{ForceConfig, ForceStats},
    signal::{self, MonotoneCubic},
};
use crate::telemetry::{Channel, Lap};

pub(crate) const FULL_THROTTLE_PCT: f64 = 98.0;
pub(crate) const BRAKING_PCT: f64 = 5.0;

/// Named per-lap metrics. Keys are stable snake_case identifiers.
pub type LapStats = BTreeMap<String, f64>;

#[derive(Clone, Copy, Debug)]
enum Reduce {
    Avg,
    Max,
    Min,
    AbsMax,
    ActivePct,
    Consumed,
}

// Optional metrics, emitted only when the lap carries the channel.
static CHANNEL_STATS: &[(&str, Channel, Reduce)] = &[
    ("gear_max", Channel::Gear, Reduce::Max),
    ("steering_abs_max", Channel::SteeringAngle, Reduce::AbsMax),
    ("fuel_used", Channel::Fuel, Reduce::Consumed),
    ("ers_store_min", Channel::ErsStore, Reduce::Min),
    ("water_temp_max", Channel::WaterTemp, Reduce::Max),
    ("oil_temp_max", Channel::OilTemp, Reduce::Max),
    ("air_temp_avg", Channel::AirTemp, Reduce::Avg),
    ("track_temp_avg", Channel::TrackTemp, Reduce::Avg),
    ("abs_active_pct", Channel::AbsActive, Reduce::ActivePct),
    ("tc_active_pct", Channel::TcActive, Reduce::ActivePct),
    ("drs_active_pct", Channel::DrsActive, Reduce::ActivePct),
    ("g_lat_abs_max", Channel::GForceLat, Reduce::AbsMax),
    ("g_long_max", Channel::GForceLong, Reduce::Max),
    ("g_long_min", Channel::GForceLong, Reduce::Min),
    ("tire_temp_fl_avg", Channel::TireTempCoreFl, Reduce::Avg),
    ("tire_temp_fr_avg", Channel::TireTempCoreFr, Reduce::Avg),
    ("tire_temp_rl_avg", Channel::TireTempCoreRl, Reduce::Avg),
    ("tire_temp_rr_avg", Channel::TireTempCoreRr, Reduce::Avg),
    ("tire_temp_fl_max", Channel::TireTempCoreFl, Reduce::Max),
    ("tire_temp_fr_max", Channel::TireTempCoreFr, Reduce::Max),
    ("tire_temp_rl_max", Channel::TireTempCoreRl, Reduce::Max),
    ("tire_temp_rr_max", Channel::TireTempCoreRr, Reduce::Max),
    ("tire_pressure_fl_avg", Channel::TirePressureFl, Reduce::Avg),
    ("tire_pressure_fr_avg", Channel::TirePressureFr, Reduce::Avg),
    ("tire_pressure_rl_avg", Channel::TirePressureRl, Reduce::Avg),
    ("tire_pressure_rr_avg", Channel::TirePressureRr, Reduce::Avg),
    ("brake_temp_fl_max", Channel::BrakeTempFl, Reduce::Max),
    ("brake_temp_fr_max", Channel::BrakeTempFr, Reduce::Max),
    ("brake_temp_rl_max", Channel::BrakeTempRl, Reduce::Max),
    ("brake_temp_rr_max", Channel::BrakeTempRr, Reduce::Max),
    ("susp_travel_fl_max", Channel::SuspTravelFl, Reduce::Max),
    ("susp_travel_fr_max", Channel::SuspTravelFr, Reduce::Max),
    ("susp_travel_rl_max", Channel::SuspTravelRl, Reduce::Max),
    ("susp_travel_rr_max", Channel::SuspTravelRr, Reduce::Max),
    ("ride_height_fl_min", Channel::RideHeightFl, Reduce::Min),
    ("ride_height_fr_min", Channel::RideHeightFr, Reduce::Min),
    ("ride_height_rl_min", Channel::RideHeightRl, Reduce::Min),
    ("ride_height_rr_min", Channel::RideHeightRr, Reduce::Min),
];

fn reduce(values: &[f64], how: Reduce) -> f64 {
    match how {
        Reduce::Avg => signal::mean(values),
        Reduce::Max => signal::max(values),
        Reduce::Min => signal::min(values),
        Reduce::AbsMax => signal::max(&values.iter().map(|v| v.abs()).collect::<Vec<_>>()),
        Reduce::ActivePct => signal::mean(
            &values
                .iter()
                .map(|v| if *v > 1.0 { *v } else { v * 100.0 })
                .collect::<Vec<_>>(),
        ),
        Reduce::Consumed => {
            let first = values.iter().find(|v| v.is_finite());
            let last = values.iter().rev().find(|v| v.is_finite());
            match (first, last) {
                (Some(first), Some(last)) => (first - last).max(0.0),
                _ => f64::NAN,
            }
        }
    }
}

// Percentage of finite samples satisfying `pred`, NaN without data.
fn share_pct(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    let finite = values.iter().copied().filter(|v| v.is_finite()).collect::<Vec<_>>();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().filter(|v| pred(**v)).count() as f64 * 100.0 / finite.len() as f64
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakeEventConfig {
    pub on_pct: f64,
    pub off_pct: f64,
    pub min_samples: usize,
}

impl Default for BrakeEventConfig {
    fn default() -> Self {
        Self {
            on_pct: 10.0,
            off_pct: 5.0,
            min_samples: 3,
        }
    }
}

/// One braking zone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrakeEvent {
    pub start_distance: f64,
    pub end_distance: f64,
    /// km/h at the first braking sample
    pub entry_speed: f64,
    pub min_speed: f64,
    pub peak_brake_pct: f64,
    /// Seconds, NaN without timestamps
    pub duration: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApexPoint {
    pub corner_id: u32,
    pub distance: f64,
    /// Recorded speed at the apex sample, km/h
    pub speed: f64,
    pub sample_index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeltaPoint {
    pub distance: f64,
    /// Positive when the lap is slower than the reference at this distance
    pub delta: f64,
}

/// Per-lap analyses consumed by reporting layers.
pub struct LapAnalysis;

impl LapAnalysis {
    /// Basic metrics of one lap. Core keys are always present (NaN when the
    /// lap lacks the data); channel specific keys only when the channel is.
    /// `forces` sets the thresholds behind `seat_roughness_pct`.
    pub fn basic_stats(lap: &Lap, forces: &ForceConfig) -> LapStats {
        let mut stats = LapStats::new();
        let speed = lap.channel_series(Channel::Speed);
        let throttle = pedal_percent(lap, Channel::Throttle);
        let brake = pedal_percent(lap, Channel::Brake);
        let rpm = lap.channel_series(Channel::Rpm);

        for (key, value) in [
            ("lap_time", lap.lap_time_safe()),
            ("lap_distance", lap.lap_distance()),
            ("speed_avg", signal::mean(&speed)),
            ("speed_max", signal::max(&speed)),
            ("speed_min", signal::min(&speed)),
            ("throttle_avg", signal::mean(&throttle)),
            ("brake_avg", signal::mean(&brake)),
            ("brake_max", signal::max(&brake)),
            ("rpm_avg", signal::mean(&rpm)),
            ("rpm_max", signal::max(&rpm)),
            ("full_throttle_pct", share_pct(&throttle, |t| t >= FULL_THROTTLE_PCT)),
            ("braking_pct", share_pct(&brake, |b| b > BRAKING_PCT)),
        ] {
            stats.insert(key.to_string(), value);
        }

        for (key, channel, how) in CHANNEL_STATS {
            if lap.has_channel(*channel) {
                stats.insert(key.to_string(), reduce(&lap.channel_series(*channel), *how));
            }
        }

        let roughness = ForceStats::new(forces.clone()).seat_roughness_pct(lap);
        if roughness.is_finite() {
            stats.insert("seat_roughness_pct".to_string(), roughness);
        }
        stats
    }

    /// Braking zones found with on/off hysteresis on brake percentage.
    pub fn brake_events(lap: &Lap, config: &BrakeEventConfig) -> Vec<BrakeEvent> {
        let brake = pedal_percent(lap, Channel::Brake);
        let speed = lap.channel_series(Channel::Speed);
        let axis = lap.distance_axis();
        let times = lap.timestamps();

        let mut events = Vec::new();
        let mut open: Option<usize> = None;
        for i in 0..=brake.len() {
            let b = brake.get(i).copied().unwrap_or(f64::NAN);
            match open {
                None if b > config.on_pct => open = Some(i),
                Some(start) if i == brake.len() || !(b >= config.off_pct) => {
                    open = None;
                    if i - start < config.min_samples {
                        continue;
                    }
                    let range = start..i;
                    events.push(BrakeEvent {
                        start_distance: axis[start],
                        end_distance: axis[i - 1],
                        entry_speed: speed[start],
                        min_speed: signal::min(&speed[range.clone()]),
                        peak_brake_pct: signal::max(&brake[range]).clamp(0.0, 100.0),
                        duration: times[i - 1] - times[start],
                    });
                }
                _ => {}
            }
        }
        events
    }

    /// Apex of every detected corner, snapped to the nearest sample.
    pub fn apexes(lap: &Lap, config: &CornerConfig) -> Vec<ApexPoint> {
        let corners = CornerDetector::new(config.clone()).detect(lap);
        let axis = lap.distance_axis();
        corners
            .iter()
            .filter_map(|corner| {
                let index = nearest_index(&axis, corner.x_apex)?;
                Some(ApexPoint {
                    corner_id: corner.id,
                    distance: corner.x_apex,
                    speed: lap.samples()[index].value(Channel::Speed),
                    sample_index: index,
                })
            })
            .collect()
    }

    /// Time gained or lost against `reference` on a common distance grid of
    /// `step_m` meters, starting at 0 and ending where the shorter lap ends.
    /// Elapsed time is interpolated monotonically between samples. Empty
    /// when either lap lacks usable time or distance.
    pub fn time_delta(lap: &Lap, reference: &Lap, step_m: f64) -> Vec<DeltaPoint> {
        if !step_m.is_finite() || step_m <= 0.0 {
            return Vec::new();
        }
        let (Some(current), Some(reference)) = (elapsed_curve(lap), elapsed_curve(reference)) else {
            return Vec::new();
        };
        let end = current.domain().1.min(reference.domain().1);
        let steps = (end / step_m).floor() as usize;
        (0..=steps)
            .map(|k| k as f64 * step_m)
            .map(|distance| DeltaPoint {
                distance,
                delta: current.eval(distance) - reference.eval(distance),
            })
            .filter(|p| p.delta.is_finite())
            .collect()
    }
}

fn nearest_index(axis: &[f64], x: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, d)| d.is_finite())
        .min_by(|(_, a), (_, b)| (*a - x).abs().total_cmp(&(*b - x).abs()))
        .map(|(i, _)| i)
}

// Elapsed time as a function of distance travelled, both starting at 0.
fn elapsed_curve(lap: &Lap) -> Option<MonotoneCubic> {
    let times = lap.timestamps();
    let axis = lap.distance_axis();
    let t0 = times.iter().copied().find(|t| t.is_finite())?;
    let d0 = axis.iter().copied().find(|d| d.is_finite())?;
    let distance = axis.iter().map(|d| d - d0).collect::<Vec<_>>();
    let elapsed = times.iter().map(|t| t - t0).collect::<Vec<_>>();
    MonotoneCubic::new(&distance, &elapsed)
}
