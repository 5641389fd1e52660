//! Seat force based roughness and impact distribution.
//!
//! Both metrics work on the jerk of the seat force signal: the absolute
//! change between consecutive samples divided by the time step. The force
//! source is the first of [`Channel::SeatForce`], [`Channel::GForceVert`] and
//! [`Channel::AccelVert`] that the lap carries.

use serde::{Deserialize, Serialize};

use super::signal::{self, clamp01, quantile, smoothstep};
use crate::telemetry::{Channel, Lap};

const FORCE_SOURCES: [Channel; 3] = [Channel::SeatForce, Channel::GForceVert, Channel::AccelVert];
const STANDARD_GRAVITY: f64 = 9.806_65;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Lowest jerk that can count as an impact
    pub jerk_floor: f64,
    pub jerk_quantile: f64,
    /// Step used when timestamps are missing or too close together
    pub fallback_dt_s: f64,
    pub min_dt_s: f64,
    pub proxy_quantile: f64,
    pub proxy_scale: f64,
    pub proxy_floor: f64,
    /// Steering angle beyond which an impact is attributed to one side
    pub steer_split_deg: f64,
    /// Acceleration magnitude (g) at which impact weight saturates
    pub impact_g_norm: f64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            jerk_floor: 400.0,
            jerk_quantile: 0.80,
            fallback_dt_s: 0.02,
            min_dt_s: 0.001,
            proxy_quantile: 0.95,
            proxy_scale: 0.6,
            proxy_floor: 0.02,
            steer_split_deg: 2.0,
            impact_g_norm: 2.0,
        }
    }
}

/// Share of impact load felt on each side of the seat. Sums to 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatDistribution {
    pub left: f64,
    pub right: f64,
    pub rear: f64,
}

impl SeatDistribution {
    pub fn even() -> Self {
        Self {
            left: 1.0 / 3.0,
            right: 1.0 / 3.0,
            rear: 1.0 / 3.0,
        }
    }
}

// Jerk between sample `index - 1` and `index`.
struct Jerk {
    index: usize,
    value: f64,
}

#[derive(Default)]
pub struct ForceStats {
    config: ForceConfig,
}

impl ForceStats {
    pub fn new(config: ForceConfig) -> Self {
        Self { config }
    }

    fn force_series(lap: &Lap) -> Option<Vec<f64>> {
        FORCE_SOURCES
            .iter()
            .find(|channel| lap.has_channel(**channel))
            .map(|channel| lap.channel_series(*channel))
    }

    fn jerks(&self, lap: &Lap, force: &[f64]) -> Vec<Jerk> {
        let times = lap.timestamps();
        (1..force.len())
            .filter(|&i| force[i].is_finite() && force[i - 1].is_finite())
            .map(|i| {
                let dt = times[i] - times[i - 1];
                let dt = if !dt.is_finite() || dt <= 1e-6 {
                    self.config.fallback_dt_s
                } else {
                    dt.max(self.config.min_dt_s)
                };
                Jerk {
                    index: i,
                    value: (force[i] - force[i - 1]).abs() / dt,
                }
            })
            .collect()
    }

    fn impact_threshold(&self, jerks: &[f64]) -> f64 {
        self.config
            .jerk_floor
            .max(quantile(jerks, self.config.jerk_quantile))
    }

    /// Fraction (0..1) of jerks at or above the adaptive threshold. When no
    /// jerk reaches it, a continuous spread measure of the force signal is
    /// used instead, floored so a smooth lap never reads exactly 0. NaN
    /// without force data.
    pub fn seat_roughness(&self, lap: &Lap) -> f64 {
        let Some(force) = Self::force_series(lap) else {
            return f64::NAN;
        };
        let jerks = self.jerks(lap, &force).into_iter().map(|j| j.value).collect::<Vec<_>>();
        if jerks.is_empty() {
            return f64::NAN;
        }
        let threshold = self.impact_threshold(&jerks);
        let rough = jerks.iter().filter(|j| **j >= threshold).count();
        if rough > 0 {
            return rough as f64 / jerks.len() as f64;
        }

        let std = signal::std_dev(&force);
        let mean = signal::mean(&force);
        let median = signal::median(&force).unwrap_or(mean);
        let magnitudes = force.iter().map(|f| f.abs()).collect::<Vec<_>>();
        let spread = quantile(&magnitudes, self.config.proxy_quantile);
        let ratio = if spread > 0.0 {
            (std + (mean - median).abs()) / spread
        } else {
            0.0
        };
        self.config
            .proxy_floor
            .max(self.config.proxy_scale * clamp01(ratio))
    }

    pub fn seat_roughness_pct(&self, lap: &Lap) -> f64 {
        self.seat_roughness(lap) * 100.0
    }

    /// Splits impact load between left, right and rear.
    ///
    /// Each jerk is weighted by how far it sits into the impact threshold
    /// band and by the acceleration magnitude. The lateral share of that
    /// weight goes to the side the steering points to (positive angles load
    /// the left side, negative the right, near-centre splits evenly) and the
    /// longitudinal share goes to the rear. `None` without force data, an
    /// even split when nothing registers as an impact.
    pub fn distribution(&self, lap: &Lap) -> Option<SeatDistribution> {
        let force = Self::force_series(lap)?;
        let jerks = self.jerks(lap, &force);
        let values = jerks.iter().map(|j| j.value).collect::<Vec<_>>();
        let threshold = self.impact_threshold(&values);

        let lat = acceleration_g(lap, Channel::GForceLat, Channel::AccelLat);
        let lon = acceleration_g(lap, Channel::GForceLong, Channel::AccelLong);
        let steering = lap.channel_series(Channel::SteeringAngle);

        let (mut left, mut right, mut rear) = (0.0, 0.0, 0.0);
        for jerk in &jerks {
            let i = jerk.index;
            let (lat, lon) = (finite_or_zero(lat[i]).abs(), finite_or_zero(lon[i]).abs());
            let magnitude = (lat * lat + lon * lon).sqrt();
            let weight = smoothstep(0.5 * threshold, threshold, jerk.value)
                * (0.5 + 0.5 * clamp01(magnitude / self.config.impact_g_norm));
            if weight <= 0.0 {
                continue;
            }
            let lat_share = if lat + lon > 0.0 { lat / (lat + lon) } else { 0.5 };
            let side = weight * lat_share;
            rear += weight - side;
            match steering[i] {
                s if s > self.config.steer_split_deg => left += side,
                s if s < -self.config.steer_split_deg => right += side,
                _ => {
                    left += side / 2.0;
                    right += side / 2.0;
                }
            }
        }

        let total = left + right + rear;
        if total <= 0.0 {
            return Some(SeatDistribution::even());
        }
        Some(SeatDistribution {
            left: left / total,
            right: right / total,
            rear: rear / total,
        })
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

// Acceleration in g, from the g channel when present, else from m/s^2.
fn acceleration_g(lap: &Lap, g_channel: Channel, accel_channel: Channel) -> Vec<f64> {
    if lap.has_channel(g_channel) || !lap.has_channel(accel_channel) {
        return lap.channel_series(g_channel);
    }
    lap.channel_series(accel_channel)
        .into_iter()
        .map(|a| a / STANDARD_GRAVITY)
        .collect()
}
