use std::collections::HashMap;

use super::Channel;

/// One recorded instant of telemetry.
///
/// Timestamp and distance are kept as plain fields (NaN when the source had
/// no usable value); every other channel lives in a sparse map that only
/// holds finite values, so "absent" and "present but unparsable" read the same.
#[derive(Clone, Debug)]
pub struct Sample {
    timestamp: f64,
    distance: f64,
    values: HashMap<Channel, f64>,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            timestamp: f64::NAN,
            distance: f64::NAN,
            values: HashMap::new(),
        }
    }
}

impl Sample {
    pub fn new(timestamp: f64, distance: f64) -> Self {
        Self {
            timestamp,
            distance,
            values: HashMap::new(),
        }
    }

    /// Builder style setter. Non-finite values are dropped.
    pub fn with_value(mut self, channel: Channel, value: f64) -> Self {
        self.insert(channel, value);
        self
    }

    pub(crate) fn insert(&mut self, channel: Channel, value: f64) {
        if !value.is_finite() {
            return;
        }
        match channel {
            Channel::Time => self.timestamp = value,
            Channel::Distance => self.distance = value,
            _ => {
                self.values.insert(channel, value);
            }
        }
    }

    /// Seconds, session or lap relative depending on the source. NaN when missing.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Meters along the track. NaN when missing.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn get(&self, channel: Channel) -> Option<f64> {
        let value = match channel {
            Channel::Time => self.timestamp,
            Channel::Distance => self.distance,
            _ => return self.values.get(&channel).copied(),
        };
        value.is_finite().then_some(value)
    }

    /// Same as [`Sample::get`] but NaN for a missing channel.
    pub fn value(&self, channel: Channel) -> f64 {
        self.get(channel).unwrap_or(f64::NAN)
    }

    pub fn has(&self, channel: Channel) -> bool {
        self.get(channel).is_some()
    }

    pub fn channels(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        self.values.iter().map(|(c, v)| (*c, *v))
    }

    pub fn is_empty(&self) -> bool {
        !self.timestamp.is_finite() && !self.distance.is_finite() && self.values.is_empty()
    }
}
