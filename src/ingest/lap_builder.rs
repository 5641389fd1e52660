use std::collections::HashMap;

use log::{debug, info};

use super::{IngestConfig, aliases::ColumnMap, parser::parse_number};
use crate::telemetry::{Channel, Lap, Sample};

/// Splits a stream of data rows into laps.
///
/// The lap of each row comes from the explicit lap counter when it holds a
/// non-negative integer (counter + 1). Otherwise a drop in distance or in
/// the running lap time relative to the previous row starts a new lap.
/// Samples are grouped by lap index in first-seen order, without sorting.
pub struct LapBuilder {
    columns: ColumnMap,
    config: IngestConfig,
    laps: Vec<(u32, Vec<Sample>)>,
    positions: HashMap<u32, usize>,
    current_lap: u32,
    prev_distance: Option<f64>,
    prev_lap_time: Option<f64>,
    rows_accepted: usize,
    rows_skipped: usize,
}

impl LapBuilder {
    pub fn new(columns: ColumnMap, config: IngestConfig) -> Self {
        Self {
            columns,
            config,
            laps: Vec::new(),
            positions: HashMap::new(),
            current_lap: 1,
            prev_distance: None,
            prev_lap_time: None,
            rows_accepted: 0,
            rows_skipped: 0,
        }
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// Files one data row. Rows where no mapped field parses are skipped and
    /// leave the lap state untouched.
    pub fn push_row(&mut self, row: &[String]) {
        let parsed = self
            .columns
            .columns()
            .iter()
            .map(|(idx, channel)| (*channel, row.get(*idx).and_then(|cell| parse_number(cell))))
            .collect::<Vec<_>>();
        if parsed.iter().all(|(_, value)| value.is_none()) {
            self.rows_skipped += 1;
            return;
        }

        let field = |wanted: Channel| {
            parsed
                .iter()
                .find(|(channel, _)| *channel == wanted)
                .and_then(|(_, value)| *value)
        };
        let distance = field(Channel::Distance);
        let lap_time = field(Channel::LapTime);
        let counter = field(Channel::LapNumber)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v < f64::from(u32::MAX));

        self.current_lap = match counter {
            Some(counter) => counter as u32 + 1,
            None if self.rows_accepted > 0 && self.is_restart(distance, lap_time) => {
                debug!(
                    "Lap restart detected after row {} (distance {:?}, lap time {:?})",
                    self.rows_accepted, distance, lap_time
                );
                self.current_lap + 1
            }
            None => self.current_lap,
        };
        self.prev_distance = distance;
        self.prev_lap_time = lap_time;
        self.rows_accepted += 1;

        let mut sample = Sample::default();
        for (channel, value) in parsed {
            let Some(value) = value else { continue };
            if sample.has(channel) {
                continue;
            }
            let value = if channel == Channel::SteeringAngle {
                -value
            } else {
                value
            };
            sample.insert(channel, value);
        }

        let position = *self.positions.entry(self.current_lap).or_insert_with(|| {
            self.laps.push((self.current_lap, Vec::new()));
            self.laps.len() - 1
        });
        self.laps[position].1.push(sample);
    }

    fn is_restart(&self, distance: Option<f64>, lap_time: Option<f64>) -> bool {
        let distance_reset = matches!(
            (self.prev_distance, distance),
            (Some(prev), Some(cur)) if prev - cur > self.config.lap_distance_reset_m
        );
        let lap_time_reset = matches!(
            (self.prev_lap_time, lap_time),
            (Some(prev), Some(cur)) if prev - cur > self.config.lap_time_reset_s
        );
        distance_reset || lap_time_reset
    }

    pub fn finish(self) -> Vec<Lap> {
        info!(
            "Built {} laps from {} rows ({} empty rows skipped)",
            self.laps.len(),
            self.rows_accepted,
            self.rows_skipped
        );
        self.laps
            .into_iter()
            .map(|(index, samples)| Lap::new(index, samples))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::aliases::ColumnOverrides;

    fn builder(headers: &[&str]) -> LapBuilder {
        let headers = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
        LapBuilder::new(
            ColumnMap::resolve(&headers, &ColumnOverrides::new()),
            IngestConfig::default(),
        )
    }

    fn push(builder: &mut LapBuilder, cells: &[&str]) {
        let row = cells.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        builder.push_row(&row);
    }

    #[test]
    fn test_explicit_counter_splits_laps() {
        let mut b = builder(&["Time", "Lap", "Speed"]);
        for (i, lap) in [0, 0, 0, 1, 1, 2].iter().enumerate() {
            push(&mut b, &[&i.to_string(), &lap.to_string(), "100"]);
        }
        let laps = b.finish();
        assert_eq!(laps.len(), 3);
        assert_eq!(laps.iter().map(Lap::len).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(laps.iter().map(Lap::index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_distance_drop_starts_new_lap() {
        let mut b = builder(&["Time", "Distance", "Speed"]);
        for (t, d) in [(0, 4000), (1, 4040), (2, 5), (3, 45), (4, 30)] {
            push(&mut b, &[&t.to_string(), &d.to_string(), "100"]);
        }
        let laps = b.finish();
        // a 15 m step back is noise, not a restart
        assert_eq!(laps.iter().map(Lap::len).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_lap_time_drop_starts_new_lap() {
        let mut b = builder(&["Time", "Lap Time", "Speed"]);
        for (t, lt) in [("0", "88.90"), ("1", "88.95"), ("2", "0.01"), ("3", "0.05")] {
            push(&mut b, &[t, lt, "100"]);
        }
        let laps = b.finish();
        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].lap_time(), 88.95);
    }

    #[test]
    fn test_counter_wins_over_distance_reset() {
        let mut b = builder(&["Lap", "Distance", "Speed"]);
        for (lap, d) in [(0, 4000), (0, 10), (0, 20)] {
            push(&mut b, &[&lap.to_string(), &d.to_string(), "100"]);
        }
        assert_eq!(b.finish().len(), 1);
    }

    #[test]
    fn test_unusable_counter_falls_back_to_distance() {
        let mut b = builder(&["Lap", "Distance", "Speed"]);
        for (lap, d) in [("-1", "4000"), ("x", "10"), ("1.5", "20")] {
            push(&mut b, &[lap, d, "100"]);
        }
        let laps = b.finish();
        assert_eq!(laps.iter().map(Lap::len).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_empty_rows_are_skipped() {
        let mut b = builder(&["Time", "Distance", "Speed"]);
        push(&mut b, &["0", "100", "50"]);
        push(&mut b, &["", "", ""]);
        push(&mut b, &["n/a", "-", "?"]);
        push(&mut b, &["1"]);
        let laps = b.finish();
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].len(), 2);
    }

    #[test]
    fn test_steering_sign_inverted() {
        let mut b = builder(&["Time", "Steering Angle", "Speed"]);
        push(&mut b, &["0", "12,5", "50"]);
        let laps = b.finish();
        let sample = &laps[0].samples()[0];
        assert_eq!(sample.get(Channel::SteeringAngle), Some(-12.5));
        assert_eq!(sample.get(Channel::Speed), Some(50.0));
        assert_eq!(sample.timestamp(), 0.0);
        assert!(sample.distance().is_nan());
    }

    #[test]
    fn test_backwards_counter_groups_by_index() {
        let mut b = builder(&["Lap", "Time", "Speed"]);
        for (i, lap) in [0, 1, 0, 2].iter().enumerate() {
            push(&mut b, &[&lap.to_string(), &i.to_string(), "100"]);
        }
        let laps = b.finish();
        assert_eq!(laps.iter().map(Lap::index).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(laps[0].len(), 2);
    }
}
