use std::io::Write;

use serde::Serialize;
use serde_jsonlines::JsonLinesWriter;

use crate::{
    LapwiseError,
    analysis::{BrakeEvent, CornerKpis, CornerSegment, LapStats, SessionSummary},
    telemetry::{Lap, LapValidity},
};

/// One row of the lap listing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LapRow {
    pub lap: u32,
    pub status: LapValidity,
    pub lap_time: f64,
    pub lap_distance: f64,
    pub samples: usize,
}

impl LapRow {
    pub fn new(lap: &Lap, status: LapValidity) -> Self {
        Self {
            lap: lap.index(),
            status,
            lap_time: lap.lap_time_safe(),
            lap_distance: lap.lap_distance(),
            samples: lap.len(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CornerRow {
    #[serde(flatten)]
    pub segment: CornerSegment,
    pub min_speed: f64,
    pub peak_brake_pct: f64,
    pub time_to_throttle: f64,
    pub throttle_at: f64,
}

impl CornerRow {
    pub fn new(segment: CornerSegment, kpis: &CornerKpis) -> Self {
        Self {
            segment,
            min_speed: kpis.min_speed,
            peak_brake_pct: kpis.peak_brake_pct,
            time_to_throttle: kpis.time_to_throttle,
            throttle_at: kpis.throttle_at,
        }
    }
}

/// Stats of one lap, or of the session average when `lap` is `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsRow {
    pub lap: Option<u32>,
    pub stats: LapStats,
}

/// Writes one JSON document per line. Non-finite numbers become `null`.
pub fn write_json_lines<W: Write, T: Serialize>(
    writer: W,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), LapwiseError> {
    let mut writer = JsonLinesWriter::new(writer);
    writer
        .write_all(rows)
        .map_err(|e| LapwiseError::ReportWriteError { source: e })?;
    writer
        .flush()
        .map_err(|e| LapwiseError::ReportWriteError { source: e })
}

fn fmt_num(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        "-".to_string()
    }
}

fn fmt_lap_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "-".to_string();
    }
    let minutes = (seconds / 60.0).floor();
    format!("{}:{:06.3}", minutes as u64, seconds - minutes * 60.0)
}

pub fn write_lap_table<W: Write>(mut out: W, rows: &[LapRow]) -> Result<(), LapwiseError> {
    let mut write = || -> std::io::Result<()> {
        writeln!(out, "{:>4}  {:>10}  {:>10}  {:>8}  status", "lap", "time", "distance", "samples")?;
        for row in rows {
            writeln!(
                out,
                "{:>4}  {:>10}  {:>10}  {:>8}  {}",
                row.lap,
                fmt_lap_time(row.lap_time),
                fmt_num(row.lap_distance, 1),
                row.samples,
                row.status
            )?;
        }
        Ok(())
    };
    write().map_err(|e| LapwiseError::ReportWriteError { source: e })
}

pub fn write_corner_table<W: Write>(mut out: W, rows: &[CornerRow]) -> Result<(), LapwiseError> {
    let mut write = || -> std::io::Result<()> {
        writeln!(
            out,
            "{:>3}  {:>8}  {:>8}  {:>8}  {:>9}  {:>9}  {:>8}  {:>8}",
            "id", "start", "apex", "end", "min km/h", "brake %", "ttt s", "thr %"
        )?;
        for row in rows {
            writeln!(
                out,
                "{:>3}  {:>8}  {:>8}  {:>8}  {:>9}  {:>9}  {:>8}  {:>8}",
                row.segment.id,
                fmt_num(row.segment.x_start, 1),
                fmt_num(row.segment.x_apex, 1),
                fmt_num(row.segment.x_end, 1),
                fmt_num(row.min_speed, 1),
                fmt_num(row.peak_brake_pct, 1),
                fmt_num(row.time_to_throttle, 2),
                fmt_num(row.throttle_at, 1)
            )?;
        }
        Ok(())
    };
    write().map_err(|e| LapwiseError::ReportWriteError { source: e })
}

pub fn write_brake_table<W: Write>(mut out: W, events: &[BrakeEvent]) -> Result<(), LapwiseError> {
    let mut write = || -> std::io::Result<()> {
        writeln!(
            out,
            "{:>3}  {:>8}  {:>8}  {:>10}  {:>9}  {:>8}  {:>6}",
            "#", "start", "end", "entry km/h", "min km/h", "brake %", "s"
        )?;
        for (i, event) in events.iter().enumerate() {
            writeln!(
                out,
                "{:>3}  {:>8}  {:>8}  {:>10}  {:>9}  {:>8}  {:>6}",
                i + 1,
                fmt_num(event.start_distance, 1),
                fmt_num(event.end_distance, 1),
                fmt_num(event.entry_speed, 1),
                fmt_num(event.min_speed, 1),
                fmt_num(event.peak_brake_pct, 1),
                fmt_num(event.duration, 2)
            )?;
        }
        Ok(())
    };
    write().map_err(|e| LapwiseError::ReportWriteError { source: e })
}

pub fn write_stats_table<W: Write>(mut out: W, stats: &LapStats) -> Result<(), LapwiseError> {
    let width = stats.keys().map(String::len).max().unwrap_or(0);
    let mut write = || -> std::io::Result<()> {
        for (key, value) in stats {
            writeln!(out, "{key:<width$}  {}", fmt_num(*value, 3))?;
        }
        Ok(())
    };
    write().map_err(|e| LapwiseError::ReportWriteError { source: e })
}

pub fn write_summary<W: Write>(mut out: W, summary: &SessionSummary) -> Result<(), LapwiseError> {
    let best = match (summary.best_lap, summary.best_lap_time) {
        (Some(lap), Some(time)) => format!("lap {lap} ({})", fmt_lap_time(time)),
        _ => "-".to_string(),
    };
    writeln!(
        out,
        "{} laps: {} valid, {} invalid, {} not finished; best {}; median {}",
        summary.laps,
        summary.valid,
        summary.invalid,
        summary.not_finished,
        best,
        fmt_lap_time(summary.median_lap_time.unwrap_or(f64::NAN))
    )
    .map_err(|e| LapwiseError::ReportWriteError { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lap_time_format() {
        assert_eq!(fmt_lap_time(92.345), "1:32.345");
        assert_eq!(fmt_lap_time(59.0), "0:59.000");
        assert_eq!(fmt_lap_time(f64::NAN), "-");
    }

    #[test]
    fn test_json_lines_null_for_nan() {
        let mut stats = LapStats::new();
        stats.insert("speed_avg".to_string(), f64::NAN);
        stats.insert("lap_time".to_string(), 90.5);
        let mut out = Vec::new();
        write_json_lines(&mut out, [StatsRow { lap: Some(3), stats }]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "{\"lap\":3,\"stats\":{\"lap_time\":90.5,\"speed_avg\":null}}\n"
        );
    }

    #[test]
    fn test_corner_row_flattens_segment() {
        let segment = CornerSegment {
            id: 2,
            x_start: 10.0,
            x_apex: 20.0,
            x_end: 30.0,
        };
        let kpis = CornerKpis {
            corner_id: 2,
            min_speed: 80.0,
            peak_brake_pct: 0.0,
            time_to_throttle: 1.25,
            throttle_at: 12.0,
        };
        let value = serde_json::to_value(CornerRow::new(segment, &kpis)).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["x_apex"], 20.0);
        assert_eq!(value["time_to_throttle"], 1.25);
    }

    #[test]
    fn test_brake_table_rows() {
        let events = [BrakeEvent {
            start_distance: 120.0,
            end_distance: 180.5,
            entry_speed: 250.0,
            min_speed: 95.4,
            peak_brake_pct: 100.0,
            duration: f64::NAN,
        }];
        let mut out = Vec::new();
        write_brake_table(&mut out, &events).unwrap();
        let text = String::from_utf8(out).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.contains("180.5") && row.contains("95.4"), "{row}");
        assert!(row.ends_with('-'));
    }

    #[test]
    fn test_lap_table_lists_rows() {
        let rows = vec![LapRow {
            lap: 1,
            status: LapValidity::Valid,
            lap_time: 90.0,
            lap_distance: f64::NAN,
            samples: 10,
        }];
        let mut out = Vec::new();
        write_lap_table(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().contains("1:30.000"));
        assert!(text.ends_with("valid\n"));
    }
}
