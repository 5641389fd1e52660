// Synthetic telemetry exports shared by the integration tests
#![allow(dead_code)]

use std::fmt::Write;

pub const SAMPLES_PER_LAP: usize = 600;
pub const OUTLAP_SAMPLES: usize = 40;
pub const STEP_M: f64 = 2.0;
pub const STEP_S: f64 = 0.05;
pub const DIP_CENTRES: [usize; 3] = [100, 300, 500];

/// Speed at sample `i`: 150 km/h with parabolic dips to 100 km/h.
pub fn speed_at(i: usize) -> f64 {
    DIP_CENTRES
        .iter()
        .map(|c| {
            let d = (i as f64 - *c as f64) / 25.0;
            if d.abs() < 1.0 { 50.0 * (1.0 - d * d) } else { 0.0 }
        })
        .fold(150.0, |speed, dip| speed - dip)
}

/// A MoTeC style export: metadata preamble, header, units row, then a short
/// out lap followed by `laps` full laps. The last full lap carries the
/// invalidation flag when `invalidate_last` is set.
pub fn session_csv(laps: usize, invalidate_last: bool) -> String {
    let mut csv = String::new();
    csv.push_str("\"Format\",\"MoTeC CSV File\"\n");
    csv.push_str("\"Venue\",\"Test Track\"\n");
    csv.push_str("\"Vehicle\",\"Test Car\"\n\n");
    csv.push_str("Time,Distance,Lap,Lap Time,Speed,Throttle,Brake,Seat Force,Fuel,Lap Invalidated\n");
    csv.push_str("s,m,,s,km/h,%,%,N,l,\n");

    let mut t = 0.0;
    let mut fuel = 60.0;
    for i in 0..OUTLAP_SAMPLES {
        let lap_time = i as f64 * STEP_S;
        writeln!(
            csv,
            "{t:.3},{:.1},0,{lap_time:.3},60.0,30.0,0.0,500.0,{fuel:.3},0",
            i as f64 * STEP_M
        )
        .unwrap();
        t += STEP_S;
    }

    for lap in 1..=laps {
        let invalid = invalidate_last && lap == laps;
        for i in 0..SAMPLES_PER_LAP {
            let speed = speed_at(i);
            let braking = DIP_CENTRES.iter().any(|c| i + 20 >= *c && i < *c);
            let (throttle, brake) = if braking { (0.0, 80.0) } else { (100.0, 0.0) };
            let flag = if invalid && i == SAMPLES_PER_LAP / 2 { 1 } else { 0 };
            writeln!(
                csv,
                "{t:.3},{:.1},{lap},{:.3},{speed:.3},{throttle:.1},{brake:.1},{:.1},{fuel:.3},{flag}",
                i as f64 * STEP_M,
                i as f64 * STEP_S,
                500.0 + (i % 7) as f64 * 3.0,
            )
            .unwrap();
            t += STEP_S;
            fuel -= 0.001;
        }
    }
    csv
}

/// One timed lap of `samples` rows, `step_m` meters apart, with the speed
/// trace given by `speed`. No lap counter, so everything lands in lap 1.
pub fn lap_csv(samples: usize, step_m: f64, speed: impl Fn(usize) -> f64) -> String {
    let mut csv = String::from("Time,Distance,Lap Time,Speed,Throttle,Brake\n");
    csv.push_str("s,m,s,km/h,%,%\n");
    for i in 0..samples {
        let t = i as f64 * STEP_S;
        writeln!(
            csv,
            "{t:.3},{:.1},{t:.3},{:.3},100.0,0.0",
            i as f64 * step_m,
            speed(i)
        )
        .unwrap();
    }
    csv
}

/// 150 km/h with parabolic dips of `depth` km/h, `2 * half_width` samples
/// wide, centred on `centres`.
pub fn dipped_speed(centres: &[usize], depth: f64, half_width: f64) -> impl Fn(usize) -> f64 + '_ {
    move |i| {
        let dip = centres
            .iter()
            .map(|c| {
                let d = (i as f64 - *c as f64) / half_width;
                if d.abs() < 1.0 { depth * (1.0 - d * d) } else { 0.0 }
            })
            .fold(0.0, f64::max);
        150.0 - dip
    }
}
