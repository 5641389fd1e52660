use std::{io, path::PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{error, info, warn};

use lapwise::{
    AnalysisConfig, Channel, ColumnOverrides, CornerDetector, CornerKpis, Lap, LapAnalysis,
    LapwiseError, SessionAnalysis,
    analysis::BrakeEvent,
    ingest::import_file_with,
    report::{self, CornerRow, LapRow, StatsRow},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct InputArgs {
    /// Telemetry export (CSV or similar delimited text)
    #[arg(short, long)]
    input: PathBuf,

    /// Maps a header to a channel, e.g. --map "Speed [kph]=speed"
    #[arg(short, long = "map", value_name = "HEADER=CHANNEL")]
    map: Vec<String>,

    /// JSON config file; defaults to the user config directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write JSON lines instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lists laps with time, distance and validity
    Laps {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Corner segments and per-corner KPIs of one lap
    Corners {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long)]
        lap: u32,
    },
    /// Braking zones of one lap
    Brakes {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long)]
        lap: u32,
    },
    /// Basic stats of one lap, or the average over valid laps
    Stats {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long)]
        lap: Option<u32>,
    },
}

fn parse_overrides(mappings: &[String]) -> Result<ColumnOverrides, LapwiseError> {
    let mut overrides = ColumnOverrides::new();
    for mapping in mappings {
        let Some((header, channel)) = mapping.rsplit_once('=') else {
            return Err(LapwiseError::InvalidUserInput {
                field: "map".to_string(),
                reason: format!("expected HEADER=CHANNEL, got {mapping:?}"),
            });
        };
        let channel = channel
            .trim()
            .parse::<Channel>()
            .map_err(|e| LapwiseError::InvalidUserInput {
                field: "map".to_string(),
                reason: e.to_string(),
            })?;
        overrides.insert(header.to_string(), channel);
    }
    Ok(overrides)
}

fn load(input: &InputArgs) -> Result<(AnalysisConfig, Vec<Lap>), LapwiseError> {
    let config = AnalysisConfig::load(input.config.as_deref())?;
    let overrides = parse_overrides(&input.map)?;
    let laps = import_file_with(&input.input, &overrides, &config.ingest)?;
    info!("Loaded {} laps from {}", laps.len(), input.input.display());
    Ok((config, laps))
}

fn find_lap(laps: &[Lap], index: u32) -> Result<&Lap, LapwiseError> {
    laps.iter()
        .find(|lap| lap.index() == index)
        .ok_or_else(|| LapwiseError::InvalidUserInput {
            field: "lap".to_string(),
            reason: format!(
                "lap {index} not found, available: {}",
                laps.iter().map(|l| l.index().to_string()).collect::<Vec<_>>().join(", ")
            ),
        })
}

fn laps(input: &InputArgs) -> Result<(), LapwiseError> {
    let (config, laps) = load(input)?;
    let session = SessionAnalysis::new(config.validity, config.forces);
    let rows = laps
        .iter()
        .zip(session.classify(&laps))
        .map(|(lap, status)| LapRow::new(lap, status))
        .collect::<Vec<_>>();

    if input.json {
        report::write_json_lines(io::stdout().lock(), rows)
    } else {
        report::write_lap_table(io::stdout().lock(), &rows)?;
        report::write_summary(io::stdout().lock(), &session.summary(&laps))
    }
}

fn corners(input: &InputArgs, lap: u32) -> Result<(), LapwiseError> {
    let (config, laps) = load(input)?;
    let lap = find_lap(&laps, lap)?;
    let segments = CornerDetector::new(config.corners).detect(lap);
    let rows = segments
        .iter()
        .zip(CornerKpis::compute_all(lap, &segments))
        .map(|(segment, kpis)| CornerRow::new(*segment, &kpis))
        .collect::<Vec<_>>();

    if input.json {
        report::write_json_lines(io::stdout().lock(), rows)
    } else {
        report::write_corner_table(io::stdout().lock(), &rows)
    }
}

fn brakes(input: &InputArgs, lap: u32) -> Result<(), LapwiseError> {
    let (config, laps) = load(input)?;
    let events: Vec<BrakeEvent> =
        LapAnalysis::brake_events(find_lap(&laps, lap)?, &config.brake_events);

    if input.json {
        report::write_json_lines(io::stdout().lock(), events)
    } else {
        report::write_brake_table(io::stdout().lock(), &events)
    }
}

fn stats(input: &InputArgs, lap: Option<u32>) -> Result<(), LapwiseError> {
    let (config, laps) = load(input)?;
    let row = match lap {
        Some(index) => StatsRow {
            lap: Some(index),
            stats: LapAnalysis::basic_stats(find_lap(&laps, index)?, &config.forces),
        },
        None => {
            let stats = SessionAnalysis::new(config.validity, config.forces).average_stats(&laps);
            if stats.is_empty() {
                warn!("No valid laps to average");
            }
            StatsRow { lap: None, stats }
        }
    };

    if input.json {
        report::write_json_lines(io::stdout().lock(), [row])
    } else {
        report::write_stats_table(io::stdout().lock(), &row.stats)
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    }) {
        warn!("Could not set Ctrl-C handler: {e}");
    }

    let result = match &cli.command {
        Commands::Laps { input } => laps(input),
        Commands::Corners { input, lap } => corners(input, *lap),
        Commands::Brakes { input, lap } => brakes(input, *lap),
        Commands::Stats { input, lap } => stats(input, *lap),
    };
    if let Err(e) = result {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
