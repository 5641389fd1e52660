// Error types for lapwise

use snafu::Snafu;
use std::{io, path::PathBuf};

#[derive(Debug, Snafu)]
pub enum LapwiseError {
    // Errors while reading the telemetry file
    #[snafu(display("Unable to read telemetry file {}", path.display()))]
    TelemetryFileRead { path: PathBuf, source: io::Error },
    #[snafu(display("Error tokenizing telemetry rows"))]
    CsvRead { source: csv::Error },
    #[snafu(display(
        "No channel header row found in {} (scanned {scanned} rows)",
        path.display()
    ))]
    NoHeaderRow { path: PathBuf, scanned: usize },

    // Config management errors
    #[snafu(display("Could not find application config directory"))]
    NoConfigDir,
    #[snafu(display("Error reading config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error parsing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },

    // Report output errors
    #[snafu(display("Error writing report"))]
    ReportWriteError { source: io::Error },
}
