// Tabular telemetry import: header location, alias resolution and lap splitting

pub mod aliases;
pub mod lap_builder;
pub mod parser;

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub use aliases::{ColumnMap, ColumnOverrides};
pub use lap_builder::LapBuilder;

use crate::{LapwiseError, telemetry::Lap};

const BOM: char = '\u{feff}';
const STREAM_SOURCE: &str = "<stream>";

/// Knobs for the import step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Rows inspected while looking for the channel header
    pub max_header_scan_rows: usize,
    /// Distance drop (m) between consecutive rows that starts a new lap
    pub lap_distance_reset_m: f64,
    /// Lap time drop (s) between consecutive rows that starts a new lap
    pub lap_time_reset_s: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_header_scan_rows: 200,
            lap_distance_reset_m: 50.0,
            lap_time_reset_s: 0.05,
        }
    }
}

/// Reads a telemetry export from disk and splits it into laps.
///
/// Fails when the file cannot be read or no header row is found. Malformed
/// individual rows never fail the import.
pub fn import_file(
    path: impl AsRef<Path>,
    overrides: &ColumnOverrides,
) -> Result<Vec<Lap>, LapwiseError> {
    import_file_with(path, overrides, &IngestConfig::default())
}

pub fn import_file_with(
    path: impl AsRef<Path>,
    overrides: &ColumnOverrides,
    config: &IngestConfig,
) -> Result<Vec<Lap>, LapwiseError> {
    let path = path.as_ref();
    info!("Importing telemetry from {}", path.display());
    let bytes = fs::read(path).map_err(|e| LapwiseError::TelemetryFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    import_bytes(&bytes, overrides, config, path)
}

/// Same as [`import_file`] for an in-memory or streamed source.
pub fn import_reader(
    mut reader: impl Read,
    overrides: &ColumnOverrides,
) -> Result<Vec<Lap>, LapwiseError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| LapwiseError::TelemetryFileRead {
            path: PathBuf::from(STREAM_SOURCE),
            source: e,
        })?;
    import_bytes(
        &bytes,
        overrides,
        &IngestConfig::default(),
        Path::new(STREAM_SOURCE),
    )
}

fn import_bytes(
    bytes: &[u8],
    overrides: &ColumnOverrides,
    config: &IngestConfig,
    source: &Path,
) -> Result<Vec<Lap>, LapwiseError> {
    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix(BOM).unwrap_or(&decoded);
    let delimiter = parser::sniff_delimiter(text);
    debug!("Sniffed delimiter {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let mut scanned = 0;
    let mut header = None;
    while scanned < config.max_header_scan_rows {
        let Some(record) = records.next() else { break };
        let Some(row) = to_row(record)? else { continue };
        scanned += 1;
        if parser::is_header_row(&row) {
            header = Some(row);
            break;
        }
    }
    let Some(header) = header else {
        return Err(LapwiseError::NoHeaderRow {
            path: source.to_path_buf(),
            scanned,
        });
    };
    debug!("Header found at row {}", scanned);

    let columns = ColumnMap::resolve(&header, overrides);
    info!(
        "Resolved {} of {} columns",
        columns.len(),
        header.iter().filter(|h| !h.trim().is_empty()).count()
    );
    if !columns.dropped().is_empty() {
        debug!("Unmapped columns: {}", columns.dropped().join(", "));
    }
    for name in overrides.keys() {
        if !header.iter().any(|h| h == name || h.trim() == name.trim()) {
            warn!("Column override {name:?} does not match any header cell");
        }
    }

    let mut builder = LapBuilder::new(columns, config.clone());
    let mut first = true;
    for record in records {
        let Some(row) = to_row(record)? else { continue };
        if std::mem::take(&mut first) && parser::is_units_row(&row) {
            debug!("Skipping units row");
            continue;
        }
        builder.push_row(&row);
    }
    Ok(builder.finish())
}

// Malformed records are skipped; only reader-level I/O failures propagate.
fn to_row(record: csv::Result<csv::StringRecord>) -> Result<Option<Vec<String>>, LapwiseError> {
    match record {
        Ok(record) => Ok(Some(record.iter().map(str::to_string).collect())),
        Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
            Err(LapwiseError::CsvRead { source: e })
        }
        Err(e) => {
            warn!("Skipping malformed record: {e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::Channel;

    const MOTEC_STYLE: &str = "\u{feff}\"Format\",\"MoTeC CSV File\"\n\
        \"Venue\",\"Spa\"\n\
        \n\
        \"Time\",\"Distance\",\"Lap\",\"Speed\",\"Throttle\",\"Brake\",\"Comment\"\n\
        \"s\",\"m\",\"\",\"km/h\",\"%\",\"%\",\"\"\n\
        0.0,0,0,100,50,0,x\n\
        0.1,3,0,101,55,0,x\n\
        0.2,6,1,102,60,0,x\n";

    #[test]
    fn test_import_motec_style_preamble() {
        let laps = import_reader(MOTEC_STYLE.as_bytes(), &ColumnOverrides::new()).unwrap();
        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].len(), 2);
        assert_eq!(laps[0].samples()[1].get(Channel::Speed), Some(101.0));
        assert_eq!(laps[1].samples()[0].distance(), 6.0);
    }

    #[test]
    fn test_import_semicolon_decimal_comma() {
        let text = "Zeit;Distanz;Runde;Geschwindigkeit;Gas;Bremse\n\
            0,0;0,0;0;100,5;50;0\n\
            0,1;2,5;0;101,5;55;0\n";
        let laps = import_reader(text.as_bytes(), &ColumnOverrides::new()).unwrap();
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].samples()[1].distance(), 2.5);
        assert_eq!(laps[0].samples()[0].get(Channel::Speed), Some(100.5));
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let text = "a,b,c\n1,2,3\n";
        let err = import_reader(text.as_bytes(), &ColumnOverrides::new()).unwrap_err();
        assert!(matches!(err, LapwiseError::NoHeaderRow { scanned: 2, .. }));
    }

    #[test]
    fn test_header_scan_is_bounded() {
        let mut text = "junk\n".repeat(10);
        text.push_str("Time,Distance,Lap,Speed,Throttle\n0,0,0,100,50\n");
        let config = IngestConfig {
            max_header_scan_rows: 5,
            ..IngestConfig::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late_header.csv");
        fs::write(&path, &text).unwrap();
        assert!(import_file_with(&path, &ColumnOverrides::new(), &config).is_err());
        assert_eq!(import_file(&path, &ColumnOverrides::new()).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = import_file("/nonexistent/telemetry.csv", &ColumnOverrides::new()).unwrap_err();
        assert!(matches!(err, LapwiseError::TelemetryFileRead { .. }));
    }

    #[test]
    fn test_override_maps_unknown_header() {
        let text = "Time,Distance,Lap,Speed,Throttle,Mystery\n0,0,0,100,50,7\n";
        let mut overrides = ColumnOverrides::new();
        overrides.insert("Mystery".to_string(), Channel::Fuel);
        let laps = import_reader(text.as_bytes(), &overrides).unwrap();
        assert_eq!(laps[0].samples()[0].get(Channel::Fuel), Some(7.0));
    }

    #[test]
    fn test_ragged_rows_are_tolerated() {
        let text = "Time,Distance,Lap,Speed,Throttle\n0,0,0,100\n0.1,1,0,101,50,extra,cells\n";
        let laps = import_reader(text.as_bytes(), &ColumnOverrides::new()).unwrap();
        assert_eq!(laps[0].len(), 2);
        assert_eq!(laps[0].samples()[1].get(Channel::Throttle), Some(50.0));
    }
}
