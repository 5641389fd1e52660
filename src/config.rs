use std::{fs::File, io::BufReader, path::Path};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    LapwiseError,
    analysis::{BrakeEventConfig, CornerConfig, ForceConfig},
    ingest::IngestConfig,
    telemetry::ValidityConfig,
};

pub const CONFIG_DIR_NAME: &str = "lapwise";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Thresholds for every stage of the pipeline. Fields missing from a config
/// file keep their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub ingest: IngestConfig,
    pub validity: ValidityConfig,
    pub corners: CornerConfig,
    pub forces: ForceConfig,
    pub brake_events: BrakeEventConfig,
}

impl AnalysisConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LapwiseError> {
        let file = File::open(path.as_ref()).map_err(|e| LapwiseError::ConfigIOError { source: e })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| LapwiseError::ConfigSerializeError { source: e })
    }

    /// Config from the user's config directory, `None` when there is no
    /// config file yet.
    pub fn from_local_file() -> Result<Option<Self>, LapwiseError> {
        let config_path = dirs::config_dir()
            .ok_or(LapwiseError::NoConfigDir)?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME);

        if config_path.exists() {
            info!("Loading config from {}", config_path.display());
            Self::from_file(config_path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// An explicit path wins, then the local config file, then defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, LapwiseError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::from_local_file() {
                Ok(config) => Ok(config.unwrap_or_default()),
                Err(LapwiseError::NoConfigDir) => Ok(Self::default()),
                Err(e) => Err(e),
            },
        }
    }
}
