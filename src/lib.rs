// Library interface for lapwise
// This allows integration tests to access internal modules

pub mod analysis;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod report;
pub mod telemetry;

// Re-export commonly used types
pub use analysis::{CornerDetector, CornerKpis, ForceStats, LapAnalysis, SessionAnalysis};
pub use config::AnalysisConfig;
pub use errors::LapwiseError;
pub use ingest::{ColumnOverrides, import_file, import_reader};
pub use telemetry::{Channel, Lap, LapValidity, Sample};
