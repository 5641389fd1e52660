// Derived analyses over the lap model. Everything here is a pure function of
// already built laps, so callers may run it per lap in parallel.

pub mod corner_detector;
pub mod corner_kpis;
pub mod force_stats;
pub mod lap_stats;
pub mod session;
pub mod signal;

pub use corner_detector::{CornerConfig, CornerDetector, CornerGate, CornerSegment, CornerState};
pub use corner_kpis::CornerKpis;
pub use force_stats::{ForceConfig, ForceStats, SeatDistribution};
pub use lap_stats::{
    ApexPoint, BrakeEvent, BrakeEventConfig, DeltaPoint, LapAnalysis, LapStats,
};
pub use session::{SessionAnalysis, SessionSummary};
