// Canonical in-memory telemetry model: channels, samples and laps

pub mod channel;
pub mod lap;
pub mod sample;
pub mod validity;

pub use channel::{Channel, UnknownChannel};
pub use lap::Lap;
pub use sample::Sample;
pub use validity::{LapValidity, LapValidityClassifier, SessionMedians, ValidityConfig};
