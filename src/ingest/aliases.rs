//! Header text to [`Channel`] resolution.
//!
//! [`ALIASES`] is the only place header spellings live. It is turned into a
//! lookup map once, keyed by [`normalize_header`] of each alias, and headers
//! are looked up with the very same function.

use std::{
    collections::{HashMap, HashSet},
    sync::LazyLock,
};

use log::debug;

use crate::telemetry::Channel;

/// User supplied mapping from literal header text to a channel. Wins over
/// every other rule.
pub type ColumnOverrides = HashMap<String, Channel>;

/// Known header spellings. When two entries normalize to the same text the
/// first one wins.
pub static ALIASES: &[(&str, Channel)] = &[
    // time
    ("time", Channel::Time),
    ("time [s]", Channel::Time),
    ("time (s)", Channel::Time),
    ("time s", Channel::Time),
    ("timestamp", Channel::Time),
    ("elapsed time", Channel::Time),
    ("zeit", Channel::Time),
    ("temps", Channel::Time),
    ("tiempo", Channel::Time),
    ("tempo", Channel::Time),
    ("session time", Channel::SessionTime),
    ("session_time", Channel::SessionTime),
    ("sessiontime", Channel::SessionTime),
    // distance
    ("distance", Channel::Distance),
    ("distance [m]", Channel::Distance),
    ("distance (m)", Channel::Distance),
    ("lap distance", Channel::Distance),
    ("lap dist", Channel::Distance),
    ("lapdist", Channel::Distance),
    ("dist", Channel::Distance),
    ("distanz", Channel::Distance),
    ("strecke", Channel::Distance),
    ("distancia", Channel::Distance),
    ("distanza", Channel::Distance),
    ("lap dist pct", Channel::LapDistPct),
    ("lapdistpct", Channel::LapDistPct),
    ("lap distance %", Channel::LapDistPct),
    ("normalized position", Channel::LapDistPct),
    ("track position", Channel::LapDistPct),
    // laps
    ("lap", Channel::LapNumber),
    ("lap number", Channel::LapNumber),
    ("lap no", Channel::LapNumber),
    ("lap #", Channel::LapNumber),
    ("laps", Channel::LapNumber),
    ("lap count", Channel::LapNumber),
    ("completed laps", Channel::LapNumber),
    ("runde", Channel::LapNumber),
    ("tour", Channel::LapNumber),
    ("vuelta", Channel::LapNumber),
    ("giro", Channel::LapNumber),
    ("lap time", Channel::LapTime),
    ("lap time [s]", Channel::LapTime),
    ("lap time (s)", Channel::LapTime),
    ("laptime", Channel::LapTime),
    ("current lap time", Channel::LapTime),
    ("lap current lap time", Channel::LapTime),
    ("rundenzeit", Channel::LapTime),
    ("temps au tour", Channel::LapTime),
    ("tiempo de vuelta", Channel::LapTime),
    ("tempo sul giro", Channel::LapTime),
    ("last lap time", Channel::LastLapTime),
    ("lap last lap time", Channel::LastLapTime),
    ("best lap time", Channel::BestLapTime),
    ("lap best lap time", Channel::BestLapTime),
    ("delta best", Channel::DeltaBest),
    ("lap delta to best lap", Channel::DeltaBest),
    ("sector", Channel::Sector),
    ("current sector", Channel::Sector),
    ("sector time", Channel::SectorTime),
    ("position", Channel::Position),
    ("race position", Channel::Position),
    ("pos x", Channel::PosX),
    ("world position x", Channel::PosX),
    ("pos y", Channel::PosY),
    ("world position y", Channel::PosY),
    ("pos z", Channel::PosZ),
    ("world position z", Channel::PosZ),
    ("lat", Channel::Latitude),
    ("latitude", Channel::Latitude),
    ("gps latitude", Channel::Latitude),
    ("lon", Channel::Longitude),
    ("long", Channel::Longitude),
    ("longitude", Channel::Longitude),
    ("gps longitude", Channel::Longitude),
    ("alt", Channel::Altitude),
    ("altitude", Channel::Altitude),
    ("gps altitude", Channel::Altitude),
    ("heading", Channel::Heading),
    ("gps heading", Channel::Heading),
    // speed and engine
    ("speed", Channel::Speed),
    ("speed [km/h]", Channel::Speed),
    ("speed (km/h)", Channel::Speed),
    ("ground speed", Channel::Speed),
    ("gps speed", Channel::Speed),
    ("vehicle speed", Channel::Speed),
    ("speed kmh", Channel::Speed),
    ("geschwindigkeit", Channel::Speed),
    ("vitesse", Channel::Speed),
    ("velocidad", Channel::Speed),
    ("velocita", Channel::Speed),
    ("rpm", Channel::Rpm),
    ("engine rpm", Channel::Rpm),
    ("engine speed", Channel::Rpm),
    ("drehzahl", Channel::Rpm),
    ("regime", Channel::Rpm),
    ("max rpm", Channel::MaxRpm),
    ("engine max rpm", Channel::MaxRpm),
    ("gear", Channel::Gear),
    ("current gear", Channel::Gear),
    ("gang", Channel::Gear),
    ("rapport", Channel::Gear),
    ("marcha", Channel::Gear),
    ("marcia", Channel::Gear),
    ("shift light", Channel::ShiftLight),
    ("shift lights", Channel::ShiftLight),
    ("engine torque", Channel::EngineTorque),
    ("torque", Channel::EngineTorque),
    ("engine power", Channel::EnginePower),
    ("power", Channel::EnginePower),
    ("boost", Channel::BoostPressure),
    ("turbo boost", Channel::BoostPressure),
    ("boost pressure", Channel::BoostPressure),
    // driver inputs
    ("throttle", Channel::Throttle),
    ("throttle pos", Channel::Throttle),
    ("throttle position", Channel::Throttle),
    ("throttle %", Channel::Throttle),
    ("throttle [%]", Channel::Throttle),
    ("gas", Channel::Throttle),
    ("accelerator", Channel::Throttle),
    ("gaspedal", Channel::Throttle),
    ("accelerateur", Channel::Throttle),
    ("acelerador", Channel::Throttle),
    ("acceleratore", Channel::Throttle),
    ("brake", Channel::Brake),
    ("brake pos", Channel::Brake),
    ("brake position", Channel::Brake),
    ("brake %", Channel::Brake),
    ("brake [%]", Channel::Brake),
    ("brake pedal", Channel::Brake),
    ("bremse", Channel::Brake),
    ("frein", Channel::Brake),
    ("freno", Channel::Brake),
    ("clutch", Channel::Clutch),
    ("clutch pos", Channel::Clutch),
    ("kupplung", Channel::Clutch),
    ("embrayage", Channel::Clutch),
    ("embrague", Channel::Clutch),
    ("frizione", Channel::Clutch),
    ("handbrake", Channel::Handbrake),
    ("hand brake", Channel::Handbrake),
    ("steering", Channel::SteeringAngle),
    ("steering angle", Channel::SteeringAngle),
    ("steering wheel angle", Channel::SteeringAngle),
    ("steer angle", Channel::SteeringAngle),
    ("steerangle", Channel::SteeringAngle),
    ("lenkwinkel", Channel::SteeringAngle),
    ("angle volant", Channel::SteeringAngle),
    ("angulo de direccion", Channel::SteeringAngle),
    ("angolo sterzo", Channel::SteeringAngle),
    ("steering pct", Channel::SteeringPct),
    ("steering %", Channel::SteeringPct),
    ("steering input", Channel::SteeringPct),
    ("steering torque", Channel::SteeringTorque),
    ("steering wheel torque", Channel::SteeringTorque),
    ("ffb", Channel::FfbOutput),
    ("force feedback", Channel::FfbOutput),
    ("ffb output", Channel::FfbOutput),
    // driver aids and car settings
    ("brake bias", Channel::BrakeBias),
    ("brake balance", Channel::BrakeBias),
    ("bremsbalance", Channel::BrakeBias),
    ("abs", Channel::AbsActive),
    ("abs active", Channel::AbsActive),
    ("abs in action", Channel::AbsActive),
    ("abs level", Channel::AbsLevel),
    ("abs setting", Channel::AbsLevel),
    ("tc", Channel::TcActive),
    ("tc active", Channel::TcActive),
    ("traction control active", Channel::TcActive),
    ("tc in action", Channel::TcActive),
    ("tc level", Channel::TcLevel),
    ("tc setting", Channel::TcLevel),
    ("traction control", Channel::TcLevel),
    ("tc cut", Channel::TcCut),
    ("engine map", Channel::EngineMap),
    ("engine mapping", Channel::EngineMap),
    ("pit limiter", Channel::PitLimiter),
    ("pit limiter on", Channel::PitLimiter),
    ("speed limiter", Channel::PitLimiter),
    ("drs available", Channel::DrsAvailable),
    ("drs allowed", Channel::DrsAvailable),
    ("drs", Channel::DrsActive),
    ("drs active", Channel::DrsActive),
    ("drs open", Channel::DrsActive),
    // energy
    ("fuel", Channel::Fuel),
    ("fuel level", Channel::Fuel),
    ("fuel remaining", Channel::Fuel),
    ("fuel [l]", Channel::Fuel),
    ("kraftstoff", Channel::Fuel),
    ("tank", Channel::Fuel),
    ("carburant", Channel::Fuel),
    ("combustible", Channel::Fuel),
    ("carburante", Channel::Fuel),
    ("fuel per lap", Channel::FuelPerLap),
    ("fuel used per lap", Channel::FuelPerLap),
    ("fuel pressure", Channel::FuelPressure),
    ("ers store", Channel::ErsStore),
    ("ers energy", Channel::ErsStore),
    ("battery", Channel::ErsStore),
    ("battery charge", Channel::ErsStore),
    ("ers deploy", Channel::ErsDeploy),
    ("ers deployed", Channel::ErsDeploy),
    ("ers harvest", Channel::ErsHarvest),
    ("ers harvested", Channel::ErsHarvest),
    ("ers power", Channel::ErsPower),
    ("ers power level", Channel::ErsPower),
    ("kers", Channel::ErsPower),
    ("ers level", Channel::ErsLevel),
    ("ers recovery level", Channel::ErsLevel),
    ("ers mode", Channel::ErsMode),
    ("ers deploy mode", Channel::ErsMode),
    ("battery temp", Channel::BatteryTemp),
    // fluids and ambient temperatures
    ("water temp", Channel::WaterTemp),
    ("water temperature", Channel::WaterTemp),
    ("coolant temp", Channel::WaterTemp),
    ("wassertemperatur", Channel::WaterTemp),
    ("oil temp", Channel::OilTemp),
    ("oil temperature", Channel::OilTemp),
    ("oltemperatur", Channel::OilTemp),
    ("oil pressure", Channel::OilPressure),
    ("oil press", Channel::OilPressure),
    ("air temp", Channel::AirTemp),
    ("air temperature", Channel::AirTemp),
    ("ambient temp", Channel::AirTemp),
    ("lufttemperatur", Channel::AirTemp),
    ("track temp", Channel::TrackTemp),
    ("track temperature", Channel::TrackTemp),
    ("road temp", Channel::TrackTemp),
    ("streckentemperatur", Channel::TrackTemp),
    // tires, core
    ("tire temp fl", Channel::TireTempCoreFl),
    ("tyre temp fl", Channel::TireTempCoreFl),
    ("tire core temp fl", Channel::TireTempCoreFl),
    ("tyre core temp fl", Channel::TireTempCoreFl),
    ("tire temp core fl", Channel::TireTempCoreFl),
    ("tyre temp core fl", Channel::TireTempCoreFl),
    ("lf tire temp", Channel::TireTempCoreFl),
    ("tire temp fr", Channel::TireTempCoreFr),
    ("tyre temp fr", Channel::TireTempCoreFr),
    ("tire core temp fr", Channel::TireTempCoreFr),
    ("tyre core temp fr", Channel::TireTempCoreFr),
    ("tire temp core fr", Channel::TireTempCoreFr),
    ("tyre temp core fr", Channel::TireTempCoreFr),
    ("rf tire temp", Channel::TireTempCoreFr),
    ("tire temp rl", Channel::TireTempCoreRl),
    ("tyre temp rl", Channel::TireTempCoreRl),
    ("tire core temp rl", Channel::TireTempCoreRl),
    ("tyre core temp rl", Channel::TireTempCoreRl),
    ("tire temp core rl", Channel::TireTempCoreRl),
    ("tyre temp core rl", Channel::TireTempCoreRl),
    ("lr tire temp", Channel::TireTempCoreRl),
    ("tire temp rr", Channel::TireTempCoreRr),
    ("tyre temp rr", Channel::TireTempCoreRr),
    ("tire core temp rr", Channel::TireTempCoreRr),
    ("tyre core temp rr", Channel::TireTempCoreRr),
    ("tire temp core rr", Channel::TireTempCoreRr),
    ("tyre temp core rr", Channel::TireTempCoreRr),
    ("rr tire temp", Channel::TireTempCoreRr),
    // tires, tread zones
    ("tire temp inner fl", Channel::TireTempInnerFl),
    ("tyre temp inner fl", Channel::TireTempInnerFl),
    ("lf temp r", Channel::TireTempInnerFl),
    ("tire temp inner fr", Channel::TireTempInnerFr),
    ("tyre temp inner fr", Channel::TireTempInnerFr),
    ("rf temp l", Channel::TireTempInnerFr),
    ("tire temp inner rl", Channel::TireTempInnerRl),
    ("tyre temp inner rl", Channel::TireTempInnerRl),
    ("lr temp r", Channel::TireTempInnerRl),
    ("tire temp inner rr", Channel::TireTempInnerRr),
    ("tyre temp inner rr", Channel::TireTempInnerRr),
    ("rr temp l", Channel::TireTempInnerRr),
    ("tire temp middle fl", Channel::TireTempMiddleFl),
    ("tyre temp middle fl", Channel::TireTempMiddleFl),
    ("lf temp m", Channel::TireTempMiddleFl),
    ("tire temp middle fr", Channel::TireTempMiddleFr),
    ("tyre temp middle fr", Channel::TireTempMiddleFr),
    ("rf temp m", Channel::TireTempMiddleFr),
    ("tire temp middle rl", Channel::TireTempMiddleRl),
    ("tyre temp middle rl", Channel::TireTempMiddleRl),
    ("lr temp m", Channel::TireTempMiddleRl),
    ("tire temp middle rr", Channel::TireTempMiddleRr),
    ("tyre temp middle rr", Channel::TireTempMiddleRr),
    ("rr temp m", Channel::TireTempMiddleRr),
    ("tire temp outer fl", Channel::TireTempOuterFl),
    ("tyre temp outer fl", Channel::TireTempOuterFl),
    ("lf temp l", Channel::TireTempOuterFl),
    ("tire temp outer fr", Channel::TireTempOuterFr),
    ("tyre temp outer fr", Channel::TireTempOuterFr),
    ("rf temp r", Channel::TireTempOuterFr),
    ("tire temp outer rl", Channel::TireTempOuterRl),
    ("tyre temp outer rl", Channel::TireTempOuterRl),
    ("lr temp l", Channel::TireTempOuterRl),
    ("tire temp outer rr", Channel::TireTempOuterRr),
    ("tyre temp outer rr", Channel::TireTempOuterRr),
    ("rr temp r", Channel::TireTempOuterRr),
    ("tire surface temp fl", Channel::TireTempSurfaceFl),
    ("tyre surface temp fl", Channel::TireTempSurfaceFl),
    ("tire surface temp fr", Channel::TireTempSurfaceFr),
    ("tyre surface temp fr", Channel::TireTempSurfaceFr),
    ("tire surface temp rl", Channel::TireTempSurfaceRl),
    ("tyre surface temp rl", Channel::TireTempSurfaceRl),
    ("tire surface temp rr", Channel::TireTempSurfaceRr),
    ("tyre surface temp rr", Channel::TireTempSurfaceRr),
    // tires, pressure and wear
    ("tire pressure fl", Channel::TirePressureFl),
    ("tyre pressure fl", Channel::TirePressureFl),
    ("tyre press fl", Channel::TirePressureFl),
    ("lf pressure", Channel::TirePressureFl),
    ("tire pressure fr", Channel::TirePressureFr),
    ("tyre pressure fr", Channel::TirePressureFr),
    ("tyre press fr", Channel::TirePressureFr),
    ("rf pressure", Channel::TirePressureFr),
    ("tire pressure rl", Channel::TirePressureRl),
    ("tyre pressure rl", Channel::TirePressureRl),
    ("tyre press rl", Channel::TirePressureRl),
    ("lr pressure", Channel::TirePressureRl),
    ("tire pressure rr", Channel::TirePressureRr),
    ("tyre pressure rr", Channel::TirePressureRr),
    ("tyre press rr", Channel::TirePressureRr),
    ("rr pressure", Channel::TirePressureRr),
    ("tire wear fl", Channel::TireWearFl),
    ("tyre wear fl", Channel::TireWearFl),
    ("tire wear fr", Channel::TireWearFr),
    ("tyre wear fr", Channel::TireWearFr),
    ("tire wear rl", Channel::TireWearRl),
    ("tyre wear rl", Channel::TireWearRl),
    ("tire wear rr", Channel::TireWearRr),
    ("tyre wear rr", Channel::TireWearRr),
    ("tire load fl", Channel::TireLoadFl),
    ("tyre load fl", Channel::TireLoadFl),
    ("wheel load fl", Channel::TireLoadFl),
    ("tire load fr", Channel::TireLoadFr),
    ("tyre load fr", Channel::TireLoadFr),
    ("wheel load fr", Channel::TireLoadFr),
    ("tire load rl", Channel::TireLoadRl),
    ("tyre load rl", Channel::TireLoadRl),
    ("wheel load rl", Channel::TireLoadRl),
    ("tire load rr", Channel::TireLoadRr),
    ("tyre load rr", Channel::TireLoadRr),
    ("wheel load rr", Channel::TireLoadRr),
    ("slip ratio fl", Channel::TireSlipRatioFl),
    ("wheel slip fl", Channel::TireSlipRatioFl),
    ("slip ratio fr", Channel::TireSlipRatioFr),
    ("wheel slip fr", Channel::TireSlipRatioFr),
    ("slip ratio rl", Channel::TireSlipRatioRl),
    ("wheel slip rl", Channel::TireSlipRatioRl),
    ("slip ratio rr", Channel::TireSlipRatioRr),
    ("wheel slip rr", Channel::TireSlipRatioRr),
    ("slip angle fl", Channel::TireSlipAngleFl),
    ("slip angle fr", Channel::TireSlipAngleFr),
    ("slip angle rl", Channel::TireSlipAngleRl),
    ("slip angle rr", Channel::TireSlipAngleRr),
    ("wheel speed fl", Channel::WheelSpeedFl),
    ("wheel speed lf", Channel::WheelSpeedFl),
    ("wheel speed fr", Channel::WheelSpeedFr),
    ("wheel speed rf", Channel::WheelSpeedFr),
    ("wheel speed rl", Channel::WheelSpeedRl),
    ("wheel speed lr", Channel::WheelSpeedRl),
    ("wheel speed rr", Channel::WheelSpeedRr),
    // brakes
    ("brake temp fl", Channel::BrakeTempFl),
    ("brake temperature fl", Channel::BrakeTempFl),
    ("brake disc temp fl", Channel::BrakeTempFl),
    ("lf brake temp", Channel::BrakeTempFl),
    ("brake temp fr", Channel::BrakeTempFr),
    ("brake temperature fr", Channel::BrakeTempFr),
    ("brake disc temp fr", Channel::BrakeTempFr),
    ("rf brake temp", Channel::BrakeTempFr),
    ("brake temp rl", Channel::BrakeTempRl),
    ("brake temperature rl", Channel::BrakeTempRl),
    ("brake disc temp rl", Channel::BrakeTempRl),
    ("lr brake temp", Channel::BrakeTempRl),
    ("brake temp rr", Channel::BrakeTempRr),
    ("brake temperature rr", Channel::BrakeTempRr),
    ("brake disc temp rr", Channel::BrakeTempRr),
    ("rr brake temp", Channel::BrakeTempRr),
    ("brake pressure fl", Channel::BrakePressureFl),
    ("brake line pressure fl", Channel::BrakePressureFl),
    ("brake pressure fr", Channel::BrakePressureFr),
    ("brake line pressure fr", Channel::BrakePressureFr),
    ("brake pressure rl", Channel::BrakePressureRl),
    ("brake line pressure rl", Channel::BrakePressureRl),
    ("brake pressure rr", Channel::BrakePressureRr),
    ("brake line pressure rr", Channel::BrakePressureRr),
    ("brake wear fl", Channel::BrakeWearFl),
    ("pad wear fl", Channel::BrakeWearFl),
    ("brake wear fr", Channel::BrakeWearFr),
    ("pad wear fr", Channel::BrakeWearFr),
    ("brake wear rl", Channel::BrakeWearRl),
    ("pad wear rl", Channel::BrakeWearRl),
    ("brake wear rr", Channel::BrakeWearRr),
    ("pad wear rr", Channel::BrakeWearRr),
    // suspension
    ("suspension travel fl", Channel::SuspTravelFl),
    ("susp travel fl", Channel::SuspTravelFl),
    ("damper pos fl", Channel::SuspTravelFl),
    ("lf shock defl", Channel::SuspTravelFl),
    ("suspension travel fr", Channel::SuspTravelFr),
    ("susp travel fr", Channel::SuspTravelFr),
    ("damper pos fr", Channel::SuspTravelFr),
    ("rf shock defl", Channel::SuspTravelFr),
    ("suspension travel rl", Channel::SuspTravelRl),
    ("susp travel rl", Channel::SuspTravelRl),
    ("damper pos rl", Channel::SuspTravelRl),
    ("lr shock defl", Channel::SuspTravelRl),
    ("suspension travel rr", Channel::SuspTravelRr),
    ("susp travel rr", Channel::SuspTravelRr),
    ("damper pos rr", Channel::SuspTravelRr),
    ("rr shock defl", Channel::SuspTravelRr),
    ("suspension velocity fl", Channel::SuspVelocityFl),
    ("damper velocity fl", Channel::SuspVelocityFl),
    ("lf shock vel", Channel::SuspVelocityFl),
    ("suspension velocity fr", Channel::SuspVelocityFr),
    ("damper velocity fr", Channel::SuspVelocityFr),
    ("rf shock vel", Channel::SuspVelocityFr),
    ("suspension velocity rl", Channel::SuspVelocityRl),
    ("damper velocity rl", Channel::SuspVelocityRl),
    ("lr shock vel", Channel::SuspVelocityRl),
    ("suspension velocity rr", Channel::SuspVelocityRr),
    ("damper velocity rr", Channel::SuspVelocityRr),
    ("rr shock vel", Channel::SuspVelocityRr),
    ("ride height fl", Channel::RideHeightFl),
    ("lf ride height", Channel::RideHeightFl),
    ("ride height fr", Channel::RideHeightFr),
    ("rf ride height", Channel::RideHeightFr),
    ("ride height rl", Channel::RideHeightRl),
    ("lr ride height", Channel::RideHeightRl),
    ("ride height rr", Channel::RideHeightRr),
    ("rr ride height", Channel::RideHeightRr),
    ("camber fl", Channel::CamberFl),
    ("camber fr", Channel::CamberFr),
    ("camber rl", Channel::CamberRl),
    ("camber rr", Channel::CamberRr),
    // forces
    ("g lat", Channel::GForceLat),
    ("lateral g", Channel::GForceLat),
    ("g force lat", Channel::GForceLat),
    ("g force lateral", Channel::GForceLat),
    ("gforce lat", Channel::GForceLat),
    ("lat g", Channel::GForceLat),
    ("querbeschleunigung", Channel::GForceLat),
    ("g long", Channel::GForceLong),
    ("longitudinal g", Channel::GForceLong),
    ("g force long", Channel::GForceLong),
    ("g force longitudinal", Channel::GForceLong),
    ("gforce long", Channel::GForceLong),
    ("long g", Channel::GForceLong),
    ("langsbeschleunigung", Channel::GForceLong),
    ("g vert", Channel::GForceVert),
    ("vertical g", Channel::GForceVert),
    ("g force vert", Channel::GForceVert),
    ("g force vertical", Channel::GForceVert),
    ("gforce vert", Channel::GForceVert),
    ("lat accel", Channel::AccelLat),
    ("lateral acceleration", Channel::AccelLat),
    ("accel lat", Channel::AccelLat),
    ("long accel", Channel::AccelLong),
    ("longitudinal acceleration", Channel::AccelLong),
    ("accel long", Channel::AccelLong),
    ("vert accel", Channel::AccelVert),
    ("vertical acceleration", Channel::AccelVert),
    ("accel vert", Channel::AccelVert),
    ("seat force", Channel::SeatForce),
    ("seat load", Channel::SeatForce),
    ("seat g", Channel::SeatForce),
    ("downforce front", Channel::DownforceFront),
    ("front downforce", Channel::DownforceFront),
    ("downforce rear", Channel::DownforceRear),
    ("rear downforce", Channel::DownforceRear),
    ("drag", Channel::Drag),
    ("drag force", Channel::Drag),
    // orientation
    ("yaw", Channel::Yaw),
    ("pitch", Channel::Pitch),
    ("roll", Channel::Roll),
    ("yaw rate", Channel::YawRate),
    ("yawrate", Channel::YawRate),
    ("gierrate", Channel::YawRate),
    ("pitch rate", Channel::PitchRate),
    ("roll rate", Channel::RollRate),
    ("velocity x", Channel::VelocityX),
    ("vel x", Channel::VelocityX),
    ("velocity y", Channel::VelocityY),
    ("vel y", Channel::VelocityY),
    ("velocity z", Channel::VelocityZ),
    ("vel z", Channel::VelocityZ),
    // flags and status
    ("lap invalidated", Channel::LapInvalidated),
    ("lap invalid", Channel::LapInvalidated),
    ("invalid lap", Channel::LapInvalidated),
    ("current lap invalid", Channel::LapInvalidated),
    ("tires off track", Channel::TiresOffTrack),
    ("tyres off track", Channel::TiresOffTrack),
    ("wheels off track", Channel::TiresOffTrack),
    ("num tyres out", Channel::TiresOffTrack),
    ("number of tyres out", Channel::TiresOffTrack),
    ("flags", Channel::Flags),
    ("flag", Channel::Flags),
    ("session flags", Channel::Flags),
    ("flagge", Channel::Flags),
    ("yellow flag", Channel::YellowFlag),
    ("blue flag", Channel::BlueFlag),
    ("in pit", Channel::InPit),
    ("in pits", Channel::InPit),
    ("is in pit", Channel::InPit),
    ("pit", Channel::InPit),
    ("in pit lane", Channel::InPitLane),
    ("pit lane", Channel::InPitLane),
    ("on pit road", Channel::InPitLane),
    // damage
    ("damage front", Channel::DamageFront),
    ("front damage", Channel::DamageFront),
    ("damage rear", Channel::DamageRear),
    ("rear damage", Channel::DamageRear),
    ("damage left", Channel::DamageLeft),
    ("damage right", Channel::DamageRight),
    ("engine damage", Channel::DamageEngine),
    ("gearbox damage", Channel::DamageGearbox),
    ("suspension damage", Channel::DamageSuspension),
    // environment
    ("rain", Channel::RainIntensity),
    ("rain intensity", Channel::RainIntensity),
    ("track wetness", Channel::TrackWetness),
    ("wetness", Channel::TrackWetness),
    ("wind speed", Channel::WindSpeed),
    ("wind direction", Channel::WindDirection),
    ("track grip", Channel::TrackGrip),
    ("grip", Channel::TrackGrip),
];

/// Substring keywords tried, in order, when a header has no exact alias.
/// Only the structural columns are located this way.
pub static KEYWORDS: &[(&str, Channel)] = &[
    ("lap time", Channel::LapTime),
    ("laptime", Channel::LapTime),
    ("rundenzeit", Channel::LapTime),
    ("distance", Channel::Distance),
    ("dist", Channel::Distance),
    ("distanz", Channel::Distance),
    ("strecke", Channel::Distance),
    ("lap", Channel::LapNumber),
    ("runde", Channel::LapNumber),
    ("vuelta", Channel::LapNumber),
    ("timestamp", Channel::Time),
    ("time", Channel::Time),
    ("zeit", Channel::Time),
    ("tiempo", Channel::Time),
];

static ALIAS_INDEX: LazyLock<HashMap<String, Channel>> = LazyLock::new(|| {
    let mut index = HashMap::with_capacity(ALIASES.len() + Channel::ALL.len());
    for (alias, channel) in ALIASES {
        index.entry(normalize_header(alias)).or_insert(*channel);
    }
    // canonical identifiers ("tire_temp_core_fl") always resolve too
    for channel in Channel::ALL {
        index.entry(normalize_header(channel.name())).or_insert(*channel);
    }
    index
});

/// Lower-case, turn underscores and hyphens into spaces, collapse whitespace
/// runs and trim.
pub fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact lookup of an already normalized header.
pub fn exact_match(normalized: &str) -> Option<Channel> {
    ALIAS_INDEX.get(normalized).copied()
}

/// Keyword containment lookup of an already normalized header.
pub fn keyword_match(normalized: &str) -> Option<Channel> {
    if normalized.is_empty() {
        return None;
    }
    KEYWORDS
        .iter()
        .find(|(keyword, _)| normalized.contains(keyword))
        .map(|(_, channel)| *channel)
}

/// Exact alias first, keyword containment second.
pub fn resolve_header(raw: &str) -> Option<Channel> {
    let normalized = normalize_header(raw);
    exact_match(&normalized).or_else(|| keyword_match(&normalized))
}

/// Column index to channel mapping for one header row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnMap {
    columns: Vec<(usize, Channel)>,
    dropped: Vec<String>,
}

impl ColumnMap {
    /// Resolves every header cell. Overrides match on the literal header text
    /// and win unconditionally; then exact aliases; then, for structural
    /// columns not already claimed, keyword containment. First match wins and
    /// unmatched cells are dropped.
    pub fn resolve(headers: &[String], overrides: &ColumnOverrides) -> Self {
        let mut map = ColumnMap::default();
        let mut pending = Vec::new();

        for (idx, raw) in headers.iter().enumerate() {
            if let Some(channel) = overrides.get(raw).or_else(|| overrides.get(raw.trim())) {
                map.columns.push((idx, *channel));
                continue;
            }
            let normalized = normalize_header(raw);
            match exact_match(&normalized) {
                Some(channel) => map.columns.push((idx, channel)),
                None => pending.push((idx, normalized, raw)),
            }
        }

        let mut claimed: HashSet<Channel> = map.columns.iter().map(|(_, c)| *c).collect();
        for (idx, normalized, raw) in pending {
            match keyword_match(&normalized) {
                Some(channel) if !claimed.contains(&channel) => {
                    debug!("Header '{}' matched {} by keyword", raw, channel);
                    claimed.insert(channel);
                    map.columns.push((idx, channel));
                }
                _ => {
                    if !normalized.is_empty() {
                        map.dropped.push(raw.clone());
                    }
                }
            }
        }
        map.columns.sort_by_key(|(idx, _)| *idx);
        map
    }

    /// (column index, channel) pairs in column order.
    pub fn columns(&self) -> &[(usize, Channel)] {
        &self.columns
    }

    /// Header cells that did not resolve to any channel.
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }

    /// First column mapped to `channel`.
    pub fn column_of(&self, channel: Channel) -> Option<usize> {
        self.columns
            .iter()
            .find(|(_, c)| *c == channel)
            .map(|(idx, _)| *idx)
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.column_of(channel).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn headers(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Lap_Time  [s] "), "lap time [s]");
        assert_eq!(normalize_header("Tyre-Temp--FL"), "tyre temp fl");
        assert_eq!(normalize_header("\tSPEED\n"), "speed");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn test_every_alias_resolves_to_a_channel() {
        // later duplicates lose to earlier entries, so compare against the
        // first registration of each normalized spelling
        let mut first: HashMap<String, Channel> = HashMap::new();
        for (alias, channel) in ALIASES {
            first.entry(normalize_header(alias)).or_insert(*channel);
        }
        for (alias, _) in ALIASES {
            let expected = first[&normalize_header(alias)];
            assert_eq!(resolve_header(alias), Some(expected), "alias '{alias}'");
        }
    }

    #[test]
    fn test_alias_table_has_no_conflicting_duplicates() {
        let mut seen: HashMap<String, Channel> = HashMap::new();
        for (alias, channel) in ALIASES {
            if let Some(previous) = seen.insert(normalize_header(alias), *channel) {
                assert_eq!(previous, *channel, "alias '{alias}' registered twice");
            }
        }
    }

    #[test]
    fn test_canonical_names_resolve() {
        for channel in Channel::ALL {
            assert_eq!(exact_match(&normalize_header(channel.name())), Some(*channel));
        }
    }

    #[test]
    fn test_variants_map_to_same_channel() {
        for header in ["Lap Time", "lap_time [s]", "Current Lap Time", "LAP-TIME"] {
            assert_eq!(resolve_header(header), Some(Channel::LapTime), "{header}");
        }
    }

    #[test]
    fn test_keyword_fallback_for_structural_columns() {
        assert_eq!(resolve_header("Elapsed Lap Time (sec)"), Some(Channel::LapTime));
        assert_eq!(resolve_header("Dist. from start"), Some(Channel::Distance));
        assert_eq!(resolve_header("Lap Index"), Some(Channel::LapNumber));
        assert_eq!(resolve_header("UTC time of day"), Some(Channel::Time));
        assert_eq!(resolve_header("Banana"), None);
    }

    #[test]
    fn test_column_map_overrides_win() {
        let mut overrides = ColumnOverrides::new();
        overrides.insert("Speed".to_string(), Channel::WheelSpeedFl);
        let map = ColumnMap::resolve(&headers(&["Time", "Speed", "Mystery"]), &overrides);
        assert_eq!(map.column_of(Channel::WheelSpeedFl), Some(1));
        assert!(!map.contains(Channel::Speed));
        assert_eq!(map.dropped(), &["Mystery".to_string()]);
    }

    #[test]
    fn test_keyword_match_does_not_steal_claimed_channel() {
        let map = ColumnMap::resolve(
            &headers(&["Time", "Sample time offset", "Lap Distance", "distance to leader"]),
            &ColumnOverrides::new(),
        );
        assert_eq!(map.column_of(Channel::Time), Some(0));
        assert_eq!(map.column_of(Channel::Distance), Some(2));
        assert_eq!(map.len(), 2);
        assert_eq!(map.dropped().len(), 2);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let row = headers(&["Time", "Lap", "Speed km/h", "Throttle %", "Brake %", "Gear"]);
        let a = ColumnMap::resolve(&row, &ColumnOverrides::new());
        let b = ColumnMap::resolve(&row, &ColumnOverrides::new());
        assert_eq!(a, b);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_normalization_is_idempotent(raw in "[ a-zA-Z_\\-\\t\\[\\]%]{0,30}") {
            let once = normalize_header(&raw);
            prop_assert_eq!(normalize_header(&once), once);
        }

        #[test]
        fn prop_alias_spelling_variants_resolve(idx in 0usize..ALIASES.len(), upper in any::<bool>()) {
            let (alias, _) = ALIASES[idx];
            let variant = alias.replace(' ', "_");
            let variant = if upper { variant.to_uppercase() } else { variant };
            prop_assert_eq!(resolve_header(&variant), resolve_header(alias));
        }
    }
}
