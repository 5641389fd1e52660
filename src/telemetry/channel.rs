use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

macro_rules! channels {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal ),+ $(,)?) => {
        /// A named telemetry quantity. The vocabulary is closed: every column
        /// that survives ingestion is stored against one of these.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Channel {
            $( $(#[$meta])* $variant, )+
        }

        impl Channel {
            /// Every channel, in declaration order.
            pub const ALL: &'static [Channel] = &[ $( Channel::$variant, )+ ];

            /// Stable snake_case identifier, used for config files and CLI overrides.
            pub fn name(&self) -> &'static str {
                match self {
                    $( Channel::$variant => $name, )+
                }
            }
        }
    };
}

channels! {
    // timing and position
    /// Sample timestamp in seconds
    Time => "time",
    SessionTime => "session_time",
    /// Meters travelled along the track
    Distance => "distance",
    LapDistPct => "lap_dist_pct",
    /// Lap counter as logged (usually 0-based)
    LapNumber => "lap_number",
    /// Running time of the current lap in seconds
    LapTime => "lap_time",
    LastLapTime => "last_lap_time",
    BestLapTime => "best_lap_time",
    DeltaBest => "delta_best",
    Sector => "sector",
    SectorTime => "sector_time",
    Position => "position",
    PosX => "pos_x",
    PosY => "pos_y",
    PosZ => "pos_z",
    Latitude => "latitude",
    Longitude => "longitude",
    Altitude => "altitude",
    Heading => "heading",

    // speed and engine
    /// Ground speed in km/h
    Speed => "speed",
    Rpm => "rpm",
    MaxRpm => "max_rpm",
    Gear => "gear",
    ShiftLight => "shift_light",
    EngineTorque => "engine_torque",
    EnginePower => "engine_power",
    BoostPressure => "boost_pressure",

    // driver inputs
    Throttle => "throttle",
    Brake => "brake",
    Clutch => "clutch",
    Handbrake => "handbrake",
    /// Steering wheel angle in degrees, sign inverted at ingestion
    SteeringAngle => "steering_angle",
    SteeringPct => "steering_pct",
    SteeringTorque => "steering_torque",
    FfbOutput => "ffb_output",

    // driver aids and car settings
    BrakeBias => "brake_bias",
    AbsActive => "abs_active",
    AbsLevel => "abs_level",
    TcActive => "tc_active",
    TcLevel => "tc_level",
    TcCut => "tc_cut",
    EngineMap => "engine_map",
    PitLimiter => "pit_limiter",
    DrsAvailable => "drs_available",
    DrsActive => "drs_active",

    // energy
    Fuel => "fuel",
    FuelPerLap => "fuel_per_lap",
    FuelPressure => "fuel_pressure",
    ErsStore => "ers_store",
    ErsDeploy => "ers_deploy",
    ErsHarvest => "ers_harvest",
    ErsPower => "ers_power",
    ErsLevel => "ers_level",
    ErsMode => "ers_mode",
    BatteryTemp => "battery_temp",

    // fluids and ambient temperatures
    WaterTemp => "water_temp",
    OilTemp => "oil_temp",
    OilPressure => "oil_pressure",
    AirTemp => "air_temp",
    TrackTemp => "track_temp",

    // tires
    TireTempCoreFl => "tire_temp_core_fl",
    TireTempCoreFr => "tire_temp_core_fr",
    TireTempCoreRl => "tire_temp_core_rl",
    TireTempCoreRr => "tire_temp_core_rr",
    TireTempInnerFl => "tire_temp_inner_fl",
    TireTempInnerFr => "tire_temp_inner_fr",
    TireTempInnerRl => "tire_temp_inner_rl",
    TireTempInnerRr => "tire_temp_inner_rr",
    TireTempMiddleFl => "tire_temp_middle_fl",
    TireTempMiddleFr => "tire_temp_middle_fr",
    TireTempMiddleRl => "tire_temp_middle_rl",
    TireTempMiddleRr => "tire_temp_middle_rr",
    TireTempOuterFl => "tire_temp_outer_fl",
    TireTempOuterFr => "tire_temp_outer_fr",
    TireTempOuterRl => "tire_temp_outer_rl",
    TireTempOuterRr => "tire_temp_outer_rr",
    TireTempSurfaceFl => "tire_temp_surface_fl",
    TireTempSurfaceFr => "tire_temp_surface_fr",
    TireTempSurfaceRl => "tire_temp_surface_rl",
    TireTempSurfaceRr => "tire_temp_surface_rr",
    TirePressureFl => "tire_pressure_fl",
    TirePressureFr => "tire_pressure_fr",
    TirePressureRl => "tire_pressure_rl",
    TirePressureRr => "tire_pressure_rr",
    TireWearFl => "tire_wear_fl",
    TireWearFr => "tire_wear_fr",
    TireWearRl => "tire_wear_rl",
    TireWearRr => "tire_wear_rr",
    TireLoadFl => "tire_load_fl",
    TireLoadFr => "tire_load_fr",
    TireLoadRl => "tire_load_rl",
    TireLoadRr => "tire_load_rr",
    TireSlipRatioFl => "tire_slip_ratio_fl",
    TireSlipRatioFr => "tire_slip_ratio_fr",
    TireSlipRatioRl => "tire_slip_ratio_rl",
    TireSlipRatioRr => "tire_slip_ratio_rr",
    TireSlipAngleFl => "tire_slip_angle_fl",
    TireSlipAngleFr => "tire_slip_angle_fr",
    TireSlipAngleRl => "tire_slip_angle_rl",
    TireSlipAngleRr => "tire_slip_angle_rr",
    WheelSpeedFl => "wheel_speed_fl",
    WheelSpeedFr => "wheel_speed_fr",
    WheelSpeedRl => "wheel_speed_rl",
    WheelSpeedRr => "wheel_speed_rr",

    // brakes
    BrakeTempFl => "brake_temp_fl",
    BrakeTempFr => "brake_temp_fr",
    BrakeTempRl => "brake_temp_rl",
    BrakeTempRr => "brake_temp_rr",
    BrakePressureFl => "brake_pressure_fl",
    BrakePressureFr => "brake_pressure_fr",
    BrakePressureRl => "brake_pressure_rl",
    BrakePressureRr => "brake_pressure_rr",
    BrakeWearFl => "brake_wear_fl",
    BrakeWearFr => "brake_wear_fr",
    BrakeWearRl => "brake_wear_rl",
    BrakeWearRr => "brake_wear_rr",

    // suspension
    SuspTravelFl => "susp_travel_fl",
    SuspTravelFr => "susp_travel_fr",
    SuspTravelRl => "susp_travel_rl",
    SuspTravelRr => "susp_travel_rr",
    SuspVelocityFl => "susp_velocity_fl",
    SuspVelocityFr => "susp_velocity_fr",
    SuspVelocityRl => "susp_velocity_rl",
    SuspVelocityRr => "susp_velocity_rr",
    RideHeightFl => "ride_height_fl",
    RideHeightFr => "ride_height_fr",
    RideHeightRl => "ride_height_rl",
    RideHeightRr => "ride_height_rr",
    CamberFl => "camber_fl",
    CamberFr => "camber_fr",
    CamberRl => "camber_rl",
    CamberRr => "camber_rr",

    // forces
    /// Lateral acceleration in g
    GForceLat => "g_force_lat",
    /// Longitudinal acceleration in g
    GForceLong => "g_force_long",
    GForceVert => "g_force_vert",
    /// Lateral acceleration in m/s^2
    AccelLat => "accel_lat",
    AccelLong => "accel_long",
    AccelVert => "accel_vert",
    /// Vertical load felt at the seat
    SeatForce => "seat_force",
    DownforceFront => "downforce_front",
    DownforceRear => "downforce_rear",
    Drag => "drag",

    // orientation
    Yaw => "yaw",
    Pitch => "pitch",
    Roll => "roll",
    YawRate => "yaw_rate",
    PitchRate => "pitch_rate",
    RollRate => "roll_rate",
    VelocityX => "velocity_x",
    VelocityY => "velocity_y",
    VelocityZ => "velocity_z",

    // flags and status
    /// Non-zero when the sim invalidated the lap
    LapInvalidated => "lap_invalidated",
    /// Number of tires outside the track limits
    TiresOffTrack => "tires_off_track",
    Flags => "flags",
    YellowFlag => "yellow_flag",
    BlueFlag => "blue_flag",
    InPit => "in_pit",
    InPitLane => "in_pit_lane",

    // damage
    DamageFront => "damage_front",
    DamageRear => "damage_rear",
    DamageLeft => "damage_left",
    DamageRight => "damage_right",
    DamageEngine => "damage_engine",
    DamageGearbox => "damage_gearbox",
    DamageSuspension => "damage_suspension",

    // environment
    RainIntensity => "rain_intensity",
    TrackWetness => "track_wetness",
    WindSpeed => "wind_speed",
    WindDirection => "wind_direction",
    TrackGrip => "track_grip",
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a string does not name any channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChannel(pub String);

impl fmt::Display for UnknownChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown channel '{}'", self.0)
    }
}

impl std::error::Error for UnknownChannel {}

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownChannel(wanted.to_string()))
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_channel_names_are_unique() {
        let names: HashSet<&str> = Channel::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), Channel::ALL.len());
    }

    #[test]
    fn test_channel_from_str_roundtrips_name() {
        for channel in Channel::ALL {
            assert_eq!(channel.name().parse::<Channel>(), Ok(*channel));
        }
        assert_eq!("SPEED".parse::<Channel>(), Ok(Channel::Speed));
        assert!("warp_factor".parse::<Channel>().is_err());
    }

    #[test]
    fn test_channel_serde_uses_name() {
        let json = serde_json::to_string(&Channel::TireTempCoreFl).unwrap();
        assert_eq!(json, "\"tire_temp_core_fl\"");
        let back: Channel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Channel::TireTempCoreFl);
    }
}
