//! Workspace-wide constants.
//!
//! Single source of truth for the control period, supply voltage and the
//! simulated device names shared with the simulation front-end.

/// Number of drivetrain roles.
pub const ROLE_COUNT: usize = 5;

/// Nominal control period of the platform loop [s].
pub const CONTROL_PERIOD_S: f64 = 0.02;

/// Longest control period a configuration may ask for [s].
pub const MAX_CONTROL_PERIOD_S: f64 = 1.0;

/// Nominal battery voltage used when no supply estimate is available [V].
pub const NOMINAL_BATTERY_VOLTAGE: f64 = 12.0;

/// Default configuration file path for the `autosim` binary.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/autosim/drivetrain.toml";

// ─── Simulated device names (wire contract) ─────────────────────────

/// Device category of a SPARK MAX controller. The trailing space is part
/// of the name: index 5 yields `"SPARK MAX [5]"`.
pub const SPARK_MAX_DEVICE: &str = "SPARK MAX ";

/// Primary encoder position field.
pub const SPARK_MAX_POSITION: &str = "Position";

/// Primary encoder velocity field.
pub const SPARK_MAX_VELOCITY: &str = "Velocity";

/// Alternate encoder position field.
pub const SPARK_MAX_ALT_POSITION: &str = "Alt Encoder Position";

/// Alternate encoder velocity field.
pub const SPARK_MAX_ALT_VELOCITY: &str = "Alt Encoder Velocity";

/// Device category of the navX inertial sensor.
pub const NAVX_DEVICE: &str = "navX-Sensor";

/// The navX is always simulated at index 0.
pub const NAVX_INDEX: i32 = 0;

/// navX yaw field [deg, clockwise positive].
pub const NAVX_YAW: &str = "Yaw";
