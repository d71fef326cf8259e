//! Prelude module for common re-exports.
//!
//! ```rust
//! use autosim_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{CONTROL_PERIOD_S, NOMINAL_BATTERY_VOLTAGE, ROLE_COUNT};

// ─── Roles ──────────────────────────────────────────────────────────
pub use crate::role::{Role, RoleParseError, RoleTag};

// ─── Simulated devices ──────────────────────────────────────────────
pub use crate::simdev::{SimDevice, SimDeviceBus, SimDouble};
