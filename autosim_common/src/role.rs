//! Drivetrain role tags.
//!
//! `Role` names the functional slot a platform component fills. A
//! `RoleTag` is what a platform attaches to one of its members: the role
//! plus an optional bus address, meaningful only for sensors that live on
//! an addressed bus (CAN). Tags have a compact string form so they can be
//! declared in TOML: `"LeftSensor"`, `"RightSensor@12"`.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use thiserror::Error;

use crate::consts::ROLE_COUNT;

// ─── Role ───────────────────────────────────────────────────────────

/// Functional slot of a differential drivetrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    LeftMotor = 0,
    RightMotor = 1,
    LeftSensor = 2,
    RightSensor = 3,
    OrientationSensor = 4,
}

const_assert_eq!(Role::ALL.len(), ROLE_COUNT);

impl Role {
    /// Every role, in binding order.
    pub const ALL: [Role; 5] = [
        Self::LeftMotor,
        Self::RightMotor,
        Self::LeftSensor,
        Self::RightSensor,
        Self::OrientationSensor,
    ];

    /// Canonical name, identical to the `Display` form.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LeftMotor => "LeftMotor",
            Self::RightMotor => "RightMotor",
            Self::LeftSensor => "LeftSensor",
            Self::RightSensor => "RightSensor",
            Self::OrientationSensor => "OrientationSensor",
        }
    }

    /// Motor roles are bound as command sources, not adapters.
    pub const fn is_motor(self) -> bool {
        matches!(self, Self::LeftMotor | Self::RightMotor)
    }

    /// Sensor roles get a simulated counterpart.
    pub const fn is_sensor(self) -> bool {
        !self.is_motor()
    }

    /// Position/velocity sensor roles (the wheel encoders).
    pub const fn is_wheel_sensor(self) -> bool {
        matches!(self, Self::LeftSensor | Self::RightSensor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Role tag string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleParseError {
    /// Name is not one of the five roles.
    #[error("unknown role: {0:?}")]
    UnknownRole(String),

    /// Text after `@` is not a valid bus address.
    #[error("invalid bus address {address:?} on role {role}")]
    InvalidAddress { role: Role, address: String },

    /// Motors are addressed by the platform, not by the tag.
    #[error("role {0} does not take a bus address")]
    AddressNotAllowed(Role),
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| RoleParseError::UnknownRole(s.to_string()))
    }
}

// ─── RoleTag ────────────────────────────────────────────────────────

/// A role attached to a platform member, with its role-scoped parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleTag {
    pub role: Role,
    /// CAN address of the device backing this sensor. Only relative
    /// encoders on a motor controller need it; in-process encoders and
    /// the inertial sensor ignore it.
    pub bus_address: Option<u8>,
}

impl RoleTag {
    /// Tag without a bus address.
    pub const fn new(role: Role) -> Self {
        Self {
            role,
            bus_address: None,
        }
    }

    /// Sensor tag carrying a bus address.
    pub const fn with_address(role: Role, address: u8) -> Self {
        Self {
            role,
            bus_address: Some(address),
        }
    }
}

impl From<Role> for RoleTag {
    fn from(role: Role) -> Self {
        Self::new(role)
    }
}

impl FromStr for RoleTag {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, address) = match s.split_once('@') {
            Some((name, address)) => (name, Some(address)),
            None => (s, None),
        };
        let role: Role = name.trim().parse()?;
        let Some(address) = address else {
            return Ok(Self::new(role));
        };
        if role.is_motor() {
            return Err(RoleParseError::AddressNotAllowed(role));
        }
        let address = address.trim();
        address
            .parse::<u8>()
            .map(|a| Self::with_address(role, a))
            .map_err(|_| RoleParseError::InvalidAddress {
                role,
                address: address.to_string(),
            })
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bus_address {
            Some(address) => write!(f, "{}@{address}", self.role),
            None => write!(f, "{}", self.role),
        }
    }
}
