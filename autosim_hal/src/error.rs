//! Binding error types.
//!
//! Every variant is a construction-time failure: binding is all-or-nothing
//! and the update loop never produces any of these.

use autosim_common::consts::ROLE_COUNT;
use autosim_common::role::Role;
use thiserror::Error;

/// Roles collected by the validator. Capacity equals the number of roles.
pub type RoleList = heapless::Vec<Role, ROLE_COUNT>;

/// Failure while discovering, validating or binding drivetrain components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The hardware object declares no role-tagged members.
    #[error("no role-tagged members found on {platform}")]
    EmptyDiscoverySet { platform: String },

    /// A role was tagged on more than one member.
    #[error("component {role} already initialized (duplicate on member '{member}')")]
    StructuralDuplication { role: Role, member: String },

    /// Roles left unsatisfied after discovery. Lists every missing role.
    #[error("failed to initialize components, missing: {}", join_roles(.roles))]
    MissingComponent { roles: RoleList },

    /// No adapter exists for this device type in this role.
    #[error("unsupported {role} type: {type_name}")]
    UnsupportedType { role: Role, type_name: String },

    /// The role accepts exactly one device type and got another.
    #[error("{role} is wrong type: {actual}; expected {expected}")]
    WrongType {
        role: Role,
        expected: &'static str,
        actual: String,
    },

    /// A bus-addressed encoder was tagged without its bus address.
    #[error("{role} on {type_name} requires a bus address (tag it as \"{role}@<id>\")")]
    MissingBusAddress { role: Role, type_name: String },

    /// The tagged bus address is not the one the encoder reads from, so
    /// simulated values would never reach it.
    #[error("{role} tagged with bus address {tagged} but its encoder is on {device}")]
    AddressMismatch { role: Role, tagged: u8, device: u8 },
}

impl BindError {
    /// Role the failure is about, if it concerns a single role.
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::StructuralDuplication { role, .. }
            | Self::UnsupportedType { role, .. }
            | Self::WrongType { role, .. }
            | Self::MissingBusAddress { role, .. }
            | Self::AddressMismatch { role, .. } => Some(*role),
            Self::EmptyDiscoverySet { .. } | Self::MissingComponent { .. } => None,
        }
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.name())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_every_role() {
        let mut roles = RoleList::new();
        roles.push(Role::LeftSensor).unwrap();
        roles.push(Role::OrientationSensor).unwrap();
        let err = BindError::MissingComponent { roles };
        let msg = err.to_string();
        assert!(msg.contains("LeftSensor, OrientationSensor"), "{msg}");
        assert_eq!(err.role(), None);
    }

    #[test]
    fn wrong_type_names_both_types() {
        let err = BindError::WrongType {
            role: Role::OrientationSensor,
            expected: "AHRS",
            actual: "ADXRS450_Gyro".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "OrientationSensor is wrong type: ADXRS450_Gyro; expected AHRS"
        );
        assert_eq!(err.role(), Some(Role::OrientationSensor));
    }
}
