//! Role validation.
//!
//! Enforces exactly one component per role over the single pass of
//! discovered descriptors. A second assignment to a role fails
//! immediately; after the pass every still-unset role is reported at
//! once.

use autosim_common::consts::ROLE_COUNT;
use autosim_common::role::Role;
use bitflags::bitflags;
use static_assertions::const_assert;

use crate::discovery::ComponentDescriptor;
use crate::error::{BindError, RoleList};

bitflags! {
    /// Set of roles, one bit per role in binding order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RoleSet: u8 {
        const LEFT_MOTOR         = 0x01;
        const RIGHT_MOTOR        = 0x02;
        const LEFT_SENSOR        = 0x04;
        const RIGHT_SENSOR       = 0x08;
        const ORIENTATION_SENSOR = 0x10;
    }
}

const_assert!(ROLE_COUNT <= u8::BITS as usize);

impl RoleSet {
    /// Single-role set.
    pub const fn of(role: Role) -> Self {
        Self::from_bits_truncate(1 << role as u8)
    }

    pub const fn has(self, role: Role) -> bool {
        self.contains(Self::of(role))
    }

    /// Roles not in this set, in binding order.
    pub fn missing(self) -> RoleList {
        // At most ROLE_COUNT roles, the list's capacity.
        Role::ALL.into_iter().filter(|r| !self.has(*r)).collect()
    }
}

/// One validated descriptor per role.
#[derive(Debug, Clone)]
pub struct RoleAssignment {
    pub left_motor: ComponentDescriptor,
    pub right_motor: ComponentDescriptor,
    pub left_sensor: ComponentDescriptor,
    pub right_sensor: ComponentDescriptor,
    pub orientation: ComponentDescriptor,
}

/// In-progress assignment: one slot per role, each set at most once.
#[derive(Debug, Default)]
pub struct RoleSlots {
    slots: [Option<ComponentDescriptor>; ROLE_COUNT],
    assigned: RoleSet,
}

impl RoleSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assigned(&self) -> RoleSet {
        self.assigned
    }

    /// Put `descriptor` in the slot for its role.
    ///
    /// # Errors
    /// `BindError::StructuralDuplication` if the slot is already set.
    pub fn assign(&mut self, descriptor: ComponentDescriptor) -> Result<(), BindError> {
        let role = descriptor.role();
        if self.assigned.has(role) {
            return Err(BindError::StructuralDuplication {
                role,
                member: descriptor.member.to_string(),
            });
        }
        self.assigned |= RoleSet::of(role);
        self.slots[role as usize] = Some(descriptor);
        Ok(())
    }

    /// Close the pass.
    ///
    /// # Errors
    /// `BindError::MissingComponent` naming every unset role.
    pub fn finish(self) -> Result<RoleAssignment, BindError> {
        let missing = self.assigned.missing();
        match self.slots {
            [
                Some(left_motor),
                Some(right_motor),
                Some(left_sensor),
                Some(right_sensor),
                Some(orientation),
            ] => Ok(RoleAssignment {
                left_motor,
                right_motor,
                left_sensor,
                right_sensor,
                orientation,
            }),
            _ => Err(BindError::MissingComponent { roles: missing }),
        }
    }
}

/// Run the full validation pass over discovered descriptors.
pub fn validate(
    descriptors: impl IntoIterator<Item = ComponentDescriptor>,
) -> Result<RoleAssignment, BindError> {
    let mut slots = RoleSlots::new();
    for descriptor in descriptors {
        slots.assign(descriptor)?;
    }
    slots.finish()
}
