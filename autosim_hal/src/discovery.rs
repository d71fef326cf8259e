//! Component discovery.
//!
//! A platform exposes its members through [`HardwareObject::members`].
//! Each member may carry a [`RoleTag`]; discovery keeps the tagged ones
//! and turns them into [`ComponentDescriptor`]s in a single pass.
//! Untagged members cost one `Option` check and their handle is never
//! touched.
//!
//! Discovery must only run in simulated execution; the binding engine
//! short-circuits before calling it on real hardware.

use std::sync::Arc;
use std::time::Instant;

use autosim_common::role::{Role, RoleTag};
use tracing::{debug, trace};

use crate::devices::{
    Device, MotorController, MotorGroup, NavX, QuadratureEncoder, SparkMaxEncoder,
};
use crate::error::BindError;

/// Anything that can hand out a [`Device`] view of itself.
pub trait DeviceHandle {
    fn device(&self) -> Device;
}

impl DeviceHandle for Device {
    fn device(&self) -> Device {
        self.clone()
    }
}

impl DeviceHandle for Arc<MotorGroup> {
    fn device(&self) -> Device {
        let motor: Arc<dyn MotorController> = self.clone();
        Device::Motor(motor)
    }
}

impl DeviceHandle for QuadratureEncoder {
    fn device(&self) -> Device {
        Device::Quadrature(self.clone())
    }
}

impl DeviceHandle for SparkMaxEncoder {
    fn device(&self) -> Device {
        Device::SparkMax(self.clone())
    }
}

impl DeviceHandle for NavX {
    fn device(&self) -> Device {
        Device::NavX(self.clone())
    }
}

/// One member of a hardware-control object.
pub struct Member<'a> {
    pub name: &'static str,
    pub tag: Option<RoleTag>,
    handle: &'a dyn DeviceHandle,
}

impl<'a> Member<'a> {
    /// Member carrying a role tag.
    pub fn tagged(
        name: &'static str,
        tag: impl Into<RoleTag>,
        handle: &'a dyn DeviceHandle,
    ) -> Self {
        Self {
            name,
            tag: Some(tag.into()),
            handle,
        }
    }

    /// Member the engine should ignore.
    pub fn untagged(name: &'static str, handle: &'a dyn DeviceHandle) -> Self {
        Self {
            name,
            tag: None,
            handle,
        }
    }
}

/// A platform object holding drivetrain hardware.
pub trait HardwareObject {
    /// Every member the object holds, tagged or not.
    fn members(&self) -> Vec<Member<'_>>;

    /// Name used in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A tagged member, ready for validation and adapter construction.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub tag: RoleTag,
    /// Member name on the hardware object.
    pub member: &'static str,
    pub device: Device,
}

impl ComponentDescriptor {
    pub fn role(&self) -> Role {
        self.tag.role
    }

    pub fn type_name(&self) -> &str {
        self.device.type_name()
    }
}

/// Collect the descriptors of every tagged member of `hw`.
///
/// # Errors
/// `BindError::EmptyDiscoverySet` if no member carries a tag.
pub fn discover<H>(hw: &H) -> Result<Vec<ComponentDescriptor>, BindError>
where
    H: HardwareObject + ?Sized,
{
    let start = Instant::now();
    let members = hw.members();
    let listed = start.elapsed();

    let total = members.len();
    let descriptors: Vec<ComponentDescriptor> = members
        .into_iter()
        .filter_map(|member| {
            let tag = member.tag?;
            let device = member.handle.device();
            trace!(member = member.name, %tag, device = device.type_name(), "tagged member");
            Some(ComponentDescriptor {
                tag,
                member: member.name,
                device,
            })
        })
        .collect();

    debug!(
        platform = hw.name(),
        members = total,
        tagged = descriptors.len(),
        list_us = listed.as_micros() as u64,
        total_us = start.elapsed().as_micros() as u64,
        "discovery complete"
    );

    if descriptors.is_empty() {
        return Err(BindError::EmptyDiscoverySet {
            platform: hw.name().to_string(),
        });
    }
    Ok(descriptors)
}

/// Descriptors carrying `role`, in discovery order.
pub fn with_role(
    descriptors: &[ComponentDescriptor],
    role: Role,
) -> impl Iterator<Item = &ComponentDescriptor> {
    descriptors.iter().filter(move |d| d.role() == role)
}
