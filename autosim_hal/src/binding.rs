//! Binding engine.
//!
//! Turns a hardware-control object into a [`BoundContext`]:
//!
//! ```text
//! ExecutionMode::Real ──► Ok(None)            (nothing touched)
//! ExecutionMode::Simulated
//!     discover ──► validate ──► command_source / adapter factory ──► Ok(Some(ctx))
//! ```
//!
//! Binding is all-or-nothing. Any failure returns a [`BindError`] and no
//! context exists; the model passed in is dropped with it.

use std::fmt;
use std::sync::Arc;

use autosim_common::consts::NOMINAL_BATTERY_VOLTAGE;
use autosim_common::role::{Role, RoleTag};
use autosim_common::simdev::SimDouble;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapter::{
    NavxAdapter, SensorKind, WheelSensor, build_orientation_sensor, build_wheel_sensor,
    command_source, navx_kind,
};
use crate::devices::{Device, MotorHandle};
use crate::discovery::{ComponentDescriptor, HardwareObject, discover};
use crate::error::BindError;
use crate::model::{DifferentialDrivetrainSim, DrivetrainModel};
use crate::update::TickSample;
use crate::validator::validate;

/// Whether the process is driving real hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Physical devices are attached; binding is skipped entirely.
    Real,
    /// Devices are simulated and get bound to the model.
    Simulated,
}

impl ExecutionMode {
    /// `true` for [`ExecutionMode::Real`].
    pub fn is_real(self) -> bool {
        self == Self::Real
    }
}

/// Sign applied to the model heading before it reaches the gyro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingSign {
    /// Gyro reports clockwise-positive yaw (navX mounted upright).
    #[default]
    Inverted,
    /// Gyro reports counter-clockwise-positive yaw.
    Direct,
}

impl HeadingSign {
    /// Value reported by the gyro for a model heading, same unit.
    #[inline]
    pub fn apply(self, heading: f64) -> f64 {
        match self {
            Self::Inverted => -heading,
            Self::Direct => heading,
        }
    }
}

// ─── Supply voltage ─────────────────────────────────────────────────

/// Source of the battery voltage estimate used to scale duty cycles.
pub trait SupplyVoltage: Send + Sync + fmt::Debug {
    /// Current supply voltage [V].
    fn voltage(&self) -> f64;
}

/// Constant supply voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSupply(pub f64);

impl SupplyVoltage for FixedSupply {
    fn voltage(&self) -> f64 {
        self.0
    }
}

/// A simulated field, so a front-end can sag the battery.
impl SupplyVoltage for SimDouble {
    fn voltage(&self) -> f64 {
        self.get()
    }
}

/// Parameters of a binding that are not discovered from the platform.
#[derive(Debug, Clone)]
pub struct BindOptions {
    /// Sign between model heading and gyro yaw. Default: inverted.
    pub heading_sign: HeadingSign,
    /// Voltage multiplied into every duty cycle. Default: 12 V fixed.
    pub supply: Arc<dyn SupplyVoltage>,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            heading_sign: HeadingSign::default(),
            supply: Arc::new(FixedSupply(NOMINAL_BATTERY_VOLTAGE)),
        }
    }
}

// ─── Bound context ──────────────────────────────────────────────────

/// Backend each sensor role was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorKinds {
    /// Left wheel sensor backend.
    pub left: SensorKind,
    /// Right wheel sensor backend.
    pub right: SensorKind,
    /// Always the navX.
    pub orientation: SensorKind,
}

/// Fully validated simulation context, consumed by the update loop.
#[derive(Debug)]
pub struct BoundContext<M: DrivetrainModel = DifferentialDrivetrainSim> {
    pub(crate) model: M,
    pub(crate) left_motor: MotorHandle,
    pub(crate) right_motor: MotorHandle,
    pub(crate) left_sensor: WheelSensor,
    pub(crate) right_sensor: WheelSensor,
    pub(crate) orientation: NavxAdapter,
    pub(crate) heading_sign: HeadingSign,
    pub(crate) supply: Arc<dyn SupplyVoltage>,
    pub(crate) cycles: u64,
    pub(crate) last_sample: TickSample,
}

impl<M: DrivetrainModel> BoundContext<M> {
    /// Physics model owned by the context.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Sign applied to the heading before every yaw write.
    pub fn heading_sign(&self) -> HeadingSign {
        self.heading_sign
    }

    /// Backend each sensor role resolved to.
    pub fn sensor_kinds(&self) -> SensorKinds {
        SensorKinds {
            left: self.left_sensor.kind(),
            right: self.right_sensor.kind(),
            orientation: navx_kind(),
        }
    }

    /// Ticks executed since binding.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Values written by the most recent tick.
    pub fn last_sample(&self) -> &TickSample {
        &self.last_sample
    }

    /// Typed construction: one argument per role.
    ///
    /// Duplicate and missing roles cannot be expressed here. Sensor
    /// devices still go through the adapter factory, so an unsupported
    /// backend fails the same way as on the discovery path.
    ///
    /// Returns `Ok(None)` on real hardware without inspecting `components`.
    ///
    /// # Errors
    /// `UnsupportedType`, `MissingBusAddress` or `AddressMismatch` for a
    /// wheel sensor, `WrongType` for an orientation device other than a
    /// navX.
    pub fn from_components(
        components: DrivetrainComponents,
        model: M,
        mode: ExecutionMode,
        options: BindOptions,
    ) -> Result<Option<Self>, BindError> {
        if mode.is_real() {
            debug!("real hardware, skipping simulated binding");
            return Ok(None);
        }

        let DrivetrainComponents {
            left_motor,
            right_motor,
            left_sensor,
            right_sensor,
            orientation,
        } = components;

        let left_sensor =
            build_wheel_sensor(left_sensor.tag(Role::LeftSensor), &left_sensor.device)?;
        let right_sensor =
            build_wheel_sensor(right_sensor.tag(Role::RightSensor), &right_sensor.device)?;
        let orientation =
            build_orientation_sensor(RoleTag::new(Role::OrientationSensor), &orientation)?;

        let ctx = Self::assemble(
            model,
            [left_motor, right_motor],
            [left_sensor, right_sensor],
            orientation,
            options,
        );
        ctx.log_bound("components");
        Ok(Some(ctx))
    }

    fn assemble(
        model: M,
        [left_motor, right_motor]: [MotorHandle; 2],
        [left_sensor, right_sensor]: [WheelSensor; 2],
        orientation: NavxAdapter,
        options: BindOptions,
    ) -> Self {
        Self {
            model,
            left_motor,
            right_motor,
            left_sensor,
            right_sensor,
            orientation,
            heading_sign: options.heading_sign,
            supply: options.supply,
            cycles: 0,
            last_sample: TickSample::default(),
        }
    }

    fn log_bound(&self, source: &str) {
        let kinds = self.sensor_kinds();
        info!(
            source,
            left = ?kinds.left,
            right = ?kinds.right,
            heading_sign = ?self.heading_sign,
            supply_v = self.supply.voltage(),
            "drivetrain simulation bound"
        );
    }
}

// ─── Typed components ───────────────────────────────────────────────

/// A wheel-sensor device plus its role-scoped bus address.
#[derive(Debug, Clone)]
pub struct SensorBinding {
    /// Encoder handle.
    pub device: Device,
    /// Address of the owning controller, required for SPARK MAX encoders.
    pub bus_address: Option<u8>,
}

impl SensorBinding {
    /// Sensor addressed in-process or through its own handle.
    pub fn new(device: impl Into<Device>) -> Self {
        Self {
            device: device.into(),
            bus_address: None,
        }
    }

    /// Sensor addressed on the simulated bus.
    pub fn at(device: impl Into<Device>, bus_address: u8) -> Self {
        Self {
            device: device.into(),
            bus_address: Some(bus_address),
        }
    }

    fn tag(&self, role: Role) -> RoleTag {
        RoleTag {
            role,
            bus_address: self.bus_address,
        }
    }
}

/// One handle per role, for [`BoundContext::from_components`].
#[derive(Debug, Clone)]
pub struct DrivetrainComponents {
    pub left_motor: MotorHandle,
    pub right_motor: MotorHandle,
    pub left_sensor: SensorBinding,
    pub right_sensor: SensorBinding,
    pub orientation: Device,
}

// ─── Discovery path ─────────────────────────────────────────────────

/// Bind `hw` with default options.
///
/// # Errors
/// As [`initialize_with`].
pub fn initialize<H, M>(
    hw: &H,
    model: M,
    mode: ExecutionMode,
) -> Result<Option<BoundContext<M>>, BindError>
where
    H: HardwareObject + ?Sized,
    M: DrivetrainModel,
{
    initialize_with(hw, model, mode, BindOptions::default())
}

/// Bind `hw`: discover tagged members, validate the roles, build adapters.
///
/// Returns `Ok(None)` on real hardware without touching `hw`.
///
/// # Errors
/// - `EmptyDiscoverySet` if no member is tagged
/// - `StructuralDuplication` on the second member tagged with a role
/// - `MissingComponent` listing every role left untagged
/// - `WrongType`, `UnsupportedType`, `MissingBusAddress` or
///   `AddressMismatch` from the adapter factory
///
/// No context is produced on error.
pub fn initialize_with<H, M>(
    hw: &H,
    model: M,
    mode: ExecutionMode,
    options: BindOptions,
) -> Result<Option<BoundContext<M>>, BindError>
where
    H: HardwareObject + ?Sized,
    M: DrivetrainModel,
{
    if mode.is_real() {
        debug!(platform = hw.name(), "real hardware, skipping simulated binding");
        return Ok(None);
    }

    let descriptors = discover(hw)?;
    let roles = validate(descriptors)?;

    let left_motor = motor(&roles.left_motor)?;
    let right_motor = motor(&roles.right_motor)?;
    let left_sensor = wheel(&roles.left_sensor)?;
    let right_sensor = wheel(&roles.right_sensor)?;
    let orientation = build_orientation_sensor(roles.orientation.tag, &roles.orientation.device)?;

    let ctx = BoundContext::assemble(
        model,
        [left_motor, right_motor],
        [left_sensor, right_sensor],
        orientation,
        options,
    );
    ctx.log_bound(hw.name());
    Ok(Some(ctx))
}

fn motor(descriptor: &ComponentDescriptor) -> Result<MotorHandle, BindError> {
    command_source(descriptor.tag, &descriptor.device)
}

fn wheel(descriptor: &ComponentDescriptor) -> Result<WheelSensor, BindError> {
    build_wheel_sensor(descriptor.tag, &descriptor.device)
}
