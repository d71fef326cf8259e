//! Simulated sensor adapters and the adapter factory.
//!
//! Two capabilities are simulated: [`PositionSensor`] for the wheel
//! encoders and [`OrientationSensor`] for the gyro. Each concrete adapter
//! owns the simulated field handles of exactly one device.
//!
//! | Role | Device | Adapter | Writes |
//! |------|--------|---------|--------|
//! | Left/RightSensor | `Encoder` | [`QuadratureAdapter`] | in-process distance / rate |
//! | Left/RightSensor | SPARK MAX encoder | [`RelativeEncoderAdapter`] | `SPARK MAX [id]` Position / Velocity (or Alt Encoder …) |
//! | OrientationSensor | `AHRS` | [`NavxAdapter`] | `navX-Sensor[0]` Yaw |

use autosim_common::consts::{NAVX_DEVICE, NAVX_INDEX, NAVX_YAW, SPARK_MAX_DEVICE};
use autosim_common::role::{Role, RoleTag};
use autosim_common::simdev::{SimDeviceBus, SimDouble, device_name};
use serde::Serialize;

use crate::devices::{Device, EncoderChannel, MotorHandle, NavX, QuadratureEncoder};
use crate::error::BindError;

/// Type name every motor role must resolve to.
pub const MOTOR_TYPE: &str = "MotorController";

/// Position/velocity sensor capability.
pub trait PositionSensor {
    /// Wheel distance [m].
    fn set_position(&mut self, position: f64);
    /// Wheel velocity [m/s].
    fn set_velocity(&mut self, velocity: f64);
}

/// Orientation sensor capability.
pub trait OrientationSensor {
    /// Yaw in the sensor's own convention [deg].
    fn set_yaw(&mut self, degrees: f64);
}

// ─── Quadrature ─────────────────────────────────────────────────────

/// Writes distance and rate straight into an in-process encoder.
#[derive(Debug)]
pub struct QuadratureAdapter {
    distance: SimDouble,
    rate: SimDouble,
}

impl QuadratureAdapter {
    pub fn new(encoder: &QuadratureEncoder) -> Self {
        let (distance, rate) = encoder.sim_cells();
        Self { distance, rate }
    }
}

impl PositionSensor for QuadratureAdapter {
    fn set_position(&mut self, position: f64) {
        self.distance.set(position);
    }

    fn set_velocity(&mut self, velocity: f64) {
        self.rate.set(velocity);
    }
}

// ─── SPARK MAX relative encoder ─────────────────────────────────────

/// Writes a SPARK MAX encoder channel on the simulated device bus.
#[derive(Debug)]
pub struct RelativeEncoderAdapter {
    device: String,
    channel: EncoderChannel,
    position: SimDouble,
    velocity: SimDouble,
}

impl RelativeEncoderAdapter {
    /// Attach to `"SPARK MAX [<bus_address>]"`.
    pub fn new(bus: &SimDeviceBus, bus_address: u8, channel: EncoderChannel) -> Self {
        let device = bus.device(SPARK_MAX_DEVICE, i32::from(bus_address));
        let (position, velocity) = channel.fields();
        Self {
            position: device.double(position),
            velocity: device.double(velocity),
            device: device.name().to_string(),
            channel,
        }
    }

    /// Simulated device name, e.g. `"SPARK MAX [13]"`.
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn channel(&self) -> EncoderChannel {
        self.channel
    }
}

impl PositionSensor for RelativeEncoderAdapter {
    fn set_position(&mut self, position: f64) {
        self.position.set(position);
    }

    fn set_velocity(&mut self, velocity: f64) {
        self.velocity.set(velocity);
    }
}

// ─── navX ───────────────────────────────────────────────────────────

/// Writes the yaw field of the simulated navX.
#[derive(Debug)]
pub struct NavxAdapter {
    yaw: SimDouble,
}

impl NavxAdapter {
    pub fn new(bus: &SimDeviceBus) -> Self {
        Self {
            yaw: bus.device(NAVX_DEVICE, NAVX_INDEX).double(NAVX_YAW),
        }
    }
}

impl OrientationSensor for NavxAdapter {
    fn set_yaw(&mut self, degrees: f64) {
        self.yaw.set(degrees);
    }
}

// ─── Closed adapter sets ────────────────────────────────────────────

/// Wheel sensor adapter, selected by backend kind.
#[derive(Debug)]
pub enum WheelSensor {
    Quadrature(QuadratureAdapter),
    RelativeEncoder(RelativeEncoderAdapter),
}

impl WheelSensor {
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Quadrature(_) => SensorKind::Quadrature,
            Self::RelativeEncoder(a) => SensorKind::RelativeEncoder {
                device: a.device.clone(),
                channel: a.channel,
            },
        }
    }
}

impl PositionSensor for WheelSensor {
    fn set_position(&mut self, position: f64) {
        match self {
            Self::Quadrature(a) => a.set_position(position),
            Self::RelativeEncoder(a) => a.set_position(position),
        }
    }

    fn set_velocity(&mut self, velocity: f64) {
        match self {
            Self::Quadrature(a) => a.set_velocity(velocity),
            Self::RelativeEncoder(a) => a.set_velocity(velocity),
        }
    }
}

/// Any adapter the factory can produce.
#[derive(Debug)]
pub enum SensorAdapter {
    Wheel(WheelSensor),
    Orientation(NavxAdapter),
}

/// What a sensor role was bound to, for logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorKind {
    /// In-process quadrature encoder.
    Quadrature,
    /// SPARK MAX channel on the simulated bus.
    RelativeEncoder {
        device: String,
        channel: EncoderChannel,
    },
    /// navX yaw on the simulated bus.
    Navx {
        device: String,
    },
}

// ─── Factory ────────────────────────────────────────────────────────

/// Build the simulated counterpart for a sensor-tagged device.
///
/// # Errors
/// - `UnsupportedType` if a wheel-sensor role names a device with no
///   encoder adapter, or if `tag` is a motor role
/// - `WrongType` if the orientation role names anything but a navX
/// - `MissingBusAddress` for a SPARK MAX encoder tagged without address
/// - `AddressMismatch` if the tagged address is not the encoder's CAN id
pub fn build(tag: RoleTag, device: &Device) -> Result<SensorAdapter, BindError> {
    match tag.role {
        Role::LeftSensor | Role::RightSensor => {
            build_wheel_sensor(tag, device).map(SensorAdapter::Wheel)
        }
        Role::OrientationSensor => {
            build_orientation_sensor(tag, device).map(SensorAdapter::Orientation)
        }
        // Motors are command sources and have no simulated counterpart.
        Role::LeftMotor | Role::RightMotor => Err(BindError::UnsupportedType {
            role: tag.role,
            type_name: device.type_name().to_string(),
        }),
    }
}

/// Encoder adapter for a left/right sensor role.
///
/// A SPARK MAX encoder is simulated on `"SPARK MAX [<address>]"`, so the
/// tagged address must be the one the encoder itself reads from.
///
/// # Errors
/// - `MissingBusAddress` if a SPARK MAX encoder is tagged without address
/// - `AddressMismatch` if the tagged address differs from its CAN id
/// - `UnsupportedType` for any device that is not an encoder
pub fn build_wheel_sensor(tag: RoleTag, device: &Device) -> Result<WheelSensor, BindError> {
    match device {
        Device::Quadrature(encoder) => {
            Ok(WheelSensor::Quadrature(QuadratureAdapter::new(encoder)))
        }
        Device::SparkMax(encoder) => {
            let Some(address) = tag.bus_address else {
                return Err(BindError::MissingBusAddress {
                    role: tag.role,
                    type_name: encoder.type_name().to_string(),
                });
            };
            if address != encoder.can_id() {
                return Err(BindError::AddressMismatch {
                    role: tag.role,
                    tagged: address,
                    device: encoder.can_id(),
                });
            }
            Ok(WheelSensor::RelativeEncoder(RelativeEncoderAdapter::new(
                encoder.bus(),
                address,
                encoder.channel(),
            )))
        }
        Device::Motor(_) | Device::NavX(_) | Device::Other { .. } => {
            Err(BindError::UnsupportedType {
                role: tag.role,
                type_name: device.type_name().to_string(),
            })
        }
    }
}

/// Gyro adapter for the orientation role. Only the navX is recognised.
pub fn build_orientation_sensor(tag: RoleTag, device: &Device) -> Result<NavxAdapter, BindError> {
    match device {
        Device::NavX(navx) => Ok(NavxAdapter::new(navx.bus())),
        other => Err(BindError::WrongType {
            role: tag.role,
            expected: NavX::TYPE_NAME,
            actual: other.type_name().to_string(),
        }),
    }
}

/// Motor roles bind the device itself as a read-only command source.
///
/// # Errors
/// `WrongType` if the device is not a motor controller.
pub fn command_source(tag: RoleTag, device: &Device) -> Result<MotorHandle, BindError> {
    match device {
        Device::Motor(motor) => Ok(motor.clone()),
        other => Err(BindError::WrongType {
            role: tag.role,
            expected: MOTOR_TYPE,
            actual: other.type_name().to_string(),
        }),
    }
}

/// Report entry for the orientation adapter.
pub(crate) fn navx_kind() -> SensorKind {
    SensorKind::Navx {
        device: device_name(NAVX_DEVICE, NAVX_INDEX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{PwmMotor, SparkMaxEncoder};
    use std::sync::Arc;

    #[test]
    fn quadrature_adapter_writes_encoder() {
        let encoder = QuadratureEncoder::new(1, 2);
        let SensorAdapter::Wheel(mut adapter) =
            build(RoleTag::new(Role::LeftSensor), &encoder.clone().into()).unwrap()
        else {
            panic!("expected wheel adapter");
        };
        adapter.set_position(1.5);
        adapter.set_velocity(-0.25);
        assert_eq!(encoder.distance(), 1.5);
        assert_eq!(encoder.rate(), -0.25);
        assert_eq!(adapter.kind(), SensorKind::Quadrature);
    }

    #[test]
    fn alternate_encoder_uses_alt_fields() {
        let bus = SimDeviceBus::new();
        let encoder = SparkMaxEncoder::new(&bus, 14, EncoderChannel::Alternate);
        let mut adapter = build_wheel_sensor(
            RoleTag::with_address(Role::RightSensor, 14),
            &encoder.clone().into(),
        )
        .unwrap();
        adapter.set_position(3.0);
        adapter.set_velocity(0.5);

        assert_eq!(bus.double("SPARK MAX [14]", "Alt Encoder Position").get(), 3.0);
        assert_eq!(bus.double("SPARK MAX [14]", "Alt Encoder Velocity").get(), 0.5);
        assert_eq!(bus.double("SPARK MAX [14]", "Position").get(), 0.0);
        assert_eq!(encoder.position(), 3.0);
    }

    #[test]
    fn spark_max_without_address_fails() {
        let bus = SimDeviceBus::new();
        let encoder = SparkMaxEncoder::new(&bus, 13, EncoderChannel::Primary);
        let err = build_wheel_sensor(RoleTag::new(Role::LeftSensor), &encoder.into()).unwrap_err();
        assert!(matches!(err, BindError::MissingBusAddress { role: Role::LeftSensor, .. }));
    }

    #[test]
    fn spark_max_with_foreign_address_fails() {
        let bus = SimDeviceBus::new();
        let encoder = SparkMaxEncoder::new(&bus, 13, EncoderChannel::Primary);
        let err = build_wheel_sensor(
            RoleTag::with_address(Role::LeftSensor, 14),
            &encoder.into(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BindError::AddressMismatch {
                role: Role::LeftSensor,
                tagged: 14,
                device: 13,
            }
        );
        assert!(bus.snapshot().iter().all(|c| c.device != "SPARK MAX [14]"));
    }

    #[test]
    fn unknown_wheel_sensor_type_fails() {
        let err = build(RoleTag::new(Role::LeftSensor), &Device::other("CANCoder")).unwrap_err();
        assert_eq!(
            err,
            BindError::UnsupportedType {
                role: Role::LeftSensor,
                type_name: "CANCoder".to_string(),
            }
        );
    }

    #[test]
    fn gyro_must_be_navx() {
        let err = build(
            RoleTag::new(Role::OrientationSensor),
            &QuadratureEncoder::new(1, 2).into(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BindError::WrongType {
                role: Role::OrientationSensor,
                expected: "AHRS",
                actual: "Encoder".to_string(),
            }
        );
    }

    #[test]
    fn navx_adapter_writes_yaw() {
        let bus = SimDeviceBus::new();
        let navx = NavX::new(&bus);
        let mut adapter =
            build_orientation_sensor(RoleTag::new(Role::OrientationSensor), &navx.clone().into())
                .unwrap();
        adapter.set_yaw(-45.0);
        assert_eq!(navx.yaw(), -45.0);
    }

    #[test]
    fn motor_roles_need_motors() {
        let motor: MotorHandle = Arc::new(PwmMotor::new(3));
        assert!(command_source(RoleTag::new(Role::LeftMotor), &motor.clone().into()).is_ok());

        let err = command_source(RoleTag::new(Role::RightMotor), &Device::other("Solenoid"))
            .unwrap_err();
        assert!(matches!(err, BindError::WrongType { expected: MOTOR_TYPE, .. }));

        let err = build(RoleTag::new(Role::LeftMotor), &motor.into()).unwrap_err();
        assert!(matches!(err, BindError::UnsupportedType { .. }));
    }
}
