//! Hardware device handles.
//!
//! The subset of platform devices the binding engine knows how to pair
//! with a simulated counterpart. Handles are cheap to clone and every
//! clone refers to the same device, so the platform keeps driving and
//! reading them while the bound simulation writes behind the scenes.
//!
//! [`Device`] is the closed set of backend kinds the adapter factory
//! matches on. Anything else is carried as [`Device::Other`] by name.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use autosim_common::consts::{
    NAVX_DEVICE, NAVX_INDEX, NAVX_YAW, SPARK_MAX_ALT_POSITION, SPARK_MAX_ALT_VELOCITY,
    SPARK_MAX_DEVICE, SPARK_MAX_POSITION, SPARK_MAX_VELOCITY,
};
use autosim_common::simdev::{SimDeviceBus, SimDouble};

// ─── Motors ─────────────────────────────────────────────────────────

/// A motor command source: a duty cycle in [-1, 1].
pub trait MotorController: Send + Sync + fmt::Debug {
    /// Declared type name, reported in binding errors.
    fn type_name(&self) -> &'static str;

    /// Last commanded duty cycle.
    fn get(&self) -> f64;

    /// Command a duty cycle. Values outside [-1, 1] are clamped.
    fn set(&self, duty: f64);
}

/// Shared motor handle held by both the platform and the bound context.
pub type MotorHandle = Arc<dyn MotorController>;

/// Single PWM motor controller.
#[derive(Debug)]
pub struct PwmMotor {
    channel: u8,
    duty: AtomicU64,
}

impl PwmMotor {
    /// Stopped controller on PWM output `channel`.
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            duty: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// PWM output the controller is wired to.
    pub fn channel(&self) -> u8 {
        self.channel
    }
}

impl MotorController for PwmMotor {
    fn type_name(&self) -> &'static str {
        "PwmMotor"
    }

    fn get(&self) -> f64 {
        f64::from_bits(self.duty.load(Ordering::Relaxed))
    }

    fn set(&self, duty: f64) {
        let duty = if duty.is_nan() { 0.0 } else { duty.clamp(-1.0, 1.0) };
        self.duty.store(duty.to_bits(), Ordering::Relaxed);
    }
}

/// Motors driven together. Reads back the first member's command.
#[derive(Debug, Default)]
pub struct MotorGroup {
    motors: Vec<MotorHandle>,
}

impl MotorGroup {
    /// Group commanding `motors` in order. An empty group reads 0.
    pub fn new(motors: Vec<MotorHandle>) -> Self {
        Self { motors }
    }
}

impl MotorController for MotorGroup {
    fn type_name(&self) -> &'static str {
        "MotorGroup"
    }

    fn get(&self) -> f64 {
        self.motors.first().map_or(0.0, |m| m.get())
    }

    fn set(&self, duty: f64) {
        for motor in &self.motors {
            motor.set(duty);
        }
    }
}

// ─── Quadrature encoder ─────────────────────────────────────────────

/// Quadrature encoder decoded in-process from two digital channels.
///
/// Distance and rate live in the handle itself; no bus address is
/// involved. Clones share the same counters.
#[derive(Debug, Clone)]
pub struct QuadratureEncoder {
    channels: (u8, u8),
    distance: SimDouble,
    rate: SimDouble,
}

impl QuadratureEncoder {
    /// Encoder on digital inputs A and B, at zero distance and rate.
    pub fn new(channel_a: u8, channel_b: u8) -> Self {
        Self {
            channels: (channel_a, channel_b),
            distance: SimDouble::default(),
            rate: SimDouble::default(),
        }
    }

    /// Digital inputs `(A, B)` the encoder is wired to.
    pub fn channels(&self) -> (u8, u8) {
        self.channels
    }

    /// Distance travelled [m].
    pub fn distance(&self) -> f64 {
        self.distance.get()
    }

    /// Current rate [m/s].
    pub fn rate(&self) -> f64 {
        self.rate.get()
    }

    /// Distance and rate cells, for the simulation adapter.
    pub(crate) fn sim_cells(&self) -> (SimDouble, SimDouble) {
        (self.distance.clone(), self.rate.clone())
    }
}

// ─── SPARK MAX relative encoder ─────────────────────────────────────

/// Which measurement channel of a SPARK MAX a relative encoder reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderChannel {
    /// Built-in hall sensor.
    Primary,
    /// Alternate encoder port.
    Alternate,
}

impl EncoderChannel {
    /// Simulated `(position, velocity)` field names of this channel.
    pub const fn fields(self) -> (&'static str, &'static str) {
        match self {
            Self::Primary => (SPARK_MAX_POSITION, SPARK_MAX_VELOCITY),
            Self::Alternate => (SPARK_MAX_ALT_POSITION, SPARK_MAX_ALT_VELOCITY),
        }
    }
}

/// Relative encoder of a SPARK MAX controller on the CAN bus.
///
/// In simulation the controller registers itself on the [`SimDeviceBus`]
/// as `"SPARK MAX [<can_id>]"` and its encoder reads from there.
#[derive(Debug, Clone)]
pub struct SparkMaxEncoder {
    can_id: u8,
    channel: EncoderChannel,
    bus: SimDeviceBus,
    position: SimDouble,
    velocity: SimDouble,
}

impl SparkMaxEncoder {
    /// Encoder of the controller at `can_id`, reading `channel`.
    ///
    /// Registers `"SPARK MAX [<can_id>]"` on `bus` if it is not there yet.
    pub fn new(bus: &SimDeviceBus, can_id: u8, channel: EncoderChannel) -> Self {
        let device = bus.device(SPARK_MAX_DEVICE, i32::from(can_id));
        let (position, velocity) = channel.fields();
        Self {
            can_id,
            channel,
            bus: bus.clone(),
            position: device.double(position),
            velocity: device.double(velocity),
        }
    }

    /// CAN id of the owning controller. Simulated values must be written
    /// at this address to reach the encoder.
    pub fn can_id(&self) -> u8 {
        self.can_id
    }

    /// Measurement channel the encoder reads.
    pub fn channel(&self) -> EncoderChannel {
        self.channel
    }

    /// Position [m] after conversion factor.
    pub fn position(&self) -> f64 {
        self.position.get()
    }

    /// Velocity [m/s] after conversion factor.
    pub fn velocity(&self) -> f64 {
        self.velocity.get()
    }

    pub(crate) fn bus(&self) -> &SimDeviceBus {
        &self.bus
    }

    /// Declared type of the handle; the alternate encoder is its own type.
    pub const fn type_name(&self) -> &'static str {
        match self.channel {
            EncoderChannel::Primary => "SparkMaxRelativeEncoder",
            EncoderChannel::Alternate => "SparkMaxAlternateEncoder",
        }
    }
}

// ─── navX ───────────────────────────────────────────────────────────

/// navX-MXP inertial sensor.
#[derive(Debug, Clone)]
pub struct NavX {
    bus: SimDeviceBus,
    yaw: SimDouble,
}

impl NavX {
    /// Declared type of the navX driver.
    pub const TYPE_NAME: &'static str = "AHRS";

    /// navX on the MXP port, registered as `"navX-Sensor[0]"` on `bus`.
    pub fn new(bus: &SimDeviceBus) -> Self {
        let yaw = bus.device(NAVX_DEVICE, NAVX_INDEX).double(NAVX_YAW);
        Self {
            bus: bus.clone(),
            yaw,
        }
    }

    /// Yaw [deg], clockwise positive.
    pub fn yaw(&self) -> f64 {
        self.yaw.get()
    }

    /// Heading [deg], counter-clockwise positive.
    pub fn rotation_degrees(&self) -> f64 {
        -self.yaw()
    }

    pub(crate) fn bus(&self) -> &SimDeviceBus {
        &self.bus
    }
}

// ─── Device ─────────────────────────────────────────────────────────

/// A device as seen by the adapter factory: backend kind plus handle.
#[derive(Debug, Clone)]
pub enum Device {
    /// Motor controller or group; a command source, never simulated.
    Motor(MotorHandle),
    /// In-process quadrature encoder.
    Quadrature(QuadratureEncoder),
    /// SPARK MAX relative or alternate encoder.
    SparkMax(SparkMaxEncoder),
    /// navX inertial sensor.
    NavX(NavX),
    /// Any device type the engine has no simulated counterpart for.
    Other { type_name: String },
}

impl Device {
    /// Foreign device known only by its type name.
    pub fn other(type_name: impl Into<String>) -> Self {
        Self::Other {
            type_name: type_name.into(),
        }
    }

    /// Declared type name of the handle.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Motor(m) => m.type_name(),
            Self::Quadrature(_) => "Encoder",
            Self::SparkMax(e) => e.type_name(),
            Self::NavX(_) => NavX::TYPE_NAME,
            Self::Other { type_name } => type_name,
        }
    }
}

impl From<MotorHandle> for Device {
    fn from(motor: MotorHandle) -> Self {
        Self::Motor(motor)
    }
}

impl From<QuadratureEncoder> for Device {
    fn from(encoder: QuadratureEncoder) -> Self {
        Self::Quadrature(encoder)
    }
}

impl From<SparkMaxEncoder> for Device {
    fn from(encoder: SparkMaxEncoder) -> Self {
        Self::SparkMax(encoder)
    }
}

impl From<NavX> for Device {
    fn from(navx: NavX) -> Self {
        Self::NavX(navx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pwm_motor_clamps() {
        let motor = PwmMotor::new(1);
        assert_eq!(motor.channel(), 1);
        motor.set(1.7);
        assert_eq!(motor.get(), 1.0);
        motor.set(-3.0);
        assert_eq!(motor.get(), -1.0);
        motor.set(f64::NAN);
        assert_eq!(motor.get(), 0.0);
    }

    #[test]
    fn motor_group_drives_all_members() {
        let a: MotorHandle = Arc::new(PwmMotor::new(1));
        let b: MotorHandle = Arc::new(PwmMotor::new(2));
        let group = MotorGroup::new(vec![a.clone(), b.clone()]);
        group.set(0.4);
        assert_eq!(a.get(), 0.4);
        assert_eq!(b.get(), 0.4);
        assert_eq!(group.get(), 0.4);
        assert_eq!(MotorGroup::default().get(), 0.0);
    }

    #[test]
    fn spark_max_channels_use_distinct_fields() {
        let bus = SimDeviceBus::new();
        let primary = SparkMaxEncoder::new(&bus, 11, EncoderChannel::Primary);
        let alt = SparkMaxEncoder::new(&bus, 11, EncoderChannel::Alternate);

        bus.double("SPARK MAX [11]", "Alt Encoder Position").set(2.5);
        assert_eq!(alt.position(), 2.5);
        assert_eq!(primary.position(), 0.0);
        assert_eq!(Device::from(alt).type_name(), "SparkMaxAlternateEncoder");
    }

    #[test]
    fn navx_rotation_is_negated_yaw() {
        let bus = SimDeviceBus::new();
        let navx = NavX::new(&bus);
        bus.double("navX-Sensor[0]", "Yaw").set(30.0);
        assert_eq!(navx.yaw(), 30.0);
        assert_eq!(navx.rotation_degrees(), -30.0);
    }

    #[test]
    fn device_type_names() {
        let motor: MotorHandle = Arc::new(PwmMotor::new(0));
        assert_eq!(Device::from(motor).type_name(), "PwmMotor");
        assert_eq!(Device::from(QuadratureEncoder::new(1, 2)).type_name(), "Encoder");
        assert_eq!(Device::other("CANCoder").type_name(), "CANCoder");
    }
}
