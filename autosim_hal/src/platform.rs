//! Demo drivetrain platform.
//!
//! A small tank drive: two motor groups of two PWM controllers, a
//! quadrature encoder per side and a navX. Its members carry the five
//! role tags so the binding engine can simulate it without any glue.

use std::sync::Arc;

use autosim_common::role::Role;
use autosim_common::simdev::SimDeviceBus;
use serde::Serialize;

use crate::devices::{MotorController, MotorGroup, MotorHandle, NavX, PwmMotor, QuadratureEncoder};
use crate::discovery::{HardwareObject, Member};

// ─── Odometry ───────────────────────────────────────────────────────

/// Field pose, heading counter-clockwise positive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Pose2d {
    pub x: f64,
    pub y: f64,
    /// [rad]
    pub heading: f64,
}

/// Differential-drive odometry from absolute heading and cumulative
/// wheel distances.
#[derive(Debug, Clone, Default)]
pub struct DriveOdometry {
    pose: Pose2d,
    prev_left: f64,
    prev_right: f64,
}

impl DriveOdometry {
    pub fn new(heading: f64, left: f64, right: f64) -> Self {
        Self {
            pose: Pose2d {
                heading,
                ..Pose2d::default()
            },
            prev_left: left,
            prev_right: right,
        }
    }

    /// Integrate one step as a constant-curvature arc.
    pub fn update(&mut self, heading: f64, left: f64, right: f64) -> Pose2d {
        let ds = 0.5 * ((left - self.prev_left) + (right - self.prev_right));
        let dtheta = heading - self.pose.heading;
        self.prev_left = left;
        self.prev_right = right;

        let (s, c) = if dtheta.abs() < 1e-9 {
            (1.0 - dtheta * dtheta / 6.0, 0.5 * dtheta)
        } else {
            (dtheta.sin() / dtheta, (1.0 - dtheta.cos()) / dtheta)
        };
        // Arc displacement in the robot frame, rotated into the field.
        let (fwd, side) = (ds * s, ds * c);
        let (sin_h, cos_h) = self.pose.heading.sin_cos();
        self.pose.x += fwd * cos_h - side * sin_h;
        self.pose.y += fwd * sin_h + side * cos_h;
        self.pose.heading = heading;
        self.pose
    }

    pub fn pose(&self) -> Pose2d {
        self.pose
    }
}

// ─── Arcade mixing ──────────────────────────────────────────────────

/// Mix forward speed and clockwise-positive rotation into wheel duties.
///
/// Inputs are clamped to [-1, 1]; outputs are desaturated so neither side
/// exceeds 1 while their ratio is kept.
pub fn arcade_mix(x_speed: f64, z_rotation: f64) -> (f64, f64) {
    let x = clamp_unit(x_speed);
    let z = clamp_unit(z_rotation);
    let max_input = x.abs().max(z.abs()).copysign(x);

    let (left, right) = match (x >= 0.0, z >= 0.0) {
        (true, true) => (max_input, x - z),
        (true, false) => (x + z, max_input),
        (false, true) => (x + z, max_input),
        (false, false) => (max_input, x - z),
    };

    let max_magnitude = left.abs().max(right.abs());
    if max_magnitude > 1.0 {
        (left / max_magnitude, right / max_magnitude)
    } else {
        (left, right)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}

// ─── DemoDrivetrain ─────────────────────────────────────────────────

pub struct DemoDrivetrain {
    left_motors: Arc<MotorGroup>,
    right_motors: Arc<MotorGroup>,
    left_encoder: QuadratureEncoder,
    right_encoder: QuadratureEncoder,
    gyro: NavX,
    odometry: DriveOdometry,
}

fn pwm_pair(a: u8, b: u8) -> Arc<MotorGroup> {
    let motors: Vec<MotorHandle> = vec![Arc::new(PwmMotor::new(a)), Arc::new(PwmMotor::new(b))];
    Arc::new(MotorGroup::new(motors))
}

impl DemoDrivetrain {
    /// Left motors on PWM 1/2, right on 3/4; encoders on DIO 1/2 and 3/4.
    pub fn new(bus: &SimDeviceBus) -> Self {
        let gyro = NavX::new(bus);
        Self {
            left_motors: pwm_pair(1, 2),
            right_motors: pwm_pair(3, 4),
            left_encoder: QuadratureEncoder::new(1, 2),
            right_encoder: QuadratureEncoder::new(3, 4),
            odometry: DriveOdometry::new(gyro.rotation_degrees().to_radians(), 0.0, 0.0),
            gyro,
        }
    }

    pub fn arcade_drive(&self, x_speed: f64, z_rotation: f64) {
        let (left, right) = arcade_mix(x_speed, z_rotation);
        self.left_motors.set(left);
        self.right_motors.set(right);
    }

    pub fn stop(&self) {
        self.left_motors.set(0.0);
        self.right_motors.set(0.0);
    }

    /// Per-cycle bookkeeping: odometry from gyro and encoders.
    pub fn periodic(&mut self) -> Pose2d {
        self.odometry.update(
            self.gyro.rotation_degrees().to_radians(),
            self.left_encoder.distance(),
            self.right_encoder.distance(),
        )
    }

    pub fn pose(&self) -> Pose2d {
        self.odometry.pose()
    }

    pub fn left_encoder(&self) -> &QuadratureEncoder {
        &self.left_encoder
    }

    pub fn right_encoder(&self) -> &QuadratureEncoder {
        &self.right_encoder
    }

    pub fn gyro(&self) -> &NavX {
        &self.gyro
    }

    /// Commanded duties `(left, right)`.
    pub fn duties(&self) -> (f64, f64) {
        (self.left_motors.get(), self.right_motors.get())
    }
}

impl HardwareObject for DemoDrivetrain {
    fn members(&self) -> Vec<Member<'_>> {
        vec![
            Member::tagged("left_motors", Role::LeftMotor, &self.left_motors),
            Member::tagged("right_motors", Role::RightMotor, &self.right_motors),
            Member::tagged("left_encoder", Role::LeftSensor, &self.left_encoder),
            Member::tagged("right_encoder", Role::RightSensor, &self.right_encoder),
            Member::tagged("gyro", Role::OrientationSensor, &self.gyro),
        ]
    }

    fn name(&self) -> &'static str {
        "DemoDrivetrain"
    }
}
