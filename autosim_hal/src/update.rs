//! Per-cycle update loop.
//!
//! One tick: duty cycles → voltages → model step → sensor writes.
//! The caller owns timing. A `dt` that is not finite and positive skips
//! the tick: nothing is written and the cycle is not counted.

use serde::Serialize;
use tracing::{debug, trace};

use crate::adapter::{OrientationSensor, PositionSensor};
use crate::binding::BoundContext;
use crate::model::{DrivetrainModel, valid_step};

/// Values written by one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickSample {
    /// Applied voltages [V], before the model's own clamp.
    pub left_volts: f64,
    pub right_volts: f64,
    /// Wheel distances [m].
    pub left_position: f64,
    pub right_position: f64,
    /// Wheel velocities [m/s].
    pub left_velocity: f64,
    pub right_velocity: f64,
    /// Value written to the gyro [deg].
    pub yaw_degrees: f64,
}

impl<M: DrivetrainModel> BoundContext<M> {
    /// Advance the simulation by `dt` seconds and publish the result.
    pub fn tick(&mut self, dt: f64) {
        if !valid_step(dt) {
            debug!(dt, cycle = self.cycles, "tick skipped: invalid step");
            return;
        }
        let supply = self.supply.voltage();
        let left_volts = self.left_motor.get() * supply;
        let right_volts = self.right_motor.get() * supply;

        self.model.set_inputs(left_volts, right_volts);
        self.model.update(dt);

        let sample = TickSample {
            left_volts,
            right_volts,
            left_position: self.model.left_position(),
            right_position: self.model.right_position(),
            left_velocity: self.model.left_velocity(),
            right_velocity: self.model.right_velocity(),
            yaw_degrees: self.heading_sign.apply(self.model.heading().to_degrees()),
        };

        self.left_sensor.set_position(sample.left_position);
        self.left_sensor.set_velocity(sample.left_velocity);
        self.right_sensor.set_position(sample.right_position);
        self.right_sensor.set_velocity(sample.right_velocity);
        self.orientation.set_yaw(sample.yaw_degrees);

        self.cycles += 1;
        self.last_sample = sample;

        trace!(
            cycle = self.cycles,
            left_v = left_volts,
            right_v = right_volts,
            yaw = sample.yaw_degrees,
            "tick"
        );
    }
}

/// Free-function form of [`BoundContext::tick`].
#[inline]
pub fn tick<M: DrivetrainModel>(ctx: &mut BoundContext<M>, dt: f64) {
    ctx.tick(dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{
        BindOptions, DrivetrainComponents, ExecutionMode, FixedSupply, HeadingSign, SensorBinding,
    };
    use crate::devices::{MotorHandle, NavX, PwmMotor, QuadratureEncoder};
    use crate::model::DifferentialDrivetrainSim;
    use autosim_common::simdev::SimDeviceBus;
    use std::sync::Arc;

    /// Model that turns in place at a fixed rate, for sign checks.
    #[derive(Debug, Default)]
    struct Spinner {
        heading: f64,
        inputs: (f64, f64),
    }

    impl DrivetrainModel for Spinner {
        fn set_inputs(&mut self, l: f64, r: f64) {
            self.inputs = (l, r);
        }
        fn update(&mut self, dt: f64) {
            self.heading += dt;
        }
        fn left_position(&self) -> f64 {
            0.0
        }
        fn right_position(&self) -> f64 {
            0.0
        }
        fn left_velocity(&self) -> f64 {
            0.0
        }
        fn right_velocity(&self) -> f64 {
            0.0
        }
        fn heading(&self) -> f64 {
            self.heading
        }
    }

    struct Rig {
        left: MotorHandle,
        left_encoder: QuadratureEncoder,
        navx: NavX,
    }

    fn bind<M: DrivetrainModel>(model: M, options: BindOptions) -> (Rig, BoundContext<M>) {
        let bus = SimDeviceBus::new();
        let left: MotorHandle = Arc::new(PwmMotor::new(0));
        let left_encoder = QuadratureEncoder::new(0, 1);
        let navx = NavX::new(&bus);
        let ctx = BoundContext::from_components(
            DrivetrainComponents {
                left_motor: left.clone(),
                right_motor: Arc::new(PwmMotor::new(1)),
                left_sensor: SensorBinding::new(left_encoder.clone()),
                right_sensor: SensorBinding::new(QuadratureEncoder::new(2, 3)),
                orientation: navx.clone().into(),
            },
            model,
            ExecutionMode::Simulated,
            options,
        )
        .unwrap()
        .unwrap();
        (
            Rig {
                left,
                left_encoder,
                navx,
            },
            ctx,
        )
    }

    #[test]
    fn duty_is_scaled_by_supply() {
        let options = BindOptions {
            supply: Arc::new(FixedSupply(10.0)),
            ..BindOptions::default()
        };
        let (rig, mut ctx) = bind(Spinner::default(), options);
        rig.left.set(0.5);
        tick(&mut ctx, 0.02);
        assert_eq!(ctx.model().inputs, (5.0, 0.0));
        assert_eq!(ctx.last_sample().left_volts, 5.0);
        assert_eq!(ctx.cycles(), 1);
    }

    #[test]
    fn heading_sign_controls_yaw() {
        let (rig, mut ctx) = bind(Spinner::default(), BindOptions::default());
        ctx.tick(0.5);
        let expected = 0.5_f64.to_degrees();
        assert!((rig.navx.yaw() + expected).abs() < 1e-12);

        let options = BindOptions {
            heading_sign: HeadingSign::Direct,
            ..BindOptions::default()
        };
        let (rig, mut ctx) = bind(Spinner::default(), options);
        ctx.tick(0.5);
        assert!((rig.navx.yaw() - expected).abs() < 1e-12);
    }

    #[test]
    fn invalid_dt_skips_the_tick() {
        let (rig, mut ctx) = bind(Spinner::default(), BindOptions::default());
        rig.left.set(0.5);
        ctx.tick(0.02);
        let sample = *ctx.last_sample();
        let yaw = rig.navx.yaw();

        for dt in [f64::NAN, 0.0, -1.0, f64::INFINITY] {
            ctx.tick(dt);
        }
        assert_eq!(ctx.cycles(), 1);
        assert_eq!(*ctx.last_sample(), sample);
        assert_eq!(rig.navx.yaw(), yaw);
        assert!(ctx.model().heading.is_finite());
    }

    #[test]
    fn driving_forward_moves_the_encoder() {
        let model =
            DifferentialDrivetrainSim::from_characterization(2.66, 0.433, 2.76, 0.236, 0.7, 12.0);
        let (rig, mut ctx) = bind(model, BindOptions::default());
        rig.left.set(1.0);
        for _ in 0..25 {
            ctx.tick(0.02);
        }
        assert!(rig.left_encoder.distance() > 0.0);
        assert!(rig.left_encoder.rate() > 0.0);
        assert_eq!(rig.left_encoder.distance(), ctx.last_sample().left_position);
    }
}
