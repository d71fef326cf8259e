//! Differential drivetrain physics model.
//!
//! The binding engine drives any [`DrivetrainModel`]. The provided
//! [`DifferentialDrivetrainSim`] integrates the standard nonlinear
//! differential-drive model whose wheel-velocity dynamics come from a
//! characterised linear system:
//!
//! ```text
//! state   x = [x, y, θ, v_l, v_r, d_l, d_r]
//! input   u = [V_l, V_r]            (clamped to ±max_voltage)
//!
//! [v̇_l, v̇_r] = A·[v_l, v_r] + B·u
//! ẋ = v·cos θ,  ẏ = v·sin θ,  v = (v_l + v_r) / 2
//! θ̇ = (v_r − v_l) / track_width
//! ḋ_l = v_l,    ḋ_r = v_r
//! ```
//!
//! Integration is fixed-step RK4: identical inputs and `dt` always
//! produce identical trajectories.

/// Physics model consumed by the update loop.
pub trait DrivetrainModel {
    /// Applied voltages for the next update [V].
    fn set_inputs(&mut self, left_volts: f64, right_volts: f64);

    /// Advance the model by `dt` seconds.
    ///
    /// A `dt` that is not finite and strictly positive must leave the
    /// state untouched.
    fn update(&mut self, dt: f64);

    /// Left wheel distance [m].
    fn left_position(&self) -> f64;

    /// Right wheel distance [m].
    fn right_position(&self) -> f64;

    /// Left wheel velocity [m/s].
    fn left_velocity(&self) -> f64;

    /// Right wheel velocity [m/s].
    fn right_velocity(&self) -> f64;

    /// Heading [rad], counter-clockwise positive.
    fn heading(&self) -> f64;
}

// ─── System identification ──────────────────────────────────────────

/// Continuous-time wheel-velocity system `v̇ = A·v + B·u`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSystem {
    pub a: [[f64; 2]; 2],
    pub b: [[f64; 2]; 2],
}

impl LinearSystem {
    /// `A·v + B·u`.
    #[inline]
    pub fn derivative(&self, v: [f64; 2], u: [f64; 2]) -> [f64; 2] {
        let [[a11, a12], [a21, a22]] = self.a;
        let [[b11, b12], [b21, b22]] = self.b;
        [
            a11 * v[0] + a12 * v[1] + b11 * u[0] + b12 * u[1],
            a21 * v[0] + a22 * v[1] + b21 * u[0] + b22 * u[1],
        ]
    }
}

/// Wheel-velocity system from feedforward characterisation.
///
/// `kv_*` in V/(m/s), `ka_*` in V/(m/s²); the angular gains are
/// expressed per wheel speed, not per body rate. All gains must be
/// strictly positive.
pub fn identify_drivetrain_system(
    kv_linear: f64,
    ka_linear: f64,
    kv_angular: f64,
    ka_angular: f64,
) -> LinearSystem {
    let a1 = -0.5 * (kv_linear / ka_linear + kv_angular / ka_angular);
    let a2 = -0.5 * (kv_linear / ka_linear - kv_angular / ka_angular);
    let b1 = 0.5 * (1.0 / ka_linear + 1.0 / ka_angular);
    let b2 = 0.5 * (1.0 / ka_linear - 1.0 / ka_angular);
    LinearSystem {
        a: [[a1, a2], [a2, a1]],
        b: [[b1, b2], [b2, b1]],
    }
}

/// Finite and strictly positive. NaN fails both.
#[inline]
pub fn valid_step(dt: f64) -> bool {
    dt.is_finite() && dt > 0.0
}

// ─── DifferentialDrivetrainSim ──────────────────────────────────────

const X: usize = 0;
const Y: usize = 1;
const HEADING: usize = 2;
const LEFT_VEL: usize = 3;
const RIGHT_VEL: usize = 4;
const LEFT_POS: usize = 5;
const RIGHT_POS: usize = 6;

type State = [f64; 7];

/// State-space simulation of a differential drivetrain.
#[derive(Debug, Clone)]
pub struct DifferentialDrivetrainSim {
    system: LinearSystem,
    track_width: f64,
    max_voltage: f64,
    state: State,
    input: [f64; 2],
}

impl DifferentialDrivetrainSim {
    /// Model at rest at the origin.
    pub fn new(system: LinearSystem, track_width: f64, max_voltage: f64) -> Self {
        Self {
            system,
            track_width,
            max_voltage,
            state: [0.0; 7],
            input: [0.0; 2],
        }
    }

    /// Shorthand for [`identify_drivetrain_system`] + [`Self::new`].
    pub fn from_characterization(
        kv_linear: f64,
        ka_linear: f64,
        kv_angular: f64,
        ka_angular: f64,
        track_width: f64,
        max_voltage: f64,
    ) -> Self {
        let system = identify_drivetrain_system(kv_linear, ka_linear, kv_angular, ka_angular);
        Self::new(system, track_width, max_voltage)
    }

    /// Back to rest at the origin, inputs cleared.
    pub fn reset(&mut self) {
        self.state = [0.0; 7];
        self.input = [0.0; 2];
    }

    /// Field pose `(x [m], y [m], heading [rad])`.
    pub fn pose(&self) -> (f64, f64, f64) {
        (self.state[X], self.state[Y], self.state[HEADING])
    }

    /// Inputs applied on the next update, after clamping [V].
    pub fn inputs(&self) -> [f64; 2] {
        self.input
    }

    pub fn track_width(&self) -> f64 {
        self.track_width
    }

    fn dynamics(&self, x: &State, u: [f64; 2]) -> State {
        let [dvl, dvr] = self.system.derivative([x[LEFT_VEL], x[RIGHT_VEL]], u);
        let v = 0.5 * (x[LEFT_VEL] + x[RIGHT_VEL]);
        let mut dx = [0.0; 7];
        dx[X] = v * x[HEADING].cos();
        dx[Y] = v * x[HEADING].sin();
        dx[HEADING] = (x[RIGHT_VEL] - x[LEFT_VEL]) / self.track_width;
        dx[LEFT_VEL] = dvl;
        dx[RIGHT_VEL] = dvr;
        dx[LEFT_POS] = x[LEFT_VEL];
        dx[RIGHT_POS] = x[RIGHT_VEL];
        dx
    }

    fn rk4(&self, x: &State, u: [f64; 2], dt: f64) -> State {
        let offset = |base: &State, k: &State, h: f64| -> State {
            let mut out = *base;
            for (o, d) in out.iter_mut().zip(k) {
                *o += h * d;
            }
            out
        };
        let k1 = self.dynamics(x, u);
        let k2 = self.dynamics(&offset(x, &k1, dt / 2.0), u);
        let k3 = self.dynamics(&offset(x, &k2, dt / 2.0), u);
        let k4 = self.dynamics(&offset(x, &k3, dt), u);

        let mut next = *x;
        for i in 0..next.len() {
            next[i] += dt / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
        }
        next
    }
}

impl DrivetrainModel for DifferentialDrivetrainSim {
    fn set_inputs(&mut self, left_volts: f64, right_volts: f64) {
        let limit = self.max_voltage;
        self.input = [
            left_volts.clamp(-limit, limit),
            right_volts.clamp(-limit, limit),
        ];
    }

    fn update(&mut self, dt: f64) {
        if !valid_step(dt) {
            return;
        }
        self.state = self.rk4(&self.state, self.input, dt);
    }

    fn left_position(&self) -> f64 {
        self.state[LEFT_POS]
    }

    fn right_position(&self) -> f64 {
        self.state[RIGHT_POS]
    }

    fn left_velocity(&self) -> f64 {
        self.state[LEFT_VEL]
    }

    fn right_velocity(&self) -> f64 {
        self.state[RIGHT_VEL]
    }

    fn heading(&self) -> f64 {
        self.state[HEADING]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> DifferentialDrivetrainSim {
        DifferentialDrivetrainSim::from_characterization(2.66, 0.433, 2.76, 0.236, 0.7047, 12.0)
    }

    #[test]
    fn identified_system_is_symmetric() {
        let sys = identify_drivetrain_system(2.0, 0.5, 3.0, 0.25);
        assert_eq!(sys.a[0][0], sys.a[1][1]);
        assert_eq!(sys.a[0][1], sys.a[1][0]);
        // a1 = -(4 + 12) / 2, a2 = -(4 - 12) / 2
        assert!((sys.a[0][0] + 8.0).abs() < 1e-12);
        assert!((sys.a[0][1] - 4.0).abs() < 1e-12);
        // b1 = (2 + 4) / 2, b2 = (2 - 4) / 2
        assert!((sys.b[0][0] - 3.0).abs() < 1e-12);
        assert!((sys.b[0][1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn rests_without_input() {
        let mut sim = sim();
        for _ in 0..50 {
            sim.update(0.02);
        }
        assert_eq!(sim.left_position(), 0.0);
        assert_eq!(sim.heading(), 0.0);
        assert_eq!(sim.pose(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn equal_voltage_drives_straight_to_steady_state() {
        let mut sim = sim();
        sim.set_inputs(6.0, 6.0);
        for _ in 0..500 {
            sim.update(0.02);
        }
        // Steady state of a straight drive: v = V / kv_linear.
        let expected = 6.0 / 2.66;
        assert!((sim.left_velocity() - expected).abs() < 1e-6);
        assert!((sim.right_velocity() - expected).abs() < 1e-6);
        assert!(sim.heading().abs() < 1e-12);
        let (x, y, _) = sim.pose();
        assert!(x > 0.0);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn faster_right_wheel_turns_left() {
        let mut sim = sim();
        sim.set_inputs(-3.0, 3.0);
        for _ in 0..10 {
            sim.update(0.02);
        }
        assert!(sim.heading() > 0.0);
        assert!(sim.left_position() < 0.0);
        assert!(sim.right_position() > 0.0);
    }

    #[test]
    fn inputs_are_clamped() {
        let mut sim = sim();
        sim.set_inputs(40.0, -40.0);
        assert_eq!(sim.inputs(), [12.0, -12.0]);
    }

    #[test]
    fn invalid_steps_leave_state_untouched() {
        let mut sim = sim();
        sim.set_inputs(6.0, 4.0);
        sim.update(0.02);
        let before = (sim.pose(), sim.left_velocity(), sim.right_position());

        for dt in [0.0, -0.02, f64::NAN, f64::INFINITY] {
            sim.update(dt);
        }
        assert_eq!((sim.pose(), sim.left_velocity(), sim.right_position()), before);

        sim.update(0.02);
        assert!(sim.left_position().is_finite());
        assert!(sim.left_position() > 0.0);
    }

    #[test]
    fn reset_returns_to_origin() {
        let mut sim = sim();
        sim.set_inputs(12.0, 10.0);
        sim.update(0.5);
        sim.reset();
        assert_eq!(sim.pose(), (0.0, 0.0, 0.0));
        assert_eq!(sim.inputs(), [0.0, 0.0]);
    }
}
