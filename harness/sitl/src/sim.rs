//! Deterministic estimator stand-in for the recorder harness.
//!
//! Produces a plausible converging run (a slow coordinated turn with
//! settling covariances) without any filter mathematics; the recorder
//! only cares that the query interface returns consistent snapshots.

use estimator::{EstimatorQuery, ParameterSnapshot, StateVector, TuningParams, STATE_DIM};

/// Interval between estimator updates: 250 Hz, matching the delayed IMU
/// sample rate of the real filter.
const EPOCH_INTERVAL_US: u64 = 4_000;

/// Yaw rate of the simulated turn (rad/s)
const TURN_RATE: f32 = 0.05;

/// Ground speed along the turn (m/s)
const GROUND_SPEED: f32 = 5.0;

pub struct SimulatedEkf {
    time_us: u64,
    state: StateVector,
    variance: StateVector,
    params: TuningParams,
}

impl SimulatedEkf {
    pub fn new() -> Self {
        let mut state = StateVector::zeros();
        state[0] = 1.0; // unit quaternion, level attitude

        // switch-on uncertainties, grouped like the filter states:
        // quaternion, velocity, position, delta-angle bias,
        // delta-velocity bias, earth field, body field, wind
        let mut variance = StateVector::zeros();
        for i in 0..4 {
            variance[i] = 0.01;
        }
        for i in 4..7 {
            variance[i] = 25.0;
        }
        for i in 7..10 {
            variance[i] = 100.0;
        }
        for i in 10..16 {
            variance[i] = 1.0e-2;
        }
        for i in 16..22 {
            variance[i] = 2.5e-3;
        }
        for i in 22..24 {
            variance[i] = 1.0;
        }

        Self {
            time_us: 0,
            state,
            variance,
            params: TuningParams::default(),
        }
    }

    /// Advance the simulation by one epoch.
    pub fn step(&mut self) {
        self.time_us += EPOCH_INTERVAL_US;
        let dt = EPOCH_INTERVAL_US as f32 * 1.0e-6;
        let yaw = self.yaw();

        // pure yaw rotation
        self.state[0] = (yaw * 0.5).cos();
        self.state[3] = (yaw * 0.5).sin();

        // velocity tangent to the turn, gentle descent
        self.state[4] = GROUND_SPEED * yaw.cos();
        self.state[5] = GROUND_SPEED * yaw.sin();
        self.state[6] = -0.2;

        // integrate position from velocity
        self.state[7] += self.state[4] * dt;
        self.state[8] += self.state[5] * dt;
        self.state[9] += self.state[6] * dt;

        // gyro bias estimate settles toward a small constant
        let t = self.time_us as f32 * 1.0e-6;
        let learned = 1.0 - (-t / 10.0).exp();
        for i in 10..13 {
            self.state[i] = 1.0e-3 * learned;
        }

        // covariances converge toward a steady-state floor
        for i in 0..STATE_DIM {
            self.variance[i] = self.variance[i] * 0.995 + 1.0e-6;
        }
    }

    fn yaw(&self) -> f32 {
        TURN_RATE * self.time_us as f32 * 1.0e-6
    }
}

impl EstimatorQuery for SimulatedEkf {
    fn delayed_imu_timestamp_us(&self) -> u64 {
        self.time_us
    }

    fn state_at_fusion_horizon(&self) -> StateVector {
        self.state
    }

    fn covariance_diagonal(&self) -> StateVector {
        self.variance
    }

    fn estimated_heading(&self) -> f32 {
        self.yaw()
    }

    fn predicted_mag_heading(&self) -> f32 {
        // constant declination-like offset between the two diagnostics
        self.yaw() + 0.01
    }

    fn parameter_snapshot(&self) -> ParameterSnapshot {
        self.params.snapshot()
    }
}
