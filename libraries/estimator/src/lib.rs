//! # Estimator query surface
//!
//! Read-only view onto an attitude/position estimator (an Extended Kalman
//! Filter) running inside a sensor-fusion test harness. The estimator
//! itself lives elsewhere; this crate only defines what a diagnostic
//! consumer is allowed to ask of it:
//!
//! - the 24-element state vector at the fusion time horizon
//! - the matching diagonal of the error-covariance matrix
//! - the delayed-IMU-sample timestamp the estimate is valid for
//! - heading diagnostics (filter-estimated and magnetometer-predicted)
//! - a snapshot of the active tuning-parameter set
//!
//! Consumers never mutate the estimator through this interface.

use nalgebra as na;

pub mod params;

pub use params::{ParamValue, ParameterSnapshot, TuningParams};

/// Number of states carried by the filter: quaternion (4), velocity (3),
/// position (3), delta-angle bias (3), delta-velocity bias (3),
/// earth magnetic field (3), body magnetic field (3), wind velocity (2).
pub const STATE_DIM: usize = 24;

/// State estimate at the fusion horizon, one entry per filter state.
pub type StateVector = na::SVector<f32, STATE_DIM>;

/// Read-only estimator query interface.
///
/// Implementations are queried once per simulated epoch by diagnostic
/// consumers. The handle is shared with the owning harness, which may
/// mutate the estimator between queries; values returned here are
/// snapshots, valid only for the call that produced them.
pub trait EstimatorQuery {
    /// Timestamp of the delayed IMU sample the current estimate is
    /// aligned to, in microseconds.
    fn delayed_imu_timestamp_us(&self) -> u64;

    /// State vector at the fusion time horizon.
    fn state_at_fusion_horizon(&self) -> StateVector;

    /// Diagonal of the state error-covariance matrix, indexed like the
    /// state vector.
    fn covariance_diagonal(&self) -> StateVector;

    /// Filter-estimated heading in radians.
    fn estimated_heading(&self) -> f32;

    /// Heading predicted from the magnetometer measurement in radians.
    fn predicted_mag_heading(&self) -> f32;

    /// Ordered snapshot of the active tuning-parameter set.
    fn parameter_snapshot(&self) -> ParameterSnapshot;
}
