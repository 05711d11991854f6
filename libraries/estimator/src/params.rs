//! Tuning-parameter set of the estimator.
//!
//! The filter exposes its active tuning configuration read-only so that
//! diagnostic tooling can archive it alongside a recorded run. The
//! snapshot order follows the canonical parameter taxonomy of the filter
//! and is part of the report contract: downstream tooling diffs two
//! reports line by line.

use std::fmt;

/// Value of a single tuning parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    F32(f32),
    I32(i32),
    U64(u64),
    Bool(bool),
    /// Body-frame offset parameters are three-component vectors.
    Vec3([f32; 3]),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::F32(v) => write!(f, "{}", v),
            ParamValue::I32(v) => write!(f, "{}", v),
            ParamValue::U64(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Vec3(v) => write!(f, "[{}, {}, {}]", v[0], v[1], v[2]),
        }
    }
}

/// Ordered name/value pairs, one per tuning parameter.
pub type ParameterSnapshot = Vec<(&'static str, ParamValue)>;

/// Complete tuning-parameter set of the filter.
///
/// Field grouping mirrors the functional categories of the filter; the
/// defaults are the values the filter starts with before any harness
/// overrides them.
#[derive(Debug, Clone)]
pub struct TuningParams {
    // Input noise
    /// Gyroscope measurement noise (rad/s)
    pub gyro_noise: f32,
    /// Accelerometer measurement noise (m/s^2)
    pub accel_noise: f32,

    // Process noise
    /// Gyroscope bias random walk (rad/s^2)
    pub gyro_bias_p_noise: f32,
    /// Accelerometer bias random walk (m/s^3)
    pub accel_bias_p_noise: f32,
    /// Earth magnetic field random walk (gauss/s)
    pub mage_p_noise: f32,
    /// Body magnetic field random walk (gauss/s)
    pub magb_p_noise: f32,
    /// Wind velocity random walk (m/s^2)
    pub wind_vel_p_noise: f32,
    /// Scaling applied to wind process noise with height rate
    pub wind_vel_p_noise_scaler: f32,
    /// Terrain offset process noise (m/s)
    pub terrain_p_noise: f32,
    /// Terrain gradient magnitude (m/m)
    pub terrain_gradient: f32,

    // Initialization errors
    /// 1-sigma gyroscope bias uncertainty at switch-on (rad/s)
    pub switch_on_gyro_bias: f32,
    /// 1-sigma accelerometer bias uncertainty at switch-on (m/s^2)
    pub switch_on_accel_bias: f32,
    /// 1-sigma tilt error after initial alignment (rad)
    pub initial_tilt_err: f32,
    /// 1-sigma initial wind velocity uncertainty (m/s)
    pub initial_wind_uncertainty: f32,

    // Position/velocity fusion gates
    /// GPS velocity observation noise (m/s)
    pub gps_vel_noise: f32,
    /// GPS position observation noise (m)
    pub gps_pos_noise: f32,
    /// Position hold noise used when dead reckoning (m)
    pub pos_noaid_noise: f32,
    /// Barometric height observation noise (m)
    pub baro_noise: f32,
    /// Barometric height innovation gate (SD)
    pub baro_innov_gate: f32,
    /// GPS horizontal position innovation gate (SD)
    pub gps_pos_innov_gate: f32,
    /// GPS velocity innovation gate (SD)
    pub gps_vel_innov_gate: f32,
    /// Baro deadzone applied during ground effect (m)
    pub gnd_effect_deadzone: f32,
    /// Height above ground below which ground effect is assumed (m)
    pub gnd_effect_max_hgt: f32,

    // Magnetometer fusion
    /// Magnetic heading observation noise (rad)
    pub mag_heading_noise: f32,
    /// Magnetometer field observation noise (gauss)
    pub mag_noise: f32,
    /// Magnetic declination (deg)
    pub mag_declination_deg: f32,
    /// Magnetic heading innovation gate (SD)
    pub heading_innov_gate: f32,
    /// Magnetometer field innovation gate (SD)
    pub mag_innov_gate: f32,
    /// Magnetometer fusion mode selector
    pub mag_fusion_type: i32,
    /// Bitmask selecting the declination source
    pub mag_declination_source: i32,
    /// Horizontal acceleration above which 3-axis fusion is used (m/s^2)
    pub mag_acc_gate: f32,
    /// Yaw rate above which 3-axis fusion is used (rad/s)
    pub mag_yaw_rate_gate: f32,

    // Airspeed fusion
    /// True airspeed innovation gate (SD)
    pub tas_innov_gate: f32,
    /// Equivalent airspeed observation noise (m/s)
    pub eas_noise: f32,
    /// Airspeed below which fusion is inhibited (m/s)
    pub arsp_thr: f32,

    // Sideslip fusion
    /// Synthetic sideslip innovation gate (SD)
    pub beta_innov_gate: f32,
    /// Synthetic sideslip observation noise (rad)
    pub beta_noise: f32,
    /// Minimum interval between sideslip fusions (us)
    pub beta_avg_ft_us: u64,

    // Range-finder fusion
    /// Range finder observation noise (m)
    pub range_noise: f32,
    /// Range finder innovation gate (SD)
    pub range_innov_gate: f32,
    /// Range measured when the vehicle is on the ground (m)
    pub rng_gnd_clearance: f32,
    /// Range sensor pitch offset (rad)
    pub rng_sens_pitch: f32,
    /// Scaling of range noise with range
    pub range_noise_scaler: f32,
    /// Maximum height above ground for range aiding (m)
    pub max_hagl_for_range_aid: f32,
    /// Maximum horizontal velocity for range aiding (m/s)
    pub max_vel_for_range_aid: f32,
    /// Innovation gate applied while range aiding (SD)
    pub range_aid_innov_gate: f32,
    /// Maximum tilt cosine for a valid range sample
    pub range_cos_max_tilt: f32,

    // Vision fusion
    /// External vision velocity innovation gate (SD)
    pub ev_vel_innov_gate: f32,
    /// External vision position innovation gate (SD)
    pub ev_pos_innov_gate: f32,

    // Optical-flow fusion
    /// Optical flow observation noise at best quality (rad/s)
    pub flow_noise: f32,
    /// Optical flow observation noise at minimum quality (rad/s)
    pub flow_noise_qual_min: f32,
    /// Minimum acceptable flow quality
    pub flow_qual_min: i32,
    /// Optical flow innovation gate (SD)
    pub flow_innov_gate: f32,

    // GPS quality-check thresholds
    /// Bitmask selecting which GPS checks run
    pub gps_check_mask: i32,
    /// Maximum acceptable horizontal position error (m)
    pub req_hacc: f32,
    /// Maximum acceptable vertical position error (m)
    pub req_vacc: f32,
    /// Maximum acceptable speed error (m/s)
    pub req_sacc: f32,
    /// Minimum acceptable satellite count
    pub req_nsats: i32,
    /// Maximum acceptable position dilution of precision
    pub req_pdop: f32,
    /// Maximum acceptable horizontal drift (m/s)
    pub req_hdrift: f32,
    /// Maximum acceptable vertical drift (m/s)
    pub req_vdrift: f32,

    // Sensor-offset placeholders (body frame, m)
    pub imu_pos_body: [f32; 3],
    pub gps_pos_body: [f32; 3],
    pub rng_pos_body: [f32; 3],
    pub flow_pos_body: [f32; 3],
    pub ev_pos_body: [f32; 3],

    // Complementary-filter time constants
    /// Velocity output predictor time constant (s)
    pub vel_tau: f32,
    /// Position output predictor time constant (s)
    pub pos_tau: f32,

    // Bias-learning limits
    /// Maximum learned accelerometer bias magnitude (m/s^2)
    pub acc_bias_lim: f32,
    /// Acceleration above which bias learning is inhibited (m/s^2)
    pub acc_bias_learn_acc_lim: f32,
    /// Angular rate above which bias learning is inhibited (rad/s)
    pub acc_bias_learn_gyr_lim: f32,
    /// Time constant of the bias-learning inhibit (s)
    pub acc_bias_learn_tc: f32,

    // Static-pressure position-error coefficients
    pub static_pressure_coef_xp: f32,
    pub static_pressure_coef_xn: f32,
    pub static_pressure_coef_yp: f32,
    pub static_pressure_coef_yn: f32,
    pub static_pressure_coef_z: f32,

    // Drag fusion
    /// Specific-force observation noise for drag fusion (m/s^2)
    pub drag_noise: f32,
    /// Ballistic coefficient, X axis (kg/m^2)
    pub bcoef_x: f32,
    /// Ballistic coefficient, Y axis (kg/m^2)
    pub bcoef_y: f32,

    // Auxiliary-velocity fusion
    /// Auxiliary velocity observation noise (m/s)
    pub auxvel_noise: f32,
    /// Auxiliary velocity innovation gate (SD)
    pub auxvel_gate: f32,

    // Movement-detection scaling
    /// Scaling applied to the on-ground movement detector
    pub is_moving_scaler: f32,

    // Synthetic-magnetometer options
    /// Replace the measured Z magnetometer axis with a synthetic value
    pub synthesize_mag_z: bool,
    /// Reject magnetometer samples with implausible field strength
    pub check_mag_strength: bool,

    // Yaw-estimator reset thresholds
    /// Delay before the yaw estimator may request a reset (us)
    pub ekfgsf_reset_delay_us: u64,
    /// Yaw error below which the yaw estimator output is trusted (rad)
    pub ekfgsf_yaw_err_th: f32,
    /// Maximum number of yaw-estimator resets per flight
    pub ekfgsf_reset_count_lim: i32,
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            gyro_noise: 1.5e-2,
            accel_noise: 3.5e-1,

            gyro_bias_p_noise: 1.0e-3,
            accel_bias_p_noise: 3.0e-3,
            mage_p_noise: 1.0e-3,
            magb_p_noise: 1.0e-4,
            wind_vel_p_noise: 1.0e-1,
            wind_vel_p_noise_scaler: 0.5,
            terrain_p_noise: 5.0,
            terrain_gradient: 0.5,

            switch_on_gyro_bias: 0.1,
            switch_on_accel_bias: 0.2,
            initial_tilt_err: 0.1,
            initial_wind_uncertainty: 1.0,

            gps_vel_noise: 0.5,
            gps_pos_noise: 0.5,
            pos_noaid_noise: 10.0,
            baro_noise: 2.0,
            baro_innov_gate: 5.0,
            gps_pos_innov_gate: 5.0,
            gps_vel_innov_gate: 5.0,
            gnd_effect_deadzone: 5.0,
            gnd_effect_max_hgt: 0.5,

            mag_heading_noise: 3.0e-1,
            mag_noise: 5.0e-2,
            mag_declination_deg: 0.0,
            heading_innov_gate: 2.6,
            mag_innov_gate: 3.0,
            mag_fusion_type: 0,
            mag_declination_source: 7,
            mag_acc_gate: 0.5,
            mag_yaw_rate_gate: 0.25,

            tas_innov_gate: 5.0,
            eas_noise: 1.4,
            arsp_thr: 2.0,

            beta_innov_gate: 5.0,
            beta_noise: 0.3,
            beta_avg_ft_us: 150_000,

            range_noise: 0.1,
            range_innov_gate: 5.0,
            rng_gnd_clearance: 0.1,
            rng_sens_pitch: 0.0,
            range_noise_scaler: 0.0,
            max_hagl_for_range_aid: 5.0,
            max_vel_for_range_aid: 1.0,
            range_aid_innov_gate: 1.0,
            range_cos_max_tilt: 0.7071,

            ev_vel_innov_gate: 3.0,
            ev_pos_innov_gate: 5.0,

            flow_noise: 0.15,
            flow_noise_qual_min: 0.5,
            flow_qual_min: 1,
            flow_innov_gate: 3.0,

            gps_check_mask: 245,
            req_hacc: 5.0,
            req_vacc: 8.0,
            req_sacc: 1.0,
            req_nsats: 6,
            req_pdop: 2.5,
            req_hdrift: 0.1,
            req_vdrift: 0.2,

            imu_pos_body: [0.0; 3],
            gps_pos_body: [0.0; 3],
            rng_pos_body: [0.0; 3],
            flow_pos_body: [0.0; 3],
            ev_pos_body: [0.0; 3],

            vel_tau: 0.25,
            pos_tau: 0.25,

            acc_bias_lim: 0.4,
            acc_bias_learn_acc_lim: 25.0,
            acc_bias_learn_gyr_lim: 3.0,
            acc_bias_learn_tc: 0.5,

            static_pressure_coef_xp: 0.0,
            static_pressure_coef_xn: 0.0,
            static_pressure_coef_yp: 0.0,
            static_pressure_coef_yn: 0.0,
            static_pressure_coef_z: 0.0,

            drag_noise: 2.5,
            bcoef_x: 25.0,
            bcoef_y: 25.0,

            auxvel_noise: 0.5,
            auxvel_gate: 5.0,

            is_moving_scaler: 1.0,

            synthesize_mag_z: false,
            check_mag_strength: false,

            ekfgsf_reset_delay_us: 1_000_000,
            ekfgsf_yaw_err_th: 0.262,
            ekfgsf_reset_count_lim: 2,
        }
    }
}

impl TuningParams {
    /// Snapshot every parameter in canonical category order.
    ///
    /// The order is a contract: reports generated from two runs must be
    /// diffable line by line.
    pub fn snapshot(&self) -> ParameterSnapshot {
        use ParamValue::*;

        vec![
            // Input noise
            ("gyro_noise", F32(self.gyro_noise)),
            ("accel_noise", F32(self.accel_noise)),
            // Process noise
            ("gyro_bias_p_noise", F32(self.gyro_bias_p_noise)),
            ("accel_bias_p_noise", F32(self.accel_bias_p_noise)),
            ("mage_p_noise", F32(self.mage_p_noise)),
            ("magb_p_noise", F32(self.magb_p_noise)),
            ("wind_vel_p_noise", F32(self.wind_vel_p_noise)),
            ("wind_vel_p_noise_scaler", F32(self.wind_vel_p_noise_scaler)),
            ("terrain_p_noise", F32(self.terrain_p_noise)),
            ("terrain_gradient", F32(self.terrain_gradient)),
            // Initialization errors
            ("switch_on_gyro_bias", F32(self.switch_on_gyro_bias)),
            ("switch_on_accel_bias", F32(self.switch_on_accel_bias)),
            ("initial_tilt_err", F32(self.initial_tilt_err)),
            ("initial_wind_uncertainty", F32(self.initial_wind_uncertainty)),
            // Position/velocity fusion gates
            ("gps_vel_noise", F32(self.gps_vel_noise)),
            ("gps_pos_noise", F32(self.gps_pos_noise)),
            ("pos_noaid_noise", F32(self.pos_noaid_noise)),
            ("baro_noise", F32(self.baro_noise)),
            ("baro_innov_gate", F32(self.baro_innov_gate)),
            ("gps_pos_innov_gate", F32(self.gps_pos_innov_gate)),
            ("gps_vel_innov_gate", F32(self.gps_vel_innov_gate)),
            ("gnd_effect_deadzone", F32(self.gnd_effect_deadzone)),
            ("gnd_effect_max_hgt", F32(self.gnd_effect_max_hgt)),
            // Magnetometer fusion
            ("mag_heading_noise", F32(self.mag_heading_noise)),
            ("mag_noise", F32(self.mag_noise)),
            ("mag_declination_deg", F32(self.mag_declination_deg)),
            ("heading_innov_gate", F32(self.heading_innov_gate)),
            ("mag_innov_gate", F32(self.mag_innov_gate)),
            ("mag_fusion_type", I32(self.mag_fusion_type)),
            ("mag_declination_source", I32(self.mag_declination_source)),
            ("mag_acc_gate", F32(self.mag_acc_gate)),
            ("mag_yaw_rate_gate", F32(self.mag_yaw_rate_gate)),
            // Airspeed fusion
            ("tas_innov_gate", F32(self.tas_innov_gate)),
            ("eas_noise", F32(self.eas_noise)),
            ("arsp_thr", F32(self.arsp_thr)),
            // Sideslip fusion
            ("beta_innov_gate", F32(self.beta_innov_gate)),
            ("beta_noise", F32(self.beta_noise)),
            ("beta_avg_ft_us", U64(self.beta_avg_ft_us)),
            // Range-finder fusion
            ("range_noise", F32(self.range_noise)),
            ("range_innov_gate", F32(self.range_innov_gate)),
            ("rng_gnd_clearance", F32(self.rng_gnd_clearance)),
            ("rng_sens_pitch", F32(self.rng_sens_pitch)),
            ("range_noise_scaler", F32(self.range_noise_scaler)),
            ("max_hagl_for_range_aid", F32(self.max_hagl_for_range_aid)),
            ("max_vel_for_range_aid", F32(self.max_vel_for_range_aid)),
            ("range_aid_innov_gate", F32(self.range_aid_innov_gate)),
            ("range_cos_max_tilt", F32(self.range_cos_max_tilt)),
            // Vision fusion
            ("ev_vel_innov_gate", F32(self.ev_vel_innov_gate)),
            ("ev_pos_innov_gate", F32(self.ev_pos_innov_gate)),
            // Optical-flow fusion
            ("flow_noise", F32(self.flow_noise)),
            ("flow_noise_qual_min", F32(self.flow_noise_qual_min)),
            ("flow_qual_min", I32(self.flow_qual_min)),
            ("flow_innov_gate", F32(self.flow_innov_gate)),
            // GPS quality-check thresholds
            ("gps_check_mask", I32(self.gps_check_mask)),
            ("req_hacc", F32(self.req_hacc)),
            ("req_vacc", F32(self.req_vacc)),
            ("req_sacc", F32(self.req_sacc)),
            ("req_nsats", I32(self.req_nsats)),
            ("req_pdop", F32(self.req_pdop)),
            ("req_hdrift", F32(self.req_hdrift)),
            ("req_vdrift", F32(self.req_vdrift)),
            // Sensor-offset placeholders
            ("imu_pos_body", Vec3(self.imu_pos_body)),
            ("gps_pos_body", Vec3(self.gps_pos_body)),
            ("rng_pos_body", Vec3(self.rng_pos_body)),
            ("flow_pos_body", Vec3(self.flow_pos_body)),
            ("ev_pos_body", Vec3(self.ev_pos_body)),
            // Complementary-filter time constants
            ("vel_tau", F32(self.vel_tau)),
            ("pos_tau", F32(self.pos_tau)),
            // Bias-learning limits
            ("acc_bias_lim", F32(self.acc_bias_lim)),
            ("acc_bias_learn_acc_lim", F32(self.acc_bias_learn_acc_lim)),
            ("acc_bias_learn_gyr_lim", F32(self.acc_bias_learn_gyr_lim)),
            ("acc_bias_learn_tc", F32(self.acc_bias_learn_tc)),
            // Static-pressure position-error coefficients
            ("static_pressure_coef_xp", F32(self.static_pressure_coef_xp)),
            ("static_pressure_coef_xn", F32(self.static_pressure_coef_xn)),
            ("static_pressure_coef_yp", F32(self.static_pressure_coef_yp)),
            ("static_pressure_coef_yn", F32(self.static_pressure_coef_yn)),
            ("static_pressure_coef_z", F32(self.static_pressure_coef_z)),
            // Drag fusion
            ("drag_noise", F32(self.drag_noise)),
            ("bcoef_x", F32(self.bcoef_x)),
            ("bcoef_y", F32(self.bcoef_y)),
            // Auxiliary-velocity fusion
            ("auxvel_noise", F32(self.auxvel_noise)),
            ("auxvel_gate", F32(self.auxvel_gate)),
            // Movement-detection scaling
            ("is_moving_scaler", F32(self.is_moving_scaler)),
            // Synthetic-magnetometer options
            ("synthesize_mag_z", Bool(self.synthesize_mag_z)),
            ("check_mag_strength", Bool(self.check_mag_strength)),
            // Yaw-estimator reset thresholds
            ("ekfgsf_reset_delay_us", U64(self.ekfgsf_reset_delay_us)),
            ("ekfgsf_yaw_err_th", F32(self.ekfgsf_yaw_err_th)),
            ("ekfgsf_reset_count_lim", I32(self.ekfgsf_reset_count_lim)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(snapshot: &ParameterSnapshot, name: &str) -> usize {
        snapshot
            .iter()
            .position(|(n, _)| *n == name)
            .unwrap_or_else(|| panic!("parameter {} missing from snapshot", name))
    }

    #[test]
    fn test_snapshot_category_order() {
        let snapshot = TuningParams::default().snapshot();

        // Input noise leads the report, yaw-estimator thresholds close it
        assert_eq!(snapshot[0].0, "gyro_noise");
        assert_eq!(snapshot.last().unwrap().0, "ekfgsf_reset_count_lim");

        // Category ordering is fixed
        assert!(index_of(&snapshot, "gyro_noise") < index_of(&snapshot, "gyro_bias_p_noise"));
        assert!(index_of(&snapshot, "switch_on_gyro_bias") < index_of(&snapshot, "gps_vel_noise"));
        assert!(index_of(&snapshot, "mag_heading_noise") < index_of(&snapshot, "tas_innov_gate"));
        assert!(index_of(&snapshot, "gps_check_mask") < index_of(&snapshot, "imu_pos_body"));
        assert!(index_of(&snapshot, "drag_noise") < index_of(&snapshot, "auxvel_noise"));
    }

    #[test]
    fn test_snapshot_covers_every_parameter_once() {
        let snapshot = TuningParams::default().snapshot();
        let mut names: Vec<&str> = snapshot.iter().map(|(n, _)| *n).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total, "duplicate parameter name in snapshot");
    }

    #[test]
    fn test_param_value_display() {
        assert_eq!(ParamValue::F32(2.5).to_string(), "2.5");
        assert_eq!(ParamValue::I32(-3).to_string(), "-3");
        assert_eq!(ParamValue::U64(150_000).to_string(), "150000");
        assert_eq!(ParamValue::Bool(false).to_string(), "false");
        assert_eq!(ParamValue::Vec3([0.0, 0.5, -1.0]).to_string(), "[0, 0.5, -1]");
    }
}
