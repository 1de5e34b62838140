use crate::{constants::*, error::ConfigError};
use noisy_float::types::R64;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Session-wide tuning for every vehicle driven by this crate.
///
/// Loaded once when a session starts and never mutated afterwards. Missing
/// fields in a JSON document fall back to the defaults in [`crate::constants`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsTuning {
    pub min_forward_speed: f64,
    pub max_forward_speed: f64,
    pub reference_speed: f64,

    pub max_yaw_rate: f64,
    pub steering_gain: f64,
    pub drift_gain: f64,
    pub yaw_damping: f64,
    pub recovery_gain: f64,
    pub max_recovery_torque: f64,
    pub slip_gain: f64,
    pub max_lateral_speed: f64,
    pub drift_speed_scrub: f64,
    pub cruise_recovery_accel: f64,

    pub lane_width: f64,
    pub magnetism_frequency: f64,
    pub drift_magnetism_multiplier: f64,
    pub fork_magnetism_multiplier: f64,
    pub fork_ramp_distance: f64,
    pub fork_commit_distance: f64,

    pub transition_base_duration: f64,
    pub transition_min_duration: f64,
    pub transition_max_duration: f64,
    pub steer_trigger_threshold: f64,
    pub abort_threshold: f64,

    pub front_to_steering_ratio: f64,
    pub side_to_magnetism_ratio: f64,
    pub rear_to_drift_ratio: f64,
    pub rear_to_slip_ratio: f64,
    pub failure_threshold: f64,

    pub fixed_timestep: f64,
}

impl Default for DynamicsTuning {
    fn default() -> Self {
        Self {
            min_forward_speed: DEFAULT_MIN_FORWARD_SPEED_MS,
            max_forward_speed: DEFAULT_MAX_FORWARD_SPEED_MS,
            reference_speed: DEFAULT_REFERENCE_SPEED_MS,
            max_yaw_rate: DEFAULT_MAX_YAW_RATE,
            steering_gain: DEFAULT_STEERING_GAIN,
            drift_gain: DEFAULT_DRIFT_GAIN,
            yaw_damping: DEFAULT_YAW_DAMPING,
            recovery_gain: DEFAULT_RECOVERY_GAIN,
            max_recovery_torque: DEFAULT_MAX_RECOVERY_TORQUE,
            slip_gain: DEFAULT_SLIP_GAIN,
            max_lateral_speed: DEFAULT_MAX_LATERAL_SPEED_MS,
            drift_speed_scrub: DEFAULT_DRIFT_SPEED_SCRUB_MS2,
            cruise_recovery_accel: DEFAULT_CRUISE_RECOVERY_ACCEL_MS2,
            lane_width: DEFAULT_LANE_WIDTH_M,
            magnetism_frequency: DEFAULT_MAGNETISM_FREQUENCY,
            drift_magnetism_multiplier: DEFAULT_DRIFT_MAGNETISM_MULTIPLIER,
            fork_magnetism_multiplier: DEFAULT_FORK_MAGNETISM_MULTIPLIER,
            fork_ramp_distance: DEFAULT_FORK_RAMP_DISTANCE_M,
            fork_commit_distance: DEFAULT_FORK_COMMIT_DISTANCE_M,
            transition_base_duration: DEFAULT_TRANSITION_BASE_DURATION_SEC,
            transition_min_duration: DEFAULT_TRANSITION_MIN_DURATION_SEC,
            transition_max_duration: DEFAULT_TRANSITION_MAX_DURATION_SEC,
            steer_trigger_threshold: DEFAULT_STEER_TRIGGER_THRESHOLD,
            abort_threshold: DEFAULT_ABORT_THRESHOLD,
            front_to_steering_ratio: DEFAULT_FRONT_TO_STEERING_RATIO,
            side_to_magnetism_ratio: DEFAULT_SIDE_TO_MAGNETISM_RATIO,
            rear_to_drift_ratio: DEFAULT_REAR_TO_DRIFT_RATIO,
            rear_to_slip_ratio: DEFAULT_REAR_TO_SLIP_RATIO,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            fixed_timestep: DEFAULT_FIXED_TIMESTEP_SEC,
        }
    }
}

impl DynamicsTuning {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(text)?;
        tuning.validate()?;
        log::info!("loaded dynamics tuning: {:?}", tuning);
        Ok(tuning)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_reader(reader)?;
        tuning.validate()?;
        log::info!("loaded dynamics tuning: {:?}", tuning);
        Ok(tuning)
    }

    /// Rejects tunings that would let the session start in a state the
    /// controllers cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.fields() {
            if R64::try_new(value).is_none() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        let positive = [
            ("min_forward_speed", self.min_forward_speed),
            ("reference_speed", self.reference_speed),
            ("max_yaw_rate", self.max_yaw_rate),
            ("max_lateral_speed", self.max_lateral_speed),
            ("lane_width", self.lane_width),
            ("magnetism_frequency", self.magnetism_frequency),
            ("fork_ramp_distance", self.fork_ramp_distance),
            ("transition_base_duration", self.transition_base_duration),
            ("transition_min_duration", self.transition_min_duration),
            ("transition_max_duration", self.transition_max_duration),
            ("fixed_timestep", self.fixed_timestep),
        ];
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("steering_gain", self.steering_gain),
            ("drift_gain", self.drift_gain),
            ("yaw_damping", self.yaw_damping),
            ("recovery_gain", self.recovery_gain),
            ("max_recovery_torque", self.max_recovery_torque),
            ("slip_gain", self.slip_gain),
            ("drift_speed_scrub", self.drift_speed_scrub),
            ("cruise_recovery_accel", self.cruise_recovery_accel),
            ("fork_commit_distance", self.fork_commit_distance),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigError::OutOfRange {
                    field,
                    min: 0.0,
                    max: f64::INFINITY,
                    value,
                });
            }
        }

        let ordered = [
            (
                ("min_forward_speed", self.min_forward_speed),
                ("max_forward_speed", self.max_forward_speed),
            ),
            (
                ("transition_min_duration", self.transition_min_duration),
                ("transition_max_duration", self.transition_max_duration),
            ),
        ];
        for ((min_field, min), (max_field, max)) in ordered {
            if min > max {
                return Err(ConfigError::MinExceedsMax {
                    min_field,
                    min,
                    max_field,
                    max,
                });
            }
        }

        let unit = [
            ("drift_magnetism_multiplier", self.drift_magnetism_multiplier),
            ("fork_magnetism_multiplier", self.fork_magnetism_multiplier),
            ("steer_trigger_threshold", self.steer_trigger_threshold),
            ("abort_threshold", self.abort_threshold),
            ("front_to_steering_ratio", self.front_to_steering_ratio),
            ("side_to_magnetism_ratio", self.side_to_magnetism_ratio),
            ("rear_to_drift_ratio", self.rear_to_drift_ratio),
            ("rear_to_slip_ratio", self.rear_to_slip_ratio),
            ("failure_threshold", self.failure_threshold),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    min: 0.0,
                    max: 1.0,
                    value,
                });
            }
        }

        let stiffness = self.magnetism_frequency * self.fixed_timestep;
        if stiffness >= SPRING_STABILITY_LIMIT {
            return Err(ConfigError::UnstableSpring {
                omega: self.magnetism_frequency,
                dt: self.fixed_timestep,
                limit: SPRING_STABILITY_LIMIT,
            });
        }

        Ok(())
    }

    fn fields(&self) -> [(&'static str, f64); 30] {
        [
            ("min_forward_speed", self.min_forward_speed),
            ("max_forward_speed", self.max_forward_speed),
            ("reference_speed", self.reference_speed),
            ("max_yaw_rate", self.max_yaw_rate),
            ("steering_gain", self.steering_gain),
            ("drift_gain", self.drift_gain),
            ("yaw_damping", self.yaw_damping),
            ("recovery_gain", self.recovery_gain),
            ("max_recovery_torque", self.max_recovery_torque),
            ("slip_gain", self.slip_gain),
            ("max_lateral_speed", self.max_lateral_speed),
            ("drift_speed_scrub", self.drift_speed_scrub),
            ("cruise_recovery_accel", self.cruise_recovery_accel),
            ("lane_width", self.lane_width),
            ("magnetism_frequency", self.magnetism_frequency),
            ("drift_magnetism_multiplier", self.drift_magnetism_multiplier),
            ("fork_magnetism_multiplier", self.fork_magnetism_multiplier),
            ("fork_ramp_distance", self.fork_ramp_distance),
            ("fork_commit_distance", self.fork_commit_distance),
            ("transition_base_duration", self.transition_base_duration),
            ("transition_min_duration", self.transition_min_duration),
            ("transition_max_duration", self.transition_max_duration),
            ("steer_trigger_threshold", self.steer_trigger_threshold),
            ("abort_threshold", self.abort_threshold),
            ("front_to_steering_ratio", self.front_to_steering_ratio),
            ("side_to_magnetism_ratio", self.side_to_magnetism_ratio),
            ("rear_to_drift_ratio", self.rear_to_drift_ratio),
            ("rear_to_slip_ratio", self.rear_to_slip_ratio),
            ("failure_threshold", self.failure_threshold),
            ("fixed_timestep", self.fixed_timestep),
        ]
    }
}
