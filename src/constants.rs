pub const DEFAULT_MIN_FORWARD_SPEED_MS: f64 = 10.0;
pub const DEFAULT_MAX_FORWARD_SPEED_MS: f64 = 90.0;
pub const DEFAULT_REFERENCE_SPEED_MS: f64 = 30.0;

pub const DEFAULT_MAX_YAW_RATE: f64 = 4.5;
pub const DEFAULT_STEERING_GAIN: f64 = 3.0;
pub const DEFAULT_DRIFT_GAIN: f64 = 1.2;
pub const DEFAULT_YAW_DAMPING: f64 = 2.5;
pub const DEFAULT_RECOVERY_GAIN: f64 = 6.0;
pub const DEFAULT_MAX_RECOVERY_TORQUE: f64 = 12.0;
pub const DEFAULT_SLIP_GAIN: f64 = 1.6;
pub const DEFAULT_MAX_LATERAL_SPEED_MS: f64 = 20.0;
pub const DEFAULT_DRIFT_SPEED_SCRUB_MS2: f64 = 2.0;
pub const DEFAULT_CRUISE_RECOVERY_ACCEL_MS2: f64 = 4.0;

pub const DEFAULT_LANE_WIDTH_M: f64 = 3.6;
pub const DEFAULT_MAGNETISM_FREQUENCY: f64 = 8.0;
pub const DEFAULT_DRIFT_MAGNETISM_MULTIPLIER: f64 = 0.3;
pub const DEFAULT_FORK_MAGNETISM_MULTIPLIER: f64 = 0.7;
pub const DEFAULT_FORK_RAMP_DISTANCE_M: f64 = 80.0;
pub const DEFAULT_FORK_COMMIT_DISTANCE_M: f64 = 30.0;

pub const DEFAULT_TRANSITION_BASE_DURATION_SEC: f64 = 0.6;
pub const DEFAULT_TRANSITION_MIN_DURATION_SEC: f64 = 0.45;
pub const DEFAULT_TRANSITION_MAX_DURATION_SEC: f64 = 1.0;
pub const DEFAULT_STEER_TRIGGER_THRESHOLD: f64 = 0.35;
pub const DEFAULT_ABORT_THRESHOLD: f64 = 0.7;

pub const DEFAULT_FRONT_TO_STEERING_RATIO: f64 = 0.8;
pub const DEFAULT_SIDE_TO_MAGNETISM_RATIO: f64 = 0.5;
pub const DEFAULT_REAR_TO_DRIFT_RATIO: f64 = 0.6;
pub const DEFAULT_REAR_TO_SLIP_RATIO: f64 = 0.5;
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.1;

pub const DEFAULT_FIXED_TIMESTEP_SEC: f64 = 1.0 / 60.0;

/// Semi-implicit Euler on a critically damped spring stops producing
/// non-negative real eigenvalues once `omega * h` reaches this value.
pub const SPRING_STABILITY_LIMIT: f64 = 0.5;

/// Largest `omega * h` the magnetism integrator allows per internal sub-step.
pub const SPRING_SUBSTEP_LIMIT: f64 = 0.45;

/// Wrapped yaw offset below which a vehicle counts as re-aligned.
pub const RECOVERED_YAW_TOLERANCE_RAD: f64 = 0.05;
