use crate::config::DynamicsTuning;

#[derive(Debug, Clone)]
pub struct SpeedControllerInit {
    pub min_forward_speed: f64,
    pub max_forward_speed: f64,
    pub cruise_speed: f64,
    pub drift_speed_scrub: f64,
    pub cruise_recovery_accel: f64,
}

impl SpeedControllerInit {
    pub fn from_tuning(tuning: &DynamicsTuning) -> Self {
        Self {
            min_forward_speed: tuning.min_forward_speed,
            max_forward_speed: tuning.max_forward_speed,
            cruise_speed: tuning.reference_speed,
            drift_speed_scrub: tuning.drift_speed_scrub,
            cruise_recovery_accel: tuning.cruise_recovery_accel,
        }
    }

    pub fn build(&self) -> SpeedController {
        let Self {
            min_forward_speed,
            max_forward_speed,
            cruise_speed,
            drift_speed_scrub,
            cruise_recovery_accel,
        } = *self;

        SpeedController {
            min_forward_speed,
            max_forward_speed,
            cruise_speed: cruise_speed.max(min_forward_speed).min(max_forward_speed),
            drift_speed_scrub,
            cruise_recovery_accel,
        }
    }
}

/// Forward-velocity enforcer.
///
/// Whatever forward speed comes in (negative after a head-on impulse, huge
/// after a boost), the speed that comes out lies in
/// `[min_forward_speed, max_forward_speed]`. The handbrake scrubs speed off;
/// once it is released the vehicle accelerates back up to its cruise speed.
#[derive(Debug)]
pub struct SpeedController {
    min_forward_speed: f64,
    max_forward_speed: f64,
    cruise_speed: f64,
    drift_speed_scrub: f64,
    cruise_recovery_accel: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedControl {
    pub forward_speed: f64,
    pub floor_engaged: bool,
}

impl SpeedController {
    pub fn min_forward_speed(&self) -> f64 {
        self.min_forward_speed
    }

    pub fn max_forward_speed(&self) -> f64 {
        self.max_forward_speed
    }

    pub fn cruise_speed(&self) -> f64 {
        self.cruise_speed
    }

    pub fn step(&self, forward_speed: f64, handbrake: bool, time_delta_sec: f64) -> SpeedControl {
        let Self {
            min_forward_speed,
            max_forward_speed,
            cruise_speed,
            drift_speed_scrub,
            cruise_recovery_accel,
        } = *self;

        // Scrub or recover first so the floor always has the last word.
        let adjusted = if handbrake {
            forward_speed - drift_speed_scrub * time_delta_sec
        } else if forward_speed < cruise_speed {
            let recovered = forward_speed + cruise_recovery_accel * time_delta_sec;
            recovered.min(cruise_speed)
        } else {
            forward_speed
        };

        let floor_engaged = adjusted < min_forward_speed;
        let forward_speed = adjusted.max(min_forward_speed).min(max_forward_speed);

        SpeedControl {
            forward_speed,
            floor_engaged,
        }
    }
}
