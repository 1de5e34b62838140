use crate::{
    config::DynamicsTuning,
    constants::SPRING_SUBSTEP_LIMIT,
    math::{lerp, smoothstep},
    physics::VehicleKinematicState,
};

#[derive(Debug, Clone)]
pub struct MagnetismControllerInit {
    pub frequency: f64,
    pub drift_multiplier: f64,
    pub fork_multiplier: f64,
    pub fork_ramp_distance: f64,
    pub max_lateral_speed: f64,
}

impl MagnetismControllerInit {
    pub fn from_tuning(tuning: &DynamicsTuning) -> Self {
        Self {
            frequency: tuning.magnetism_frequency,
            drift_multiplier: tuning.drift_magnetism_multiplier,
            fork_multiplier: tuning.fork_magnetism_multiplier,
            fork_ramp_distance: tuning.fork_ramp_distance,
            max_lateral_speed: tuning.max_lateral_speed,
        }
    }

    pub fn build(&self) -> MagnetismController {
        let Self {
            frequency,
            drift_multiplier,
            fork_multiplier,
            fork_ramp_distance,
            max_lateral_speed,
        } = *self;

        MagnetismController {
            frequency,
            drift_multiplier,
            fork_multiplier,
            fork_ramp_distance,
            max_lateral_speed,
        }
    }
}

/// Critically damped spring pulling the lateral offset toward a lane center.
///
/// Integrated with semi-implicit Euler, sub-stepped so that every internal
/// step keeps `omega * h` at or below [`SPRING_SUBSTEP_LIMIT`]. Below one half
/// the discrete system has real, non-negative eigenvalues: no ringing, no
/// blow-up.
#[derive(Debug)]
pub struct MagnetismController {
    frequency: f64,
    drift_multiplier: f64,
    fork_multiplier: f64,
    fork_ramp_distance: f64,
    max_lateral_speed: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct MagnetismInput {
    pub target_center: f64,
    pub handbrake: bool,
    pub fork_distance: Option<f64>,
    /// Damage driven lane multiplier.
    pub lane_multiplier: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MagnetismControl {
    pub multiplier: f64,
    pub effective_frequency: f64,
    pub substeps: usize,
    pub lateral_accel: f64,
}

impl MagnetismController {
    pub fn max_lateral_speed(&self) -> f64 {
        self.max_lateral_speed
    }

    /// 1.0 away from forks, easing down to the fork multiplier by smoothstep
    /// over the ramp distance, and holding it past the commit point.
    pub fn fork_multiplier(&self, fork_distance: Option<f64>) -> f64 {
        match fork_distance {
            None => 1.0,
            Some(distance) => {
                let closeness = 1.0 - distance / self.fork_ramp_distance;
                lerp(1.0, self.fork_multiplier, smoothstep(closeness))
            }
        }
    }

    pub fn multiplier(&self, input: &MagnetismInput) -> f64 {
        let drift = if input.handbrake {
            self.drift_multiplier
        } else {
            1.0
        };
        input.lane_multiplier * drift * self.fork_multiplier(input.fork_distance)
    }

    pub fn step(
        &self,
        state: &mut VehicleKinematicState,
        input: MagnetismInput,
        time_delta_sec: f64,
    ) -> MagnetismControl {
        let multiplier = self.multiplier(&input);
        let omega = self.frequency * multiplier;
        let max_lateral_speed = self.max_lateral_speed;

        let substeps = ((omega * time_delta_sec) / SPRING_SUBSTEP_LIMIT).ceil().max(1.0) as usize;
        let h = time_delta_sec / substeps as f64;

        let mut lateral_accel = 0.0;
        for _ in 0..substeps {
            let error = state.lateral_offset - input.target_center;
            lateral_accel = -omega * omega * error - 2.0 * omega * state.lateral_speed;

            state.lateral_speed = (state.lateral_speed + lateral_accel * h)
                .clamp(-max_lateral_speed, max_lateral_speed);
            state.lateral_offset += state.lateral_speed * h;
        }

        MagnetismControl {
            multiplier,
            effective_frequency: omega,
            substeps,
            lateral_accel,
        }
    }
}
