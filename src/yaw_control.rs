use crate::{
    config::DynamicsTuning,
    damage::DegradationFactors,
    math::{sign, wrap_angle},
    physics::VehicleKinematicState,
    pid::PidInit,
};
use pid::Pid;

#[derive(Debug, Clone)]
pub struct YawControllerInit {
    pub reference_speed: f64,
    pub steering_gain: f64,
    pub drift_gain: f64,
    pub yaw_damping: f64,
    pub max_yaw_rate: f64,
    pub slip_gain: f64,
    pub max_lateral_speed: f64,
    pub recovery: PidInit,
}

impl YawControllerInit {
    pub fn from_tuning(tuning: &DynamicsTuning) -> Self {
        Self {
            reference_speed: tuning.reference_speed,
            steering_gain: tuning.steering_gain,
            drift_gain: tuning.drift_gain,
            yaw_damping: tuning.yaw_damping,
            max_yaw_rate: tuning.max_yaw_rate,
            slip_gain: tuning.slip_gain,
            max_lateral_speed: tuning.max_lateral_speed,
            recovery: PidInit::proportional(tuning.recovery_gain, tuning.max_recovery_torque),
        }
    }

    pub fn build(&self) -> YawController {
        let Self {
            reference_speed,
            steering_gain,
            drift_gain,
            yaw_damping,
            max_yaw_rate,
            slip_gain,
            max_lateral_speed,
            ref recovery,
        } = *self;

        YawController {
            recovery_pid: recovery.build(),
            reference_speed,
            steering_gain,
            drift_gain,
            yaw_damping,
            max_yaw_rate,
            slip_gain,
            max_lateral_speed,
        }
    }
}

/// Continuous yaw/drift controller, evaluated every tick.
#[derive(Debug)]
pub struct YawController {
    recovery_pid: Pid<f64>,
    reference_speed: f64,
    steering_gain: f64,
    drift_gain: f64,
    yaw_damping: f64,
    max_yaw_rate: f64,
    slip_gain: f64,
    max_lateral_speed: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct YawInput {
    /// Already clamped to `[-1, 1]`.
    pub steer: f64,
    pub handbrake: bool,
    /// `1 − smoothstep(progress / duration)` during a lane transition, else 1.
    pub steering_authority: f64,
    pub degradation: DegradationFactors,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YawControl {
    pub steer_torque: f64,
    pub drift_torque: f64,
    pub recovery_torque: f64,
    pub yaw_accel: f64,
    pub slip_angle: f64,
}

impl YawController {
    pub fn max_yaw_rate(&self) -> f64 {
        self.max_yaw_rate
    }

    /// Steering torque for the current speed, before transition attenuation.
    pub fn steer_torque(
        &self,
        steer: f64,
        forward_speed: f64,
        degradation: &DegradationFactors,
    ) -> f64 {
        self.steering_gain * degradation.steering * steer * (forward_speed / self.reference_speed)
    }

    pub fn step(
        &mut self,
        state: &mut VehicleKinematicState,
        input: YawInput,
        time_delta_sec: f64,
    ) -> YawControl {
        let YawInput {
            steer,
            handbrake,
            steering_authority,
            degradation,
        } = input;
        let dt = time_delta_sec;
        let forward_speed = state.forward_speed;

        let steer_torque =
            self.steer_torque(steer, forward_speed, &degradation) * steering_authority;

        let drift_torque = if handbrake {
            self.drift_gain * degradation.drift * sign(steer) * forward_speed.max(0.0).sqrt()
        } else {
            0.0
        };

        // Re-align with the nearest path-aligned heading, so a finished spin
        // does not unwind itself.
        let recovery_torque = if handbrake {
            0.0
        } else {
            self.recovery_pid
                .next_control_output(wrap_angle(state.yaw_offset))
                .output
        };

        let yaw_accel =
            steer_torque + drift_torque + recovery_torque - self.yaw_damping * state.yaw_rate;

        let max_yaw_rate = self.max_yaw_rate;
        state.yaw_rate = (state.yaw_rate + yaw_accel * dt).clamp(-max_yaw_rate, max_yaw_rate);
        state.yaw_offset += state.yaw_rate * dt;

        let slip_angle = state.yaw_offset - state.lateral_speed.atan2(forward_speed);
        if handbrake {
            let gain = self.slip_gain * degradation.slip;
            let max_lateral_speed = self.max_lateral_speed;
            state.lateral_speed = (state.lateral_speed
                + gain * slip_angle.sin() * forward_speed * dt)
                .clamp(-max_lateral_speed, max_lateral_speed);
        }

        YawControl {
            steer_torque,
            drift_torque,
            recovery_torque,
            yaw_accel,
            slip_angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    const DT: f64 = 1.0 / 60.0;

    fn controller() -> YawController {
        YawControllerInit::from_tuning(&DynamicsTuning::default()).build()
    }

    fn input(steer: f64, handbrake: bool) -> YawInput {
        YawInput {
            steer,
            handbrake,
            steering_authority: 1.0,
            degradation: DegradationFactors::default(),
        }
    }

    #[test]
    fn steering_authority_scales_with_speed() {
        let control = controller();
        let factors = DegradationFactors::default();
        let slow = control.steer_torque(1.0, 10.0, &factors);
        let fast = control.steer_torque(1.0, 30.0, &factors);
        assert!((fast - 3.0 * slow).abs() < 1e-9);
    }

    #[test]
    fn yaw_rate_is_clamped_but_offset_is_not() {
        let mut control = controller();
        let mut state = VehicleKinematicState::cruising(60.0, 0.0, 0.0);

        for _ in 0..(60 * 6) {
            control.step(&mut state, input(1.0, true), DT);
            assert!(state.yaw_rate.abs() <= control.max_yaw_rate());
        }

        assert!(state.yaw_offset > TAU);
    }

    #[test]
    fn released_handbrake_recovers_heading() {
        let mut control = controller();
        let mut state = VehicleKinematicState::cruising(30.0, 0.0, 0.0);
        state.yaw_offset = 0.8;

        for _ in 0..(60 * 5) {
            control.step(&mut state, input(0.0, false), DT);
        }

        assert!(state.yaw_offset.abs() < 0.02);
    }

    #[test]
    fn recovery_after_a_full_spin_keeps_the_revolution() {
        let mut control = controller();
        let mut state = VehicleKinematicState::cruising(30.0, 0.0, 0.0);
        state.yaw_offset = TAU + 0.5;

        for _ in 0..(60 * 5) {
            control.step(&mut state, input(0.0, false), DT);
        }

        assert!((state.yaw_offset - TAU).abs() < 0.02);
    }

    #[test]
    fn handbrake_slip_builds_lateral_speed() {
        let mut control = controller();
        let mut state = VehicleKinematicState::cruising(30.0, 0.0, 0.0);
        state.yaw_offset = 0.4;

        control.step(&mut state, input(0.0, true), DT);
        assert!(state.lateral_speed > 0.0);
    }

    #[test]
    fn no_drift_torque_without_steering() {
        let mut control = controller();
        let mut state = VehicleKinematicState::cruising(30.0, 0.0, 0.0);
        let out = control.step(&mut state, input(0.0, true), DT);
        assert_eq!(out.drift_torque, 0.0);
    }
}
