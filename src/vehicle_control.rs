use crate::{
    config::DynamicsTuning,
    constants::RECOVERED_YAW_TOLERANCE_RAD,
    damage::{
        DegradationCoupler, DegradationFactors, DegradationInit, DirectionalDamageState,
        FailedZones,
    },
    error::ConfigError,
    frame::FrameSampler,
    lane_control::{
        LaneControl, LaneController, LaneControllerInit, LaneInput, LaneTransitionState,
        TransitionEvent, TransitionKind,
    },
    magnetism_control::{
        MagnetismControl, MagnetismController, MagnetismControllerInit, MagnetismInput,
    },
    math::wrap_angle,
    physics::{
        decompose_velocity, is_finite_vector, recompose_velocity, Impulse, SteeringAndDriftInputs,
        VehicleKinematicState,
    },
    speed_control::{SpeedControl, SpeedController, SpeedControllerInit},
    track::{lane_center, LaneIndex, LaneSensor},
    yaw_control::{YawControl, YawController, YawControllerInit, YawInput},
};
use nalgebra::Vector3;
use noisy_float::types::R64;

#[derive(Debug, Clone)]
pub struct VehicleControllerInit {
    pub tuning: DynamicsTuning,
    pub start_lane: LaneIndex,
    pub start_speed: f64,
    pub path_position: f64,
}

impl VehicleControllerInit {
    /// Starts in lane 0 at the reference speed.
    pub fn new(tuning: DynamicsTuning) -> Self {
        Self {
            start_speed: tuning.reference_speed,
            tuning,
            start_lane: 0,
            path_position: 0.0,
        }
    }

    pub fn build(&self) -> Result<VehicleController, ConfigError> {
        let Self {
            ref tuning,
            start_lane,
            start_speed,
            path_position,
        } = *self;

        tuning.validate()?;
        for (field, value) in [("start_speed", start_speed), ("path_position", path_position)] {
            if R64::try_new(value).is_none() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        let speed_controller = SpeedControllerInit {
            cruise_speed: start_speed,
            ..SpeedControllerInit::from_tuning(tuning)
        }
        .build();
        let start_speed = speed_controller.cruise_speed();

        let lane_offset = lane_center(start_lane, tuning.lane_width);
        let state = VehicleKinematicState::cruising(start_speed, lane_offset, path_position);

        Ok(VehicleController {
            state,
            velocity: None,
            transition: LaneTransitionState::idle(start_lane, tuning.lane_width),
            damage: DirectionalDamageState::default(),
            degradation: DegradationFactors::default(),
            pending_impulse: None,
            speed_controller,
            yaw_controller: YawControllerInit::from_tuning(tuning).build(),
            lane_controller: LaneControllerInit::from_tuning(tuning).build(),
            magnetism_controller: MagnetismControllerInit::from_tuning(tuning).build(),
            degradation_coupler: DegradationInit::from_tuning(tuning).build(),
        })
    }
}

/// Arcade dynamics and lane guidance for a single vehicle.
///
/// Owns its state exclusively; independent vehicles can be stepped on
/// different threads.
#[derive(Debug)]
pub struct VehicleController {
    state: VehicleKinematicState,
    /// World velocity produced by the last tick. `None` until the first one.
    velocity: Option<Vector3<f64>>,
    transition: LaneTransitionState,
    damage: DirectionalDamageState,
    degradation: DegradationFactors,
    pending_impulse: Option<Impulse>,
    speed_controller: SpeedController,
    yaw_controller: YawController,
    lane_controller: LaneController,
    magnetism_controller: MagnetismController,
    degradation_coupler: DegradationCoupler,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleOutput {
    pub state: VehicleKinematicState,
    pub world_velocity: Vector3<f64>,
    pub committed_lane: LaneIndex,
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub status: DriveStatus,
    pub degenerate_reset: bool,
    pub impulse_applied: bool,
    pub floor_engaged: bool,
    pub transition_event: Option<TransitionEvent>,
    pub in_commit_zone: bool,
    pub target_center: f64,
    pub steer_torque: f64,
    pub drift_torque: f64,
    pub recovery_torque: f64,
    pub slip_angle: f64,
    pub magnetism_multiplier: f64,
    pub magnetism_substeps: usize,
    /// Factors used during this tick, derived from last tick's damage.
    pub degradation: DegradationFactors,
    pub failed_zones: FailedZones,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveStatus {
    Cruising,
    Drifting,
    Recovering,
    ChangingLane,
    Merging,
}

impl VehicleController {
    pub fn state(&self) -> &VehicleKinematicState {
        &self.state
    }

    pub fn transition(&self) -> &LaneTransitionState {
        &self.transition
    }

    pub fn committed_lane(&self) -> LaneIndex {
        self.transition.committed_lane
    }

    pub fn damage(&self) -> &DirectionalDamageState {
        &self.damage
    }

    /// Write access for the damage collaborator.
    pub fn damage_mut(&mut self) -> &mut DirectionalDamageState {
        &mut self.damage
    }

    pub fn degradation(&self) -> &DegradationFactors {
        &self.degradation
    }

    /// Queues an impulse for the start of the next tick. Impulses queued in
    /// the same tick add up.
    pub fn apply_impulse(&mut self, impulse: Impulse) {
        self.pending_impulse = Some(match self.pending_impulse.take() {
            Some(pending) => pending.combine(impulse),
            None => impulse,
        });
    }

    /// Forces a merge into `target_lane` over `length` meters of path.
    pub fn begin_merge(&mut self, target_lane: LaneIndex, length: f64) -> TransitionEvent {
        self.lane_controller
            .begin_merge(&mut self.transition, target_lane, length)
    }

    pub fn step<T>(
        &mut self,
        time_delta_sec: f64,
        inputs: SteeringAndDriftInputs,
        track: &T,
    ) -> (VehicleOutput, StepReport)
    where
        T: FrameSampler + LaneSensor + ?Sized,
    {
        assert!(time_delta_sec > 0.0 && time_delta_sec.is_finite());
        let dt = time_delta_sec;

        let steer = inputs.steer_ratio();
        let handbrake = inputs.handbrake;
        let degradation = self.degradation;

        // Apply impulses
        let impulse = self.pending_impulse.take();
        let mut velocity = self.velocity;
        if let Some(impulse) = impulse {
            let frame = track.sample_frame(self.state.path_position);
            let base = velocity.unwrap_or_else(|| {
                recompose_velocity(self.state.forward_speed, self.state.lateral_speed, &frame)
            });
            velocity = Some(base + impulse.delta_velocity);
            self.state.yaw_rate += impulse.delta_yaw_rate;
        }

        // Sanitize
        let degenerate_reset =
            !self.state.is_finite() || !velocity.as_ref().map_or(true, is_finite_vector);
        if degenerate_reset {
            self.reset_degenerate();
            velocity = None;
        }

        // Sample frame and decompose
        let frame = track.sample_frame(self.state.path_position);
        if let Some(velocity) = velocity {
            let (forward_speed, lateral_speed) = decompose_velocity(&velocity, &frame);
            self.state.forward_speed = forward_speed;
            self.state.lateral_speed = lateral_speed;
        }

        let Self {
            state,
            velocity: stored_velocity,
            transition,
            damage,
            degradation: next_degradation,
            speed_controller,
            yaw_controller,
            lane_controller,
            magnetism_controller,
            degradation_coupler,
            ..
        } = self;

        // Enforce forward speed
        let SpeedControl {
            forward_speed,
            floor_engaged,
        } = speed_controller.step(state.forward_speed, handbrake, dt);
        state.forward_speed = forward_speed;

        // Run yaw controller
        let YawControl {
            steer_torque,
            drift_torque,
            recovery_torque,
            slip_angle,
            ..
        } = yaw_controller.step(
            state,
            YawInput {
                steer,
                handbrake,
                steering_authority: transition.steering_authority(),
                degradation,
            },
            dt,
        );

        // Run lane transitions
        let LaneControl {
            target_center,
            fork_distance,
            in_commit_zone,
            event: transition_event,
        } = lane_controller.step(
            transition,
            LaneInput {
                steer,
                handbrake,
                forward_speed: state.forward_speed,
                path_position: state.path_position,
            },
            track,
            dt,
        );

        // Run lane magnetism
        let MagnetismControl {
            multiplier: magnetism_multiplier,
            substeps: magnetism_substeps,
            ..
        } = magnetism_controller.step(
            state,
            MagnetismInput {
                target_center,
                handbrake,
                fork_distance,
                lane_multiplier: degradation.magnetism,
            },
            dt,
        );

        let world_velocity = recompose_velocity(state.forward_speed, state.lateral_speed, &frame);
        *stored_velocity = Some(world_velocity);
        state.path_position += state.forward_speed * dt;

        // Gains for the next tick
        *next_degradation = degradation_coupler.factors(damage);
        let failed_zones = degradation_coupler.failed_zones(damage);

        let status = match transition.kind() {
            Some(TransitionKind::Merge) => DriveStatus::Merging,
            Some(TransitionKind::LaneChange) => DriveStatus::ChangingLane,
            None if handbrake => DriveStatus::Drifting,
            None if wrap_angle(state.yaw_offset).abs() > RECOVERED_YAW_TOLERANCE_RAD => {
                DriveStatus::Recovering
            }
            None => DriveStatus::Cruising,
        };

        let output = VehicleOutput {
            state: *state,
            world_velocity,
            committed_lane: transition.committed_lane,
        };
        let report = StepReport {
            status,
            degenerate_reset,
            impulse_applied: impulse.is_some(),
            floor_engaged,
            transition_event,
            in_commit_zone,
            target_center,
            steer_torque,
            drift_torque,
            recovery_torque,
            slip_angle,
            magnetism_multiplier,
            magnetism_substeps,
            degradation,
            failed_zones,
        };

        (output, report)
    }

    fn reset_degenerate(&mut self) {
        let lane_width = self.lane_controller.lane_width();
        let committed_lane = self.transition.committed_lane;
        let path_position = if R64::try_new(self.state.path_position).is_some() {
            self.state.path_position
        } else {
            0.0
        };

        log::warn!(
            "degenerate vehicle state {:?}, resetting to lane {}",
            self.state,
            committed_lane
        );

        self.state = VehicleKinematicState::cruising(
            self.speed_controller.min_forward_speed(),
            lane_center(committed_lane, lane_width),
            path_position,
        );
        self.transition = LaneTransitionState::idle(committed_lane, lane_width);
    }
}
