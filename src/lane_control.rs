use crate::{
    config::DynamicsTuning,
    math::{lerp, smoothstep},
    track::{lane_center, LaneIndex, LaneSensor},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LaneDirection {
    Left,
    Right,
}

impl LaneDirection {
    pub fn from_sign(value: f64) -> Option<Self> {
        if value > 0.0 {
            Some(Self::Right)
        } else if value < 0.0 {
            Some(Self::Left)
        } else {
            None
        }
    }

    pub fn signum(self) -> i8 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// What drives a transition's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Player lane change, progress in seconds.
    LaneChange,
    /// Forced by road geometry, progress in meters along the path.
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionPhase {
    Idle,
    Active {
        direction: LaneDirection,
        kind: TransitionKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransitionEvent {
    Started {
        kind: TransitionKind,
        from_lane: LaneIndex,
        to_lane: LaneIndex,
        duration: f64,
    },
    Reversed {
        toward_lane: LaneIndex,
        progress: f64,
    },
    Completed {
        lane: LaneIndex,
    },
}

/// Lane bookkeeping owned by one vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneTransitionState {
    pub phase: TransitionPhase,
    pub committed_lane: LaneIndex,
    pub from_lane: LaneIndex,
    pub to_lane: LaneIndex,
    pub from_center_offset: f64,
    pub to_center_offset: f64,
    /// Seconds for lane changes, meters for merges.
    pub progress: f64,
    pub duration: f64,
    /// Reversals since the transition started.
    pub reversals: u32,
}

impl LaneTransitionState {
    pub fn idle(committed_lane: LaneIndex, lane_width: f64) -> Self {
        let center = lane_center(committed_lane, lane_width);
        Self {
            phase: TransitionPhase::Idle,
            committed_lane,
            from_lane: committed_lane,
            to_lane: committed_lane,
            from_center_offset: center,
            to_center_offset: center,
            progress: 0.0,
            duration: 0.0,
            reversals: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, TransitionPhase::Active { .. })
    }

    pub fn kind(&self) -> Option<TransitionKind> {
        match self.phase {
            TransitionPhase::Idle => None,
            TransitionPhase::Active { kind, .. } => Some(kind),
        }
    }

    /// -1, 0 or +1.
    pub fn direction(&self) -> i8 {
        match self.phase {
            TransitionPhase::Idle => 0,
            TransitionPhase::Active { direction, .. } => direction.signum(),
        }
    }

    pub fn progress_ratio(&self) -> f64 {
        if self.duration > 0.0 {
            (self.progress / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    pub fn blend(&self) -> f64 {
        smoothstep(self.progress_ratio())
    }

    /// Where lane magnetism should pull this tick.
    pub fn target_center(&self, lane_width: f64) -> f64 {
        if self.is_active() {
            lerp(self.from_center_offset, self.to_center_offset, self.blend())
        } else {
            lane_center(self.committed_lane, lane_width)
        }
    }

    /// Player steering authority on yaw: fades out over a transition.
    pub fn steering_authority(&self) -> f64 {
        if self.is_active() {
            1.0 - self.blend()
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaneControllerInit {
    pub lane_width: f64,
    pub reference_speed: f64,
    pub base_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    pub steer_trigger_threshold: f64,
    pub abort_threshold: f64,
    pub fork_commit_distance: f64,
}

impl LaneControllerInit {
    pub fn from_tuning(tuning: &DynamicsTuning) -> Self {
        Self {
            lane_width: tuning.lane_width,
            reference_speed: tuning.reference_speed,
            base_duration: tuning.transition_base_duration,
            min_duration: tuning.transition_min_duration,
            max_duration: tuning.transition_max_duration,
            steer_trigger_threshold: tuning.steer_trigger_threshold,
            abort_threshold: tuning.abort_threshold,
            fork_commit_distance: tuning.fork_commit_distance,
        }
    }

    pub fn build(&self) -> LaneController {
        let Self {
            lane_width,
            reference_speed,
            base_duration,
            min_duration,
            max_duration,
            steer_trigger_threshold,
            abort_threshold,
            fork_commit_distance,
        } = *self;

        LaneController {
            trigger: TriggerLatch::new(),
            lane_width,
            reference_speed,
            base_duration,
            min_duration,
            max_duration,
            steer_trigger_threshold,
            abort_threshold,
            fork_commit_distance,
        }
    }
}

/// Lane change / merge state machine.
#[derive(Debug)]
pub struct LaneController {
    trigger: TriggerLatch,
    lane_width: f64,
    reference_speed: f64,
    base_duration: f64,
    min_duration: f64,
    max_duration: f64,
    steer_trigger_threshold: f64,
    abort_threshold: f64,
    fork_commit_distance: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LaneInput {
    pub steer: f64,
    pub handbrake: bool,
    pub forward_speed: f64,
    pub path_position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneControl {
    pub target_center: f64,
    pub fork_distance: Option<f64>,
    pub in_commit_zone: bool,
    pub event: Option<TransitionEvent>,
}

impl LaneController {
    pub fn lane_width(&self) -> f64 {
        self.lane_width
    }

    /// Lane change duration for the given forward speed.
    pub fn lane_change_duration(&self, forward_speed: f64) -> f64 {
        (self.base_duration * forward_speed / self.reference_speed)
            .clamp(self.min_duration, self.max_duration)
    }

    pub fn in_commit_zone(&self, fork_distance: Option<f64>) -> bool {
        fork_distance.map_or(false, |distance| distance <= self.fork_commit_distance)
    }

    /// Starts a forced merge toward `target_lane` over `length` meters of
    /// path. Replaces any lane change in flight, starting from the current
    /// blended center so the target stays continuous.
    pub fn begin_merge(
        &mut self,
        state: &mut LaneTransitionState,
        target_lane: LaneIndex,
        length: f64,
    ) -> TransitionEvent {
        let from_center = state.target_center(self.lane_width);
        let to_center = lane_center(target_lane, self.lane_width);
        let from_lane = state.committed_lane;
        self.trigger.disarm();

        match LaneDirection::from_sign(to_center - from_center) {
            Some(direction) if length > 0.0 => {
                *state = LaneTransitionState {
                    phase: TransitionPhase::Active {
                        direction,
                        kind: TransitionKind::Merge,
                    },
                    committed_lane: from_lane,
                    from_lane,
                    to_lane: target_lane,
                    from_center_offset: from_center,
                    to_center_offset: to_center,
                    progress: 0.0,
                    duration: length,
                    reversals: 0,
                };
                log::debug!(
                    "merge started: lane {} -> {} over {:.1} m",
                    from_lane,
                    target_lane,
                    length
                );
                TransitionEvent::Started {
                    kind: TransitionKind::Merge,
                    from_lane,
                    to_lane: target_lane,
                    duration: length,
                }
            }
            _ => {
                *state = LaneTransitionState::idle(target_lane, self.lane_width);
                log::debug!("merge into lane {} committed immediately", target_lane);
                TransitionEvent::Completed { lane: target_lane }
            }
        }
    }

    pub fn step<S>(
        &mut self,
        state: &mut LaneTransitionState,
        input: LaneInput,
        sensor: &S,
        time_delta_sec: f64,
    ) -> LaneControl
    where
        S: LaneSensor + ?Sized,
    {
        let LaneInput {
            steer,
            handbrake,
            forward_speed,
            path_position,
        } = input;

        let engaged = steer.abs() > self.steer_trigger_threshold;
        self.trigger.update(engaged);

        let lanes = sensor.lane_span(path_position);
        let fork_distance = sensor.fork_commit_distance(path_position);
        let in_commit_zone = self.in_commit_zone(fork_distance);

        let event = match state.phase {
            TransitionPhase::Idle if !lanes.contains(state.committed_lane) => {
                // The committed lane ended without a scheduled merge.
                let target_lane = lanes.clamp(state.committed_lane);
                let length = forward_speed * self.max_duration;
                Some(self.begin_merge(state, target_lane, length))
            }
            TransitionPhase::Idle => {
                let direction = LaneDirection::from_sign(steer)
                    .filter(|direction| engaged && self.trigger.can_fire(*direction));
                match direction {
                    Some(direction) if !handbrake && !in_commit_zone => {
                        let target_lane = state.committed_lane + direction.signum() as LaneIndex;
                        let open = lanes.contains(target_lane)
                            && !sensor.is_obstructed(target_lane, path_position);
                        if open {
                            self.trigger.fire(direction);
                            Some(self.begin_lane_change(state, target_lane, forward_speed))
                        } else {
                            None
                        }
                    }
                    _ => None,
                }
            }
            TransitionPhase::Active {
                direction,
                kind: TransitionKind::LaneChange,
            } => {
                // Turn back only toward an open lane.
                let hazard = sensor.is_obstructed(state.to_lane, path_position)
                    && !sensor.is_obstructed(state.from_lane, path_position);
                let counter_steer = steer * (direction.signum() as f64) < -self.abort_threshold
                    && self.trigger.can_fire(direction.reversed());

                let reversal = if hazard || counter_steer {
                    if counter_steer {
                        self.trigger.fire(direction.reversed());
                    }
                    Some(Self::reverse(state, direction))
                } else {
                    None
                };

                state.progress += time_delta_sec;
                Self::try_complete(state, self.lane_width).or(reversal)
            }
            TransitionPhase::Active {
                kind: TransitionKind::Merge,
                ..
            } => {
                state.progress += forward_speed * time_delta_sec;
                Self::try_complete(state, self.lane_width)
            }
        };

        LaneControl {
            target_center: state.target_center(self.lane_width),
            fork_distance,
            in_commit_zone,
            event,
        }
    }

    fn begin_lane_change(
        &self,
        state: &mut LaneTransitionState,
        target_lane: LaneIndex,
        forward_speed: f64,
    ) -> TransitionEvent {
        let from_lane = state.committed_lane;
        let direction = if target_lane > from_lane {
            LaneDirection::Right
        } else {
            LaneDirection::Left
        };
        let duration = self.lane_change_duration(forward_speed);

        *state = LaneTransitionState {
            phase: TransitionPhase::Active {
                direction,
                kind: TransitionKind::LaneChange,
            },
            committed_lane: from_lane,
            from_lane,
            to_lane: target_lane,
            from_center_offset: lane_center(from_lane, self.lane_width),
            to_center_offset: lane_center(target_lane, self.lane_width),
            progress: 0.0,
            duration,
            reversals: 0,
        };

        log::debug!(
            "lane change started: lane {} -> {} over {:.3} s",
            from_lane,
            target_lane,
            duration
        );
        TransitionEvent::Started {
            kind: TransitionKind::LaneChange,
            from_lane,
            to_lane: target_lane,
            duration,
        }
    }

    /// Mirrors the transition in place. Smoothstep is point-symmetric, so the
    /// blended center is the same before and after.
    fn reverse(state: &mut LaneTransitionState, direction: LaneDirection) -> TransitionEvent {
        let progress = state.duration - state.progress.min(state.duration);
        *state = LaneTransitionState {
            phase: TransitionPhase::Active {
                direction: direction.reversed(),
                kind: TransitionKind::LaneChange,
            },
            from_lane: state.to_lane,
            to_lane: state.from_lane,
            from_center_offset: state.to_center_offset,
            to_center_offset: state.from_center_offset,
            progress,
            reversals: state.reversals + 1,
            ..*state
        };

        log::debug!(
            "lane change reversed toward lane {} at progress {:.3}",
            state.to_lane,
            progress
        );
        TransitionEvent::Reversed {
            toward_lane: state.to_lane,
            progress,
        }
    }

    fn try_complete(state: &mut LaneTransitionState, lane_width: f64) -> Option<TransitionEvent> {
        if state.progress < state.duration {
            return None;
        }

        let lane = state.to_lane;
        *state = LaneTransitionState::idle(lane, lane_width);
        log::debug!("transition completed in lane {}", lane);
        Some(TransitionEvent::Completed { lane })
    }
}

/// Lets a held stick fire once, either starting a lane change or reversing
/// one. It fires again once steering has dropped back to or below the
/// trigger threshold, or when it is pushed the other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerLatch {
    Armed,
    Held(LaneDirection),
    Locked,
}

impl TriggerLatch {
    pub fn new() -> Self {
        Self::Armed
    }

    pub fn update(&mut self, engaged: bool) {
        if !engaged {
            *self = Self::Armed;
        }
    }

    pub fn can_fire(&self, direction: LaneDirection) -> bool {
        match *self {
            Self::Armed => true,
            Self::Held(held) => held != direction,
            Self::Locked => false,
        }
    }

    pub fn fire(&mut self, direction: LaneDirection) {
        *self = Self::Held(direction);
    }

    /// Ignores the stick in both directions until it is released.
    pub fn disarm(&mut self) {
        *self = Self::Locked;
    }
}
