use crate::frame::PathFrame;
use nalgebra::Vector3;
use noisy_float::types::R64;
use serde::{Deserialize, Serialize};

/// Lane-relative kinematic state of one vehicle.
///
/// Mutated once per tick by [`crate::VehicleController::step`]; callers get
/// copies of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleKinematicState {
    /// m/s along the path forward axis, never below the configured floor
    /// once a tick has completed.
    pub forward_speed: f64,
    /// m/s along the path right axis.
    pub lateral_speed: f64,
    /// rad/s, magnitude clamped.
    pub yaw_rate: f64,
    /// rad between heading and path forward. Unbounded: a vehicle that spun
    /// twice reads about `4π`.
    pub yaw_offset: f64,
    /// m from the guidance path center, positive to the right.
    pub lateral_offset: f64,
    /// m travelled along the guidance path.
    pub path_position: f64,
}

impl VehicleKinematicState {
    pub fn cruising(forward_speed: f64, lateral_offset: f64, path_position: f64) -> Self {
        Self {
            forward_speed,
            lateral_speed: 0.0,
            yaw_rate: 0.0,
            yaw_offset: 0.0,
            lateral_offset,
            path_position,
        }
    }

    pub fn is_finite(&self) -> bool {
        let Self {
            forward_speed,
            lateral_speed,
            yaw_rate,
            yaw_offset,
            lateral_offset,
            path_position,
        } = *self;

        [
            forward_speed,
            lateral_speed,
            yaw_rate,
            yaw_offset,
            lateral_offset,
            path_position,
        ]
        .into_iter()
        .all(|value| R64::try_new(value).is_some())
    }

    /// Little-endian bit pattern of every field, in declaration order.
    pub fn to_bits_le(&self) -> [u8; 48] {
        let fields = [
            self.forward_speed,
            self.lateral_speed,
            self.yaw_rate,
            self.yaw_offset,
            self.lateral_offset,
            self.path_position,
        ];
        let mut bytes = [0u8; 48];
        for (chunk, value) in bytes.chunks_exact_mut(8).zip(fields) {
            chunk.copy_from_slice(&value.to_bits().to_le_bytes());
        }
        bytes
    }
}

/// Per tick control inputs from the player or an AI driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringAndDriftInputs {
    /// -1 (full left) .. 1 (full right)
    pub steer: f64,
    pub handbrake: bool,
}

impl SteeringAndDriftInputs {
    pub fn new(steer: f64, handbrake: bool) -> Self {
        Self { steer, handbrake }
    }

    /// Steering clamped to `[-1, 1]`; non-finite input reads as centered.
    pub fn steer_ratio(&self) -> f64 {
        match R64::try_new(self.steer) {
            Some(steer) => steer.raw().clamp(-1.0, 1.0),
            None => 0.0,
        }
    }
}

/// One-shot perturbation injected by the collision collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impulse {
    /// World-space velocity change, m/s.
    pub delta_velocity: Vector3<f64>,
    /// rad/s
    pub delta_yaw_rate: f64,
}

impl Impulse {
    pub fn new(delta_velocity: Vector3<f64>, delta_yaw_rate: f64) -> Self {
        Self {
            delta_velocity,
            delta_yaw_rate,
        }
    }

    pub fn combine(self, other: Impulse) -> Impulse {
        Impulse {
            delta_velocity: self.delta_velocity + other.delta_velocity,
            delta_yaw_rate: self.delta_yaw_rate + other.delta_yaw_rate,
        }
    }
}

/// Projects a world velocity onto the frame, returning
/// `(forward_speed, lateral_speed)`.
#[inline]
pub fn decompose_velocity(velocity: &Vector3<f64>, frame: &PathFrame) -> (f64, f64) {
    (velocity.dot(&frame.forward), velocity.dot(&frame.right))
}

#[inline]
pub fn recompose_velocity(
    forward_speed: f64,
    lateral_speed: f64,
    frame: &PathFrame,
) -> Vector3<f64> {
    frame.forward * forward_speed + frame.right * lateral_speed
}

pub fn is_finite_vector(vector: &Vector3<f64>) -> bool {
    vector.iter().all(|value| R64::try_new(*value).is_some())
}
