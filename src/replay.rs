//! Session recording and deterministic re-simulation.
//!
//! A run is fully described by its seed, its fixed time step, and the inputs
//! and external events of every tick. Replaying a [`ReplayLog`] against the
//! same tuning and track reproduces the trajectory bit for bit, which the
//! [`TrajectoryDigest`] makes cheap to check.

use crate::{
    damage::DamageZone,
    error::ConfigError,
    frame::FrameSampler,
    physics::{Impulse, SteeringAndDriftInputs, VehicleKinematicState},
    track::{LaneIndex, LaneSensor},
    vehicle_control::{StepReport, VehicleController, VehicleControllerInit, VehicleOutput},
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Something a collaborator did to the vehicle between two ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExternalEvent {
    Impulse(Impulse),
    Damage { zone: DamageZone, amount: f64 },
    Merge { target_lane: LaneIndex, length: f64 },
}

impl ExternalEvent {
    pub fn apply(&self, vehicle: &mut VehicleController) {
        match *self {
            Self::Impulse(impulse) => vehicle.apply_impulse(impulse),
            Self::Damage { zone, amount } => vehicle.damage_mut().apply(zone, amount),
            Self::Merge {
                target_lane,
                length,
            } => {
                vehicle.begin_merge(target_lane, length);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub inputs: SteeringAndDriftInputs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<ExternalEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayLog {
    pub seed: u64,
    pub time_delta_sec: f64,
    pub ticks: Vec<TickRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub final_state: VehicleKinematicState,
    pub digest: String,
    pub ticks: usize,
}

impl ReplayLog {
    pub fn new(seed: u64, time_delta_sec: f64) -> Self {
        Self {
            seed,
            time_delta_sec,
            ticks: vec![],
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Re-simulates the log on a freshly built vehicle.
    pub fn replay<T>(
        &self,
        init: &VehicleControllerInit,
        track: &T,
    ) -> Result<ReplayOutcome, ConfigError>
    where
        T: FrameSampler + LaneSensor + ?Sized,
    {
        let time_delta_sec = self.time_delta_sec;
        if !(time_delta_sec > 0.0 && time_delta_sec.is_finite()) {
            return Err(ConfigError::NonPositive {
                field: "time_delta_sec",
                value: time_delta_sec,
            });
        }

        let mut vehicle = init.build()?;
        let mut digest = TrajectoryDigest::new(self.seed);

        for tick in &self.ticks {
            for event in &tick.events {
                event.apply(&mut vehicle);
            }
            let (output, _) = vehicle.step(time_delta_sec, tick.inputs, track);
            digest.record(&output.state);
        }

        log::debug!(
            "replayed {} ticks of session {}",
            self.ticks.len(),
            self.seed
        );

        Ok(ReplayOutcome {
            final_state: *vehicle.state(),
            digest: digest.finish(),
            ticks: self.ticks.len(),
        })
    }
}

/// SHA-256 over the session seed followed by the bit pattern of every
/// tick's kinematic state.
#[derive(Debug, Clone)]
pub struct TrajectoryDigest {
    hasher: Sha256,
}

impl TrajectoryDigest {
    pub fn new(seed: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.to_le_bytes());
        Self { hasher }
    }

    pub fn record(&mut self, state: &VehicleKinematicState) {
        self.hasher.update(state.to_bits_le());
    }

    /// Lowercase hex.
    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

/// Drives a vehicle while recording everything needed to replay it.
#[derive(Debug)]
pub struct ReplayRecorder {
    log: ReplayLog,
    digest: TrajectoryDigest,
}

impl ReplayRecorder {
    pub fn new(seed: u64, time_delta_sec: f64) -> Self {
        Self {
            log: ReplayLog::new(seed, time_delta_sec),
            digest: TrajectoryDigest::new(seed),
        }
    }

    pub fn step<T>(
        &mut self,
        vehicle: &mut VehicleController,
        inputs: SteeringAndDriftInputs,
        events: Vec<ExternalEvent>,
        track: &T,
    ) -> (VehicleOutput, StepReport)
    where
        T: FrameSampler + LaneSensor + ?Sized,
    {
        for event in &events {
            event.apply(vehicle);
        }
        let (output, report) = vehicle.step(self.log.time_delta_sec, inputs, track);
        self.digest.record(&output.state);
        self.log.ticks.push(TickRecord { inputs, events });
        (output, report)
    }

    pub fn finish(self) -> (ReplayLog, String) {
        (self.log, self.digest.finish())
    }
}
