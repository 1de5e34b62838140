use anyhow::{ensure, Result};
use clap::Parser;
use lane_dynamics::{
    damage::DamageZone,
    lane_control::TransitionEvent,
    physics::{Impulse, SteeringAndDriftInputs},
    replay::{ExternalEvent, ReplayRecorder},
    track::{ArcRoad, LaneSpan},
    DriveStatus, DynamicsTuning, VehicleControllerInit,
};
use nalgebra::Vector3;
use rand::prelude::*;
use std::{fs::File, path::PathBuf};

#[derive(Parser)]
struct Opts {
    /// Session seed.
    #[clap(long, default_value = "2024")]
    pub seed: u64,
    /// Simulated seconds.
    #[clap(long, default_value = "30")]
    pub seconds: f64,
    /// Road curvature in 1/m, positive bends right.
    #[clap(long, default_value = "0.002")]
    pub curvature: f64,
    /// JSON tuning file; defaults are used when omitted.
    #[clap(long)]
    pub tuning: Option<PathBuf>,
}

fn main() -> Result<()> {
    let Opts {
        seed,
        seconds,
        curvature,
        tuning,
    } = Opts::parse();

    let tuning = match tuning {
        Some(path) => DynamicsTuning::from_reader(File::open(path)?)?,
        None => DynamicsTuning::default(),
    };
    let time_delta_sec = tuning.fixed_timestep;
    let init = VehicleControllerInit::new(tuning);
    let road = ArcRoad::new(LaneSpan::new(-2, 2), curvature);

    let mut vehicle = init.build()?;
    let mut recorder = ReplayRecorder::new(seed, time_delta_sec);
    let mut rng = StdRng::seed_from_u64(seed);

    let total_ticks = (seconds / time_delta_sec).ceil() as usize;
    let mut steer = 0.0;
    let mut handbrake = false;
    let mut lane_changes = 0;
    let mut drift_ticks = 0;

    for tick in 0..total_ticks {
        // Re-plan the scripted driver twice a second.
        if tick % 30 == 0 {
            steer = match rng.gen_range(0..4) {
                0 => rng.gen_range(-1.0..1.0),
                _ => 0.0,
            };
            handbrake = rng.gen_bool(0.15);
        }

        let mut events = vec![];
        if rng.gen_bool(0.005) {
            let delta_velocity = Vector3::new(
                rng.gen_range(-8.0..8.0),
                0.0,
                rng.gen_range(-40.0..10.0),
            );
            events.push(ExternalEvent::Impulse(Impulse::new(
                delta_velocity,
                rng.gen_range(-2.0..2.0),
            )));
            events.push(ExternalEvent::Damage {
                zone: *DamageZone::ALL.choose(&mut rng).unwrap_or(&DamageZone::Front),
                amount: rng.gen_range(0.0..0.2),
            });
        }

        let inputs = SteeringAndDriftInputs::new(steer, handbrake);
        let (_, report) = recorder.step(&mut vehicle, inputs, events, &road);

        if report.status == DriveStatus::Drifting {
            drift_ticks += 1;
        }
        if matches!(
            report.transition_event,
            Some(TransitionEvent::Completed { .. })
        ) {
            lane_changes += 1;
        }
    }

    let (log, digest) = recorder.finish();
    let outcome = log.replay(&init, &road)?;
    ensure!(
        outcome.digest == digest,
        "replay diverged: {} != {}",
        outcome.digest,
        digest
    );

    let state = vehicle.state();
    println!("ticks          {}", total_ticks);
    println!("distance       {:.1} m", state.path_position);
    println!("forward speed  {:.2} m/s", state.forward_speed);
    println!("yaw offset     {:.3} rad", state.yaw_offset);
    println!("lane           {}", vehicle.committed_lane());
    println!("lane changes   {}", lane_changes);
    println!("drift time     {:.1} s", drift_ticks as f64 * time_delta_sec);
    println!("digest         {}", digest);

    Ok(())
}
