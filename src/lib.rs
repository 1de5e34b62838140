pub mod config;
pub mod constants;
pub mod damage;
pub mod error;
pub mod frame;
pub mod lane_control;
pub mod magnetism_control;
pub mod math;
pub mod physics;
pub mod pid;
pub mod replay;
pub mod speed_control;
pub mod track;
pub mod vehicle_control;
pub mod yaw_control;

pub use config::DynamicsTuning;
pub use error::ConfigError;
pub use vehicle_control::{
    DriveStatus, StepReport, VehicleController, VehicleControllerInit, VehicleOutput,
};
