//! # autosim HAL
//!
//! Binds a drivetrain's hardware-control object to a physics model so the
//! platform reads plausible sensor values while running in simulation.
//!
//! # Module Structure
//!
//! - [`devices`] - motor, encoder and gyro handles
//! - [`discovery`] - role-tagged member enumeration
//! - [`validator`] - exactly-one-per-role check
//! - [`adapter`] - simulated sensor adapters and their factory
//! - [`binding`] - `initialize` and the bound context
//! - [`update`] - per-cycle `tick`
//! - [`model`] - differential drivetrain physics
//! - [`config`] - TOML configuration
//! - [`platform`] - demo drivetrain used by the `autosim` binary
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐  members()  ┌───────────┐   ┌───────────┐
//! │  HardwareObject    │────────────►│ discover  │──►│ validate  │
//! │  (platform)        │             └───────────┘   └─────┬─────┘
//! └─────┬────────▲─────┘                                   │
//!       │ duty   │ distance / yaw                          ▼
//!       │        │                              ┌─────────────────────┐
//!       ▼        │                              │  adapter factory    │
//! ┌────────────────────┐                        └──────────┬──────────┘
//! │  SimDeviceBus /    │◄──── set_position / set_yaw ─┐    │
//! │  in-process cells  │                              │    ▼
//! └────────────────────┘                        ┌─────────────────────┐
//!                                               │  BoundContext::tick │
//!                                               │  (DrivetrainModel)  │
//!                                               └─────────────────────┘
//! ```

pub mod adapter;
pub mod binding;
pub mod config;
pub mod devices;
pub mod discovery;
pub mod error;
pub mod model;
pub mod platform;
pub mod update;
pub mod validator;

pub use crate::binding::{
    BindOptions, BoundContext, DrivetrainComponents, ExecutionMode, HeadingSign, SensorBinding,
    initialize, initialize_with,
};
pub use crate::discovery::{HardwareObject, Member};
pub use crate::error::BindError;
pub use crate::model::{DifferentialDrivetrainSim, DrivetrainModel};
pub use crate::update::{TickSample, tick};
