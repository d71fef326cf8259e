//! autosim common library
//!
//! Shared types for the autosim workspace: drivetrain role tags, TOML
//! configuration loading, and the simulated device bus whose naming is
//! the contract with the simulation front-end.
//!
//! # Module Structure
//!
//! - [`role`] - `Role` and `RoleTag`, with string forms for configuration
//! - [`simdev`] - Named simulated devices and lock-free field handles
//! - [`config`] - Configuration loading trait and shared config types
//! - [`consts`] - Control period, supply voltage, device/field names
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use autosim_common::prelude::*;
//!
//! let tag: RoleTag = "LeftSensor@13".parse().unwrap();
//! assert_eq!(tag.role, Role::LeftSensor);
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod role;
pub mod simdev;
