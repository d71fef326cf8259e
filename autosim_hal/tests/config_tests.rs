//! Loading drivetrain configuration from disk.

use std::io::Write;
use std::path::Path;

use autosim_common::config::{ConfigError, ConfigLoader, LogLevel};
use autosim_common::simdev::SimDeviceBus;
use autosim_hal::binding::{ExecutionMode, HeadingSign, initialize_with};
use autosim_hal::config::DrivetrainConfig;
use autosim_hal::model::DrivetrainModel;
use autosim_hal::platform::DemoDrivetrain;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn shipped_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/drivetrain.toml");
    let config = DrivetrainConfig::load(&path).unwrap();
    config.validate().unwrap();
    assert_eq!(config, DrivetrainConfig::default());
}

#[test]
fn full_file_round_trips_into_a_binding() {
    let file = write_config(
        r#"
[shared]
log_level = "debug"
service_name = "practice-bot"

[model]
kv_linear = 2.0
ka_linear = 0.5
kv_angular = 2.5
ka_angular = 0.3
track_width_m = 0.6
max_voltage = 10.0

[binding]
heading_sign = "direct"
nominal_voltage = 10.0

[run]
control_period_s = 0.01
"#,
    );
    let config = DrivetrainConfig::load(file.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.shared.log_level, LogLevel::Debug);
    assert_eq!(config.shared.service_name, "practice-bot");
    assert_eq!(config.run.control_period_s, 0.01);

    let bus = SimDeviceBus::new();
    let demo = DemoDrivetrain::new(&bus);
    let mut ctx = initialize_with(
        &demo,
        config.build_model(),
        ExecutionMode::Simulated,
        config.to_options(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(ctx.heading_sign(), HeadingSign::Direct);

    demo.arcade_drive(1.0, 0.0);
    ctx.tick(config.run.control_period_s);
    assert_eq!(ctx.last_sample().left_volts, 10.0);
    assert!(ctx.model().left_velocity() > 0.0);
}

#[test]
fn missing_file_is_reported() {
    let err = DrivetrainConfig::load(Path::new("/nonexistent/drivetrain.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn malformed_file_is_parse_error() {
    let file = write_config("[model\nkv_linear = 2.0\n");
    let err = DrivetrainConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn invalid_values_fail_validation() {
    let file = write_config("[model]\ntrack_width_m = -0.5\n");
    let config = DrivetrainConfig::load(file.path()).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("track_width_m"));
}
