//! Drivetrain configuration.
//!
//! ```toml
//! [shared]
//! log_level = "info"
//! service_name = "autosim"
//!
//! [model]
//! kv_linear = 2.66
//! ka_linear = 0.433
//! kv_angular = 2.76
//! ka_angular = 0.236
//! track_width_m = 0.7047364141920852
//! max_voltage = 12.0
//!
//! [binding]
//! heading_sign = "inverted"
//! nominal_voltage = 12.0
//!
//! [run]
//! control_period_s = 0.02
//! ```
//!
//! Every table is optional; missing values take the defaults above.

use std::sync::Arc;

use autosim_common::config::{ConfigError, SharedConfig};
use autosim_common::consts::{CONTROL_PERIOD_S, MAX_CONTROL_PERIOD_S, NOMINAL_BATTERY_VOLTAGE};
use serde::{Deserialize, Serialize};

use crate::binding::{BindOptions, FixedSupply, HeadingSign};
use crate::model::DifferentialDrivetrainSim;

/// Top-level `autosim` configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivetrainConfig {
    pub shared: SharedConfig,
    pub model: ModelConfig,
    pub binding: BindingConfig,
    pub run: RunConfig,
}

/// Feedforward characterisation of the drivetrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// V/(m/s)
    pub kv_linear: f64,
    /// V/(m/s²)
    pub ka_linear: f64,
    /// V/(m/s), per wheel during pure rotation
    pub kv_angular: f64,
    /// V/(m/s²), per wheel during pure rotation
    pub ka_angular: f64,
    pub track_width_m: f64,
    /// Input clamp [V]
    pub max_voltage: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kv_linear: 2.66,
            ka_linear: 0.433,
            kv_angular: 2.76,
            ka_angular: 0.236,
            track_width_m: 0.7047364141920852,
            max_voltage: NOMINAL_BATTERY_VOLTAGE,
        }
    }
}

/// Options handed to the binding engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Sign applied to the model heading before it reaches the gyro.
    pub heading_sign: HeadingSign,
    /// Supply voltage estimate [V].
    pub nominal_voltage: f64,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            heading_sign: HeadingSign::default(),
            nominal_voltage: NOMINAL_BATTERY_VOLTAGE,
        }
    }
}

/// Loop timing of the `autosim` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Simulated step and realtime pacing period, at most
    /// [`MAX_CONTROL_PERIOD_S`] [s].
    pub control_period_s: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            control_period_s: CONTROL_PERIOD_S,
        }
    }
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{field} must be a positive number, got {value}"
        )))
    }
}

impl DrivetrainConfig {
    /// Check every field; the first offender is reported.
    ///
    /// # Errors
    /// `ValidationError` naming the field for a gain, width, voltage or
    /// period that is not a finite positive number, or a control period
    /// above [`MAX_CONTROL_PERIOD_S`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let m = &self.model;
        require_positive("model.kv_linear", m.kv_linear)?;
        require_positive("model.ka_linear", m.ka_linear)?;
        require_positive("model.kv_angular", m.kv_angular)?;
        require_positive("model.ka_angular", m.ka_angular)?;
        require_positive("model.track_width_m", m.track_width_m)?;
        require_positive("model.max_voltage", m.max_voltage)?;

        require_positive("binding.nominal_voltage", self.binding.nominal_voltage)?;
        require_positive("run.control_period_s", self.run.control_period_s)?;
        if self.run.control_period_s > MAX_CONTROL_PERIOD_S {
            return Err(ConfigError::ValidationError(format!(
                "run.control_period_s must be at most {MAX_CONTROL_PERIOD_S} s, got {}",
                self.run.control_period_s
            )));
        }
        Ok(())
    }

    /// Physics model described by `[model]`, at rest.
    pub fn build_model(&self) -> DifferentialDrivetrainSim {
        let m = &self.model;
        DifferentialDrivetrainSim::from_characterization(
            m.kv_linear,
            m.ka_linear,
            m.kv_angular,
            m.ka_angular,
            m.track_width_m,
            m.max_voltage,
        )
    }

    /// Binding options described by `[binding]`.
    pub fn to_options(&self) -> BindOptions {
        BindOptions {
            heading_sign: self.binding.heading_sign,
            supply: Arc::new(FixedSupply(self.binding.nominal_voltage)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autosim_common::config::ConfigLoader;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = DrivetrainConfig::from_toml("").unwrap();
        assert_eq!(cfg, DrivetrainConfig::default());
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.run.control_period_s, 0.02);
        assert_eq!(cfg.binding.heading_sign, HeadingSign::Inverted);
    }

    #[test]
    fn partial_model_table() {
        let cfg = DrivetrainConfig::from_toml("[model]\ntrack_width_m = 0.55\n").unwrap();
        assert_eq!(cfg.model.track_width_m, 0.55);
        assert_eq!(cfg.model.kv_linear, 2.66);
        assert_eq!(cfg.build_model().track_width(), 0.55);
    }

    #[test]
    fn negative_gain_rejected() {
        let cfg = DrivetrainConfig::from_toml("[model]\nka_angular = -0.236\n").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(&err, ConfigError::ValidationError(msg) if msg.contains("ka_angular")));
    }

    #[test]
    fn zero_period_rejected() {
        let cfg = DrivetrainConfig::from_toml("[run]\ncontrol_period_s = 0.0\n").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_period_rejected() {
        let cfg = DrivetrainConfig::from_toml("[run]\ncontrol_period_s = 1e300\n").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(
            matches!(&err, ConfigError::ValidationError(msg) if msg.contains("control_period_s"))
        );

        let cfg = DrivetrainConfig::from_toml("[run]\ncontrol_period_s = 1.0\n").unwrap();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn direct_heading_sign_reaches_options() {
        let cfg = DrivetrainConfig::from_toml(
            "[binding]\nheading_sign = \"direct\"\nnominal_voltage = 11.5\n",
        )
        .unwrap();
        let options = cfg.to_options();
        assert_eq!(options.heading_sign, HeadingSign::Direct);
        assert_eq!(options.supply.voltage(), 11.5);
    }

    #[test]
    fn unknown_heading_sign_is_parse_error() {
        let result = DrivetrainConfig::from_toml("[binding]\nheading_sign = \"sideways\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
