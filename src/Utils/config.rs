//! Solver settings, read from TOML documents like
//! ```toml
//! loglevel = "info"
//! timeout_ms = 5000
//! independent_var = "t"
//! ```
//! Missing keys take their defaults.
use crate::ode::limits::SolverLimits;
use crate::ode::vop_error::{VopError, VopResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// "debug", "info", "warn", "error" or "off"/"none"
    pub loglevel: Option<String>,
    pub timeout_ms: Option<u64>,
    pub independent_var: String,
    pub dependent_var: String,
    /// formal variable of the characteristic polynomial
    pub characteristic_var: String,
    /// number of points used by `sample_default`
    pub sample_points: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            loglevel: Some("info".to_string()),
            timeout_ms: None,
            independent_var: "x".to_string(),
            dependent_var: "y".to_string(),
            characteristic_var: "r".to_string(),
            sample_points: 400,
        }
    }
}

const RESERVED_NAMES: [&str; 9] = ["e", "exp", "ln", "log", "sin", "cos", "tan", "tg", "sqrt"];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl SolverConfig {
    pub fn from_toml_str(content: &str) -> VopResult<SolverConfig> {
        let config: SolverConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> VopResult<SolverConfig> {
        let content = std::fs::read_to_string(path)?;
        SolverConfig::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> VopResult<String> {
        toml::to_string(self).map_err(|e| VopError::Config(e.to_string()))
    }

    /// names must be distinct identifiers that are not function names; the constant families
    /// c1.., u1.. are reserved as well
    pub fn validate(&self) -> VopResult<()> {
        let names = [&self.independent_var, &self.dependent_var, &self.characteristic_var];
        for name in names {
            if !is_identifier(name) || RESERVED_NAMES.contains(&name.as_str()) {
                return Err(VopError::Config(format!("'{}' cannot be used as a variable name", name)));
            }
            let constant_like = (name.starts_with('c') || name.starts_with('u'))
                && name.len() > 1
                && name[1..].chars().all(|c| c.is_ascii_digit());
            if constant_like {
                return Err(VopError::Config(format!("'{}' is reserved for constants", name)));
            }
        }
        if names[0] == names[1] || names[0] == names[2] || names[1] == names[2] {
            return Err(VopError::Config("variable names must be distinct".to_string()));
        }
        if let Some(level) = &self.loglevel {
            if !["debug", "info", "warn", "error", "off", "none"].contains(&level.as_str()) {
                return Err(VopError::Config(format!(
                    "loglevel must be debug, info, warn, error, off or none, got {}",
                    level
                )));
            }
        }
        Ok(())
    }

    pub fn limits(&self) -> SolverLimits {
        match self.timeout_ms {
            Some(ms) => SolverLimits::with_timeout(Duration::from_millis(ms)),
            None => SolverLimits::unlimited(),
        }
    }
}
